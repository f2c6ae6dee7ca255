//! Simulated task definitions
//!
//! A task is a list of timed steps standing in for real work, plus the
//! outcome to report once every step has elapsed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Outcome status reported when a task succeeds
pub const SUCCESS_STATUS: &str = "success";

/// A synthetic unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDefinition {
    /// Task identifier echoed in every report
    pub id: String,

    /// Steps executed in order
    pub steps: Vec<TaskStep>,

    /// Outcome reported after the last step
    pub result: TaskOutcome,
}

/// One simulated step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStep {
    /// Human-readable stage label ("Step N" when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Simulated work time in seconds
    #[serde(default = "default_step_duration", rename = "duration")]
    pub duration_secs: f64,
}

/// Outcome of a simulated task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskOutcome {
    /// Outcome status ("success" or anything else for failure)
    pub status: String,

    /// Arbitrary output payload
    pub output: serde_json::Value,
}

fn default_step_duration() -> f64 {
    1.0
}

impl Default for TaskDefinition {
    fn default() -> Self {
        Self {
            id: "unknown".to_string(),
            steps: vec![],
            result: TaskOutcome::default(),
        }
    }
}

impl Default for TaskOutcome {
    fn default() -> Self {
        Self {
            status: SUCCESS_STATUS.to_string(),
            output: serde_json::json!({}),
        }
    }
}

impl TaskDefinition {
    /// The built-in task used when the configuration defines none
    pub fn demo() -> Self {
        Self {
            id: "demo-task-001".to_string(),
            steps: vec![
                TaskStep::new("Initialize environment", 1.0),
                TaskStep::new("Process dataset", 2.0),
                TaskStep::new("Finalize output", 1.5),
            ],
            result: TaskOutcome {
                status: SUCCESS_STATUS.to_string(),
                output: serde_json::json!({
                    "message": "Task completed successfully",
                    "artifacts": ["log.txt", "results.json"],
                }),
            },
        }
    }

    /// Number of steps
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Total simulated time across all steps, saturating at `Duration::MAX`
    pub fn total_duration(&self) -> Duration {
        self.steps
            .iter()
            .map(TaskStep::duration)
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Check that every step, and the whole task, fits in a `Duration`
    pub fn validate(&self) -> Result<()> {
        let mut total = Duration::ZERO;
        for (index, step) in self.steps.iter().enumerate() {
            let field = format!("task.steps[{}].duration", index);
            let duration = Duration::try_from_secs_f64(step.duration_secs).map_err(|_| {
                Error::config_field_invalid(
                    field.clone(),
                    format!(
                        "step duration must be a non-negative, representable number of seconds, got {}",
                        step.duration_secs
                    ),
                )
            })?;
            total = total.checked_add(duration).ok_or_else(|| {
                Error::config_field_invalid(field, "total task duration overflows")
            })?;
        }
        Ok(())
    }
}

impl TaskStep {
    /// Create a step with a description
    pub fn new(description: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            description: Some(description.into()),
            duration_secs,
        }
    }

    /// Stage label for the 1-based step `index`
    pub fn label(&self, index: usize) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Step {}", index))
    }

    /// Simulated work time
    pub fn duration(&self) -> Duration {
        // Unvalidated values clamp instead of panicking
        Duration::try_from_secs_f64(self.duration_secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl TaskOutcome {
    /// Whether the outcome counts as success
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Error text for a failed outcome
    pub fn error_message(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        let message = self
            .output
            .get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("task finished with status {}", self.status));
        Some(message)
    }
}
