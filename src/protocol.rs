//! Wire payloads sent to the backend
//!
//! Both reports are flat JSON objects posted to fixed paths under the
//! configured backend URL. Timestamps are unix epoch seconds as floats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{TaskDefinition, TaskStep};

/// Path receiving progress reports
pub const STATUS_ENDPOINT: &str = "/executor/status";

/// Path receiving the final report
pub const RESULT_ENDPOINT: &str = "/executor/result";

/// Progress of a task at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub task_id: String,

    /// Stage label of the step just finished
    pub stage: String,

    /// Same text as `stage`
    pub description: String,

    /// 1-based index of the step just finished
    pub step: usize,

    pub total_steps: usize,

    /// Integer percent complete
    pub progress: u8,

    pub timestamp: f64,
}

/// Terminal report of a task outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultReport {
    pub task_id: String,

    pub success: bool,

    /// Outcome status string ("success", "failed", ...)
    pub status: String,

    pub output: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub started_at: f64,

    pub finished_at: f64,

    /// Seconds between `started_at` and `finished_at`
    pub duration: f64,
}

impl StatusUpdate {
    /// Build the report sent after step `index` (1-based) finishes
    pub fn for_step(task: &TaskDefinition, index: usize, step: &TaskStep, at: DateTime<Utc>) -> Self {
        let total_steps = task.total_steps();
        let stage = step.label(index);
        Self {
            task_id: task.id.clone(),
            description: stage.clone(),
            stage,
            step: index,
            total_steps,
            progress: progress_percent(index, total_steps),
            timestamp: epoch_seconds(at),
        }
    }
}

impl ResultReport {
    /// Build the final report from the task outcome and run window
    pub fn for_task(task: &TaskDefinition, started: DateTime<Utc>, finished: DateTime<Utc>) -> Self {
        let started_at = epoch_seconds(started);
        let finished_at = epoch_seconds(finished);
        Self {
            task_id: task.id.clone(),
            success: task.result.is_success(),
            status: task.result.status.clone(),
            output: task.result.output.clone(),
            error: task.result.error_message(),
            started_at,
            finished_at,
            duration: finished_at - started_at,
        }
    }
}

/// Percent complete after `step` of `total` steps, rounded down
pub fn progress_percent(step: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (step.min(total) * 100 / total) as u8
}

/// Unix epoch seconds with microsecond precision
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}
