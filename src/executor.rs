//! Simulated task execution
//!
//! A run is a single forward pass:
//! Start → [simulate step → report status]* → report result → End.
//! The first failed delivery ends the run; nothing is sent after it.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::ExecutorConfig;
use crate::error::Result;
use crate::protocol::{ResultReport, StatusUpdate};
use crate::reporter::{HttpReporter, ReportSink};
use crate::task::TaskDefinition;

/// What a completed run reported
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub task_id: String,
    pub status_updates: usize,
    pub success: bool,
    pub duration: Duration,
}

/// Runs one simulated task against a report sink
pub struct TaskRunner<S: ReportSink> {
    task: TaskDefinition,
    sink: S,
}

impl<S: ReportSink> TaskRunner<S> {
    pub fn new(task: TaskDefinition, sink: S) -> Self {
        Self { task, sink }
    }

    pub fn task(&self) -> &TaskDefinition {
        &self.task
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Execute every step, then send the single result report
    pub async fn run(&self) -> Result<RunSummary> {
        let task = &self.task;
        let total_steps = task.total_steps();

        info!(
            task_id = %task.id,
            total_steps,
            expected_secs = task.total_duration().as_secs_f64(),
            "Starting task"
        );

        let started = Utc::now();

        for (offset, step) in task.steps.iter().enumerate() {
            let index = offset + 1;
            info!(
                step = index,
                total_steps,
                description = %step.label(index),
                duration_secs = step.duration_secs,
                "Executing step"
            );

            tokio::time::sleep(step.duration()).await;

            let update = StatusUpdate::for_step(task, index, step, Utc::now());
            self.sink.send_status(&update).await?;
        }

        let finished = Utc::now();
        let report = ResultReport::for_task(task, started, finished);
        self.sink.send_result(&report).await?;

        info!(
            task_id = %task.id,
            success = report.success,
            status = %report.status,
            duration_secs = report.duration,
            "Task completed"
        );

        Ok(RunSummary {
            task_id: task.id.clone(),
            status_updates: total_steps,
            success: report.success,
            duration: Duration::from_secs_f64(report.duration.max(0.0)),
        })
    }
}

/// Run the configured task against the configured backend
pub async fn execute(config: &ExecutorConfig) -> Result<RunSummary> {
    let reporter = HttpReporter::new(config)?;
    let runner = TaskRunner::new(config.task(), reporter);

    let span = info_span!(
        "run",
        run_id = %Uuid::new_v4(),
        task_id = %runner.task().id,
        backend = %config.base_url()
    );
    runner.run().instrument(span).await
}
