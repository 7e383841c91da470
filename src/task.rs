//! Background task runner.
//!
//! A task is a named delay: it sleeps on the async runtime for its duration
//! and then reports exactly one [`TaskCompletion`] on the channel it was
//! spawned with. Nothing here touches the page; the bridge decides what a
//! completion means.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    pub task_id: String,
    pub result: String,
}

/// Whole numbers keep their fraction ("2.0"); very small or large values
/// switch to Rust's exponent form ("1e-5", "1e20").
pub fn completion_message(task_id: &str, duration_secs: f64) -> String {
    format!("Task {task_id} completed after {duration_secs:?} seconds!")
}

pub fn parse_duration(duration_secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(duration_secs)
        .map_err(|_| BridgeError::InvalidDuration(duration_secs))
}

#[derive(Debug)]
pub struct BackgroundTask {
    task_id: String,
    duration_secs: f64,
    duration: Duration,
    state: Arc<Mutex<TaskState>>,
}

impl BackgroundTask {
    pub fn new(task_id: impl Into<String>, duration_secs: f64) -> Result<Self> {
        Ok(Self {
            task_id: task_id.into(),
            duration_secs,
            duration: parse_duration(duration_secs)?,
            state: Arc::new(Mutex::new(TaskState::Created)),
        })
    }

    pub fn state(&self) -> TaskState {
        read_state(&self.state)
    }

    /// Starts the delay on the runtime current at the call site.
    pub fn spawn(self, completions: UnboundedSender<TaskCompletion>) -> Result<TaskHandle> {
        let runtime =
            Handle::try_current().map_err(|_| BridgeError::NoRuntime(self.task_id.clone()))?;

        let Self {
            task_id,
            duration_secs,
            duration,
            state,
        } = self;

        set_state(&state, TaskState::Running);
        debug!(task_id = %task_id, duration_secs, "background task running");

        let task_state = Arc::clone(&state);
        runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            let completion = TaskCompletion {
                result: completion_message(&task_id, duration_secs),
                task_id,
            };
            if let Err(err) = completions.send(completion) {
                warn!(task_id = %err.0.task_id, "completion dropped: bridge is gone");
            }
            set_state(&task_state, TaskState::Completed);
        });

        Ok(TaskHandle {
            duration,
            started_at: Instant::now(),
            state,
        })
    }
}

/// Tracking entry for a running task. The task itself is detached.
#[derive(Debug)]
pub struct TaskHandle {
    duration: Duration,
    started_at: Instant,
    state: Arc<Mutex<TaskState>>,
}

impl TaskHandle {
    pub fn state(&self) -> TaskState {
        read_state(&self.state)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

fn read_state(state: &Mutex<TaskState>) -> TaskState {
    *state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_state(state: &Mutex<TaskState>, next: TaskState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
}
