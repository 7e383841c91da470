//! The bridge between the page and the host.
//!
//! [`Bridge`] implements every operation the page can call. It owns the
//! in-flight task map and the sending half of the completion channel; the
//! receiving half is drained by [`dispatch_completions`], which removes the
//! finished task and pushes a [`PageEvent`] through the [`PageNotifier`].
//!
//! The page and the native dialogs are behind the [`PageNotifier`] and
//! [`FilePicker`] traits so the bridge runs unchanged under test.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

use crate::codec;
use crate::error::{BridgeError, Result};
use crate::task::{BackgroundTask, TaskCompletion, TaskHandle};

/// Task id used when a loaded game is pushed to the page.
pub const LOAD_GAME_TASK_ID: &str = "loadGameState";

pub const TASK_COMPLETED_EVENT: &str = "bridge:task-completed";
pub const CONSOLE_EVENT: &str = "bridge:console";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Error,
}

/// An unsolicited message for the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum PageEvent {
    TaskCompleted { task_id: String, result: String },
    Console { level: ConsoleLevel, message: String },
}

impl PageEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PageEvent::TaskCompleted { .. } => TASK_COMPLETED_EVENT,
            PageEvent::Console { .. } => CONSOLE_EVENT,
        }
    }

    fn console(level: ConsoleLevel, message: impl Into<String>) -> Self {
        PageEvent::Console {
            level,
            message: message.into(),
        }
    }
}

/// Delivers events into the page.
///
/// Implementations hand the event to the thread that owns the page. A page
/// with no handler for the event drops it silently.
pub trait PageNotifier: Send + Sync + 'static {
    fn push(&self, event: PageEvent);
}

/// Asks the user where to save or load a game. `None` means cancelled.
pub trait FilePicker {
    fn pick_save_path(&self) -> Option<PathBuf>;
    fn pick_open_path(&self) -> Option<PathBuf>;
}

/// Receiving half of the completion channel, see [`dispatch_completions`].
#[derive(Debug)]
pub struct Completions(UnboundedReceiver<TaskCompletion>);

pub struct Bridge<N> {
    notifier: N,
    tasks: Mutex<HashMap<String, TaskHandle>>,
    completions: UnboundedSender<TaskCompletion>,
}

impl<N: PageNotifier> Bridge<N> {
    pub fn new(notifier: N) -> (Self, Completions) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let bridge = Self {
            notifier,
            tasks: Mutex::new(HashMap::new()),
            completions,
        };
        (bridge, Completions(receiver))
    }

    pub fn echo(&self, message: &str) -> String {
        codec::echo_reply(message)
    }

    /// Starts a delayed task; its completion reaches the page as
    /// `taskCompleted(taskId, result)`. Must be called inside the async
    /// runtime.
    pub fn start_long_task(&self, task_id: &str, duration_secs: f64) -> Result<()> {
        let mut tasks = self.tasks();
        if tasks.contains_key(task_id) {
            return Err(BridgeError::DuplicateTask(task_id.to_string()));
        }

        let handle = BackgroundTask::new(task_id, duration_secs)?.spawn(self.completions.clone())?;
        tasks.insert(task_id.to_string(), handle);
        info!(task_id, duration_secs, "started long task");
        Ok(())
    }

    pub fn process_data(&self, payload: &str) -> String {
        codec::process_payload(payload)
    }

    /// Writes the page's game state, pretty-printed, to a user-chosen file.
    /// Outcomes go to the log and the page console; nothing is returned.
    pub fn save_game_state(&self, picker: &impl FilePicker, payload: &str) {
        let Some(path) = picker.pick_save_path() else {
            info!("save cancelled");
            return;
        };

        match write_game_state(&path, payload) {
            Ok(()) => {
                info!(path = %path.display(), "Game state saved to {}", path.display());
                self.notifier
                    .push(PageEvent::console(ConsoleLevel::Log, "Game saved successfully"));
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "Error saving game state");
                self.notifier.push(PageEvent::console(
                    ConsoleLevel::Error,
                    format!("Error saving game: {err}"),
                ));
            }
        }
    }

    /// Reads a user-chosen save file. The raw text is both returned and
    /// pushed to the page as the `loadGameState` task; cancelling returns an
    /// empty string and pushes nothing.
    pub fn load_game_state(&self, picker: &impl FilePicker) -> String {
        let Some(path) = picker.pick_open_path() else {
            info!("load cancelled");
            return String::new();
        };

        match read_game_state(&path) {
            Ok(raw) => {
                info!(path = %path.display(), "Game state loaded from {}", path.display());
                self.notifier.push(PageEvent::TaskCompleted {
                    task_id: LOAD_GAME_TASK_ID.to_string(),
                    result: raw.clone(),
                });
                raw
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "Error loading game state");
                codec::error_envelope(&err.to_string())
            }
        }
    }

    /// Retires a finished task and tells the page about it.
    pub fn finish(&self, completion: TaskCompletion) {
        let removed = self.tasks().remove(&completion.task_id);
        let Some(handle) = removed else {
            warn!(task_id = %completion.task_id, "completion for untracked task dropped");
            return;
        };

        info!(
            task_id = %completion.task_id,
            state = ?handle.state(),
            duration_ms = handle.duration().as_millis() as u64,
            elapsed_ms = handle.elapsed().as_millis() as u64,
            "long task completed"
        );
        self.notifier.push(PageEvent::TaskCompleted {
            task_id: completion.task_id,
            result: completion.result,
        });
    }

    pub fn is_in_flight(&self, task_id: &str) -> bool {
        self.tasks().contains_key(task_id)
    }

    pub fn in_flight(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tasks().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<String, TaskHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Feeds completions into [`Bridge::finish`] until the bridge is dropped
/// and every running task has reported.
pub async fn dispatch_completions<N: PageNotifier>(bridge: Arc<Bridge<N>>, completions: Completions) {
    let Completions(mut receiver) = completions;
    // A strong reference here would keep the bridge's own sender alive.
    let weak = Arc::downgrade(&bridge);
    drop(bridge);
    while let Some(completion) = receiver.recv().await {
        match weak.upgrade() {
            Some(bridge) => bridge.finish(completion),
            None => break,
        }
    }
}

fn write_game_state(path: &Path, payload: &str) -> Result<()> {
    // Render first so a malformed payload never truncates an existing save.
    let document = codec::pretty_document(payload)?;
    fs::write(path, document).map_err(|err| BridgeError::io(path, err))
}

fn read_game_state(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| BridgeError::io(path, err))
}
