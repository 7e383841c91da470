//! IPC commands behind the page's `bridge` object.
//!
//! Every command answers with a plain value. Failures are logged, pushed to
//! the page console or folded into an error envelope by the bridge, so the
//! page never sees a rejected invoke.

use std::sync::Arc;

use tauri::{AppHandle, Manager, State};
use tracing::warn;

use crate::dialog::DialogPicker;
use crate::shell::AppBridge;

#[tauri::command]
pub fn echo(bridge: State<'_, Arc<AppBridge>>, message: String) -> String {
    bridge.echo(&message)
}

/// Async so the task is spawned on the runtime that drives the bridge.
#[tauri::command]
pub async fn start_long_task(app: AppHandle, task_id: String, duration_seconds: f64) {
    let bridge = app.state::<Arc<AppBridge>>();
    if let Err(err) = bridge.start_long_task(&task_id, duration_seconds) {
        warn!(task_id = %task_id, error = %err, "long task not started");
    }
}

#[tauri::command]
pub fn process_data(bridge: State<'_, Arc<AppBridge>>, payload: String) -> String {
    bridge.process_data(&payload)
}

#[tauri::command]
pub async fn save_game_state(app: AppHandle, game_state: String) {
    let picker = DialogPicker::new(app.clone());
    app.state::<Arc<AppBridge>>()
        .save_game_state(&picker, &game_state);
}

#[tauri::command]
pub async fn load_game_state(app: AppHandle) -> String {
    let picker = DialogPicker::new(app.clone());
    app.state::<Arc<AppBridge>>().load_game_state(&picker)
}
