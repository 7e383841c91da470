//! Game bridge — a Tauri shell around a local demo page.
//!
//! Module structure:
//! - codec: JSON envelopes and pretty-printing
//! - task: background task runner
//! - bridge: the operations the page calls, plus page events
//! - dialog: native save/open dialogs
//! - commands: Tauri IPC handlers (page → host)
//! - shell: window, initial document and the `appdata` scheme

pub mod bridge;
pub mod codec;
pub mod commands;
pub mod dialog;
pub mod error;
pub mod shell;
pub mod task;

use std::path::PathBuf;
use std::sync::Arc;

use tauri::Manager;
use tauri_plugin_log::{log::LevelFilter, Target, TargetKind};
use tracing::{error, info};

use crate::bridge::Bridge;
use crate::shell::{ShellConfig, WebviewNotifier};

pub use crate::error::{BridgeError, Result};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let config = ShellConfig::default();
    let (document_root, root_error) = match config.document_root() {
        Ok(root) => (root, None),
        Err(err) => (PathBuf::from(&config.document_dir), Some(err)),
    };
    let scheme_root = document_root.clone();

    let log_plugin = tauri_plugin_log::Builder::new()
        .clear_targets()
        .level(LevelFilter::Info)
        .target(Target::new(TargetKind::Stdout))
        .target(Target::new(TargetKind::Webview))
        .build();

    tauri::Builder::default()
        .plugin(log_plugin)
        .plugin(tauri_plugin_dialog::init())
        .register_uri_scheme_protocol(shell::DOCUMENT_SCHEME, move |_ctx, request| {
            shell::serve_document(&scheme_root, request.uri().path())
        })
        .setup(move |app| {
            if let Some(err) = &root_error {
                error!(error = %err, "cannot locate executable; serving pages from the working directory");
            }
            info!(root = %document_root.display(), "starting game bridge");

            let notifier = WebviewNotifier::new(app.handle().clone(), config.label.clone());
            let (bridge, completions) = Bridge::new(notifier);
            let bridge = Arc::new(bridge);
            tauri::async_runtime::spawn(bridge::dispatch_completions(
                Arc::clone(&bridge),
                completions,
            ));
            app.manage(bridge);

            shell::open_main_window(app.handle(), &config, &document_root)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::echo,
            commands::start_long_task,
            commands::process_data,
            commands::save_game_state,
            commands::load_game_state
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
