//! Native save/open dialogs for game files.

use std::path::PathBuf;

use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_dialog::{DialogExt, FileDialogBuilder, FilePath};
use tracing::warn;

use crate::bridge::FilePicker;

pub const SAVE_TITLE: &str = "Save Game State";
pub const LOAD_TITLE: &str = "Load Game State";
pub const DEFAULT_SAVE_NAME: &str = "game_save.json";

const FILTER_NAME: &str = "JSON Files";
const FILTER_EXTENSIONS: &[&str] = &["json"];

/// Blocking dialogs; call from an async command, never from the main thread.
pub struct DialogPicker<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> DialogPicker<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self { app }
    }

    fn builder(&self, title: &str) -> FileDialogBuilder<R> {
        let builder = self
            .app
            .dialog()
            .file()
            .set_title(title)
            .add_filter(FILTER_NAME, FILTER_EXTENSIONS);
        match self.app.path().home_dir() {
            Ok(home) => builder.set_directory(home),
            Err(err) => {
                warn!(error = %err, "home directory unavailable for file dialog");
                builder
            }
        }
    }
}

impl<R: Runtime> FilePicker for DialogPicker<R> {
    fn pick_save_path(&self) -> Option<PathBuf> {
        self.builder(SAVE_TITLE)
            .set_file_name(DEFAULT_SAVE_NAME)
            .blocking_save_file()
            .and_then(into_local_path)
    }

    fn pick_open_path(&self) -> Option<PathBuf> {
        self.builder(LOAD_TITLE)
            .blocking_pick_file()
            .and_then(into_local_path)
    }
}

fn into_local_path(picked: FilePath) -> Option<PathBuf> {
    match picked.into_path() {
        Ok(path) => Some(path),
        Err(err) => {
            warn!(error = %err, "dialog returned a non-local path");
            None
        }
    }
}
