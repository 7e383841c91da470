//! Host shell: the main window, the page it loads and the `appdata` scheme
//! the page is served from.

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tauri::http::header::CONTENT_TYPE;
use tauri::http::{Response, StatusCode};
use tauri::{AppHandle, Emitter, Runtime, Url, WebviewUrl, WebviewWindowBuilder};
use tracing::{error, info, warn};

use crate::bridge::{Bridge, PageEvent, PageNotifier};

pub type AppBridge = Bridge<WebviewNotifier>;

/// URI scheme serving the page directory next to the executable.
pub const DOCUMENT_SCHEME: &str = "appdata";

#[derive(Debug, Clone, PartialEq)]
pub struct ShellConfig {
    pub label: String,
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub document_dir: PathBuf,
    pub document: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            label: "main".to_string(),
            title: "JavaScript and Rust interfacing examples".to_string(),
            width: 1280.0,
            height: 720.0,
            document_dir: PathBuf::from("appdata"),
            document: "game_demo.html".to_string(),
        }
    }
}

impl ShellConfig {
    /// Page directory, resolved against the executable's directory.
    pub fn document_root(&self) -> io::Result<PathBuf> {
        let exe = std::env::current_exe()?;
        let exe_dir = exe
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent"))?;
        Ok(exe_dir.join(&self.document_dir))
    }
}

/// Pushes page events to one webview, always from the main thread.
pub struct WebviewNotifier {
    app: AppHandle,
    label: String,
}

impl WebviewNotifier {
    pub fn new(app: AppHandle, label: impl Into<String>) -> Self {
        Self {
            app,
            label: label.into(),
        }
    }
}

impl PageNotifier for WebviewNotifier {
    fn push(&self, event: PageEvent) {
        let app = self.app.clone();
        let label = self.label.clone();
        let scheduled = self.app.run_on_main_thread(move || {
            // Events without a page listener are dropped by the webview.
            if let Err(err) = app.emit_to(label.as_str(), event.name(), &event) {
                warn!(event = event.name(), error = %err, "page event not delivered");
            }
        });
        if let Err(err) = scheduled {
            warn!(error = %err, "main thread unavailable for page event");
        }
    }
}

/// Top-left corner that centers `window` on `screen`, in logical pixels.
pub fn centered_position(screen: (f64, f64), window: (f64, f64)) -> (f64, f64) {
    (
        ((screen.0 - window.0) / 2.0).floor(),
        ((screen.1 - window.1) / 2.0).floor(),
    )
}

/// The initial document, if it is present under `root`.
pub fn resolve_document(root: &Path, document: &str) -> Option<PathBuf> {
    let path = root.join(document);
    if path.is_file() {
        Some(path)
    } else {
        error!(path = %path.display(), "HTML file not found");
        None
    }
}

pub fn document_url(file: &str) -> Result<Url, Box<dyn Error>> {
    let base = if cfg!(any(windows, target_os = "android")) {
        format!("http://{DOCUMENT_SCHEME}.localhost/")
    } else {
        format!("{DOCUMENT_SCHEME}://localhost/")
    };
    Ok(Url::parse(&base)?.join(file)?)
}

pub fn open_main_window<R: Runtime>(
    app: &AppHandle<R>,
    config: &ShellConfig,
    root: &Path,
) -> Result<(), Box<dyn Error>> {
    let url = match resolve_document(root, &config.document) {
        Some(_) => document_url(&config.document)?,
        None => Url::parse("about:blank")?,
    };

    let mut builder = WebviewWindowBuilder::new(app, &config.label, WebviewUrl::External(url))
        .title(&config.title)
        .inner_size(config.width, config.height);

    builder = match app.primary_monitor()? {
        Some(monitor) => {
            let screen = monitor.size().to_logical::<f64>(monitor.scale_factor());
            let origin = monitor.position().to_logical::<f64>(monitor.scale_factor());
            let (x, y) = centered_position(
                (screen.width, screen.height),
                (config.width, config.height),
            );
            builder.position(origin.x + x, origin.y + y)
        }
        None => builder.center(),
    };

    builder.build()?;
    info!(label = %config.label, "main window opened");
    Ok(())
}

/// Answers one request on the `appdata` scheme.
pub fn serve_document(root: &Path, request_path: &str) -> Response<Vec<u8>> {
    let (status, content_type, body) = match load_asset(root, request_path) {
        Ok((body, content_type)) => (StatusCode::OK, content_type, body),
        Err(status) => {
            let reason = status.canonical_reason().unwrap_or("error");
            (status, "text/plain", reason.as_bytes().to_vec())
        }
    };
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .unwrap_or_else(|_| Response::new(Vec::new()))
}

/// Reads a file below `root`; paths that climb out of it are forbidden.
pub fn load_asset(root: &Path, request_path: &str) -> Result<(Vec<u8>, &'static str), StatusCode> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        warn!(path = request_path, "rejected path outside the page directory");
        return Err(StatusCode::FORBIDDEN);
    }

    let path = root.join(relative);
    if !path.is_file() {
        return Err(StatusCode::NOT_FOUND);
    }
    match fs::read(&path) {
        Ok(body) => Ok((body, content_type(&path))),
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to read page asset");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
