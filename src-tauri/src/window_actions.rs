use fivemind_shell::{
    app_constants::{
        ERROR_PAGE, HIDE_SPLASH_EVENT, MAIN_WINDOW_LABEL, OFFLINE_PAGE, SPLASH_PAGE,
        SPLASH_WINDOW_LABEL, SPLASH_WINDOW_SIZE,
    },
    ShellEvent, ShellSurfaces, SurfaceTarget, WindowBounds, WindowState,
};
use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindowBuilder, Window};
use url::Url;

use crate::runtime_paths;

const MAIN_WINDOW_TITLE: &str = "5mind";

/// [`ShellSurfaces`] over real Tauri webview windows.
pub(crate) struct TauriSurfaces {
    app_handle: AppHandle,
}

impl TauriSurfaces {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }

    fn resolve_target(target: &SurfaceTarget) -> Result<Url, String> {
        match target {
            SurfaceTarget::Remote(url) => Ok(url.clone()),
            SurfaceTarget::Offline => runtime_paths::local_surface_url(OFFLINE_PAGE),
            SurfaceTarget::Error => runtime_paths::local_surface_url(ERROR_PAGE),
        }
    }
}

impl ShellSurfaces for TauriSurfaces {
    fn create_splash(&self) -> Result<(), String> {
        WebviewWindowBuilder::new(
            &self.app_handle,
            SPLASH_WINDOW_LABEL,
            WebviewUrl::App(SPLASH_PAGE.into()),
        )
        .title(MAIN_WINDOW_TITLE)
        .inner_size(SPLASH_WINDOW_SIZE, SPLASH_WINDOW_SIZE)
        .resizable(false)
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .center()
        .build()
        .map(|_| ())
        .map_err(|error| format!("Failed to create splash window: {error}"))
    }

    fn splash_exists(&self) -> bool {
        self.window_alive(SPLASH_WINDOW_LABEL)
    }

    fn begin_hide_splash(&self) -> Result<(), String> {
        if !self.splash_exists() {
            return Ok(());
        }
        self.app_handle
            .emit_to(SPLASH_WINDOW_LABEL, HIDE_SPLASH_EVENT, ())
            .map_err(|error| format!("Failed to emit {HIDE_SPLASH_EVENT}: {error}"))
    }

    fn destroy_splash(&self) -> Result<(), String> {
        let Some(window) = self.app_handle.get_webview_window(SPLASH_WINDOW_LABEL) else {
            return Ok(());
        };
        window
            .destroy()
            .map_err(|error| format!("Failed to destroy splash window: {error}"))
    }

    fn main_window_exists(&self) -> bool {
        self.window_alive(MAIN_WINDOW_LABEL)
    }

    fn create_main_window(&self, state: &WindowState, target: &Url) -> Result<(), String> {
        let mut builder = WebviewWindowBuilder::new(
            &self.app_handle,
            MAIN_WINDOW_LABEL,
            WebviewUrl::External(target.clone()),
        )
        .title(MAIN_WINDOW_TITLE)
        .inner_size(f64::from(state.width), f64::from(state.height))
        .visible(false)
        .maximized(state.is_maximized)
        .fullscreen(state.is_full_screen);

        builder = match (state.x, state.y) {
            (Some(x), Some(y)) => builder.position(f64::from(x), f64::from(y)),
            _ => builder.center(),
        };

        builder
            .build()
            .map(|_| ())
            .map_err(|error| format!("Failed to create main window for {target}: {error}"))
    }

    fn show_main_window(&self) -> Result<(), String> {
        let window = self
            .app_handle
            .get_webview_window(MAIN_WINDOW_LABEL)
            .ok_or_else(|| "Main window not found.".to_string())?;
        window
            .show()
            .map_err(|error| format!("Failed to show main window: {error}"))?;
        if let Err(error) = window.set_focus() {
            tracing::debug!(target: "lifecycle", "failed to focus main window: {error}");
        }
        Ok(())
    }

    fn window_alive(&self, label: &str) -> bool {
        self.app_handle.get_webview_window(label).is_some()
    }

    fn navigate(&self, label: &str, target: &SurfaceTarget) -> Result<(), String> {
        let window = self
            .app_handle
            .get_webview_window(label)
            .ok_or_else(|| format!("Window '{label}' not found."))?;
        let url = Self::resolve_target(target)?;
        tracing::info!(target: "recovery", "navigating {label} to {}", target.describe());
        window
            .navigate(url)
            .map_err(|error| format!("Failed to navigate {label}: {error}"))
    }

    fn open_window_count(&self) -> usize {
        self.app_handle.webview_windows().len()
    }

    fn exit_process(&self) {
        self.app_handle.exit(0);
    }
}

/// Brings the main window forward, e.g. when a second instance is launched.
pub(crate) fn focus_main_window(app_handle: &AppHandle) {
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        tracing::info!(target: "startup", "focus skipped: main window not created yet");
        return;
    };

    if let Err(error) = window.unminimize() {
        tracing::warn!(target: "startup", "failed to unminimize main window: {error}");
    }
    if let Err(error) = window.show() {
        tracing::warn!(target: "startup", "failed to show main window: {error}");
    }
    if let Err(error) = window.set_focus() {
        tracing::warn!(target: "startup", "failed to focus main window: {error}");
    }
}

/// Current main-window geometry in logical pixels. `None` while minimized,
/// when the platform reports off-screen placeholder bounds.
pub(crate) fn geometry_event(window: &Window) -> Result<Option<ShellEvent>, String> {
    if window
        .is_minimized()
        .map_err(|error| format!("Failed to read minimized state: {error}"))?
    {
        return Ok(None);
    }

    let scale = window
        .scale_factor()
        .map_err(|error| format!("Failed to read scale factor: {error}"))?;
    let position = window
        .outer_position()
        .map_err(|error| format!("Failed to read window position: {error}"))?
        .to_logical::<f64>(scale);
    let size = window
        .inner_size()
        .map_err(|error| format!("Failed to read window size: {error}"))?
        .to_logical::<f64>(scale);
    let is_maximized = window
        .is_maximized()
        .map_err(|error| format!("Failed to read maximized state: {error}"))?;
    let is_full_screen = window
        .is_fullscreen()
        .map_err(|error| format!("Failed to read fullscreen state: {error}"))?;

    Ok(Some(ShellEvent::MainWindowGeometry {
        bounds: WindowBounds {
            x: position.x.round() as i32,
            y: position.y.round() as i32,
            width: size.width.round().max(0.0) as u32,
            height: size.height.round().max(0.0) as u32,
        },
        is_maximized,
        is_full_screen,
    }))
}
