use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::app_constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
    pub is_maximized: bool,
    pub is_full_screen: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            is_maximized: false,
            is_full_screen: false,
        }
    }
}

/// Raw bounds as reported by the main window, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Shape of the file on disk. Every field is optional so a partial file still
/// merges over the defaults instead of being rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedWindowState {
    x: Option<i64>,
    y: Option<i64>,
    width: Option<i64>,
    height: Option<i64>,
    is_maximized: Option<bool>,
    is_full_screen: Option<bool>,
}

fn coordinate(raw: Option<i64>) -> Option<i32> {
    raw.and_then(|value| i32::try_from(value).ok())
}

fn dimension(raw: Option<i64>, fallback: u32) -> u32 {
    raw.and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value > 0)
        .unwrap_or(fallback)
}

fn merge(persisted: PersistedWindowState, defaults: &WindowState) -> WindowState {
    WindowState {
        x: coordinate(persisted.x).or(defaults.x),
        y: coordinate(persisted.y).or(defaults.y),
        width: dimension(persisted.width, defaults.width),
        height: dimension(persisted.height, defaults.height),
        is_maximized: persisted.is_maximized.unwrap_or(defaults.is_maximized),
        is_full_screen: persisted.is_full_screen.unwrap_or(defaults.is_full_screen),
    }
}

/// Parses a state file body; `None` means the body is not a usable JSON object.
pub fn parse_window_state(raw: &str, defaults: &WindowState) -> Option<WindowState> {
    serde_json::from_str::<PersistedWindowState>(raw)
        .ok()
        .map(|persisted| merge(persisted, defaults))
}

/// Overwrites the state file through a temp file and a rename, so concurrent
/// writers never leave a torn file behind. `write_tag` keeps temp names apart.
pub fn write_window_state_file(path: &Path, state: &WindowState, write_tag: u64) -> io::Result<()> {
    if let Some(parent_dir) = path.parent() {
        fs::create_dir_all(parent_dir)?;
    }

    let serialized = serde_json::to_string_pretty(state)
        .map_err(|error| io::Error::new(ErrorKind::InvalidData, error))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "window-state.json".to_string());
    let temp_path = path.with_file_name(format!(".{file_name}.{write_tag}.tmp"));

    fs::write(&temp_path, serialized)?;
    if let Err(error) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(error);
    }
    Ok(())
}

/// Owner of the main window's geometry. The window only reports raw bounds;
/// this store decides what is remembered.
#[derive(Debug)]
pub struct WindowStateStore {
    state: WindowState,
}

impl WindowStateStore {
    /// Reads the persisted state. Missing, unreadable and corrupt files all
    /// yield the defaults.
    pub fn load(path: PathBuf) -> Self {
        let defaults = WindowState::default();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => parse_window_state(&raw, &defaults).unwrap_or_else(|| {
                tracing::warn!(
                    target: "startup",
                    "window state {} is corrupt; using defaults",
                    path.display()
                );
                defaults
            }),
            Err(error) if error.kind() == ErrorKind::NotFound => defaults,
            Err(error) => {
                tracing::warn!(
                    target: "startup",
                    "failed to read window state {}: {error}; using defaults",
                    path.display()
                );
                defaults
            }
        };

        Self { state }
    }

    pub fn current(&self) -> &WindowState {
        &self.state
    }

    /// Folds an observed resize/move/close into the remembered state and
    /// returns the snapshot to persist. While maximized or fullscreen only the
    /// flags move, so un-maximizing restores the last normal bounds.
    pub fn track(
        &mut self,
        bounds: WindowBounds,
        is_maximized: bool,
        is_full_screen: bool,
    ) -> WindowState {
        if !is_maximized && !is_full_screen && bounds.width > 0 && bounds.height > 0 {
            self.state.x = Some(bounds.x);
            self.state.y = Some(bounds.y);
            self.state.width = bounds.width;
            self.state.height = bounds.height;
        }
        self.state.is_maximized = is_maximized;
        self.state.is_full_screen = is_full_screen;
        self.state.clone()
    }

    /// Takes over a state that a caller persisted directly, so the next
    /// tracked event builds on it instead of on stale bounds.
    pub fn adopt(&mut self, state: WindowState) {
        self.state = state;
    }
}
