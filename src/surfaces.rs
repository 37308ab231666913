use url::Url;

use crate::window_state::WindowState;

/// Where a window can be pointed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceTarget {
    Remote(Url),
    Offline,
    Error,
}

impl SurfaceTarget {
    pub fn describe(&self) -> String {
        match self {
            Self::Remote(url) => url.to_string(),
            Self::Offline => "offline surface".to_string(),
            Self::Error => "error surface".to_string(),
        }
    }
}

/// The windowing host the coordinator drives. Implementations must tolerate
/// calls for windows that no longer exist: hiding or destroying a missing
/// splash is `Ok(())`.
///
/// Workers hold a shared reference to the host, hence `Send + Sync`.
pub trait ShellSurfaces: Send + Sync {
    fn create_splash(&self) -> Result<(), String>;
    fn splash_exists(&self) -> bool;
    /// Tells the splash surface to start its fade-out.
    fn begin_hide_splash(&self) -> Result<(), String>;
    fn destroy_splash(&self) -> Result<(), String>;

    fn main_window_exists(&self) -> bool;
    /// Creates the main window hidden, sized from `state`, loading `target`.
    fn create_main_window(&self, state: &WindowState, target: &Url) -> Result<(), String>;
    fn show_main_window(&self) -> Result<(), String>;

    fn window_alive(&self, label: &str) -> bool;
    fn navigate(&self, label: &str, target: &SurfaceTarget) -> Result<(), String>;

    fn open_window_count(&self) -> usize;
    fn exit_process(&self);
}
