use std::time::Duration;

pub const DEFAULT_TRUSTED_ORIGIN: &str = "https://5mind.com/";
pub const TRUSTED_ORIGIN_ENV: &str = "FIVEMIND_TRUSTED_ORIGIN";
pub const DATA_DIR_ENV: &str = "FIVEMIND_DATA_DIR";
pub const LOG_FILTER_ENV: &str = "FIVEMIND_LOG";

pub const SPLASH_WINDOW_LABEL: &str = "splash";
pub const MAIN_WINDOW_LABEL: &str = "main";

pub const SPLASH_PAGE: &str = "splash.html";
pub const OFFLINE_PAGE: &str = "offline.html";
pub const ERROR_PAGE: &str = "error.html";

pub const HIDE_SPLASH_EVENT: &str = "hide-splash";

pub const ERROR_LOG_FILE: &str = "error.log";
pub const WINDOW_STATE_FILE: &str = "window-state.json";
pub const DESKTOP_LOG_FILE: &str = "desktop.log";

pub const DEFAULT_WINDOW_WIDTH: u32 = 1200;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 800;
pub const SPLASH_WINDOW_SIZE: f64 = 400.0;

pub const MAIN_READY_TIMEOUT: Duration = Duration::from_secs(10);
pub const LOAD_FAILURE_GRACE: Duration = Duration::from_millis(500);
pub const SPLASH_DESTROY_GRACE: Duration = Duration::from_millis(700);

pub const TASK_WORKER_THREAD_PREFIX: &str = "shell-task-";

pub const RENDERER_CRASH_MESSAGE: &str = "Renderer process crashed";
pub const UNCAUGHT_FAULT_MESSAGE: &str = "Uncaught fault";
