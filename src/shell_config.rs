use std::{env, path::PathBuf};

use url::Url;

use crate::{
    app_constants::{
        DATA_DIR_ENV, DEFAULT_TRUSTED_ORIGIN, ERROR_LOG_FILE, TRUSTED_ORIGIN_ENV,
        WINDOW_STATE_FILE,
    },
    origin_policy,
};

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub trusted_origin: Url,
    pub data_dir: PathBuf,
    /// Dock-style platforms keep the process alive with zero windows.
    pub persistent_platform: bool,
}

impl ShellConfig {
    pub fn from_env(default_data_dir: PathBuf) -> Self {
        Self::from_lookup(default_data_dir, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(default_data_dir: PathBuf, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let trusted_origin = origin_policy::normalize_origin_url(
            &lookup(TRUSTED_ORIGIN_ENV).unwrap_or_else(|| DEFAULT_TRUSTED_ORIGIN.to_string()),
            DEFAULT_TRUSTED_ORIGIN,
        );
        let data_dir = lookup(DATA_DIR_ENV)
            .map(|value| PathBuf::from(value.trim()))
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or(default_data_dir);

        Self {
            trusted_origin,
            data_dir,
            persistent_platform: cfg!(target_os = "macos"),
        }
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.data_dir.join(ERROR_LOG_FILE)
    }

    pub fn window_state_path(&self) -> PathBuf {
        self.data_dir.join(WINDOW_STATE_FILE)
    }
}
