use std::{env, path::PathBuf};

use tauri::{AppHandle, Manager};
use url::Url;

const FALLBACK_DATA_DIR_NAME: &str = "5mind";

#[cfg(target_os = "windows")]
const LOCAL_SURFACE_BASE: &str = "http://tauri.localhost/";
#[cfg(not(target_os = "windows"))]
const LOCAL_SURFACE_BASE: &str = "tauri://localhost/";

pub(crate) fn default_data_dir(app_handle: &AppHandle) -> PathBuf {
    match app_handle.path().app_data_dir() {
        Ok(path) => path,
        Err(error) => {
            let fallback = env::temp_dir().join(FALLBACK_DATA_DIR_NAME);
            eprintln!(
                "failed to resolve app data dir ({error}); using {}",
                fallback.display()
            );
            fallback
        }
    }
}

/// URL of a page bundled with the app, as the webview sees it.
pub(crate) fn local_surface_url(page: &str) -> Result<Url, String> {
    Url::parse(LOCAL_SURFACE_BASE)
        .and_then(|base| base.join(page))
        .map_err(|error| format!("Invalid local surface '{page}': {error}"))
}

pub(crate) fn is_local_surface_url(url: &Url) -> bool {
    match url.scheme() {
        "tauri" => url.host_str() == Some("localhost"),
        "http" | "https" => url.host_str() == Some("tauri.localhost"),
        _ => false,
    }
}
