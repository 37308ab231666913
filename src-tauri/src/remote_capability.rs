use fivemind_shell::app_constants::MAIN_WINDOW_LABEL;
use tauri::{ipc::CapabilityBuilder, AppHandle, Manager};
use url::Url;

const TRUSTED_ORIGIN_CAPABILITY: &str = "trusted-origin";

/// Remote URL patterns covering the origin host and its subdomains.
fn trusted_remote_patterns(origin: &Url) -> Vec<String> {
    let Some(host) = origin.host_str() else {
        return Vec::new();
    };
    let port = origin
        .port()
        .map(|port| format!(":{port}"))
        .unwrap_or_default();
    let scheme = origin.scheme();

    vec![
        format!("{scheme}://{host}{port}/*"),
        format!("{scheme}://*.{host}{port}/*"),
    ]
}

/// Grants IPC to the configured origin, which may be overridden at launch and
/// so cannot live in the static capability file.
pub(crate) fn grant_trusted_origin(app_handle: &AppHandle, origin: &Url) -> Result<(), String> {
    let patterns = trusted_remote_patterns(origin);
    if patterns.is_empty() {
        return Err(format!("Trusted origin {origin} has no host."));
    }

    let mut capability = CapabilityBuilder::new(TRUSTED_ORIGIN_CAPABILITY)
        .window(MAIN_WINDOW_LABEL)
        .permission("core:default");
    for pattern in patterns {
        capability = capability.remote(pattern);
    }

    app_handle
        .add_capability(capability)
        .map_err(|error| format!("Failed to grant IPC to {origin}: {error}"))
}
