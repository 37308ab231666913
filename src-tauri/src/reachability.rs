use std::{io, net::TcpStream, time::Duration};

use fivemind_shell::{LoadFailure, ShellEvent, ShellHandle};
use url::Url;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// Chromium net error codes, so logs read the same as a webview failure.
const ERR_CONNECTION_REFUSED: i32 = -102;
const ERR_NAME_NOT_RESOLVED: i32 = -105;
const ERR_ADDRESS_UNREACHABLE: i32 = -109;
const ERR_CONNECTION_TIMED_OUT: i32 = -118;

fn load_failure(url: &Url, code: i32, name: &str, error: &io::Error) -> LoadFailure {
    LoadFailure {
        url: url.to_string(),
        code,
        description: format!("{name} ({error})"),
    }
}

fn classify_connect_error(url: &Url, error: &io::Error) -> LoadFailure {
    match error.kind() {
        io::ErrorKind::ConnectionRefused => {
            load_failure(url, ERR_CONNECTION_REFUSED, "ERR_CONNECTION_REFUSED", error)
        }
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
            load_failure(url, ERR_CONNECTION_TIMED_OUT, "ERR_CONNECTION_TIMED_OUT", error)
        }
        _ => load_failure(url, ERR_ADDRESS_UNREACHABLE, "ERR_ADDRESS_UNREACHABLE", error),
    }
}

/// TCP reachability of the host behind `url`; the webview itself reports no
/// portable fail-load signal.
pub(crate) fn probe_origin(url: &Url, timeout: Duration) -> Result<(), LoadFailure> {
    let addrs = url.socket_addrs(|| None).map_err(|error| {
        load_failure(url, ERR_NAME_NOT_RESOLVED, "ERR_NAME_NOT_RESOLVED", &error)
    })?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return Ok(()),
            Err(error) => last_error = Some(error),
        }
    }

    let error = last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    });
    Err(match error.kind() {
        io::ErrorKind::NotFound => {
            load_failure(url, ERR_NAME_NOT_RESOLVED, "ERR_NAME_NOT_RESOLVED", &error)
        }
        _ => classify_connect_error(url, &error),
    })
}

pub(crate) fn spawn_probe(handle: ShellHandle, url: Url) {
    tauri::async_runtime::spawn_blocking(move || {
        if let Err(failure) = probe_origin(&url, PROBE_TIMEOUT) {
            tracing::warn!(
                target: "recovery",
                "origin unreachable: {} ({})",
                failure.url,
                failure.description
            );
            handle.send(ShellEvent::MainLoadFailed(failure));
        }
    });
}
