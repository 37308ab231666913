use fivemind_shell::{ShellEvent, ShellHandle};
use tracing_appender::non_blocking::WorkerGuard;
use url::Url;

/// Managed state shared by commands and window hooks.
pub(crate) struct ShellChannel {
    handle: ShellHandle,
    trusted_origin: Url,
    // Dropping the guard stops the file writer.
    _log_guard: Option<WorkerGuard>,
}

impl ShellChannel {
    pub(crate) fn new(handle: ShellHandle, trusted_origin: Url, log_guard: Option<WorkerGuard>) -> Self {
        Self {
            handle,
            trusted_origin,
            _log_guard: log_guard,
        }
    }

    pub(crate) fn handle(&self) -> &ShellHandle {
        &self.handle
    }

    pub(crate) fn trusted_origin(&self) -> &Url {
        &self.trusted_origin
    }

    pub(crate) fn send(&self, event: ShellEvent) {
        if !self.handle.send(event) {
            tracing::warn!(target: "shutdown", "shell coordinator stopped; event dropped");
        }
    }
}
