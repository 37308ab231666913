use std::{any::Any, panic};

use fivemind_shell::{is_task_worker_thread, ShellEvent, ShellHandle};

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Routes panics outside task workers into the coordinator as uncaught faults.
/// Worker panics are already caught and reported by the executor.
pub(crate) fn install(handle: ShellHandle) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        previous(info);
        if is_task_worker_thread() {
            return;
        }

        let message = panic_message(info.payload());
        let detail = info
            .location()
            .map(|location| location.to_string())
            .unwrap_or_default();
        tracing::error!(target: "shutdown", "uncaught panic: {message} at {detail}");
        handle.send(ShellEvent::UncaughtFault { message, detail });
    }));
}
