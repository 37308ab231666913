use fivemind_shell::{DiagnosticsReport, ShellEvent, TaskFailure, TaskOutput};
use serde_json::Value;
use tauri::State;

use crate::ShellChannel;

#[tauri::command]
pub(crate) fn shell_splash_ready(channel: State<'_, ShellChannel>) {
    channel.send(ShellEvent::SplashReady);
}

#[tauri::command]
pub(crate) fn shell_retry_load(channel: State<'_, ShellChannel>) {
    channel.send(ShellEvent::RetryLoad);
}

#[tauri::command]
pub(crate) async fn shell_execute_task(
    channel: State<'_, ShellChannel>,
    operation: String,
    args: Option<Vec<Value>>,
) -> Result<TaskOutput, TaskFailure> {
    channel
        .handle()
        .execute(operation, args.unwrap_or_default())
        .await
        .map_err(|error| TaskFailure::from(&error))
}

#[tauri::command]
pub(crate) async fn shell_fetch_logs(
    channel: State<'_, ShellChannel>,
) -> Result<DiagnosticsReport, String> {
    channel
        .handle()
        .fetch_diagnostics()
        .await
        .ok_or_else(|| "Shell coordinator is not running.".to_string())
}
