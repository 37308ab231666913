use std::sync::Arc;

use fivemind_shell::{
    app_constants::MAIN_WINDOW_LABEL, origin_policy, HostInfo, ShellConfig, ShellCoordinator,
    ShellEvent,
};
use tauri::{webview::PageLoadEvent, AppHandle, Manager, RunEvent, WindowEvent};

use crate::{
    desktop_bridge_commands, logging, panic_guard, reachability, remote_capability, runtime_paths,
    window_actions::{self, TauriSurfaces},
    ShellChannel,
};

fn send_event(app_handle: &AppHandle, event: ShellEvent) {
    match app_handle.try_state::<ShellChannel>() {
        Some(channel) => channel.send(event),
        None => tracing::debug!(target: "startup", "event before shell setup dropped: {event:?}"),
    }
}

pub(crate) fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app_handle, _argv, _cwd| {
            tracing::info!(target: "startup", "second launch folded into the running instance");
            window_actions::focus_main_window(app_handle);
        }))
        .invoke_handler(tauri::generate_handler![
            desktop_bridge_commands::shell_splash_ready,
            desktop_bridge_commands::shell_execute_task,
            desktop_bridge_commands::shell_fetch_logs,
            desktop_bridge_commands::shell_retry_load,
        ])
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }

            match event {
                WindowEvent::Resized(_)
                | WindowEvent::Moved(_)
                | WindowEvent::CloseRequested { .. } => {
                    match window_actions::geometry_event(window) {
                        Ok(Some(event)) => send_event(window.app_handle(), event),
                        Ok(None) => {}
                        Err(error) => tracing::warn!(
                            target: "lifecycle",
                            "failed to read main window geometry: {error}"
                        ),
                    }
                }
                _ => {}
            }
        })
        .on_page_load(|webview, payload| {
            if webview.label() != MAIN_WINDOW_LABEL {
                return;
            }
            let Some(channel) = webview.app_handle().try_state::<ShellChannel>() else {
                return;
            };

            let url = payload.url();
            let trusted = origin_policy::is_trusted_url(url.as_str(), channel.trusted_origin());
            match payload.event() {
                PageLoadEvent::Started => {
                    tracing::debug!(target: "lifecycle", "page-load started: {url}");
                    if trusted {
                        reachability::spawn_probe(channel.handle().clone(), url.clone());
                    }
                }
                PageLoadEvent::Finished => {
                    tracing::debug!(target: "lifecycle", "page-load finished: {url}");
                    if trusted || runtime_paths::is_local_surface_url(url) {
                        channel.send(ShellEvent::MainContentReady);
                    }
                }
            }
        })
        .setup(|app| {
            let app_handle = app.handle().clone();
            let config = ShellConfig::from_env(runtime_paths::default_data_dir(&app_handle));
            let log_guard = match logging::init_logging(&config.data_dir) {
                Ok(guard) => Some(guard),
                Err(error) => {
                    eprintln!("{error}");
                    None
                }
            };

            let host = HostInfo {
                app_version: app_handle.package_info().version.to_string(),
                runtime_version: tauri::VERSION.to_string(),
            };
            tracing::info!(
                target: "startup",
                "desktop process starting: app {} on tauri {}",
                host.app_version,
                host.runtime_version
            );

            let trusted_origin = config.trusted_origin.clone();
            if let Err(error) =
                remote_capability::grant_trusted_origin(&app_handle, &trusted_origin)
            {
                tracing::error!(target: "startup", "{error}");
            }
            let surfaces = Arc::new(TauriSurfaces::new(app_handle.clone()));
            let (coordinator, handle) = ShellCoordinator::new(config, host, surfaces);
            panic_guard::install(handle.clone());
            app.manage(ShellChannel::new(handle, trusted_origin, log_guard));
            tauri::async_runtime::spawn(coordinator.run());
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::Ready => send_event(app_handle, ShellEvent::ProcessReady),
            // `code` is set only for explicit exits; `None` means the last window closed.
            RunEvent::ExitRequested { api, code, .. } => {
                if code.is_none() {
                    api.prevent_exit();
                    send_event(app_handle, ShellEvent::AllWindowsClosed);
                }
            }
            #[cfg(target_os = "macos")]
            RunEvent::Reopen { .. } => send_event(app_handle, ShellEvent::Reactivated),
            RunEvent::Exit => {
                tracing::info!(target: "shutdown", "desktop process exiting");
                send_event(app_handle, ShellEvent::Shutdown);
            }
            _ => {}
        });
}
