#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_runtime;
mod app_types;
mod desktop_bridge_commands;
mod logging;
mod panic_guard;
mod reachability;
mod remote_capability;
mod runtime_paths;
mod window_actions;

pub(crate) use app_types::ShellChannel;

fn main() {
    app_runtime::run();
}
