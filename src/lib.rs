//! Lifecycle orchestration and background-task core of the 5mind desktop shell.
//!
//! The host (a Tauri binary in `src-tauri/`) implements [`ShellSurfaces`] and
//! forwards window/process signals as [`ShellEvent`]s; everything else lives
//! here so it can be exercised without a webview.

pub mod app_constants;
pub mod coordinator;
pub mod error_log;
pub mod lifecycle;
pub mod offline_recovery;
pub mod origin_policy;
pub mod shell_config;
pub mod surfaces;
pub mod task;
pub mod task_executor;
pub mod window_state;

pub use coordinator::{
    DiagnosticsReport, HostInfo, ShellCoordinator, ShellEvent, ShellHandle, ShellSnapshot,
};
pub use error_log::{ErrorLogEntry, ErrorLogStore};
pub use lifecycle::{LifecycleAction, LifecycleMachine, LifecycleState};
pub use offline_recovery::{LoadFailure, OfflineRecoveryController, RecoveryPlan};
pub use shell_config::ShellConfig;
pub use surfaces::{ShellSurfaces, SurfaceTarget};
pub use task::{TaskError, TaskFailure, TaskOperation, TaskOutput, TaskRequest, TaskResult};
pub use task_executor::{is_task_worker_thread, BackgroundTaskExecutor, TaskCompletion};
pub use window_state::{WindowBounds, WindowState, WindowStateStore};
