use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::Serialize;
use serde_json::Value;
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    task::JoinHandle,
};

use crate::{
    app_constants::{
        LOAD_FAILURE_GRACE, MAIN_READY_TIMEOUT, MAIN_WINDOW_LABEL, SPLASH_DESTROY_GRACE,
        UNCAUGHT_FAULT_MESSAGE,
    },
    error_log::{ErrorLogEntry, ErrorLogStore},
    lifecycle::{LifecycleAction, LifecycleMachine, LifecycleState},
    offline_recovery::{LoadFailure, OfflineRecoveryController, RecoveryPlan},
    shell_config::ShellConfig,
    surfaces::{ShellSurfaces, SurfaceTarget},
    task::{TaskError, TaskOutput, TaskRequest, TaskResult},
    task_executor::{BackgroundTaskExecutor, TaskCompletion},
    window_state::{WindowBounds, WindowState, WindowStateStore},
};

#[derive(Debug, Clone)]
pub struct HostInfo {
    pub app_version: String,
    pub runtime_version: String,
}

/// Payload of the `fetch-logs` channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
    pub logs: Vec<ErrorLogEntry>,
    pub app_version: String,
    pub runtime_version: String,
    pub platform: String,
    pub arch: String,
    pub user_data: String,
    pub log_file: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellSnapshot {
    pub lifecycle: LifecycleState,
    pub log_entries: usize,
    pub workers_spawned: u64,
    pub window_state: WindowState,
    pub retry_attempts: u32,
}

#[derive(Debug)]
pub enum ShellEvent {
    ProcessReady,
    SplashReady,
    MainContentReady,
    MainLoadFailed(LoadFailure),
    RendererCrashed,
    UncaughtFault {
        message: String,
        detail: String,
    },
    RetryLoad,
    /// Sent on every resize, move and close of the main window.
    MainWindowGeometry {
        bounds: WindowBounds,
        is_maximized: bool,
        is_full_screen: bool,
    },
    AllWindowsClosed,
    Reactivated,
    ExecuteTask {
        operation: String,
        args: Vec<Value>,
        reply: oneshot::Sender<TaskResult>,
    },
    FetchDiagnostics {
        reply: oneshot::Sender<DiagnosticsReport>,
    },
    Snapshot {
        reply: oneshot::Sender<ShellSnapshot>,
    },
    ReadyTimeoutElapsed {
        epoch: u64,
    },
    ForcedShowDue {
        epoch: u64,
    },
    SplashDestroyDue {
        epoch: u64,
    },
    Shutdown,
}

/// Cloneable entry point into the coordinator.
#[derive(Debug, Clone)]
pub struct ShellHandle {
    events: UnboundedSender<ShellEvent>,
}

impl ShellHandle {
    /// Returns false once the coordinator has stopped.
    pub fn send(&self, event: ShellEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub async fn execute(&self, operation: impl Into<String>, args: Vec<Value>) -> TaskResult {
        let (reply, response) = oneshot::channel();
        if !self.send(ShellEvent::ExecuteTask {
            operation: operation.into(),
            args,
            reply,
        }) {
            return Err(TaskError::CoordinatorUnavailable);
        }
        response
            .await
            .unwrap_or(Err(TaskError::CoordinatorUnavailable))
    }

    pub async fn fetch_diagnostics(&self) -> Option<DiagnosticsReport> {
        let (reply, response) = oneshot::channel();
        if !self.send(ShellEvent::FetchDiagnostics { reply }) {
            return None;
        }
        response.await.ok()
    }

    pub async fn snapshot(&self) -> Option<ShellSnapshot> {
        let (reply, response) = oneshot::channel();
        if !self.send(ShellEvent::Snapshot { reply }) {
            return None;
        }
        response.await.ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InternalTask {
    FailureLog,
    CrashLog,
    FaultLog,
    StartupLog,
    GeometryPersist,
    ErrorSurface,
}

enum TaskOrigin {
    Caller(oneshot::Sender<TaskResult>),
    Internal(InternalTask),
}

/// Owns every piece of mutable shell state and is driven only by messages.
///
/// Nothing here blocks: window calls are fire-and-forget on the host, timers
/// are detached sleeps that post back into the event channel, and every
/// side-effecting operation goes through the [`BackgroundTaskExecutor`].
pub struct ShellCoordinator {
    config: ShellConfig,
    host: HostInfo,
    surfaces: Arc<dyn ShellSurfaces>,
    lifecycle: LifecycleMachine,
    error_log: ErrorLogStore,
    window_state: WindowStateStore,
    executor: BackgroundTaskExecutor,
    recovery: OfflineRecoveryController,
    pending: HashMap<u64, TaskOrigin>,
    ready_timeout: Option<JoinHandle<()>>,
    handle: ShellHandle,
    events: UnboundedReceiver<ShellEvent>,
    completions: UnboundedReceiver<TaskCompletion>,
}

impl ShellCoordinator {
    pub fn new(
        config: ShellConfig,
        host: HostInfo,
        surfaces: Arc<dyn ShellSurfaces>,
    ) -> (Self, ShellHandle) {
        let (sender, events) = mpsc::unbounded_channel();
        let handle = ShellHandle { events: sender };
        let (executor, completions) = BackgroundTaskExecutor::new(
            config.error_log_path(),
            config.window_state_path(),
            Arc::clone(&surfaces),
        );

        let coordinator = Self {
            error_log: ErrorLogStore::new(config.error_log_path()),
            window_state: WindowStateStore::load(config.window_state_path()),
            recovery: OfflineRecoveryController::new(config.trusted_origin.clone()),
            lifecycle: LifecycleMachine::default(),
            pending: HashMap::new(),
            ready_timeout: None,
            handle: handle.clone(),
            config,
            host,
            surfaces,
            executor,
            events,
            completions,
        };
        (coordinator, handle)
    }

    pub async fn run(mut self) {
        tracing::info!(
            target: "startup",
            "shell coordinator started: trusted origin {}, data dir {}",
            self.config.trusted_origin,
            self.config.data_dir.display()
        );

        loop {
            tokio::select! {
                Some(event) = self.events.recv() => {
                    if !self.handle_event(event) {
                        break;
                    }
                }
                Some(completion) = self.completions.recv() => self.finish_task(completion),
                else => break,
            }
        }

        self.cancel_ready_timeout();
        tracing::info!(target: "shutdown", "shell coordinator stopped");
    }

    fn handle_event(&mut self, event: ShellEvent) -> bool {
        match event {
            ShellEvent::ProcessReady => {
                let actions = self
                    .lifecycle
                    .on_process_ready(self.surfaces.main_window_exists());
                if actions.is_empty() {
                    tracing::info!(
                        target: "lifecycle",
                        "process ready ignored in state {:?}",
                        self.lifecycle.state()
                    );
                }
                self.apply(actions)
            }
            ShellEvent::SplashReady => {
                let actions = self.lifecycle.on_splash_ready();
                if actions.is_empty() {
                    tracing::debug!(target: "lifecycle", "duplicate splash-ready signal ignored");
                } else {
                    tracing::info!(target: "lifecycle", "splash ready; creating main window");
                }
                self.apply(actions)
            }
            ShellEvent::MainContentReady => {
                let actions = self.lifecycle.on_main_ready();
                self.apply(actions)
            }
            ShellEvent::MainLoadFailed(failure) => self.handle_load_failure(failure),
            ShellEvent::RendererCrashed => {
                tracing::error!(target: "recovery", "renderer process crashed");
                let request = self.recovery.crash_log_request();
                self.dispatch_internal(request, InternalTask::CrashLog);
                self.activate_error_surface();
                true
            }
            ShellEvent::UncaughtFault { message, detail } => {
                let detail = if detail.is_empty() {
                    message
                } else {
                    format!("{message}\n{detail}")
                };
                self.dispatch_internal(
                    TaskRequest::log_error(UNCAUGHT_FAULT_MESSAGE, detail),
                    InternalTask::FaultLog,
                );
                self.activate_error_surface();
                true
            }
            ShellEvent::RetryLoad => {
                let target = self.recovery.retry_target();
                tracing::info!(
                    target: "recovery",
                    "retrying {} (attempt {})",
                    target.describe(),
                    self.recovery.retry_attempts()
                );
                if let Err(error) = self.surfaces.navigate(MAIN_WINDOW_LABEL, &target) {
                    tracing::warn!(target: "recovery", "retry navigation failed: {error}");
                    self.show_offline_surface();
                }
                true
            }
            ShellEvent::MainWindowGeometry {
                bounds,
                is_maximized,
                is_full_screen,
            } => {
                let state = self
                    .window_state
                    .track(bounds, is_maximized, is_full_screen);
                self.dispatch_internal(
                    TaskRequest::PersistWindowState { state },
                    InternalTask::GeometryPersist,
                );
                true
            }
            ShellEvent::AllWindowsClosed => {
                let actions = self
                    .lifecycle
                    .on_all_windows_closed(self.config.persistent_platform);
                tracing::info!(
                    target: "shutdown",
                    "all windows closed; lifecycle now {:?}",
                    self.lifecycle.state()
                );
                self.apply(actions)
            }
            ShellEvent::Reactivated => {
                let actions = self
                    .lifecycle
                    .on_reactivate(self.surfaces.open_window_count());
                self.apply(actions)
            }
            ShellEvent::ExecuteTask {
                operation,
                args,
                reply,
            } => {
                let main_window = self.main_window_snapshot();
                match self.executor.submit(&operation, &args, main_window) {
                    Ok(task_id) => {
                        self.pending.insert(task_id, TaskOrigin::Caller(reply));
                    }
                    Err(error) => {
                        tracing::warn!(target: "tasks", "rejected task '{operation}': {error}");
                        let _ = reply.send(Err(error));
                    }
                }
                true
            }
            ShellEvent::FetchDiagnostics { reply } => {
                let _ = reply.send(self.diagnostics());
                true
            }
            ShellEvent::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
                true
            }
            ShellEvent::ReadyTimeoutElapsed { epoch } => {
                let actions = self.lifecycle.on_ready_timeout(epoch);
                if !actions.is_empty() {
                    tracing::warn!(
                        target: "lifecycle",
                        "main window not ready after {}s; forcing show",
                        MAIN_READY_TIMEOUT.as_secs()
                    );
                }
                self.apply(actions)
            }
            ShellEvent::ForcedShowDue { epoch } => {
                let actions = self.lifecycle.on_forced_show_due(epoch);
                if !actions.is_empty() {
                    tracing::warn!(target: "lifecycle", "load failed while splash was up; forcing show");
                }
                self.apply(actions)
            }
            ShellEvent::SplashDestroyDue { epoch } => {
                if self.lifecycle.is_current_epoch(epoch) && self.surfaces.splash_exists() {
                    if let Err(error) = self.surfaces.destroy_splash() {
                        tracing::warn!(target: "lifecycle", "failed to destroy splash: {error}");
                    }
                }
                true
            }
            ShellEvent::Shutdown => false,
        }
    }

    fn handle_load_failure(&mut self, failure: LoadFailure) -> bool {
        match self.recovery.plan_for_load_failure(&failure) {
            RecoveryPlan::Ignore => {
                tracing::debug!(
                    target: "recovery",
                    "ignoring load failure outside trusted origin: {}",
                    failure.url
                );
                true
            }
            RecoveryPlan::ShowOffline { log } => {
                self.dispatch_internal(log, InternalTask::FailureLog);
                self.show_offline_surface();
                let actions = self.lifecycle.on_load_failure();
                self.apply(actions)
            }
        }
    }

    /// Dispatched right after the log request, without waiting for it: a
    /// stuck log write must not keep the window on a crashed page.
    fn activate_error_surface(&mut self) {
        self.dispatch_internal(
            TaskRequest::ActivateErrorSurface { window: None },
            InternalTask::ErrorSurface,
        );
    }

    fn show_offline_surface(&self) {
        if let Err(error) = self
            .surfaces
            .navigate(MAIN_WINDOW_LABEL, &SurfaceTarget::Offline)
        {
            tracing::warn!(target: "recovery", "failed to show offline surface: {error}");
        }
    }

    /// Applies transition effects in order. A failing effect is logged and the
    /// rest still run. Returns false when the process is exiting.
    fn apply(&mut self, actions: Vec<LifecycleAction>) -> bool {
        let mut keep_running = true;
        for action in actions {
            match action {
                LifecycleAction::CreateSplash => {
                    if let Err(error) = self.surfaces.create_splash() {
                        // Without a splash nobody will signal readiness; move on to the main window.
                        tracing::warn!(target: "lifecycle", "failed to create splash: {error}");
                        let follow_up = self.lifecycle.on_splash_ready();
                        keep_running &= self.apply(follow_up);
                    }
                }
                LifecycleAction::CreateMainWindow => {
                    let state = self.window_state.current().clone();
                    let target = self.recovery.trusted_origin().clone();
                    if let Err(error) = self.surfaces.create_main_window(&state, &target) {
                        self.dispatch_internal(
                            TaskRequest::log_error("Failed to load main URL", error),
                            InternalTask::StartupLog,
                        );
                    }
                }
                LifecycleAction::StartReadyTimeout => {
                    self.cancel_ready_timeout();
                    let epoch = self.lifecycle.epoch();
                    self.ready_timeout = Some(self.schedule(
                        MAIN_READY_TIMEOUT,
                        ShellEvent::ReadyTimeoutElapsed { epoch },
                    ));
                }
                LifecycleAction::ScheduleForcedShow => {
                    let epoch = self.lifecycle.epoch();
                    self.schedule(LOAD_FAILURE_GRACE, ShellEvent::ForcedShowDue { epoch });
                }
                LifecycleAction::CancelReadyTimeout => self.cancel_ready_timeout(),
                LifecycleAction::BeginHideSplash => {
                    if let Err(error) = self.surfaces.begin_hide_splash() {
                        tracing::warn!(target: "lifecycle", "failed to signal splash hide: {error}");
                    }
                }
                LifecycleAction::ScheduleSplashDestroy => {
                    let epoch = self.lifecycle.epoch();
                    self.schedule(SPLASH_DESTROY_GRACE, ShellEvent::SplashDestroyDue { epoch });
                }
                LifecycleAction::ShowMainWindow => {
                    if let Err(error) = self.surfaces.show_main_window() {
                        tracing::warn!(target: "lifecycle", "failed to show main window: {error}");
                    }
                }
                LifecycleAction::ExitProcess => {
                    tracing::info!(target: "shutdown", "last window closed; exiting");
                    self.surfaces.exit_process();
                    keep_running = false;
                }
            }
        }
        keep_running
    }

    fn schedule(&self, delay: Duration, event: ShellEvent) -> JoinHandle<()> {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.send(event);
        })
    }

    fn cancel_ready_timeout(&mut self) {
        if let Some(timer) = self.ready_timeout.take() {
            timer.abort();
        }
    }

    fn main_window_snapshot(&self) -> Option<&'static str> {
        self.surfaces
            .main_window_exists()
            .then_some(MAIN_WINDOW_LABEL)
    }

    fn dispatch_internal(&mut self, request: TaskRequest, kind: InternalTask) {
        let main_window = self.main_window_snapshot();
        match self.executor.dispatch(request, main_window) {
            Ok(task_id) => {
                self.pending.insert(task_id, TaskOrigin::Internal(kind));
            }
            Err(error) => self.finish_internal(kind, Err(error)),
        }
    }

    fn finish_task(&mut self, completion: TaskCompletion) {
        let unstarted = self.executor.complete(&completion, &mut self.error_log);
        self.route(completion);
        for failed in unstarted {
            self.route(failed);
        }
    }

    fn route(&mut self, completion: TaskCompletion) {
        match self.pending.remove(&completion.task_id) {
            Some(TaskOrigin::Caller(reply)) => {
                // Internal geometry writes come from the store already; a
                // caller's write becomes the new baseline.
                if let Ok(TaskOutput::WindowStatePersisted { state, .. }) = &completion.result {
                    self.window_state.adopt(state.clone());
                }
                // The caller may have gone away; the result is already merged.
                let _ = reply.send(completion.result);
            }
            Some(TaskOrigin::Internal(kind)) => self.finish_internal(kind, completion.result),
            None => tracing::debug!(
                target: "tasks",
                "completion for unknown task {} ({})",
                completion.task_id,
                completion.operation
            ),
        }
    }

    fn finish_internal(&self, kind: InternalTask, result: TaskResult) {
        match result {
            // Best effort: internal tasks have no caller, so a failure ends in the diagnostic log.
            Err(error) => {
                tracing::warn!(target: "tasks", "best-effort {kind:?} task failed: {error}")
            }
            Ok(TaskOutput::ErrorSurfaceActivated {
                navigated: false, ..
            }) => tracing::info!(
                target: "recovery",
                "error surface skipped: main window no longer exists"
            ),
            Ok(_) => {}
        }
    }

    fn diagnostics(&self) -> DiagnosticsReport {
        DiagnosticsReport {
            logs: self.error_log.entries().to_vec(),
            app_version: self.host.app_version.clone(),
            runtime_version: self.host.runtime_version.clone(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            user_data: self.config.data_dir.display().to_string(),
            log_file: self.error_log.log_file().display().to_string(),
        }
    }

    fn snapshot(&self) -> ShellSnapshot {
        ShellSnapshot {
            lifecycle: self.lifecycle.state(),
            log_entries: self.error_log.len(),
            workers_spawned: self.executor.workers_spawned(),
            window_state: self.window_state.current().clone(),
            retry_attempts: self.recovery.retry_attempts(),
        }
    }
}
