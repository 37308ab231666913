use std::{
    any::Any,
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::Arc,
    thread,
};

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    app_constants::TASK_WORKER_THREAD_PREFIX,
    error_log::{self, ErrorLogEntry, ErrorLogStore},
    surfaces::{ShellSurfaces, SurfaceTarget},
    task::{TaskError, TaskOperation, TaskOutput, TaskRequest, TaskResult},
    window_state,
};

/// The single message a worker sends back before it exits.
#[derive(Debug)]
pub struct TaskCompletion {
    pub task_id: u64,
    pub operation: TaskOperation,
    pub result: TaskResult,
}

/// Everything a worker may touch. Built at spawn time and moved into the thread.
struct WorkerSnapshot {
    task_id: u64,
    log_file: PathBuf,
    window_state_file: PathBuf,
    main_window: Option<String>,
    surfaces: Arc<dyn ShellSurfaces>,
}

struct QueuedLog {
    task_id: u64,
    request: TaskRequest,
    main_window: Option<String>,
}

pub fn is_task_worker_thread() -> bool {
    thread::current()
        .name()
        .is_some_and(|name| name.starts_with(TASK_WORKER_THREAD_PREFIX))
}

/// Runs each operation on its own short-lived thread.
///
/// Log writes are serialized: while one `log-error` worker is running, later
/// log requests wait in a FIFO queue, so `error.log` and the in-memory log see
/// entries in the same order. Other operations run concurrently.
pub struct BackgroundTaskExecutor {
    log_file: PathBuf,
    window_state_file: PathBuf,
    surfaces: Arc<dyn ShellSurfaces>,
    completions: UnboundedSender<TaskCompletion>,
    next_task_id: u64,
    workers_spawned: u64,
    log_in_flight: Option<u64>,
    queued_logs: VecDeque<QueuedLog>,
}

impl BackgroundTaskExecutor {
    pub fn new(
        log_file: PathBuf,
        window_state_file: PathBuf,
        surfaces: Arc<dyn ShellSurfaces>,
    ) -> (Self, UnboundedReceiver<TaskCompletion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let executor = Self {
            log_file,
            window_state_file,
            surfaces,
            completions,
            next_task_id: 1,
            workers_spawned: 0,
            log_in_flight: None,
            queued_logs: VecDeque::new(),
        };
        (executor, receiver)
    }

    pub fn workers_spawned(&self) -> u64 {
        self.workers_spawned
    }

    pub fn queued_log_count(&self) -> usize {
        self.queued_logs.len()
    }

    /// Parses `(operation, args)` and dispatches it. Unknown names and bad
    /// arguments are rejected here, before any thread exists.
    pub fn submit(
        &mut self,
        operation: &str,
        args: &[Value],
        main_window: Option<&str>,
    ) -> Result<u64, TaskError> {
        let request = TaskRequest::parse(operation, args)?;
        self.dispatch(request, main_window)
    }

    /// Returns the task id whose [`TaskCompletion`] will later arrive on the
    /// receiver returned by [`BackgroundTaskExecutor::new`].
    pub fn dispatch(
        &mut self,
        request: TaskRequest,
        main_window: Option<&str>,
    ) -> Result<u64, TaskError> {
        let task_id = self.next_task_id;
        self.next_task_id += 1;
        let main_window = main_window.map(str::to_string);

        if request.operation() == TaskOperation::LogError {
            if self.log_in_flight.is_some() {
                self.queued_logs.push_back(QueuedLog {
                    task_id,
                    request,
                    main_window,
                });
                return Ok(task_id);
            }
            self.spawn_worker(task_id, request, main_window)?;
            self.log_in_flight = Some(task_id);
            return Ok(task_id);
        }

        self.spawn_worker(task_id, request, main_window)?;
        Ok(task_id)
    }

    /// Folds a finished task into shared state. Called on the coordinating task
    /// only, after the worker has sent its last message.
    ///
    /// Returns failures for queued log tasks that could not be started, so the
    /// caller can route them like any other completion.
    pub fn complete(
        &mut self,
        completion: &TaskCompletion,
        error_log: &mut ErrorLogStore,
    ) -> Vec<TaskCompletion> {
        if let Ok(output) = &completion.result {
            if let Some(entry) = output.log_entry() {
                error_log.record(entry.clone());
            }
        }

        if self.log_in_flight != Some(completion.task_id) {
            return Vec::new();
        }
        self.log_in_flight = None;

        let mut failed = Vec::new();
        while let Some(queued) = self.queued_logs.pop_front() {
            match self.spawn_worker(queued.task_id, queued.request, queued.main_window) {
                Ok(()) => {
                    self.log_in_flight = Some(queued.task_id);
                    break;
                }
                Err(error) => failed.push(TaskCompletion {
                    task_id: queued.task_id,
                    operation: TaskOperation::LogError,
                    result: Err(error),
                }),
            }
        }
        failed
    }

    fn spawn_worker(
        &mut self,
        task_id: u64,
        request: TaskRequest,
        main_window: Option<String>,
    ) -> Result<(), TaskError> {
        let operation = request.operation();
        let snapshot = WorkerSnapshot {
            task_id,
            log_file: self.log_file.clone(),
            window_state_file: self.window_state_file.clone(),
            main_window,
            surfaces: Arc::clone(&self.surfaces),
        };
        let completions = self.completions.clone();

        thread::Builder::new()
            .name(format!("{TASK_WORKER_THREAD_PREFIX}{task_id}"))
            .spawn(move || {
                let result =
                    match panic::catch_unwind(AssertUnwindSafe(|| run_operation(request, &snapshot)))
                    {
                        Ok(result) => result,
                        Err(payload) => Err(TaskError::WorkerFault {
                            message: panic_message(payload.as_ref()),
                            detail: Some(format!("{operation} worker (task {task_id})")),
                        }),
                    };

                // A closed channel means the coordinator is gone; nothing left to report to.
                let _ = completions.send(TaskCompletion {
                    task_id,
                    operation,
                    result,
                });
            })
            .map_err(|error| TaskError::SpawnFailed(error.to_string()))?;

        self.workers_spawned += 1;
        tracing::debug!(target: "tasks", "spawned {operation} worker for task {task_id}");
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "worker panicked with a non-string payload".to_string()
}

fn run_operation(request: TaskRequest, snapshot: &WorkerSnapshot) -> TaskResult {
    match request {
        TaskRequest::LogError { message, detail } => {
            let entry = ErrorLogEntry::now(message, detail);
            tracing::error!(target: "tasks", "{}", entry.to_log_block().trim_end());

            let persisted = match error_log::append_entry_to_file(&snapshot.log_file, &entry) {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(
                        target: "tasks",
                        "failed to append to error log {}: {error}",
                        snapshot.log_file.display()
                    );
                    false
                }
            };
            Ok(TaskOutput::Logged { entry, persisted })
        }
        TaskRequest::PersistWindowState { state } => {
            let path = &snapshot.window_state_file;
            window_state::write_window_state_file(path, &state, snapshot.task_id).map_err(
                |error| TaskError::OperationFailed {
                    message: format!("Failed to write window state {}: {error}", path.display()),
                    detail: None,
                },
            )?;
            Ok(TaskOutput::WindowStatePersisted {
                path: path.display().to_string(),
                state,
            })
        }
        TaskRequest::ActivateErrorSurface { window } => {
            let Some(label) = window.or_else(|| snapshot.main_window.clone()) else {
                return Ok(TaskOutput::ErrorSurfaceActivated {
                    window: None,
                    navigated: false,
                });
            };
            if !snapshot.surfaces.window_alive(&label) {
                return Ok(TaskOutput::ErrorSurfaceActivated {
                    window: Some(label),
                    navigated: false,
                });
            }

            snapshot
                .surfaces
                .navigate(&label, &SurfaceTarget::Error)
                .map_err(|error| TaskError::OperationFailed {
                    message: format!("Failed to open error surface in window '{label}'"),
                    detail: Some(error),
                })?;
            Ok(TaskOutput::ErrorSurfaceActivated {
                window: Some(label),
                navigated: true,
            })
        }
    }
}
