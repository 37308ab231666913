use std::{fmt, str::FromStr};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{error_log::ErrorLogEntry, window_state::WindowState};

pub const LOG_ERROR_OPERATION: &str = "log-error";
pub const PERSIST_WINDOW_STATE_OPERATION: &str = "persist-window-state";
pub const ACTIVATE_ERROR_SURFACE_OPERATION: &str = "activate-error-surface";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOperation {
    LogError,
    PersistWindowState,
    ActivateErrorSurface,
}

impl TaskOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LogError => LOG_ERROR_OPERATION,
            Self::PersistWindowState => PERSIST_WINDOW_STATE_OPERATION,
            Self::ActivateErrorSurface => ACTIVATE_ERROR_SURFACE_OPERATION,
        }
    }
}

impl fmt::Display for TaskOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskOperation {
    type Err = TaskError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            LOG_ERROR_OPERATION => Ok(Self::LogError),
            PERSIST_WINDOW_STATE_OPERATION => Ok(Self::PersistWindowState),
            ACTIVATE_ERROR_SURFACE_OPERATION => Ok(Self::ActivateErrorSurface),
            other => Err(TaskError::UnknownOperation(other.to_string())),
        }
    }
}

/// The closed set of operations a worker can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRequest {
    LogError { message: String, detail: String },
    PersistWindowState { state: WindowState },
    /// `None` targets whichever main window exists when the task is dispatched.
    ActivateErrorSurface { window: Option<String> },
}

impl TaskRequest {
    pub fn log_error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::LogError {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn operation(&self) -> TaskOperation {
        match self {
            Self::LogError { .. } => TaskOperation::LogError,
            Self::PersistWindowState { .. } => TaskOperation::PersistWindowState,
            Self::ActivateErrorSurface { .. } => TaskOperation::ActivateErrorSurface,
        }
    }

    /// Builds a request from an operation name and positional arguments.
    pub fn parse(operation: &str, args: &[Value]) -> Result<Self, TaskError> {
        match operation.parse::<TaskOperation>()? {
            TaskOperation::LogError => {
                let message = match args.first() {
                    Some(Value::String(message)) if !message.trim().is_empty() => message.clone(),
                    _ => {
                        return Err(invalid_arguments(
                            TaskOperation::LogError,
                            "expected a non-empty message as the first argument",
                        ))
                    }
                };
                let detail = match args.get(1) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(detail)) => detail.clone(),
                    Some(other) => other.to_string(),
                };
                Ok(Self::LogError { message, detail })
            }
            TaskOperation::PersistWindowState => {
                let raw = args.first().cloned().ok_or_else(|| {
                    invalid_arguments(
                        TaskOperation::PersistWindowState,
                        "expected a window state object as the first argument",
                    )
                })?;
                let state: WindowState = serde_json::from_value(raw).map_err(|error| {
                    invalid_arguments(TaskOperation::PersistWindowState, &error.to_string())
                })?;
                if state.width == 0 || state.height == 0 {
                    return Err(invalid_arguments(
                        TaskOperation::PersistWindowState,
                        "width and height must be positive",
                    ));
                }
                Ok(Self::PersistWindowState { state })
            }
            TaskOperation::ActivateErrorSurface => match args.first() {
                None | Some(Value::Null) => Ok(Self::ActivateErrorSurface { window: None }),
                Some(Value::String(label)) if !label.trim().is_empty() => {
                    Ok(Self::ActivateErrorSurface {
                        window: Some(label.trim().to_string()),
                    })
                }
                Some(_) => Err(invalid_arguments(
                    TaskOperation::ActivateErrorSurface,
                    "expected an optional window label",
                )),
            },
        }
    }
}

fn invalid_arguments(operation: TaskOperation, reason: &str) -> TaskError {
    TaskError::InvalidArguments {
        operation: operation.as_str(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskOutput {
    /// `persisted` is false when the file append failed; the entry still
    /// reaches the in-memory log.
    Logged { entry: ErrorLogEntry, persisted: bool },
    WindowStatePersisted { path: String, state: WindowState },
    ErrorSurfaceActivated {
        window: Option<String>,
        navigated: bool,
    },
}

impl TaskOutput {
    pub fn log_entry(&self) -> Option<&ErrorLogEntry> {
        match self {
            Self::Logged { entry, .. } => Some(entry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("invalid arguments for '{operation}': {reason}")]
    InvalidArguments {
        operation: &'static str,
        reason: String,
    },
    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(String),
    #[error("worker fault: {message}")]
    WorkerFault {
        message: String,
        detail: Option<String>,
    },
    #[error("{message}")]
    OperationFailed {
        message: String,
        detail: Option<String>,
    },
    #[error("shell coordinator is not running")]
    CoordinatorUnavailable,
}

pub type TaskResult = Result<TaskOutput, TaskError>;

/// Serializable projection of [`TaskError`] handed back to surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&TaskError> for TaskFailure {
    fn from(error: &TaskError) -> Self {
        let (kind, detail) = match error {
            TaskError::UnknownOperation(_) => ("unknownOperation", None),
            TaskError::InvalidArguments { .. } => ("invalidArguments", None),
            TaskError::SpawnFailed(_) => ("spawnFailed", None),
            TaskError::WorkerFault { detail, .. } => ("workerFault", detail.clone()),
            TaskError::OperationFailed { detail, .. } => ("operationFailed", detail.clone()),
            TaskError::CoordinatorUnavailable => ("coordinatorUnavailable", None),
        };

        Self {
            kind,
            message: error.to_string(),
            detail,
        }
    }
}
