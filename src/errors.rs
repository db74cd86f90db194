use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NoSuchTask(_) | TaskError::IndexOutOfRange(_) => Self::not_found(err.to_string()),
            _ => Self::bad_request(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Rejections from the task manager and record edits.
#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("task name must not be empty")]
    EmptyName,

    #[error("a task named '{0}' already exists")]
    DuplicateName(String),

    #[error("weight must be a positive number, got {0}")]
    InvalidWeight(f64),

    #[error("target '{0}' is not a valid HH:MM time")]
    InvalidTarget(String),

    #[error("start date {start} is after end date {end}")]
    InvalidWindow { start: String, end: String },

    #[error("select at least one day of the week")]
    NoDays,

    #[error("no task at position {0}")]
    IndexOutOfRange(usize),

    #[error("no task named '{0}'")]
    NoSuchTask(String),

    #[error("'{0}' is not a YYYY-MM-DD date")]
    InvalidDate(String),
}
