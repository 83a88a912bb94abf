use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Event store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Event store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(_) | AppError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::Decode(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Kind of a non-fatal query failure carried inside a result body
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Empty or unusable event / transaction set
    NoData,
    /// No itemsets met the support threshold, even after relaxation
    ThresholdTooStrict,
    /// The event store could not be read; treated like an empty snapshot
    StoreUnavailable,
    /// A feed payload could not be decoded into a click event. Only reported
    /// by the ingestion worker; query results never carry it.
    DecodeError,
}

/// Structured failure returned alongside (empty) query results
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryError {
    pub kind: ErrorKind,
    pub message: String,
}

impl QueryError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoData, message)
    }

    pub fn threshold_too_strict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ThresholdTooStrict, message)
    }

    /// A failed store read; callers treat it like an empty snapshot
    pub fn store_unavailable(err: &AppError) -> Self {
        Self::new(
            ErrorKind::StoreUnavailable,
            format!("event store unavailable: {}", err),
        )
    }

    /// A feed payload the ingestion worker skipped
    pub fn decode_error(err: &AppError) -> Self {
        Self::new(
            ErrorKind::DecodeError,
            format!("undecodable click event: {}", err),
        )
    }

    /// HTTP status the front door uses when this error ends a request
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NoData | ErrorKind::ThresholdTooStrict | ErrorKind::DecodeError => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}
