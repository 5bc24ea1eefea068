use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database connection error: {0}")]
    Connection(sqlx::Error),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Concurrent update conflict after {attempts} attempts: {source}")]
    Conflict { attempts: u32, source: sqlx::Error },

    #[error("Batch write failed after {inserted} rows were committed: {source}")]
    BatchWrite { inserted: i64, source: Box<Error> },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Rows already committed when the error surfaced. Committed batches are
    /// never rolled back, so this is the count the store actually holds.
    pub fn inserted_before_failure(&self) -> Option<i64> {
        match self {
            Error::BatchWrite { inserted, .. } => Some(*inserted),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Connection(err) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
            Error::Conflict { .. } => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            Error::BatchWrite { .. } => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Error::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Config(msg) | Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

fn is_connection_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
    )
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            Error::Connection(err)
        } else {
            Error::Database(err)
        }
    }
}
