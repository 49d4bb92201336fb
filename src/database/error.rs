use std::fmt::{self, Display};

use thiserror::Error;
use warp::{http::StatusCode, reject::Reject};

#[derive(Debug)]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("Column not found: {e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl std::error::Error for QueryError {}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid {field}: {info}")]
    Validation { field: &'static str, info: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Authorization(String),

    #[error("Invalid session; {0}")]
    InvalidSession(String),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),
}

impl CoreError {
    pub fn validation(field: &'static str, info: impl Into<String>) -> Self {
        Self::Validation {
            field,
            info: info.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
            CoreError::InvalidSession(_) => StatusCode::UNAUTHORIZED,
            CoreError::Authorization(_) => StatusCode::FORBIDDEN,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translates a store error, mapping constraint violations onto the
    /// caller-visible taxonomy. `subject` names what was being written.
    pub fn from_store(e: sqlx::Error, subject: &str) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let message = db.message();
            if db.is_unique_violation() || message.contains("UNIQUE constraint failed") {
                return CoreError::Conflict(format!("{subject} already exists"));
            }
            if db.is_foreign_key_violation() || message.contains("FOREIGN KEY constraint failed")
            {
                return CoreError::NotFound(format!("{subject} reference"));
            }
        }
        CoreError::Query(QueryError::from(e))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(value: sqlx::Error) -> Self {
        CoreError::Query(QueryError::from(value))
    }
}

impl Reject for CoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            CoreError::validation("amount", "must be positive").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CoreError::NotFound("Recipe".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CoreError::Conflict("Recipe is already in favorites".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CoreError::Authorization("Only the author can do that".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            CoreError::InvalidSession("Token expired".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CoreError::from(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_message_names_field() {
        let e = CoreError::validation("cooking_time", "must be positive");
        assert_eq!(e.to_string(), "Invalid cooking_time: must be positive");
    }

    #[test]
    fn non_database_errors_stay_opaque() {
        let e = CoreError::from_store(sqlx::Error::RowNotFound, "Recipe");
        assert!(matches!(e, CoreError::Query(_)));
    }
}
