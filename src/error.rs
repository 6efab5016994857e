use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt::{self, Debug, Display};

/// Service-wide error. Codes `1..=99` are internal failures whose details are
/// never shown to callers; codes from `100` up are the caller's fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

const INVALID_CONFIG: i32 = 1;
const DATABASE: i32 = 2;
const UNAVAILABLE: i32 = 3;
const INCONSISTENT_STATE: i32 = 4;
const UNEXPECTED: i32 = 5;

const INVALID_INPUT: i32 = 101;
const ROLE_NOT_PERMITTED: i32 = 102;
const UNAUTHENTICATED: i32 = 103;
const CONFLICT: i32 = 104;
const NOT_FOUND: i32 = 105;

impl Error {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_config_error(variable: &str) -> Self {
        Self::new(INVALID_CONFIG, format!("invalid configuration: {}", variable))
    }

    pub fn database_error<T: Debug>(err: T) -> Self {
        tracing::error!(error = ?err, "database error");
        Self::new(DATABASE, "database error")
    }

    /// The store could not be reached, or did not answer in time. Callers may
    /// retry after a backoff.
    pub fn unavailable_error() -> Self {
        Self::new(UNAVAILABLE, "store unavailable")
    }

    pub fn inconsistent_state_error(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "store inconsistency");
        Self::new(INCONSISTENT_STATE, message)
    }

    pub fn unexpected_error() -> Self {
        Self::new(UNEXPECTED, "unexpected error")
    }

    /// Malformed input. The message names the violated constraint.
    pub fn invalid_input_error(message: impl Into<String>) -> Self {
        Self::new(INVALID_INPUT, message)
    }

    pub fn role_not_permitted_error(message: impl Into<String>) -> Self {
        Self::new(ROLE_NOT_PERMITTED, message)
    }

    pub fn unauthenticated_error() -> Self {
        Self::new(UNAUTHENTICATED, "missing or malformed caller identity")
    }

    pub fn conflict_error(message: impl Into<String>) -> Self {
        Self::new(CONFLICT, message)
    }

    pub fn not_found_error(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, message)
    }

    /// Input or permission problems, detected before the store is touched.
    pub fn is_validation_error(&self) -> bool {
        matches!(self.code, INVALID_INPUT | ROLE_NOT_PERMITTED)
    }

    pub fn is_conflict_error(&self) -> bool {
        self.code == CONFLICT
    }

    pub fn is_not_found_error(&self) -> bool {
        self.code == NOT_FOUND
    }

    pub fn is_internal_error(&self) -> bool {
        (1..=99).contains(&self.code)
    }

    /// Only infrastructure unavailability is worth retrying with the same
    /// parameters; a lost claim never is.
    pub fn is_retriable(&self) -> bool {
        self.code == UNAVAILABLE
    }

    pub fn status_code(&self) -> StatusCode {
        match self.code {
            UNAVAILABLE => StatusCode::SERVICE_UNAVAILABLE,
            1..=99 => StatusCode::INTERNAL_SERVER_ERROR,
            INVALID_INPUT => StatusCode::UNPROCESSABLE_ENTITY,
            ROLE_NOT_PERMITTED => StatusCode::FORBIDDEN,
            UNAUTHENTICATED => StatusCode::UNAUTHORIZED,
            CONFLICT => StatusCode::CONFLICT,
            NOT_FOUND => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                tracing::warn!(error = %err, "store unavailable");
                Error::unavailable_error()
            }
            sqlx::Error::RowNotFound => Error::not_found_error("row not found"),
            err => Error::database_error(err),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self.code {
            UNAVAILABLE => "Service Unavailable",
            1..=99 => "Internal Server Error",
            _ => self.message.as_str(),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[test]
fn internal_errors_are_not_leaked() {
    let err = Error::inconsistent_state_error("ride 7 vanished after claim");

    assert!(err.is_internal_error());
    assert!(!err.is_retriable());
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn caller_errors_map_to_distinct_statuses() {
    assert_eq!(
        Error::invalid_input_error("price must be positive").status_code(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        Error::role_not_permitted_error("only drivers may accept rides").status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        Error::conflict_error("ride already claimed").status_code(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        Error::not_found_error("ride not found").status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        Error::unauthenticated_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[test]
fn only_unavailability_is_retriable() {
    assert!(Error::unavailable_error().is_retriable());
    assert!(Error::unavailable_error().is_internal_error());
    assert!(!Error::conflict_error("lost").is_retriable());
    assert!(!Error::not_found_error("gone").is_retriable());
    assert!(Error::role_not_permitted_error("riders only").is_validation_error());
}

#[test]
fn pool_timeouts_are_unavailable() {
    let err: Error = sqlx::Error::PoolTimedOut.into();

    assert!(err.is_retriable());
    assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}
