// Console error types
use thiserror::Error;

use crate::router::RouterError;
use crate::routes::RouteError;
use crate::storage::StorageError;

/// Errors surfaced by the HTTP client, the stores and route materialization.
///
/// Stores never swallow these: they log and hand them back so the caller can
/// decide on recovery (retry, inline message, redirect to login).
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// HTTP 401 from the backend; session storage has already been cleared
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Envelope with a non-zero `code`
    #[error("{message}")]
    Business { code: i64, message: String },

    /// Non-success HTTP status other than 401
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection, timeout or TLS failure before any response arrived
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid response payload: {0}")]
    Decode(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Router(#[from] RouterError),
}

impl ConsoleError {
    pub fn business(code: i64, message: impl Into<String>) -> Self {
        ConsoleError::Business {
            code,
            message: message.into(),
        }
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        ConsoleError::Http {
            status,
            message: message.into(),
        }
    }

    /// Authentication failures are fatal to the current session
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ConsoleError::SessionExpired | ConsoleError::NotAuthenticated)
    }

    /// Stable code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::SessionExpired => "SESSION_EXPIRED",
            ConsoleError::Business { .. } => "BUSINESS_ERROR",
            ConsoleError::Http { .. } => "HTTP_ERROR",
            ConsoleError::Transport(_) => "NETWORK_ERROR",
            ConsoleError::Decode(_) => "INVALID_RESPONSE",
            ConsoleError::NotAuthenticated => "NOT_AUTHENTICATED",
            ConsoleError::Storage(_) => "STORAGE_ERROR",
            ConsoleError::Route(_) => "ROUTE_ERROR",
            ConsoleError::Router(_) => "ROUTER_ERROR",
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConsoleError::Decode(err.to_string())
        } else {
            ConsoleError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::Decode(err.to_string())
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
