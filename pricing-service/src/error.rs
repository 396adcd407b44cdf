//! Error types and HTTP response conversion
//!
//! Every variant renders as the standard failure envelope (see
//! [`crate::responses`]). Internal details are logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use thiserror::Error;

use crate::responses::{ErrorResponse, FieldErrors};

// ============================================================================
// Structured Database Errors
// ============================================================================

/// Database operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseOperation {
    /// Establishing a database connection
    Connect,
    /// Executing a query
    Query,
    /// Inserting records
    Insert,
    /// Updating records
    Update,
    /// Deleting records
    Delete,
    /// Transaction operations (begin, commit, rollback)
    Transaction,
    /// Running database migrations
    Migration,
    /// Acquiring a connection from the pool
    PoolAcquire,
}

impl fmt::Display for DatabaseOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Query => write!(f, "query"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Transaction => write!(f, "transaction"),
            Self::Migration => write!(f, "migration"),
            Self::PoolAcquire => write!(f, "pool_acquire"),
        }
    }
}

/// Category of database error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseErrorKind {
    /// Failed to establish connection
    ConnectionFailed,
    /// Record not found
    NotFound,
    /// Constraint violation (unique, foreign key, check)
    ConstraintViolation,
    /// Query execution failed
    QueryFailed,
    /// Transaction failed (begin, commit, or rollback)
    TransactionFailed,
    /// Type conversion error
    TypeConversion,
    /// Configuration error
    Configuration,
    /// Operation timed out
    Timeout,
    /// Connection pool exhausted
    PoolExhausted,
    /// Other/unknown error
    Other,
}

impl fmt::Display for DatabaseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::NotFound => write!(f, "not_found"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::QueryFailed => write!(f, "query_failed"),
            Self::TransactionFailed => write!(f, "transaction_failed"),
            Self::TypeConversion => write!(f, "type_conversion"),
            Self::Configuration => write!(f, "configuration"),
            Self::Timeout => write!(f, "timeout"),
            Self::PoolExhausted => write!(f, "pool_exhausted"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured database error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseError {
    /// The operation being performed when the error occurred
    pub operation: DatabaseOperation,
    /// The category of error
    pub kind: DatabaseErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Additional context (constraint name, table, ...)
    pub context: Option<String>,
}

impl DatabaseError {
    /// Create a new database error
    pub fn new(
        operation: DatabaseOperation,
        kind: DatabaseErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Create a "not found" error
    pub fn not_found(operation: DatabaseOperation, message: impl Into<String>) -> Self {
        Self::new(operation, DatabaseErrorKind::NotFound, message)
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            DatabaseOperation::Connect,
            DatabaseErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a constraint violation error
    pub fn constraint_violation(operation: DatabaseOperation, message: impl Into<String>) -> Self {
        Self::new(operation, DatabaseErrorKind::ConstraintViolation, message)
    }

    /// Create a pool exhausted error
    pub fn pool_exhausted(message: impl Into<String>) -> Self {
        Self::new(
            DatabaseOperation::PoolAcquire,
            DatabaseErrorKind::PoolExhausted,
            message,
        )
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            DatabaseErrorKind::ConnectionFailed
                | DatabaseErrorKind::Timeout
                | DatabaseErrorKind::PoolExhausted
        )
    }

    /// Whether this is a unique/check/foreign-key violation
    pub fn is_constraint_violation(&self) -> bool {
        self.kind == DatabaseErrorKind::ConstraintViolation
    }

    /// Attach the failing operation, keeping kind and message
    pub fn during(mut self, operation: DatabaseOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Add context to an existing error
    pub fn add_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Database {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref ctx) = self.context {
            write!(f, " [context: {}]", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for DatabaseError {}

/// Sanitize a database URL by removing credentials
pub fn sanitize_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(scheme_end) = url.find("://") {
            if scheme_end < at_pos {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos + 1..];
                return format!("{}<redacted>@{}", scheme, after_at);
            }
        }
    }
    url.to_string()
}

// ============================================================================
// Service Error
// ============================================================================

/// Result type alias using the service error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Structured database error with operation context
    #[error("{0}")]
    Database(DatabaseError),

    /// Token encoding or key setup failure
    #[error("JWT error: {0}")]
    Jwt(Box<jsonwebtoken::errors::Error>),

    /// Password hashing failure
    #[error("Auth error: {0}")]
    Auth(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication failed (401)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request could not be read (wrong content type, oversized body)
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// Status chosen by the extractor
        status: StatusCode,
        /// Client-facing explanation
        message: String,
    },

    /// Field-level validation failure (400, "Validation error")
    #[error("Validation error: {} field error(s)", .0.error_count())]
    Validation(FieldErrors),

    /// CSV file could not be read (missing header, malformed record)
    #[error("CSV error: {0}")]
    Csv(String),

    /// CSV row failed validation; `line` is the 1-based line in the file
    #[error("Invalid row at line {line}: {errors:?}")]
    InvalidRow {
        /// Line number of the offending record
        line: u64,
        /// Field errors for that record
        errors: FieldErrors,
    },

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a single-field validation error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation(FieldErrors::single(field, message))
    }

    /// Convert into the wire error response, logging server-side failures
    pub fn to_error_response(self) -> ErrorResponse {
        match self {
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                internal()
            }

            Error::Database(ref e) => {
                tracing::error!(
                    operation = %e.operation,
                    kind = %e.kind,
                    context = ?e.context,
                    retriable = e.is_retriable(),
                    "Database error: {}", e.message
                );

                match e.kind {
                    DatabaseErrorKind::NotFound => {
                        ErrorResponse::with_message(StatusCode::NOT_FOUND, "Not found.")
                    }
                    DatabaseErrorKind::ConstraintViolation => ErrorResponse::with_message(
                        StatusCode::BAD_REQUEST,
                        "Operation conflicts with existing data",
                    ),
                    DatabaseErrorKind::Timeout => ErrorResponse::with_message(
                        StatusCode::GATEWAY_TIMEOUT,
                        "Database operation timed out",
                    ),
                    _ => ErrorResponse::with_message(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Database operation failed",
                    ),
                }
            }

            Error::Jwt(e) => {
                tracing::error!("JWT error: {}", e);
                internal()
            }

            Error::Auth(msg) => {
                tracing::error!("Auth error: {}", msg);
                internal()
            }

            Error::Io(e) => {
                tracing::error!("I/O error: {}", e);
                internal()
            }

            Error::Unauthorized(msg) => ErrorResponse::with_message(StatusCode::UNAUTHORIZED, msg),

            Error::NotFound(msg) => ErrorResponse::with_message(StatusCode::NOT_FOUND, msg),

            Error::BadRequest(msg) => ErrorResponse::with_message(StatusCode::BAD_REQUEST, msg),

            Error::Rejected { status, message } => ErrorResponse::with_message(status, message),

            Error::Validation(errors) => ErrorResponse::validation(errors),

            Error::Csv(msg) => ErrorResponse::with_message(StatusCode::BAD_REQUEST, msg),

            Error::InvalidRow { line, errors } => ErrorResponse::with_message(
                StatusCode::BAD_REQUEST,
                format!("Invalid row at line {}", line),
            )
            .with_errors(errors),

            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal()
            }
        }
    }
}

fn internal() -> ErrorResponse {
    ErrorResponse::with_message(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        self.to_error_response().into_response()
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Jwt(Box::new(err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(_) => Error::Io(std::io::Error::other(err.to_string())),
            _ => Error::Csv(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        match err {
            E::RowNotFound => Self::not_found(DatabaseOperation::Query, "Row not found"),
            E::PoolTimedOut => Self::pool_exhausted("Connection pool timed out"),
            E::PoolClosed => Self::connection_failed("Connection pool is closed"),
            E::Protocol(msg) => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::QueryFailed,
                msg,
            ),
            E::Configuration(e) => Self::new(
                DatabaseOperation::Connect,
                DatabaseErrorKind::Configuration,
                e.to_string(),
            ),
            E::Io(e) => Self::new(
                DatabaseOperation::Connect,
                DatabaseErrorKind::ConnectionFailed,
                e.to_string(),
            ),
            E::Tls(e) => Self::new(
                DatabaseOperation::Connect,
                DatabaseErrorKind::ConnectionFailed,
                format!("TLS error: {}", e),
            ),
            E::ColumnNotFound(col) => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::QueryFailed,
                format!("Column not found: {}", col),
            ),
            E::ColumnDecode { index, source } => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::TypeConversion,
                format!("Failed to decode column {}: {}", index, source),
            ),
            E::Decode(e) => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::TypeConversion,
                e.to_string(),
            ),
            E::Migrate(e) => Self::new(
                DatabaseOperation::Migration,
                DatabaseErrorKind::QueryFailed,
                e.to_string(),
            ),
            E::Database(db_err) => {
                let kind = if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                {
                    DatabaseErrorKind::ConstraintViolation
                } else {
                    DatabaseErrorKind::QueryFailed
                };
                let constraint = db_err.constraint().map(str::to_string);
                let error = Self::new(DatabaseOperation::Query, kind, db_err.to_string());
                match constraint {
                    Some(name) => error.add_context(name),
                    None => error,
                }
            }
            E::WorkerCrashed => Self::connection_failed("Database worker crashed"),
            _ => Self::new(
                DatabaseOperation::Query,
                DatabaseErrorKind::Other,
                err.to_string(),
            ),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(DatabaseError::from(err))
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::Database(DatabaseError::new(
            DatabaseOperation::Migration,
            DatabaseErrorKind::QueryFailed,
            err.to_string(),
        ))
    }
}

impl From<DatabaseError> for Error {
    fn from(err: DatabaseError) -> Self {
        Error::Database(err)
    }
}
