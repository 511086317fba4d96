use std::io::ErrorKind;

use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNDEFINED_TABLE: &str = "42P01";
const NUMERIC_OUT_OF_RANGE: &str = "22003";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("duplicate value for unique constraint {0}")]
    UniqueViolation(String),

    #[error("referenced row does not exist")]
    MissingReference,

    #[error("database schema is not initialized")]
    NotInitialized,

    #[error("numeric value out of range")]
    OutOfRange,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                    return DbError::UniqueViolation(constraint);
                }
                Some(FOREIGN_KEY_VIOLATION) => return DbError::MissingReference,
                Some(UNDEFINED_TABLE) => return DbError::NotInitialized,
                Some(NUMERIC_OUT_OF_RANGE) => return DbError::OutOfRange,
                _ => {}
            }
        }
        DbError::Sqlx(e)
    }
}

impl DbError {
    /// True for failures caused by the connection rather than the statement.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Sqlx(e) if is_transient(e))
    }
}

/// True when no connection could be checked out, so the statement was never
/// sent and is safe to replay even if it writes.
pub fn is_acquire_timeout(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::PoolTimedOut)
}

/// Connection-level errors worth retrying: pool timeouts, dropped sockets and
/// servers (or poolers) that hung up mid-handshake.
pub fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Io(io) => matches!(
            io.kind(),
            ErrorKind::TimedOut
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::ConnectionRefused
                | ErrorKind::BrokenPipe
                | ErrorKind::UnexpectedEof
        ),
        sqlx::Error::Tls(_) => true,
        sqlx::Error::Protocol(msg) => looks_like_timeout(msg),
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref().is_some_and(is_connection_state)
                || looks_like_timeout(db_err.message())
        }
        _ => false,
    }
}

/// SQLSTATE class 08 (connection exception) and 57P0x (the server is
/// shutting down, restarting or refusing connections).
fn is_connection_state(code: &str) -> bool {
    code.starts_with("08") || code.starts_with("57P0")
}

fn looks_like_timeout(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("timeout")
        || message.contains("timed out")
        || message.contains("connection terminated")
}
