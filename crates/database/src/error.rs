use core_types::FailureKind;
use sqlx::mysql::MySqlDatabaseError;
use std::time::Duration;
use thiserror::Error;

// MySQL server error numbers that mean "try again later" rather than "this statement is wrong".
const ER_CON_COUNT_ERROR: u16 = 1040;
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection configuration: {0}")]
    ConnectionConfigError(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("The statement did not complete within {0:?}")]
    QueryTimeout(Duration),

    #[error("Failed to decode column `{column}`: {reason}")]
    Decode { column: String, reason: String },
}

impl DbError {
    /// Maps a store-level failure onto the kind the HTTP layer reports.
    pub fn kind(&self) -> FailureKind {
        match self {
            DbError::ConnectionConfigError(_) => FailureKind::Internal,
            DbError::QueryTimeout(_) => FailureKind::Unavailable,
            DbError::Decode { .. } => FailureKind::Internal,
            DbError::Sqlx(err) => sqlx_kind(err),
        }
    }
}

fn sqlx_kind(err: &sqlx::Error) -> FailureKind {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::WorkerCrashed => FailureKind::Unavailable,
        sqlx::Error::RowNotFound => FailureKind::NotFound,
        sqlx::Error::Database(db_err) => {
            let number = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(MySqlDatabaseError::number);
            if let Some(ER_CON_COUNT_ERROR | ER_LOCK_WAIT_TIMEOUT | ER_LOCK_DEADLOCK) = number {
                return FailureKind::Unavailable;
            }
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => FailureKind::Conflict,
                _ => FailureKind::Internal,
            }
        }
        _ => FailureKind::Internal,
    }
}
