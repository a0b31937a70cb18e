mod records;
mod users;

pub use records::{NewRecord, Record, RecordKind, RecordStore, RecordUpdate, SqliteRecordStore};
pub use users::{CreateUser, SqliteUserStore, User, UserStore};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Record not found: {0}")]
    RecordNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
