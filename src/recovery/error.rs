use thiserror::Error;

use crate::{buffer::BufferError, storage::StorageError, wal::WalError};

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("log store error: {0}")]
    Log(#[from] WalError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A log entry whose leading tag names no known record type.
    #[error("unknown log record type {op} at lsn {lsn}")]
    UnknownRecord { op: u32, lsn: u64 },
}

pub type Result<T> = std::result::Result<T, RecoveryError>;
