use thiserror::Error;

use super::BlockId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Read or write past the blocks a memory-backed store holds.
    #[error("block {0} has not been allocated")]
    BlockNotFound(BlockId),

    /// A page accessor ran past the end of the page.
    #[error("page access out of bounds: offset {offset}, length {len}")]
    OutOfBounds { offset: usize, len: usize },

    #[error("invalid string at offset {offset}")]
    InvalidString { offset: usize },
}

pub type Result<T> = std::result::Result<T, StorageError>;
