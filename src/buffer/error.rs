use thiserror::Error;

use super::FrameId;
use crate::{storage::StorageError, wal::WalError};

#[derive(Debug, Error)]
pub enum BufferError {
    /// Every frame is pinned, or the replacer found no frame it may reuse.
    ///
    /// Never retried inside the pool; the caller decides whether to back off
    /// or abort the transaction.
    #[error("buffer pool exhausted: no unpinned frame can be replaced")]
    PoolExhausted,

    /// Unpin on a frame whose pin count is already zero. Nothing is changed.
    #[error("frame {frame_id} unpinned more often than it was pinned")]
    InconsistentUnpin { frame_id: FrameId },

    /// A handle that does not belong to this pool.
    #[error("frame {frame_id} is not part of a pool of {pool_size} frames")]
    InvalidFrame { frame_id: FrameId, pool_size: usize },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("log store error: {0}")]
    Log(#[from] WalError),
}

pub type Result<T> = std::result::Result<T, BufferError>;
