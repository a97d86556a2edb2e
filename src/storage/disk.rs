//! The file layer underneath the buffer pool.

pub mod fdpool;
pub mod manager;
pub mod memory;

pub use manager::FileManager;
pub use memory::MemoryStore;

use super::{error::Result, BlockId, Page};

/// Reads and writes whole blocks.
///
/// The buffer pool is the only caller that touches blocks through this trait.
/// Implementations handle their own internal locking.
pub trait BlockStore: Send + Sync {
    /// Reads `block` into `page`. A block past the end of its file reads as zeroes.
    fn read(&self, block: &BlockId, page: &mut Page) -> Result<()>;

    fn write(&self, block: &BlockId, page: &Page) -> Result<()>;

    /// Appends `page` as a new block at the end of `file_name`.
    fn append(&self, file_name: &str, page: &Page) -> Result<BlockId>;

    /// Number of blocks currently in `file_name`.
    fn block_count(&self, file_name: &str) -> Result<u32>;

    /// Whether the store was created empty rather than reopened.
    fn is_new(&self) -> bool;
}
