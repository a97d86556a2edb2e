//! Block-level storage: block identities, fixed-size pages and the file layer
//! the buffer pool reads from and writes to.

pub mod block;
pub mod disk;
pub mod error;
pub mod page;

pub use block::BlockId;
pub use disk::{BlockStore, FileManager, MemoryStore};
pub use error::StorageError;
pub use page::{Page, PAGE_SIZE};
