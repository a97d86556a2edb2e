//! Buffer pool: a fixed set of in-memory frames caching disk blocks.
//!
//! # Components
//!
//! - [`BufferPoolManager`]: pin / pin_new / unpin / flush_all / available
//! - [`Buffer`]: one frame and the page it holds
//! - [`BlockIndex`]: block to frame mapping, with the reverse mapping kept alongside
//! - [`Replacer`] / [`GClockReplacer`]: victim selection
//! - [`PoolObserver`]: optional hook that sees every pool event
//!
//! # Locking
//!
//! Pool state (index, pin counts, replacer, available count) sits behind one
//! mutex and every pool operation holds it for its whole duration. Each frame's
//! page has its own mutex, always taken after the pool mutex. Callers reach a
//! pinned page through [`BufferPoolManager::buffer`] and must drop that guard
//! before calling back into the pool.

pub mod buffer_pool_manager;
pub mod error;
pub mod frame;
pub mod index;
pub mod observer;
pub mod replacer;

pub use buffer_pool_manager::{BufferHandle, BufferPoolManager, FrameId, TxNum};
pub use error::BufferError;
pub use frame::{Buffer, PageFormatter};
pub use index::BlockIndex;
pub use observer::{FrameStat, LogObserver, PoolEvent, PoolObserver};
pub use replacer::{GClockReplacer, Replacer};
