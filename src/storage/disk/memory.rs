use std::collections::HashMap;

use parking_lot::Mutex;

use super::BlockStore;
use crate::storage::{error::Result, BlockId, Page, StorageError};

/// In-memory block store for tests and demos.
///
/// Counts writes per block so callers can tell exactly which blocks a flush touched.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, Vec<Page>>>,
    writes: Mutex<HashMap<BlockId, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times `block` has been written or appended.
    pub fn write_count(&self, block: &BlockId) -> usize {
        self.writes.lock().get(block).copied().unwrap_or(0)
    }

    /// Copy of the stored contents of `block`, if it exists.
    pub fn snapshot(&self, block: &BlockId) -> Option<Page> {
        self.files
            .lock()
            .get(block.file_name())
            .and_then(|blocks| blocks.get(block.number() as usize))
            .cloned()
    }

    fn record_write(&self, block: &BlockId) {
        *self.writes.lock().entry(block.clone()).or_insert(0) += 1;
    }
}

impl BlockStore for MemoryStore {
    fn read(&self, block: &BlockId, page: &mut Page) -> Result<()> {
        let files = self.files.lock();

        match files
            .get(block.file_name())
            .and_then(|blocks| blocks.get(block.number() as usize))
        {
            Some(stored) => page.copy_from(stored),
            None => page.clear(),
        }
        Ok(())
    }

    fn write(&self, block: &BlockId, page: &Page) -> Result<()> {
        {
            let mut files = self.files.lock();
            let blocks = files.entry(block.file_name().to_string()).or_default();
            let index = block.number() as usize;

            // Writes may only land on an existing block or extend the file by one
            if index > blocks.len() {
                return Err(StorageError::BlockNotFound(block.clone()));
            }
            if index == blocks.len() {
                blocks.push(page.clone());
            } else {
                blocks[index].copy_from(page);
            }
        }

        self.record_write(block);
        Ok(())
    }

    fn append(&self, file_name: &str, page: &Page) -> Result<BlockId> {
        let block = {
            let mut files = self.files.lock();
            let blocks = files.entry(file_name.to_string()).or_default();
            blocks.push(page.clone());
            BlockId::new(file_name, (blocks.len() - 1) as u32)
        };

        self.record_write(&block);
        Ok(block)
    }

    fn block_count(&self, file_name: &str) -> Result<u32> {
        Ok(self
            .files
            .lock()
            .get(file_name)
            .map_or(0, |blocks| blocks.len() as u32))
    }

    fn is_new(&self) -> bool {
        self.files.lock().is_empty()
    }
}
