use crate::{
    storage::{error::Result as StorageResult, BlockId, BlockStore, Page},
    wal::{LogStore, Lsn},
};

use super::{error::Result, TxNum};

/// Initializes the page of a block that is about to be appended.
pub trait PageFormatter {
    fn format(&self, page: &mut Page);
}

impl<F: Fn(&mut Page)> PageFormatter for F {
    fn format(&self, page: &mut Page) {
        self(page)
    }
}

/// One frame of the buffer pool.
///
/// Pin counts and replacement counters live in the pool state; a `Buffer`
/// carries what belongs to the page itself: the contents, the block they came
/// from, and the transaction and log position of the last unflushed change.
#[derive(Debug)]
pub struct Buffer {
    contents: Page,
    block: Option<BlockId>,

    // Set only while the page holds changes not yet written to disk
    modified_by: Option<TxNum>,

    // Log entry that must be durable before the page may be written
    lsn: Option<Lsn>,
}

impl Buffer {
    pub(crate) fn new() -> Self {
        Self {
            contents: Page::new(),
            block: None,
            modified_by: None,
            lsn: None,
        }
    }

    pub fn contents(&self) -> &Page {
        &self.contents
    }

    /// Raw access to the page. Pair every change with [`Buffer::set_modified`]
    /// or it will not reach disk.
    pub fn contents_mut(&mut self) -> &mut Page {
        &mut self.contents
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    pub fn get_int(&self, offset: usize) -> StorageResult<u32> {
        self.contents.get_int(offset)
    }

    pub fn get_string(&self, offset: usize) -> StorageResult<String> {
        self.contents.get_string(offset)
    }

    pub fn set_int(
        &mut self,
        offset: usize,
        value: u32,
        txnum: TxNum,
        lsn: Option<Lsn>,
    ) -> StorageResult<()> {
        self.contents.set_int(offset, value)?;
        self.set_modified(txnum, lsn);
        Ok(())
    }

    pub fn set_string(
        &mut self,
        offset: usize,
        value: &str,
        txnum: TxNum,
        lsn: Option<Lsn>,
    ) -> StorageResult<()> {
        self.contents.set_string(offset, value)?;
        self.set_modified(txnum, lsn);
        Ok(())
    }

    /// Marks the page dirty on behalf of `txnum`. `lsn` is the log entry
    /// describing the change, if there is one.
    pub fn set_modified(&mut self, txnum: TxNum, lsn: Option<Lsn>) {
        self.modified_by = Some(txnum);
        if let Some(lsn) = lsn {
            self.lsn = Some(self.lsn.map_or(lsn, |current| current.max(lsn)));
        }
    }

    pub fn is_modified_by(&self, txnum: TxNum) -> bool {
        self.modified_by == Some(txnum)
    }

    pub fn modifying_tx(&self) -> Option<TxNum> {
        self.modified_by
    }

    pub fn lsn(&self) -> Option<Lsn> {
        self.lsn
    }

    /// Writes the page to disk if it is dirty, forcing the log up to the
    /// page's LSN first. Returns whether anything was written.
    pub(crate) fn flush(&mut self, store: &dyn BlockStore, log: &dyn LogStore) -> Result<bool> {
        if self.modified_by.is_none() {
            return Ok(false);
        }

        let Some(block) = &self.block else {
            self.modified_by = None;
            return Ok(false);
        };

        if let Some(lsn) = self.lsn {
            log.flush(lsn)?;
        }
        store.write(block, &self.contents)?;

        self.modified_by = None;
        self.lsn = None;
        Ok(true)
    }

    /// Loads `block` into this frame. The previous contents must already be flushed.
    pub(crate) fn assign_to_block(
        &mut self,
        block: &BlockId,
        store: &dyn BlockStore,
    ) -> StorageResult<()> {
        self.reset();

        store.read(block, &mut self.contents)?;
        self.block = Some(block.clone());
        Ok(())
    }

    /// Formats a fresh page and appends it to `file_name` as a new block.
    pub(crate) fn assign_to_new(
        &mut self,
        file_name: &str,
        formatter: &dyn PageFormatter,
        store: &dyn BlockStore,
    ) -> StorageResult<BlockId> {
        self.reset();

        self.contents.clear();
        formatter.format(&mut self.contents);

        let block = store.append(file_name, &self.contents)?;
        self.block = Some(block.clone());
        Ok(block)
    }

    /// Overwrites the page with the stored image of `saved` and marks it dirty
    /// for `txnum`. No LSN is recorded, so a later flush does not force the log.
    pub(crate) fn restore_block(
        &mut self,
        saved: &BlockId,
        txnum: TxNum,
        store: &dyn BlockStore,
    ) -> StorageResult<()> {
        store.read(saved, &mut self.contents)?;
        self.set_modified(txnum, None);
        Ok(())
    }

    fn reset(&mut self) {
        self.block = None;
        self.modified_by = None;
        self.lsn = None;
    }
}

#[cfg(test)]
pub mod test {
    use super::Buffer;
    use crate::{
        storage::{BlockId, BlockStore, MemoryStore, Page},
        wal::{LogStore, LogValue, MemoryWal},
    };

    #[test]
    fn flush_forces_log_before_page() {
        let store = MemoryStore::new();
        let log = MemoryWal::new();
        let block = store.append("t.tbl", &Page::new()).unwrap();

        let mut buffer = Buffer::new();
        buffer.assign_to_block(&block, &store).unwrap();

        let lsn = log.append(&[LogValue::Int(1)]).unwrap();
        buffer.set_int(0, 99, 4, Some(lsn)).unwrap();
        assert!(buffer.is_modified_by(4));

        assert!(buffer.flush(&store, &log).unwrap());
        assert_eq!(Some(lsn), log.flushed_lsn());
        assert_eq!(99, store.snapshot(&block).unwrap().get_int(0).unwrap());

        // Clean now, so a second flush writes nothing
        assert!(!buffer.flush(&store, &log).unwrap());
        assert_eq!(None, buffer.modifying_tx());
        assert_eq!(2, store.write_count(&block));
    }

    #[test]
    fn lsn_watermark_only_moves_forward() {
        let mut buffer = Buffer::new();

        buffer.set_modified(1, Some(7));
        buffer.set_modified(1, Some(3));
        buffer.set_modified(1, None);

        assert_eq!(Some(7), buffer.lsn());
    }

    #[test]
    fn assign_to_new_formats_and_appends() {
        let store = MemoryStore::new();
        let mut buffer = Buffer::new();

        let formatter = |page: &mut Page| page.set_int(0, 0xabcd).unwrap();
        let block = buffer.assign_to_new("new.tbl", &formatter, &store).unwrap();

        assert_eq!(BlockId::new("new.tbl", 0), block);
        assert_eq!(Some(&block), buffer.block());
        assert_eq!(0xabcd, store.snapshot(&block).unwrap().get_int(0).unwrap());
    }
}
