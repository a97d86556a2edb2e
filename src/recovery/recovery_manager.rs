use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use log::{debug, info};

use crate::{
    buffer::{BufferHandle, BufferPoolManager, TxNum},
    storage::BlockId,
    wal::Lsn,
};

use super::{
    error::Result,
    log_record::LogRecord,
    update_record::UpdateRecord,
};

/// Suffix of the file that receives backup images of a data file's blocks.
pub const SHADOW_SUFFIX: &str = ".shadow";

/// Logging and undo for one transaction.
pub struct RecoveryManager {
    txnum: TxNum,
    bpm: Arc<BufferPoolManager>,
}

impl RecoveryManager {
    /// Starts transaction `txnum` by logging its START record.
    pub fn new(txnum: TxNum, bpm: Arc<BufferPoolManager>) -> Result<Self> {
        LogRecord::Start { txnum }.write_to_log(&**bpm.log())?;
        Ok(Self { txnum, bpm })
    }

    pub fn tx_number(&self) -> TxNum {
        self.txnum
    }

    pub fn buffer_manager(&self) -> &Arc<BufferPoolManager> {
        &self.bpm
    }

    /// Saves the current image of the pinned block before it is overwritten.
    ///
    /// The image is appended to the block's shadow file and an [`UpdateRecord`]
    /// pointing at it is logged. Pass the returned LSN to
    /// [`Buffer::set_modified`](crate::buffer::Buffer::set_modified) along with the
    /// change, so the record reaches the log before the page reaches disk.
    pub fn shadow_block(&self, handle: &BufferHandle) -> Result<Lsn> {
        let image = self.bpm.buffer(handle).contents().clone();

        let shadow_file = format!("{}{}", handle.block().file_name(), SHADOW_SUFFIX);
        let saved: BlockId = self.bpm.store().append(&shadow_file, &image)?;

        let rec = UpdateRecord::new(self.txnum, handle.block().clone(), saved);
        let lsn = rec.write_to_log(&**self.bpm.log())?;
        debug!("logged {} at lsn {}", rec, lsn);
        Ok(lsn)
    }

    /// Writes the transaction's pages, then a durable COMMIT record.
    pub fn commit(&self) -> Result<()> {
        self.bpm.flush_all(self.txnum)?;
        self.finish(LogRecord::Commit { txnum: self.txnum })
    }

    /// Undoes every update of this transaction, newest first, then writes a
    /// durable ROLLBACK record.
    pub fn rollback(&self) -> Result<()> {
        for reader in self.bpm.log().records_rev()? {
            let rec = LogRecord::from_reader(reader)?;
            if rec.tx_number() != self.txnum {
                continue;
            }
            if let LogRecord::Start { .. } = rec {
                break;
            }
            rec.undo(self.txnum, &self.bpm)?;
        }

        self.bpm.flush_all(self.txnum)?;
        self.finish(LogRecord::Rollback { txnum: self.txnum })
    }

    /// Undoes the updates of every transaction that neither committed nor
    /// rolled back, newest first, and writes the restored pages to disk.
    ///
    /// Each undone transaction then gets a durable ROLLBACK record, so a later
    /// recovery leaves it alone.
    ///
    /// Run once at startup, before any other transaction touches the pool.
    pub fn recover(&self) -> Result<()> {
        let mut finished = HashSet::new();
        let mut undone_txs = BTreeSet::new();
        let mut undone = 0;

        for reader in self.bpm.log().records_rev()? {
            let rec = LogRecord::from_reader(reader)?;
            match &rec {
                LogRecord::Commit { txnum } | LogRecord::Rollback { txnum } => {
                    finished.insert(*txnum);
                }
                LogRecord::Update(update) if !finished.contains(&update.tx_number()) => {
                    rec.undo(self.txnum, &self.bpm)?;
                    undone_txs.insert(update.tx_number());
                    undone += 1;
                }
                _ => {}
            }
        }

        self.bpm.flush_all(self.txnum)?;

        let log = self.bpm.log();
        let mut last_lsn = None;
        for txnum in &undone_txs {
            last_lsn = Some(LogRecord::Rollback { txnum: *txnum }.write_to_log(&**log)?);
        }
        if let Some(lsn) = last_lsn {
            log.flush(lsn)?;
        }

        info!(
            "recovery undid {} update(s) of {} transaction(s)",
            undone,
            undone_txs.len()
        );
        Ok(())
    }

    fn finish(&self, rec: LogRecord) -> Result<()> {
        let log = self.bpm.log();
        let lsn = rec.write_to_log(&**log)?;
        log.flush(lsn)?;
        debug!("{} durable at lsn {}", rec, lsn);
        Ok(())
    }
}
