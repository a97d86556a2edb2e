use std::fmt;

use crate::{
    buffer::{error::Result as BufferResult, BufferPoolManager, TxNum},
    storage::BlockId,
    wal::{self, LogRecordReader, LogStore, LogValue, Lsn},
};

use super::log_record::UPDATE;

/// Undo information for a transaction about to overwrite a whole block.
///
/// Holds the modified block and the block where its previous image was saved.
/// Logged as, in order: `UPDATE`, txnum, block file, block number, saved file,
/// saved number. Writer and reader must agree on this order; the log itself
/// carries no field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    txnum: TxNum,
    block: BlockId,
    saved_block: BlockId,
}

impl UpdateRecord {
    pub fn new(txnum: TxNum, block: BlockId, saved_block: BlockId) -> Self {
        Self {
            txnum,
            block,
            saved_block,
        }
    }

    /// Reads the fields that follow the record tag.
    pub fn from_reader(reader: &mut LogRecordReader) -> wal::Result<Self> {
        let txnum = reader.next_int()?;

        let file_name = reader.next_string()?;
        let number = reader.next_int()?;
        let block = BlockId::new(file_name, number);

        let saved_file_name = reader.next_string()?;
        let saved_number = reader.next_int()?;
        let saved_block = BlockId::new(saved_file_name, saved_number);

        Ok(Self {
            txnum,
            block,
            saved_block,
        })
    }

    /// Appends this record to `log` and returns its LSN. Log failures are
    /// returned as they are.
    pub fn write_to_log(&self, log: &dyn LogStore) -> wal::Result<Lsn> {
        let rec = [
            LogValue::Int(UPDATE),
            LogValue::Int(self.txnum),
            LogValue::from(self.block.file_name()),
            LogValue::Int(self.block.number()),
            LogValue::from(self.saved_block.file_name()),
            LogValue::Int(self.saved_block.number()),
        ];
        log.append(&rec)
    }

    pub fn op(&self) -> u32 {
        UPDATE
    }

    pub fn tx_number(&self) -> TxNum {
        self.txnum
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn saved_block(&self) -> &BlockId {
        &self.saved_block
    }

    /// Puts the saved image back over the modified block.
    ///
    /// Pins the modified block, copies the saved block's stored page onto it,
    /// marks it dirty for `txnum` and unpins it. The saved block must already be
    /// on disk. The restored page reaches disk on the next flush for `txnum`.
    pub fn undo(&self, txnum: TxNum, bpm: &BufferPoolManager) -> BufferResult<()> {
        let handle = bpm.pin(&self.block)?;
        let restored = bpm.restore_block(&handle, &self.saved_block, txnum);
        bpm.unpin(&handle)?;
        restored
    }
}

impl fmt::Display for UpdateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<UPDATE {} {} {} {}>",
            self.txnum,
            self.block.file_name(),
            self.block.number(),
            self.saved_block.number()
        )
    }
}
