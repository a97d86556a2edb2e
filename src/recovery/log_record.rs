use std::fmt;

use crate::{
    buffer::{BufferPoolManager, TxNum},
    wal::{LogRecordReader, LogStore, LogValue, Lsn},
};

use super::{
    error::{RecoveryError, Result},
    update_record::UpdateRecord,
};

// Leading int of every log entry. 4 and 5 stay reserved for value-level records.
pub const START: u32 = 1;
pub const COMMIT: u32 = 2;
pub const ROLLBACK: u32 = 3;
pub const UPDATE: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Start { txnum: TxNum },
    Commit { txnum: TxNum },
    Rollback { txnum: TxNum },
    Update(UpdateRecord),
}

impl LogRecord {
    /// Decodes one log entry, dispatching on its leading tag.
    pub fn from_reader(mut reader: LogRecordReader) -> Result<Self> {
        let op = reader.next_int()?;

        let record = match op {
            START => LogRecord::Start {
                txnum: reader.next_int()?,
            },
            COMMIT => LogRecord::Commit {
                txnum: reader.next_int()?,
            },
            ROLLBACK => LogRecord::Rollback {
                txnum: reader.next_int()?,
            },
            UPDATE => LogRecord::Update(UpdateRecord::from_reader(&mut reader)?),
            op => {
                return Err(RecoveryError::UnknownRecord {
                    op,
                    lsn: reader.lsn(),
                })
            }
        };
        Ok(record)
    }

    pub fn op(&self) -> u32 {
        match self {
            LogRecord::Start { .. } => START,
            LogRecord::Commit { .. } => COMMIT,
            LogRecord::Rollback { .. } => ROLLBACK,
            LogRecord::Update(rec) => rec.op(),
        }
    }

    pub fn tx_number(&self) -> TxNum {
        match self {
            LogRecord::Start { txnum }
            | LogRecord::Commit { txnum }
            | LogRecord::Rollback { txnum } => *txnum,
            LogRecord::Update(rec) => rec.tx_number(),
        }
    }

    pub fn write_to_log(&self, log: &dyn LogStore) -> Result<Lsn> {
        let lsn = match self {
            LogRecord::Update(rec) => rec.write_to_log(log)?,
            _ => log.append(&[LogValue::Int(self.op()), LogValue::Int(self.tx_number())])?,
        };
        Ok(lsn)
    }

    /// Undoes the change this record describes. Only updates change data;
    /// the other records are no-ops.
    pub fn undo(&self, txnum: TxNum, bpm: &BufferPoolManager) -> Result<()> {
        if let LogRecord::Update(rec) = self {
            rec.undo(txnum, bpm)?;
        }
        Ok(())
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRecord::Start { txnum } => write!(f, "<START {}>", txnum),
            LogRecord::Commit { txnum } => write!(f, "<COMMIT {}>", txnum),
            LogRecord::Rollback { txnum } => write!(f, "<ROLLBACK {}>", txnum),
            LogRecord::Update(rec) => write!(f, "{}", rec),
        }
    }
}

#[cfg(test)]
pub mod test {
    use bytes::Bytes;

    use super::{LogRecord, COMMIT};
    use crate::{
        recovery::RecoveryError,
        wal::{encode_payload, LogRecordReader, LogStore, LogValue, MemoryWal},
    };

    #[test]
    fn simple_records_round_trip_through_the_log() {
        let log = MemoryWal::new();

        LogRecord::Start { txnum: 4 }.write_to_log(&log).unwrap();
        LogRecord::Commit { txnum: 4 }.write_to_log(&log).unwrap();

        let records: Vec<LogRecord> = log
            .records_rev()
            .unwrap()
            .into_iter()
            .map(|reader| LogRecord::from_reader(reader).unwrap())
            .collect();

        assert_eq!(
            vec![LogRecord::Commit { txnum: 4 }, LogRecord::Start { txnum: 4 }],
            records
        );
        assert_eq!(COMMIT, records[0].op());
        assert_eq!("<COMMIT 4>", records[0].to_string());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let payload = encode_payload(&[LogValue::Int(42), LogValue::Int(1)]);
        let reader = LogRecordReader::new(9, Bytes::from(payload));

        assert!(matches!(
            LogRecord::from_reader(reader),
            Err(RecoveryError::UnknownRecord { op: 42, lsn: 9 })
        ));
    }
}
