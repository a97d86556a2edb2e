#[cfg(test)]

pub mod test {

    use std::sync::Arc;

    use crate::{
        buffer::{BufferError, BufferPoolManager},
        recovery::{LogRecord, UpdateRecord, UPDATE},
        storage::{BlockId, BlockStore, MemoryStore, Page},
        wal::{self, LogRecordReader, LogStore, LogValue, Lsn, MemoryWal, WalError},
    };

    fn sample() -> UpdateRecord {
        UpdateRecord::new(
            7,
            BlockId::new("data.db", 3),
            BlockId::new("data.db", 9),
        )
    }

    #[test]
    fn fields_are_logged_in_order() {
        let log = MemoryWal::new();
        let lsn = sample().write_to_log(&log).unwrap();
        assert_eq!(0, lsn);

        let mut reader = log.records_rev().unwrap().remove(0);
        assert_eq!(UPDATE, reader.next_int().unwrap());
        assert_eq!(7, reader.next_int().unwrap());
        assert_eq!("data.db", reader.next_string().unwrap());
        assert_eq!(3, reader.next_int().unwrap());
        assert_eq!("data.db", reader.next_string().unwrap());
        assert_eq!(9, reader.next_int().unwrap());
        assert!(!reader.has_remaining());
    }

    #[test]
    fn record_reads_back_from_the_log() {
        let log = MemoryWal::new();
        sample().write_to_log(&log).unwrap();

        let reader = log.records_rev().unwrap().remove(0);
        let rec = LogRecord::from_reader(reader).unwrap();

        assert_eq!(LogRecord::Update(sample()), rec);
        assert_eq!(UPDATE, rec.op());
        assert_eq!(7, rec.tx_number());
    }

    #[test]
    fn display_names_both_blocks() {
        assert_eq!("<UPDATE 7 data.db 3 9>", sample().to_string());
    }

    struct FailingLog;

    impl LogStore for FailingLog {
        fn append(&self, _values: &[LogValue]) -> wal::Result<Lsn> {
            Err(WalError::Unavailable("disk full".to_string()))
        }

        fn flush(&self, _lsn: Lsn) -> wal::Result<()> {
            Err(WalError::Unavailable("disk full".to_string()))
        }

        fn records_rev(&self) -> wal::Result<Vec<LogRecordReader>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn log_failure_is_passed_through() {
        let result = sample().write_to_log(&FailingLog);

        assert!(matches!(result, Err(WalError::Unavailable(msg)) if msg == "disk full"));
    }

    #[test]
    fn undo_restores_the_saved_image() {
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MemoryWal::new());

        // Block n of data.db holds n
        for number in 0..10 {
            let mut page = Page::new();
            page.set_int(0, number).unwrap();
            store.append("data.db", &page).unwrap();
        }

        let bpm = BufferPoolManager::new(2, 1, store.clone(), log.clone());
        let rec = sample();

        rec.undo(7, &bpm).unwrap();
        assert_eq!(2, bpm.available());

        let handle = bpm.pin(rec.block()).unwrap();
        assert_eq!(9, bpm.buffer(&handle).get_int(0).unwrap());
        assert!(bpm.buffer(&handle).is_modified_by(7));
        bpm.unpin(&handle).unwrap();

        // Marked dirty for the undoing transaction, so its flush writes it out
        bpm.flush_all(7).unwrap();
        assert_eq!(9, store.snapshot(rec.block()).unwrap().get_int(0).unwrap());
        assert_eq!(None, log.flushed_lsn());
    }

    #[test]
    fn undo_on_a_full_pool_reports_exhaustion() {
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MemoryWal::new());
        let bpm = BufferPoolManager::new(1, 1, store, log);

        let _other = bpm.pin(&BlockId::new("other.db", 0)).unwrap();

        assert!(matches!(
            sample().undo(7, &bpm),
            Err(BufferError::PoolExhausted)
        ));
        assert_eq!(0, bpm.available());
    }
}
