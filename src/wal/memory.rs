use bytes::Bytes;
use parking_lot::Mutex;

use super::{encode_payload, LogRecordReader, LogStore, LogValue, Lsn, Result};

/// In-memory log store for tests.
#[derive(Default)]
pub struct MemoryWal {
    inner: Mutex<MemoryWalInner>,
}

#[derive(Default)]
struct MemoryWalInner {
    entries: Vec<Bytes>,
    flushed_lsn: Option<Lsn>,
    flush_calls: usize,
}

impl MemoryWal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flushed_lsn(&self) -> Option<Lsn> {
        self.inner.lock().flushed_lsn
    }

    pub fn flush_calls(&self) -> usize {
        self.inner.lock().flush_calls
    }
}

impl LogStore for MemoryWal {
    fn append(&self, values: &[LogValue]) -> Result<Lsn> {
        let mut inner = self.inner.lock();
        inner.entries.push(Bytes::from(encode_payload(values)));
        Ok((inner.entries.len() - 1) as Lsn)
    }

    fn flush(&self, lsn: Lsn) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.flush_calls += 1;

        let last = (inner.entries.len() as Lsn).checked_sub(1);
        inner.flushed_lsn = match (inner.flushed_lsn, last) {
            (Some(flushed), _) if lsn <= flushed => Some(flushed),
            (_, last) => last,
        };
        Ok(())
    }

    fn records_rev(&self) -> Result<Vec<LogRecordReader>> {
        let inner = self.inner.lock();

        Ok(inner
            .entries
            .iter()
            .enumerate()
            .rev()
            .map(|(lsn, payload)| LogRecordReader::new(lsn as Lsn, payload.clone()))
            .collect())
    }
}
