use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use bytes::Bytes;
use log::{debug, warn};
use parking_lot::Mutex;

use super::{
    decode_entries, encode_entry, encode_payload, LogRecordReader, LogStore, LogValue, Lsn,
    Result,
};

/// File-backed log store.
pub struct Wal {
    path: PathBuf,
    inner: Mutex<WalInner>,
}

struct WalInner {
    file: BufWriter<File>,
    next_lsn: Lsn,
    // Highest LSN known to be on disk
    flushed_lsn: Option<Lsn>,
}

impl Wal {
    /// Creates a fresh log; fails if `path` already exists.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .create_new(true)
            .append(true)
            .open(&path)?;

        Ok(Self::with_file(path, file, 0))
    }

    /// Opens an existing log, or creates one if `path` does not exist.
    ///
    /// A torn final entry left by a crash mid-append is cut off.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Self::create(path);
        }

        let raw = fs::read(&path)?;
        let raw_len = raw.len();
        let decoded = decode_entries(Bytes::from(raw))?;

        if decoded.valid_len < raw_len {
            warn!(
                "log {} has a torn tail, dropping {} bytes",
                path.display(),
                raw_len - decoded.valid_len
            );
            OpenOptions::new()
                .write(true)
                .open(&path)?
                .set_len(decoded.valid_len as u64)?;
        }

        let file = OpenOptions::new().read(true).append(true).open(&path)?;
        let next_lsn = decoded.entries.len() as Lsn;
        debug!("reopened log {} at lsn {}", path.display(), next_lsn);

        let wal = Self::with_file(path, file, next_lsn);
        // Everything read back from disk is already durable
        wal.inner.lock().flushed_lsn = next_lsn.checked_sub(1);
        Ok(wal)
    }

    fn with_file(path: PathBuf, file: File, next_lsn: Lsn) -> Self {
        Self {
            path,
            inner: Mutex::new(WalInner {
                file: BufWriter::new(file),
                next_lsn,
                flushed_lsn: None,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// LSN the next append will receive.
    pub fn next_lsn(&self) -> Lsn {
        self.inner.lock().next_lsn
    }

    pub fn flushed_lsn(&self) -> Option<Lsn> {
        self.inner.lock().flushed_lsn
    }
}

impl LogStore for Wal {
    fn append(&self, values: &[LogValue]) -> Result<Lsn> {
        let entry = encode_entry(&encode_payload(values));

        let mut inner = self.inner.lock();
        inner.file.write_all(&entry)?;

        let lsn = inner.next_lsn;
        inner.next_lsn += 1;
        Ok(lsn)
    }

    fn flush(&self, lsn: Lsn) -> Result<()> {
        let mut inner = self.inner.lock();

        if inner.flushed_lsn.is_some_and(|flushed| lsn <= flushed) {
            return Ok(());
        }

        inner.file.flush()?;
        inner.file.get_mut().sync_all()?;
        inner.flushed_lsn = inner.next_lsn.checked_sub(1);
        Ok(())
    }

    fn records_rev(&self) -> Result<Vec<LogRecordReader>> {
        let raw = {
            let mut inner = self.inner.lock();
            // Buffered entries must reach the file before it is read back
            inner.file.flush()?;
            fs::read(&self.path)?
        };

        let decoded = decode_entries(Bytes::from(raw))?;

        Ok(decoded
            .entries
            .into_iter()
            .enumerate()
            .rev()
            .map(|(lsn, payload)| LogRecordReader::new(lsn as Lsn, payload))
            .collect())
    }
}
