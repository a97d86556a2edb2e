//! Append-only write-ahead log.
//!
//! A log entry is a flat list of positional values: the reader must consume
//! them in the order the writer appended them. On disk each entry is framed as
//!
//! ```text
//! | payload len: u32 LE | payload | crc32(payload): u32 LE |
//! ```
//!
//! where an int is a `u32` LE and a string is a `u32` LE length followed by its
//! UTF-8 bytes. Entries are numbered from 0 in append order; that number is the
//! entry's log sequence number (LSN).

pub mod file;
pub mod memory;

pub use file::Wal;
pub use memory::MemoryWal;

use bytes::{Buf, BufMut, Bytes};
use thiserror::Error;

pub type Lsn = u64;

const LEN_SIZE: usize = 4;
const CRC_SIZE: usize = 4;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch in log entry {lsn}")]
    ChecksumMismatch { lsn: Lsn },

    /// A reader asked for more values than the entry holds.
    #[error("log entry {lsn} ended before the expected field")]
    UnexpectedEnd { lsn: Lsn },

    #[error("invalid UTF-8 string in log entry {lsn}")]
    InvalidString { lsn: Lsn },

    #[error("log store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, WalError>;

/// One positional field of a log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogValue {
    Int(u32),
    Str(String),
}

impl From<u32> for LogValue {
    fn from(value: u32) -> Self {
        LogValue::Int(value)
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::Str(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::Str(value)
    }
}

/// Durable, append-only store of log entries.
pub trait LogStore: Send + Sync {
    /// Appends one entry and returns its LSN. The entry is not durable until
    /// `flush` covers it.
    fn append(&self, values: &[LogValue]) -> Result<Lsn>;

    /// Makes every entry up to and including `lsn` durable.
    fn flush(&self, lsn: Lsn) -> Result<()>;

    /// All entries, newest first.
    fn records_rev(&self) -> Result<Vec<LogRecordReader>>;
}

/// Positional reader over the payload of one log entry.
#[derive(Debug, Clone)]
pub struct LogRecordReader {
    lsn: Lsn,
    buf: Bytes,
}

impl LogRecordReader {
    pub fn new(lsn: Lsn, payload: Bytes) -> Self {
        Self { lsn, buf: payload }
    }

    pub fn lsn(&self) -> Lsn {
        self.lsn
    }

    pub fn next_int(&mut self) -> Result<u32> {
        if self.buf.remaining() < LEN_SIZE {
            return Err(WalError::UnexpectedEnd { lsn: self.lsn });
        }
        Ok(self.buf.get_u32_le())
    }

    pub fn next_string(&mut self) -> Result<String> {
        let len = self.next_int()? as usize;
        if self.buf.remaining() < len {
            return Err(WalError::UnexpectedEnd { lsn: self.lsn });
        }

        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec()).map_err(|_| WalError::InvalidString { lsn: self.lsn })
    }

    pub fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }
}

pub(crate) fn encode_payload(values: &[LogValue]) -> Vec<u8> {
    let mut buf = Vec::<u8>::new();

    for value in values {
        match value {
            LogValue::Int(v) => buf.put_u32_le(*v),
            LogValue::Str(s) => {
                buf.put_u32_le(s.len() as u32);
                buf.put_slice(s.as_bytes());
            }
        }
    }
    buf
}

fn checksum(payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Frames a payload with its length and checksum.
pub(crate) fn encode_entry(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::<u8>::with_capacity(LEN_SIZE + payload.len() + CRC_SIZE);

    buf.put_u32_le(payload.len() as u32);
    buf.put_slice(payload);
    buf.put_u32_le(checksum(payload));
    buf
}

/// Result of scanning a framed log image.
pub(crate) struct DecodedLog {
    pub entries: Vec<Bytes>,
    /// Bytes belonging to complete entries; anything after is a torn tail.
    pub valid_len: usize,
}

pub(crate) fn decode_entries(raw: Bytes) -> Result<DecodedLog> {
    let mut rbuf = raw.clone();
    let mut entries = Vec::new();
    let mut valid_len = 0;

    while rbuf.remaining() >= LEN_SIZE {
        let entry_len = (&rbuf[..LEN_SIZE]).get_u32_le() as usize;

        if rbuf.remaining() < LEN_SIZE + entry_len + CRC_SIZE {
            break;
        }

        rbuf.advance(LEN_SIZE);
        let payload = rbuf.split_to(entry_len);
        let stored = rbuf.get_u32_le();

        if checksum(&payload) != stored {
            return Err(WalError::ChecksumMismatch {
                lsn: entries.len() as Lsn,
            });
        }

        entries.push(payload);
        valid_len += LEN_SIZE + entry_len + CRC_SIZE;
    }

    Ok(DecodedLog { entries, valid_len })
}
