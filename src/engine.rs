use std::{
    env,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use log::info;

use crate::{
    buffer::{BufferPoolManager, LogObserver, TxNum},
    recovery::{LogRecord, RecoveryManager},
    storage::{BlockStore, FileManager},
    wal::{LogStore, Wal},
};

pub struct StorageOptions {
    // Frames in the buffer pool
    pub num_buffers: usize,
    // Clock sweeps an unpinned frame survives before it can be replaced
    pub max_ref_count: u32,
    // Log file name, relative to the database directory
    pub log_file: String,
    pub max_open_files: usize,
    // Dump the frame table at trace level after every pool event
    pub trace_pool: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            num_buffers: 8,
            max_ref_count: 3,
            log_file: "geode.log".to_string(),
            max_open_files: 16,
            trace_pool: false,
        }
    }
}

impl StorageOptions {
    /// Defaults, overridden by any `GEODE_*` variables set in the environment.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Some(value) = env_var("GEODE_NUM_BUFFERS") {
            options.num_buffers = value
                .parse()
                .with_context(|| format!("invalid GEODE_NUM_BUFFERS {:?}", value))?;
        }
        if let Some(value) = env_var("GEODE_MAX_REF_COUNT") {
            options.max_ref_count = value
                .parse()
                .with_context(|| format!("invalid GEODE_MAX_REF_COUNT {:?}", value))?;
        }
        if let Some(value) = env_var("GEODE_LOG_FILE") {
            options.log_file = value;
        }
        if let Some(value) = env_var("GEODE_MAX_OPEN_FILES") {
            options.max_open_files = value
                .parse()
                .with_context(|| format!("invalid GEODE_MAX_OPEN_FILES {:?}", value))?;
        }
        if let Some(value) = env_var("GEODE_TRACE_POOL") {
            options.trace_pool = value
                .parse()
                .with_context(|| format!("invalid GEODE_TRACE_POOL {:?}", value))?;
        }

        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.num_buffers > 0, "num_buffers must be at least 1");
        anyhow::ensure!(self.max_open_files > 0, "max_open_files must be at least 1");
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// A database directory with its block files, log and buffer pool.
pub struct StorageEngine {
    dir: PathBuf,
    store: Arc<FileManager>,
    log: Arc<Wal>,
    bpm: Arc<BufferPoolManager>,
    next_txnum: AtomicU32,
}

impl StorageEngine {
    /// Opens the database in `dir`, creating it if it does not exist.
    ///
    /// An existing database is recovered before this returns: updates of
    /// transactions that never finished are undone.
    pub fn open(dir: impl AsRef<Path>, options: StorageOptions) -> Result<Self> {
        options.validate()?;
        let dir = dir.as_ref().to_path_buf();

        let store = Arc::new(
            FileManager::new(&dir, options.max_open_files)
                .with_context(|| format!("failed to open database directory {}", dir.display()))?,
        );
        let log = Arc::new(
            Wal::open(dir.join(&options.log_file)).context("failed to open the log")?,
        );

        let mut bpm = BufferPoolManager::new(
            options.num_buffers,
            options.max_ref_count,
            store.clone(),
            log.clone(),
        );
        if options.trace_pool {
            bpm = bpm.with_observer(Arc::new(LogObserver));
        }

        let last_txnum = Self::last_txnum(&*log)?;
        let engine = Self {
            dir,
            store,
            log,
            bpm: Arc::new(bpm),
            next_txnum: AtomicU32::new(last_txnum + 1),
        };

        if engine.store.is_new() {
            info!("creating new database in {}", engine.dir.display());
        } else {
            info!("recovering existing database in {}", engine.dir.display());
            engine
                .begin()?
                .recover()
                .context("failed to recover from the log")?;
        }

        Ok(engine)
    }

    /// Starts a transaction with the next unused number.
    pub fn begin(&self) -> Result<RecoveryManager> {
        let txnum = self.next_txnum.fetch_add(1, Ordering::SeqCst);
        RecoveryManager::new(txnum, self.bpm.clone())
            .with_context(|| format!("failed to start transaction {}", txnum))
    }

    pub fn buffer_manager(&self) -> &Arc<BufferPoolManager> {
        &self.bpm
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.store
    }

    pub fn wal(&self) -> &Arc<Wal> {
        &self.log
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Highest transaction number in the log, 0 if there is none
    fn last_txnum(log: &dyn LogStore) -> Result<TxNum> {
        let mut last = 0;

        for reader in log.records_rev().context("failed to read the log")? {
            let rec = LogRecord::from_reader(reader)?;
            last = last.max(rec.tx_number());
        }
        Ok(last)
    }
}
