use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use log::debug;
use parking_lot::Mutex;

use super::{fdpool::FdPool, BlockStore};
use crate::storage::{error::Result, BlockId, Page, PAGE_SIZE};

/// Directory-backed block store. Every file name maps to one file inside the
/// database directory; block `n` lives at byte offset `n * PAGE_SIZE`.
pub struct FileManager {
    dir: PathBuf,
    is_new: bool,

    // Open handles, bounded so a database with many files does not exhaust descriptors
    file_descriptors: Mutex<FdPool>,

    num_reads: AtomicU64,
    num_writes: AtomicU64,
}

impl FileManager {
    pub fn new(dir: impl AsRef<Path>, max_open_files: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let is_new = !dir.exists();

        if is_new {
            fs::create_dir_all(&dir)?;
        }

        Ok(Self {
            dir,
            is_new,
            file_descriptors: Mutex::new(FdPool::new(max_open_files)),
            num_reads: AtomicU64::new(0),
            num_writes: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn num_reads(&self) -> u64 {
        self.num_reads.load(Ordering::Relaxed)
    }

    pub fn num_writes(&self) -> u64 {
        self.num_writes.load(Ordering::Relaxed)
    }

    // Runs `op` against the open handle for `file_name`, opening it if needed.
    fn with_file<T>(
        &self,
        file_name: &str,
        op: impl FnOnce(&mut File) -> std::io::Result<T>,
    ) -> Result<T> {
        let mut pool = self.file_descriptors.lock();

        if let Some(file) = pool.get(file_name) {
            return Ok(op(file)?);
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(file_name))?;

        let result = op(&mut file);

        if let Some(closed) = pool.set(file_name.to_string(), file) {
            debug!("closed file handle for {}", closed);
        }

        Ok(result?)
    }

    fn write_at(file: &mut File, number: u32, page: &Page) -> std::io::Result<()> {
        file.seek(SeekFrom::Start(number as u64 * PAGE_SIZE as u64))?;
        file.write_all(page.as_slice())?;
        file.sync_data()
    }
}

impl BlockStore for FileManager {
    fn read(&self, block: &BlockId, page: &mut Page) -> Result<()> {
        self.with_file(block.file_name(), |file| {
            file.seek(SeekFrom::Start(block.number() as u64 * PAGE_SIZE as u64))?;

            let buf = page.as_mut_slice();
            let mut filled = 0;

            while filled < PAGE_SIZE {
                let n = file.read(&mut buf[filled..])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }

            // Past end of file
            buf[filled..].fill(0);
            Ok(())
        })?;

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn write(&self, block: &BlockId, page: &Page) -> Result<()> {
        self.with_file(block.file_name(), |file| {
            Self::write_at(file, block.number(), page)
        })?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn append(&self, file_name: &str, page: &Page) -> Result<BlockId> {
        let number = self.with_file(file_name, |file| {
            let number = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;
            Self::write_at(file, number, page)?;
            Ok(number)
        })?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(BlockId::new(file_name, number))
    }

    fn block_count(&self, file_name: &str) -> Result<u32> {
        self.with_file(file_name, |file| {
            Ok((file.metadata()?.len() / PAGE_SIZE as u64) as u32)
        })
    }

    fn is_new(&self) -> bool {
        self.is_new
    }
}
