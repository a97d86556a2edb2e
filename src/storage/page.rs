use byteorder::{BigEndian, ByteOrder};

use super::error::{Result, StorageError};

pub mod page_constants {
    // Size of every block on disk and every frame in the pool
    pub const PAGE_SIZE: usize = 1024 * 4;
    // Integers are stored as 4 big-endian bytes
    pub const INT_SIZE: usize = 4;
}

pub use page_constants::PAGE_SIZE;
use page_constants::INT_SIZE;

/// The raw contents of one block held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Page {
    data: Box<[u8]>,
}

impl Page {
    pub fn new() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE].into_boxed_slice(),
        }
    }

    /// Builds a page from `bytes`, zero-padding anything shorter than a block.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut page = Self::new();
        let len = bytes.len().min(PAGE_SIZE);
        page.data[..len].copy_from_slice(&bytes[..len]);
        page
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn copy_from(&mut self, other: &Page) {
        self.data.copy_from_slice(&other.data);
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn get_int(&self, offset: usize) -> Result<u32> {
        let bytes = self.range(offset, INT_SIZE)?;
        Ok(BigEndian::read_u32(bytes))
    }

    pub fn set_int(&mut self, offset: usize, value: u32) -> Result<()> {
        self.check(offset, INT_SIZE)?;
        BigEndian::write_u32(&mut self.data[offset..offset + INT_SIZE], value);
        Ok(())
    }

    /// Reads a string stored as a 4-byte length followed by its UTF-8 bytes.
    pub fn get_string(&self, offset: usize) -> Result<String> {
        let len = self.get_int(offset)? as usize;
        let bytes = self.range(offset + INT_SIZE, len)?;

        String::from_utf8(bytes.to_vec()).map_err(|_| StorageError::InvalidString { offset })
    }

    pub fn set_string(&mut self, offset: usize, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        self.check(offset, INT_SIZE + bytes.len())?;

        BigEndian::write_u32(&mut self.data[offset..offset + INT_SIZE], bytes.len() as u32);
        self.data[offset + INT_SIZE..offset + INT_SIZE + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Bytes a string of `len` bytes occupies on the page.
    pub fn max_length(len: usize) -> usize {
        INT_SIZE + len
    }

    fn range(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.check(offset, len)?;
        Ok(&self.data[offset..offset + len])
    }

    fn check(&self, offset: usize, len: usize) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= PAGE_SIZE => Ok(()),
            _ => Err(StorageError::OutOfBounds { offset, len }),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Dumping 4KB of bytes is never useful in a debug print
        f.debug_struct("Page")
            .field("head", &&self.data[..16])
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub mod test {
    use super::{Page, PAGE_SIZE};
    use crate::storage::StorageError;

    #[test]
    fn int_and_string_accessors() {
        let mut page = Page::new();

        page.set_int(0, 42).unwrap();
        page.set_string(4, "shadow").unwrap();

        assert_eq!(42, page.get_int(0).unwrap());
        assert_eq!("shadow", page.get_string(4).unwrap());
        assert_eq!(10, Page::max_length(6));

        // Stored big-endian
        assert_eq!(&[0, 0, 0, 42], &page.as_slice()[..4]);
    }

    #[test]
    fn accessors_are_bounds_checked() {
        let mut page = Page::new();

        assert!(matches!(
            page.set_int(PAGE_SIZE - 2, 1),
            Err(StorageError::OutOfBounds { .. })
        ));
        assert!(page.get_int(PAGE_SIZE).is_err());
        assert!(page.set_string(PAGE_SIZE - 5, "too long").is_err());
    }

    #[test]
    fn from_bytes_pads_with_zeroes() {
        let page = Page::from_bytes(&[7u8; 10]);

        assert_eq!(PAGE_SIZE, page.as_slice().len());
        assert_eq!(&[7u8; 10], &page.as_slice()[..10]);
        assert!(page.as_slice()[10..].iter().all(|&b| b == 0));
    }
}
