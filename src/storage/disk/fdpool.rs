use std::fs::File;

use hashlink::LinkedHashMap;

/// Bounded pool of open file handles keyed by file name.
///
/// Least recently used handles are closed first once the pool is full.
pub struct FdPool {
    descriptors: LinkedHashMap<String, File>,
    capacity: usize,
}

impl FdPool {
    pub fn new(capacity: usize) -> Self {
        FdPool {
            descriptors: LinkedHashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns the handle for `file_name`, marking it most recently used.
    pub fn get(&mut self, file_name: &str) -> Option<&mut File> {
        self.descriptors.to_back(file_name)
    }

    /// Stores a handle and returns the name of the one closed to make room, if any.
    pub fn set(&mut self, file_name: String, file: File) -> Option<String> {
        if self.descriptors.contains_key(&file_name) {
            self.descriptors.replace(file_name, file);
            return None;
        }

        let evicted = if self.descriptors.len() >= self.capacity {
            self.descriptors.pop_front().map(|(name, _)| name)
        } else {
            None
        };

        self.descriptors.insert(file_name, file);
        evicted
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.descriptors.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
pub mod tests {
    use super::FdPool;

    #[test]
    fn cache_test() {
        let dir = tempfile::tempdir().unwrap();
        let open = |name: &str| std::fs::File::create(dir.path().join(name)).unwrap();

        let mut fd_pool = FdPool::new(2);

        assert_eq!(None, fd_pool.set("a".to_string(), open("a")));
        assert_eq!(None, fd_pool.set("b".to_string(), open("b")));

        // Touching "a" leaves "b" as the least recently used handle
        assert!(fd_pool.get("a").is_some());

        let evicted = fd_pool.set("c".to_string(), open("c"));
        assert_eq!(Some("b".to_string()), evicted);

        assert!(fd_pool.get("b").is_none());
        assert!(fd_pool.contains("a"));
        assert!(fd_pool.contains("c"));
        assert_eq!(2, fd_pool.len());
    }
}
