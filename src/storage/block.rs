use std::fmt;

/// Identifies one fixed-size block of a file.
///
/// Two identities are equal iff both the file name and the block number match.
/// Used only as a key; never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId {
    file_name: String,
    number: u32,
}

impl BlockId {
    pub fn new(file_name: impl Into<String>, number: u32) -> Self {
        Self {
            file_name: file_name.into(),
            number,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}
