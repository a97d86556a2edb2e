pub mod buffer;
pub mod engine;
pub mod recovery;
pub mod storage;
pub mod wal;

#[cfg(test)]
mod tests;
