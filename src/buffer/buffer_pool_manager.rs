use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, MutexGuard};

use crate::{
    storage::{BlockId, BlockStore},
    wal::LogStore,
};

use super::{
    error::{BufferError, Result},
    frame::{Buffer, PageFormatter},
    index::BlockIndex,
    observer::{FrameStat, PoolEvent, PoolObserver},
    replacer::{GClockReplacer, Replacer},
};

pub type FrameId = usize;
pub type TxNum = u32;

/// A pin on one frame, returned by [`BufferPoolManager::pin`] and
/// [`BufferPoolManager::pin_new`]. Give it back with [`BufferPoolManager::unpin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferHandle {
    frame_id: FrameId,
    block: BlockId,
}

impl BufferHandle {
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }
}

// Everything a pin / unpin / flush decision reads or writes
struct PoolState {
    index: BlockIndex,
    pins: Vec<u32>,
    num_available: usize,
    replacer: Box<dyn Replacer>,
}

impl PoolState {
    fn pin(&mut self, frame_id: FrameId) {
        if self.pins[frame_id] == 0 {
            self.num_available -= 1;
        }
        self.pins[frame_id] += 1;
    }
}

/// Fixed-size pool of frames caching disk blocks.
///
/// `pin`, `pin_new`, `unpin` and `flush_all` are serialized by one pool-wide
/// lock, so no frame can be picked as a victim by two callers at once. None of
/// them waits for a frame to free up: an exhausted pool is reported right away.
///
/// A victim that still holds unflushed changes is written out (log first) before
/// it is reused, so eviction never drops a dirty page.
pub struct BufferPoolManager {
    frames: Vec<Mutex<Buffer>>,
    state: Mutex<PoolState>,

    store: Arc<dyn BlockStore>,
    log: Arc<dyn LogStore>,

    observer: Option<Arc<dyn PoolObserver>>,
}

impl BufferPoolManager {
    /// Creates a pool of `num_buffers` frames using GClock replacement with
    /// reference counters capped at `max_ref_count`.
    ///
    /// # Panics
    ///
    /// Panics if `num_buffers` is 0.
    pub fn new(
        num_buffers: usize,
        max_ref_count: u32,
        store: Arc<dyn BlockStore>,
        log: Arc<dyn LogStore>,
    ) -> Self {
        Self::with_replacer(
            Box::new(GClockReplacer::new(num_buffers, max_ref_count)),
            store,
            log,
        )
    }

    /// Creates a pool with as many frames as `replacer` tracks.
    pub fn with_replacer(
        replacer: Box<dyn Replacer>,
        store: Arc<dyn BlockStore>,
        log: Arc<dyn LogStore>,
    ) -> Self {
        let num_buffers = replacer.size();
        assert!(num_buffers > 0, "buffer pool needs at least one frame");

        let frames = (0..num_buffers).map(|_| Mutex::new(Buffer::new())).collect();

        let state = PoolState {
            index: BlockIndex::new(num_buffers),
            pins: vec![0; num_buffers],
            num_available: num_buffers,
            replacer,
        };

        Self {
            frames,
            state: Mutex::new(state),
            store,
            log,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PoolObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    pub fn store(&self) -> &Arc<dyn BlockStore> {
        &self.store
    }

    pub fn log(&self) -> &Arc<dyn LogStore> {
        &self.log
    }

    /// Pins `block`, reading it into a frame if it is not resident.
    ///
    /// # Errors
    ///
    /// - `BufferError::PoolExhausted` if the block is not resident and no frame
    ///   can be replaced; the pool is left exactly as it was
    /// - `BufferError::Storage` / `BufferError::Log` if flushing the victim or
    ///   reading the block fails
    pub fn pin(&self, block: &BlockId) -> Result<BufferHandle> {
        let mut state = self.state.lock();

        let frame_id = match state.index.lookup(block) {
            Some(frame_id) => frame_id,
            None => {
                let frame_id = self.choose_victim(&mut state)?;
                self.replace(&mut state, frame_id, |buffer, store| {
                    buffer.assign_to_block(block, store)?;
                    Ok(block.clone())
                })?;
                frame_id
            }
        };

        state.pin(frame_id);
        self.notify(&state, PoolEvent::Pinned { frame_id, block });

        Ok(BufferHandle {
            frame_id,
            block: block.clone(),
        })
    }

    /// Appends a new block to `file_name`, formatted by `formatter`, and pins it.
    ///
    /// # Errors
    ///
    /// Same as [`BufferPoolManager::pin`]. On `PoolExhausted` nothing is appended.
    pub fn pin_new(&self, file_name: &str, formatter: &dyn PageFormatter) -> Result<BufferHandle> {
        let mut state = self.state.lock();

        let frame_id = self.choose_victim(&mut state)?;
        let block = self.replace(&mut state, frame_id, |buffer, store| {
            Ok(buffer.assign_to_new(file_name, formatter, store)?)
        })?;

        state.pin(frame_id);
        self.notify(
            &state,
            PoolEvent::Pinned {
                frame_id,
                block: &block,
            },
        );

        Ok(BufferHandle { frame_id, block })
    }

    /// Releases one pin. When the last pin goes the frame becomes available and
    /// its reference counter restarts at the maximum.
    ///
    /// # Errors
    ///
    /// `BufferError::InconsistentUnpin` if the frame is not pinned; nothing changes.
    pub fn unpin(&self, handle: &BufferHandle) -> Result<()> {
        let mut state = self.state.lock();
        let frame_id = self.check_frame(handle)?;

        if state.pins[frame_id] == 0 {
            return Err(BufferError::InconsistentUnpin { frame_id });
        }

        state.pins[frame_id] -= 1;
        if state.pins[frame_id] == 0 {
            state.num_available += 1;
            state.replacer.record_unpin(frame_id);
        }

        self.notify(&state, PoolEvent::Unpinned { frame_id });
        Ok(())
    }

    /// Writes every page last modified by `txnum` to disk.
    pub fn flush_all(&self, txnum: TxNum) -> Result<()> {
        let state = self.state.lock();

        for (frame_id, frame) in self.frames.iter().enumerate() {
            let mut buffer = frame.lock();

            if buffer.is_modified_by(txnum) && buffer.flush(&*self.store, &*self.log)? {
                if let Some(block) = buffer.block() {
                    debug!("flushed {} for tx {}", block, txnum);
                    self.notify(&state, PoolEvent::Flushed { frame_id, block });
                }
            }
        }

        Ok(())
    }

    /// Number of frames with no pins.
    pub fn available(&self) -> usize {
        self.state.lock().num_available
    }

    /// Locks the frame behind `handle` for reading or changing its page.
    ///
    /// The handle must still be pinned. Drop the guard before calling any other
    /// pool method.
    ///
    /// # Panics
    ///
    /// Panics if `handle` names a frame outside this pool.
    pub fn buffer(&self, handle: &BufferHandle) -> MutexGuard<'_, Buffer> {
        self.frames[handle.frame_id].lock()
    }

    /// Overwrites the pinned page with the stored image of `saved`, on behalf of `txnum`.
    pub fn restore_block(&self, handle: &BufferHandle, saved: &BlockId, txnum: TxNum) -> Result<()> {
        let frame_id = {
            let state = self.state.lock();
            let frame_id = self.check_frame(handle)?;
            if state.pins[frame_id] == 0 {
                return Err(BufferError::InconsistentUnpin { frame_id });
            }
            frame_id
        };

        let mut buffer = self.frames[frame_id].lock();
        buffer.restore_block(saved, txnum, &*self.store)?;
        debug!("restored {} from {} for tx {}", handle.block, saved, txnum);
        Ok(())
    }

    /// Frame currently holding `block`, if it is resident.
    pub fn lookup(&self, block: &BlockId) -> Option<FrameId> {
        self.state.lock().index.lookup(block)
    }

    pub fn pin_count(&self, handle: &BufferHandle) -> u32 {
        self.state
            .lock()
            .pins
            .get(handle.frame_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn frame_stats(&self) -> Vec<FrameStat> {
        let state = self.state.lock();
        Self::stats(&state)
    }

    fn stats(state: &PoolState) -> Vec<FrameStat> {
        (0..state.pins.len())
            .map(|frame_id| FrameStat {
                frame_id,
                block: state.index.block_of(frame_id).cloned(),
                pin_count: state.pins[frame_id],
                ref_count: state.replacer.ref_count(frame_id),
            })
            .collect()
    }

    fn check_frame(&self, handle: &BufferHandle) -> Result<FrameId> {
        if handle.frame_id >= self.frames.len() {
            return Err(BufferError::InvalidFrame {
                frame_id: handle.frame_id,
                pool_size: self.frames.len(),
            });
        }
        Ok(handle.frame_id)
    }

    fn choose_victim(&self, state: &mut PoolState) -> Result<FrameId> {
        let victim = state.replacer.evict(&state.pins);

        victim.ok_or_else(|| {
            debug!("no replaceable frame, {} available", state.num_available);
            self.notify(state, PoolEvent::Exhausted);
            BufferError::PoolExhausted
        })
    }

    // Flushes the victim, loads the new page through `assign` and rebinds the
    // index. A failed flush leaves the victim untouched; a failed load leaves
    // the frame empty and unbound.
    fn replace<F>(&self, state: &mut PoolState, frame_id: FrameId, assign: F) -> Result<BlockId>
    where
        F: FnOnce(&mut Buffer, &dyn BlockStore) -> Result<BlockId>,
    {
        let mut buffer = self.frames[frame_id].lock();

        if buffer.flush(&*self.store, &*self.log)? {
            debug!("flushed dirty victim frame {} before reuse", frame_id);
        }

        let evicted = state.index.unbind(frame_id);
        let block = assign(&mut buffer, &*self.store)?;

        state.index.bind(block.clone(), frame_id);
        self.notify(
            state,
            PoolEvent::Replaced {
                frame_id,
                evicted: evicted.as_ref(),
                block: &block,
            },
        );
        Ok(block)
    }

    fn notify(&self, state: &PoolState, event: PoolEvent<'_>) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event, &Self::stats(state), state.num_available);
        }
    }
}
