use std::collections::HashMap;

use super::FrameId;
use crate::storage::BlockId;

/// Maps each resident block to the frame holding it.
///
/// The reverse mapping (frame to block) is kept alongside so that rebinding a
/// frame drops its stale entry without scanning the whole map.
#[derive(Debug)]
pub struct BlockIndex {
    forward: HashMap<BlockId, FrameId>,
    reverse: Vec<Option<BlockId>>,
}

impl BlockIndex {
    pub fn new(pool_size: usize) -> Self {
        Self {
            forward: HashMap::with_capacity(pool_size),
            reverse: vec![None; pool_size],
        }
    }

    pub fn lookup(&self, block: &BlockId) -> Option<FrameId> {
        self.forward.get(block).copied()
    }

    /// Records that `frame_id` now holds `block`, dropping whatever the frame held before.
    pub fn bind(&mut self, block: BlockId, frame_id: FrameId) {
        self.unbind(frame_id);

        if let Some(previous) = self.forward.insert(block.clone(), frame_id) {
            // A block lives in at most one frame; the caller checks residency first
            debug_assert!(false, "{} was already bound to frame {}", block, previous);
            self.reverse[previous] = None;
        }
        self.reverse[frame_id] = Some(block);
    }

    /// Forgets whatever `frame_id` holds and returns it.
    pub fn unbind(&mut self, frame_id: FrameId) -> Option<BlockId> {
        let stale = self.reverse[frame_id].take()?;
        self.forward.remove(&stale);
        Some(stale)
    }

    pub fn block_of(&self, frame_id: FrameId) -> Option<&BlockId> {
        self.reverse.get(frame_id).and_then(Option::as_ref)
    }

    /// Number of resident blocks.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[cfg(test)]
pub mod test {
    use super::BlockIndex;
    use crate::storage::BlockId;

    #[test]
    fn rebinding_drops_stale_entry() {
        let mut index = BlockIndex::new(3);
        let a = BlockId::new("f", 1);
        let b = BlockId::new("f", 2);

        index.bind(a.clone(), 0);
        assert_eq!(Some(0), index.lookup(&a));
        assert_eq!(Some(&a), index.block_of(0));

        // Frame 0 is repurposed for b; a must no longer resolve to it
        index.bind(b.clone(), 0);
        assert_eq!(None, index.lookup(&a));
        assert_eq!(Some(0), index.lookup(&b));
        assert_eq!(1, index.len());
    }

    #[test]
    fn unbind_clears_both_directions() {
        let mut index = BlockIndex::new(2);
        let a = BlockId::new("f", 1);

        index.bind(a.clone(), 1);
        assert_eq!(Some(a.clone()), index.unbind(1));
        assert_eq!(None, index.unbind(1));

        assert_eq!(None, index.lookup(&a));
        assert_eq!(None, index.block_of(1));
        assert!(index.is_empty());
    }
}
