#[cfg(test)]

pub mod test {

    use std::{collections::HashSet, sync::Arc};

    use proptest::prelude::*;

    use crate::{
        buffer::{BufferError, BufferHandle, BufferPoolManager},
        storage::{BlockId, BlockStore, MemoryStore, Page},
        wal::MemoryWal,
    };

    const POOL_SIZE: usize = 3;
    const MAX_REF_COUNT: u32 = 2;

    #[derive(Debug, Clone)]
    enum Op {
        Pin(u32),
        // Index into the held handles, wrapped around
        Unpin(usize),
        Flush(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u32..6).prop_map(Op::Pin),
            3 => any::<usize>().prop_map(Op::Unpin),
            1 => (1u32..3).prop_map(Op::Flush),
        ]
    }

    fn check_invariants(bpm: &BufferPoolManager, held: &[BufferHandle]) -> Result<(), TestCaseError> {
        let stats = bpm.frame_stats();

        let unpinned = stats.iter().filter(|frame| frame.pin_count == 0).count();
        prop_assert_eq!(unpinned, bpm.available());

        let resident: Vec<&BlockId> = stats.iter().filter_map(|frame| frame.block.as_ref()).collect();
        let unique: HashSet<&BlockId> = resident.iter().copied().collect();
        prop_assert_eq!(resident.len(), unique.len());

        for frame in &stats {
            prop_assert!(frame.ref_count <= MAX_REF_COUNT);
            if let Some(block) = &frame.block {
                prop_assert_eq!(Some(frame.frame_id), bpm.lookup(block));
            }
        }

        for handle in held {
            prop_assert_eq!(Some(handle.frame_id()), bpm.lookup(handle.block()));
            let expected = held.iter().filter(|other| other.frame_id() == handle.frame_id()).count();
            prop_assert_eq!(expected as u32, bpm.pin_count(handle));
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn pool_invariants_hold_for_any_schedule(ops in prop::collection::vec(op(), 1..60)) {
            let store = Arc::new(MemoryStore::new());
            for _ in 0..6 {
                store.append("prop.tbl", &Page::new()).unwrap();
            }
            let log = Arc::new(MemoryWal::new());
            let bpm = BufferPoolManager::new(POOL_SIZE, MAX_REF_COUNT, store, log);
            let mut held: Vec<BufferHandle> = Vec::new();

            for op in ops {
                match op {
                    Op::Pin(number) => {
                        let block = BlockId::new("prop.tbl", number);
                        let pinned_frames: HashSet<usize> = held.iter().map(|h| h.frame_id()).collect();
                        let resident = bpm.lookup(&block).is_some();

                        match bpm.pin(&block) {
                            Ok(handle) => {
                                bpm.buffer(&handle).set_int(0, number, number % 2 + 1, None).unwrap();
                                held.push(handle);
                            }
                            Err(BufferError::PoolExhausted) => {
                                // Only possible when every frame is pinned and the block is not resident
                                prop_assert!(!resident);
                                prop_assert_eq!(POOL_SIZE, pinned_frames.len());
                            }
                            Err(err) => return Err(TestCaseError::fail(err.to_string())),
                        }
                    }
                    Op::Unpin(i) => {
                        if !held.is_empty() {
                            let handle = held.remove(i % held.len());
                            bpm.unpin(&handle).unwrap();
                        }
                    }
                    Op::Flush(txnum) => bpm.flush_all(txnum).unwrap(),
                }

                check_invariants(&bpm, &held)?;
            }
        }
    }
}
