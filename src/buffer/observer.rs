use log::{log_enabled, trace, Level};

use super::FrameId;
use crate::storage::BlockId;

/// State of one frame as seen by an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStat {
    pub frame_id: FrameId,
    pub block: Option<BlockId>,
    pub pin_count: u32,
    pub ref_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent<'a> {
    Pinned {
        frame_id: FrameId,
        block: &'a BlockId,
    },
    Unpinned {
        frame_id: FrameId,
    },
    /// A frame was repurposed for `block`; `evicted` is what it held before.
    Replaced {
        frame_id: FrameId,
        evicted: Option<&'a BlockId>,
        block: &'a BlockId,
    },
    Exhausted,
    Flushed {
        frame_id: FrameId,
        block: &'a BlockId,
    },
}

/// Hook called after every pool event, under the pool lock.
///
/// Implementations must not call back into the pool.
pub trait PoolObserver: Send + Sync {
    fn on_event(&self, event: &PoolEvent<'_>, frames: &[FrameStat], available: usize);
}

/// Dumps the frame table through the `log` facade at trace level.
#[derive(Debug, Default)]
pub struct LogObserver;

impl PoolObserver for LogObserver {
    fn on_event(&self, event: &PoolEvent<'_>, frames: &[FrameStat], available: usize) {
        if !log_enabled!(Level::Trace) {
            return;
        }

        trace!("{:?}", event);
        for frame in frames {
            let block = frame
                .block
                .as_ref()
                .map_or_else(|| "-".to_string(), |block| block.to_string());

            if frame.pin_count > 0 {
                trace!(
                    "frame {} {} pins {} ref -",
                    frame.frame_id,
                    block,
                    frame.pin_count
                );
            } else {
                trace!(
                    "frame {} {} pins 0 ref {}",
                    frame.frame_id,
                    block,
                    frame.ref_count
                );
            }
        }
        trace!("available buffers: {}", available);
    }
}
