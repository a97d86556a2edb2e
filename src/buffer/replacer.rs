use log::debug;

use super::FrameId;

/// Victim selection for the buffer pool.
///
/// The pool calls `evict` only while holding its state lock and passes the
/// current pin count of every frame, indexed by frame id.
pub trait Replacer: Send {
    /// Picks an unpinned frame to reuse, or `None` if there is none.
    fn evict(&mut self, pins: &[u32]) -> Option<FrameId>;

    /// Called exactly once each time a frame's pin count drops from 1 to 0.
    fn record_unpin(&mut self, frame_id: FrameId);

    /// Current reference counter of a frame (meaningful only while unpinned).
    fn ref_count(&self, frame_id: FrameId) -> u32;

    /// Number of frames tracked.
    fn size(&self) -> usize;
}

/// Generalized clock (GClock) replacement.
///
/// Each frame carries a reference counter in `0..=max_ref_count`. A frame that
/// becomes unpinned starts at `max_ref_count`; every time the clock hand passes
/// it while it is unpinned the counter drops by one, and it becomes the victim
/// once the hand finds it unpinned at zero. Recently released frames therefore
/// survive several sweeps before they are reused.
pub struct GClockReplacer {
    ref_counts: Vec<u32>,
    clock_hand: usize,
    max_ref_count: u32,
}

impl GClockReplacer {
    pub fn new(pool_size: usize, max_ref_count: u32) -> Self {
        GClockReplacer {
            ref_counts: vec![0; pool_size],
            clock_hand: 0,
            max_ref_count,
        }
    }

    pub fn clock_hand(&self) -> usize {
        self.clock_hand
    }

    pub fn max_ref_count(&self) -> u32 {
        self.max_ref_count
    }

    fn advance(&mut self) {
        self.clock_hand = (self.clock_hand + 1) % self.ref_counts.len();
    }
}

impl Replacer for GClockReplacer {
    fn evict(&mut self, pins: &[u32]) -> Option<FrameId> {
        let pool_size = self.ref_counts.len();
        debug_assert_eq!(pool_size, pins.len());

        // With nothing unpinned the sweep could only end empty-handed
        if pool_size == 0 || pins.iter().all(|&count| count > 0) {
            return None;
        }

        // An unpinned frame is chosen on its (max_ref_count + 1)-th visit at the
        // latest, and a full rotation visits every frame once.
        let mut steps_left = (self.max_ref_count as usize + 1) * pool_size;

        while steps_left > 0 {
            let hand = self.clock_hand;

            if pins[hand] == 0 {
                if self.ref_counts[hand] == 0 {
                    debug!("gclock picked frame {}", hand);
                    return Some(hand);
                }
                self.ref_counts[hand] -= 1;
            }

            self.advance();
            steps_left -= 1;
        }

        None
    }

    fn record_unpin(&mut self, frame_id: FrameId) {
        self.ref_counts[frame_id] = self.max_ref_count;
    }

    fn ref_count(&self, frame_id: FrameId) -> u32 {
        self.ref_counts[frame_id]
    }

    fn size(&self) -> usize {
        self.ref_counts.len()
    }
}

#[cfg(test)]
pub mod test {
    use super::{GClockReplacer, Replacer};

    #[test]
    fn fresh_frames_are_taken_in_clock_order() {
        let mut replacer = GClockReplacer::new(3, 2);
        let mut pins = vec![0, 0, 0];

        // Untouched frames have a zero counter, so the hand takes them as it finds them
        assert_eq!(Some(0), replacer.evict(&pins));
        pins[0] = 1;
        assert_eq!(Some(1), replacer.evict(&pins));
        pins[1] = 1;
        assert_eq!(Some(2), replacer.evict(&pins));
        pins[2] = 1;

        assert_eq!(None, replacer.evict(&pins));
    }

    #[test]
    fn unpinned_frame_survives_until_counter_runs_out() {
        // Three frames, R = 1: A, B, C pinned, then A released
        let mut replacer = GClockReplacer::new(3, 1);
        let mut pins = vec![1, 1, 1];
        replacer.clock_hand = 2;

        pins[0] = 0;
        replacer.record_unpin(0);
        assert_eq!(1, replacer.ref_count(0));

        // The hand passes C, lowers A to 0, passes B and C again, then takes A
        assert_eq!(Some(0), replacer.evict(&pins));
        assert_eq!(0, replacer.ref_count(0));
        assert_eq!(0, replacer.clock_hand());
    }

    #[test]
    fn recently_unpinned_frame_loses_to_older_one() {
        let mut replacer = GClockReplacer::new(2, 3);
        let pins = vec![0, 0];

        // Frame 0 was released recently, frame 1 never used
        replacer.record_unpin(0);

        assert_eq!(Some(1), replacer.evict(&pins));
        assert_eq!(2, replacer.ref_count(0));
    }

    #[test]
    fn single_unpinned_frame_found_behind_pinned_ones() {
        let max_ref_count = 4;
        let mut replacer = GClockReplacer::new(5, max_ref_count);
        let pins = vec![1, 1, 0, 1, 1];

        replacer.record_unpin(2);
        replacer.clock_hand = 3;

        assert_eq!(Some(2), replacer.evict(&pins));
    }

    #[test]
    fn counters_never_exceed_max() {
        let mut replacer = GClockReplacer::new(4, 2);
        let pins = vec![0, 1, 0, 0];

        for frame_id in [0, 2, 3, 0, 2] {
            replacer.record_unpin(frame_id);
        }
        let _ = replacer.evict(&pins);

        for frame_id in 0..replacer.size() {
            assert!(replacer.ref_count(frame_id) <= replacer.max_ref_count());
        }
    }
}
