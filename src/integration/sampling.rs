use log::warn;

/// Which frames of a stream are processed.
///
/// Frames are counted from 1 as they arrive; frame `n` is processed iff
/// `n % every_nth == 0`. `every_nth == 1` processes every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    every_nth: u32,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self { every_nth: 1 }
    }
}

impl SamplingPolicy {
    /// `every_nth` is clamped to at least 1.
    pub fn every(every_nth: u32) -> Self {
        if every_nth == 0 {
            warn!("sampling every 0th frame is meaningless, processing every frame");
        }
        Self {
            every_nth: every_nth.max(1),
        }
    }

    pub fn every_nth(&self) -> u32 {
        self.every_nth
    }

    /// Whether the `count`-th received frame (1-based) should be processed.
    #[inline]
    pub fn should_process(&self, count: u64) -> bool {
        count % u64::from(self.every_nth) == 0
    }
}
