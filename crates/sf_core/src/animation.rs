//! Tick-driven sprite animation.
//!
//! Every animated thing in the game selects its frame the same way: a counter
//! that grows by one per tick, divided by a per-clip delay, modulo the clip's
//! frame count. One clock may drive several clips of different lengths (the
//! frog switches pose without resetting), so the counter is never wrapped per
//! clip. It is a `u64`, which no game session can exhaust.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    pub delay: u32,
    count: u64,
}

impl FrameClock {
    pub fn new(delay: u32) -> Self {
        Self {
            delay: delay.max(1),
            count: 0,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Frame index for a clip of `frame_count` frames at the current count.
    pub fn frame_index(&self, frame_count: usize) -> usize {
        if frame_count == 0 {
            return 0;
        }
        ((self.count / u64::from(self.delay)) % frame_count as u64) as usize
    }

    /// Returns the frame to show this tick, then advances the counter.
    pub fn tick(&mut self, frame_count: usize) -> usize {
        let index = self.frame_index(frame_count);
        self.count = self.count.wrapping_add(1);
        index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(1)
    }
}
