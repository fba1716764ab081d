//! Microphone loudness: the shared slot and the sampling loop that fills it.
//!
//! One background worker owns a [`SampleSource`] and repeatedly reads a fixed
//! buffer, reduces it to a single loudness value and stores it in a
//! [`LoudnessSlot`]. The game reads the slot once per tick. The slot holds only
//! the latest value: there is no queue and no backpressure, so a slow reader sees
//! a stale value and a stalled writer leaves the last reading in place.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const SAMPLE_RATE: u32 = 44_100;
pub const CHUNK_SIZE: usize = 1024;
/// RMS amplitude is scaled by this to get the numbers the threshold is tuned for.
pub const LOUDNESS_SCALE: f32 = 1000.0;
pub const SAMPLER_PAUSE: Duration = Duration::from_millis(1);

/// Latest loudness reading, shared between the sampler thread and the game loop.
///
/// Stores the `f32` bit pattern in an `AtomicU32`, so every load observes one
/// whole write.
#[derive(Debug, Clone, Default)]
pub struct LoudnessSlot {
    bits: Arc<AtomicU32>,
}

impl LoudnessSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    pub fn store(&self, loudness: f32) {
        self.bits.store(loudness.to_bits(), Ordering::Relaxed);
    }
}

/// Root-mean-square of `samples`, scaled by [`LOUDNESS_SCALE`]. Empty input is silent.
pub fn rms_loudness(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    ((sum_sq / samples.len() as f64).sqrt() as f32) * LOUDNESS_SCALE
}

/// Blocking producer of mono `f32` audio.
pub trait SampleSource {
    /// Fills `buf` completely, blocking until enough samples arrived.
    fn read_chunk(&mut self, buf: &mut [f32]) -> Result<(), String>;
}

/// Runs the sampling loop until the source fails.
///
/// Returns the source error. The slot keeps whatever it held last.
pub fn run_sampler<S: SampleSource>(source: &mut S, slot: &LoudnessSlot, pause: Duration) -> String {
    let mut buf = vec![0.0f32; CHUNK_SIZE];
    loop {
        if let Err(err) = source.read_chunk(&mut buf) {
            return err;
        }
        slot.store(rms_loudness(&buf));
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }
}
