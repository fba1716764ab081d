//! Fixed-rate tick clock.
//!
//! The window loop measures wall-clock time each frame and feeds it into an
//! accumulator; the simulation then consumes whole `fixed_dt` slices through
//! `should_step()`. Every consumed slice also advances `game_time`, which is the
//! timestamp handed to gameplay for cooldowns and shake timers. `game_time`
//! follows wall-clock time except while the accumulator cap is discarding a
//! stalled frame.

use std::time::{Duration, Instant};

const FPS_SAMPLE_COUNT: usize = 60;

pub struct TimeState {
    pub tick_rate: u32,
    pub fixed_dt: Duration,
    pub max_accumulator: Duration,
    accumulator: Duration,
    pub game_time: Duration,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: Duration,
    last_instant: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        let frame_secs = 1.0 / tick_rate as f64;
        Self {
            tick_rate,
            fixed_dt: Duration::from_nanos(1_000_000_000 / tick_rate as u64),
            max_accumulator: Duration::from_millis(250),
            accumulator: Duration::ZERO,
            game_time: Duration::ZERO,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: Duration::ZERO,
            last_instant: Instant::now(),
            fps_samples: [frame_secs; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: tick_rate as f64,
            smoothed_frame_time_ms: frame_secs * 1000.0,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_instant);
        self.last_instant = now;
        self.feed(elapsed);
    }

    /// Adds `elapsed` wall-clock time to the accumulator and starts a new frame.
    pub fn feed(&mut self, elapsed: Duration) {
        self.real_dt = elapsed;

        // Spiral-of-death cap
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt.as_secs_f64() * 1000.0,
                self.max_accumulator.as_millis()
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        let dt_secs = self.real_dt.as_secs_f64();
        self.fps_samples[self.fps_sample_index] = dt_secs;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.game_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_dt_matches_tick_rate() {
        let time = TimeState::new(60);
        assert_eq!(time.fixed_dt, Duration::from_nanos(16_666_666));
    }

    #[test]
    fn two_frames_worth_of_time_yields_two_steps() {
        let mut time = TimeState::new(60);
        time.feed(time.fixed_dt * 2);
        assert!(time.should_step());
        assert!(time.should_step());
        assert!(!time.should_step());
        assert_eq!(time.steps_this_frame, 2);
        assert_eq!(time.game_time, time.fixed_dt * 2);
    }

    #[test]
    fn leftover_time_carries_into_next_frame() {
        let mut time = TimeState::new(60);
        time.feed(time.fixed_dt / 2);
        assert!(!time.should_step());
        time.feed(time.fixed_dt / 2);
        assert!(time.should_step());
        assert_eq!(time.fixed_step_count, 1);
    }

    #[test]
    fn stalled_frame_is_capped() {
        let mut time = TimeState::new(60);
        time.feed(Duration::from_secs(5));
        assert_eq!(time.real_dt, time.max_accumulator);
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        assert_eq!(steps, 15);
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let time = TimeState::new(0);
        assert_eq!(time.tick_rate, 1);
        assert_eq!(time.fixed_dt, Duration::from_secs(1));
    }
}
