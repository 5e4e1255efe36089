//! Frame timing.
//!
//! [`FrameClock`] is the single source of elapsed and delta time for the
//! animation loop. Each call to [`FrameClock::tick`] yields a [`FrameTime`]
//! snapshot that the session passes to the animator.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! loop {
//!     let frame = clock.tick();
//!     session.step(frame, &signal);
//! }
//! ```

use std::time::{Duration, Instant};

/// Timing for one frame, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the clock started, excluding paused time.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

impl FrameTime {
    /// Frame `index` of a fixed-rate sequence at `fps`.
    ///
    /// Handy for headless runs and tests that need deterministic time.
    pub fn fixed(index: u64, fps: f32) -> Self {
        let delta = 1.0 / fps;
        Self {
            elapsed: index as f32 * delta,
            delta,
        }
    }
}

/// Wall clock for the frame loop.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    pause_elapsed: Duration,
    /// Fixed delta for deterministic stepping.
    fixed_delta: Option<f32>,
}

impl FrameClock {
    /// Start a clock now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            pause_elapsed: Duration::ZERO,
            fixed_delta: None,
        }
    }

    /// Advance to the next frame. Call once per frame.
    ///
    /// While paused the returned delta is zero and elapsed time holds.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return self.now();
        }

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        match self.fixed_delta {
            Some(fixed) => {
                self.delta_secs = fixed;
                self.elapsed_secs += fixed;
            }
            None => {
                self.delta_secs = raw_delta;
                self.elapsed_secs = (now.duration_since(self.start) - self.pause_elapsed).as_secs_f32();
            }
        }

        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.now()
    }

    /// The most recent frame time without advancing.
    #[inline]
    pub fn now(&self) -> FrameTime {
        FrameTime {
            elapsed: self.elapsed_secs,
            delta: self.delta_secs,
        }
    }

    /// Frames ticked since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Measured frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Use a fixed delta per tick instead of wall time. `None` restores
    /// real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert!(!clock.is_paused());
        assert_eq!(clock.now(), FrameTime::default());
    }

    #[test]
    fn test_clock_tick() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let frame = clock.tick();

        assert!(frame.elapsed > 0.0);
        assert!(frame.delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_clock_pause() {
        let mut clock = FrameClock::new();
        clock.tick();

        clock.pause();
        assert!(clock.is_paused());

        let before = clock.now().elapsed;
        thread::sleep(Duration::from_millis(10));
        let frame = clock.tick();

        assert_eq!(frame.elapsed, before);
        assert_eq!(frame.delta, 0.0);

        clock.toggle_pause();
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(50));
        clock.tick();
        let frame = clock.tick();

        assert!((frame.delta - 1.0 / 60.0).abs() < 1e-6);
        assert!((frame.elapsed - 2.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_frame_time() {
        let frame = FrameTime::fixed(30, 60.0);
        assert!((frame.elapsed - 0.5).abs() < 1e-6);
        assert!((frame.delta - 1.0 / 60.0).abs() < 1e-6);
    }
}
