use std::time::{Duration, Instant};

pub const SIXTY_FPS: u64 = 16_666_666;
pub const ONE_FPS: u64 = 1_000_000_000;

/// Upper bound on fixed steps run for a single frame. A frame that took longer than this many
/// steps drops the excess instead of spiralling into ever longer catch-up frames.
pub const MAX_FIXED_STEPS: u32 = 5;

/// A Time represents the amount of time elapsed within the simulation for a single frame. Each
/// frame captures total elapsed time as well as the delta time since the last frame. New frames are
/// generated from a previous frame using the `next()` method, once per iteration of the loop.
#[derive(Debug, Copy, Clone)]
pub struct Time {
    // The current instant when this frame was created
    instant: Instant,
    pub fixed_time_step: u64,
    /// The time delta since the last frame
    pub delta: Duration,
    /// The total elapsed time since the first frame
    pub time: Duration,
    /// The total elapsed time since the first frame but incremented by the fixed time step
    pub fixed_time: Duration,
    /// An accumulator for fixed time step calculations
    accumulator: u64,
}

impl Time {
    /// Construct a new `Time` with delta and time set to `0`. Caller must provide a fixed time
    /// step in nano seconds.
    pub fn new(fixed_time_step: u64) -> Self {
        Self {
            fixed_time_step,
            instant: Instant::now(),
            delta: Duration::ZERO,
            time: Duration::ZERO,
            fixed_time: Duration::ZERO,
            accumulator: 0,
        }
    }

    /// The fixed time step in seconds, the `dt` handed to fixed updates.
    pub fn fixed_delta_seconds(&self) -> f32 {
        Duration::from_nanos(self.fixed_time_step).as_secs_f32()
    }

    /// Increment the fixed frame time accumulation
    pub fn increment_fixed(&mut self) {
        self.fixed_time += Duration::from_nanos(self.fixed_time_step);
        self.accumulator = self.accumulator.saturating_sub(self.fixed_time_step);
    }

    /// Create the next frame from an existing frame. This will capture the delta from the last
    /// frame and update the cumulative time.
    pub fn next(self) -> Self {
        let now = Instant::now();
        self.advance(now.duration_since(self.instant), now)
    }

    /// Create the next frame as if `delta` had passed since this one.
    pub fn advance(self, delta: Duration, now: Instant) -> Self {
        Self {
            fixed_time_step: self.fixed_time_step,
            instant: now,
            delta,
            time: self.time + delta,
            fixed_time: self.fixed_time,
            accumulator: self.accumulator + delta.as_nanos() as u64,
        }
    }

    /// Determine whether this frame has accumulated enough delta for a fixed frame.
    pub fn has_fixed(&self) -> bool {
        self.accumulator >= self.fixed_time_step
    }

    /// Drop whatever is left in the accumulator. Used when a frame hit [`MAX_FIXED_STEPS`].
    pub fn discard_backlog(&mut self) {
        self.accumulator = 0;
    }

    /// Reset the time frame to now with zeroed accumulator. This is useful for situations where
    /// the loop is paused and resumed.
    pub fn reset_now(&mut self) {
        self.instant = Instant::now();
        self.accumulator = 0;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(SIXTY_FPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_steps_accumulate() {
        // Given a fresh clock at sixty fps
        let time = Time::default();

        // When two and a half fixed steps pass
        let mut time = time.advance(Duration::from_nanos(SIXTY_FPS * 5 / 2), Instant::now());

        // Then exactly two fixed steps are available
        let mut steps = 0;
        while time.has_fixed() {
            time.increment_fixed();
            steps += 1;
        }
        assert_eq!(steps, 2);
        assert_eq!(time.fixed_time, Duration::from_nanos(SIXTY_FPS * 2));
    }

    #[test]
    fn test_discard_backlog() {
        let mut time = Time::new(ONE_FPS).advance(Duration::from_secs(10), Instant::now());
        assert!(time.has_fixed());

        time.discard_backlog();
        assert!(!time.has_fixed());
        assert_eq!(time.time, Duration::from_secs(10));
    }

    #[test]
    fn test_fixed_delta_seconds() {
        assert_eq!(Time::new(ONE_FPS).fixed_delta_seconds(), 1.0);
        assert!((Time::default().fixed_delta_seconds() - 1.0 / 60.0).abs() < 1e-6);
    }
}
