//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for tick timing
pub struct Timer {
    last_tick: Instant,
    delta_time: f32,
    total_time: f32,
    tick_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            tick_count: 0,
        }
    }

    /// Advance the timer and return the seconds since the previous call
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        // nanosecond resolution, reported in seconds
        #[allow(clippy::cast_precision_loss)]
        let seconds = elapsed.as_nanos() as f32 / 1e9;
        self.delta_time = seconds;
        self.total_time += seconds;
        self.last_tick = now;
        self.tick_count += 1;
        seconds
    }

    /// Time spent since the last `update`, without advancing
    pub fn since_last(&self) -> Duration {
        self.last_tick.elapsed()
    }

    /// Get the time between the last two updates in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time accumulated by `update`
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the number of updates so far
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_accumulates() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(5));
        let dt = timer.update();
        assert!(dt >= 0.004);
        assert_eq!(timer.tick_count(), 1);
        assert!((timer.total_time() - dt).abs() < f32::EPSILON);
    }
}
