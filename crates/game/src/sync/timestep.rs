use std::time::{Duration, Instant};

/// Fixed-interval tick scheduler: wall time accumulates and ticks are
/// consumed one interval at a time. Replaces the original
/// reschedule-self timer pattern with an explicit accumulator.
pub struct FixedTimestep {
    tick_duration: Duration,
    accumulator: Duration,
    last_time: Instant,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_duration: Duration::from_secs_f64(1.0 / tick_rate as f64),
            accumulator: Duration::ZERO,
            last_time: Instant::now(),
        }
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Folds elapsed wall time into the accumulator. Clamped so a
    /// stall does not trigger a catch-up burst.
    pub fn accumulate(&mut self) {
        let now = Instant::now();
        self.accumulate_by(now - self.last_time);
        self.last_time = now;
    }

    pub fn accumulate_by(&mut self, delta: Duration) {
        self.accumulator += delta.min(Duration::from_millis(250));
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.last_time = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_intervals_yield_two_ticks() {
        let mut ts = FixedTimestep::new(60);
        ts.accumulate_by(Duration::from_secs_f64(1.0 / 30.0));

        assert!(ts.consume_tick());
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }

    #[test]
    fn stalls_are_clamped() {
        let mut ts = FixedTimestep::new(120);
        ts.accumulate_by(Duration::from_secs(10));

        let mut ticks = 0;
        while ts.consume_tick() {
            ticks += 1;
        }
        assert!(ticks <= 30);
    }
}
