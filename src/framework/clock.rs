use std::time::{Duration, Instant};

use crate::debug;

#[derive(Clone, Debug)]
pub struct Tick {
    pub order: u64,
    pub time:  Instant,
    pub delta: Duration,
}

/// Performs ticks at a given frequency.
///  - measures time between ticks
///  - measures ticks (updates) per second, which are not necessarily frames per second
#[derive(Debug)]
pub struct Clock {
    update_time_window:  Duration,
    next_tick_scheduled: Instant,
    current_tick:        Tick,

    // Ticks per second measurement
    elapsed_seconds: f32,
    tick_counter:    u32,
}

impl Clock {
    pub fn now(tick_per_seconds: u32) -> Self {
        let now = Instant::now();
        Self {
            update_time_window:  Duration::from_secs_f64(1.0 / tick_per_seconds.max(1) as f64),
            next_tick_scheduled: now,
            current_tick: Tick {
                order: 0,
                time:  now,
                delta: Duration::ZERO,
            },
            elapsed_seconds: 0.0,
            tick_counter:    0,
        }
    }

    /// Returns true if the tick was performed, which happens when the next scheduled tick is due.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, time: Instant) -> bool {
        if self.next_tick_scheduled > time {
            return false;
        }
        // the late part of the elapsed window is subtracted from the next one, saturating when more than a whole window late
        let lateness = (time - self.next_tick_scheduled).min(self.update_time_window);

        self.current_tick.order += 1;
        self.current_tick.delta = time - self.current_tick.time;
        self.current_tick.time  = time;

        self.next_tick_scheduled = time + self.update_time_window - lateness;

        self.elapsed_seconds += self.current_tick.delta.as_secs_f32();
        self.tick_counter += 1;
        if self.elapsed_seconds > 1.0 {
            debug!("Ticks per second: {}", self.tick_counter);
            self.elapsed_seconds -= 1.0;
            self.tick_counter = 0;
        }
        true
    }

    pub fn current_tick(&self) -> &Tick {
        &self.current_tick
    }

    pub fn next_scheduled_tick(&self) -> Instant {
        self.next_tick_scheduled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_only_when_due() {
        let mut clock = Clock::now(10);
        let start = clock.next_scheduled_tick();

        assert!(clock.tick_at(start));
        assert!(!clock.tick_at(start + Duration::from_millis(50)));
        assert!(clock.tick_at(start + Duration::from_millis(100)));
        assert_eq!(clock.current_tick().order, 2);
        assert_eq!(clock.current_tick().delta, Duration::from_millis(100));
    }

    #[test]
    fn late_tick_shortens_next_window() {
        let mut clock = Clock::now(10);
        let start = clock.next_scheduled_tick();
        clock.tick_at(start);

        clock.tick_at(start + Duration::from_millis(130));

        assert_eq!(clock.next_scheduled_tick(), start + Duration::from_millis(200));
    }
}
