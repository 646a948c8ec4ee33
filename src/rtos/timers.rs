//! Tick-driven counters that run inside the tick interrupt rather than as tasks

use portable_atomic::{AtomicU16, Ordering};

/// Counts ticks up to a fixed duration, then reports completion and restarts.
///
/// The interrupt calls [`tick`](Self::tick) only while the owning state is
/// active; the foreground calls [`arm`](Self::arm) before entering that
/// state, so the two never write concurrently.
pub struct WaitCountdown {
    elapsed: AtomicU16,
    duration: u16,
}

impl WaitCountdown {
    pub const fn new(duration: u16) -> Self {
        Self {
            elapsed: AtomicU16::new(0),
            duration,
        }
    }

    pub fn arm(&self) {
        self.elapsed.store(0, Ordering::Relaxed);
    }

    /// Returns `true` on the tick that completes the duration.
    pub fn tick(&self) -> bool {
        let elapsed = self.elapsed.load(Ordering::Relaxed) + 1;
        if elapsed >= self.duration {
            self.elapsed.store(0, Ordering::Relaxed);
            true
        } else {
            self.elapsed.store(elapsed, Ordering::Relaxed);
            false
        }
    }

    pub fn elapsed(&self) -> u16 {
        self.elapsed.load(Ordering::Relaxed)
    }
}

/// Elapsed-tick counter that saturates at a ceiling.
pub struct ResponseCounter {
    count: AtomicU16,
    ceiling: u16,
}

impl ResponseCounter {
    pub const fn new(ceiling: u16) -> Self {
        Self {
            count: AtomicU16::new(0),
            ceiling,
        }
    }

    /// Foreground only, while the interrupt is not counting.
    pub fn restart(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    /// Count one tick. Returns `true` once the ceiling is reached; the count
    /// stays at the ceiling from then on.
    pub fn tick(&self) -> bool {
        let count = self.count.load(Ordering::Relaxed);
        if count >= self.ceiling {
            return true;
        }
        let count = count + 1;
        self.count.store(count, Ordering::Relaxed);
        count >= self.ceiling
    }

    pub fn ticks(&self) -> u16 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_completes_after_duration_and_rearms() {
        let wait = WaitCountdown::new(4);
        assert!(!wait.tick());
        assert!(!wait.tick());
        assert!(!wait.tick());
        assert!(wait.tick());
        assert_eq!(wait.elapsed(), 0);

        wait.tick();
        wait.tick();
        wait.arm();
        assert_eq!(wait.elapsed(), 0);
    }

    #[test]
    fn response_counter_saturates() {
        let counter = ResponseCounter::new(3);
        assert!(!counter.tick());
        assert!(!counter.tick());
        assert!(counter.tick());
        assert!(counter.tick());
        assert_eq!(counter.ticks(), 3);

        counter.restart();
        assert_eq!(counter.ticks(), 0);
    }
}
