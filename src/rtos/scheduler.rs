//! Fixed-rate cooperative task scheduler
//!
//! Every task owns a countdown. The tick interrupt decrements each nonzero
//! countdown; the foreground loop polls them in static priority order
//! (shortest period first) and runs whichever reached zero, after rearming it
//! to the task's period. The interrupt only writes nonzero countdowns and the
//! dispatcher only writes zero ones, so the two never race on a counter.

use core::marker::PhantomData;
use portable_atomic::{AtomicU16, Ordering};

/// A statically known task of one firmware image.
pub trait Task: Copy + 'static {
    /// Every task, in dispatch priority order
    const ALL: &'static [Self];

    fn period_ms(self) -> u16;

    /// Position of this task in [`Task::ALL`]
    fn index(self) -> usize;
}

pub struct Scheduler<T, const N: usize> {
    countdowns: [AtomicU16; N],
    _tasks: PhantomData<T>,
}

impl<T: Task, const N: usize> Scheduler<T, N> {
    /// All countdowns start at zero, so every task runs on the first pass.
    pub const fn new() -> Self {
        assert!(T::ALL.len() == N, "countdown count must match the task list");
        Self {
            countdowns: [const { AtomicU16::new(0) }; N],
            _tasks: PhantomData,
        }
    }

    /// Advance one tick. Called from the tick interrupt.
    #[inline]
    pub fn tick(&self) {
        for countdown in &self.countdowns {
            let remaining = countdown.load(Ordering::Relaxed);
            if remaining > 0 {
                countdown.store(remaining - 1, Ordering::Relaxed);
            }
        }
    }

    #[inline]
    pub fn remaining(&self, task: T) -> u16 {
        self.countdowns[task.index()].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_due(&self, task: T) -> bool {
        self.remaining(task) == 0
    }

    /// Run every due task once, in priority order.
    pub fn dispatch<F>(&self, mut run: F)
    where
        F: FnMut(T),
    {
        for &task in T::ALL {
            if self.is_due(task) {
                self.countdowns[task.index()].store(task.period_ms(), Ordering::Relaxed);
                run(task);
            }
        }
    }
}

impl<T: Task, const N: usize> Default for Scheduler<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
