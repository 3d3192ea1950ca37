//! Timekeeping shared between a timer interrupt and the main loop
//!
//! Each lab has exactly one periodic interrupt whose only job is to advance a counter. The
//! counters here are the single-producer/single-consumer bridge between that ISR and the polling
//! loop: the ISR calls `on_interrupt()`, the main loop reads `now()`. Both sides only touch
//! atomics, so the counters can live in a `static` without a `Mutex`.
//!
//! The main loop never needs an exact reading, only "has at least one unit elapsed since I last
//! looked", so a stale read just delays the work until the next loop iteration.

use portable_atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

/// Anything that can report a monotonically increasing count of time units
pub trait Monotonic {
    /// Current count
    fn now(&self) -> u32;

    /// Restart the count from zero
    fn reset(&self);
}

impl<T: Monotonic + ?Sized> Monotonic for &T {
    #[inline]
    fn now(&self) -> u32 {
        (**self).now()
    }

    #[inline]
    fn reset(&self) {
        (**self).reset()
    }
}

/// Counter advanced by one on every timer interrupt while running.
///
/// Used as a seconds counter by the clock and bridge labs. Pausing gates the interrupt side, so the
/// hardware timer keeps running while the count stands still.
pub struct TickCounter {
    count: AtomicU32,
    running: AtomicBool,
}

impl TickCounter {
    /// Create a running counter starting at zero
    pub const fn new() -> Self {
        TickCounter {
            count: AtomicU32::new(0),
            running: AtomicBool::new(true),
        }
    }

    /// Call from the timer ISR.
    #[inline]
    pub fn on_interrupt(&self) {
        if self.running.load(Ordering::Relaxed) {
            self.count.fetch_add(1, Ordering::Release);
        }
    }

    /// Overwrite the count. Used to commit an edited time in one store.
    #[inline]
    pub fn set(&self, value: u32) {
        self.count.store(value, Ordering::Release);
    }

    /// Stop counting interrupts
    #[inline]
    pub fn pause(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Resume counting interrupts
    #[inline]
    pub fn resume(&self) {
        self.running.store(true, Ordering::Relaxed);
    }

    /// Whether interrupts are currently being counted
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Monotonic for TickCounter {
    #[inline]
    fn now(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    #[inline]
    fn reset(&self) {
        self.set(0);
    }
}

/// Resolution and leap correction of a [`LeapCounter`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LeapConfig {
    /// Milliseconds represented by one tick
    pub resolution_ms: u32,
    /// Number of regular interrupts between two leap interrupts
    pub leap_period: u16,
}

impl Default for LeapConfig {
    /// 164 ACLK cycles at 32768 Hz is 5.005 ms, so every 1024 interrupts the count falls one tick
    /// behind.
    fn default() -> Self {
        LeapConfig {
            resolution_ms: 5,
            leap_period: 1024,
        }
    }
}

/// Millisecond counter for a fast periodic interrupt whose period is not an exact number of
/// milliseconds.
///
/// Every `leap_period` interrupts the counter advances by two ticks instead of one to make up the
/// accumulated drift.
pub struct LeapCounter {
    ticks: AtomicU32,
    leap: AtomicU16,
    config: LeapConfig,
}

impl LeapCounter {
    /// Create a counter at zero
    pub const fn new(config: LeapConfig) -> Self {
        LeapCounter {
            ticks: AtomicU32::new(0),
            leap: AtomicU16::new(0),
            config,
        }
    }

    /// Call from the timer ISR.
    pub fn on_interrupt(&self) {
        // Only the ISR writes `leap`, so a load/store pair cannot race.
        let leap = self.leap.load(Ordering::Relaxed);
        if leap < self.config.leap_period {
            self.leap.store(leap + 1, Ordering::Relaxed);
            self.ticks.fetch_add(1, Ordering::Release);
        } else {
            self.leap.store(0, Ordering::Relaxed);
            self.ticks.fetch_add(2, Ordering::Release);
        }
    }

    /// Raw tick count
    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Elapsed milliseconds
    #[inline]
    pub fn millis(&self) -> u32 {
        self.ticks().wrapping_mul(self.config.resolution_ms)
    }
}

impl Monotonic for LeapCounter {
    #[inline]
    fn now(&self) -> u32 {
        self.millis()
    }

    fn reset(&self) {
        self.leap.store(0, Ordering::Relaxed);
        self.ticks.store(0, Ordering::Release);
    }
}

/// Number of units between two readings of a wrapping counter
#[inline(always)]
pub fn elapsed_since(now: u32, prev: u32) -> u32 {
    now.wrapping_sub(prev)
}

/// Whether at least one unit has elapsed since `prev`
#[inline(always)]
pub fn has_elapsed(now: u32, prev: u32) -> bool {
    elapsed_since(now, prev) >= 1
}

/// Software timer measured against a [`Monotonic`] reading.
///
/// The stopwatch never owns the clock, every method takes the current reading. Pausing freezes
/// the elapsed time until `resume` is called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stopwatch {
    started: u32,
    frozen: Option<u32>,
}

impl Stopwatch {
    /// Start measuring from `now`
    pub const fn started_at(now: u32) -> Self {
        Stopwatch {
            started: now,
            frozen: None,
        }
    }

    /// Reset the elapsed time to zero and run
    pub fn restart(&mut self, now: u32) {
        self.started = now;
        self.frozen = None;
    }

    /// Freeze the elapsed time. Has no effect when already paused.
    pub fn pause(&mut self, now: u32) {
        if self.frozen.is_none() {
            self.frozen = Some(elapsed_since(now, self.started));
        }
    }

    /// Continue from the frozen elapsed time. Has no effect when running.
    pub fn resume(&mut self, now: u32) {
        if let Some(elapsed) = self.frozen.take() {
            self.started = now.wrapping_sub(elapsed);
        }
    }

    /// Whether the stopwatch is paused
    pub fn is_paused(&self) -> bool {
        self.frozen.is_some()
    }

    /// Time elapsed since the last restart, excluding time spent paused
    pub fn elapsed(&self, now: u32) -> u32 {
        match self.frozen {
            Some(elapsed) => elapsed,
            None => elapsed_since(now, self.started),
        }
    }
}

/// Error returned by [`poll`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollErr<E> {
    /// The operation was still blocking when the spin budget ran out
    Timeout,
    /// The operation itself failed
    Other(E),
}

/// Repeatedly call a non-blocking operation until it completes, fails, or `budget` attempts have
/// returned `WouldBlock`.
///
/// This is `nb::block!` with an upper bound, so an unresponsive peripheral produces
/// `PollErr::Timeout` instead of hanging the main loop.
pub fn poll<T, E>(
    budget: u32,
    mut op: impl FnMut() -> nb::Result<T, E>,
) -> Result<T, PollErr<E>> {
    for _ in 0..budget {
        match op() {
            Ok(val) => return Ok(val),
            Err(nb::Error::Other(e)) => return Err(PollErr::Other(e)),
            Err(nb::Error::WouldBlock) => core::hint::spin_loop(),
        }
    }
    Err(PollErr::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counter_only_counts_while_running() {
        let counter = TickCounter::new();
        counter.on_interrupt();
        counter.on_interrupt();
        assert_eq!(counter.now(), 2);

        counter.pause();
        counter.on_interrupt();
        assert_eq!(counter.now(), 2);
        assert!(!counter.is_running());

        counter.set(100);
        counter.resume();
        counter.on_interrupt();
        assert_eq!(counter.now(), 101);
    }

    #[test]
    fn leap_counter_adds_extra_tick_each_period() {
        let counter = LeapCounter::new(LeapConfig {
            resolution_ms: 5,
            leap_period: 3,
        });
        for _ in 0..3 {
            counter.on_interrupt();
        }
        assert_eq!(counter.ticks(), 3);
        // The fourth interrupt is the leap interrupt
        counter.on_interrupt();
        assert_eq!(counter.ticks(), 5);
        assert_eq!(counter.millis(), 25);
        counter.on_interrupt();
        assert_eq!(counter.ticks(), 6);
    }

    #[test]
    fn leap_counter_reset_restarts_leap_period() {
        let counter = LeapCounter::new(LeapConfig {
            resolution_ms: 5,
            leap_period: 3,
        });
        for _ in 0..3 {
            counter.on_interrupt();
        }
        counter.reset();
        assert_eq!(counter.now(), 0);
        // A full period again before the next leap
        for _ in 0..3 {
            counter.on_interrupt();
        }
        assert_eq!(counter.ticks(), 3);
        counter.on_interrupt();
        assert_eq!(counter.ticks(), 5);
    }

    #[test]
    fn has_elapsed_handles_wraparound() {
        assert!(has_elapsed(0, u32::MAX));
        assert!(!has_elapsed(7, 7));
        assert_eq!(elapsed_since(3, u32::MAX - 1), 5);
    }

    #[test]
    fn stopwatch_freezes_while_paused() {
        let mut watch = Stopwatch::started_at(100);
        assert_eq!(watch.elapsed(130), 30);

        watch.pause(130);
        assert!(watch.is_paused());
        assert_eq!(watch.elapsed(500), 30);

        watch.resume(500);
        assert_eq!(watch.elapsed(510), 40);

        watch.restart(510);
        assert_eq!(watch.elapsed(515), 5);
    }

    #[test]
    fn poll_gives_up_after_budget() {
        let mut calls = 0;
        let res: Result<u8, PollErr<()>> = poll(4, || {
            calls += 1;
            Err(nb::Error::WouldBlock)
        });
        assert_eq!(res, Err(PollErr::Timeout));
        assert_eq!(calls, 4);
    }

    #[test]
    fn poll_returns_value_once_ready() {
        let mut calls = 0;
        let res: Result<u8, PollErr<()>> = poll(10, || {
            calls += 1;
            if calls < 3 {
                Err(nb::Error::WouldBlock)
            } else {
                Ok(42)
            }
        });
        assert_eq!(res, Ok(42));

        let res: Result<u8, PollErr<&str>> = poll(10, || Err(nb::Error::Other("bus")));
        assert_eq!(res, Err(PollErr::Other("bus")));
    }
}
