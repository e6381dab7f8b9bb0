//! Millisecond timeout tracking against a monotonic clock

/// Monotonic millisecond clock.
///
/// Wraps around after ~49 days; [`TimeoutTracker`] uses wrapping arithmetic.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<K: Clock + ?Sized> Clock for &K {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Clock backed by the embassy time driver
#[cfg(feature = "embedded")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embedded")]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}

/// Elapsed-time check against a configured duration
pub struct TimeoutTracker<K: Clock> {
    clock: K,
    start_ms: u32,
    timeout_ms: u32,
}

impl<K: Clock> TimeoutTracker<K> {
    /// Create a tracker that has already expired (zero duration).
    pub fn new(clock: K) -> Self {
        let start_ms = clock.now_ms();
        Self {
            clock,
            start_ms,
            timeout_ms: 0,
        }
    }

    /// Start a new period of `ms` milliseconds from now.
    pub fn set(&mut self, ms: u32) {
        self.timeout_ms = ms;
        self.start_ms = self.clock.now_ms();
    }

    /// Lengthen the running period without moving its start.
    pub fn extend(&mut self, ms: u32) {
        self.timeout_ms = self.timeout_ms.saturating_add(ms);
    }

    /// Restart the current period from now, keeping its duration.
    pub fn reset(&mut self) {
        self.start_ms = self.clock.now_ms();
    }

    /// Returns true once the period has elapsed.
    pub fn occurred(&self) -> bool {
        self.elapsed_ms() >= self.timeout_ms
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.clock.now_ms().wrapping_sub(self.start_ms)
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }
}
