//! Monotonic time source.
//!
//! The framing engine tracks parse deadlines and the button debouncer tracks
//! stability windows in milliseconds. Both take a [`Clock`] instead of calling
//! `embassy_time::Instant::now()` directly so tests can drive time by hand.

/// Monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed epoch. Never decreases.
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// [`Clock`] backed by the Embassy time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}
