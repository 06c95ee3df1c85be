//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]

use core::cell::Cell;

use crate::{Clock, ComInterfaceDevice, InputPin, OutputPin, PinState};

/// Largest single transmission the mock records.
pub const MAX_RECORDED_FRAME: usize = 256;
/// Number of transmissions the mock records before dropping new ones.
pub const MAX_RECORDED_FRAMES: usize = 32;

/// Mock communication device error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockComError {
    /// Transmit was configured to fail
    TransmitFailed,
    /// Recording buffer exhausted
    Overflow,
}

/// Mock byte-stream device: records every transmission and serves injected
/// receive bytes.
pub struct MockComDevice {
    transmissions: heapless::Vec<heapless::Vec<u8, MAX_RECORDED_FRAME>, MAX_RECORDED_FRAMES>,
    waited: usize,
    rx: heapless::Deque<u8, 256>,
    fail_transmit: bool,
}

impl MockComDevice {
    /// Create new mock device
    pub fn new() -> Self {
        Self {
            transmissions: heapless::Vec::new(),
            waited: 0,
            rx: heapless::Deque::new(),
            fail_transmit: false,
        }
    }

    /// Make every subsequent transmit fail (or succeed again)
    pub fn set_fail_transmit(&mut self, fail: bool) {
        self.fail_transmit = fail;
    }

    /// Queue bytes as if the hardware had received them
    pub fn inject_rx(&mut self, bytes: &[u8]) {
        for &b in bytes {
            let _ = self.rx.push_back(b);
        }
    }

    /// All recorded transmissions, oldest first
    pub fn transmissions(&self) -> impl Iterator<Item = &[u8]> {
        self.transmissions.iter().map(|t| t.as_slice())
    }

    /// Number of successful transmit calls
    pub fn transmit_count(&self) -> usize {
        self.transmissions.len()
    }

    /// Number of transmit calls that asked to wait until done
    pub fn waited_count(&self) -> usize {
        self.waited
    }

    /// Most recent transmission
    pub fn last_transmission(&self) -> Option<&[u8]> {
        self.transmissions.last().map(|t| t.as_slice())
    }

    /// Forget recorded transmissions
    pub fn clear(&mut self) {
        self.transmissions.clear();
        self.waited = 0;
    }
}

impl Default for MockComDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl ComInterfaceDevice for MockComDevice {
    type Error = MockComError;

    fn transmit_bytes(&mut self, bytes: &[u8], wait_until_done: bool) -> Result<(), Self::Error> {
        if self.fail_transmit {
            return Err(MockComError::TransmitFailed);
        }
        let frame = heapless::Vec::from_slice(bytes).map_err(|_| MockComError::Overflow)?;
        self.transmissions
            .push(frame)
            .map_err(|_| MockComError::Overflow)?;
        if wait_until_done {
            self.waited = self.waited.saturating_add(1);
        }
        Ok(())
    }

    fn received_bytes_count(&self) -> usize {
        self.rx.len()
    }

    fn received_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0usize;
        for slot in buf.iter_mut() {
            match self.rx.pop_front() {
                Some(b) => {
                    *slot = b;
                    n = n.saturating_add(1);
                }
                None => break,
            }
        }
        Ok(n)
    }
}

/// Mock clock advanced by hand
#[derive(Debug, Default)]
pub struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    /// Create a clock reading `start_ms`
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Move time forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    /// Jump to an absolute time
    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Mock GPIO pin: reads return the level last set by the test
#[derive(Debug)]
pub struct MockPin {
    level: Cell<PinState>,
    writes: usize,
}

impl MockPin {
    /// Create a pin at `level`
    pub fn new(level: PinState) -> Self {
        Self {
            level: Cell::new(level),
            writes: 0,
        }
    }

    /// Drive the level seen by readers
    pub fn set_level(&self, level: PinState) {
        self.level.set(level);
    }

    /// Current level
    pub fn level(&self) -> PinState {
        self.level.get()
    }

    /// Number of output writes
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl InputPin for MockPin {
    type Error = core::convert::Infallible;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get().into())
    }
}

impl InputPin for &MockPin {
    type Error = core::convert::Infallible;

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get().into())
    }
}

impl OutputPin for MockPin {
    type Error = core::convert::Infallible;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(PinState::High);
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(PinState::Low);
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_com_device_records_transmissions() {
        let mut device = MockComDevice::new();

        device.transmit_bytes(b"abc", false).unwrap();
        device.transmit_bytes(b"de", true).unwrap();

        assert_eq!(device.transmit_count(), 2);
        assert_eq!(device.waited_count(), 1);
        assert_eq!(device.transmissions().next(), Some(&b"abc"[..]));
        assert_eq!(device.last_transmission(), Some(&b"de"[..]));
    }

    #[test]
    fn test_mock_com_device_failure() {
        let mut device = MockComDevice::new();
        device.set_fail_transmit(true);

        assert_eq!(
            device.transmit_bytes(b"x", false),
            Err(MockComError::TransmitFailed)
        );
        assert_eq!(device.transmit_count(), 0);
    }

    #[test]
    fn test_mock_com_device_receive_partial() {
        let mut device = MockComDevice::new();
        device.inject_rx(b"hello");

        let mut buf = [0u8; 2];
        assert_eq!(device.received_bytes(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"he");
        assert_eq!(device.received_bytes_count(), 3);
    }

    #[test]
    fn test_mock_clock() {
        let clock = MockClock::new(100);
        clock.advance(25);
        assert_eq!(clock.now_ms(), 125);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_mock_pin() {
        let mut pin = MockPin::new(PinState::Low);
        assert!(pin.is_low().unwrap());

        pin.set_high().unwrap();
        assert_eq!(pin.level(), PinState::High);
        assert_eq!(pin.writes(), 1);
    }
}
