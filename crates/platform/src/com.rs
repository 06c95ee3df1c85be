//! Byte-stream communication device abstraction.
//!
//! A [`ComInterfaceDevice`] is the raw transport below a framing engine:
//! UART, USB-serial, a radio bridge. The core only ever calls these three
//! operations; transport I/O, retries and DMA live in the implementation.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};

/// Byte-stream transport.
pub trait ComInterfaceDevice {
    /// Transport error, surfaced to callers opaquely.
    type Error: core::fmt::Debug;

    /// Transmit `bytes`.
    ///
    /// `wait_until_done` is a back-pressure hint: block until the hardware
    /// has shifted the last byte out, or return once the bytes are queued in
    /// the transmit buffer.
    fn transmit_bytes(&mut self, bytes: &[u8], wait_until_done: bool) -> Result<(), Self::Error>;

    /// Number of received bytes buffered by the device.
    fn received_bytes_count(&self) -> usize;

    /// Move up to `buf.len()` received bytes into `buf`, returning how many
    /// were written.
    fn received_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// A device shared between several users (e.g. a link and an external topic
/// subscriber) through a blocking mutex.
///
/// The mutex usually lives in a `static`; each user holds a `SharedDevice`
/// handle and every operation runs inside one lock scope.
pub struct SharedDevice<'a, M: RawMutex, D> {
    inner: &'a Mutex<M, RefCell<D>>,
}

impl<'a, M: RawMutex, D> SharedDevice<'a, M, D> {
    /// Wrap a mutex-protected device.
    pub const fn new(inner: &'a Mutex<M, RefCell<D>>) -> Self {
        Self { inner }
    }

    /// Run `f` with exclusive access to the device.
    pub fn with<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl<M: RawMutex, D> Clone for SharedDevice<'_, M, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, D> Copy for SharedDevice<'_, M, D> {}

impl<M: RawMutex, D: ComInterfaceDevice> ComInterfaceDevice for SharedDevice<'_, M, D> {
    type Error = D::Error;

    fn transmit_bytes(&mut self, bytes: &[u8], wait_until_done: bool) -> Result<(), Self::Error> {
        self.with(|device| device.transmit_bytes(bytes, wait_until_done))
    }

    fn received_bytes_count(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().received_bytes_count())
    }

    fn received_bytes(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.with(|device| device.received_bytes(buf))
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::mocks::MockComDevice;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    #[test]
    fn shared_device_forwards_to_inner_device() {
        let mutex: Mutex<CriticalSectionRawMutex, RefCell<MockComDevice>> =
            Mutex::new(RefCell::new(MockComDevice::new()));
        let mut a = SharedDevice::new(&mutex);
        let mut b = a;

        a.transmit_bytes(&[1, 2], false).ok();
        b.transmit_bytes(&[3], true).ok();

        a.with(|device| {
            assert_eq!(device.transmit_count(), 2);
            assert_eq!(device.last_transmission(), Some(&[3u8][..]));
        });
    }

    #[test]
    fn shared_device_reads_received_bytes() {
        let mutex: Mutex<CriticalSectionRawMutex, RefCell<MockComDevice>> =
            Mutex::new(RefCell::new(MockComDevice::new()));
        let mut shared = SharedDevice::new(&mutex);
        shared.with(|device| device.inject_rx(b"abc"));

        assert_eq!(shared.received_bytes_count(), 3);
        let mut buf = [0u8; 8];
        assert_eq!(shared.received_bytes(&mut buf), Ok(3));
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(shared.received_bytes_count(), 0);
    }
}
