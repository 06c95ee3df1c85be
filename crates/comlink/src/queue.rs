//! Receive byte queue.
//!
//! The producer is the byte-received callback, usually running in interrupt
//! context; the consumer is the link worker. The queue is the only state the
//! two share, so it is the only thing behind a critical-section mutex.

use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_sync::channel::Channel;

use crate::config::RX_QUEUE_DEPTH;

/// Bounded byte queue between a transport interrupt and a link worker.
///
/// Usually a `static`:
///
/// ```
/// use comlink::RxQueue;
///
/// static UART_RX: RxQueue = RxQueue::new();
///
/// // From the UART interrupt:
/// UART_RX.on_byte_received(b'$');
/// assert_eq!(UART_RX.try_take(), Some(b'$'));
/// ```
pub struct RxQueue<const N: usize = RX_QUEUE_DEPTH> {
    channel: Channel<CriticalSectionRawMutex, u8, N>,
    overflows: Mutex<CriticalSectionRawMutex, Cell<u32>>,
}

impl<const N: usize> RxQueue<N> {
    /// Empty queue.
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            overflows: Mutex::new(Cell::new(0)),
        }
    }

    /// Enqueue one received byte. Never blocks.
    ///
    /// When the queue is full the byte is dropped, counted, and `false` is
    /// returned.
    pub fn on_byte_received(&self, byte: u8) -> bool {
        match self.channel.try_send(byte) {
            Ok(()) => true,
            Err(_) => {
                self.overflows
                    .lock(|count| count.set(count.get().saturating_add(1)));
                false
            }
        }
    }

    /// Enqueue a burst of bytes, returning how many were accepted.
    pub fn on_bytes_received(&self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .filter(|&&byte| self.on_byte_received(byte))
            .count()
    }

    /// Dequeue one byte if available.
    pub fn try_take(&self) -> Option<u8> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next byte.
    pub async fn receive(&self) -> u8 {
        self.channel.receive().await
    }

    /// Drop everything queued, returning the number of bytes dropped.
    pub fn flush(&self) -> usize {
        let mut dropped = 0usize;
        while self.try_take().is_some() {
            dropped = dropped.saturating_add(1);
        }
        dropped
    }

    /// Bytes dropped because the queue was full.
    pub fn overflow_count(&self) -> u32 {
        self.overflows.lock(Cell::get)
    }
}

impl<const N: usize> Default for RxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
