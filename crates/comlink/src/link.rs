//! Framing and protocol dispatch engine.
//!
//! A [`ComLink`] sits above one byte-stream device. Bytes arrive through an
//! [`RxQueue`], are appended to the receive accumulator one at a time, and
//! after every byte the accumulated bytes are offered to the registered
//! protocols:
//!
//! ```text
//!             ┌────────────── FoundFrame: respond, clear ◄─────┐
//!             ▼                                                │
//!          ┌──────┐   MidFrame from protocol p   ┌───────────────────┐
//! byte ──► │ Idle │ ───────────────────────────► │ Matching(p, until) │ ◄── byte
//!          └──────┘ ◄─────────────────────────── └───────────────────┘
//!             │       deadline passed / NotAFrame / overflow / disable
//!             │       (p.reset() is called)
//!             ▼
//!   all NotAFrame: drop the oldest byte, retry the rest
//! ```
//!
//! While idle, protocols are asked in registration order and the first to
//! claim the bytes wins. While matching, only the current protocol is asked.
//!
//! Bytes of a match abandoned on timeout, overflow or disable are discarded.
//! Bytes of a rejected match are replayed from idle one prefix at a time, so
//! a complete frame hidden behind a bogus header is still found and only
//! the bytes no protocol can start a frame with are discarded.
//! Response bytes go out through the same device the link wraps; transmit
//! failures are logged and counted, never retried.

use embassy_futures::select::{select, Either};
use embassy_time::Timer;
use platform::{Clock, ComInterfaceDevice};
use thiserror_no_std::Error;

use crate::config::{MAX_PROTOCOLS, POLL_CHUNK, RX_QUEUE_DEPTH};
use crate::protocol::{ComProtocol, FollowUp, ParseStatus, ResponseBuffer};
use crate::queue::RxQueue;

/// Link failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComLinkError<E> {
    /// The link is disabled.
    #[error("link is disabled")]
    NotEnabled,
    /// No free protocol slot.
    #[error("protocol table is full")]
    ProtocolLimit,
    /// The device reported an error.
    #[error("device error: {0:?}")]
    Device(E),
}

/// Why a match was given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbandonReason {
    /// The parse deadline passed.
    Timeout,
    /// The current protocol stopped recognising the bytes.
    Rejected,
    /// The accumulator filled up.
    Overflow,
    /// The link was disabled.
    Disabled,
}

/// Dispatch counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Complete frames recognised.
    pub frames_found: u32,
    /// Matches given up for any [`AbandonReason`].
    pub matches_abandoned: u32,
    /// Received bytes that never became part of a frame.
    pub bytes_discarded: u32,
    /// Responses the device failed to transmit.
    pub transmit_errors: u32,
}

/// Result of replaying the accumulator from its first byte.
enum Replay {
    /// A protocol is still matching at the last byte.
    Matching,
    /// A frame was found in a prefix and removed.
    Consumed,
    /// No frame starts at the first byte.
    Unclaimed,
}

/// Receive accumulator over caller-provided storage.
struct Accumulator<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> Accumulator<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    fn push(&mut self, byte: u8) -> bool {
        match self.buf.get_mut(self.len) {
            Some(slot) => {
                *slot = byte;
                self.len = self.len.saturating_add(1);
                true
            }
            None => false,
        }
    }

    fn as_slice(&self) -> &[u8] {
        self.buf.get(..self.len).unwrap_or_default()
    }

    /// Remove the first `n` bytes, keeping the rest in order.
    fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.buf.copy_within(n..self.len, 0);
        self.len = self.len.saturating_sub(n);
    }

    fn clear(&mut self) -> usize {
        core::mem::take(&mut self.len)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn is_full(&self) -> bool {
        self.len >= self.buf.len()
    }
}

/// Framing and dispatch engine over one device.
///
/// `'a` covers everything the link borrows: the receive queue, the
/// accumulator and response storage, and the registered protocols.
///
/// # Example
///
/// ```
/// use comlink::protocol::ascii::{AsciiCommand, AsciiHandler, AsciiProtocol};
/// use comlink::{ComLink, FollowUp, ResponseBuffer, RxQueue};
/// use platform::mocks::{MockClock, MockComDevice};
///
/// struct Pong;
///
/// impl AsciiHandler for Pong {
///     fn on_command(&mut self, _: AsciiCommand<'_>, reply: &mut ResponseBuffer<'_>) -> FollowUp {
///         reply.write(b"$pong\n").ok();
///         FollowUp::None
///     }
/// }
///
/// let queue: RxQueue<64> = RxQueue::new();
/// let (mut rx, mut tx) = ([0u8; 64], [0u8; 64]);
/// let mut ascii = AsciiProtocol::new(Pong);
///
/// let mut link = ComLink::new(MockComDevice::new(), MockClock::new(0), &queue, &mut rx, &mut tx);
/// link.add_protocol(&mut ascii)?;
/// link.set_enabled(true);
///
/// queue.on_bytes_received(b"$ping\n");
/// link.process_pending()?;
/// assert_eq!(link.device().last_transmission(), Some(&b"$pong\n"[..]));
/// # Ok::<(), comlink::ComLinkError<platform::mocks::MockComError>>(())
/// ```
pub struct ComLink<'a, D, C, const Q: usize = RX_QUEUE_DEPTH> {
    device: D,
    clock: C,
    queue: &'a RxQueue<Q>,
    rx: Accumulator<'a>,
    response: &'a mut [u8],
    protocols: heapless::Vec<&'a mut dyn ComProtocol, MAX_PROTOCOLS>,
    current: Option<usize>,
    deadline_ms: u64,
    enabled: bool,
    stats: LinkStats,
}

impl<'a, D, C, const Q: usize> ComLink<'a, D, C, Q>
where
    D: ComInterfaceDevice,
    C: Clock,
{
    /// Link over `device`, fed by `queue`, accumulating into `rx_storage`
    /// and building responses in `response_storage`.
    ///
    /// The link starts disabled: register protocols, then call
    /// [`set_enabled(true)`](Self::set_enabled) before the worker runs.
    /// `rx_storage` bounds the longest frame any protocol can match.
    pub fn new(
        device: D,
        clock: C,
        queue: &'a RxQueue<Q>,
        rx_storage: &'a mut [u8],
        response_storage: &'a mut [u8],
    ) -> Self {
        Self {
            device,
            clock,
            queue,
            rx: Accumulator::new(rx_storage),
            response: response_storage,
            protocols: heapless::Vec::new(),
            current: None,
            deadline_ms: 0,
            enabled: false,
            stats: LinkStats::default(),
        }
    }

    /// Register `protocol` behind those already registered, returning its
    /// index. Registration order is dispatch precedence.
    pub fn add_protocol(
        &mut self,
        protocol: &'a mut dyn ComProtocol,
    ) -> Result<usize, ComLinkError<D::Error>> {
        let index = self.protocols.len();
        self.protocols
            .push(protocol)
            .map_err(|_| ComLinkError::ProtocolLimit)?;
        debug!("protocol {} registered", index);
        Ok(index)
    }

    /// Number of registered protocols.
    pub fn protocol_count(&self) -> usize {
        self.protocols.len()
    }

    /// Enable or disable the link.
    ///
    /// Either transition flushes the receive queue. Disabling abandons any
    /// match in progress, so no partial state survives into the next
    /// enabled period.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        if !enabled {
            self.abandon(AbandonReason::Disabled);
        }
        let flushed = self.queue.flush();
        self.count_discarded(flushed);
        self.enabled = enabled;
        info!("link {}", if enabled { "enabled" } else { "disabled" });
    }

    /// `true` once enabled and until disabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Transmit `bytes` through the device.
    pub fn transmit_bytes(
        &mut self,
        bytes: &[u8],
        wait_until_done: bool,
    ) -> Result<(), ComLinkError<D::Error>> {
        if !self.enabled {
            return Err(ComLinkError::NotEnabled);
        }
        self.device
            .transmit_bytes(bytes, wait_until_done)
            .map_err(ComLinkError::Device)
    }

    /// Move bytes a polled device has buffered into the receive queue.
    ///
    /// For transports without a byte-received interrupt. Returns the number
    /// of bytes read from the device; bytes that do not fit in the queue are
    /// counted as queue overflows.
    pub fn poll_device(&mut self) -> Result<usize, ComLinkError<D::Error>> {
        if !self.enabled {
            return Err(ComLinkError::NotEnabled);
        }
        let mut chunk = [0u8; POLL_CHUNK];
        let mut moved = 0usize;
        while self.device.received_bytes_count() > 0 {
            let n = self
                .device
                .received_bytes(&mut chunk)
                .map_err(ComLinkError::Device)?;
            if n == 0 {
                break;
            }
            self.queue
                .on_bytes_received(chunk.get(..n).unwrap_or_default());
            moved = moved.saturating_add(n);
        }
        Ok(moved)
    }

    /// Drain the receive queue through dispatch, then check the match
    /// deadline. Returns the number of bytes processed.
    pub fn process_pending(&mut self) -> Result<usize, ComLinkError<D::Error>> {
        if !self.enabled {
            return Err(ComLinkError::NotEnabled);
        }
        let mut processed = 0usize;
        while let Some(byte) = self.queue.try_take() {
            self.process_byte(byte);
            processed = processed.saturating_add(1);
        }
        self.check_timeout();
        Ok(processed)
    }

    /// Abandon the current match if its deadline has passed. Returns `true`
    /// if a match was abandoned.
    pub fn check_timeout(&mut self) -> bool {
        if self.current.is_some() && self.clock.now_ms() >= self.deadline_ms {
            self.abandon(AbandonReason::Timeout);
            true
        } else {
            false
        }
    }

    /// Worker body: wait for bytes (or the match deadline), then dispatch
    /// everything queued.
    ///
    /// Suspends only while waiting. Returns the number of bytes processed,
    /// zero when woken by the deadline.
    pub async fn run_once(&mut self) -> Result<usize, ComLinkError<D::Error>> {
        if !self.enabled {
            return Err(ComLinkError::NotEnabled);
        }
        let woken_by = match self.current {
            None => Some(self.queue.receive().await),
            Some(_) => {
                let remaining = self.deadline_ms.saturating_sub(self.clock.now_ms());
                match select(self.queue.receive(), Timer::after_millis(remaining)).await {
                    Either::First(byte) => Some(byte),
                    Either::Second(()) => None,
                }
            }
        };
        match woken_by {
            Some(byte) => {
                self.process_byte(byte);
                self.process_pending().map(|n| n.saturating_add(1))
            }
            None => {
                self.check_timeout();
                Ok(0)
            }
        }
    }

    /// Run the worker loop until the link fails.
    ///
    /// Spawn this as the link's task; it only returns on error.
    pub async fn run(&mut self) -> ComLinkError<D::Error> {
        loop {
            if let Err(e) = self.run_once().await {
                return e;
            }
        }
    }

    /// Feed one received byte through dispatch.
    pub fn process_byte(&mut self, byte: u8) {
        if !self.enabled {
            self.count_discarded(1);
            return;
        }
        self.check_timeout();

        if self.rx.is_full() {
            if self.current.is_some() {
                self.abandon(AbandonReason::Overflow);
            } else {
                let dropped = self.rx.clear();
                self.count_discarded(dropped);
            }
        }
        if !self.rx.push(byte) {
            // Zero-length accumulator storage.
            self.count_discarded(1);
            return;
        }

        match self.current {
            Some(index) => self.dispatch_current(index),
            None => self.dispatch_idle(),
        }
    }

    /// Index of the protocol currently matching, if any.
    pub fn current_protocol(&self) -> Option<usize> {
        self.current
    }

    /// Bytes accumulated toward the current match.
    pub fn pending_bytes(&self) -> &[u8] {
        self.rx.as_slice()
    }

    /// Dispatch counters.
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// The wrapped device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The wrapped device, mutably.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn dispatch_idle(&mut self) {
        while !self.rx.is_empty() {
            match self.replay() {
                Replay::Matching => return,
                Replay::Consumed => {}
                Replay::Unclaimed => {
                    // Nobody claims the first byte: resynchronise one byte later.
                    self.rx.consume(1);
                    self.count_discarded(1);
                }
            }
        }
    }

    /// Offer the accumulator again from idle as if its bytes were arriving
    /// one at a time, so a frame that ends before the last byte is still
    /// found.
    ///
    /// On a fresh byte the accumulator holds only that byte and this is a
    /// single round of parse calls. It only walks longer prefixes after a
    /// rejected match leaves bytes behind.
    fn replay(&mut self) -> Replay {
        let mut matching = None;
        for len in 1..=self.rx.len() {
            let (index, status, response_len) = match matching {
                Some(index) => {
                    let (status, response_len) = self.parse_with(index, len);
                    (index, status, response_len)
                }
                None => match self.claim(len) {
                    Some(claim) => claim,
                    None => return Replay::Unclaimed,
                },
            };
            match status {
                // Replayed candidates were never current: nothing to abandon.
                ParseStatus::NotAFrame => return Replay::Unclaimed,
                ParseStatus::MidFrame => matching = Some(index),
                ParseStatus::FoundFrame(follow_up) => {
                    self.complete(index, len, response_len, follow_up);
                    return Replay::Consumed;
                }
            }
        }
        match matching {
            Some(index) => {
                self.begin_match(index);
                Replay::Matching
            }
            None => Replay::Unclaimed,
        }
    }

    /// First protocol, in registration order, that does not reject
    /// `rx[..len]`.
    fn claim(&mut self, len: usize) -> Option<(usize, ParseStatus, usize)> {
        for index in 0..self.protocols.len() {
            let (status, response_len) = self.parse_with(index, len);
            if status != ParseStatus::NotAFrame {
                return Some((index, status, response_len));
            }
        }
        None
    }

    fn dispatch_current(&mut self, index: usize) {
        match self.parse_with(index, self.rx.len()) {
            (ParseStatus::MidFrame, _) => {}
            (ParseStatus::FoundFrame(follow_up), response_len) => {
                self.complete(index, self.rx.len(), response_len, follow_up);
            }
            (ParseStatus::NotAFrame, _) => {
                self.release(index, AbandonReason::Rejected);
                self.dispatch_idle();
            }
        }
    }

    /// Offer the first `len` accumulated bytes to protocol `index`; returns
    /// its status and the length of the response it wrote.
    fn parse_with(&mut self, index: usize, len: usize) -> (ParseStatus, usize) {
        let Some(protocol) = self.protocols.get_mut(index) else {
            return (ParseStatus::NotAFrame, 0);
        };
        let rx = self.rx.as_slice().get(..len).unwrap_or_default();
        let mut response = ResponseBuffer::new(&mut *self.response);
        let status = protocol.parse(rx, &mut response);
        (status, response.len())
    }

    fn begin_match(&mut self, index: usize) {
        let timeout = self
            .protocols
            .get(index)
            .map_or(0, |protocol| protocol.parse_timeout_ms());
        self.current = Some(index);
        self.deadline_ms = self.clock.now_ms().saturating_add(timeout);
        trace!("protocol {} matching, deadline {}", index, self.deadline_ms);
    }

    /// Finish a frame made of the first `frame_len` accumulated bytes.
    fn complete(&mut self, index: usize, frame_len: usize, response_len: usize, follow_up: FollowUp) {
        self.current = None;
        self.rx.consume(frame_len);
        self.stats.frames_found = self.stats.frames_found.saturating_add(1);
        trace!("protocol {} found a frame", index);

        if response_len > 0 {
            let response = self.response.get(..response_len).unwrap_or_default();
            if let Err(_e) = self.device.transmit_bytes(response, false) {
                warn!("response transmit failed");
                self.stats.transmit_errors = self.stats.transmit_errors.saturating_add(1);
            }
        }
        if follow_up == FollowUp::Requested {
            if let Some(protocol) = self.protocols.get_mut(index) {
                protocol.follow_up();
            }
        }
    }

    /// Give up the current match: reset the protocol and discard the bytes.
    fn abandon(&mut self, reason: AbandonReason) {
        if let Some(index) = self.current {
            self.release(index, reason);
            let dropped = self.rx.clear();
            self.count_discarded(dropped);
        }
    }

    /// Reset protocol `index` and return to idle, keeping the bytes.
    fn release(&mut self, index: usize, reason: AbandonReason) {
        if let Some(protocol) = self.protocols.get_mut(index) {
            protocol.reset();
        }
        self.current = None;
        self.stats.matches_abandoned = self.stats.matches_abandoned.saturating_add(1);
        debug!(
            "protocol {} abandoned after {} bytes ({})",
            index,
            self.rx.len(),
            reason_str(reason)
        );
    }

    fn count_discarded(&mut self, bytes: usize) {
        if bytes > 0 {
            let bytes = u32::try_from(bytes).unwrap_or(u32::MAX);
            self.stats.bytes_discarded = self.stats.bytes_discarded.saturating_add(bytes);
        }
    }
}

fn reason_str(reason: AbandonReason) -> &'static str {
    match reason {
        AbandonReason::Timeout => "timeout",
        AbandonReason::Rejected => "rejected",
        AbandonReason::Overflow => "overflow",
        AbandonReason::Disabled => "disabled",
    }
}
