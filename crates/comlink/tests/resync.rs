//! Property tests: the link finds frames after arbitrary line noise.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]

mod common;

use comlink::protocol::binary::{BinaryFrame, MAX_FRAME, SYNC};
use comlink::{BinaryHandler, BinaryProtocol, ComLink, FollowUp, ResponseBuffer, RxQueue};
use common::{Tally, Scripted};
use platform::mocks::{MockClock, MockComDevice};
use proptest::prelude::*;

#[derive(Default)]
struct Recorder {
    messages: Vec<(u16, Vec<u8>)>,
}

impl BinaryHandler for Recorder {
    fn on_message(&mut self, id: u16, payload: &[u8], _reply: &mut ResponseBuffer<'_>) -> FollowUp {
        self.messages.push((id, payload.to_vec()));
        FollowUp::None
    }
}

proptest! {
    /// Noise that cannot itself contain the frame never hides it.
    #[test]
    fn scripted_frame_survives_noise(noise in prop::collection::vec(b'A'..=b'Z', 0..48)) {
        let noise: Vec<u8> = noise.into_iter().filter(|&b| b != b'G').collect();
        let queue: RxQueue<128> = RxQueue::new();
        let (mut rx, mut tx) = ([0u8; 64], [0u8; 64]);
        let clock = MockClock::new(0);
        let tally = Tally::default();
        let mut ping = Scripted::new(b"PING", b"PONG", &tally);

        let mut link = ComLink::new(MockComDevice::new(), &clock, &queue, &mut rx, &mut tx);
        link.set_enabled(true);
        link.add_protocol(&mut ping).unwrap();

        queue.on_bytes_received(&noise);
        queue.on_bytes_received(b"PING");
        link.process_pending().unwrap();

        prop_assert_eq!(link.stats().frames_found, 1);
        prop_assert_eq!(link.device().last_transmission(), Some(&b"PONG"[..]));
        prop_assert!(link.pending_bytes().is_empty());
    }

    /// A binary frame behind noise is delivered intact, even when the noise
    /// holds sync bytes or a whole bogus header.
    #[test]
    fn binary_frame_survives_noise(
        noise in prop::collection::vec(
            prop_oneof![any::<u8>(), Just(SYNC[0]), Just(SYNC[1])],
            0..32,
        ),
        id: u16,
        payload in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut frame = [0u8; 128];
        let len = BinaryFrame::new(id, &payload).encode(&mut frame).unwrap();
        // Long enough that any bogus match started in the noise reaches its
        // claimed length and fails its CRC.
        let padding = [0u8; MAX_FRAME];

        let mut binary = BinaryProtocol::new(Recorder::default());
        {
            let queue: RxQueue<512> = RxQueue::new();
            let (mut rx, mut tx) = ([0u8; 256], [0u8; 16]);
            let clock = MockClock::new(0);
            let mut link = ComLink::new(MockComDevice::new(), &clock, &queue, &mut rx, &mut tx);
            link.set_enabled(true);
            link.add_protocol(&mut binary).unwrap();

            queue.on_bytes_received(&noise);
            queue.on_bytes_received(&frame[..len]);
            queue.on_bytes_received(&padding);
            link.process_pending().unwrap();
            prop_assert_eq!(link.stats().frames_found, 1);
            prop_assert_eq!(
                link.stats().bytes_discarded,
                (noise.len() + padding.len()) as u32
            );
            prop_assert!(link.pending_bytes().is_empty());
        }
        prop_assert_eq!(&binary.handler().messages, &vec![(id, payload)]);
    }
}

/// Encoded binary frame.
fn frame(id: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = [0u8; MAX_FRAME];
    let len = BinaryFrame::new(id, payload).encode(&mut buf).unwrap();
    buf[..len].to_vec()
}

#[test]
fn frames_behind_a_bogus_header_are_recovered() {
    // Sync and a header announcing 20 payload bytes that never come.
    let bogus = [SYNC[0], SYNC[1], 0x00, 0x00, 20, 0x00];

    let mut binary = BinaryProtocol::new(Recorder::default());
    {
        let queue: RxQueue<128> = RxQueue::new();
        let (mut rx, mut tx) = ([0u8; 128], [0u8; 16]);
        let clock = MockClock::new(0);
        let mut link = ComLink::new(MockComDevice::new(), &clock, &queue, &mut rx, &mut tx);
        link.add_protocol(&mut binary).unwrap();
        link.set_enabled(true);

        queue.on_bytes_received(&bogus);
        for (id, payload) in [(1, &b"one"[..]), (2, &b"two"[..]), (3, &b"three"[..])] {
            queue.on_bytes_received(&frame(id, payload));
        }
        link.process_pending().unwrap();

        let stats = link.stats();
        assert_eq!(stats.frames_found, 3);
        assert_eq!(stats.matches_abandoned, 1);
        assert_eq!(stats.bytes_discarded, bogus.len() as u32);
        assert!(link.pending_bytes().is_empty());
    }
    let ids: Vec<u16> = binary.handler().messages.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn rejected_match_keeps_a_frame_that_ends_early() {
    let queue: RxQueue<64> = RxQueue::new();
    let (mut rx, mut tx) = ([0u8; 64], [0u8; 64]);
    let clock = MockClock::new(0);
    let (long_tally, short_tally) = (Tally::default(), Tally::default());
    let mut long = Scripted::new(b"ABCDEF", b"long", &long_tally);
    let mut short = Scripted::new(b"BC", b"short", &short_tally);

    let mut link = ComLink::new(MockComDevice::new(), &clock, &queue, &mut rx, &mut tx);
    link.add_protocol(&mut long).unwrap();
    link.add_protocol(&mut short).unwrap();
    link.set_enabled(true);

    // "ABC" is matched as the long frame until "X" breaks it; "BC" is a
    // complete short frame inside the rejected bytes, "X" is noise.
    queue.on_bytes_received(b"ABCX");
    link.process_pending().unwrap();

    assert_eq!(short_tally.found.get(), 1);
    assert_eq!(link.device().last_transmission(), Some(&b"short"[..]));
    assert_eq!(long_tally.resets.get(), 1);
    assert_eq!(link.stats().bytes_discarded, 2);
    assert!(link.pending_bytes().is_empty());
}
