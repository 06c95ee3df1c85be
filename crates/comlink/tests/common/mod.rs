//! Scripted protocol shared by the link tests.

#![allow(dead_code)]

use std::cell::Cell;

use comlink::{ComProtocol, FollowUp, ParseStatus, ResponseBuffer};

/// Counters a test keeps after handing the protocol to a link.
#[derive(Debug, Default)]
pub struct Tally {
    pub found: Cell<u32>,
    pub resets: Cell<u32>,
    pub follow_ups: Cell<u32>,
}

impl Tally {
    fn bump(counter: &Cell<u32>) {
        counter.set(counter.get() + 1);
    }
}

/// Recognises exactly one byte sequence and answers with a fixed response.
pub struct Scripted<'p> {
    frame: &'static [u8],
    response: &'static [u8],
    timeout_ms: u64,
    follow_up: FollowUp,
    tally: &'p Tally,
}

impl<'p> Scripted<'p> {
    pub fn new(frame: &'static [u8], response: &'static [u8], tally: &'p Tally) -> Self {
        Self {
            frame,
            response,
            timeout_ms: 50,
            follow_up: FollowUp::None,
            tally,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_follow_up(mut self) -> Self {
        self.follow_up = FollowUp::Requested;
        self
    }
}

impl ComProtocol for Scripted<'_> {
    fn parse_timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn parse(&mut self, rx: &[u8], response: &mut ResponseBuffer<'_>) -> ParseStatus {
        if rx == self.frame {
            Tally::bump(&self.tally.found);
            response.write(self.response).unwrap();
            ParseStatus::FoundFrame(self.follow_up)
        } else if self.frame.starts_with(rx) {
            ParseStatus::MidFrame
        } else {
            ParseStatus::NotAFrame
        }
    }

    fn follow_up(&mut self) {
        Tally::bump(&self.tally.follow_ups);
    }

    fn reset(&mut self) {
        Tally::bump(&self.tally.resets);
    }
}
