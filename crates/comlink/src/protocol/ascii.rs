//! Line-oriented ASCII command protocol.
//!
//! ```text
//! $<name>[=<value>]<LF>        e.g.  $rate=50\n   $reset\n   $id\r\n
//! ```
//!
//! A frame starts with `$` and ends with a line feed; a carriage return right
//! before the line feed is tolerated and stripped. Everything in between must
//! be printable ASCII and at most [`MAX_LINE`] bytes long. The first `=`
//! splits name from value; a missing or empty name rejects the line.

use crate::config::{DEFAULT_PARSE_TIMEOUT_MS, MAX_LINE};
use crate::protocol::{ComProtocol, FollowUp, ParseStatus, ResponseBuffer};

/// Frame start character.
pub const START: u8 = b'$';
/// Name/value separator.
pub const ASSIGN: u8 = b'=';
/// Frame terminator.
pub const END: u8 = b'\n';

const CR: u8 = b'\r';

/// One parsed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiCommand<'l> {
    /// Command name, never empty.
    pub name: &'l str,
    /// Text after the first `=`, if any. May be empty (`$name=\n`).
    pub value: Option<&'l str>,
}

impl<'l> AsciiCommand<'l> {
    /// Split a line body (without `$` and terminator) into a command.
    pub fn parse(line: &'l [u8]) -> Option<Self> {
        if !line.iter().all(|b| is_printable(*b)) {
            return None;
        }
        let text = core::str::from_utf8(line).ok()?;
        let (name, value) = match text.split_once(char::from(ASSIGN)) {
            Some((name, value)) => (name, Some(value)),
            None => (text, None),
        };
        if name.is_empty() {
            return None;
        }
        Some(Self { name, value })
    }
}

/// Receiver of complete command lines.
pub trait AsciiHandler {
    /// Handle `command`, writing any reply to `reply`.
    fn on_command(&mut self, command: AsciiCommand<'_>, reply: &mut ResponseBuffer<'_>)
        -> FollowUp;

    /// Runs after a reply for which `on_command` requested a follow-up has
    /// been transmitted.
    fn follow_up(&mut self) {}
}

/// [`ComProtocol`] for `$name=value` lines.
pub struct AsciiProtocol<H> {
    handler: H,
    timeout_ms: u64,
}

impl<H: AsciiHandler> AsciiProtocol<H> {
    /// Protocol forwarding complete lines to `handler`.
    pub const fn new(handler: H) -> Self {
        Self {
            handler,
            timeout_ms: DEFAULT_PARSE_TIMEOUT_MS,
        }
    }

    /// Override the parse timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The wrapped handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}

impl<H: AsciiHandler> ComProtocol for AsciiProtocol<H> {
    fn parse_timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn parse(&mut self, rx: &[u8], response: &mut ResponseBuffer<'_>) -> ParseStatus {
        let Some((&first, body)) = rx.split_first() else {
            return ParseStatus::NotAFrame;
        };
        if first != START {
            return ParseStatus::NotAFrame;
        }

        let Some(end) = body.iter().position(|&b| b == END) else {
            return scan_partial(body);
        };
        // Dispatch runs per byte, so a terminator is always the last byte.
        if end.saturating_add(1) != body.len() {
            return ParseStatus::NotAFrame;
        }
        let line = body.get(..end).unwrap_or_default();
        let line = line.strip_suffix(&[CR]).unwrap_or(line);
        if line.len() > MAX_LINE {
            return ParseStatus::NotAFrame;
        }

        match AsciiCommand::parse(line) {
            Some(command) => {
                trace!("ascii command, {} byte name", command.name.len());
                ParseStatus::FoundFrame(self.handler.on_command(command, response))
            }
            None => ParseStatus::NotAFrame,
        }
    }

    fn follow_up(&mut self) {
        self.handler.follow_up();
    }
}

/// Classify an unterminated body: still a plausible line prefix, or not.
fn scan_partial(body: &[u8]) -> ParseStatus {
    // A CR is only legal as the last byte before the terminator.
    let (last, before) = match body.split_last() {
        Some((&CR, before)) => (None, before),
        Some((&last, before)) => (Some(last), before),
        None => return ParseStatus::MidFrame,
    };
    let too_long = body.len() > MAX_LINE.saturating_add(1)
        || (last.is_some() && body.len() > MAX_LINE);
    if too_long
        || !before.iter().all(|b| is_printable(*b))
        || last.is_some_and(|b| !is_printable(b))
    {
        return ParseStatus::NotAFrame;
    }
    ParseStatus::MidFrame
}

fn is_printable(byte: u8) -> bool {
    byte.is_ascii_graphic() || byte == b' '
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use core::fmt::Write as _;

    #[derive(Default)]
    struct Echo {
        last_name: heapless::String<MAX_LINE>,
        last_value: Option<heapless::String<MAX_LINE>>,
        follow_ups: u32,
    }

    impl AsciiHandler for Echo {
        fn on_command(
            &mut self,
            command: AsciiCommand<'_>,
            reply: &mut ResponseBuffer<'_>,
        ) -> FollowUp {
            self.last_name.clear();
            self.last_name.push_str(command.name).unwrap();
            self.last_value = command
                .value
                .map(|v| heapless::String::try_from(v).unwrap());
            writeln!(reply, "$ok={}", command.name).unwrap();
            if command.name == "reset" {
                FollowUp::Requested
            } else {
                FollowUp::None
            }
        }

        fn follow_up(&mut self) {
            self.follow_ups = self.follow_ups.saturating_add(1);
        }
    }

    fn parse(
        protocol: &mut AsciiProtocol<Echo>,
        rx: &[u8],
    ) -> (ParseStatus, heapless::Vec<u8, 80>) {
        let mut storage = [0u8; 80];
        let mut response = ResponseBuffer::new(&mut storage);
        let status = protocol.parse(rx, &mut response);
        (status, heapless::Vec::from_slice(response.as_bytes()).unwrap())
    }

    #[test]
    fn wrong_start_is_rejected_immediately() {
        let mut protocol = AsciiProtocol::new(Echo::default());
        assert_eq!(parse(&mut protocol, b"x").0, ParseStatus::NotAFrame);
        assert_eq!(parse(&mut protocol, &[0xA5]).0, ParseStatus::NotAFrame);
    }

    #[test]
    fn every_prefix_is_mid_frame() {
        let mut protocol = AsciiProtocol::new(Echo::default());
        let line = b"$rate=50\r\n";
        for len in 1..line.len() {
            assert_eq!(
                parse(&mut protocol, &line[..len]).0,
                ParseStatus::MidFrame,
                "prefix of {len} bytes"
            );
        }
    }

    #[test]
    fn complete_line_reaches_the_handler() {
        let mut protocol = AsciiProtocol::new(Echo::default());
        let (status, reply) = parse(&mut protocol, b"$rate=50\r\n");

        assert_eq!(status, ParseStatus::FoundFrame(FollowUp::None));
        assert_eq!(reply.as_slice(), b"$ok=rate\n");
        assert_eq!(protocol.handler().last_name.as_str(), "rate");
        assert_eq!(protocol.handler().last_value.as_deref(), Some("50"));
    }

    #[test]
    fn command_without_value() {
        let mut protocol = AsciiProtocol::new(Echo::default());
        let (status, _) = parse(&mut protocol, b"$reset\n");
        assert_eq!(status, ParseStatus::FoundFrame(FollowUp::Requested));
        assert_eq!(protocol.handler().last_value, None);

        protocol.follow_up();
        assert_eq!(protocol.handler().follow_ups, 1);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        let mut protocol = AsciiProtocol::new(Echo::default());
        for bad in [
            &b"$\n"[..],
            b"$=5\n",
            b"$ra\x01te\n",
            b"$ra\rte",
            b"$rate\n$",
        ] {
            assert_eq!(parse(&mut protocol, bad).0, ParseStatus::NotAFrame);
        }
    }

    #[test]
    fn overlong_lines_are_rejected() {
        let mut protocol = AsciiProtocol::new(Echo::default());
        let mut line: heapless::Vec<u8, 80> = heapless::Vec::new();
        line.push(START).unwrap();
        for _ in 0..=MAX_LINE {
            line.push(b'a').unwrap();
        }
        assert_eq!(parse(&mut protocol, &line).0, ParseStatus::NotAFrame);
    }
}
