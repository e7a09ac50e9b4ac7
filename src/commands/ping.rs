use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns PONG if no argument is provided, otherwise returns a copy of the argument.
///
/// The reply is a simple string. A payload that can't travel as one (not UTF-8, or holding CR or
/// LF) is echoed back as a bulk string instead.
///
/// Ref: <https://redis.io/docs/latest/commands/ping>
#[derive(Debug, PartialEq)]
pub struct Ping {
    pub payload: Option<Bytes>,
}

impl Executable for Ping {
    const NAME: &'static str = "PING";

    fn exec(self, _store: &Store) -> Result<Frame, Error> {
        let payload = match self.payload {
            Some(payload) => payload,
            None => return Ok(Frame::Simple("PONG".to_string())),
        };

        let simple = std::str::from_utf8(&payload)
            .ok()
            .filter(|s| !s.contains(|c: char| c == '\r' || c == '\n'))
            .map(str::to_string);

        let res = match simple {
            Some(s) => Frame::Simple(s),
            None => Frame::Bulk(payload),
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Ping {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let payload = match parser.next_bytes() {
            Ok(payload) => Some(payload),
            Err(CommandParserError::EndOfStream) => None,
            Err(e) => return Err(e),
        };

        Ok(Self { payload })
    }
}
