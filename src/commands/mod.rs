pub mod executable;
pub mod get;
pub mod hget;
pub mod hset;
pub mod ping;
pub mod set;
pub mod table;

use bytes::Bytes;
use std::vec;
use thiserror::Error as ThisError;

use crate::frame::Frame;

pub use executable::Executable;
pub use table::{CommandHandler, CommandTable, Handler};

/// A decoded client request: the uppercased command name and its positional arguments.
#[derive(Debug, PartialEq)]
pub struct Request {
    pub name: String,
    pub args: Vec<Frame>,
}

impl TryFrom<Frame> for Request {
    type Error = RequestError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays of bulk strings.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(RequestError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                })
            }
        };

        if let Some(actual) = frames.iter().find(|f| !matches!(f, Frame::Bulk(_))) {
            return Err(RequestError::InvalidFrame {
                expected: "bulk string".to_string(),
                actual: actual.clone(),
            });
        }

        let mut parts = frames.into_iter();
        let name = match parts.next() {
            Some(Frame::Bulk(name)) => String::from_utf8_lossy(&name).to_uppercase(),
            _ => return Err(RequestError::Empty),
        };

        Ok(Self {
            name,
            args: parts.collect(),
        })
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum RequestError {
    #[error("invalid request, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("invalid request, expected a non-empty array")]
    Empty,
}

/// Pulls positional arguments out of a request, in order. Keys, fields and values are all binary
/// safe, so arguments are handed out as raw bytes.
pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    pub fn new(args: Vec<Frame>) -> CommandParser {
        CommandParser {
            parts: args.into_iter(),
        }
    }

    pub fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or_else(|| CommandParserError::EndOfStream)?;

        match frame {
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "bulk string".to_string(),
                actual: frame,
            }),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_request() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("set")),
            Frame::Bulk(Bytes::from("foo")),
            Frame::Bulk(Bytes::from("bar")),
        ]);

        let request = Request::try_from(frame).unwrap();

        assert_eq!(
            request,
            Request {
                name: "SET".to_string(),
                args: vec![Frame::Bulk(Bytes::from("foo")), Frame::Bulk(Bytes::from("bar"))],
            }
        );
    }

    #[test]
    fn parse_request_without_arguments() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("PiNg"))]);

        let request = Request::try_from(frame).unwrap();

        assert_eq!(request.name, "PING");
        assert!(request.args.is_empty());
    }

    #[test]
    fn reject_non_array_request() {
        let err = Request::try_from(Frame::Bulk(Bytes::from("PING"))).unwrap_err();

        assert_eq!(
            err,
            RequestError::InvalidFrame {
                expected: "array".to_string(),
                actual: Frame::Bulk(Bytes::from("PING")),
            }
        );
    }

    #[test]
    fn reject_null_array_request() {
        let err = Request::try_from(Frame::NullArray).unwrap_err();

        assert!(matches!(err, RequestError::InvalidFrame { .. }));
    }

    #[test]
    fn reject_empty_request() {
        let err = Request::try_from(Frame::Array(vec![])).unwrap_err();

        assert_eq!(err, RequestError::Empty);
    }

    #[test]
    fn reject_non_bulk_arguments() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("GET")),
            Frame::Null,
        ]);

        let err = Request::try_from(frame).unwrap_err();

        assert_eq!(
            err,
            RequestError::InvalidFrame {
                expected: "bulk string".to_string(),
                actual: Frame::Null,
            }
        );
    }

    #[test]
    fn parser_yields_arguments_in_order() {
        let mut parser = CommandParser::new(vec![
            Frame::Bulk(Bytes::from("key")),
            Frame::Bulk(Bytes::from_static(b"\xffvalue")),
        ]);

        assert_eq!(parser.next_bytes(), Ok(Bytes::from("key")));
        assert_eq!(parser.next_bytes(), Ok(Bytes::from_static(b"\xffvalue")));
        assert_eq!(parser.next_bytes(), Err(CommandParserError::EndOfStream));
    }

    #[test]
    fn parser_accepts_non_utf8_arguments() {
        let mut parser = CommandParser::new(vec![Frame::Bulk(Bytes::from_static(b"\xff\xfe"))]);

        assert_eq!(parser.next_bytes(), Ok(Bytes::from_static(b"\xff\xfe")));
    }

    #[test]
    fn parser_rejects_non_bulk_argument() {
        let mut parser = CommandParser::new(vec![Frame::Integer(1)]);

        assert_eq!(
            parser.next_bytes(),
            Err(CommandParserError::InvalidFrame {
                expected: "bulk string".to_string(),
                actual: Frame::Integer(1),
            })
        );
    }
}
