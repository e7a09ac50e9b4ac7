use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the value associated with `field` in the hash stored at `key`, or `nil` when either the
/// hash or the field does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/hget/>
#[derive(Debug, PartialEq)]
pub struct Hget {
    pub key: Bytes,
    pub field: Bytes,
}

impl Executable for Hget {
    const NAME: &'static str = "HGET";

    fn exec(self, store: &Store) -> Result<Frame, Error> {
        let res = store
            .hget(&self.key, &self.field)
            .map_or(Frame::Null, Frame::Bulk);

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Hget {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let field = parser.next_bytes()?;

        Ok(Self { key, field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(parts: &[&'static [u8]]) -> Result<Hget, CommandParserError> {
        let parser = &mut CommandParser::new(
            parts
                .iter()
                .map(|part| Frame::Bulk(Bytes::from_static(*part)))
                .collect(),
        );
        Hget::try_from(parser)
    }

    #[test]
    fn existing_field() {
        let store = Store::new();
        store.hset(Bytes::from("user"), Bytes::from("name"), Bytes::from("ana"));

        let res = parse(&[b"user", b"name"]).unwrap().exec(&store).unwrap();

        assert_eq!(res, Frame::Bulk(Bytes::from("ana")));
    }

    #[test]
    fn missing_field() {
        let store = Store::new();
        store.hset(Bytes::from("user"), Bytes::from("name"), Bytes::from("ana"));

        let res = parse(&[b"user", b"email"]).unwrap().exec(&store).unwrap();

        assert_eq!(res, Frame::Null);
    }

    #[test]
    fn missing_hash() {
        let store = Store::new();

        let res = parse(&[b"user", b"name"]).unwrap().exec(&store).unwrap();

        assert_eq!(res, Frame::Null);
    }

    #[test]
    fn binary_hash_and_field() {
        let store = Store::new();
        store.hset(
            Bytes::from_static(b"\xff"),
            Bytes::from_static(b"\x00\xfe"),
            Bytes::from("v"),
        );

        let res = parse(&[b"\xff", b"\x00\xfe"]).unwrap().exec(&store).unwrap();

        assert_eq!(res, Frame::Bulk(Bytes::from("v")));
    }

    #[test]
    fn missing_field_argument() {
        assert_eq!(
            parse(&[b"user"]).unwrap_err(),
            CommandParserError::EndOfStream
        );
    }
}
