use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Sets `field` in the hash stored at `key` to `value`, creating the hash if needed.
///
/// Unlike Redis, which replies with the number of added fields, this replies `OK`.
///
/// Ref: <https://redis.io/docs/latest/commands/hset/>
#[derive(Debug, PartialEq)]
pub struct Hset {
    pub key: Bytes,
    pub field: Bytes,
    pub value: Bytes,
}

impl Executable for Hset {
    const NAME: &'static str = "HSET";

    fn exec(self, store: &Store) -> Result<Frame, Error> {
        store.hset(self.key, self.field, self.value);

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Hset {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let field = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_field() {
        let parser = &mut CommandParser::new(vec![
            Frame::Bulk(Bytes::from("user")),
            Frame::Bulk(Bytes::from("name")),
            Frame::Bulk(Bytes::from("ana")),
        ]);
        let cmd = Hset::try_from(parser).unwrap();

        assert_eq!(
            cmd,
            Hset {
                key: Bytes::from("user"),
                field: Bytes::from("name"),
                value: Bytes::from("ana"),
            }
        );

        let store = Store::new();
        let res = cmd.exec(&store).unwrap();

        assert_eq!(res, Frame::Simple("OK".to_string()));
        assert_eq!(store.hget(b"user", b"name"), Some(Bytes::from("ana")));
    }

    #[test]
    fn missing_value() {
        let parser = &mut CommandParser::new(vec![
            Frame::Bulk(Bytes::from("user")),
            Frame::Bulk(Bytes::from("name")),
        ]);
        let err = Hset::try_from(parser).unwrap_err();

        assert_eq!(err, CommandParserError::EndOfStream);
    }
}
