// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::Buf;
use bytes::Bytes;
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

/// How deep arrays may nest inside a single frame. Requests only ever use one level.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {:?}", char::from(*.0))]
    InvalidDataType(u8),
    #[error("invalid length or count: {0:?}")]
    InvalidLength(String),
    #[error("protocol error; arrays nested deeper than {} levels", MAX_DEPTH)]
    NestingTooDeep,
    /// Invalid message encoding.
    #[error("{0}")]
    Other(crate::Error),
}

/// A single RESP value, used both for decoded requests and for encoded replies.
///
/// RESP2 has two distinct nulls: the null bulk string (`$-1`) and the null array (`*-1`). They are
/// kept apart as `Null` and `NullArray` so that decoding and re-encoding preserves which one was
/// sent.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
    NullArray,
}

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    /// Parses one frame from `src`, leaving the cursor right after it.
    ///
    /// Requests are arrays of bulk strings, so only those two data types are accepted. Any other
    /// leading byte is reported as `Error::InvalidDataType`. When the buffer ends before the frame
    /// does, `Error::Incomplete` is returned and the caller should retry once more data arrives.
    /// Arrays nested more than [`MAX_DEPTH`] levels are rejected with `Error::NestingTooDeep`.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Self::parse_depth(src, 0)
    }

    fn parse_depth(src: &mut Cursor<&[u8]>, depth: usize) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            // $<length>\r\n<data>\r\n
            DataType::BulkString => {
                let length = get_length(src)?;

                if length == -1 {
                    return Ok(Frame::Null);
                }
                let length = usize::try_from(length)
                    .map_err(|_| Error::InvalidLength(length.to_string()))?;

                // The payload is length prefixed, it may contain CRLF itself.
                if src.remaining() < length + CRLF.len() {
                    return Err(Error::Incomplete);
                }
                let start = src.position() as usize;
                let data = Bytes::copy_from_slice(&src.get_ref()[start..start + length]);
                src.advance(length);

                if get_byte(src)? != b'\r' || get_byte(src)? != b'\n' {
                    return Err("protocol error; bulk string is not terminated by CRLF".into());
                }

                Ok(Frame::Bulk(data))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                if depth >= MAX_DEPTH {
                    return Err(Error::NestingTooDeep);
                }

                let length = get_length(src)?;

                if length == -1 {
                    return Ok(Frame::NullArray);
                }
                let length = usize::try_from(length)
                    .map_err(|_| Error::InvalidLength(length.to_string()))?;

                // Every element takes at least three bytes on the wire, so the count announced by
                // the peer can't be trusted for the allocation.
                let mut frames = Vec::with_capacity(length.min(src.remaining() / 3));
                for _ in 0..length {
                    let frame = Self::parse_depth(src, depth + 1)?;
                    frames.push(frame);
                }

                Ok(Frame::Array(frames))
            }
            data_type => Err(Error::InvalidDataType(u8::from(data_type))),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleString));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let digits = i.to_string();
                let mut bytes = Vec::with_capacity(1 + digits.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(digits.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(bytes) => {
                let length_str = bytes.len().to_string();
                let mut result = Vec::with_capacity(
                    1 + length_str.len() + CRLF.len() + bytes.len() + CRLF.len(),
                );
                result.push(u8::from(DataType::BulkString));
                result.extend_from_slice(length_str.as_bytes());
                result.extend_from_slice(CRLF);
                result.extend_from_slice(bytes);
                result.extend_from_slice(CRLF);
                result
            }
            Frame::Null => b"$-1\r\n".to_vec(),
            Frame::Array(arr) => {
                let length_str = arr.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length_str.len() + CRLF.len());
                bytes.push(u8::from(DataType::Array));
                bytes.extend_from_slice(length_str.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in arr {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
            Frame::NullArray => b"*-1\r\n".to_vec(),
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}[", arr.len())?;
                for (i, frame) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", frame)?;
                }
                write!(f, "]")
            }
            Frame::NullArray => write!(f, "*-1"),
        }
    }
}

fn get_frame_bytes<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    let frame_end_position = src.get_ref()[start..end]
        .windows(2)
        .position(|window| window == CRLF)
        .ok_or(Error::Incomplete)
        .map(|index| start + index)?;

    src.set_position((frame_end_position + CRLF.len()) as u64);

    Ok(&src.get_ref()[start..frame_end_position])
}

/// Reads a CRLF terminated, base-10 signed integer as used by length and count prefixes.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_frame_bytes(src)?;
    let line = String::from_utf8(line.to_vec())?;

    line.parse::<i64>().map_err(|_| Error::InvalidLength(line))
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    BulkString,   // '$'
    SimpleError,  // '-'
    Integer,      // ':'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        "protocol error; invalid frame format".into()
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        src.to_string().into()
    }
}

impl From<String> for Error {
    fn from(src: String) -> Error {
        Error::Other(src.into())
    }
}
