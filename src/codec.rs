use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::frame::{self, Frame};
use crate::Error;

/// Default upper bound for a single buffered frame, the same as Redis' `proto-max-bulk-len`.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Splits a byte stream into [`Frame`]s and writes frames back as RESP.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> FrameCodec {
        FrameCodec { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            // Not enough data to parse a frame. Bail out before buffering without bound.
            Err(frame::Error::Incomplete) if src.len() > self.max_frame_size => {
                return Err(format!(
                    "protocol error; frame size exceeds limit of {} bytes",
                    self.max_frame_size
                )
                .into());
            }
            Err(frame::Error::Incomplete) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let position = cursor.position() as usize;

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                // The peer went away in the middle of a frame: that is still just the end of the
                // stream, not malformed input.
                if !src.is_empty() {
                    debug!("Discarding {} bytes of an incomplete frame", src.len());
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decode_waits_for_more_data() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$4\r\nke"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        // Nothing is consumed until the whole frame is available.
        assert_eq!(buf.len(), 19);

        buf.extend_from_slice(b"y1\r\n");
        let frame = codec.decode(&mut buf).unwrap();

        assert_eq!(
            frame,
            Some(Frame::Array(vec![
                Frame::Bulk(Bytes::from("GET")),
                Frame::Bulk(Bytes::from("key1")),
            ]))
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_consumes_one_frame_at_a_time() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert_eq!(buf.len(), 14);
        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(buf.is_empty());
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn decode_rejects_invalid_data_type() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"GET key\r\n"[..]);

        let err = codec.decode(&mut buf).unwrap_err();

        assert!(err.to_string().contains("invalid frame data type"));
    }

    #[test]
    fn decode_rejects_oversized_frame() {
        let mut codec = FrameCodec::new(16);
        let mut buf = BytesMut::from(&b"$100\r\n0123456789012345678901234"[..]);

        let err = codec.decode(&mut buf).unwrap_err();

        assert!(err.to_string().contains("exceeds limit"));
    }

    #[test]
    fn decode_rejects_deeply_nested_frame_below_size_limit() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*1\r\n".repeat(frame::MAX_DEPTH + 1)[..]);

        let err = codec.decode(&mut buf).unwrap_err();

        assert!(err.to_string().contains("nested deeper"));
    }

    #[test]
    fn decode_eof_with_partial_frame_is_end_of_stream() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n"[..]);

        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_appends_serialized_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();

        codec.encode(Frame::Simple("OK".to_string()), &mut buf).unwrap();
        codec.encode(Frame::Null, &mut buf).unwrap();

        assert_eq!(&buf[..], b"+OK\r\n$-1\r\n");
    }
}
