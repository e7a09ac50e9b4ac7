use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Error;

/// A client connection. Reads request frames and writes reply frames over a single TCP stream.
pub struct Connection {
    pub id: Uuid,
    pub client_address: Option<SocketAddr>,
    // Data is read from the socket into the codec's read buffer. When a frame is parsed, the
    // corresponding data is removed from the buffer.
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Self::with_codec(stream, FrameCodec::default())
    }

    pub fn with_codec(stream: TcpStream, codec: FrameCodec) -> Connection {
        let client_address = stream.peer_addr().ok();

        Connection {
            id: Uuid::new_v4(),
            client_address,
            // Allocate the buffer with 4kb of capacity.
            framed: Framed::with_capacity(stream, codec, 4096),
        }
    }

    /// Reads the next frame. `None` means the peer closed the stream, possibly in the middle of a
    /// frame.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.framed.next().await.transpose()
    }

    /// Writes a frame and flushes it, so the reply is on the wire before the next read.
    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.framed.send(frame).await
    }
}
