use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time;
use tracing::{debug, error, info, instrument, warn};

use crate::codec::FrameCodec;
use crate::commands::{CommandTable, Request};
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Pause after a failed `accept` (e.g. EMFILE) before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Binds the configured address and serves clients until Ctrl-C.
pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;

    info!("Redis server listening on {}", listener.local_addr()?);

    serve(listener, config, shutdown_signal()).await
}

/// Accepts clients on `listener` until `shutdown` completes. Each client is served by its own
/// task; at most `config.max_connections` of them run at once, further clients wait to be
/// accepted. `config.max_connections` must be at least one.
pub async fn serve(
    listener: TcpListener,
    config: Config,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Error> {
    if config.max_connections == 0 {
        return Err("max_connections must be at least 1".into());
    }

    let store = Store::new();
    let commands = Arc::new(CommandTable::default());
    let limit = Arc::new(Semaphore::new(config.max_connections));
    let codec = FrameCodec::new(config.max_frame_size);

    tokio::pin!(shutdown);

    loop {
        let (socket, client_address, permit) = tokio::select! {
            res = accept(&listener, &limit) => match res {
                Ok(accepted) => accepted,
                Err(e) => {
                    accept_failed(&e).await;
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        };

        info!("Accepted connection from {:?}", client_address);

        let conn = Connection::with_codec(socket, codec.clone());
        let store = store.clone();
        let commands = commands.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(conn, store, commands).await {
                error!("Connection error: {}", e);
            }
            drop(permit);
        });
    }
}

async fn accept(
    listener: &TcpListener,
    limit: &Arc<Semaphore>,
) -> Result<(TcpStream, SocketAddr, OwnedSemaphorePermit), Error> {
    let permit = limit.clone().acquire_owned().await?;
    let (socket, client_address) = listener.accept().await?;
    Ok((socket, client_address, permit))
}

async fn accept_failed(e: &Error) {
    error!("Failed to accept connection: {}", e);
    time::sleep(ACCEPT_BACKOFF).await;
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Serves one client: read a request, run it, write the reply, repeat.
///
/// Requests are handled strictly one after the other, a reply is flushed before the next request
/// is read. The loop ends when the client closes the stream. Malformed framing closes this
/// connection only; a well framed request of the wrong shape is answered with an error and the
/// connection stays open.
#[instrument(
    name = "connection",
    skip(conn, store, commands),
    fields(connection_id = %conn.id, client_address = ?conn.client_address)
)]
pub async fn handle_connection(
    mut conn: Connection,
    store: Store,
    commands: Arc<CommandTable>,
) -> Result<(), Error> {
    loop {
        let frame = match conn.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) if e.is::<io::Error>() => {
                debug!("Connection lost: {}", e);
                return Ok(());
            }
            Err(e) => {
                warn!("Closing connection after protocol error: {}", e);
                // Best effort, the client may not be listening anymore.
                let _ = conn.write_frame(protocol_error(&*e)).await;
                return Ok(());
            }
        };

        debug!("Received frame from client: {}", frame);

        let res = match Request::try_from(frame) {
            Ok(request) => commands.dispatch(request, &store),
            Err(e) => {
                warn!("Rejecting request: {}", e);
                protocol_error(&e)
            }
        };

        debug!("Sending response to client: {}", res);

        conn.write_frame(res).await?;
    }

    info!("Connection closed");
    Ok(())
}

/// Error replies are single line, so any CR or LF quoted from the request is blanked out.
fn protocol_error(e: &dyn std::error::Error) -> Frame {
    let msg = format!("ERR Protocol error: {}", e).replace(['\r', '\n'], " ");
    Frame::Error(msg)
}
