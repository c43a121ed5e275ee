use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use crate::log::LogSink;
use crate::relay::protocol::{FrameError, RelayMsg, read_msg, write_msg};
use crate::relay::server_event::ServerEvent;
use crate::relay::types::ConnId;
use crate::{sink_debug, sink_warn};

/// Thin wrapper over a blocking stream that speaks in `RelayMsg`.
pub struct Connection<S> {
    pub conn_id: ConnId,
    stream: S,
}

impl<S> Connection<S>
where
    S: Read + Write,
{
    pub fn new(conn_id: ConnId, stream: S) -> Self {
        Self { conn_id, stream }
    }

    pub fn recv(&mut self) -> Result<RelayMsg, FrameError> {
        read_msg(&mut self.stream)
    }

    pub fn send(&mut self, msg: &RelayMsg) -> Result<(), FrameError> {
        write_msg(&mut self.stream, msg)
    }
}

/// Spawn reader + writer threads for one accepted TcpStream.
///
/// `server_tx` talks to the central server loop. Fails if the server loop is
/// gone or the stream cannot be split.
pub fn spawn_connection_threads(
    conn_id: ConnId,
    stream: TcpStream,
    server_tx: Sender<ServerEvent>,
    log: Arc<dyn LogSink>,
) -> io::Result<()> {
    let (to_client_tx, to_client_rx) = mpsc::channel::<RelayMsg>();

    let read_stream = stream.try_clone()?;
    let write_stream = stream;

    server_tx
        .send(ServerEvent::RegisterConnection {
            conn_id,
            to_client: to_client_tx,
        })
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "server loop is gone"))?;

    // READER THREAD: socket -> ServerEvent::MsgFromConnection
    {
        let server_tx = server_tx.clone();
        let log = log.clone();
        thread::Builder::new()
            .name(format!("relay-conn-{conn_id}-rx"))
            .spawn(move || {
                let mut conn = Connection::new(conn_id, read_stream);

                loop {
                    match conn.recv() {
                        Ok(msg) => {
                            if server_tx
                                .send(ServerEvent::MsgFromConnection { conn_id, msg })
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(FrameError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                            sink_debug!(log, "[conn {}] closed by peer", conn_id);
                            let _ = server_tx.send(ServerEvent::Disconnected { conn_id });
                            break;
                        }
                        Err(e) => {
                            sink_warn!(log, "[conn {}] reader error: {}", conn_id, e);
                            let _ = server_tx.send(ServerEvent::Disconnected { conn_id });
                            break;
                        }
                    }
                }
            })?;
    }

    // WRITER THREAD: to_client_rx -> socket
    thread::Builder::new()
        .name(format!("relay-conn-{conn_id}-tx"))
        .spawn(move || {
            let mut conn = Connection::new(conn_id, write_stream);

            while let Ok(msg) = to_client_rx.recv() {
                if let Err(e) = conn.send(&msg) {
                    sink_warn!(log, "[conn {}] error sending {}: {}", conn_id, msg.name(), e);
                    let _ = server_tx.send(ServerEvent::Disconnected { conn_id });
                    break;
                }
            }
            // Wake the reader if it is still blocked on the socket.
            let _ = conn.stream.shutdown(std::net::Shutdown::Both);
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::Cursor;

    #[test]
    fn connection_reads_what_it_wrote() {
        let mut conn = Connection::new(1, Cursor::new(Vec::new()));
        conn.send(&RelayMsg::Join { room: "abc".into() }).unwrap();
        conn.stream.set_position(0);
        assert_eq!(conn.recv().unwrap(), RelayMsg::Join { room: "abc".into() });
    }
}
