use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use super::relay_client_error::RelayClientError;
use super::relay_command::RelayCommand;
use super::relay_event::RelayEvent;
use crate::log::{LogSink, NoopLogSink};
use crate::relay::protocol::{
    FrameError, RelayMsg, SignalEnvelope, SignalKind, SignalTarget, read_msg, write_msg,
};
use crate::relay::types::{RoomId, SessionId};
use crate::{sink_debug, sink_info, sink_warn};

/// How long `connect` waits for the relay's Welcome.
const GREETING_TIMEOUT: Duration = Duration::from_secs(5);

/// Peer-side connection to the relay.
///
/// A reader thread turns frames into [`RelayEvent`]s; a writer thread drains
/// [`RelayCommand`]s onto the socket. Both stop when the socket closes.
pub struct RelayClient {
    session_id: SessionId,
    cmd_tx: Sender<RelayCommand>,
    events_rx: Receiver<RelayEvent>,
    log: Arc<dyn LogSink>,
}

impl RelayClient {
    pub fn connect(addr: &str) -> Result<Self, RelayClientError> {
        Self::connect_with_log(addr, Arc::new(NoopLogSink))
    }

    /// Connect and wait for the relay to assign our session id.
    pub fn connect_with_log(addr: &str, log: Arc<dyn LogSink>) -> Result<Self, RelayClientError> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        stream.set_read_timeout(Some(GREETING_TIMEOUT))?;
        let session_id = match read_msg(&mut stream)? {
            RelayMsg::Welcome { session_id } => session_id,
            other => return Err(RelayClientError::UnexpectedGreeting(other.name())),
        };
        stream.set_read_timeout(None)?;
        sink_info!(log, "[relay-client] connected to {} as {}", addr, session_id);

        let (cmd_tx, cmd_rx) = mpsc::channel::<RelayCommand>();
        let (events_tx, events_rx) = mpsc::channel::<RelayEvent>();

        let read_stream = stream.try_clone()?;
        spawn_reader(read_stream, events_tx, log.clone())?;
        spawn_writer(stream, cmd_rx, log.clone())?;

        Ok(Self {
            session_id,
            cmd_tx,
            events_rx,
            log,
        })
    }

    /// The id the relay assigned to this connection.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn send(&self, msg: RelayMsg) -> Result<(), RelayClientError> {
        self.cmd_tx
            .send(RelayCommand::Send(msg))
            .map_err(|_| RelayClientError::Disconnected)
    }

    pub fn join(&self, room: impl Into<RoomId>) -> Result<(), RelayClientError> {
        self.send(RelayMsg::Join { room: room.into() })
    }

    /// Send a negotiation payload. The relay fills in the sender.
    pub fn signal(
        &self,
        to: SignalTarget,
        kind: SignalKind,
        payload: Vec<u8>,
    ) -> Result<(), RelayClientError> {
        sink_debug!(self.log, "[relay-client] sending {} to {:?}", kind.name(), to);
        self.send(RelayMsg::Signal(SignalEnvelope {
            to,
            from: self.session_id.clone(),
            kind,
            payload,
        }))
    }

    pub fn ping(&self, nonce: u64) -> Result<(), RelayClientError> {
        self.send(RelayMsg::Ping { nonce })
    }

    /// Next event, waiting up to `timeout`. `None` on timeout.
    ///
    /// Once the reader thread is gone this keeps returning `Disconnected`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RelayEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(RelayEvent::Disconnected),
        }
    }

    pub fn try_recv(&self) -> Option<RelayEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Close the connection; the relay treats it as a disconnect.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(RelayCommand::Disconnect);
    }
}

impl Drop for RelayClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn spawn_reader(
    mut stream: TcpStream,
    events_tx: Sender<RelayEvent>,
    log: Arc<dyn LogSink>,
) -> io::Result<()> {
    thread::Builder::new()
        .name("relay-client-rx".into())
        .spawn(move || {
            loop {
                let event = match read_msg(&mut stream) {
                    Ok(RelayMsg::Joined { room }) => RelayEvent::Joined { room },
                    Ok(RelayMsg::Membership { room, members }) => {
                        RelayEvent::Membership { room, members }
                    }
                    Ok(RelayMsg::Signal(env)) => RelayEvent::Signal(env),
                    Ok(RelayMsg::Pong { nonce }) => RelayEvent::Pong { nonce },
                    Ok(other) => {
                        sink_warn!(log, "[relay-client] ignoring unexpected {}", other.name());
                        continue;
                    }
                    Err(FrameError::Io(e)) => {
                        sink_debug!(log, "[relay-client] connection closed: {}", e);
                        let _ = events_tx.send(RelayEvent::Disconnected);
                        break;
                    }
                    Err(e) => {
                        sink_warn!(log, "[relay-client] bad frame from relay: {}", e);
                        let _ = events_tx.send(RelayEvent::Disconnected);
                        break;
                    }
                };
                if events_tx.send(event).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}

fn spawn_writer(
    mut stream: TcpStream,
    cmd_rx: Receiver<RelayCommand>,
    log: Arc<dyn LogSink>,
) -> io::Result<()> {
    thread::Builder::new()
        .name("relay-client-tx".into())
        .spawn(move || {
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    RelayCommand::Send(msg) => {
                        if let Err(e) = write_msg(&mut stream, &msg) {
                            sink_warn!(log, "[relay-client] error sending {}: {}", msg.name(), e);
                            break;
                        }
                    }
                    RelayCommand::Disconnect => break,
                }
            }
            let _ = stream.shutdown(Shutdown::Both);
        })?;
    Ok(())
}
