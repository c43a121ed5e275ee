use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, mpsc};
use std::{io, thread};

use crate::log::{LogSink, NoopLogSink};
use crate::relay::router::Router;
use crate::relay::runtime::run_server_loop;
use crate::relay::server_event::ServerEvent;
use crate::relay::transport::spawn_connection_threads;
use crate::relay::types::ConnId;
use crate::{sink_info, sink_warn};

/// Top-level runtime object for the relay.
///
/// Owns the bound listener and the log sink. `run` spins up the central
/// server loop and then accepts connections forever.
pub struct RelayServer {
    listener: TcpListener,
    log: Arc<dyn LogSink>,
}

impl RelayServer {
    /// Bind the listener now so callers can learn the port (useful with `:0`).
    pub fn bind(addr: &str, log: Arc<dyn LogSink>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self { listener, log })
    }

    pub fn bind_no_log(addr: &str) -> io::Result<Self> {
        Self::bind(addr, Arc::new(NoopLogSink))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Blocking main loop: spawn the server loop, accept TCP clients.
    pub fn run(self) -> io::Result<()> {
        let Self { listener, log } = self;

        let (server_tx, server_rx) = mpsc::channel::<ServerEvent>();

        {
            let log_for_loop = log.clone();
            let log_for_router = log.clone();

            thread::Builder::new()
                .name("relay-server-loop".into())
                .spawn(move || {
                    sink_info!(log_for_loop, "[relay] server loop started");
                    let router = Router::with_log(log_for_router);
                    run_server_loop(router, log_for_loop, server_rx);
                })?;
        }

        let mut next_conn_id: ConnId = 1;
        sink_info!(log, "relay listening on {}", listener.local_addr()?);

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    sink_warn!(log, "incoming TCP accept failed: {} (continuing)", e);
                    continue;
                }
            };

            let conn_id = next_conn_id;
            next_conn_id += 1;

            let peer = stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "?".into());
            sink_info!(log, "accepted TCP connection {} from {}", conn_id, peer);

            let spawned = spawn_connection_threads(conn_id, stream, server_tx.clone(), log.clone());
            if let Err(e) = spawned {
                sink_warn!(
                    log,
                    "failed to spawn connection threads for conn {}: {}",
                    conn_id,
                    e
                );
            }
        }

        Ok(())
    }
}
