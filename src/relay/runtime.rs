use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};

use crate::log::LogSink;
use crate::relay::protocol::RelayMsg;
use crate::relay::router::Router;
use crate::relay::server_event::ServerEvent;
use crate::relay::types::{ConnId, SessionId};
use crate::{sink_debug, sink_info, sink_warn};

/// Central server loop: owns the Router and the connection ↔ session maps.
///
/// Returns when every `ServerEvent` sender has been dropped.
pub fn run_server_loop(mut router: Router, log: Arc<dyn LogSink>, rx: Receiver<ServerEvent>) {
    use ServerEvent::*;

    let mut sessions: HashMap<ConnId, SessionId> = HashMap::new();
    let mut clients: HashMap<SessionId, Sender<RelayMsg>> = HashMap::new();

    while let Ok(ev) = rx.recv() {
        match ev {
            RegisterConnection { conn_id, to_client } => {
                let session = router.register_client();
                sessions.insert(conn_id, session.clone());
                clients.insert(session.clone(), to_client);

                sink_info!(
                    log,
                    "conn {} registered as session {} (now {} sessions)",
                    conn_id,
                    session,
                    clients.len()
                );
            }

            MsgFromConnection { conn_id, msg } => {
                let Some(session) = sessions.get(&conn_id).cloned() else {
                    sink_warn!(log, "{} from unregistered conn {}", msg.name(), conn_id);
                    continue;
                };
                sink_debug!(log, "{} from session {}", msg.name(), session);
                router.handle_from_client(&session, msg);
            }

            Disconnected { conn_id } => {
                let Some(session) = sessions.remove(&conn_id) else {
                    continue;
                };
                sink_info!(log, "session {} disconnected (transport)", session);
                router.unregister_client(&session);
                clients.remove(&session);
            }
        }

        deliver(&mut router, &clients, &log);
    }

    sink_info!(
        log,
        "ServerEvent channel closed; server loop shutting down ({} sessions left)",
        clients.len()
    );
}

/// Hand every queued message to the owning connection's writer thread.
fn deliver(
    router: &mut Router,
    clients: &HashMap<SessionId, Sender<RelayMsg>>,
    log: &Arc<dyn LogSink>,
) {
    for (target, out_msg) in router.drain_all_outgoing() {
        match clients.get(&target) {
            Some(tx) => {
                if tx.send(out_msg).is_err() {
                    sink_warn!(
                        log,
                        "failed to deliver message to session {} (channel closed)",
                        target
                    );
                }
            }
            None => sink_warn!(log, "no session {} to deliver outgoing message", target),
        }
    }
}
