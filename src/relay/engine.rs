use std::collections::HashSet;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::log::{LogSink, NoopLogSink};
use crate::relay::protocol::{RelayMsg, SignalEnvelope, SignalTarget};
use crate::relay::registry::RoomRegistry;
use crate::relay::types::{OutgoingMsg, RoomId, SessionId};
use crate::{sink_debug, sink_info, sink_warn};

/// Attempts at drawing a fresh random id before falling back to a counter suffix.
const MAX_ID_ATTEMPTS: usize = 16;

/// Signaling relay state machine.
///
/// Pure message-in, messages-out: it never touches sockets. The server loop
/// owns exactly one of these.
pub struct SignalingRelay {
    live: HashSet<SessionId>,
    rooms: RoomRegistry,
    rng: StdRng,
    fallback_counter: u64,
    log: Arc<dyn LogSink>,
}

impl Default for SignalingRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalingRelay {
    pub fn new() -> Self {
        Self::with_log(Arc::new(NoopLogSink))
    }

    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self::with_rng(log, StdRng::from_entropy())
    }

    /// Deterministic ids, for tests.
    pub fn with_rng(log: Arc<dyn LogSink>, rng: StdRng) -> Self {
        Self {
            live: HashSet::new(),
            rooms: RoomRegistry::new(),
            rng,
            fallback_counter: 0,
            log,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.rooms
    }

    pub fn is_live(&self, session: &SessionId) -> bool {
        self.live.contains(session)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn alloc_session_id(&mut self) -> SessionId {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = SessionId::random(&mut self.rng);
            if !self.live.contains(&id) {
                return id;
            }
        }
        // Astronomically unlikely; keep ids unique anyway.
        loop {
            self.fallback_counter += 1;
            let id = SessionId::new(format!("s{:011}", self.fallback_counter));
            if !self.live.contains(&id) {
                return id;
            }
        }
    }

    /// A new connection was accepted: assign its id and greet it.
    pub fn handle_connect(&mut self) -> (SessionId, Vec<OutgoingMsg>) {
        let id = self.alloc_session_id();
        self.live.insert(id.clone());
        sink_info!(
            self.log,
            "session {} connected ({} live)",
            id,
            self.live.len()
        );
        let welcome = OutgoingMsg::to(
            id.clone(),
            RelayMsg::Welcome {
                session_id: id.clone(),
            },
        );
        (id, vec![welcome])
    }

    /// Main entrypoint: handle a message from a session.
    pub fn handle(&mut self, from: &SessionId, msg: RelayMsg) -> Vec<OutgoingMsg> {
        if !self.live.contains(from) {
            sink_warn!(
                self.log,
                "dropping {} from unknown session {}",
                msg.name(),
                from
            );
            return Vec::new();
        }

        match msg {
            RelayMsg::Join { room } => self.handle_join(from, room),
            RelayMsg::Signal(env) => self.handle_signal(from, env),
            RelayMsg::Ping { nonce } => {
                vec![OutgoingMsg::to(from.clone(), RelayMsg::Pong { nonce })]
            }
            RelayMsg::Pong { .. } => Vec::new(),
            RelayMsg::Welcome { .. } | RelayMsg::Joined { .. } | RelayMsg::Membership { .. } => {
                sink_warn!(
                    self.log,
                    "ignoring relay-only msg {} from session {}",
                    msg.name(),
                    from
                );
                Vec::new()
            }
        }
    }

    /// Connection closed: forget the session. Remaining members are not told.
    pub fn handle_disconnect(&mut self, session: &SessionId) -> Vec<OutgoingMsg> {
        if !self.live.remove(session) {
            return Vec::new();
        }

        match self.rooms.leave(session) {
            Some((room, remaining)) => sink_info!(
                self.log,
                "session {} left room {} ({} remaining)",
                session,
                room,
                remaining.len()
            ),
            None => sink_info!(self.log, "session {} disconnected", session),
        }

        Vec::new()
    }

    // ---- Individual handlers ---------------------------------------------

    fn handle_join(&mut self, from: &SessionId, room: RoomId) -> Vec<OutgoingMsg> {
        let members = self.rooms.join(&room, from);
        sink_info!(
            self.log,
            "session {} joined room {} ({} members)",
            from,
            room,
            members.len()
        );

        let mut out = Vec::with_capacity(members.len() + 1);
        out.push(OutgoingMsg::to(
            from.clone(),
            RelayMsg::Joined { room: room.clone() },
        ));

        for member in &members {
            out.push(OutgoingMsg::to(
                member.clone(),
                RelayMsg::Membership {
                    room: room.clone(),
                    members: members.clone(),
                },
            ));
        }
        out
    }

    fn handle_signal(&mut self, from: &SessionId, mut env: SignalEnvelope) -> Vec<OutgoingMsg> {
        env.from = from.clone();

        match env.to.clone() {
            SignalTarget::Peer(to) => {
                if !self.live.contains(&to) {
                    sink_debug!(
                        self.log,
                        "{} from {} to unknown session {} dropped",
                        env.kind.name(),
                        from,
                        to
                    );
                    return Vec::new();
                }
                vec![OutgoingMsg::to(to, RelayMsg::Signal(env))]
            }
            SignalTarget::Room => {
                let Some(room) = self.rooms.room_of(from).cloned() else {
                    sink_debug!(
                        self.log,
                        "{} from {} to room dropped: sender is in no room",
                        env.kind.name(),
                        from
                    );
                    return Vec::new();
                };
                self.rooms
                    .members_of(&room)
                    .into_iter()
                    .filter(|m| m != from)
                    .map(|m| OutgoingMsg::to(m, RelayMsg::Signal(env.clone())))
                    .collect()
            }
        }
    }
}
