use std::sync::Arc;

use super::Negotiator;
use crate::log::LogSink;
use crate::relay::protocol::{SignalEnvelope, SignalKind, SignalTarget};
use crate::relay::roles::{Role, derive_role};
use crate::relay::types::SessionId;
use crate::relay_client::{RelayClient, RelayClientError, RelayEvent};
use crate::{sink_debug, sink_info, sink_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// Fewer than two members in the room.
    Waiting,
    /// Initiator: offer sent, answer pending.
    AwaitingAnswer,
    /// Responder: peer known, offer pending.
    AwaitingOffer,
    /// Both descriptions are in place; candidates may still trickle.
    Established,
}

/// A signal the driver wants sent through the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundSignal {
    pub to: SignalTarget,
    pub kind: SignalKind,
    pub payload: Vec<u8>,
}

/// Offer/answer/candidate state machine for one peer pairing.
///
/// Negotiator failures are logged and the driver carries on; a later
/// membership change or signal can still make progress.
pub struct Negotiation<N: Negotiator> {
    me: SessionId,
    negotiator: N,
    state: NegotiationState,
    role: Option<Role>,
    peer: Option<SessionId>,
    remote_ready: bool,
    local_candidates: Vec<Vec<u8>>,
    remote_candidates: Vec<Vec<u8>>,
    log: Arc<dyn LogSink>,
}

impl<N: Negotiator> Negotiation<N> {
    pub fn new(me: SessionId, negotiator: N, log: Arc<dyn LogSink>) -> Self {
        Self {
            me,
            negotiator,
            state: NegotiationState::Waiting,
            role: None,
            peer: None,
            remote_ready: false,
            local_candidates: Vec::new(),
            remote_candidates: Vec::new(),
            log,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn peer(&self) -> Option<&SessionId> {
        self.peer.as_ref()
    }

    pub fn negotiator(&self) -> &N {
        &self.negotiator
    }

    /// Feed one relay event; returns the signals to send in response.
    pub fn on_event(&mut self, event: &RelayEvent) -> Vec<OutboundSignal> {
        match event {
            RelayEvent::Membership { members, .. } => self.on_membership(members),
            RelayEvent::Signal(env) => self.on_signal(env),
            RelayEvent::Joined { .. } | RelayEvent::Pong { .. } => Vec::new(),
            RelayEvent::Disconnected => {
                sink_warn!(self.log, "[negotiation] relay connection lost");
                Vec::new()
            }
        }
    }

    /// Re-derive the role from a fresh membership list.
    ///
    /// A new peer restarts negotiation; the same peer again changes nothing.
    pub fn on_membership(&mut self, members: &[SessionId]) -> Vec<OutboundSignal> {
        let Some((role, peer)) = derive_role(&self.me, members) else {
            sink_debug!(self.log, "[negotiation] waiting for a peer ({} members)", members.len());
            return Vec::new();
        };

        if self.peer.as_ref() == Some(&peer) {
            return Vec::new();
        }

        sink_info!(self.log, "[negotiation] paired with {} as {:?}", peer, role);
        self.role = Some(role);
        self.peer = Some(peer.clone());
        self.remote_ready = false;
        self.remote_candidates.clear();

        let mut out = Vec::new();
        match role {
            Role::Initiator => match self.negotiator.create_offer() {
                Ok(offer) => {
                    out.push(self.to_peer(&peer, SignalKind::Offer, offer));
                    self.state = NegotiationState::AwaitingAnswer;
                }
                Err(e) => {
                    sink_warn!(self.log, "[negotiation] create offer failed: {}", e);
                    self.state = NegotiationState::Waiting;
                    // Forget the pairing so the next membership update retries.
                    self.peer = None;
                    return out;
                }
            },
            Role::Responder => self.state = NegotiationState::AwaitingOffer,
        }

        out.extend(self.flush_local_candidates());
        out
    }

    pub fn on_signal(&mut self, env: &SignalEnvelope) -> Vec<OutboundSignal> {
        if let Some(peer) = &self.peer
            && *peer != env.from
        {
            sink_debug!(
                self.log,
                "[negotiation] ignoring {} from {} (peer is {})",
                env.kind.name(),
                env.from,
                peer
            );
            return Vec::new();
        }

        match env.kind {
            SignalKind::Offer => self.handle_offer(env),
            SignalKind::Answer => {
                self.handle_answer(env);
                Vec::new()
            }
            SignalKind::Candidate => {
                self.handle_remote_candidate(env.payload.clone());
                Vec::new()
            }
        }
    }

    /// A local path candidate was gathered. Sent now if the peer is known,
    /// otherwise held until pairing.
    pub fn local_candidate(&mut self, candidate: Vec<u8>) -> Vec<OutboundSignal> {
        self.local_candidates.push(candidate);
        self.flush_local_candidates()
    }

    // ---- Individual handlers ---------------------------------------------

    fn handle_offer(&mut self, env: &SignalEnvelope) -> Vec<OutboundSignal> {
        if self.role == Some(Role::Initiator) {
            sink_warn!(self.log, "[negotiation] initiator got an offer from {}; ignored", env.from);
            return Vec::new();
        }

        let mut out = Vec::new();
        if self.peer.is_none() {
            // Offer beat the membership update; adopt the sender.
            self.peer = Some(env.from.clone());
            self.role = Some(Role::Responder);
            out.extend(self.flush_local_candidates());
        }

        match self.negotiator.accept_offer(&env.payload) {
            Ok(answer) => {
                out.push(self.to_peer(&env.from, SignalKind::Answer, answer));
                self.state = NegotiationState::Established;
                self.remote_ready = true;
                self.flush_remote_candidates();
            }
            Err(e) => sink_warn!(self.log, "[negotiation] accepting offer failed: {}", e),
        }
        out
    }

    fn handle_answer(&mut self, env: &SignalEnvelope) {
        if self.state != NegotiationState::AwaitingAnswer {
            sink_warn!(
                self.log,
                "[negotiation] unexpected answer from {} in {:?}",
                env.from,
                self.state
            );
            return;
        }

        match self.negotiator.apply_answer(&env.payload) {
            Ok(()) => {
                self.state = NegotiationState::Established;
                self.remote_ready = true;
                self.flush_remote_candidates();
            }
            Err(e) => sink_warn!(self.log, "[negotiation] applying answer failed: {}", e),
        }
    }

    fn handle_remote_candidate(&mut self, candidate: Vec<u8>) {
        if !self.remote_ready {
            self.remote_candidates.push(candidate);
            return;
        }
        if let Err(e) = self.negotiator.add_candidate(&candidate) {
            sink_warn!(self.log, "[negotiation] adding candidate failed: {}", e);
        }
    }

    fn flush_remote_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.remote_candidates) {
            if let Err(e) = self.negotiator.add_candidate(&candidate) {
                sink_warn!(self.log, "[negotiation] adding queued candidate failed: {}", e);
            }
        }
    }

    fn flush_local_candidates(&mut self) -> Vec<OutboundSignal> {
        let Some(peer) = self.peer.clone() else {
            return Vec::new();
        };
        std::mem::take(&mut self.local_candidates)
            .into_iter()
            .map(|c| self.to_peer(&peer, SignalKind::Candidate, c))
            .collect()
    }

    fn to_peer(&self, peer: &SessionId, kind: SignalKind, payload: Vec<u8>) -> OutboundSignal {
        OutboundSignal {
            to: SignalTarget::Peer(peer.clone()),
            kind,
            payload,
        }
    }
}

/// Push the driver's output through a relay client.
pub fn send_all(
    client: &RelayClient,
    signals: Vec<OutboundSignal>,
) -> Result<(), RelayClientError> {
    for s in signals {
        client.signal(s.to, s.kind, s.payload)?;
    }
    Ok(())
}
