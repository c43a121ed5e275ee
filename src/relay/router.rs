use std::collections::HashMap;
use std::sync::Arc;

use crate::log::{LogSink, NoopLogSink};
use crate::relay::engine::SignalingRelay;
use crate::relay::protocol::RelayMsg;
use crate::relay::types::{OutgoingMsg, SessionId};

/// Router glues the relay state machine to per-session outboxes.
pub struct Router {
    relay: SignalingRelay,
    outboxes: HashMap<SessionId, Vec<RelayMsg>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_log(Arc::new(NoopLogSink))
    }

    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self::with_relay(SignalingRelay::with_log(log))
    }

    pub fn with_relay(relay: SignalingRelay) -> Self {
        Self {
            relay,
            outboxes: HashMap::new(),
        }
    }

    /// Register a freshly accepted connection; returns the id the relay gave it.
    ///
    /// The Welcome for the new session is queued in its outbox.
    pub fn register_client(&mut self) -> SessionId {
        let (session, out_msgs) = self.relay.handle_connect();
        self.outboxes.entry(session.clone()).or_default();
        for out_msg in out_msgs {
            self.enqueue(out_msg);
        }
        session
    }

    /// Unregister a session: drop its outbox and let the relay forget it.
    pub fn unregister_client(&mut self, session: &SessionId) {
        self.outboxes.remove(session);

        let out_msgs = self.relay.handle_disconnect(session);
        for out_msg in out_msgs {
            self.enqueue(out_msg);
        }
    }

    /// Handle a message coming from a session and queue whatever it produces.
    pub fn handle_from_client(&mut self, from: &SessionId, msg: RelayMsg) {
        let out_msgs = self.relay.handle(from, msg);
        for out_msg in out_msgs {
            self.enqueue(out_msg);
        }
    }

    /// Drain and return all outgoing messages for one session.
    pub fn take_outgoing_for(&mut self, session: &SessionId) -> Vec<RelayMsg> {
        self.outboxes
            .get_mut(session)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Drain all pending outgoing messages as `(target, msg)` pairs.
    pub fn drain_all_outgoing(&mut self) -> Vec<(SessionId, RelayMsg)> {
        let mut result = Vec::new();
        for (sid, msgs) in self.outboxes.iter_mut() {
            for m in msgs.drain(..) {
                result.push((sid.clone(), m));
            }
        }
        result
    }

    pub fn relay(&self) -> &SignalingRelay {
        &self.relay
    }

    fn enqueue(&mut self, out_msg: OutgoingMsg) {
        // Targets the relay considers live always have an outbox.
        if let Some(queue) = self.outboxes.get_mut(&out_msg.target) {
            queue.push(out_msg.msg);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::relay::protocol::{SignalEnvelope, SignalKind, SignalTarget};

    #[test]
    fn welcome_join_and_offer_are_routed() {
        let mut router = Router::new();
        let s1 = router.register_client();
        let s2 = router.register_client();

        match &router.take_outgoing_for(&s1)[..] {
            [RelayMsg::Welcome { session_id }] => assert_eq!(session_id, &s1),
            other => panic!("expected Welcome for s1, got {:?}", other),
        }
        let _ = router.take_outgoing_for(&s2);

        router.handle_from_client(&s1, RelayMsg::Join { room: "abc".into() });
        router.handle_from_client(&s2, RelayMsg::Join { room: "abc".into() });

        let outs1 = router.take_outgoing_for(&s1);
        // Joined + Membership{s1} + Membership{s1,s2}
        assert_eq!(outs1.len(), 3);
        assert!(matches!(&outs1[0], RelayMsg::Joined { room } if room == "abc"));

        let _ = router.take_outgoing_for(&s2);

        let sdp = b"v=0\r\n".to_vec();
        router.handle_from_client(
            &s1,
            RelayMsg::Signal(SignalEnvelope {
                to: SignalTarget::Peer(s2.clone()),
                from: s1.clone(),
                kind: SignalKind::Offer,
                payload: sdp.clone(),
            }),
        );

        assert!(router.take_outgoing_for(&s1).is_empty());
        match &router.take_outgoing_for(&s2)[..] {
            [RelayMsg::Signal(env)] => {
                assert_eq!(env.kind, SignalKind::Offer);
                assert_eq!(env.payload, sdp);
            }
            other => panic!("expected forwarded Offer, got {:?}", other),
        }
    }

    #[test]
    fn drain_all_outgoing_collects_messages_for_all_sessions() {
        let mut router = Router::new();
        let s1 = router.register_client();
        let s2 = router.register_client();

        let mut outgoing = router.drain_all_outgoing();
        outgoing.sort_by(|a, b| a.0.cmp(&b.0));

        let mut expected = vec![s1, s2];
        expected.sort();
        let targets: Vec<_> = outgoing.iter().map(|(sid, _)| sid.clone()).collect();
        assert_eq!(targets, expected);

        assert!(router.drain_all_outgoing().is_empty());
    }

    #[test]
    fn unregistered_session_gets_nothing_queued() {
        let mut router = Router::new();
        let s1 = router.register_client();
        router.unregister_client(&s1);
        router.handle_from_client(&s1, RelayMsg::Ping { nonce: 1 });
        assert!(router.take_outgoing_for(&s1).is_empty());
        assert_eq!(router.relay().live_count(), 0);
    }
}
