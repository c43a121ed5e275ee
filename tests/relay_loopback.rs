#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::thread;
use std::time::Duration;

use deepdrop::relay::protocol::{SignalKind, SignalTarget};
use deepdrop::relay::{RelayServer, Role, SessionId, derive_role};
use deepdrop::relay_client::{RelayClient, RelayEvent};

const WAIT: Duration = Duration::from_secs(2);

fn start_relay() -> String {
    let server = RelayServer::bind_no_log("127.0.0.1:0").expect("bind relay");
    let addr = server.local_addr().expect("local addr").to_string();
    thread::spawn(move || {
        let _ = server.run();
    });
    addr
}

/// Next membership event, skipping anything else.
fn next_membership(client: &RelayClient) -> Vec<SessionId> {
    loop {
        match client.recv_timeout(WAIT) {
            Some(RelayEvent::Membership { members, .. }) => return members,
            Some(RelayEvent::Disconnected) | None => panic!("no membership update"),
            Some(_) => continue,
        }
    }
}

fn next_signal(client: &RelayClient) -> Option<deepdrop::relay::protocol::SignalEnvelope> {
    loop {
        match client.recv_timeout(Duration::from_millis(300)) {
            Some(RelayEvent::Signal(env)) => return Some(env),
            Some(RelayEvent::Disconnected) | None => return None,
            Some(_) => continue,
        }
    }
}

#[test]
fn two_peers_meet_and_exchange_signals() {
    let addr = start_relay();

    let c1 = RelayClient::connect(&addr).expect("c1 connects");
    let c2 = RelayClient::connect(&addr).expect("c2 connects");
    assert_ne!(c1.session_id(), c2.session_id());
    assert_eq!(c1.session_id().as_str().len(), 12);

    c1.join("abc").unwrap();
    assert_eq!(next_membership(&c1), vec![c1.session_id().clone()]);

    c2.join("abc").unwrap();
    let mut both = vec![c1.session_id().clone(), c2.session_id().clone()];
    both.sort();
    assert_eq!(next_membership(&c1), both);
    assert_eq!(next_membership(&c2), both);

    let (r1, p1) = derive_role(c1.session_id(), &both).unwrap();
    let (r2, p2) = derive_role(c2.session_id(), &both).unwrap();
    assert_ne!(r1, r2);
    assert!(matches!(r1, Role::Initiator | Role::Responder));
    assert_eq!(&p1, c2.session_id());
    assert_eq!(&p2, c1.session_id());

    c1.signal(
        SignalTarget::Peer(c2.session_id().clone()),
        SignalKind::Offer,
        b"v=0".to_vec(),
    )
    .unwrap();
    let env = next_signal(&c2).expect("offer forwarded");
    assert_eq!(env.kind, SignalKind::Offer);
    assert_eq!(&env.from, c1.session_id());
    assert_eq!(env.payload, b"v=0");

    c2.signal(SignalTarget::Room, SignalKind::Candidate, b"cand".to_vec())
        .unwrap();
    let env = next_signal(&c1).expect("room candidate forwarded");
    assert_eq!(&env.from, c2.session_id());
    assert!(next_signal(&c2).is_none(), "sender must not get its own signal");
}

#[test]
fn signal_to_departed_peer_is_dropped() {
    let addr = start_relay();

    let c1 = RelayClient::connect(&addr).expect("c1 connects");
    let c2 = RelayClient::connect(&addr).expect("c2 connects");
    let gone = c2.session_id().clone();
    c2.disconnect();
    drop(c2);
    thread::sleep(Duration::from_millis(100));

    c1.signal(SignalTarget::Peer(gone), SignalKind::Answer, b"late".to_vec())
        .unwrap();

    // The relay stays healthy and answers pings afterwards.
    c1.ping(77).unwrap();
    loop {
        match c1.recv_timeout(WAIT) {
            Some(RelayEvent::Pong { nonce }) => {
                assert_eq!(nonce, 77);
                break;
            }
            Some(RelayEvent::Signal(env)) => panic!("unexpected signal {:?}", env),
            Some(RelayEvent::Disconnected) | None => panic!("relay went away"),
            Some(_) => continue,
        }
    }
}
