#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Two peers go from "join a room" to "file delivered" with a scripted
//! negotiator and an in-memory data channel.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use deepdrop::log::NoopLogSink;
use deepdrop::negotiation::{Negotiation, NegotiationError, NegotiationState, Negotiator, send_all};
use deepdrop::relay::RelayServer;
use deepdrop::relay_client::{RelayClient, RelayEvent};
use deepdrop::transfer::{
    FileSource, PeerChannel, TransferConfig, TransferEvent, TransferSender, memory_channel_pair,
};

#[derive(Default)]
struct Scripted;

impl Negotiator for Scripted {
    fn create_offer(&mut self) -> Result<Vec<u8>, NegotiationError> {
        Ok(b"offer".to_vec())
    }
    fn accept_offer(&mut self, offer: &[u8]) -> Result<Vec<u8>, NegotiationError> {
        if offer != b"offer" {
            return Err(NegotiationError::Malformed("offer"));
        }
        Ok(b"answer".to_vec())
    }
    fn apply_answer(&mut self, _answer: &[u8]) -> Result<(), NegotiationError> {
        Ok(())
    }
    fn add_candidate(&mut self, _candidate: &[u8]) -> Result<(), NegotiationError> {
        Ok(())
    }
}

fn pump(client: &RelayClient, driver: &mut Negotiation<Scripted>) {
    while let Some(ev) = client.recv_timeout(Duration::from_millis(50)) {
        if ev == RelayEvent::Disconnected {
            break;
        }
        let out = driver.on_event(&ev);
        send_all(client, out).unwrap();
    }
}

#[test]
fn join_negotiate_and_send_a_file() {
    let server = RelayServer::bind_no_log("127.0.0.1:0").unwrap();
    let addr = server.local_addr().unwrap().to_string();
    thread::spawn(move || {
        let _ = server.run();
    });

    let alice = RelayClient::connect(&addr).unwrap();
    let bob = RelayClient::connect(&addr).unwrap();
    let log = Arc::new(NoopLogSink);
    let mut a = Negotiation::new(alice.session_id().clone(), Scripted, log.clone());
    let mut b = Negotiation::new(bob.session_id().clone(), Scripted, log.clone());

    alice.join("room-42").unwrap();
    bob.join("room-42").unwrap();

    let deadline = Instant::now() + Duration::from_secs(3);
    while (a.state() != NegotiationState::Established || b.state() != NegotiationState::Established)
        && Instant::now() < deadline
    {
        pump(&alice, &mut a);
        pump(&bob, &mut b);
    }
    assert_eq!(a.state(), NegotiationState::Established);
    assert_eq!(b.state(), NegotiationState::Established);
    assert_ne!(a.role(), b.role());

    // The "direct" channel is now up.
    let (to_bob, at_bob) = memory_channel_pair();
    let cfg = TransferConfig::default();
    let mut sender = TransferSender::new(to_bob, &cfg, log.clone());
    let mut inbox = PeerChannel::new(alice.session_id().clone(), &cfg, log);

    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 256) as u8).collect();
    sender.send_chat("incoming!").unwrap();
    sender
        .send_file(&FileSource::from_bytes("data.bin", payload.clone()), |_| {}, || {})
        .unwrap();

    let mut chat = None;
    let mut delivered = None;
    while let Some(msg) = at_bob.recv_timeout(Duration::from_millis(100)) {
        for ev in inbox.on_message(&msg, Instant::now()) {
            match ev {
                TransferEvent::Chat { text, .. } => chat = Some(text),
                TransferEvent::Delivered(file) => delivered = Some(file),
                TransferEvent::Failed { error, .. } => panic!("transfer failed: {error}"),
                _ => {}
            }
        }
    }

    assert_eq!(chat.as_deref(), Some("incoming!"));
    let file = delivered.expect("file delivered");
    assert_eq!(&file.peer, alice.session_id());
    assert_eq!(file.data.len(), payload.len());
    assert_eq!(&file.data[..], &payload[..]);
}
