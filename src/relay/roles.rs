use crate::relay::types::SessionId;

/// Which side of the negotiation a session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Creates the data channel and sends the offer.
    Initiator,
    /// Waits for the offer and answers it.
    Responder,
}

/// Role of `me` given a room membership list, plus the chosen peer.
///
/// `None` while fewer than two members are present (or `me` is alone among
/// them). The peer is the smallest other member; within the pair the smaller
/// id responds and the larger initiates.
pub fn derive_role(me: &SessionId, members: &[SessionId]) -> Option<(Role, SessionId)> {
    if members.len() < 2 {
        return None;
    }

    let peer = members.iter().filter(|m| *m != me).min()?.clone();

    let role = if *me < peer {
        Role::Responder
    } else {
        Role::Initiator
    };

    Some((role, peer))
}
