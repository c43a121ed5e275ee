use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::relay::protocol::RelayMsg;

/// Internal identifier for an accepted TCP connection.
pub type ConnId = u64;

/// Room identifier chosen by the client.
pub type RoomId = String;

/// Length of relay-assigned session identifiers.
pub const SESSION_ID_LEN: usize = 12;

/// Relay-assigned identity of one connected client.
///
/// Ordered lexicographically; role derivation depends on that order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random lowercase alphanumeric id of [`SESSION_ID_LEN`] characters.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id: String = rng
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A message the relay wants delivered to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMsg {
    pub target: SessionId,
    pub msg: RelayMsg,
}

impl OutgoingMsg {
    pub fn to(target: SessionId, msg: RelayMsg) -> Self {
        Self { target, msg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_have_fixed_length_and_charset() {
        let mut rng = rand::thread_rng();
        let id = SessionId::random(&mut rng);
        assert_eq!(id.as_str().len(), SESSION_ID_LEN);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn ids_order_lexicographically() {
        assert!(SessionId::from("abc") < SessionId::from("abd"));
        assert!(SessionId::from("a9") < SessionId::from("b0"));
    }
}
