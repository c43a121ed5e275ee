use super::NegotiationError;

/// Connection-establishment capabilities supplied by the platform.
///
/// Payloads are opaque blobs (session descriptions, path candidates); the
/// driver only moves them between this trait and the relay.
pub trait Negotiator {
    /// Create a local offer and install it; returns the offer to send.
    fn create_offer(&mut self) -> Result<Vec<u8>, NegotiationError>;

    /// Apply a remote offer and produce the local answer to send back.
    fn accept_offer(&mut self, offer: &[u8]) -> Result<Vec<u8>, NegotiationError>;

    /// Apply the remote answer to our earlier offer.
    fn apply_answer(&mut self, answer: &[u8]) -> Result<(), NegotiationError>;

    /// Add a remote network path candidate.
    fn add_candidate(&mut self, candidate: &[u8]) -> Result<(), NegotiationError>;
}
