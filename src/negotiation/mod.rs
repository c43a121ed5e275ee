//! Peer-side negotiation: turns relay membership and signal events into calls
//! on an opaque [`Negotiator`] and outbound signals.

pub mod driver;
pub mod negotiation_error;
pub mod negotiator;

pub use driver::{Negotiation, NegotiationState, OutboundSignal, send_all};
pub use negotiation_error::NegotiationError;
pub use negotiator::Negotiator;
