use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// The underlying connection stack refused the operation.
    Rejected(String),
    /// A description or candidate could not be parsed.
    Malformed(&'static str),
    /// Called in a state where the operation makes no sense.
    InvalidState(&'static str),
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(why) => write!(f, "negotiation rejected: {why}"),
            Self::Malformed(what) => write!(f, "malformed {what}"),
            Self::InvalidState(what) => write!(f, "invalid state: {what}"),
        }
    }
}

impl std::error::Error for NegotiationError {}
