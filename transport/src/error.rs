use std::error::Error;
use std::fmt;

use common_types::StateNum;

/// A single inbound instruction was rejected or couldn't be applied; the
/// connection itself is still fine (§4.5 step 4).
#[derive(Debug)]
pub enum DatagramError {
    ProtocolVersionMismatch { expected: u32, got: u32 },
    Apply(state::ApplyError),
}

impl fmt::Display for DatagramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatagramError::ProtocolVersionMismatch { expected, got } => {
                write!(f, "protocol version mismatch: expected {expected}, got {got}")
            }
            DatagramError::Apply(e) => write!(f, "diff did not apply: {e}"),
        }
    }
}

impl Error for DatagramError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DatagramError::ProtocolVersionMismatch { .. } => None,
            DatagramError::Apply(e) => Some(e),
        }
    }
}

impl From<state::ApplyError> for DatagramError {
    fn from(e: state::ApplyError) -> Self {
        DatagramError::Apply(e)
    }
}

/// The session as a whole is unrecoverable in its current form and must be
/// reset (§4.4 "on inbound ack", §5 hard-cap policy).
#[derive(Debug)]
pub enum SessionError {
    PeerReferencesPrunedBaseline { ack_num: StateNum },
    SentStatesOverflow { len: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::PeerReferencesPrunedBaseline { ack_num } => {
                write!(f, "peer acked state {ack_num} which we no longer have a baseline for")
            }
            SessionError::SentStatesOverflow { len } => {
                write!(f, "sent_states grew to {len} entries with no ack progress")
            }
        }
    }
}

impl Error for SessionError {}
