use std::{error, fmt};

/// The per-direction sequence space is exhausted. Fatal: the session must
/// abort rather than reuse a nonce (§4.2, §7).
#[derive(Debug)]
pub struct NonceOverflowError;

impl fmt::Display for NonceOverflowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "nonce sequence exhausted, session must abort")
    }
}

impl error::Error for NonceOverflowError {}

/// A datagram failed to open: the tag didn't verify, the embedded sequence
/// was a replay or too old for the reorder window, or the direction bit
/// didn't match what we expect from this peer. Callers drop the datagram
/// and keep listening (§7).
#[derive(Debug)]
pub enum AuthError {
    TagMismatch,
    Replayed,
    TooOld,
    WrongDirection,
    Truncated,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::TagMismatch => write!(f, "authentication tag did not verify"),
            AuthError::Replayed => write!(f, "nonce sequence already seen"),
            AuthError::TooOld => write!(f, "nonce sequence too far behind the reorder window"),
            AuthError::WrongDirection => write!(f, "nonce direction bit does not match the peer"),
            AuthError::Truncated => write!(f, "datagram shorter than nonce + tag"),
        }
    }
}

impl error::Error for AuthError {}
