use std::fmt;
use std::io;

use crypto::NonceOverflowError;
use transport::SessionError;

/// A failure the orchestrator loop itself cannot recover from: a socket
/// fault, a session-fatal transport error, or nonce exhaustion. Per-datagram
/// faults never reach here — they are logged and dropped where they occur
/// (§7).
#[derive(Debug)]
pub enum OrchestratorError {
    Socket(io::Error),
    Session(SessionError),
    NonceExhausted(NonceOverflowError),
    /// A session-fatal condition that isn't a `SessionError` in its own
    /// right (e.g. a protocol version mismatch) ended the loop.
    SessionEnded(String),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::Socket(e) => write!(f, "socket error: {e}"),
            OrchestratorError::Session(e) => write!(f, "session error: {e}"),
            OrchestratorError::NonceExhausted(e) => write!(f, "{e}"),
            OrchestratorError::SessionEnded(reason) => write!(f, "session ended: {reason}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrchestratorError::Socket(e) => Some(e),
            OrchestratorError::Session(e) => Some(e),
            OrchestratorError::NonceExhausted(e) => Some(e),
            OrchestratorError::SessionEnded(_) => None,
        }
    }
}

impl From<io::Error> for OrchestratorError {
    fn from(e: io::Error) -> Self {
        OrchestratorError::Socket(e)
    }
}

impl From<SessionError> for OrchestratorError {
    fn from(e: SessionError) -> Self {
        OrchestratorError::Session(e)
    }
}

impl From<NonceOverflowError> for OrchestratorError {
    fn from(e: NonceOverflowError) -> Self {
        OrchestratorError::NonceExhausted(e)
    }
}
