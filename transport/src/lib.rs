//! The synchronized-state transport: bounded histories of sent and
//! received states (§4.4, §4.5), the sender's `tick()`, and the receiver's
//! `on_instruction()`.

mod error;
mod history;
mod receiver;
mod sender;

pub use error::{DatagramError, SessionError};
pub use history::{StateHistory, TimestampedState, HARD_CAP};
pub use receiver::{ReceiveOutcome, Receiver};
pub use sender::Sender;
