//! Primitives shared by every crate in the workspace: the state sequence
//! number, the protocol version, and a couple of small time helpers. Nothing
//! here is specific to crypto, wire encoding, or any one `State` impl.

mod num;
mod time;

pub use num::StateNum;
pub use time::{now_ms, wrapping_timestamp, wrapping_delay};

/// Bumped whenever the wire encoding of `Instruction` or `Fragment` changes
/// in a way that isn't backward compatible. Peers that disagree on this
/// refuse to apply each other's diffs (§6, §7 `ProtocolVersionMismatch`).
pub const PROTOCOL_VERSION: u32 = 2;
