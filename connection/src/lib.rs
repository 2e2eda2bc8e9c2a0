//! The connection owns the UDP socket, tracks the peer's roaming address,
//! and estimates round-trip time for send pacing (§4.7).

mod pacing;
mod rtt;
mod socket;

pub use pacing::{send_interval_ms, ACK_INTERVAL_MS, HEARTBEAT_INTERVAL_MS, SEND_INTERVAL_MAX_MS, SEND_INTERVAL_MIN_MS};
pub use rtt::RttEstimator;
pub use socket::RoamingSocket;
