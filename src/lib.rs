//! Orchestrates one direction pair of the synchronized-state transport:
//! socket I/O, crypto, fragmentation, RTT tracking, and the sender/receiver
//! ticks that make up the event loop (§4.7 C8). The two binaries,
//! `tether-server` and `tether-client`, are thin wiring around this crate.

pub mod config;
mod error;
mod feed;
mod orchestrator;

pub use error::OrchestratorError;
pub use feed::FeedBytes;
pub use orchestrator::Orchestrator;
