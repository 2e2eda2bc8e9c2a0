//! The client's local-echo speculation layer (§4.6): an overlay of
//! predicted cells and cursor position, rendered ahead of server
//! confirmation and reconciled as authoritative state arrives.

mod adaptive;
mod mode;
mod overlay;

pub use adaptive::AdaptiveActivation;
pub use mode::{ParseModeError, PredictionMode};
pub use overlay::{Prediction, PredictionEngine};
