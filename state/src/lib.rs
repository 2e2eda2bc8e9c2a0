//! The contract a replicated state must satisfy (§4.1), plus the two
//! concrete states this workspace ships: an append-only keystroke buffer
//! and a cell-grid terminal framebuffer.

mod error;
mod keystroke;
mod termstate;

pub use error::ApplyError;
pub use keystroke::KeystrokeState;
pub use termstate::{Cell, TerminalState};

/// Any state the transport replicates must implement this. Diffs are
/// opaque to the transport: it only ever stores, forwards, and eventually
/// applies the bytes `diff_from` produces.
pub trait State: Sized {
    /// Encode a delta such that `existing.apply_string(&diff)` yields a
    /// state equal to `self`. `length_limit` caps the encoded size; the
    /// result may then be a prefix of the full diff, not the whole thing —
    /// callers are expected to complete it over subsequent calls.
    fn diff_from(&self, existing: &Self, length_limit: Option<usize>) -> Vec<u8>;

    /// The delta from the canonical empty state to `self`.
    fn init_diff(&self) -> Vec<u8>;

    /// Mutate in place by applying a delta produced by `diff_from` on any
    /// peer running the same protocol version.
    fn apply_string(&mut self, diff: &[u8]) -> Result<(), ApplyError>;

    /// Structural equality.
    fn equal(&self, other: &Self) -> bool;

    /// Remove a known common prefix. Only the keystroke state has a
    /// meaningful use for this (dropping bytes the peer has confirmed);
    /// other states may implement it as a no-op.
    fn subtract(&mut self, prefix: &Self);
}
