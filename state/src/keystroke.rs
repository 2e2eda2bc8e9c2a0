use crate::{ApplyError, State};

/// An append-only buffer of bytes typed by the user. Diffs are just the
/// appended suffix; there is no richer structure to compute (§4.1).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KeystrokeState {
    bytes: Vec<u8>,
}

impl KeystrokeState {
    pub fn new() -> Self {
        KeystrokeState { bytes: Vec::new() }
    }

    pub fn push_str(&mut self, input: &[u8]) {
        self.bytes.extend_from_slice(input);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl State for KeystrokeState {
    fn diff_from(&self, existing: &Self, length_limit: Option<usize>) -> Vec<u8> {
        let suffix = if existing.bytes.len() >= self.bytes.len() {
            &[][..]
        } else {
            &self.bytes[existing.bytes.len()..]
        };
        match length_limit {
            Some(limit) if suffix.len() > limit => suffix[..limit].to_vec(),
            _ => suffix.to_vec(),
        }
    }

    fn init_diff(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    fn apply_string(&mut self, diff: &[u8]) -> Result<(), ApplyError> {
        self.bytes.extend_from_slice(diff);
        Ok(())
    }

    fn equal(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }

    /// Drop a confirmed prefix — used once the peer has acked the state
    /// that already contains it, so we stop re-sending what's landed.
    fn subtract(&mut self, prefix: &Self) {
        if self.bytes.starts_with(&prefix.bytes) {
            self.bytes.drain(0..prefix.bytes.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_from_empty_is_init_diff() {
        let mut state = KeystrokeState::new();
        state.push_str(b"ls\n");
        assert_eq!(state.diff_from(&KeystrokeState::new(), None), state.init_diff());
    }

    #[test]
    fn diff_from_prior_state_is_the_appended_suffix() {
        let mut existing = KeystrokeState::new();
        existing.push_str(b"ls");
        let mut current = existing.clone();
        current.push_str(b" -la\n");
        assert_eq!(current.diff_from(&existing, None), b" -la\n");
    }

    #[test]
    fn diff_from_respects_length_limit() {
        let mut current = KeystrokeState::new();
        current.push_str(b"0123456789");
        let diff = current.diff_from(&KeystrokeState::new(), Some(4));
        assert_eq!(diff, b"0123");
    }

    #[test]
    fn apply_string_round_trips_with_diff_from() {
        let mut existing = KeystrokeState::new();
        existing.push_str(b"hello");
        let mut current = existing.clone();
        current.push_str(b" world");

        let diff = current.diff_from(&existing, None);
        let mut reconstructed = existing.clone();
        reconstructed.apply_string(&diff).unwrap();
        assert!(reconstructed.equal(&current));
    }

    #[test]
    fn subtract_drops_confirmed_prefix() {
        let mut confirmed = KeystrokeState::new();
        confirmed.push_str(b"ls\n");
        let mut current = confirmed.clone();
        current.push_str(b"pwd\n");

        current.subtract(&confirmed);
        assert_eq!(current.as_bytes(), b"pwd\n");
    }
}
