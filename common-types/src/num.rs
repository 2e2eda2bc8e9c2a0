use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// A state sequence number (§3: `old_num`, `new_num`, `ack_num`,
/// `throwaway_num`). `0` is the sentinel reserved for the canonical empty
/// state that both `sent_states` and `received_states` start with (I1).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Serialize, Deserialize)]
pub struct StateNum(u64);

impl StateNum {
    pub const ZERO: StateNum = StateNum(0);

    pub fn new(n: u64) -> Self {
        StateNum(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The next state number after this one. Saturates rather than wraps:
    /// a session that manages to send `u64::MAX` instructions has bigger
    /// problems than this overflow check.
    pub fn next(self) -> Self {
        StateNum(self.0.saturating_add(1))
    }
}

impl From<u64> for StateNum {
    fn from(n: u64) -> Self {
        StateNum(n)
    }
}

impl From<StateNum> for u64 {
    fn from(n: StateNum) -> Self {
        n.0
    }
}

impl fmt::Debug for StateNum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for StateNum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_zero() {
        assert!(StateNum::ZERO.is_zero());
        assert_eq!(StateNum::ZERO.get(), 0);
    }

    #[test]
    fn ordering_matches_wrapped_integer() {
        let a = StateNum::new(3);
        let b = StateNum::new(4);
        assert!(a < b);
        assert_eq!(a.next(), b);
    }
}
