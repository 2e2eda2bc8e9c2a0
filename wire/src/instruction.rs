use common_types::{StateNum, PROTOCOL_VERSION};
use serde_derive::{Deserialize, Serialize};

use crate::error::DecodeError;

/// The wire record carrying a state update (§3). `diff` is opaque to the
/// transport; `chaff` exists only to pad datagram sizes against traffic
/// analysis and is ignored on decode.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub protocol_version: u32,
    pub old_num: StateNum,
    pub new_num: StateNum,
    pub ack_num: StateNum,
    pub throwaway_num: StateNum,
    pub diff: Vec<u8>,
    pub chaff: Vec<u8>,
}

impl Instruction {
    pub fn new(old_num: StateNum, new_num: StateNum, ack_num: StateNum, throwaway_num: StateNum, diff: Vec<u8>) -> Self {
        Instruction {
            protocol_version: PROTOCOL_VERSION,
            old_num,
            new_num,
            ack_num,
            throwaway_num,
            diff,
            chaff: Vec::new(),
        }
    }

    /// A heartbeat carries no state change: `old_num == new_num` and an
    /// empty diff (§4.4 step 3).
    pub fn is_heartbeat(&self) -> bool {
        self.old_num == self.new_num && self.diff.is_empty()
    }

    pub fn matches_protocol_version(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }

    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("Instruction fields are all plain-old-data, serialization cannot fail")
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let inst = Instruction::new(1u64.into(), 2u64.into(), 1u64.into(), 0u64.into(), b"diff".to_vec());
        let decoded = Instruction::decode(&inst.encode()).unwrap();
        assert_eq!(inst, decoded);
    }

    #[test]
    fn heartbeat_has_equal_old_and_new_num_and_empty_diff() {
        let hb = Instruction::new(5u64.into(), 5u64.into(), 5u64.into(), 0u64.into(), Vec::new());
        assert!(hb.is_heartbeat());
    }

    #[test]
    fn mismatched_protocol_version_is_detected() {
        let mut inst = Instruction::new(0u64.into(), 1u64.into(), 0u64.into(), 0u64.into(), Vec::new());
        inst.protocol_version += 1;
        assert!(!inst.matches_protocol_version());
    }
}
