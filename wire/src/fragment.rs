use byteorder::{BigEndian, ByteOrder};

use crate::error::MalformedFragment;

/// `8-byte id | 2-byte (fragment_num<<1 | final)` (§6).
pub const FRAGMENT_HEADER_LEN: usize = 8 + 2;

/// One MTU-sized piece of an `Instruction` (§3, §4.3).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fragment {
    pub id: u64,
    pub fragment_num: u16,
    pub final_fragment: bool,
    pub initialized: bool,
    pub contents: Vec<u8>,
}

impl Fragment {
    /// An empty, not-yet-populated fragment, matching the original source's
    /// sentinel default constructor (§3 SUPPLEMENTED).
    pub fn uninitialized() -> Self {
        Fragment { id: u64::MAX, fragment_num: u16::MAX, final_fragment: false, initialized: false, contents: Vec::new() }
    }

    pub fn new(id: u64, fragment_num: u16, final_fragment: bool, contents: Vec<u8>) -> Self {
        Fragment { id, fragment_num, final_fragment, initialized: true, contents }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAGMENT_HEADER_LEN + self.contents.len());
        let mut header = [0u8; FRAGMENT_HEADER_LEN];
        BigEndian::write_u64(&mut header[0..8], self.id);
        let packed_num = (self.fragment_num << 1) | (self.final_fragment as u16);
        BigEndian::write_u16(&mut header[8..10], packed_num);
        out.extend_from_slice(&header);
        out.extend_from_slice(&self.contents);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedFragment> {
        if bytes.len() < FRAGMENT_HEADER_LEN {
            return Err(MalformedFragment(format!(
                "fragment shorter than header ({} < {})",
                bytes.len(),
                FRAGMENT_HEADER_LEN
            )));
        }
        let id = BigEndian::read_u64(&bytes[0..8]);
        let packed_num = BigEndian::read_u16(&bytes[8..10]);
        let fragment_num = packed_num >> 1;
        let final_fragment = packed_num & 1 == 1;
        Ok(Fragment::new(id, fragment_num, final_fragment, bytes[FRAGMENT_HEADER_LEN..].to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let frag = Fragment::new(42, 3, true, b"payload".to_vec());
        let bytes = frag.to_bytes();
        let decoded = Fragment::from_bytes(&bytes).unwrap();
        assert_eq!(frag, decoded);
    }

    #[test]
    fn final_bit_is_the_low_bit_of_the_packed_field() {
        let non_final = Fragment::new(1, 5, false, Vec::new()).to_bytes();
        let final_frag = Fragment::new(1, 5, true, Vec::new()).to_bytes();
        assert_eq!(BigEndian::read_u16(&non_final[8..10]) & 1, 0);
        assert_eq!(BigEndian::read_u16(&final_frag[8..10]) & 1, 1);
    }

    #[test]
    fn rejects_short_input() {
        assert!(Fragment::from_bytes(&[0u8; 4]).is_err());
    }

    #[test]
    fn uninitialized_sentinel_matches_original_source_defaults() {
        let frag = Fragment::uninitialized();
        assert!(!frag.initialized);
        assert_eq!(frag.id, u64::MAX);
        assert_eq!(frag.fragment_num, u16::MAX);
    }
}
