use crate::compression;
use crate::fragment::Fragment;
use crate::instruction::Instruction;

/// IP + UDP + crypto envelope overhead subtracted from the configured MTU
/// before computing how many payload bytes fit in one fragment (§4.3).
pub const HEADER_LEN: usize = 66;

/// Splits an encoded `Instruction` into MTU-sized `Fragment`s, optionally
/// compressing the body first. Remembers the last instruction it fragmented
/// so repeated ack-only updates can skip the (wasted) compression attempt
/// (§4.3, §9 SUPPLEMENTED).
pub struct Fragmenter {
    last_instruction: Option<Instruction>,
    last_mtu: Option<usize>,
}

impl Default for Fragmenter {
    fn default() -> Self {
        Fragmenter::new()
    }
}

impl Fragmenter {
    pub fn new() -> Self {
        Fragmenter { last_instruction: None, last_mtu: None }
    }

    pub fn last_ack_sent(&self) -> Option<common_types::StateNum> {
        self.last_instruction.as_ref().map(|i| i.ack_num)
    }

    pub fn make_fragments(&mut self, instruction: &Instruction, mtu: usize) -> Vec<Fragment> {
        let raw = instruction.encode();
        let marked = if self.is_ack_only_update(instruction) && raw.len() >= 16 {
            compression::mark_raw(raw)
        } else {
            compression::encode(&raw).expect("zlib encoding into an in-memory buffer cannot fail")
        };

        let fragments = split(instruction.new_num.get(), &marked, mtu);

        self.last_instruction = Some(instruction.clone());
        self.last_mtu = Some(mtu);
        fragments
    }

    fn is_ack_only_update(&self, instruction: &Instruction) -> bool {
        match &self.last_instruction {
            None => false,
            Some(prev) => {
                prev.protocol_version == instruction.protocol_version
                    && prev.old_num == instruction.old_num
                    && prev.new_num == instruction.new_num
                    && prev.throwaway_num == instruction.throwaway_num
                    && prev.diff == instruction.diff
                    && prev.chaff == instruction.chaff
                    && prev.ack_num != instruction.ack_num
            }
        }
    }
}

fn split(id: u64, marked_body: &[u8], mtu: usize) -> Vec<Fragment> {
    let payload_limit = mtu
        .saturating_sub(HEADER_LEN + crate::fragment::FRAGMENT_HEADER_LEN)
        .max(1);

    let chunks: Vec<&[u8]> = if marked_body.is_empty() {
        vec![&marked_body[..]]
    } else {
        marked_body.chunks(payload_limit).collect()
    };

    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| Fragment::new(id, i as u16, i + 1 == total, chunk.to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_types::StateNum;

    fn inst(old: u64, new: u64, ack: u64, diff: &[u8]) -> Instruction {
        Instruction::new(StateNum::new(old), StateNum::new(new), StateNum::new(ack), StateNum::new(0), diff.to_vec())
    }

    #[test]
    fn single_byte_diff_fits_one_fragment_at_small_mtu() {
        let mut fragmenter = Fragmenter::new();
        let fragments = fragmenter.make_fragments(&inst(0, 1, 0, b"x"), 77);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].final_fragment);
    }

    #[test]
    fn large_diff_forces_multiple_fragments() {
        let mut fragmenter = Fragmenter::new();
        let big_diff = vec![b'a'; 1000];
        let fragments = fragmenter.make_fragments(&inst(0, 1, 0, &big_diff), 200);
        assert!(fragments.len() > 1);
        assert!(fragments.last().unwrap().final_fragment);
        for f in &fragments[..fragments.len() - 1] {
            assert!(!f.final_fragment);
        }
    }

    #[test]
    fn fragment_ids_match_new_num() {
        let mut fragmenter = Fragmenter::new();
        let fragments = fragmenter.make_fragments(&inst(3, 7, 0, b"diff"), 200);
        assert!(fragments.iter().all(|f| f.id == 7));
    }

    #[test]
    fn ack_only_update_is_detected() {
        let mut fragmenter = Fragmenter::new();
        let first = inst(0, 1, 0, &vec![b'x'; 20]);
        fragmenter.make_fragments(&first, 1500);

        let ack_only = inst(0, 1, 1, &vec![b'x'; 20]);
        assert!(fragmenter.is_ack_only_update(&ack_only));

        let different_diff = inst(0, 1, 1, &vec![b'y'; 20]);
        assert!(!fragmenter.is_ack_only_update(&different_diff));
    }

    #[test]
    fn last_ack_sent_tracks_most_recent_instruction() {
        let mut fragmenter = Fragmenter::new();
        assert!(fragmenter.last_ack_sent().is_none());
        fragmenter.make_fragments(&inst(0, 1, 9, b"d"), 1500);
        assert_eq!(fragmenter.last_ack_sent(), Some(StateNum::new(9)));
    }
}
