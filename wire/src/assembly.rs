use crate::compression;
use crate::error::DecodeError;
use crate::fragment::Fragment;
use crate::instruction::Instruction;

/// Reassembles the fragments of one `Instruction` at a time (§4.3).
/// Fragments whose `id` is behind the one in progress are dropped; a
/// fragment whose `id` is ahead abandons whatever partial assembly was in
/// flight and starts fresh — there is no "old state wins".
pub struct FragmentAssembly {
    current_id: Option<u64>,
    fragments: Vec<Option<Vec<u8>>>,
    fragments_arrived: usize,
    fragments_total: Option<usize>,
    complete: bool,
}

impl Default for FragmentAssembly {
    fn default() -> Self {
        FragmentAssembly::new()
    }
}

impl FragmentAssembly {
    pub fn new() -> Self {
        FragmentAssembly { current_id: None, fragments: Vec::new(), fragments_arrived: 0, fragments_total: None, complete: false }
    }

    /// Feed one fragment in. Returns `true` if it was accepted into the
    /// current (possibly now-complete) assembly, `false` if it was dropped
    /// — either because it's behind `current_id`, or because the current
    /// assembly already completed and hasn't been reset by a newer `id`
    /// yet (§9's resolved Open Question).
    pub fn add_fragment(&mut self, fragment: &Fragment) -> bool {
        match self.current_id {
            Some(id) if fragment.id < id => {
                log::debug!("dropping fragment for superseded assembly id={}, current id={}", fragment.id, id);
                false
            }
            Some(id) if fragment.id > id => {
                log::debug!("new assembly id={} supersedes in-progress id={}, abandoning partial assembly", fragment.id, id);
                self.reset(fragment.id);
                self.insert(fragment)
            }
            Some(_) => {
                if self.complete {
                    false
                } else {
                    self.insert(fragment)
                }
            }
            None => {
                self.reset(fragment.id);
                self.insert(fragment)
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Consume the assembly once `is_complete()`, decoding the reassembled
    /// instruction. Does not reset the assembly — a later fragment with a
    /// new `id` will do that.
    pub fn get_assembly(&self) -> Result<Instruction, DecodeError> {
        let mut body = Vec::new();
        for slot in &self.fragments {
            body.extend_from_slice(slot.as_ref().expect("complete assembly has every slot filled"));
        }
        let decompressed = compression::decode(&body)?;
        Instruction::decode(&decompressed)
    }

    fn reset(&mut self, id: u64) {
        self.current_id = Some(id);
        self.fragments.clear();
        self.fragments_arrived = 0;
        self.fragments_total = None;
        self.complete = false;
    }

    fn insert(&mut self, fragment: &Fragment) -> bool {
        let index = fragment.fragment_num as usize;
        if self.fragments.len() <= index {
            self.fragments.resize(index + 1, None);
        }
        if self.fragments[index].is_none() {
            self.fragments_arrived += 1;
        }
        self.fragments[index] = Some(fragment.contents.clone());

        if fragment.final_fragment {
            self.fragments_total = Some(index + 1);
        }

        if let Some(total) = self.fragments_total {
            if self.fragments_arrived == total && self.fragments.iter().take(total).all(Option::is_some) {
                self.complete = true;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragmenter::Fragmenter;
    use common_types::StateNum;

    fn inst(diff: &[u8]) -> Instruction {
        Instruction::new(StateNum::ZERO, StateNum::new(1), StateNum::ZERO, StateNum::ZERO, diff.to_vec())
    }

    #[test]
    fn single_fragment_completes_immediately() {
        let mut fragmenter = Fragmenter::new();
        let fragments = fragmenter.make_fragments(&inst(b"hi"), 1500);
        let mut assembly = FragmentAssembly::new();
        assert!(assembly.add_fragment(&fragments[0]));
        assert!(assembly.is_complete());
        assert_eq!(assembly.get_assembly().unwrap(), inst(b"hi"));
    }

    #[test]
    fn reassembles_after_arbitrary_reorder() {
        let mut fragmenter = Fragmenter::new();
        let big_diff = (0..2000).map(|i| (i % 251) as u8).collect::<Vec<_>>();
        let original = inst(&big_diff);
        let mut fragments = fragmenter.make_fragments(&original, 150);
        assert!(fragments.len() >= 2);

        // reverse, then rotate: an arbitrary permutation
        fragments.reverse();
        fragments.rotate_left(1);

        let mut assembly = FragmentAssembly::new();
        for fragment in &fragments {
            assembly.add_fragment(fragment);
        }
        assert!(assembly.is_complete());
        assert_eq!(assembly.get_assembly().unwrap(), original);
    }

    #[test]
    fn fragment_behind_current_id_is_dropped() {
        let mut fragmenter = Fragmenter::new();
        let old_fragments = fragmenter.make_fragments(&inst(b"old"), 1500);
        let new_instruction = Instruction::new(StateNum::ZERO, StateNum::new(2), StateNum::ZERO, StateNum::ZERO, b"new".to_vec());
        let new_fragments = fragmenter.make_fragments(&new_instruction, 1500);

        let mut assembly = FragmentAssembly::new();
        assert!(assembly.add_fragment(&new_fragments[0]));
        assert!(!assembly.add_fragment(&old_fragments[0]));
        assert_eq!(assembly.get_assembly().unwrap(), new_instruction);
    }

    #[test]
    fn fragment_ahead_of_current_id_abandons_partial_assembly() {
        let mut fragmenter = Fragmenter::new();
        let big_diff = vec![b'a'; 2000];
        let partial_instruction = inst(&big_diff);
        let partial_fragments = fragmenter.make_fragments(&partial_instruction, 150);

        let next_instruction = Instruction::new(StateNum::ZERO, StateNum::new(2), StateNum::ZERO, StateNum::ZERO, b"small".to_vec());
        let next_fragments = fragmenter.make_fragments(&next_instruction, 1500);

        let mut assembly = FragmentAssembly::new();
        assembly.add_fragment(&partial_fragments[0]);
        assert!(!assembly.is_complete());

        assembly.add_fragment(&next_fragments[0]);
        assert!(assembly.is_complete());
        assert_eq!(assembly.get_assembly().unwrap(), next_instruction);
    }

    #[test]
    fn add_fragment_after_completion_returns_false_until_reset() {
        let mut fragmenter = Fragmenter::new();
        let fragments = fragmenter.make_fragments(&inst(b"hi"), 1500);
        let mut assembly = FragmentAssembly::new();
        assembly.add_fragment(&fragments[0]);
        assert!(assembly.is_complete());

        // re-delivering the same final fragment must not re-trigger anything
        assert!(!assembly.add_fragment(&fragments[0]));
    }
}
