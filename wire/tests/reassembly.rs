use common_types::StateNum;
use wire::{Fragmenter, FragmentAssembly, Instruction};

fn instruction(new_num: u64, ack_num: u64, diff: Vec<u8>) -> Instruction {
    Instruction::new(StateNum::ZERO, StateNum::new(new_num), StateNum::new(ack_num), StateNum::ZERO, diff)
}

#[test]
fn mtu_77_single_fragment_round_trips_through_assembly() {
    let mut fragmenter = Fragmenter::new();
    let original = instruction(1, 0, b"hello world".to_vec());
    let fragments = fragmenter.make_fragments(&original, 77);
    assert_eq!(fragments.len(), 1);

    let mut assembly = FragmentAssembly::new();
    assert!(assembly.add_fragment(&fragments[0]));
    assert!(assembly.is_complete());
    assert_eq!(assembly.get_assembly().unwrap(), original);
}

#[test]
fn multi_fragment_reassembles_under_arbitrary_delivery_order() {
    let mut fragmenter = Fragmenter::new();
    let diff: Vec<u8> = (0u32..5000).map(|i| (i % 200) as u8).collect();
    let original = instruction(9, 0, diff);
    let mut fragments = fragmenter.make_fragments(&original, 180);
    assert!(fragments.len() > 3);

    // an arbitrary but fixed shuffle, not just reverse
    fragments.swap(0, fragments.len() - 1);
    fragments.rotate_right(2);

    let mut assembly = FragmentAssembly::new();
    for fragment in &fragments {
        assembly.add_fragment(fragment);
    }
    assert!(assembly.is_complete());
    assert_eq!(assembly.get_assembly().unwrap(), original);
}

#[test]
fn fragment_from_superseded_instruction_is_ignored() {
    let mut fragmenter = Fragmenter::new();
    let stale = instruction(5, 0, b"stale".to_vec());
    let stale_fragments = fragmenter.make_fragments(&stale, 1500);

    let current = instruction(6, 0, b"current".to_vec());
    let current_fragments = fragmenter.make_fragments(&current, 1500);

    let mut assembly = FragmentAssembly::new();
    assembly.add_fragment(&current_fragments[0]);
    assert!(!assembly.add_fragment(&stale_fragments[0]));
    assert_eq!(assembly.get_assembly().unwrap(), current);
}

#[test]
fn add_fragment_after_completion_is_rejected_until_a_newer_id_arrives() {
    let mut fragmenter = Fragmenter::new();
    let first = instruction(1, 0, b"first".to_vec());
    let first_fragments = fragmenter.make_fragments(&first, 1500);

    let mut assembly = FragmentAssembly::new();
    assembly.add_fragment(&first_fragments[0]);
    assert!(assembly.is_complete());
    assert!(!assembly.add_fragment(&first_fragments[0]));

    let second = instruction(2, 1, b"second".to_vec());
    let second_fragments = fragmenter.make_fragments(&second, 1500);
    assert!(assembly.add_fragment(&second_fragments[0]));
    assert_eq!(assembly.get_assembly().unwrap(), second);
}

#[test]
fn ack_only_followups_skip_compression_but_still_round_trip() {
    let mut fragmenter = Fragmenter::new();
    let base = instruction(1, 0, vec![b'x'; 64]);
    fragmenter.make_fragments(&base, 1500);

    let ack_only = instruction(1, 1, vec![b'x'; 64]);
    let fragments = fragmenter.make_fragments(&ack_only, 1500);

    let mut assembly = FragmentAssembly::new();
    assembly.add_fragment(&fragments[0]);
    assert!(assembly.is_complete());
    assert_eq!(assembly.get_assembly().unwrap(), ack_only);
}
