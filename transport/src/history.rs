use common_types::StateNum;

/// One snapshot in a state's history, stamped with the wall time it was
/// recorded (§3, §4.4).
#[derive(Clone, Debug)]
pub struct TimestampedState<S> {
    pub time_ms: u64,
    pub num: StateNum,
    pub state: S,
}

/// A bounded, num-ordered history of snapshots, shared by `sent_states` and
/// `received_states` (§4.4, §4.5). Always starts with a `num = 0` sentinel
/// pointing at the canonical empty state.
pub struct StateHistory<S> {
    entries: Vec<TimestampedState<S>>,
}

/// Past this many retained entries with no ack progress, the peer is
/// presumed unresponsive or malicious; the session resets (§5).
pub const HARD_CAP: usize = 256;

impl<S: Clone> StateHistory<S> {
    pub fn new(initial_state: S) -> Self {
        StateHistory { entries: vec![TimestampedState { time_ms: 0, num: StateNum::ZERO, state: initial_state }] }
    }

    pub fn push(&mut self, time_ms: u64, num: StateNum, state: S) {
        self.entries.push(TimestampedState { time_ms, num, state });
    }

    pub fn newest(&self) -> &TimestampedState<S> {
        self.entries.last().expect("history always has at least the sentinel")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn find_exact(&self, num: StateNum) -> Option<&TimestampedState<S>> {
        self.entries.iter().find(|e| e.num == num)
    }

    /// The newest entry with `num <= target`, i.e. the best baseline a diff
    /// against `target` can be built from.
    pub fn find_floor(&self, target: StateNum) -> Option<&TimestampedState<S>> {
        self.entries.iter().rev().find(|e| e.num <= target)
    }

    /// Retain the `num = 0` sentinel, every entry newer than `ack`, and the
    /// newest entry with `num <= ack` (the new baseline); drop the rest
    /// (§4.4 step 7).
    pub fn prune_keep_floor_and_future(&mut self, ack: StateNum) {
        let floor_index = self.entries.iter().rposition(|e| e.num <= ack);
        let mut kept = Vec::with_capacity(self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.num.is_zero() || entry.num > ack || Some(i) == floor_index {
                kept.push(entry.clone());
            }
        }
        self.entries = kept;
    }

    /// Drop every entry with `num < threshold`, keeping the sentinel
    /// (§4.5 step 7).
    pub fn prune_below(&mut self, threshold: StateNum) {
        self.entries.retain(|e| e.num.is_zero() || e.num >= threshold);
    }

    pub fn reset_to(&mut self, initial_state: S) {
        self.entries = vec![TimestampedState { time_ms: 0, num: StateNum::ZERO, state: initial_state }];
    }

    /// The lowest retained `num` — advertised to the peer as our throwaway
    /// floor (§4.5).
    pub fn lowest_retained_num(&self) -> StateNum {
        self.entries.iter().map(|e| e.num).min().unwrap_or(StateNum::ZERO)
    }
}
