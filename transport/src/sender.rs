use common_types::StateNum;
use state::State;
use wire::Instruction;

use crate::error::SessionError;
use crate::history::{StateHistory, HARD_CAP};

/// The local half of the synchronized-state transport (§4.4). Owns the
/// live `current_state` and the history of everything sent so diffs can be
/// computed against whatever baseline the peer is assumed to hold.
pub struct Sender<S> {
    current_state: S,
    sent_states: StateHistory<S>,
    assumed_receiver_num: StateNum,
    next_new_num: u64,
    last_send_time_ms: u64,
}

impl<S: State + Clone> Sender<S> {
    pub fn new(initial_state: S) -> Self {
        Sender {
            current_state: initial_state.clone(),
            sent_states: StateHistory::new(initial_state),
            assumed_receiver_num: StateNum::ZERO,
            next_new_num: 0,
            last_send_time_ms: 0,
        }
    }

    pub fn set_current_state(&mut self, state: S) {
        self.current_state = state;
    }

    pub fn current_state(&self) -> &S {
        &self.current_state
    }

    pub fn last_send_time_ms(&self) -> u64 {
        self.last_send_time_ms
    }

    /// Builds the next `Instruction` to send, if anything has changed or a
    /// heartbeat is due, and records it into `sent_states` (§4.4 steps 1-7).
    /// Fragmenting, sealing, and transmitting the result is the caller's
    /// job — this method only decides *what* to send.
    pub fn tick(
        &mut self,
        now_ms: u64,
        mtu: usize,
        peer_newest_num: StateNum,
        peer_throwaway_num: StateNum,
        heartbeat_due: bool,
    ) -> Result<Option<Instruction>, SessionError> {
        let tail = self.sent_states.newest();
        if self.current_state.equal(&tail.state) && !heartbeat_due {
            return Ok(None);
        }

        let assumed = self
            .sent_states
            .find_exact(self.assumed_receiver_num)
            .expect("assumed_receiver_num always points at a retained entry")
            .clone();

        let diff_limit = diff_limit_for_mtu(mtu);
        let diff = self.current_state.diff_from(&assumed.state, Some(diff_limit));

        if diff.is_empty() && self.current_state.equal(&assumed.state) {
            if !heartbeat_due {
                return Ok(None);
            }
            // A heartbeat carries no state change at all: it reuses the
            // existing baseline as both old_num and new_num, and records
            // nothing new (§4.4 step 3).
            let heartbeat = Instruction::new(assumed.num, assumed.num, peer_newest_num, peer_throwaway_num, diff);
            self.last_send_time_ms = now_ms;
            return Ok(Some(heartbeat));
        }

        self.next_new_num += 1;
        let new_num = StateNum::new(self.next_new_num);

        // The recorded state at `new_num` is exactly baseline + diff, which
        // may be a capped prefix of `current_state` when the diff didn't
        // fit in one fragment — not `current_state` itself. A later tick
        // picks up where this one left off once the baseline advances.
        let mut recorded_state = assumed.state.clone();
        recorded_state
            .apply_string(&diff)
            .expect("a diff produced by diff_from always applies cleanly to its own baseline");

        let instruction = Instruction::new(assumed.num, new_num, peer_newest_num, peer_throwaway_num, diff);

        self.sent_states.push(now_ms, new_num, recorded_state);
        self.last_send_time_ms = now_ms;
        self.sent_states.prune_keep_floor_and_future(self.assumed_receiver_num);

        if self.sent_states.len() > HARD_CAP {
            return Err(SessionError::SentStatesOverflow { len: self.sent_states.len() });
        }

        Ok(Some(instruction))
    }

    /// Advance the assumed receiver baseline once the peer acks `ack_num`.
    /// Fails if we've already pruned every entry at or below it — that
    /// direction of the session cannot continue without a reset.
    pub fn on_ack_received(&mut self, ack_num: StateNum) -> Result<(), SessionError> {
        match self.sent_states.find_floor(ack_num) {
            Some(entry) => {
                self.assumed_receiver_num = entry.num;
                Ok(())
            }
            None => Err(SessionError::PeerReferencesPrunedBaseline { ack_num }),
        }
    }

    /// Reset after a `SessionError`: re-synchronize from the canonical
    /// empty state at `num = 0` (§4.4 "on inbound ack").
    pub fn reset(&mut self) {
        log::info!("resetting send history to the current state at num=0");
        let current = self.current_state.clone();
        self.sent_states.reset_to(current);
        self.assumed_receiver_num = StateNum::ZERO;
    }
}

fn diff_limit_for_mtu(mtu: usize) -> usize {
    mtu.saturating_sub(wire::HEADER_LEN + wire::FRAGMENT_HEADER_LEN).max(1)
}
