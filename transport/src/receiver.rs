use common_types::StateNum;
use state::State;
use wire::Instruction;

use crate::error::DatagramError;
use crate::history::StateHistory;

/// What happened to one inbound `Instruction` (§4.5). In every case the
/// caller should forward `ack_num()` to the local `Sender::on_ack_received`
/// — even a stale or baseline-missing datagram still carries a valid ack.
#[derive(Debug, Eq, PartialEq)]
pub enum ReceiveOutcome {
    Applied { ack_num: StateNum },
    Stale { ack_num: StateNum },
    BaselineMissing { ack_num: StateNum },
}

impl ReceiveOutcome {
    pub fn ack_num(&self) -> StateNum {
        match *self {
            ReceiveOutcome::Applied { ack_num }
            | ReceiveOutcome::Stale { ack_num }
            | ReceiveOutcome::BaselineMissing { ack_num } => ack_num,
        }
    }
}

/// The remote half of the synchronized-state transport (§4.5). Owns
/// `received_states`, starting at the canonical empty state, and the last
/// time any authenticated datagram was heard.
pub struct Receiver<S> {
    received_states: StateHistory<S>,
    last_heard_ms: u64,
}

/// "[connection lost]" banner threshold (§7): silence past this long is
/// surfaced to the user, distinct from the much longer hard-kill timeout the
/// user configures separately.
const STALE_AFTER_MS: u64 = 6_000;

impl<S: State + Clone> Receiver<S> {
    pub fn new(initial_state: S) -> Self {
        Receiver { received_states: StateHistory::new(initial_state), last_heard_ms: 0 }
    }

    pub fn newest_num(&self) -> StateNum {
        self.received_states.newest().num
    }

    pub fn get_latest_state(&self) -> &S {
        &self.received_states.newest().state
    }

    /// The wall time the newest received state was recorded at — the
    /// `server_time_ms` a prediction engine reconciles against (§4.6).
    pub fn newest_state_time_ms(&self) -> u64 {
        self.received_states.newest().time_ms
    }

    /// Our own floor: the lowest `num` we still hold. Advertised to the
    /// peer as the `throwaway_num` on our next outgoing `Instruction`, so
    /// it knows it need not keep baselines we can no longer serve (§4.5).
    pub fn throwaway_floor(&self) -> StateNum {
        self.received_states.lowest_retained_num()
    }

    /// Call whenever *any* authenticated datagram arrives, whether or not
    /// its fragment reassembly has completed yet (§4.5 step 2).
    pub fn note_heard(&mut self, now_ms: u64) {
        self.last_heard_ms = now_ms;
    }

    pub fn is_stale(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_heard_ms) > STALE_AFTER_MS
    }

    /// Applies one decoded, protocol-version-checked `Instruction` (§4.5
    /// steps 4-8). Steps 1-3 (auth, timestamp/RTT, fragment reassembly)
    /// happen in the caller before this is reached.
    pub fn on_instruction(&mut self, now_ms: u64, instruction: &Instruction) -> Result<ReceiveOutcome, DatagramError> {
        if !instruction.matches_protocol_version() {
            return Err(DatagramError::ProtocolVersionMismatch {
                expected: common_types::PROTOCOL_VERSION,
                got: instruction.protocol_version,
            });
        }

        let ack_num = instruction.ack_num;

        if instruction.new_num <= self.newest_num() {
            log::debug!("dropping stale instruction new_num={:?}, already at {:?}", instruction.new_num, self.newest_num());
            return Ok(ReceiveOutcome::Stale { ack_num });
        }

        let baseline = match self.received_states.find_exact(instruction.old_num) {
            Some(entry) => entry.clone(),
            None => {
                log::debug!("dropping instruction whose baseline {:?} we no longer hold", instruction.old_num);
                return Ok(ReceiveOutcome::BaselineMissing { ack_num });
            }
        };

        let mut applied = baseline.state.clone();
        applied.apply_string(&instruction.diff)?;
        self.received_states.push(now_ms, instruction.new_num, applied);
        self.received_states.prune_below(instruction.throwaway_num);

        Ok(ReceiveOutcome::Applied { ack_num })
    }
}
