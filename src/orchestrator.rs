use std::net::SocketAddr;
use std::time::Duration;

use common_types::{now_ms, wrapping_delay, wrapping_timestamp};
use connection::{send_interval_ms, RoamingSocket, RttEstimator, ACK_INTERVAL_MS, HEARTBEAT_INTERVAL_MS};
use crypto::{Envelope, Key, Role};
use log::{debug, error, warn};
use state::State;
use tokio::io::{AsyncRead, AsyncReadExt};
use transport::{DatagramError, ReceiveOutcome, Receiver, Sender};
use wire::{DatagramHeader, Fragment, FragmentAssembly, Fragmenter, Instruction};

use crate::error::OrchestratorError;
use crate::feed::FeedBytes;

/// Drives one direction pair of the synchronized-state transport (§4.7 C8):
/// reads datagrams off the socket, feeds them through reassembly and the
/// receiver, paces the sender's ticks, and writes outgoing datagrams back
/// out. `Local` is the state this end produces; `Remote` is the state it
/// replicates from the peer.
pub struct Orchestrator<Local, Remote>
where
    Local: State + Clone,
    Remote: State + Clone,
{
    socket: RoamingSocket,
    envelope: Envelope,
    fragmenter: Fragmenter,
    assembly: FragmentAssembly,
    rtt: RttEstimator,
    sender: Sender<Local>,
    receiver: Receiver<Remote>,
    mtu: usize,
    last_received_timestamp: u16,
    next_send_allowed_ms: u64,
    pending_ack_deadline_ms: Option<u64>,
    session_dead: Option<String>,
}

impl<Local, Remote> Orchestrator<Local, Remote>
where
    Local: State + Clone,
    Remote: State + Clone,
{
    pub fn new(socket: RoamingSocket, key: &Key, role: Role, mtu: usize, local_initial: Local, remote_initial: Remote) -> Self {
        Orchestrator {
            socket,
            envelope: Envelope::new(key, role),
            fragmenter: Fragmenter::new(),
            assembly: FragmentAssembly::new(),
            rtt: RttEstimator::new(),
            sender: Sender::new(local_initial),
            receiver: Receiver::new(remote_initial),
            mtu,
            last_received_timestamp: 0,
            next_send_allowed_ms: 0,
            pending_ack_deadline_ms: None,
            session_dead: None,
        }
    }

    pub fn set_initial_peer(&mut self, addr: SocketAddr) {
        self.socket.set_initial_peer(addr);
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.socket.peer_addr()
    }

    pub fn remote_state(&self) -> &Remote {
        self.receiver.get_latest_state()
    }

    pub fn srtt_ms(&self) -> f64 {
        self.rtt.srtt_ms()
    }

    /// The wall time the currently-displayed remote state was recorded at,
    /// for callers reconciling a prediction overlay against it (§4.6).
    pub fn remote_state_time_ms(&self) -> u64 {
        self.receiver.newest_state_time_ms()
    }

    /// Advisory staleness (§7): whether the peer has gone quiet long enough
    /// to warrant the "[connection lost]" banner. The banner itself is the
    /// binary's job, not this loop's.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        self.receiver.is_stale(now_ms)
    }

    pub fn is_session_dead(&self) -> bool {
        self.session_dead.is_some()
    }

    /// Run the event loop until `local_input` closes or a session-fatal
    /// error occurs. Each wake drains one pending datagram, or fires the
    /// pacing timer, or reads one chunk of local input; every iteration
    /// ends by calling `on_render` with the freshly reconciled remote state
    /// and the "[connection lost]" advisory flag (§4.7's "drain, tick,
    /// render", §7's staleness banner). `on_local_bytes` runs first, with
    /// the remote state as it stood before this chunk's effect on `Local`
    /// is folded in — a client layers its prediction engine here, the
    /// server passes a no-op.
    pub async fn run<L, R>(&mut self, mut local_input: impl AsyncRead + Unpin, mut on_local_bytes: L, mut on_render: R) -> Result<(), OrchestratorError>
    where
        Local: FeedBytes,
        L: FnMut(&[u8], &Remote),
        R: FnMut(&Remote, u64, bool),
    {
        let mut socket_buf = vec![0u8; 65536];
        let mut input_buf = [0u8; 4096];
        let mut pacing = tokio::time::interval(Duration::from_millis(connection::SEND_INTERVAL_MIN_MS));
        pacing.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut socket_buf) => {
                    match received {
                        Ok((n, from)) => self.on_datagram(now_ms(), &socket_buf[..n], from)?,
                        Err(e) => warn!("socket recv failed, retrying: {e}"),
                    }
                }
                _ = pacing.tick() => {
                    self.on_pacing_tick(now_ms()).await?;
                }
                read = local_input.read(&mut input_buf) => {
                    match read {
                        Ok(0) => return Ok(()),
                        Ok(n) => {
                            on_local_bytes(&input_buf[..n], self.remote_state());
                            let fed = self.sender.current_state().fed(&input_buf[..n]);
                            self.sender.set_current_state(fed);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }

            on_render(self.remote_state(), self.remote_state_time_ms(), self.is_stale(now_ms()));

            if let Some(reason) = self.session_dead.take() {
                return Err(OrchestratorError::SessionEnded(reason));
            }
        }
    }

    fn on_datagram(&mut self, now: u64, bytes: &[u8], from: SocketAddr) -> Result<(), OrchestratorError> {
        let plaintext = match self.envelope.decrypt(bytes) {
            Ok(p) => p,
            Err(e) => {
                debug!("dropping datagram that failed to authenticate: {e}");
                return Ok(());
            }
        };
        self.socket.note_authentic_peer(from);
        self.receiver.note_heard(now);

        let (header, fragment_bytes) = match DatagramHeader::unwrap(&plaintext) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("dropping malformed datagram: {e}");
                return Ok(());
            }
        };

        self.last_received_timestamp = header.timestamp;
        let round_trip_sample = wrapping_delay(header.timestamp_reply, wrapping_timestamp()) as f64;
        self.rtt.on_sample(round_trip_sample);

        let fragment = match Fragment::from_bytes(fragment_bytes) {
            Ok(f) => f,
            Err(e) => {
                debug!("dropping malformed fragment: {e}");
                return Ok(());
            }
        };

        if !self.assembly.add_fragment(&fragment) || !self.assembly.is_complete() {
            return Ok(());
        }

        let instruction = match self.assembly.get_assembly() {
            Ok(inst) => inst,
            Err(e) => {
                debug!("dropping fragment assembly that failed to decode: {e}");
                return Ok(());
            }
        };

        match self.receiver.on_instruction(now, &instruction) {
            Ok(outcome) => {
                if matches!(outcome, ReceiveOutcome::Applied { .. }) {
                    self.pending_ack_deadline_ms = Some(now + ACK_INTERVAL_MS);
                }
                if let Err(err) = self.sender.on_ack_received(outcome.ack_num()) {
                    warn!("peer acked a baseline we no longer hold, resetting our send side: {err}");
                    self.sender.reset();
                }
                Ok(())
            }
            Err(DatagramError::ProtocolVersionMismatch { expected, got }) => {
                error!("peer protocol version {got} does not match ours ({expected}); ending session");
                self.session_dead = Some(format!("peer protocol version {got} does not match ours ({expected})"));
                Ok(())
            }
            Err(e @ DatagramError::Apply(_)) => {
                warn!("failed to apply instruction diff, dropping it: {e}");
                Ok(())
            }
        }
    }

    async fn on_pacing_tick(&mut self, now: u64) -> Result<(), OrchestratorError> {
        let heartbeat_due = now.saturating_sub(self.sender.last_send_time_ms()) >= HEARTBEAT_INTERVAL_MS;
        let ack_due = self.pending_ack_deadline_ms.is_some_and(|deadline| now >= deadline);
        let send_due = heartbeat_due || ack_due;

        if now < self.next_send_allowed_ms && !send_due {
            return Ok(());
        }

        let instruction = self.sender.tick(now, self.mtu, self.receiver.newest_num(), self.receiver.throwaway_floor(), send_due)?;

        if let Some(instruction) = instruction {
            self.send_instruction(&instruction).await?;
            self.pending_ack_deadline_ms = None;
            self.next_send_allowed_ms = now + send_interval_ms(self.rtt.srtt_ms());
        }

        Ok(())
    }

    async fn send_instruction(&mut self, instruction: &Instruction) -> Result<(), OrchestratorError> {
        let fragments = self.fragmenter.make_fragments(instruction, self.mtu);
        let header = DatagramHeader::new(wrapping_timestamp(), self.last_received_timestamp);

        for fragment in &fragments {
            let plaintext = header.wrap(&fragment.to_bytes());
            let sealed = match self.envelope.encrypt(&plaintext) {
                Ok(sealed) => sealed,
                Err(e) => {
                    error!("nonce sequence exhausted, ending session: {e}");
                    self.session_dead = Some(e.to_string());
                    return Err(e.into());
                }
            };
            self.socket.send_to_peer(&sealed).await?;
        }

        Ok(())
    }
}
