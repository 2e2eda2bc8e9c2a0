use byteorder::{BigEndian, ByteOrder};

use crate::error::NonceOverflowError;

/// Which end of the connection we are. Fixes which direction we send on and
/// which direction we must verify incoming datagrams against (§4.2).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Client,
    Server,
}

/// The direction a nonce's sequence belongs to, encoded as bit 63 of the
/// 64-bit counter: 1 for client→server, 0 for server→client.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

impl Direction {
    const FLAG: u64 = 1 << 63;

    fn flag_bit(self) -> u64 {
        match self {
            Direction::ClientToServer => Self::FLAG,
            Direction::ServerToClient => 0,
        }
    }

    fn from_counter(counter: u64) -> Self {
        if counter & Self::FLAG != 0 {
            Direction::ClientToServer
        } else {
            Direction::ServerToClient
        }
    }
}

impl Role {
    pub fn send_direction(self) -> Direction {
        match self {
            Role::Client => Direction::ClientToServer,
            Role::Server => Direction::ServerToClient,
        }
    }

    pub fn recv_direction(self) -> Direction {
        self.send_direction().opposite()
    }
}

impl Direction {
    fn opposite(self) -> Self {
        match self {
            Direction::ClientToServer => Direction::ServerToClient,
            Direction::ServerToClient => Direction::ClientToServer,
        }
    }
}

const MAX_SEQUENCE: u64 = (1 << 63) - 1;

/// Monotonically increasing per-direction sequence, persisted only in
/// memory (I2). `next()` is fatal once the 63-bit sequence space is
/// exhausted — the session must abort rather than reuse a nonce.
pub struct NonceCounter {
    direction: Direction,
    sequence: u64,
}

impl NonceCounter {
    pub fn new(direction: Direction) -> Self {
        NonceCounter { direction, sequence: 0 }
    }

    /// Produce the next 12-byte nonce and advance the counter.
    pub fn next(&mut self) -> Result<[u8; 12], NonceOverflowError> {
        if self.sequence > MAX_SEQUENCE {
            return Err(NonceOverflowError);
        }
        let counter = self.direction.flag_bit() | self.sequence;
        self.sequence += 1;
        Ok(encode(counter))
    }
}

fn encode(counter: u64) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    BigEndian::write_u64(&mut nonce[4..], counter);
    nonce
}

/// Anti-replay state for the sequences we accept from the peer: a 64-entry
/// sliding window behind the highest sequence seen so far. Never accepts
/// the same sequence twice (§4.2's hard requirement); accepts modest
/// reordering (the MAY).
pub struct ReplayWindow {
    direction: Direction,
    highest: Option<u64>,
    window: u64,
}

#[derive(Debug, Eq, PartialEq)]
pub enum ReplayOutcome {
    Accepted,
    WrongDirection,
    Replayed,
    TooOld,
}

impl ReplayWindow {
    pub fn new(direction: Direction) -> Self {
        ReplayWindow { direction, highest: None, window: 0 }
    }

    /// Validate a nonce's raw 12 bytes and, if acceptable, record its
    /// sequence so it can never be accepted again.
    pub fn check(&mut self, nonce: &[u8; 12]) -> ReplayOutcome {
        let counter = BigEndian::read_u64(&nonce[4..]);
        if Direction::from_counter(counter) != self.direction {
            return ReplayOutcome::WrongDirection;
        }
        let sequence = counter & MAX_SEQUENCE;
        self.accept(sequence)
    }

    fn accept(&mut self, sequence: u64) -> ReplayOutcome {
        match self.highest {
            None => {
                self.highest = Some(sequence);
                self.window = 1;
                ReplayOutcome::Accepted
            }
            Some(highest) if sequence > highest => {
                let shift = sequence - highest;
                self.window = if shift >= 64 { 0 } else { self.window << shift };
                self.window |= 1;
                self.highest = Some(sequence);
                ReplayOutcome::Accepted
            }
            Some(highest) if sequence == highest => ReplayOutcome::Replayed,
            Some(highest) => {
                let behind = highest - sequence;
                if behind >= 64 {
                    return ReplayOutcome::TooOld;
                }
                let bit = 1u64 << behind;
                if self.window & bit != 0 {
                    ReplayOutcome::Replayed
                } else {
                    self.window |= bit;
                    ReplayOutcome::Accepted
                }
            }
        }
    }
}
