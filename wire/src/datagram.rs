use byteorder::{BigEndian, ByteOrder};

use crate::error::MalformedFragment;

const HEADER_LEN: usize = 2 + 2;

/// `[timestamp:2][timestamp_reply:2][fragment bytes]` (§3, §6) — the
/// plaintext that gets sealed by the crypto envelope. `timestamp` is our
/// own wrapping clock sample; `timestamp_reply` echoes the peer's most
/// recently received `timestamp`, letting each side estimate one-way delay
/// without clock sync (§4.7).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DatagramHeader {
    pub timestamp: u16,
    pub timestamp_reply: u16,
}

impl DatagramHeader {
    pub fn new(timestamp: u16, timestamp_reply: u16) -> Self {
        DatagramHeader { timestamp, timestamp_reply }
    }

    pub fn wrap(&self, fragment_bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + fragment_bytes.len());
        let mut header = [0u8; HEADER_LEN];
        BigEndian::write_u16(&mut header[0..2], self.timestamp);
        BigEndian::write_u16(&mut header[2..4], self.timestamp_reply);
        out.extend_from_slice(&header);
        out.extend_from_slice(fragment_bytes);
        out
    }

    /// Split a decrypted plaintext datagram into its header and the
    /// fragment bytes that follow.
    pub fn unwrap(plaintext: &[u8]) -> Result<(Self, &[u8]), MalformedFragment> {
        if plaintext.len() < HEADER_LEN {
            return Err(MalformedFragment("datagram shorter than timestamp header".into()));
        }
        let timestamp = BigEndian::read_u16(&plaintext[0..2]);
        let timestamp_reply = BigEndian::read_u16(&plaintext[2..4]);
        Ok((DatagramHeader::new(timestamp, timestamp_reply), &plaintext[HEADER_LEN..]))
    }
}
