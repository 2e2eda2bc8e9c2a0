use aead::generic_array::GenericArray;
use aead::{Aead, KeyInit, Payload};
use aes::Aes128;
use ocb3::Ocb3;

use crate::error::{AuthError, NonceOverflowError};
use crate::key::Key;
use crate::nonce::{NonceCounter, ReplayWindow, Role};

const TAG_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Seals and opens datagrams for one end of one connection (§4.2, §9's
/// "instantiate one envelope per direction, owned by the connection").
/// Holds its own send counter and the peer's replay window; the key itself
/// never changes for the lifetime of the session.
pub struct Envelope {
    cipher: Ocb3<Aes128>,
    send_counter: NonceCounter,
    recv_window: ReplayWindow,
}

impl Envelope {
    pub fn new(key: &Key, role: Role) -> Self {
        let cipher = Ocb3::<Aes128>::new(GenericArray::from_slice(key.as_bytes()));
        Envelope {
            cipher,
            send_counter: NonceCounter::new(role.send_direction()),
            recv_window: ReplayWindow::new(role.recv_direction()),
        }
    }

    /// Seal `plaintext`, returning `nonce || ciphertext || tag` (§6's wire
    /// datagram layout). Fails only on nonce exhaustion (§4.2).
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, NonceOverflowError> {
        let nonce = self.send_counter.next()?;
        let sealed = self
            .cipher
            .encrypt(GenericArray::from_slice(&nonce), Payload { msg: plaintext, aad: b"" })
            .expect("OCB-AES-128 encryption is infallible for any plaintext length we send");

        let mut datagram = Vec::with_capacity(NONCE_LEN + sealed.len());
        datagram.extend_from_slice(&nonce);
        datagram.extend_from_slice(&sealed);
        Ok(datagram)
    }

    /// Open a `nonce || ciphertext || tag` datagram. Rejects silently (no
    /// panics, no side channel beyond timing) on tag failure or replay.
    pub fn decrypt(&mut self, datagram: &[u8]) -> Result<Vec<u8>, AuthError> {
        if datagram.len() < NONCE_LEN + TAG_LEN {
            return Err(AuthError::Truncated);
        }
        let (nonce_bytes, sealed) = datagram.split_at(NONCE_LEN);
        let nonce: [u8; NONCE_LEN] = nonce_bytes.try_into().expect("split_at guarantees length");

        match self.recv_window.check(&nonce) {
            crate::nonce::ReplayOutcome::WrongDirection => return Err(AuthError::WrongDirection),
            crate::nonce::ReplayOutcome::Replayed => return Err(AuthError::Replayed),
            crate::nonce::ReplayOutcome::TooOld => return Err(AuthError::TooOld),
            crate::nonce::ReplayOutcome::Accepted => {}
        }

        self.cipher
            .decrypt(GenericArray::from_slice(&nonce), Payload { msg: sealed, aad: b"" })
            .map_err(|_| AuthError::TagMismatch)
    }
}
