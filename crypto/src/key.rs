use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use std::fmt;

/// A 16-byte AES-128 key, read from `MOSH_KEY` as 22 characters of
/// unpadded standard base64 (§6).
#[derive(Clone, Eq, PartialEq)]
pub struct Key([u8; 16]);

#[derive(Debug)]
pub struct KeyParseError(String);

impl fmt::Display for KeyParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "malformed session key: {}", self.0)
    }
}

impl std::error::Error for KeyParseError {}

impl Key {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Key(bytes)
    }

    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Key(bytes)
    }

    pub fn from_base64(s: &str) -> Result<Self, KeyParseError> {
        let decoded = STANDARD_NO_PAD
            .decode(s.trim())
            .map_err(|e| KeyParseError(e.to_string()))?;
        let bytes: [u8; 16] = decoded
            .try_into()
            .map_err(|_| KeyParseError("expected 16 decoded bytes".into()))?;
        Ok(Key(bytes))
    }

    pub fn to_base64(&self) -> String {
        STANDARD_NO_PAD.encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Key(<{} bytes redacted>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trips() {
        let key = Key::random();
        let encoded = key.to_base64();
        assert_eq!(encoded.len(), 22);
        let decoded = Key::from_base64(&encoded).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Key::from_base64("AAAA").is_err());
    }

    #[test]
    fn debug_does_not_leak_key_material() {
        let key = Key::from_bytes([0x42; 16]);
        assert!(!format!("{:?}", key).contains("42"));
    }
}
