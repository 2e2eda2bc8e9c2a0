use std::{error, fmt};

/// A fragment's header didn't parse (too short, or the reassembled body
/// failed to decode as an `Instruction`). Per §7: drop the fragment, and
/// abandon the partial assembly only if the fragment's `id` also
/// mismatches the one already in progress.
#[derive(Debug)]
pub struct MalformedFragment(pub String);

impl fmt::Display for MalformedFragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "malformed fragment: {}", self.0)
    }
}

impl error::Error for MalformedFragment {}

#[derive(Debug)]
pub enum DecodeError {
    Truncated,
    UnknownCompressionMarker(u8),
    Bincode(bincode::Error),
    Decompress(std::io::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::Truncated => write!(f, "instruction body shorter than the compression marker"),
            DecodeError::UnknownCompressionMarker(b) => write!(f, "unknown compression marker byte 0x{:02x}", b),
            DecodeError::Bincode(e) => write!(f, "bincode decode failed: {}", e),
            DecodeError::Decompress(e) => write!(f, "zlib decompress failed: {}", e),
        }
    }
}

impl error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DecodeError::Bincode(e) => Some(e.as_ref()),
            DecodeError::Decompress(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bincode::Error> for DecodeError {
    fn from(e: bincode::Error) -> Self {
        DecodeError::Bincode(e)
    }
}
