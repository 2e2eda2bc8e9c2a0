use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::DecodeError;

/// The leading byte of an encoded instruction's body, reserved so the
/// receiver can tell whether the rest is raw or zlib-compressed (§6, §9's
/// resolved Open Question).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CompressionMarker {
    Raw = 0x00,
    Zlib = 0x01,
}

impl CompressionMarker {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(CompressionMarker::Raw),
            0x01 => Some(CompressionMarker::Zlib),
            _ => None,
        }
    }
}

/// Compress `body` if doing so actually shrinks it, and prefix the result
/// with the marker byte the receiver needs to undo it.
pub fn encode(body: &[u8]) -> io::Result<Vec<u8>> {
    let mut compressed = Vec::new();
    {
        let mut encoder = ZlibEncoder::new(&mut compressed, Compression::default());
        encoder.write_all(body)?;
        encoder.finish()?;
    }

    if compressed.len() < body.len() {
        let mut out = Vec::with_capacity(1 + compressed.len());
        out.push(CompressionMarker::Zlib as u8);
        out.extend_from_slice(&compressed);
        Ok(out)
    } else {
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(CompressionMarker::Raw as u8);
        out.extend_from_slice(body);
        Ok(out)
    }
}

/// Prefix `body` with the raw marker without attempting compression —
/// used by the fragmenter's ack-only fast path, where the body is known to
/// be small and re-running zlib over it is wasted work (§4.3).
pub fn mark_raw(body: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(CompressionMarker::Raw as u8);
    out.extend(body);
    out
}

pub fn decode(marked: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let (marker_byte, body) = marked.split_first().ok_or(DecodeError::Truncated)?;
    match CompressionMarker::from_byte(*marker_byte) {
        Some(CompressionMarker::Raw) => Ok(body.to_vec()),
        Some(CompressionMarker::Zlib) => {
            let mut decoder = ZlibDecoder::new(body);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).map_err(DecodeError::Decompress)?;
            Ok(out)
        }
        None => Err(DecodeError::UnknownCompressionMarker(*marker_byte)),
    }
}
