/// Floor on the interval between sender ticks, even on a very fast link
/// (§4.4).
pub const SEND_INTERVAL_MIN_MS: u64 = 20;

/// Ceiling on the interval between sender ticks, so state still converges
/// reasonably on a slow or lossy link.
pub const SEND_INTERVAL_MAX_MS: u64 = 250;

/// An ACK-only datagram is sent within this long of a new remote state
/// arriving, even if nothing local changed.
pub const ACK_INTERVAL_MS: u64 = 100;

/// A heartbeat is due at least this often when idle, so roaming and RTT
/// tracking keep working on a silent connection.
pub const HEARTBEAT_INTERVAL_MS: u64 = 3000;

/// `max(SEND_INTERVAL_MIN, min(SEND_INTERVAL_MAX, SRTT/2))` (§4.4).
pub fn send_interval_ms(srtt_ms: f64) -> u64 {
    let half = srtt_ms / 2.0;
    let clamped = half.clamp(SEND_INTERVAL_MIN_MS as f64, SEND_INTERVAL_MAX_MS as f64);
    clamped.round() as u64
}
