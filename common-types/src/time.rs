use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the epoch. Used for `TimestampedState`
/// bookkeeping and prediction expiry; never fed into the wire timestamp
/// directly (that one wraps at 16 bits, see `wrapping_timestamp`).
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_millis() as u64
}

/// The 16-bit wrapping millisecond timestamp each datagram embeds (§6). The
/// original implementation derives this from a monotonic clock that is
/// allowed to wrap roughly every 65 seconds (§11) — we take the low 16 bits
/// of `now_ms()`, which has the same wraparound behavior.
pub fn wrapping_timestamp() -> u16 {
    (now_ms() & 0xffff) as u16
}

/// One-way delay estimate between a timestamp we embedded and the
/// `timestamp_reply` we get back, accounting for the 16-bit wraparound.
/// `now.wrapping_sub(sent)` is correct as long as fewer than ~32 seconds
/// elapsed between send and reply, which holds for any sane RTT.
pub fn wrapping_delay(sent: u16, now: u16) -> u16 {
    now.wrapping_sub(sent)
}
