//! Wire format of a vitals notification.
//!
//! Byte 0 is the heart rate in BPM, byte 1 the oxygen saturation in
//! percent. Bytes past index 1 belong to future frame revisions and are
//! ignored. Decoding checks structure only; physiologically implausible
//! values (oxygen above 100) pass through unclamped.

use std::time::Instant;

use crate::error::FrameError;

/// One decoded vitals reading. Immutable once built, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct VitalsSample {
    pub heart_rate_bpm: u8,
    pub oxygen_pct: u8,
    pub captured_at: Instant,
}

/// Decodes one raw notification payload. Stateless, safe to call from
/// anywhere.
pub fn decode(raw: &[u8]) -> Result<VitalsSample, FrameError> {
    if raw.len() < 2 {
        return Err(FrameError::TooShort { len: raw.len() });
    }
    Ok(VitalsSample {
        heart_rate_bpm: raw[0],
        oxygen_pct: raw[1],
        captured_at: Instant::now(),
    })
}
