//! Audio level normalization
//!
//! Recorders report metering on a decibel-like scale whose floor depends on
//! the platform. This maps a reading into a linear 0.0 - 1.0 loudness value.

/// Loudest possible metering reading
pub const UPPER_BOUND: f64 = 0.0;

/// Normalize a raw metering reading against the capture session's floor.
///
/// A missing reading counts as full loudness since some recorders omit
/// metering entirely. NaN readings are treated the same way.
pub fn normalize_audio_level(raw: Option<f64>, lower_bound: f64) -> f64 {
    let Some(raw) = raw.filter(|value| !value.is_nan()) else {
        return 1.0;
    };

    if raw < lower_bound {
        0.0
    } else if raw >= UPPER_BOUND {
        1.0
    } else {
        ((raw - lower_bound) / (UPPER_BOUND - lower_bound)).abs()
    }
}
