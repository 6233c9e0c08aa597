//! Time-obfuscated map-provider key codec ( `/get-api-key`).
//!
//! Grounded on the original `main_functions.py::get_api_key`: the key is
//! base64-encoded once per hour-of-day in 12-hour format, so a client that
//! knows the current hour can invert the same number of decodes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode `key` with `hour_12` (expected range `1..=12`) iterated base64
/// encodings.
///
/// `hour_12` is clamped to `1..=12` so an out-of-range caller still gets a
/// deterministic, reversible result rather than a panic or a zero-round
/// passthrough.
#[must_use]
pub fn encode_api_key(key: &str, hour_12: u32) -> String {
    let rounds = hour_12.clamp(1, 12);
    let mut encoded = key.to_string();
    for _ in 0..rounds {
        encoded = STANDARD.encode(encoded.as_bytes());
    }
    encoded
}

/// Invert [`encode_api_key`] given the same `hour_12` used to encode.
///
/// Returns `None` if any round fails to decode as base64 or as UTF-8.
#[must_use]
pub fn decode_api_key(encoded: &str, hour_12: u32) -> Option<String> {
    let rounds = hour_12.clamp(1, 12);
    let mut decoded = encoded.to_string();
    for _ in 0..rounds {
        let bytes = STANDARD.decode(decoded.as_bytes()).ok()?;
        decoded = String::from_utf8(bytes).ok()?;
    }
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_recovers_the_original_key() {
        for hour in 1..=12 {
            let encoded = encode_api_key("super-secret-key", hour);
            assert_eq!(decode_api_key(&encoded, hour).as_deref(), Some("super-secret-key"));
        }
    }

    #[test]
    fn out_of_range_hour_is_clamped() {
        assert_eq!(encode_api_key("k", 0), encode_api_key("k", 1));
        assert_eq!(encode_api_key("k", 99), encode_api_key("k", 12));
    }

    #[test]
    fn decoding_with_the_wrong_hour_does_not_recover_the_key() {
        let encoded = encode_api_key("super-secret-key", 3);
        assert_ne!(decode_api_key(&encoded, 5), Some("super-secret-key".to_string()));
    }
}
