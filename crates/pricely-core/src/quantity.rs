//! Price and quantity normalization.
//!
//! Grounded on the original `comparison_algorithm.py::normalize_quantity`,
//! generalized rather than ported literally: the Python
//! original only recognized a hardcoded ml/l/g/kg lookup table, this
//! implementation covers any unit token via the canonical-unit conversion
//! table below.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{CanonicalUnit, ParsedQuantity};

/// Parse a raw price string into its integer rupee value.
///
/// Strips thousands separators (`,`) and parses the leading run of digits
/// before any decimal point. This is a deliberate departure from the
/// original source's `re.search(r"\d+", ...)` first-digit-run behavior,
/// which would turn `"1,299.50"` into `1` instead of `1299` — see
/// §9 "Price integer parsing" for the recorded decision.
///
/// Returns `None` if the string contains no digits.
#[must_use]
pub fn parse_price_minor(raw: &str) -> Option<i64> {
    let stripped: String = raw.chars().filter(|c| *c != ',').collect();
    let digits_before_decimal: String = stripped
        .split('.')
        .next()
        .unwrap_or("")
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    if digits_before_decimal.is_empty() {
        return None;
    }
    digits_before_decimal.parse::<i64>().ok()
}

fn unit_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?)\s*(x|×)\s*(\d+(?:\.\d+)?)\s*([a-z]+)$")
            .expect("static quantity pack regex is valid")
    })
}

fn value_unit_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?)\s*([a-z]+)$").expect("static quantity regex is valid")
    })
}

fn bare_integer_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+$").expect("static bare-integer regex is valid"))
}

/// Canonicalize a unit token (after `ltr`→`l`, `gm`→`g` collapsing) into a
/// `(CanonicalUnit, multiplier)` pair, or `None` for an unrecognized unit.
fn canonical_unit(token: &str) -> Option<(CanonicalUnit, f64)> {
    match token {
        "ml" => Some((CanonicalUnit::Ml, 1.0)),
        "l" => Some((CanonicalUnit::Ml, 1000.0)),
        "g" => Some((CanonicalUnit::G, 1.0)),
        "kg" => Some((CanonicalUnit::G, 1000.0)),
        _ => None,
    }
}

/// Parse a raw, platform-presented quantity string into a [`ParsedQuantity`]
///. Recognizes three forms: `"n × m unit"`, `"v unit"`, and
/// a bare integer (treated as `count`).
///
/// Returns `None` when the string matches none of the recognized forms.
#[must_use]
pub fn parse_quantity(raw: &str) -> Option<ParsedQuantity> {
    let normalized = raw
        .trim()
        .to_lowercase()
        .replace("ltr", "l")
        .replace("liters", "l")
        .replace("litre", "l")
        .replace("gm", "g");
    // Collapse any whitespace so "2 x 500 ml" and "2x500ml" parse alike.
    let compact: String = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(caps) = unit_pattern().captures(&compact) {
        let n: f64 = caps[1].parse().ok()?;
        let m: f64 = caps[3].parse().ok()?;
        let (unit, multiplier) = canonical_unit(&caps[4])?;
        return Some(ParsedQuantity {
            value: n * m * multiplier,
            unit,
        });
    }

    if let Some(caps) = value_unit_pattern().captures(&compact) {
        let v: f64 = caps[1].parse().ok()?;
        let (unit, multiplier) = canonical_unit(&caps[2])?;
        return Some(ParsedQuantity {
            value: v * multiplier,
            unit,
        });
    }

    if bare_integer_pattern().is_match(&compact) {
        let v: f64 = compact.parse().ok()?;
        return Some(ParsedQuantity {
            value: v,
            unit: CanonicalUnit::Count,
        });
    }

    None
}

/// Symmetric relative-tolerance price comparison.
///
/// Both zero is a match; exactly one zero is a mismatch.
#[must_use]
pub fn price_close(a: Option<i64>, b: Option<i64>, tolerance: f64) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    if a == 0 && b == 0 {
        return true;
    }
    if a == 0 || b == 0 {
        return false;
    }
    #[allow(clippy::cast_precision_loss)]
    let (af, bf) = (a as f64, b as f64);
    let diff = (af - bf).abs();
    let base = af.max(bf);
    diff / base <= tolerance
}

/// Same-unit, relative-tolerance quantity comparison.
///
/// Both zero is a match; unit mismatch is always a mismatch regardless of
/// value.
#[must_use]
pub fn quantity_similar(a: Option<ParsedQuantity>, b: Option<ParsedQuantity>, tolerance: f64) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    if a.unit != b.unit {
        return false;
    }
    if a.value == 0.0 && b.value == 0.0 {
        return true;
    }
    if a.value == 0.0 || b.value == 0.0 {
        return false;
    }
    let diff = (a.value - b.value).abs();
    let base = a.value.max(b.value);
    diff / base <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_liters_and_milliliters_to_the_same_canonical_value() {
        for raw in ["1 L", "1000 ml", "1l"] {
            let parsed = parse_quantity(raw).unwrap();
            assert_eq!(parsed.unit, CanonicalUnit::Ml);
            assert!((parsed.value - 1000.0).abs() < f64::EPSILON, "{raw} -> {parsed:?}");
        }
    }

    #[test]
    fn parses_kilograms_and_grams_to_the_same_canonical_value() {
        for raw in ["1 kg", "1000g"] {
            let parsed = parse_quantity(raw).unwrap();
            assert_eq!(parsed.unit, CanonicalUnit::G);
            assert!((parsed.value - 1000.0).abs() < f64::EPSILON, "{raw} -> {parsed:?}");
        }
    }

    #[test]
    fn parses_pack_notation() {
        let parsed = parse_quantity("2 x 500 ml").unwrap();
        assert_eq!(parsed.unit, CanonicalUnit::Ml);
        assert!((parsed.value - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bare_integer_is_count() {
        let parsed = parse_quantity("6").unwrap();
        assert_eq!(parsed.unit, CanonicalUnit::Count);
        assert!((parsed.value - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_parsing_strips_thousands_separators_and_keeps_full_integer() {
        assert_eq!(parse_price_minor("1,299.50"), Some(1299));
        assert_eq!(parse_price_minor("275"), Some(275));
        assert_eq!(parse_price_minor("no digits here"), None);
    }

    #[test]
    fn price_close_is_symmetric() {
        assert_eq!(price_close(Some(100), Some(120), 0.20), price_close(Some(120), Some(100), 0.20));
        assert!(price_close(Some(100), Some(120), 0.20));
        assert!(!price_close(Some(100), Some(121), 0.20));
    }

    #[test]
    fn price_close_zero_handling() {
        assert!(price_close(Some(0), Some(0), 0.20));
        assert!(!price_close(Some(0), Some(5), 0.20));
    }

    #[test]
    fn quantity_similar_requires_matching_unit() {
        let g500 = parse_quantity("500 g");
        let ml500 = parse_quantity("500 ml");
        assert!(!quantity_similar(g500, ml500, 0.10));
    }
}
