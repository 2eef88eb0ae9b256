//! Resource quantity conversion
//!
//! Parses quantity strings such as `100Mi`, `500m` or `10000000` into plain
//! numbers. Memory quantities are reported in mebibytes, rounded to the
//! nearest whole number.
//!
//! The scale table is fixed: `K`/`M`/`G` scale by powers of 1024 and
//! `Ki`/`Mi`/`Gi` by powers of 1000. Existing role defaults were computed with
//! this table, so `10G` reads as 10240 MiB and `10Gi` as 9537 MiB.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bytes per mebibyte, the unit memory defaults are expressed in
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)([A-Za-z]*)$").expect("quantity pattern is valid")
});

/// Multiplier for a unit suffix, `None` when the suffix is not recognized
fn suffix_scale(suffix: &str) -> Option<f64> {
    let scale = match suffix {
        "" => 1.0,
        "m" => 0.001,
        "K" => 1024.0,
        "Ki" => 1000.0,
        "M" => 1024f64.powi(2),
        "Mi" => 1000f64.powi(2),
        "G" => 1024f64.powi(3),
        "Gi" => 1000f64.powi(3),
        _ => return None,
    };
    Some(scale)
}

/// Parse a quantity into its scaled value
///
/// Returns `None` for malformed input or an unknown unit suffix.
pub fn parse_quantity(input: &str) -> Option<f64> {
    let caps = QUANTITY_RE.captures(input)?;
    let number: f64 = caps.get(1)?.as_str().parse().ok()?;
    let scale = suffix_scale(caps.get(2).map_or("", |m| m.as_str()))?;
    Some(number * scale)
}

/// Parse a memory quantity into whole mebibytes
///
/// Returns `None` when the quantity is unrepresentable.
pub fn parse_memory_mib(input: &str) -> Option<u64> {
    let bytes = parse_quantity(input)?;
    let mib = (bytes / BYTES_PER_MIB).round();
    if mib.is_finite() && mib >= 0.0 {
        Some(mib as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fixture_table() {
        let cases = [
            ("10000000", Some(10)),
            ("10000000000m", Some(10)),
            ("10000K", Some(10)),
            ("10000Ki", Some(10)),
            ("10M", Some(10)),
            ("10Mi", Some(10)),
            ("10G", Some(10240)),
            ("10.5G", Some(10752)),
            ("10Gi", Some(9537)),
            ("100Mi", Some(95)),
            ("200T", None),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_memory_mib(input), expected, "converting {}", input);
        }
    }

    #[test]
    fn test_parse_quantity_cpu_style() {
        assert_eq!(parse_quantity("500m"), Some(0.5));
        assert_eq!(parse_quantity("2"), Some(2.0));
        assert_eq!(parse_quantity("1.5"), Some(1.5));
    }

    #[test]
    fn test_malformed_quantities() {
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("Mi"), None);
        assert_eq!(parse_quantity("-10Mi"), None);
        assert_eq!(parse_quantity(" 10Mi"), None);
        assert_eq!(parse_quantity("10 Mi"), None);
        assert_eq!(parse_quantity("1e3"), None);
        assert_eq!(parse_quantity(".5"), None);
    }

    #[test]
    fn test_suffixes_are_case_sensitive() {
        assert_eq!(parse_quantity("10mi"), None);
        assert_eq!(parse_quantity("10k"), None);
        assert!(parse_quantity("10Ki").is_some());
    }
}
