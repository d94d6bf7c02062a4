//! Duration literals such as `30s`, `5m` or `1m30s`

use crate::error::{AppError, Result};
use std::time::Duration;

/// Parse a duration literal made of `<number><unit>` parts.
///
/// Supported units are `ms`, `s`, `m` and `h`; parts can be chained
/// (`1h30m`, `1m30s`) and numbers may carry a fraction (`1.5s`).
/// A zero total is rejected.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let literal = input.trim();
    if literal.is_empty() {
        return Err(AppError::parse("Duration cannot be empty"));
    }

    let mut total = Duration::ZERO;
    let mut rest = literal;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| AppError::parse(format!("Missing unit in duration '{}'", literal)))?;
        if number_end == 0 {
            return Err(AppError::parse(format!("Expected a number in duration '{}'", literal)));
        }

        let value: f64 = rest[..number_end]
            .parse()
            .map_err(|_| AppError::parse(format!("Invalid number in duration '{}'", literal)))?;

        let after_number = &rest[number_end..];
        let unit_end = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());

        let nanos_per_unit: f64 = match &after_number[..unit_end] {
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            unit => {
                return Err(AppError::parse(format!(
                    "Unknown unit '{}' in duration '{}' (use ms, s, m or h)",
                    unit, literal
                )))
            }
        };

        total += Duration::from_nanos((value * nanos_per_unit).round() as u64);
        rest = &after_number[unit_end..];
    }

    if total.is_zero() {
        return Err(AppError::parse(format!("Duration must be greater than 0: '{}'", literal)));
    }

    Ok(total)
}

/// Format a duration in the same literal style `parse_duration` accepts
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms == 0 {
        return "0s".to_string();
    }

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 {
        out.push_str(&format!("{}s", seconds));
    }
    if millis > 0 {
        out.push_str(&format!("{}ms", millis));
    }
    out
}

/// Serde adapter storing durations as literals
pub mod serde_literal {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
        let literal = String::deserialize(deserializer)?;
        parse_duration(&literal).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plan_literals() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn test_compound_and_fractional_literals() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_literals() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("30x").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("1..5s").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(300)), "5m");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1s500ms");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    proptest! {
        #[test]
        fn prop_format_then_parse_is_identity(ms in 1u64..100_000_000) {
            let duration = Duration::from_millis(ms);
            prop_assert_eq!(parse_duration(&format_duration(duration)).unwrap(), duration);
        }
    }
}
