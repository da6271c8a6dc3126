//! `"7s"` / `"1m30s"` / `"250ms"` duration strings.

use chrono::TimeDelta;
use serde::{de, Deserialize, Deserializer, Serializer};

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Render a duration the way Go's `time.Duration` prints.
pub fn format_duration(d: TimeDelta) -> String {
    let Some(nanos) = d.num_nanoseconds() else {
        return format!("{}s", d.num_seconds());
    };
    if nanos == 0 {
        return "0s".to_string();
    }

    let sign = if nanos < 0 { "-" } else { "" };
    let nanos = nanos.unsigned_abs() as i64;

    if nanos < NANOS_PER_MICRO {
        return format!("{}{}ns", sign, nanos);
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}{}µs", sign, fraction(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}{}ms", sign, fraction(nanos, NANOS_PER_MILLI));
    }

    let hours = nanos / (3600 * NANOS_PER_SEC);
    let minutes = (nanos / (60 * NANOS_PER_SEC)) % 60;
    let seconds = fraction(nanos % (60 * NANOS_PER_SEC), NANOS_PER_SEC);
    match (hours, minutes) {
        (0, 0) => format!("{}{}s", sign, seconds),
        (0, m) => format!("{}{}m{}s", sign, m, seconds),
        (h, m) => format!("{}{}h{}m{}s", sign, h, m, seconds),
    }
}

/// `value / unit` with trailing zeros of the fractional part dropped.
fn fraction(value: i64, unit: i64) -> String {
    let whole = value / unit;
    let rest = value % unit;
    if rest == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", rest, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parse a string produced by [`format_duration`].
pub fn parse_duration(input: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, input),
    };
    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total_nanos: f64 = 0.0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let (unit, len) = [
            ("ns", 1.0),
            ("µs", NANOS_PER_MICRO as f64),
            ("us", NANOS_PER_MICRO as f64),
            ("ms", NANOS_PER_MILLI as f64),
            ("s", NANOS_PER_SEC as f64),
            ("m", 60.0 * NANOS_PER_SEC as f64),
            ("h", 3600.0 * NANOS_PER_SEC as f64),
        ]
        .iter()
        .find(|(suffix, _)| rest.starts_with(suffix))
        .map(|(suffix, scale)| (*scale, suffix.len()))?;
        total_nanos += value * unit;
        rest = &rest[len..];
    }

    let nanos = total_nanos.round() as i64;
    Some(TimeDelta::nanoseconds(if negative { -nanos } else { nanos }))
}

pub fn serialize<S: Serializer>(d: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*d))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).ok_or_else(|| de::Error::custom(format!("invalid duration {:?}", raw)))
}
