//! Query-string value coercion. Nothing here fails: unparseable numbers and
//! dates become the `Number(NaN)` / `InvalidDate` sentinels.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use listing_query_core::{ast::Value, ParamValue, ValueType};

/// Coerce a raw parameter according to its declared type.
/// Scalar types read the first value of a multi-valued key.
pub fn coerce(raw: &ParamValue, value_type: ValueType) -> Value {
    match value_type {
        ValueType::String => Value::String(raw.first().to_string()),
        ValueType::Number => parse_number(raw.first()),
        ValueType::Boolean => Value::Bool(raw.first() == "true"),
        ValueType::Date => parse_date(raw.first()),
        ValueType::Array => Value::Array(
            raw.values()
                .into_iter()
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
    }
}

/// Numeric parse with the lenient semantics of an HTTP query layer:
/// surrounding whitespace is ignored, blank is zero, `0x` hex and
/// `Infinity` are accepted, anything else unparseable is NaN.
pub fn parse_number(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Number(0.0);
    }
    let n = match s {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                i64::from_str_radix(hex, 16)
                    .map(|v| v as f64)
                    .unwrap_or(f64::NAN)
            } else if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
                // rejects "inf", "nan" and friends that f64::from_str would take
                f64::NAN
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
    };
    if n.is_nan() {
        tracing::warn!(raw, "unparseable number in query parameter");
    }
    Value::Number(n)
}

/// Date parse accepting RFC 3339 and the common ISO-8601 shortcuts
/// (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`, naive date-times). Naive forms are
/// read as UTC.
pub fn parse_date(raw: &str) -> Value {
    match parse_datetime(raw.trim()) {
        Some(dt) => Value::DateTime(dt),
        None => {
            tracing::warn!(raw, "unparseable date in query parameter");
            Value::InvalidDate
        }
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    let date = match s.len() {
        4 => NaiveDate::parse_from_str(&format!("{s}-01-01"), "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok(),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
    }?;
    date.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Integer prefix parse: optional sign then leading digits, trailing junk
/// ignored (`"12abc"` → 12, `"1.9"` → 1). `None` when no digits lead.
/// Out-of-range values saturate.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = {
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Strict integer parse of a whole value, used for validation.
pub fn parse_int_strict(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}
