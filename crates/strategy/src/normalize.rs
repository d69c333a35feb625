//! Candle normalization: loosely typed records in, time-ascending [`Candle`]s out.

use serde_json::Value;
use tracing::warn;

use common::{Candle, Error, RawCandle, Result};

/// Coerce raw records into candles sorted ascending by `time`.
///
/// Fields are coerced individually: numbers pass through, numeric strings are
/// parsed, `null`/`""`/`false` become 0, anything else (including a missing
/// field) becomes NaN. NaN prices are kept and propagate through downstream
/// arithmetic. A record whose time is not finite has no place on the time
/// axis and is dropped.
pub fn normalize(records: &[RawCandle]) -> Vec<Candle> {
    let mut candles: Vec<Candle> = records
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let time = coerce(raw.time.as_ref()).floor();
            if !time.is_finite() {
                warn!(index, "Dropping candle record without a usable time");
                return None;
            }
            Some(Candle {
                time: time as i64,
                open: coerce(raw.open.as_ref()),
                high: coerce(raw.high.as_ref()),
                low: coerce(raw.low.as_ref()),
                close: coerce(raw.close.as_ref()),
                volume: volume(raw.volume.as_ref()),
            })
        })
        .collect();
    candles.sort_by_key(|c| c.time);
    candles
}

/// Strict variant of [`normalize`]: the first record with a non-numeric time
/// or price field is reported as [`Error::MalformedCandle`] instead of being
/// coerced.
pub fn validate(records: &[RawCandle]) -> Result<Vec<Candle>> {
    let mut candles = Vec::with_capacity(records.len());
    for (index, raw) in records.iter().enumerate() {
        let field = |name: &'static str, value: Option<&Value>| -> Result<f64> {
            let v = coerce(value);
            if v.is_finite() && !matches!(value, Some(Value::Null)) {
                Ok(v)
            } else {
                Err(Error::MalformedCandle { index, field: name })
            }
        };
        candles.push(Candle {
            time: field("time", raw.time.as_ref())?.floor() as i64,
            open: field("open", raw.open.as_ref())?,
            high: field("high", raw.high.as_ref())?,
            low: field("low", raw.low.as_ref())?,
            close: field("close", raw.close.as_ref())?,
            volume: volume(raw.volume.as_ref()),
        });
    }
    candles.sort_by_key(|c| c.time);
    Ok(candles)
}

fn volume(value: Option<&Value>) -> f64 {
    let v = coerce(value);
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Numeric coercion with JavaScript `Number()` semantics.
fn coerce(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s),
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    if let Some(v) = radix_literal(t) {
        return v;
    }
    match t {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if t
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) =>
        {
            t.parse().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

/// Unsigned `0x`/`0b`/`0o` integer literals. `None` when `t` has no such
/// prefix; NaN when the digits after it are empty or out of range.
fn radix_literal(t: &str) -> Option<f64> {
    let radix = match t.get(..2)? {
        "0x" | "0X" => 16,
        "0b" | "0B" => 2,
        "0o" | "0O" => 8,
        _ => return None,
    };
    let digits = &t[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let value = digits.chars().try_fold(0.0f64, |acc, c| {
        c.to_digit(radix)
            .map(|d| acc * f64::from(radix) + f64::from(d))
    });
    Some(value.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawCandle {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(normalize(&[]).is_empty());
        assert!(validate(&[]).unwrap().is_empty());
    }

    #[test]
    fn sorts_ascending_by_time() {
        let records = vec![
            raw(json!({"time": 1800, "open": 3, "high": 3, "low": 3, "close": 3})),
            raw(json!({"time": 0, "open": 1, "high": 1, "low": 1, "close": 1})),
            raw(json!({"time": 900, "open": 2, "high": 2, "low": 2, "close": 2})),
        ];
        let times: Vec<i64> = normalize(&records).iter().map(|c| c.time).collect();
        assert_eq!(times, vec![0, 900, 1800]);
    }

    #[test]
    fn numeric_strings_are_parsed_and_time_floored() {
        let records = vec![raw(
            json!({"time": "900.7", "open": " 99.5 ", "high": "101", "low": "98", "close": "1e2"}),
        )];
        let c = normalize(&records)[0];
        assert_eq!(c.time, 900);
        assert_eq!(c.open, 99.5);
        assert_eq!(c.high, 101.0);
        assert_eq!(c.close, 100.0);
        assert_eq!(c.volume, 0.0);
    }

    #[test]
    fn bad_fields_are_coerced_not_rejected() {
        let records = vec![raw(json!({"time": 60, "open": "abc", "high": null, "close": ""}))];
        let c = normalize(&records)[0];
        assert!(c.open.is_nan());
        assert_eq!(c.high, 0.0);
        assert!(c.low.is_nan(), "missing field coerces to NaN");
        assert_eq!(c.close, 0.0);
    }

    #[test]
    fn radix_prefixed_strings_parse_like_js_number() {
        assert_eq!(parse_number("0x10"), 16.0);
        assert_eq!(parse_number(" 0XfF "), 255.0);
        assert_eq!(parse_number("0b101"), 5.0);
        assert_eq!(parse_number("0o17"), 15.0);
        assert!(parse_number("0x").is_nan());
        assert!(parse_number("0b2").is_nan());
        assert!(parse_number("-0x10").is_nan());
        assert!(parse_number("0x+1").is_nan());
        assert_eq!(parse_number("010"), 10.0);
    }

    #[test]
    fn record_without_time_is_dropped() {
        let records = vec![
            raw(json!({"open": 1, "high": 1, "low": 1, "close": 1})),
            raw(json!({"time": 5, "open": 1, "high": 1, "low": 1, "close": 1})),
        ];
        let out = normalize(&records);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].time, 5);
    }

    #[test]
    fn validate_reports_first_malformed_field() {
        let records = vec![
            raw(json!({"time": 0, "open": 1, "high": 1, "low": 1, "close": 1})),
            raw(json!({"time": 60, "open": 1, "high": "x", "low": 1, "close": 1})),
        ];
        match validate(&records) {
            Err(Error::MalformedCandle { index, field }) => {
                assert_eq!(index, 1);
                assert_eq!(field, "high");
            }
            other => panic!("expected MalformedCandle, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_null_price() {
        let records = vec![raw(json!({"time": 0, "open": null, "high": 1, "low": 1, "close": 1}))];
        assert!(matches!(
            validate(&records),
            Err(Error::MalformedCandle { field: "open", .. })
        ));
    }
}
