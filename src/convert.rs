//! # Value Converter
//!
//! String to typed value conversion for every [`ScalarKind`], plus the
//! zero-literal and default-literal checks the binding policy relies on.
//!
//! Integers are parsed base 10 into the widest representation (`i64`/`u64`)
//! and then narrowed; a value that does not fit is a conversion error rather
//! than a silent truncation. Booleans accept the usual textual forms
//! (`1 t T TRUE true True` and `0 f F FALSE false False`). Date-times are
//! strict RFC 3339.

use chrono::{DateTime, FixedOffset};

use crate::error::BindError;
use crate::reflect::ScalarKind;

/// Unix timestamp of `0001-01-01T00:00:00Z`, the zero instant of many
/// HTTP stacks.
const ZERO_ERA_UNIX: i64 = -62_135_596_800;

/// Prefix of the all-zero timestamp literal some clients send for "unset".
const ZERO_TIME_PREFIX: &str = "0000-00-00T00:00:00";

pub fn parse_int<T: TryFrom<i64>>(raw: &str, name: &str) -> Result<T, BindError>
where
    T::Error: std::fmt::Display,
{
    let wide: i64 = raw
        .parse()
        .map_err(|e: std::num::ParseIntError| BindError::invalid(name, e))?;
    T::try_from(wide).map_err(|e| BindError::invalid(name, e))
}

pub fn parse_uint<T: TryFrom<u64>>(raw: &str, name: &str) -> Result<T, BindError>
where
    T::Error: std::fmt::Display,
{
    let wide: u64 = raw
        .parse()
        .map_err(|e: std::num::ParseIntError| BindError::invalid(name, e))?;
    T::try_from(wide).map_err(|e| BindError::invalid(name, e))
}

pub fn parse_float(raw: &str, name: &str) -> Result<f64, BindError> {
    raw.parse::<f64>().map_err(|e| BindError::invalid(name, e))
}

pub fn parse_bool(raw: &str, name: &str) -> Result<bool, BindError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(BindError::invalid(name, "invalid boolean literal")),
    }
}

pub fn parse_time(raw: &str, name: &str) -> Result<DateTime<FixedOffset>, BindError> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| BindError::InvalidTime {
        name: name.to_string(),
        cause: e.to_string(),
    })
}

/// Whether a timestamp is the zero instant `0001-01-01T00:00:00Z`.
///
/// The Unix epoch is a real instant and never counts as zero.
pub fn is_zero_instant(secs: i64, nanos: u32) -> bool {
    nanos == 0 && secs == ZERO_ERA_UNIX
}

/// Whether `raw` denotes the zero value of `kind`.
///
/// Optional fields treat such input as "not provided", so a declared default
/// supersedes it. This makes an explicit `0` or `false` indistinguishable
/// from omission for optional parameters. Integers and booleans match the
/// exact literals `0` and `false`; `-0`, `00` or `F` are kept as sent.
pub fn is_zero_literal(raw: &str, kind: ScalarKind) -> bool {
    match kind {
        ScalarKind::String => raw.is_empty(),
        ScalarKind::Int | ScalarKind::Uint => raw == "0",
        ScalarKind::Float => raw.parse::<f64>().map(|v| v == 0.0).unwrap_or(false),
        ScalarKind::Bool => raw == "false",
        ScalarKind::DateTime => {
            raw.starts_with(ZERO_TIME_PREFIX)
                || DateTime::parse_from_rfc3339(raw)
                    .map(|t| is_zero_instant(t.timestamp(), t.timestamp_subsec_nanos()))
                    .unwrap_or(false)
        }
    }
}

/// Whether a default literal can be converted to `kind`.
pub fn is_valid_literal(raw: &str, kind: ScalarKind) -> bool {
    match kind {
        ScalarKind::String => true,
        ScalarKind::Int => raw.parse::<i64>().is_ok(),
        ScalarKind::Uint => raw.parse::<u64>().is_ok(),
        ScalarKind::Float => raw.parse::<f64>().is_ok(),
        ScalarKind::Bool => parse_bool(raw, "").is_ok(),
        ScalarKind::DateTime => DateTime::parse_from_rfc3339(raw).is_ok(),
    }
}
