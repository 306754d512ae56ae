//! Input validation shared by the recorder and the API boundary.

use pulse_state::CheckStatus;
use serde_json::Value;

use crate::error::{HealthError, HealthResult};

/// Accept exactly `"good"` or `"bad"`.
pub fn parse_status(raw: &str) -> HealthResult<CheckStatus> {
    CheckStatus::parse(raw)
        .ok_or_else(|| HealthError::invalid(format!("status must be \"good\" or \"bad\", got {raw:?}")))
}

/// Extract the status literal from a JSON value. Non-strings are rejected;
/// the literal itself is checked by [`parse_status`].
pub fn status_from_json(value: &Value) -> HealthResult<&str> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Err(HealthError::invalid("status is required")),
        other => Err(HealthError::invalid(format!(
            "status must be \"good\" or \"bad\", got {other}"
        ))),
    }
}

/// Record timestamps are epoch milliseconds and cannot precede the epoch.
pub fn check_timestamp(timestamp: i64) -> HealthResult<i64> {
    if timestamp < 0 {
        return Err(HealthError::invalid(format!(
            "timestamp must be non-negative, got {timestamp}"
        )));
    }
    Ok(timestamp)
}

/// Extract a record timestamp from a JSON value without coercion.
///
/// Floats, strings, negatives and values beyond `i64` are rejected.
pub fn timestamp_from_json(value: &Value) -> HealthResult<i64> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(ts) => check_timestamp(ts),
            None => Err(HealthError::invalid(format!(
                "timestamp must be an integer in milliseconds, got {n}"
            ))),
        },
        Value::Null => Err(HealthError::invalid("timestamp is required")),
        other => Err(HealthError::invalid(format!(
            "timestamp must be an integer in milliseconds, got {other}"
        ))),
    }
}

/// Parse the `since` bound of an uptime window. Any `i64` is allowed.
pub fn parse_since(raw: &str) -> HealthResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| HealthError::invalid(format!("since must be an integer, got {raw:?}")))
}
