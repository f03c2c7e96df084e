//! Batch payload decoding and item validation.
//!
//! The body must be a JSON object holding an `items` array. Anything else is a
//! structural failure. Items inside the array are validated one by one; a bad
//! item is skipped and never stops the items after it.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::PayloadError;
use crate::sync::types::ValidatedReading;

pub const ITEMS_KEY: &str = "items";
pub const DATETIME_KEY: &str = "datetime_iso";
pub const VALUE_KEY: &str = "value_mmol";

/// Highest concentration the health store accepts for blood glucose.
///
/// One record above it makes the store reject the whole bulk insert.
pub const MAX_PLAUSIBLE_MMOL_PER_L: f64 = 50.0;

/// Offset-aware layouts RFC 3339 is too strict for: no seconds, or an offset
/// without a colon.
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Offset-less layouts, read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Why an item was left out of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("item is not an object")]
    NotAnObject,
    #[error("missing 'datetime_iso'")]
    MissingTimestamp,
    #[error("missing 'value_mmol'")]
    MissingValue,
    #[error("timestamp is not an absolute instant")]
    UnparsableTimestamp,
    #[error("value is not a finite number")]
    NonNumericValue,
    #[error("value is not positive")]
    NonPositiveValue,
    #[error("value exceeds the plausible maximum")]
    ImplausibleValue,
}

/// Untrusted item fields as they appear in the payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatchItem {
    pub datetime_iso: Option<String>,
    pub value_mmol: Option<f64>,
}

impl RawBatchItem {
    /// Pick the two known fields out of one array element.
    ///
    /// `value_mmol` may be a JSON number or a numeric string.
    pub fn from_json(item: &Value) -> Result<Self, SkipReason> {
        let obj = item.as_object().ok_or(SkipReason::NotAnObject)?;

        let datetime_iso = match obj.get(DATETIME_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(SkipReason::UnparsableTimestamp),
        };

        let value_mmol = match obj.get(VALUE_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_f64().ok_or(SkipReason::NonNumericValue)?),
            Some(Value::String(s)) => Some(
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| SkipReason::NonNumericValue)?,
            ),
            Some(_) => return Err(SkipReason::NonNumericValue),
        };

        Ok(Self {
            datetime_iso,
            value_mmol,
        })
    }

    /// Apply item-level rules.
    pub fn validate(&self) -> Result<ValidatedReading, SkipReason> {
        let raw_time = self
            .datetime_iso
            .as_deref()
            .ok_or(SkipReason::MissingTimestamp)?;
        let mmol = self.value_mmol.ok_or(SkipReason::MissingValue)?;

        let (timestamp_utc, utc_offset_seconds) =
            parse_timestamp(raw_time).ok_or(SkipReason::UnparsableTimestamp)?;

        if !mmol.is_finite() {
            return Err(SkipReason::NonNumericValue);
        }
        if mmol <= 0.0 {
            return Err(SkipReason::NonPositiveValue);
        }
        if mmol > MAX_PLAUSIBLE_MMOL_PER_L {
            return Err(SkipReason::ImplausibleValue);
        }

        Ok(ValidatedReading {
            timestamp_utc,
            concentration_mmol_per_l: mmol,
            utc_offset_seconds,
        })
    }
}

/// Parse an absolute instant.
///
/// An explicit offset (RFC 3339, `Z`, minutes-only, or `+hhmm`) is tried
/// first. Without an offset the time is taken as UTC, never as device-local
/// time. Returns the instant and the offset it was written with, `None` when
/// the text carried no offset.
pub fn parse_timestamp(raw: &str) -> Option<(DateTime<Utc>, Option<i32>)> {
    let raw = raw.trim();

    if let Some(dt) = parse_with_offset(raw) {
        return Some((dt.with_timezone(&Utc), Some(dt.offset().local_minus_utc())));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| (naive.and_utc(), None))
}

fn parse_with_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    // chrono's `%z` does not take `Z`; spell it as `+00:00`.
    let zulu;
    let raw = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(rest) => {
            zulu = format!("{rest}+00:00");
            zulu.as_str()
        }
        None => raw,
    };

    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
}

/// Decoded batch. Owns the item list and validates lazily.
#[derive(Debug, Clone)]
pub struct ParsedBatch {
    items: Vec<Value>,
}

impl ParsedBatch {
    /// Number of items before filtering.
    pub fn attempted(&self) -> usize {
        self.items.len()
    }

    /// Valid readings in source order. Can be called any number of times.
    pub fn readings(&self) -> impl Iterator<Item = ValidatedReading> + '_ {
        self.inspect().filter_map(Result::ok)
    }

    /// Per-item outcome in source order, skips included.
    pub fn inspect(&self) -> impl Iterator<Item = Result<ValidatedReading, SkipReason>> + '_ {
        self.items.iter().enumerate().map(|(index, item)| {
            let outcome = RawBatchItem::from_json(item).and_then(|raw| raw.validate());
            if let Err(reason) = &outcome {
                tracing::debug!(index, reason = %reason, "Skipping batch item");
            }
            outcome
        })
    }
}

/// Decode a batch body.
///
/// # Errors
/// [`PayloadError`] when the body is not JSON, not an object, or has no
/// `items` array. Item-level problems are not errors.
pub fn parse(raw_body: &[u8]) -> Result<ParsedBatch, PayloadError> {
    let root: Value = serde_json::from_slice(raw_body)?;

    let Value::Object(mut map) = root else {
        return Err(PayloadError::NotAnObject);
    };

    match map.remove(ITEMS_KEY) {
        Some(Value::Array(items)) => Ok(ParsedBatch { items }),
        _ => Err(PayloadError::MissingItems { key: ITEMS_KEY }),
    }
}
