//! Single readings typed in by the user.

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::SyncError;
use crate::sync::payload::MAX_PLAUSIBLE_MMOL_PER_L;
use crate::sync::types::ValidatedReading;
use crate::units::GlucoseUnit;

/// One value entered by hand, e.g. `"6,1"` mmol/L.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualEntry {
    pub input: String,
    pub unit: GlucoseUnit,
    /// When the sample was taken, with the device's offset at that time.
    pub taken_at: DateTime<FixedOffset>,
}

impl ManualEntry {
    pub fn new(input: impl Into<String>, unit: GlucoseUnit, taken_at: DateTime<FixedOffset>) -> Self {
        Self {
            input: input.into(),
            unit,
            taken_at,
        }
    }

    /// Parse and range-check the typed value.
    ///
    /// Accepts a decimal comma or a decimal point.
    pub fn validate(&self) -> Result<ValidatedReading, SyncError> {
        let value = parse_decimal(&self.input).ok_or_else(|| self.invalid("not a number"))?;

        let mmol = self.unit.to_mmol_per_l(value);
        if mmol <= 0.0 {
            return Err(self.invalid("must be greater than zero"));
        }
        if mmol > MAX_PLAUSIBLE_MMOL_PER_L {
            return Err(self.invalid("above the plausible maximum"));
        }

        Ok(ValidatedReading {
            timestamp_utc: self.taken_at.with_timezone(&Utc),
            concentration_mmol_per_l: mmol,
            utc_offset_seconds: Some(self.taken_at.offset().local_minus_utc()),
        })
    }

    fn invalid(&self, message: &str) -> SyncError {
        SyncError::InvalidManualValue {
            input: self.input.clone(),
            message: message.to_string(),
        }
    }
}

fn parse_decimal(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() || normalized.matches('.').count() > 1 {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
