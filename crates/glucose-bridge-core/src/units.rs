//! Blood glucose concentration units.
//!
//! Conversion uses the molar mass of glucose (180.182 g/mol), giving a fixed
//! factor of 18.0182 between mmol/L and mg/dL. Callers validate input before
//! converting; nothing here checks bounds.

use serde::{Deserialize, Serialize};

/// mg/dL per mmol/L.
pub const MG_PER_DL_PER_MMOL_PER_L: f64 = 18.0182;

/// Concentration unit a value was entered or received in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseUnit {
    #[default]
    MmolPerL,
    MgPerDl,
}

impl GlucoseUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            GlucoseUnit::MmolPerL => "mmol/L",
            GlucoseUnit::MgPerDl => "mg/dL",
        }
    }

    /// Express `value` (given in this unit) in mmol/L.
    pub fn to_mmol_per_l(&self, value: f64) -> f64 {
        match self {
            GlucoseUnit::MmolPerL => value,
            GlucoseUnit::MgPerDl => to_millimoles_per_liter(value),
        }
    }
}

/// Convert mmol/L to whole mg/dL, rounding half away from zero.
pub fn to_milligrams_per_deciliter(mmol_per_l: f64) -> i64 {
    (mmol_per_l * MG_PER_DL_PER_MMOL_PER_L).round() as i64
}

/// Convert mg/dL to mmol/L. Not rounded.
pub fn to_millimoles_per_liter(mg_per_dl: f64) -> f64 {
    mg_per_dl / MG_PER_DL_PER_MMOL_PER_L
}
