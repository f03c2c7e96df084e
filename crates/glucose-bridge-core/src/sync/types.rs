//! Core types for batch import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::units::to_milligrams_per_deciliter;

/// A reading that passed item-level validation.
///
/// `concentration_mmol_per_l` is finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedReading {
    pub timestamp_utc: DateTime<Utc>,
    pub concentration_mmol_per_l: f64,
    /// Offset the source timestamp was written with; `None` when it had none.
    pub utc_offset_seconds: Option<i32>,
}

/// A validated reading with both concentration representations.
///
/// mmol/L is the canonical value handed to the store; mg/dL is informational.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvertedReading {
    pub timestamp_utc: DateTime<Utc>,
    pub concentration_mmol_per_l: f64,
    pub concentration_mg_per_dl: i64,
    pub utc_offset_seconds: Option<i32>,
}

impl ConvertedReading {
    /// The only way to build a `ConvertedReading`.
    ///
    /// `None` when the concentration is not finite and positive, which
    /// validated input never is.
    pub fn from_validated(reading: &ValidatedReading) -> Option<Self> {
        let mmol = reading.concentration_mmol_per_l;
        if !mmol.is_finite() || mmol <= 0.0 {
            return None;
        }
        Some(Self {
            timestamp_utc: reading.timestamp_utc,
            concentration_mmol_per_l: mmol,
            concentration_mg_per_dl: to_milligrams_per_deciliter(mmol),
            utc_offset_seconds: reading.utc_offset_seconds,
        })
    }
}

/// Write-authorization state for blood glucose. Re-queried on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    Unknown,
    Denied,
    Granted,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }
}

/// Stages of one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Init,
    CheckingPermission,
    Fetching,
    Parsing,
    Converting,
    Writing,
    Done,
    Aborted,
}

impl SyncStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStage::Init => "init",
            SyncStage::CheckingPermission => "checking_permission",
            SyncStage::Fetching => "fetching",
            SyncStage::Parsing => "parsing",
            SyncStage::Converting => "converting",
            SyncStage::Writing => "writing",
            SyncStage::Done => "done",
            SyncStage::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStage::Done | SyncStage::Aborted)
    }
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one sync run, handed to the caller for display.
///
/// Built once when the run ends and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    attempted: usize,
    written: usize,
    skipped: usize,
    failure_reason: Option<ErrorKind>,
}

impl ImportResult {
    /// Successful write of `written` out of `attempted` items.
    pub fn completed(attempted: usize, written: usize) -> Self {
        Self {
            attempted,
            written,
            skipped: attempted.saturating_sub(written),
            failure_reason: None,
        }
    }

    /// Run ended early; nothing was committed.
    pub fn aborted(attempted: usize, reason: ErrorKind) -> Self {
        Self {
            attempted,
            written: 0,
            skipped: attempted,
            failure_reason: Some(reason),
        }
    }

    /// Items in the batch before per-item filtering.
    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Records accepted by the store.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn failure_reason(&self) -> Option<ErrorKind> {
        self.failure_reason
    }

    pub fn is_success(&self) -> bool {
        self.failure_reason.is_none()
    }

    /// Text for the status line shown after a run.
    pub fn status_message(&self) -> String {
        match self.failure_reason {
            None if self.skipped == 0 => format!("Imported {} reading(s).", self.written),
            None => format!(
                "Imported {} reading(s), skipped {} invalid.",
                self.written, self.skipped
            ),
            Some(kind) => kind.status_message().to_string(),
        }
    }
}
