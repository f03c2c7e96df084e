//! Health store seam and the bulk writer.
//!
//! The store is all-or-nothing per call: a failed insert means none of the
//! records were committed. Records are not deduplicated against earlier
//! imports, so importing the same batch twice stores it twice.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::sync::types::ConvertedReading;

/// Where the blood sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecimenSource {
    #[default]
    Unknown,
    InterstitialFluid,
    CapillaryBlood,
    Plasma,
    Serum,
    Tears,
    WholeBlood,
}

/// Timing of the reading relative to a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationToMeal {
    #[default]
    Unknown,
    General,
    Fasting,
    BeforeMeal,
    AfterMeal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    #[default]
    Unknown,
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

/// Store-facing shape of one blood glucose record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseRecord {
    pub time: DateTime<Utc>,
    pub zone_offset_seconds: Option<i32>,
    /// Canonical store unit.
    pub level_mmol_per_l: f64,
    pub specimen_source: SpecimenSource,
    pub relation_to_meal: RelationToMeal,
    pub meal_type: MealType,
}

impl From<&ConvertedReading> for GlucoseRecord {
    fn from(reading: &ConvertedReading) -> Self {
        Self {
            time: reading.timestamp_utc,
            zone_offset_seconds: reading.utc_offset_seconds,
            level_mmol_per_l: reading.concentration_mmol_per_l,
            specimen_source: SpecimenSource::Unknown,
            relation_to_meal: RelationToMeal::Unknown,
            meal_type: MealType::Unknown,
        }
    }
}

/// External health store.
#[async_trait]
pub trait HealthStore: Send + Sync {
    /// Insert all records in one call. Success or failure applies to the
    /// whole list.
    async fn insert_glucose_records(&self, records: Vec<GlucoseRecord>) -> Result<(), StoreError>;
}

/// Commits converted readings in a single bulk call.
#[derive(Clone)]
pub struct HealthStoreWriter {
    store: Arc<dyn HealthStore>,
}

impl HealthStoreWriter {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self { store }
    }

    /// Write every reading or none of them.
    ///
    /// Returns the number written, which on success is `readings.len()`.
    pub async fn write(&self, readings: &[ConvertedReading]) -> Result<usize, StoreError> {
        let records: Vec<GlucoseRecord> = readings.iter().map(GlucoseRecord::from).collect();
        let count = records.len();

        self.store.insert_glucose_records(records).await?;

        tracing::debug!(count, "Glucose records committed");
        Ok(count)
    }
}

/// Store kept in process memory.
///
/// Used where no platform store exists and as the test double for the
/// pipeline. Can be told to fail the next inserts.
#[derive(Debug, Default)]
pub struct InMemoryHealthStore {
    records: Mutex<Vec<GlucoseRecord>>,
    failure: Mutex<Option<StoreError>>,
    insert_calls: AtomicUsize,
}

impl InMemoryHealthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following insert fail with `err` until cleared.
    pub fn fail_with(&self, err: StoreError) {
        *lock(&self.failure) = Some(err);
    }

    pub fn clear_failure(&self) {
        *lock(&self.failure) = None;
    }

    /// Snapshot of the committed records.
    pub fn records(&self) -> Vec<GlucoseRecord> {
        lock(&self.records).clone()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthStore for InMemoryHealthStore {
    async fn insert_glucose_records(&self, records: Vec<GlucoseRecord>) -> Result<(), StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.failure).clone() {
            return Err(err);
        }
        lock(&self.records).extend(records);
        Ok(())
    }
}

// Poisoning is ignored: each guarded value is replaced or extended whole.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

static SHARED_STORE: OnceLock<Arc<dyn HealthStore>> = OnceLock::new();

/// Process-wide store handle, created by `init` on first use and reused
/// afterwards. Later `init` closures are ignored.
pub fn shared_store<F>(init: F) -> Arc<dyn HealthStore>
where
    F: FnOnce() -> Arc<dyn HealthStore>,
{
    SHARED_STORE.get_or_init(init).clone()
}

/// Install the process-wide handle up front.
///
/// Returns `false` when a handle already exists; the existing one is kept.
pub fn install_shared_store(store: Arc<dyn HealthStore>) -> bool {
    SHARED_STORE.set(store).is_ok()
}
