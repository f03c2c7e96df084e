//! Sync orchestration: permission → fetch → parse → convert → write.
//!
//! A run always checks permission first and never touches the network
//! without it. Every run ends in an [`ImportResult`]; failures are classified
//! into an [`ErrorKind`](crate::error::ErrorKind) and never escape as errors.
//! Nothing is retried.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::error::{FetchError, PayloadError, Result, SyncError};
use crate::sync::fetcher::{BatchFetcher, RemoteBatchFetcher};
use crate::sync::manual::ManualEntry;
use crate::sync::payload::{self, ParsedBatch};
use crate::sync::permission::{PermissionCapability, PermissionGate};
use crate::sync::store::{HealthStore, HealthStoreWriter};
use crate::sync::types::{ConvertedReading, ImportResult, SyncStage};
use crate::token::ImportToken;

/// Drives one import at a time for a user action.
pub struct SyncOrchestrator {
    permissions: PermissionGate,
    fetcher: Arc<dyn BatchFetcher>,
    writer: HealthStoreWriter,
}

impl SyncOrchestrator {
    pub fn new(
        permissions: PermissionGate,
        fetcher: Arc<dyn BatchFetcher>,
        writer: HealthStoreWriter,
    ) -> Self {
        Self {
            permissions,
            fetcher,
            writer,
        }
    }

    /// Wire the HTTP fetcher from `config` to the given collaborators.
    pub fn from_config(
        config: &BridgeConfig,
        capability: Arc<dyn PermissionCapability>,
        store: Arc<dyn HealthStore>,
    ) -> Result<Self, FetchError> {
        let fetcher = RemoteBatchFetcher::new(config)?;
        Ok(Self::new(
            PermissionGate::new(capability),
            Arc::new(fetcher),
            HealthStoreWriter::new(store),
        ))
    }

    /// Import the batch addressed by `token`.
    ///
    /// A missing or blank token is reported only after permission was
    /// confirmed.
    pub async fn run(&self, token: Option<&str>, cancel: &CancellationToken) -> ImportResult {
        let token = token.and_then(ImportToken::new);
        self.run_token(token, cancel).await
    }

    /// Import the batch named by the `token` parameter of a launch link.
    pub async fn run_from_launch_uri(
        &self,
        uri: Option<&str>,
        cancel: &CancellationToken,
    ) -> ImportResult {
        let token = uri.and_then(ImportToken::from_launch_uri);
        self.run_token(token, cancel).await
    }

    async fn run_token(&self, token: Option<ImportToken>, cancel: &CancellationToken) -> ImportResult {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("import", %run_id);

        async move {
            let mut run = RunProgress::new();
            let outcome = self.execute(token, cancel, &mut run).await;
            run.finish(outcome)
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        token: Option<ImportToken>,
        cancel: &CancellationToken,
        run: &mut RunProgress,
    ) -> Result<usize> {
        run.advance(SyncStage::CheckingPermission);
        let state = cancellable(cancel, self.permissions.current_state()).await?;
        if !state.is_granted() {
            tracing::info!(?state, "Write permission not granted");
            return Err(SyncError::PermissionDenied);
        }

        let token = token.ok_or(SyncError::MissingToken)?;

        run.advance(SyncStage::Fetching);
        let body = cancellable(cancel, self.fetcher.fetch(&token)).await??;

        run.advance(SyncStage::Parsing);
        let batch = tokio::task::spawn_blocking(move || payload::parse(&body))
            .await
            .map_err(|err| PayloadError::Interrupted(err.to_string()))??;
        run.attempted = batch.attempted();

        run.advance(SyncStage::Converting);
        let readings = tokio::task::spawn_blocking(move || convert_batch(&batch))
            .await
            .map_err(|err| PayloadError::Interrupted(err.to_string()))?;

        if readings.is_empty() {
            return Err(SyncError::NothingToImport {
                attempted: run.attempted,
            });
        }

        // Last point where cancelling has an effect; the write is not undone.
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        run.advance(SyncStage::Writing);
        let written = self.writer.write(&readings).await?;
        Ok(written)
    }

    /// Write one hand-typed reading. Same permission rule as a batch run.
    pub async fn record_manual(&self, entry: &ManualEntry) -> ImportResult {
        let span = tracing::info_span!("manual_entry", unit = entry.unit.symbol());

        async move {
            let mut run = RunProgress::new();
            run.attempted = 1;
            let outcome = self.execute_manual(entry, &mut run).await;
            run.finish(outcome)
        }
        .instrument(span)
        .await
    }

    async fn execute_manual(&self, entry: &ManualEntry, run: &mut RunProgress) -> Result<usize> {
        run.advance(SyncStage::CheckingPermission);
        if !self.permissions.current_state().await.is_granted() {
            return Err(SyncError::PermissionDenied);
        }

        run.advance(SyncStage::Converting);
        let reading = entry.validate()?;
        let converted = ConvertedReading::from_validated(&reading).ok_or_else(|| {
            SyncError::InvalidManualValue {
                input: entry.input.clone(),
                message: "cannot be converted".to_string(),
            }
        })?;

        run.advance(SyncStage::Writing);
        Ok(self.writer.write(&[converted]).await?)
    }
}

/// Convert every reading, dropping any the converter refuses.
fn convert_batch(batch: &ParsedBatch) -> Vec<ConvertedReading> {
    batch
        .readings()
        .filter_map(|reading| {
            let converted = ConvertedReading::from_validated(&reading);
            if converted.is_none() {
                tracing::debug!(
                    timestamp = %reading.timestamp_utc,
                    "Skipping reading the converter rejected"
                );
            }
            converted
        })
        .collect()
}

/// Resolve `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Stage and item count of the run in flight.
struct RunProgress {
    stage: SyncStage,
    attempted: usize,
}

impl RunProgress {
    fn new() -> Self {
        Self {
            stage: SyncStage::Init,
            attempted: 0,
        }
    }

    fn advance(&mut self, next: SyncStage) {
        tracing::debug!(from = %self.stage, to = %next, "Sync stage");
        self.stage = next;
    }

    fn finish(mut self, outcome: Result<usize>) -> ImportResult {
        match outcome {
            Ok(written) => {
                self.advance(SyncStage::Done);
                let result = ImportResult::completed(self.attempted, written);
                tracing::info!(
                    attempted = result.attempted(),
                    written = result.written(),
                    skipped = result.skipped(),
                    "Import finished"
                );
                result
            }
            Err(err) => {
                let failed_at = self.stage;
                self.advance(SyncStage::Aborted);
                let kind = err.kind();
                if kind.is_informational() {
                    tracing::info!(attempted = self.attempted, reason = %kind, "Nothing to import");
                } else {
                    tracing::warn!(
                        stage = %failed_at,
                        reason = %kind,
                        error = %err,
                        "Import aborted"
                    );
                }
                ImportResult::aborted(self.attempted, kind)
            }
        }
    }
}
