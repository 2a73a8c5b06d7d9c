//! Thread-safe counters shared by the walker and the aggregator

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::model::{ExclusionReason, ProcessingMethod, ProcessingStatistics, ScanStatistics};

#[derive(Debug, Default)]
struct Counters {
    seen: usize,
    included: usize,
    skipped: usize,
    per_reason: BTreeMap<ExclusionReason, usize>,
    bytes: u64,
    lossy: usize,
    errors: Vec<String>,
}

/// Mutex-guarded accumulator.
///
/// Every mutation takes the single lock, so counters and the error list
/// always agree with each other. Snapshots are plain values.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    inner: Mutex<Counters>,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // Counters stay consistent even if a holder panicked mid-update
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_seen(&self) {
        self.lock().seen += 1;
    }

    pub fn record_included(&self) {
        self.lock().included += 1;
    }

    /// Count a file as skipped for `reason`
    pub fn record_skipped(&self, reason: ExclusionReason) {
        let mut counters = self.lock();
        counters.skipped += 1;
        *counters.per_reason.entry(reason).or_insert(0) += 1;
    }

    /// Count a skip and attach its error message in one step
    pub fn record_failure(&self, reason: ExclusionReason, error: impl Into<String>) {
        let mut counters = self.lock();
        counters.skipped += 1;
        *counters.per_reason.entry(reason).or_insert(0) += 1;
        counters.errors.push(error.into());
    }

    /// Count a pruned directory; it is not a file and does not touch the
    /// file reconciliation
    pub fn record_pruned_directory(&self) {
        *self
            .lock()
            .per_reason
            .entry(ExclusionReason::ExcludedDirectory)
            .or_insert(0) += 1;
    }

    pub fn record_error(&self, error: impl Into<String>) {
        self.lock().errors.push(error.into());
    }

    pub fn add_bytes(&self, bytes: u64) {
        self.lock().bytes += bytes;
    }

    pub fn record_lossy(&self) {
        self.lock().lossy += 1;
    }

    pub fn scan_snapshot(&self) -> ScanStatistics {
        let counters = self.lock();
        ScanStatistics {
            total_files_seen: counters.seen,
            files_included: counters.included,
            files_skipped: counters.skipped,
            per_reason_counts: counters.per_reason.clone(),
            errors: counters.errors.clone(),
        }
    }

    /// Snapshot for a concatenation; "included" counts concatenated files
    pub fn processing_snapshot(
        &self,
        selected_files: usize,
        method: ProcessingMethod,
        worker_count: usize,
    ) -> ProcessingStatistics {
        let counters = self.lock();
        ProcessingStatistics {
            selected_files,
            concatenated_files: counters.included,
            skipped_files: counters.skipped,
            per_reason_counts: counters.per_reason.clone(),
            total_bytes_processed: counters.bytes,
            lossy_files: counters.lossy,
            processing_method: method,
            worker_count,
            errors: counters.errors.clone(),
            ..Default::default()
        }
    }
}
