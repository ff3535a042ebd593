//! Per-run state shared by every pipeline stage.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::info;

use lexcore_miner::MalformedInput;
use lexcore_shared::{Result, RunId};
use lexcore_storage::Storage;

use crate::classifier::TermClassifier;

/// State scoped to one run: created at its start, dropped at its end.
///
/// Holds the classification cache and code counter, the set of core unit
/// ids already produced (the cross-shard dedup key), and the diagnostics
/// collected along the way. Example ids are minted by the run's
/// [`CorpusMining`](lexcore_miner::CorpusMining).
#[derive(Debug)]
pub struct RunContext {
    pub run_id: RunId,
    /// Stamped on every unit built in this run.
    pub timestamp: DateTime<Utc>,
    pub classifier: TermClassifier,
    seen: HashSet<String>,
    skipped: Vec<String>,
    malformed: Vec<MalformedInput>,
}

impl RunContext {
    /// Fresh context with an empty seen set.
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            run_id: RunId::new(),
            timestamp,
            classifier: TermClassifier::new(),
            seen: HashSet::new(),
            skipped: Vec::new(),
            malformed: Vec::new(),
        }
    }

    /// Context for a resumed run: the seen set is rebuilt from the ids
    /// already persisted, so earlier units keep winning.
    pub async fn resume(storage: &Storage, timestamp: DateTime<Utc>) -> Result<Self> {
        let mut ctx = Self::new(timestamp);
        ctx.seen.extend(storage.list_core_unit_ids().await?);
        info!(run_id = %ctx.run_id, known = ctx.seen.len(), "resuming from stored units");
        Ok(ctx)
    }

    /// Claim `id` for this run. `false` when it was already produced.
    pub fn claim(&mut self, id: &str) -> bool {
        self.seen.insert(id.to_string())
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record a raw term that produced no unit.
    pub fn skip(&mut self, raw: impl Into<String>) {
        self.skipped.push(raw.into());
    }

    pub fn record_malformed(&mut self, inputs: impl IntoIterator<Item = MalformedInput>) {
        self.malformed.extend(inputs);
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn malformed(&self) -> &[MalformedInput] {
        &self.malformed
    }

    /// Number of ids claimed or loaded.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
