//! Resumable run statistics
//!
//! One durable record per run: an immutable hyperparameters snapshot plus
//! append-only, step-indexed metric series. The record is the sole
//! mechanism for cross-run continuity of training curves — a resumed run
//! loads it, keeps appending, and flushes it at every checkpoint.
//!
//! # Example
//!
//! ```
//! use latente::config::HParams;
//! use latente::tracking::{InMemoryBackend, MetricSeries, StatsStore};
//!
//! let mut store = StatsStore::new(InMemoryBackend::new());
//! let mut stats = store.create("baseline", &HParams::default()).unwrap();
//! stats.record(MetricSeries::TrainPerplexity, 2000, 41.3);
//! store.flush(&stats).unwrap();
//!
//! // a second create for the same run must fail
//! assert!(store.create("baseline", &HParams::default()).is_err());
//! ```

pub mod storage;

pub use storage::{InMemoryBackend, JsonFileBackend, StatsBackend, StatsStorageError};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::HParams;

/// The metric series a run records, one map per series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSeries {
    TrainPerplexity,
    TrainKlDivergence,
    EvalPerplexity,
    EvalKlDivergence,
    /// Seconds since run start, measured at each checkpoint
    WallTime,
}

/// A run's durable statistics record.
///
/// The hyperparameters snapshot is written once at creation and never
/// mutated; the metric maps only grow. Step keys are strings in the
/// persisted JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub model_name: String,
    pub hyperparameters: HParams,
    pub train_perplexity: BTreeMap<String, f64>,
    pub train_kl_divergence: BTreeMap<String, f64>,
    pub eval_perplexity: BTreeMap<String, f64>,
    pub eval_kl_divergence: BTreeMap<String, f64>,
    pub wall_time: BTreeMap<String, f64>,
}

impl Stats {
    fn new(run_name: &str, hyperparameters: HParams) -> Self {
        Self {
            model_name: run_name.to_string(),
            hyperparameters,
            train_perplexity: BTreeMap::new(),
            train_kl_divergence: BTreeMap::new(),
            eval_perplexity: BTreeMap::new(),
            eval_kl_divergence: BTreeMap::new(),
            wall_time: BTreeMap::new(),
        }
    }

    /// Append a value for a step. Append-only: if the step was already
    /// recorded (a resumed run re-executing toward its last checkpoint),
    /// the first value stands.
    pub fn record(&mut self, series: MetricSeries, step: u64, value: f64) {
        self.series_mut(series).entry(step.to_string()).or_insert(value);
    }

    #[must_use]
    pub fn series(&self, series: MetricSeries) -> &BTreeMap<String, f64> {
        match series {
            MetricSeries::TrainPerplexity => &self.train_perplexity,
            MetricSeries::TrainKlDivergence => &self.train_kl_divergence,
            MetricSeries::EvalPerplexity => &self.eval_perplexity,
            MetricSeries::EvalKlDivergence => &self.eval_kl_divergence,
            MetricSeries::WallTime => &self.wall_time,
        }
    }

    fn series_mut(&mut self, series: MetricSeries) -> &mut BTreeMap<String, f64> {
        match series {
            MetricSeries::TrainPerplexity => &mut self.train_perplexity,
            MetricSeries::TrainKlDivergence => &mut self.train_kl_divergence,
            MetricSeries::EvalPerplexity => &mut self.eval_perplexity,
            MetricSeries::EvalKlDivergence => &mut self.eval_kl_divergence,
            MetricSeries::WallTime => &mut self.wall_time,
        }
    }

    /// The most recent value in a series, by step number
    #[must_use]
    pub fn latest(&self, series: MetricSeries) -> Option<(u64, f64)> {
        self.series(series)
            .iter()
            .filter_map(|(step, &value)| step.parse::<u64>().ok().map(|s| (s, value)))
            .max_by_key(|&(step, _)| step)
    }
}

/// Errors from run statistics management
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    /// Creating a run whose record already exists would silently overwrite
    /// a prior run's curve.
    #[error("stats record already exists for run {0:?}")]
    RunExists(String),

    #[error("no stats record for run {0:?}")]
    RunNotFound(String),

    #[error(transparent)]
    Storage(#[from] StatsStorageError),
}

/// Result alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Creates, loads, and durably flushes [`Stats`] records through a
/// pluggable backend.
#[derive(Debug)]
pub struct StatsStore<B: StatsBackend> {
    backend: B,
}

impl<B: StatsBackend> StatsStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Create and immediately persist a fresh record. Fails if one already
    /// exists for this run, leaving the existing record untouched.
    pub fn create(&mut self, run_name: &str, hyperparameters: &HParams) -> Result<Stats> {
        if self.backend.exists(run_name) {
            return Err(TrackingError::RunExists(run_name.to_string()));
        }
        let stats = Stats::new(run_name, hyperparameters.clone());
        self.backend.save(run_name, &stats)?;
        Ok(stats)
    }

    /// Load the persisted record for a run
    pub fn load(&self, run_name: &str) -> Result<Stats> {
        if !self.backend.exists(run_name) {
            return Err(TrackingError::RunNotFound(run_name.to_string()));
        }
        Ok(self.backend.load(run_name)?)
    }

    /// Durably overwrite the full record. Atomic and idempotent: a reader
    /// never observes a half-written record, and re-flushing unchanged
    /// stats is a no-op in effect.
    pub fn flush(&mut self, stats: &Stats) -> Result<()> {
        self.backend.save(&stats.model_name, stats)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
