//! The training loop
//!
//! Orchestrates bucket sampling, model steps, KL annealing, and the
//! checkpoint/eval cadence. The loop owns the run's accumulators, the
//! annealing rate, and the Stats record exclusively; nothing else mutates
//! them while a run is live.

use std::time::Instant;

use super::annealing::AnnealingScheduler;
use super::{Result, TrainError};
use crate::config::TrainParams;
use crate::data::{BatchSampler, BucketTable, DataSet};
use crate::model::{Checkpoint, Model, StepMode};
use crate::tracking::{MetricSeries, Stats, StatsBackend, StatsStore};

/// `exp(mean_loss)`, saturating to +infinity once the mean loss is large
/// enough to overflow the exponential.
#[must_use]
pub fn perplexity(mean_loss: f64) -> f64 {
    if mean_loss < 300.0 {
        mean_loss.exp()
    } else {
        f64::INFINITY
    }
}

/// Drives training until the host process stops it.
///
/// State machine: INIT (construction) → RUNNING → CHECKPOINT → RUNNING,
/// with no internal terminal state. Per-step model failures are not
/// retried; resumption happens at checkpoint granularity from the
/// persisted parameters and the last flushed Stats record.
#[derive(Debug)]
pub struct TrainingLoop<M: Model, C: Checkpoint, B: StatsBackend> {
    model: M,
    checkpoint: C,
    store: StatsStore<B>,
    stats: Stats,
    params: TrainParams,
    table: BucketTable,
    train_set: DataSet,
    dev_set: DataSet,
    bucket_scale: Vec<f64>,
    sampler: BatchSampler,
    annealing: AnnealingScheduler,

    // Running means over the checkpoint interval. Each step adds
    // loss / steps_per_checkpoint, so the normalization follows the
    // configured interval, not the realized step count.
    loss_acc: f64,
    kl_acc: f64,
    step_time_acc: f64,
    last_step_time: f64,
    run_start: Instant,
}

impl<M: Model, C: Checkpoint, B: StatsBackend> TrainingLoop<M, C, B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: M,
        checkpoint: C,
        store: StatsStore<B>,
        stats: Stats,
        params: TrainParams,
        table: BucketTable,
        train_set: DataSet,
        dev_set: DataSet,
    ) -> Result<Self> {
        debug_assert!(params.steps_per_checkpoint > 0);
        let sizes = train_set.bucket_sizes();
        if sizes.iter().sum::<usize>() == 0 {
            return Err(TrainError::EmptyTrainSet);
        }
        let bucket_scale = BatchSampler::bucket_scale(&sizes);
        let annealing = AnnealingScheduler::from_params(&params);

        Ok(Self {
            model,
            checkpoint,
            store,
            stats,
            params,
            table,
            train_set,
            dev_set,
            bucket_scale,
            sampler: BatchSampler::new(),
            annealing,
            loss_acc: 0.0,
            kl_acc: 0.0,
            step_time_acc: 0.0,
            last_step_time: 0.0,
            run_start: Instant::now(),
        })
    }

    /// Replace the batch sampler, usually with a seeded one
    #[must_use]
    pub fn with_sampler(mut self, sampler: BatchSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Train until the enclosing process is stopped or the model fails
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.step_once()?;
        }
    }

    /// Train for a bounded number of steps; checkpoints fire on cadence
    pub fn run_steps(&mut self, steps: u64) -> Result<()> {
        for _ in 0..steps {
            self.step_once()?;
        }
        Ok(())
    }

    fn step_once(&mut self) -> Result<()> {
        let bucket_id = self.sampler.choose_bucket(&self.bucket_scale);
        let batch =
            self.sampler.make_batch(&self.table, &self.train_set, bucket_id, self.params.batch_size);

        let started = Instant::now();
        let out = self.model.step(&batch, bucket_id, StepMode::Train)?;

        let interval = self.params.steps_per_checkpoint as f64;
        self.step_time_acc += started.elapsed().as_secs_f64() / interval;
        self.loss_acc += out.reconstruction_loss / interval;
        self.kl_acc += out.kl_loss / interval;

        let current_step = self.model.global_step();
        if current_step.is_multiple_of(self.params.steps_per_checkpoint) {
            self.checkpoint_boundary(current_step)?;
        }
        Ok(())
    }

    /// One checkpoint boundary: record train metrics, advance annealing,
    /// persist parameters, evaluate the dev set, flush stats, reset the
    /// accumulators.
    fn checkpoint_boundary(&mut self, step: u64) -> Result<()> {
        self.stats.record(MetricSeries::TrainPerplexity, step, perplexity(self.loss_acc));
        self.stats.record(MetricSeries::TrainKlDivergence, step, self.kl_acc);
        self.stats.record(MetricSeries::WallTime, step, self.run_start.elapsed().as_secs_f64());

        if self.annealing.advance(step) {
            self.model.set_kl_weight(self.annealing.rate());
        }

        self.checkpoint.save(step)?;

        let (eval_loss, eval_kl) = self.evaluate()?;
        self.stats.record(MetricSeries::EvalPerplexity, step, perplexity(eval_loss));
        self.stats.record(MetricSeries::EvalKlDivergence, step, eval_kl);

        self.store.flush(&self.stats)?;

        self.last_step_time = self.step_time_acc;
        self.loss_acc = 0.0;
        self.kl_acc = 0.0;
        self.step_time_acc = 0.0;
        Ok(())
    }

    /// One eval pass over every non-empty dev bucket, averaging the losses
    /// across buckets. An entirely empty dev set is a configuration error.
    fn evaluate(&mut self) -> Result<(f64, f64)> {
        let mut losses = 0.0;
        let mut kl_losses = 0.0;
        let mut populated = 0usize;

        for bucket_id in 0..self.table.len() {
            if self.dev_set.bucket(bucket_id).is_empty() {
                continue;
            }
            populated += 1;
            let batch = self.sampler.make_batch(
                &self.table,
                &self.dev_set,
                bucket_id,
                self.params.batch_size,
            );
            let out = self.model.step(&batch, bucket_id, StepMode::Eval)?;
            losses += out.reconstruction_loss;
            kl_losses += out.kl_loss;
        }

        if populated == 0 {
            return Err(TrainError::EmptyDevSet);
        }
        Ok((losses / populated as f64, kl_losses / populated as f64))
    }

    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    #[must_use]
    pub fn global_step(&self) -> u64 {
        self.model.global_step()
    }

    #[must_use]
    pub fn annealing_rate(&self) -> f64 {
        self.annealing.rate()
    }

    /// Mean seconds per step over the most recent completed checkpoint
    /// interval
    #[must_use]
    pub fn last_step_time(&self) -> f64 {
        self.last_step_time
    }
}
