//! Train command implementation

use crate::cli::logging::{log, LogLevel};
use crate::config::{HParams, TrainArgs};
use crate::data::{read_data, BucketTable};
use crate::model::{MarkerCheckpoint, ToyModel};
use crate::tracking::{JsonFileBackend, MetricSeries, StatsStore};
use crate::train::TrainingLoop;

pub fn run_train(args: TrainArgs, level: LogLevel) -> crate::Result<()> {
    let requested = args.hparams();
    requested.train.validate()?;

    let mut store = StatsStore::new(JsonFileBackend::new(&args.stats_dir));
    let (stats, effective) = if args.resume {
        let loaded = store.load(&args.run)?;
        let effective = HParams::resume_merge(&loaded.hyperparameters, &requested);
        log(level, LogLevel::Normal, &format!("Resuming run {} from its stats record", args.run));
        (loaded, effective)
    } else {
        // Creating over an existing record is fatal before any training
        let stats = store.create(&args.run, &requested)?;
        (stats, requested)
    };
    effective.train.validate()?;

    let table = BucketTable::select(&effective.model.buckets)?;
    log(
        level,
        LogLevel::Normal,
        &format!(
            "Creating {} layers of {} units (latent dim {})",
            effective.model.num_layers, effective.model.size, effective.model.latent_dim
        ),
    );

    log(
        level,
        LogLevel::Normal,
        &format!("Reading development and training data (limit: {})", effective.train.max_train_lines),
    );
    let train_set = read_data(
        &table,
        &args.train_source(),
        &args.train_target(),
        Some(effective.train.max_train_lines),
    )?;
    let dev_set = read_data(&table, &args.dev_source(), &args.dev_target(), None)?;
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  train pairs per bucket: {:?}; dev pairs per bucket: {:?}",
            train_set.bucket_sizes(),
            dev_set.bucket_sizes()
        ),
    );

    let model = ToyModel::new(effective.model.latent_dim, effective.model.target_vocab_size);
    let checkpoint = MarkerCheckpoint::new(args.train_dir.join(&args.run), &args.run);
    let interval = effective.train.steps_per_checkpoint;

    let mut training = TrainingLoop::new(
        model,
        checkpoint,
        store,
        stats,
        effective.train.clone(),
        table,
        train_set,
        dev_set,
    )?;

    // Runs until the process is stopped; one summary line per checkpoint.
    loop {
        training.run_steps(interval)?;
        if let Some((step, ppx)) = training.stats().latest(MetricSeries::TrainPerplexity) {
            log(
                level,
                LogLevel::Normal,
                &format!(
                    "global step {step} step-time {:.2} train perplexity {ppx:.2}",
                    training.last_step_time()
                ),
            );
        }
        if let Some((_, kl)) = training.stats().latest(MetricSeries::TrainKlDivergence) {
            log(level, LogLevel::Verbose, &format!("  train KL divergence {kl:.4}"));
        }
        if let Some((_, ppx)) = training.stats().latest(MetricSeries::EvalPerplexity) {
            log(level, LogLevel::Normal, &format!("  eval: mean perplexity {ppx:.2}"));
        }
    }
}
