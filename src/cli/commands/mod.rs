//! CLI command handlers

mod decode;
mod interpolate;
mod sample;
mod train;

use std::fs;
use std::path::Path;

use super::logging::LogLevel;
use crate::config::{Cli, Command, InferArgs};
use crate::data::BucketTable;
use crate::model::{ToyModel, Vocabulary};
use crate::tracking::{JsonFileBackend, StatsStore};

/// Dispatch a parsed CLI invocation to its handler
pub fn run_command(cli: Cli) -> crate::Result<()> {
    let level = LogLevel::from_flags(cli.quiet, cli.verbose);

    match cli.command {
        Command::Train(args) => train::run_train(args, level),
        Command::Decode(args) => decode::run_decode(args, level),
        Command::Sample(args) => sample::run_sample(args, level),
        Command::Interpolate(args) => interpolate::run_interpolate(args, level),
        Command::SelfTest => self_test::run_self_test(level),
    }
}

/// Shared setup for the inference-mode commands: the architecture comes
/// from the run's persisted stats record, never from fresh defaults.
pub(crate) fn infer_context(
    args: &InferArgs,
) -> crate::Result<(BucketTable, Vocabulary, Vocabulary, ToyModel)> {
    let store = StatsStore::new(JsonFileBackend::new(&args.stats_dir));
    let stats = store.load(&args.run)?;
    let mparams = &stats.hyperparameters.model;

    let table = BucketTable::select(&mparams.buckets)?;
    let source_vocab = Vocabulary::load(&args.source_vocab_path(mparams.source_vocab_size))?;
    let target_vocab = Vocabulary::load(&args.target_vocab_path(mparams.target_vocab_size))?;
    // The reference backend emits ids over the vocabulary actually loaded
    let model = ToyModel::new(mparams.latent_dim, target_vocab.len());

    Ok((table, source_vocab, target_vocab, model))
}

/// Read an input file into one sentence per line
pub(crate) fn read_sentences(path: &Path) -> crate::Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Write output sentences, one per line
pub(crate) fn write_sentences(path: &Path, sentences: &[String]) -> crate::Result<()> {
    let mut text = sentences.join("\n");
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}
