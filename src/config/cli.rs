//! CLI surface: the `Cli` struct, subcommands, and their argument sets

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::{HParams, ModelParams, TrainParams};

/// Latente: variational sequence-to-sequence training
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "latente")]
#[command(author = "PAIML")]
#[command(version)]
#[command(about = "Variational sequence-to-sequence training and latent-space exploration")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Train a run (or resume one) until the process is stopped
    Train(TrainArgs),

    /// Greedy-decode each input sentence through the latent space
    Decode(InferArgs),

    /// Draw N samples around one input sentence's encoding
    Sample(SampleArgs),

    /// Interpolate between two input sentences in latent space
    Interpolate(InterpolateArgs),

    /// Exercise the full pipeline on synthetic data
    SelfTest,
}

/// Arguments for the train command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct TrainArgs {
    /// Run identifier; names the stats record and checkpoint files
    #[arg(long, default_value = "translate")]
    pub run: String,

    /// Resume the run instead of creating a new one
    #[arg(long)]
    pub resume: bool,

    /// Directory holding corpus and vocabulary files
    #[arg(long, default_value = "corpus/line_based")]
    pub data_dir: PathBuf,

    /// Directory for model checkpoints
    #[arg(long, default_value = "models")]
    pub train_dir: PathBuf,

    /// Directory for per-run stats records
    #[arg(long, default_value = "stats")]
    pub stats_dir: PathBuf,

    /// Override the training source-token file
    #[arg(long)]
    pub train_source: Option<PathBuf>,

    /// Override the training target-token file
    #[arg(long)]
    pub train_target: Option<PathBuf>,

    /// Override the dev source-token file
    #[arg(long)]
    pub dev_source: Option<PathBuf>,

    /// Override the dev target-token file
    #[arg(long)]
    pub dev_target: Option<PathBuf>,

    /// Units per model layer
    #[arg(long, default_value_t = 128)]
    pub size: usize,

    /// Number of encoder/decoder layers
    #[arg(long, default_value_t = 1)]
    pub num_layers: usize,

    /// Latent space dimension
    #[arg(long, default_value_t = 64)]
    pub latent_dim: usize,

    /// Source vocabulary size
    #[arg(long, default_value_t = 10_000)]
    pub source_vocab_size: usize,

    /// Target vocabulary size
    #[arg(long, default_value_t = 10_000)]
    pub target_vocab_size: usize,

    /// Bucket indices to use, from the canonical table
    #[arg(long, value_delimiter = ',', default_values_t = [0, 1, 2])]
    pub buckets: Vec<usize>,

    /// Learning rate
    #[arg(long, default_value_t = 0.001)]
    pub learning_rate: f64,

    /// Batch size during training
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Clip gradients to this norm
    #[arg(long, default_value_t = 5.0)]
    pub max_gradient_norm: f64,

    /// KL divergence threshold
    #[arg(long, default_value_t = 2.0)]
    pub kl_lambda: f64,

    /// Ramp the KL weight from 0 instead of applying it in full
    #[arg(long)]
    pub annealing: bool,

    /// Step at which the KL rate starts to rise
    #[arg(long, default_value_t = 50_000)]
    pub kl_rate_rise_time: u64,

    /// KL-rate increase applied per checkpoint once rising
    #[arg(long, default_value_t = 0.01)]
    pub kl_rate_rise_factor: f64,

    /// Training steps per checkpoint
    #[arg(long, default_value_t = 2000)]
    pub steps_per_checkpoint: u64,

    /// Probability of feeding the decoder its previous output instead of
    /// the unknown marker
    #[arg(long, default_value_t = 1.0)]
    pub word_dropout_keep_prob: f64,

    /// Limit on ingested training pairs (0: no limit)
    #[arg(long, default_value_t = 0)]
    pub max_train_lines: usize,
}

impl TrainArgs {
    /// The hyperparameters this invocation requests
    #[must_use]
    pub fn hparams(&self) -> HParams {
        HParams {
            model: ModelParams {
                size: self.size,
                num_layers: self.num_layers,
                latent_dim: self.latent_dim,
                source_vocab_size: self.source_vocab_size,
                target_vocab_size: self.target_vocab_size,
                buckets: self.buckets.clone(),
            },
            train: TrainParams {
                learning_rate: self.learning_rate,
                batch_size: self.batch_size,
                max_gradient_norm: self.max_gradient_norm,
                kl_lambda: self.kl_lambda,
                annealing: self.annealing,
                kl_rate_rise_time: self.kl_rate_rise_time,
                kl_rate_rise_factor: self.kl_rate_rise_factor,
                steps_per_checkpoint: self.steps_per_checkpoint,
                word_dropout_keep_prob: self.word_dropout_keep_prob,
                max_train_lines: self.max_train_lines,
            },
        }
    }

    #[must_use]
    pub fn train_source(&self) -> PathBuf {
        self.train_source.clone().unwrap_or_else(|| self.data_dir.join("train.source.ids"))
    }

    #[must_use]
    pub fn train_target(&self) -> PathBuf {
        self.train_target.clone().unwrap_or_else(|| self.data_dir.join("train.target.ids"))
    }

    #[must_use]
    pub fn dev_source(&self) -> PathBuf {
        self.dev_source.clone().unwrap_or_else(|| self.data_dir.join("dev.source.ids"))
    }

    #[must_use]
    pub fn dev_target(&self) -> PathBuf {
        self.dev_target.clone().unwrap_or_else(|| self.data_dir.join("dev.target.ids"))
    }
}

/// Arguments shared by the inference-mode commands
#[derive(Args, Debug, Clone, PartialEq)]
pub struct InferArgs {
    /// Run identifier of the trained model
    #[arg(long, default_value = "translate")]
    pub run: String,

    /// Directory holding corpus and vocabulary files
    #[arg(long, default_value = "corpus/line_based")]
    pub data_dir: PathBuf,

    /// Directory for per-run stats records
    #[arg(long, default_value = "stats")]
    pub stats_dir: PathBuf,

    /// Input file, one sentence per line
    #[arg(long, default_value = "input.txt")]
    pub input_file: PathBuf,

    /// Override the source vocabulary file
    #[arg(long)]
    pub source_vocab: Option<PathBuf>,

    /// Override the target vocabulary file
    #[arg(long)]
    pub target_vocab: Option<PathBuf>,
}

impl InferArgs {
    #[must_use]
    pub fn source_vocab_path(&self, vocab_size: usize) -> PathBuf {
        self.source_vocab
            .clone()
            .unwrap_or_else(|| self.data_dir.join(format!("vocab{vocab_size}.source")))
    }

    #[must_use]
    pub fn target_vocab_path(&self, vocab_size: usize) -> PathBuf {
        self.target_vocab
            .clone()
            .unwrap_or_else(|| self.data_dir.join(format!("vocab{vocab_size}.target")))
    }
}

/// Arguments for the sample command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct SampleArgs {
    #[command(flatten)]
    pub infer: InferArgs,

    /// Number of samples to draw around the encoding
    #[arg(long, default_value_t = 5)]
    pub num_samples: usize,
}

/// Arguments for the interpolate command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct InterpolateArgs {
    #[command(flatten)]
    pub infer: InferArgs,

    /// Number of evenly spaced points, endpoints included
    #[arg(long, default_value_t = 3)]
    pub num_pts: usize,
}
