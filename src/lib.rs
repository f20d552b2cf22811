//! Latente: variational sequence-to-sequence training core
//!
//! This crate provides the machinery needed to train a variational
//! encoder-decoder over variable-length token sequences, and to explore the
//! learned latent space afterwards:
//!
//! - Bucketed corpus loading and padded, weight-masked batch construction
//! - A size-proportional bucket sampler
//! - A training loop with KL annealing, checkpoint/eval cadence, and
//!   resumable run statistics
//! - Latent-space operations: encode, greedy decode, multi-sample, and
//!   linear interpolation between two encoded sentences
//!
//! The network itself is an external capability behind the [`model::Model`]
//! trait; this crate ships a deterministic reference backend
//! ([`model::ToyModel`]) used by the self-test mode and the test suite.
//!
//! # Example
//!
//! ```
//! use latente::data::{BatchSampler, BucketTable};
//!
//! let table = BucketTable::canonical();
//! let scale = BatchSampler::bucket_scale(&[10, 30, 60]);
//! let mut sampler = BatchSampler::with_seed(7);
//! let bucket_id = sampler.choose_bucket(&scale);
//! assert!(bucket_id < table.len());
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod latent;
pub mod model;
pub mod tracking;
pub mod train;

pub use config::HParams;
pub use data::{Batch, BatchSampler, BucketTable, DataSet};
pub use latent::{LatentOps, LatentVector};
pub use model::{Model, StepMode, StepOutput, ToyModel};
pub use tracking::{Stats, StatsStore};
pub use train::{AnnealingScheduler, TrainingLoop};

/// Crate-level error, aggregating the per-module error kinds so CLI
/// entry points can return a single type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Data(#[from] data::DataError),

    #[error(transparent)]
    Model(#[from] model::ModelError),

    #[error(transparent)]
    Latent(#[from] latent::LatentError),

    #[error(transparent)]
    Tracking(#[from] tracking::TrackingError),

    #[error(transparent)]
    Train(#[from] train::TrainError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-level result alias
pub type Result<T> = std::result::Result<T, Error>;
