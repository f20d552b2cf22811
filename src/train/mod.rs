//! Training loop and KL annealing
//!
//! [`TrainingLoop`] drives the batch sampler, the external model, and the
//! [`AnnealingScheduler`] across steps: per-step loss accumulation,
//! periodic checkpoint + dev-set evaluation, and durable flushing of the
//! run's [`crate::tracking::Stats`].

mod annealing;
mod trainer;

pub use annealing::AnnealingScheduler;
pub use trainer::{perplexity, TrainingLoop};

use crate::model::ModelError;
use crate::tracking::TrackingError;

/// Errors that abort a training run
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// No training bucket has any pairs; bucket sampling would be
    /// undefined.
    #[error("training set has no populated buckets")]
    EmptyTrainSet,

    /// Every dev bucket is empty at evaluation time. A misconfigured run,
    /// not a condition to skip silently.
    #[error("dev set has no populated buckets")]
    EmptyDevSet,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Tracking(#[from] TrackingError),
}

/// Result alias for training operations
pub type Result<T> = std::result::Result<T, TrainError>;
