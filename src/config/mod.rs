//! Run configuration
//!
//! A run's hyperparameters are split the way they behave across resumes:
//! [`ModelParams`] describe the architecture and can never change once a
//! run exists; [`TrainParams`] steer training and may be overridden
//! explicitly at resume time. Both are captured in one immutable
//! [`HParams`] struct built at startup and passed by reference — a
//! resumed-run override produces a new struct, never a mutation.

mod cli;

pub use cli::{Cli, Command, InferArgs, InterpolateArgs, SampleArgs, TrainArgs};

use serde::{Deserialize, Serialize};

/// Errors from run configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed bucket selection: {0}")]
    BadBuckets(String),

    #[error("invalid training configuration: {0}")]
    InvalidTraining(String),
}

/// Architecture hyperparameters. Immutable across resumes: the persisted
/// value always wins over a resume-time request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Units per layer
    pub size: usize,
    /// Encoder/decoder layer count
    pub num_layers: usize,
    /// Latent space dimension
    pub latent_dim: usize,
    /// Source-side vocabulary size
    pub source_vocab_size: usize,
    /// Target-side vocabulary size
    pub target_vocab_size: usize,
    /// Indices into the canonical bucket table
    pub buckets: Vec<usize>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            size: 128,
            num_layers: 1,
            latent_dim: 64,
            source_vocab_size: 10_000,
            target_vocab_size: 10_000,
            buckets: vec![0, 1, 2],
        }
    }
}

/// Training hyperparameters. At resume, the persisted value wins only
/// when the requested one is still the documented default; an explicit
/// override takes precedence over the stale persisted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Gradient clip norm
    pub max_gradient_norm: f64,
    /// KL divergence threshold (lambda)
    pub kl_lambda: f64,
    /// Whether the KL weight ramps from 0 instead of starting at full
    pub annealing: bool,
    /// Step threshold after which the KL rate starts to rise
    pub kl_rate_rise_time: u64,
    /// KL-rate increment applied per checkpoint once rising
    pub kl_rate_rise_factor: f64,
    pub steps_per_checkpoint: u64,
    /// Probability of feeding the decoder its previous output instead of
    /// the unknown marker
    pub word_dropout_keep_prob: f64,
    /// Cap on ingested training pairs; 0 reads everything
    pub max_train_lines: usize,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            batch_size: 64,
            max_gradient_norm: 5.0,
            kl_lambda: 2.0,
            annealing: false,
            kl_rate_rise_time: 50_000,
            kl_rate_rise_factor: 0.01,
            steps_per_checkpoint: 2000,
            word_dropout_keep_prob: 1.0,
            max_train_lines: 0,
        }
    }
}

impl TrainParams {
    /// Reject configurations the loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_checkpoint == 0 {
            return Err(ConfigError::InvalidTraining("steps_per_checkpoint must be > 0".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidTraining("batch_size must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.word_dropout_keep_prob) {
            return Err(ConfigError::InvalidTraining(
                "word_dropout_keep_prob must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// The full hyperparameter set of a run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HParams {
    pub model: ModelParams,
    pub train: TrainParams,
}

impl HParams {
    /// Resolve the effective hyperparameters for a resumed run.
    ///
    /// Architecture cannot change across a resume, so the persisted model
    /// parameters win wholesale. Each training parameter keeps its
    /// persisted value unless the request explicitly moved it off the
    /// documented default.
    #[must_use]
    pub fn resume_merge(persisted: &HParams, requested: &HParams) -> HParams {
        let d = TrainParams::default();
        let p = &persisted.train;
        let r = &requested.train;

        let train = TrainParams {
            learning_rate: pick(p.learning_rate, r.learning_rate, d.learning_rate),
            batch_size: pick(p.batch_size, r.batch_size, d.batch_size),
            max_gradient_norm: pick(p.max_gradient_norm, r.max_gradient_norm, d.max_gradient_norm),
            kl_lambda: pick(p.kl_lambda, r.kl_lambda, d.kl_lambda),
            annealing: pick(p.annealing, r.annealing, d.annealing),
            kl_rate_rise_time: pick(p.kl_rate_rise_time, r.kl_rate_rise_time, d.kl_rate_rise_time),
            kl_rate_rise_factor: pick(
                p.kl_rate_rise_factor,
                r.kl_rate_rise_factor,
                d.kl_rate_rise_factor,
            ),
            steps_per_checkpoint: pick(
                p.steps_per_checkpoint,
                r.steps_per_checkpoint,
                d.steps_per_checkpoint,
            ),
            word_dropout_keep_prob: pick(
                p.word_dropout_keep_prob,
                r.word_dropout_keep_prob,
                d.word_dropout_keep_prob,
            ),
            max_train_lines: pick(p.max_train_lines, r.max_train_lines, d.max_train_lines),
        };

        HParams { model: persisted.model.clone(), train }
    }
}

/// Persisted wins while the request sits at the default; an explicit
/// override wins otherwise.
fn pick<T: PartialEq + Copy>(persisted: T, requested: T, default: T) -> T {
    if requested == default {
        persisted
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_defaults() {
        let hp = HParams::default();
        assert_eq!(hp.model.size, 128);
        assert_eq!(hp.model.latent_dim, 64);
        assert_eq!(hp.train.learning_rate, 0.001);
        assert_eq!(hp.train.steps_per_checkpoint, 2000);
        assert!(!hp.train.annealing);
    }

    #[test]
    fn test_resume_merge_architecture_is_immutable() {
        let mut persisted = HParams::default();
        persisted.model.latent_dim = 64;
        let mut requested = HParams::default();
        requested.model.latent_dim = 128;

        let effective = HParams::resume_merge(&persisted, &requested);
        assert_eq!(effective.model.latent_dim, 64);
    }

    #[test]
    fn test_resume_merge_default_training_value_yields() {
        // persisted learning rate happens to equal the default; the
        // request does not override it, so the persisted value continues
        let persisted = HParams::default();
        let requested = HParams::default();

        let effective = HParams::resume_merge(&persisted, &requested);
        assert_eq!(effective.train.learning_rate, 0.001);
    }

    #[test]
    fn test_resume_merge_explicit_override_wins() {
        let mut persisted = HParams::default();
        persisted.train.learning_rate = 0.001;
        let mut requested = HParams::default();
        requested.train.learning_rate = 0.0005;

        let effective = HParams::resume_merge(&persisted, &requested);
        assert_eq!(effective.train.learning_rate, 0.0005);
    }

    #[test]
    fn test_resume_merge_unspecified_keeps_persisted_non_default() {
        // a prior run trained with batch_size 32; resuming without an
        // override keeps 32, not the default 64
        let mut persisted = HParams::default();
        persisted.train.batch_size = 32;
        let requested = HParams::default();

        let effective = HParams::resume_merge(&persisted, &requested);
        assert_eq!(effective.train.batch_size, 32);
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let mut params = TrainParams::default();
        params.steps_per_checkpoint = 0;
        assert!(params.validate().is_err());

        let mut params = TrainParams::default();
        params.batch_size = 0;
        assert!(params.validate().is_err());

        let mut params = TrainParams::default();
        params.word_dropout_keep_prob = 1.5;
        assert!(params.validate().is_err());

        assert!(TrainParams::default().validate().is_ok());
    }
}
