//! The model capability boundary
//!
//! The network itself (embedding, encoder/decoder layers, loss and
//! gradient computation, optimizer step) lives behind the [`Model`] trait;
//! this crate orchestrates it but never looks inside. Parameter
//! persistence is a second capability, [`Checkpoint`].
//!
//! A deterministic reference backend, [`ToyModel`], backs the self-test
//! run mode and the test suite.

mod toy;
mod vocab;

pub use toy::ToyModel;
pub use vocab::Vocabulary;

use ndarray::Array2;

use crate::data::Batch;
use crate::latent::LatentVector;

/// Padding token id
pub const PAD_ID: u32 = 0;
/// Decoder start-of-sequence marker
pub const GO_ID: u32 = 1;
/// End-of-sequence marker
pub const EOS_ID: u32 = 2;
/// Unknown-token id
pub const UNK_ID: u32 = 3;

/// Number of reserved token ids; real vocabulary entries start here
pub const RESERVED_IDS: u32 = 4;

/// Whether a step updates parameters or only evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    Train,
    Eval,
}

/// Result of one model step over a batch
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Scalar reconstruction loss, averaged over the batch
    pub reconstruction_loss: f64,
    /// Scalar KL divergence loss
    pub kl_loss: f64,
    /// Per-step output logits, (target_steps, vocab_size); produced on
    /// request, unused by the training loop
    pub logits: Option<Array2<f32>>,
}

/// Opaque failure from the external model computation.
///
/// Never retried: a failed step terminates the training run, a failed
/// encode/decode fails the inference request.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model backend failure: {0}")]
    Backend(String),

    #[error("checkpoint failure: {0}")]
    Checkpoint(String),
}

/// The external network capability.
///
/// All calls are synchronous and block until the computation completes;
/// any parallelism inside is the implementation's own business.
pub trait Model {
    /// Run one forward (and, in [`StepMode::Train`], backward + update)
    /// pass over a batch, returning the two loss scalars.
    fn step(
        &mut self,
        batch: &Batch,
        bucket_id: usize,
        mode: StepMode,
    ) -> Result<StepOutput, ModelError>;

    /// Encode a single-sentence batch into its latent (mean, logvar).
    fn encode(&mut self, batch: &Batch, bucket_id: usize) -> Result<LatentVector, ModelError>;

    /// Decode a latent vector through a batch shell, returning logits of
    /// shape (target_steps, vocab_size). A non-zero logvar makes the
    /// decode a stochastic draw around the mean.
    fn decode(
        &mut self,
        latent: &LatentVector,
        batch: &Batch,
        bucket_id: usize,
    ) -> Result<Array2<f32>, ModelError>;

    /// Number of completed training steps, monotonically increasing and
    /// restored across resumes by the backend.
    fn global_step(&self) -> u64;

    /// Apply a new KL-weight from the annealing schedule.
    fn set_kl_weight(&mut self, weight: f64);
}

/// Parameter persistence capability, requested at every checkpoint
/// boundary.
pub trait Checkpoint {
    fn save(&mut self, step: u64) -> Result<(), ModelError>;
}

/// Checkpoint sink that records nothing. For tests and the self-test mode.
#[derive(Debug, Default)]
pub struct NullCheckpoint;

impl Checkpoint for NullCheckpoint {
    fn save(&mut self, _step: u64) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Writes a small JSON marker per checkpoint into the run directory.
///
/// Real backends persist their parameters here; the marker keeps the
/// cadence observable for backends (like [`ToyModel`]) that have none.
#[derive(Debug, Clone)]
pub struct MarkerCheckpoint {
    dir: std::path::PathBuf,
    run: String,
}

impl MarkerCheckpoint {
    pub fn new(dir: impl Into<std::path::PathBuf>, run: impl Into<String>) -> Self {
        Self { dir: dir.into(), run: run.into() }
    }

    #[must_use]
    pub fn path(&self, step: u64) -> std::path::PathBuf {
        self.dir.join(format!("{}.ckpt-{step}.json", self.run))
    }
}

impl Checkpoint for MarkerCheckpoint {
    fn save(&mut self, step: u64) -> Result<(), ModelError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ModelError::Checkpoint(e.to_string()))?;
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let info = format!(r#"{{"step": {step}, "timestamp": {timestamp}}}"#);
        std::fs::write(self.path(step), info)
            .map_err(|e| ModelError::Checkpoint(e.to_string()))?;
        Ok(())
    }
}
