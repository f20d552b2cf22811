//! Deterministic reference model backend
//!
//! `ToyModel` implements the [`Model`] capability with no learned
//! parameters: encodings are a fixed mixing of the input tokens, decodes
//! hash the latent point into a short token sequence, and step losses
//! follow a smooth decay in the global step. That is enough to exercise
//! the entire training and latent-space pipeline end to end, which is what
//! the self-test mode and the test suite need from it.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Model, ModelError, StepMode, StepOutput, EOS_ID, PAD_ID, RESERVED_IDS};
use crate::data::Batch;
use crate::latent::LatentVector;

#[derive(Debug)]
pub struct ToyModel {
    latent_dim: usize,
    vocab_size: usize,
    kl_weight: f64,
    global_step: u64,
    rng: StdRng,
}

impl ToyModel {
    /// Backend seeded from the operating system
    #[must_use]
    pub fn new(latent_dim: usize, vocab_size: usize) -> Self {
        Self::with_rng(latent_dim, vocab_size, StdRng::from_os_rng())
    }

    /// Seeded backend for reproducible stochastic decodes
    #[must_use]
    pub fn with_seed(latent_dim: usize, vocab_size: usize, seed: u64) -> Self {
        Self::with_rng(latent_dim, vocab_size, StdRng::seed_from_u64(seed))
    }

    /// Restore the completed-step counter, as a real backend does when it
    /// reloads checkpointed parameters.
    #[must_use]
    pub fn with_global_step(mut self, step: u64) -> Self {
        self.global_step = step;
        self
    }

    fn with_rng(latent_dim: usize, vocab_size: usize, rng: StdRng) -> Self {
        assert!(
            vocab_size > RESERVED_IDS as usize,
            "vocabulary must extend past the reserved ids"
        );
        Self { latent_dim, vocab_size, kl_weight: 1.0, global_step: 0, rng }
    }

    /// Fixed mixing coefficient tying (time step, latent dimension) pairs
    /// to a value in [-0.5, 0.5]
    fn phi(t: usize, d: usize) -> f32 {
        ((t * 31 + d * 17) % 101) as f32 / 101.0 - 0.5
    }

    /// Standard normal draw via Box-Muller
    fn normal(&mut self) -> f32 {
        let u1: f64 = self.rng.random::<f64>().max(1e-10);
        let u2: f64 = self.rng.random::<f64>();
        ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
    }

    /// The latent point a decode works from: the mean, perturbed per
    /// dimension when the logvar is non-zero. A zero logvar consumes no
    /// randomness, so the mode decode is bit-identical across calls.
    fn draw_point(&mut self, latent: &LatentVector) -> Array1<f32> {
        let mut point = latent.mean.clone();
        for (value, &logvar) in point.iter_mut().zip(latent.logvar.iter()) {
            if logvar != 0.0 {
                *value += self.normal() * (logvar / 2.0).exp();
            }
        }
        point
    }

    fn score(point: &Array1<f32>, t: usize) -> f32 {
        point.iter().enumerate().map(|(d, &z)| z * Self::phi(t, d)).sum()
    }

    fn content_token(&self, point: &Array1<f32>, t: usize) -> u32 {
        let span = (self.vocab_size - RESERVED_IDS as usize) as u64;
        let k = (Self::score(point, t + 1).abs() * 9973.0) as u64;
        RESERVED_IDS + (k % span) as u32
    }
}

impl Model for ToyModel {
    fn step(
        &mut self,
        _batch: &Batch,
        bucket_id: usize,
        mode: StepMode,
    ) -> Result<StepOutput, ModelError> {
        if mode == StepMode::Train {
            self.global_step += 1;
        }
        let step = self.global_step as f64;
        let eval_offset = if mode == StepMode::Eval { 0.25 } else { 0.0 };
        let reconstruction_loss =
            4.0 / (1.0 + step / 500.0) + 0.05 * (bucket_id as f64 + 1.0) + eval_offset;
        let kl_loss = self.kl_weight * 2.0 / (1.0 + step / 800.0);

        Ok(StepOutput { reconstruction_loss, kl_loss, logits: None })
    }

    fn encode(&mut self, batch: &Batch, _bucket_id: usize) -> Result<LatentVector, ModelError> {
        let column = batch.encoder_inputs.column(0);
        let tokens: Vec<u32> = column.iter().copied().filter(|&t| t != PAD_ID).collect();

        let mut mean = Array1::zeros(self.latent_dim);
        let norm = tokens.len().max(1) as f32;
        for d in 0..self.latent_dim {
            let acc: f32 = tokens
                .iter()
                .enumerate()
                .map(|(t, &tok)| (tok as f32 * 0.37 + t as f32 * 0.11 + d as f32 * 1.93).sin())
                .sum();
            mean[d] = acc / norm;
        }
        let logvar = Array1::from_elem(self.latent_dim, -2.0f32);

        Ok(LatentVector::new(mean, logvar))
    }

    fn decode(
        &mut self,
        latent: &LatentVector,
        batch: &Batch,
        _bucket_id: usize,
    ) -> Result<Array2<f32>, ModelError> {
        let steps = batch.target_steps();
        let point = self.draw_point(latent);

        // Content length derived from the latent point, clamped so EOS
        // always fits inside the fixed-length output.
        let span = (steps.saturating_sub(2)).clamp(1, 6);
        let length = (2 + (Self::score(&point, 0).abs() * 997.0) as usize % span).min(steps - 1);

        let mut logits = Array2::zeros((steps, self.vocab_size));
        for t in 0..steps {
            let token = match t.cmp(&length) {
                std::cmp::Ordering::Less => self.content_token(&point, t),
                std::cmp::Ordering::Equal => EOS_ID,
                std::cmp::Ordering::Greater => PAD_ID,
            };
            logits[[t, token as usize]] = 1.0;
        }
        Ok(logits)
    }

    fn global_step(&self) -> u64 {
        self.global_step
    }

    fn set_kl_weight(&mut self, weight: f64) {
        self.kl_weight = weight;
    }
}
