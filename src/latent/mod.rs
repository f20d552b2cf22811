//! Latent-space operations
//!
//! Workflows built on the model's encode/decode primitives: encoding a
//! sentence to its latent (mean, logvar), greedy decoding of latent
//! points, drawing several samples around one encoding, and linear
//! interpolation between two encodings.
//!
//! # Example
//!
//! ```
//! use latente::data::BucketTable;
//! use latente::latent::LatentOps;
//! use latente::model::{ToyModel, Vocabulary};
//!
//! let table = BucketTable::canonical();
//! let vocab = Vocabulary::from_tokens(
//!     ["_PAD", "_GO", "_EOS", "_UNK", "hola", "mundo"]
//!         .iter().map(|s| s.to_string()).collect(),
//! );
//! let mut model = ToyModel::with_seed(8, vocab.len(), 7);
//! let mut ops = LatentOps::new(&mut model, &table, &vocab, &vocab);
//! let samples = ops.sample("hola mundo", 3).unwrap();
//! assert_eq!(samples.len(), 3);
//! ```

use ndarray::{Array1, Array2};

use crate::data::{BatchSampler, BucketTable, DataSet};
use crate::model::{Model, ModelError, Vocabulary, EOS_ID};

/// A sequence's position and uncertainty in the model's continuous
/// encoding space. Produced only by [`Model::encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct LatentVector {
    pub mean: Array1<f32>,
    pub logvar: Array1<f32>,
}

impl LatentVector {
    #[must_use]
    pub fn new(mean: Array1<f32>, logvar: Array1<f32>) -> Self {
        debug_assert_eq!(mean.len(), logvar.len());
        Self { mean, logvar }
    }

    /// A zero-logvar copy of a mean: decoding it is the deterministic
    /// mode decode.
    #[must_use]
    pub fn deterministic(mean: Array1<f32>) -> Self {
        let logvar = Array1::zeros(mean.len());
        Self { mean, logvar }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.mean.len()
    }
}

/// Errors from latent-space requests.
///
/// The argument variants fail a single request without touching any run
/// state; `Model` wraps an opaque computation failure, so callers can
/// tell a bad request from a broken backend.
#[derive(Debug, thiserror::Error)]
pub enum LatentError {
    #[error("interpolation expects exactly two sentences, got {0}")]
    SentenceCount(usize),

    #[error("interpolation expects at least three points, got {0}")]
    PointCount(usize),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl LatentError {
    /// True for the bad-request variants, false for computation failures
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::SentenceCount(_) | Self::PointCount(_))
    }
}

/// Result alias for latent-space operations
pub type Result<T> = std::result::Result<T, LatentError>;

/// Encode/decode/sample/interpolate over a model and its vocabularies.
///
/// Inference works one sentence at a time: every batch it builds has
/// batch size 1 and an empty target.
pub struct LatentOps<'a, M: Model> {
    model: &'a mut M,
    table: &'a BucketTable,
    source_vocab: &'a Vocabulary,
    target_vocab: &'a Vocabulary,
    sampler: BatchSampler,
}

impl<'a, M: Model> LatentOps<'a, M> {
    pub fn new(
        model: &'a mut M,
        table: &'a BucketTable,
        source_vocab: &'a Vocabulary,
        target_vocab: &'a Vocabulary,
    ) -> Self {
        Self { model, table, source_vocab, target_vocab, sampler: BatchSampler::new() }
    }

    /// Encode one sentence into its latent vector.
    ///
    /// The sentence goes to the first bucket whose source capacity covers
    /// it; an oversized sentence falls back to the last bucket with a
    /// logged warning and is truncated by the encoder's fixed capacity.
    pub fn encode(&mut self, sentence: &str) -> Result<LatentVector> {
        let (latent, _) = self.encode_with_bucket(sentence)?;
        Ok(latent)
    }

    /// Greedy-decode a sequence of latent vectors through one bucket's
    /// decoder, one output sentence per vector.
    ///
    /// Each decode takes the highest-scoring token per time step and cuts
    /// the output at the first end-of-sequence marker; without one, the
    /// full fixed-length output stands.
    pub fn decode(&mut self, latents: &[LatentVector], bucket_id: usize) -> Result<Vec<String>> {
        let shell = self.batch_shell(bucket_id);
        latents
            .iter()
            .map(|latent| {
                let logits = self.model.decode(latent, &shell, bucket_id)?;
                let tokens: Vec<u32> = GreedyTokens::new(&logits).collect();
                Ok(self.target_vocab.decode_tokens(&tokens))
            })
            .collect()
    }

    /// Encode a sentence and greedily decode it back through its own
    /// bucket, posterior uncertainty included.
    pub fn autoencode(&mut self, sentence: &str) -> Result<String> {
        let (latent, bucket_id) = self.encode_with_bucket(sentence)?;
        let mut decoded = self.decode(std::slice::from_ref(&latent), bucket_id)?;
        Ok(decoded.pop().unwrap_or_default())
    }

    /// Decode `num_samples` draws around one sentence's encoding.
    ///
    /// All draws share the encoded mean. The first uses a zero logvar —
    /// the deterministic mode decode — and every later one the encoded
    /// logvar, so repeated calls agree on the first line and explore on
    /// the rest.
    pub fn sample(&mut self, sentence: &str, num_samples: usize) -> Result<Vec<String>> {
        let encoded = self.encode(sentence)?;
        let mut latents = Vec::with_capacity(num_samples);
        if num_samples > 0 {
            latents.push(LatentVector::deterministic(encoded.mean.clone()));
        }
        for _ in 1..num_samples {
            latents.push(encoded.clone());
        }
        self.decode(&latents, self.table.last_id())
    }

    /// Decode `num_pts` evenly spaced latent points from the first
    /// sentence's mean to the second's, endpoints included exactly.
    ///
    /// Requires exactly two sentences and at least three points; anything
    /// else fails without producing output. All points decode
    /// deterministically (zero logvar) through the last bucket, since
    /// interpolated targets are not length-bounded by either input.
    pub fn interpolate(&mut self, sentences: &[String], num_pts: usize) -> Result<Vec<String>> {
        if sentences.len() != 2 {
            return Err(LatentError::SentenceCount(sentences.len()));
        }
        if num_pts < 3 {
            return Err(LatentError::PointCount(num_pts));
        }

        let from = self.encode(&sentences[0])?;
        let to = self.encode(&sentences[1])?;
        let points: Vec<LatentVector> = (0..num_pts)
            .map(|i| {
                let mean = Array1::from_iter(
                    from.mean
                        .iter()
                        .zip(to.mean.iter())
                        .map(|(&a, &b)| lerp_point(a, b, i, num_pts)),
                );
                LatentVector::deterministic(mean)
            })
            .collect();

        self.decode(&points, self.table.last_id())
    }

    fn encode_with_bucket(&mut self, sentence: &str) -> Result<(LatentVector, usize)> {
        let token_ids = self.source_vocab.encode_sentence(sentence);
        let (bucket_id, truncated) = self.table.bucket_for_source(token_ids.len());
        if truncated {
            eprintln!("warning: sentence truncated to bucket {bucket_id}: {sentence}");
        }
        let set = DataSet::singleton(self.table.len(), bucket_id, (token_ids, vec![]));
        let batch = self.sampler.make_batch(self.table, &set, bucket_id, 1);
        let latent = self.model.encode(&batch, bucket_id)?;
        Ok((latent, bucket_id))
    }

    /// Empty single-example batch for a bucket: all-padding source, GO-only
    /// target, zero weights.
    fn batch_shell(&mut self, bucket_id: usize) -> crate::data::Batch {
        let set = DataSet::singleton(self.table.len(), bucket_id, (vec![], vec![]));
        self.sampler.make_batch(self.table, &set, bucket_id, 1)
    }
}

/// The i-th of n evenly spaced values from `a` to `b`, with both endpoints
/// reproduced exactly.
fn lerp_point(a: f32, b: f32, i: usize, n: usize) -> f32 {
    if i == 0 {
        a
    } else if i == n - 1 {
        b
    } else {
        a + (b - a) * (i as f32 / (n - 1) as f32)
    }
}

/// Lazy greedy token stream over decode logits.
///
/// Yields the argmax token per time step and stops at the first
/// end-of-sequence marker without materializing the tail. A fresh
/// iterator over the same logits replays identically.
pub struct GreedyTokens<'a> {
    logits: &'a Array2<f32>,
    t: usize,
    done: bool,
}

impl<'a> GreedyTokens<'a> {
    #[must_use]
    pub fn new(logits: &'a Array2<f32>) -> Self {
        Self { logits, t: 0, done: false }
    }
}

impl Iterator for GreedyTokens<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.done || self.t >= self.logits.nrows() {
            return None;
        }
        let row = self.logits.row(self.t);
        self.t += 1;

        let mut best = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (v, &score) in row.iter().enumerate() {
            if score > best_score {
                best = v;
                best_score = score;
            }
        }
        let token = best as u32;
        if token == EOS_ID {
            self.done = true;
            return None;
        }
        Some(token)
    }
}
