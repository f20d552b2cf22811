//! Bucket sampling and padded batch construction

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::bucket::BucketTable;
use super::corpus::DataSet;
use crate::model::{GO_ID, PAD_ID};

/// One padded, weight-masked batch for a single bucket.
///
/// All three matrices are time-major: shape (time_steps, batch_size).
#[derive(Debug, Clone)]
pub struct Batch {
    /// Reversed, left-padded source token ids, (source_capacity, batch_size)
    pub encoder_inputs: Array2<u32>,
    /// GO-prefixed, right-padded target token ids, (target_capacity, batch_size)
    pub decoder_inputs: Array2<u32>,
    /// 1.0 where the shifted target token is real, 0.0 for padding and at
    /// the final time step, (target_capacity, batch_size)
    pub target_weights: Array2<f32>,
}

impl Batch {
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.encoder_inputs.ncols()
    }

    #[must_use]
    pub fn source_steps(&self) -> usize {
        self.encoder_inputs.nrows()
    }

    #[must_use]
    pub fn target_steps(&self) -> usize {
        self.decoder_inputs.nrows()
    }
}

/// Draws buckets in proportion to their population and assembles batches.
#[derive(Debug)]
pub struct BatchSampler {
    rng: StdRng,
}

impl BatchSampler {
    /// Sampler seeded from the operating system
    #[must_use]
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }

    /// Seeded sampler for reproducible draws
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Cumulative bucket-size distribution scaled to [0, 1].
    ///
    /// `scale[i]` is the fraction of all pairs living in buckets `0..=i`;
    /// the final entry is exactly 1.0. At least one bucket must be
    /// non-empty.
    #[must_use]
    pub fn bucket_scale(bucket_sizes: &[usize]) -> Vec<f64> {
        let total: usize = bucket_sizes.iter().sum();
        debug_assert!(total > 0, "bucket_scale needs a populated bucket");
        let mut cumulative = 0usize;
        bucket_sizes
            .iter()
            .map(|&size| {
                cumulative += size;
                cumulative as f64 / total as f64
            })
            .collect()
    }

    /// Pick a bucket: draw uniformly in [0, 1) and return the first
    /// cumulative boundary strictly above the draw. Empty buckets share a
    /// boundary with their predecessor and are never selected.
    pub fn choose_bucket(&mut self, bucket_scale: &[f64]) -> usize {
        let draw = self.rng.random::<f64>();
        bucket_scale
            .iter()
            .position(|&boundary| boundary > draw)
            .unwrap_or(bucket_scale.len() - 1)
    }

    /// Assemble one batch by drawing `batch_size` pairs uniformly at random
    /// with replacement from the chosen bucket.
    ///
    /// Sources are left-padded then reversed, so the true sequence ends
    /// adjacent to the encoder's final input. Targets get a GO prefix and
    /// right padding. The bucket must be non-empty.
    pub fn make_batch(
        &mut self,
        table: &BucketTable,
        dataset: &DataSet,
        bucket_id: usize,
        batch_size: usize,
    ) -> Batch {
        let bucket = table.get(bucket_id);
        let pairs = dataset.bucket(bucket_id);
        let (source_cap, target_cap) = (bucket.source_capacity, bucket.target_capacity);

        let mut encoder_inputs = Array2::from_elem((source_cap, batch_size), PAD_ID);
        let mut decoder_inputs = Array2::from_elem((target_cap, batch_size), PAD_ID);
        let mut target_weights = Array2::from_elem((target_cap, batch_size), 0.0f32);

        for b in 0..batch_size {
            let (source, target) = &pairs[self.rng.random_range(0..pairs.len())];

            // Reversal of the left-padded source: source[0] lands on the
            // final encoder time step. A source past capacity keeps its
            // tail, which is what the fixed-capacity encoder ends up
            // seeing.
            let tail = &source[source.len().saturating_sub(source_cap)..];
            for (i, &token) in tail.iter().enumerate() {
                encoder_inputs[[source_cap - 1 - i, b]] = token;
            }

            decoder_inputs[[0, b]] = GO_ID;
            for (i, &token) in target.iter().take(target_cap - 1).enumerate() {
                decoder_inputs[[i + 1, b]] = token;
            }

            // The weight at step t masks the shifted target (the token the
            // decoder should emit at t). Computed from the real target
            // length, not the padding token value; the final step is always
            // masked out.
            for t in 0..target.len().min(target_cap - 1) {
                target_weights[[t, b]] = 1.0;
            }
        }

        Batch { encoder_inputs, decoder_inputs, target_weights }
    }
}

impl Default for BatchSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EOS_ID, GO_ID, PAD_ID};

    fn one_pair_set(table: &BucketTable, bucket_id: usize, pair: (Vec<u32>, Vec<u32>)) -> DataSet {
        DataSet::singleton(table.len(), bucket_id, pair)
    }

    #[test]
    fn test_encoder_inputs_reversed_and_padded() {
        let table = BucketTable::canonical();
        let set = one_pair_set(&table, 0, (vec![5, 6, 7], vec![9, EOS_ID]));
        let mut sampler = BatchSampler::with_seed(1);

        let batch = sampler.make_batch(&table, &set, 0, 1);
        let column: Vec<u32> = batch.encoder_inputs.column(0).to_vec();
        assert_eq!(column, vec![PAD_ID, PAD_ID, PAD_ID, PAD_ID, PAD_ID, 7, 6, 5]);
    }

    #[test]
    fn test_decoder_inputs_go_prefixed() {
        let table = BucketTable::canonical();
        let set = one_pair_set(&table, 0, (vec![5], vec![9, 8, EOS_ID]));
        let mut sampler = BatchSampler::with_seed(1);

        let batch = sampler.make_batch(&table, &set, 0, 1);
        let column: Vec<u32> = batch.decoder_inputs.column(0).to_vec();
        assert_eq!(column[..4], [GO_ID, 9, 8, EOS_ID]);
        assert!(column[4..].iter().all(|&t| t == PAD_ID));
    }

    #[test]
    fn test_target_weights_cover_real_tokens_only() {
        let table = BucketTable::canonical();
        // target of real length 3 (EOS included) in a capacity-10 bucket
        let set = one_pair_set(&table, 0, (vec![5], vec![9, 8, EOS_ID]));
        let mut sampler = BatchSampler::with_seed(1);

        let batch = sampler.make_batch(&table, &set, 0, 1);
        let weights: Vec<f32> = batch.target_weights.column(0).to_vec();
        assert_eq!(weights[..3], [1.0, 1.0, 1.0]);
        assert!(weights[3..].iter().all(|&w| w == 0.0));
        assert_eq!(*weights.last().unwrap(), 0.0);
    }

    #[test]
    fn test_oversized_source_keeps_its_tail() {
        let table = BucketTable::new(&[(4, 4)]);
        // 6 tokens in a capacity-4 bucket: the last 4 survive
        let set = one_pair_set(&table, 0, (vec![10, 11, 12, 13, 14, 15], vec![]));
        let mut sampler = BatchSampler::with_seed(1);

        let batch = sampler.make_batch(&table, &set, 0, 1);
        let column: Vec<u32> = batch.encoder_inputs.column(0).to_vec();
        assert_eq!(column, vec![15, 14, 13, 12]);
    }

    #[test]
    fn test_empty_target_inference_batch() {
        let table = BucketTable::canonical();
        let set = one_pair_set(&table, 2, (vec![5, 6], vec![]));
        let mut sampler = BatchSampler::with_seed(1);

        let batch = sampler.make_batch(&table, &set, 2, 1);
        assert_eq!(batch.decoder_inputs[[0, 0]], GO_ID);
        assert!(batch.target_weights.column(0).iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_bucket_scale_cumulative() {
        let scale = BatchSampler::bucket_scale(&[10, 30, 60]);
        assert_eq!(scale, vec![0.1, 0.4, 1.0]);
    }

    #[test]
    fn test_choose_bucket_skips_empty_buckets() {
        let scale = BatchSampler::bucket_scale(&[0, 10, 0, 5]);
        let mut sampler = BatchSampler::with_seed(2);
        for _ in 0..200 {
            let chosen = sampler.choose_bucket(&scale);
            assert!(chosen == 1 || chosen == 3);
        }
    }

    #[test]
    fn test_choose_bucket_matches_population_shares() {
        let scale = BatchSampler::bucket_scale(&[10, 30, 60]);
        let mut sampler = BatchSampler::with_seed(3);
        let mut counts = [0usize; 3];
        let draws = 30_000;
        for _ in 0..draws {
            counts[sampler.choose_bucket(&scale)] += 1;
        }
        let freq: Vec<f64> = counts.iter().map(|&c| c as f64 / draws as f64).collect();
        assert!((freq[0] - 0.1).abs() < 0.02, "bucket 0 frequency {}", freq[0]);
        assert!((freq[1] - 0.3).abs() < 0.02, "bucket 1 frequency {}", freq[1]);
        assert!((freq[2] - 0.6).abs() < 0.02, "bucket 2 frequency {}", freq[2]);
    }
}
