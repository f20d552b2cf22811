//! Length-capacity buckets
//!
//! Sequence pairs are grouped into a small number of (source, target)
//! capacity classes so each batch only pads up to its bucket's capacity
//! rather than the corpus maximum.

use crate::config::ConfigError;

/// The canonical bucket capacities. A training run selects a subset of
/// these by index (`--buckets 0,1,2`).
pub const CANONICAL_BUCKETS: [(usize, usize); 3] = [(8, 10), (33, 35), (65, 67)];

/// A single length-capacity class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Maximum source time steps (exclusive bound on source length)
    pub source_capacity: usize,
    /// Maximum target time steps, including the GO prefix slot
    pub target_capacity: usize,
}

/// Ordered list of buckets, smallest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTable {
    buckets: Vec<Bucket>,
}

impl BucketTable {
    /// Build a table from explicit (source_capacity, target_capacity) pairs
    pub fn new(capacities: &[(usize, usize)]) -> Self {
        let buckets = capacities
            .iter()
            .map(|&(source_capacity, target_capacity)| Bucket { source_capacity, target_capacity })
            .collect();
        Self { buckets }
    }

    /// The full canonical table
    #[must_use]
    pub fn canonical() -> Self {
        Self::new(&CANONICAL_BUCKETS)
    }

    /// Select a subset of the canonical table by index
    ///
    /// Indices must be non-empty, strictly increasing, and in range;
    /// anything else is a malformed bucket selection.
    pub fn select(indices: &[usize]) -> Result<Self, ConfigError> {
        if indices.is_empty() {
            return Err(ConfigError::BadBuckets("empty bucket selection".into()));
        }
        if !indices.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::BadBuckets(format!(
                "bucket indices must be strictly increasing: {indices:?}"
            )));
        }
        let mut capacities = Vec::with_capacity(indices.len());
        for &i in indices {
            let &pair = CANONICAL_BUCKETS.get(i).ok_or_else(|| {
                ConfigError::BadBuckets(format!(
                    "bucket index {i} out of range (have {})",
                    CANONICAL_BUCKETS.len()
                ))
            })?;
            capacities.push(pair);
        }
        Ok(Self::new(&capacities))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Index of the last (largest) bucket
    #[must_use]
    pub fn last_id(&self) -> usize {
        self.buckets.len() - 1
    }

    pub fn get(&self, bucket_id: usize) -> &Bucket {
        &self.buckets[bucket_id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Assign a sequence pair to the smallest-indexed bucket it fits in.
    ///
    /// `target_len` must already include the appended end-of-sequence
    /// marker. Both bounds are strict: a source of exactly
    /// `source_capacity` tokens does not fit. Returns `None` when the pair
    /// fits no bucket; loading drops such pairs.
    pub fn assign(&self, source_len: usize, target_len: usize) -> Option<usize> {
        self.buckets
            .iter()
            .position(|b| source_len < b.source_capacity && target_len < b.target_capacity)
    }

    /// Pick the bucket for a source-only sentence at inference time.
    ///
    /// Returns the first bucket whose source capacity covers the sentence,
    /// or the last bucket with `truncated = true` when none does (the
    /// encoder's fixed capacity then truncates the sentence).
    pub fn bucket_for_source(&self, source_len: usize) -> (usize, bool) {
        match self.buckets.iter().position(|b| b.source_capacity >= source_len) {
            Some(id) => (id, false),
            None => (self.last_id(), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_table() {
        let table = BucketTable::canonical();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0).source_capacity, 8);
        assert_eq!(table.get(2).target_capacity, 67);
    }

    #[test]
    fn test_assign_smallest_fitting_bucket() {
        let table = BucketTable::canonical();
        // 5 source tokens, 6 target tokens (EOS included): fits bucket 0
        assert_eq!(table.assign(5, 6), Some(0));
        // exactly at the strict bound: does not fit bucket 0
        assert_eq!(table.assign(8, 6), Some(1));
        assert_eq!(table.assign(5, 10), Some(1));
        // fits only the last bucket
        assert_eq!(table.assign(40, 40), Some(2));
    }

    #[test]
    fn test_assign_oversized_pair_fits_nothing() {
        let table = BucketTable::canonical();
        assert_eq!(table.assign(100, 5), None);
        assert_eq!(table.assign(5, 100), None);
    }

    #[test]
    fn test_select_subset() {
        let table = BucketTable::select(&[0, 2]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1).source_capacity, 65);
    }

    #[test]
    fn test_select_rejects_malformed() {
        assert!(BucketTable::select(&[]).is_err());
        assert!(BucketTable::select(&[3]).is_err());
        assert!(BucketTable::select(&[1, 0]).is_err());
        assert!(BucketTable::select(&[1, 1]).is_err());
    }

    #[test]
    fn test_bucket_for_source_explicit_fallback() {
        let table = BucketTable::canonical();
        assert_eq!(table.bucket_for_source(0), (0, false));
        // capacity bound is inclusive on the encode path
        assert_eq!(table.bucket_for_source(8), (0, false));
        assert_eq!(table.bucket_for_source(9), (1, false));
        assert_eq!(table.bucket_for_source(65), (2, false));
        // oversized: last bucket, flagged truncated
        assert_eq!(table.bucket_for_source(66), (2, true));
    }
}
