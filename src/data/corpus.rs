//! Bucketed corpus loading
//!
//! Reads line-aligned source/target token-id files into a [`DataSet`]
//! partitioned by bucket. The n-th target line is the desired output for
//! the n-th source line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::bucket::BucketTable;
use super::{DataError, Result};
use crate::model::EOS_ID;

/// An aligned (source, target) pair of token-id sequences
pub type SequencePair = (Vec<u32>, Vec<u32>);

/// Sequence pairs partitioned by bucket index.
///
/// Insertion order within a bucket is preserved so replays are
/// deterministic; training draws uniformly at read time regardless.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    buckets: Vec<Vec<SequencePair>>,
}

impl DataSet {
    /// An empty data set with one slot per bucket
    #[must_use]
    pub fn with_bucket_count(bucket_count: usize) -> Self {
        Self { buckets: vec![Vec::new(); bucket_count] }
    }

    /// A one-pair data set, used for single-sentence inference batches
    #[must_use]
    pub fn singleton(bucket_count: usize, bucket_id: usize, pair: SequencePair) -> Self {
        let mut set = Self::with_bucket_count(bucket_count);
        set.insert(bucket_id, pair);
        set
    }

    pub fn insert(&mut self, bucket_id: usize, pair: SequencePair) {
        self.buckets[bucket_id].push(pair);
    }

    pub fn bucket(&self, bucket_id: usize) -> &[SequencePair] {
        &self.buckets[bucket_id]
    }

    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Pair count per bucket, in bucket order
    #[must_use]
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Read aligned source/target token-id files into buckets.
///
/// Every target gets an end-of-sequence marker appended before bucket
/// assignment, so the fit rule sees the length the decoder will actually
/// consume. Pairs fitting no bucket are dropped. `max_lines` of `None` or
/// `Some(0)` reads both files to end of input.
///
/// Unreadable files and non-integer tokens are fatal; nothing is ingested
/// partially.
pub fn read_data(
    table: &BucketTable,
    source_path: &Path,
    target_path: &Path,
    max_lines: Option<usize>,
) -> Result<DataSet> {
    let source = open(source_path)?;
    let target = open(target_path)?;
    let limit = max_lines.filter(|&n| n > 0);

    let mut set = DataSet::with_bucket_count(table.len());
    let mut counter = 0usize;

    for (source_line, target_line) in source.lines().zip(target.lines()) {
        if limit.is_some_and(|n| counter >= n) {
            break;
        }
        counter += 1;
        if counter % 100_000 == 0 {
            println!("  reading data line {counter}");
        }

        let source_line = source_line.map_err(|e| io_err(source_path, e))?;
        let target_line = target_line.map_err(|e| io_err(target_path, e))?;

        let source_ids = parse_ids(&source_line, source_path, counter)?;
        let mut target_ids = parse_ids(&target_line, target_path, counter)?;
        target_ids.push(EOS_ID);

        if let Some(bucket_id) = table.assign(source_ids.len(), target_ids.len()) {
            set.insert(bucket_id, (source_ids, target_ids));
        }
    }

    Ok(set)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| io_err(path, e))
}

fn io_err(path: &Path, source: std::io::Error) -> DataError {
    DataError::Io { path: path.to_path_buf(), source }
}

fn parse_ids(line: &str, path: &Path, line_no: usize) -> Result<Vec<u32>> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<u32>().map_err(|_| DataError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                token: token.to_string(),
            })
        })
        .collect()
}
