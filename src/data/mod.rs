//! Corpus loading and batch construction
//!
//! This module provides the data path of the training core:
//! - Length buckets ([`BucketTable`]) that group sequence pairs of similar
//!   size to minimize padding waste
//! - Bucketed corpus loading ([`read_data`] / [`DataSet`])
//! - Size-proportional bucket sampling and padded, weight-masked batch
//!   construction ([`BatchSampler`] / [`Batch`])

mod batch;
mod bucket;
mod corpus;

pub use batch::{Batch, BatchSampler};
pub use bucket::{Bucket, BucketTable, CANONICAL_BUCKETS};
pub use corpus::{read_data, DataSet, SequencePair};

use std::path::PathBuf;

/// Errors from corpus and vocabulary file ingestion
///
/// Both variants are fatal: a corpus is ingested completely or not at all.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: invalid token id {token:?}")]
    Parse {
        path: PathBuf,
        line: usize,
        token: String,
    },
}

/// Result alias for data operations
pub type Result<T> = std::result::Result<T, DataError>;
