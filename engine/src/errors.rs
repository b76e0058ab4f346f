use std::error::Error;
use std::fmt;

use crate::models::{Group, ModelKind};

/// Error type for kernel and dispatch operations.
///
/// Every variant except [`MatchError::WorkerPool`] describes a bad input and
/// is detected before any worker thread starts, so a failed call never
/// exposes partial output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// `topk` must be at least 1.
    InvalidTopk,
    /// `num_workers` must be at least 1.
    InvalidWorkerCount,
    /// Query and candidate factors must share one row width.
    DimensionMismatch { query: usize, candidate: usize },
    /// A query index fell outside the query matrix.
    QueryIndexOutOfBounds { index: i32, rows: usize },
    /// A pool index fell outside the candidate matrix.
    PoolIndexOutOfBounds { index: i32, rows: usize },
    /// The candidate matrix has more rows than an `i32` result key can name.
    CandidateRowsExceedKeyRange { rows: usize },
    /// A pool was requested explicitly but resolved to zero rows.
    EmptyPool,
    /// The model kind does not implement the requested operation.
    UnsupportedOperation {
        model: ModelKind,
        operation: &'static str,
    },
    /// The model carries no factor matrix for the requested group.
    MissingFactors { group: Group },
    /// Top-k recommendation requires unnormalized factors; over normalized
    /// ones a dot product no longer ranks by affinity.
    NormalizedFactors,
    /// The worker thread pool could not be created.
    WorkerPool { detail: String },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTopk => write!(f, "topk must be at least 1"),
            Self::InvalidWorkerCount => write!(f, "num_workers must be at least 1"),
            Self::DimensionMismatch { query, candidate } => {
                write!(
                    f,
                    "factor dimension mismatch: query={query}, candidate={candidate}"
                )
            }
            Self::QueryIndexOutOfBounds { index, rows } => {
                write!(f, "query index {index} outside matrix of {rows} rows")
            }
            Self::PoolIndexOutOfBounds { index, rows } => {
                write!(f, "pool index {index} outside matrix of {rows} rows")
            }
            Self::CandidateRowsExceedKeyRange { rows } => {
                write!(f, "{rows} candidate rows exceed the i32 key range")
            }
            Self::EmptyPool => write!(f, "pool is empty"),
            Self::UnsupportedOperation { model, operation } => {
                write!(f, "model {model} does not support {operation}")
            }
            Self::MissingFactors { group } => {
                write!(f, "model has no {group} factors")
            }
            Self::NormalizedFactors => {
                write!(f, "cannot make topk recommendation with normalized factors")
            }
            Self::WorkerPool { detail } => {
                write!(f, "failed to build worker pool: {detail}")
            }
        }
    }
}

impl Error for MatchError {}
