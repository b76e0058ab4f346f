#![forbid(unsafe_code)]
//! Parallel top-k matching engine for matrix-factorization models.
//!
//! The kernel ([`dot_topn`]) scores a batch of query rows against a candidate
//! factor matrix and keeps the `topk` highest dot products per query, fanned
//! out over a bounded worker pool. The dispatch layer ([`ParallelMatcher`])
//! routes model-level "most similar" and "top-k recommendation" queries onto
//! that kernel, picking the right factor matrices per model variant and
//! group.

pub mod errors;
pub mod matcher;
pub mod models;

pub use errors::MatchError;
pub use matcher::{dot_topn, MatchResults, NO_MATCH};
pub use models::{Group, MatcherOptions, ModelFactors, ModelKind, ParallelMatcher};
