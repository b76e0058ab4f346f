use parrec_core::{FactorMatrix, PreparedDotQuery, TopkAccumulator};
use rayon::prelude::*;

use crate::errors::MatchError;

/// Key written into result slots that had no eligible candidate.
pub const NO_MATCH: i32 = -1;

/// Per-query top-k matches, row-major over the query batch.
///
/// Row `i` always corresponds to the `i`-th query index, holds exactly
/// `topk` slots sorted by descending score (ascending candidate index on
/// ties) and is padded with [`NO_MATCH`] keys and `0.0` scores when fewer
/// eligible candidates existed.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResults {
    rows: usize,
    topk: usize,
    keys: Vec<i32>,
    scores: Vec<f32>,
}

impl MatchResults {
    fn with_rows(rows: usize, topk: usize) -> Self {
        Self {
            rows,
            topk,
            keys: vec![NO_MATCH; rows * topk],
            scores: vec![0.0; rows * topk],
        }
    }

    /// Returns the number of query rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Returns true when the query batch was empty.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the number of slots per row.
    pub fn topk(&self) -> usize {
        self.topk
    }

    /// Returns the candidate keys of one query row.
    pub fn keys_row(&self, row: usize) -> &[i32] {
        &self.keys[row * self.topk..(row + 1) * self.topk]
    }

    /// Returns the scores of one query row.
    pub fn scores_row(&self, row: usize) -> &[f32] {
        &self.scores[row * self.topk..(row + 1) * self.topk]
    }

    /// Returns the flat row-major key buffer.
    pub fn keys(&self) -> &[i32] {
        &self.keys
    }

    /// Returns the flat row-major score buffer.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Consumes the results into their flat key and score buffers.
    pub fn into_parts(self) -> (Vec<i32>, Vec<f32>) {
        (self.keys, self.scores)
    }
}

/// Computes the `topk` highest dot-product candidates for each query row.
///
/// `pool` restricts the candidate universe to the listed rows of
/// `candidate_factors`; the empty slice means every candidate row is
/// eligible. The query batch is split into `num_workers` contiguous chunks
/// and scored on a dedicated worker pool of that size, each worker writing
/// into its own disjoint range of the output, so the call blocks until all
/// workers join and the result is deterministic for any worker count.
///
/// A query row that also appears in the candidate set competes like any
/// other candidate; callers wanting to exclude self-matches filter them
/// out of the pool or skip them downstream.
pub fn dot_topn(
    query_indexes: &[i32],
    query_factors: &FactorMatrix,
    candidate_factors: &FactorMatrix,
    pool: &[i32],
    topk: usize,
    num_workers: usize,
) -> Result<MatchResults, MatchError> {
    validate_inputs(
        query_indexes,
        query_factors,
        candidate_factors,
        pool,
        topk,
        num_workers,
    )?;

    let rows = query_indexes.len();
    let mut results = MatchResults::with_rows(rows, topk);
    if rows == 0 {
        return Ok(results);
    }

    tracing::debug!(
        queries = rows,
        candidates = candidate_factors.rows(),
        pool = pool.len(),
        topk,
        num_workers,
        "dot_topn"
    );

    let per_worker = rows.div_ceil(num_workers);
    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .build()
        .map_err(|error| MatchError::WorkerPool {
            detail: error.to_string(),
        })?;

    worker_pool.install(|| {
        results
            .keys
            .par_chunks_mut(per_worker * topk)
            .zip(results.scores.par_chunks_mut(per_worker * topk))
            .zip(query_indexes.par_chunks(per_worker))
            .for_each(|((keys, scores), batch)| {
                score_batch(
                    batch,
                    query_factors,
                    candidate_factors,
                    pool,
                    topk,
                    keys,
                    scores,
                );
            });
    });

    Ok(results)
}

fn validate_inputs(
    query_indexes: &[i32],
    query_factors: &FactorMatrix,
    candidate_factors: &FactorMatrix,
    pool: &[i32],
    topk: usize,
    num_workers: usize,
) -> Result<(), MatchError> {
    if topk == 0 {
        return Err(MatchError::InvalidTopk);
    }
    if num_workers == 0 {
        return Err(MatchError::InvalidWorkerCount);
    }
    if query_factors.dim() != candidate_factors.dim() {
        return Err(MatchError::DimensionMismatch {
            query: query_factors.dim(),
            candidate: candidate_factors.dim(),
        });
    }

    let candidate_rows = candidate_factors.rows();
    if candidate_rows > i32::MAX as usize {
        return Err(MatchError::CandidateRowsExceedKeyRange {
            rows: candidate_rows,
        });
    }

    let query_rows = query_factors.rows();
    if let Some(&index) = query_indexes
        .iter()
        .find(|&&index| index < 0 || index as usize >= query_rows)
    {
        return Err(MatchError::QueryIndexOutOfBounds {
            index,
            rows: query_rows,
        });
    }
    if let Some(&index) = pool
        .iter()
        .find(|&&index| index < 0 || index as usize >= candidate_rows)
    {
        return Err(MatchError::PoolIndexOutOfBounds {
            index,
            rows: candidate_rows,
        });
    }

    Ok(())
}

fn score_batch(
    batch: &[i32],
    query_factors: &FactorMatrix,
    candidate_factors: &FactorMatrix,
    pool: &[i32],
    topk: usize,
    keys: &mut [i32],
    scores: &mut [f32],
) {
    for (slot, &query_index) in batch.iter().enumerate() {
        let prepared = PreparedDotQuery::new(query_factors.row(query_index as usize));
        let mut best = TopkAccumulator::new(topk);

        if pool.is_empty() {
            for candidate in 0..candidate_factors.rows() {
                let score = prepared.dot(candidate_factors.row(candidate));
                best.push(candidate as i32, score);
            }
        } else {
            for &candidate in pool {
                let score = prepared.dot(candidate_factors.row(candidate as usize));
                best.push(candidate, score);
            }
        }

        let keys_row = &mut keys[slot * topk..(slot + 1) * topk];
        let scores_row = &mut scores[slot * topk..(slot + 1) * topk];
        for (rank, (key, score)) in best.into_sorted().into_iter().enumerate() {
            keys_row[rank] = key;
            scores_row[rank] = score;
        }
    }
}
