use super::{brute_force_topn, deterministic_matrix};
use crate::{dot_topn, NO_MATCH};

use parrec_core::FactorMatrix;

#[test]
fn result_shape_matches_query_batch() {
    let queries = deterministic_matrix(3, 7, 16);
    let candidates = deterministic_matrix(11, 9, 16);
    let batch = [0, 1, 2, 3, 4, 5, 6];

    let results = dot_topn(&batch, &queries, &candidates, &[], 4, 2).expect("must succeed");

    assert_eq!(results.len(), batch.len());
    assert_eq!(results.topk(), 4);
    assert_eq!(results.keys().len(), batch.len() * 4);
    assert_eq!(results.scores().len(), batch.len() * 4);
    for row in 0..results.len() {
        assert_eq!(results.keys_row(row).len(), 4);
        assert_eq!(results.scores_row(row).len(), 4);
    }
}

#[test]
fn rows_are_sorted_descending_with_ascending_index_ties() {
    let queries = deterministic_matrix(5, 6, 8);
    let candidates = deterministic_matrix(7, 40, 8);
    let batch = [0, 2, 4, 5];

    let results = dot_topn(&batch, &queries, &candidates, &[], 10, 3).expect("must succeed");

    for row in 0..results.len() {
        let keys = results.keys_row(row);
        let scores = results.scores_row(row);
        for slot in 1..scores.len() {
            assert!(
                scores[slot - 1] >= scores[slot],
                "row {row} slot {slot}: {} < {}",
                scores[slot - 1],
                scores[slot]
            );
            if scores[slot - 1] == scores[slot] {
                assert!(keys[slot - 1] < keys[slot], "row {row} tie order broken");
            }
        }
    }
}

#[test]
fn matches_brute_force_on_small_matrix() {
    let queries = deterministic_matrix(21, 5, 3);
    let candidates = deterministic_matrix(37, 5, 3);
    let batch = [0, 1, 2, 3, 4];

    let results = dot_topn(&batch, &queries, &candidates, &[], 3, 2).expect("must succeed");
    let (expected_keys, expected_scores) =
        brute_force_topn(&batch, &queries, &candidates, &[], 3);

    assert_eq!(results.keys(), expected_keys.as_slice());
    assert_eq!(results.scores(), expected_scores.as_slice());
}

#[test]
fn matches_brute_force_under_pool_restriction() {
    let queries = deterministic_matrix(43, 4, 6);
    let candidates = deterministic_matrix(51, 12, 6);
    let batch = [3, 0, 1];
    let pool = [1, 4, 7, 9, 10];

    let results = dot_topn(&batch, &queries, &candidates, &pool, 4, 2).expect("must succeed");
    let (expected_keys, expected_scores) =
        brute_force_topn(&batch, &queries, &candidates, &pool, 4);

    assert_eq!(results.keys(), expected_keys.as_slice());
    assert_eq!(results.scores(), expected_scores.as_slice());
}

#[test]
fn pool_restricts_candidate_universe() {
    let queries = deterministic_matrix(13, 3, 4);
    let candidates = deterministic_matrix(17, 10, 4);
    let pool = [2, 4];

    let results = dot_topn(&[0, 1, 2], &queries, &candidates, &pool, 2, 2).expect("must succeed");

    for row in 0..results.len() {
        for &key in results.keys_row(row) {
            assert!(pool.contains(&key), "key {key} escaped the pool");
        }
    }
}

#[test]
fn pads_when_eligible_candidates_are_fewer_than_topk() {
    let queries = deterministic_matrix(19, 2, 4);
    let candidates = deterministic_matrix(23, 10, 4);
    let pool = [6, 3];

    let results = dot_topn(&[0, 1], &queries, &candidates, &pool, 5, 1).expect("must succeed");

    for row in 0..results.len() {
        let keys = results.keys_row(row);
        let scores = results.scores_row(row);
        assert_ne!(keys[0], NO_MATCH);
        assert_ne!(keys[1], NO_MATCH);
        assert_eq!(&keys[2..], &[NO_MATCH, NO_MATCH, NO_MATCH]);
        assert_eq!(&scores[2..], &[0.0, 0.0, 0.0]);
    }
}

#[test]
fn no_padding_when_enough_candidates_exist() {
    let queries = deterministic_matrix(29, 3, 4);
    let candidates = deterministic_matrix(31, 8, 4);

    let results = dot_topn(&[0, 1, 2], &queries, &candidates, &[], 8, 2).expect("must succeed");

    for row in 0..results.len() {
        assert!(results.keys_row(row).iter().all(|&key| key != NO_MATCH));
    }
}

#[test]
fn identical_results_for_any_worker_count() {
    let queries = deterministic_matrix(61, 23, 12);
    let candidates = deterministic_matrix(67, 100, 12);
    let batch: Vec<i32> = (0..23).collect();

    let serial = dot_topn(&batch, &queries, &candidates, &[], 7, 1).expect("must succeed");
    let parallel = dot_topn(&batch, &queries, &candidates, &[], 7, 4).expect("must succeed");

    assert_eq!(serial, parallel);
}

#[test]
fn worker_count_above_batch_size_is_harmless() {
    let queries = deterministic_matrix(71, 2, 4);
    let candidates = deterministic_matrix(73, 6, 4);

    let wide = dot_topn(&[0, 1], &queries, &candidates, &[], 3, 8).expect("must succeed");
    let narrow = dot_topn(&[0, 1], &queries, &candidates, &[], 3, 1).expect("must succeed");

    assert_eq!(wide, narrow);
}

#[test]
fn self_similarity_ranks_the_query_row_first() {
    let factors = FactorMatrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]])
        .expect("rows must be accepted");

    let results = dot_topn(&[2], &factors, &factors, &[], 2, 1).expect("must succeed");

    assert_eq!(results.keys_row(0), &[2, 0]);
    assert_eq!(results.scores_row(0), &[2.0, 1.0]);
}

#[test]
fn zero_dimension_scores_are_zero_and_index_ordered() {
    let queries = FactorMatrix::from_flat(5, 0, Vec::new()).expect("dim 0 is legal");
    let candidates = FactorMatrix::from_flat(4, 0, Vec::new()).expect("dim 0 is legal");

    let results = dot_topn(&[0, 3], &queries, &candidates, &[], 3, 2).expect("must succeed");

    for row in 0..results.len() {
        assert_eq!(results.keys_row(row), &[0, 1, 2]);
        assert_eq!(results.scores_row(row), &[0.0, 0.0, 0.0]);
    }
}

#[test]
fn duplicate_query_indexes_are_scored_independently() {
    let queries = deterministic_matrix(83, 4, 6);
    let candidates = deterministic_matrix(89, 15, 6);

    let results = dot_topn(&[1, 1, 1], &queries, &candidates, &[], 4, 3).expect("must succeed");

    assert_eq!(results.keys_row(0), results.keys_row(1));
    assert_eq!(results.keys_row(1), results.keys_row(2));
    assert_eq!(results.scores_row(0), results.scores_row(2));
}

#[test]
fn empty_query_batch_returns_no_rows() {
    let queries = deterministic_matrix(97, 3, 4);
    let candidates = deterministic_matrix(101, 3, 4);

    let results = dot_topn(&[], &queries, &candidates, &[], 5, 2).expect("must succeed");

    assert!(results.is_empty());
    assert_eq!(results.len(), 0);
    assert!(results.keys().is_empty());
    assert!(results.scores().is_empty());
}

#[test]
fn into_parts_exposes_flat_buffers() {
    let queries = deterministic_matrix(103, 2, 4);
    let candidates = deterministic_matrix(107, 5, 4);

    let results = dot_topn(&[0, 1], &queries, &candidates, &[], 3, 1).expect("must succeed");
    let expected_keys = results.keys().to_vec();
    let (keys, scores) = results.into_parts();

    assert_eq!(keys, expected_keys);
    assert_eq!(keys.len(), 6);
    assert_eq!(scores.len(), 6);
}
