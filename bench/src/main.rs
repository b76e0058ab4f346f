#![forbid(unsafe_code)]
//! Matching benchmarks for Parrec.
//!
//! Scenarios:
//! - `most_similar`: batched item-to-item top-k over one factor matrix
//! - `recommend`: batched user-to-item top-k over two factor matrices
//!
//! Each scenario sweeps the worker count to expose the parallel speedup.

use std::env;
use std::process;

mod match_bench;

use crate::match_bench::{run_most_similar_bench, run_recommend_bench};

fn main() {
    if cfg!(debug_assertions) && env::var("PARREC_ALLOW_DEBUG_BENCH").as_deref() != Ok("1") {
        eprintln!(
            "error=debug_build_not_allowed message=\"run `cargo run --release -p parrec-bench`\""
        );
        process::exit(2);
    }

    let mode = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    let scenario = env::var("PARREC_BENCH_SCENARIO").unwrap_or_else(|_| "all".to_string());
    let ok = match scenario.as_str() {
        "all" => run_most_similar_bench(mode) && run_recommend_bench(mode),
        "most_similar" => run_most_similar_bench(mode),
        "recommend" => run_recommend_bench(mode),
        _ => {
            eprintln!(
                "error=invalid_scenario scenario=\"{}\" allowed=\"all,most_similar,recommend\"",
                scenario
            );
            false
        }
    };

    if !ok {
        process::exit(1);
    }
}
