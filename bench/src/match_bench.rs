use std::env;
use std::time::{Duration, Instant};

use parrec_core::FactorMatrix;
use parrec_engine::{Group, MatchResults, MatcherOptions, ModelFactors, ParallelMatcher};

const DEFAULT_USERS: usize = 2_000;
const DEFAULT_ITEMS: usize = 20_000;
const DEFAULT_DIMENSION: usize = 64;
const DEFAULT_QUERIES: usize = 256;
const DEFAULT_TOPK: usize = 10;
const DEFAULT_WORKERS: usize = 4;
const DEFAULT_WARMUP_RUNS: usize = 2;
const DEFAULT_MEASURED_RUNS: usize = 10;

#[derive(Clone, Copy)]
struct MatchBenchConfig {
    users: usize,
    items: usize,
    dimension: usize,
    queries: usize,
    topk: usize,
    workers: usize,
    warmup_runs: usize,
    measured_runs: usize,
}

fn load_config() -> MatchBenchConfig {
    MatchBenchConfig {
        users: env_usize("PARREC_BENCH_USERS", DEFAULT_USERS, 1),
        items: env_usize("PARREC_BENCH_ITEMS", DEFAULT_ITEMS, 1),
        dimension: env_usize("PARREC_BENCH_DIMENSION", DEFAULT_DIMENSION, 1),
        queries: env_usize("PARREC_BENCH_QUERIES", DEFAULT_QUERIES, 1),
        topk: env_usize("PARREC_BENCH_TOPK", DEFAULT_TOPK, 1),
        workers: env_usize("PARREC_BENCH_WORKERS", DEFAULT_WORKERS, 1),
        warmup_runs: env_usize("PARREC_BENCH_WARMUP_RUNS", DEFAULT_WARMUP_RUNS, 0),
        measured_runs: env_usize("PARREC_BENCH_MEASURED_RUNS", DEFAULT_MEASURED_RUNS, 1),
    }
}

pub(crate) fn run_most_similar_bench(mode: &str) -> bool {
    let config = load_config();
    let Some(item) = factor_fixture(7, config.items, config.dimension) else {
        return false;
    };
    let model = ModelFactors::w2v(item);
    let batch = query_batch(config.queries, config.items);

    for workers in worker_sweep(config.workers) {
        let matcher = match ParallelMatcher::new(MatcherOptions {
            num_workers: workers,
        }) {
            Ok(value) => value,
            Err(error) => {
                eprintln!("error=matcher_create_failed detail=\"{error}\"");
                return false;
            }
        };

        let run_once = || -> Option<(Duration, u64)> {
            let started_at = Instant::now();
            let results =
                match matcher.most_similar(&model, Group::Item, &batch, config.topk, None) {
                    Ok(value) => value,
                    Err(error) => {
                        eprintln!("error=most_similar_failed detail=\"{error}\"");
                        return None;
                    }
                };
            Some((started_at.elapsed(), key_checksum(&results)))
        };

        let Some(summary) = measure(&config, run_once) else {
            return false;
        };
        print_summary("most_similar", mode, &config, workers, &summary);
    }

    true
}

pub(crate) fn run_recommend_bench(mode: &str) -> bool {
    let config = load_config();
    let Some(user) = factor_fixture(13, config.users, config.dimension) else {
        return false;
    };
    let Some(item) = factor_fixture(29, config.items, config.dimension) else {
        return false;
    };
    let model = match ModelFactors::als(user, item) {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error=model_create_failed detail=\"{error}\"");
            return false;
        }
    };
    let batch = query_batch(config.queries, config.users);

    for workers in worker_sweep(config.workers) {
        let matcher = match ParallelMatcher::new(MatcherOptions {
            num_workers: workers,
        }) {
            Ok(value) => value,
            Err(error) => {
                eprintln!("error=matcher_create_failed detail=\"{error}\"");
                return false;
            }
        };

        let run_once = || -> Option<(Duration, u64)> {
            let started_at = Instant::now();
            let results = match matcher.topk_recommendation(&model, &batch, config.topk, None) {
                Ok(value) => value,
                Err(error) => {
                    eprintln!("error=recommend_failed detail=\"{error}\"");
                    return None;
                }
            };
            Some((started_at.elapsed(), key_checksum(&results)))
        };

        let Some(summary) = measure(&config, run_once) else {
            return false;
        };
        print_summary("recommend", mode, &config, workers, &summary);
    }

    true
}

struct RunSummary {
    p50_ms: f64,
    p95_ms: f64,
    avg_ms: f64,
    qps: f64,
    checksum: u64,
}

impl RunSummary {
    fn from_runs(
        mut samples_ms: Vec<f64>,
        total: Duration,
        total_queries: usize,
        checksum: u64,
    ) -> Self {
        samples_ms.sort_by(f64::total_cmp);
        let avg_ms = samples_ms.iter().sum::<f64>() / samples_ms.len().max(1) as f64;
        let quantile = |fraction: f64| {
            let last = samples_ms.len().saturating_sub(1);
            samples_ms
                .get((last as f64 * fraction).round() as usize)
                .copied()
                .unwrap_or(0.0)
        };

        Self {
            p50_ms: quantile(0.50),
            p95_ms: quantile(0.95),
            avg_ms,
            qps: total_queries as f64 / total.as_secs_f64(),
            checksum,
        }
    }
}

fn measure(
    config: &MatchBenchConfig,
    mut run_once: impl FnMut() -> Option<(Duration, u64)>,
) -> Option<RunSummary> {
    for _ in 0..config.warmup_runs {
        run_once()?;
    }

    let mut samples_ms = Vec::with_capacity(config.measured_runs);
    let mut total_duration = Duration::from_secs(0);
    let mut checksum = 0u64;

    for _ in 0..config.measured_runs {
        let (elapsed, sample_checksum) = run_once()?;
        samples_ms.push(elapsed.as_secs_f64() * 1_000.0);
        total_duration += elapsed;
        checksum = sample_checksum;
    }

    Some(RunSummary::from_runs(
        samples_ms,
        total_duration,
        config.measured_runs * config.queries,
        checksum,
    ))
}

fn print_summary(
    name: &str,
    mode: &str,
    config: &MatchBenchConfig,
    workers: usize,
    summary: &RunSummary,
) {
    println!(
        "bench={name} mode={mode} users={} items={} dimension={} queries={} topk={} workers={workers} warmup_runs={} measured_runs={} p50_ms={:.6} p95_ms={:.6} avg_ms={:.6} qps={:.2} checksum={}",
        config.users,
        config.items,
        config.dimension,
        config.queries,
        config.topk,
        config.warmup_runs,
        config.measured_runs,
        summary.p50_ms,
        summary.p95_ms,
        summary.avg_ms,
        summary.qps,
        summary.checksum
    );
}

fn worker_sweep(workers: usize) -> Vec<usize> {
    if workers <= 1 {
        vec![1]
    } else {
        vec![1, workers]
    }
}

fn query_batch(queries: usize, rows: usize) -> Vec<i32> {
    (0..queries).map(|index| (index % rows) as i32).collect()
}

fn key_checksum(results: &MatchResults) -> u64 {
    results
        .keys()
        .iter()
        .fold(0u64, |acc, &key| acc.wrapping_mul(31).wrapping_add(key as u64))
}

/// Fills a factor matrix with a reproducible per-row waveform so repeated
/// runs score the identical dataset without pulling in an RNG.
fn factor_fixture(seed: u64, rows: usize, dimension: usize) -> Option<FactorMatrix> {
    let mut data = Vec::with_capacity(rows * dimension);
    for row in 0..rows {
        let row_phase = (seed.wrapping_add(row as u64)).wrapping_mul(0x9E37_79B9);
        for column in 0..dimension {
            let cell = row_phase.wrapping_add((column as u64).wrapping_mul(0x85EB_CA6B));
            data.push((cell % 1_000) as f32 / 1_000.0 - 0.5);
        }
    }

    match FactorMatrix::from_flat(rows, dimension, data) {
        Ok(matrix) => Some(matrix),
        Err(error) => {
            eprintln!("error=matrix_create_failed detail=\"{error}\"");
            None
        }
    }
}

fn env_usize(key: &str, default: usize, min: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|value| *value >= min)
        .unwrap_or(default)
}
