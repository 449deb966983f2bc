//! Property tests for session-level invariants.
//!
//! 1. Every report vector has one entry per run, for every method
//! 2. Parallel and sequential scoring produce identical reports
//! 3. The result table has one row per run

use std::collections::BTreeMap;

use proptest::prelude::*;
use simfit_core::{CandidateRun, Method, TimeSeries};
use simfit_runner::{export_table, run_session, SessionConfig};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_method() -> impl Strategy<Value = Method> {
    prop::sample::select(Method::ALL.to_vec())
}

/// Per-run offsets and noise; each run is the observed curve plus both.
fn arb_runs() -> impl Strategy<Value = Vec<(f64, Vec<f64>)>> {
    prop::collection::vec(
        (-5.0..5.0_f64, prop::collection::vec(-1.0..1.0_f64, 12)),
        1..8,
    )
}

fn series(values: Vec<f64>) -> TimeSeries {
    let times = (0..values.len() as i64).map(|t| t * 3600).collect();
    TimeSeries::new(times, values).unwrap()
}

fn observed_values() -> Vec<f64> {
    (0..12).map(|i| 400.0 + (i as f64 * 0.7).sin() * 50.0).collect()
}

fn build(runs: &[(f64, Vec<f64>)]) -> (BTreeMap<String, TimeSeries>, Vec<CandidateRun>) {
    let base = observed_values();
    let mut observed = BTreeMap::new();
    observed.insert("U".to_string(), series(base.clone()));

    let candidates = runs
        .iter()
        .enumerate()
        .map(|(i, (offset, noise))| {
            let values = base
                .iter()
                .zip(noise)
                .map(|(b, n)| b + offset + n)
                .collect();
            CandidateRun::new(format!("run{i:03}"), i as f64 * 0.1).with_series("U", series(values))
        })
        .collect();
    (observed, candidates)
}

// ── 1. Shape consistency ──

proptest! {
    #[test]
    fn report_vectors_match_run_count(method in arb_method(), runs in arb_runs()) {
        let (observed, candidates) = build(&runs);
        let config = SessionConfig::new(method, &["U"], &["U"]);

        let report = run_session(&config, "r", &observed, &candidates).unwrap();
        let n = candidates.len();
        let u = report.variable("U").unwrap();

        prop_assert_eq!(report.run_ids.len(), n);
        prop_assert_eq!(report.aggregate.len(), n);
        prop_assert_eq!(u.raw_scores.len(), n);
        prop_assert_eq!(u.ranks.len(), n);
        prop_assert_eq!(u.opacities.len(), n);

        let mut ranks = u.ranks.clone();
        ranks.sort_unstable();
        prop_assert_eq!(ranks, (1..=n).collect::<Vec<_>>());
        prop_assert!(report.best_run_index < n);
    }
}

// ── 2. Parallel determinism ──

proptest! {
    #[test]
    fn parallel_matches_sequential(method in arb_method(), runs in arb_runs()) {
        let (observed, candidates) = build(&runs);
        let mut config = SessionConfig::new(method, &["U"], &["U"]);

        let parallel = run_session(&config, "r", &observed, &candidates).unwrap();
        config.parallel = false;
        let sequential = run_session(&config, "r", &observed, &candidates).unwrap();

        prop_assert_eq!(&parallel.variables[0].ranks, &sequential.variables[0].ranks);
        prop_assert_eq!(parallel.best_run_index, sequential.best_run_index);
        prop_assert_eq!(parallel.exclusions.len(), sequential.exclusions.len());
    }
}

// ── 3. Table shape ──

proptest! {
    #[test]
    fn table_has_one_row_per_run(runs in arb_runs()) {
        let (observed, candidates) = build(&runs);
        let config = SessionConfig::new(Method::Mae, &["U"], &["U"]);

        let report = run_session(&config, "r", &observed, &candidates).unwrap();
        let table = export_table(&report, b',').unwrap();

        prop_assert_eq!(table.lines().count(), candidates.len() + 1);
    }
}
