//! Functionality for running the projection across all (input set, scenario) pairs.
use crate::metrics::{ScenarioSummary, summarise_failed_pair, summarise_pair};
use crate::model::Model;
use crate::scenario::ScenarioID;
use itertools::Itertools;
use log::{info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};

pub mod projection;
use projection::{YearRecord, simulate};

/// Completion state of a run.
///
/// Safe to poll from a different thread than the one doing the simulation; the reported fraction
/// only ever increases.
#[derive(Debug)]
pub struct Progress {
    completed: AtomicUsize,
    total: usize,
}

impl Progress {
    /// Create a tracker for a run over the given number of pairs.
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one more completed pair.
    fn complete_one(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// The fraction of pairs completed so far, between 0 and 1.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }

        self.completed.load(Ordering::Relaxed) as f64 / self.total as f64
    }
}

/// The outcome of simulating one (input set, scenario) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    /// 1-indexed input set the pair belongs to
    pub input_set: u32,
    /// The scenario simulated
    pub scenario: ScenarioID,
    /// Per-year detail records; empty when the pair failed with a numeric error
    pub records: Vec<YearRecord>,
    /// Summary metrics for the pair
    pub summary: ScenarioSummary,
}

/// The assembled results of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionResults {
    /// One entry per (input set, scenario) pair, in input order
    pub pairs: Vec<PairResult>,
}

/// Run the projection for every (input set, scenario) pair in the model.
///
/// Pairs are independent: a numeric failure in one (such as a zero-consumption year) is reported
/// as undefined metrics in its summary row and does not abort the others.
///
/// # Arguments
///
/// * `model` - The model to run
/// * `progress` - Completion tracker to update as pairs finish, if any
pub fn run(model: &Model, progress: Option<&Progress>) -> ProjectionResults {
    let mut pairs = Vec::with_capacity(model.pair_count());
    for ((index, inputs), (scenario_id, scenario)) in model
        .installations
        .iter()
        .enumerate()
        .cartesian_product(model.scenarios.iter())
    {
        let input_set = index as u32 + 1;
        let consumption = scenario.consumption_series(inputs.horizon_years);
        let pair = match simulate(inputs, &consumption, &model.parameters) {
            Ok(records) => {
                let summary = summarise_pair(input_set, inputs, scenario_id.clone(), &records);
                log_pair_metrics(&summary);
                PairResult {
                    input_set,
                    scenario: scenario_id.clone(),
                    records,
                    summary,
                }
            }
            Err(err) => {
                warn!("Input set {input_set}, scenario {scenario_id}: {err:#}");
                let summary =
                    summarise_failed_pair(input_set, inputs, scenario_id.clone(), &consumption);
                PairResult {
                    input_set,
                    scenario: scenario_id.clone(),
                    records: Vec::new(),
                    summary,
                }
            }
        };
        pairs.push(pair);

        if let Some(progress) = progress {
            progress.complete_one();
        }
    }

    ProjectionResults { pairs }
}

/// Log the headline metrics for a completed pair.
fn log_pair_metrics(summary: &ScenarioSummary) {
    let irr = match summary.irr {
        Some(rate) => format!("{:.2}%", rate.value() * 100.0),
        None => "undefined".to_string(),
    };
    let payback = match summary.payback_years {
        Some(years) => format!("{years:.2} years"),
        None => "not achieved".to_string(),
    };
    info!(
        "Input set {}, scenario {}: IRR {}, payback {}",
        summary.input_set, summary.scenario, irr, payback
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::model;
    use crate::scenario::{AdjustmentRule, ScenarioDefinition};
    use crate::units::{Dimensionless, Energy};
    use rstest::rstest;

    #[rstest]
    fn test_run(model: Model) {
        let progress = Progress::new(model.pair_count());
        let results = run(&model, Some(&progress));

        assert_eq!(results.pairs.len(), 1);
        let pair = &results.pairs[0];
        assert_eq!(pair.input_set, 1);
        assert_eq!(pair.scenario, "flat".into());
        assert_eq!(pair.records.len(), 3);
        assert!((progress.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn test_run_failed_pair_does_not_abort_others(model: Model) {
        let mut model = model;

        // A -100% adjustment zeroes consumption from year 1, which is a per-pair numeric error
        let broken = ScenarioDefinition {
            id: "broken".into(),
            baseline_consumption: Energy(10_000.0),
            adjustments: vec![AdjustmentRule {
                percentage_change: Dimensionless(-100.0),
                start_year: 1,
                duration_years: 1,
            }],
        };
        model.scenarios.insert(broken.id.clone(), broken);

        let results = run(&model, None);
        assert_eq!(results.pairs.len(), 2);

        let good = &results.pairs[0];
        assert!(!good.records.is_empty());
        assert!(good.summary.average_self_consumption_pct.is_some());

        let failed = &results.pairs[1];
        assert!(failed.records.is_empty());
        assert_eq!(failed.summary.irr, None);
        assert_eq!(failed.summary.payback_years, None);
        assert_eq!(failed.summary.average_self_consumption_pct, None);
    }

    #[test]
    fn test_progress_can_be_polled_from_another_thread() {
        let progress = Progress::new(2);
        assert!((progress.fraction() - 0.0).abs() < f64::EPSILON);

        progress.complete_one();
        std::thread::scope(|scope| {
            let handle = scope.spawn(|| progress.fraction());
            assert!((handle.join().unwrap() - 0.5).abs() < f64::EPSILON);
        });

        progress.complete_one();
        assert!((progress.fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_empty_run_is_complete() {
        assert!((Progress::new(0).fraction() - 1.0).abs() < f64::EPSILON);
    }
}
