//! Investment metrics derived from simulated cash-flow tracks.
use crate::installation::InstallationInputs;
use crate::scenario::ScenarioID;
use crate::simulation::projection::{YearRecord, generation_rate_series};
use crate::units::{Capacity, Dimensionless, Energy, Money};
use std::iter::once;

/// Maximum iterations for the Newton solve before falling back to bisection
const MAX_NEWTON_ITERATIONS: u32 = 50;

/// Maximum iterations for the bisection fallback
const MAX_BISECTION_ITERATIONS: u32 = 200;

/// Initial guess for the Newton solve
const INITIAL_RATE_GUESS: f64 = 0.10;

/// Rate interval searched by the bisection fallback
const RATE_BOUNDS: (f64, f64) = (-0.999, 10.0);

/// Summary metrics for one (input set, scenario) pair.
///
/// Metric fields are `None` when the metric is undefined for the pair: an IRR with no real rate,
/// a payback never achieved within the horizon, or a pair whose simulation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSummary {
    /// 1-indexed input set the pair belongs to
    pub input_set: u32,
    /// The scenario simulated
    pub scenario: ScenarioID,
    /// Nameplate capacity (kWp)
    pub capacity: Capacity,
    /// Investment cost excluding the structural add-on (RM)
    pub base_investment_cost: Money,
    /// Investment cost including the structural add-on (RM)
    pub total_investment_cost: Money,
    /// Mean annual consumption over the horizon (kWh/year)
    pub average_consumption: Energy,
    /// Mean annual generation over the horizon (kWh/year)
    pub average_generation: Energy,
    /// Mean annual self-consumption percentage
    pub average_self_consumption_pct: Option<Dimensionless>,
    /// IRR for the base track
    pub irr_base: Option<Dimensionless>,
    /// IRR for the track including the structural add-on
    pub irr: Option<Dimensionless>,
    /// Payback period in years for the base track
    pub payback_years_base: Option<f64>,
    /// Payback period in years for the track including the structural add-on
    pub payback_years: Option<f64>,
}

/// The internal rate of return of a cash-flow series.
///
/// The first element is the time-0 flow, typically the negative initial outlay, followed by one
/// net flow per year. Solved with Newton's method seeded near 10%, falling back to bisection over
/// a wide bracketing interval.
///
/// # Returns
///
/// The rate making the discounted sum zero, or `None` when no real rate can be found (for
/// example, flows which never change sign or a non-convergent sign pattern).
pub fn internal_rate_of_return(cash_flows: &[Money]) -> Option<Dimensionless> {
    // A root can only exist if the flows change sign at least once
    let has_positive = cash_flows.iter().any(|flow| flow.value() > 0.0);
    let has_negative = cash_flows.iter().any(|flow| flow.value() < 0.0);
    if !has_positive || !has_negative {
        return None;
    }

    let npv = |rate: f64| -> f64 {
        cash_flows
            .iter()
            .enumerate()
            .map(|(period, flow)| flow.value() / (1.0 + rate).powi(period as i32))
            .sum()
    };
    let npv_gradient = |rate: f64| -> f64 {
        cash_flows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(period, flow)| {
                -(period as f64) * flow.value() / (1.0 + rate).powi(period as i32 + 1)
            })
            .sum()
    };

    // Convergence is judged relative to the magnitude of the flows involved
    let scale: f64 = cash_flows.iter().map(|flow| flow.value().abs()).sum();
    let tolerance = scale * 1e-9;

    let mut rate = INITIAL_RATE_GUESS;
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let value = npv(rate);
        if value.abs() <= tolerance {
            return Some(Dimensionless(rate));
        }

        let gradient = npv_gradient(rate);
        if gradient == 0.0 {
            break;
        }

        let next = rate - value / gradient;
        if !next.is_finite() || next <= RATE_BOUNDS.0 || next >= RATE_BOUNDS.1 {
            break;
        }
        rate = next;
    }
    if npv(rate).abs() <= tolerance {
        return Some(Dimensionless(rate));
    }

    bisect(npv, tolerance)
}

/// Find a root of `npv` by bisection over [`RATE_BOUNDS`].
fn bisect(npv: impl Fn(f64) -> f64, tolerance: f64) -> Option<Dimensionless> {
    let (mut low, mut high) = RATE_BOUNDS;
    let mut npv_low = npv(low);
    if npv_low.signum() == npv(high).signum() {
        // The interval does not bracket a root
        return None;
    }

    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = (low + high) / 2.0;
        let value = npv(mid);
        if value.abs() <= tolerance {
            return Some(Dimensionless(mid));
        }

        if value.signum() == npv_low.signum() {
            low = mid;
            npv_low = value;
        } else {
            high = mid;
        }
    }

    None
}

/// The payback period of a cumulative cash-flow track.
///
/// # Arguments
///
/// * `initial_outlay` - The (negative) time-0 cumulative value for the track
/// * `cumulative` - The cumulative cash flow at the end of each year
///
/// # Returns
///
/// The first crossing point of zero, linearly interpolated within the crossing year, or `None`
/// when the cumulative cash flow never reaches zero within the horizon (including the degenerate
/// case of a flat cash flow across the crossing boundary).
pub fn payback_period(initial_outlay: Money, cumulative: &[Money]) -> Option<f64> {
    let mut previous = initial_outlay;
    for (index, &value) in cumulative.iter().enumerate() {
        if value.value() >= 0.0 {
            let increase = value - previous;
            if increase.value() <= 0.0 {
                return None;
            }
            return Some(index as f64 + previous.value().abs() / increase.value());
        }
        previous = value;
    }

    None
}

/// Build the summary metrics for a successfully simulated pair.
pub fn summarise_pair(
    input_set: u32,
    inputs: &InstallationInputs,
    scenario: ScenarioID,
    records: &[YearRecord],
) -> ScenarioSummary {
    let horizon = Dimensionless(records.len() as f64);
    let average_consumption = records
        .iter()
        .fold(Energy(0.0), |total, record| total + record.consumption)
        / horizon;
    let average_generation = records
        .iter()
        .fold(Energy(0.0), |total, record| total + record.generation)
        / horizon;
    let average_self_consumption_pct = records.iter().fold(Dimensionless(0.0), |total, record| {
        total + record.self_consumption_pct
    }) / horizon;

    let base_cost = inputs.base_investment_cost();
    let total_cost = inputs.total_investment_cost();

    // The IRR series books the outlay at time 0, so the annual flows must exclude the capital
    // expense regardless of where the simulation booked it
    let annual_flows = records.iter().map(|record| record.total_income - record.opex);
    let flows: Vec<Money> = once(Money(0.0) - total_cost)
        .chain(annual_flows.clone())
        .collect();
    let flows_base: Vec<Money> = once(Money(0.0) - base_cost).chain(annual_flows).collect();

    let cumulative: Vec<Money> = records
        .iter()
        .map(|record| record.cumulative_cash_flow)
        .collect();
    let cumulative_base: Vec<Money> = records
        .iter()
        .map(|record| record.cumulative_cash_flow_base)
        .collect();

    ScenarioSummary {
        input_set,
        scenario,
        capacity: inputs.capacity,
        base_investment_cost: base_cost,
        total_investment_cost: total_cost,
        average_consumption,
        average_generation,
        average_self_consumption_pct: Some(average_self_consumption_pct),
        irr_base: internal_rate_of_return(&flows_base),
        irr: internal_rate_of_return(&flows),
        payback_years_base: payback_period(Money(0.0) - base_cost, &cumulative_base),
        payback_years: payback_period(Money(0.0) - total_cost, &cumulative),
    }
}

/// Build the summary for a pair whose simulation failed with a numeric error.
///
/// The averages derivable from the inputs alone are still reported; every metric depending on the
/// simulated records is marked undefined.
pub fn summarise_failed_pair(
    input_set: u32,
    inputs: &InstallationInputs,
    scenario: ScenarioID,
    consumption: &[Energy],
) -> ScenarioSummary {
    let horizon = Dimensionless(consumption.len() as f64);
    let average_consumption = consumption
        .iter()
        .fold(Energy(0.0), |total, &value| total + value)
        / horizon;
    let average_generation = generation_rate_series(inputs)
        .iter()
        .fold(Energy(0.0), |total, &rate| total + rate * inputs.capacity)
        / horizon;

    ScenarioSummary {
        input_set,
        scenario,
        capacity: inputs.capacity,
        base_investment_cost: inputs.base_investment_cost(),
        total_investment_cost: inputs.total_investment_cost(),
        average_consumption,
        average_generation,
        average_self_consumption_pct: None,
        irr_base: None,
        irr: None,
        payback_years_base: None,
        payback_years: None,
    }
}
