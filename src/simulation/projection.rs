//! The year-by-year financial projection for one (input set, scenario) pair.
use crate::installation::InstallationInputs;
use crate::model::{CapitalExpenseTiming, ModelParameters};
use crate::units::{Dimensionless, Energy, EnergyPerCapacity, Money, MoneyPerEnergy};
use anyhow::{Result, ensure};

/// The simulated financial state of one projection year.
///
/// Expense and cumulative cash-flow fields come in two variants: one for the track including the
/// structural add-on cost and one for the base track without it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearRecord {
    /// The 1-indexed projection year
    pub year: u32,
    /// Generation per unit of capacity after degradation (kWh/kWp/year)
    pub generation_rate: EnergyPerCapacity,
    /// Energy generated by the installation (kWh/year)
    pub generation: Energy,
    /// Annual consumption from the scenario's series (kWh/year)
    pub consumption: Energy,
    /// Generated energy consumed on-site (kWh/year)
    pub self_consumed: Energy,
    /// Generated energy exported to the grid (kWh/year)
    pub exported: Energy,
    /// Effective electricity tariff (RM/kWh)
    pub tariff: MoneyPerEnergy,
    /// Effective buyback rate (RM/kWh)
    pub buyback_rate: MoneyPerEnergy,
    /// Effective operating expense (RM)
    pub opex: Money,
    /// Saving from self-consumed energy (RM)
    pub consumption_saving: Money,
    /// Saving from exported energy (RM)
    pub export_saving: Money,
    /// One-time tax incentive saving, credited in year 1 only (RM)
    pub tax_saving: Money,
    /// Capital expense booked this year, excluding the structural add-on (RM)
    pub capital_expense_base: Money,
    /// Capital expense booked this year, including the structural add-on (RM)
    pub capital_expense: Money,
    /// Total expense excluding the structural add-on (RM)
    pub total_expense_base: Money,
    /// Total expense including the structural add-on (RM)
    pub total_expense: Money,
    /// Total income (RM)
    pub total_income: Money,
    /// Cumulative cash flow for the base track (RM)
    pub cumulative_cash_flow_base: Money,
    /// Cumulative cash flow for the track including the structural add-on (RM)
    pub cumulative_cash_flow: Money,
    /// Share of consumption covered by self-consumed generation (%)
    pub self_consumption_pct: Dimensionless,
}

/// The generation rate for each year of the horizon, degrading geometrically from year 1.
pub fn generation_rate_series(inputs: &InstallationInputs) -> Vec<EnergyPerCapacity> {
    let retained = Dimensionless(1.0) - inputs.performance_drop;
    (1..=inputs.horizon_years)
        .map(|year| inputs.specific_yield * retained.powi(year as i32 - 1))
        .collect()
}

/// Simulate the projection for one (input set, scenario) pair.
///
/// # Arguments
///
/// * `inputs` - The installation input set
/// * `consumption` - The scenario's annual consumption series, one entry per projection year
/// * `parameters` - Run parameters (capital-expense timing and tax incentive rate)
///
/// # Returns
///
/// One [`YearRecord`] per projection year, or an error if a year has zero consumption (which
/// makes the self-consumption ratio undefined).
pub fn simulate(
    inputs: &InstallationInputs,
    consumption: &[Energy],
    parameters: &ModelParameters,
) -> Result<Vec<YearRecord>> {
    ensure!(
        consumption.len() == inputs.horizon_years as usize,
        "Consumption series length {} does not match the {}-year projection horizon",
        consumption.len(),
        inputs.horizon_years
    );

    let base_cost = inputs.base_investment_cost();
    let total_cost = inputs.total_investment_cost();
    let year_one_tax_saving = parameters.tax_incentive_rate * base_cost;

    // Under the initial-outlay convention the capital cost seeds the cumulative tracks instead of
    // appearing as a year-1 expense line
    let (mut cumulative, mut cumulative_base) = match parameters.capital_expense_timing {
        CapitalExpenseTiming::YearOneExpense => (Money(0.0), Money(0.0)),
        CapitalExpenseTiming::InitialOutlay => (Money(0.0) - total_cost, Money(0.0) - base_cost),
    };
    let book_capital_in_year_one =
        parameters.capital_expense_timing == CapitalExpenseTiming::YearOneExpense;

    let mut records = Vec::with_capacity(consumption.len());
    for (year, &consumed) in (1..=inputs.horizon_years).zip(consumption) {
        ensure!(
            consumed > Energy(0.0),
            "Consumption is zero in year {year}, making the self-consumption ratio undefined"
        );

        let tariff = inputs.tariff_escalation.rate_for_year(inputs.tariff, year);
        let buyback_rate = inputs
            .buyback_escalation
            .rate_for_year(inputs.buyback_rate, year);
        let opex =
            inputs
                .opex_escalation
                .rate_from_start_year(inputs.opex, inputs.opex_start_year, year);

        let generation_rate = inputs.specific_yield
            * (Dimensionless(1.0) - inputs.performance_drop).powi(year as i32 - 1);
        let generation = generation_rate * inputs.capacity;

        let self_consumed = generation.min(consumed);
        // Excess generation is simply discarded when export is not permitted
        let exported = if inputs.export_allowed {
            (generation - consumed).max(Energy(0.0))
        } else {
            Energy(0.0)
        };

        let consumption_saving = self_consumed * tariff;
        let export_saving = exported * buyback_rate;
        let tax_saving = if year == 1 {
            year_one_tax_saving
        } else {
            Money(0.0)
        };

        let (capital_expense, capital_expense_base) = if book_capital_in_year_one && year == 1 {
            (total_cost, base_cost)
        } else {
            (Money(0.0), Money(0.0))
        };

        let total_income = consumption_saving + export_saving + tax_saving;
        let total_expense = opex + capital_expense;
        let total_expense_base = opex + capital_expense_base;

        cumulative = cumulative + total_income - total_expense;
        cumulative_base = cumulative_base + total_income - total_expense_base;

        records.push(YearRecord {
            year,
            generation_rate,
            generation,
            consumption: consumed,
            self_consumed,
            exported,
            tariff,
            buyback_rate,
            opex,
            consumption_saving,
            export_saving,
            tax_saving,
            capital_expense_base,
            capital_expense,
            total_expense_base,
            total_expense,
            total_income,
            cumulative_cash_flow_base: cumulative_base,
            cumulative_cash_flow: cumulative,
            self_consumption_pct: Dimensionless(100.0) * (self_consumed / consumed),
        });
    }

    Ok(records)
}
