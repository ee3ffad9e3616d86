//! Properties of a solar PV installation and the financial parameters of one input set.
use crate::escalation::EscalationSchedule;
use crate::units::{
    Capacity, Dimensionless, EnergyPerCapacity, Money, MoneyPerCapacity, MoneyPerEnergy,
};
use anyhow::{Result, ensure};

/// One immutable set of installation and financial inputs for the projection.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallationInputs {
    /// Nameplate capacity of the installation (kWp)
    pub capacity: Capacity,
    /// Expected annual generation per unit of capacity under ideal conditions (kWh/kWp/year)
    pub specific_yield: EnergyPerCapacity,
    /// Fraction by which generation capability degrades each year
    pub performance_drop: Dimensionless,
    /// Number of years to project
    pub horizon_years: u32,
    /// Electricity tariff in the first year (RM/kWh)
    pub tariff: MoneyPerEnergy,
    /// Export (buyback) rate in the first year (RM/kWh)
    pub buyback_rate: MoneyPerEnergy,
    /// Installation cost per unit of capacity (RM/kWp)
    pub cost_per_kwp: MoneyPerCapacity,
    /// One-time structural add-on cost (RM)
    pub structure_cost: Money,
    /// Operating expense in its first applicable year (RM/year)
    pub opex: Money,
    /// Escalation applied to the electricity tariff
    pub tariff_escalation: EscalationSchedule,
    /// Escalation applied to the buyback rate
    pub buyback_escalation: EscalationSchedule,
    /// Escalation applied to the operating expense, measured from its start year
    pub opex_escalation: EscalationSchedule,
    /// First year in which the operating expense applies
    pub opex_start_year: u32,
    /// Whether excess generation may be exported to the grid
    pub export_allowed: bool,
}

impl InstallationInputs {
    /// The installation cost excluding the structural add-on.
    pub fn base_investment_cost(&self) -> Money {
        self.cost_per_kwp * self.capacity
    }

    /// The installation cost including the structural add-on.
    pub fn total_investment_cost(&self) -> Money {
        self.base_investment_cost() + self.structure_cost
    }

    /// Check that the input values are usable.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.horizon_years >= 1, "Years projection must be at least 1");
        ensure!(
            self.capacity.is_finite() && self.capacity > Capacity(0.0),
            "Capacity must be positive"
        );
        ensure!(
            self.specific_yield.is_finite() && self.specific_yield >= EnergyPerCapacity(0.0),
            "Specific yield cannot be negative"
        );
        ensure!(
            (0.0..1.0).contains(&self.performance_drop.value()),
            "Annual performance drop must be a fraction between 0 and 1"
        );
        ensure!(
            self.tariff.is_finite() && self.tariff >= MoneyPerEnergy(0.0),
            "Electricity tariff cannot be negative"
        );
        ensure!(
            self.buyback_rate.is_finite() && self.buyback_rate >= MoneyPerEnergy(0.0),
            "Buyback rate cannot be negative"
        );
        ensure!(
            self.cost_per_kwp.is_finite() && self.cost_per_kwp >= MoneyPerCapacity(0.0),
            "Cost per kWp cannot be negative"
        );
        ensure!(
            self.structure_cost.is_finite() && self.structure_cost >= Money(0.0),
            "Structure cost cannot be negative"
        );
        ensure!(
            self.opex.is_finite() && self.opex >= Money(0.0),
            "OPEX cannot be negative"
        );
        ensure!(
            self.opex_start_year >= 1,
            "OPEX start year must be at least 1"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, installation_inputs};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_investment_costs(installation_inputs: InstallationInputs) {
        let mut inputs = installation_inputs;
        inputs.structure_cost = Money(5000.0);
        assert_approx_eq!(Money, inputs.base_investment_cost(), Money(40_000.0));
        assert_approx_eq!(Money, inputs.total_investment_cost(), Money(45_000.0));
    }

    #[rstest]
    fn test_validate_valid(installation_inputs: InstallationInputs) {
        installation_inputs.validate().unwrap();
    }

    #[rstest]
    fn test_validate_rejects_zero_horizon(installation_inputs: InstallationInputs) {
        let mut inputs = installation_inputs;
        inputs.horizon_years = 0;
        assert_error!(inputs.validate(), "Years projection must be at least 1");
    }

    #[rstest]
    fn test_validate_rejects_non_positive_capacity(installation_inputs: InstallationInputs) {
        let mut inputs = installation_inputs;
        inputs.capacity = Capacity(0.0);
        assert_error!(inputs.validate(), "Capacity must be positive");
    }

    #[rstest]
    fn test_validate_rejects_full_performance_drop(installation_inputs: InstallationInputs) {
        let mut inputs = installation_inputs;
        inputs.performance_drop = Dimensionless(1.0);
        assert_error!(
            inputs.validate(),
            "Annual performance drop must be a fraction between 0 and 1"
        );
    }

    #[rstest]
    fn test_validate_rejects_zero_opex_start_year(installation_inputs: InstallationInputs) {
        let mut inputs = installation_inputs;
        inputs.opex_start_year = 0;
        assert_error!(inputs.validate(), "OPEX start year must be at least 1");
    }
}
