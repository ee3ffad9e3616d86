//! Fixtures for tests
use crate::escalation::EscalationSchedule;
use crate::installation::InstallationInputs;
use crate::model::{Model, ModelParameters};
use crate::scenario::ScenarioDefinition;
use crate::units::{
    Capacity, Dimensionless, Energy, EnergyPerCapacity, Money, MoneyPerCapacity, MoneyPerEnergy,
};
use indexmap::IndexMap;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// An escalation schedule which never changes the base rate
pub fn flat_escalation() -> EscalationSchedule {
    EscalationSchedule::new(Dimensionless(0.0), 1).unwrap()
}

/// A 10 kWp installation with flat rates over a three-year horizon
#[fixture]
pub fn installation_inputs() -> InstallationInputs {
    InstallationInputs {
        capacity: Capacity(10.0),
        specific_yield: EnergyPerCapacity(1400.0),
        performance_drop: Dimensionless(0.005),
        horizon_years: 3,
        tariff: MoneyPerEnergy(0.50),
        buyback_rate: MoneyPerEnergy(0.30),
        cost_per_kwp: MoneyPerCapacity(4000.0),
        structure_cost: Money(0.0),
        opex: Money(200.0),
        tariff_escalation: flat_escalation(),
        buyback_escalation: flat_escalation(),
        opex_escalation: flat_escalation(),
        opex_start_year: 1,
        export_allowed: true,
    }
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters::default()
}

#[fixture]
pub fn scenario_definition() -> ScenarioDefinition {
    ScenarioDefinition {
        id: "flat".into(),
        baseline_consumption: Energy(10_000.0),
        adjustments: Vec::new(),
    }
}

#[fixture]
pub fn model(
    installation_inputs: InstallationInputs,
    scenario_definition: ScenarioDefinition,
    model_parameters: ModelParameters,
) -> Model {
    let scenarios =
        IndexMap::from_iter([(scenario_definition.id.clone(), scenario_definition)]);

    Model {
        parameters: model_parameters,
        installations: vec![installation_inputs],
        scenarios,
    }
}
