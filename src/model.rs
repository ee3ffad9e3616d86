//! The model of a projection run: run parameters plus the two input tables.
use crate::input::{deserialise_proportion, load_model, read_toml};
use crate::installation::InstallationInputs;
use crate::scenario::{ScenarioDefinition, ScenarioID};
use crate::units::Dimensionless;
use anyhow::Result;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// Default fraction of the base installation cost credited as a one-time tax saving
fn default_tax_incentive_rate() -> Dimensionless {
    Dimensionless(0.3)
}

/// Where the one-time capital cost is booked in the cash-flow tracks.
///
/// The two conventions give different cumulative cash flows from year 1 onwards; a run uses
/// exactly one of them for all pairs.
#[derive(DeserializeLabeledStringEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapitalExpenseTiming {
    /// Book the capital cost as a year-1 expense line; cumulative cash flow starts at zero
    #[default]
    #[string = "year_one_expense"]
    YearOneExpense,
    /// Seed the cumulative cash-flow tracks with the negative outlay ahead of year 1
    #[string = "initial_outlay"]
    InitialOutlay,
}

/// Optional run parameters read from `model.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Where the one-time capital cost is booked
    #[serde(default)]
    pub capital_expense_timing: CapitalExpenseTiming,
    /// Fraction of the base installation cost credited as a one-time year-1 tax saving
    #[serde(default = "default_tax_incentive_rate")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub tax_incentive_rate: Dimensionless,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            capital_expense_timing: CapitalExpenseTiming::default(),
            tax_incentive_rate: default_tax_incentive_rate(),
        }
    }
}

impl ModelParameters {
    /// Read the model parameters file from the specified directory.
    ///
    /// If the file is not present, default values are used.
    pub fn from_path(model_dir: &Path) -> Result<ModelParameters> {
        let file_path = model_dir.join(MODEL_PARAMETERS_FILE_NAME);
        if !file_path.is_file() {
            return Ok(ModelParameters::default());
        }

        read_toml(&file_path)
    }
}

/// A complete model: parameters, installation input sets and consumption scenarios.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Run parameters
    pub parameters: ModelParameters,
    /// Installation input sets, in input order
    pub installations: Vec<InstallationInputs>,
    /// Consumption scenarios keyed by name, in input order
    pub scenarios: IndexMap<ScenarioID, ScenarioDefinition>,
}

impl Model {
    /// Load and validate a model from the specified directory.
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        load_model(model_dir.as_ref())
    }

    /// The total number of (input set, scenario) pairs in the model.
    pub fn pair_count(&self) -> usize {
        self.installations.len() * self.scenarios.len()
    }
}
