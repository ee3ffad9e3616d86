//! Common routines for loading input data.
use crate::model::{Model, ModelParameters};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

pub mod installation;
use installation::read_installation_inputs;
pub mod scenario;
use scenario::read_scenarios;

/// Read a series of type `T`s from a CSV file.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;
    let records: Vec<T> = reader
        .into_deserialize()
        .try_collect()
        .with_context(|| input_err_msg(file_path))?;

    ensure!(
        !records.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(records)
}

/// Parse a TOML file at the specified path.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    toml::from_str(&contents).with_context(|| input_err_msg(file_path))
}

/// Format an error message to include the offending file path.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a proportion, checking that it is between 0 and 1 inclusive.
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 1"))?
    }

    Ok(Dimensionless(value))
}

/// Load a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the input tables and optional `model.toml`
///
/// # Returns
///
/// The validated model or an error if any input is missing or malformed.
pub fn load_model(model_dir: &Path) -> Result<Model> {
    let parameters = ModelParameters::from_path(model_dir)?;
    let installations = read_installation_inputs(model_dir)?;
    let scenarios = read_scenarios(model_dir)?;

    Ok(Model {
        parameters,
        installations,
        scenarios,
    })
}
