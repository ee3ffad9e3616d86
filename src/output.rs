//! The module responsible for writing output data to disk.
use crate::metrics::ScenarioSummary;
use crate::scenario::ScenarioID;
use crate::simulation::projection::YearRecord;
use crate::simulation::{PairResult, ProjectionResults};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize, Serializer};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "pvcast_results";

/// The output file name for the consolidated summary table
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// Get the output folder for the model at the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model.
///
/// An existing directory is only replaced when `overwrite` is set.
///
/// # Returns
///
/// Whether an existing directory was replaced.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let replaced = output_dir.is_dir();
    if replaced {
        ensure!(
            overwrite,
            "Output directory {} already exists. Re-run with --overwrite to replace it.",
            output_dir.display()
        );
        fs::remove_dir_all(output_dir)?;
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(replaced)
}

/// Represents a row in a pair's year-by-year detail CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct YearRow {
    year: u32,
    generation_rate: f64,
    generation: f64,
    consumption: f64,
    self_consumed: f64,
    exported: f64,
    tariff: f64,
    buyback_rate: f64,
    consumption_saving: f64,
    export_saving: f64,
    tax_saving: f64,
    opex: f64,
    capital_expense_base: f64,
    capital_expense: f64,
    total_expense_base: f64,
    total_expense: f64,
    total_income: f64,
    cumulative_cash_flow_base: f64,
    cumulative_cash_flow: f64,
    self_consumption_pct: f64,
}

impl YearRow {
    /// Create a new [`YearRow`]
    fn new(record: &YearRecord) -> Self {
        Self {
            year: record.year,
            generation_rate: record.generation_rate.value(),
            generation: record.generation.value(),
            consumption: record.consumption.value(),
            self_consumed: record.self_consumed.value(),
            exported: record.exported.value(),
            tariff: record.tariff.value(),
            buyback_rate: record.buyback_rate.value(),
            consumption_saving: record.consumption_saving.value(),
            export_saving: record.export_saving.value(),
            tax_saving: record.tax_saving.value(),
            opex: record.opex.value(),
            capital_expense_base: record.capital_expense_base.value(),
            capital_expense: record.capital_expense.value(),
            total_expense_base: record.total_expense_base.value(),
            total_expense: record.total_expense.value(),
            total_income: record.total_income.value(),
            cumulative_cash_flow_base: record.cumulative_cash_flow_base.value(),
            cumulative_cash_flow: record.cumulative_cash_flow.value(),
            self_consumption_pct: record.self_consumption_pct.value(),
        }
    }
}

/// Serialise an undefined ratio metric as an explicit marker rather than a number
fn serialise_optional_rate<S: Serializer>(
    value: &Option<f64>,
    serialiser: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serialiser.serialize_f64(*value),
        None => serialiser.serialize_str("undefined"),
    }
}

/// Serialise an unreached payback period as an explicit marker rather than a number
fn serialise_optional_years<S: Serializer>(
    value: &Option<f64>,
    serialiser: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serialiser.serialize_f64(*value),
        None => serialiser.serialize_str("not achieved"),
    }
}

/// Represents a row in the summary CSV file
#[derive(Serialize, Debug, PartialEq)]
struct SummaryRow {
    input_set: u32,
    scenario: ScenarioID,
    capacity_kwp: f64,
    base_investment_cost: f64,
    total_investment_cost: f64,
    average_consumption: f64,
    average_generation: f64,
    #[serde(serialize_with = "serialise_optional_rate")]
    average_self_consumption_pct: Option<f64>,
    #[serde(serialize_with = "serialise_optional_rate")]
    irr_base_pct: Option<f64>,
    #[serde(serialize_with = "serialise_optional_rate")]
    irr_pct: Option<f64>,
    #[serde(serialize_with = "serialise_optional_years")]
    payback_years_base: Option<f64>,
    #[serde(serialize_with = "serialise_optional_years")]
    payback_years: Option<f64>,
}

impl SummaryRow {
    /// Create a new [`SummaryRow`]
    fn new(summary: &ScenarioSummary) -> Self {
        Self {
            input_set: summary.input_set,
            scenario: summary.scenario.clone(),
            capacity_kwp: summary.capacity.value(),
            base_investment_cost: summary.base_investment_cost.value(),
            total_investment_cost: summary.total_investment_cost.value(),
            average_consumption: summary.average_consumption.value(),
            average_generation: summary.average_generation.value(),
            average_self_consumption_pct: summary
                .average_self_consumption_pct
                .map(|pct| pct.value()),
            irr_base_pct: summary.irr_base.map(|rate| rate.value() * 100.0),
            irr_pct: summary.irr.map(|rate| rate.value() * 100.0),
            payback_years_base: summary.payback_years_base,
            payback_years: summary.payback_years,
        }
    }
}

/// An object for writing projection results to CSV files
pub struct DataWriter {
    output_path: PathBuf,
    summary_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let summary_writer = csv::Writer::from_path(output_path.join(SUMMARY_FILE_NAME))?;

        Ok(Self {
            output_path: output_path.to_owned(),
            summary_writer,
        })
    }

    /// Write one pair's detail table and its summary row
    pub fn write_pair(&mut self, pair: &PairResult) -> Result<()> {
        // A pair which failed with a numeric error has no detail table, only a summary row with
        // undefined markers
        if !pair.records.is_empty() {
            self.write_detail(pair)?;
        }
        self.summary_writer.serialize(SummaryRow::new(&pair.summary))?;

        Ok(())
    }

    /// Write the year-by-year detail CSV file for a pair
    fn write_detail(&self, pair: &PairResult) -> Result<()> {
        let file_path = self
            .output_path
            .join(detail_file_name(pair.input_set, &pair.scenario));
        let mut writer = csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))?;
        for record in &pair.records {
            writer.serialize(YearRow::new(record))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.summary_writer.flush()?;

        Ok(())
    }
}

/// The detail CSV file name for a pair
fn detail_file_name(input_set: u32, scenario: &ScenarioID) -> String {
    format!("input_{input_set}_{}.csv", sanitise_name(&scenario.0))
}

/// Replace characters which cannot safely appear in file names
fn sanitise_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write all projection results to the specified output folder
///
/// # Arguments
///
/// * `output_path` - Folder where files will be saved
/// * `results` - The assembled results of a run
pub fn write_results(output_path: &Path, results: &ProjectionResults) -> Result<()> {
    let mut writer = DataWriter::create(output_path)?;
    for pair in &results.pairs {
        writer.write_pair(pair)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{installation_inputs, model_parameters};
    use crate::installation::InstallationInputs;
    use crate::metrics::summarise_pair;
    use crate::model::ModelParameters;
    use crate::simulation::projection::simulate;
    use crate::units::Energy;
    use itertools::Itertools;
    use rstest::rstest;
    use tempfile::tempdir;

    fn simulated_pair(
        inputs: &InstallationInputs,
        parameters: &ModelParameters,
    ) -> PairResult {
        let consumption = [Energy(10_000.0); 3];
        let records = simulate(inputs, &consumption, parameters).unwrap();
        let summary = summarise_pair(1, inputs, "flat".into(), &records);
        PairResult {
            input_set: 1,
            scenario: "flat".into(),
            records,
            summary,
        }
    }

    #[rstest]
    fn test_write_pair(
        installation_inputs: InstallationInputs,
        model_parameters: ModelParameters,
    ) {
        let pair = simulated_pair(&installation_inputs, &model_parameters);
        let dir = tempdir().unwrap();

        // Write the pair
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_pair(&pair).unwrap();
            writer.flush().unwrap();
        }

        // Read back and compare
        let records: Vec<YearRow> =
            csv::Reader::from_path(dir.path().join("input_1_flat.csv"))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        let expected: Vec<YearRow> = pair.records.iter().map(YearRow::new).collect();
        assert_eq!(records, expected);
    }

    #[rstest]
    fn test_write_summary_markers(
        installation_inputs: InstallationInputs,
        model_parameters: ModelParameters,
    ) {
        let mut pair = simulated_pair(&installation_inputs, &model_parameters);

        // Force every metric to its undefined marker
        pair.records = Vec::new();
        pair.summary.average_self_consumption_pct = None;
        pair.summary.irr = None;
        pair.summary.irr_base = None;
        pair.summary.payback_years = None;
        pair.summary.payback_years_base = None;

        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_pair(&pair).unwrap();
            writer.flush().unwrap();
        }

        // No detail table is written for a failed pair
        assert!(!dir.path().join("input_1_flat.csv").exists());

        let mut reader = csv::Reader::from_path(dir.path().join(SUMMARY_FILE_NAME)).unwrap();
        let headers = reader.headers().unwrap().clone();
        let row = reader.records().next().unwrap().unwrap();
        let field = |name: &str| {
            let position = headers.iter().position(|header| header == name).unwrap();
            row.get(position).unwrap().to_string()
        };

        assert_eq!(field("average_self_consumption_pct"), "undefined");
        assert_eq!(field("irr_pct"), "undefined");
        assert_eq!(field("payback_years"), "not achieved");
        assert_eq!(field("payback_years_base"), "not achieved");
    }

    #[test]
    fn test_detail_file_name_is_sanitised() {
        assert_eq!(
            detail_file_name(2, &"High growth (2x)".into()),
            "input_2_High_growth__2x_.csv"
        );
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        // Creating a fresh directory never counts as replacing one
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // An existing directory is only replaced with the overwrite flag
        std::fs::write(output_dir.join("stale.csv"), "stale").unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("stale.csv").exists());
    }
}
