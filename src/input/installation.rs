//! Code for reading the installation inputs table from CSV.
use super::{input_err_msg, read_csv};
use crate::escalation::EscalationSchedule;
use crate::installation::InstallationInputs;
use crate::units::{
    Capacity, Dimensionless, EnergyPerCapacity, Money, MoneyPerCapacity, MoneyPerEnergy,
};
use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

const INPUT_DETAILS_FILE_NAME: &str = "input_details.csv";

fn default_export_allowed() -> bool {
    true
}

/// A row of the installation inputs CSV file, with percentages as entered.
#[derive(Debug, Clone, Deserialize)]
struct InstallationInputsRaw {
    capacity_kwp: f64,
    specific_yield: f64,
    annual_performance_drop_pct: f64,
    years_projection: u32,
    electricity_tariff: f64,
    buyback_rate: f64,
    cost_per_kwp: f64,
    structure_cost: f64,
    opex: f64,
    tariff_hike_pct: f64,
    tariff_hike_interval: u32,
    buyback_hike_pct: f64,
    buyback_hike_interval: u32,
    opex_hike_pct: f64,
    opex_hike_interval: u32,
    opex_start_year: u32,
    /// Older input files predate the export toggle, in which case export is permitted
    #[serde(default = "default_export_allowed")]
    export_allowed: bool,
}

impl InstallationInputsRaw {
    /// Convert percentages to fractions and validate the assembled inputs.
    fn into_inputs(self) -> Result<InstallationInputs> {
        let inputs = InstallationInputs {
            capacity: Capacity(self.capacity_kwp),
            specific_yield: EnergyPerCapacity(self.specific_yield),
            performance_drop: Dimensionless(self.annual_performance_drop_pct / 100.0),
            horizon_years: self.years_projection,
            tariff: MoneyPerEnergy(self.electricity_tariff),
            buyback_rate: MoneyPerEnergy(self.buyback_rate),
            cost_per_kwp: MoneyPerCapacity(self.cost_per_kwp),
            structure_cost: Money(self.structure_cost),
            opex: Money(self.opex),
            tariff_escalation: EscalationSchedule::new(
                Dimensionless(self.tariff_hike_pct / 100.0),
                self.tariff_hike_interval,
            )
            .context("Invalid tariff escalation")?,
            buyback_escalation: EscalationSchedule::new(
                Dimensionless(self.buyback_hike_pct / 100.0),
                self.buyback_hike_interval,
            )
            .context("Invalid buyback escalation")?,
            opex_escalation: EscalationSchedule::new(
                Dimensionless(self.opex_hike_pct / 100.0),
                self.opex_hike_interval,
            )
            .context("Invalid OPEX escalation")?,
            opex_start_year: self.opex_start_year,
            export_allowed: self.export_allowed,
        };
        inputs.validate()?;

        Ok(inputs)
    }
}

/// Read installation input sets from an iterator.
fn read_installation_inputs_from_iter<I>(iter: I) -> Result<Vec<InstallationInputs>>
where
    I: Iterator<Item = InstallationInputsRaw>,
{
    iter.enumerate()
        .map(|(index, raw)| {
            raw.into_inputs()
                .with_context(|| format!("Invalid input set {}", index + 1))
        })
        .try_collect()
}

/// Read the installation inputs table from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the input tables
///
/// # Returns
///
/// The validated input sets, in input order.
pub fn read_installation_inputs(model_dir: &Path) -> Result<Vec<InstallationInputs>> {
    let file_path = model_dir.join(INPUT_DETAILS_FILE_NAME);
    let raw = read_csv(&file_path)?;
    read_installation_inputs_from_iter(raw.into_iter()).with_context(|| input_err_msg(&file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::installation_inputs;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    const HEADER: &str = "capacity_kwp,specific_yield,annual_performance_drop_pct,\
years_projection,electricity_tariff,buyback_rate,cost_per_kwp,structure_cost,opex,\
tariff_hike_pct,tariff_hike_interval,buyback_hike_pct,buyback_hike_interval,\
opex_hike_pct,opex_hike_interval,opex_start_year";

    /// Create an example installation inputs file in `dir_path`
    fn create_input_details_file(dir_path: &Path, row: &str, export_column: bool) {
        let file_path = dir_path.join(INPUT_DETAILS_FILE_NAME);
        let mut file = File::create(file_path).unwrap();
        if export_column {
            writeln!(file, "{HEADER},export_allowed").unwrap();
        } else {
            writeln!(file, "{HEADER}").unwrap();
        }
        writeln!(file, "{row}").unwrap();
    }

    #[rstest]
    fn test_read_installation_inputs(installation_inputs: InstallationInputs) {
        let dir = tempdir().unwrap();
        create_input_details_file(
            dir.path(),
            "10,1400,0.5,3,0.5,0.3,4000,0,200,0,1,0,1,0,1,1,true",
            true,
        );
        let inputs = read_installation_inputs(dir.path()).unwrap();
        assert_eq!(inputs, vec![installation_inputs]);
    }

    #[rstest]
    fn test_read_installation_inputs_export_defaults_to_true(
        installation_inputs: InstallationInputs,
    ) {
        let dir = tempdir().unwrap();
        create_input_details_file(
            dir.path(),
            "10,1400,0.5,3,0.5,0.3,4000,0,200,0,1,0,1,0,1,1",
            false,
        );
        let inputs = read_installation_inputs(dir.path()).unwrap();
        assert_eq!(inputs, vec![installation_inputs]);
    }

    #[test]
    fn test_read_installation_inputs_rejects_zero_hike_interval() {
        let dir = tempdir().unwrap();
        create_input_details_file(
            dir.path(),
            "10,1400,0.5,3,0.5,0.3,4000,0,200,0,0,0,1,0,1,1,true",
            true,
        );
        assert!(read_installation_inputs(dir.path()).is_err());
    }

    #[test]
    fn test_read_installation_inputs_rejects_zero_horizon() {
        let dir = tempdir().unwrap();
        create_input_details_file(
            dir.path(),
            "10,1400,0.5,0,0.5,0.3,4000,0,200,0,1,0,1,0,1,1,true",
            true,
        );
        assert!(read_installation_inputs(dir.path()).is_err());
    }

    #[test]
    fn test_read_installation_inputs_missing_column() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(INPUT_DETAILS_FILE_NAME);
        let mut file = File::create(file_path).unwrap();
        writeln!(file, "capacity_kwp,specific_yield").unwrap();
        writeln!(file, "10,1400").unwrap();
        drop(file);
        assert!(read_installation_inputs(dir.path()).is_err());
    }
}
