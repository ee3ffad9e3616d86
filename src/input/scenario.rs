//! Code for reading the scenarios table from CSV.
use super::{input_err_msg, read_csv};
use crate::scenario::{AdjustmentRule, ScenarioDefinition, ScenarioID};
use crate::units::{Dimensionless, Energy};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use unicase::UniCase;

const SCENARIOS_FILE_NAME: &str = "scenarios.csv";

/// A row of the scenarios CSV file.
///
/// Adjustment rules arrive as up to five groups of three columns. A fully blank group means "no
/// rule"; blank trailing groups may also be omitted from the file entirely.
#[derive(Debug, Clone, Deserialize)]
struct ScenarioRaw {
    scenario_name: String,
    baseline_consumption: f64,
    #[serde(default)]
    change_1_pct: Option<f64>,
    #[serde(default)]
    change_1_start_year: Option<u32>,
    #[serde(default)]
    change_1_duration: Option<i32>,
    #[serde(default)]
    change_2_pct: Option<f64>,
    #[serde(default)]
    change_2_start_year: Option<u32>,
    #[serde(default)]
    change_2_duration: Option<i32>,
    #[serde(default)]
    change_3_pct: Option<f64>,
    #[serde(default)]
    change_3_start_year: Option<u32>,
    #[serde(default)]
    change_3_duration: Option<i32>,
    #[serde(default)]
    change_4_pct: Option<f64>,
    #[serde(default)]
    change_4_start_year: Option<u32>,
    #[serde(default)]
    change_4_duration: Option<i32>,
    #[serde(default)]
    change_5_pct: Option<f64>,
    #[serde(default)]
    change_5_start_year: Option<u32>,
    #[serde(default)]
    change_5_duration: Option<i32>,
}

impl ScenarioRaw {
    /// The five adjustment column groups in input order.
    fn adjustment_groups(&self) -> [(Option<f64>, Option<u32>, Option<i32>); 5] {
        [
            (
                self.change_1_pct,
                self.change_1_start_year,
                self.change_1_duration,
            ),
            (
                self.change_2_pct,
                self.change_2_start_year,
                self.change_2_duration,
            ),
            (
                self.change_3_pct,
                self.change_3_start_year,
                self.change_3_duration,
            ),
            (
                self.change_4_pct,
                self.change_4_start_year,
                self.change_4_duration,
            ),
            (
                self.change_5_pct,
                self.change_5_start_year,
                self.change_5_duration,
            ),
        ]
    }

    /// Assemble and validate the scenario definition.
    fn into_definition(self) -> Result<ScenarioDefinition> {
        let mut adjustments = Vec::new();
        for (number, group) in self.adjustment_groups().into_iter().enumerate() {
            match group {
                (None, None, None) => {}
                (Some(percentage_change), Some(start_year), Some(duration_years)) => {
                    adjustments.push(AdjustmentRule {
                        percentage_change: Dimensionless(percentage_change),
                        start_year,
                        duration_years,
                    });
                }
                _ => bail!(
                    "Adjustment group {} is incomplete (percentage change, start year and \
                     duration are all required)",
                    number + 1
                ),
            }
        }

        let definition = ScenarioDefinition {
            id: ScenarioID::new(&self.scenario_name),
            baseline_consumption: Energy(self.baseline_consumption),
            adjustments,
        };
        definition.validate()?;

        Ok(definition)
    }
}

/// Read scenario definitions from an iterator.
fn read_scenarios_from_iter<I>(iter: I) -> Result<IndexMap<ScenarioID, ScenarioDefinition>>
where
    I: Iterator<Item = ScenarioRaw>,
{
    let mut scenarios = IndexMap::new();
    let mut seen_names = HashSet::new();
    for raw in iter {
        let name = raw.scenario_name.clone();
        ensure!(!name.trim().is_empty(), "Scenario names cannot be empty");

        // Output file names are derived from scenario names, so names differing only by case
        // would collide on case-insensitive file systems
        ensure!(
            seen_names.insert(UniCase::new(name.clone())),
            "Duplicate scenario name {name}"
        );

        let definition = raw
            .into_definition()
            .with_context(|| format!("Invalid scenario {name}"))?;
        scenarios.insert(definition.id.clone(), definition);
    }

    Ok(scenarios)
}

/// Read the scenarios table from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing the input tables
///
/// # Returns
///
/// The scenario definitions keyed by name, in input order.
pub fn read_scenarios(model_dir: &Path) -> Result<IndexMap<ScenarioID, ScenarioDefinition>> {
    let file_path = model_dir.join(SCENARIOS_FILE_NAME);
    let raw = read_csv(&file_path)?;
    read_scenarios_from_iter(raw.into_iter()).with_context(|| input_err_msg(&file_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn scenario_raw(name: &str) -> ScenarioRaw {
        ScenarioRaw {
            scenario_name: name.to_string(),
            baseline_consumption: 10_000.0,
            change_1_pct: None,
            change_1_start_year: None,
            change_1_duration: None,
            change_2_pct: None,
            change_2_start_year: None,
            change_2_duration: None,
            change_3_pct: None,
            change_3_start_year: None,
            change_3_duration: None,
            change_4_pct: None,
            change_4_start_year: None,
            change_4_duration: None,
            change_5_pct: None,
            change_5_start_year: None,
            change_5_duration: None,
        }
    }

    #[test]
    fn test_into_definition_blank_groups_mean_no_rules() {
        let definition = scenario_raw("flat").into_definition().unwrap();
        assert_eq!(definition.id, "flat".into());
        assert_eq!(definition.baseline_consumption, Energy(10_000.0));
        assert!(definition.adjustments.is_empty());
    }

    #[test]
    fn test_into_definition_with_rules() {
        let mut raw = scenario_raw("growth");
        raw.change_1_pct = Some(5.0);
        raw.change_1_start_year = Some(2);
        raw.change_1_duration = Some(3);
        raw.change_3_pct = Some(-2.0);
        raw.change_3_start_year = Some(4);
        raw.change_3_duration = Some(1);

        let definition = raw.into_definition().unwrap();
        assert_eq!(
            definition.adjustments,
            vec![
                AdjustmentRule {
                    percentage_change: Dimensionless(5.0),
                    start_year: 2,
                    duration_years: 3,
                },
                AdjustmentRule {
                    percentage_change: Dimensionless(-2.0),
                    start_year: 4,
                    duration_years: 1,
                },
            ]
        );
    }

    #[test]
    fn test_into_definition_rejects_incomplete_group() {
        let mut raw = scenario_raw("partial");
        raw.change_2_pct = Some(5.0);
        raw.change_2_duration = Some(3);
        assert_error!(
            raw.into_definition(),
            "Adjustment group 2 is incomplete (percentage change, start year and duration are \
             all required)"
        );
    }

    #[test]
    fn test_read_scenarios_from_iter_rejects_duplicate_names() {
        let raws = [scenario_raw("Flat"), scenario_raw("flat")];
        assert_error!(
            read_scenarios_from_iter(raws.into_iter()),
            "Duplicate scenario name flat"
        );
    }

    #[test]
    fn test_read_scenarios() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SCENARIOS_FILE_NAME);
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(
                file,
                "scenario_name,baseline_consumption,change_1_pct,change_1_start_year,\
change_1_duration"
            )
            .unwrap();
            writeln!(file, "flat,10000,,,").unwrap();
            writeln!(file, "growth,12000,5,2,3").unwrap();
        }

        let scenarios = read_scenarios(dir.path()).unwrap();
        assert_eq!(scenarios.len(), 2);
        let growth = &scenarios[&ScenarioID::new("growth")];
        assert_eq!(growth.baseline_consumption, Energy(12_000.0));
        assert_eq!(
            growth.adjustments,
            vec![AdjustmentRule {
                percentage_change: Dimensionless(5.0),
                start_year: 2,
                duration_years: 3,
            }]
        );
    }
}
