//! Consumption scenarios describing how annual demand evolves over the projection horizon.
use crate::id::define_id_type;
use crate::units::{Dimensionless, Energy};
use anyhow::{Result, ensure};

define_id_type!(ScenarioID);

/// A time-bounded percentage adjustment to annual consumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentRule {
    /// Percentage change applied in each year of the window (e.g. 5 for +5% per year)
    pub percentage_change: Dimensionless,
    /// First 1-indexed year of the window
    pub start_year: u32,
    /// Number of years the adjustment applies for; zero or negative means it never applies
    pub duration_years: i32,
}

impl AdjustmentRule {
    /// Whether the rule's window contains the given 1-indexed year.
    fn applies_in(&self, year: u32) -> bool {
        self.duration_years > 0
            && year >= self.start_year
            && i64::from(year) < i64::from(self.start_year) + i64::from(self.duration_years)
    }

    /// The multiplicative factor applied in each year of the window.
    fn factor(&self) -> Dimensionless {
        Dimensionless(1.0) + self.percentage_change / Dimensionless(100.0)
    }
}

/// A named demand-growth scenario, shared across all input sets.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioDefinition {
    /// The scenario's unique name
    pub id: ScenarioID,
    /// Annual consumption before any adjustment applies (kWh/year)
    pub baseline_consumption: Energy,
    /// Adjustment rules in input order; overlapping rules all apply multiplicatively
    pub adjustments: Vec<AdjustmentRule>,
}

impl ScenarioDefinition {
    /// Check that the scenario's fields are usable.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.baseline_consumption.is_finite() && self.baseline_consumption > Energy(0.0),
            "Baseline consumption must be positive"
        );

        for rule in &self.adjustments {
            ensure!(
                rule.percentage_change.is_finite()
                    && rule.percentage_change >= Dimensionless(-100.0),
                "Percentage change must be a finite value of at least -100"
            );
            ensure!(
                rule.start_year >= 1,
                "Adjustment start year must be at least 1"
            );
        }

        Ok(())
    }

    /// The annual consumption for each year of the projection horizon.
    ///
    /// Adjustments compound year over year: a rule active for three consecutive years multiplies
    /// the running value three times, and simultaneously active rules all apply in the same year.
    pub fn consumption_series(&self, horizon_years: u32) -> Vec<Energy> {
        let mut value = self.baseline_consumption;
        let mut series = Vec::with_capacity(horizon_years as usize);
        for year in 1..=horizon_years {
            for rule in &self.adjustments {
                if rule.applies_in(year) {
                    value = value * rule.factor();
                }
            }
            series.push(value);
        }

        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn scenario(adjustments: Vec<AdjustmentRule>) -> ScenarioDefinition {
        ScenarioDefinition {
            id: "test".into(),
            baseline_consumption: Energy(1000.0),
            adjustments,
        }
    }

    fn assert_series_eq(actual: &[Energy], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (actual, expected) in actual.iter().zip(expected) {
            assert_approx_eq!(Energy, *actual, Energy(*expected), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_consumption_series_no_adjustments() {
        let series = scenario(Vec::new()).consumption_series(4);
        assert_series_eq(&series, &[1000.0, 1000.0, 1000.0, 1000.0]);
    }

    #[test]
    fn test_consumption_series_zero_percentage_is_flat() {
        let rule = AdjustmentRule {
            percentage_change: Dimensionless(0.0),
            start_year: 1,
            duration_years: 4,
        };
        let series = scenario(vec![rule]).consumption_series(4);
        assert_series_eq(&series, &[1000.0, 1000.0, 1000.0, 1000.0]);
    }

    #[test]
    fn test_consumption_series_compounds_within_window() {
        let rule = AdjustmentRule {
            percentage_change: Dimensionless(10.0),
            start_year: 2,
            duration_years: 2,
        };
        let series = scenario(vec![rule]).consumption_series(4);
        assert_series_eq(&series, &[1000.0, 1100.0, 1210.0, 1210.0]);
    }

    #[test]
    fn test_consumption_series_overlapping_rules_all_apply() {
        let rules = vec![
            AdjustmentRule {
                percentage_change: Dimensionless(10.0),
                start_year: 1,
                duration_years: 2,
            },
            AdjustmentRule {
                percentage_change: Dimensionless(50.0),
                start_year: 2,
                duration_years: 1,
            },
        ];
        let series = scenario(rules).consumption_series(3);
        assert_series_eq(&series, &[1100.0, 1815.0, 1815.0]);
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    fn test_consumption_series_non_positive_duration_is_a_noop(#[case] duration_years: i32) {
        let rule = AdjustmentRule {
            percentage_change: Dimensionless(10.0),
            start_year: 1,
            duration_years,
        };
        let series = scenario(vec![rule]).consumption_series(3);
        assert_series_eq(&series, &[1000.0, 1000.0, 1000.0]);
    }

    #[test]
    fn test_validate_rejects_non_positive_baseline() {
        let mut scenario = scenario(Vec::new());
        scenario.baseline_consumption = Energy(0.0);
        assert_error!(scenario.validate(), "Baseline consumption must be positive");
    }

    #[test]
    fn test_validate_rejects_bad_adjustments() {
        let bad_percentage = scenario(vec![AdjustmentRule {
            percentage_change: Dimensionless(-150.0),
            start_year: 1,
            duration_years: 1,
        }]);
        assert_error!(
            bad_percentage.validate(),
            "Percentage change must be a finite value of at least -100"
        );

        let bad_start_year = scenario(vec![AdjustmentRule {
            percentage_change: Dimensionless(5.0),
            start_year: 0,
            duration_years: 1,
        }]);
        assert_error!(
            bad_start_year.validate(),
            "Adjustment start year must be at least 1"
        );
    }
}
