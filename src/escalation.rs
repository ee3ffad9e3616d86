//! Escalation schedules for tariffs, buyback rates and operating expenses.
use crate::units::Dimensionless;
use anyhow::{Result, ensure};
use std::ops::Mul;

/// A periodic escalation rule applied to a base rate.
///
/// The rate is constant within each interval-sized block of years and grows by the step fraction
/// once per completed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscalationSchedule {
    /// Fractional increase applied once per completed interval (e.g. 0.1 for +10%)
    step: Dimensionless,
    /// Length of each block of years over which the rate stays constant
    interval_years: u32,
}

impl EscalationSchedule {
    /// Create a schedule, checking that the step and interval are usable.
    pub fn new(step: Dimensionless, interval_years: u32) -> Result<Self> {
        ensure!(
            interval_years >= 1,
            "Escalation interval must be at least one year"
        );
        ensure!(
            step.is_finite() && step > Dimensionless(-1.0),
            "Escalation step must be a finite fraction greater than -1"
        );

        Ok(Self {
            step,
            interval_years,
        })
    }

    /// The growth factor applicable in the given 1-indexed year.
    ///
    /// Computed as a direct power of the number of completed intervals since year 1, so the factor
    /// for any year can be queried without stepping through earlier years.
    pub fn factor_for_year(&self, year: u32) -> Dimensionless {
        self.factor_from_start_year(1, year)
    }

    /// The growth factor for a schedule which only starts in `start_year`.
    ///
    /// The factor is zero before the start year and 1 in the start year itself; intervals are
    /// measured from the start year onwards.
    pub fn factor_from_start_year(&self, start_year: u32, year: u32) -> Dimensionless {
        debug_assert!(year >= 1, "Years are 1-indexed");
        if year < start_year {
            return Dimensionless(0.0);
        }

        let elapsed_intervals = (year - start_year) / self.interval_years;
        (Dimensionless(1.0) + self.step).powi(elapsed_intervals as i32)
    }

    /// The rate applicable in the given 1-indexed year.
    pub fn rate_for_year<T>(&self, base: T, year: u32) -> T
    where
        T: Mul<Dimensionless, Output = T>,
    {
        base * self.factor_for_year(year)
    }

    /// The rate applicable in the given year for a schedule starting in `start_year`.
    pub fn rate_from_start_year<T>(&self, base: T, start_year: u32, year: u32) -> T
    where
        T: Mul<Dimensionless, Output = T>,
    {
        base * self.factor_from_start_year(start_year, year)
    }
}
