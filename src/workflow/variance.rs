//! Variance between counted and recorded quantities.
//!
//! Everything here is a pure function of the current rows and is recomputed
//! whenever it is asked for.

use serde::Serialize;
use strum::Display;

use crate::models::CheckRow;

/// How a counted quantity compares to the recorded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VarianceClass {
    /// More units on the shelf than recorded.
    Surplus,
    /// Fewer units on the shelf than recorded.
    Shortage,
    Balanced,
}

impl VarianceClass {
    pub fn of(variance: i64) -> Self {
        match variance.signum() {
            1 => VarianceClass::Surplus,
            -1 => VarianceClass::Shortage,
            _ => VarianceClass::Balanced,
        }
    }
}

/// Signed difference `actual - system` for one row.
///
/// Quantities are unbounded `i64`s, so the arithmetic here and in
/// [`VarianceSummary`] saturates at the `i64` limits instead of overflowing.
pub fn row_variance(row: &CheckRow) -> i64 {
    row.actual_quantity.saturating_sub(row.system_quantity)
}

pub fn classify_row(row: &CheckRow) -> VarianceClass {
    VarianceClass::of(row_variance(row))
}

/// Totals over a set of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarianceSummary {
    pub total_system_quantity: i64,
    pub total_actual_quantity: i64,
    /// Derived from the two totals, not by summing per-row variances.
    pub total_variance: i64,
    pub surplus_rows: usize,
    pub shortage_rows: usize,
    pub balanced_rows: usize,
}

impl VarianceSummary {
    pub fn from_rows(rows: &[CheckRow]) -> Self {
        let total_system_quantity = saturating_total(rows.iter().map(|row| row.system_quantity));
        let total_actual_quantity = saturating_total(rows.iter().map(|row| row.actual_quantity));

        let mut summary = Self {
            total_system_quantity,
            total_actual_quantity,
            total_variance: total_actual_quantity.saturating_sub(total_system_quantity),
            ..Self::default()
        };

        for row in rows {
            match classify_row(row) {
                VarianceClass::Surplus => summary.surplus_rows += 1,
                VarianceClass::Shortage => summary.shortage_rows += 1,
                VarianceClass::Balanced => summary.balanced_rows += 1,
            }
        }

        summary
    }

    pub fn classification(&self) -> VarianceClass {
        VarianceClass::of(self.total_variance)
    }
}

fn saturating_total(quantities: impl Iterator<Item = i64>) -> i64 {
    quantities.fold(0i64, i64::saturating_add)
}
