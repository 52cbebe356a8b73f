//! Standardizer: per-column z-scores over the observed years.
//!
//! Strict contract: a column that cannot be standardized (undefined cells
//! or zero variance) is an error naming the column, never a silent NaN.
//! The pipeline screens columns before calling in here; see `report`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DegenerateReason;
use crate::ratios::RatioTable;
use crate::statements::MIN_YEARS;
use crate::{FinScoreError, FinScoreResult};

/// Ratio table rescaled to zero mean / unit population variance per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedTable {
    /// Fiscal year labels, most recent first.
    pub years: Vec<i32>,
    /// Column names, in table order.
    pub columns: Vec<String>,
    /// One row per fiscal year, aligned with `years`.
    pub rows: Vec<Vec<Decimal>>,
}

/// Z-score every column of the ratio table.
pub fn standardize(table: &RatioTable) -> FinScoreResult<StandardizedTable> {
    let n = table.years.len();
    if n < MIN_YEARS {
        return Err(FinScoreError::InsufficientYears { found: n });
    }

    let n_dec = Decimal::from(n as u64);
    let mut standardized: Vec<Vec<Decimal>> = Vec::with_capacity(table.columns.len());

    for col in &table.columns {
        let mut values = Vec::with_capacity(n);
        for cell in &col.values {
            match cell {
                Some(v) => values.push(*v),
                None => {
                    return Err(FinScoreError::DegenerateColumn {
                        column: col.name.clone(),
                        reason: DegenerateReason::UndefinedCells,
                    })
                }
            }
        }

        let mean: Decimal = values.iter().copied().sum::<Decimal>() / n_dec;
        let variance: Decimal = values
            .iter()
            .map(|v| (*v - mean) * (*v - mean))
            .sum::<Decimal>()
            / n_dec;
        if variance.is_zero() {
            return Err(FinScoreError::DegenerateColumn {
                column: col.name.clone(),
                reason: DegenerateReason::ZeroVariance,
            });
        }

        let std_dev = sqrt_decimal(variance);
        standardized.push(values.iter().map(|v| (*v - mean) / std_dev).collect());
    }

    // Transpose column-major z-scores into year rows.
    let rows = (0..n)
        .map(|r| standardized.iter().map(|col| col[r]).collect())
        .collect();

    Ok(StandardizedTable {
        years: table.years.clone(),
        columns: table.columns.iter().map(|c| c.name.clone()).collect(),
        rows,
    })
}

/// Square-root using Newton's method (Decimal-safe).
pub(crate) fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let mut x = val;
    let two = dec!(2);
    for _ in 0..40 {
        let next = (x + val / x) / two;
        if (next - x).abs() < dec!(0.00000000000001) {
            return next;
        }
        x = next;
    }
    x
}
