//! Fiscal-year accounting records: the raw input to the scoring pipeline.
//!
//! Each record is one fiscal year of balance-sheet and income-statement
//! line items. Ordering is always derived from the explicit `year` label,
//! never from the position of the row in the input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::Money;
use crate::{FinScoreError, FinScoreResult};

/// Minimum number of fiscal years required for standardization and
/// temporal weighting.
pub const MIN_YEARS: usize = 2;

/// Maximum number of fiscal years the recency weighting supports.
pub const MAX_YEARS: usize = 3;

/// One fiscal year of raw accounting inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalYearStatement {
    /// Fiscal year label (e.g. 2023).
    pub year: i32,
    // Balance sheet
    pub current_assets: Money,
    pub current_liabilities: Money,
    pub inventories: Money,
    pub cash: Money,
    pub receivables: Money,
    pub payables: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub equity: Money,
    // Income statement
    pub revenue: Money,
    pub costs: Money,
    pub net_income: Money,
    pub interest_expense: Money,
    pub tax_expense: Money,
    /// Defaults to 0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation: Option<Money>,
    /// Defaults to 0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amortization: Option<Money>,
}

impl FiscalYearStatement {
    /// Earnings before interest and tax.
    pub fn ebit(&self) -> Decimal {
        self.net_income + self.interest_expense + self.tax_expense
    }

    /// EBIT plus depreciation and amortization (both default to 0).
    pub fn ebitda(&self) -> Decimal {
        self.ebit()
            + self.depreciation.unwrap_or_default()
            + self.amortization.unwrap_or_default()
    }

    /// Gross debt as carried by the scoring model: liabilities net of equity.
    pub fn gross_debt(&self) -> Decimal {
        self.total_liabilities - self.equity
    }

    /// Gross debt minus cash and equivalents.
    pub fn net_debt(&self) -> Decimal {
        self.gross_debt() - self.cash
    }
}

/// Validate the year count and label uniqueness, then sort most-recent-first.
///
/// The temporal aggregator indexes its recency weights by this order, so
/// every downstream row index 0 is the latest fiscal year.
pub fn validate_and_sort(
    mut statements: Vec<FiscalYearStatement>,
) -> FinScoreResult<Vec<FiscalYearStatement>> {
    if statements.len() < MIN_YEARS {
        return Err(FinScoreError::InsufficientYears {
            found: statements.len(),
        });
    }
    if statements.len() > MAX_YEARS {
        return Err(FinScoreError::InvalidInput {
            field: "statements".into(),
            reason: format!(
                "at most {} fiscal years supported, got {}",
                MAX_YEARS,
                statements.len()
            ),
        });
    }
    let mut years: Vec<i32> = statements.iter().map(|s| s.year).collect();
    years.sort_unstable();
    if years.windows(2).any(|w| w[0] == w[1]) {
        return Err(FinScoreError::InvalidInput {
            field: "year".into(),
            reason: "duplicate fiscal year labels".into(),
        });
    }
    statements.sort_by(|a, b| b.year.cmp(&a.year));
    Ok(statements)
}

/// Required numeric fields of a statement row, as they appear at the JSON
/// boundary.
pub const REQUIRED_FIELDS: &[&str] = &[
    "current_assets",
    "current_liabilities",
    "inventories",
    "cash",
    "receivables",
    "payables",
    "total_assets",
    "total_liabilities",
    "equity",
    "revenue",
    "costs",
    "net_income",
    "interest_expense",
    "tax_expense",
];

/// Parse a JSON array of statement rows, reporting the first missing or
/// non-numeric required field by name and year instead of a generic
/// deserialization error.
pub fn parse_statements(value: &serde_json::Value) -> FinScoreResult<Vec<FiscalYearStatement>> {
    let rows = value
        .as_array()
        .ok_or_else(|| FinScoreError::InvalidInput {
            field: "statements".into(),
            reason: "expected an array of fiscal-year rows".into(),
        })?;

    let mut statements = Vec::with_capacity(rows.len());
    for row in rows {
        let obj = row.as_object().ok_or_else(|| FinScoreError::InvalidInput {
            field: "statements".into(),
            reason: "each row must be an object".into(),
        })?;
        let year = obj
            .get("year")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| FinScoreError::InvalidInput {
                field: "year".into(),
                reason: "each row needs an integer 'year' label".into(),
            })? as i32;

        for field in REQUIRED_FIELDS {
            if obj.get(*field).and_then(decimal_value).is_none() {
                return Err(FinScoreError::MissingField {
                    field: (*field).to_string(),
                    year,
                });
            }
        }
        statements.push(serde_json::from_value(row.clone())?);
    }
    Ok(statements)
}

fn decimal_value(v: &serde_json::Value) -> Option<Decimal> {
    match v {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}
