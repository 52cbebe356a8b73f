//! Ratio Engine: derives the fixed catalogue of financial ratios per
//! fiscal year.
//!
//! The catalogue is data, not orchestration code: each entry names the
//! ratio, its group, and a pure formula over one statement. Division by a
//! zero denominator yields an undefined cell (`None`), never a coerced
//! zero and never a panic. Every defined cell is rounded to 2 decimal
//! places at the point of first computation; all downstream stages operate
//! on the rounded values.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::statements::FiscalYearStatement;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// Ratio family, used for reporting and for grouping in the output bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioGroup {
    Liquidity,
    Profitability,
    Leverage,
    Efficiency,
}

/// One entry of the ratio catalogue.
pub struct RatioDef {
    pub name: &'static str,
    pub group: RatioGroup,
    pub formula: fn(&FiscalYearStatement) -> Option<Decimal>,
}

fn div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn current_ratio(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.current_assets, s.current_liabilities)
}

fn quick_ratio(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.current_assets - s.inventories, s.current_liabilities)
}

fn working_capital_to_assets(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.current_assets - s.current_liabilities, s.total_assets)
}

fn net_margin(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.net_income, s.revenue)
}

fn roa(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.net_income, s.total_assets)
}

fn roe(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.net_income, s.equity)
}

fn ebitda_margin(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.ebitda(), s.revenue)
}

fn debt_to_assets(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.gross_debt(), s.total_assets)
}

fn net_debt_to_ebitda(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.net_debt(), s.ebitda())
}

fn interest_coverage(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.ebit(), s.interest_expense)
}

fn asset_turnover(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.revenue, s.total_assets)
}

fn days_receivable(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.receivables, s.revenue).map(|v| v * DAYS_PER_YEAR)
}

fn days_payable(s: &FiscalYearStatement) -> Option<Decimal> {
    div(s.payables, s.costs).map(|v| v * DAYS_PER_YEAR)
}

/// Name of the one conditionally-dropped column.
pub const QUICK_RATIO: &str = "quick_ratio";

/// The fixed ratio catalogue, in reporting order.
pub const CATALOGUE: &[RatioDef] = &[
    RatioDef {
        name: "current_ratio",
        group: RatioGroup::Liquidity,
        formula: current_ratio,
    },
    RatioDef {
        name: QUICK_RATIO,
        group: RatioGroup::Liquidity,
        formula: quick_ratio,
    },
    RatioDef {
        name: "working_capital_to_assets",
        group: RatioGroup::Liquidity,
        formula: working_capital_to_assets,
    },
    RatioDef {
        name: "net_margin",
        group: RatioGroup::Profitability,
        formula: net_margin,
    },
    RatioDef {
        name: "roa",
        group: RatioGroup::Profitability,
        formula: roa,
    },
    RatioDef {
        name: "roe",
        group: RatioGroup::Profitability,
        formula: roe,
    },
    RatioDef {
        name: "ebitda_margin",
        group: RatioGroup::Profitability,
        formula: ebitda_margin,
    },
    RatioDef {
        name: "debt_to_assets",
        group: RatioGroup::Leverage,
        formula: debt_to_assets,
    },
    RatioDef {
        name: "net_debt_to_ebitda",
        group: RatioGroup::Leverage,
        formula: net_debt_to_ebitda,
    },
    RatioDef {
        name: "interest_coverage",
        group: RatioGroup::Leverage,
        formula: interest_coverage,
    },
    RatioDef {
        name: "asset_turnover",
        group: RatioGroup::Efficiency,
        formula: asset_turnover,
    },
    RatioDef {
        name: "days_receivable",
        group: RatioGroup::Efficiency,
        formula: days_receivable,
    },
    RatioDef {
        name: "days_payable",
        group: RatioGroup::Efficiency,
        formula: days_payable,
    },
];

/// One derived ratio column, one cell per fiscal year (most recent first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioColumn {
    pub name: String,
    pub group: RatioGroup,
    /// `None` = undefined (division by zero), serialized as `null`.
    pub values: Vec<Option<Decimal>>,
}

/// A column removed from the table by a documented transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedColumn {
    pub name: String,
    pub reason: String,
}

/// Derived ratios: one row per fiscal year, one column per catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioTable {
    /// Fiscal year labels, most recent first.
    pub years: Vec<i32>,
    pub columns: Vec<RatioColumn>,
    /// Columns removed by a documented transformation (never silent).
    pub dropped: Vec<DroppedColumn>,
}

impl RatioTable {
    pub fn column(&self, name: &str) -> Option<&RatioColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value of a ratio in the most recent year, if defined.
    pub fn latest(&self, name: &str) -> Option<Decimal> {
        self.column(name)
            .and_then(|c| c.values.first().copied())
            .flatten()
    }
}

/// Derive the full ratio table from statements already sorted
/// most-recent-first.
///
/// The quick ratio degenerates to the current ratio when inventories are
/// zero, so when inventories are zero in *every* observed year the column
/// is dropped from the table and the drop is recorded on the table itself.
pub fn derive_ratios(statements: &[FiscalYearStatement]) -> RatioTable {
    let all_inventories_zero = statements.iter().all(|s| s.inventories.is_zero());

    let mut columns = Vec::with_capacity(CATALOGUE.len());
    let mut dropped = Vec::new();

    for def in CATALOGUE {
        if def.name == QUICK_RATIO && all_inventories_zero {
            dropped.push(DroppedColumn {
                name: QUICK_RATIO.to_string(),
                reason: "inventories are zero in every observed year".to_string(),
            });
            continue;
        }
        let values = statements
            .iter()
            .map(|s| (def.formula)(s).map(|v| v.round_dp(2)))
            .collect();
        columns.push(RatioColumn {
            name: def.name.to_string(),
            group: def.group,
            values,
        });
    }

    RatioTable {
        years: statements.iter().map(|s| s.year).collect(),
        columns,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statements::tests::statement;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_catalogue_has_thirteen_ratios() {
        assert_eq!(CATALOGUE.len(), 13);
    }

    #[test]
    fn test_basic_derivation_rounds_to_two_places() {
        let table = derive_ratios(&[statement(2023), statement(2022)]);
        assert_eq!(table.years, vec![2023, 2022]);
        assert_eq!(table.latest("current_ratio"), Some(dec!(2.00)));
        assert_eq!(table.latest("quick_ratio"), Some(dec!(1.50)));
        assert_eq!(table.latest("net_margin"), Some(dec!(0.08)));
        // receivables / revenue * 365 = 60/1000*365 = 21.9
        assert_eq!(table.latest("days_receivable"), Some(dec!(21.90)));
        for col in &table.columns {
            for v in col.values.iter().flatten() {
                assert!(v.scale() <= 2, "{} not rounded: {v}", col.name);
            }
        }
    }

    #[test]
    fn test_division_by_zero_is_undefined_not_zero() {
        let mut s = statement(2023);
        s.interest_expense = dec!(0);
        let table = derive_ratios(&[s, statement(2022)]);
        let col = table.column("interest_coverage").unwrap();
        assert_eq!(col.values[0], None);
        assert!(col.values[1].is_some());
    }

    #[test]
    fn test_quick_ratio_dropped_when_inventories_always_zero() {
        let mut a = statement(2023);
        let mut b = statement(2022);
        a.inventories = dec!(0);
        b.inventories = dec!(0);
        let table = derive_ratios(&[a, b]);
        assert!(table.column(QUICK_RATIO).is_none());
        assert_eq!(table.dropped.len(), 1);
        assert_eq!(table.dropped[0].name, QUICK_RATIO);
    }

    #[test]
    fn test_quick_ratio_kept_when_any_year_has_inventories() {
        let mut a = statement(2023);
        a.inventories = dec!(0);
        let table = derive_ratios(&[a, statement(2022)]);
        assert!(table.column(QUICK_RATIO).is_some());
        assert!(table.dropped.is_empty());
    }

    #[test]
    fn test_negative_ebitda_still_defined() {
        let mut s = statement(2023);
        s.net_income = dec!(-200);
        let table = derive_ratios(&[s, statement(2022)]);
        // EBIT = -200+20+25 = -155, EBITDA = -135; ratio defined, negative
        assert_eq!(table.latest("net_debt_to_ebitda"), Some(dec!(-0.52)));
    }
}
