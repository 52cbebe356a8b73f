//! Pipeline orchestration: statements in, scored report bundle out.
//!
//! The run is a pure function chain (ratios, standardization, PCA,
//! temporal aggregation, scaling, policy) with one documented
//! transformation in between: columns the Standardizer would reject
//! (zero variance, undefined cells) are excluded from the scoring matrix
//! before standardization, recorded as warnings and in the report, and
//! kept visible in the ratio table. Nothing is dropped silently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::aggregate::{self, RECENCY_WEIGHTS};
use crate::error::DegenerateReason;
use crate::pca::{self, PcaOutput};
use crate::policy::{self, IndicatorSet, PolicyDecision, PolicyInputs};
use crate::ratios::{self, RatioTable};
use crate::score::{self, BureauBand, RiskBand};
use crate::standardize;
use crate::statements::{self, FiscalYearStatement};
use crate::types::{with_metadata, ComputationOutput};
use crate::{FinScoreError, FinScoreResult};

/// One analysis request: a company, its statements, and the optional
/// externally supplied bureau score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringInput {
    pub company: String,
    pub statements: Vec<FiscalYearStatement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bureau_score: Option<Decimal>,
}

/// A ratio column kept in the table but excluded from the scoring matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedColumn {
    pub name: String,
    pub reason: String,
}

/// The full output bundle consumed by the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub company: String,
    /// Fiscal year labels, most recent first.
    pub period: Vec<i32>,
    pub raw_score: Decimal,
    pub adjusted_score: Decimal,
    pub risk_band: RiskBand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bureau_score: Option<Decimal>,
    pub bureau_band: BureauBand,
    pub ratios: RatioTable,
    /// Columns visible in `ratios` but left out of standardization/PCA.
    pub excluded_columns: Vec<ExcludedColumn>,
    pub pca: PcaOutput,
    pub policy: PolicyDecision,
}

/// Run the whole scoring pipeline for one company.
pub fn run_scoring(input: &ScoringInput) -> FinScoreResult<ComputationOutput<ScoreReport>> {
    let start = Instant::now();

    if let Some(bureau) = input.bureau_score {
        if bureau < Decimal::ZERO || bureau > score::SCORE_CEILING {
            return Err(FinScoreError::InvalidInput {
                field: "bureau_score".into(),
                reason: format!("must lie in [0, 1000], got {bureau}"),
            });
        }
    }

    let sorted = statements::validate_and_sort(input.statements.clone())?;
    let ratio_table = ratios::derive_ratios(&sorted);

    let mut warnings: Vec<String> = ratio_table
        .dropped
        .iter()
        .map(|d| format!("column '{}' dropped: {}", d.name, d.reason))
        .collect();

    let (scoring_table, excluded_columns) = screen_columns(&ratio_table)?;
    for excluded in &excluded_columns {
        warnings.push(format!(
            "column '{}' excluded from scoring: {}",
            excluded.name, excluded.reason
        ));
    }

    let standardized = standardize::standardize(&scoring_table)?;
    let pca_output = pca::decompose(&standardized)?;
    let raw = aggregate::raw_score(&pca_output)?;
    let adjusted = score::scale(raw);

    let bureau_band = input
        .bureau_score
        .map(score::classify_bureau)
        .unwrap_or(BureauBand::MuitoBaixo);
    let policy_inputs = PolicyInputs::from_scores(
        adjusted,
        input.bureau_score,
        indicators_from(&ratio_table),
        false,
    );
    let policy_decision = policy::decide(&policy_inputs);

    let report = ScoreReport {
        company: input.company.clone(),
        period: sorted.iter().map(|s| s.year).collect(),
        raw_score: raw,
        adjusted_score: adjusted,
        risk_band: score::classify_finscore(adjusted),
        bureau_score: input.bureau_score,
        bureau_band,
        ratios: ratio_table,
        excluded_columns,
        pca: pca_output,
        policy: policy_decision,
    };

    let assumptions = serde_json::json!({
        "recency_weights": RECENCY_WEIGHTS.map(|w| w.to_string()),
        "score_scale": "raw in [-2, 2] mapped to [0, 1000], clamped at both ends",
        "rounding": "ratios and adjusted score rounded to 2 decimal places",
        "pca": "full-rank Jacobi eigendecomposition, largest loading forced positive",
        "variance": "population variance over the observed years",
    });

    Ok(with_metadata(
        "FinScore composite: ratio catalogue, z-score standardization, PCA, \
         recency-weighted aggregation, band classification, credit policy",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        report,
    ))
}

/// Split the ratio table into the standardizable scoring matrix and the
/// excluded remainder. At least 2 usable columns must survive.
fn screen_columns(table: &RatioTable) -> FinScoreResult<(RatioTable, Vec<ExcludedColumn>)> {
    let n = Decimal::from(table.years.len() as u64);
    let mut usable = Vec::new();
    let mut rejections: Vec<(String, DegenerateReason)> = Vec::new();

    for col in &table.columns {
        if col.values.iter().any(Option::is_none) {
            rejections.push((col.name.clone(), DegenerateReason::UndefinedCells));
            continue;
        }
        let values: Vec<Decimal> = col.values.iter().map(|v| v.unwrap_or_default()).collect();
        let mean: Decimal = values.iter().copied().sum::<Decimal>() / n;
        let variance: Decimal = values
            .iter()
            .map(|v| (*v - mean) * (*v - mean))
            .sum::<Decimal>()
            / n;
        if variance.is_zero() {
            rejections.push((col.name.clone(), DegenerateReason::ZeroVariance));
            continue;
        }
        usable.push(col.clone());
    }

    if usable.len() < 2 {
        // Too little signal left to score; surface the first offender.
        return match rejections.into_iter().next() {
            Some((column, reason)) => Err(FinScoreError::DegenerateColumn { column, reason }),
            None => Err(FinScoreError::InvalidInput {
                field: "ratios".into(),
                reason: "fewer than 2 ratio columns derived".into(),
            }),
        };
    }

    let excluded = rejections
        .into_iter()
        .map(|(name, reason)| ExcludedColumn {
            name,
            reason: reason.to_string(),
        })
        .collect();

    Ok((
        RatioTable {
            years: table.years.clone(),
            columns: usable,
            dropped: Vec::new(),
        },
        excluded,
    ))
}

/// Pull the most-recent-year indicator values the policy engine comments
/// on. Absent or undefined cells stay `None`.
fn indicators_from(table: &RatioTable) -> IndicatorSet {
    IndicatorSet {
        current_ratio: table.latest("current_ratio"),
        quick_ratio: table.latest(ratios::QUICK_RATIO),
        net_margin: table.latest("net_margin"),
        roe: table.latest("roe"),
        ebitda_margin: table.latest("ebitda_margin"),
        debt_to_assets: table.latest("debt_to_assets"),
        net_debt_to_ebitda: table.latest("net_debt_to_ebitda"),
        interest_coverage: table.latest("interest_coverage"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Decision;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    // A plausible small company with steady growth; every catalogue ratio
    // is defined and varies across the three years.
    fn three_years() -> Vec<FiscalYearStatement> {
        vec![
            FiscalYearStatement {
                year: 2023,
                current_assets: dec!(200),
                current_liabilities: dec!(100),
                inventories: dec!(50),
                cash: dec!(30),
                receivables: dec!(60),
                payables: dec!(40),
                total_assets: dec!(500),
                total_liabilities: dec!(300),
                equity: dec!(200),
                revenue: dec!(1000),
                costs: dec!(700),
                net_income: dec!(80),
                interest_expense: dec!(20),
                tax_expense: dec!(25),
                depreciation: Some(dec!(15)),
                amortization: Some(dec!(5)),
            },
            FiscalYearStatement {
                year: 2022,
                current_assets: dec!(180),
                current_liabilities: dec!(95),
                inventories: dec!(45),
                cash: dec!(25),
                receivables: dec!(55),
                payables: dec!(38),
                total_assets: dec!(470),
                total_liabilities: dec!(290),
                equity: dec!(180),
                revenue: dec!(930),
                costs: dec!(660),
                net_income: dec!(70),
                interest_expense: dec!(18),
                tax_expense: dec!(22),
                depreciation: Some(dec!(14)),
                amortization: Some(dec!(5)),
            },
            FiscalYearStatement {
                year: 2021,
                current_assets: dec!(160),
                current_liabilities: dec!(90),
                inventories: dec!(40),
                cash: dec!(20),
                receivables: dec!(50),
                payables: dec!(35),
                total_assets: dec!(430),
                total_liabilities: dec!(280),
                equity: dec!(150),
                revenue: dec!(850),
                costs: dec!(610),
                net_income: dec!(55),
                interest_expense: dec!(17),
                tax_expense: dec!(18),
                depreciation: Some(dec!(13)),
                amortization: Some(dec!(4)),
            },
        ]
    }

    fn request(statements: Vec<FiscalYearStatement>) -> ScoringInput {
        ScoringInput {
            company: "Acme Ltda".into(),
            statements,
            bureau_score: Some(dec!(720)),
        }
    }

    #[test]
    fn test_full_pipeline_completes() {
        let out = run_scoring(&request(three_years())).unwrap();
        let report = &out.result;
        assert_eq!(report.company, "Acme Ltda");
        assert_eq!(report.period, vec![2023, 2022, 2021]);
        assert!(report.adjusted_score >= dec!(0) && report.adjusted_score <= dec!(1000));
        assert_eq!(report.adjusted_score, report.adjusted_score.round_dp(2));
        assert_eq!(report.bureau_band, BureauBand::Excelente);
        assert_eq!(report.pca.components.len(), 3);
        assert!(!report.policy.motivos.is_empty());
    }

    #[test]
    fn test_weight_conservation() {
        let out = run_scoring(&request(three_years())).unwrap();
        let sum: Decimal = out.result.pca.explained_variance.iter().copied().sum();
        assert!((sum - dec!(1)).abs() < dec!(0.000001), "sum {sum}");
    }

    #[test]
    fn test_idempotent_runs() {
        let input = request(three_years());
        let a = run_scoring(&input).unwrap();
        let b = run_scoring(&input).unwrap();
        assert_eq!(a.result.raw_score, b.result.raw_score);
        assert_eq!(a.result.adjusted_score, b.result.adjusted_score);
        assert_eq!(a.result.policy, b.result.policy);
    }

    #[test]
    fn test_input_row_order_is_irrelevant() {
        let mut shuffled = three_years();
        shuffled.reverse();
        let a = run_scoring(&request(three_years())).unwrap();
        let b = run_scoring(&request(shuffled)).unwrap();
        assert_eq!(a.result.raw_score, b.result.raw_score);
        assert_eq!(a.result.period, b.result.period);
    }

    #[test]
    fn test_constant_current_ratio_excluded_but_reported() {
        // CA=200, CL=100 every year: current ratio pinned at 2.00.
        let mut statements = three_years();
        for s in &mut statements {
            s.current_assets = dec!(200);
            s.current_liabilities = dec!(100);
        }
        let out = run_scoring(&request(statements)).unwrap();
        let report = &out.result;

        let col = report.ratios.column("current_ratio").unwrap();
        assert!(col.values.iter().all(|v| *v == Some(dec!(2.00))));
        assert!(report
            .excluded_columns
            .iter()
            .any(|e| e.name == "current_ratio"));
        assert!(!report
            .pca
            .loadings
            .is_empty());
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("current_ratio")));
    }

    #[test]
    fn test_undefined_column_excluded_not_fatal() {
        let mut statements = three_years();
        statements[1].interest_expense = dec!(0);
        let out = run_scoring(&request(statements)).unwrap();
        let report = &out.result;
        assert!(report
            .excluded_columns
            .iter()
            .any(|e| e.name == "interest_coverage"));
        // The cell is still visible as undefined in the ratio table.
        let col = report.ratios.column("interest_coverage").unwrap();
        assert_eq!(col.values[1], None);
    }

    #[test]
    fn test_missing_bureau_score_degrades_gracefully() {
        let mut input = request(three_years());
        input.bureau_score = None;
        let out = run_scoring(&input).unwrap();
        let report = &out.result;
        assert_eq!(report.bureau_band, BureauBand::MuitoBaixo);
        assert_ne!(report.policy.decision, Decision::Approve);
        assert!(report
            .policy
            .covenants
            .iter()
            .any(|c| c.contains("30 dias")));
    }

    #[test]
    fn test_bureau_score_out_of_range_rejected() {
        let mut input = request(three_years());
        input.bureau_score = Some(dec!(1500));
        assert!(matches!(
            run_scoring(&input),
            Err(FinScoreError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_single_year_input_fails_fast() {
        let input = request(vec![three_years().remove(0)]);
        assert!(matches!(
            run_scoring(&input),
            Err(FinScoreError::InsufficientYears { found: 1 })
        ));
    }

    #[test]
    fn test_two_year_input_supported() {
        let mut statements = three_years();
        statements.pop();
        let out = run_scoring(&request(statements)).unwrap();
        assert_eq!(out.result.period, vec![2023, 2022]);
        assert_eq!(out.result.pca.components.len(), 2);
    }

    #[test]
    fn test_report_serializes() {
        let out = run_scoring(&request(three_years())).unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("result").is_some());
        assert!(json.get("methodology").is_some());
        let round_trip: ComputationOutput<ScoreReport> = serde_json::from_value(json).unwrap();
        assert_eq!(round_trip.result.adjusted_score, out.result.adjusted_score);
    }
}
