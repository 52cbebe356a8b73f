//! Temporal Aggregator: collapses per-year component scores into one raw
//! score using fixed recency weights.
//!
//! Row 0 of the component table is the most recent fiscal year: the
//! statements module sorts by explicit year label, so the weight
//! assignment never rests on the order the caller happened to supply.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::pca::PcaOutput;
use crate::statements::{MAX_YEARS, MIN_YEARS};
use crate::{FinScoreError, FinScoreResult};

/// Fixed per-year recency weights: [most recent, second, third].
pub const RECENCY_WEIGHTS: [Decimal; MAX_YEARS] = [dec!(0.60), dec!(0.25), dec!(0.15)];

/// Weighted sum of year scores, where a year score is the dot product of
/// that year's component values with the explained-variance weights.
///
/// With 2 years the weight list truncates to `[0.60, 0.25]` and is
/// renormalized to sum 1, keeping the raw score on the same nominal
/// [-2, 2] scale as the 3-year case.
pub fn raw_score(pca: &PcaOutput) -> FinScoreResult<Decimal> {
    let n = pca.components.len();
    if n < MIN_YEARS {
        return Err(FinScoreError::InsufficientYears { found: n });
    }
    if n > MAX_YEARS {
        return Err(FinScoreError::InvalidInput {
            field: "components".into(),
            reason: format!("at most {MAX_YEARS} year rows supported, got {n}"),
        });
    }

    let weights = &RECENCY_WEIGHTS[..n];
    let total: Decimal = weights.iter().copied().sum();

    let mut score = Decimal::ZERO;
    for (row, weight) in pca.components.iter().zip(weights) {
        let year_score: Decimal = row
            .iter()
            .zip(&pca.explained_variance)
            .map(|(c, w)| *c * *w)
            .sum();
        score += (*weight / total) * year_score;
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn pca(components: Vec<Vec<Decimal>>, explained: Vec<Decimal>) -> PcaOutput {
        let m = explained.len();
        PcaOutput {
            component_names: (1..=m).map(|i| format!("PC{i}")).collect(),
            components,
            explained_variance: explained,
            loadings: vec![vec![Decimal::ONE; m]; m],
            top_contributors: vec![],
        }
    }

    #[test]
    fn test_three_year_weighting() {
        // Year scores 1, 0, 0: only the most recent year contributes.
        let p = pca(
            vec![vec![dec!(1)], vec![dec!(0)], vec![dec!(0)]],
            vec![dec!(1)],
        );
        assert_eq!(raw_score(&p).unwrap(), dec!(0.60));
    }

    #[test]
    fn test_oldest_year_gets_smallest_weight() {
        let recent_heavy = pca(
            vec![vec![dec!(1)], vec![dec!(0)], vec![dec!(0)]],
            vec![dec!(1)],
        );
        let old_heavy = pca(
            vec![vec![dec!(0)], vec![dec!(0)], vec![dec!(1)]],
            vec![dec!(1)],
        );
        assert!(raw_score(&recent_heavy).unwrap() > raw_score(&old_heavy).unwrap());
        assert_eq!(raw_score(&old_heavy).unwrap(), dec!(0.15));
    }

    #[test]
    fn test_two_year_weights_renormalize_to_one() {
        // Both year scores 1: the truncated weights must sum back to 1.
        let p = pca(vec![vec![dec!(1)], vec![dec!(1)]], vec![dec!(1)]);
        let score = raw_score(&p).unwrap();
        assert!((score - dec!(1)).abs() < dec!(0.0000000001), "{score}");
    }

    #[test]
    fn test_year_score_is_variance_weighted_dot_product() {
        let p = pca(
            vec![
                vec![dec!(2), dec!(-1)],
                vec![dec!(0), dec!(0)],
                vec![dec!(0), dec!(0)],
            ],
            vec![dec!(0.75), dec!(0.25)],
        );
        // Year score = 2*0.75 + (-1)*0.25 = 1.25; weighted by 0.6.
        assert_eq!(raw_score(&p).unwrap(), dec!(0.75));
    }

    #[test]
    fn test_single_year_rejected() {
        let p = pca(vec![vec![dec!(1)]], vec![dec!(1)]);
        assert!(matches!(
            raw_score(&p),
            Err(FinScoreError::InsufficientYears { found: 1 })
        ));
    }

    #[test]
    fn test_four_years_rejected() {
        let p = pca(vec![vec![dec!(1)]; 4], vec![dec!(1)]);
        assert!(matches!(raw_score(&p), Err(FinScoreError::InvalidInput { .. })));
    }
}
