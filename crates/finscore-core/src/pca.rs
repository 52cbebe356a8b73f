//! Dimensionality Reducer: full-rank PCA over the standardized ratio
//! columns.
//!
//! Eigendecomposition of the population covariance matrix via cyclic
//! Jacobi rotations, Decimal end to end, since the rotations need only
//! add/mul/div and a Newton square root. Components are ordered by
//! descending explained variance, and each eigenvector's sign is fixed by
//! forcing its largest-magnitude loading positive, so repeated runs on
//! identical input produce identical output.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::standardize::{sqrt_decimal, StandardizedTable};
use crate::{FinScoreError, FinScoreResult};

/// Rotations below this off-diagonal magnitude are skipped.
const SKIP_EPS: Decimal = dec!(0.000000000000001);

/// Sweep until the sum of absolute off-diagonal entries falls below this.
const CONVERGENCE_EPS: Decimal = dec!(0.000000000001);

const MAX_SWEEPS: usize = 50;

/// A ratio's weight within one principal component, for the diagnostic
/// top-contributors table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub ratio: String,
    pub loading: Decimal,
}

/// Full-rank PCA decomposition of a standardized ratio table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaOutput {
    /// "PC1", "PC2", … in descending explained-variance order.
    pub component_names: Vec<String>,
    /// One row per fiscal year (most recent first), one column per
    /// component: the orthogonal projections of the standardized rows.
    pub components: Vec<Vec<Decimal>>,
    /// Explained-variance share per component; non-increasing, sums to 1.
    pub explained_variance: Vec<Decimal>,
    /// Per component, the weight of each original ratio column.
    pub loadings: Vec<Vec<Decimal>>,
    /// Per component, the 3 ratios with the largest absolute loading.
    /// Reporting only; never feeds back into the score.
    pub top_contributors: Vec<Vec<Contributor>>,
}

/// Decompose the standardized table into ranked orthogonal components.
///
/// Keeps as many components as input columns; with fewer years than
/// ratios the surplus eigenvalues come out (numerically) zero rather
/// than failing.
pub fn decompose(table: &StandardizedTable) -> FinScoreResult<PcaOutput> {
    let n = table.rows.len();
    let m = table.columns.len();
    if m == 0 || n == 0 {
        return Err(FinScoreError::InvalidInput {
            field: "standardized_table".into(),
            reason: "empty table".into(),
        });
    }

    let covariance = covariance_matrix(&table.rows, n, m);
    let (mut eigenvalues, eigenvectors) = jacobi_eigen(&covariance);

    // Rotation noise can leave tiny negative eigenvalues on
    // rank-deficient input.
    for ev in &mut eigenvalues {
        if *ev < Decimal::ZERO {
            *ev = Decimal::ZERO;
        }
    }

    // Descending eigenvalue, original index as deterministic tie-break.
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| eigenvalues[b].cmp(&eigenvalues[a]).then(a.cmp(&b)));

    let total: Decimal = eigenvalues.iter().copied().sum();
    if total.is_zero() {
        return Err(FinScoreError::InvalidInput {
            field: "standardized_table".into(),
            reason: "total variance is zero".into(),
        });
    }

    let mut explained_variance = Vec::with_capacity(m);
    let mut loadings = Vec::with_capacity(m);
    for &j in &order {
        explained_variance.push(eigenvalues[j] / total);
        let mut column: Vec<Decimal> = (0..m).map(|k| eigenvectors[k][j]).collect();
        fix_sign(&mut column);
        loadings.push(column);
    }

    let components = table
        .rows
        .iter()
        .map(|row| {
            loadings
                .iter()
                .map(|vector| dot(row, vector))
                .collect::<Vec<Decimal>>()
        })
        .collect();

    let top_contributors = loadings
        .iter()
        .map(|vector| top_three(&table.columns, vector))
        .collect();

    Ok(PcaOutput {
        component_names: (1..=m).map(|i| format!("PC{i}")).collect(),
        components,
        explained_variance,
        loadings,
        top_contributors,
    })
}

fn covariance_matrix(rows: &[Vec<Decimal>], n: usize, m: usize) -> Vec<Vec<Decimal>> {
    let n_dec = Decimal::from(n as u64);
    let mut cov = vec![vec![Decimal::ZERO; m]; m];
    for i in 0..m {
        for j in i..m {
            // Columns are already centered by the standardizer.
            let sum: Decimal = rows.iter().map(|r| r[i] * r[j]).sum();
            let value = sum / n_dec;
            cov[i][j] = value;
            cov[j][i] = value;
        }
    }
    cov
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns (eigenvalues, eigenvector matrix V) where column j of V is the
/// eigenvector for eigenvalue j.
fn jacobi_eigen(matrix: &[Vec<Decimal>]) -> (Vec<Decimal>, Vec<Vec<Decimal>>) {
    let m = matrix.len();
    let mut a: Vec<Vec<Decimal>> = matrix.to_vec();
    let mut v = identity(m);
    let two = dec!(2);

    for _ in 0..MAX_SWEEPS {
        let mut off = Decimal::ZERO;
        for p in 0..m {
            for q in (p + 1)..m {
                off += a[p][q].abs();
            }
        }
        if off < CONVERGENCE_EPS {
            break;
        }

        for p in 0..m {
            for q in (p + 1)..m {
                if a[p][q].abs() < SKIP_EPS {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (two * a[p][q]);
                // tan of the rotation angle; series form for very large
                // theta keeps theta^2 inside Decimal range.
                let t = if theta.abs() > dec!(10000000000) {
                    Decimal::ONE / (two * theta)
                } else {
                    let root = sqrt_decimal(theta * theta + Decimal::ONE);
                    if theta < Decimal::ZERO {
                        -Decimal::ONE / (theta.abs() + root)
                    } else {
                        Decimal::ONE / (theta.abs() + root)
                    }
                };
                let c = Decimal::ONE / sqrt_decimal(t * t + Decimal::ONE);
                let s = t * c;

                for k in 0..m {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..m {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for k in 0..m {
                    let vkp = v[k][p];
                    let vkq = v[k][q];
                    v[k][p] = c * vkp - s * vkq;
                    v[k][q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..m).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

fn identity(m: usize) -> Vec<Vec<Decimal>> {
    let mut v = vec![vec![Decimal::ZERO; m]; m];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = Decimal::ONE;
    }
    v
}

/// Force the largest-magnitude loading positive (first index on ties).
fn fix_sign(vector: &mut [Decimal]) {
    let mut pivot = 0;
    for (k, value) in vector.iter().enumerate() {
        if value.abs() > vector[pivot].abs() {
            pivot = k;
        }
    }
    if vector[pivot] < Decimal::ZERO {
        for value in vector.iter_mut() {
            *value = -*value;
        }
    }
}

fn dot(a: &[Decimal], b: &[Decimal]) -> Decimal {
    a.iter().zip(b).map(|(x, y)| *x * *y).sum()
}

fn top_three(names: &[String], vector: &[Decimal]) -> Vec<Contributor> {
    let mut order: Vec<usize> = (0..vector.len()).collect();
    order.sort_by(|&a, &b| vector[b].abs().cmp(&vector[a].abs()).then(a.cmp(&b)));
    order
        .into_iter()
        .take(3)
        .map(|k| Contributor {
            ratio: names[k].clone(),
            loading: vector[k],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn table(columns: Vec<&str>, rows: Vec<Vec<Decimal>>) -> StandardizedTable {
        StandardizedTable {
            years: (0..rows.len()).map(|i| 2023 - i as i32).collect(),
            columns: columns.into_iter().map(String::from).collect(),
            rows,
        }
    }

    fn sample() -> StandardizedTable {
        table(
            vec!["a", "b", "c"],
            vec![
                vec![dec!(1), dec!(0.5), dec!(-2)],
                vec![dec!(-0.5), dec!(1), dec!(1)],
                vec![dec!(-0.5), dec!(-1.5), dec!(1)],
            ],
        )
    }

    #[test]
    fn test_weights_sum_to_one_and_non_increasing() {
        let out = decompose(&sample()).unwrap();
        let sum: Decimal = out.explained_variance.iter().copied().sum();
        assert!((sum - dec!(1)).abs() < dec!(0.000001), "sum {sum}");
        for pair in out.explained_variance.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn test_perfectly_correlated_columns_collapse_to_one_component() {
        let t = table(
            vec!["a", "b"],
            vec![
                vec![dec!(1), dec!(2)],
                vec![dec!(0), dec!(0)],
                vec![dec!(-1), dec!(-2)],
            ],
        );
        let out = decompose(&t).unwrap();
        assert!((out.explained_variance[0] - dec!(1)).abs() < dec!(0.000001));
        assert!(out.explained_variance[1].abs() < dec!(0.000001));
        // Eigenvector (1,2)/sqrt(5); first-year projection = sqrt(5).
        assert!((out.components[0][0] - dec!(2.2360679)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_sign_convention_largest_loading_positive() {
        let out = decompose(&sample()).unwrap();
        for vector in &out.loadings {
            let max = vector
                .iter()
                .copied()
                .max_by(|a, b| a.abs().cmp(&b.abs()))
                .unwrap();
            assert!(max > Decimal::ZERO, "largest loading not positive: {max}");
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let a = decompose(&sample()).unwrap();
        let b = decompose(&sample()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_more_columns_than_years_does_not_crash() {
        let t = table(
            vec!["a", "b", "c"],
            vec![
                vec![dec!(1), dec!(-1), dec!(0.5)],
                vec![dec!(-1), dec!(1), dec!(-0.5)],
            ],
        );
        let out = decompose(&t).unwrap();
        assert_eq!(out.explained_variance.len(), 3);
        assert_eq!(out.components.len(), 2);
        assert_eq!(out.components[0].len(), 3);
        // Two centered rows span at most one direction.
        assert!(out.explained_variance[1].abs() < dec!(0.000001));
    }

    #[test]
    fn test_top_contributors_shape_and_order() {
        let out = decompose(&sample()).unwrap();
        assert_eq!(out.top_contributors.len(), 3);
        for contributors in &out.top_contributors {
            assert_eq!(contributors.len(), 3);
            for pair in contributors.windows(2) {
                assert!(pair[0].loading.abs() >= pair[1].loading.abs());
            }
        }
    }

    #[test]
    fn test_component_count_matches_ratio_count() {
        let out = decompose(&sample()).unwrap();
        assert_eq!(out.component_names, vec!["PC1", "PC2", "PC3"]);
        assert_eq!(out.loadings.len(), 3);
        assert_eq!(out.loadings[0].len(), 3);
    }

    #[test]
    fn test_empty_table_rejected() {
        let t = table(vec![], vec![]);
        assert!(decompose(&t).is_err());
    }
}
