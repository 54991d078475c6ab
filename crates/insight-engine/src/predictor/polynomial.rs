//! Polynomial trend regression
//!
//! Fits a polynomial over the semester index by least squares and
//! extrapolates one step. Degree follows series length; a singular normal
//! system falls back to a simple linear fit with a fixed quality of 0.4.

use super::features::linear_fit;
use super::{FitError, ModelForecast, Regressor};
use crate::models::SemesterRecord;
use std::cmp::Ordering;
use tracing::warn;

/// Fit quality assigned to the linear fallback
const LINEAR_FALLBACK_R2: f64 = 0.4;

/// Pivot magnitude below which the normal system is treated as singular
const PIVOT_EPSILON: f64 = 1e-12;

/// Polynomial least-squares forecaster over the semester index
#[derive(Debug, Clone, Default)]
pub struct PolynomialRegressor;

/// Fitted polynomial, lowest-order coefficient first
#[derive(Debug, Clone)]
struct PolyFit {
    coefficients: Vec<f64>,
}

impl PolyFit {
    fn eval(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    /// In-sample coefficient of determination; a zero-spread target counts
    /// as a perfect fit.
    fn r_squared(&self, x: &[f64], y: &[f64]) -> f64 {
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let ss_tot: f64 = y.iter().map(|yi| (yi - mean).powi(2)).sum();
        if ss_tot == 0.0 {
            return 1.0;
        }
        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(&xi, &yi)| (yi - self.eval(xi)).powi(2))
            .sum();
        (1.0 - ss_res / ss_tot).max(0.0)
    }
}

impl PolynomialRegressor {
    /// Degree policy: cubic once five points are available, else quadratic
    fn degree_for(n: usize) -> usize {
        if n >= 5 {
            3
        } else {
            2
        }
    }

    /// Solve the Vandermonde normal equations for the given degree
    fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<PolyFit, FitError> {
        let m = degree + 1;
        let mut ata = vec![vec![0.0; m]; m];
        let mut aty = vec![0.0; m];

        for (&xi, &yi) in x.iter().zip(y) {
            let mut powers = vec![1.0; 2 * degree + 1];
            for k in 1..powers.len() {
                powers[k] = powers[k - 1] * xi;
            }
            for row in 0..m {
                for col in 0..m {
                    ata[row][col] += powers[row + col];
                }
                aty[row] += powers[row] * yi;
            }
        }

        solve(ata, aty).map(|coefficients| PolyFit { coefficients })
    }
}

impl Regressor for PolynomialRegressor {
    fn name(&self) -> &'static str {
        "polynomial"
    }

    fn forecast(&self, history: &[SemesterRecord]) -> Result<ModelForecast, FitError> {
        let n = history.len();
        if n < 2 {
            return Err(FitError::InsufficientData { need: 2, have: n });
        }

        let x: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        let y: Vec<f64> = history.iter().map(|s| s.sgpa).collect();
        let next_x = (n + 1) as f64;

        match Self::fit(&x, &y, Self::degree_for(n)) {
            Ok(fit) => Ok(ModelForecast {
                value: fit.eval(next_x),
                fit_quality: fit.r_squared(&x, &y),
            }),
            Err(FitError::SingularSystem) => {
                warn!(semesters = n, "polynomial fit singular, using linear fallback");
                let (slope, intercept) = linear_fit(&x, &y);
                Ok(ModelForecast {
                    value: slope * next_x + intercept,
                    fit_quality: LINEAR_FALLBACK_R2,
                })
            }
            Err(err) => Err(err),
        }
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, FitError> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| {
                a[r1][col]
                    .abs()
                    .partial_cmp(&a[r2][col].abs())
                    .unwrap_or(Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(FitError::SingularSystem);
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[row][k] * solution[k];
        }
        solution[row] = sum / a[row][row];
    }
    Ok(solution)
}
