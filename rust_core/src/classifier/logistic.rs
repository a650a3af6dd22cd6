//! Maximum-likelihood logistic regression fitted by Newton-Raphson (IRLS).
//!
//! Inputs are z-scored before fitting; constant columns are left out of the
//! fit and keep a zero coefficient so the Hessian stays invertible.

use crate::error::ClassifierUnavailable;
use crate::features::{FeatureVector, FEATURE_COUNT};
use serde::Serialize;

/// Logistic function for probability calculation
#[inline]
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Copy)]
pub struct FitOptions {
    pub max_iter: usize,
    /// Converged once the largest parameter step falls below this
    pub tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticRegression {
    /// Intercept in standardized space
    intercept: f64,
    /// Coefficients in standardized space
    coefficients: [f64; FEATURE_COUNT],
    means: [f64; FEATURE_COUNT],
    scales: [f64; FEATURE_COUNT],
    pub iterations: usize,
    pub log_likelihood: f64,
}

impl LogisticRegression {
    /// Fit on `rows` with binary `labels` (same length).
    pub fn fit(
        rows: &[FeatureVector],
        labels: &[bool],
        options: FitOptions,
    ) -> Result<Self, ClassifierUnavailable> {
        let n = rows.len().min(labels.len());
        let (means, scales) = column_moments(&rows[..n]);

        // Active columns: those with spread. Parameter 0 is the intercept.
        let active: Vec<usize> = (0..FEATURE_COUNT).filter(|j| scales[*j] > 0.0).collect();
        let dim = active.len() + 1;

        let design: Vec<Vec<f64>> = rows[..n]
            .iter()
            .map(|row| {
                let mut z = Vec::with_capacity(dim);
                z.push(1.0);
                z.extend(active.iter().map(|j| (row.0[*j] - means[*j]) / scales[*j]));
                z
            })
            .collect();

        let mut beta = vec![0.0; dim];
        let mut converged_at = None;

        for iteration in 1..=options.max_iter {
            let mut gradient = vec![0.0; dim];
            let mut hessian = vec![vec![0.0; dim]; dim];

            for (z, label) in design.iter().zip(&labels[..n]) {
                let p = logistic(dot(z, &beta));
                let y = if *label { 1.0 } else { 0.0 };
                let w = p * (1.0 - p);
                for a in 0..dim {
                    gradient[a] += z[a] * (y - p);
                    for b in a..dim {
                        hessian[a][b] += w * z[a] * z[b];
                    }
                }
            }
            for a in 0..dim {
                for b in 0..a {
                    hessian[a][b] = hessian[b][a];
                }
            }

            let step = solve(hessian, gradient).ok_or(ClassifierUnavailable::SingularHessian)?;
            let mut max_step: f64 = 0.0;
            for (b, s) in beta.iter_mut().zip(&step) {
                *b += s;
                max_step = max_step.max(s.abs());
            }

            if !beta.iter().all(|b| b.is_finite()) {
                return Err(ClassifierUnavailable::DidNotConverge {
                    iterations: iteration,
                });
            }
            if max_step < options.tolerance {
                converged_at = Some(iteration);
                break;
            }
        }

        let iterations = converged_at.ok_or(ClassifierUnavailable::DidNotConverge {
            iterations: options.max_iter,
        })?;

        let mut coefficients = [0.0; FEATURE_COUNT];
        for (k, j) in active.iter().enumerate() {
            coefficients[*j] = beta[k + 1];
        }

        let log_likelihood = design
            .iter()
            .zip(&labels[..n])
            .map(|(z, label)| {
                let p = logistic(dot(z, &beta)).clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);
                if *label {
                    p.ln()
                } else {
                    (1.0 - p).ln()
                }
            })
            .sum();

        Ok(Self {
            intercept: beta[0],
            coefficients,
            means,
            scales,
            iterations,
            log_likelihood,
        })
    }

    /// P(win) for a feature vector.
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let mut logit = self.intercept;
        for j in 0..FEATURE_COUNT {
            if self.scales[j] > 0.0 {
                logit += self.coefficients[j] * (features.0[j] - self.means[j]) / self.scales[j];
            }
        }
        logistic(logit)
    }

    /// Coefficients expressed per raw feature unit.
    pub fn raw_coefficients(&self) -> [f64; FEATURE_COUNT] {
        let mut raw = [0.0; FEATURE_COUNT];
        for j in 0..FEATURE_COUNT {
            if self.scales[j] > 0.0 {
                raw[j] = self.coefficients[j] / self.scales[j];
            }
        }
        raw
    }

    /// Intercept expressed for raw (unscaled) features.
    pub fn raw_intercept(&self) -> f64 {
        let raw = self.raw_coefficients();
        self.intercept - (0..FEATURE_COUNT).map(|j| raw[j] * self.means[j]).sum::<f64>()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Column means and population standard deviations
fn column_moments(rows: &[FeatureVector]) -> ([f64; FEATURE_COUNT], [f64; FEATURE_COUNT]) {
    let mut means = [0.0; FEATURE_COUNT];
    let mut scales = [0.0; FEATURE_COUNT];
    if rows.is_empty() {
        return (means, scales);
    }
    let n = rows.len() as f64;
    for j in 0..FEATURE_COUNT {
        means[j] = rows.iter().map(|r| r.0[j]).sum::<f64>() / n;
        let var = rows.iter().map(|r| (r.0[j] - means[j]).powi(2)).sum::<f64>() / n;
        scales[j] = if var > 1e-12 { var.sqrt() } else { 0.0 };
    }
    (means, scales)
}

/// Solve `a x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|x, y| a[*x][col].abs().total_cmp(&a[*y][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
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
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wins driven by points and turnovers, with deterministic overlap so the
    /// classes are not separable.
    fn synthetic(n: usize) -> (Vec<FeatureVector>, Vec<bool>) {
        let mut rows = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let points = 95.0 + (i % 30) as f64;
            let turnovers = 10.0 + ((i * 7) % 9) as f64;
            let home = (i % 2) as f64;
            let noise = ((i * 37) % 23) as f64 - 11.0;
            rows.push(FeatureVector([
                points,
                40.0 + ((i * 3) % 11) as f64,
                22.0 + ((i * 5) % 9) as f64,
                turnovers,
                home,
            ]));
            labels.push(points - 0.8 * turnovers + 2.0 * home + noise > 100.0);
        }
        (rows, labels)
    }

    #[test]
    fn test_logistic_midpoint_and_symmetry() {
        assert_eq!(logistic(0.0), 0.5);
        assert!((logistic(2.0) + logistic(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_learns_signal_direction() {
        let (rows, labels) = synthetic(600);
        let model = LogisticRegression::fit(&rows, &labels, FitOptions::default()).unwrap();
        let raw = model.raw_coefficients();

        assert!(raw[0] > 0.0, "points should lean WIN: {:?}", raw);
        assert!(raw[3] < 0.0, "turnovers should lean LOSS: {:?}", raw);
        assert!(model.iterations < 100);

        let correct = rows
            .iter()
            .zip(&labels)
            .filter(|(r, y)| (model.predict_proba(r) >= 0.5) == **y)
            .count();
        assert!(correct as f64 / rows.len() as f64 > 0.7);
    }

    #[test]
    fn test_raw_parameters_reproduce_probability() {
        let (rows, labels) = synthetic(300);
        let model = LogisticRegression::fit(&rows, &labels, FitOptions::default()).unwrap();
        let raw = model.raw_coefficients();
        let row = rows[17];
        let logit = model.raw_intercept() + (0..FEATURE_COUNT).map(|j| raw[j] * row.0[j]).sum::<f64>();
        assert!((logistic(logit) - model.predict_proba(&row)).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_is_ignored() {
        let (mut rows, labels) = synthetic(300);
        for row in rows.iter_mut() {
            row.0[4] = 1.0;
        }
        let model = LogisticRegression::fit(&rows, &labels, FitOptions::default()).unwrap();
        assert_eq!(model.raw_coefficients()[4], 0.0);
    }

    #[test]
    fn test_separable_data_is_surfaced() {
        let rows: Vec<FeatureVector> = (0..200)
            .map(|i| FeatureVector([90.0 + i as f64 * 0.2, 44.0, 25.0, 13.0, (i % 2) as f64]))
            .collect();
        let labels: Vec<bool> = (0..200).map(|i| i >= 100).collect();
        let result = LogisticRegression::fit(&rows, &labels, FitOptions::default());
        assert!(matches!(
            result,
            Err(ClassifierUnavailable::DidNotConverge { .. })
                | Err(ClassifierUnavailable::SingularHessian)
        ));
    }

    #[test]
    fn test_solve_small_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
        assert!(solve(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (rows, labels) = synthetic(250);
        let a = LogisticRegression::fit(&rows, &labels, FitOptions::default()).unwrap();
        let b = LogisticRegression::fit(&rows, &labels, FitOptions::default()).unwrap();
        assert_eq!(a, b);
    }
}
