//! Binary logistic regression.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LandfallError, Result};
use crate::optim::{prox, Optimizer, FISTA, LBFGS};
use crate::primitives::{Matrix, Vector};
use crate::traits::{check_fit_inputs, require_binary_labels, require_two_classes, Classifier};

/// Regularization applied to the coefficients (never the intercept).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    /// Lasso: `|w|₁ / (C·n)`
    L1,
    /// Ridge: `‖w‖² / (2·C·n)`
    #[default]
    L2,
    /// Unregularized
    None,
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::L1 => "l1",
            Self::L2 => "l2",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for Penalty {
    type Err = LandfallError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "l1" => Ok(Self::L1),
            "l2" => Ok(Self::L2),
            "none" => Ok(Self::None),
            other => Err(LandfallError::invalid_hyperparameter(
                "penalty",
                other,
                "one of l1, l2, none",
            )),
        }
    }
}

/// Optimizer used to fit the coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// Quasi-Newton; smooth objectives only (L2 or no penalty)
    #[default]
    Lbfgs,
    /// Accelerated proximal gradient; handles every penalty
    GradientDescent,
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lbfgs => f.write_str("lbfgs"),
            Self::GradientDescent => f.write_str("gradient_descent"),
        }
    }
}

impl FromStr for Solver {
    type Err = LandfallError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lbfgs" => Ok(Self::Lbfgs),
            "gradient_descent" => Ok(Self::GradientDescent),
            other => Err(LandfallError::invalid_hyperparameter(
                "solver",
                other,
                "one of lbfgs, gradient_descent",
            )),
        }
    }
}

/// Logistic Regression classifier for binary classification.
///
/// Minimizes the mean log-loss plus a penalty scaled by the inverse
/// regularization strength `C`. Smaller `C` means stronger regularization.
///
/// # Example
///
/// ```
/// use landfall::classification::LogisticRegression;
/// use landfall::prelude::*;
///
/// let x = Matrix::from_vec(6, 1, vec![-3.0, -2.0, -1.0, 1.0, 2.0, 3.0])
///     .expect("6x1 matrix");
/// let y = vec![0, 0, 0, 1, 1, 1];
///
/// let mut model = LogisticRegression::new().with_c(1.0);
/// model.fit(&x, &y).expect("two classes");
/// assert_eq!(model.predict(&x).expect("fitted"), y);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Model coefficients (weights)
    coefficients: Option<Vector<f32>>,
    /// Intercept (bias) term
    intercept: f32,
    /// Inverse regularization strength
    c: f64,
    penalty: Penalty,
    solver: Solver,
    /// Maximum number of iterations
    max_iter: usize,
    /// Convergence tolerance
    tol: f32,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Creates a classifier with `C = 1`, L2 penalty and the L-BFGS solver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            c: 1.0,
            penalty: Penalty::L2,
            solver: Solver::Lbfgs,
            max_iter: 1000,
            tol: 1e-4,
        }
    }

    /// Sets the inverse regularization strength.
    #[must_use]
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Sets the penalty.
    #[must_use]
    pub fn with_penalty(mut self, penalty: Penalty) -> Self {
        self.penalty = penalty;
        self
    }

    /// Sets the solver.
    #[must_use]
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the maximum number of iterations.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Fitted coefficients, if any.
    #[must_use]
    pub fn coefficients(&self) -> Option<&Vector<f32>> {
        self.coefficients.as_ref()
    }

    /// Fitted intercept (0 before fitting).
    #[must_use]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(LandfallError::invalid_hyperparameter("C", self.c, "C > 0"));
        }
        if self.solver == Solver::Lbfgs && self.penalty == Penalty::L1 {
            return Err(LandfallError::invalid_hyperparameter(
                "penalty",
                self.penalty,
                "l2 or none with the lbfgs solver",
            ));
        }
        Ok(())
    }

    /// Sigmoid activation function: σ(z) = 1 / (1 + e^(-z))
    fn sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    /// `ln(1 + e^z)` without overflow.
    fn softplus(z: f64) -> f64 {
        if z > 0.0 {
            z + (-z).exp().ln_1p()
        } else {
            z.exp().ln_1p()
        }
    }

    fn decision_values(&self, x: &Matrix<f32>) -> Result<Vec<f32>> {
        let coef = self
            .coefficients
            .as_ref()
            .ok_or(LandfallError::NotFitted("LogisticRegression"))?;
        if x.n_cols() != coef.len() {
            return Err(LandfallError::dimension_mismatch(
                "n_features",
                coef.len(),
                x.n_cols(),
            ));
        }
        Ok((0..x.n_rows())
            .map(|row| {
                x.row_slice(row)
                    .iter()
                    .zip(coef.as_slice())
                    .fold(self.intercept, |z, (xi, wi)| z + xi * wi)
            })
            .collect())
    }

    /// Probability of class 1 for each row.
    ///
    /// # Errors
    ///
    /// Returns `NotFitted` before `fit`, or `DimensionMismatch` if the
    /// feature count differs from training.
    pub fn predict_proba(&self, x: &Matrix<f32>) -> Result<Vector<f32>> {
        let probas = self
            .decision_values(x)?
            .into_iter()
            .map(|z| Self::sigmoid(f64::from(z)) as f32)
            .collect();
        Ok(Vector::from_vec(probas))
    }
}

/// Penalized mean log-loss over `θ = [w, b]`.
struct Objective<'a> {
    x: &'a Matrix<f32>,
    y: &'a [usize],
    /// Weight of the smooth L2 term, `1 / (C·n)`; zero without L2.
    l2: f64,
}

impl Objective<'_> {
    fn margins(&self, theta: &[f32]) -> Vec<f64> {
        let d = self.x.n_cols();
        let b = f64::from(theta[d]);
        (0..self.x.n_rows())
            .map(|i| {
                self.x
                    .row_slice(i)
                    .iter()
                    .zip(&theta[..d])
                    .fold(b, |z, (xi, wi)| z + f64::from(*xi) * f64::from(*wi))
            })
            .collect()
    }

    fn value(&self, theta: &Vector<f32>) -> f32 {
        let theta = theta.as_slice();
        let d = self.x.n_cols();
        let n = self.x.n_rows() as f64;
        let loss: f64 = self
            .margins(theta)
            .iter()
            .zip(self.y)
            .map(|(&z, &label)| LogisticRegression::softplus(z) - label as f64 * z)
            .sum();
        let norm_sq: f64 = theta[..d].iter().map(|w| f64::from(*w).powi(2)).sum();
        (loss / n + 0.5 * self.l2 * norm_sq) as f32
    }

    fn gradient(&self, theta: &Vector<f32>) -> Vector<f32> {
        let theta = theta.as_slice();
        let d = self.x.n_cols();
        let n = self.x.n_rows() as f64;
        let mut grad = vec![0.0_f64; d + 1];
        for (i, (&z, &label)) in self.margins(theta).iter().zip(self.y).enumerate() {
            let residual = LogisticRegression::sigmoid(z) - label as f64;
            for (g, xi) in grad.iter_mut().zip(self.x.row_slice(i)) {
                *g += residual * f64::from(*xi);
            }
            grad[d] += residual;
        }
        let grad = grad
            .iter()
            .enumerate()
            .map(|(j, g)| {
                let reg = if j < d { self.l2 * f64::from(theta[j]) } else { 0.0 };
                (g / n + reg) as f32
            })
            .collect();
        Vector::from_vec(grad)
    }

    /// Upper bound on the Lipschitz constant of the smooth gradient.
    fn lipschitz(&self) -> f64 {
        let n = self.x.n_rows() as f64;
        let frobenius: f64 = self
            .x
            .as_slice()
            .iter()
            .map(|v| f64::from(*v).powi(2))
            .sum::<f64>()
            + n;
        frobenius / (4.0 * n) + self.l2
    }
}

impl Classifier for LogisticRegression {
    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// - `InvalidHyperparameter` for `C <= 0`, the lbfgs/l1 combination,
    ///   non-binary labels, or single-class data.
    /// - `ConvergenceFailure` if the solver produced non-finite weights.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        check_fit_inputs(x, y)?;
        self.validate()?;
        require_binary_labels(y)?;
        require_two_classes(y)?;

        let (n_samples, n_features) = x.shape();
        let reg = 1.0 / (self.c * n_samples as f64);
        let objective = Objective {
            x,
            y,
            l2: if self.penalty == Penalty::L2 { reg } else { 0.0 },
        };
        let x0 = Vector::zeros(n_features + 1);

        let result = match self.solver {
            Solver::Lbfgs => {
                let mut optimizer = LBFGS::new(self.max_iter, self.tol, 10);
                optimizer.minimize(|t| objective.value(t), |t| objective.gradient(t), x0)
            }
            Solver::GradientDescent => {
                let step = (1.0 / objective.lipschitz()) as f32;
                let l1 = if self.penalty == Penalty::L1 { reg as f32 } else { 0.0 };
                let mut optimizer = FISTA::new(self.max_iter, step, self.tol * 1e-2);
                optimizer.minimize(
                    |t| objective.value(t),
                    |t| objective.gradient(t),
                    |v, step| {
                        // The intercept is left out of the shrinkage.
                        let mut shrunk = prox::soft_threshold(v, l1 * step).into_vec();
                        shrunk[n_features] = v[n_features];
                        Vector::from_vec(shrunk)
                    },
                    x0,
                )
            }
        };

        if !result.is_usable() {
            return Err(LandfallError::ConvergenceFailure {
                iterations: result.iterations,
                message: format!("{} produced non-finite weights", self.solver),
            });
        }
        debug!(
            solver = %self.solver,
            penalty = %self.penalty,
            c = self.c,
            iterations = result.iterations,
            status = ?result.status,
            "logistic regression fitted"
        );

        let mut theta = result.solution.into_vec();
        self.intercept = theta.pop().unwrap_or(0.0);
        self.coefficients = Some(Vector::from_vec(theta));
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        Ok(self
            .decision_values(x)?
            .into_iter()
            .map(|z| usize::from(z > 0.0))
            .collect())
    }
}
