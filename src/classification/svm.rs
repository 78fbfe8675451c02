//! Kernel support vector classifier.
//!
//! The dual problem
//!
//! ```text
//! min ½ αᵀQα − eᵀα   s.t.  0 ≤ αᵢ ≤ C,  yᵀα = 0,   Qᵢⱼ = yᵢ yⱼ K(xᵢ, xⱼ)
//! ```
//!
//! is solved by sequential minimal optimization, updating the maximal
//! violating pair at every step (Keerthi et al., 2001). The working set and
//! the kernel matrix are kept in `f64`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LandfallError, Result};
use crate::primitives::Matrix;
use crate::traits::{check_fit_inputs, require_binary_labels, require_two_classes, Classifier};

/// Smallest curvature used in a pair update.
const TAU: f64 = 1e-12;

/// Kernel function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// `x·y`
    Linear,
    /// `(γ·x·y + coef0)^degree`
    Poly,
    /// `exp(−γ‖x−y‖²)`
    #[default]
    Rbf,
    /// `tanh(γ·x·y + coef0)`
    Sigmoid,
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linear => "linear",
            Self::Poly => "poly",
            Self::Rbf => "rbf",
            Self::Sigmoid => "sigmoid",
        };
        f.write_str(name)
    }
}

impl FromStr for Kernel {
    type Err = LandfallError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Self::Linear),
            "poly" => Ok(Self::Poly),
            "rbf" => Ok(Self::Rbf),
            "sigmoid" => Ok(Self::Sigmoid),
            other => Err(LandfallError::invalid_hyperparameter(
                "kernel",
                other,
                "one of linear, poly, rbf, sigmoid",
            )),
        }
    }
}

/// Kernel with its parameters bound.
#[derive(Debug, Clone, Copy)]
struct KernelFn {
    kind: Kernel,
    gamma: f64,
    degree: i32,
    coef0: f64,
}

impl KernelFn {
    fn eval(&self, a: &[f32], b: &[f32]) -> f64 {
        match self.kind {
            Kernel::Linear => dot(a, b),
            Kernel::Poly => (self.gamma * dot(a, b) + self.coef0).powi(self.degree),
            Kernel::Rbf => {
                let dist_sq: f64 = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
                    .sum();
                (-self.gamma * dist_sq).exp()
            }
            Kernel::Sigmoid => (self.gamma * dot(a, b) + self.coef0).tanh(),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

/// Support vector classifier (C-SVM) for binary labels.
///
/// Label 1 is the positive class. Prediction is 1 where the decision
/// function is strictly positive.
///
/// # Example
///
/// ```
/// use landfall::classification::{Kernel, SVC};
/// use landfall::prelude::*;
///
/// let x = Matrix::from_vec(4, 2, vec![0.0, 0.0, 0.0, 1.0, 3.0, 3.0, 3.0, 4.0])
///     .expect("4x2 matrix");
/// let y = vec![0, 0, 1, 1];
///
/// let mut svc = SVC::new().with_kernel(Kernel::Linear).with_c(10.0);
/// svc.fit(&x, &y).expect("two classes");
/// assert_eq!(svc.predict(&x).expect("fitted"), y);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVC {
    kernel: Kernel,
    c: f64,
    gamma: f64,
    degree: i32,
    coef0: f64,
    max_iter: usize,
    tol: f64,
    /// Support vectors (rows with αᵢ > 0)
    support_vectors: Option<Matrix<f32>>,
    /// αᵢ·yᵢ for each support vector
    dual_coef: Vec<f64>,
    /// Offset subtracted from the kernel expansion
    rho: f64,
}

impl Default for SVC {
    fn default() -> Self {
        Self::new()
    }
}

impl SVC {
    /// RBF kernel with `C = 1`, `gamma = 1`, degree 3 and `coef0 = 0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kernel: Kernel::Rbf,
            c: 1.0,
            gamma: 1.0,
            degree: 3,
            coef0: 0.0,
            max_iter: 100_000,
            tol: 1e-3,
            support_vectors: None,
            dual_coef: Vec::new(),
            rho: 0.0,
        }
    }

    /// Sets the kernel.
    #[must_use]
    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Sets the box constraint `C`.
    #[must_use]
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Sets the kernel coefficient `gamma`.
    #[must_use]
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the polynomial degree.
    #[must_use]
    pub fn with_degree(mut self, degree: i32) -> Self {
        self.degree = degree;
        self
    }

    /// Sets the independent term of the poly and sigmoid kernels.
    #[must_use]
    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.coef0 = coef0;
        self
    }

    /// Caps the number of SMO pair updates.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the tolerance on the maximal KKT violation.
    #[must_use]
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Number of support vectors (0 before fitting).
    #[must_use]
    pub fn n_support(&self) -> usize {
        self.dual_coef.len()
    }

    fn kernel_fn(&self) -> KernelFn {
        KernelFn {
            kind: self.kernel,
            gamma: self.gamma,
            degree: self.degree,
            coef0: self.coef0,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(LandfallError::invalid_hyperparameter("C", self.c, "C > 0"));
        }
        if !(self.gamma > 0.0 && self.gamma.is_finite()) {
            return Err(LandfallError::invalid_hyperparameter(
                "gamma",
                self.gamma,
                "gamma > 0",
            ));
        }
        if self.degree < 1 {
            return Err(LandfallError::invalid_hyperparameter(
                "degree",
                self.degree,
                "degree >= 1",
            ));
        }
        Ok(())
    }

    /// Signed distance-like score for each row; positive means label 1.
    ///
    /// # Errors
    ///
    /// Returns `NotFitted` before `fit`, or `DimensionMismatch` if the
    /// feature count differs from training.
    pub fn decision_function(&self, x: &Matrix<f32>) -> Result<Vec<f64>> {
        let sv = self
            .support_vectors
            .as_ref()
            .ok_or(LandfallError::NotFitted("SVC"))?;
        if x.n_cols() != sv.n_cols() {
            return Err(LandfallError::dimension_mismatch(
                "n_features",
                sv.n_cols(),
                x.n_cols(),
            ));
        }
        let kernel = self.kernel_fn();
        Ok((0..x.n_rows())
            .map(|i| {
                let row = x.row_slice(i);
                self.dual_coef
                    .iter()
                    .enumerate()
                    .map(|(s, coef)| coef * kernel.eval(sv.row_slice(s), row))
                    .sum::<f64>()
                    - self.rho
            })
            .collect())
    }
}

/// Dual solver state.
struct Smo<'a> {
    q: &'a [f64],
    n: usize,
    y: &'a [f64],
    c: f64,
    alpha: Vec<f64>,
    /// Gradient of the dual objective, `Qα − e`
    grad: Vec<f64>,
}

impl Smo<'_> {
    fn q(&self, i: usize, j: usize) -> f64 {
        self.q[i * self.n + j]
    }

    fn in_up(&self, t: usize) -> bool {
        (self.y[t] > 0.0 && self.alpha[t] < self.c) || (self.y[t] < 0.0 && self.alpha[t] > 0.0)
    }

    fn in_low(&self, t: usize) -> bool {
        (self.y[t] > 0.0 && self.alpha[t] > 0.0) || (self.y[t] < 0.0 && self.alpha[t] < self.c)
    }

    /// Maximal violating pair, or `None` once the violation is below `tol`.
    fn select_pair(&self, tol: f64) -> Option<(usize, usize)> {
        let mut up = (f64::NEG_INFINITY, None);
        let mut low = (f64::INFINITY, None);
        for t in 0..self.n {
            let score = -self.y[t] * self.grad[t];
            if self.in_up(t) && score > up.0 {
                up = (score, Some(t));
            }
            if self.in_low(t) && score < low.0 {
                low = (score, Some(t));
            }
        }
        match (up, low) {
            ((m, Some(i)), (big_m, Some(j))) if m - big_m >= tol => Some((i, j)),
            _ => None,
        }
    }

    /// Analytic two-variable update clipped to the box.
    fn update_pair(&mut self, i: usize, j: usize) {
        let c = self.c;
        let (old_i, old_j) = (self.alpha[i], self.alpha[j]);
        let (mut ai, mut aj) = (old_i, old_j);
        let qij = self.q(i, j);
        let diag = self.q(i, i) + self.q(j, j);

        if self.y[i] != self.y[j] {
            let quad = (diag + 2.0 * qij).max(TAU);
            let delta = (-self.grad[i] - self.grad[j]) / quad;
            let diff = ai - aj;
            ai += delta;
            aj += delta;
            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > 0.0 {
                if ai > c {
                    ai = c;
                    aj = c - diff;
                }
            } else if aj > c {
                aj = c;
                ai = c + diff;
            }
        } else {
            let quad = (diag - 2.0 * qij).max(TAU);
            let delta = (self.grad[i] - self.grad[j]) / quad;
            let sum = ai + aj;
            ai -= delta;
            aj += delta;
            if sum > c {
                if ai > c {
                    ai = c;
                    aj = sum - c;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c {
                if aj > c {
                    aj = c;
                    ai = sum - c;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
        }

        self.alpha[i] = ai;
        self.alpha[j] = aj;
        let (di, dj) = (ai - old_i, aj - old_j);
        for t in 0..self.n {
            self.grad[t] += self.q(t, i) * di + self.q(t, j) * dj;
        }
    }

    /// Offset of the decision function: the mean of `yG` over free
    /// multipliers, or the midpoint of the feasible interval if none are free.
    fn rho(&self) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut free_sum = 0.0;
        let mut n_free = 0usize;
        for t in 0..self.n {
            let yg = self.y[t] * self.grad[t];
            if self.alpha[t] >= self.c {
                if self.y[t] < 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else if self.alpha[t] <= 0.0 {
                if self.y[t] > 0.0 {
                    upper = upper.min(yg);
                } else {
                    lower = lower.max(yg);
                }
            } else {
                n_free += 1;
                free_sum += yg;
            }
        }
        if n_free > 0 {
            free_sum / n_free as f64
        } else {
            (upper + lower) / 2.0
        }
    }
}

impl Classifier for SVC {
    /// Solves the dual problem and keeps the support vectors.
    ///
    /// # Errors
    ///
    /// - `InvalidHyperparameter` for `C <= 0`, `gamma <= 0`, non-binary
    ///   labels, or single-class data.
    /// - `ConvergenceFailure` if a kernel value is not finite.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        check_fit_inputs(x, y)?;
        self.validate()?;
        require_binary_labels(y)?;
        require_two_classes(y)?;

        let n = x.n_rows();
        let signs: Vec<f64> = y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();
        let kernel = self.kernel_fn();

        let mut q = vec![0.0_f64; n * n];
        for i in 0..n {
            for j in i..n {
                let k = kernel.eval(x.row_slice(i), x.row_slice(j));
                if !k.is_finite() {
                    return Err(LandfallError::ConvergenceFailure {
                        iterations: 0,
                        message: format!(
                            "{} kernel is not finite between samples {i} and {j}",
                            self.kernel
                        ),
                    });
                }
                let qij = signs[i] * signs[j] * k;
                q[i * n + j] = qij;
                q[j * n + i] = qij;
            }
        }

        let mut smo = Smo {
            q: &q,
            n,
            y: &signs,
            c: self.c,
            alpha: vec![0.0; n],
            grad: vec![-1.0; n],
        };

        let mut iterations = 0;
        while iterations < self.max_iter {
            let Some((i, j)) = smo.select_pair(self.tol) else {
                break;
            };
            smo.update_pair(i, j);
            iterations += 1;
        }
        if iterations == self.max_iter {
            warn!(
                max_iter = self.max_iter,
                kernel = %self.kernel,
                "SMO stopped at the iteration cap before reaching tolerance"
            );
        }

        self.rho = smo.rho();
        if !self.rho.is_finite() {
            return Err(LandfallError::ConvergenceFailure {
                iterations,
                message: "decision offset is not finite".to_string(),
            });
        }

        let support: Vec<usize> = (0..n).filter(|&t| smo.alpha[t] > 0.0).collect();
        self.dual_coef = support.iter().map(|&t| smo.alpha[t] * signs[t]).collect();
        self.support_vectors = Some(x.select_rows(&support));
        debug!(
            kernel = %self.kernel,
            c = self.c,
            gamma = self.gamma,
            iterations,
            n_support = support.len(),
            "SVC fitted"
        );
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|f| usize::from(f > 0.0))
            .collect())
    }
}
