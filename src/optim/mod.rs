//! Batch optimizers used to fit linear classifiers.
//!
//! # Available Optimizers
//!
//! - [`LBFGS`] - Limited-memory BFGS for smooth objectives
//! - [`FISTA`] - Accelerated proximal gradient for objectives with an L1 term
//!
//! ## Line Search Strategies
//! - [`WolfeLineSearch`] - Armijo + curvature conditions (for quasi-Newton methods)
//!
//! # Example
//!
//! ```
//! use landfall::optim::{ConvergenceStatus, Optimizer, LBFGS};
//! use landfall::primitives::Vector;
//!
//! let mut optimizer = LBFGS::new(100, 1e-5, 10);
//!
//! let objective = |x: &Vector<f32>| (x[0] - 5.0).powi(2) + (x[1] - 3.0).powi(2);
//! let gradient = |x: &Vector<f32>| {
//!     Vector::from_slice(&[2.0 * (x[0] - 5.0), 2.0 * (x[1] - 3.0)])
//! };
//!
//! let result = optimizer.minimize(objective, gradient, Vector::from_slice(&[0.0, 0.0]));
//!
//! assert_eq!(result.status, ConvergenceStatus::Converged);
//! assert!((result.solution[0] - 5.0).abs() < 1e-3);
//! assert!((result.solution[1] - 3.0).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};

use crate::primitives::Vector;

mod fista;
mod lbfgs;
mod line_search;

pub use fista::FISTA;
pub use lbfgs::LBFGS;
pub use line_search::{LineSearch, WolfeLineSearch};

/// Result of an optimization procedure.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final solution (optimized parameters)
    pub solution: Vector<f32>,
    /// Final objective function value
    pub objective_value: f32,
    /// Number of iterations performed
    pub iterations: usize,
    /// Convergence status
    pub status: ConvergenceStatus,
    /// Final gradient norm (step norm for proximal methods)
    pub gradient_norm: f32,
    /// Total elapsed time
    pub elapsed_time: std::time::Duration,
}

impl OptimizationResult {
    /// True when the solution can be used as a model (converged, or stopped
    /// at a finite point).
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.status != ConvergenceStatus::NumericalError
            && self.solution.as_slice().iter().all(|v| v.is_finite())
    }
}

/// Convergence status of an optimization procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Converged (gradient norm < tolerance)
    Converged,
    /// Reached maximum iteration limit
    MaxIterations,
    /// Progress stalled (step size too small)
    Stalled,
    /// Numerical error (NaN, Inf, etc.)
    NumericalError,
}

/// Proximal operators for non-smooth regularization.
///
/// ```text
/// prox_g(v) = argmin_x { g(x) + ½‖x - v‖² }
/// ```
pub mod prox {
    use crate::primitives::Vector;

    /// Soft-thresholding operator, the prox of `lambda * ‖·‖₁`.
    ///
    /// # Example
    ///
    /// ```
    /// use landfall::optim::prox::soft_threshold;
    /// use landfall::primitives::Vector;
    ///
    /// let v = Vector::from_slice(&[2.0, -1.5, 0.5]);
    /// let result = soft_threshold(&v, 1.0);
    ///
    /// assert!((result[0] - 1.0).abs() < 1e-6);
    /// assert!((result[1] + 0.5).abs() < 1e-6);
    /// assert!(result[2].abs() < 1e-6);
    /// ```
    #[must_use]
    pub fn soft_threshold(v: &Vector<f32>, lambda: f32) -> Vector<f32> {
        let data = v
            .as_slice()
            .iter()
            .map(|&x| x.signum() * (x.abs() - lambda).max(0.0))
            .collect();
        Vector::from_vec(data)
    }
}

/// Batch optimizer over smooth objectives.
///
/// Implementors minimize `objective` from `x0` given its gradient and report
/// how the run ended through [`OptimizationResult::status`].
pub trait Optimizer {
    /// Minimizes the objective starting at `x0`.
    fn minimize<F, G>(&mut self, objective: F, gradient: G, x0: Vector<f32>) -> OptimizationResult
    where
        F: Fn(&Vector<f32>) -> f32,
        G: Fn(&Vector<f32>) -> Vector<f32>;

    /// Clears any state carried over from a previous run.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_threshold_zeroes_small_values() {
        let v = Vector::from_slice(&[0.3, -0.3, 0.0]);
        let out = prox::soft_threshold(&v, 0.5);
        assert!(out.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_soft_threshold_zero_lambda_is_identity() {
        let v = Vector::from_slice(&[1.5, -2.0]);
        let out = prox::soft_threshold(&v, 0.0);
        assert_eq!(out.as_slice(), v.as_slice());
    }

    #[test]
    fn test_result_usable() {
        let ok = OptimizationResult {
            solution: Vector::from_slice(&[1.0]),
            objective_value: 0.0,
            iterations: 3,
            status: ConvergenceStatus::MaxIterations,
            gradient_norm: 0.1,
            elapsed_time: std::time::Duration::ZERO,
        };
        assert!(ok.is_usable());

        let nan = OptimizationResult {
            solution: Vector::from_slice(&[f32::NAN]),
            ..ok.clone()
        };
        assert!(!nan.is_usable());

        let failed = OptimizationResult {
            status: ConvergenceStatus::NumericalError,
            ..ok
        };
        assert!(!failed.is_usable());
    }
}
