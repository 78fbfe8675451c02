//! Limited-memory BFGS (L-BFGS) optimizer.

use std::collections::VecDeque;

use crate::primitives::Vector;

use super::line_search::{LineSearch, WolfeLineSearch};
use super::{ConvergenceStatus, OptimizationResult, Optimizer};

/// Limited-memory BFGS (L-BFGS) optimizer.
///
/// Approximates the inverse Hessian from the last `m` position/gradient
/// differences and steps along the two-loop-recursion direction with a
/// Wolfe line search.
///
/// # Example
///
/// ```
/// use landfall::optim::{ConvergenceStatus, Optimizer, LBFGS};
/// use landfall::primitives::Vector;
///
/// let mut optimizer = LBFGS::new(200, 1e-4, 10);
///
/// let f = |x: &Vector<f32>| (1.0 - x[0]).powi(2) + 10.0 * (x[1] - x[0]).powi(2);
/// let grad = |x: &Vector<f32>| {
///     Vector::from_slice(&[
///         -2.0 * (1.0 - x[0]) - 20.0 * (x[1] - x[0]),
///         20.0 * (x[1] - x[0]),
///     ])
/// };
///
/// let result = optimizer.minimize(f, grad, Vector::from_slice(&[0.0, 0.0]));
/// assert_eq!(result.status, ConvergenceStatus::Converged);
/// ```
#[derive(Debug, Clone)]
pub struct LBFGS {
    /// Maximum number of iterations
    pub(crate) max_iter: usize,
    /// Convergence tolerance (gradient norm)
    pub(crate) tol: f32,
    /// History size (number of correction pairs to store)
    pub(crate) m: usize,
    line_search: WolfeLineSearch,
    /// Correction pairs `(s_k, y_k)`, oldest first
    pub(crate) history: VecDeque<(Vector<f32>, Vector<f32>)>,
}

impl LBFGS {
    /// Creates a new L-BFGS optimizer.
    ///
    /// * `max_iter` - Maximum number of iterations
    /// * `tol` - Convergence tolerance for gradient norm
    /// * `m` - History size (typical: 5-20)
    #[must_use]
    pub fn new(max_iter: usize, tol: f32, m: usize) -> Self {
        Self {
            max_iter,
            tol,
            m,
            line_search: WolfeLineSearch::default(),
            history: VecDeque::with_capacity(m),
        }
    }

    /// Two-loop recursion: returns `-H⁻¹ · grad` under the current history.
    fn compute_direction(&self, grad: &Vector<f32>) -> Vector<f32> {
        let mut q: Vec<f32> = grad.as_slice().iter().map(|g| -g).collect();
        let Some((s_last, y_last)) = self.history.back() else {
            return Vector::from_vec(q);
        };

        let mut alphas = Vec::with_capacity(self.history.len());
        for (s, y) in self.history.iter().rev() {
            let rho = 1.0 / y.dot(s);
            let alpha = rho * dot(s.as_slice(), &q);
            axpy(&mut q, -alpha, y.as_slice());
            alphas.push((rho, alpha));
        }

        let gamma = s_last.dot(y_last) / y_last.dot(y_last);
        q.iter_mut().for_each(|v| *v *= gamma);

        for ((s, y), (rho, alpha)) in self.history.iter().zip(alphas.into_iter().rev()) {
            let beta = rho * dot(y.as_slice(), &q);
            axpy(&mut q, alpha - beta, s.as_slice());
        }

        Vector::from_vec(q)
    }

    fn finish(
        solution: Vector<f32>,
        objective_value: f32,
        iterations: usize,
        status: ConvergenceStatus,
        gradient_norm: f32,
        start: std::time::Instant,
    ) -> OptimizationResult {
        OptimizationResult {
            solution,
            objective_value,
            iterations,
            status,
            gradient_norm,
            elapsed_time: start.elapsed(),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `y += a * x`
fn axpy(y: &mut [f32], a: f32, x: &[f32]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += a * xi;
    }
}

impl Optimizer for LBFGS {
    fn minimize<F, G>(&mut self, objective: F, gradient: G, x0: Vector<f32>) -> OptimizationResult
    where
        F: Fn(&Vector<f32>) -> f32,
        G: Fn(&Vector<f32>) -> Vector<f32>,
    {
        let start = std::time::Instant::now();
        self.history.clear();

        let mut x = x0;
        let mut fx = objective(&x);
        let mut grad = gradient(&x);
        let mut grad_norm = grad.norm();

        if !fx.is_finite() {
            return Self::finish(x, fx, 0, ConvergenceStatus::NumericalError, grad_norm, start);
        }

        for iter in 0..self.max_iter {
            if grad_norm < self.tol {
                return Self::finish(x, fx, iter, ConvergenceStatus::Converged, grad_norm, start);
            }

            let d = self.compute_direction(&grad);
            let alpha = self.line_search.search(&objective, &gradient, &x, &d);
            if alpha < 1e-12 {
                return Self::finish(x, fx, iter, ConvergenceStatus::Stalled, grad_norm, start);
            }

            let mut step = d.into_vec();
            step.iter_mut().for_each(|v| *v *= alpha);
            let mut x_new = x.as_slice().to_vec();
            axpy(&mut x_new, 1.0, &step);
            let x_new = Vector::from_vec(x_new);

            let fx_new = objective(&x_new);
            if !fx_new.is_finite() {
                return Self::finish(x, fx, iter, ConvergenceStatus::NumericalError, grad_norm, start);
            }
            let grad_new = gradient(&x_new);

            let mut y_k = grad_new.as_slice().to_vec();
            axpy(&mut y_k, -1.0, grad.as_slice());

            // Curvature condition y^T s > 0 keeps the approximation positive definite.
            if dot(&y_k, &step) > 1e-10 {
                if self.history.len() >= self.m {
                    self.history.pop_front();
                }
                self.history
                    .push_back((Vector::from_vec(step), Vector::from_vec(y_k)));
            }

            x = x_new;
            fx = fx_new;
            grad = grad_new;
            grad_norm = grad.norm();
        }

        let status = if grad_norm < self.tol {
            ConvergenceStatus::Converged
        } else {
            ConvergenceStatus::MaxIterations
        };
        Self::finish(x, fx, self.max_iter, status, grad_norm, start)
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lbfgs_quadratic() {
        let mut optimizer = LBFGS::new(100, 1e-5, 10);

        let f = |x: &Vector<f32>| (x[0] - 5.0).powi(2);
        let grad = |x: &Vector<f32>| Vector::from_slice(&[2.0 * (x[0] - 5.0)]);

        let result = optimizer.minimize(f, grad, Vector::from_slice(&[0.0]));

        assert_eq!(result.status, ConvergenceStatus::Converged);
        assert!((result.solution[0] - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_lbfgs_already_converged() {
        let mut optimizer = LBFGS::new(100, 1e-5, 10);
        let f = |x: &Vector<f32>| x[0] * x[0];
        let grad = |x: &Vector<f32>| Vector::from_slice(&[2.0 * x[0]]);

        let result = optimizer.minimize(f, grad, Vector::from_slice(&[0.0]));

        assert_eq!(result.status, ConvergenceStatus::Converged);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_lbfgs_history_capped() {
        let mut optimizer = LBFGS::new(100, 1e-4, 2);

        let f = |x: &Vector<f32>| {
            (x[0] - 1.0).powi(2) + 2.0 * (x[1] - 2.0).powi(2) + 3.0 * (x[2] - 3.0).powi(2)
        };
        let grad = |x: &Vector<f32>| {
            Vector::from_slice(&[
                2.0 * (x[0] - 1.0),
                4.0 * (x[1] - 2.0),
                6.0 * (x[2] - 3.0),
            ])
        };

        let result = optimizer.minimize(f, grad, Vector::from_slice(&[10.0, -5.0, 8.0]));

        assert!(result.is_usable());
        assert!((result.solution[0] - 1.0).abs() < 1e-3);
        assert!((result.solution[2] - 3.0).abs() < 1e-3);
        assert!(optimizer.history.len() <= 2);
    }

    #[test]
    fn test_lbfgs_nonfinite_start() {
        let mut optimizer = LBFGS::new(10, 1e-5, 5);
        let f = |_x: &Vector<f32>| f32::NAN;
        let grad = |_x: &Vector<f32>| Vector::from_slice(&[1.0]);

        let result = optimizer.minimize(f, grad, Vector::from_slice(&[1.0]));
        assert_eq!(result.status, ConvergenceStatus::NumericalError);
    }

    #[test]
    fn test_compute_direction_no_history() {
        let optimizer = LBFGS::new(100, 1e-5, 5);
        let d = optimizer.compute_direction(&Vector::from_slice(&[3.0, -4.0]));
        assert!((d[0] + 3.0).abs() < 1e-6);
        assert!((d[1] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut optimizer = LBFGS::new(100, 1e-5, 5);
        let f = |x: &Vector<f32>| x[0] * x[0] + 3.0 * x[1] * x[1];
        let grad = |x: &Vector<f32>| Vector::from_slice(&[2.0 * x[0], 6.0 * x[1]]);

        let _ = optimizer.minimize(f, grad, Vector::from_slice(&[5.0, 1.0]));
        optimizer.reset();
        assert!(optimizer.history.is_empty());
    }
}
