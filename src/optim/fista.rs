//! FISTA (Fast Iterative Shrinkage-Thresholding Algorithm).
//!
//! Accelerated proximal gradient for composite objectives `f(x) + g(x)` where
//! `f` is smooth and `g` has a cheap proximal operator.

use crate::primitives::Vector;

use super::{ConvergenceStatus, OptimizationResult};

/// Accelerated proximal gradient method (Beck & Teboulle, 2009).
///
/// The step size should not exceed `1/L`, where `L` is the Lipschitz
/// constant of `∇f`.
///
/// # Example
///
/// ```
/// use landfall::optim::{prox, FISTA};
/// use landfall::primitives::Vector;
///
/// // ½(x - 5)² + 2|x| is minimized at x = 3
/// let smooth = |x: &Vector<f32>| 0.5 * (x[0] - 5.0).powi(2);
/// let grad_smooth = |x: &Vector<f32>| Vector::from_slice(&[x[0] - 5.0]);
/// let proximal = |v: &Vector<f32>, step: f32| prox::soft_threshold(v, 2.0 * step);
///
/// let mut fista = FISTA::new(1000, 0.5, 1e-6);
/// let result = fista.minimize(smooth, grad_smooth, proximal, Vector::from_slice(&[0.0]));
/// assert!((result.solution[0] - 3.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct FISTA {
    /// Maximum number of iterations
    pub(crate) max_iter: usize,
    /// Step size (α > 0)
    pub(crate) step_size: f32,
    /// Convergence tolerance on ‖xₖ₊₁ - xₖ‖
    pub(crate) tol: f32,
}

impl FISTA {
    /// Creates a new FISTA optimizer.
    #[must_use]
    pub fn new(max_iter: usize, step_size: f32, tol: f32) -> Self {
        Self {
            max_iter,
            step_size,
            tol,
        }
    }

    /// Minimizes `smooth(x) + g(x)` where `prox(v, step)` is the proximal
    /// operator of `step * g` evaluated at `v`.
    pub fn minimize<F, G, P>(
        &mut self,
        smooth: F,
        grad_smooth: G,
        prox: P,
        x0: Vector<f32>,
    ) -> OptimizationResult
    where
        F: Fn(&Vector<f32>) -> f32,
        G: Fn(&Vector<f32>) -> Vector<f32>,
        P: Fn(&Vector<f32>, f32) -> Vector<f32>,
    {
        let start = std::time::Instant::now();

        let mut x = x0.clone();
        let mut y = x0;
        let mut t = 1.0_f32;

        for iter in 0..self.max_iter {
            let grad_y = grad_smooth(&y);
            let forward: Vec<f32> = y
                .as_slice()
                .iter()
                .zip(grad_y.as_slice())
                .map(|(yi, gi)| yi - self.step_size * gi)
                .collect();
            let x_new = prox(&Vector::from_vec(forward), self.step_size);

            if x_new.as_slice().iter().any(|v| !v.is_finite()) {
                return OptimizationResult {
                    objective_value: smooth(&x),
                    solution: x,
                    iterations: iter,
                    status: ConvergenceStatus::NumericalError,
                    gradient_norm: f32::INFINITY,
                    elapsed_time: start.elapsed(),
                };
            }

            let step_norm = x_new
                .as_slice()
                .iter()
                .zip(x.as_slice())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f32>()
                .sqrt();

            if step_norm < self.tol {
                return OptimizationResult {
                    objective_value: smooth(&x_new),
                    solution: x_new,
                    iterations: iter,
                    status: ConvergenceStatus::Converged,
                    gradient_norm: step_norm,
                    elapsed_time: start.elapsed(),
                };
            }

            // Nesterov momentum
            let t_new = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let beta = (t - 1.0) / t_new;
            let y_new: Vec<f32> = x_new
                .as_slice()
                .iter()
                .zip(x.as_slice())
                .map(|(xn, xo)| xn + beta * (xn - xo))
                .collect();

            x = x_new;
            y = Vector::from_vec(y_new);
            t = t_new;
        }

        OptimizationResult {
            objective_value: smooth(&x),
            solution: x,
            iterations: self.max_iter,
            status: ConvergenceStatus::MaxIterations,
            gradient_norm: 0.0,
            elapsed_time: start.elapsed(),
        }
    }
}
