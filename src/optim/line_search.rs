//! Line search along a descent direction.

use crate::primitives::Vector;

/// Trait for line search strategies.
///
/// Given a function f, current point x, and search direction d, finds a step
/// size α > 0 such that x + α*d satisfies the strategy's decrease conditions.
pub trait LineSearch {
    /// Finds a suitable step size along the search direction.
    ///
    /// * `f` - Objective function f: ℝⁿ → ℝ
    /// * `grad` - Gradient function ∇f: ℝⁿ → ℝⁿ
    /// * `x` - Current point
    /// * `d` - Search direction (∇f(x)·d < 0)
    fn search<F, G>(&self, f: &F, grad: &G, x: &Vector<f32>, d: &Vector<f32>) -> f32
    where
        F: Fn(&Vector<f32>) -> f32,
        G: Fn(&Vector<f32>) -> Vector<f32>;
}

/// Wolfe line search with Armijo and curvature conditions.
///
/// ```text
/// Armijo:    f(x + α*d) ≤ f(x) + c₁*α*∇f(x)ᵀd
/// Curvature: |∇f(x + α*d)ᵀd| ≤ c₂*|∇f(x)ᵀd|
/// ```
///
/// Brackets α by bisection once an upper bound is known and doubles it
/// otherwise.
///
/// # Example
///
/// ```
/// use landfall::optim::{LineSearch, WolfeLineSearch};
/// use landfall::primitives::Vector;
///
/// let line_search = WolfeLineSearch::new(1e-4, 0.9, 50);
///
/// let f = |x: &Vector<f32>| x[0] * x[0];
/// let grad = |x: &Vector<f32>| Vector::from_slice(&[2.0 * x[0]]);
///
/// let x = Vector::from_slice(&[1.0]);
/// let d = Vector::from_slice(&[-2.0]);
///
/// let alpha = line_search.search(&f, &grad, &x, &d);
/// assert!(alpha > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct WolfeLineSearch {
    /// Armijo constant (c₁ ∈ (0, c₂))
    pub(crate) c1: f32,
    /// Curvature constant (c₂ ∈ (c₁, 1))
    pub(crate) c2: f32,
    /// Maximum line search iterations
    pub(crate) max_iter: usize,
}

impl WolfeLineSearch {
    /// Creates a new Wolfe line search.
    ///
    /// # Panics
    ///
    /// Panics if the constants do not satisfy `0 < c1 < c2 < 1`.
    #[must_use]
    pub fn new(c1: f32, c2: f32, max_iter: usize) -> Self {
        assert!(
            c1 < c2 && c1 > 0.0 && c2 < 1.0,
            "Wolfe conditions require 0 < c1 < c2 < 1"
        );
        Self { c1, c2, max_iter }
    }
}

impl Default for WolfeLineSearch {
    /// c1=1e-4, c2=0.9, `max_iter=50`
    fn default() -> Self {
        Self::new(1e-4, 0.9, 50)
    }
}

fn advance(x: &Vector<f32>, d: &Vector<f32>, alpha: f32) -> Vector<f32> {
    let data = x
        .as_slice()
        .iter()
        .zip(d.as_slice())
        .map(|(xi, di)| xi + alpha * di)
        .collect();
    Vector::from_vec(data)
}

impl LineSearch for WolfeLineSearch {
    fn search<F, G>(&self, f: &F, grad: &G, x: &Vector<f32>, d: &Vector<f32>) -> f32
    where
        F: Fn(&Vector<f32>) -> f32,
        G: Fn(&Vector<f32>) -> Vector<f32>,
    {
        let fx = f(x);
        let slope = grad(x).dot(d);

        let mut alpha = 1.0;
        let mut alpha_lo = 0.0;
        let mut alpha_hi = f32::INFINITY;

        for _ in 0..self.max_iter {
            let x_new = advance(x, d, alpha);
            let fx_new = f(&x_new);

            // Armijo failure (or a non-finite value): step too long.
            if !fx_new.is_finite() || fx_new > fx + self.c1 * alpha * slope {
                alpha_hi = alpha;
                alpha = (alpha_lo + alpha_hi) / 2.0;
                continue;
            }

            let slope_new = grad(&x_new).dot(d);
            if slope_new.abs() <= self.c2 * slope.abs() {
                return alpha;
            }

            if slope_new > 0.0 {
                alpha_hi = alpha;
            } else {
                alpha_lo = alpha;
            }

            alpha = if alpha_hi.is_finite() {
                (alpha_lo + alpha_hi) / 2.0
            } else {
                alpha * 2.0
            };
        }

        alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wolfe_quadratic() {
        let ls = WolfeLineSearch::default();
        let f = |x: &Vector<f32>| x[0] * x[0];
        let grad = |x: &Vector<f32>| Vector::from_slice(&[2.0 * x[0]]);

        let x = Vector::from_slice(&[1.0]);
        let d = Vector::from_slice(&[-2.0]);

        let alpha = ls.search(&f, &grad, &x, &d);
        assert!(alpha > 0.0);
        assert!(f(&advance(&x, &d, alpha)) < f(&x));
    }

    #[test]
    fn test_wolfe_rejects_nonfinite_step() {
        let ls = WolfeLineSearch::default();
        let f = |x: &Vector<f32>| if x[0] < 0.0 { f32::INFINITY } else { (x[0] - 0.5).powi(2) };
        let grad = |x: &Vector<f32>| Vector::from_slice(&[2.0 * (x[0] - 0.5)]);

        let x = Vector::from_slice(&[1.0]);
        let d = Vector::from_slice(&[-4.0]);

        let alpha = ls.search(&f, &grad, &x, &d);
        assert!(f(&advance(&x, &d, alpha)).is_finite());
    }

    #[test]
    #[should_panic(expected = "Wolfe conditions")]
    fn test_wolfe_invalid_constants() {
        let _ = WolfeLineSearch::new(0.9, 0.1, 10);
    }
}
