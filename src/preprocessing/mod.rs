//! Feature standardization.
//!
//! # Example
//!
//! ```
//! use landfall::prelude::*;
//! use landfall::preprocessing::StandardScaler;
//!
//! let data = Matrix::from_vec(4, 2, vec![
//!     1.0, 100.0,
//!     2.0, 200.0,
//!     3.0, 300.0,
//!     4.0, 400.0,
//! ]).expect("valid matrix dimensions");
//!
//! let mut scaler = StandardScaler::new();
//! let scaled = scaler.fit_transform(&data).expect("fit_transform should succeed");
//!
//! // Both columns are now identical: same z-scores on different scales
//! assert!((scaled.get(0, 0) - scaled.get(0, 1)).abs() < 1e-5);
//! ```

use crate::error::{LandfallError, Result};
use crate::primitives::Matrix;
use crate::traits::Transformer;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Standard deviations below this are treated as zero variance.
pub const VARIANCE_EPSILON: f64 = 1e-10;

/// Standardizes features by removing the mean and scaling to unit variance.
///
/// The standard score of a sample x is `z = (x - mean) / std`, with the
/// population standard deviation (divide by n). A column whose std is below
/// [`VARIANCE_EPSILON`] gets a std of exactly 1, so it is only centered and
/// never produces NaN. Such columns are listed by
/// [`floored_features`](Self::floored_features).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f32>>,
    /// Standard deviation of each feature, after flooring.
    std: Option<Vec<f32>>,
    /// Columns whose variance was floored.
    floored: Vec<usize>,
}

impl StandardScaler {
    /// Creates an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-feature means, once fitted.
    #[must_use]
    pub fn mean(&self) -> Option<&[f32]> {
        self.mean.as_deref()
    }

    /// Per-feature standard deviations (after flooring), once fitted.
    #[must_use]
    pub fn std(&self) -> Option<&[f32]> {
        self.std.as_deref()
    }

    /// Indices of zero-variance columns that received the floor of 1.
    #[must_use]
    pub fn floored_features(&self) -> &[usize] {
        &self.floored
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    fn fitted_params(&self, x: &Matrix<f32>) -> Result<(&[f32], &[f32])> {
        let (Some(mean), Some(std)) = (self.mean.as_deref(), self.std.as_deref()) else {
            return Err(LandfallError::NotFitted("StandardScaler"));
        };
        if x.n_cols() != mean.len() {
            return Err(LandfallError::dimension_mismatch(
                "n_features",
                mean.len(),
                x.n_cols(),
            ));
        }
        Ok((mean, std))
    }

    fn map_columns(x: &Matrix<f32>, f: impl Fn(usize, f32) -> f32) -> Result<Matrix<f32>> {
        let (n_samples, n_features) = x.shape();
        let data = x
            .as_slice()
            .iter()
            .enumerate()
            .map(|(idx, &v)| f(idx % n_features, v))
            .collect();
        Matrix::from_vec(n_samples, n_features, data)
            .map_err(|e| LandfallError::data_shape(e.to_string()))
    }

    /// Transforms standardized data back to the original scale.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaler is not fitted or dimensions mismatch.
    pub fn inverse_transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let (mean, std) = self.fitted_params(x)?;
        Self::map_columns(x, |j, v| v * std[j] + mean[j])
    }
}

impl Transformer for StandardScaler {
    /// Computes the mean and standard deviation of each feature.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples == 0 {
            return Err(LandfallError::dimension_mismatch("n_samples", 1, 0));
        }

        // Accumulate in f64; f32 sums drift on wide-range columns.
        let n = n_samples as f64;
        let mut mean = vec![0.0_f64; n_features];
        for i in 0..n_samples {
            for (m, &v) in mean.iter_mut().zip(x.row_slice(i)) {
                *m += f64::from(v);
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut sum_sq = vec![0.0_f64; n_features];
        for i in 0..n_samples {
            for ((s, &m), &v) in sum_sq.iter_mut().zip(&mean).zip(x.row_slice(i)) {
                let diff = f64::from(v) - m;
                *s += diff * diff;
            }
        }

        let mut floored = Vec::new();
        let std: Vec<f32> = sum_sq
            .iter()
            .enumerate()
            .map(|(j, &s)| {
                let sd = (s / n).sqrt();
                if sd < VARIANCE_EPSILON {
                    floored.push(j);
                    1.0
                } else {
                    sd as f32
                }
            })
            .collect();

        if !floored.is_empty() {
            debug!(features = ?floored, "zero-variance features floored to unit scale");
        }

        self.mean = Some(mean.into_iter().map(|m| m as f32).collect());
        self.std = Some(std);
        self.floored = floored;
        Ok(())
    }

    /// Standardizes the data using fitted mean and std.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let (mean, std) = self.fitted_params(x)?;
        Self::map_columns(x, |j, v| (v - mean[j]) / std[j])
    }
}

#[cfg(test)]
mod tests;
