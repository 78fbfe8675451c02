//! Labeled launch-outcome datasets.
//!
//! A [`Dataset`] pairs a numeric feature table with binary landing labels
//! (`0` = did not land, `1` = landed). Validation happens once, at
//! construction, so every downstream stage can assume a well-formed table.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{LandfallError, Result};
use crate::primitives::Matrix;

/// Validated feature matrix plus binary labels.
///
/// # Examples
///
/// ```
/// use landfall::data::Dataset;
///
/// let ds = Dataset::from_rows(
///     &[vec![1.0, 0.0], vec![2.0, 1.0], vec![3.0, 0.0]],
///     vec![0, 1, 1],
/// )
/// .expect("rows are rectangular and labels are binary");
/// assert_eq!(ds.n_samples(), 3);
/// assert_eq!(ds.n_features(), 2);
/// assert_eq!(ds.class_counts(), [1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Matrix<f32>,
    labels: Vec<usize>,
    feature_names: Option<Vec<String>>,
}

impl Dataset {
    /// Builds a dataset from a feature matrix and labels.
    ///
    /// # Errors
    ///
    /// Returns `DataShape` if the table is empty, row and label counts
    /// differ, any feature is NaN or infinite, or a label is not 0 or 1.
    pub fn new(features: Matrix<f32>, labels: Vec<usize>) -> Result<Self> {
        let (n_rows, n_cols) = features.shape();
        if n_rows == 0 || n_cols == 0 {
            return Err(LandfallError::data_shape(format!(
                "dataset is empty ({n_rows} rows x {n_cols} features)"
            )));
        }
        if n_rows != labels.len() {
            return Err(LandfallError::data_shape(format!(
                "{n_rows} feature rows but {} labels",
                labels.len()
            )));
        }
        if let Some(pos) = features.as_slice().iter().position(|v| !v.is_finite()) {
            return Err(LandfallError::data_shape(format!(
                "non-numeric value at row {}, feature {}",
                pos / n_cols,
                pos % n_cols
            )));
        }
        if let Some((row, label)) = labels.iter().enumerate().find(|(_, &l)| l > 1) {
            return Err(LandfallError::data_shape(format!(
                "label {label} at row {row} is not binary (expected 0 or 1)"
            )));
        }

        Ok(Self {
            features,
            labels,
            feature_names: None,
        })
    }

    /// Builds a dataset from row vectors.
    ///
    /// # Errors
    ///
    /// Returns `DataShape` for ragged rows, plus everything [`Dataset::new`]
    /// rejects.
    pub fn from_rows(rows: &[Vec<f32>], labels: Vec<usize>) -> Result<Self> {
        let features = Matrix::from_rows(rows).map_err(LandfallError::data_shape)?;
        Self::new(features, labels)
    }

    /// Attaches column names.
    ///
    /// # Errors
    ///
    /// Returns `DataShape` if the name count differs from the feature count.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.n_features() {
            return Err(LandfallError::data_shape(format!(
                "{} feature names for {} features",
                names.len(),
                self.n_features()
            )));
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    /// Seeded two-class dataset for demos and tests.
    ///
    /// Labels alternate so both classes are balanced (up to one sample),
    /// then rows are shuffled. The first half of the features (at least one)
    /// carries a class-dependent shift on top of uniform noise in `[-1, 1)`;
    /// the rest is pure noise.
    ///
    /// # Errors
    ///
    /// Returns `DataShape` if `n_samples < 2` or `n_features == 0`.
    pub fn synthetic_binary(n_samples: usize, n_features: usize, seed: u64) -> Result<Self> {
        if n_samples < 2 || n_features == 0 {
            return Err(LandfallError::data_shape(format!(
                "synthetic dataset needs at least 2 samples and 1 feature, got {n_samples}x{n_features}"
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut labels: Vec<usize> = (0..n_samples).map(|i| i % 2).collect();
        labels.shuffle(&mut rng);

        let informative = (n_features / 2).max(1);
        let mut data = Vec::with_capacity(n_samples * n_features);
        for &label in &labels {
            let shift = if label == 1 { 0.8 } else { -0.8 };
            for j in 0..n_features {
                let noise: f32 = rng.gen_range(-1.0..1.0);
                data.push(if j < informative { shift + noise } else { noise });
            }
        }

        let features = Matrix::from_vec(n_samples, n_features, data)
            .map_err(LandfallError::data_shape)?;
        Self::new(features, labels)
    }

    /// Feature matrix (`n_samples x n_features`).
    #[must_use]
    pub fn features(&self) -> &Matrix<f32> {
        &self.features
    }

    /// Labels, one per row.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Column names, when attached.
    #[must_use]
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.n_rows()
    }

    /// Number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.features.n_cols()
    }

    /// `[did not land, landed]` counts.
    #[must_use]
    pub fn class_counts(&self) -> [usize; 2] {
        let landed = self.labels.iter().filter(|&&l| l == 1).count();
        [self.labels.len() - landed, landed]
    }
}
