//! Core traits for estimators and transformers.
//!
//! [`Classifier`] is the uniform fit/predict capability the grid search is
//! written against; every classifier family implements it.

use crate::error::{LandfallError, Result};
use crate::metrics::accuracy;
use crate::primitives::Matrix;

/// Supervised classifier over `f32` features and `usize` class labels.
///
/// # Examples
///
/// ```
/// use landfall::classification::KNearestNeighbors;
/// use landfall::prelude::*;
///
/// let x = Matrix::from_vec(4, 1, vec![0.0, 0.1, 5.0, 5.1]).unwrap();
/// let y = vec![0, 0, 1, 1];
///
/// let mut model = KNearestNeighbors::new(1);
/// model.fit(&x, &y).unwrap();
/// assert_eq!(model.score(&x, &y).unwrap(), 1.0);
/// ```
pub trait Classifier: Send + Sync {
    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is unusable for this model or the
    /// configured hyperparameters are invalid.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()>;

    /// Predicts class labels for each row of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or the feature count
    /// differs from training.
    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>>;

    /// Fraction of rows whose predicted label equals `y`.
    ///
    /// # Errors
    ///
    /// Returns an error if prediction fails, or `y` is empty or the wrong
    /// length.
    fn score(&self, x: &Matrix<f32>, y: &[usize]) -> Result<f32> {
        if y.is_empty() {
            return Err(LandfallError::empty_partition(
                "cannot score against zero samples",
            ));
        }
        if x.n_rows() != y.len() {
            return Err(LandfallError::dimension_mismatch(
                "n_samples",
                x.n_rows(),
                y.len(),
            ));
        }
        let predictions = self.predict(x)?;
        Ok(accuracy(&predictions, y))
    }
}

/// Trait for data transformers (scalers, encoders, etc.).
pub trait Transformer {
    /// Fits the transformer to data.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()>;

    /// Transforms data using fitted parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if transformer is not fitted.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>>;

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    fn fit_transform(&mut self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Validates the common `fit` preconditions shared by every classifier.
pub(crate) fn check_fit_inputs(x: &Matrix<f32>, y: &[usize]) -> Result<()> {
    let n_samples = x.n_rows();
    if n_samples == 0 {
        return Err(LandfallError::empty_partition(
            "cannot fit with zero samples",
        ));
    }
    if n_samples != y.len() {
        return Err(LandfallError::dimension_mismatch(
            "n_samples",
            n_samples,
            y.len(),
        ));
    }
    Ok(())
}

/// Rejects single-class training data for models that need both classes.
pub(crate) fn require_two_classes(y: &[usize]) -> Result<()> {
    let first = y.first().copied();
    if y.iter().any(|&label| Some(label) != first) {
        Ok(())
    } else {
        Err(LandfallError::invalid_hyperparameter(
            "y",
            format!("{} sample(s) of a single class", y.len()),
            "at least two distinct classes",
        ))
    }
}

/// Validates that labels are binary (0 or 1).
pub(crate) fn require_binary_labels(y: &[usize]) -> Result<()> {
    match y.iter().find(|&&label| label > 1) {
        Some(label) => Err(LandfallError::invalid_hyperparameter(
            "y",
            label,
            "binary labels (0 or 1)",
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Predicts the label of the first training sample for every row.
    struct ConstantClassifier {
        label: Option<usize>,
    }

    impl Classifier for ConstantClassifier {
        fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
            check_fit_inputs(x, y)?;
            self.label = Some(y[0]);
            Ok(())
        }

        fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
            let label = self.label.ok_or(LandfallError::NotFitted("ConstantClassifier"))?;
            Ok(vec![label; x.n_rows()])
        }
    }

    struct MockTransformer {
        fitted: bool,
    }

    impl Transformer for MockTransformer {
        fn fit(&mut self, _x: &Matrix<f32>) -> Result<()> {
            self.fitted = true;
            Ok(())
        }

        fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
            if !self.fitted {
                return Err(LandfallError::NotFitted("MockTransformer"));
            }
            Ok(x.clone())
        }
    }

    #[test]
    fn test_default_score_is_accuracy() {
        let x = Matrix::<f32>::zeros(4, 2);
        let mut model = ConstantClassifier { label: None };
        model.fit(&x, &[1, 0, 1, 1]).expect("fit should succeed");
        let score = model.score(&x, &[1, 0, 1, 1]).expect("score should succeed");
        assert!((score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_score_rejects_empty_labels() {
        let model = ConstantClassifier { label: Some(0) };
        let x = Matrix::<f32>::zeros(0, 2);
        assert!(matches!(
            model.score(&x, &[]),
            Err(LandfallError::EmptyPartition { .. })
        ));
    }

    #[test]
    fn test_score_rejects_length_mismatch() {
        let model = ConstantClassifier { label: Some(0) };
        let x = Matrix::<f32>::zeros(3, 2);
        assert!(model.score(&x, &[0, 1]).is_err());
    }

    #[test]
    fn test_predict_before_fit() {
        let model = ConstantClassifier { label: None };
        assert!(matches!(
            model.predict(&Matrix::zeros(1, 1)),
            Err(LandfallError::NotFitted(_))
        ));
    }

    #[test]
    fn test_transformer_fit_transform_default() {
        let mut transformer = MockTransformer { fitted: false };
        let x = Matrix::from_vec(2, 2, vec![2.0, 4.0, 6.0, 8.0]).expect("matrix");
        let out = transformer.fit_transform(&x).expect("should succeed");
        assert_eq!(out, x);
        assert!(transformer.fitted);
    }

    #[test]
    fn test_check_fit_inputs() {
        assert!(check_fit_inputs(&Matrix::zeros(0, 2), &[]).is_err());
        assert!(check_fit_inputs(&Matrix::zeros(2, 2), &[0]).is_err());
        assert!(check_fit_inputs(&Matrix::zeros(2, 2), &[0, 1]).is_ok());
    }

    #[test]
    fn test_require_two_classes() {
        assert!(require_two_classes(&[0, 0, 0]).is_err());
        assert!(require_two_classes(&[]).is_err());
        assert!(require_two_classes(&[0, 1, 0]).is_ok());
    }

    #[test]
    fn test_require_binary_labels() {
        assert!(require_binary_labels(&[0, 1, 1]).is_ok());
        assert!(require_binary_labels(&[0, 2]).is_err());
    }
}
