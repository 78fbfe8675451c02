//! Classification metrics for evaluating classifier performance.
//!
//! The positive class is label `1` ("landed"); label `0` is "did not land".

use crate::primitives::Matrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// Returns `0.0` for empty input. Extra elements in the longer slice are
/// ignored; callers validate lengths first.
///
/// # Examples
///
/// ```
/// use landfall::metrics::accuracy;
///
/// let y_true = vec![0, 1, 1, 0, 1, 1];
/// let y_pred = vec![0, 1, 0, 0, 0, 1];
/// let acc = accuracy(&y_pred, &y_true);
/// assert!((acc - 0.666_667).abs() < 1e-3);
/// ```
#[must_use]
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f32 {
    debug_assert_eq!(y_pred.len(), y_true.len(), "Slices must have same length");
    if y_true.is_empty() {
        return 0.0;
    }

    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();

    correct as f32 / y_true.len() as f32
}

/// Compute the confusion matrix.
///
/// Entry `[i, j]` counts samples whose true label is `i` and predicted label
/// is `j`. The matrix is square and sized by the largest label seen.
///
/// # Examples
///
/// ```
/// use landfall::metrics::confusion_matrix;
///
/// let y_true = vec![0, 0, 1, 1];
/// let y_pred = vec![0, 1, 1, 1];
/// let cm = confusion_matrix(&y_pred, &y_true);
/// assert_eq!(cm.shape(), (2, 2));
/// assert_eq!(cm.get(0, 1), 1);
/// ```
#[must_use]
pub fn confusion_matrix(y_pred: &[usize], y_true: &[usize]) -> Matrix<usize> {
    let n_classes = y_true
        .iter()
        .chain(y_pred.iter())
        .max()
        .map_or(0, |&m| m + 1);

    let mut cm = Matrix::filled(n_classes, n_classes, 0usize);
    for (&true_label, &pred_label) in y_true.iter().zip(y_pred.iter()) {
        cm.set(true_label, pred_label, cm.get(true_label, pred_label) + 1);
    }
    cm
}

/// Binary confusion tallies with label `1` as the positive class.
///
/// # Examples
///
/// ```
/// use landfall::metrics::ConfusionCounts;
///
/// let counts = ConfusionCounts::from_predictions(&[1, 1, 0, 0], &[1, 0, 0, 1]);
/// assert_eq!(counts.true_positive, 1);
/// assert_eq!(counts.false_positive, 1);
/// assert_eq!(counts.true_negative, 1);
/// assert_eq!(counts.false_negative, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    /// Predicted landed, did land
    pub true_positive: usize,
    /// Predicted did not land, did not land
    pub true_negative: usize,
    /// Predicted landed, did not land
    pub false_positive: usize,
    /// Predicted did not land, did land
    pub false_negative: usize,
}

impl ConfusionCounts {
    /// Tallies predictions against ground truth.
    #[must_use]
    pub fn from_predictions(y_pred: &[usize], y_true: &[usize]) -> Self {
        let mut counts = Self::default();
        for (&pred, &truth) in y_pred.iter().zip(y_true.iter()) {
            match (pred == 1, truth == 1) {
                (true, true) => counts.true_positive += 1,
                (false, false) => counts.true_negative += 1,
                (true, false) => counts.false_positive += 1,
                (false, true) => counts.false_negative += 1,
            }
        }
        counts
    }

    /// Total number of samples tallied.
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    /// Fraction of correct predictions (`0.0` when empty).
    #[must_use]
    pub fn accuracy(&self) -> f32 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// TP / (TP + FP), `0.0` when nothing was predicted positive.
    #[must_use]
    pub fn precision(&self) -> f32 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// TP / (TP + FN), `0.0` when there are no positives.
    #[must_use]
    pub fn recall(&self) -> f32 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Harmonic mean of precision and recall.
    #[must_use]
    pub fn f1(&self) -> f32 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

impl fmt::Display for ConfusionCounts {
    /// Renders the 2x2 table with true labels as rows.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>14} {:>6}", "", "did not land", "land")?;
        writeln!(
            f,
            "{:>14} {:>14} {:>6}",
            "did not land", self.true_negative, self.false_positive
        )?;
        write!(
            f,
            "{:>14} {:>14} {:>6}",
            "landed", self.false_negative, self.true_positive
        )
    }
}
