//! Held-out evaluation and family ranking.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ClassifierFamily;
use crate::error::{LandfallError, Result};
use crate::metrics::{accuracy, ConfusionCounts};
use crate::model_selection::{CandidateScore, ParamSet, SearchStatus};
use crate::primitives::Matrix;
use crate::traits::Classifier;

/// Test-partition performance of one fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Fraction of test labels predicted correctly
    pub accuracy: f32,
    /// Confusion tallies, label 1 positive
    pub confusion: ConfusionCounts,
}

/// Scores `model` once against the held-out test partition.
///
/// # Errors
///
/// Returns `EmptyPartition` for an empty test set, `DimensionMismatch` if
/// rows and labels disagree, or the model's prediction error.
///
/// # Example
///
/// ```
/// use landfall::classification::KNearestNeighbors;
/// use landfall::prelude::*;
/// use landfall::selection::evaluate;
///
/// let x = Matrix::from_vec(4, 1, vec![0.0, 0.2, 4.0, 4.2]).expect("4x1 matrix");
/// let mut model = KNearestNeighbors::new(1);
/// model.fit(&x, &[0, 0, 1, 1]).expect("fit");
///
/// let eval = evaluate(&model, &x, &[0, 1, 1, 1]).expect("evaluate");
/// assert_eq!(eval.accuracy, 0.75);
/// assert_eq!(eval.confusion.false_negative, 1);
/// ```
pub fn evaluate(model: &dyn Classifier, x_test: &Matrix<f32>, y_test: &[usize]) -> Result<Evaluation> {
    if y_test.is_empty() {
        return Err(LandfallError::empty_partition("test partition is empty"));
    }
    if x_test.n_rows() != y_test.len() {
        return Err(LandfallError::dimension_mismatch(
            "n_samples",
            x_test.n_rows(),
            y_test.len(),
        ));
    }
    let predictions = model.predict(x_test)?;
    Ok(Evaluation {
        accuracy: accuracy(&predictions, y_test),
        confusion: ConfusionCounts::from_predictions(&predictions, y_test),
    })
}

/// Outcome of one family's search plus its held-out evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The family searched
    pub family: ClassifierFamily,
    /// Winning grid point
    pub best_params: ParamSet,
    /// Mean cross-validation accuracy of the winner
    pub cv_score: f32,
    /// Standard deviation of the winner's fold accuracies
    pub cv_std: f32,
    /// Folds used
    pub n_folds: usize,
    /// Held-out accuracy of the winner refit on the whole training set
    pub test_accuracy: f32,
    /// Held-out confusion tallies
    pub confusion: ConfusionCounts,
    /// Whether a time budget cut the search short
    pub status: SearchStatus,
    /// Every evaluated grid point, in grid order
    pub candidates: Vec<CandidateScore>,
}

/// A family that produced no fittable grid point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableFamily {
    /// The family
    pub family: ClassifierFamily,
    /// Last failure reported by the search
    pub reason: String,
}

/// Families ranked by held-out accuracy.
///
/// Ranking is descending by test accuracy. Equal accuracies go to the family
/// declared first, whatever order the results were supplied in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<SearchResult>,
    unavailable: Vec<UnavailableFamily>,
}

impl Leaderboard {
    /// Ranks `results` by test accuracy, ties broken by family order.
    #[must_use]
    pub fn from_results(
        mut results: Vec<SearchResult>,
        unavailable: Vec<UnavailableFamily>,
    ) -> Self {
        results.sort_by(|a, b| {
            b.test_accuracy
                .total_cmp(&a.test_accuracy)
                .then_with(|| a.family.cmp(&b.family))
        });
        Self {
            entries: results,
            unavailable,
        }
    }

    /// The recommended family, if any family could be fitted.
    #[must_use]
    pub fn best(&self) -> Option<&SearchResult> {
        self.entries.first()
    }

    /// Ranked results, best first.
    #[must_use]
    pub fn entries(&self) -> &[SearchResult] {
        &self.entries
    }

    /// Families left out of the ranking.
    #[must_use]
    pub fn unavailable(&self) -> &[UnavailableFamily] {
        &self.unavailable
    }

    /// Number of ranked families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no family could be ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<4} {:<20} {:>11} {:>13}  tuned hyperparameters",
            "rank", "family", "cv accuracy", "test accuracy"
        )?;
        for (rank, entry) in self.entries.iter().enumerate() {
            let marker = if entry.status.is_complete() { "" } else { " (incomplete)" };
            writeln!(
                f,
                "{:<4} {:<20} {:>11.4} {:>13.4}  {}{marker}",
                rank + 1,
                entry.family.name(),
                entry.cv_score,
                entry.test_accuracy,
                entry.best_params,
            )?;
        }
        for missing in &self.unavailable {
            writeln!(f, "{:<4} {:<20} unavailable: {}", "-", missing.family.name(), missing.reason)?;
        }
        Ok(())
    }
}
