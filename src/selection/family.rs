//! The four searched classifier families and their fixed grids.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classification::{KNearestNeighbors, LogisticRegression, SVC};
use crate::error::Result;
use crate::model_selection::{ClassifierFactory, ParamGrid, ParamSet};
use crate::traits::Classifier;
use crate::tree::DecisionTreeClassifier;

/// A classifier family with its own grid, fold count and builder.
///
/// Declaration order is the leaderboard tie-breaking order.
///
/// # Example
///
/// ```
/// use landfall::selection::ClassifierFamily;
///
/// let svm = ClassifierFamily::Svm;
/// assert_eq!(svm.name(), "SVM");
/// assert_eq!(svm.default_folds(), 10);
/// assert_eq!(svm.default_grid().len(), 125);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierFamily {
    /// Binary logistic regression
    LogisticRegression,
    /// Kernel support vector classifier
    Svm,
    /// CART decision tree
    DecisionTree,
    /// K-nearest neighbors
    Knn,
}

/// `n` values spaced evenly on a log10 scale from `10^start` to `10^stop`.
fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![10f64.powf(start)];
    }
    let step = (stop - start) / (n - 1) as f64;
    (0..n)
        .map(|i| 10f64.powf(start + step * i as f64))
        .collect()
}

impl ClassifierFamily {
    /// Every family, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::LogisticRegression,
        Self::Svm,
        Self::DecisionTree,
        Self::Knn,
    ];

    /// Human-readable name used in logs and reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LogisticRegression => "Logistic Regression",
            Self::Svm => "SVM",
            Self::DecisionTree => "Decision Tree",
            Self::Knn => "KNN",
        }
    }

    /// Cross-validation folds used for this family.
    #[must_use]
    pub fn default_folds(&self) -> usize {
        match self {
            Self::LogisticRegression => 5,
            Self::Svm | Self::DecisionTree | Self::Knn => 10,
        }
    }

    /// The family's fixed hyperparameter grid.
    #[must_use]
    pub fn default_grid(&self) -> ParamGrid {
        match self {
            Self::LogisticRegression => ParamGrid::new()
                .add("C", [0.01, 0.1, 1.0])
                .add("penalty", ["l2"])
                .add("solver", ["lbfgs"]),
            // rbf appears twice; both copies are evaluated.
            Self::Svm => ParamGrid::new()
                .add("kernel", ["linear", "rbf", "poly", "rbf", "sigmoid"])
                .add("C", logspace(-3.0, 3.0, 5))
                .add("gamma", logspace(-3.0, 3.0, 5)),
            Self::DecisionTree => ParamGrid::new()
                .add("criterion", ["gini", "entropy"])
                .add("splitter", ["best", "random"])
                .add("max_depth", (2..=18usize).step_by(2))
                .add("max_features", ["all", "sqrt"])
                .add("min_samples_leaf", [1usize, 2, 4])
                .add("min_samples_split", [2usize, 5, 10]),
            Self::Knn => ParamGrid::new()
                .add("n_neighbors", 1..=10usize)
                .add("algorithm", ["auto", "ball_tree", "kd_tree", "brute"])
                .add("p", [1usize, 2]),
        }
    }
}

impl fmt::Display for ClassifierFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ClassifierFactory for ClassifierFamily {
    fn name(&self) -> &str {
        ClassifierFamily::name(self)
    }

    fn build(&self, params: &ParamSet, random_state: u64) -> Result<Box<dyn Classifier>> {
        let model: Box<dyn Classifier> = match self {
            Self::LogisticRegression => Box::new(
                LogisticRegression::new()
                    .with_c(params.get_f64("C")?)
                    .with_penalty(params.get_str("penalty")?.parse()?)
                    .with_solver(params.get_str("solver")?.parse()?),
            ),
            Self::Svm => Box::new(
                SVC::new()
                    .with_kernel(params.get_str("kernel")?.parse()?)
                    .with_c(params.get_f64("C")?)
                    .with_gamma(params.get_f64("gamma")?),
            ),
            Self::DecisionTree => Box::new(
                DecisionTreeClassifier::new()
                    .with_criterion(params.get_str("criterion")?.parse()?)
                    .with_splitter(params.get_str("splitter")?.parse()?)
                    .with_max_depth(params.get_usize("max_depth")?)
                    .with_max_features(params.get_str("max_features")?.parse()?)
                    .with_min_samples_leaf(params.get_usize("min_samples_leaf")?)
                    .with_min_samples_split(params.get_usize("min_samples_split")?)
                    .with_random_state(random_state),
            ),
            Self::Knn => Box::new(
                KNearestNeighbors::new(params.get_usize("n_neighbors")?)
                    .with_algorithm(params.get_str("algorithm")?.parse()?)
                    .with_p(params.get_f64("p")?),
            ),
        };
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logspace_matches_reference_values() {
        let values = logspace(-3.0, 3.0, 5);
        let expected = [0.001, 0.031_622_776_601_683_79, 1.0, 31.622_776_601_683_79, 1000.0];
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() <= e * 1e-12, "{v} vs {e}");
        }
    }

    #[test]
    fn test_grid_sizes() {
        assert_eq!(ClassifierFamily::LogisticRegression.default_grid().len(), 3);
        assert_eq!(ClassifierFamily::Svm.default_grid().len(), 125);
        assert_eq!(ClassifierFamily::DecisionTree.default_grid().len(), 648);
        assert_eq!(ClassifierFamily::Knn.default_grid().len(), 80);
    }

    #[test]
    fn test_every_grid_point_builds() {
        for family in ClassifierFamily::ALL {
            for params in family.default_grid().points() {
                assert!(family.build(&params, 2).is_ok(), "{family} {params}");
            }
        }
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let params = ParamSet::new()
            .with("kernel", "laplacian")
            .with("C", 1.0)
            .with("gamma", 1.0);
        assert!(ClassifierFamily::Svm.build(&params, 0).is_err());
    }

    #[test]
    fn test_missing_parameter_is_rejected() {
        let params = ParamSet::new().with("C", 1.0);
        assert!(ClassifierFamily::LogisticRegression.build(&params, 0).is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ClassifierFamily::ALL).expect("serialize");
        assert_eq!(json, r#"["logistic_regression","svm","decision_tree","knn"]"#);
    }
}
