//! Selection run configuration.
//!
//! Every field has a default matching the reference landing-outcome study,
//! so an empty JSON object is a complete configuration.
//!
//! # Example
//!
//! ```
//! use landfall::config::{ScalingMode, SelectionConfig};
//!
//! let config = SelectionConfig::from_json_str(r#"{ "parallel": true }"#)
//!     .expect("valid configuration");
//! assert!(config.parallel);
//! assert_eq!(config.test_fraction, 0.2);
//! assert_eq!(config.random_state, 2);
//! assert_eq!(config.scaling, ScalingMode::FullDataset);
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LandfallError, Result};
use crate::selection::ClassifierFamily;

/// Which rows the standardizer is fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Fit on every row before the split. Test-set statistics leak into
    /// the training features.
    #[default]
    FullDataset,
    /// Fit on the training partition only and apply to both partitions.
    TrainOnly,
}

/// Cross-validation fold count per classifier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyFolds {
    /// Logistic regression folds
    pub logistic_regression: usize,
    /// Support vector machine folds
    pub svm: usize,
    /// Decision tree folds
    pub decision_tree: usize,
    /// K-nearest-neighbors folds
    pub knn: usize,
}

impl Default for FamilyFolds {
    fn default() -> Self {
        Self {
            logistic_regression: ClassifierFamily::LogisticRegression.default_folds(),
            svm: ClassifierFamily::Svm.default_folds(),
            decision_tree: ClassifierFamily::DecisionTree.default_folds(),
            knn: ClassifierFamily::Knn.default_folds(),
        }
    }
}

impl FamilyFolds {
    /// Fold count for `family`.
    #[must_use]
    pub fn get(&self, family: ClassifierFamily) -> usize {
        match family {
            ClassifierFamily::LogisticRegression => self.logistic_regression,
            ClassifierFamily::Svm => self.svm,
            ClassifierFamily::DecisionTree => self.decision_tree,
            ClassifierFamily::Knn => self.knn,
        }
    }

    /// Uses `k` folds for every family.
    #[must_use]
    pub fn uniform(k: usize) -> Self {
        Self {
            logistic_regression: k,
            svm: k,
            decision_tree: k,
            knn: k,
        }
    }
}

/// Configuration of a [`ModelSelector`](crate::selection::ModelSelector) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Fraction of samples held out for testing, in (0, 1)
    pub test_fraction: f64,
    /// Seed for the train/test shuffle and every seeded classifier
    pub random_state: u64,
    /// Folds per family
    pub folds: FamilyFolds,
    /// Stratified folds (`true`) or plain contiguous folds
    pub stratified: bool,
    /// Search families concurrently on the rayon pool
    pub parallel: bool,
    /// Wall-clock budget per family search, in seconds
    pub time_budget_secs: Option<f64>,
    /// Where the standardizer is fitted
    pub scaling: ScalingMode,
    /// Families to search, in tie-breaking order
    pub families: Vec<ClassifierFamily>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            random_state: 2,
            folds: FamilyFolds::default(),
            stratified: true,
            parallel: false,
            time_budget_secs: None,
            scaling: ScalingMode::FullDataset,
            families: ClassifierFamily::ALL.to_vec(),
        }
    }
}

impl SelectionConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the held-out fraction.
    #[must_use]
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Sets the fold counts.
    #[must_use]
    pub fn with_folds(mut self, folds: FamilyFolds) -> Self {
        self.folds = folds;
        self
    }

    /// Chooses stratified or plain folds.
    #[must_use]
    pub fn with_stratified(mut self, stratified: bool) -> Self {
        self.stratified = stratified;
        self
    }

    /// Enables concurrent family searches.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Caps each family search at `budget`.
    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_secs = Some(budget.as_secs_f64());
        self
    }

    /// Sets where the standardizer is fitted.
    #[must_use]
    pub fn with_scaling(mut self, scaling: ScalingMode) -> Self {
        self.scaling = scaling;
        self
    }

    /// Restricts the run to `families`, in the given order.
    #[must_use]
    pub fn with_families(mut self, families: Vec<ClassifierFamily>) -> Self {
        self.families = families;
        self
    }

    /// The per-family budget as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns `Config` if the budget is negative, not finite, or too large
    /// for a `Duration`.
    pub fn time_budget(&self) -> Result<Option<Duration>> {
        self.time_budget_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|err| {
                    LandfallError::Config(format!(
                        "time_budget_secs must be a representable non-negative duration, got {secs}: {err}"
                    ))
                })
            })
            .transpose()
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `Json` for malformed input or `Config` if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPartition` if `test_fraction` or a fold count would
    /// leave a partition empty, otherwise `Config` naming the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(LandfallError::empty_partition(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        for family in ClassifierFamily::ALL {
            let k = self.folds.get(family);
            if k < 2 {
                return Err(LandfallError::empty_partition(format!(
                    "{} needs at least 2 folds, got {k}",
                    family.name()
                )));
            }
        }
        self.time_budget()?;
        if self.families.is_empty() {
            return Err(LandfallError::Config(
                "at least one classifier family is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.families.iter().find(|f| !seen.insert(**f)) {
            return Err(LandfallError::Config(format!(
                "{} is listed more than once",
                dup.name()
            )));
        }
        Ok(())
    }
}
