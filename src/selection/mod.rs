//! End-to-end model selection over the four classifier families.
//!
//! [`ModelSelector::run`] standardizes the dataset, draws the seeded
//! train/test partition, grid-searches every configured family with
//! cross-validation on the training side, evaluates each refit winner once
//! on the test side, and ranks the families in a [`Leaderboard`].
//!
//! # Example
//!
//! ```
//! use landfall::config::SelectionConfig;
//! use landfall::data::Dataset;
//! use landfall::selection::{ClassifierFamily, ModelSelector};
//!
//! let dataset = Dataset::synthetic_binary(40, 3, 7).expect("valid generator arguments");
//! let config = SelectionConfig::new()
//!     .with_families(vec![ClassifierFamily::LogisticRegression, ClassifierFamily::Knn]);
//!
//! let report = ModelSelector::new(config).run(&dataset).expect("selection should succeed");
//! assert_eq!(report.n_test, 8);
//! assert_eq!(report.leaderboard.len(), 2);
//! println!("{report}");
//! ```

mod family;
mod leaderboard;

use std::collections::HashMap;
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use family::ClassifierFamily;
pub use leaderboard::{evaluate, Evaluation, Leaderboard, SearchResult, UnavailableFamily};

use crate::config::{ScalingMode, SelectionConfig};
use crate::data::Dataset;
use crate::error::Result;
use crate::model_selection::{train_test_split, CvStrategy, GridSearchCV, ParamGrid};
use crate::preprocessing::StandardScaler;
use crate::primitives::Matrix;
use crate::traits::Transformer;

/// Output of a selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Training partition size
    pub n_train: usize,
    /// Test partition size
    pub n_test: usize,
    /// Zero-variance columns that were only centered
    pub floored_features: Vec<usize>,
    /// Families ranked by test accuracy
    pub leaderboard: Leaderboard,
}

impl SelectionReport {
    /// The recommended family's result.
    #[must_use]
    pub fn best(&self) -> Option<&SearchResult> {
        self.leaderboard.best()
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "train samples: {}, test samples: {}", self.n_train, self.n_test)?;
        if !self.floored_features.is_empty() {
            writeln!(f, "zero-variance features: {:?}", self.floored_features)?;
        }
        writeln!(f)?;
        for entry in self.leaderboard.entries() {
            writeln!(f, "{}", entry.family.name())?;
            writeln!(f, "  tuned hyperparameters (best parameters): {}", entry.best_params)?;
            writeln!(f, "  accuracy: {:.4}", entry.cv_score)?;
            writeln!(f, "  test data accuracy: {:.4}", entry.test_accuracy)?;
            writeln!(f, "{}", entry.confusion)?;
            writeln!(f)?;
        }
        write!(f, "{}", self.leaderboard)?;
        if let Some(best) = self.best() {
            write!(
                f,
                "\nbest model: {} (test accuracy {:.4})",
                best.family.name(),
                best.test_accuracy
            )?;
        }
        Ok(())
    }
}

/// Standardized train/test partitions shared by every family search.
struct Partition {
    x_train: Matrix<f32>,
    x_test: Matrix<f32>,
    y_train: Vec<usize>,
    y_test: Vec<usize>,
    floored_features: Vec<usize>,
}

enum FamilyOutcome {
    Ranked(SearchResult),
    Unavailable(UnavailableFamily),
}

/// Runs the whole selection pipeline.
#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    config: SelectionConfig,
    grids: HashMap<ClassifierFamily, ParamGrid>,
}

impl ModelSelector {
    /// Selector for `config`, using each family's fixed grid.
    #[must_use]
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            grids: HashMap::new(),
        }
    }

    /// Searches `grid` instead of `family`'s fixed grid.
    #[must_use]
    pub fn with_grid(mut self, family: ClassifierFamily, grid: ParamGrid) -> Self {
        self.grids.insert(family, grid);
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// The grid searched for `family`.
    #[must_use]
    pub fn grid(&self, family: ClassifierFamily) -> ParamGrid {
        self.grids
            .get(&family)
            .cloned()
            .unwrap_or_else(|| family.default_grid())
    }

    fn cv_for(&self, family: ClassifierFamily) -> CvStrategy {
        let k = self.config.folds.get(family);
        if self.config.stratified {
            CvStrategy::stratified(k)
        } else {
            CvStrategy::kfold(k)
        }
    }

    /// Runs selection on `dataset`.
    ///
    /// # Errors
    ///
    /// - `EmptyPartition` if the test fraction, the split or any family's
    ///   folds would leave a partition empty; raised before any search starts.
    /// - `Config` if the configuration is otherwise invalid.
    /// - Any other non-recoverable error from a family search.
    ///
    /// A family whose every grid point fails is reported as unavailable
    /// rather than failing the run.
    pub fn run(&self, dataset: &Dataset) -> Result<SelectionReport> {
        self.config.validate()?;
        let partition = self.partition(dataset)?;

        for &family in &self.config.families {
            self.cv_for(family).split(&partition.y_train)?;
        }

        info!(
            n_train = partition.y_train.len(),
            n_test = partition.y_test.len(),
            families = self.config.families.len(),
            parallel = self.config.parallel,
            "starting model selection"
        );

        let outcomes: Vec<FamilyOutcome> = if self.config.parallel {
            self.config
                .families
                .par_iter()
                .map(|&family| self.search_family(family, &partition))
                .collect::<Result<Vec<_>>>()?
        } else {
            self.config
                .families
                .iter()
                .map(|&family| self.search_family(family, &partition))
                .collect::<Result<Vec<_>>>()?
        };

        let mut ranked = Vec::new();
        let mut unavailable = Vec::new();
        for outcome in outcomes {
            match outcome {
                FamilyOutcome::Ranked(result) => ranked.push(result),
                FamilyOutcome::Unavailable(missing) => unavailable.push(missing),
            }
        }
        let leaderboard = Leaderboard::from_results(ranked, unavailable);

        match leaderboard.best() {
            Some(best) => info!(
                family = best.family.name(),
                test_accuracy = best.test_accuracy,
                cv_score = best.cv_score,
                params = %best.best_params,
                "best model selected"
            ),
            None => warn!("no classifier family could be fitted"),
        }

        Ok(SelectionReport {
            n_train: partition.y_train.len(),
            n_test: partition.y_test.len(),
            floored_features: partition.floored_features,
            leaderboard,
        })
    }

    fn partition(&self, dataset: &Dataset) -> Result<Partition> {
        let (x, y) = (dataset.features(), dataset.labels());
        let (test_fraction, seed) = (self.config.test_fraction, self.config.random_state);
        let mut scaler = StandardScaler::new();

        let (x_train, x_test, y_train, y_test) = match self.config.scaling {
            ScalingMode::FullDataset => {
                let scaled = scaler.fit_transform(x)?;
                train_test_split(&scaled, y, test_fraction, seed)?
            }
            ScalingMode::TrainOnly => {
                let (x_train, x_test, y_train, y_test) =
                    train_test_split(x, y, test_fraction, seed)?;
                let x_train = scaler.fit_transform(&x_train)?;
                let x_test = scaler.transform(&x_test)?;
                (x_train, x_test, y_train, y_test)
            }
        };

        let floored_features = scaler.floored_features().to_vec();
        if !floored_features.is_empty() {
            debug!(?floored_features, "zero-variance features centered only");
        }
        Ok(Partition {
            x_train,
            x_test,
            y_train,
            y_test,
            floored_features,
        })
    }

    fn search_family(&self, family: ClassifierFamily, partition: &Partition) -> Result<FamilyOutcome> {
        let grid = self.grid(family);
        let cv = self.cv_for(family);
        info!(
            family = family.name(),
            points = grid.len(),
            folds = cv.n_splits(),
            "searching family"
        );

        let mut search = GridSearchCV::new(grid, cv.n_splits())
            .with_cv(cv)
            .with_random_state(self.config.random_state);
        if let Some(budget) = self.config.time_budget()? {
            search = search.with_time_budget(budget);
        }

        let fitted = match search.fit(&family, &partition.x_train, &partition.y_train) {
            Ok(fitted) => fitted,
            Err(err) if !err.is_fatal() => {
                warn!(family = family.name(), error = %err, "family unavailable");
                return Ok(FamilyOutcome::Unavailable(UnavailableFamily {
                    family,
                    reason: err.to_string(),
                }));
            }
            Err(err) => return Err(err),
        };

        let evaluation = evaluate(fitted.model(), &partition.x_test, &partition.y_test)?;
        info!(
            family = family.name(),
            cv_score = fitted.best_score(),
            test_accuracy = evaluation.accuracy,
            params = %fitted.best_params(),
            "family searched"
        );

        Ok(FamilyOutcome::Ranked(SearchResult {
            family,
            best_params: fitted.best_params().clone(),
            cv_score: fitted.best_score(),
            cv_std: fitted.best_std(),
            n_folds: search.cv().n_splits(),
            test_accuracy: evaluation.accuracy,
            confusion: evaluation.confusion,
            status: fitted.status(),
            candidates: fitted.cv_results().to_vec(),
        }))
    }
}

#[cfg(test)]
mod tests;
