//! Cross-validated exhaustive grid search.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{score_folds, CvStrategy, FoldData, ParamGrid, ParamSet};
use crate::error::{LandfallError, Result};
use crate::primitives::Matrix;
use crate::traits::{check_fit_inputs, Classifier};

/// Builds fresh classifiers from grid points.
///
/// The search loop is written once against this trait; each classifier
/// family supplies its own implementation.
pub trait ClassifierFactory: Send + Sync {
    /// Display name of the family, used in logs and errors.
    fn name(&self) -> &str;

    /// Builds an unfitted classifier configured by `params`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if a value is missing or unusable.
    fn build(&self, params: &ParamSet, random_state: u64) -> Result<Box<dyn Classifier>>;
}

/// Whether every grid point was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchStatus {
    /// All grid points were evaluated
    Complete,
    /// The time budget ran out first
    Incomplete {
        /// Points evaluated before stopping
        evaluated: usize,
        /// Points in the grid
        total: usize,
    },
}

impl SearchStatus {
    /// True if every grid point was evaluated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Cross-validation outcome for one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// The grid point
    pub params: ParamSet,
    /// Mean validation accuracy, `None` if the point could not be fitted
    pub mean_score: Option<f32>,
    /// Standard deviation of fold accuracies
    pub std_score: Option<f32>,
    /// Per-fold validation accuracies
    pub fold_scores: Vec<f32>,
    /// Why the point could not be fitted
    pub error: Option<String>,
}

/// Exhaustive search over a [`ParamGrid`] scored by k-fold accuracy.
///
/// Folds are computed once and shared by every grid point. The point with
/// the highest mean validation accuracy wins; ties keep the earlier point.
/// The winner is then refit on all of the training data.
///
/// # Example
///
/// ```
/// use landfall::classification::KNearestNeighbors;
/// use landfall::model_selection::{ClassifierFactory, GridSearchCV, ParamGrid, ParamSet};
/// use landfall::prelude::*;
///
/// struct Knn;
///
/// impl ClassifierFactory for Knn {
///     fn name(&self) -> &str {
///         "KNN"
///     }
///
///     fn build(&self, params: &ParamSet, _seed: u64) -> landfall::Result<Box<dyn Classifier>> {
///         Ok(Box::new(KNearestNeighbors::new(params.get_usize("n_neighbors")?)))
///     }
/// }
///
/// let x = Matrix::from_vec(12, 1, (0..12).map(|i| i as f32).collect()).expect("12x1 matrix");
/// let y: Vec<usize> = (0..12).map(|i| usize::from(i >= 6)).collect();
///
/// let search = GridSearchCV::new(ParamGrid::new().add("n_neighbors", [1, 3]), 3);
/// let fitted = search.fit(&Knn, &x, &y).expect("search should succeed");
/// assert_eq!(fitted.cv_results().len(), 2);
/// assert!(fitted.best_score() > 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct GridSearchCV {
    grid: ParamGrid,
    cv: CvStrategy,
    time_budget: Option<Duration>,
    random_state: u64,
}

impl GridSearchCV {
    /// Search `grid` with unshuffled stratified `n_folds`-fold CV.
    #[must_use]
    pub fn new(grid: ParamGrid, n_folds: usize) -> Self {
        Self {
            grid,
            cv: CvStrategy::stratified(n_folds),
            time_budget: None,
            random_state: 0,
        }
    }

    /// Replaces the fold splitter.
    #[must_use]
    pub fn with_cv(mut self, cv: CvStrategy) -> Self {
        self.cv = cv;
        self
    }

    /// Stops starting new grid points once `budget` has elapsed.
    ///
    /// The first point is always evaluated.
    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Seed handed to every classifier the search builds.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// The grid being searched.
    #[must_use]
    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// The fold splitter.
    #[must_use]
    pub fn cv(&self) -> &CvStrategy {
        &self.cv
    }

    /// Runs the search and refits the winner on `(x, y)`.
    ///
    /// # Errors
    ///
    /// - `EmptyPartition` if `x` is empty or the folds cannot be cut; this
    ///   is raised before any model is fitted.
    /// - `InvalidHyperparameter` if the grid has no points.
    /// - `UnfittableConfiguration` if no grid point survives cross-validation
    ///   or the refit of the winner fails.
    pub fn fit(
        &self,
        factory: &dyn ClassifierFactory,
        x: &Matrix<f32>,
        y: &[usize],
    ) -> Result<FittedSearch> {
        check_fit_inputs(x, y)?;
        let points = self.grid.points();
        if points.is_empty() {
            return Err(LandfallError::invalid_hyperparameter(
                "param_grid",
                "empty value list",
                "at least one grid point",
            ));
        }
        let splits = self.cv.split(y)?;
        let folds = FoldData::extract(x, y, &splits);

        let family = factory.name();
        let total = points.len();
        let start = Instant::now();
        let mut status = SearchStatus::Complete;
        let mut cv_results = Vec::with_capacity(total);
        let mut best: Option<(usize, f32)> = None;
        let mut last_error = None;

        for (i, params) in points.into_iter().enumerate() {
            if i > 0 && self.time_budget.is_some_and(|b| start.elapsed() >= b) {
                status = SearchStatus::Incomplete {
                    evaluated: i,
                    total,
                };
                warn!(family, evaluated = i, total, "time budget exhausted, search incomplete");
                break;
            }

            match score_folds(&folds, || factory.build(&params, self.random_state)) {
                Ok(result) => {
                    let mean = result.mean();
                    debug!(family, %params, mean, "grid point scored");
                    if best.map_or(true, |(_, s)| mean > s) {
                        best = Some((i, mean));
                    }
                    cv_results.push(CandidateScore {
                        params,
                        mean_score: Some(mean),
                        std_score: Some(result.std()),
                        fold_scores: result.scores,
                        error: None,
                    });
                }
                Err(err) => {
                    debug!(family, %params, error = %err, "grid point unfittable, skipped");
                    let message = err.to_string();
                    cv_results.push(CandidateScore {
                        params,
                        mean_score: None,
                        std_score: None,
                        fold_scores: Vec::new(),
                        error: Some(message.clone()),
                    });
                    last_error = Some(message);
                }
            }
        }

        let Some((best_index, best_score)) = best else {
            return Err(LandfallError::UnfittableConfiguration {
                family: family.to_string(),
                message: last_error.unwrap_or_else(|| "no grid point was evaluated".to_string()),
            });
        };

        let best = &cv_results[best_index];
        let best_params = best.params.clone();
        let best_std = best.std_score.unwrap_or(0.0);

        let unfittable = |err: LandfallError| LandfallError::UnfittableConfiguration {
            family: family.to_string(),
            message: format!("refit with {best_params} failed: {err}"),
        };
        let mut model = factory
            .build(&best_params, self.random_state)
            .map_err(unfittable)?;
        model.fit(x, y).map_err(unfittable)?;

        Ok(FittedSearch {
            family: family.to_string(),
            best_params,
            best_index,
            best_score,
            best_std,
            cv_results,
            status,
            model,
        })
    }
}

/// A finished search: the winning grid point and the model refit with it.
pub struct FittedSearch {
    family: String,
    best_params: ParamSet,
    best_index: usize,
    best_score: f32,
    best_std: f32,
    cv_results: Vec<CandidateScore>,
    status: SearchStatus,
    model: Box<dyn Classifier>,
}

impl fmt::Debug for FittedSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FittedSearch")
            .field("family", &self.family)
            .field("best_params", &self.best_params)
            .field("best_score", &self.best_score)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl FittedSearch {
    /// Family name reported by the factory.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Winning grid point.
    #[must_use]
    pub fn best_params(&self) -> &ParamSet {
        &self.best_params
    }

    /// Position of the winner in grid order.
    #[must_use]
    pub fn best_index(&self) -> usize {
        self.best_index
    }

    /// Mean validation accuracy of the winner.
    #[must_use]
    pub fn best_score(&self) -> f32 {
        self.best_score
    }

    /// Standard deviation of the winner's fold accuracies.
    #[must_use]
    pub fn best_std(&self) -> f32 {
        self.best_std
    }

    /// Every evaluated grid point, in grid order.
    #[must_use]
    pub fn cv_results(&self) -> &[CandidateScore] {
        &self.cv_results
    }

    /// Whether the budget cut the search short.
    #[must_use]
    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// The refit model.
    #[must_use]
    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }

    /// Predicts with the refit model.
    ///
    /// # Errors
    ///
    /// Propagates the model's prediction error.
    pub fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        self.model.predict(x)
    }

    /// Accuracy of the refit model on `(x, y)`.
    ///
    /// # Errors
    ///
    /// Propagates the model's scoring error.
    pub fn score(&self, x: &Matrix<f32>, y: &[usize]) -> Result<f32> {
        self.model.score(x, y)
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
