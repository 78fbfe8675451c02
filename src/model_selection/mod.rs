//! Model selection utilities: train/test splitting, k-fold cross-validation
//! and exhaustive grid search.
//!
//! Every split here is deterministic: shuffles draw from
//! `StdRng::seed_from_u64`, and unshuffled splitters depend only on sample
//! order and labels.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LandfallError, Result};
use crate::primitives::Matrix;
use crate::traits::Classifier;

mod grid;
mod search;

pub use grid::{ParamGrid, ParamSet, ParamValue};
pub use search::{CandidateScore, ClassifierFactory, FittedSearch, GridSearchCV, SearchStatus};

/// One `(train_indices, validation_indices)` pair.
pub type Split = (Vec<usize>, Vec<usize>);

/// Results from cross-validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    /// Score for each fold
    pub scores: Vec<f32>,
}

impl CrossValidationResult {
    /// Mean score across folds
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().sum::<f32>() / self.scores.len() as f32
    }

    /// Population standard deviation of fold scores
    #[must_use]
    pub fn std(&self) -> f32 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .scores
            .iter()
            .map(|&score| (score - mean).powi(2))
            .sum::<f32>()
            / self.scores.len() as f32;
        variance.sqrt()
    }

    /// Lowest fold score
    #[must_use]
    pub fn min(&self) -> f32 {
        self.scores.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Highest fold score
    #[must_use]
    pub fn max(&self) -> f32 {
        self.scores
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Training and validation data for one fold, extracted once.
#[derive(Debug, Clone)]
pub(crate) struct FoldData {
    pub(crate) x_train: Matrix<f32>,
    pub(crate) y_train: Vec<usize>,
    pub(crate) x_valid: Matrix<f32>,
    pub(crate) y_valid: Vec<usize>,
}

impl FoldData {
    pub(crate) fn extract(x: &Matrix<f32>, y: &[usize], splits: &[Split]) -> Vec<Self> {
        splits
            .iter()
            .map(|(train_idx, valid_idx)| {
                let (x_train, y_train) = extract_samples(x, y, train_idx);
                let (x_valid, y_valid) = extract_samples(x, y, valid_idx);
                Self {
                    x_train,
                    y_train,
                    x_valid,
                    y_valid,
                }
            })
            .collect()
    }
}

/// Fits a fresh model per fold and scores it on the held-out fold.
///
/// Stops at the first failing fold.
pub(crate) fn score_folds<F>(folds: &[FoldData], mut build: F) -> Result<CrossValidationResult>
where
    F: FnMut() -> Result<Box<dyn Classifier>>,
{
    let mut scores = Vec::with_capacity(folds.len());
    for fold in folds {
        let mut model = build()?;
        model.fit(&fold.x_train, &fold.y_train)?;
        scores.push(model.score(&fold.x_valid, &fold.y_valid)?);
    }
    Ok(CrossValidationResult { scores })
}

/// Run cross-validation on a classifier.
///
/// Each fold trains a clone of `estimator` on the other folds and scores
/// accuracy on the held-out fold.
///
/// # Errors
///
/// Returns `EmptyPartition` if the splitter cannot produce non-empty folds,
/// or the first fit/score error raised on any fold.
///
/// # Example
///
/// ```rust
/// use landfall::classification::KNearestNeighbors;
/// use landfall::model_selection::{cross_validate, CvStrategy};
/// use landfall::prelude::*;
///
/// let x = Matrix::from_vec(20, 1, (0..20).map(|i| i as f32).collect()).expect("20x1 matrix");
/// let y: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
///
/// let model = KNearestNeighbors::new(3);
/// let results = cross_validate(&model, &x, &y, &CvStrategy::stratified(5))
///     .expect("cross-validation should succeed");
/// assert_eq!(results.scores.len(), 5);
/// assert!(results.mean() > 0.8);
/// ```
pub fn cross_validate<C>(
    estimator: &C,
    x: &Matrix<f32>,
    y: &[usize],
    cv: &CvStrategy,
) -> Result<CrossValidationResult>
where
    C: Classifier + Clone + 'static,
{
    crate::traits::check_fit_inputs(x, y)?;
    let splits = cv.split(y)?;
    let folds = FoldData::extract(x, y, &splits);
    score_folds(&folds, || Ok(Box::new(estimator.clone()) as Box<dyn Classifier>))
}

/// Gathers the rows and labels at `indices`, in order.
fn extract_samples(x: &Matrix<f32>, y: &[usize], indices: &[usize]) -> (Matrix<f32>, Vec<usize>) {
    let x_subset = x.select_rows(indices);
    let y_subset = indices.iter().map(|&idx| y[idx]).collect();
    (x_subset, y_subset)
}

/// Which cross-validation splitter a search uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvStrategy {
    /// Class-proportional folds
    Stratified(StratifiedKFold),
    /// Plain consecutive (optionally shuffled) folds
    KFold(KFold),
}

impl CvStrategy {
    /// Unshuffled stratified folds, the default for classifiers.
    #[must_use]
    pub fn stratified(n_splits: usize) -> Self {
        Self::Stratified(StratifiedKFold::new(n_splits))
    }

    /// Plain k-fold.
    #[must_use]
    pub fn kfold(n_splits: usize) -> Self {
        Self::KFold(KFold::new(n_splits))
    }

    /// Number of folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        match self {
            Self::Stratified(cv) => cv.n_splits,
            Self::KFold(cv) => cv.n_splits,
        }
    }

    /// Checks that `n_splits` folds can be cut from `n_samples` samples.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPartition` when `n_splits < 2` or `n_splits > n_samples`.
    pub fn check(&self, n_samples: usize) -> Result<()> {
        let k = self.n_splits();
        if k < 2 {
            return Err(LandfallError::empty_partition(format!(
                "cross-validation needs at least 2 folds, got {k}"
            )));
        }
        if k > n_samples {
            return Err(LandfallError::empty_partition(format!(
                "cannot cut {k} folds from {n_samples} training samples"
            )));
        }
        Ok(())
    }

    /// Produces the train/validation splits for labels `y`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPartition` if the fold count is unusable or any train
    /// or validation side comes out empty.
    pub fn split(&self, y: &[usize]) -> Result<Vec<Split>> {
        self.check(y.len())?;
        let splits = match self {
            Self::Stratified(cv) => cv.split(y),
            Self::KFold(cv) => cv.split(y.len()),
        };
        if let Some(i) = splits
            .iter()
            .position(|(train, valid)| train.is_empty() || valid.is_empty())
        {
            return Err(LandfallError::empty_partition(format!(
                "fold {i} of {} is empty",
                splits.len()
            )));
        }
        Ok(splits)
    }
}

/// K-Fold cross-validator.
///
/// Splits data into K consecutive folds. Each fold is used once as the
/// validation set while the remaining K-1 folds form the training set. The
/// first `n % K` folds get one extra sample.
///
/// # Example
///
/// ```rust
/// use landfall::model_selection::KFold;
///
/// let splits = KFold::new(5).split(10);
/// assert_eq!(splits.len(), 5);
/// assert_eq!(splits[0].1, vec![0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl KFold {
    /// Create a new K-Fold cross-validator (no shuffling).
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    /// Shuffle indices with this seed before cutting folds.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Generate train/validation indices for each fold.
    #[must_use]
    pub fn split(&self, n_samples: usize) -> Vec<Split> {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        if let Some(seed) = self.random_state {
            let mut rng = StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
        }

        let k = self.n_splits.max(1);
        let fold_size = n_samples / k;
        let remainder = n_samples % k;

        let mut result = Vec::with_capacity(k);
        let mut start = 0;
        for i in 0..k {
            let end = start + fold_size + usize::from(i < remainder);

            let valid = indices[start..end].to_vec();
            let mut train = Vec::with_capacity(n_samples - valid.len());
            train.extend_from_slice(&indices[..start]);
            train.extend_from_slice(&indices[end..]);

            result.push((train, valid));
            start = end;
        }
        result
    }
}

/// Stratified K-Fold cross-validator.
///
/// Each class is dealt into the folds separately so every fold keeps
/// roughly the overall class proportions. Leftover samples of each class
/// are placed round-robin, continuing where the previous class stopped, so
/// fold sizes differ by at most one. Without a random state, samples keep
/// their original order within each class.
///
/// # Example
///
/// ```rust
/// use landfall::model_selection::StratifiedKFold;
///
/// let y = [0, 0, 0, 0, 1, 1, 1, 1];
/// let splits = StratifiedKFold::new(2).split(&y);
/// assert_eq!(splits.len(), 2);
/// assert_eq!(splits[0].1, vec![0, 1, 4, 5]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratifiedKFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    /// Create a new Stratified K-Fold cross-validator (no shuffling).
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    /// Shuffle each class's samples with this seed before dealing.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Generate stratified train/validation indices for each fold.
    ///
    /// Both sides of every split are returned in ascending index order.
    #[must_use]
    pub fn split(&self, y: &[usize]) -> Vec<Split> {
        let k = self.n_splits.max(1);

        let mut class_indices: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            class_indices.entry(label).or_default().push(i);
        }

        if let Some(min_count) = class_indices.values().map(Vec::len).min() {
            if min_count < k {
                warn!(
                    min_count,
                    n_splits = k,
                    "least populated class has fewer members than folds"
                );
            }
        }

        if let Some(seed) = self.random_state {
            let mut rng = StdRng::seed_from_u64(seed);
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        let mut fold_of = vec![0usize; y.len()];
        let mut offset = 0;
        for indices in class_indices.values() {
            let base = indices.len() / k;
            let remainder = indices.len() % k;
            let mut sizes = vec![base; k];
            for r in 0..remainder {
                sizes[(offset + r) % k] += 1;
            }
            offset = (offset + remainder) % k;

            let mut pos = 0;
            for (fold, &size) in sizes.iter().enumerate() {
                for &idx in &indices[pos..pos + size] {
                    fold_of[idx] = fold;
                }
                pos += size;
            }
        }

        (0..k)
            .map(|fold| {
                let (valid, train): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&i| fold_of[i] == fold);
                (train, valid)
            })
            .collect()
    }
}

/// Number of test samples for `test_size`: `ceil(n * test_size)`.
fn test_count(n_samples: usize, test_size: f64) -> usize {
    (n_samples as f64 * test_size).ceil() as usize
}

/// Validates a split request and returns `(n_train, n_test)`.
fn validate_split_inputs(n_samples: usize, test_size: f64) -> Result<(usize, usize)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(LandfallError::empty_partition(format!(
            "test_size must be strictly between 0 and 1, got {test_size}"
        )));
    }

    let n_test = test_count(n_samples, test_size);
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(LandfallError::empty_partition(format!(
            "split of {n_samples} samples would leave an empty side (n_train={n_train}, n_test={n_test})"
        )));
    }
    Ok((n_train, n_test))
}

/// Shuffled index partition behind [`train_test_split`].
///
/// Returns `(train_indices, test_indices)`. The first `ceil(n * test_size)`
/// shuffled indices form the test side.
///
/// # Errors
///
/// Returns `EmptyPartition` if `test_size` is outside (0, 1) or either side
/// would be empty.
///
/// # Example
///
/// ```rust
/// use landfall::model_selection::train_test_split_indices;
///
/// let (train, test) = train_test_split_indices(90, 0.2, 2).expect("valid split");
/// assert_eq!(test.len(), 18);
/// assert_eq!(train.len(), 72);
/// ```
pub fn train_test_split_indices(
    n_samples: usize,
    test_size: f64,
    random_state: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let (_, n_test) = validate_split_inputs(n_samples, test_size)?;

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Split features and labels into random train and test subsets.
///
/// Returns `(x_train, x_test, y_train, y_test)`.
///
/// # Errors
///
/// Returns `DataShape` if `x` and `y` disagree on the sample count, and
/// `EmptyPartition` for an unusable `test_size`.
///
/// # Example
///
/// ```rust
/// use landfall::model_selection::train_test_split;
/// use landfall::primitives::Matrix;
///
/// let x = Matrix::from_vec(10, 2, (0..20).map(|i| i as f32).collect()).expect("10x2 matrix");
/// let y = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
///
/// let (x_train, x_test, y_train, y_test) = train_test_split(&x, &y, 0.2, 42).expect("valid split");
/// assert_eq!(x_train.n_rows(), 8);
/// assert_eq!(x_test.n_rows(), 2);
/// assert_eq!(y_train.len() + y_test.len(), 10);
/// ```
#[allow(clippy::type_complexity)]
pub fn train_test_split(
    x: &Matrix<f32>,
    y: &[usize],
    test_size: f64,
    random_state: u64,
) -> Result<(Matrix<f32>, Matrix<f32>, Vec<usize>, Vec<usize>)> {
    if x.n_rows() != y.len() {
        return Err(LandfallError::data_shape(format!(
            "{} feature rows but {} labels",
            x.n_rows(),
            y.len()
        )));
    }
    let (train_idx, test_idx) = train_test_split_indices(x.n_rows(), test_size, random_state)?;
    let (x_train, y_train) = extract_samples(x, y, &train_idx);
    let (x_test, y_test) = extract_samples(x, y, &test_idx);
    Ok((x_train, x_test, y_train, y_test))
}

#[cfg(test)]
mod tests;
