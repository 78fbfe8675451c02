//! K-nearest-neighbors classification.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::neighbors::{BallTree, BruteForce, KdTree, Neighbor, NeighborSearch};
use crate::error::{LandfallError, Result};
use crate::primitives::Matrix;
use crate::traits::{check_fit_inputs, Classifier};

/// Dimensionality above which `Auto` stops using a tree.
const AUTO_MAX_TREE_DIM: usize = 15;

/// Neighbor search strategy. Every choice returns the same neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborAlgorithm {
    /// Brute force when `d > 15` or `2k ≥ n`, a k-d tree otherwise
    #[default]
    Auto,
    /// Ball tree
    BallTree,
    /// k-d tree
    KdTree,
    /// Linear scan
    Brute,
}

impl NeighborAlgorithm {
    /// The concrete strategy used for `n_samples` points of dimension
    /// `n_features` queried for `k` neighbors.
    #[must_use]
    pub fn resolve(self, n_samples: usize, n_features: usize, k: usize) -> Self {
        match self {
            Self::Auto if n_features > AUTO_MAX_TREE_DIM || 2 * k >= n_samples => Self::Brute,
            Self::Auto => Self::KdTree,
            other => other,
        }
    }
}

impl fmt::Display for NeighborAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::BallTree => "ball_tree",
            Self::KdTree => "kd_tree",
            Self::Brute => "brute",
        };
        f.write_str(name)
    }
}

impl FromStr for NeighborAlgorithm {
    type Err = LandfallError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "ball_tree" => Ok(Self::BallTree),
            "kd_tree" => Ok(Self::KdTree),
            "brute" => Ok(Self::Brute),
            other => Err(LandfallError::invalid_hyperparameter(
                "algorithm",
                other,
                "one of auto, ball_tree, kd_tree, brute",
            )),
        }
    }
}

/// Index built at fit time.
#[derive(Debug, Clone)]
enum FittedIndex {
    Brute(BruteForce),
    KdTree(KdTree),
    BallTree(BallTree),
}

impl FittedIndex {
    fn as_search(&self) -> &dyn NeighborSearch {
        match self {
            Self::Brute(index) => index,
            Self::KdTree(index) => index,
            Self::BallTree(index) => index,
        }
    }
}

/// K-Nearest Neighbors classifier.
///
/// Instance-based learning algorithm that classifies new samples based on
/// the k closest training examples under the Minkowski distance.
///
/// # Example
///
/// ```
/// use landfall::classification::{KNearestNeighbors, NeighborAlgorithm};
/// use landfall::prelude::*;
///
/// let x = Matrix::from_vec(6, 2, vec![
///     0.0, 0.0,  // class 0
///     0.0, 1.0,  // class 0
///     1.0, 0.0,  // class 0
///     5.0, 5.0,  // class 1
///     5.0, 6.0,  // class 1
///     6.0, 5.0,  // class 1
/// ]).expect("6x2 matrix with 12 values");
/// let y = vec![0, 0, 0, 1, 1, 1];
///
/// let mut knn = KNearestNeighbors::new(3)
///     .with_algorithm(NeighborAlgorithm::BallTree)
///     .with_p(1.0);
/// knn.fit(&x, &y).expect("Valid training data with 6 samples");
///
/// let test = Matrix::from_vec(1, 2, vec![0.5, 0.5]).expect("1x2 test matrix");
/// assert_eq!(knn.predict(&test).expect("fitted")[0], 0);
/// ```
#[derive(Debug, Clone)]
pub struct KNearestNeighbors {
    /// Number of neighbors to use
    k: usize,
    /// Minkowski power
    p: f64,
    algorithm: NeighborAlgorithm,
    index: Option<FittedIndex>,
    /// Training labels (stored during fit)
    y_train: Vec<usize>,
    n_features: usize,
}

impl KNearestNeighbors {
    /// Creates a classifier voting over `k` Euclidean neighbors.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            p: 2.0,
            algorithm: NeighborAlgorithm::Auto,
            index: None,
            y_train: Vec::new(),
            n_features: 0,
        }
    }

    /// Sets the Minkowski power (1 = Manhattan, 2 = Euclidean).
    #[must_use]
    pub fn with_p(mut self, p: f64) -> Self {
        self.p = p;
        self
    }

    /// Sets the neighbor search strategy.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: NeighborAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Strategy actually used by the fitted model.
    #[must_use]
    pub fn effective_algorithm(&self) -> Option<NeighborAlgorithm> {
        self.index.as_ref().map(|index| match index {
            FittedIndex::Brute(_) => NeighborAlgorithm::Brute,
            FittedIndex::KdTree(_) => NeighborAlgorithm::KdTree,
            FittedIndex::BallTree(_) => NeighborAlgorithm::BallTree,
        })
    }

    /// The `k` nearest training rows for every row of `x`, ordered by
    /// `(distance, training index)`.
    ///
    /// # Errors
    ///
    /// Returns `NotFitted` before `fit`, or `DimensionMismatch` if the
    /// feature count differs from training.
    pub fn kneighbors(&self, x: &Matrix<f32>) -> Result<Vec<Vec<Neighbor>>> {
        let index = self
            .index
            .as_ref()
            .ok_or(LandfallError::NotFitted("KNearestNeighbors"))?
            .as_search();
        if x.n_cols() != self.n_features {
            return Err(LandfallError::dimension_mismatch(
                "n_features",
                self.n_features,
                x.n_cols(),
            ));
        }
        Ok((0..x.n_rows())
            .map(|i| index.query(x.row_slice(i), self.k))
            .collect())
    }

    /// Most-voted label; ties go to the lowest label.
    fn vote(&self, neighbors: &[Neighbor]) -> usize {
        let mut votes: BTreeMap<usize, usize> = BTreeMap::new();
        for neighbor in neighbors {
            *votes.entry(self.y_train[neighbor.index]).or_insert(0) += 1;
        }
        let mut best: Option<(usize, usize)> = None;
        for (label, count) in votes {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((label, count));
            }
        }
        best.map_or(0, |(label, _)| label)
    }
}

impl Classifier for KNearestNeighbors {
    /// Builds the neighbor index over the training data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `k` is 0 or exceeds the number of
    /// training samples, or `p < 1`.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        check_fit_inputs(x, y)?;
        let (n_samples, n_features) = x.shape();
        if self.k == 0 || self.k > n_samples {
            return Err(LandfallError::invalid_hyperparameter(
                "n_neighbors",
                self.k,
                &format!("1 <= n_neighbors <= {n_samples} training samples"),
            ));
        }
        if !(self.p >= 1.0 && self.p.is_finite()) {
            return Err(LandfallError::invalid_hyperparameter("p", self.p, "p >= 1"));
        }

        let points = x.clone();
        self.index = Some(match self.algorithm.resolve(n_samples, n_features, self.k) {
            NeighborAlgorithm::BallTree => FittedIndex::BallTree(BallTree::build(points, self.p)),
            NeighborAlgorithm::KdTree => FittedIndex::KdTree(KdTree::build(points, self.p)),
            _ => FittedIndex::Brute(BruteForce::build(points, self.p)),
        });
        self.y_train = y.to_vec();
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        Ok(self
            .kneighbors(x)?
            .iter()
            .map(|neighbors| self.vote(neighbors))
            .collect())
    }
}
