//! Decision tree classification (CART).
//!
//! Trees are grown depth-first on index sets into the training matrix.
//! Each node either becomes a leaf predicting its majority class or is
//! split on `feature <= threshold` into two children.
//!
//! # Example
//!
//! ```
//! use landfall::prelude::*;
//! use landfall::tree::{Criterion, DecisionTreeClassifier};
//!
//! // Training data (simple 2D binary classification)
//! let x = Matrix::from_vec(4, 2, vec![
//!     0.0, 0.0,  // class 0
//!     0.0, 1.0,  // class 1
//!     1.0, 0.0,  // class 1
//!     1.0, 1.0,  // class 0
//! ]).expect("4x2 matrix");
//! let y = vec![0, 1, 1, 0];
//!
//! let mut tree = DecisionTreeClassifier::new()
//!     .with_criterion(Criterion::Entropy)
//!     .with_max_depth(3);
//! tree.fit(&x, &y).expect("fit should succeed");
//!
//! assert_eq!(tree.predict(&x).expect("fitted"), y);
//! ```

mod helpers;

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LandfallError, Result};
use crate::primitives::Matrix;
use crate::traits::{check_fit_inputs, Classifier};
use helpers::{
    best_split_for_feature, class_counts, impurity, majority_class, random_split_for_feature,
    Split, SplitRules,
};

/// Internal node in a decision tree.
///
/// Contains a split condition (feature and threshold) and pointers to
/// left and right subtrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f32,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<TreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<TreeNode>,
}

/// Leaf node in a decision tree.
///
/// Contains the predicted class label and number of training samples
/// that reached this leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaf {
    /// Predicted class label for this leaf
    pub class_label: usize,
    /// Number of training samples in this leaf
    pub n_samples: usize,
}

/// A node in a decision tree (either internal node or leaf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal decision node with split condition
    Node(Node),
    /// Leaf node with class prediction
    Leaf(Leaf),
}

impl TreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    /// Number of leaves under this node.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 1,
            TreeNode::Node(node) => node.left.n_leaves() + node.right.n_leaves(),
        }
    }

    /// Smallest training-sample count over the leaves.
    #[must_use]
    pub fn min_leaf_samples(&self) -> usize {
        match self {
            TreeNode::Leaf(leaf) => leaf.n_samples,
            TreeNode::Node(node) => node.left.min_leaf_samples().min(node.right.min_leaf_samples()),
        }
    }
}

/// Impurity measure minimized by each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity
    #[default]
    Gini,
    /// Shannon entropy (information gain)
    Entropy,
}

/// How thresholds are chosen at each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Splitter {
    /// Every midpoint between consecutive distinct values
    #[default]
    Best,
    /// One uniform threshold per candidate feature
    Random,
}

/// How many features are considered at each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// Every feature
    #[default]
    All,
    /// `max(1, ⌊√d⌋)` features drawn without replacement
    Sqrt,
}

impl MaxFeatures {
    /// Number of candidate features out of `n_features`.
    #[must_use]
    pub fn count(self, n_features: usize) -> usize {
        match self {
            Self::All => n_features,
            Self::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
        }
    }
}

macro_rules! named_options {
    ($ty:ident, $param:literal, $( $variant:ident => $name:literal ),+) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Self::$variant => f.write_str($name), )+
                }
            }
        }

        impl FromStr for $ty {
            type Err = LandfallError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $( $name => Ok(Self::$variant), )+
                    other => Err(LandfallError::invalid_hyperparameter(
                        $param,
                        other,
                        concat!("one of", $( " ", $name ),+),
                    )),
                }
            }
        }
    };
}

named_options!(Criterion, "criterion", Gini => "gini", Entropy => "entropy");
named_options!(Splitter, "splitter", Best => "best", Random => "random");
named_options!(MaxFeatures, "max_features", All => "all", Sqrt => "sqrt");

/// Decision tree classifier using the CART algorithm.
///
/// Leaves predict the majority class of their training samples, with ties
/// going to the lowest label. Randomness (the random splitter and feature
/// sampling) is driven by `random_state`, so equal seeds grow equal trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    tree: Option<TreeNode>,
    criterion: Criterion,
    splitter: Splitter,
    max_features: MaxFeatures,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    random_state: u64,
    /// Number of features the model was trained on (for validation)
    n_features: usize,
    feature_importances: Vec<f32>,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeClassifier {
    /// Gini, best splitter, every feature, unlimited depth.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            criterion: Criterion::Gini,
            splitter: Splitter::Best,
            max_features: MaxFeatures::All,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            random_state: 0,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    /// Sets the impurity criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Sets the threshold strategy.
    #[must_use]
    pub fn with_splitter(mut self, splitter: Splitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Sets the per-node feature budget.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Sets the maximum depth of the tree.
    ///
    /// # Arguments
    ///
    /// * `depth` - Maximum depth (root has depth 0)
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the smallest node that may still be split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Sets the smallest allowed leaf.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Seeds the random splitter and feature sampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// The fitted tree.
    #[must_use]
    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    /// Depth of the fitted tree (0 before fitting).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tree.as_ref().map_or(0, TreeNode::depth)
    }

    /// Normalized total impurity decrease per feature (empty before
    /// fitting, all zeros for a single-leaf tree).
    #[must_use]
    pub fn feature_importances(&self) -> &[f32] {
        &self.feature_importances
    }

    fn validate(&self) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(LandfallError::invalid_hyperparameter(
                "min_samples_split",
                self.min_samples_split,
                "min_samples_split >= 2",
            ));
        }
        if self.min_samples_leaf < 1 {
            return Err(LandfallError::invalid_hyperparameter(
                "min_samples_leaf",
                self.min_samples_leaf,
                "min_samples_leaf >= 1",
            ));
        }
        if self.max_depth == Some(0) {
            return Err(LandfallError::invalid_hyperparameter(
                "max_depth",
                0,
                "max_depth >= 1",
            ));
        }
        Ok(())
    }

    fn predict_one(tree: &TreeNode, x: &[f32]) -> usize {
        let mut node = tree;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf.class_label,
                TreeNode::Node(internal) => {
                    node = if x[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }
}

/// State shared by one recursive build.
struct TreeBuilder<'a> {
    x: &'a Matrix<f32>,
    y: &'a [usize],
    rules: SplitRules,
    splitter: Splitter,
    n_candidates: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    rng: StdRng,
    importances: Vec<f64>,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let counts = class_counts(self.y, &indices, self.rules.n_classes);
        let node_impurity = impurity(self.rules.criterion, &counts);
        let leaf = || {
            TreeNode::Leaf(Leaf {
                class_label: majority_class(&counts),
                n_samples,
            })
        };

        if node_impurity <= 0.0
            || self.max_depth.is_some_and(|max| depth >= max)
            || n_samples < self.min_samples_split
            || n_samples < 2 * self.rules.min_samples_leaf
        {
            return leaf();
        }

        let Some(split) = self.find_split(&indices) else {
            return leaf();
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x.get(i, split.feature) <= split.threshold);
        self.importances[split.feature] +=
            n_samples as f64 * (node_impurity - split.weighted_impurity);

        TreeNode::Node(Node {
            feature_idx: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        })
    }

    /// Lowest weighted child impurity over the sampled features; ties keep
    /// the feature drawn first.
    fn find_split(&mut self, indices: &[usize]) -> Option<Split> {
        let mut features: Vec<usize> = (0..self.x.n_cols()).collect();
        if self.n_candidates < features.len() {
            features.shuffle(&mut self.rng);
            features.truncate(self.n_candidates);
        }

        let mut best: Option<Split> = None;
        for feature in features {
            let candidate = match self.splitter {
                Splitter::Best => best_split_for_feature(self.x, self.y, indices, feature, &self.rules),
                Splitter::Random => random_split_for_feature(
                    self.x,
                    self.y,
                    indices,
                    feature,
                    &self.rules,
                    &mut self.rng,
                ),
            };
            if let Some(candidate) = candidate {
                if best.map_or(true, |b| candidate.weighted_impurity < b.weighted_impurity) {
                    best = Some(candidate);
                }
            }
        }
        best
    }
}

impl Classifier for DecisionTreeClassifier {
    /// Grows the tree on the training data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` for `min_samples_split < 2`,
    /// `min_samples_leaf < 1`, or `max_depth = 0`.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        check_fit_inputs(x, y)?;
        self.validate()?;

        let n_features = x.n_cols();
        let n_classes = y.iter().max().map_or(1, |&m| m + 1);
        let mut builder = TreeBuilder {
            x,
            y,
            rules: SplitRules {
                criterion: self.criterion,
                min_samples_leaf: self.min_samples_leaf,
                n_classes,
            },
            splitter: self.splitter,
            n_candidates: self.max_features.count(n_features),
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            rng: StdRng::seed_from_u64(self.random_state),
            importances: vec![0.0; n_features],
        };
        let tree = builder.build((0..x.n_rows()).collect(), 0);

        let total: f64 = builder.importances.iter().sum();
        self.feature_importances = builder
            .importances
            .iter()
            .map(|&v| if total > 0.0 { (v / total) as f32 } else { 0.0 })
            .collect();
        debug!(
            criterion = %self.criterion,
            splitter = %self.splitter,
            depth = tree.depth(),
            leaves = tree.n_leaves(),
            "decision tree fitted"
        );
        self.tree = Some(tree);
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        let tree = self
            .tree
            .as_ref()
            .ok_or(LandfallError::NotFitted("DecisionTreeClassifier"))?;
        if x.n_cols() != self.n_features {
            return Err(LandfallError::dimension_mismatch(
                "n_features",
                self.n_features,
                x.n_cols(),
            ));
        }
        Ok((0..x.n_rows())
            .map(|row| Self::predict_one(tree, x.row_slice(row)))
            .collect())
    }
}
