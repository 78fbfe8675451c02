//! Classification algorithms.
//!
//! This module implements the classifier families searched by the model
//! selector:
//! - Logistic Regression for binary classification
//! - Support Vector Classification with linear, polynomial, RBF and sigmoid
//!   kernels
//! - K-Nearest Neighbors (kNN) backed by exact k-d tree, ball tree or
//!   brute-force indexes
//!
//! Decision trees live in [`crate::tree`].
//!
//! # Example
//!
//! ```
//! use landfall::classification::LogisticRegression;
//! use landfall::prelude::*;
//!
//! // Binary classification data
//! let x = Matrix::from_vec(4, 2, vec![
//!     0.0, 0.0,
//!     0.0, 1.0,
//!     1.0, 0.0,
//!     1.0, 1.0,
//! ]).expect("Matrix dimensions match data length");
//! let y = vec![0, 0, 0, 1];
//!
//! let mut model = LogisticRegression::new().with_c(10.0);
//! model.fit(&x, &y).expect("Training data is valid with 4 samples");
//! let predictions = model.predict(&x).expect("model is fitted");
//!
//! assert_eq!(predictions.len(), 4);
//! for pred in predictions {
//!     assert!(pred == 0 || pred == 1);
//! }
//! ```

mod knn;
mod logistic;
pub mod neighbors;
mod svm;

pub use knn::{KNearestNeighbors, NeighborAlgorithm};
pub use logistic::{LogisticRegression, Penalty, Solver};
pub use svm::{Kernel, SVC};
