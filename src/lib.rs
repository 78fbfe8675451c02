//! Landfall: cross-validated model selection for first-stage landing outcomes.
//!
//! Landfall takes a labeled launch dataset (numeric features, label `1` for
//! a landed booster and `0` otherwise), standardizes it, holds out a seeded
//! test partition, grid-searches four classifier families with k-fold
//! cross-validation, and ranks the families by held-out accuracy.
//!
//! # Quick Start
//!
//! ```
//! use landfall::prelude::*;
//!
//! let dataset = Dataset::synthetic_binary(40, 4, 2).unwrap();
//! let config = SelectionConfig::new()
//!     .with_families(vec![ClassifierFamily::LogisticRegression, ClassifierFamily::Knn]);
//!
//! let report = ModelSelector::new(config).run(&dataset).unwrap();
//! let best = report.best().unwrap();
//! assert!((0.0..=1.0).contains(&best.test_accuracy));
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`data`]: Validated launch datasets
//! - [`preprocessing`]: Feature standardization
//! - [`model_selection`]: Train/test splitting, k-fold cross-validation, grid search
//! - [`classification`]: Logistic regression, SVM and k-nearest neighbors
//! - [`tree`]: CART decision trees
//! - [`optim`]: L-BFGS and FISTA used by logistic regression
//! - [`metrics`]: Accuracy and confusion counts
//! - [`selection`]: Classifier families, leaderboard and the selection pipeline
//! - [`config`]: Run configuration

pub mod classification;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model_selection;
pub mod optim;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod selection;
pub mod traits;
pub mod tree;

pub use config::SelectionConfig;
pub use error::{LandfallError, Result};
pub use primitives::{Matrix, Vector};
pub use selection::{Leaderboard, ModelSelector, SelectionReport};
pub use traits::{Classifier, Transformer};
