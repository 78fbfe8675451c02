//! Evaluation metrics for classifiers.
//!
//! Accuracy drives hyperparameter selection and the leaderboard ranking;
//! confusion counts are carried alongside for diagnostic reporting.

pub mod classification;

pub use classification::{accuracy, confusion_matrix, ConfusionCounts};
