//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use landfall::prelude::*;
//! ```

pub use crate::config::{ScalingMode, SelectionConfig};
pub use crate::data::Dataset;
pub use crate::primitives::{Matrix, Vector};
pub use crate::selection::{ClassifierFamily, Leaderboard, ModelSelector, SelectionReport};
pub use crate::traits::{Classifier, Transformer};
