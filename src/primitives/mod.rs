//! Core compute primitives (Vector, Matrix).
//!
//! Every estimator in the crate consumes these types; features live in a
//! row-major [`Matrix<f32>`] and labels in plain `usize` slices.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;
