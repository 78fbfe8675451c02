//! Hyperparameter grids.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LandfallError, Result};

/// A single hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer-valued parameter (neighbor counts, depths)
    Int(i64),
    /// Real-valued parameter (regularization strengths, kernel widths)
    Float(f64),
    /// Named option (kernels, criteria, solvers)
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One point of a [`ParamGrid`]: a value for every parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, ParamValue>);

impl ParamSet {
    /// Empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a value.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    /// Raw value lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Iterates `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require(&self, name: &str) -> Result<&ParamValue> {
        self.0
            .get(name)
            .ok_or_else(|| LandfallError::invalid_hyperparameter(name, "<missing>", "a value"))
    }

    /// Real-valued parameter; integers are widened.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if missing or textual.
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(LandfallError::invalid_hyperparameter(
                name,
                other,
                "a number",
            )),
        }
    }

    /// Non-negative integer parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if missing, negative, or not an integer.
    pub fn get_usize(&self, name: &str) -> Result<usize> {
        match self.require(name)? {
            ParamValue::Int(v) => usize::try_from(*v).map_err(|_| {
                LandfallError::invalid_hyperparameter(name, v, "a non-negative integer")
            }),
            other => Err(LandfallError::invalid_hyperparameter(
                name,
                other,
                "a non-negative integer",
            )),
        }
    }

    /// Named-option parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if missing or not text.
    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            ParamValue::Text(v) => Ok(v),
            other => Err(LandfallError::invalid_hyperparameter(name, other, "a name")),
        }
    }
}

impl fmt::Display for ParamSet {
    /// Renders as `{'C': 0.1, 'penalty': 'l2'}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{name}': {value}")?;
        }
        write!(f, "}}")
    }
}

/// Named lists of candidate values whose Cartesian product is searched.
///
/// Parameter names iterate in lexicographic order and the last name varies
/// fastest. Duplicate values inside a list are kept, so a duplicated value
/// is evaluated twice.
///
/// # Example
///
/// ```
/// use landfall::model_selection::ParamGrid;
///
/// let grid = ParamGrid::new()
///     .add("kernel", ["linear", "rbf"])
///     .add("C", [0.1, 1.0]);
/// assert_eq!(grid.len(), 4);
///
/// let points = grid.points();
/// assert_eq!(points[0].to_string(), "{'C': 0.1, 'kernel': 'linear'}");
/// assert_eq!(points[1].to_string(), "{'C': 0.1, 'kernel': 'rbf'}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamGrid(BTreeMap<String, Vec<ParamValue>>);

impl ParamGrid {
    /// Empty grid (a single point with no parameters).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the candidate values for `name`.
    #[must_use]
    pub fn add<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        self.0
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Candidate values for `name`.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Number of grid points (0 if any list is empty).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    /// True when the grid has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every grid point in search order.
    #[must_use]
    pub fn points(&self) -> Vec<ParamSet> {
        let total = self.len();
        let mut points = Vec::with_capacity(total);
        for mut flat in 0..total {
            let mut set = BTreeMap::new();
            // Mixed-radix decode with the last name as the least significant digit.
            for (name, values) in self.0.iter().rev() {
                let idx = flat % values.len();
                flat /= values.len();
                set.insert(name.clone(), values[idx].clone());
            }
            points.push(ParamSet(set));
        }
        points
    }
}
