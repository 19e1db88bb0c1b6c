//! Errors for RegArch models (shape checks, parameter access, component
//! management, and derivative-window sizing).
//!
//! This module defines the model error type, [`RegArchError`], used by every
//! component family, the rolling derivative windows and the model drivers.
//! It implements `Display`/`Error` and converts to `PyErr` when the
//! `python-bindings` feature is enabled.
//!
//! ## Conventions
//! - **Dates and indices are 0-based**.
//! - Shape mismatches are reported at the call that detects them and are not
//!   recoverable by the engine; the caller rebuilds with consistent sizes.
//! - Domain violations (non-positive variance, out-of-range distribution
//!   parameters) are **not** errors: non-finite values simply propagate.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Crate-wide result alias for RegArch operations that may produce [`RegArchError`].
pub type RegArchResult<T> = Result<T, RegArchError>;

/// Unified error type for RegArch modeling.
#[derive(Debug, Clone, PartialEq)]
pub enum RegArchError {
    // ---- Value store ----
    /// Series is empty.
    EmptySeries,

    /// Requested date lies outside the filled sample.
    DateOutOfRange { date: usize, len: usize },

    /// A component needs regressors that the value store does not carry.
    MissingRegressors { component: &'static str },

    /// Regressor matrix does not match the sample size or the expected width.
    RegressorShapeMismatch { expected: (usize, usize), actual: (usize, usize) },

    // ---- Parameters ----
    /// Parameter vector has the wrong length for the target slice.
    ParamLengthMismatch { expected: usize, actual: usize },

    /// Parameter block number is not defined for this component.
    BlockIndexOutOfRange { block: usize, n_blocks: usize },

    /// Index inside a parameter block is out of range.
    ParamIndexOutOfRange { index: usize, len: usize },

    /// No parameter block answers to this name.
    UnknownParamName { name: String },

    /// Component order is not valid (e.g. a negative-size request or a
    /// fixed-size block being resized).
    InvalidOrder { order: usize, reason: &'static str },

    // ---- Model management ----
    /// Component tag could not be parsed.
    UnknownComponent { name: String, reason: &'static str },

    /// Mean component of this kind is already present.
    DuplicateMean { kind: String },

    /// Mean component of this kind is not present.
    MeanNotFound { kind: String },

    // ---- Derivative windows ----
    /// Window depth is shorter than the lag order the model needs.
    WindowTooShort { required: usize, actual: usize },

    /// Window block sizes do not match the model's parameter blocks.
    GradientShapeMismatch { expected: (usize, usize, usize), actual: (usize, usize, usize) },

    /// Finite-difference step must be finite and > 0.
    InvalidStep { value: f64 },
}

impl std::error::Error for RegArchError {}

impl std::fmt::Display for RegArchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Value store ----
            RegArchError::EmptySeries => {
                write!(f, "Input series is empty.")
            }
            RegArchError::DateOutOfRange { date, len } => {
                write!(f, "Date {date} is outside the sample of length {len}.")
            }
            RegArchError::MissingRegressors { component } => {
                write!(f, "Component {component} requires regressors but none were provided.")
            }
            RegArchError::RegressorShapeMismatch { expected, actual } => {
                write!(f, "Regressor matrix shape mismatch: expected {expected:?}, got {actual:?}")
            }
            // ---- Parameters ----
            RegArchError::ParamLengthMismatch { expected, actual } => {
                write!(f, "Parameter length mismatch: expected {expected}, got {actual}")
            }
            RegArchError::BlockIndexOutOfRange { block, n_blocks } => {
                write!(f, "Parameter block {block} out of range (component has {n_blocks} blocks)")
            }
            RegArchError::ParamIndexOutOfRange { index, len } => {
                write!(f, "Parameter index {index} out of range for block of length {len}")
            }
            RegArchError::UnknownParamName { name } => {
                write!(f, "Unknown parameter name '{name}'")
            }
            RegArchError::InvalidOrder { order, reason } => {
                write!(f, "Invalid component order {order}: {reason}")
            }
            // ---- Model management ----
            RegArchError::UnknownComponent { name, reason } => {
                write!(f, "Unknown component '{name}': {reason}")
            }
            RegArchError::DuplicateMean { kind } => {
                write!(f, "Mean component {kind} is already part of the model")
            }
            RegArchError::MeanNotFound { kind } => {
                write!(f, "Mean component {kind} is not part of the model")
            }
            // ---- Derivative windows ----
            RegArchError::WindowTooShort { required, actual } => {
                write!(
                    f,
                    "Derivative window holds {actual} past dates but the model needs {required}"
                )
            }
            RegArchError::GradientShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Derivative window blocks (mean, var, distr) mismatch: expected {expected:?}, got {actual:?}"
                )
            }
            RegArchError::InvalidStep { value } => {
                write!(f, "Finite-difference step must be finite and > 0; got: {value}")
            }
        }
    }
}

/// Convert a [`RegArchError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<RegArchError> for PyErr {
    fn from(err: RegArchError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
