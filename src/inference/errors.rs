//! Error handling for post-estimation inference.
//!
//! [`InferenceError`] groups failures of the information-matrix and
//! covariance routines; errors raised by the model while computing scores or
//! Hessians are wrapped as [`InferenceError::Model`].
use crate::regarch::errors::RegArchError;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Information matrices ----
    /// Information matrix contains a non-finite entry.
    NonFiniteInformation { row: usize, col: usize, value: f64 },

    /// No eigenvalue of the information matrix exceeds the tolerance.
    SingularInformation { max_eigenvalue: f64 },

    // ---- Options ----
    /// Unknown covariance estimator name.
    InvalidCovarianceKind { name: String, reason: &'static str },

    // ---- Model ----
    Model(RegArchError),
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Information matrices ----
            InferenceError::NonFiniteInformation { row, col, value } => {
                write!(f, "Inference Error: non-finite information at ({row}, {col}): {value}")
            }
            InferenceError::SingularInformation { max_eigenvalue } => write!(
                f,
                "Inference Error: information matrix is singular (largest eigenvalue {max_eigenvalue})"
            ),

            // ---- Options ----
            InferenceError::InvalidCovarianceKind { name, reason } => {
                write!(f, "Inference Error: invalid covariance kind '{name}': {reason}")
            }

            // ---- Model ----
            InferenceError::Model(err) => write!(f, "Inference Error: {err}"),
        }
    }
}

impl From<RegArchError> for InferenceError {
    fn from(err: RegArchError) -> Self {
        InferenceError::Model(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<InferenceError> for PyErr {
    fn from(err: InferenceError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
