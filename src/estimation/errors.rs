//! Errors for maximum-likelihood estimation of RegArch models.
//!
//! [`EstimError`] covers option validation, non-finite objective values,
//! gradient checks, solver results and wrapped `argmin` failures. Model-level
//! failures raised while evaluating the likelihood are carried as
//! [`EstimError::Model`] so callers can still match on the original
//! [`RegArchError`].
use argmin::core::{ArgminError, Error};

use crate::regarch::errors::RegArchError;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for estimation routines.
pub type EstimResult<T> = Result<T, EstimError>;

#[derive(Debug, Clone, PartialEq)]
pub enum EstimError {
    // ---- Options ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad { tol: f64, reason: &'static str },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost { tol: f64, reason: &'static str },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    /// At least one stopping rule must be provided.
    NoTolerancesProvided,
    /// Unknown line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },
    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Objective ----
    /// Starting parameters must be finite.
    InvalidStartingPoint { index: usize, value: f64 },
    /// Log-likelihood evaluated to a non-finite value.
    NonFiniteCost { value: f64 },
    /// Gradient length does not match the parameter vector.
    GradientDimMismatch { expected: usize, found: usize },
    /// Gradient entries must be finite.
    InvalidGradient { index: usize, value: f64 },

    // ---- Outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat { index: usize, value: f64 },
    /// Solver returned no parameter vector.
    MissingThetaHat,

    // ---- Model ----
    /// Error raised by the model while evaluating the likelihood.
    Model(RegArchError),

    // ---- Argmin ----
    InvalidParameter { text: String },
    NotImplemented { text: String },
    NotInitialized { text: String },
    ConditionViolated { text: String },
    CheckPointNotFound { text: String },
    PotentialBug { text: String },
    ImpossibleError { text: String },
    /// Any other error surfaced by the solver backend.
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for EstimError {}

impl std::fmt::Display for EstimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Options ----
            EstimError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            EstimError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost change tolerance {tol}: {reason}")
            }
            EstimError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            EstimError::NoTolerancesProvided => write!(f, "No tolerances provided"),
            EstimError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            EstimError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Objective ----
            EstimError::InvalidStartingPoint { index, value } => {
                write!(f, "Invalid starting parameter at index {index}: {value}, must be finite")
            }
            EstimError::NonFiniteCost { value } => {
                write!(f, "Non-finite log-likelihood value: {value}")
            }
            EstimError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            EstimError::InvalidGradient { index, value } => {
                write!(f, "Invalid gradient at index {index}: {value}, must be finite")
            }

            // ---- Outcome ----
            EstimError::InvalidThetaHat { index, value } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}, must be finite")
            }
            EstimError::MissingThetaHat => write!(f, "Missing estimated parameters (theta hat)"),

            // ---- Model ----
            EstimError::Model(err) => write!(f, "Model error: {err}"),

            // ---- Argmin ----
            EstimError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            EstimError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            EstimError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            EstimError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            EstimError::CheckPointNotFound { text } => write!(f, "Checkpoint not found: {text}"),
            EstimError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            EstimError::ImpossibleError { text } => write!(f, "Impossible error: {text}"),
            EstimError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Fallback ----
            EstimError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<RegArchError> for EstimError {
    fn from(err: RegArchError) -> Self {
        EstimError::Model(err)
    }
}

/// Errors raised inside the objective travel through `argmin` boxed; they are
/// recovered here before falling back to argmin's own error kinds.
impl From<Error> for EstimError {
    fn from(original_err: Error) -> Self {
        let err = match original_err.downcast::<EstimError>() {
            Ok(estim_err) => return estim_err,
            Err(err) => err,
        };
        let err = match err.downcast::<RegArchError>() {
            Ok(model_err) => return EstimError::Model(model_err),
            Err(err) => err,
        };
        match err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => EstimError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => EstimError::NotImplemented { text },
                ArgminError::NotInitialized { text } => EstimError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => EstimError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => {
                    EstimError::CheckPointNotFound { text }
                }
                ArgminError::PotentialBug { text } => EstimError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => EstimError::ImpossibleError { text },
                _ => EstimError::UnknownError,
            },
            Err(err) => EstimError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<EstimError> for PyErr {
    fn from(err: EstimError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
