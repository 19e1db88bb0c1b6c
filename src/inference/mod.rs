//! inference — information matrices, covariance and standard errors for
//! fitted RegArch models.
//!
//! Purpose
//! -------
//! Quantify the sampling uncertainty of `θ̂` once a model has been fitted,
//! using the analytic per-date scores and the analytic Hessian of the
//! log-likelihood.
//!
//! Key behaviors
//! -------------
//! - [`compute_i`] / [`compute_i_and_j`] build the outer-product-of-gradients
//!   information `I` and the observed information `J`, both on the average
//!   log-likelihood scale.
//! - [`compute_cov`] returns the classical (`J⁻¹/n`) or sandwich
//!   (`J⁻¹ I J⁻¹ / n`) covariance, selected by [`CovarianceKind`].
//! - [`standard_errors`] takes square roots of the covariance diagonal.
//! - [`stat_table`] labels each parameter with its estimate, standard error,
//!   t-stat and two-sided normal p-value.
//!
//! Invariants & assumptions
//! ------------------------
//! - The inverse is an eigenvalue-truncated pseudo-inverse
//!   ([`pseudo_inverse`]); no explicit matrix inverse is formed.
//! - Results are meaningful at (or near) a maximum of the likelihood; the
//!   routines do not check that `θ̂` is one.
//!
//! Conventions
//! -----------
//! - Errors are [`InferenceError`] / [`InferenceResult`]; model errors are
//!   wrapped as [`InferenceError::Model`].
//! - No logging and no global state.
//!
//! Testing notes
//! -------------
//! - Unit tests check the pseudo-inverse and the closed-form Gaussian
//!   location/scale information; the integration test runs the whole
//!   simulate → fit → covariance pipeline.

pub mod covariance;
pub mod errors;
pub mod stat_table;

pub use self::covariance::{
    CovarianceKind, EIGEN_EPS, compute_cov, compute_i, compute_i_and_j, cov_from_information,
    pseudo_inverse, standard_errors,
};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::stat_table::{StatTable, stat_table, two_sided_p_value};
