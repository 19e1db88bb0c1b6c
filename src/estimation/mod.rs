//! estimation — maximum-likelihood fitting of RegArch models with argmin.
//!
//! Purpose
//! -------
//! Maximize the log-likelihood of a [`RegArchModel`](crate::regarch::RegArchModel)
//! over its full parameter vector with L-BFGS, using the analytic gradient
//! from the model drivers.
//!
//! Key behaviors
//! -------------
//! - [`adapter::RegArchProblem`] exposes `c(θ) = −LLH(θ)/n` and its gradient
//!   to argmin; each evaluation works on clones, so the caller's model and data
//!   are only touched once the fit succeeds.
//! - [`builders`] construct L-BFGS with a Hager–Zhang or More–Thuente line
//!   search and apply tolerances; [`api::run_lbfgs`] configures the executor
//!   (start, iteration cap, optional slog observer) and normalizes the result
//!   into an [`OptimOutcome`].
//! - [`fit`] loads `θ̂` back into the model.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are unconstrained from the solver's point of view; a point
//!   where the likelihood is not finite aborts the run with
//!   [`EstimError::NonFiniteCost`]. Start from a valid point, e.g. via
//!   [`fit_from_default_init`].
//! - Reported values (`OptimOutcome::value`, `grad_norm`) are on the
//!   whole-sample log-likelihood scale; tolerances act on the averaged scale.
//!
//! Conventions
//! -----------
//! - Errors are [`EstimError`]; model failures are wrapped as
//!   [`EstimError::Model`].
//! - Progress logging is available behind the `obs_slog` feature with
//!   `MLEOptions::verbose = true`.
//!
//! Testing notes
//! -------------
//! - Option validation, error recovery through argmin, adapter sign/scale
//!   conventions and end-to-end fits with known optima are unit-tested here;
//!   the integration test fits a simulated GARCH model.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod errors;
pub mod options;
pub mod outcome;
pub mod types;

pub use self::adapter::RegArchProblem;
pub use self::api::{fit, fit_from_default_init};
pub use self::errors::{EstimError, EstimResult};
pub use self::options::{LineSearcher, MLEOptions, Tolerances};
pub use self::outcome::OptimOutcome;
pub use self::types::{DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};
