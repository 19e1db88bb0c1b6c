//! models — the model aggregate and the drivers that run it over a sample.
//!
//! Purpose
//! -------
//! Bind mean components, one variance component and one residual law into a
//! [`RegArchModel`], and walk a [`RegArchValue`](crate::regarch::RegArchValue)
//! through it: filtering, log-likelihood, analytic gradient and Hessian
//! (per date and whole sample), score matrices, finite-difference
//! counterparts and simulation.
//!
//! Key behaviors
//! -------------
//! - [`model`] owns the components, the flat parameter layout
//!   `[means | variance | distribution]` and window/data validation.
//! - [`compute`] holds the filtering and derivative drivers.
//! - [`numeric`] recomputes the same derivatives by central differences.
//! - [`simulate`](mod@simulate) draws paths from a fully specified model.
//!
//! Downstream usage
//! ----------------
//! - `crate::estimation` maximizes [`llh`] using [`llh_and_grad_llh`].
//! - `crate::inference` builds information matrices from
//!   [`calculate_scores`] and [`hess_llh`].

pub mod compute;
pub mod model;
pub mod numeric;
pub mod simulate;

pub use self::compute::{
    calculate_scores, compute_date, compute_lt, fill_value, grad_and_hess_lt, grad_llh, grad_lt,
    hess_llh, hess_lt, llh, llh_and_grad_llh, llh_grad_and_hess, lt_and_grad_lt,
};
pub use self::model::RegArchModel;
pub use self::numeric::{numeric_grad_llh, numeric_grad_lt, numeric_hess_llh, numeric_hess_lt};
pub use self::simulate::{simulate, simulate_with_regressors};
