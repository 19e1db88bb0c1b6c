//! regarch — conditionally heteroskedastic regression models with exact
//! rolling-window derivatives.
//!
//! Purpose
//! -------
//! Compose a model from pluggable conditional-mean components, a single
//! conditional-variance component and a residual distribution, filter a series
//! through it, and evaluate the log-likelihood together with its analytic
//! gradient and Hessian with respect to every parameter.
//!
//! Key behaviors
//! -------------
//! - [`core`] carries the value store, parameter blocks, fractional
//!   polynomials and the rolling [`GradientState`] / [`HessianState`] windows
//!   that chain derivatives through recursive filters in bounded memory.
//! - [`mean`], [`variance`] and [`residuals`] hold the closed component
//!   families ([`CondMean`], [`CondVar`], [`Residuals`]).
//! - [`models`] binds them into a [`RegArchModel`] and provides the filtering,
//!   likelihood, derivative, numeric cross-check and simulation drivers.
//!
//! Invariants & assumptions
//! ------------------------
//! - The model parameter vector is laid out as
//!   `[mean components in insertion order | variance | distribution]`.
//! - Dates are processed strictly in increasing order; for each date the
//!   variance is computed before the means so in-mean terms see `H_t`.
//! - Parameters are never clamped; out-of-domain values propagate as
//!   non-finite results.
//!
//! Conventions
//! -----------
//! - Terms referencing dates before the sample start are dropped.
//! - Errors surface as [`RegArchError`] / [`RegArchResult`].
//!
//! Downstream usage
//! ----------------
//! - Build components, bind them with [`RegArchModel::new`] /
//!   [`RegArchModel::add_mean`], wrap data in [`RegArchValue::from_data`],
//!   then call [`models::llh`] or [`models::llh_grad_and_hess`].
//! - `crate::estimation` and `crate::inference` sit on top of this module.
//!
//! Testing notes
//! -------------
//! - Each component family tests its values and hand-computed derivative
//!   entries; `models` checks analytic derivatives of full models against
//!   finite differences.

pub mod core;
pub mod errors;
pub mod mean;
pub mod models;
pub mod residuals;
pub mod variance;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    ArFracPoly, DEFAULT_TRUNCATION_LAG, GradientState, HessianState, ParamBlocks, RegArchValue,
};

pub use self::errors::{RegArchError, RegArchResult};

pub use self::mean::{CondMean, CondMeanComponent, MeanKind};

pub use self::models::RegArchModel;

pub use self::residuals::{DistrKind, ResidualDistribution, Residuals};

pub use self::variance::{CondVar, CondVarComponent, VarKind};

// ---- Optional convenience prelude -----------------------------------------
//
//     use rust_regarch::regarch::prelude::*;

pub mod prelude {
    pub use super::mean::{Ar, Arfima, ConstMean, LinReg, Ma, StdDevInMean, VarInMean};
    pub use super::models::{
        fill_value, grad_llh, hess_llh, llh, llh_and_grad_llh, llh_grad_and_hess, simulate,
    };
    pub use super::residuals::{Ged, MixNorm, Normal, Student};
    pub use super::variance::{
        Aparch, Arch, ConstVar, Egarch, Figarch, Garch, Gtarch, Nagarch, Ngarch, Sqrgarch, Tarch,
        Tsgarch, Ugarch,
    };
    pub use super::{
        CondMean, CondVar, DistrKind, GradientState, HessianState, MeanKind, RegArchError,
        RegArchModel, RegArchResult, RegArchValue, Residuals, VarKind,
    };
}
