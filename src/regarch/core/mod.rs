//! core — shared RegArch data, parameter storage and derivative windows.
//!
//! Purpose
//! -------
//! Collect the building blocks every component family relies on: the
//! per-date value store, named parameter blocks, the rolling first- and
//! second-derivative windows, truncated fractional polynomials, and a few
//! numeric helpers (outer-product updates, trigamma).
//!
//! Key behaviors
//! -------------
//! - [`RegArchValue`] owns `Y, M, H, U, Eps` (plus optional regressors) and
//!   reads lags as 0 before the sample start.
//! - [`ParamBlocks`] gives each component indexed and named access to its
//!   parameter slice and the flat-vector round trip.
//! - [`GradientState`] / [`HessianState`] hold `N + 1` slots in a circular
//!   buffer advanced once per date.
//!
//! Invariants & assumptions
//! ------------------------
//! - The model-wide parameter vector is laid out as
//!   `[mean components in insertion order | variance | distribution]`.
//! - Windows are sized for that full vector; a component only writes the
//!   entries of its own slice but reads the whole lagged vectors.
//!
//! Conventions
//! -----------
//! - Dates are 0-based; terms that reference dates before 0 are dropped.
//! - No I/O and no logging happen here.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its own contract; the full
//!   chain-rule behavior of the windows is tested against finite
//!   differences at the model level.
pub mod gradient;
pub mod hessian;
pub mod linalg;
pub mod params;
pub mod polynomial;
pub mod special;
pub mod value;

pub use self::gradient::GradientState;
pub use self::hessian::HessianState;
pub use self::params::ParamBlocks;
pub use self::polynomial::{ArFracPoly, ArFracPolyCache, DEFAULT_TRUNCATION_LAG, FracDiffCoeffs};
pub use self::value::RegArchValue;
