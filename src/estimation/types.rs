//! estimation::types — numeric aliases and L-BFGS solver wiring.
//!
//! All vectors are `ndarray` containers over `f64`; `Cost` is the scaled
//! negative log-likelihood minimized by the solver. The solver aliases pin
//! the `(Theta, Grad, Cost)` triple so builders and the runner never spell
//! out argmin generics.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Flat model parameter vector `[means | variance | distribution]`.
pub type Theta = Array1<f64>;

/// Gradient with the same layout as [`Theta`].
pub type Grad = Array1<f64>;

/// Objective value seen by the solver, `−LLH(θ)/n`.
pub type Cost = f64;

/// Function-evaluation counters reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
