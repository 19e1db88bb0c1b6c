//! variance — conditional variance components (exactly one per model).
//!
//! Purpose
//! -------
//! Provide the recursive filters producing `H_t` from lagged residuals and
//! lagged variances, together with exact first and second derivatives with
//! respect to the whole parameter vector.
//!
//! Key behaviors
//! -------------
//! - [`CondVar`] is a closed enum over the supported families; every call is
//!   an exhaustive `match` through [`CondVar::inner`].
//! - `compute_grad` / `compute_hess` **set** the current variance slot.
//!   Mean parameters enter through `∂U_{t−i} = −∂M_{t−i}`, distribution
//!   parameters through `∂Eps_{t−i}` and `E|ε|` (EGARCH).
//! - Recursions on their own lags (GARCH-type β terms) read `∂H_{t−j}` and
//!   `∂²H_{t−j}` from the trailing window.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are not clamped. Values outside the positivity/stationarity
//!   region produce non-positive or non-finite variances that propagate.
//! - The derivative window must hold at least [`CondVarComponent::n_lags`]
//!   past dates; model drivers check this before a pass.
//!
//! Conventions
//! -----------
//! - `offset` is the position of the variance block in the model vector
//!   (the total number of mean parameters).
//! - Terms referencing dates before 0 are dropped.
use crate::regarch::{
    core::{
        GradientState, HessianState, ParamBlocks, RegArchValue,
        linalg::{add_outer, add_sym_unit},
    },
    errors::{RegArchError, RegArchResult},
    residuals::Residuals,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::{fmt, str::FromStr};

pub mod aparch;
pub mod arch;
pub mod constant;
pub mod egarch;
pub mod figarch;
pub mod garch;
pub mod gtarch;
pub mod nagarch;
pub mod ngarch;
pub mod sqrgarch;
pub mod tarch;
pub mod tsgarch;
pub mod ugarch;

pub use self::aparch::Aparch;
pub use self::arch::Arch;
pub use self::constant::ConstVar;
pub use self::egarch::Egarch;
pub use self::figarch::Figarch;
pub use self::garch::Garch;
pub use self::gtarch::Gtarch;
pub use self::nagarch::Nagarch;
pub use self::ngarch::Ngarch;
pub use self::sqrgarch::Sqrgarch;
pub use self::tarch::Tarch;
pub use self::tsgarch::Tsgarch;
pub use self::ugarch::Ugarch;

/// Shared contract of a conditional variance component.
pub trait CondVarComponent {
    fn params(&self) -> &ParamBlocks;

    fn params_mut(&mut self) -> &mut ParamBlocks;

    fn n_param(&self) -> usize {
        self.params().n_param()
    }

    /// Largest lag the recursion reads (residuals or its own past values).
    fn n_lags(&self) -> usize;

    /// `H_t`. Reads dates `< t` only.
    fn compute_var(&self, date: usize, data: &RegArchValue, distr: &Residuals) -> f64;

    /// Set the current variance-gradient slot to `∂H_t/∂θ`.
    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        distr: &Residuals,
    );

    /// Set the current variance-Hessian slot to `∂²H_t/∂θ∂θᵀ`. The current
    /// gradient slot must already hold `∂H_t`.
    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, distr: &Residuals,
    );

    fn set_default_init_point(&mut self, mean: f64, var: f64);

    /// Reject value stores the component cannot read.
    fn check_data(&self, _data: &RegArchValue) -> RegArchResult<()> {
        Ok(())
    }

    /// Resize data-driven blocks (regressor coefficients) to `data`.
    fn sync_size_param(&mut self, _data: &RegArchValue) -> RegArchResult<()> {
        Ok(())
    }
}

/// Tag for a variance component, parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Const,
    Arch,
    Garch,
    Egarch,
    Aparch,
    Tarch,
    Figarch,
    Nagarch,
    Tsgarch,
    Ugarch,
    Ngarch,
    Gtarch,
    Sqrgarch,
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarKind::Const => "Const",
            VarKind::Arch => "Arch",
            VarKind::Garch => "Garch",
            VarKind::Egarch => "Egarch",
            VarKind::Aparch => "Aparch",
            VarKind::Tarch => "Tarch",
            VarKind::Figarch => "Figarch",
            VarKind::Nagarch => "Nagarch",
            VarKind::Tsgarch => "Tsgarch",
            VarKind::Ugarch => "Ugarch",
            VarKind::Ngarch => "Ngarch",
            VarKind::Gtarch => "Gtarch",
            VarKind::Sqrgarch => "Sqrgarch",
        };
        f.write_str(name)
    }
}

impl FromStr for VarKind {
    type Err = RegArchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "const" | "constant" | "constvar" => Ok(VarKind::Const),
            "arch" => Ok(VarKind::Arch),
            "garch" => Ok(VarKind::Garch),
            "egarch" => Ok(VarKind::Egarch),
            "aparch" => Ok(VarKind::Aparch),
            "tarch" => Ok(VarKind::Tarch),
            "figarch" => Ok(VarKind::Figarch),
            "nagarch" => Ok(VarKind::Nagarch),
            "tsgarch" => Ok(VarKind::Tsgarch),
            "ugarch" => Ok(VarKind::Ugarch),
            "ngarch" => Ok(VarKind::Ngarch),
            "gtarch" => Ok(VarKind::Gtarch),
            "sqrgarch" => Ok(VarKind::Sqrgarch),
            _ => Err(RegArchError::UnknownComponent {
                name: s.to_string(),
                reason: "expected one of Const, Arch, Garch, Egarch, Aparch, Tarch, Figarch, \
                         Nagarch, Tsgarch, Ugarch, Ngarch, Gtarch, Sqrgarch",
            }),
        }
    }
}

/// Closed set of variance components.
#[derive(Debug, Clone, PartialEq)]
pub enum CondVar {
    Const(ConstVar),
    Arch(Arch),
    Garch(Garch),
    Egarch(Egarch),
    Aparch(Aparch),
    Tarch(Tarch),
    Figarch(Figarch),
    Nagarch(Nagarch),
    Tsgarch(Tsgarch),
    Ugarch(Ugarch),
    Ngarch(Ngarch),
    Gtarch(Gtarch),
    Sqrgarch(Sqrgarch),
}

impl Default for CondVar {
    fn default() -> Self {
        CondVar::Const(ConstVar::default())
    }
}

impl CondVar {
    pub fn kind(&self) -> VarKind {
        match self {
            CondVar::Const(_) => VarKind::Const,
            CondVar::Arch(_) => VarKind::Arch,
            CondVar::Garch(_) => VarKind::Garch,
            CondVar::Egarch(_) => VarKind::Egarch,
            CondVar::Aparch(_) => VarKind::Aparch,
            CondVar::Tarch(_) => VarKind::Tarch,
            CondVar::Figarch(_) => VarKind::Figarch,
            CondVar::Nagarch(_) => VarKind::Nagarch,
            CondVar::Tsgarch(_) => VarKind::Tsgarch,
            CondVar::Ugarch(_) => VarKind::Ugarch,
            CondVar::Ngarch(_) => VarKind::Ngarch,
            CondVar::Gtarch(_) => VarKind::Gtarch,
            CondVar::Sqrgarch(_) => VarKind::Sqrgarch,
        }
    }

    pub fn inner(&self) -> &dyn CondVarComponent {
        match self {
            CondVar::Const(c) => c,
            CondVar::Arch(c) => c,
            CondVar::Garch(c) => c,
            CondVar::Egarch(c) => c,
            CondVar::Aparch(c) => c,
            CondVar::Tarch(c) => c,
            CondVar::Figarch(c) => c,
            CondVar::Nagarch(c) => c,
            CondVar::Tsgarch(c) => c,
            CondVar::Ugarch(c) => c,
            CondVar::Ngarch(c) => c,
            CondVar::Gtarch(c) => c,
            CondVar::Sqrgarch(c) => c,
        }
    }

    pub fn inner_mut(&mut self) -> &mut dyn CondVarComponent {
        match self {
            CondVar::Const(c) => c,
            CondVar::Arch(c) => c,
            CondVar::Garch(c) => c,
            CondVar::Egarch(c) => c,
            CondVar::Aparch(c) => c,
            CondVar::Tarch(c) => c,
            CondVar::Figarch(c) => c,
            CondVar::Nagarch(c) => c,
            CondVar::Tsgarch(c) => c,
            CondVar::Ugarch(c) => c,
            CondVar::Ngarch(c) => c,
            CondVar::Gtarch(c) => c,
            CondVar::Sqrgarch(c) => c,
        }
    }

    pub fn n_param(&self) -> usize {
        self.inner().n_param()
    }

    pub fn n_lags(&self) -> usize {
        self.inner().n_lags()
    }

    pub fn params(&self) -> &ParamBlocks {
        self.inner().params()
    }

    pub fn params_mut(&mut self) -> &mut ParamBlocks {
        self.inner_mut().params_mut()
    }

    pub fn param_to_vector(&self, dest: &mut Array1<f64>, offset: usize) -> RegArchResult<()> {
        self.params().to_vector(dest, offset)
    }

    pub fn vector_to_param(&mut self, src: &Array1<f64>, offset: usize) -> RegArchResult<()> {
        self.params_mut().from_vector(src, offset)
    }

    pub fn compute_var(&self, date: usize, data: &RegArchValue, distr: &Residuals) -> f64 {
        self.inner().compute_var(date, data, distr)
    }

    pub fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        distr: &Residuals,
    ) {
        self.inner().compute_grad(date, data, grad, offset, distr);
    }

    pub fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, distr: &Residuals,
    ) {
        self.inner().compute_hess(date, data, grad, hess, offset, distr);
    }

    pub fn compute_grad_and_hess(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState,
        hess: &mut HessianState, offset: usize, distr: &Residuals,
    ) {
        self.compute_grad(date, data, grad, offset, distr);
        self.compute_hess(date, data, grad, hess, offset, distr);
    }

    pub fn set_default_init_point(&mut self, mean: f64, var: f64) {
        self.inner_mut().set_default_init_point(mean, var);
    }

    pub fn check_data(&self, data: &RegArchValue) -> RegArchResult<()> {
        self.inner().check_data(data)
    }

    pub fn sync_size_param(&mut self, data: &RegArchValue) -> RegArchResult<()> {
        self.inner_mut().sync_size_param(data)
    }
}

// ---- Helper methods ----
//
// Building blocks shared by the GARCH-type recursions. Each adds one lag's
// contribution into a locally assembled gradient / Hessian.

pub(crate) fn set_current_grad(grad: &mut GradientState, local: &Array1<f64>) {
    grad.current_grad_var_mut().assign(local);
}

pub(crate) fn set_current_hess(hess: &mut HessianState, local: &Array2<f64>) {
    hess.current_hess_var_mut().assign(local);
}

pub(crate) fn zeros_grad(grad: &GradientState) -> Array1<f64> {
    Array1::zeros(grad.n_param())
}

pub(crate) fn zeros_hess(hess: &HessianState) -> Array2<f64> {
    let n = hess.n_param();
    Array2::zeros((n, n))
}

/// `∂(α u²_{t−i}) = e_α u² + 2αu ∂u`.
pub(crate) fn add_sq_resid_grad(
    local: &mut Array1<f64>, u: f64, grad_u: Option<&Array1<f64>>, alpha: f64, alpha_idx: usize,
) {
    local[alpha_idx] += u * u;
    if let Some(gu) = grad_u {
        local.scaled_add(2.0 * alpha * u, gu);
    }
}

/// `∂²(α u²_{t−i}) = sym(e_α, 2u ∂u) + 2α(∂u ∂uᵀ + u ∂²u)`.
pub(crate) fn add_sq_resid_hess(
    local: &mut Array2<f64>, u: f64, grad_u: Option<&Array1<f64>>,
    hess_m: Option<ArrayView2<'_, f64>>, alpha: f64, alpha_idx: usize,
) {
    if let Some(gu) = grad_u {
        add_sym_unit(local, alpha_idx, 2.0 * u, gu.view());
        add_outer(local, 2.0 * alpha, gu.view(), gu.view());
    }
    if let Some(hm) = hess_m {
        // ∂²u = −∂²m
        local.scaled_add(-2.0 * alpha * u, &hm);
    }
}

/// `∂(β x_{t−j}) = e_β x + β ∂x` for a lagged own value `x`.
pub(crate) fn add_lag_value_grad(
    local: &mut Array1<f64>, x: f64, grad_x: Option<ArrayView1<'_, f64>>, beta: f64,
    beta_idx: usize,
) {
    local[beta_idx] += x;
    if let Some(gx) = grad_x {
        local.scaled_add(beta, &gx);
    }
}

/// `∂²(β x_{t−j}) = sym(e_β, ∂x) + β ∂²x`.
pub(crate) fn add_lag_value_hess(
    local: &mut Array2<f64>, grad_x: Option<ArrayView1<'_, f64>>,
    hess_x: Option<ArrayView2<'_, f64>>, beta: f64, beta_idx: usize,
) {
    if let Some(gx) = grad_x {
        add_sym_unit(local, beta_idx, 1.0, gx);
    }
    if let Some(hx) = hess_x {
        local.scaled_add(beta, &hx);
    }
}

/// `σ = √h` with `∂σ = ∂h/(2σ)` and `∂²σ = ∂²h/(2σ) − ∂h ∂hᵀ/(4σ³)`.
pub(crate) fn sigma_derivatives(
    h: f64, grad_h: ArrayView1<'_, f64>, hess_h: Option<ArrayView2<'_, f64>>,
) -> (f64, Array1<f64>, Option<Array2<f64>>) {
    let sigma = h.sqrt();
    let grad_sigma = grad_h.mapv(|g| g / (2.0 * sigma));
    let hess_sigma = hess_h.map(|hh| {
        let mut out = hh.mapv(|x| x / (2.0 * sigma));
        add_outer(&mut out, -1.0 / (4.0 * h * sigma), grad_h, grad_h);
        out
    });
    (sigma, grad_sigma, hess_sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Kind tags round-trip through Display and FromStr.
    fn kind_tags_round_trip_through_display() {
        for kind in [
            VarKind::Const,
            VarKind::Arch,
            VarKind::Garch,
            VarKind::Egarch,
            VarKind::Aparch,
            VarKind::Tarch,
            VarKind::Figarch,
            VarKind::Nagarch,
            VarKind::Tsgarch,
            VarKind::Ugarch,
            VarKind::Ngarch,
            VarKind::Gtarch,
            VarKind::Sqrgarch,
        ] {
            assert_eq!(kind.to_string().parse::<VarKind>().unwrap(), kind);
        }
        assert!("stochvol".parse::<VarKind>().is_err());
    }

    #[test]
    // Purpose
    // -------
    // Closed-form parameter counts per family.
    //
    // Expect
    // ------
    // - GARCH(p, q) → 1 + p + q, EGARCH → 3 + p + q, APARCH → 2 + 2p + q,
    //   TARCH(q) → 1 + 2q, FIGARCH → 2 + p + q, NAGARCH → 2 + p + q,
    //   UGARCH(K, p, q) → 1 + K + p + q, NGARCH and SQRGARCH → 2 + p + q,
    //   GTARCH → 1 + 2p + q.
    fn parameter_counts_follow_orders() {
        assert_eq!(CondVar::Const(ConstVar::default()).n_param(), 1);
        assert_eq!(CondVar::Arch(Arch::new(3)).n_param(), 4);
        assert_eq!(CondVar::Garch(Garch::new(2, 1)).n_param(), 4);
        assert_eq!(CondVar::Egarch(Egarch::new(1, 2)).n_param(), 6);
        assert_eq!(CondVar::Egarch(Egarch::default()).n_param(), 3);
        assert_eq!(CondVar::Aparch(Aparch::new(2, 1)).n_param(), 7);
        assert_eq!(CondVar::Tarch(Tarch::new(2)).n_param(), 5);
        assert_eq!(CondVar::Figarch(Figarch::new(1, 1)).n_param(), 4);
        assert_eq!(CondVar::Nagarch(Nagarch::new(1, 1)).n_param(), 4);
        assert_eq!(CondVar::Tsgarch(Tsgarch::new(1, 1)).n_param(), 3);
        assert_eq!(CondVar::Ugarch(Ugarch::new(true, 2, 1, 1)).n_param(), 5);
        assert_eq!(CondVar::Ugarch(Ugarch::new(false, 2, 1, 1)).n_param(), 4);
        assert_eq!(CondVar::Ngarch(Ngarch::new(1, 1)).n_param(), 4);
        assert_eq!(CondVar::Gtarch(Gtarch::new(2, 1)).n_param(), 6);
        assert_eq!(CondVar::Sqrgarch(Sqrgarch::new(1, 2)).n_param(), 5);
    }

    #[test]
    // Purpose
    // -------
    // σ-derivatives from variance derivatives.
    //
    // Given
    // -----
    // - h = 9, ∂h = [3], ∂²h = [[2]].
    //
    // Expect
    // ------
    // - σ = 3, ∂σ = 0.5, ∂²σ = 2/6 − 9/108.
    fn sigma_derivatives_closed_form() {
        let gh = ndarray::array![3.0];
        let hh = ndarray::array![[2.0]];
        let (s, gs, hs) = sigma_derivatives(9.0, gh.view(), Some(hh.view()));
        assert_eq!(s, 3.0);
        assert_eq!(gs[0], 0.5);
        let hs = hs.unwrap();
        assert!((hs[[0, 0]] - (2.0 / 6.0 - 9.0 / 108.0)).abs() < 1e-14);
    }
}
