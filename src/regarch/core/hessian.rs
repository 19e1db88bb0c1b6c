//! HessianState — rolling window of second derivatives, parallel to
//! [`GradientState`](crate::regarch::core::gradient::GradientState).
//!
//! Purpose
//! -------
//! Hold `∂²M_t/∂θ∂θᵀ`, `∂²H_t/∂θ∂θᵀ` and `∂²Eps_t/∂θ∂θᵀ` for the current date
//! and `N` trailing dates with the same shift discipline as the gradient
//! window. Chain-rule formulas for composite recursions consume both windows:
//! the second derivative of a recursion needs the first derivatives of its
//! lagged inputs as well as their second derivatives.
//!
//! Invariants & assumptions
//! ------------------------
//! - Storage is `(N + 1) × n_param × n_param`; lag `k` lives in slab
//!   `(head + k) mod (N + 1)`.
//! - The window is advanced in lockstep with the gradient window: one
//!   `update()` on each per date.
use crate::regarch::core::{gradient::GradientState, linalg::add_outer, value::RegArchValue};
use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayViewMut2, Axis};

/// Rolling second-derivative window.
#[derive(Debug, Clone, PartialEq)]
pub struct HessianState {
    n_past: usize,
    n_mean: usize,
    n_var: usize,
    n_distr: usize,
    head: usize,
    hess_h: Array3<f64>,
    hess_m: Array3<f64>,
    hess_eps: Array3<f64>,
    /// `∂²σ_t/∂θ∂θᵀ` at the current date.
    pub current_hess_sigma: Array2<f64>,
    /// `∂² log f(ε_t; θ_d)/∂θ_d∂θ_dᵀ` (distribution block only).
    pub current_hess_dens: Array2<f64>,
    /// `∂g(ε_t)/∂θ_d`, the mixed partial of the log-density.
    pub current_grad_diff_log_density: Array1<f64>,
    /// `∂²l_t/∂θ∂θᵀ` for the current date.
    pub current_hess_lt: Array2<f64>,
}

impl HessianState {
    pub fn new(n_past: usize, n_mean: usize, n_var: usize, n_distr: usize) -> Self {
        let n = n_mean + n_var + n_distr;
        HessianState {
            n_past,
            n_mean,
            n_var,
            n_distr,
            head: 0,
            hess_h: Array3::zeros((n_past + 1, n, n)),
            hess_m: Array3::zeros((n_past + 1, n, n)),
            hess_eps: Array3::zeros((n_past + 1, n, n)),
            current_hess_sigma: Array2::zeros((n, n)),
            current_hess_dens: Array2::zeros((n_distr, n_distr)),
            current_grad_diff_log_density: Array1::zeros(n_distr),
            current_hess_lt: Array2::zeros((n, n)),
        }
    }

    /// Resize window depth and parameter blocks; all contents are discarded.
    pub fn realloc(&mut self, n_past: usize, n_mean: usize, n_var: usize, n_distr: usize) {
        *self = HessianState::new(n_past, n_mean, n_var, n_distr);
    }

    pub fn reinitialize(&mut self) {
        self.head = 0;
        self.hess_h.fill(0.0);
        self.hess_m.fill(0.0);
        self.hess_eps.fill(0.0);
        self.reset_current();
    }

    pub fn n_past(&self) -> usize {
        self.n_past
    }

    pub fn n_param(&self) -> usize {
        self.n_mean + self.n_var + self.n_distr
    }

    pub fn n_mean_param(&self) -> usize {
        self.n_mean
    }

    pub fn n_var_param(&self) -> usize {
        self.n_var
    }

    pub fn n_distr_param(&self) -> usize {
        self.n_distr
    }

    pub fn block_sizes(&self) -> (usize, usize, usize) {
        (self.n_mean, self.n_var, self.n_distr)
    }

    /// Advance one date (see [`GradientState::update`]).
    pub fn update(&mut self) {
        let depth = self.n_past + 1;
        self.head = (self.head + self.n_past) % depth;
        self.hess_h.index_axis_mut(Axis(0), self.head).fill(0.0);
        self.hess_m.index_axis_mut(Axis(0), self.head).fill(0.0);
        self.hess_eps.index_axis_mut(Axis(0), self.head).fill(0.0);
        self.reset_current();
    }

    // ---- Current slot ----

    pub fn current_hess_var(&self) -> ArrayView2<'_, f64> {
        self.hess_h.index_axis(Axis(0), self.head)
    }

    pub fn current_hess_var_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.hess_h.index_axis_mut(Axis(0), self.head)
    }

    pub fn current_hess_mu(&self) -> ArrayView2<'_, f64> {
        self.hess_m.index_axis(Axis(0), self.head)
    }

    pub fn current_hess_mu_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.hess_m.index_axis_mut(Axis(0), self.head)
    }

    pub fn current_hess_eps(&self) -> ArrayView2<'_, f64> {
        self.hess_eps.index_axis(Axis(0), self.head)
    }

    pub fn current_hess_eps_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.hess_eps.index_axis_mut(Axis(0), self.head)
    }

    // ---- Trailing slots ----

    pub fn hess_var_lag(&self, k: usize) -> Option<ArrayView2<'_, f64>> {
        self.slot(k).map(|s| self.hess_h.index_axis(Axis(0), s))
    }

    pub fn hess_mu_lag(&self, k: usize) -> Option<ArrayView2<'_, f64>> {
        self.slot(k).map(|s| self.hess_m.index_axis(Axis(0), s))
    }

    pub fn hess_eps_lag(&self, k: usize) -> Option<ArrayView2<'_, f64>> {
        self.slot(k).map(|s| self.hess_eps.index_axis(Axis(0), s))
    }

    /// `∂²σ_t = ∂²h_t/(2σ_t) − ∂h_t ∂h_tᵀ/(4σ_t³)` from the current variance
    /// derivatives held in both windows.
    pub fn compute_hess_sigmat_from_hess_vart(
        &mut self, date: usize, data: &RegArchValue, grad: &GradientState,
    ) {
        let sigma = data.ht[date].sqrt();
        let grad_h = grad.current_grad_var();
        let mut hess_sigma = self.current_hess_var().mapv(|x| x / (2.0 * sigma));
        add_outer(&mut hess_sigma, -1.0 / (4.0 * sigma.powi(3)), grad_h, grad_h);
        self.current_hess_sigma = hess_sigma;
    }

    // ---- Helper methods ----

    fn slot(&self, k: usize) -> Option<usize> {
        if k > self.n_past { None } else { Some((self.head + k) % (self.n_past + 1)) }
    }

    fn reset_current(&mut self) {
        self.current_hess_sigma.fill(0.0);
        self.current_hess_dens.fill(0.0);
        self.current_grad_diff_log_density.fill(0.0);
        self.current_hess_lt.fill(0.0);
    }
}
