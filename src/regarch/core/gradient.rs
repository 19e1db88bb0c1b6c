//! GradientState — rolling window of first derivatives for RegArch recursions.
//!
//! Purpose
//! -------
//! Hold `∂M_t/∂θ`, `∂H_t/∂θ` and `∂Eps_t/∂θ` for the current date and a fixed
//! number `N` of trailing dates, so that recursive components (MA, ARFIMA,
//! GARCH-type variances) can chain-rule through their own lagged values
//! without storing full-history derivatives.
//!
//! Key behaviors
//! -------------
//! - Every row spans the full parameter vector `θ = [mean | var | distr]`.
//! - [`GradientState::update`] advances the window by one date: the current
//!   slot becomes lag 1, the oldest slot is evicted and recycled as a
//!   zero-filled current slot. No data moves; only the head index rotates.
//! - Current-date-only quantities (`∂σ_t/∂θ`, density gradient, `g(ε_t)`,
//!   `∂l_t/∂θ`) live beside the window and are reset by `update`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Storage is `(N + 1) × n_param`; lag `k` lives in row `(head + k) mod (N + 1)`.
//! - Lags beyond `N` are not reachable: [`GradientState::grad_var_lag`] and
//!   friends return `None` and components skip them. Model-level drivers
//!   reject windows shorter than the model's lag order before any pass.
//! - `realloc` invalidates all contents; callers must `reinitialize` before
//!   starting a new pass (realloc already leaves the window zero-filled).
//!
//! Conventions
//! -----------
//! - Per date, callers invoke `update()` first and then fill the current slot.
//! - Dates before the sample start correspond to zero rows.
use crate::regarch::core::value::RegArchValue;
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};

/// Rolling first-derivative window.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientState {
    n_past: usize,
    n_mean: usize,
    n_var: usize,
    n_distr: usize,
    head: usize,
    grad_h: Array2<f64>,
    grad_m: Array2<f64>,
    grad_eps: Array2<f64>,
    /// `∂σ_t/∂θ` at the current date.
    pub current_grad_sigma: Array1<f64>,
    /// `∂ log f(ε_t; θ_d)/∂θ_d` (distribution block only).
    pub current_grad_dens: Array1<f64>,
    /// `g(ε_t) = ∂ log f/∂ε` at the current standardized residual.
    pub current_diff_log_density: f64,
    /// `∂l_t/∂θ` for the current date.
    pub current_grad_lt: Array1<f64>,
}

impl GradientState {
    /// Allocate a zero-filled window with `n_past` trailing dates.
    pub fn new(n_past: usize, n_mean: usize, n_var: usize, n_distr: usize) -> Self {
        let n_param = n_mean + n_var + n_distr;
        GradientState {
            n_past,
            n_mean,
            n_var,
            n_distr,
            head: 0,
            grad_h: Array2::zeros((n_past + 1, n_param)),
            grad_m: Array2::zeros((n_past + 1, n_param)),
            grad_eps: Array2::zeros((n_past + 1, n_param)),
            current_grad_sigma: Array1::zeros(n_param),
            current_grad_dens: Array1::zeros(n_distr),
            current_diff_log_density: 0.0,
            current_grad_lt: Array1::zeros(n_param),
        }
    }

    /// Resize window depth and parameter blocks; all contents are discarded.
    pub fn realloc(&mut self, n_past: usize, n_mean: usize, n_var: usize, n_distr: usize) {
        *self = GradientState::new(n_past, n_mean, n_var, n_distr);
    }

    /// Zero every slot and rewind the head.
    pub fn reinitialize(&mut self) {
        self.head = 0;
        self.grad_h.fill(0.0);
        self.grad_m.fill(0.0);
        self.grad_eps.fill(0.0);
        self.reset_current_scalars();
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

    /// `(n_mean, n_var, n_distr)`.
    pub fn block_sizes(&self) -> (usize, usize, usize) {
        (self.n_mean, self.n_var, self.n_distr)
    }

    /// Advance one date: lag `k` becomes lag `k + 1`, lag `N` is evicted and a
    /// zero-filled current slot appears.
    pub fn update(&mut self) {
        let depth = self.n_past + 1;
        self.head = (self.head + self.n_past) % depth;
        self.grad_h.row_mut(self.head).fill(0.0);
        self.grad_m.row_mut(self.head).fill(0.0);
        self.grad_eps.row_mut(self.head).fill(0.0);
        self.reset_current_scalars();
    }

    // ---- Current slot ----

    pub fn current_grad_var(&self) -> ArrayView1<'_, f64> {
        self.grad_h.row(self.head)
    }

    pub fn current_grad_var_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.grad_h.row_mut(self.head)
    }

    pub fn current_grad_mu(&self) -> ArrayView1<'_, f64> {
        self.grad_m.row(self.head)
    }

    pub fn current_grad_mu_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.grad_m.row_mut(self.head)
    }

    pub fn current_grad_eps(&self) -> ArrayView1<'_, f64> {
        self.grad_eps.row(self.head)
    }

    pub fn current_grad_eps_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.grad_eps.row_mut(self.head)
    }

    // ---- Trailing slots ----

    /// `∂H_{t−k}/∂θ` for `1 ≤ k ≤ N`; `None` beyond the window.
    pub fn grad_var_lag(&self, k: usize) -> Option<ArrayView1<'_, f64>> {
        self.slot(k).map(|r| self.grad_h.row(r))
    }

    /// `∂M_{t−k}/∂θ` for `1 ≤ k ≤ N`; `None` beyond the window.
    pub fn grad_mu_lag(&self, k: usize) -> Option<ArrayView1<'_, f64>> {
        self.slot(k).map(|r| self.grad_m.row(r))
    }

    /// `∂Eps_{t−k}/∂θ` for `1 ≤ k ≤ N`; `None` beyond the window.
    pub fn grad_eps_lag(&self, k: usize) -> Option<ArrayView1<'_, f64>> {
        self.slot(k).map(|r| self.grad_eps.row(r))
    }

    /// `∂U_{t−k}/∂θ = −∂M_{t−k}/∂θ` as an owned vector.
    pub fn grad_u_lag(&self, k: usize) -> Option<Array1<f64>> {
        self.grad_mu_lag(k).map(|g| g.mapv(|x| -x))
    }

    /// Fill `current_grad_sigma = ∂H_t/∂θ / (2σ_t)` from the current variance gradient.
    pub fn compute_grad_sigmat_from_grad_vart(&mut self, date: usize, data: &RegArchValue) {
        let sigma = data.ht[date].sqrt();
        let grad_h = self.grad_h.row(self.head);
        self.current_grad_sigma = grad_h.mapv(|g| g / (2.0 * sigma));
    }

    // ---- Helper methods ----

    fn slot(&self, k: usize) -> Option<usize> {
        if k > self.n_past { None } else { Some((self.head + k) % (self.n_past + 1)) }
    }

    fn reset_current_scalars(&mut self) {
        self.current_grad_sigma.fill(0.0);
        self.current_grad_dens.fill(0.0);
        self.current_diff_log_density = 0.0;
        self.current_grad_lt.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Window shape/getters, the circular shift (lag promotion and eviction after
    // N + 1 updates), reinitialize and realloc semantics.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Getters report the construction shape.
    fn getters_report_block_sizes() {
        let g = GradientState::new(3, 2, 4, 1);
        assert_eq!(g.n_past(), 3);
        assert_eq!(g.n_param(), 7);
        assert_eq!((g.n_mean_param(), g.n_var_param(), g.n_distr_param()), (2, 4, 1));
        assert_eq!(g.current_grad_var().len(), 7);
        assert_eq!(g.current_grad_dens.len(), 1);
    }

    #[test]
    // Purpose
    // -------
    // A value written to the current slot moves one lag per update and is
    // evicted after N + 1 updates.
    //
    // Given
    // -----
    // - N = 2, marker 7.0 written into the current variance gradient.
    //
    // Expect
    // ------
    // - Lag k holds the marker after k updates (k ≤ N).
    // - After N + 1 updates no slot (current or lag) holds it.
    fn window_shift_promotes_then_evicts() {
        let mut g = GradientState::new(2, 1, 1, 0);
        g.current_grad_var_mut()[1] = 7.0;
        g.update();
        assert_eq!(g.grad_var_lag(1).unwrap()[1], 7.0);
        assert_eq!(g.current_grad_var()[1], 0.0);
        g.update();
        assert_eq!(g.grad_var_lag(2).unwrap()[1], 7.0);
        g.update();
        assert_eq!(g.current_grad_var()[1], 0.0);
        assert_eq!(g.grad_var_lag(1).unwrap()[1], 0.0);
        assert_eq!(g.grad_var_lag(2).unwrap()[1], 0.0);
        assert!(g.grad_var_lag(3).is_none());
    }

    #[test]
    // Purpose
    // -------
    // Lag rows of different series rotate together and stay distinct.
    fn series_rotate_in_lockstep() {
        let mut g = GradientState::new(1, 1, 0, 0);
        g.current_grad_mu_mut().assign(&array![2.0]);
        g.current_grad_eps_mut().assign(&array![3.0]);
        g.update();
        assert_eq!(g.grad_mu_lag(1).unwrap()[0], 2.0);
        assert_eq!(g.grad_u_lag(1).unwrap()[0], -2.0);
        assert_eq!(g.grad_eps_lag(1).unwrap()[0], 3.0);
    }

    #[test]
    // Purpose
    // -------
    // `reinitialize` zeroes everything; `realloc` changes the shape.
    fn reinitialize_and_realloc_reset_contents() {
        let mut g = GradientState::new(2, 1, 1, 1);
        g.current_grad_var_mut().fill(1.0);
        g.current_diff_log_density = 4.0;
        g.update();
        g.reinitialize();
        assert!(g.grad_var_lag(1).unwrap().iter().all(|&x| x == 0.0));
        assert_eq!(g.current_diff_log_density, 0.0);

        g.realloc(5, 2, 2, 0);
        assert_eq!(g.n_past(), 5);
        assert_eq!(g.n_param(), 4);
        assert!(g.grad_var_lag(5).is_some());
    }

    #[test]
    // Purpose
    // -------
    // σ-gradient from the variance gradient: ∂σ = ∂h / (2σ).
    //
    // Given
    // -----
    // - H_0 = 4, ∂H_0 = [2, 4].
    //
    // Expect
    // ------
    // - ∂σ_0 = [0.5, 1.0].
    fn sigma_gradient_from_variance_gradient() {
        let mut data = RegArchValue::new(1);
        data.ht[0] = 4.0;
        let mut g = GradientState::new(0, 1, 1, 0);
        g.current_grad_var_mut().assign(&array![2.0, 4.0]);
        g.compute_grad_sigmat_from_grad_vart(0, &data);
        assert_eq!(g.current_grad_sigma, array![0.5, 1.0]);
    }
}
