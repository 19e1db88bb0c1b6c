//! Moving-average mean `m_t = Σ_{j=1..q} θ_j U_{t−j}`.
//!
//! The lagged residuals depend on every mean parameter through
//! `U_{t−j} = Y_{t−j} − M_{t−j}`, so
//! `∂m_t = Σ_j [e_θj U_{t−j} − θ_j ∂M_{t−j}]` and
//! `∂²m_t = Σ_j [−(e_θj ∂M_{t−j}ᵀ + ∂M_{t−j} e_θjᵀ) − θ_j ∂²M_{t−j}]`,
//! both read from the trailing window.
use crate::regarch::{
    core::{
        GradientState, HessianState, ParamBlocks, RegArchValue,
        linalg::add_sym_unit,
    },
    errors::RegArchResult,
    mean::{CondMeanComponent, add_to_current_grad, add_to_current_hess},
};
use ndarray::{Array1, Array2, ArrayView1};

const MA: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Ma {
    params: ParamBlocks,
}

impl Ma {
    pub fn new(q: usize) -> Self {
        Ma { params: ParamBlocks::new().with_vector("ma", q) }
    }

    pub fn with_coefficients(theta: Array1<f64>) -> Self {
        let mut ma = Ma::new(theta.len());
        ma.params.values_mut(MA).assign(&theta);
        ma
    }

    pub fn order(&self) -> usize {
        self.params.block_len(MA)
    }

    pub fn realloc(&mut self, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(q, MA)
    }
}

/// MA part shared with ARFIMA; `theta` sits at `ma_offset` in the model vector.
pub(crate) fn ma_mean(theta: ArrayView1<'_, f64>, date: usize, data: &RegArchValue) -> f64 {
    (1..=theta.len().min(date)).map(|j| theta[j - 1] * data.u_lag(date, j)).sum()
}

pub(crate) fn ma_grad(
    theta: ArrayView1<'_, f64>, date: usize, data: &RegArchValue, grad: &GradientState,
    ma_offset: usize, local: &mut Array1<f64>,
) {
    for j in 1..=theta.len().min(date) {
        local[ma_offset + j - 1] += data.u_lag(date, j);
        if let Some(grad_m) = grad.grad_mu_lag(j) {
            local.scaled_add(-theta[j - 1], &grad_m);
        }
    }
}

pub(crate) fn ma_hess(
    theta: ArrayView1<'_, f64>, date: usize, grad: &GradientState, hess: &HessianState,
    ma_offset: usize, local: &mut Array2<f64>,
) {
    for j in 1..=theta.len().min(date) {
        if let Some(grad_m) = grad.grad_mu_lag(j) {
            add_sym_unit(local, ma_offset + j - 1, -1.0, grad_m);
        }
        if let Some(hess_m) = hess.hess_mu_lag(j) {
            local.scaled_add(-theta[j - 1], &hess_m);
        }
    }
}

impl CondMeanComponent for Ma {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        self.order()
    }

    fn compute_mean(&self, date: usize, data: &RegArchValue) -> f64 {
        ma_mean(self.params.values(MA), date, data)
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
    ) {
        let mut local = Array1::zeros(grad.n_param());
        ma_grad(self.params.values(MA), date, data, grad, offset, &mut local);
        add_to_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, _data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize,
    ) {
        let n = hess.n_param();
        let mut local = Array2::zeros((n, n));
        ma_hess(self.params.values(MA), date, grad, hess, offset, &mut local);
        add_to_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, _var: f64) {
        self.params.values_mut(MA).fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The mean is the weighted sum of lagged residuals.
    //
    // Given
    // -----
    // - U = [0.5, −1.0, 2.0], θ = [0.4, 0.1].
    //
    // Expect
    // ------
    // - m_2 = 0.4·(−1) + 0.1·0.5 = −0.35; m_0 = 0.
    fn mean_is_weighted_lagged_residuals() {
        let ma = Ma::with_coefficients(array![0.4, 0.1]);
        let mut data = RegArchValue::from_data(array![0.0, 0.0, 0.0]).unwrap();
        data.ut = array![0.5, -1.0, 2.0];
        assert_relative_eq!(ma.compute_mean(2, &data), -0.35, epsilon = 1e-12);
        assert_eq!(ma.compute_mean(0, &data), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // The recursive part of the gradient: −θ_1 ∂M_{t−1}.
    //
    // Given
    // -----
    // - MA(1), θ = 0.5, ∂M_{t−1} = [2.0] (single-parameter model), U_{t−1} = 3.
    //
    // Expect
    // ------
    // - ∂m_t = U_{t−1} − θ ∂M_{t−1} = 3 − 1 = 2.
    fn gradient_chains_through_lagged_mean() {
        let ma = Ma::with_coefficients(array![0.5]);
        let mut data = RegArchValue::from_data(array![0.0, 0.0]).unwrap();
        data.ut[0] = 3.0;
        let mut g = GradientState::new(1, 1, 0, 0);
        g.current_grad_mu_mut()[0] = 2.0;
        g.update();
        ma.compute_grad(1, &data, &mut g, 0);
        assert_relative_eq!(g.current_grad_mu()[0], 2.0);
    }

    #[test]
    // Purpose
    // -------
    // MA(0) is inert.
    fn order_zero_is_identically_zero() {
        let ma = Ma::new(0);
        let data = RegArchValue::from_data(array![1.0, 2.0]).unwrap();
        assert_eq!(ma.compute_mean(1, &data), 0.0);
        assert_eq!(ma.n_param(), 0);
    }
}
