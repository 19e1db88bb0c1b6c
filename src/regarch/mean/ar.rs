//! Autoregressive mean `m_t = Σ_{i=1..p} φ_i Y_{t−i}`.
//!
//! The regressors are observed values, so the gradient is exogenous
//! (`∂m_t/∂φ_i = Y_{t−i}`) and the Hessian is zero.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::RegArchResult,
    mean::CondMeanComponent,
};
use ndarray::Array1;

const AR: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Ar {
    params: ParamBlocks,
}

impl Ar {
    /// AR(p) with zero coefficients.
    pub fn new(p: usize) -> Self {
        Ar { params: ParamBlocks::new().with_vector("ar", p) }
    }

    pub fn with_coefficients(phi: Array1<f64>) -> Self {
        let mut ar = Ar::new(phi.len());
        ar.params.values_mut(AR).assign(&phi);
        ar
    }

    pub fn order(&self) -> usize {
        self.params.block_len(AR)
    }

    /// Change the order; coefficients are reset to zero.
    pub fn realloc(&mut self, p: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, AR)
    }
}

impl CondMeanComponent for Ar {
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
        let phi = self.params.values(AR);
        (1..=phi.len().min(date)).map(|i| phi[i - 1] * data.y_lag(date, i)).sum()
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
    ) {
        let mut current = grad.current_grad_mu_mut();
        for i in 1..=self.order().min(date) {
            current[offset + i - 1] += data.y_lag(date, i);
        }
    }

    fn compute_hess(
        &self, _date: usize, _data: &RegArchValue, _grad: &GradientState, _hess: &mut HessianState,
        _offset: usize,
    ) {
    }

    fn set_default_init_point(&mut self, _mean: f64, _var: f64) {
        self.params.values_mut(AR).fill(0.0);
    }
}
