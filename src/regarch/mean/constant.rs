//! Constant mean `m_t = c`.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    mean::CondMeanComponent,
};

const CONST: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstMean {
    params: ParamBlocks,
}

impl Default for ConstMean {
    fn default() -> Self {
        ConstMean::new(0.0)
    }
}

impl ConstMean {
    pub fn new(value: f64) -> Self {
        ConstMean { params: ParamBlocks::new().with_scalar("const", value) }
    }
}

impl CondMeanComponent for ConstMean {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        0
    }

    fn compute_mean(&self, _date: usize, _data: &RegArchValue) -> f64 {
        self.params.scalar(CONST)
    }

    fn compute_grad(
        &self, _date: usize, _data: &RegArchValue, grad: &mut GradientState, offset: usize,
    ) {
        grad.current_grad_mu_mut()[offset] += 1.0;
    }

    fn compute_hess(
        &self, _date: usize, _data: &RegArchValue, _grad: &GradientState, _hess: &mut HessianState,
        _offset: usize,
    ) {
    }

    fn set_default_init_point(&mut self, mean: f64, _var: f64) {
        self.params.values_mut(CONST).fill(mean);
    }
}
