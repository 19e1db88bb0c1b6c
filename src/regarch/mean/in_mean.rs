//! In-mean feedback terms: `m_t = δ√h_t` (StdDevInMean) and `m_t = δh_t`
//! (VarInMean).
//!
//! Both read the **current** conditional variance and its derivatives. The
//! model evaluates the variance component for date `t` before any mean
//! component, so `H_t`, `∂H_t` and `∂²H_t` are already in place when these
//! run.
use crate::regarch::{
    core::{
        GradientState, HessianState, ParamBlocks, RegArchValue,
        linalg::{add_outer, add_sym_unit},
    },
    mean::{CondMeanComponent, add_to_current_grad, add_to_current_hess},
};
use ndarray::Array2;

const DELTA: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct StdDevInMean {
    params: ParamBlocks,
}

impl Default for StdDevInMean {
    fn default() -> Self {
        StdDevInMean::new(0.0)
    }
}

impl StdDevInMean {
    pub fn new(delta: f64) -> Self {
        StdDevInMean { params: ParamBlocks::new().with_scalar("delta", delta) }
    }
}

impl CondMeanComponent for StdDevInMean {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        0
    }

    fn compute_mean(&self, date: usize, data: &RegArchValue) -> f64 {
        self.params.scalar(DELTA) * data.ht[date].sqrt()
    }

    /// `∂m = e_δ σ_t + δ ∂h_t/(2σ_t)`.
    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
    ) {
        let sigma = data.ht[date].sqrt();
        let delta = self.params.scalar(DELTA);
        let mut local = grad.current_grad_var().mapv(|g| delta * g / (2.0 * sigma));
        local[offset] += sigma;
        add_to_current_grad(grad, &local);
    }

    /// `∂²m = sym(e_δ, ∂h/(2σ)) + δ[∂²h/(2σ) − ∂h ∂hᵀ/(4σ³)]`.
    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize,
    ) {
        let h = data.ht[date];
        let sigma = h.sqrt();
        let delta = self.params.scalar(DELTA);
        let grad_h = grad.current_grad_var();
        let mut local: Array2<f64> = hess.current_hess_var().mapv(|x| delta * x / (2.0 * sigma));
        add_outer(&mut local, -delta / (4.0 * h * sigma), grad_h, grad_h);
        add_sym_unit(&mut local, offset, 1.0 / (2.0 * sigma), grad_h);
        add_to_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, _var: f64) {
        self.params.values_mut(DELTA).fill(0.0);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarInMean {
    params: ParamBlocks,
}

impl Default for VarInMean {
    fn default() -> Self {
        VarInMean::new(0.0)
    }
}

impl VarInMean {
    pub fn new(delta: f64) -> Self {
        VarInMean { params: ParamBlocks::new().with_scalar("delta", delta) }
    }
}

impl CondMeanComponent for VarInMean {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        0
    }

    fn compute_mean(&self, date: usize, data: &RegArchValue) -> f64 {
        self.params.scalar(DELTA) * data.ht[date]
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
    ) {
        let delta = self.params.scalar(DELTA);
        let mut local = grad.current_grad_var().mapv(|g| delta * g);
        local[offset] += data.ht[date];
        add_to_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, _date: usize, _data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize,
    ) {
        let delta = self.params.scalar(DELTA);
        let mut local: Array2<f64> = hess.current_hess_var().mapv(|x| delta * x);
        add_sym_unit(&mut local, offset, 1.0, grad.current_grad_var());
        add_to_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, _var: f64) {
        self.params.values_mut(DELTA).fill(0.0);
    }
}
