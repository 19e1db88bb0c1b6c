//! GARCH(p, q) variance.
//!
//! `h_t = ω + Σ_{i=1..p} α_i U²_{t−i} + Σ_{j=1..q} β_j H_{t−j}`
//!
//! The β terms make the recursion depend on its own past, so the gradient is
//! `∂h_t = e_ω + Σ_i [e_αi U² + 2α_i U ∂U] + Σ_j [e_βj H_{t−j} + β_j ∂H_{t−j}]`
//! with `∂H_{t−j}` read from the trailing window (depth ≥ q).
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::RegArchResult,
    residuals::Residuals,
    variance::{
        CondVarComponent, add_lag_value_grad, add_lag_value_hess, add_sq_resid_grad,
        add_sq_resid_hess, set_current_grad, set_current_hess, zeros_grad, zeros_hess,
    },
};
use ndarray::{Array1, Array2};

const CONST: usize = 0;
const ARCH: usize = 1;
const GARCH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Garch {
    params: ParamBlocks,
}

impl Garch {
    pub fn new(p: usize, q: usize) -> Self {
        Garch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_vector("arch", p)
                .with_vector("garch", q),
        }
    }

    pub fn with_coefficients(omega: f64, alpha: Array1<f64>, beta: Array1<f64>) -> Self {
        let mut g = Garch::new(alpha.len(), beta.len());
        g.params.values_mut(CONST).fill(omega);
        g.params.values_mut(ARCH).assign(&alpha);
        g.params.values_mut(GARCH).assign(&beta);
        g
    }

    pub fn orders(&self) -> (usize, usize) {
        (self.params.block_len(ARCH), self.params.block_len(GARCH))
    }

    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, ARCH)?;
        self.params.realloc_block(q, GARCH)
    }
}

/// ARCH and GARCH sums shared by [`Garch`] and [`Arch`](super::Arch).
pub(crate) struct GarchTerms<'a> {
    pub params: &'a ParamBlocks,
    pub arch_block: usize,
    pub garch_block: Option<usize>,
}

impl GarchTerms<'_> {
    pub fn var(&self, date: usize, data: &RegArchValue) -> f64 {
        let alpha = self.params.values(self.arch_block);
        let mut h = self.params.scalar(CONST);
        for i in 1..=alpha.len().min(date) {
            let u = data.u_lag(date, i);
            h += alpha[i - 1] * u * u;
        }
        if let Some(gb) = self.garch_block {
            let beta = self.params.values(gb);
            for j in 1..=beta.len().min(date) {
                h += beta[j - 1] * data.h_lag(date, j);
            }
        }
        h
    }

    pub fn grad(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, offset: usize,
    ) -> Array1<f64> {
        let mut local = zeros_grad(grad);
        local[offset] = 1.0;
        let alpha = self.params.values(self.arch_block);
        let alpha_off = offset + self.params.block_offset(self.arch_block);
        for i in 1..=alpha.len().min(date) {
            let gu = grad.grad_u_lag(i);
            add_sq_resid_grad(&mut local, data.u_lag(date, i), gu.as_ref(), alpha[i - 1], alpha_off + i - 1);
        }
        if let Some(gb) = self.garch_block {
            let beta = self.params.values(gb);
            let beta_off = offset + self.params.block_offset(gb);
            for j in 1..=beta.len().min(date) {
                add_lag_value_grad(
                    &mut local,
                    data.h_lag(date, j),
                    grad.grad_var_lag(j),
                    beta[j - 1],
                    beta_off + j - 1,
                );
            }
        }
        local
    }

    pub fn hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &HessianState,
        offset: usize,
    ) -> Array2<f64> {
        let mut local = zeros_hess(hess);
        let alpha = self.params.values(self.arch_block);
        let alpha_off = offset + self.params.block_offset(self.arch_block);
        for i in 1..=alpha.len().min(date) {
            let gu = grad.grad_u_lag(i);
            add_sq_resid_hess(
                &mut local,
                data.u_lag(date, i),
                gu.as_ref(),
                hess.hess_mu_lag(i),
                alpha[i - 1],
                alpha_off + i - 1,
            );
        }
        if let Some(gb) = self.garch_block {
            let beta = self.params.values(gb);
            let beta_off = offset + self.params.block_offset(gb);
            for j in 1..=beta.len().min(date) {
                add_lag_value_hess(
                    &mut local,
                    grad.grad_var_lag(j),
                    hess.hess_var_lag(j),
                    beta[j - 1],
                    beta_off + j - 1,
                );
            }
        }
        local
    }
}

impl Garch {
    fn terms(&self) -> GarchTerms<'_> {
        GarchTerms { params: &self.params, arch_block: ARCH, garch_block: Some(GARCH) }
    }
}

impl CondVarComponent for Garch {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        let (p, q) = self.orders();
        p.max(q)
    }

    fn compute_var(&self, date: usize, data: &RegArchValue, _distr: &Residuals) -> f64 {
        self.terms().var(date, data)
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let local = self.terms().grad(date, data, grad, offset);
        set_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let local = self.terms().hess(date, data, grad, hess, offset);
        set_current_hess(hess, &local);
    }

    /// α's sum to 0.1, β's to 0.8 and ω = 0.1·var, matching the sample
    /// variance as unconditional variance.
    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let (p, q) = self.orders();
        let alpha_sum = if p > 0 { 0.1 } else { 0.0 };
        let beta_sum = if q > 0 { 0.8 } else { 0.0 };
        if p > 0 {
            self.params.values_mut(ARCH).fill(alpha_sum / p as f64);
        }
        if q > 0 {
            self.params.values_mut(GARCH).fill(beta_sum / q as f64);
        }
        self.params.values_mut(CONST).fill(var * (1.0 - alpha_sum - beta_sum));
    }
}
