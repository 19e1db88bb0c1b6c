//! NGARCH(p, q) nonlinear variance with a constant news shift.
//!
//! `h_t = ω + Σ_{i=1..p} α_i (U_{t−i} − θ)² + Σ_{j=1..q} β_j H_{t−j}`
//!
//! The shift is a level, unlike NAGARCH where it scales with the lagged
//! standard deviation, so `z = U − θ` has `∂z = ∂U − e_θ` and `∂²z = ∂²U`:
//! each lag is an ARCH term on `z`.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::RegArchResult,
    residuals::Residuals,
    variance::{
        CondVarComponent, add_lag_value_grad, add_lag_value_hess, add_sq_resid_grad,
        add_sq_resid_hess, set_current_grad, set_current_hess, zeros_grad, zeros_hess,
    },
};
use ndarray::Array1;

const CONST: usize = 0;
const ARCH: usize = 1;
const GARCH: usize = 2;
const TETA: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Ngarch {
    params: ParamBlocks,
}

impl Ngarch {
    pub fn new(p: usize, q: usize) -> Self {
        Ngarch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_vector("arch", p)
                .with_vector("garch", q)
                .with_scalar("teta", 0.0),
        }
    }

    pub fn orders(&self) -> (usize, usize) {
        (self.params.block_len(ARCH), self.params.block_len(GARCH))
    }

    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, ARCH)?;
        self.params.realloc_block(q, GARCH)
    }

    /// `(z, ∂z)` at lag `i`.
    fn shifted(
        &self, date: usize, lag: usize, data: &RegArchValue, grad: &GradientState, offset: usize,
    ) -> (f64, Array1<f64>) {
        let mut gz = grad.grad_u_lag(lag).unwrap_or_else(|| Array1::zeros(grad.n_param()));
        gz[offset + self.params.block_offset(TETA)] -= 1.0;
        (data.u_lag(date, lag) - self.params.scalar(TETA), gz)
    }
}

impl CondVarComponent for Ngarch {
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
        let (p, q) = self.orders();
        let alpha = self.params.values(ARCH);
        let beta = self.params.values(GARCH);
        let theta = self.params.scalar(TETA);
        let mut h = self.params.scalar(CONST);
        for i in 1..=p.min(date) {
            let z = data.u_lag(date, i) - theta;
            h += alpha[i - 1] * z * z;
        }
        for j in 1..=q.min(date) {
            h += beta[j - 1] * data.h_lag(date, j);
        }
        h
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let (p, q) = self.orders();
        let alpha = self.params.values(ARCH);
        let beta = self.params.values(GARCH);
        let alpha_off = offset + self.params.block_offset(ARCH);
        let beta_off = offset + self.params.block_offset(GARCH);
        let mut local = zeros_grad(grad);
        local[offset + self.params.block_offset(CONST)] = 1.0;
        for i in 1..=p.min(date) {
            let (z, gz) = self.shifted(date, i, data, grad, offset);
            add_sq_resid_grad(&mut local, z, Some(&gz), alpha[i - 1], alpha_off + i - 1);
        }
        for j in 1..=q.min(date) {
            add_lag_value_grad(
                &mut local,
                data.h_lag(date, j),
                grad.grad_var_lag(j),
                beta[j - 1],
                beta_off + j - 1,
            );
        }
        set_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let (p, q) = self.orders();
        let alpha = self.params.values(ARCH);
        let beta = self.params.values(GARCH);
        let alpha_off = offset + self.params.block_offset(ARCH);
        let beta_off = offset + self.params.block_offset(GARCH);
        let mut local = zeros_hess(hess);
        for i in 1..=p.min(date) {
            let (z, gz) = self.shifted(date, i, data, grad, offset);
            add_sq_resid_hess(
                &mut local,
                z,
                Some(&gz),
                hess.hess_mu_lag(i),
                alpha[i - 1],
                alpha_off + i - 1,
            );
        }
        for j in 1..=q.min(date) {
            add_lag_value_hess(
                &mut local,
                grad.grad_var_lag(j),
                hess.hess_var_lag(j),
                beta[j - 1],
                beta_off + j - 1,
            );
        }
        set_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let (p, q) = self.orders();
        if p > 0 {
            self.params.values_mut(ARCH).fill(0.1 / p as f64);
        }
        if q > 0 {
            self.params.values_mut(GARCH).fill(0.8 / q as f64);
        }
        self.params.values_mut(TETA).fill(0.0);
        self.params.values_mut(CONST).fill(0.1 * var);
    }
}
