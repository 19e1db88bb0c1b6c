//! SQRGARCH(p, q) square-root variance.
//!
//! `h_t = ω + Σ_{i=1..p} α_i (ε_{t−i} − γ σ_{t−i})² + Σ_{j=1..q} β_j H_{t−j}`,
//! with `σ = √H` and `ε = U/σ` the standardized residual.
//!
//! The news term reads both the lagged residual and the lagged standard
//! deviation. With `z = U/σ − γσ`:
//!
//! - `∂z = ∂U/σ − (U/σ²) ∂σ − σ e_γ − γ ∂σ`
//! - `∂²z = ∂²U/σ − (∂U ∂σᵀ + ∂σ ∂Uᵀ)/σ² + (2U/σ³) ∂σ ∂σᵀ − (U/σ² + γ) ∂²σ
//!   − (e_γ ∂σᵀ + ∂σ e_γᵀ)`
//!
//! so the window needs depth `max(p, q)` for both the mean and variance
//! slots, as for NAGARCH.
use crate::regarch::{
    core::{
        GradientState, HessianState, ParamBlocks, RegArchValue,
        linalg::{add_outer, add_sym_outer, add_sym_unit},
    },
    errors::RegArchResult,
    residuals::Residuals,
    variance::{
        CondVarComponent, add_lag_value_grad, add_lag_value_hess, set_current_grad,
        set_current_hess, sigma_derivatives, zeros_grad, zeros_hess,
    },
};
use ndarray::{Array1, Array2};

const CONST: usize = 0;
const ARCH: usize = 1;
const GARCH: usize = 2;
const GAMMA: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Sqrgarch {
    params: ParamBlocks,
}

/// News term `z` with its first and second derivatives.
struct News {
    z: f64,
    grad: Array1<f64>,
    hess: Option<Array2<f64>>,
}

impl Sqrgarch {
    pub fn new(p: usize, q: usize) -> Self {
        Sqrgarch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_vector("arch", p)
                .with_vector("garch", q)
                .with_scalar("gamma", 0.0),
        }
    }

    pub fn orders(&self) -> (usize, usize) {
        (self.params.block_len(ARCH), self.params.block_len(GARCH))
    }

    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, ARCH)?;
        self.params.realloc_block(q, GARCH)
    }

    fn news_value(&self, date: usize, lag: usize, data: &RegArchValue) -> f64 {
        let sigma = data.h_lag(date, lag).sqrt();
        data.u_lag(date, lag) / sigma - self.params.scalar(GAMMA) * sigma
    }

    fn news(
        &self, date: usize, lag: usize, data: &RegArchValue, grad: &GradientState,
        hess: Option<&HessianState>, offset: usize,
    ) -> News {
        let n = grad.n_param();
        let gamma = self.params.scalar(GAMMA);
        let gamma_idx = offset + self.params.block_offset(GAMMA);
        let u = data.u_lag(date, lag);
        let h = data.h_lag(date, lag);

        let zero: Array1<f64> = Array1::zeros(n);
        let grad_h = grad.grad_var_lag(lag).unwrap_or_else(|| zero.view());
        let hess_h = hess.and_then(|hs| hs.hess_var_lag(lag));
        let (sigma, grad_sigma, hess_sigma) = sigma_derivatives(h, grad_h, hess_h);
        let grad_u = grad.grad_u_lag(lag).unwrap_or_else(|| Array1::zeros(n));
        let s2 = sigma * sigma;

        let mut gz = grad_u.mapv(|x| x / sigma);
        gz.scaled_add(-u / s2 - gamma, &grad_sigma);
        gz[gamma_idx] -= sigma;

        let hz = hess.map(|hs| {
            let mut out = Array2::zeros((n, n));
            if let Some(hm) = hs.hess_mu_lag(lag) {
                // ∂²u = −∂²m
                out.scaled_add(-1.0 / sigma, &hm);
            }
            add_sym_outer(&mut out, -1.0 / s2, grad_u.view(), grad_sigma.view());
            add_outer(&mut out, 2.0 * u / (s2 * sigma), grad_sigma.view(), grad_sigma.view());
            if let Some(hsig) = &hess_sigma {
                out.scaled_add(-u / s2 - gamma, hsig);
            }
            add_sym_unit(&mut out, gamma_idx, -1.0, grad_sigma.view());
            out
        });
        News { z: u / sigma - gamma * sigma, grad: gz, hess: hz }
    }
}

impl CondVarComponent for Sqrgarch {
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
        let mut h = self.params.scalar(CONST);
        for i in 1..=p.min(date) {
            let z = self.news_value(date, i, data);
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
            let nw = self.news(date, i, data, grad, None, offset);
            local[alpha_off + i - 1] += nw.z * nw.z;
            local.scaled_add(2.0 * alpha[i - 1] * nw.z, &nw.grad);
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
            let nw = self.news(date, i, data, grad, Some(&*hess), offset);
            let a = alpha[i - 1];
            add_sym_unit(&mut local, alpha_off + i - 1, 2.0 * nw.z, nw.grad.view());
            add_outer(&mut local, 2.0 * a, nw.grad.view(), nw.grad.view());
            if let Some(hz) = &nw.hess {
                local.scaled_add(2.0 * a * nw.z, hz);
            }
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
            self.params.values_mut(ARCH).fill(0.1 * var / p as f64);
        }
        if q > 0 {
            self.params.values_mut(GARCH).fill(0.8 / q as f64);
        }
        self.params.values_mut(GAMMA).fill(0.0);
        self.params.values_mut(CONST).fill(0.1 * var);
    }
}
