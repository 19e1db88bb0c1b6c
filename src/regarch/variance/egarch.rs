//! EGARCH(p, q) variance on the log scale.
//!
//! Purpose
//! -------
//! `ln h_t = ω + Σ_{i=1..p} α_i g(ε_{t−i}) + Σ_{j=1..q} β_j ln H_{t−j}` with the
//! news-impact function `g(ε) = θε + γ(|ε| − E|ε|)`.
//!
//! Key behaviors
//! -------------
//! - `E|ε|` comes from the residual distribution, so the variance depends on
//!   the distribution parameters: `∂E|ε|` and `∂²E|ε|` enter the distribution
//!   block of the gradient and Hessian.
//! - Derivatives are built for `ln h_t` first and mapped back with
//!   `∂h = h ∂ln h` and `∂²h = h(∂² ln h + ∂ln h ∂ln hᵀ)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `compute_grad` / `compute_hess` read `H_t` from `data`, so the model fills
//!   the current variance first.
//! - `sgn(0) = 0` for the kink of `|ε|`.
use crate::regarch::{
    core::{
        GradientState, HessianState, ParamBlocks, RegArchValue,
        linalg::{add_outer, add_sym_unit},
    },
    errors::RegArchResult,
    residuals::Residuals,
    variance::{CondVarComponent, set_current_grad, set_current_hess, zeros_grad, zeros_hess},
};
use ndarray::{Array1, Array2, s};

const CONST: usize = 0;
const ARCH: usize = 1;
const GARCH: usize = 2;
const TETA: usize = 3;
const GAMMA: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Egarch {
    params: ParamBlocks,
}

impl Default for Egarch {
    fn default() -> Self {
        Egarch::new(0, 0)
    }
}

impl Egarch {
    pub fn new(p: usize, q: usize) -> Self {
        Egarch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_vector("arch", p)
                .with_vector("garch", q)
                .with_scalar("teta", 0.0)
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

    fn idx(&self, offset: usize, block: usize) -> usize {
        offset + self.params.block_offset(block)
    }

    /// `∂E|ε|/∂θ` embedded in the full parameter space.
    fn grad_expected_abs(&self, n: usize, distr_offset: usize, distr: &Residuals) -> Array1<f64> {
        let mut out = Array1::zeros(n);
        let g = distr.grad_esp_abs_eps();
        out.slice_mut(s![distr_offset..distr_offset + g.len()]).assign(&g);
        out
    }

    fn hess_expected_abs(&self, n: usize, distr_offset: usize, distr: &Residuals) -> Array2<f64> {
        let mut out = Array2::zeros((n, n));
        let hd = distr.hess_esp_abs_eps();
        let k = hd.nrows();
        out.slice_mut(s![distr_offset..distr_offset + k, distr_offset..distr_offset + k])
            .assign(&hd);
        out
    }

    /// `∂ ln h_t/∂θ`.
    fn grad_log_var(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, offset: usize,
        distr: &Residuals,
    ) -> Array1<f64> {
        let (p, q) = self.orders();
        let alpha = self.params.values(ARCH);
        let beta = self.params.values(GARCH);
        let theta = self.params.scalar(TETA);
        let gamma = self.params.scalar(GAMMA);
        let e_abs = distr.esp_abs_eps();
        let grad_e = self.grad_expected_abs(
            grad.n_param(),
            grad.n_mean_param() + grad.n_var_param(),
            distr,
        );
        let (teta_idx, gamma_idx) = (self.idx(offset, TETA), self.idx(offset, GAMMA));

        let mut local = zeros_grad(grad);
        local[self.idx(offset, CONST)] = 1.0;
        for i in 1..=p.min(date) {
            let eps = data.eps_lag(date, i);
            let a = alpha[i - 1];
            local[self.idx(offset, ARCH) + i - 1] += theta * eps + gamma * (eps.abs() - e_abs);
            local[teta_idx] += a * eps;
            local[gamma_idx] += a * (eps.abs() - e_abs);
            if let Some(ge) = grad.grad_eps_lag(i) {
                local.scaled_add(a * (theta + gamma * sign(eps)), &ge);
            }
            local.scaled_add(-a * gamma, &grad_e);
        }
        for j in 1..=q.min(date) {
            let hl = data.h_lag(date, j);
            local[self.idx(offset, GARCH) + j - 1] += hl.ln();
            if let Some(gh) = grad.grad_var_lag(j) {
                local.scaled_add(beta[j - 1] / hl, &gh);
            }
        }
        local
    }
}

#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl CondVarComponent for Egarch {
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

    fn compute_var(&self, date: usize, data: &RegArchValue, distr: &Residuals) -> f64 {
        let (p, q) = self.orders();
        let alpha = self.params.values(ARCH);
        let beta = self.params.values(GARCH);
        let theta = self.params.scalar(TETA);
        let gamma = self.params.scalar(GAMMA);
        let e_abs = distr.esp_abs_eps();
        let mut lh = self.params.scalar(CONST);
        for i in 1..=p.min(date) {
            let eps = data.eps_lag(date, i);
            lh += alpha[i - 1] * (theta * eps + gamma * (eps.abs() - e_abs));
        }
        for j in 1..=q.min(date) {
            lh += beta[j - 1] * data.h_lag(date, j).ln();
        }
        lh.exp()
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        distr: &Residuals,
    ) {
        let h = data.ht[date];
        let local = self.grad_log_var(date, data, grad, offset, distr).mapv(|g| h * g);
        set_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, distr: &Residuals,
    ) {
        let (p, q) = self.orders();
        let alpha = self.params.values(ARCH);
        let beta = self.params.values(GARCH);
        let theta = self.params.scalar(TETA);
        let gamma = self.params.scalar(GAMMA);
        let e_abs = distr.esp_abs_eps();
        let n = grad.n_param();
        let distr_offset = grad.n_mean_param() + grad.n_var_param();
        let grad_e = self.grad_expected_abs(n, distr_offset, distr);
        let hess_e = self.hess_expected_abs(n, distr_offset, distr);
        let (teta_idx, gamma_idx) = (self.idx(offset, TETA), self.idx(offset, GAMMA));

        let h = data.ht[date];
        let grad_lh = grad.current_grad_var().mapv(|g| g / h);

        let mut local = zeros_hess(hess);
        for i in 1..=p.min(date) {
            let eps = data.eps_lag(date, i);
            let sg = sign(eps);
            let a = alpha[i - 1];
            let slope = theta + gamma * sg;
            let grad_eps = grad.grad_eps_lag(i);

            // ∂g
            let mut grad_g = Array1::zeros(n);
            grad_g[teta_idx] += eps;
            grad_g[gamma_idx] += eps.abs() - e_abs;
            if let Some(ge) = grad_eps {
                grad_g.scaled_add(slope, &ge);
            }
            grad_g.scaled_add(-gamma, &grad_e);
            add_sym_unit(&mut local, self.idx(offset, ARCH) + i - 1, 1.0, grad_g.view());

            // α ∂²g
            if let Some(ge) = grad_eps {
                add_sym_unit(&mut local, teta_idx, a, ge);
                add_sym_unit(&mut local, gamma_idx, a * sg, ge);
            }
            if let Some(he) = hess.hess_eps_lag(i) {
                local.scaled_add(a * slope, &he);
            }
            add_sym_unit(&mut local, gamma_idx, -a, grad_e.view());
            local.scaled_add(-a * gamma, &hess_e);
        }
        for j in 1..=q.min(date) {
            let hl = data.h_lag(date, j);
            let b = beta[j - 1];
            if let Some(gh) = grad.grad_var_lag(j) {
                add_sym_unit(&mut local, self.idx(offset, GARCH) + j - 1, 1.0 / hl, gh);
                add_outer(&mut local, -b / (hl * hl), gh, gh);
            }
            if let Some(hh) = hess.hess_var_lag(j) {
                local.scaled_add(b / hl, &hh);
            }
        }
        add_outer(&mut local, 1.0, grad_lh.view(), grad_lh.view());
        local.mapv_inplace(|x| h * x);
        set_current_hess(hess, &local);
    }

    /// Persistence 0.8 spread over the β's, so `ω = 0.2 ln var` matches the
    /// sample variance on the log scale.
    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let (p, q) = self.orders();
        if p > 0 {
            self.params.values_mut(ARCH).fill(0.1 / p as f64);
        }
        let persistence = if q > 0 { 0.8 } else { 0.0 };
        if q > 0 {
            self.params.values_mut(GARCH).fill(persistence / q as f64);
        }
        self.params.values_mut(CONST).fill((1.0 - persistence) * var.ln());
        self.params.values_mut(TETA).fill(0.0);
        self.params.values_mut(GAMMA).fill(0.1);
    }
}
