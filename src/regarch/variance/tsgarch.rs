//! TSGARCH(p, q): GARCH on the conditional standard deviation.
//!
//! `σ_t = ω + Σ_{i=1..p} α_i |U_{t−i}| + Σ_{j=1..q} β_j σ_{t−j}`, `h_t = σ_t²`.
//!
//! Lagged `∂σ` and `∂²σ` are recovered from the stored variance derivatives,
//! then `∂h = 2σ ∂σ` and `∂²h = 2(∂σ ∂σᵀ + σ ∂²σ)`. The recursion is shared
//! with [`Gtarch`](crate::regarch::variance::Gtarch), which lets the ARCH
//! coefficient depend on the sign of the lagged residual.
use crate::regarch::{
    core::{
        GradientState, HessianState, ParamBlocks, RegArchValue,
        linalg::{add_outer, add_sym_unit},
    },
    errors::RegArchResult,
    residuals::Residuals,
    variance::{CondVarComponent, set_current_grad, set_current_hess, sigma_derivatives},
};
use ndarray::{Array1, Array2, ArrayView1};

const CONST: usize = 0;
const ARCH: usize = 1;
const GARCH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Tsgarch {
    params: ParamBlocks,
}

impl Tsgarch {
    pub fn new(p: usize, q: usize) -> Self {
        Tsgarch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_vector("arch", p)
                .with_vector("garch", q),
        }
    }

    pub fn orders(&self) -> (usize, usize) {
        (self.params.block_len(ARCH), self.params.block_len(GARCH))
    }

    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, ARCH)?;
        self.params.realloc_block(q, GARCH)
    }

    /// Active ARCH coefficient at lag `i` and its position in the model vector.
    fn arch_coeff(&self, i: usize, offset: usize) -> (f64, usize) {
        (self.params.values(ARCH)[i - 1], offset + self.params.block_offset(ARCH) + i - 1)
    }

    fn recursion(&self, offset: usize) -> AbsRecursion<'_> {
        AbsRecursion {
            omega: self.params.scalar(CONST),
            const_idx: offset + self.params.block_offset(CONST),
            n_arch: self.orders().0,
            beta: self.params.values(GARCH),
            beta_off: offset + self.params.block_offset(GARCH),
        }
    }
}

/// Shared shape of the standard-deviation recursions
/// `σ_t = ω + Σ_{i=1..p} a_i(U_{t−i}) |U_{t−i}| + Σ_{j=1..q} β_j σ_{t−j}`,
/// where the ARCH coefficient may depend on the sign of the lagged residual.
pub(crate) struct AbsRecursion<'a> {
    pub omega: f64,
    pub const_idx: usize,
    pub n_arch: usize,
    pub beta: ArrayView1<'a, f64>,
    pub beta_off: usize,
}

impl AbsRecursion<'_> {
    /// `σ_t`; `arch(i, u)` returns the coefficient active at lag `i`.
    pub fn sigma(
        &self, date: usize, data: &RegArchValue, arch: impl Fn(usize, f64) -> (f64, usize),
    ) -> f64 {
        let mut s = self.omega;
        for i in 1..=self.n_arch.min(date) {
            let u = data.u_lag(date, i);
            s += arch(i, u).0 * u.abs();
        }
        for j in 1..=self.beta.len().min(date) {
            s += self.beta[j - 1] * data.h_lag(date, j).sqrt();
        }
        s
    }

    /// `(∂σ_t, ∂²σ_t)`; the Hessian only when `hess` is given.
    pub fn sigma_grad(
        &self, date: usize, data: &RegArchValue, grad: &GradientState,
        hess: Option<&HessianState>, arch: impl Fn(usize, f64) -> (f64, usize),
    ) -> (Array1<f64>, Option<Array2<f64>>) {
        let n = grad.n_param();
        let mut gs = Array1::zeros(n);
        gs[self.const_idx] = 1.0;
        let mut hs = hess.map(|_| Array2::zeros((n, n)));

        for i in 1..=self.n_arch.min(date) {
            let u = data.u_lag(date, i);
            let sg = if u == 0.0 { 0.0 } else { u.signum() };
            let (a, a_idx) = arch(i, u);
            gs[a_idx] += u.abs();
            let grad_u = grad.grad_u_lag(i);
            if let Some(gu) = &grad_u {
                gs.scaled_add(a * sg, gu);
            }
            if let Some(hs) = hs.as_mut() {
                if let Some(gu) = &grad_u {
                    add_sym_unit(hs, a_idx, sg, gu.view());
                }
                if let Some(hm) = hess.and_then(|h| h.hess_mu_lag(i)) {
                    // ∂²u = −∂²m
                    hs.scaled_add(-a * sg, &hm);
                }
            }
        }
        for j in 1..=self.beta.len().min(date) {
            let Some(grad_h) = grad.grad_var_lag(j) else {
                gs[self.beta_off + j - 1] += data.h_lag(date, j).sqrt();
                continue;
            };
            let hess_h = hess.and_then(|h| h.hess_var_lag(j));
            let (sigma, grad_sigma, hess_sigma) =
                sigma_derivatives(data.h_lag(date, j), grad_h, hess_h);
            let b = self.beta[j - 1];
            gs[self.beta_off + j - 1] += sigma;
            gs.scaled_add(b, &grad_sigma);
            if let Some(hs) = hs.as_mut() {
                add_sym_unit(hs, self.beta_off + j - 1, 1.0, grad_sigma.view());
                if let Some(hsig) = &hess_sigma {
                    hs.scaled_add(b, hsig);
                }
            }
        }
        (gs, hs)
    }
}

/// `∂h = 2σ ∂σ` written into the current variance slot.
pub(crate) fn set_squared_grad(grad: &mut GradientState, sigma: f64, grad_sigma: &Array1<f64>) {
    set_current_grad(grad, &grad_sigma.mapv(|x| 2.0 * sigma * x));
}

/// `∂²h = 2(∂σ ∂σᵀ + σ ∂²σ)` written into the current variance slot.
pub(crate) fn set_squared_hess(
    hess: &mut HessianState, sigma: f64, grad_sigma: &Array1<f64>, hess_sigma: &Array2<f64>,
) {
    let mut out = hess_sigma.mapv(|x| 2.0 * sigma * x);
    add_outer(&mut out, 2.0, grad_sigma.view(), grad_sigma.view());
    set_current_hess(hess, &out);
}

impl CondVarComponent for Tsgarch {
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
        let s = self.recursion(0).sigma(date, data, |i: usize, _: f64| self.arch_coeff(i, 0));
        s * s
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let rec = self.recursion(offset);
        let arch = |i: usize, _: f64| self.arch_coeff(i, offset);
        let sigma = rec.sigma(date, data, arch);
        let (gs, _) = rec.sigma_grad(date, data, grad, None, arch);
        set_squared_grad(grad, sigma, &gs);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let rec = self.recursion(offset);
        let arch = |i: usize, _: f64| self.arch_coeff(i, offset);
        let sigma = rec.sigma(date, data, arch);
        let (gs, hs) = rec.sigma_grad(date, data, grad, Some(&*hess), arch);
        if let Some(hs) = hs {
            set_squared_hess(hess, sigma, &gs, &hs);
        }
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let (p, q) = self.orders();
        if p > 0 {
            self.params.values_mut(ARCH).fill(0.1 / p as f64);
        }
        if q > 0 {
            self.params.values_mut(GARCH).fill(0.8 / q as f64);
        }
        self.params.values_mut(CONST).fill(0.1 * var.sqrt());
    }
}
