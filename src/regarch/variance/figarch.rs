//! FIGARCH(p, d, q) fractionally integrated variance.
//!
//! Purpose
//! -------
//! `h_t = ω + Σ_{j=1..q} β_j H_{t−j} + Σ_{k=1..T} λ_k U²_{t−k}` where the ARCH(∞)
//! weights come from `1 − B(L) − Φ(L)(1 − L)^d`:
//! `λ_k = −β_k 1{k ≤ q} − a_k`, `a(L) = Φ(L)(1 − L)^d` truncated at `T`.
//!
//! Key behaviors
//! -------------
//! - Weight derivatives: `∂λ_k/∂φ_i = π_{k−i}`, `∂λ_k/∂d = −∂a_k/∂d`,
//!   `∂λ_k/∂β_j = −1{k = j}`; the only non-zero second derivatives are
//!   `∂²λ_k/∂d² = −∂²a_k/∂d²` and `∂²λ_k/∂φ_i∂d = ∂π_{k−i}/∂d`.
//! - The expansion is memoized per `(φ, d, depth)`, so a filtering pass
//!   expands it once and reuses it across dates and across value, gradient
//!   and Hessian calls.
//!
//! Conventions
//! -----------
//! - `T` defaults to [`DEFAULT_TRUNCATION_LAG`] and is changed with
//!   [`Figarch::resize_poly`].
//! - The expansion depth is `max(T, p, q)`: ARCH or GARCH blocks grown
//!   through [`ParamBlocks`] past `T` keep every coefficient in `λ`, and
//!   `n_lags` equals the depth.
use crate::regarch::{
    core::{
        ArFracPoly, ArFracPolyCache, DEFAULT_TRUNCATION_LAG, GradientState, HessianState, ParamBlocks,
        RegArchValue,
        linalg::{add_outer, add_sym_outer},
    },
    errors::{RegArchError, RegArchResult},
    residuals::Residuals,
    variance::{
        CondVarComponent, add_lag_value_grad, add_lag_value_hess, set_current_grad,
        set_current_hess, zeros_grad, zeros_hess,
    },
};
use ndarray::{Array1, Array2};

const CONST: usize = 0;
const FRACD: usize = 1;
const ARCH: usize = 2;
const GARCH: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Figarch {
    params: ParamBlocks,
    trunc: usize,
    cache: ArFracPolyCache,
}

impl Figarch {
    pub fn new(p: usize, q: usize) -> Self {
        Figarch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_scalar("fracd", 0.0)
                .with_vector("arch", p)
                .with_vector("garch", q),
            trunc: DEFAULT_TRUNCATION_LAG.max(p),
            cache: ArFracPolyCache::default(),
        }
    }

    pub fn orders(&self) -> (usize, usize) {
        (self.params.block_len(ARCH), self.params.block_len(GARCH))
    }

    pub fn trunc(&self) -> usize {
        self.trunc
    }

    /// Set the truncation lag of the ARCH(∞) expansion.
    pub fn resize_poly(&mut self, trunc: usize) -> RegArchResult<()> {
        if trunc < self.orders().0 {
            return Err(RegArchError::InvalidOrder {
                order: trunc,
                reason: "truncation lag must cover the AR order",
            });
        }
        self.trunc = trunc;
        Ok(())
    }

    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, ARCH)?;
        self.params.realloc_block(q, GARCH)?;
        self.trunc = self.trunc.max(p);
        Ok(())
    }

    /// Lags of `λ(L)` actually used.
    pub fn depth(&self) -> usize {
        let (p, q) = self.orders();
        self.trunc.max(p).max(q)
    }

    fn with_poly<R>(&self, f: impl FnOnce(&ArFracPoly) -> R) -> R {
        self.cache.with(self.params.values(ARCH), self.params.scalar(FRACD), self.depth(), f)
    }

    fn weight(&self, poly: &ArFracPoly, k: usize) -> f64 {
        let beta = self.params.values(GARCH);
        let b = if k <= beta.len() { beta[k - 1] } else { 0.0 };
        -b - poly.a[k]
    }

    /// `∂λ_k` embedded in the full parameter space.
    fn grad_weight(&self, poly: &ArFracPoly, k: usize, n: usize, offset: usize) -> Array1<f64> {
        let (p, q) = self.orders();
        let mut out = Array1::zeros(n);
        out[offset + self.params.block_offset(FRACD)] = -poly.d_a[k];
        let arch_off = offset + self.params.block_offset(ARCH);
        for i in 1..=p {
            out[arch_off + i - 1] = poly.pi_shift(k, i);
        }
        if k <= q {
            out[offset + self.params.block_offset(GARCH) + k - 1] = -1.0;
        }
        out
    }

    /// `u² ∂²λ_k` added into `local`.
    fn add_weight_hess(&self, local: &mut Array2<f64>, poly: &ArFracPoly, k: usize, u2: f64, offset: usize) {
        let d_idx = offset + self.params.block_offset(FRACD);
        let arch_off = offset + self.params.block_offset(ARCH);
        local[[d_idx, d_idx]] -= u2 * poly.d2_a[k];
        for i in 1..=self.orders().0 {
            let c = u2 * poly.d_pi_shift(k, i);
            local[[d_idx, arch_off + i - 1]] += c;
            local[[arch_off + i - 1, d_idx]] += c;
        }
    }
}

impl CondVarComponent for Figarch {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        self.depth()
    }

    fn compute_var(&self, date: usize, data: &RegArchValue, _distr: &Residuals) -> f64 {
        let beta = self.params.values(GARCH);
        let mut h = self.params.scalar(CONST);
        for j in 1..=beta.len().min(date) {
            h += beta[j - 1] * data.h_lag(date, j);
        }
        self.with_poly(|poly| {
            for k in 1..=self.depth().min(date) {
                let u = data.u_lag(date, k);
                h += self.weight(poly, k) * u * u;
            }
        });
        h
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let n = grad.n_param();
        let beta = self.params.values(GARCH);
        let beta_off = offset + self.params.block_offset(GARCH);
        let mut local = zeros_grad(grad);
        local[offset + self.params.block_offset(CONST)] = 1.0;
        for j in 1..=beta.len().min(date) {
            add_lag_value_grad(
                &mut local,
                data.h_lag(date, j),
                grad.grad_var_lag(j),
                beta[j - 1],
                beta_off + j - 1,
            );
        }
        self.with_poly(|poly| {
            for k in 1..=self.depth().min(date) {
                let u = data.u_lag(date, k);
                local.scaled_add(u * u, &self.grad_weight(poly, k, n, offset));
                if let Some(gu) = grad.grad_u_lag(k) {
                    local.scaled_add(2.0 * self.weight(poly, k) * u, &gu);
                }
            }
        });
        set_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let n = grad.n_param();
        let beta = self.params.values(GARCH);
        let beta_off = offset + self.params.block_offset(GARCH);
        let mut local = zeros_hess(hess);
        for j in 1..=beta.len().min(date) {
            add_lag_value_hess(
                &mut local,
                grad.grad_var_lag(j),
                hess.hess_var_lag(j),
                beta[j - 1],
                beta_off + j - 1,
            );
        }
        self.with_poly(|poly| {
            for k in 1..=self.depth().min(date) {
                let u = data.u_lag(date, k);
                let lambda = self.weight(poly, k);
                self.add_weight_hess(&mut local, poly, k, u * u, offset);
                if let Some(gu) = grad.grad_u_lag(k) {
                    let grad_lambda = self.grad_weight(poly, k, n, offset);
                    add_sym_outer(&mut local, 2.0 * u, grad_lambda.view(), gu.view());
                    add_outer(&mut local, 2.0 * lambda, gu.view(), gu.view());
                }
                if let Some(hm) = hess.hess_mu_lag(k) {
                    // ∂²u = −∂²m
                    local.scaled_add(-2.0 * lambda * u, &hm);
                }
            }
        });
        set_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let (p, q) = self.orders();
        if p > 0 {
            self.params.values_mut(ARCH).fill(0.2 / p as f64);
        }
        if q > 0 {
            self.params.values_mut(GARCH).fill(0.4 / q as f64);
        }
        self.params.values_mut(FRACD).fill(0.3);
        self.params.values_mut(CONST).fill(0.1 * var);
    }
}
