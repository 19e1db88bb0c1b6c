//! GTARCH(p, q): threshold GARCH on the conditional standard deviation.
//!
//! `σ_t = ω + Σ_{i=1..p} (α⁺_i U⁺_{t−i} + α⁻_i U⁻_{t−i}) + Σ_{j=1..q} β_j σ_{t−j}`,
//! `h_t = σ_t²`, with `U⁺ = max(U, 0)` and `U⁻ = max(−U, 0)`.
//!
//! Each lag reads `|U_{t−i}|` against whichever coefficient the sign of the
//! residual selects, so the recursion is the TSGARCH one with a regime
//! switch on the ARCH side. A zero residual contributes nothing and selects
//! `α⁻`.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::RegArchResult,
    residuals::Residuals,
    variance::{
        CondVarComponent,
        tsgarch::{AbsRecursion, set_squared_grad, set_squared_hess},
    },
};

const CONST: usize = 0;
const ARCH_POS: usize = 1;
const ARCH_NEG: usize = 2;
const GARCH: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Gtarch {
    params: ParamBlocks,
}

impl Gtarch {
    pub fn new(p: usize, q: usize) -> Self {
        Gtarch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_vector("archpos", p)
                .with_vector("archneg", p)
                .with_vector("garch", q),
        }
    }

    pub fn orders(&self) -> (usize, usize) {
        (self.params.block_len(ARCH_POS), self.params.block_len(GARCH))
    }

    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, ARCH_POS)?;
        self.params.realloc_block(p, ARCH_NEG)?;
        self.params.realloc_block(q, GARCH)
    }

    /// Coefficient selected by the sign of `u` at lag `i`.
    fn regime(&self, i: usize, u: f64, offset: usize) -> (f64, usize) {
        let block = if u > 0.0 { ARCH_POS } else { ARCH_NEG };
        (self.params.values(block)[i - 1], offset + self.params.block_offset(block) + i - 1)
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

impl CondVarComponent for Gtarch {
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
        let s = self.recursion(0).sigma(date, data, |i: usize, u: f64| self.regime(i, u, 0));
        s * s
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let rec = self.recursion(offset);
        let arch = |i: usize, u: f64| self.regime(i, u, offset);
        let sigma = rec.sigma(date, data, arch);
        let (gs, _) = rec.sigma_grad(date, data, grad, None, arch);
        set_squared_grad(grad, sigma, &gs);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let rec = self.recursion(offset);
        let arch = |i: usize, u: f64| self.regime(i, u, offset);
        let sigma = rec.sigma(date, data, arch);
        let (gs, hs) = rec.sigma_grad(date, data, grad, Some(&*hess), arch);
        if let Some(hs) = hs {
            set_squared_hess(hess, sigma, &gs, &hs);
        }
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let (p, q) = self.orders();
        if p > 0 {
            self.params.values_mut(ARCH_POS).fill(0.05 / p as f64);
            self.params.values_mut(ARCH_NEG).fill(0.1 / p as f64);
        }
        if q > 0 {
            self.params.values_mut(GARCH).fill(0.8 / q as f64);
        }
        self.params.values_mut(CONST).fill(0.1 * var.sqrt());
    }
}
