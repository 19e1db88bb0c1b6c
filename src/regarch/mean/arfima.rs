//! ARFIMA(p, d, q) mean.
//!
//! Purpose
//! -------
//! Long-memory mean `Φ(L)(1 − L)^d Y_t = Θ(L) U_t`, written as a one-step
//! predictor. With `a(L) = Φ(L)(1 − L)^d` truncated at lag `T`:
//!
//! `m_t = −Σ_{k=1..T} a_k Y_{t−k} + Σ_{j=1..q} θ_j U_{t−j}`.
//!
//! Key behaviors
//! -------------
//! - `∂m/∂φ_i = Σ_k π_{k−i} Y_{t−k}`, `∂m/∂d = −Σ_k ∂a_k/∂d · Y_{t−k}`.
//! - Second derivatives: `∂²m/∂d² = −Σ_k ∂²a_k/∂d² · Y_{t−k}`,
//!   `∂²m/∂φ_i∂d = Σ_k ∂π_{k−i}/∂d · Y_{t−k}`, `∂²m/∂φ∂φ = 0`.
//! - The MA part is shared with [`Ma`](crate::regarch::mean::Ma) and chains
//!   through the trailing window.
//!
//! Conventions
//! -----------
//! - `T` defaults to [`DEFAULT_TRUNCATION_LAG`] and is changed with
//!   [`Arfima::resize_poly`]. Truncation is an approximation of the infinite
//!   expansion, not an error.
//! - The expansion depth is `max(T, p)`: an AR block grown through
//!   [`ParamBlocks`] past `T` still contributes every coefficient.
//! - The expansion is memoized per `(φ, d, depth)`; a filtering pass reuses it
//!   across dates and across mean, gradient and Hessian calls.
use crate::regarch::{
    core::{
        ArFracPoly, ArFracPolyCache, DEFAULT_TRUNCATION_LAG, GradientState, HessianState, ParamBlocks,
        RegArchValue,
    },
    errors::{RegArchError, RegArchResult},
    mean::{
        CondMeanComponent, add_to_current_grad, add_to_current_hess,
        ma::{ma_grad, ma_hess, ma_mean},
    },
};
use ndarray::{Array1, Array2};

const AR: usize = 0;
const MA: usize = 1;
const FRACD: usize = 2;
const DEFAULT_FRACD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Arfima {
    params: ParamBlocks,
    trunc: usize,
    cache: ArFracPolyCache,
}

impl Arfima {
    pub fn new(p: usize, q: usize) -> Self {
        Arfima {
            params: ParamBlocks::new()
                .with_vector("ar", p)
                .with_vector("ma", q)
                .with_scalar("fracd", 0.0),
            trunc: DEFAULT_TRUNCATION_LAG,
            cache: ArFracPolyCache::default(),
        }
    }

    pub fn ar_order(&self) -> usize {
        self.params.block_len(AR)
    }

    pub fn ma_order(&self) -> usize {
        self.params.block_len(MA)
    }

    pub fn trunc(&self) -> usize {
        self.trunc
    }

    /// Set the truncation lag of the fractional expansion.
    ///
    /// # Errors
    /// - [`RegArchError::InvalidOrder`] if `trunc` is smaller than the AR
    ///   order (the product polynomial would lose AR terms).
    pub fn resize_poly(&mut self, trunc: usize) -> RegArchResult<()> {
        if trunc < self.ar_order() {
            return Err(RegArchError::InvalidOrder {
                order: trunc,
                reason: "truncation lag must cover the AR order",
            });
        }
        self.trunc = trunc;
        Ok(())
    }

    /// Change `(p, q)`; coefficients are reset to zero.
    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, AR)?;
        self.params.realloc_block(q, MA)?;
        if self.trunc < p {
            self.trunc = p;
        }
        Ok(())
    }

    /// Lags of `a(L)` actually used: the truncation lag, widened to the AR
    /// order if the AR block outgrew it.
    pub fn depth(&self) -> usize {
        self.trunc.max(self.ar_order())
    }

    fn with_poly<R>(&self, f: impl FnOnce(&ArFracPoly) -> R) -> R {
        self.cache.with(self.params.values(AR), self.params.scalar(FRACD), self.depth(), f)
    }

    fn offsets(&self, offset: usize) -> (usize, usize, usize) {
        let p = self.ar_order();
        let q = self.ma_order();
        (offset, offset + p, offset + p + q)
    }
}

impl CondMeanComponent for Arfima {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        self.depth().max(self.ma_order())
    }

    fn compute_mean(&self, date: usize, data: &RegArchValue) -> f64 {
        let depth = self.depth().min(date);
        let ar_part: f64 =
            self.with_poly(|poly| (1..=depth).map(|k| -poly.a[k] * data.y_lag(date, k)).sum());
        ar_part + ma_mean(self.params.values(MA), date, data)
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
    ) {
        let (ar_off, ma_off, d_off) = self.offsets(offset);
        let mut local = Array1::zeros(grad.n_param());
        self.with_poly(|poly| {
            for k in 1..=self.depth().min(date) {
                let y = data.y_lag(date, k);
                for i in 1..=self.ar_order().min(k) {
                    local[ar_off + i - 1] += poly.pi_shift(k, i) * y;
                }
                local[d_off] -= poly.d_a[k] * y;
            }
        });
        ma_grad(self.params.values(MA), date, data, grad, ma_off, &mut local);
        add_to_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize,
    ) {
        let (ar_off, ma_off, d_off) = self.offsets(offset);
        let n = hess.n_param();
        let mut local = Array2::zeros((n, n));
        self.with_poly(|poly| {
            for k in 1..=self.depth().min(date) {
                let y = data.y_lag(date, k);
                for i in 1..=self.ar_order().min(k) {
                    let v = poly.d_pi_shift(k, i) * y;
                    local[[ar_off + i - 1, d_off]] += v;
                    local[[d_off, ar_off + i - 1]] += v;
                }
                local[[d_off, d_off]] -= poly.d2_a[k] * y;
            }
        });
        ma_hess(self.params.values(MA), date, grad, hess, ma_off, &mut local);
        add_to_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, _var: f64) {
        self.params.values_mut(AR).fill(0.0);
        self.params.values_mut(MA).fill(0.0);
        self.params.values_mut(FRACD).fill(DEFAULT_FRACD);
    }
}
