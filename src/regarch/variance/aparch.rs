//! APARCH(p, q) power variance.
//!
//! Purpose
//! -------
//! `s_t = ω + Σ_{i=1..p} α_i (|U_{t−i}| − γ_i U_{t−i})^δ + Σ_{j=1..q} β_j H_{t−j}^{δ/2}`,
//! `h_t = s_t^{2/δ}`.
//!
//! Key behaviors
//! -------------
//! - Every power is written through its logarithm, so the δ-derivatives are
//!   plain products: `∂(a^δ) = a^δ (δ ∂ln a + ln a · e_δ)`.
//! - The level `s_t` and its derivatives are assembled first, then mapped to
//!   `ln h_t = (2/δ) ln s_t` and finally to `h_t`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `|γ_i| < 1` keeps `a = |u| − γu > 0` for `u ≠ 0`; a zero residual drops
//!   its term (`a^δ = 0` and flat for `δ > 1`).
//! - δ = 2, γ = 0 reproduces GARCH(p, q).
use crate::regarch::{
    core::{
        GradientState, HessianState, ParamBlocks, RegArchValue,
        linalg::{add_outer, add_sym_unit},
    },
    errors::RegArchResult,
    residuals::Residuals,
    variance::{CondVarComponent, set_current_grad, set_current_hess},
};
use ndarray::{Array1, Array2};

const CONST: usize = 0;
const DELTA: usize = 1;
const ARCH: usize = 2;
const GAMMA: usize = 3;
const GARCH: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Aparch {
    params: ParamBlocks,
}

/// `s_t` with its gradient and, on demand, its Hessian.
struct Level {
    s: f64,
    grad: Array1<f64>,
    hess: Option<Array2<f64>>,
}

impl Aparch {
    pub fn new(p: usize, q: usize) -> Self {
        Aparch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_scalar("delta", 2.0)
                .with_vector("arch", p)
                .with_vector("gamma", p)
                .with_vector("garch", q),
        }
    }

    pub fn orders(&self) -> (usize, usize) {
        (self.params.block_len(ARCH), self.params.block_len(GARCH))
    }

    pub fn realloc(&mut self, p: usize, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(p, ARCH)?;
        self.params.realloc_block(p, GAMMA)?;
        self.params.realloc_block(q, GARCH)
    }

    fn idx(&self, offset: usize, block: usize) -> usize {
        offset + self.params.block_offset(block)
    }

    fn level(
        &self, date: usize, data: &RegArchValue, grad: &GradientState,
        hess: Option<&HessianState>, offset: usize,
    ) -> Level {
        let (p, q) = self.orders();
        let n = grad.n_param();
        let delta = self.params.scalar(DELTA);
        let alpha = self.params.values(ARCH);
        let gamma = self.params.values(GAMMA);
        let beta = self.params.values(GARCH);
        let delta_idx = self.idx(offset, DELTA);

        let mut s = self.params.scalar(CONST);
        let mut gs = Array1::zeros(n);
        gs[self.idx(offset, CONST)] = 1.0;
        let mut hs = hess.map(|_| Array2::zeros((n, n)));

        for i in 1..=p.min(date) {
            let u = data.u_lag(date, i);
            let gi = gamma[i - 1];
            let ai = alpha[i - 1];
            let a = u.abs() - gi * u;
            if a <= 0.0 {
                continue;
            }
            let alpha_idx = self.idx(offset, ARCH) + i - 1;
            let gamma_idx = self.idx(offset, GAMMA) + i - 1;
            let pow = a.powf(delta);
            let log_a = a.ln();
            let slope = u.signum() - gi;

            let grad_u = grad.grad_u_lag(i).unwrap_or_else(|| Array1::zeros(n));
            let mut grad_a = grad_u.mapv(|x| slope * x);
            grad_a[gamma_idx] -= u;
            let grad_log_a = grad_a.mapv(|x| x / a);
            let mut v = grad_log_a.mapv(|x| delta * x);
            v[delta_idx] += log_a;

            s += ai * pow;
            gs[alpha_idx] += pow;
            gs.scaled_add(ai * pow, &v);

            if let Some(hs) = hs.as_mut() {
                // ∂²a = (sgn u − γ) ∂²u − sym(e_γ, ∂u), with ∂²u = −∂²m
                let mut hess_a = Array2::zeros((n, n));
                if let Some(hm) = hess.and_then(|h| h.hess_mu_lag(i)) {
                    hess_a.scaled_add(-slope, &hm);
                }
                add_sym_unit(&mut hess_a, gamma_idx, -1.0, grad_u.view());

                let mut hess_log_a = hess_a.mapv(|x| x / a);
                add_outer(&mut hess_log_a, -1.0, grad_log_a.view(), grad_log_a.view());

                let mut hess_pow = hess_log_a.mapv(|x| delta * x);
                add_outer(&mut hess_pow, 1.0, v.view(), v.view());
                add_sym_unit(&mut hess_pow, delta_idx, 1.0, grad_log_a.view());

                add_sym_unit(hs, alpha_idx, pow, v.view());
                hs.scaled_add(ai * pow, &hess_pow);
            }
        }

        for j in 1..=q.min(date) {
            let hl = data.h_lag(date, j);
            let b = beta[j - 1];
            let beta_idx = self.idx(offset, GARCH) + j - 1;
            let log_h = hl.ln();
            let sj = (0.5 * delta * log_h).exp();
            let grad_log_h = grad
                .grad_var_lag(j)
                .map(|g| g.mapv(|x| x / hl))
                .unwrap_or_else(|| Array1::zeros(n));
            let mut w = grad_log_h.mapv(|x| 0.5 * delta * x);
            w[delta_idx] += 0.5 * log_h;

            s += b * sj;
            gs[beta_idx] += sj;
            gs.scaled_add(b * sj, &w);

            if let Some(hs) = hs.as_mut() {
                let mut hess_log_h = match hess.and_then(|h| h.hess_var_lag(j)) {
                    Some(hh) => hh.mapv(|x| x / hl),
                    None => Array2::zeros((n, n)),
                };
                add_outer(&mut hess_log_h, -1.0, grad_log_h.view(), grad_log_h.view());

                let mut hess_sj = hess_log_h.mapv(|x| 0.5 * delta * x);
                add_outer(&mut hess_sj, 1.0, w.view(), w.view());
                add_sym_unit(&mut hess_sj, delta_idx, 0.5, grad_log_h.view());

                add_sym_unit(hs, beta_idx, sj, w.view());
                hs.scaled_add(b * sj, &hess_sj);
            }
        }
        Level { s, grad: gs, hess: hs }
    }

    /// Map the level to `(h, ∂ln h, ∂²ln h)`.
    fn log_variance(&self, level: &Level, offset: usize) -> (f64, Array1<f64>, Option<Array2<f64>>) {
        let delta = self.params.scalar(DELTA);
        let delta_idx = self.idx(offset, DELTA);
        let log_s = level.s.ln();
        let grad_log_s = level.grad.mapv(|x| x / level.s);
        let mut grad_lh = grad_log_s.mapv(|x| 2.0 / delta * x);
        grad_lh[delta_idx] -= 2.0 / (delta * delta) * log_s;
        let hess_lh = level.hess.as_ref().map(|hs| {
            let mut hess_log_s = hs.mapv(|x| x / level.s);
            add_outer(&mut hess_log_s, -1.0, grad_log_s.view(), grad_log_s.view());
            let mut out = hess_log_s.mapv(|x| 2.0 / delta * x);
            add_sym_unit(&mut out, delta_idx, -2.0 / (delta * delta), grad_log_s.view());
            out[[delta_idx, delta_idx]] += 4.0 / delta.powi(3) * log_s;
            out
        });
        ((2.0 / delta * log_s).exp(), grad_lh, hess_lh)
    }
}

impl CondVarComponent for Aparch {
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
        let delta = self.params.scalar(DELTA);
        let alpha = self.params.values(ARCH);
        let gamma = self.params.values(GAMMA);
        let beta = self.params.values(GARCH);
        let mut s = self.params.scalar(CONST);
        for i in 1..=p.min(date) {
            let u = data.u_lag(date, i);
            let a = u.abs() - gamma[i - 1] * u;
            if a > 0.0 {
                s += alpha[i - 1] * a.powf(delta);
            }
        }
        for j in 1..=q.min(date) {
            s += beta[j - 1] * data.h_lag(date, j).powf(0.5 * delta);
        }
        s.powf(2.0 / delta)
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let level = self.level(date, data, grad, None, offset);
        let (h, grad_lh, _) = self.log_variance(&level, offset);
        set_current_grad(grad, &grad_lh.mapv(|x| h * x));
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let level = self.level(date, data, grad, Some(&*hess), offset);
        let (h, grad_lh, hess_lh) = self.log_variance(&level, offset);
        if let Some(mut out) = hess_lh {
            add_outer(&mut out, 1.0, grad_lh.view(), grad_lh.view());
            out.mapv_inplace(|x| h * x);
            set_current_hess(hess, &out);
        }
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let (p, q) = self.orders();
        let alpha_sum = if p > 0 { 0.1 } else { 0.0 };
        let beta_sum = if q > 0 { 0.8 } else { 0.0 };
        if p > 0 {
            self.params.values_mut(ARCH).fill(alpha_sum / p as f64);
            self.params.values_mut(GAMMA).fill(0.0);
        }
        if q > 0 {
            self.params.values_mut(GARCH).fill(beta_sum / q as f64);
        }
        self.params.values_mut(DELTA).fill(2.0);
        self.params.values_mut(CONST).fill(var * (1.0 - alpha_sum - beta_sum));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::variance::Garch;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Nesting: with δ = 2 and γ = 0 the power recursion is GARCH, for both the
    // values and the shared-coordinate gradients. The asymmetric case is
    // checked on a hand value.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // δ = 2, γ = 0 reproduces GARCH(1, 1) over a short path.
    //
    // Given
    // -----
    // - ω = 0.2, α = 0.15, β = 0.6; U = [1, −2, 0.5].
    //
    // Expect
    // ------
    // - Identical H_t; ∂h/∂(ω, α, β) agree with the GARCH gradient.
    fn nests_garch_at_delta_two() {
        let mut ap = Aparch::new(1, 1);
        ap.params_mut().from_vector(&array![0.2, 2.0, 0.15, 0.0, 0.6], 0).unwrap();
        let ga = Garch::with_coefficients(0.2, array![0.15], array![0.6]);

        let mut data = RegArchValue::from_data(array![1.0, -2.0, 0.5]).unwrap();
        data.ut = array![1.0, -2.0, 0.5];
        let distr = Residuals::default();
        let mut g_ap = GradientState::new(1, 0, 5, 0);
        let mut g_ga = GradientState::new(1, 0, 3, 0);
        for t in 0..3 {
            let h_ap = ap.compute_var(t, &data, &distr);
            let h_ga = ga.compute_var(t, &data, &distr);
            assert_relative_eq!(h_ap, h_ga, epsilon = 1e-12);
            data.ht[t] = h_ga;
            g_ap.update();
            g_ga.update();
            ap.compute_grad(t, &data, &mut g_ap, 0, &distr);
            ga.compute_grad(t, &data, &mut g_ga, 0, &distr);
            let (a, b) = (g_ap.current_grad_var(), g_ga.current_grad_var());
            assert_relative_eq!(a[0], b[0], epsilon = 1e-10);
            assert_relative_eq!(a[2], b[1], epsilon = 1e-10);
            assert_relative_eq!(a[4], b[2], epsilon = 1e-10);
        }
    }

    #[test]
    // Purpose
    // -------
    // Asymmetric power term on a hand value.
    //
    // Given
    // -----
    // - ω = 0.1, δ = 1, α = 0.3, γ = 0.5, no β; U_0 = −2.
    //
    // Expect
    // ------
    // - s_1 = 0.1 + 0.3(2 + 1) = 1.0, H_1 = s² = 1.0.
    fn leverage_term_matches_hand_value() {
        let mut ap = Aparch::new(1, 0);
        ap.params_mut().from_vector(&array![0.1, 1.0, 0.3, 0.5], 0).unwrap();
        let mut data = RegArchValue::from_data(array![-2.0, 0.0]).unwrap();
        data.ut[0] = -2.0;
        assert_relative_eq!(ap.compute_var(1, &data, &Residuals::default()), 1.0, epsilon = 1e-12);
    }
}
