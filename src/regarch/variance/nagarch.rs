//! NAGARCH(p, q) nonlinear asymmetric variance.
//!
//! `h_t = ω + Σ_{i=1..p} α_i (U_{t−i} − θ σ_{t−i})² + Σ_{j=1..q} β_j H_{t−j}`
//!
//! The shifted residual `z = U − θσ` reads the lagged standard deviation, so
//! `∂z = ∂U − σ e_θ − θ ∂σ` pulls in `∂H_{t−i}` even for the ARCH part. The
//! window therefore needs depth `max(p, q)` for both the mean and variance
//! slots.
use crate::regarch::{
    core::{
        GradientState, HessianState, ParamBlocks, RegArchValue,
        linalg::{add_outer, add_sym_unit},
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
const TETA: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Nagarch {
    params: ParamBlocks,
}

/// Shifted residual `z` with its first and second derivatives.
struct Shifted {
    z: f64,
    grad: Array1<f64>,
    hess: Option<Array2<f64>>,
}

impl Nagarch {
    pub fn new(p: usize, q: usize) -> Self {
        Nagarch {
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

    fn shifted(
        &self, date: usize, lag: usize, data: &RegArchValue, grad: &GradientState,
        hess: Option<&HessianState>, offset: usize,
    ) -> Shifted {
        let n = grad.n_param();
        let theta = self.params.scalar(TETA);
        let teta_idx = offset + self.params.block_offset(TETA);
        let u = data.u_lag(date, lag);
        let h = data.h_lag(date, lag);

        let zero: Array1<f64> = Array1::zeros(n);
        let grad_h = grad.grad_var_lag(lag).unwrap_or_else(|| zero.view());
        let hess_h = hess.and_then(|hs| hs.hess_var_lag(lag));
        let (sigma, grad_sigma, hess_sigma) = sigma_derivatives(h, grad_h, hess_h);

        let mut gz = grad.grad_u_lag(lag).unwrap_or_else(|| Array1::zeros(n));
        gz[teta_idx] -= sigma;
        gz.scaled_add(-theta, &grad_sigma);

        let hz = hess.map(|hs| {
            let mut out = Array2::zeros((n, n));
            if let Some(hm) = hs.hess_mu_lag(lag) {
                out.scaled_add(-1.0, &hm);
            }
            add_sym_unit(&mut out, teta_idx, -1.0, grad_sigma.view());
            if let Some(hsig) = &hess_sigma {
                out.scaled_add(-theta, hsig);
            }
            out
        });
        Shifted { z: u - theta * sigma, grad: gz, hess: hz }
    }
}

impl CondVarComponent for Nagarch {
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
            let z = data.u_lag(date, i) - theta * data.h_lag(date, i).sqrt();
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
            let sh = self.shifted(date, i, data, grad, None, offset);
            local[alpha_off + i - 1] += sh.z * sh.z;
            local.scaled_add(2.0 * alpha[i - 1] * sh.z, &sh.grad);
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
            let sh = self.shifted(date, i, data, grad, Some(&*hess), offset);
            let a = alpha[i - 1];
            add_sym_unit(&mut local, alpha_off + i - 1, 2.0 * sh.z, sh.grad.view());
            add_outer(&mut local, 2.0 * a, sh.grad.view(), sh.grad.view());
            if let Some(hz) = &sh.hess {
                local.scaled_add(2.0 * a * sh.z, hz);
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
            self.params.values_mut(ARCH).fill(0.1 / p as f64);
        }
        if q > 0 {
            self.params.values_mut(GARCH).fill(0.8 / q as f64);
        }
        self.params.values_mut(TETA).fill(0.0);
        self.params.values_mut(CONST).fill(0.1 * var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The shift θσ moves the news-impact minimum away from zero.
    //
    // Given
    // -----
    // - NAGARCH(1, 1): ω = 0.1, α = 0.2, β = 0.5, θ = 0.5; H_0 = 4, U_0 = 1.
    //
    // Expect
    // ------
    // - z = 1 − 0.5·2 = 0, so H_1 = 0.1 + 0.5·4 = 2.1.
    // - ∂h/∂θ = 2αz(−σ) = 0; ∂h/∂α = z² = 0; ∂h/∂β = H_0.
    fn shifted_residual_hand_values() {
        let mut n = Nagarch::new(1, 1);
        n.params_mut().from_vector(&array![0.1, 0.2, 0.5, 0.5], 0).unwrap();
        let mut data = RegArchValue::from_data(array![0.0, 0.0]).unwrap();
        data.ut[0] = 1.0;
        data.ht[0] = 4.0;
        let distr = Residuals::default();
        assert_relative_eq!(n.compute_var(1, &data, &distr), 2.1, epsilon = 1e-12);

        let mut g = GradientState::new(1, 0, 4, 0);
        g.update();
        n.compute_grad(1, &data, &mut g, 0, &distr);
        let gv = g.current_grad_var();
        assert_relative_eq!(gv[0], 1.0);
        assert_relative_eq!(gv[1], 0.0);
        assert_relative_eq!(gv[2], 4.0);
        assert_relative_eq!(gv[3], 0.0);
    }
}
