//! TARCH(q) threshold variance.
//!
//! `h_t = ω + Σ_{i=1..q} (α⁺_i 1{U_{t−i} > 0} + α⁻_i 1{U_{t−i} ≤ 0}) U²_{t−i}`
//!
//! The regime indicator is piecewise constant, so each lag contributes the
//! plain ARCH derivative terms of whichever coefficient is active.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::RegArchResult,
    residuals::Residuals,
    variance::{
        CondVarComponent, add_sq_resid_grad, add_sq_resid_hess, set_current_grad,
        set_current_hess, zeros_grad, zeros_hess,
    },
};

const CONST: usize = 0;
const ARCH_POS: usize = 1;
const ARCH_NEG: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Tarch {
    params: ParamBlocks,
}

impl Tarch {
    pub fn new(q: usize) -> Self {
        Tarch {
            params: ParamBlocks::new()
                .with_scalar("const", 0.0)
                .with_vector("archpos", q)
                .with_vector("archneg", q),
        }
    }

    pub fn order(&self) -> usize {
        self.params.block_len(ARCH_POS)
    }

    pub fn realloc(&mut self, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(q, ARCH_POS)?;
        self.params.realloc_block(q, ARCH_NEG)
    }

    /// Active coefficient and its position in the model vector.
    fn regime(&self, u: f64, lag: usize, offset: usize) -> (f64, usize) {
        let block = if u > 0.0 { ARCH_POS } else { ARCH_NEG };
        (self.params.values(block)[lag - 1], offset + self.params.block_offset(block) + lag - 1)
    }
}

impl CondVarComponent for Tarch {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        self.order()
    }

    fn compute_var(&self, date: usize, data: &RegArchValue, _distr: &Residuals) -> f64 {
        let mut h = self.params.scalar(CONST);
        for i in 1..=self.order().min(date) {
            let u = data.u_lag(date, i);
            let (coef, _) = self.regime(u, i, 0);
            h += coef * u * u;
        }
        h
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let mut local = zeros_grad(grad);
        local[offset] = 1.0;
        for i in 1..=self.order().min(date) {
            let u = data.u_lag(date, i);
            let (coef, idx) = self.regime(u, i, offset);
            let gu = grad.grad_u_lag(i);
            add_sq_resid_grad(&mut local, u, gu.as_ref(), coef, idx);
        }
        set_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let mut local = zeros_hess(hess);
        for i in 1..=self.order().min(date) {
            let u = data.u_lag(date, i);
            let (coef, idx) = self.regime(u, i, offset);
            let gu = grad.grad_u_lag(i);
            add_sq_resid_hess(&mut local, u, gu.as_ref(), hess.hess_mu_lag(i), coef, idx);
        }
        set_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        self.params.values_mut(ARCH_POS).fill(0.05);
        self.params.values_mut(ARCH_NEG).fill(0.05);
        self.params.values_mut(CONST).fill(0.9 * var);
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
    // The sign of the lagged residual selects the coefficient block, in both
    // the value and the gradient.
    //
    // Given
    // -----
    // - TARCH(1): ω = 0.1, α⁺ = 0.2, α⁻ = 0.5; U_0 = −2 at date 1.
    //
    // Expect
    // ------
    // - H_1 = 0.1 + 0.5·4 = 2.1; ∂h = [1, 0, 4].
    fn negative_residual_uses_negative_block() {
        let mut t = Tarch::new(1);
        t.params_mut().from_vector(&array![0.1, 0.2, 0.5], 0).unwrap();
        let mut data = RegArchValue::from_data(array![0.0, 0.0]).unwrap();
        data.ut[0] = -2.0;
        let distr = Residuals::default();
        assert_relative_eq!(t.compute_var(1, &data, &distr), 2.1, epsilon = 1e-12);

        let mut g = GradientState::new(1, 0, 3, 0);
        t.compute_grad(1, &data, &mut g, 0, &distr);
        assert_eq!(g.current_grad_var().to_vec(), vec![1.0, 0.0, 4.0]);

        data.ut[0] = 2.0;
        assert_relative_eq!(t.compute_var(1, &data, &distr), 0.9, epsilon = 1e-12);
    }
}
