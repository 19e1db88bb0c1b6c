//! ARCH(q) variance `h_t = ω + Σ_{i=1..q} α_i U²_{t−i}`.
//!
//! Shares the residual-square terms with [`Garch`](super::Garch); the
//! recursion has no own-lag part, so `∂H_{t−j}` is never read.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::RegArchResult,
    residuals::Residuals,
    variance::{CondVarComponent, garch::GarchTerms, set_current_grad, set_current_hess},
};
use ndarray::Array1;

const CONST: usize = 0;
const ARCH: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Arch {
    params: ParamBlocks,
}

impl Arch {
    pub fn new(q: usize) -> Self {
        Arch { params: ParamBlocks::new().with_scalar("const", 0.0).with_vector("arch", q) }
    }

    pub fn with_coefficients(omega: f64, alpha: Array1<f64>) -> Self {
        let mut a = Arch::new(alpha.len());
        a.params.values_mut(CONST).fill(omega);
        a.params.values_mut(ARCH).assign(&alpha);
        a
    }

    pub fn order(&self) -> usize {
        self.params.block_len(ARCH)
    }

    pub fn realloc(&mut self, q: usize) -> RegArchResult<()> {
        self.params.realloc_block(q, ARCH)
    }

    fn terms(&self) -> GarchTerms<'_> {
        GarchTerms { params: &self.params, arch_block: ARCH, garch_block: None }
    }
}

impl CondVarComponent for Arch {
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
        self.terms().var(date, data)
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let local = self.terms().grad(date, data, grad, offset);
        set_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize, _distr: &Residuals,
    ) {
        let local = self.terms().hess(date, data, grad, hess, offset);
        set_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        let q = self.order();
        if q == 0 {
            self.params.values_mut(CONST).fill(var);
            return;
        }
        self.params.values_mut(ARCH).fill(0.1 / q as f64);
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
    // ARCH(0) degenerates to a constant variance with gradient e_ω.
    fn order_zero_is_constant_variance() {
        let a = Arch::with_coefficients(0.7, Array1::zeros(0));
        let data = RegArchValue::from_data(array![3.0, -2.0, 1.0]).unwrap();
        assert_eq!(a.compute_var(2, &data, &Residuals::default()), 0.7);
        let mut g = GradientState::new(0, 1, 1, 0);
        a.compute_grad(2, &data, &mut g, 1, &Residuals::default());
        assert_eq!(g.current_grad_var().to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // Residuals beyond the sample start are dropped.
    //
    // Given
    // -----
    // - ARCH(2) with ω = 0.1, α = [0.2, 0.3], U = [1, 2, 3].
    //
    // Expect
    // ------
    // - H_1 = 0.1 + 0.2·1 = 0.3; H_2 = 0.1 + 0.2·4 + 0.3·1 = 1.2.
    fn recursion_drops_pre_sample_residuals() {
        let a = Arch::with_coefficients(0.1, array![0.2, 0.3]);
        let mut data = RegArchValue::from_data(array![1.0, 2.0, 3.0]).unwrap();
        data.ut = array![1.0, 2.0, 3.0];
        let distr = Residuals::default();
        assert_relative_eq!(a.compute_var(1, &data, &distr), 0.3, epsilon = 1e-12);
        assert_relative_eq!(a.compute_var(2, &data, &distr), 1.2, epsilon = 1e-12);
    }
}
