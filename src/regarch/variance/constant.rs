//! Constant variance `h_t = c`.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    residuals::Residuals,
    variance::{CondVarComponent, set_current_grad, set_current_hess, zeros_grad, zeros_hess},
};

const CONSTVAR: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstVar {
    params: ParamBlocks,
}

impl Default for ConstVar {
    fn default() -> Self {
        ConstVar::new(1.0)
    }
}

impl ConstVar {
    pub fn new(value: f64) -> Self {
        ConstVar { params: ParamBlocks::new().with_scalar("constvar", value) }
    }
}

impl CondVarComponent for ConstVar {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        0
    }

    fn compute_var(&self, _date: usize, _data: &RegArchValue, _distr: &Residuals) -> f64 {
        self.params.scalar(CONSTVAR)
    }

    fn compute_grad(
        &self, _date: usize, _data: &RegArchValue, grad: &mut GradientState, offset: usize,
        _distr: &Residuals,
    ) {
        let mut local = zeros_grad(grad);
        local[offset] = 1.0;
        set_current_grad(grad, &local);
    }

    fn compute_hess(
        &self, _date: usize, _data: &RegArchValue, _grad: &GradientState, hess: &mut HessianState,
        _offset: usize, _distr: &Residuals,
    ) {
        let local = zeros_hess(hess);
        set_current_hess(hess, &local);
    }

    fn set_default_init_point(&mut self, _mean: f64, var: f64) {
        self.params.values_mut(CONSTVAR).fill(var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The constant is returned whatever the date or data; the default
    // initial point is the sample variance.
    fn constant_ignores_date_and_data() {
        let mut c = ConstVar::new(2.5);
        let data = RegArchValue::from_data(array![1.0, 5.0, -3.0]).unwrap();
        let distr = Residuals::default();
        for t in 0..3 {
            assert_eq!(c.compute_var(t, &data, &distr), 2.5);
        }
        c.set_default_init_point(0.0, 7.0);
        assert_eq!(c.compute_var(0, &data, &distr), 7.0);
    }
}
