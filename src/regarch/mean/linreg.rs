//! Linear regression mean `m_t = Σ_i β_i X[t, i]` on the mean regressors.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::{RegArchError, RegArchResult},
    mean::CondMeanComponent,
};

const BETA: usize = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct LinReg {
    params: ParamBlocks,
}

impl LinReg {
    /// Regression on `n` regressors (columns of `RegArchValue::xt`).
    pub fn new(n: usize) -> Self {
        LinReg { params: ParamBlocks::new().with_vector("beta", n) }
    }

    pub fn n_regressors(&self) -> usize {
        self.params.block_len(BETA)
    }

    pub fn realloc(&mut self, n: usize) -> RegArchResult<()> {
        self.params.realloc_block(n, BETA)
    }
}

impl CondMeanComponent for LinReg {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn n_lags(&self) -> usize {
        0
    }

    /// Without regressors in `data` the contribution is 0; model drivers call
    /// [`CondMeanComponent::check_data`] first.
    fn compute_mean(&self, date: usize, data: &RegArchValue) -> f64 {
        match &data.xt {
            Some(x) => x.row(date).dot(&self.params.values(BETA)),
            None => 0.0,
        }
    }

    fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
    ) {
        if let Some(x) = &data.xt {
            let n = self.n_regressors();
            let mut current = grad.current_grad_mu_mut();
            let mut block = current.slice_mut(ndarray::s![offset..offset + n]);
            block += &x.row(date);
        }
    }

    fn compute_hess(
        &self, _date: usize, _data: &RegArchValue, _grad: &GradientState, _hess: &mut HessianState,
        _offset: usize,
    ) {
    }

    fn set_default_init_point(&mut self, _mean: f64, _var: f64) {
        self.params.values_mut(BETA).fill(0.0);
    }

    fn check_data(&self, data: &RegArchValue) -> RegArchResult<()> {
        let x = data.xt.as_ref().ok_or(RegArchError::MissingRegressors { component: "LinReg" })?;
        if x.ncols() != self.n_regressors() {
            return Err(RegArchError::RegressorShapeMismatch {
                expected: (data.len(), self.n_regressors()),
                actual: x.dim(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The mean is the row-wise product with the coefficients; the gradient
    // is the regressor row.
    //
    // Given
    // -----
    // - X = [[1, 2], [3, 4]], β = [0.5, −1].
    //
    // Expect
    // ------
    // - m_1 = 1.5 − 4 = −2.5; ∂m_1 = [3, 4] at offset 1.
    fn mean_and_gradient_follow_regressor_row() {
        let mut lr = LinReg::new(2);
        lr.params_mut().set_vector_index(&array![0.5, -1.0], 0).unwrap();
        let data = RegArchValue::with_regressors(
            array![0.0, 0.0],
            Some(array![[1.0, 2.0], [3.0, 4.0]]),
            None,
        )
        .unwrap();
        assert_eq!(lr.compute_mean(1, &data), -2.5);
        let mut g = GradientState::new(0, 3, 0, 0);
        lr.compute_grad(1, &data, &mut g, 1);
        assert_eq!(g.current_grad_mu(), array![0.0, 3.0, 4.0]);
    }

    #[test]
    // Purpose
    // -------
    // Missing or mis-sized regressors are reported by `check_data`.
    fn check_data_reports_missing_and_mis_sized_regressors() {
        let lr = LinReg::new(2);
        let bare = RegArchValue::from_data(array![1.0]).unwrap();
        assert!(matches!(lr.check_data(&bare), Err(RegArchError::MissingRegressors { .. })));
        let narrow =
            RegArchValue::with_regressors(array![1.0], Some(array![[1.0]]), None).unwrap();
        assert!(matches!(
            lr.check_data(&narrow),
            Err(RegArchError::RegressorShapeMismatch { .. })
        ));
    }
}
