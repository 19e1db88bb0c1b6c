//! RegArchModel — the aggregate binding mean components, one variance
//! component and one residual law.
//!
//! Purpose
//! -------
//! Own the component set and expose the bookkeeping the drivers need:
//! parameter-block sizes and offsets, the flat parameter vector, window
//! sizing and validation, and default initial points.
//!
//! Key behaviors
//! -------------
//! - Mean components are kept in insertion order; at most one per
//!   [`MeanKind`].
//! - [`RegArchModel::gradient_state`] / [`RegArchModel::hessian_state`] build
//!   windows sized to the model; [`RegArchModel::check_gradient_state`] and
//!   [`RegArchModel::check_hessian_state`] validate caller-provided ones.
//!
//! Invariants & assumptions
//! ------------------------
//! - The aggregate does not own derivative windows or data; each evaluation
//!   passes them in.
//! - Resizing a component after a window was built invalidates that window;
//!   the check methods report it as [`RegArchError::GradientShapeMismatch`].
use crate::regarch::{
    core::{GradientState, HessianState, RegArchValue},
    errors::{RegArchError, RegArchResult},
    mean::{CondMean, MeanKind},
    residuals::Residuals,
    variance::CondVar,
};
use ndarray::Array1;

/// Mean components, variance component and residual law of one model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegArchModel {
    means: Vec<CondMean>,
    var: CondVar,
    distr: Residuals,
}

impl RegArchModel {
    /// Model with no mean component (zero conditional mean).
    pub fn new(var: CondVar, distr: Residuals) -> Self {
        RegArchModel { means: Vec::new(), var, distr }
    }

    /// Model with an initial list of mean components.
    ///
    /// # Errors
    /// - [`RegArchError::DuplicateMean`] if two components share a kind.
    pub fn with_means(means: Vec<CondMean>, var: CondVar, distr: Residuals) -> RegArchResult<Self> {
        let mut model = RegArchModel::new(var, distr);
        for m in means {
            model.add_mean(m)?;
        }
        Ok(model)
    }

    // ---- Component management ----

    /// Append a mean component; its parameters go after the existing means.
    pub fn add_mean(&mut self, mean: CondMean) -> RegArchResult<()> {
        if self.means.iter().any(|m| m.kind() == mean.kind()) {
            return Err(RegArchError::DuplicateMean { kind: mean.kind().to_string() });
        }
        self.means.push(mean);
        Ok(())
    }

    /// Remove and return the mean component of `kind`.
    pub fn remove_mean(&mut self, kind: MeanKind) -> RegArchResult<CondMean> {
        let pos = self
            .means
            .iter()
            .position(|m| m.kind() == kind)
            .ok_or_else(|| RegArchError::MeanNotFound { kind: kind.to_string() })?;
        Ok(self.means.remove(pos))
    }

    pub fn mean_kinds(&self) -> Vec<MeanKind> {
        self.means.iter().map(CondMean::kind).collect()
    }

    pub fn get_mean(&self, kind: MeanKind) -> Option<&CondMean> {
        self.means.iter().find(|m| m.kind() == kind)
    }

    pub fn get_mean_mut(&mut self, kind: MeanKind) -> Option<&mut CondMean> {
        self.means.iter_mut().find(|m| m.kind() == kind)
    }

    pub fn means(&self) -> &[CondMean] {
        &self.means
    }

    pub fn var(&self) -> &CondVar {
        &self.var
    }

    pub fn var_mut(&mut self) -> &mut CondVar {
        &mut self.var
    }

    pub fn set_var(&mut self, var: CondVar) {
        self.var = var;
    }

    pub fn distr(&self) -> &Residuals {
        &self.distr
    }

    pub fn distr_mut(&mut self) -> &mut Residuals {
        &mut self.distr
    }

    pub fn set_distr(&mut self, distr: Residuals) {
        self.distr = distr;
    }

    // ---- Shape ----

    pub fn n_mean_param(&self) -> usize {
        self.means.iter().map(CondMean::n_param).sum()
    }

    pub fn n_var_param(&self) -> usize {
        self.var.n_param()
    }

    pub fn n_distr_param(&self) -> usize {
        self.distr.n_param()
    }

    pub fn n_param(&self) -> usize {
        self.n_mean_param() + self.n_var_param() + self.n_distr_param()
    }

    /// `(mean, variance, distribution)` block sizes.
    pub fn block_sizes(&self) -> (usize, usize, usize) {
        (self.n_mean_param(), self.n_var_param(), self.n_distr_param())
    }

    /// Largest lag read by any component; the minimum window depth.
    pub fn n_lags(&self) -> usize {
        self.means.iter().map(CondMean::n_lags).fold(self.var.n_lags(), usize::max)
    }

    /// Start of each mean component's block in the model vector.
    pub fn mean_offsets(&self) -> Vec<usize> {
        self.means
            .iter()
            .scan(0, |acc, m| {
                let start = *acc;
                *acc += m.n_param();
                Some(start)
            })
            .collect()
    }

    // ---- Parameter vector ----

    /// Write all parameters into `dest[offset..offset + n_param]`.
    pub fn param_to_vector(&self, dest: &mut Array1<f64>, offset: usize) -> RegArchResult<()> {
        self.check_vector_len(dest.len(), offset)?;
        let mut pos = offset;
        for m in &self.means {
            m.param_to_vector(dest, pos)?;
            pos += m.n_param();
        }
        self.var.param_to_vector(dest, pos)?;
        pos += self.var.n_param();
        self.distr.param_to_vector(dest, pos)
    }

    /// Read all parameters from `src[offset..offset + n_param]`.
    pub fn vector_to_param(&mut self, src: &Array1<f64>, offset: usize) -> RegArchResult<()> {
        self.check_vector_len(src.len(), offset)?;
        let mut pos = offset;
        for m in &mut self.means {
            m.vector_to_param(src, pos)?;
            pos += m.n_param();
        }
        self.var.vector_to_param(src, pos)?;
        pos += self.var.n_param();
        self.distr.vector_to_param(src, pos)
    }

    /// Owned copy of the full parameter vector.
    pub fn to_vector(&self) -> RegArchResult<Array1<f64>> {
        let mut theta = Array1::zeros(self.n_param());
        self.param_to_vector(&mut theta, 0)?;
        Ok(theta)
    }

    /// One label per entry of [`to_vector`](Self::to_vector), prefixed by
    /// the owning component's kind, e.g. `Garch.arch[1]`.
    pub fn param_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .means
            .iter()
            .flat_map(|m| m.params().labels(&m.kind().to_string()))
            .collect();
        labels.extend(self.var.params().labels(&self.var.kind().to_string()));
        labels.extend(self.distr.params().labels(&format!("{:?}", self.distr.kind())));
        labels
    }

    /// Every component's default point from the sample moments of `Y`.
    pub fn set_default_init_point(&mut self, value: &RegArchValue) -> RegArchResult<()> {
        let (mean, var) = value.compute_mean_and_var()?;
        for m in &mut self.means {
            m.set_default_init_point(mean, var);
        }
        self.var.set_default_init_point(mean, var);
        self.distr.set_default_init_point();
        Ok(())
    }

    // ---- Windows & validation ----

    /// Gradient window with depth [`RegArchModel::n_lags`].
    pub fn gradient_state(&self) -> GradientState {
        let (m, v, d) = self.block_sizes();
        GradientState::new(self.n_lags(), m, v, d)
    }

    /// Hessian window with depth [`RegArchModel::n_lags`].
    pub fn hessian_state(&self) -> HessianState {
        let (m, v, d) = self.block_sizes();
        HessianState::new(self.n_lags(), m, v, d)
    }

    pub fn check_gradient_state(&self, grad: &GradientState) -> RegArchResult<()> {
        self.check_window(grad.block_sizes(), grad.n_past())
    }

    pub fn check_hessian_state(&self, hess: &HessianState) -> RegArchResult<()> {
        self.check_window(hess.block_sizes(), hess.n_past())
    }

    /// Non-empty data carrying whatever regressors the components need.
    pub fn check_data(&self, value: &RegArchValue) -> RegArchResult<()> {
        if value.is_empty() {
            return Err(RegArchError::EmptySeries);
        }
        self.means.iter().try_for_each(|m| m.check_data(value))?;
        self.var.check_data(value)
    }

    /// Resize the variance component's regressor coefficients to the width
    /// of `value.xvt`. Resized blocks restart at zero.
    pub fn sync_size_param(&mut self, value: &RegArchValue) -> RegArchResult<()> {
        self.var.sync_size_param(value)
    }

    // ---- Helper methods ----

    fn check_window(&self, sizes: (usize, usize, usize), n_past: usize) -> RegArchResult<()> {
        let expected = self.block_sizes();
        if sizes != expected {
            return Err(RegArchError::GradientShapeMismatch { expected, actual: sizes });
        }
        let required = self.n_lags();
        if n_past < required {
            return Err(RegArchError::WindowTooShort { required, actual: n_past });
        }
        Ok(())
    }

    fn check_vector_len(&self, len: usize, offset: usize) -> RegArchResult<()> {
        let expected = offset + self.n_param();
        if len < expected {
            return Err(RegArchError::ParamLengthMismatch { expected, actual: len });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::{
        mean::{Ar, ConstMean, Ma},
        residuals::{DistrKind, Student},
        variance::Garch,
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Component management, the block layout of the flat vector, and window
    // validation. Likelihood and derivative drivers are tested in `compute`
    // and `numeric`.
    // -------------------------------------------------------------------------

    fn ar_garch_student() -> RegArchModel {
        RegArchModel::with_means(
            vec![CondMean::Const(ConstMean::new(0.1)), CondMean::Ar(Ar::new(2))],
            CondVar::Garch(Garch::new(1, 1)),
            Residuals::Student(Student::new(8.0)),
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Duplicate kinds are rejected; removal by kind shifts later blocks.
    fn add_and_remove_by_kind() {
        let mut model = ar_garch_student();
        assert!(matches!(
            model.add_mean(CondMean::Ar(Ar::new(1))),
            Err(RegArchError::DuplicateMean { .. })
        ));
        assert_eq!(model.mean_kinds(), vec![MeanKind::Const, MeanKind::Ar]);
        assert_eq!(model.mean_offsets(), vec![0, 1]);

        let removed = model.remove_mean(MeanKind::Const).unwrap();
        assert_eq!(removed.kind(), MeanKind::Const);
        assert_eq!(model.mean_offsets(), vec![0]);
        assert!(matches!(
            model.remove_mean(MeanKind::Ma),
            Err(RegArchError::MeanNotFound { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The flat vector is [means | var | distr] and round-trips.
    //
    // Given
    // -----
    // - Const + AR(2) mean, GARCH(1,1), Student.
    //
    // Expect
    // ------
    // - Block sizes (3, 3, 1); writing then reading returns the same vector.
    fn flat_vector_layout_round_trips() {
        let mut model = ar_garch_student();
        assert_eq!(model.block_sizes(), (3, 3, 1));
        let theta = array![0.2, 0.5, -0.1, 0.05, 0.1, 0.85, 7.0];
        model.vector_to_param(&theta, 0).unwrap();
        assert_eq!(model.to_vector().unwrap(), theta);
        assert_eq!(model.distr().kind(), DistrKind::Student);
        assert!(matches!(
            model.vector_to_param(&array![1.0, 2.0], 0),
            Err(RegArchError::ParamLengthMismatch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Parameter labels follow the flat-vector order.
    //
    // Given
    // -----
    // - Const + AR(2) mean, GARCH(1,1), Student.
    //
    // Expect
    // ------
    // - Seven labels, component-prefixed, with 1-based lag indices on
    //   resizable blocks only.
    fn param_labels_follow_vector_order() {
        let model = ar_garch_student();
        let labels = model.param_labels();
        assert_eq!(
            labels,
            vec![
                "Const.const",
                "Ar.ar[1]",
                "Ar.ar[2]",
                "Garch.const",
                "Garch.arch[1]",
                "Garch.garch[1]",
                "Student.dof",
            ]
        );
        assert_eq!(labels.len(), model.n_param());
    }

    #[test]
    // Purpose
    // -------
    // Windows built by the model pass validation; shallower or mis-sized
    // windows are rejected.
    fn window_validation() {
        let mut model = ar_garch_student();
        model.add_mean(CondMean::Ma(Ma::new(3))).unwrap();
        assert_eq!(model.n_lags(), 3);
        model.check_gradient_state(&model.gradient_state()).unwrap();
        model.check_hessian_state(&model.hessian_state()).unwrap();

        let (m, v, d) = model.block_sizes();
        let shallow = GradientState::new(2, m, v, d);
        assert!(matches!(
            model.check_gradient_state(&shallow),
            Err(RegArchError::WindowTooShort { required: 3, actual: 2 })
        ));
        let wrong = GradientState::new(3, m + 1, v, d);
        assert!(matches!(
            model.check_gradient_state(&wrong),
            Err(RegArchError::GradientShapeMismatch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Default points use the sample moments.
    fn default_point_uses_sample_moments() {
        let mut model = ar_garch_student();
        let value = RegArchValue::from_data(array![1.0, 3.0, 2.0, 6.0]).unwrap();
        model.set_default_init_point(&value).unwrap();
        let c = model.get_mean(MeanKind::Const).unwrap();
        assert_eq!(c.params().get_value_index(0, 0).unwrap(), 3.0);
    }
}
