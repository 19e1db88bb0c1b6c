//! mean — conditional mean components, summed by the model.
//!
//! Purpose
//! -------
//! Provide the additive pieces of `M_t`: constant, AR, MA, ARFIMA, linear
//! regression, and the two in-mean feedback terms (`δ√h_t`, `δh_t`). Each
//! component returns its own contribution and adds its partial derivatives
//! into the model-wide gradient / Hessian of `M_t`.
//!
//! Key behaviors
//! -------------
//! - [`CondMean`] is a closed enum; [`CondMean::inner`] forwards every call to
//!   the variant's [`CondMeanComponent`] implementation.
//! - `compute_grad` / `compute_hess` **add** into the current mean slot of
//!   the windows. The model driver zeroes that slot once per date (via
//!   `update`) and then lets every active component accumulate.
//! - Recursive components (MA, ARFIMA's MA part) chain-rule through the
//!   trailing window: `∂U_{t−j} = −∂M_{t−j}`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Components read `Y`, `U` and regressors at dates `< t` only, except
//!   StdDevInMean / VarInMean which read `H_t` and `∂H_t`. The model therefore
//!   evaluates the variance (value and derivatives) before the mean for each
//!   date.
//! - `offset` is the position of the component's first parameter in the
//!   model-wide vector.
//!
//! Conventions
//! -----------
//! - Lags before the sample start are dropped (see `RegArchValue::y_lag`).
//! - Default initial points depend on sample moments `(mean, var)` of `Y`.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::{RegArchError, RegArchResult},
};
use ndarray::{Array1, Array2};
use std::{fmt, str::FromStr};

pub mod ar;
pub mod arfima;
pub mod constant;
pub mod in_mean;
pub mod linreg;
pub mod ma;

pub use self::ar::Ar;
pub use self::arfima::Arfima;
pub use self::constant::ConstMean;
pub use self::in_mean::{StdDevInMean, VarInMean};
pub use self::linreg::LinReg;
pub use self::ma::Ma;

/// Shared contract of a conditional mean component.
pub trait CondMeanComponent {
    fn params(&self) -> &ParamBlocks;

    fn params_mut(&mut self) -> &mut ParamBlocks;

    fn n_param(&self) -> usize {
        self.params().n_param()
    }

    /// Largest lag the component reads.
    fn n_lags(&self) -> usize;

    /// Contribution of this component to `M_t`.
    fn compute_mean(&self, date: usize, data: &RegArchValue) -> f64;

    /// Add `∂m_t/∂θ` into the current mean-gradient slot.
    fn compute_grad(&self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize);

    /// Add `∂²m_t/∂θ∂θᵀ` into the current mean-Hessian slot. The current
    /// gradient slot must already be filled for this date.
    fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize,
    );

    fn set_default_init_point(&mut self, mean: f64, var: f64);

    /// Reject value stores the component cannot read.
    fn check_data(&self, _data: &RegArchValue) -> RegArchResult<()> {
        Ok(())
    }
}

/// Tag for a mean component, parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeanKind {
    Const,
    Ar,
    Ma,
    Arfima,
    LinReg,
    StdDevInMean,
    VarInMean,
}

impl fmt::Display for MeanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeanKind::Const => "Const",
            MeanKind::Ar => "Ar",
            MeanKind::Ma => "Ma",
            MeanKind::Arfima => "Arfima",
            MeanKind::LinReg => "LinReg",
            MeanKind::StdDevInMean => "StdDevInMean",
            MeanKind::VarInMean => "VarInMean",
        };
        f.write_str(name)
    }
}

impl FromStr for MeanKind {
    type Err = RegArchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "const" | "constant" => Ok(MeanKind::Const),
            "ar" => Ok(MeanKind::Ar),
            "ma" => Ok(MeanKind::Ma),
            "arfima" => Ok(MeanKind::Arfima),
            "linreg" => Ok(MeanKind::LinReg),
            "stddevinmean" => Ok(MeanKind::StdDevInMean),
            "varinmean" => Ok(MeanKind::VarInMean),
            _ => Err(RegArchError::UnknownComponent {
                name: s.to_string(),
                reason: "expected one of Const, Ar, Ma, Arfima, LinReg, StdDevInMean, VarInMean",
            }),
        }
    }
}

/// Closed set of mean components.
#[derive(Debug, Clone, PartialEq)]
pub enum CondMean {
    Const(ConstMean),
    Ar(Ar),
    Ma(Ma),
    Arfima(Arfima),
    LinReg(LinReg),
    StdDevInMean(StdDevInMean),
    VarInMean(VarInMean),
}

impl CondMean {
    pub fn kind(&self) -> MeanKind {
        match self {
            CondMean::Const(_) => MeanKind::Const,
            CondMean::Ar(_) => MeanKind::Ar,
            CondMean::Ma(_) => MeanKind::Ma,
            CondMean::Arfima(_) => MeanKind::Arfima,
            CondMean::LinReg(_) => MeanKind::LinReg,
            CondMean::StdDevInMean(_) => MeanKind::StdDevInMean,
            CondMean::VarInMean(_) => MeanKind::VarInMean,
        }
    }

    pub fn inner(&self) -> &dyn CondMeanComponent {
        match self {
            CondMean::Const(c) => c,
            CondMean::Ar(c) => c,
            CondMean::Ma(c) => c,
            CondMean::Arfima(c) => c,
            CondMean::LinReg(c) => c,
            CondMean::StdDevInMean(c) => c,
            CondMean::VarInMean(c) => c,
        }
    }

    pub fn inner_mut(&mut self) -> &mut dyn CondMeanComponent {
        match self {
            CondMean::Const(c) => c,
            CondMean::Ar(c) => c,
            CondMean::Ma(c) => c,
            CondMean::Arfima(c) => c,
            CondMean::LinReg(c) => c,
            CondMean::StdDevInMean(c) => c,
            CondMean::VarInMean(c) => c,
        }
    }

    pub fn n_param(&self) -> usize {
        self.inner().n_param()
    }

    pub fn n_lags(&self) -> usize {
        self.inner().n_lags()
    }

    pub fn params(&self) -> &ParamBlocks {
        self.inner().params()
    }

    pub fn params_mut(&mut self) -> &mut ParamBlocks {
        self.inner_mut().params_mut()
    }

    pub fn param_to_vector(&self, dest: &mut Array1<f64>, offset: usize) -> RegArchResult<()> {
        self.params().to_vector(dest, offset)
    }

    pub fn vector_to_param(&mut self, src: &Array1<f64>, offset: usize) -> RegArchResult<()> {
        self.params_mut().from_vector(src, offset)
    }

    pub fn compute_mean(&self, date: usize, data: &RegArchValue) -> f64 {
        self.inner().compute_mean(date, data)
    }

    pub fn compute_grad(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState, offset: usize,
    ) {
        self.inner().compute_grad(date, data, grad, offset);
    }

    pub fn compute_hess(
        &self, date: usize, data: &RegArchValue, grad: &GradientState, hess: &mut HessianState,
        offset: usize,
    ) {
        self.inner().compute_hess(date, data, grad, hess, offset);
    }

    /// Gradient then Hessian for the same date.
    pub fn compute_grad_and_hess(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState,
        hess: &mut HessianState, offset: usize,
    ) {
        self.compute_grad(date, data, grad, offset);
        self.compute_hess(date, data, grad, hess, offset);
    }

    pub fn set_default_init_point(&mut self, mean: f64, var: f64) {
        self.inner_mut().set_default_init_point(mean, var);
    }

    pub fn check_data(&self, data: &RegArchValue) -> RegArchResult<()> {
        self.inner().check_data(data)
    }
}

// ---- Helper methods ----

/// Add a locally assembled gradient into the current mean slot.
pub(crate) fn add_to_current_grad(grad: &mut GradientState, local: &Array1<f64>) {
    let mut current = grad.current_grad_mu_mut();
    current += local;
}

/// Add a locally assembled Hessian into the current mean slot.
pub(crate) fn add_to_current_hess(hess: &mut HessianState, local: &Array2<f64>) {
    let mut current = hess.current_hess_mu_mut();
    current += local;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Kind tags round-trip through Display and FromStr.
    fn kind_tags_round_trip_through_display() {
        for kind in [
            MeanKind::Const,
            MeanKind::Ar,
            MeanKind::Ma,
            MeanKind::Arfima,
            MeanKind::LinReg,
            MeanKind::StdDevInMean,
            MeanKind::VarInMean,
        ] {
            assert_eq!(kind.to_string().parse::<MeanKind>().unwrap(), kind);
        }
        assert!("sarima".parse::<MeanKind>().is_err());
    }

    #[test]
    // Purpose
    // -------
    // Enum dispatch reports the wrapped component's kind and shape.
    fn enum_dispatch_reports_component_shape() {
        let m = CondMean::Ar(Ar::new(3));
        assert_eq!(m.kind(), MeanKind::Ar);
        assert_eq!(m.n_param(), 3);
        assert_eq!(m.n_lags(), 3);
    }
}
