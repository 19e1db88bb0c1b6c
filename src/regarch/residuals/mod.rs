//! residuals — standardized innovation laws for RegArch models.
//!
//! Purpose
//! -------
//! Provide the distribution of the standardized residual `ε_t = U_t / √H_t`
//! together with every derivative the likelihood chain rule needs: in the
//! realization (`g = ∂ log f/∂x`, `g′`), in the distribution parameters
//! (`∂ log f/∂θ_d`, `∂² log f/∂θ_d²`), the mixed partial `∂g/∂θ_d`, and the
//! moment `E|ε|` with its parameter derivatives (used by EGARCH).
//!
//! Key behaviors
//! -------------
//! - [`Residuals`] is a closed enum over [`Normal`], [`Student`], [`Ged`] and
//!   [`MixNorm`]; every operation is an exhaustive `match` forwarding to the
//!   variant's [`ResidualDistribution`] implementation.
//! - `compute_grad` / `compute_hess` read `Eps[date]` from the value store and
//!   write the distribution parts of the current window slots.
//! - `numeric_*` methods recompute the same quantities with central finite
//!   differences (`finitediff`) so analytic formulas can be cross-checked.
//! - `generate` draws i.i.d. standardized variates through `rand_distr`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every family has unit variance: Student and GED by parameterization,
//!   MixNorm by dividing the raw mixture by its standard deviation.
//! - Parameters outside the valid domain (ν ≤ 2, β ≤ 0, variances ≤ 0) are
//!   not rejected; the resulting non-finite values propagate.
//!
//! Conventions
//! -----------
//! - The distribution slice is the last block of the model parameter
//!   vector; [`ResidualDistribution::n_param`] gives its length.
use crate::regarch::{
    core::{GradientState, HessianState, ParamBlocks, RegArchValue},
    errors::{RegArchError, RegArchResult},
};
use finitediff::FiniteDiff;
use ndarray::{Array1, Array2};
use rand::RngCore;
use std::str::FromStr;

pub mod ged;
pub mod mixnorm;
pub mod normal;
pub mod student;

pub use self::ged::Ged;
pub use self::mixnorm::MixNorm;
pub use self::normal::Normal;
pub use self::student::Student;

/// Shared contract of a standardized residual law.
pub trait ResidualDistribution {
    fn params(&self) -> &ParamBlocks;

    fn params_mut(&mut self) -> &mut ParamBlocks;

    fn n_param(&self) -> usize {
        self.params().n_param()
    }

    /// `log f(x; θ_d)`.
    fn log_density(&self, x: f64) -> f64;

    /// `∂ log f/∂x`.
    fn diff_log_density(&self, x: f64) -> f64;

    /// `∂² log f/∂x²`.
    fn diff2_log_density(&self, x: f64) -> f64;

    /// `∂ log f/∂θ_d`.
    fn grad_log_density(&self, x: f64) -> Array1<f64>;

    /// `∂² log f/∂θ_d∂θ_dᵀ`.
    fn hess_log_density(&self, x: f64) -> Array2<f64>;

    /// `∂/∂θ_d (∂ log f/∂x)`.
    fn grad_diff_log_density(&self, x: f64) -> Array1<f64>;

    /// `E|ε|`.
    fn esp_abs_eps(&self) -> f64;

    fn grad_esp_abs_eps(&self) -> Array1<f64>;

    fn hess_esp_abs_eps(&self) -> Array2<f64>;

    /// One standardized draw.
    fn draw(&self, rng: &mut dyn RngCore) -> f64;

    /// Reset the parameters to a standard starting point.
    fn set_default_init_point(&mut self);
}

/// Tag for the residual family, parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistrKind {
    Normal,
    Student,
    Ged,
    MixNorm,
}

impl FromStr for DistrKind {
    type Err = RegArchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" | "norm" | "gaussian" => Ok(DistrKind::Normal),
            "student" | "t" => Ok(DistrKind::Student),
            "ged" => Ok(DistrKind::Ged),
            "mixnorm" | "mixture" => Ok(DistrKind::MixNorm),
            _ => Err(RegArchError::UnknownComponent {
                name: s.to_string(),
                reason: "expected one of Normal, Student, Ged, MixNorm",
            }),
        }
    }
}

/// Closed set of residual laws.
#[derive(Debug, Clone, PartialEq)]
pub enum Residuals {
    Normal(Normal),
    Student(Student),
    Ged(Ged),
    MixNorm(MixNorm),
}

impl Default for Residuals {
    fn default() -> Self {
        Residuals::Normal(Normal::new())
    }
}

impl Residuals {
    /// Build a law of `kind` at its default parameters.
    pub fn from_kind(kind: DistrKind) -> Self {
        match kind {
            DistrKind::Normal => Residuals::Normal(Normal::new()),
            DistrKind::Student => Residuals::Student(Student::default()),
            DistrKind::Ged => Residuals::Ged(Ged::default()),
            DistrKind::MixNorm => Residuals::MixNorm(MixNorm::default()),
        }
    }

    /// Build a law of `kind` with an explicit parameter vector.
    ///
    /// # Errors
    /// - [`RegArchError::ParamLengthMismatch`] if `params` does not match the
    ///   family's parameter count.
    pub fn with_params(kind: DistrKind, params: &Array1<f64>) -> RegArchResult<Self> {
        let mut distr = Residuals::from_kind(kind);
        if params.len() != distr.n_param() {
            return Err(RegArchError::ParamLengthMismatch {
                expected: distr.n_param(),
                actual: params.len(),
            });
        }
        distr.vector_to_param(params, 0)?;
        Ok(distr)
    }

    pub fn kind(&self) -> DistrKind {
        match self {
            Residuals::Normal(_) => DistrKind::Normal,
            Residuals::Student(_) => DistrKind::Student,
            Residuals::Ged(_) => DistrKind::Ged,
            Residuals::MixNorm(_) => DistrKind::MixNorm,
        }
    }

    pub fn inner(&self) -> &dyn ResidualDistribution {
        match self {
            Residuals::Normal(d) => d,
            Residuals::Student(d) => d,
            Residuals::Ged(d) => d,
            Residuals::MixNorm(d) => d,
        }
    }

    pub fn inner_mut(&mut self) -> &mut dyn ResidualDistribution {
        match self {
            Residuals::Normal(d) => d,
            Residuals::Student(d) => d,
            Residuals::Ged(d) => d,
            Residuals::MixNorm(d) => d,
        }
    }

    // ---- Parameters ----

    pub fn n_param(&self) -> usize {
        self.inner().n_param()
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

    pub fn set_default_init_point(&mut self) {
        self.inner_mut().set_default_init_point();
    }

    // ---- Density and moments ----

    pub fn log_density(&self, x: f64) -> f64 {
        self.inner().log_density(x)
    }

    pub fn diff_log_density(&self, x: f64) -> f64 {
        self.inner().diff_log_density(x)
    }

    pub fn diff2_log_density(&self, x: f64) -> f64 {
        self.inner().diff2_log_density(x)
    }

    pub fn grad_log_density(&self, x: f64) -> Array1<f64> {
        self.inner().grad_log_density(x)
    }

    pub fn hess_log_density(&self, x: f64) -> Array2<f64> {
        self.inner().hess_log_density(x)
    }

    pub fn grad_diff_log_density(&self, x: f64) -> Array1<f64> {
        self.inner().grad_diff_log_density(x)
    }

    pub fn esp_abs_eps(&self) -> f64 {
        self.inner().esp_abs_eps()
    }

    pub fn grad_esp_abs_eps(&self) -> Array1<f64> {
        self.inner().grad_esp_abs_eps()
    }

    pub fn hess_esp_abs_eps(&self) -> Array2<f64> {
        self.inner().hess_esp_abs_eps()
    }

    // ---- Window updates ----

    /// Write `g(ε_t)` and `∂ log f(ε_t)/∂θ_d` into the current gradient slot.
    pub fn compute_grad(&self, date: usize, data: &RegArchValue, grad: &mut GradientState) {
        let eps = data.epst[date];
        grad.current_diff_log_density = self.diff_log_density(eps);
        grad.current_grad_dens = self.grad_log_density(eps);
    }

    /// Write `∂² log f(ε_t)/∂θ_d²` and `∂g(ε_t)/∂θ_d` into the current Hessian slot.
    pub fn compute_hess(&self, date: usize, data: &RegArchValue, hess: &mut HessianState) {
        let eps = data.epst[date];
        hess.current_hess_dens = self.hess_log_density(eps);
        hess.current_grad_diff_log_density = self.grad_diff_log_density(eps);
    }

    pub fn compute_grad_and_hess(
        &self, date: usize, data: &RegArchValue, grad: &mut GradientState,
        hess: &mut HessianState,
    ) {
        self.compute_grad(date, data, grad);
        self.compute_hess(date, data, hess);
    }

    // ---- Simulation ----

    /// `n` i.i.d. standardized draws.
    pub fn generate<R: RngCore>(&self, n: usize, rng: &mut R) -> Array1<f64> {
        let inner = self.inner();
        Array1::from_shape_fn(n, |_| inner.draw(rng))
    }

    // ---- Numeric counterparts ----

    /// Central difference of `log f` in `x` with step `h`.
    ///
    /// # Errors
    /// - [`RegArchError::InvalidStep`] if `h` is not finite and positive.
    pub fn numeric_diff_log_density(&self, x: f64, h: f64) -> RegArchResult<f64> {
        check_step(h)?;
        Ok((self.log_density(x + h) - self.log_density(x - h)) / (2.0 * h))
    }

    /// Central difference of `∂ log f/∂x` in `x` with step `h`.
    pub fn numeric_diff2_log_density(&self, x: f64, h: f64) -> RegArchResult<f64> {
        check_step(h)?;
        Ok((self.diff_log_density(x + h) - self.diff_log_density(x - h)) / (2.0 * h))
    }

    /// Finite-difference `∂ log f(x)/∂θ_d`.
    pub fn numeric_compute_grad(&self, x: f64) -> RegArchResult<Array1<f64>> {
        let theta = self.current_vector()?;
        let f = |t: &Array1<f64>| self.perturbed(t).map_or(f64::NAN, |d| d.log_density(x));
        Ok(theta.central_diff(&f))
    }

    /// Finite-difference `∂² log f(x)/∂θ_d²`, differencing the analytic gradient.
    pub fn numeric_compute_hess(&self, x: f64) -> RegArchResult<Array2<f64>> {
        let theta = self.current_vector()?;
        let n = theta.len();
        let g = |t: &Array1<f64>| {
            self.perturbed(t)
                .map_or_else(|_| Array1::from_elem(n, f64::NAN), |d| d.grad_log_density(x))
        };
        Ok(theta.central_hessian(&g))
    }

    /// Finite-difference `∂g(x)/∂θ_d`.
    pub fn numeric_grad_diff_log_density(&self, x: f64) -> RegArchResult<Array1<f64>> {
        let theta = self.current_vector()?;
        let f = |t: &Array1<f64>| self.perturbed(t).map_or(f64::NAN, |d| d.diff_log_density(x));
        Ok(theta.central_diff(&f))
    }

    /// Finite-difference gradient of `E|ε|`.
    pub fn numeric_grad_esp_abs_eps(&self) -> RegArchResult<Array1<f64>> {
        let theta = self.current_vector()?;
        let f = |t: &Array1<f64>| self.perturbed(t).map_or(f64::NAN, |d| d.esp_abs_eps());
        Ok(theta.central_diff(&f))
    }

    // ---- Helper methods ----

    fn current_vector(&self) -> RegArchResult<Array1<f64>> {
        let mut theta = Array1::zeros(self.n_param());
        self.param_to_vector(&mut theta, 0)?;
        Ok(theta)
    }

    fn perturbed(&self, theta: &Array1<f64>) -> RegArchResult<Residuals> {
        let mut copy = self.clone();
        copy.vector_to_param(theta, 0)?;
        Ok(copy)
    }
}

fn check_step(h: f64) -> RegArchResult<()> {
    if !h.is_finite() || h <= 0.0 {
        return Err(RegArchError::InvalidStep { value: h });
    }
    Ok(())
}
