//! Unit-variance Student-t residuals.
//!
//! With `w = ν − 2` the density is
//! `f(x) = Γ((ν+1)/2) / (Γ(ν/2) √(π w)) · (1 + x²/w)^{−(ν+1)/2}`,
//! defined for `ν > 2`. All derivatives below are in closed form; `D = w + x²`
//! appears throughout.
use crate::regarch::{
    core::{
        ParamBlocks,
        special::{digamma, ln_gamma, trigamma},
    },
    residuals::ResidualDistribution,
};
use ndarray::{Array1, Array2, array};
use rand::RngCore;
use rand_distr::{Distribution, StudentT};
use std::f64::consts::PI;

const DOF: usize = 0;
const DEFAULT_DOF: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    params: ParamBlocks,
}

impl Default for Student {
    fn default() -> Self {
        Student::new(DEFAULT_DOF)
    }
}

impl Student {
    pub fn new(dof: f64) -> Self {
        Student { params: ParamBlocks::new().with_scalar("dof", dof) }
    }

    pub fn dof(&self) -> f64 {
        self.params.scalar(DOF)
    }

    /// `(d ln E|ε|/dν, d² ln E|ε|/dν²)`.
    fn log_esp_derivatives(&self) -> (f64, f64) {
        let nu = self.dof();
        let w = nu - 2.0;
        let d1 = 1.0 / (2.0 * w) + 0.5 * digamma((nu + 1.0) / 2.0)
            - 1.0 / (nu - 1.0)
            - 0.5 * digamma(nu / 2.0);
        let d2 = -1.0 / (2.0 * w * w) + 0.25 * trigamma((nu + 1.0) / 2.0)
            + 1.0 / ((nu - 1.0) * (nu - 1.0))
            - 0.25 * trigamma(nu / 2.0);
        (d1, d2)
    }
}

impl ResidualDistribution for Student {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn log_density(&self, x: f64) -> f64 {
        let nu = self.dof();
        let w = nu - 2.0;
        ln_gamma((nu + 1.0) / 2.0) - ln_gamma(nu / 2.0) - 0.5 * (PI * w).ln()
            - 0.5 * (nu + 1.0) * (1.0 + x * x / w).ln()
    }

    fn diff_log_density(&self, x: f64) -> f64 {
        let nu = self.dof();
        -(nu + 1.0) * x / (nu - 2.0 + x * x)
    }

    fn diff2_log_density(&self, x: f64) -> f64 {
        let nu = self.dof();
        let w = nu - 2.0;
        let d = w + x * x;
        -(nu + 1.0) * (w - x * x) / (d * d)
    }

    fn grad_log_density(&self, x: f64) -> Array1<f64> {
        let nu = self.dof();
        let w = nu - 2.0;
        let x2 = x * x;
        let d = w + x2;
        let g = 0.5 * digamma((nu + 1.0) / 2.0) - 0.5 * digamma(nu / 2.0) - 1.0 / (2.0 * w)
            - 0.5 * (d / w).ln()
            + (nu + 1.0) * x2 / (2.0 * w * d);
        array![g]
    }

    fn hess_log_density(&self, x: f64) -> Array2<f64> {
        let nu = self.dof();
        let w = nu - 2.0;
        let x2 = x * x;
        let d = w + x2;
        let h = 0.25 * trigamma((nu + 1.0) / 2.0) - 0.25 * trigamma(nu / 2.0)
            + 1.0 / (2.0 * w * w)
            + x2 / (w * d)
            - (nu + 1.0) * x2 * (d + w) / (2.0 * w * w * d * d);
        array![[h]]
    }

    fn grad_diff_log_density(&self, x: f64) -> Array1<f64> {
        let d = self.dof() - 2.0 + x * x;
        array![x * (3.0 - x * x) / (d * d)]
    }

    fn esp_abs_eps(&self) -> f64 {
        let nu = self.dof();
        let w = nu - 2.0;
        let log_e = 2f64.ln() + 0.5 * w.ln() + ln_gamma((nu + 1.0) / 2.0)
            - 0.5 * PI.ln()
            - (nu - 1.0).ln()
            - ln_gamma(nu / 2.0);
        log_e.exp()
    }

    fn grad_esp_abs_eps(&self) -> Array1<f64> {
        let (d1, _) = self.log_esp_derivatives();
        array![self.esp_abs_eps() * d1]
    }

    fn hess_esp_abs_eps(&self) -> Array2<f64> {
        let (d1, d2) = self.log_esp_derivatives();
        array![[self.esp_abs_eps() * (d2 + d1 * d1)]]
    }

    fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        let nu = self.dof();
        match StudentT::new(nu) {
            Ok(t) => t.sample(rng) * ((nu - 2.0) / nu).sqrt(),
            Err(_) => f64::NAN,
        }
    }

    fn set_default_init_point(&mut self) {
        self.params.values_mut(DOF).fill(DEFAULT_DOF);
    }
}
