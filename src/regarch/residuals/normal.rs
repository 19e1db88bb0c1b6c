//! Standard normal residuals (no free parameters).
use crate::regarch::{core::ParamBlocks, residuals::ResidualDistribution};
use ndarray::{Array1, Array2};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

/// `N(0, 1)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normal {
    params: ParamBlocks,
}

impl Normal {
    pub fn new() -> Self {
        Normal { params: ParamBlocks::new() }
    }
}

impl ResidualDistribution for Normal {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn log_density(&self, x: f64) -> f64 {
        -0.5 * (2.0 * PI).ln() - 0.5 * x * x
    }

    fn diff_log_density(&self, x: f64) -> f64 {
        -x
    }

    fn diff2_log_density(&self, _x: f64) -> f64 {
        -1.0
    }

    fn grad_log_density(&self, _x: f64) -> Array1<f64> {
        Array1::zeros(0)
    }

    fn hess_log_density(&self, _x: f64) -> Array2<f64> {
        Array2::zeros((0, 0))
    }

    fn grad_diff_log_density(&self, _x: f64) -> Array1<f64> {
        Array1::zeros(0)
    }

    fn esp_abs_eps(&self) -> f64 {
        (2.0 / PI).sqrt()
    }

    fn grad_esp_abs_eps(&self) -> Array1<f64> {
        Array1::zeros(0)
    }

    fn hess_esp_abs_eps(&self) -> Array2<f64> {
        Array2::zeros((0, 0))
    }

    fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        StandardNormal.sample(rng)
    }

    fn set_default_init_point(&mut self) {}
}
