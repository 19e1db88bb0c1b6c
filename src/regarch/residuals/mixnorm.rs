//! Standardized two-component centered normal mixture.
//!
//! Parameters are `(p, var1, var2)` with variances, not standard deviations.
//! The raw mixture `p·N(0, v1) + (1 − p)·N(0, v2)` has variance
//! `s = p·v1 + (1 − p)·v2`; the law used here is that mixture divided by
//! `σ_mix = √s`, so `ε` has unit variance:
//!
//! `f(x) = σ_mix · f_raw(σ_mix·x) = p·φ(x; w1) + (1 − p)·φ(x; w2)`, `w_i = v_i / s`.
//!
//! Derivatives in `(p, v1, v2)` are the raw-mixture derivatives in
//! `(p, w1, w2)` pulled back through the map `(p, v1, v2) → (p, w1, w2)`.
//! That map is invariant to a common rescaling of `(v1, v2)`, so only `p` and
//! the ratio `v1/v2` are identified.
use crate::regarch::{core::ParamBlocks, residuals::ResidualDistribution};
use ndarray::{Array1, Array2, array};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

const P: usize = 0;
const VAR1: usize = 1;
const VAR2: usize = 2;
const DEFAULT_INIT: [f64; 3] = [0.5, 0.5, 1.5];

#[derive(Debug, Clone, PartialEq)]
pub struct MixNorm {
    params: ParamBlocks,
}

impl Default for MixNorm {
    fn default() -> Self {
        MixNorm::new(DEFAULT_INIT[0], DEFAULT_INIT[1], DEFAULT_INIT[2])
    }
}

/// Component density `φ` and its variance derivatives at one point.
struct Component {
    v: f64,
    phi: f64,
    /// `∂ ln φ/∂v`.
    a: f64,
    /// `∂a/∂v`.
    b: f64,
}

impl Component {
    fn at(x: f64, v: f64) -> Self {
        let x2 = x * x;
        Component {
            v,
            phi: (-x2 / (2.0 * v)).exp() / (2.0 * PI * v).sqrt(),
            a: (x2 - v) / (2.0 * v * v),
            b: (v - 2.0 * x2) / (2.0 * v * v * v),
        }
    }

    /// `∂(φ/v)/∂v`.
    fn d_phi_over_v(&self) -> f64 {
        self.phi * (self.a - 1.0 / self.v) / self.v
    }
}

/// Unnormalized mixture `p·N(0, w1) + (1 − p)·N(0, w2)`; derivatives are in
/// `(p, w1, w2)`.
struct RawMixture {
    p: f64,
    w1: f64,
    w2: f64,
}

impl RawMixture {
    fn components(&self, x: f64) -> (Component, Component) {
        (Component::at(x, self.w1), Component::at(x, self.w2))
    }

    fn density(&self, x: f64) -> f64 {
        let (c1, c2) = self.components(x);
        self.p * c1.phi + (1.0 - self.p) * c2.phi
    }

    fn grad_density(&self, x: f64) -> Array1<f64> {
        let p = self.p;
        let (c1, c2) = self.components(x);
        array![c1.phi - c2.phi, p * c1.phi * c1.a, (1.0 - p) * c2.phi * c2.a]
    }

    fn diff_log_density(&self, x: f64) -> f64 {
        let p = self.p;
        let (c1, c2) = self.components(x);
        let fx = -x * (p * c1.phi / c1.v + (1.0 - p) * c2.phi / c2.v);
        fx / (p * c1.phi + (1.0 - p) * c2.phi)
    }

    fn diff2_log_density(&self, x: f64) -> f64 {
        let p = self.p;
        let (c1, c2) = self.components(x);
        let x2 = x * x;
        let f = p * c1.phi + (1.0 - p) * c2.phi;
        let fxx = p * c1.phi * (x2 / (c1.v * c1.v) - 1.0 / c1.v)
            + (1.0 - p) * c2.phi * (x2 / (c2.v * c2.v) - 1.0 / c2.v);
        let g = self.diff_log_density(x);
        fxx / f - g * g
    }

    fn grad_log_density(&self, x: f64) -> Array1<f64> {
        self.grad_density(x) / self.density(x)
    }

    fn hess_log_density(&self, x: f64) -> Array2<f64> {
        let p = self.p;
        let (c1, c2) = self.components(x);
        let f = p * c1.phi + (1.0 - p) * c2.phi;
        let mut hf = Array2::<f64>::zeros((3, 3));
        hf[[P, VAR1]] = c1.phi * c1.a;
        hf[[P, VAR2]] = -c2.phi * c2.a;
        hf[[VAR1, VAR1]] = p * c1.phi * (c1.a * c1.a + c1.b);
        hf[[VAR2, VAR2]] = (1.0 - p) * c2.phi * (c2.a * c2.a + c2.b);
        hf[[VAR1, P]] = hf[[P, VAR1]];
        hf[[VAR2, P]] = hf[[P, VAR2]];
        let gl = self.grad_density(x) / f;
        let mut h = hf / f;
        for i in 0..3 {
            for j in 0..3 {
                h[[i, j]] -= gl[i] * gl[j];
            }
        }
        h
    }

    fn grad_diff_log_density(&self, x: f64) -> Array1<f64> {
        let p = self.p;
        let (c1, c2) = self.components(x);
        let f = p * c1.phi + (1.0 - p) * c2.phi;
        let g = self.diff_log_density(x);
        let grad_fx = array![
            -x * (c1.phi / c1.v - c2.phi / c2.v),
            -x * p * c1.d_phi_over_v(),
            -x * (1.0 - p) * c2.d_phi_over_v()
        ];
        (grad_fx - self.grad_density(x) * g) / f
    }

    fn esp_abs_eps(&self) -> f64 {
        (2.0 / PI).sqrt() * (self.p * self.w1.sqrt() + (1.0 - self.p) * self.w2.sqrt())
    }

    fn grad_esp_abs_eps(&self) -> Array1<f64> {
        let (p, w1, w2) = (self.p, self.w1, self.w2);
        let c = (2.0 / PI).sqrt();
        array![
            c * (w1.sqrt() - w2.sqrt()),
            c * p / (2.0 * w1.sqrt()),
            c * (1.0 - p) / (2.0 * w2.sqrt())
        ]
    }

    fn hess_esp_abs_eps(&self) -> Array2<f64> {
        let (p, w1, w2) = (self.p, self.w1, self.w2);
        let c = (2.0 / PI).sqrt();
        let mut h = Array2::<f64>::zeros((3, 3));
        h[[P, VAR1]] = c / (2.0 * w1.sqrt());
        h[[P, VAR2]] = -c / (2.0 * w2.sqrt());
        h[[VAR1, P]] = h[[P, VAR1]];
        h[[VAR2, P]] = h[[P, VAR2]];
        h[[VAR1, VAR1]] = -c * p / (4.0 * w1.powf(1.5));
        h[[VAR2, VAR2]] = -c * (1.0 - p) / (4.0 * w2.powf(1.5));
        h
    }
}

/// `u(θ) = (p, v1/s, v2/s)` with its Jacobian (`jac[[k, a]] = ∂u_k/∂θ_a`) and
/// the Hessian of each coordinate.
struct Standardization {
    raw: RawMixture,
    jac: Array2<f64>,
    d2: [Array2<f64>; 3],
}

impl Standardization {
    fn new(p: f64, v1: f64, v2: f64) -> Self {
        let s = p * v1 + (1.0 - p) * v2;
        let s2 = s * s;
        let s3 = s2 * s;
        let ds = [v1 - v2, p, 1.0 - p];
        let mut d2s = Array2::<f64>::zeros((3, 3));
        d2s[[P, VAR1]] = 1.0;
        d2s[[VAR1, P]] = 1.0;
        d2s[[P, VAR2]] = -1.0;
        d2s[[VAR2, P]] = -1.0;

        let mut jac = Array2::<f64>::zeros((3, 3));
        jac[[P, P]] = 1.0;
        let mut d2 = [Array2::zeros((3, 3)), Array2::zeros((3, 3)), Array2::zeros((3, 3))];
        for (k, v) in [(VAR1, v1), (VAR2, v2)] {
            let own = |a: usize| if a == k { 1.0 } else { 0.0 };
            for a in 0..3 {
                jac[[k, a]] = own(a) / s - v * ds[a] / s2;
                for b in 0..3 {
                    d2[k][[a, b]] = -own(a) * ds[b] / s2 - own(b) * ds[a] / s2
                        - v * d2s[[a, b]] / s2
                        + 2.0 * v * ds[a] * ds[b] / s3;
                }
            }
        }
        Standardization { raw: RawMixture { p, w1: v1 / s, w2: v2 / s }, jac, d2 }
    }

    fn pull_grad(&self, g: &Array1<f64>) -> Array1<f64> {
        self.jac.t().dot(g)
    }

    fn pull_hess(&self, g: &Array1<f64>, h: &Array2<f64>) -> Array2<f64> {
        let mut out = self.jac.t().dot(h).dot(&self.jac);
        for (k, d2k) in self.d2.iter().enumerate() {
            out.scaled_add(g[k], d2k);
        }
        out
    }
}

impl MixNorm {
    pub fn new(p: f64, var1: f64, var2: f64) -> Self {
        MixNorm {
            params: ParamBlocks::new()
                .with_scalar("p", p)
                .with_scalar("var1", var1)
                .with_scalar("var2", var2),
        }
    }

    fn weights(&self) -> (f64, f64, f64) {
        (self.params.scalar(P), self.params.scalar(VAR1), self.params.scalar(VAR2))
    }

    /// `σ_mix = √(p·v1 + (1 − p)·v2)`, the standard deviation of the raw
    /// mixture.
    pub fn sigma(&self) -> f64 {
        let (p, v1, v2) = self.weights();
        (p * v1 + (1.0 - p) * v2).sqrt()
    }

    fn standardization(&self) -> Standardization {
        let (p, v1, v2) = self.weights();
        Standardization::new(p, v1, v2)
    }

    fn standardized(&self) -> RawMixture {
        let (p, v1, v2) = self.weights();
        let s = p * v1 + (1.0 - p) * v2;
        RawMixture { p, w1: v1 / s, w2: v2 / s }
    }
}

impl ResidualDistribution for MixNorm {
    fn params(&self) -> &ParamBlocks {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamBlocks {
        &mut self.params
    }

    fn log_density(&self, x: f64) -> f64 {
        self.standardized().density(x).ln()
    }

    fn diff_log_density(&self, x: f64) -> f64 {
        self.standardized().diff_log_density(x)
    }

    fn diff2_log_density(&self, x: f64) -> f64 {
        self.standardized().diff2_log_density(x)
    }

    fn grad_log_density(&self, x: f64) -> Array1<f64> {
        let st = self.standardization();
        st.pull_grad(&st.raw.grad_log_density(x))
    }

    fn hess_log_density(&self, x: f64) -> Array2<f64> {
        let st = self.standardization();
        st.pull_hess(&st.raw.grad_log_density(x), &st.raw.hess_log_density(x))
    }

    fn grad_diff_log_density(&self, x: f64) -> Array1<f64> {
        let st = self.standardization();
        st.pull_grad(&st.raw.grad_diff_log_density(x))
    }

    fn esp_abs_eps(&self) -> f64 {
        self.standardized().esp_abs_eps()
    }

    fn grad_esp_abs_eps(&self) -> Array1<f64> {
        let st = self.standardization();
        st.pull_grad(&st.raw.grad_esp_abs_eps())
    }

    fn hess_esp_abs_eps(&self) -> Array2<f64> {
        let st = self.standardization();
        st.pull_hess(&st.raw.grad_esp_abs_eps(), &st.raw.hess_esp_abs_eps())
    }

    fn draw(&self, rng: &mut dyn RngCore) -> f64 {
        let (p, v1, v2) = self.weights();
        let z: f64 = StandardNormal.sample(rng);
        let raw = if rng.gen::<f64>() < p { z * v1.sqrt() } else { z * v2.sqrt() };
        raw / self.sigma()
    }

    fn set_default_init_point(&mut self) {
        for (block, value) in DEFAULT_INIT.iter().enumerate() {
            self.params.values_mut(block).fill(*value);
        }
    }
}
