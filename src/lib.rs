//! rust_regarch — regression models with conditionally heteroskedastic errors,
//! exact analytic derivatives and optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! RegArch models to Python via the `_rust_regarch` extension module when the
//! `python-bindings` feature is enabled.
//!
//! Key behaviors
//! -------------
//! - Re-export the core modules: [`regarch`] (components, filtering,
//!   likelihood and derivatives, simulation), [`estimation`] (L-BFGS
//!   maximum likelihood), [`inference`] (information matrices, covariance,
//!   standard errors) and [`utils`] (construction from kind tags).
//! - Define the `RegArch` / `RegArchOptimOutcome` Python classes and register
//!   the `rust_regarch.models` submodule so dot-notation imports work.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work happens in the inner modules; this file performs FFI
//!   glue, input conversion and error mapping only.
//! - Python-visible parameter vectors use the model layout
//!   `[means in insertion order | variance | distribution]`.
//!
//! Conventions
//! -----------
//! - Errors from the inner modules are typed (`RegArchError`, `EstimError`,
//!   `InferenceError`) and become `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Rust code depends on the inner modules directly and can ignore the items
//!   guarded by `python-bindings`.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_regarch_pipeline.rs`.

pub mod estimation;
pub mod inference;
pub mod regarch;
pub mod utils;

#[cfg(feature = "python-bindings")]
use numpy::PyReadonlyArray2;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use rand::{SeedableRng, rngs::StdRng};

#[cfg(feature = "python-bindings")]
use crate::{
    estimation::{OptimOutcome, fit, fit_from_default_init},
    inference::{CovarianceKind, compute_cov, standard_errors, stat_table},
    regarch::{RegArchModel, RegArchValue, models},
    utils::{build_model, extract_mle_opts, extract_owned_array},
};

/// RegArch — a RegArch model exposed to Python.
///
/// Built from kind tags: `means` is a list of `(kind, p, q)` tuples, `var` a
/// variance tag with its `(p, q)` orders and `distr` a residual law tag.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_regarch.models", unsendable)]
pub struct RegArch {
    pub inner: RegArchModel,
    pub results: Option<OptimOutcome>,
}

#[cfg(feature = "python-bindings")]
impl RegArch {
    fn value_from_py<'py>(
        py: Python<'py>, data: &Bound<'py, PyAny>, regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>,
    ) -> PyResult<RegArchValue> {
        let yt = extract_owned_array(py, data, "data")?;
        let xt = regressors.map(|x| x.as_array().to_owned());
        let xvt = var_regressors.map(|x| x.as_array().to_owned());
        Ok(RegArchValue::with_regressors(yt, xt, xvt)?)
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl RegArch {
    #[new]
    #[pyo3(
        signature = (means = None, var = "garch", var_orders = (1, 1), distr = "normal"),
        text_signature = "(means=None, var='garch', var_orders=(1, 1), distr='normal')"
    )]
    pub fn new(
        means: Option<Vec<(String, usize, usize)>>, var: &str, var_orders: (usize, usize),
        distr: &str,
    ) -> PyResult<Self> {
        let means = means.unwrap_or_else(|| vec![("const".to_string(), 0, 0)]);
        let specs: Vec<(&str, usize, usize)> =
            means.iter().map(|(k, p, q)| (k.as_str(), *p, *q)).collect();
        let inner = build_model(&specs, (var, var_orders.0, var_orders.1), distr)?;
        Ok(RegArch { inner, results: None })
    }

    #[pyo3(
        signature = (
            data,
            regressors = None,
            var_regressors = None,
            from_default_init = true,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            verbose = None,
            lbfgs_mem = None,
        ),
        text_signature = "(self, data, /, regressors=None, var_regressors=None, from_default_init=True, \
                          tol_grad=None, \
                          tol_cost=None, max_iter=None, line_searcher=None, verbose=False, \
                          lbfgs_mem=None)"
    )]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, data: &Bound<'py, PyAny>,
        regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>, from_default_init: bool,
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
        line_searcher: Option<&str>, verbose: Option<bool>, lbfgs_mem: Option<usize>,
    ) -> PyResult<RegArchOptimOutcome> {
        let value = Self::value_from_py(py, data, regressors, var_regressors)?;
        let opts =
            extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, verbose, lbfgs_mem)?;
        let outcome = if from_default_init {
            fit_from_default_init(&mut self.inner, &value, &opts)?
        } else {
            self.inner.sync_size_param(&value)?;
            fit(&mut self.inner, &value, &opts)?
        };
        self.results = Some(outcome.clone());
        Ok(RegArchOptimOutcome { inner: outcome })
    }

    #[pyo3(signature = (data, regressors = None, var_regressors = None))]
    pub fn llh<'py>(
        &self, py: Python<'py>, data: &Bound<'py, PyAny>,
        regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>,
    ) -> PyResult<f64> {
        let mut value = Self::value_from_py(py, data, regressors, var_regressors)?;
        Ok(models::llh(&self.inner, &mut value)?)
    }

    #[pyo3(signature = (data, regressors = None, var_regressors = None))]
    pub fn grad_llh<'py>(
        &self, py: Python<'py>, data: &Bound<'py, PyAny>,
        regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>,
    ) -> PyResult<Vec<f64>> {
        let mut value = Self::value_from_py(py, data, regressors, var_regressors)?;
        Ok(models::grad_llh(&self.inner, &mut value)?.to_vec())
    }

    /// Conditional means and variances along `data`.
    #[pyo3(signature = (data, regressors = None, var_regressors = None))]
    pub fn filter<'py>(
        &self, py: Python<'py>, data: &Bound<'py, PyAny>,
        regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>,
    ) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let mut value = Self::value_from_py(py, data, regressors, var_regressors)?;
        models::fill_value(&self.inner, &mut value)?;
        Ok((value.mt.to_vec(), value.ht.to_vec()))
    }

    #[pyo3(signature = (data, regressors = None, var_regressors = None, kind = "classical"))]
    pub fn covariance_matrix<'py>(
        &self, py: Python<'py>, data: &Bound<'py, PyAny>,
        regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>, kind: &str,
    ) -> PyResult<Vec<Vec<f64>>> {
        let value = Self::value_from_py(py, data, regressors, var_regressors)?;
        let kind: CovarianceKind = kind.parse()?;
        let cov = compute_cov(&self.inner, &value, kind)?;
        Ok(cov.rows().into_iter().map(|row| row.to_vec()).collect())
    }

    #[pyo3(signature = (data, regressors = None, var_regressors = None, kind = "classical"))]
    pub fn standard_errors<'py>(
        &self, py: Python<'py>, data: &Bound<'py, PyAny>,
        regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>, kind: &str,
    ) -> PyResult<Vec<f64>> {
        let value = Self::value_from_py(py, data, regressors, var_regressors)?;
        let kind: CovarianceKind = kind.parse()?;
        Ok(standard_errors(&self.inner, &value, kind)?.to_vec())
    }

    /// Wald table rows `(label, estimate, std_err, t_stat, p_value)`.
    #[pyo3(signature = (data, regressors = None, var_regressors = None, kind = "classical"))]
    pub fn stat_table<'py>(
        &self, py: Python<'py>, data: &Bound<'py, PyAny>,
        regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>, kind: &str,
    ) -> PyResult<Vec<(String, f64, f64, f64, f64)>> {
        let value = Self::value_from_py(py, data, regressors, var_regressors)?;
        let kind: CovarianceKind = kind.parse()?;
        let table = stat_table(&self.inner, &value, kind)?;
        Ok((0..table.len())
            .map(|k| {
                (
                    table.labels[k].clone(),
                    table.estimate[k],
                    table.std_err[k],
                    table.t_stat[k],
                    table.p_value[k],
                )
            })
            .collect())
    }

    /// Simulate `n` draws; returns `(y, h)`.
    #[pyo3(signature = (n, seed = None, regressors = None, var_regressors = None))]
    pub fn simulate<'py>(
        &self, n: usize, seed: Option<u64>, regressors: Option<PyReadonlyArray2<'py, f64>>,
        var_regressors: Option<PyReadonlyArray2<'py, f64>>,
    ) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let xt = regressors.map(|x| x.as_array().to_owned());
        let xvt = var_regressors.map(|x| x.as_array().to_owned());
        let value = models::simulate_with_regressors(&self.inner, n, xt, xvt, &mut rng)?;
        Ok((value.yt.to_vec(), value.ht.to_vec()))
    }

    #[getter]
    pub fn params(&self) -> PyResult<Vec<f64>> {
        Ok(self.inner.to_vector()?.to_vec())
    }

    #[setter]
    pub fn set_params(&mut self, theta: Vec<f64>) -> PyResult<()> {
        if theta.len() != self.inner.n_param() {
            return Err(PyValueError::new_err(format!(
                "expected {} parameters, got {}",
                self.inner.n_param(),
                theta.len()
            )));
        }
        self.inner.vector_to_param(&ndarray::Array1::from(theta), 0)?;
        Ok(())
    }

    #[getter]
    pub fn n_param(&self) -> usize {
        self.inner.n_param()
    }

    #[getter]
    pub fn results(&self) -> PyResult<RegArchOptimOutcome> {
        match &self.results {
            Some(outcome) => Ok(RegArchOptimOutcome { inner: outcome.clone() }),
            None => Err(PyValueError::new_err("model has not been fitted")),
        }
    }
}

/// RegArchOptimOutcome — optimizer diagnostics exposed to Python.
///
/// Rust code should use [`OptimOutcome`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_regarch.models")]
pub struct RegArchOptimOutcome {
    pub inner: OptimOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl RegArchOptimOutcome {
    #[getter]
    pub fn theta_hat(&self) -> Vec<f64> {
        self.inner.theta_hat.to_vec()
    }

    /// Log-likelihood at `theta_hat`.
    #[getter]
    pub fn value(&self) -> f64 {
        self.inner.value
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn grad_norm(&self) -> Option<f64> {
        self.inner.grad_norm
    }

    #[getter]
    pub fn fn_evals(&self) -> Vec<(String, u64)> {
        self.inner.fn_evals.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

/// Module initializer for the `_rust_regarch` extension.
///
/// Registers the `models` submodule and inserts it into `sys.modules` as
/// `rust_regarch.models`.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_regarch<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let models_mod = PyModule::new_bound(py, "models")?;
    regarch_models(py, m, &models_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    py.import_bound("sys")?.getattr("modules")?.set_item("rust_regarch.models", models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn regarch_models<'py>(
    _py: Python, rust_regarch: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<RegArch>()?;
    m.add_class::<RegArchOptimOutcome>()?;
    rust_regarch.add_submodule(m)?;
    Ok(())
}
