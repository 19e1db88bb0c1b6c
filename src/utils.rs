//! utils — component construction from kind tags, plus Python argument glue.
//!
//! The builders turn `(kind, orders)` pairs into the closed component enums
//! so that callers holding strings (config files, the Python layer) never
//! match on component types themselves. Order conventions:
//!
//! - means: `Ar(p)`, `Ma(q)`, `Arfima(p, q)`, `LinReg(p)` where `p` is the
//!   number of regressors; `Const`, `StdDevInMean` and `VarInMean` ignore
//!   the orders.
//! - variances: `p` is the ARCH order and `q` the GARCH order; `Arch` and
//!   `Tarch` read `p` only and `Const` ignores both. `Ugarch` starts with a
//!   constant and no variance regressors; its coefficient block is sized to
//!   the data by [`RegArchModel::sync_size_param`].
use crate::regarch::{
    errors::RegArchResult,
    mean::{Ar, Arfima, CondMean, ConstMean, LinReg, Ma, MeanKind, StdDevInMean, VarInMean},
    models::RegArchModel,
    residuals::{DistrKind, Residuals},
    variance::{
        Aparch, Arch, CondVar, ConstVar, Egarch, Figarch, Garch, Gtarch, Nagarch, Ngarch,
        Sqrgarch, Tarch, Tsgarch, Ugarch, VarKind,
    },
};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::estimation::options::{LineSearcher, MLEOptions, Tolerances};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArrayMethods, PyReadonlyArray1};

/// Build a mean component of `kind` at its default parameters.
///
/// `p`/`q` follow the module-level order conventions; the fractional
/// component keeps the default truncation lag.
pub fn build_cond_mean(kind: MeanKind, p: usize, q: usize) -> CondMean {
    match kind {
        MeanKind::Const => CondMean::Const(ConstMean::new(0.0)),
        MeanKind::Ar => CondMean::Ar(Ar::new(p)),
        MeanKind::Ma => CondMean::Ma(Ma::new(q)),
        MeanKind::Arfima => CondMean::Arfima(Arfima::new(p, q)),
        MeanKind::LinReg => CondMean::LinReg(LinReg::new(p)),
        MeanKind::StdDevInMean => CondMean::StdDevInMean(StdDevInMean::new(0.0)),
        MeanKind::VarInMean => CondMean::VarInMean(VarInMean::new(0.0)),
    }
}

/// Build a variance component of `kind` at its default parameters.
pub fn build_cond_var(kind: VarKind, p: usize, q: usize) -> CondVar {
    match kind {
        VarKind::Const => CondVar::Const(ConstVar::new(1.0)),
        VarKind::Arch => CondVar::Arch(Arch::new(p)),
        VarKind::Garch => CondVar::Garch(Garch::new(p, q)),
        VarKind::Egarch => CondVar::Egarch(Egarch::new(p, q)),
        VarKind::Aparch => CondVar::Aparch(Aparch::new(p, q)),
        VarKind::Tarch => CondVar::Tarch(Tarch::new(p)),
        VarKind::Figarch => CondVar::Figarch(Figarch::new(p, q)),
        VarKind::Nagarch => CondVar::Nagarch(Nagarch::new(p, q)),
        VarKind::Tsgarch => CondVar::Tsgarch(Tsgarch::new(p, q)),
        VarKind::Ugarch => CondVar::Ugarch(Ugarch::new(true, 0, p, q)),
        VarKind::Ngarch => CondVar::Ngarch(Ngarch::new(p, q)),
        VarKind::Gtarch => CondVar::Gtarch(Gtarch::new(p, q)),
        VarKind::Sqrgarch => CondVar::Sqrgarch(Sqrgarch::new(p, q)),
    }
}

/// Assemble a model from string tags.
///
/// `means` holds `(kind, p, q)` triples in insertion order; an empty list
/// gives a zero-mean model.
///
/// # Errors
/// - [`RegArchError::UnknownComponent`](crate::regarch::RegArchError::UnknownComponent)
///   for an unrecognized tag.
/// - [`RegArchError::DuplicateMean`](crate::regarch::RegArchError::DuplicateMean)
///   if a mean kind is listed twice.
pub fn build_model(
    means: &[(&str, usize, usize)], var: (&str, usize, usize), distr: &str,
) -> RegArchResult<RegArchModel> {
    let (var_name, var_p, var_q) = var;
    let cond_var = build_cond_var(var_name.parse()?, var_p, var_q);
    let residuals = Residuals::from_kind(distr.parse::<DistrKind>()?);
    let mut model = RegArchModel::new(cond_var, residuals);
    for &(name, p, q) in means {
        model.add_mean(build_cond_mean(name.parse()?, p, q))?;
    }
    Ok(model)
}

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    // pandas.Series and friends
    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray_bound(py).readonly())
}

/// Copy a Python 1-D float input into an owned array.
#[cfg(feature = "python-bindings")]
pub fn extract_owned_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, name: &str,
) -> PyResult<ndarray::Array1<f64>> {
    let arr = extract_f64_array(py, raw_data)?;
    let slice = arr.as_slice().map_err(|_| {
        pyo3::exceptions::PyValueError::new_err(format!(
            "{name} must be a 1-D contiguous float64 array or sequence"
        ))
    })?;
    Ok(ndarray::Array1::from(slice.to_vec()))
}

#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, verbose: Option<bool>, lbfgs_mem: Option<usize>,
) -> PyResult<MLEOptions> {
    let tols = if tol_grad.is_none() && tol_cost.is_none() {
        Tolerances::new(Some(1e-6), None, max_iter.or(Some(500)))?
    } else {
        Tolerances::new(tol_grad, tol_cost, max_iter)?
    };
    let ls = match line_searcher {
        Some(name) => name.parse::<LineSearcher>()?,
        None => LineSearcher::MoreThuente,
    };
    Ok(MLEOptions::new(tols, ls, verbose.unwrap_or(false), lbfgs_mem)?)
}
