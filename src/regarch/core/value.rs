//! RegArchValue — per-date series store shared by every RegArch component.
//!
//! Purpose
//! -------
//! Own the observed series `Y` together with the filtered series produced by a
//! model pass: conditional mean `M`, conditional variance `H`, residual
//! `U = Y − M` and standardized residual `Eps = U / √H`. Optional regressor
//! matrices feed `LinReg` (mean side) and future variance regressions.
//!
//! Key behaviors
//! -------------
//! - Allocate from a sample size or from an observed series; derived series are
//!   zero-filled and mutated in place by the filtering drivers.
//! - Expose lag readers (`y_lag`, `u_lag`, `h_lag`, `eps_lag`) that return 0
//!   for dates before the sample start, which is how every recursion in this
//!   crate treats pre-sample history.
//! - Provide sample moments of `Y` used by default initial points.
//!
//! Invariants & assumptions
//! ------------------------
//! - All five series share the same length.
//! - Regressor matrices, when present, have one row per date.
//! - `H[t] > 0` for filled dates is a property of valid parameters, not a
//!   check performed here.
//!
//! Conventions
//! -----------
//! - Dates are 0-based; `lag(date, k)` reads `date − k`.
//! - Regressors are stored row-major as `(n_obs, n_regressors)`.
use crate::regarch::errors::{RegArchError, RegArchResult};
use ndarray::{Array1, Array2};

/// Time-indexed series container for one model evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RegArchValue {
    /// Observed values.
    pub yt: Array1<f64>,
    /// Conditional mean.
    pub mt: Array1<f64>,
    /// Conditional variance.
    pub ht: Array1<f64>,
    /// Residuals `Y − M`.
    pub ut: Array1<f64>,
    /// Standardized residuals `U / √H`.
    pub epst: Array1<f64>,
    /// Mean regressors `(n_obs, k)`.
    pub xt: Option<Array2<f64>>,
    /// Variance regressors `(n_obs, k)`.
    pub xvt: Option<Array2<f64>>,
}

impl RegArchValue {
    /// Zero-filled store for `n` dates (used by simulation).
    pub fn new(n: usize) -> Self {
        RegArchValue {
            yt: Array1::zeros(n),
            mt: Array1::zeros(n),
            ht: Array1::zeros(n),
            ut: Array1::zeros(n),
            epst: Array1::zeros(n),
            xt: None,
            xvt: None,
        }
    }

    /// Build a store around an observed series.
    ///
    /// # Errors
    /// - [`RegArchError::EmptySeries`] if `yt` is empty.
    pub fn from_data(yt: Array1<f64>) -> RegArchResult<Self> {
        if yt.is_empty() {
            return Err(RegArchError::EmptySeries);
        }
        let n = yt.len();
        let mut value = RegArchValue::new(n);
        value.yt = yt;
        Ok(value)
    }

    /// Build a store with mean and/or variance regressors.
    ///
    /// # Errors
    /// - [`RegArchError::EmptySeries`] if `yt` is empty.
    /// - [`RegArchError::RegressorShapeMismatch`] if a matrix row count differs
    ///   from `yt.len()`.
    pub fn with_regressors(
        yt: Array1<f64>, xt: Option<Array2<f64>>, xvt: Option<Array2<f64>>,
    ) -> RegArchResult<Self> {
        let mut value = RegArchValue::from_data(yt)?;
        if let Some(x) = xt {
            value.set_xt(x)?;
        }
        if let Some(x) = xvt {
            value.set_xvt(x)?;
        }
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.yt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yt.is_empty()
    }

    /// Resize to `n` dates; every series is reset to zero and regressors are dropped.
    pub fn realloc(&mut self, n: usize) {
        *self = RegArchValue::new(n);
    }

    /// Replace the observed series; derived series are reset to zero. Regressors
    /// survive only if their row count still matches.
    pub fn realloc_from(&mut self, yt: Array1<f64>) {
        let n = yt.len();
        let xt = self.xt.take().filter(|x| x.nrows() == n);
        let xvt = self.xvt.take().filter(|x| x.nrows() == n);
        *self = RegArchValue::new(n);
        self.yt = yt;
        self.xt = xt;
        self.xvt = xvt;
    }

    /// Zero-filled mean regressors with `n_cols` columns.
    pub fn realloc_xt(&mut self, n_cols: usize) {
        self.xt = Some(Array2::zeros((self.len(), n_cols)));
    }

    /// Zero-filled variance regressors with `n_cols` columns.
    pub fn realloc_xvt(&mut self, n_cols: usize) {
        self.xvt = Some(Array2::zeros((self.len(), n_cols)));
    }

    pub fn set_xt(&mut self, xt: Array2<f64>) -> RegArchResult<()> {
        self.check_rows(&xt)?;
        self.xt = Some(xt);
        Ok(())
    }

    pub fn set_xvt(&mut self, xvt: Array2<f64>) -> RegArchResult<()> {
        self.check_rows(&xvt)?;
        self.xvt = Some(xvt);
        Ok(())
    }

    /// Zero the filtered series (M, H, U, Eps), keeping Y and regressors.
    pub fn clear_filtered(&mut self) {
        self.mt.fill(0.0);
        self.ht.fill(0.0);
        self.ut.fill(0.0);
        self.epst.fill(0.0);
    }

    /// Sample mean and (population) variance of `Y`.
    ///
    /// # Errors
    /// - [`RegArchError::EmptySeries`] if the store holds no dates.
    pub fn compute_mean_and_var(&self) -> RegArchResult<(f64, f64)> {
        let mean = self.yt.mean().ok_or(RegArchError::EmptySeries)?;
        Ok((mean, self.yt.var(0.0)))
    }

    /// Sample variance of `Y` around its mean.
    pub fn compute_var(&self) -> RegArchResult<f64> {
        Ok(self.compute_mean_and_var()?.1)
    }

    /// `Y[date − k]`, or 0 before the sample start.
    #[inline]
    pub fn y_lag(&self, date: usize, k: usize) -> f64 {
        lag_of(&self.yt, date, k)
    }

    /// `U[date − k]`, or 0 before the sample start.
    #[inline]
    pub fn u_lag(&self, date: usize, k: usize) -> f64 {
        lag_of(&self.ut, date, k)
    }

    /// `H[date − k]`, or 0 before the sample start.
    #[inline]
    pub fn h_lag(&self, date: usize, k: usize) -> f64 {
        lag_of(&self.ht, date, k)
    }

    /// `Eps[date − k]`, or 0 before the sample start.
    #[inline]
    pub fn eps_lag(&self, date: usize, k: usize) -> f64 {
        lag_of(&self.epst, date, k)
    }

    fn check_rows(&self, x: &Array2<f64>) -> RegArchResult<()> {
        if x.nrows() != self.len() {
            return Err(RegArchError::RegressorShapeMismatch {
                expected: (self.len(), x.ncols()),
                actual: x.dim(),
            });
        }
        Ok(())
    }
}

#[inline]
fn lag_of(series: &Array1<f64>, date: usize, k: usize) -> f64 {
    if k > date { 0.0 } else { series[date - k] }
}
