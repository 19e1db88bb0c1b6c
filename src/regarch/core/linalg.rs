//! Rank-one and rank-two updates used by the chain-rule Hessian formulas.
//!
//! Every second-derivative recursion in the component families is a sum of
//! outer products `a bᵀ`, symmetric pairs `a bᵀ + b aᵀ`, and pairs against a
//! unit vector `e_k vᵀ + v e_kᵀ` (a parameter's own partial). These helpers
//! update a square matrix in place.
use ndarray::{Array2, ArrayView1};

/// `h += coef · a bᵀ`.
pub fn add_outer(h: &mut Array2<f64>, coef: f64, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) {
    if coef == 0.0 {
        return;
    }
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0.0 {
            continue;
        }
        let mut row = h.row_mut(i);
        row.scaled_add(coef * ai, &b);
    }
}

/// `h += coef · (a bᵀ + b aᵀ)`.
pub fn add_sym_outer(
    h: &mut Array2<f64>, coef: f64, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>,
) {
    add_outer(h, coef, a, b);
    add_outer(h, coef, b, a);
}

/// `h += coef · (e_k vᵀ + v e_kᵀ)`.
pub fn add_sym_unit(h: &mut Array2<f64>, k: usize, coef: f64, v: ArrayView1<'_, f64>) {
    if coef == 0.0 {
        return;
    }
    h.row_mut(k).scaled_add(coef, &v);
    h.column_mut(k).scaled_add(coef, &v);
}
