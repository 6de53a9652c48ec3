//! Lags, Kronecker products, left division and complex division.

use pretty_assertions::assert_eq;

use genr_data::{Dataset, Structure};
use genr_ir::{BinaryOp, TreeBuilder};
use genr_value::{EvalErrorKind, NumericWarning};

use super::{eval, same, series, workspace};
use crate::{Value, Workspace};

fn lagged(ws: &mut Workspace, k: f64) -> Vec<f64> {
    let v = eval(ws, |b| {
        let x = b.ident("x");
        let k = b.num(k);
        b.lag(x, k)
    })
    .unwrap();
    series(&v).to_vec()
}

#[test]
fn lags_and_leads_pad_with_na() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0, 4.0])]);
    let na = f64::NAN;
    assert!(same(&lagged(&mut ws, -1.0), &[na, 1.0, 2.0, 3.0]));
    assert!(same(&lagged(&mut ws, 1.0), &[2.0, 3.0, 4.0, na]));
    assert!(same(&lagged(&mut ws, 0.0), &[1.0, 2.0, 3.0, 4.0]));

    let err = eval(&mut ws, |b| {
        let x = b.ident("x");
        let k = b.num(0.5);
        b.lag(x, k)
    })
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Domain { .. }));
}

#[test]
fn lags_stay_inside_each_panel_unit() {
    let mut ds = Dataset::with_structure(4, Structure::Panel { units: 2, periods: 2 }).unwrap();
    ds.add_series("x", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let mut ws = Workspace::new(ds);
    let na = f64::NAN;
    assert!(same(&lagged(&mut ws, -1.0), &[na, 1.0, na, 3.0]));
    assert!(same(&lagged(&mut ws, 1.0), &[2.0, na, 4.0, na]));
}

fn matrix_op(op: BinaryOp, a: &[&[f64]], b: &[&[f64]]) -> Result<Value, genr_value::EvalError> {
    let mut ws = workspace(&[]);
    eval(&mut ws, |t: &mut TreeBuilder| {
        let a = t.matrix_of(a);
        let b = t.matrix_of(b);
        t.binary(op, a, b)
    })
}

#[test]
fn kronecker_product() {
    let v = matrix_op(BinaryOp::Kron, &[&[1.0, 2.0]], &[&[1.0], &[3.0]]).unwrap();
    let m = v.as_matrix().unwrap();
    assert_eq!(m.shape(), (2, 2));
    // Column-major {1, 2; 3, 6}.
    assert_eq!(m.real().unwrap(), &[1.0, 3.0, 2.0, 6.0]);
}

#[test]
fn left_division_solves_the_system() {
    let v = matrix_op(BinaryOp::LDiv, &[&[2.0, 0.0], &[0.0, 4.0]], &[&[2.0], &[8.0]]).unwrap();
    let m = v.as_matrix().unwrap();
    assert_eq!(m.shape(), (2, 1));
    assert_eq!(m.real().unwrap(), &[1.0, 2.0]);

    let err = matrix_op(BinaryOp::LDiv, &[&[1.0, 2.0], &[2.0, 4.0]], &[&[1.0], &[1.0]]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Domain { .. }));

    let err = matrix_op(BinaryOp::LDiv, &[&[1.0, 0.0], &[0.0, 1.0]], &[&[1.0, 2.0, 3.0]]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NonConformable { .. }));
}

#[test]
fn complex_division_by_zero_warns() {
    let mut ws = workspace(&[]);
    let v = eval(&mut ws, |b| {
        let re = b.matrix_of(&[&[1.0, 2.0]]);
        let im = b.num(1.0);
        let z = b.call("complex", &[re, im]);
        let zero = b.num(0.0);
        b.div(z, zero)
    })
    .unwrap();
    let m = v.as_matrix().unwrap();
    assert!(m.complex().unwrap().iter().all(|c| c.re.is_nan()));
    assert_eq!(ws.warnings().entries(), &[(NumericWarning::DivisionByZero, 2)]);
}
