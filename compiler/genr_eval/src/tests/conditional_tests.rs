//! `cond ? a : b` over scalar, series and matrix conditions.

use pretty_assertions::assert_eq;

use genr_ir::BinaryOp;
use genr_value::{Matrix, Operand, NA};

use super::{eval, same, series, workspace};
use crate::{ArgMask, BuiltinError, BuiltinTable, CallCtx, Signature, SharedBuiltins, Value, Workspace};

fn boom(_: &[Operand<'_>], _: &mut CallCtx<'_>, _: &mut Value) -> Result<(), BuiltinError> {
    Err(BuiltinError::Invalid("boom".into()))
}

/// Standard library plus `boom(x)`, which always fails.
fn with_boom(ws: Workspace) -> Workspace {
    let mut table = BuiltinTable::with_stdlib();
    table.register("boom", Signature::fixed(&[ArgMask::ANY]), boom);
    ws.with_builtins(SharedBuiltins::new(table))
}

/// `x > 0 ? x : boom(x)`
fn guarded(ws: &mut Workspace) -> crate::EvalResult<Value> {
    eval(ws, |b| {
        let x = b.ident("x");
        let zero = b.num(0.0);
        let cond = b.binary(BinaryOp::Gt, x, zero);
        let bad = b.call("boom", &[x]);
        b.ternary(cond, x, bad)
    })
}

#[test]
fn scalar_condition_evaluates_one_branch() {
    let mut ws = workspace(&[]);
    let v = eval(&mut ws, |b| {
        let c = b.num(1.0);
        let a = b.num(10.0);
        let bad = b.call("nosuch", &[]);
        b.ternary(c, a, bad)
    })
    .unwrap();
    assert_eq!(v, Value::Scalar(10.0));
}

#[test]
fn na_scalar_condition_gives_na() {
    let mut ws = workspace(&[]);
    let v = eval(&mut ws, |b| {
        let c = b.num(NA);
        let a = b.call("nosuch", &[]);
        let other = b.call("nosuch", &[]);
        b.ternary(c, a, other)
    })
    .unwrap();
    assert!(v.as_scalar().unwrap().is_nan());
}

#[test]
fn constant_series_condition_skips_the_other_branch() {
    let mut ws = with_boom(workspace(&[("x", &[1.0, 2.0, 3.0])]));
    let v = guarded(&mut ws).unwrap();
    assert_eq!(series(&v), &[1.0, 2.0, 3.0]);

    // A mixed condition needs both branches.
    let x = ws.dataset.lookup("x").unwrap();
    ws.dataset.series_mut(x).unwrap().values[1] = -2.0;
    assert!(guarded(&mut ws).is_err());
}

#[test]
fn na_in_the_condition_gives_na() {
    let mut ws = with_boom(workspace(&[("x", &[1.0, NA, 3.0])]));
    let v = guarded(&mut ws).unwrap();
    assert!(same(series(&v), &[1.0, NA, 3.0]));
}

#[test]
fn mixed_series_condition_combines_per_observation() {
    let mut ws = workspace(&[("x", &[1.0, -2.0, 3.0])]);
    let v = eval(&mut ws, |b| {
        let x = b.ident("x");
        let zero = b.num(0.0);
        let cond = b.binary(BinaryOp::Gt, x, zero);
        let neg = b.neg(x);
        b.ternary(cond, x, neg)
    })
    .unwrap();
    assert_eq!(series(&v), &[1.0, 2.0, 3.0]);
}

#[test]
fn matrix_condition_selects_per_element() {
    let mut ws = workspace(&[]);
    let v = eval(&mut ws, |b| {
        let c = b.matrix_of(&[&[1.0, 0.0], &[0.0, 1.0]]);
        let a = b.matrix_of(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let z = b.num(0.0);
        b.ternary(c, a, z)
    })
    .unwrap();
    let want = Matrix::from_rows(&[[1.0, 0.0], [0.0, 4.0]]).unwrap();
    assert_eq!(v, Value::Matrix(want));
}

#[test]
fn matrix_branches_must_conform() {
    let mut ws = workspace(&[]);
    let err = eval(&mut ws, |b| {
        let c = b.matrix_of(&[&[1.0, 0.0], &[0.0, 1.0]]);
        let a = b.matrix_of(&[&[1.0, 2.0, 3.0]]);
        let z = b.num(0.0);
        b.ternary(c, a, z)
    })
    .unwrap_err();
    assert!(matches!(
        err.kind,
        genr_value::EvalErrorKind::NonConformable { .. }
    ));
}

#[test]
fn constant_condition_under_a_restricted_sample_matches_the_mixed_path() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0, 4.0]), ("s", &[-1.0, 2.0, -3.0, 4.0])]);
    ws.dataset.set_sample(1, 2).unwrap();
    let abs_of = |ws: &mut Workspace, name: &str| {
        eval(ws, |b| {
            let v = b.ident(name);
            let zero = b.num(0.0);
            let cond = b.binary(BinaryOp::Gt, v, zero);
            let neg = b.neg(v);
            b.ternary(cond, v, neg)
        })
        .unwrap()
    };
    // x > 0 over the whole sample; s changes sign inside it.
    let constant = abs_of(&mut ws, "x");
    let mixed = abs_of(&mut ws, "s");
    assert!(same(series(&constant), &[NA, 2.0, 3.0, NA]));
    assert!(same(series(&mixed), &[NA, 2.0, 3.0, NA]));
}
