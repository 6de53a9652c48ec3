//! Assignment targets: whole variables, series observations, matrix blocks
//! and values nested in bundles and arrays.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use genr_ir::{AssignOp, TreeBuilder};
use genr_value::{ArrayKind, EvalErrorKind, GArray, Matrix};

use super::{assign, set, workspace};
use crate::{TargetType, Value, Workspace};

fn var<'w>(ws: &'w Workspace, name: &str) -> &'w Value {
    ws.vars
        .by_name(name)
        .unwrap_or_else(|| panic!("no variable {name}"))
}

fn m33() -> crate::Genr {
    set("M", |b| {
        b.matrix_of(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]])
    })
}

#[test]
fn block_update_in_place() {
    let mut ws = workspace(&[]);
    m33().execute(&mut ws).unwrap();
    assign(AssignOp::Add, |b| {
        let m = b.ident("M");
        let rows = b.range_of(1.0, 2.0);
        let cols = b.range_of(1.0, 2.0);
        let lhs = b.index(m, &[rows, cols]);
        let two = b.num(2.0);
        (lhs, b.call("ones", &[two, two]))
    })
    .execute(&mut ws)
    .unwrap();

    let want = Matrix::from_rows(&[[2.0, 3.0, 3.0], [5.0, 6.0, 6.0], [7.0, 8.0, 9.0]]).unwrap();
    assert_eq!(var(&ws, "M"), &Value::Matrix(want));
}

#[test]
fn fill_sets_every_element() {
    let mut ws = workspace(&[]);
    m33().execute(&mut ws).unwrap();
    assign(AssignOp::Fill, |b| (b.ident("M"), b.num(0.5)))
        .execute(&mut ws)
        .unwrap();
    assert_eq!(var(&ws, "M"), &Value::Matrix(Matrix::filled(3, 3, 0.5)));
}

#[test]
fn matrix_inside_a_bundle() {
    let mut ws = workspace(&[]);
    set("b", |b| b.bundle(&[])).execute(&mut ws).unwrap();

    // b["m"] = {1,2;3,4}
    assign(AssignOp::Assign, |b| {
        let bundle = b.ident("b");
        let key = b.str("m");
        let lhs = b.index(bundle, &[key]);
        (lhs, b.matrix_of(&[&[1.0, 2.0], &[3.0, 4.0]]))
    })
    .execute(&mut ws)
    .unwrap();
    assign(AssignOp::Assign, |b| {
        let bundle = b.ident("b");
        (b.member(bundle, "s"), b.str("hi"))
    })
    .execute(&mut ws)
    .unwrap();

    // b["m"][1,1] += 10
    assign(AssignOp::Add, |b| {
        let bundle = b.ident("b");
        let key = b.str("m");
        let member = b.index(bundle, &[key]);
        let one = b.num(1.0);
        let lhs = b.index(member, &[one, one]);
        (lhs, b.num(10.0))
    })
    .execute(&mut ws)
    .unwrap();

    // b.m[2,2] = 0
    assign(AssignOp::Assign, |b| {
        let bundle = b.ident("b");
        let member = b.member(bundle, "m");
        let two = b.num(2.0);
        let lhs = b.index(member, &[two, two]);
        (lhs, b.num(0.0))
    })
    .execute(&mut ws)
    .unwrap();

    let bundle = var(&ws, "b").as_bundle().unwrap();
    let want = Matrix::from_rows(&[[11.0, 2.0], [3.0, 0.0]]).unwrap();
    assert_eq!(bundle.get("m"), Some(&Value::Matrix(want)));
    assert_eq!(bundle.get("s"), Some(&Value::string("hi")));
}

#[test]
fn null_member_is_removed_or_reset() {
    let mut ws = workspace(&[]);
    set("b", |b| {
        let x = b.num(1.0);
        let y = b.num(2.0);
        b.bundle(&[("x", x), ("y", y)])
    })
    .execute(&mut ws)
    .unwrap();

    assign(AssignOp::Assign, |b| {
        let bundle = b.ident("b");
        (b.member(bundle, "x"), b.null())
    })
    .execute(&mut ws)
    .unwrap();
    assign(AssignOp::Assign, |b| {
        let bundle = b.ident("b");
        (b.member(bundle, "y"), b.null())
    })
    .with_target(TargetType::Str)
    .execute(&mut ws)
    .unwrap();

    let bundle = var(&ws, "b").as_bundle().unwrap();
    assert!(!bundle.contains("x"));
    assert_eq!(bundle.get("y"), Some(&Value::string("")));
}

#[test]
fn array_element_and_string_character() {
    let mut ws = workspace(&[]);
    set("a", |b| {
        let x = b.str("x");
        let y = b.str("y");
        b.array(&[x, y])
    })
    .execute(&mut ws)
    .unwrap();
    set("s", |b| b.str("abc")).execute(&mut ws).unwrap();

    assign(AssignOp::Assign, |b| {
        let a = b.ident("a");
        let two = b.num(2.0);
        (b.index(a, &[two]), b.str("z"))
    })
    .execute(&mut ws)
    .unwrap();
    assign(AssignOp::Assign, |b| {
        let s = b.ident("s");
        let two = b.num(2.0);
        (b.index(s, &[two]), b.str("X"))
    })
    .execute(&mut ws)
    .unwrap();

    let mut want = GArray::with_kind(ArrayKind::Strings);
    want.push(Value::string("x")).unwrap();
    want.push(Value::string("z")).unwrap();
    assert_eq!(var(&ws, "a"), &Value::Array(want));
    assert_eq!(var(&ws, "s"), &Value::string("aXc"));

    // Characters only take plain assignment.
    let err = assign(AssignOp::Add, |b| {
        let s = b.ident("s");
        let one = b.num(1.0);
        (b.index(s, &[one]), b.str("Y"))
    })
    .execute(&mut ws)
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::InvalidAssignment { .. }));
}

#[test]
fn existing_variable_keeps_its_type() {
    let mut ws = workspace(&[]);
    set("k", |b| b.num(1.0)).execute(&mut ws).unwrap();

    // A 1×1 matrix assigned to a scalar is converted.
    set("k", |b| b.matrix_of(&[&[5.0]])).execute(&mut ws).unwrap();
    assert_eq!(var(&ws, "k"), &Value::Scalar(5.0));

    let err = set("k", |b| b.num(2.0))
        .with_target(TargetType::Matrix)
        .execute(&mut ws)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::InvalidAssignment { .. }));
    assert_eq!(var(&ws, "k"), &Value::Scalar(5.0));
}

#[test]
fn null_definitions() {
    let mut ws = workspace(&[]);
    let err = set("n", |b| b.null()).execute(&mut ws).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::InvalidAssignment { .. }));

    set("m", |b| b.null())
        .with_target(TargetType::Matrix)
        .execute(&mut ws)
        .unwrap();
    assert_eq!(var(&ws, "m"), &Value::Matrix(Matrix::default()));
}

#[test]
fn inflected_assignment_needs_an_existing_target() {
    let mut ws = workspace(&[]);
    let err = assign(AssignOp::Add, |b| (b.ident("fresh"), b.num(1.0)))
        .execute(&mut ws)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UndefinedSymbol { .. }));
}

#[test]
fn increment_scalar() {
    let mut ws = workspace(&[]);
    set("k", |b| b.num(1.0)).execute(&mut ws).unwrap();
    let mut b = TreeBuilder::new();
    let lhs = b.ident("k");
    let mut inc = crate::Genr::assign(Arc::new(b.finish()), lhs, AssignOp::Inc, None);
    inc.execute(&mut ws).unwrap();
    inc.execute(&mut ws).unwrap();
    assert_eq!(var(&ws, "k"), &Value::Scalar(3.0));
}

#[test]
fn series_observation_writes() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    assign(AssignOp::Assign, |b| {
        let x = b.ident("x");
        let two = b.num(2.0);
        (b.index(x, &[two]), b.num(10.0))
    })
    .execute(&mut ws)
    .unwrap();
    assign(AssignOp::Add, |b| {
        let x = b.ident("x");
        let two = b.num(2.0);
        (b.index(x, &[two]), b.num(1.0))
    })
    .execute(&mut ws)
    .unwrap();

    let x = ws.dataset.lookup("x").unwrap();
    assert_eq!(ws.dataset.values(x).unwrap(), &[1.0, 11.0, 3.0]);
}

#[test]
fn series_update_respects_the_sample() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    ws.dataset.set_sample(1, 2).unwrap();
    assign(AssignOp::Mul, |b| (b.ident("x"), b.num(2.0)))
        .execute(&mut ws)
        .unwrap();
    let x = ws.dataset.lookup("x").unwrap();
    assert_eq!(ws.dataset.values(x).unwrap(), &[1.0, 4.0, 6.0]);

    let err = assign(AssignOp::Assign, |b| (b.ident("x"), b.num(1.0)))
        .with_target(TargetType::Matrix)
        .execute(&mut ws)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::InvalidAssignment { .. }));
}

#[test]
fn new_series_is_na_outside_the_sample() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0, 4.0])]);
    ws.dataset.set_sample(1, 2).unwrap();
    set("y", |b| b.ident("x")).execute(&mut ws).unwrap();
    set("z", |b| {
        let x = b.ident("x");
        let zero = b.num(0.0);
        b.add(x, zero)
    })
    .execute(&mut ws)
    .unwrap();

    for name in ["y", "z"] {
        let id = ws.dataset.lookup(name).unwrap();
        assert!(
            super::same(ws.dataset.values(id).unwrap(), &[f64::NAN, 2.0, 3.0, f64::NAN]),
            "{name}"
        );
    }
}
