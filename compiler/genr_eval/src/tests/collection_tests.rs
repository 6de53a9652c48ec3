//! Lists of series and categorical (string-valued) series.

use pretty_assertions::assert_eq;

use genr_ir::{AssignOp, BinaryOp, TreeBuilder};
use genr_value::{EvalErrorKind, List, SeriesId, StringTable};

use super::{assign, eval, series, set, workspace};
use crate::{Value, Workspace};

fn ids(raw: &[u32]) -> Value {
    Value::List(List::from_ids(raw.iter().map(|&i| SeriesId::new(i)).collect()))
}

/// x, y, z are series 1, 2, 3; `L = {x, y}`.
fn with_list() -> Workspace {
    let mut ws = workspace(&[
        ("x", &[1.0, 2.0, 3.0]),
        ("y", &[4.0, 5.0, 6.0]),
        ("z", &[7.0, 8.0, 9.0]),
    ]);
    set("L", |b| {
        let x = b.ident("x");
        let y = b.ident("y");
        b.list(&[x, y])
    })
    .execute(&mut ws)
    .unwrap();
    ws
}

/// `L op {names...}`
fn list_op(ws: &mut Workspace, op: BinaryOp, names: &[&str]) -> Value {
    eval(ws, |b: &mut TreeBuilder| {
        let l = b.ident("L");
        let elems: Vec<_> = names.iter().map(|n| b.ident(n)).collect();
        let rhs = b.list(&elems);
        b.binary(op, l, rhs)
    })
    .unwrap()
}

#[test]
fn list_operators() {
    let mut ws = with_list();
    assert_eq!(ws.vars.by_name("L"), Some(&ids(&[1, 2])));
    assert_eq!(list_op(&mut ws, BinaryOp::Intersect, &["y", "z"]), ids(&[2]));
    assert_eq!(list_op(&mut ws, BinaryOp::Union, &["y", "z"]), ids(&[1, 2, 3]));
    assert_eq!(list_op(&mut ws, BinaryOp::Sub, &["y"]), ids(&[1]));
    assert_eq!(list_op(&mut ws, BinaryOp::Add, &["x"]), ids(&[1, 2, 1]));
}

#[test]
fn list_subscripts() {
    let mut ws = with_list();
    let second = eval(&mut ws, |b| {
        let l = b.ident("L");
        let two = b.num(2.0);
        b.index(l, &[two])
    })
    .unwrap();
    assert_eq!(series(&second), &[4.0, 5.0, 6.0]);

    let head = eval(&mut ws, |b| {
        let l = b.ident("L");
        let r = b.range_of(1.0, 1.0);
        b.index(l, &[r])
    })
    .unwrap();
    assert_eq!(head, ids(&[1]));

    let err = eval(&mut ws, |b| {
        let l = b.ident("L");
        let three = b.num(3.0);
        b.index(l, &[three])
    })
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::IndexOutOfBounds { .. }));
}

#[test]
fn list_element_assignment() {
    let mut ws = with_list();
    let write = |op, at: f64, name: &'static str| {
        assign(op, move |b| {
            let l = b.ident("L");
            let i = b.num(at);
            (b.index(l, &[i]), b.ident(name))
        })
    };

    write(AssignOp::Assign, 2.0, "z").execute(&mut ws).unwrap();
    assert_eq!(ws.vars.by_name("L"), Some(&ids(&[1, 3])));

    // A numeric series id works too.
    assign(AssignOp::Assign, |b| {
        let l = b.ident("L");
        let one = b.num(1.0);
        (b.index(l, &[one]), b.num(2.0))
    })
    .execute(&mut ws)
    .unwrap();
    assert_eq!(ws.vars.by_name("L"), Some(&ids(&[2, 3])));

    let err = write(AssignOp::Add, 1.0, "x").execute(&mut ws).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::InvalidAssignment { .. }));

    let err = write(AssignOp::Assign, 5.0, "x").execute(&mut ws).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::IndexOutOfBounds { .. }));

    // Not a series id.
    let err = assign(AssignOp::Assign, |b| {
        let l = b.ident("L");
        let one = b.num(1.0);
        (b.index(l, &[one]), b.num(99.0))
    })
    .execute(&mut ws)
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
}

/// `s` holds codes into {"a", "b"}: a, b, a.
fn categorical() -> Workspace {
    let mut ws = workspace(&[("s", &[1.0, 2.0, 1.0]), ("x", &[1.0, 2.0, 3.0])]);
    let sid = ws.dataset.lookup("s").unwrap();
    ws.dataset
        .set_string_table(sid, Some(StringTable::from_strings(["a", "b"])))
        .unwrap();
    ws
}

fn compare(ws: &mut Workspace, name: &str, op: BinaryOp, label: &str) -> Vec<f64> {
    let v = eval(ws, |b| {
        let s = b.ident(name);
        let l = b.str(label);
        b.binary(op, s, l)
    })
    .unwrap();
    series(&v).to_vec()
}

#[test]
fn string_comparison_against_series() {
    let mut ws = categorical();
    assert_eq!(compare(&mut ws, "s", BinaryOp::Eq, "b"), [0.0, 1.0, 0.0]);
    assert_eq!(compare(&mut ws, "s", BinaryOp::NotEq, "a"), [0.0, 1.0, 0.0]);
    assert_eq!(compare(&mut ws, "s", BinaryOp::Eq, "nope"), [0.0, 0.0, 0.0]);
    // Without a string table the observation labels are compared.
    assert_eq!(compare(&mut ws, "x", BinaryOp::Eq, "2"), [0.0, 1.0, 0.0]);
}

#[test]
fn strings_written_into_a_categorical_series() {
    let mut ws = categorical();
    let sid = ws.dataset.lookup("s").unwrap();

    assign(AssignOp::Assign, |b| {
        let s = b.ident("s");
        let three = b.num(3.0);
        (b.index(s, &[three]), b.str("b"))
    })
    .execute(&mut ws)
    .unwrap();
    assert_eq!(ws.dataset.values(sid).unwrap(), &[1.0, 2.0, 2.0]);

    // A new category is added to the table.
    assign(AssignOp::Assign, |b| (b.ident("s"), b.str("c")))
        .execute(&mut ws)
        .unwrap();
    assert_eq!(ws.dataset.values(sid).unwrap(), &[3.0, 3.0, 3.0]);
    let table = ws.dataset.series(sid).unwrap().strings.as_ref().unwrap();
    assert_eq!(table.get(3.0), Some("c"));

    let err = assign(AssignOp::Assign, |b| {
        let s = b.ident("s");
        let one = b.num(1.0);
        (b.index(s, &[one]), b.num(2.0))
    })
    .execute(&mut ws)
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));

    // Strings only go into categorical series.
    let err = assign(AssignOp::Assign, |b| (b.ident("x"), b.str("a")))
        .execute(&mut ws)
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
}
