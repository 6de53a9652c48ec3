//! User-defined functions: parameters, pointer arguments, return types and
//! recursion.

use pretty_assertions::assert_eq;

use genr_ir::{AssignOp, BinaryOp};
use genr_value::{EvalErrorKind, Matrix};

use super::{assign, eval, expr, set, workspace};
use crate::{EvalConfig, Param, TargetType, UserFunction, Value, Workspace};

fn define(ws: &Workspace, func: UserFunction) {
    ws.functions().define(func);
}

/// `function scalar sq(scalar v) { return v * v }`
fn sq() -> UserFunction {
    UserFunction::new("sq")
        .param(Param::new("v", TargetType::Scalar))
        .returns(
            TargetType::Scalar,
            expr(|b| {
                let v = b.ident("v");
                b.mul(v, v)
            }),
        )
}

#[test]
fn call_returns_the_converted_value() {
    let mut ws = workspace(&[]);
    define(&ws, sq());
    let v = eval(&mut ws, |b| {
        let three = b.num(3.0);
        b.call("sq", &[three])
    })
    .unwrap();
    assert_eq!(v, Value::Scalar(9.0));

    // The warm copy is reused on the next call.
    let v = eval(&mut ws, |b| {
        let four = b.num(4.0);
        b.call("sq", &[four])
    })
    .unwrap();
    assert_eq!(v, Value::Scalar(16.0));
    assert!(!ws.in_function());
    assert!(ws.vars.lookup("v").is_none());
}

#[test]
fn return_type_converts() {
    let mut ws = workspace(&[]);
    define(
        &ws,
        UserFunction::new("five").returns(TargetType::Matrix, expr(|b| b.num(5.0))),
    );
    let v = eval(&mut ws, |b| b.call("five", &[])).unwrap();
    assert_eq!(v, Value::Matrix(Matrix::scalar(5.0)));
}

#[test]
fn wrong_arity_is_an_error() {
    let mut ws = workspace(&[]);
    define(&ws, sq());
    let err = eval(&mut ws, |b| b.call("sq", &[])).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArityMismatch { .. }));
    assert!(err.notes.iter().any(|n| n == "in function sq"));
}

#[test]
fn pointer_argument_is_updated_in_place() {
    let mut ws = workspace(&[]);
    // function void bump(matrix *m) { m[1,1] += 1 }
    define(
        &ws,
        UserFunction::new("bump")
            .param(Param::by_ref("m", TargetType::Matrix))
            .statement(assign(AssignOp::Add, |b| {
                let m = b.ident("m");
                let one = b.num(1.0);
                (b.index(m, &[one, one]), b.num(1.0))
            })),
    );
    set("M", |b| b.matrix_of(&[&[1.0, 2.0]])).execute(&mut ws).unwrap();

    for _ in 0..2 {
        eval(&mut ws, |b| {
            let m = b.ident("M");
            let ptr = b.reference(m);
            b.call("bump", &[ptr])
        })
        .unwrap();
    }
    assert_eq!(
        ws.vars.by_name("M"),
        Some(&Value::Matrix(Matrix::row(vec![3.0, 2.0])))
    );
}

#[test]
fn pointer_argument_needs_an_address() {
    let mut ws = workspace(&[]);
    define(
        &ws,
        UserFunction::new("touch").param(Param::by_ref("m", TargetType::Matrix)),
    );
    let err = eval(&mut ws, |b| {
        let m = b.matrix_of(&[&[1.0]]);
        b.call("touch", &[m])
    })
    .unwrap_err();
    assert!(err.message.contains("pointer"));
}

/// `function scalar fact(scalar n) { return n <= 1 ? 1 : n * fact(n - 1) }`
fn fact() -> UserFunction {
    UserFunction::new("fact")
        .param(Param::new("n", TargetType::Scalar))
        .returns(
            TargetType::Scalar,
            expr(|b| {
                let n = b.ident("n");
                let one = b.num(1.0);
                let cond = b.binary(BinaryOp::LtEq, n, one);
                let n1 = b.sub(n, one);
                let inner = b.call("fact", &[n1]);
                let prod = b.mul(n, inner);
                b.ternary(cond, one, prod)
            }),
        )
}

#[test]
fn recursion_runs_on_fresh_copies() {
    let mut ws = workspace(&[]);
    define(&ws, fact());
    for (n, want) in [(5.0, 120.0), (3.0, 6.0), (1.0, 1.0)] {
        let v = eval(&mut ws, |b| {
            let n = b.num(n);
            b.call("fact", &[n])
        })
        .unwrap();
        assert_eq!(v, Value::Scalar(want));
    }
}

#[test]
fn runaway_recursion_hits_the_limit() {
    let mut ws = workspace(&[]).with_config(EvalConfig::new().max_depth(4));
    // function scalar forever(scalar n) { return forever(n) }
    define(
        &ws,
        UserFunction::new("forever")
            .param(Param::new("n", TargetType::Scalar))
            .returns(
                TargetType::Scalar,
                expr(|b| {
                    let n = b.ident("n");
                    b.call("forever", &[n])
                }),
            ),
    );
    let err = eval(&mut ws, |b| {
        let one = b.num(1.0);
        b.call("forever", &[one])
    })
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::RecursionLimit { depth: 4 }));
    assert!(!ws.in_function());
}

#[test]
fn series_assigned_in_a_function_stays_local() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    // function series twice(series s) { series t = s * 2; return t }
    define(
        &ws,
        UserFunction::new("twice")
            .param(Param::new("s", TargetType::Series))
            .statement(
                set("t", |b| {
                    let s = b.ident("s");
                    let two = b.num(2.0);
                    b.mul(s, two)
                })
                .with_target(TargetType::Series),
            )
            .returns(TargetType::Series, expr(|b| b.ident("t"))),
    );
    let v = eval(&mut ws, |b| {
        let x = b.ident("x");
        b.call("twice", &[x])
    })
    .unwrap();
    assert_eq!(super::series(&v), &[2.0, 4.0, 6.0]);
    assert!(ws.dataset.lookup("t").is_none());
}

#[test]
fn member_retyped_by_a_later_argument_is_an_error() {
    let mut ws = workspace(&[]);
    // function scalar retype(bundle *bb) { bb.x = "hi"; return 0 }
    define(
        &ws,
        UserFunction::new("retype")
            .param(Param::by_ref("bb", TargetType::Bundle))
            .statement(assign(AssignOp::Assign, |b| {
                let bb = b.ident("bb");
                (b.member(bb, "x"), b.str("hi"))
            }))
            .returns(TargetType::Scalar, expr(|b| b.num(0.0))),
    );
    set("b", |b| {
        let m = b.matrix_of(&[&[1.0, 2.0]]);
        b.bundle(&[("x", m)])
    })
    .execute(&mut ws)
    .unwrap();

    let err = eval(&mut ws, |b| {
        let base = b.ident("b");
        let x = b.member(base, "x");
        let target = b.ident("b");
        let ptr = b.reference(target);
        let call = b.call("retype", &[ptr]);
        b.add(x, call)
    })
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));

    // The write itself went through.
    let Some(Value::Bundle(bundle)) = ws.vars.by_name("b") else {
        panic!("b is not a bundle");
    };
    assert_eq!(bundle.get("x"), Some(&Value::string("hi")));
}

#[test]
fn repeated_pointer_parameter_keeps_caller_values() {
    let mut ws = workspace(&[]);
    // function scalar twice(scalar *a, scalar *a) { return 0 }
    define(
        &ws,
        UserFunction::new("twice")
            .param(Param::by_ref("a", TargetType::Scalar))
            .param(Param::by_ref("a", TargetType::Scalar))
            .returns(TargetType::Scalar, expr(|b| b.num(0.0))),
    );
    ws.vars.insert("p", Value::Scalar(1.0)).unwrap();
    ws.vars.insert("q", Value::Scalar(2.0)).unwrap();

    let err = eval(&mut ws, |b| {
        let p = b.ident("p");
        let q = b.ident("q");
        let (p, q) = (b.reference(p), b.reference(q));
        b.call("twice", &[p, q])
    })
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::InvalidAssignment { .. }));
    assert_eq!(ws.vars.by_name("p"), Some(&Value::Scalar(1.0)));
    assert_eq!(ws.vars.by_name("q"), Some(&Value::Scalar(2.0)));
}
