//! Statement execution, caching and short-circuit evaluation.

use pretty_assertions::assert_eq;

use genr_value::{EvalErrorKind, Matrix, NumericWarning, NA};

use super::{eval, expr, same, series, set, workspace};
use crate::{EvalConfig, Value, WarningPolicy};

/// `y = x * 2 + 1`
fn affine() -> crate::Genr {
    set("y", |b| {
        let x = b.ident("x");
        let two = b.num(2.0);
        let prod = b.mul(x, two);
        let one = b.num(1.0);
        b.add(prod, one)
    })
}

#[test]
fn new_series_is_added_to_the_dataset() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    affine().execute(&mut ws).unwrap();
    let y = ws.dataset.lookup("y").unwrap();
    assert_eq!(ws.dataset.values(y).unwrap(), &[3.0, 5.0, 7.0]);
    assert!(ws.vars.lookup("y").is_none());
}

#[test]
fn compiled_statement_reuses_its_nodes() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    let mut stmt = affine().compiled(true);

    stmt.execute(&mut ws).unwrap();
    let first = stmt.cache_stats();
    assert!(first.allocated > 0);
    assert!(!stmt.cache().is_starting());

    let x = ws.dataset.lookup("x").unwrap();
    for round in 0..3 {
        let shift = f64::from(round);
        ws.dataset.series_mut(x).unwrap().values = vec![shift, shift + 1.0, NA];
        stmt.execute(&mut ws).unwrap();

        // Same result as a one-shot statement.
        let mut reference = workspace(&[("x", &[shift, shift + 1.0, NA])]);
        affine().execute(&mut reference).unwrap();
        let y = ws.dataset.lookup("y").unwrap();
        let y_ref = reference.dataset.lookup("y").unwrap();
        assert!(same(
            ws.dataset.values(y).unwrap(),
            reference.dataset.values(y_ref).unwrap()
        ));
    }

    let last = stmt.cache_stats();
    assert_eq!(last.allocated, first.allocated);
    assert!(last.reused > first.reused);
}

#[test]
fn uncompiled_statement_starts_over() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    let mut stmt = affine();
    stmt.execute(&mut ws).unwrap();
    let first = stmt.cache_stats();
    stmt.execute(&mut ws).unwrap();

    assert_eq!(stmt.cache().live_nodes(), 0);
    assert_eq!(stmt.cache_stats().allocated, 2 * first.allocated);
}

#[test]
fn compiled_config_builds_compiled_statements() {
    let ws = workspace(&[]).with_config(EvalConfig::new().compile(true));
    let stmt = {
        let mut b = genr_ir::TreeBuilder::new();
        let root = b.num(1.0);
        ws.statement(std::sync::Arc::new(b.finish()), None, genr_ir::AssignOp::Assign, Some(root))
    };
    assert!(stmt.is_compiled());
}

#[test]
fn and_skips_the_right_side_on_false() {
    let mut ws = workspace(&[]);
    let v = eval(&mut ws, |b| {
        let f = b.num(0.0);
        let bad = b.call("nosuch", &[]);
        b.and(f, bad)
    })
    .unwrap();
    assert_eq!(v, Value::Scalar(0.0));
}

#[test]
fn or_skips_the_right_side_on_true() {
    let mut ws = workspace(&[]);
    let v = eval(&mut ws, |b| {
        let t = b.num(2.0);
        let bad = b.ident("undefined_thing");
        b.or(t, bad)
    })
    .unwrap();
    assert_eq!(v, Value::Scalar(1.0));
}

#[test]
fn undecided_left_side_evaluates_the_right() {
    let mut ws = workspace(&[]);
    let err = eval(&mut ws, |b| {
        let t = b.num(1.0);
        let bad = b.call("nosuch", &[]);
        b.and(t, bad)
    })
    .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UnknownFunction { .. }));
}

#[test]
fn errors_name_the_statement() {
    let mut ws = workspace(&[]);
    let err = set("z", |b| b.ident("nowhere")).execute(&mut ws).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::UndefinedSymbol { .. }));
    assert!(err.notes.iter().any(|n| n.starts_with("in statement")));
    assert!(ws.vars.lookup("z").is_none());
}

#[test]
fn warnings_are_recorded_by_default() {
    let mut ws = workspace(&[]);
    let v = eval(&mut ws, |b| {
        let one = b.num(1.0);
        let zero = b.num(0.0);
        b.div(one, zero)
    })
    .unwrap();
    assert!(v.as_scalar().unwrap().is_nan());
    assert_eq!(ws.warnings().entries(), &[(NumericWarning::DivisionByZero, 1)]);
    assert_eq!(ws.take_warnings().len(), 1);
    assert!(ws.warnings().is_empty());
}

#[test]
fn warnings_fail_the_statement_under_error_policy() {
    let mut ws = workspace(&[]).with_config(EvalConfig::new().warnings(WarningPolicy::Error));
    let result = expr(|b| {
        let one = b.num(1.0);
        let zero = b.num(0.0);
        b.div(one, zero)
    })
    .evaluate(&mut ws);
    assert!(result.is_err());
    assert!(ws.warnings().is_empty());
}

#[test]
fn bare_expression_returns_its_value() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    let v = eval(&mut ws, |b| b.ident("x")).unwrap();
    assert_eq!(series(&v), &[1.0, 2.0, 3.0]);
}

#[test]
fn compiled_statement_follows_renamed_series() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0]), ("w", &[10.0, 20.0, 30.0])]);
    let mut stmt = affine().compiled(true);
    stmt.execute(&mut ws).unwrap();
    stmt.execute(&mut ws).unwrap();
    let before = stmt.cache_stats();

    let x = ws.dataset.lookup("x").unwrap();
    let w = ws.dataset.lookup("w").unwrap();
    ws.dataset.rename_series(x, "old").unwrap();
    ws.dataset.rename_series(w, "x").unwrap();
    stmt.execute(&mut ws).unwrap();

    let y = ws.dataset.lookup("y").unwrap();
    assert_eq!(ws.dataset.values(y).unwrap(), &[21.0, 41.0, 61.0]);
    assert!(stmt.cache_stats().discarded > before.discarded);
}

#[test]
fn compiled_statement_follows_a_resize() {
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    let mut stmt = affine().compiled(true);
    stmt.execute(&mut ws).unwrap();

    ws.dataset.resize(4).unwrap();
    let x = ws.dataset.lookup("x").unwrap();
    ws.dataset.series_mut(x).unwrap().values[3] = 5.0;
    stmt.execute(&mut ws).unwrap();

    let y = ws.dataset.lookup("y").unwrap();
    assert_eq!(ws.dataset.values(y).unwrap(), &[3.0, 5.0, 7.0, 11.0]);
}

#[test]
fn compiled_expression_tracks_kind_changes_between_runs() {
    // (c ? M : s) * 2 + (c && 3)
    let build = |b: &mut genr_ir::TreeBuilder| {
        let c = b.ident("c");
        let m = b.ident("M");
        let s = b.ident("s");
        let pick = b.ternary(c, m, s);
        let two = b.num(2.0);
        let scaled = b.mul(pick, two);
        let c2 = b.ident("c");
        let three = b.num(3.0);
        let both = b.and(c2, three);
        b.add(scaled, both)
    };
    let mut ws = workspace(&[]);
    ws.vars
        .insert("M", Value::Matrix(Matrix::from_rows(&[[1.0, 2.0]]).unwrap()))
        .unwrap();
    ws.vars.insert("s", Value::Scalar(5.0)).unwrap();
    let mut stmt = expr(build).compiled(true);

    for c in [1.0, 0.0, 1.0, 0.0] {
        ws.vars.insert("c", Value::Scalar(c)).unwrap();
        let compiled = stmt.evaluate(&mut ws).unwrap();
        let fresh = eval(&mut ws, build).unwrap();
        assert_eq!(compiled, fresh);
        if c == 0.0 {
            assert_eq!(compiled, Value::Scalar(10.0));
        } else {
            assert_eq!(compiled.as_matrix().unwrap().real().unwrap(), &[3.0, 5.0]);
        }
    }
    assert!(stmt.cache_stats().retagged > 0);
}

#[test]
fn deeply_nested_expression_does_not_overflow() {
    const DEPTH: usize = 20_000;
    let mut ws = workspace(&[("x", &[1.0, 2.0, 3.0])]);
    let v = eval(&mut ws, |b| {
        let mut acc = b.ident("x");
        for _ in 0..DEPTH {
            let one = b.num(1.0);
            acc = b.add(acc, one);
        }
        acc
    })
    .unwrap();
    let n = DEPTH as f64;
    assert_eq!(series(&v), &[1.0 + n, 2.0 + n, 3.0 + n]);
}
