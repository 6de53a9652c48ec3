//! Whole-statement tests: trees are built with [`TreeBuilder`] and run
//! against a small workspace.

mod assign_tests;
mod collection_tests;
mod conditional_tests;
mod function_tests;
mod operator_tests;
mod statement_tests;

use std::sync::Arc;

use genr_data::Dataset;
use genr_ir::{AssignOp, NodeId, TreeBuilder};

use crate::{EvalResult, Genr, Value, Workspace};

/// `lhs op rhs`.
pub(crate) fn assign(op: AssignOp, build: impl FnOnce(&mut TreeBuilder) -> (NodeId, NodeId)) -> Genr {
    let mut b = TreeBuilder::new();
    let (lhs, rhs) = build(&mut b);
    Genr::assign(Arc::new(b.finish()), lhs, op, Some(rhs))
}

/// `name = <expr>`.
pub(crate) fn set(name: &str, build: impl FnOnce(&mut TreeBuilder) -> NodeId) -> Genr {
    assign(AssignOp::Assign, |b| {
        let rhs = build(b);
        (b.ident(name), rhs)
    })
}

/// A bare expression.
pub(crate) fn expr(build: impl FnOnce(&mut TreeBuilder) -> NodeId) -> Genr {
    let mut b = TreeBuilder::new();
    let root = build(&mut b);
    Genr::expression(Arc::new(b.finish()), root)
}

pub(crate) fn eval(ws: &mut Workspace, build: impl FnOnce(&mut TreeBuilder) -> NodeId) -> EvalResult<Value> {
    expr(build).evaluate(ws)
}

/// Workspace over a dataset holding `series`, all of the same length.
pub(crate) fn workspace(series: &[(&str, &[f64])]) -> Workspace {
    let nobs = series.first().map_or(3, |(_, v)| v.len());
    let mut ds = Dataset::new(nobs);
    for (name, values) in series {
        ds.add_series(name, values.to_vec()).unwrap();
    }
    Workspace::new(ds)
}

/// Slice equality with NA equal to NA.
pub(crate) fn same(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
}

pub(crate) fn series(value: &Value) -> &[f64] {
    value
        .as_series()
        .unwrap_or_else(|| panic!("expected a series, got {value:?}"))
}
