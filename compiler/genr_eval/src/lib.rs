//! Genr Eval - tree-walking evaluator for genr expressions.
//!
//! # Architecture
//!
//! - [`Genr`]: one statement (`lhs op rhs` or a bare expression) plus the
//!   [`AuxCache`] of its tree
//! - `eval`: the walker; every tree position writes its value into a cached
//!   node that is reused on later executions of a compiled statement
//! - `operators`, `unary`: dispatch over operand kinds
//! - `conditional`: the ternary operator and its branch-skipping rules
//! - `lhs`: assignment targets, from whole variables down to matrix blocks
//!   inside bundle members
//! - [`BuiltinTable`] and [`FunctionTable`]: callable routines, shared
//!   between workspaces through [`SharedBuiltins`] and
//!   [`SharedFunctions`]
//!
//! A statement runs against a [`Workspace`]: the dataset, the user
//! variables, the registries and the [`EvalConfig`].

mod aux;
mod builtins;
mod conditional;
mod context;
mod eval;
mod function;
mod genr;
mod lhs;
mod operators;
mod select;
mod shared;
mod unary;

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;

use std::sync::Once;

pub use aux::{AuxCache, AuxId, CacheStats, NodeFlags, Slot};
pub use builtins::{
    ArgMask, Builtin, BuiltinError, BuiltinFn, BuiltinTable, CallCtx, Signature,
};
pub use context::{EvalConfig, TargetType, WarningLog, WarningPolicy, Workspace};
pub use function::{FunctionTable, Param, UserFunction};
pub use genr::Genr;
pub use shared::{SharedBuiltins, SharedFunctions};

pub use genr_value::{EvalError, EvalErrorKind, EvalResult, NumericWarning, Value};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and only the first call has any
/// effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
