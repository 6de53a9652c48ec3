//! Builtin call protocol.
//!
//! A builtin is a plain function pointer plus a [`Signature`]. The evaluator
//! evaluates the arguments left to right, checks them against the signature
//! and hands the routine a slice of [`Operand`] views together with the
//! output value to write. Routines report failure with a [`BuiltinError`],
//! which the evaluator turns into an [`EvalError`] naming the function.

mod library;

use std::fmt;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use genr_data::Dataset;
use genr_value::errors::{
    allocation_failure, arity_mismatch, domain_error, non_conformable, type_mismatch,
};
use genr_value::{EvalError, EvalResult, NumericWarning, Operand, Value, ValueKind};

use crate::context::WarningLog;

bitflags! {
    /// Value kinds accepted at an argument position.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ArgMask: u8 {
        const SCALAR = 1 << 0;
        const SERIES = 1 << 1;
        const MATRIX = 1 << 2;
        const STRING = 1 << 3;
        const LIST = 1 << 4;
        const BUNDLE = 1 << 5;
        const ARRAY = 1 << 6;
        const NULL = 1 << 7;

        const NUMERIC = Self::SCALAR.bits() | Self::SERIES.bits() | Self::MATRIX.bits();
        const ANY = !0;
    }
}

impl ArgMask {
    /// The single-kind mask for `kind`.
    pub fn of(kind: ValueKind) -> ArgMask {
        match kind {
            ValueKind::Undefined => ArgMask::NULL,
            ValueKind::Scalar => ArgMask::SCALAR,
            ValueKind::Series => ArgMask::SERIES,
            ValueKind::Matrix => ArgMask::MATRIX,
            ValueKind::Str => ArgMask::STRING,
            ValueKind::List => ArgMask::LIST,
            ValueKind::Bundle => ArgMask::BUNDLE,
            ValueKind::Array => ArgMask::ARRAY,
        }
    }

    fn describe(self) -> String {
        const NAMES: [(ArgMask, &str); 8] = [
            (ArgMask::SCALAR, "scalar"),
            (ArgMask::SERIES, "series"),
            (ArgMask::MATRIX, "matrix"),
            (ArgMask::STRING, "string"),
            (ArgMask::LIST, "list"),
            (ArgMask::BUNDLE, "bundle"),
            (ArgMask::ARRAY, "array"),
            (ArgMask::NULL, "null"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(mask, _)| self.contains(*mask))
            .map(|&(_, name)| name)
            .collect();
        names.join(" or ")
    }
}

/// Arity and per-position argument kinds.
///
/// Positions past the end of `args` use the last mask; an empty `args`
/// accepts anything.
#[derive(Copy, Clone, Debug)]
pub struct Signature {
    pub min: usize,
    pub max: usize,
    pub args: &'static [ArgMask],
}

impl Signature {
    pub const fn new(min: usize, max: usize, args: &'static [ArgMask]) -> Self {
        Self { min, max, args }
    }

    /// Exactly `n` arguments of the given kinds.
    pub const fn fixed(args: &'static [ArgMask]) -> Self {
        Self::new(args.len(), args.len(), args)
    }

    fn mask(&self, pos: usize) -> ArgMask {
        match self.args.get(pos).or(self.args.last()) {
            Some(mask) => *mask,
            None => ArgMask::ANY,
        }
    }

    /// Check evaluated arguments against the signature.
    pub fn check(&self, name: &str, args: &[Operand<'_>]) -> EvalResult<()> {
        if args.len() < self.min || args.len() > self.max {
            return Err(arity_mismatch(name, self.min, self.max, args.len()));
        }
        for (i, arg) in args.iter().enumerate() {
            let mask = self.mask(i);
            if !mask.contains(ArgMask::of(arg.kind())) {
                return Err(type_mismatch(
                    format!("{} for argument {} of {name}", mask.describe(), i + 1),
                    arg.kind(),
                ));
            }
        }
        Ok(())
    }
}

/// Failure reported by a builtin routine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuiltinError {
    InsufficientArgs,
    NonConformable {
        left: (usize, usize),
        right: (usize, usize),
    },
    Domain(String),
    Alloc,
    Invalid(String),
}

impl BuiltinError {
    /// Convert to an evaluation error attributed to builtin `name`.
    pub fn into_eval(self, name: &str) -> EvalError {
        match self {
            BuiltinError::InsufficientArgs => {
                EvalError::new(format!("{name}: insufficient arguments"))
            }
            BuiltinError::NonConformable { left, right } => non_conformable(name, left, right),
            BuiltinError::Domain(what) => domain_error(format!("{name}: {what}")),
            BuiltinError::Alloc => allocation_failure(format!("result of {name}")),
            BuiltinError::Invalid(message) => EvalError::new(format!("{name}: {message}")),
        }
    }
}

impl fmt::Display for BuiltinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinError::InsufficientArgs => write!(f, "insufficient arguments"),
            BuiltinError::NonConformable { left, right } => write!(
                f,
                "non-conformable arguments: {} x {} and {} x {}",
                left.0, left.1, right.0, right.1
            ),
            BuiltinError::Domain(what) => write!(f, "domain error: {what}"),
            BuiltinError::Alloc => write!(f, "allocation failure"),
            BuiltinError::Invalid(message) => write!(f, "{message}"),
        }
    }
}

impl From<BuiltinError> for EvalError {
    fn from(err: BuiltinError) -> Self {
        err.into_eval("builtin")
    }
}

/// What a builtin can see besides its arguments.
pub struct CallCtx<'a> {
    dataset: &'a Dataset,
    warnings: &'a mut WarningLog,
}

impl<'a> CallCtx<'a> {
    pub(crate) fn new(dataset: &'a Dataset, warnings: &'a mut WarningLog) -> Self {
        Self { dataset, warnings }
    }

    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    /// Active sample, 0-based inclusive.
    pub fn sample(&self) -> (usize, usize) {
        self.dataset.sample()
    }

    pub fn nobs(&self) -> usize {
        self.dataset.nobs()
    }

    /// Record a non-fatal numeric warning.
    pub fn warn(&mut self, warning: NumericWarning) {
        self.warnings.record(warning);
    }
}

/// Builtin routine.
pub type BuiltinFn =
    fn(args: &[Operand<'_>], ctx: &mut CallCtx<'_>, out: &mut Value) -> Result<(), BuiltinError>;

#[derive(Copy, Clone)]
pub struct Builtin {
    pub signature: Signature,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Name → builtin lookup.
#[derive(Clone, Default)]
pub struct BuiltinTable {
    map: FxHashMap<String, Builtin>,
}

impl BuiltinTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the standard library.
    pub fn with_stdlib() -> Self {
        let mut table = Self::new();
        library::register_all(&mut table);
        table
    }

    /// Add or replace a builtin.
    pub fn register(&mut self, name: &str, signature: Signature, func: BuiltinFn) {
        self.map
            .insert(name.to_owned(), Builtin { signature, func });
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for BuiltinTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("BuiltinTable").field("names", &names).finish()
    }
}
