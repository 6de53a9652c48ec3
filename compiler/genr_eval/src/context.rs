//! Execution context: the workspace a statement runs against, the declared
//! assignment type, configuration and the numeric-warning log.

use std::fmt;

use genr_data::{Dataset, UserVars};
use genr_value::{ArrayKind, EvalError, NumericWarning, ValueKind};

use crate::shared::{SharedBuiltins, SharedFunctions};

/// Declared type of an assignment (`matrix m = ...`), or `Any` when the
/// statement carries no type keyword.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TargetType {
    #[default]
    Any,
    Scalar,
    Series,
    Matrix,
    Str,
    List,
    Bundle,
    Array(ArrayKind),
}

impl TargetType {
    /// Parse a type keyword.
    pub fn from_keyword(word: &str) -> Option<TargetType> {
        Some(match word {
            "scalar" => TargetType::Scalar,
            "series" => TargetType::Series,
            "matrix" => TargetType::Matrix,
            "string" => TargetType::Str,
            "list" => TargetType::List,
            "bundle" => TargetType::Bundle,
            "strings" => TargetType::Array(ArrayKind::Strings),
            "matrices" => TargetType::Array(ArrayKind::Matrices),
            "bundles" => TargetType::Array(ArrayKind::Bundles),
            "lists" => TargetType::Array(ArrayKind::Lists),
            "arrays" => TargetType::Array(ArrayKind::Arrays),
            _ => return None,
        })
    }

    /// Value kind this type produces; `None` for `Any`.
    pub fn value_kind(self) -> Option<ValueKind> {
        match self {
            TargetType::Any => None,
            TargetType::Scalar => Some(ValueKind::Scalar),
            TargetType::Series => Some(ValueKind::Series),
            TargetType::Matrix => Some(ValueKind::Matrix),
            TargetType::Str => Some(ValueKind::Str),
            TargetType::List => Some(ValueKind::List),
            TargetType::Bundle => Some(ValueKind::Bundle),
            TargetType::Array(_) => Some(ValueKind::Array),
        }
    }

    pub fn is_any(self) -> bool {
        matches!(self, TargetType::Any)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Any => write!(f, "any"),
            TargetType::Array(kind) => write!(f, "{kind}"),
            other => match other.value_kind() {
                Some(kind) => write!(f, "{kind}"),
                None => Ok(()),
            },
        }
    }
}

/// What happens when a numeric warning is raised.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WarningPolicy {
    /// Record the warning; the offending element becomes NA.
    #[default]
    Record,
    /// Fail the statement once it finishes.
    Error,
}

/// Evaluator configuration.
#[derive(Clone, Debug)]
pub struct EvalConfig {
    max_depth: usize,
    compile: bool,
    warnings: WarningPolicy,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            compile: false,
            warnings: WarningPolicy::Record,
        }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum nesting of user-function calls.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Whether [`Workspace::statement`] builds compiled statements.
    #[must_use]
    pub fn compile(mut self, compile: bool) -> Self {
        self.compile = compile;
        self
    }

    #[must_use]
    pub fn warnings(mut self, policy: WarningPolicy) -> Self {
        self.warnings = policy;
        self
    }

    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    pub fn compiles(&self) -> bool {
        self.compile
    }

    pub fn warning_policy(&self) -> WarningPolicy {
        self.warnings
    }
}

/// Numeric warnings aggregated per kind.
#[derive(Clone, Debug, Default)]
pub struct WarningLog {
    entries: Vec<(NumericWarning, usize)>,
}

impl WarningLog {
    /// Record a warning; the first occurrence of each kind is logged.
    pub fn record(&mut self, warning: NumericWarning) {
        if let Some(entry) = self.entries.iter_mut().find(|(w, _)| *w == warning) {
            entry.1 += 1;
            return;
        }
        tracing::warn!(%warning, "numeric warning");
        self.entries.push((warning, 1));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct warnings and how often each occurred.
    pub fn entries(&self) -> &[(NumericWarning, usize)] {
        &self.entries
    }

    pub fn take(&mut self) -> Vec<(NumericWarning, usize)> {
        std::mem::take(&mut self.entries)
    }
}

/// Everything a statement executes against. Exclusively borrowed for the
/// duration of one statement.
#[derive(Debug)]
pub struct Workspace {
    pub dataset: Dataset,
    pub vars: UserVars,
    pub(crate) builtins: SharedBuiltins,
    pub(crate) functions: SharedFunctions,
    pub(crate) warnings: WarningLog,
    pub(crate) depth: usize,
    pub(crate) config: EvalConfig,
}

impl Workspace {
    /// Workspace with the standard builtin library and no user functions.
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            vars: UserVars::new(),
            builtins: SharedBuiltins::default(),
            functions: SharedFunctions::default(),
            warnings: WarningLog::default(),
            depth: 0,
            config: EvalConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_builtins(mut self, builtins: SharedBuiltins) -> Self {
        self.builtins = builtins;
        self
    }

    #[must_use]
    pub fn with_functions(mut self, functions: SharedFunctions) -> Self {
        self.functions = functions;
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn functions(&self) -> &SharedFunctions {
        &self.functions
    }

    pub fn builtins(&self) -> &SharedBuiltins {
        &self.builtins
    }

    /// Whether a user function is executing.
    pub fn in_function(&self) -> bool {
        self.depth > 0
    }

    pub fn warnings(&self) -> &WarningLog {
        &self.warnings
    }

    /// Drain the warnings recorded so far.
    pub fn take_warnings(&mut self) -> Vec<(NumericWarning, usize)> {
        self.warnings.take()
    }

    /// Turn recorded warnings into an error under [`WarningPolicy::Error`].
    pub(crate) fn check_warnings(&mut self) -> Result<(), EvalError> {
        if self.config.warnings == WarningPolicy::Error {
            if let Some((warning, _)) = self.warnings.entries.first() {
                let err = EvalError::new(warning.to_string());
                self.warnings.entries.clear();
                return Err(err);
            }
        }
        Ok(())
    }
}
