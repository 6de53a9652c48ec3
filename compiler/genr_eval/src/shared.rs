//! Registries that several workspaces can hold at once.
//!
//! The builtin table never changes after it is built, so workspaces share it
//! through an `Arc`. User functions are defined and checked out for calls
//! while shared, so that table sits behind a `parking_lot::RwLock`; each
//! lock is held for one table operation only, never across a call.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::builtins::BuiltinTable;
use crate::function::{FunctionTable, UserFunction};

/// Shared, read-only builtin table.
#[derive(Clone)]
pub struct SharedBuiltins(Arc<BuiltinTable>);

impl SharedBuiltins {
    pub fn new(table: BuiltinTable) -> Self {
        SharedBuiltins(Arc::new(table))
    }
}

impl Default for SharedBuiltins {
    /// The standard library.
    fn default() -> Self {
        SharedBuiltins::new(BuiltinTable::with_stdlib())
    }
}

impl Deref for SharedBuiltins {
    type Target = BuiltinTable;

    fn deref(&self) -> &BuiltinTable {
        &self.0
    }
}

impl fmt::Debug for SharedBuiltins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedBuiltins({} builtins)", self.0.len())
    }
}

/// Shared user-function table.
#[derive(Clone, Default)]
pub struct SharedFunctions(Arc<RwLock<FunctionTable>>);

impl SharedFunctions {
    pub fn new(table: FunctionTable) -> Self {
        SharedFunctions(Arc::new(RwLock::new(table)))
    }

    /// Define or replace a function; visible to every holder.
    pub fn define(&self, func: UserFunction) {
        self.0.write().define(func);
    }

    pub fn remove(&self, name: &str) -> bool {
        self.0.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.read().contains(name)
    }

    pub fn read(&self) -> RwLockReadGuard<'_, FunctionTable> {
        self.0.read()
    }

    /// Take `name` out for one call. Pair with [`checkin`](Self::checkin).
    pub(crate) fn checkout(&self, name: &str) -> Option<UserFunction> {
        self.0.write().checkout(name)
    }

    pub(crate) fn checkin(&self, func: UserFunction) {
        self.0.write().checkin(func);
    }

    /// Whether `other` is a handle to the same table.
    pub fn same_table(&self, other: &SharedFunctions) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(table) => write!(f, "SharedFunctions({} functions)", table.len()),
            None => f.write_str("SharedFunctions(<locked>)"),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::context::TargetType;
    use crate::tests::expr;

    fn zero(name: &str) -> UserFunction {
        UserFunction::new(name).returns(TargetType::Scalar, expr(|b| b.num(0.0)))
    }

    #[test]
    fn definitions_are_visible_through_every_handle() {
        let a = SharedFunctions::default();
        let b = a.clone();
        assert!(a.same_table(&b));
        assert!(!a.same_table(&SharedFunctions::default()));

        a.define(zero("f"));
        assert!(b.contains("f"));
        assert_eq!(b.read().len(), 1);
        assert!(b.remove("f"));
        assert!(!a.contains("f"));
    }

    #[test]
    fn checked_out_function_leaves_a_fresh_copy_for_recursion() {
        let table = SharedFunctions::default();
        table.define(zero("f"));
        let warm = table.checkout("f").unwrap();
        let fresh = table.checkout("f").unwrap();
        assert_eq!(fresh.name(), "f");
        table.checkin(fresh);
        table.checkin(warm);
        assert!(table.checkout("nope").is_none());
        assert!(format!("{table:?}").contains("1 functions"));
    }

    #[test]
    fn default_builtins_are_the_standard_library() {
        let builtins = SharedBuiltins::default();
        assert!(builtins.contains("sqrt"));
        assert!(format!("{builtins:?}").starts_with("SharedBuiltins("));
    }
}
