//! User-defined functions.
//!
//! A function body is a list of compiled statements whose caches stay warm
//! between calls. A call checks the body out of the [`FunctionTable`] and
//! checks it back in when it returns; a recursive call finds the body
//! already checked out and runs on a fresh, uncompiled copy instead.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::context::TargetType;
use crate::genr::Genr;

/// A declared parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: TargetType,
    /// Passed as `&x`: the caller's variable is moved in and moved back out.
    pub by_ref: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TargetType) -> Self {
        Self {
            name: name.into(),
            ty,
            by_ref: false,
        }
    }

    pub fn by_ref(name: impl Into<String>, ty: TargetType) -> Self {
        Self {
            name: name.into(),
            ty,
            by_ref: true,
        }
    }
}

/// A function: parameters, body statements and an optional typed return
/// expression evaluated in the function's scope.
#[derive(Clone)]
pub struct UserFunction {
    name: String,
    params: Vec<Param>,
    body: Vec<Genr>,
    ret: Option<(TargetType, Genr)>,
}

impl UserFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: Vec::new(),
            ret: None,
        }
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn statement(mut self, genr: Genr) -> Self {
        self.body.push(genr);
        self
    }

    /// Return `expr`, converted to `ty`.
    #[must_use]
    pub fn returns(mut self, ty: TargetType, expr: Genr) -> Self {
        self.ret = Some((ty, expr));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn return_type(&self) -> Option<TargetType> {
        self.ret.as_ref().map(|(ty, _)| *ty)
    }

    pub(crate) fn body_mut(&mut self) -> &mut [Genr] {
        &mut self.body
    }

    pub(crate) fn ret_mut(&mut self) -> Option<(TargetType, &mut Genr)> {
        self.ret.as_mut().map(|(ty, g)| (*ty, g))
    }

    /// Whether the statements are compiled (the warm copy).
    pub(crate) fn is_compiled(&self) -> bool {
        self.body
            .iter()
            .chain(self.ret.iter().map(|(_, g)| g))
            .all(Genr::is_compiled)
    }

    /// Same function with every statement compiled or not, caches empty.
    fn copy_with(&self, compiled: bool) -> Self {
        Self {
            name: self.name.clone(),
            params: self.params.clone(),
            body: self
                .body
                .iter()
                .map(|g| g.fresh_copy().compiled(compiled))
                .collect(),
            ret: self
                .ret
                .as_ref()
                .map(|(ty, g)| (*ty, g.fresh_copy().compiled(compiled))),
        }
    }
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("statements", &self.body.len())
            .field("returns", &self.return_type())
            .finish()
    }
}

struct Entry {
    /// Uncompiled template for recursive calls.
    proto: UserFunction,
    /// Compiled copy; `None` while a call has it checked out.
    warm: Option<UserFunction>,
}

/// Named user functions.
#[derive(Default)]
pub struct FunctionTable {
    map: FxHashMap<String, Entry>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace a function.
    pub fn define(&mut self, func: UserFunction) {
        tracing::debug!(name = %func.name, params = func.params.len(), "function defined");
        let entry = Entry {
            warm: Some(func.copy_with(true)),
            proto: func.copy_with(false),
        };
        self.map.insert(entry.proto.name.clone(), entry);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.map.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Take a function for a call: the warm copy if it is free, otherwise a
    /// fresh uncompiled copy.
    pub(crate) fn checkout(&mut self, name: &str) -> Option<UserFunction> {
        let entry = self.map.get_mut(name)?;
        Some(match entry.warm.take() {
            Some(warm) => warm,
            None => {
                tracing::trace!(name, "recursive call on a fresh copy");
                entry.proto.copy_with(false)
            }
        })
    }

    /// Return a function taken with [`checkout`](Self::checkout). Fresh
    /// copies are dropped.
    pub(crate) fn checkin(&mut self, func: UserFunction) {
        if !func.is_compiled() {
            return;
        }
        if let Some(entry) = self.map.get_mut(&func.name) {
            if entry.warm.is_none() {
                entry.warm = Some(func);
            }
        }
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionTable")
            .field("functions", &names)
            .finish()
    }
}
