//! Expression arena: the syntax tree handed to the evaluator.
//!
//! [`ExprArena`] uses struct-of-arrays layout: node kinds are indexed by
//! [`NodeId`], n-ary children live in a flat `Vec<NodeId>` addressed by
//! [`NodeRange`], and identifier/string payloads are interned as [`StrId`].
//!
//! The arena is immutable once built. Per-position runtime state (cached
//! results, variable bindings) is kept by the evaluator in tables parallel to
//! `kinds`, which is why `NodeId` is a dense index.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::ops::{BinaryOp, Dummy, UnaryOp};

/// Index of a node in an [`ExprArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for "no node".
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "NodeId::INVALID")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A contiguous range of child ids (call arguments, literal elements).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct NodeRange {
    pub start: u32,
    pub len: u16,
}

impl NodeRange {
    pub const EMPTY: Self = Self { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u16) -> Self {
        Self { start, len }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

/// Interned identifier or string literal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct StrId(u32);

impl StrId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node kinds. `Copy`, so the evaluator can copy a kind out of the arena and
/// release the borrow before recursing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExprKind {
    // Literals
    Num(f64),
    Str(StrId),
    Null,

    // References
    /// Variable reference: a series or a user variable, resolved by name.
    Ident(StrId),
    /// Matrix subscript selector keyword.
    Dummy(Dummy),
    /// Empty subscript slot, as in `M[,2]`.
    All,

    // Operators
    Unary(UnaryOp, NodeId),
    Binary(BinaryOp, NodeId, NodeId),
    Ternary {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    },

    // Calls and constructors
    Call {
        func: StrId,
        args: NodeRange,
    },
    /// `{row; row; ...}`: children are `MatrixRow` nodes.
    MatrixLit(NodeRange),
    MatrixRow(NodeRange),
    ListLit(NodeRange),
    /// Alternating key (`Str`) and value nodes.
    BundleLit(NodeRange),
    ArrayLit(NodeRange),

    // Access
    Index {
        base: NodeId,
        args: NodeRange,
    },
    Member {
        base: NodeId,
        key: StrId,
    },
    /// `lo:hi` inside a subscript.
    Range(NodeId, NodeId),
    /// `x(k)`: lag (negative k) or lead (positive k) of a series.
    Lag {
        base: NodeId,
        lag: NodeId,
    },
    /// `&x`: pointer argument to a user function.
    Ref(NodeId),
}

/// Arena holding one statement's syntax tree(s).
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    kinds: Vec<ExprKind>,
    lists: Vec<NodeId>,
    strings: Vec<Box<str>>,
    string_ids: FxHashMap<Box<str>, StrId>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its id.
    pub fn push(&mut self, kind: ExprKind) -> NodeId {
        let id = NodeId::new(to_u32(self.kinds.len()));
        self.kinds.push(kind);
        id
    }

    /// Get a node's kind.
    #[inline]
    pub fn kind(&self, id: NodeId) -> ExprKind {
        self.kinds[id.index()]
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Allocate a contiguous range of child ids.
    pub fn push_list(&mut self, ids: &[NodeId]) -> NodeRange {
        if ids.is_empty() {
            return NodeRange::EMPTY;
        }
        let start = to_u32(self.lists.len());
        self.lists.extend_from_slice(ids);
        let len = u16::try_from(ids.len()).unwrap_or(u16::MAX);
        NodeRange::new(start, len)
    }

    /// Get the child ids of a range.
    pub fn list(&self, range: NodeRange) -> &[NodeId] {
        if range.is_empty() {
            return &[];
        }
        let start = range.start as usize;
        &self.lists[start..start + range.len()]
    }

    /// Intern an identifier or string literal.
    pub fn intern(&mut self, s: &str) -> StrId {
        if let Some(&id) = self.string_ids.get(s) {
            return id;
        }
        let id = StrId(to_u32(self.strings.len()));
        self.strings.push(s.into());
        self.string_ids.insert(s.into(), id);
        id
    }

    /// Look up an interned string.
    #[inline]
    pub fn str(&self, id: StrId) -> &str {
        &self.strings[id.index()]
    }

    /// Render the subtree rooted at `id` in surface syntax (for logs and errors).
    pub fn display(&self, id: NodeId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_node(&mut out, id);
        out
    }

    fn write_list(&self, out: &mut String, range: NodeRange, sep: &str) -> fmt::Result {
        for (i, &child) in self.list(range).iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write_node(out, child)?;
        }
        Ok(())
    }

    fn write_node(&self, out: &mut String, id: NodeId) -> fmt::Result {
        use fmt::Write;

        if !id.is_valid() {
            out.push('?');
            return Ok(());
        }
        match self.kind(id) {
            ExprKind::Num(x) => write!(out, "{x}"),
            ExprKind::Str(s) => write!(out, "\"{}\"", self.str(s)),
            ExprKind::Null => write!(out, "null"),
            ExprKind::Ident(s) => write!(out, "{}", self.str(s)),
            ExprKind::Dummy(d) => write!(out, "{}", d.as_str()),
            ExprKind::All => Ok(()),
            ExprKind::Unary(UnaryOp::Transpose, x) => {
                self.write_node(out, x)?;
                write!(out, "'")
            }
            ExprKind::Unary(op, x) => {
                write!(out, "{}", op.as_symbol())?;
                self.write_node(out, x)
            }
            ExprKind::Binary(op, l, r) => {
                write!(out, "(")?;
                self.write_node(out, l)?;
                write!(out, " {} ", op.as_symbol())?;
                self.write_node(out, r)?;
                write!(out, ")")
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                write!(out, "(")?;
                self.write_node(out, cond)?;
                write!(out, " ? ")?;
                self.write_node(out, then_branch)?;
                write!(out, " : ")?;
                self.write_node(out, else_branch)?;
                write!(out, ")")
            }
            ExprKind::Call { func, args } => {
                write!(out, "{}(", self.str(func))?;
                self.write_list(out, args, ", ")?;
                write!(out, ")")
            }
            ExprKind::MatrixLit(rows) => {
                write!(out, "{{")?;
                self.write_list(out, rows, "; ")?;
                write!(out, "}}")
            }
            ExprKind::MatrixRow(elems) | ExprKind::ListLit(elems) => {
                self.write_list(out, elems, ", ")
            }
            ExprKind::BundleLit(pairs) => {
                write!(out, "_(")?;
                for (i, pair) in self.list(pairs).chunks(2).enumerate() {
                    if i > 0 {
                        write!(out, ", ")?;
                    }
                    if let [key, value] = pair {
                        if let ExprKind::Str(k) = self.kind(*key) {
                            write!(out, "{}=", self.str(k))?;
                        }
                        self.write_node(out, *value)?;
                    }
                }
                write!(out, ")")
            }
            ExprKind::ArrayLit(elems) => {
                write!(out, "defarray(")?;
                self.write_list(out, elems, ", ")?;
                write!(out, ")")
            }
            ExprKind::Index { base, args } => {
                self.write_node(out, base)?;
                write!(out, "[")?;
                self.write_list(out, args, ",")?;
                write!(out, "]")
            }
            ExprKind::Member { base, key } => {
                self.write_node(out, base)?;
                write!(out, ".{}", self.str(key))
            }
            ExprKind::Range(lo, hi) => {
                self.write_node(out, lo)?;
                write!(out, ":")?;
                self.write_node(out, hi)
            }
            ExprKind::Lag { base, lag } => {
                self.write_node(out, base)?;
                write!(out, "(")?;
                self.write_node(out, lag)?;
                write!(out, ")")
            }
            ExprKind::Ref(x) => {
                write!(out, "&")?;
                self.write_node(out, x)
            }
        }
    }
}

/// Convert a length to a `u32` index.
///
/// Saturates below the `INVALID` sentinel rather than panicking; trees with
/// four billion nodes are not a realistic input.
fn to_u32(n: usize) -> u32 {
    u32::try_from(n).map_or(u32::MAX - 1, |v| v.min(u32::MAX - 1))
}
