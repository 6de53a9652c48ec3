//! `TreeBuilder`: the construction API used by the parser.
//!
//! Every method allocates one node and returns its id, so trees are built
//! bottom-up in the order a recursive-descent parser produces them.

use crate::ops::{BinaryOp, Dummy, UnaryOp};
use crate::tree::{ExprArena, ExprKind, NodeId};

/// Incremental builder for an [`ExprArena`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    arena: ExprArena,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish building and hand over the arena.
    pub fn finish(self) -> ExprArena {
        self.arena
    }

    /// Access the arena built so far.
    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    pub fn num(&mut self, x: f64) -> NodeId {
        self.arena.push(ExprKind::Num(x))
    }

    pub fn str(&mut self, s: &str) -> NodeId {
        let id = self.arena.intern(s);
        self.arena.push(ExprKind::Str(id))
    }

    pub fn null(&mut self) -> NodeId {
        self.arena.push(ExprKind::Null)
    }

    pub fn ident(&mut self, name: &str) -> NodeId {
        let id = self.arena.intern(name);
        self.arena.push(ExprKind::Ident(id))
    }

    pub fn dummy(&mut self, d: Dummy) -> NodeId {
        self.arena.push(ExprKind::Dummy(d))
    }

    /// Empty subscript slot.
    pub fn all(&mut self) -> NodeId {
        self.arena.push(ExprKind::All)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.arena.push(ExprKind::Unary(op, operand))
    }

    pub fn neg(&mut self, operand: NodeId) -> NodeId {
        self.unary(UnaryOp::Neg, operand)
    }

    pub fn not(&mut self, operand: NodeId) -> NodeId {
        self.unary(UnaryOp::Not, operand)
    }

    pub fn transpose(&mut self, operand: NodeId) -> NodeId {
        self.unary(UnaryOp::Transpose, operand)
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.arena.push(ExprKind::Binary(op, left, right))
    }

    pub fn add(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::Add, left, right)
    }

    pub fn sub(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::Sub, left, right)
    }

    pub fn mul(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::Mul, left, right)
    }

    pub fn div(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::Div, left, right)
    }

    pub fn and(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::And, left, right)
    }

    pub fn or(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.binary(BinaryOp::Or, left, right)
    }

    pub fn ternary(&mut self, cond: NodeId, then_branch: NodeId, else_branch: NodeId) -> NodeId {
        self.arena.push(ExprKind::Ternary {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn call(&mut self, func: &str, args: &[NodeId]) -> NodeId {
        let func = self.arena.intern(func);
        let args = self.arena.push_list(args);
        self.arena.push(ExprKind::Call { func, args })
    }

    /// Matrix literal from rows of element nodes: `{a, b; c, d}`.
    pub fn matrix(&mut self, rows: &[&[NodeId]]) -> NodeId {
        let row_ids: Vec<NodeId> = rows
            .iter()
            .map(|row| {
                let elems = self.arena.push_list(row);
                self.arena.push(ExprKind::MatrixRow(elems))
            })
            .collect();
        let rows = self.arena.push_list(&row_ids);
        self.arena.push(ExprKind::MatrixLit(rows))
    }

    /// Matrix literal of numbers, for the common all-constant case.
    pub fn matrix_of(&mut self, rows: &[&[f64]]) -> NodeId {
        let nodes: Vec<Vec<NodeId>> = rows
            .iter()
            .map(|row| row.iter().map(|&x| self.num(x)).collect())
            .collect();
        let refs: Vec<&[NodeId]> = nodes.iter().map(Vec::as_slice).collect();
        self.matrix(&refs)
    }

    pub fn list(&mut self, elems: &[NodeId]) -> NodeId {
        let elems = self.arena.push_list(elems);
        self.arena.push(ExprKind::ListLit(elems))
    }

    /// Bundle literal: `_(key=value, ...)`.
    pub fn bundle(&mut self, pairs: &[(&str, NodeId)]) -> NodeId {
        let mut ids = Vec::with_capacity(pairs.len() * 2);
        for &(key, value) in pairs {
            ids.push(self.str(key));
            ids.push(value);
        }
        let pairs = self.arena.push_list(&ids);
        self.arena.push(ExprKind::BundleLit(pairs))
    }

    pub fn array(&mut self, elems: &[NodeId]) -> NodeId {
        let elems = self.arena.push_list(elems);
        self.arena.push(ExprKind::ArrayLit(elems))
    }

    pub fn index(&mut self, base: NodeId, args: &[NodeId]) -> NodeId {
        let args = self.arena.push_list(args);
        self.arena.push(ExprKind::Index { base, args })
    }

    pub fn member(&mut self, base: NodeId, key: &str) -> NodeId {
        let key = self.arena.intern(key);
        self.arena.push(ExprKind::Member { base, key })
    }

    pub fn range(&mut self, lo: NodeId, hi: NodeId) -> NodeId {
        self.arena.push(ExprKind::Range(lo, hi))
    }

    /// `lo:hi` with numeric bounds.
    pub fn range_of(&mut self, lo: f64, hi: f64) -> NodeId {
        let lo = self.num(lo);
        let hi = self.num(hi);
        self.range(lo, hi)
    }

    pub fn lag(&mut self, base: NodeId, lag: NodeId) -> NodeId {
        self.arena.push(ExprKind::Lag { base, lag })
    }

    pub fn reference(&mut self, target: NodeId) -> NodeId {
        self.arena.push(ExprKind::Ref(target))
    }
}

impl From<TreeBuilder> for ExprArena {
    fn from(builder: TreeBuilder) -> Self {
        builder.finish()
    }
}
