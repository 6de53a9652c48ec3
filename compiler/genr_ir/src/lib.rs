//! Genr IR - the syntax tree contract of the genr expression evaluator.
//!
//! The parser is an external collaborator: it turns script text into an
//! [`ExprArena`] through [`TreeBuilder`]. The evaluator never parses text; it
//! only walks the nodes defined here.
//!
//! # Contents
//!
//! - [`BinaryOp`], [`UnaryOp`], [`AssignOp`], [`Dummy`]: operator symbol sets
//! - [`ExprArena`], [`ExprKind`], [`NodeId`], [`NodeRange`], [`StrId`]: the tree
//! - [`TreeBuilder`]: bottom-up construction

mod builder;
mod ops;
mod tree;

pub use builder::TreeBuilder;
pub use ops::{AssignOp, BinaryOp, Dummy, UnaryOp};
pub use tree::{ExprArena, ExprKind, NodeId, NodeRange, StrId};
