//! Auxiliary-node cache.
//!
//! Every tree position that produces a value owns a [`Slot`] pointing at a
//! [`Node`] in an index arena. On the first execution of a compiled statement
//! the nodes are allocated; on later executions the same nodes are handed
//! back so series and matrix buffers are reused instead of reallocated.
//!
//! Positions can share a node: a short-circuited `&&`/`||` or a
//! scalar-conditioned ternary links the chosen child's node through an
//! [`Slot::Ephemeral`] link instead of copying it. Ephemeral links are never
//! reused as write targets; the next write to such a position releases the
//! link and allocates a fresh node.

mod view;

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use genr_data::VarId;
use genr_ir::NodeId;
use genr_value::{SeriesId, Value, ValueKind};

pub(crate) use view::{follow_mut, Views};

/// Index of a node in the cache arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct AuxId(u32);

impl AuxId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for AuxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuxId({})", self.0)
    }
}

bitflags! {
    /// Node roles.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Cached intermediate result of an operator or call.
        const AUX = 1 << 0;
        /// Leaf of the tree itself: a literal or a variable reference.
        const PRIMARY = 1 << 1;
        /// Live alias of a bundle member or array element.
        const MUTABLE_MEMBER = 1 << 2;
    }
}

/// One step from a container to a contained value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Accessor {
    /// Bundle member.
    Key(String),
    /// Array element, 0-based.
    Elem(usize),
}

/// Storage a borrowed node aliases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handle {
    Series(SeriesId),
    Var(VarId),
    /// A value inside a user variable, reached through `path`.
    Member {
        root: VarId,
        path: SmallVec<[Accessor; 2]>,
    },
}

#[derive(Clone, Debug)]
pub enum Payload {
    Owned(Value),
    /// Aliases storage elsewhere; never written through, never freed here.
    Borrowed(Handle),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub payload: Payload,
    pub flags: NodeFlags,
    refs: u32,
    last_kind: ValueKind,
    /// Kind of the aliased value when a borrowed node was bound.
    bound_kind: ValueKind,
}

impl Node {
    fn new(payload: Payload, flags: NodeFlags) -> Self {
        Self {
            payload,
            flags,
            refs: 1,
            last_kind: ValueKind::Undefined,
            bound_kind: ValueKind::Undefined,
        }
    }

    /// Number of tree positions linked to this node.
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// Kind the aliased storage had when it was bound; `Undefined` for owned
    /// nodes.
    pub fn bound_kind(&self) -> ValueKind {
        self.bound_kind
    }
}

/// Link from a tree position to its node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Slot {
    #[default]
    Vacant,
    /// The position's own node.
    Held(AuxId),
    /// Another position's node, shared through a short-circuit or selection.
    Ephemeral(AuxId),
}

/// Identity snapshot the cache was built against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Stamp {
    pub nobs: usize,
    pub dataset_epoch: u64,
    pub vars_epoch: u64,
}

/// Allocation statistics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Nodes created.
    pub allocated: usize,
    /// Writes into an existing node of the same kind.
    pub reused: usize,
    /// Writes that changed an existing node's kind.
    pub retagged: usize,
    /// Nodes released because their last link went away.
    pub discarded: usize,
}

/// Per-statement node cache.
#[derive(Clone, Debug)]
pub struct AuxCache {
    nodes: Vec<Option<Node>>,
    free: Vec<AuxId>,
    slots: Vec<Slot>,
    starting: bool,
    stamp: Option<Stamp>,
    stats: CacheStats,
}

impl Default for AuxCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AuxCache {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            slots: Vec::new(),
            starting: true,
            stamp: None,
            stats: CacheStats::default(),
        }
    }

    /// Whether the next execution is the first since the cache was built.
    pub fn is_starting(&self) -> bool {
        self.starting
    }

    pub(crate) fn finish_pass(&mut self) {
        self.starting = false;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of live nodes.
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Clear the cache if `stamp` differs from the one it was built against.
    pub(crate) fn validate(&mut self, stamp: Stamp) {
        match self.stamp {
            Some(old) if old == stamp => {}
            Some(old) => {
                tracing::debug!(?old, new = ?stamp, "dataset identity changed; clearing aux cache");
                self.clear();
                self.stamp = Some(stamp);
            }
            None => self.stamp = Some(stamp),
        }
    }

    /// Drop every node and link. Statistics are kept.
    pub fn clear(&mut self) {
        let live = self.live_nodes();
        if live > 0 {
            tracing::trace!(live, "aux cache cleared");
        }
        self.stats.discarded += live;
        self.nodes.clear();
        self.free.clear();
        self.slots.clear();
        self.starting = true;
        self.stamp = None;
    }

    pub fn slot(&self, pos: NodeId) -> Slot {
        self.slots.get(pos.index()).copied().unwrap_or_default()
    }

    fn set_slot(&mut self, pos: NodeId, slot: Slot) {
        let i = pos.index();
        if i >= self.slots.len() {
            self.slots.resize(i + 1, Slot::Vacant);
        }
        self.slots[i] = slot;
    }

    pub fn node(&self, id: AuxId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: AuxId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn alloc(&mut self, payload: Payload, flags: NodeFlags) -> AuxId {
        self.stats.allocated += 1;
        let node = Node::new(payload, flags);
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = Some(node);
            return id;
        }
        let id = AuxId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Some(node));
        id
    }

    /// Drop one link to `id`, freeing the node when it was the last.
    fn release(&mut self, id: AuxId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.refs = node.refs.saturating_sub(1);
        if node.refs == 0 {
            self.nodes[id.index()] = None;
            self.free.push(id);
            self.stats.discarded += 1;
        }
    }

    /// Release whatever `pos` currently links to.
    fn unlink(&mut self, pos: NodeId) {
        match self.slot(pos) {
            Slot::Held(id) | Slot::Ephemeral(id) => self.release(id),
            Slot::Vacant => {}
        }
        self.set_slot(pos, Slot::Vacant);
    }

    /// Writable node for `pos`.
    ///
    /// Returns the position's own owned node when it has one. A borrowed node
    /// is converted to owned; an ephemeral link is released and replaced by
    /// a fresh node.
    pub fn get_aux(&mut self, pos: NodeId) -> AuxId {
        match self.slot(pos) {
            Slot::Held(id) => {
                if let Some(node) = self.node_mut(id) {
                    if let Payload::Borrowed(_) = node.payload {
                        node.payload = Payload::Owned(Value::Undefined);
                        node.flags = NodeFlags::AUX;
                        node.last_kind = ValueKind::Undefined;
                        node.bound_kind = ValueKind::Undefined;
                    }
                    return id;
                }
                let id = self.alloc(Payload::Owned(Value::Undefined), NodeFlags::AUX);
                self.set_slot(pos, Slot::Held(id));
                id
            }
            Slot::Ephemeral(old) => {
                self.release(old);
                let id = self.alloc(Payload::Owned(Value::Undefined), NodeFlags::AUX);
                self.set_slot(pos, Slot::Held(id));
                id
            }
            Slot::Vacant => {
                let id = self.alloc(Payload::Owned(Value::Undefined), NodeFlags::AUX);
                self.set_slot(pos, Slot::Held(id));
                id
            }
        }
    }

    /// Node holding a literal at `pos`; `init` runs only when the node is
    /// created.
    pub(crate) fn primary(&mut self, pos: NodeId, init: impl FnOnce() -> Value) -> AuxId {
        if let Slot::Held(id) = self.slot(pos) {
            if let Some(node) = self.node(id) {
                if matches!(node.payload, Payload::Owned(_)) && node.flags.contains(NodeFlags::PRIMARY)
                {
                    return id;
                }
            }
        }
        self.unlink(pos);
        let id = self.alloc(Payload::Owned(init()), NodeFlags::PRIMARY);
        self.set_slot(pos, Slot::Held(id));
        id
    }

    /// Point `pos` at borrowed storage of kind `kind`, reusing its node when
    /// it has one. Reads fail if the storage changes kind before the next
    /// bind.
    pub(crate) fn bind(
        &mut self,
        pos: NodeId,
        handle: Handle,
        kind: ValueKind,
        flags: NodeFlags,
    ) -> AuxId {
        if let Slot::Held(id) = self.slot(pos) {
            if let Some(node) = self.node_mut(id) {
                node.payload = Payload::Borrowed(handle);
                node.flags = flags;
                node.last_kind = ValueKind::Undefined;
                node.bound_kind = kind;
                return id;
            }
        }
        self.unlink(pos);
        let id = self.alloc(Payload::Borrowed(handle), flags);
        if let Some(node) = self.node_mut(id) {
            node.bound_kind = kind;
        }
        self.set_slot(pos, Slot::Held(id));
        id
    }

    /// Make `pos` share `target`'s node.
    pub(crate) fn link_ephemeral(&mut self, pos: NodeId, target: AuxId) -> AuxId {
        if self.slot(pos) == Slot::Ephemeral(target) {
            return target;
        }
        if let Some(node) = self.node_mut(target) {
            node.refs += 1;
        }
        self.unlink(pos);
        self.set_slot(pos, Slot::Ephemeral(target));
        target
    }

    /// Move the value out of an owned node so an operator can write it while
    /// reading other nodes. Must be paired with [`restore`](Self::restore).
    pub(crate) fn lend(&mut self, id: AuxId) -> Value {
        match self.node_mut(id).map(|n| &mut n.payload) {
            Some(Payload::Owned(v)) => std::mem::take(v),
            _ => Value::Undefined,
        }
    }

    pub(crate) fn restore(&mut self, id: AuxId, value: Value) {
        let kind = value.kind();
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let previous = node.last_kind;
        node.last_kind = kind;
        node.payload = Payload::Owned(value);
        if previous == ValueKind::Undefined {
            return;
        }
        if previous == kind {
            self.stats.reused += 1;
        } else {
            tracing::debug!(from = %previous, to = %kind, "aux node retagged");
            self.stats.retagged += 1;
        }
    }

    /// Take the value of an owned node, leaving `Undefined` behind.
    /// Used to donate a one-shot statement's result to its target.
    pub(crate) fn take_owned(&mut self, id: AuxId) -> Option<Value> {
        let node = self.node_mut(id)?;
        if node.refs > 1 {
            return None;
        }
        match &mut node.payload {
            Payload::Owned(v) => {
                node.last_kind = ValueKind::Undefined;
                Some(std::mem::take(v))
            }
            Payload::Borrowed(_) => None,
        }
    }
}
