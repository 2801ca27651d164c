//! Search tree node types.
//!
//! Uses arena allocation with indices: a node refers to its children and its
//! parent by [`NodeId`], never by reference.

use lilichest_core::{Position, Value};

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Statistics for a single node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStats {
    /// Number of simulations that passed through this node (N).
    pub visit_count: u32,

    /// Sum of backed-up values (W), from the perspective of the side to move
    /// at this node.
    pub value_sum: f32,

    /// Prior probability assigned by the parent at expansion (P).
    pub prior: f32,
}

impl NodeStats {
    /// Create new stats with the given prior probability.
    pub fn new(prior: f32) -> Self {
        Self {
            visit_count: 0,
            value_sum: 0.0,
            prior,
        }
    }

    /// Mean value `W / (N + epsilon)`; zero for an unvisited node.
    pub fn mean_value(&self, epsilon: f32) -> f32 {
        self.value_sum / (self.visit_count as f32 + epsilon)
    }
}

/// A node in the search tree.
///
/// Each node owns its own copy of the position it represents.
#[derive(Clone, Debug)]
pub struct Node<P: Position> {
    /// Position at this node.
    pub position: P,

    /// Move that led to this node (None for root).
    pub mv: Option<P::Move>,

    /// Parent node, used for traversal only (None for root).
    pub parent: Option<NodeId>,

    /// Children, one per legal move, fixed at expansion.
    pub children: Vec<NodeId>,

    /// Node statistics (visits, value, prior).
    pub stats: NodeStats,

    /// Whether this node has been expanded (children generated).
    pub expanded: bool,

    /// Cached leaf value if the position is terminal.
    pub terminal_value: Option<Value>,
}

impl<P: Position> Node<P> {
    /// Create the root node. Its prior is never read.
    pub fn root(position: P) -> Self {
        Self {
            position,
            mv: None,
            parent: None,
            children: Vec::new(),
            stats: NodeStats::new(1.0),
            expanded: false,
            terminal_value: None,
        }
    }

    /// Create an unexpanded child reached by `mv`.
    pub fn child(position: P, mv: P::Move, parent: NodeId, prior: f32) -> Self {
        Self {
            position,
            mv: Some(mv),
            parent: Some(parent),
            children: Vec::new(),
            stats: NodeStats::new(prior),
            expanded: false,
            terminal_value: None,
        }
    }

    /// Leaf value of a terminal position from its side to move, computed
    /// once and cached.
    pub fn terminal_value(&mut self) -> Option<Value> {
        if self.terminal_value.is_none() {
            self.terminal_value = self.position.outcome().map(|o| o.value());
        }
        self.terminal_value
    }
}
