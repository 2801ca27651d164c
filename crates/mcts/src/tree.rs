//! Arena-allocated search tree.
//!
//! Nodes live in a single Vec and point at each other by index, so a
//! simulation can walk from a leaf back to the root without shared
//! ownership.

use crate::node::{Node, NodeId};
use lilichest_core::{Position, Value};

/// Arena-allocated search tree, rebuilt for every search.
#[derive(Debug)]
pub struct Tree<P: Position> {
    nodes: Vec<Node<P>>,
}

impl<P: Position> Tree<P> {
    /// Create a tree holding only an unexpanded root.
    pub fn new(root: P) -> Self {
        Self {
            nodes: vec![Node::root(root)],
        }
    }

    /// Get a reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get(&self, id: NodeId) -> &Node<P> {
        &self.nodes[id.0]
    }

    /// Get a mutable reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<P> {
        &mut self.nodes[id.0]
    }

    /// Add `child` under `parent`, returning its ID.
    pub fn add_child(&mut self, parent: NodeId, child: Node<P>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(child);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Get the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the root node.
    pub fn root(&self) -> &Node<P> {
        self.get(NodeId::ROOT)
    }

    /// Structural hashes of the positions from `id` up to the root,
    /// `id` included.
    pub fn path_hashes(&self, id: NodeId) -> Vec<u64> {
        let mut hashes = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id);
            hashes.push(node.position.structural_hash());
            current = node.parent;
        }
        hashes
    }

    /// Add one visit and `leaf_value` to every node from `leaf` to the root.
    ///
    /// The value starts in the leaf's side-to-move perspective and is negated
    /// whenever the side to move changes between a node and its parent.
    pub fn backpropagate(&mut self, leaf: NodeId, leaf_value: Value) {
        let mut value = leaf_value;
        let mut previous_side = self.get(leaf).position.side_to_move();
        let mut current = Some(leaf);

        while let Some(id) = current {
            let node = self.get_mut(id);
            let side = node.position.side_to_move();
            if side != previous_side {
                value = value.negate();
            }
            previous_side = side;

            node.stats.visit_count += 1;
            node.stats.value_sum += value.get();
            current = node.parent;
        }
    }
}
