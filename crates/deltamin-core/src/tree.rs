//! Arena-backed trees for hierarchical reduction.
//!
//! Nodes live in a shared arena and refer to each other by [`NodeId`]. A
//! [`Tree`] is the arena plus a set of pruned nodes; pruning returns a new
//! tree sharing the same arena, so earlier candidates stay valid.
//!
//! A pruned node is not deleted from its parent. Printers render it as its
//! placeholder (a minimal structurally valid stand-in such as an empty
//! block) or skip it when it has none, and never descend into it.

use std::fmt;
use std::sync::Arc;

use crate::error::PrintError;

/// Index of a node in a tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node of the arena.
#[derive(Debug, Clone)]
pub struct Node<T> {
    value: T,
    placeholder: Option<T>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
}

impl<T> Node<T> {
    /// The node's content.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// What the node prints as once pruned, if anything.
    pub fn placeholder(&self) -> Option<&T> {
        self.placeholder.as_ref()
    }

    /// The parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Distance from the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// How a node appears in a particular tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Present with its whole subtree.
    Live,
    /// Pruned; stands in as its placeholder.
    Pruned,
    /// Inside a pruned subtree.
    Detached,
}

/// Builds the arena of a [`Tree`].
#[derive(Debug)]
pub struct TreeBuilder<T> {
    nodes: Vec<Node<T>>,
}

impl<T> TreeBuilder<T> {
    /// Start a tree with the given root content.
    pub fn new(root: T) -> Self {
        Self {
            nodes: vec![Node {
                value: root,
                placeholder: None,
                parent: None,
                children: Vec::new(),
                depth: 0,
            }],
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a child without a placeholder.
    pub fn add_child(&mut self, parent: NodeId, value: T) -> NodeId {
        self.push(parent, value, None)
    }

    /// Append a child that prints as `placeholder` once pruned.
    pub fn add_child_with_placeholder(&mut self, parent: NodeId, value: T, placeholder: T) -> NodeId {
        self.push(parent, value, Some(placeholder))
    }

    fn push(&mut self, parent: NodeId, value: T, placeholder: Option<T>) -> NodeId {
        assert!(
            parent.0 < self.nodes.len(),
            "parent {parent} does not exist"
        );
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(Node {
            value,
            placeholder,
            parent: Some(parent),
            children: Vec::new(),
            depth,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Number of nodes added so far, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a builder holds at least the root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Finish the tree with nothing pruned.
    pub fn build(self) -> Tree<T> {
        let pruned = vec![false; self.nodes.len()];
        Tree {
            nodes: Arc::new(self.nodes),
            pruned: pruned.into(),
        }
    }
}

/// A rooted tree configuration.
pub struct Tree<T> {
    nodes: Arc<Vec<Node<T>>>,
    pruned: Arc<[bool]>,
}

impl<T> Clone for Tree<T> {
    fn clone(&self) -> Self {
        Self {
            nodes: Arc::clone(&self.nodes),
            pruned: Arc::clone(&self.pruned),
        }
    }
}

impl<T> Tree<T> {
    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not part of this tree's arena.
    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    /// Number of nodes in the arena, pruned ones included.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest node in the arena.
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// How `id` appears in this tree.
    pub fn state(&self, id: NodeId) -> NodeState {
        if self.pruned[id.0] {
            return NodeState::Pruned;
        }
        let mut cursor = self.nodes[id.0].parent;
        while let Some(parent) = cursor {
            if self.pruned[parent.0] {
                return NodeState::Detached;
            }
            cursor = self.nodes[parent.0].parent;
        }
        NodeState::Live
    }

    /// Returns true if `id` is present with its subtree.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.state(id) == NodeState::Live
    }

    /// Returns true if `id` itself was pruned.
    pub fn is_pruned(&self, id: NodeId) -> bool {
        self.pruned[id.0]
    }

    /// Number of live nodes; placeholders are not counted.
    pub fn live_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if self.pruned[id.0] {
                continue;
            }
            count += 1;
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        count
    }

    /// Live nodes at `depth`, left to right.
    pub fn level(&self, depth: usize) -> Vec<NodeId> {
        let mut frontier = if self.pruned[0] {
            Vec::new()
        } else {
            vec![self.root()]
        };
        for _ in 0..depth {
            frontier = frontier
                .iter()
                .flat_map(|id| self.nodes[id.0].children.iter().copied())
                .filter(|child| !self.pruned[child.0])
                .collect();
            if frontier.is_empty() {
                break;
            }
        }
        frontier
    }

    /// A new tree with `ids` pruned in addition to what is already pruned.
    pub fn with_pruned(&self, ids: &[NodeId]) -> Tree<T> {
        let mut pruned = self.pruned.to_vec();
        for id in ids {
            assert!(id.0 < pruned.len(), "node {id} does not exist");
            pruned[id.0] = true;
        }
        Tree {
            nodes: Arc::clone(&self.nodes),
            pruned: pruned.into(),
        }
    }

    /// Pre-order walk of what a printer should render: live leaves and the
    /// placeholders of pruned nodes.
    pub fn frontier(&self) -> Vec<&T> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if self.pruned[id.0] {
                out.extend(node.placeholder.as_ref());
            } else if node.children.is_empty() {
                out.push(&node.value);
            } else {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}

impl<T: fmt::Debug> fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.nodes.len())
            .field("live", &self.live_count())
            .finish()
    }
}

/// Serializes a (pruned) tree back to the raw form an oracle understands.
pub trait TreePrinter<T>: Send + Sync {
    /// The raw form.
    type Output: Send + Sync;

    /// Render `tree`, honouring pruned nodes and placeholders.
    fn print(&self, tree: &Tree<T>) -> Result<Self::Output, PrintError>;
}

/// Prints a tree as the sequence of its [`Tree::frontier`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenPrinter;

impl<T: Clone + Send + Sync> TreePrinter<T> for FlattenPrinter {
    type Output = Vec<T>;

    fn print(&self, tree: &Tree<T>) -> Result<Vec<T>, PrintError> {
        Ok(tree.frontier().into_iter().cloned().collect())
    }
}

/// Prints a tree of text fragments by concatenating its frontier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatPrinter;

impl<T: AsRef<str> + Send + Sync> TreePrinter<T> for ConcatPrinter {
    type Output = String;

    fn print(&self, tree: &Tree<T>) -> Result<String, PrintError> {
        Ok(tree
            .frontier()
            .into_iter()
            .map(|fragment| -> &str { fragment.as_ref() })
            .collect())
    }
}
