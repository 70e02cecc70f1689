//! Node definitions for the lookup tree
//!
//! The tree is stored as a flat arena of `DecisionNode`s addressed by
//! `NodeId`. Node 0 is always the root; it carries no guess of its own since
//! the root guess is the externally known starting word. Every other node is
//! reached through exactly one `Entry` of its parent, and a parent is always
//! created before its children, so child ids are strictly greater than their
//! parent's id.

use crate::feedback::Feedback;
use crate::word::Word;

/// Node ID type (index into the arena)
pub type NodeId = u32;

/// Id of the root node
pub const ROOT: NodeId = 0;

/// One branch out of a node: after observing `feedback`, play `guess` and
/// continue at `child`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub feedback: Feedback,
    pub guess: Word,
    pub child: NodeId,
}

/// Outcome of `LookupTree::branch`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// The node already branched on this feedback
    Existing(Entry),
    /// A new child was created with this id
    Created(NodeId),
}

impl Branch {
    /// Id of the node the branch leads to
    pub fn child(self) -> NodeId {
        match self {
            Branch::Existing(entry) => entry.child,
            Branch::Created(id) => id,
        }
    }
}

/// A branch point in the tree.
///
/// Entries are kept sorted ascending by feedback with no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionNode {
    entries: Vec<Entry>,
}

impl DecisionNode {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entry for `feedback`, if this node already branches on it
    pub fn find(&self, feedback: Feedback) -> Option<&Entry> {
        self.entries
            .binary_search_by_key(&feedback, |e| e.feedback)
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn is_leaf(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Arena-backed lookup tree.
#[derive(Debug, Clone)]
pub struct LookupTree {
    nodes: Vec<DecisionNode>,
}

impl LookupTree {
    /// Create a tree holding only an empty root
    pub fn new() -> Self {
        LookupTree {
            nodes: vec![DecisionNode::default()],
        }
    }

    pub fn root(&self) -> &DecisionNode {
        &self.nodes[ROOT as usize]
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&DecisionNode> {
        self.nodes.get(id as usize)
    }

    /// All nodes, indexed by `NodeId`
    pub fn nodes(&self) -> &[DecisionNode] {
        &self.nodes
    }

    /// Branch on `feedback` under `parent`.
    ///
    /// If `parent` already branches on `feedback` the existing entry is
    /// returned untouched (its guess wins); otherwise a new entry pointing at
    /// a fresh empty child is inserted in feedback order.
    ///
    /// Panics if `parent` is not a node of this tree.
    pub fn branch(&mut self, parent: NodeId, feedback: Feedback, guess: Word) -> Branch {
        let child = self.nodes.len() as NodeId;
        let node = &mut self.nodes[parent as usize];
        match node.entries.binary_search_by_key(&feedback, |e| e.feedback) {
            Ok(i) => Branch::Existing(node.entries[i]),
            Err(at) => {
                node.entries.insert(at, Entry { feedback, guess, child });
                self.nodes.push(DecisionNode::default());
                Branch::Created(child)
            }
        }
    }

    /// Node ids in depth-first pre-order, children visited in feedback order.
    ///
    /// This is the order nodes are laid out in a serialized table.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id as usize].entries.iter().rev().map(|e| e.child));
        }
        order
    }

    /// Get the number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is only an empty root
    pub fn is_empty(&self) -> bool {
        self.root().is_leaf()
    }

    /// Total number of entries across all nodes
    pub fn entry_count(&self) -> usize {
        self.nodes.iter().map(|n| n.entries.len()).sum()
    }

    fn same_subtree(&self, a: NodeId, other: &LookupTree, b: NodeId) -> bool {
        let (left, right) = (&self.nodes[a as usize], &other.nodes[b as usize]);
        left.entries.len() == right.entries.len()
            && left.entries.iter().zip(&right.entries).all(|(x, y)| {
                x.feedback == y.feedback
                    && x.guess == y.guess
                    && self.same_subtree(x.child, other, y.child)
            })
    }
}

/// Structural equality: same entries and guesses at every path from the root,
/// regardless of how the arena happens to be numbered.
impl PartialEq for LookupTree {
    fn eq(&self, other: &Self) -> bool {
        self.same_subtree(ROOT, other, ROOT)
    }
}

impl Eq for LookupTree {}

impl Default for LookupTree {
    fn default() -> Self {
        Self::new()
    }
}
