use std::ops::Range;
use std::sync::Arc;

/// Handle to a node slot in a [`Lattice`](super::Lattice) arena.
///
/// Handles are only meaningful for the lattice that issued them and are
/// invalidated by `clear` / `set_sentence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to an edge recorded by the forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    Normal,
    Unknown,
    Bos,
    Eos,
}

/// What a caller supplies to [`Lattice::add_node`](super::Lattice::add_node).
#[derive(Debug, Clone)]
pub struct NodeSpec {
    /// Start position (char index, inclusive)
    pub begin: usize,
    /// End position (char index, exclusive)
    pub end: usize,
    pub left_id: u16,
    pub right_id: u16,
    pub word_cost: i64,
    pub feature: Arc<str>,
    /// `true` for nodes synthesized by the unknown-word fallback.
    pub unknown: bool,
}

/// A candidate morpheme in the lattice.
///
/// The surface is not stored: it is the `[begin, end)` slice of the
/// lattice's sentence, see [`Lattice::surface`](super::Lattice::surface).
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) begin: usize,
    pub(crate) end: usize,
    pub(crate) left_id: u16,
    pub(crate) right_id: u16,
    pub(crate) word_cost: i64,
    pub(crate) feature: Arc<str>,
    pub(crate) status: NodeStatus,

    /// Next node in the same begin chain.
    pub(crate) bnext: Option<NodeId>,
    /// Next node in the same end chain.
    pub(crate) enext: Option<NodeId>,

    /// Minimum cost from BOS through this node, `None` if unreachable.
    pub(crate) forward: Option<i64>,
    /// Minimum cost from this node to EOS, excluding its own word cost.
    pub(crate) backward: Option<i64>,
    /// Best predecessor.
    pub(crate) prev: Option<NodeId>,
    /// Incoming edges, contiguous in the lattice's edge arena.
    pub(crate) edges: Range<u32>,
    pub(crate) is_best: bool,

    pub(crate) alpha: f64,
    pub(crate) beta: f64,
    pub(crate) prob: f64,
}

impl Node {
    pub(crate) fn new(spec: NodeSpec) -> Self {
        let status = if spec.unknown {
            NodeStatus::Unknown
        } else {
            NodeStatus::Normal
        };
        Self::with_status(spec, status)
    }

    pub(crate) fn sentinel(pos: usize, status: NodeStatus, feature: Arc<str>) -> Self {
        let spec = NodeSpec {
            begin: pos,
            end: pos,
            left_id: 0,
            right_id: 0,
            word_cost: 0,
            feature,
            unknown: false,
        };
        Self::with_status(spec, status)
    }

    fn with_status(spec: NodeSpec, status: NodeStatus) -> Self {
        Self {
            begin: spec.begin,
            end: spec.end,
            left_id: spec.left_id,
            right_id: spec.right_id,
            word_cost: spec.word_cost,
            feature: spec.feature,
            status,
            bnext: None,
            enext: None,
            forward: None,
            backward: None,
            prev: None,
            edges: 0..0,
            is_best: false,
            alpha: f64::NEG_INFINITY,
            beta: f64::NEG_INFINITY,
            prob: 0.0,
        }
    }

    pub(crate) fn reset_scores(&mut self) {
        self.forward = None;
        self.backward = None;
        self.prev = None;
        self.edges = 0..0;
        self.is_best = false;
        self.alpha = f64::NEG_INFINITY;
        self.beta = f64::NEG_INFINITY;
        self.prob = 0.0;
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn left_id(&self) -> u16 {
        self.left_id
    }

    pub fn right_id(&self) -> u16 {
        self.right_id
    }

    pub fn word_cost(&self) -> i64 {
        self.word_cost
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.status, NodeStatus::Bos | NodeStatus::Eos)
    }

    /// Cumulative best cost from BOS, including this node's word cost.
    pub fn forward_cost(&self) -> Option<i64> {
        self.forward
    }

    /// Best cost of the remainder of a path from this node to EOS.
    pub fn backward_cost(&self) -> Option<i64> {
        self.backward
    }

    /// Cost of the best complete path through this node.
    pub fn best_total_cost(&self) -> Option<i64> {
        Some(self.forward? + self.backward?)
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// Edges ending at this node, in discovery order.
    pub fn incoming(&self) -> impl Iterator<Item = EdgeId> {
        self.edges.clone().map(EdgeId)
    }

    /// Whether the node lies on the Viterbi best path.
    pub fn is_best(&self) -> bool {
        self.is_best
    }

    /// Log forward score (only set when marginals were requested).
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Log backward score (only set when marginals were requested).
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Marginal probability (only set when marginals were requested).
    pub fn prob(&self) -> f64 {
        self.prob
    }
}

/// An edge between two adjacent nodes, recorded during the forward pass.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub(crate) lnode: NodeId,
    pub(crate) rnode: NodeId,
    pub(crate) cost: i64,
}

impl Edge {
    pub fn lnode(&self) -> NodeId {
        self.lnode
    }

    pub fn rnode(&self) -> NodeId {
        self.rnode
    }

    /// Transition cost plus the right node's word cost.
    pub fn cost(&self) -> i64 {
        self.cost
    }
}
