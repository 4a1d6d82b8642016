//! Per-sentence lattice: an arena of candidate morphemes over character
//! positions, linked into begin and end chains.
//!
//! A lattice is filled (usually by a [`Tagger`](crate::tagger::Tagger)),
//! scored once by [`viterbi`](crate::search::viterbi), then read as a best
//! path or walked with [`Lattice::next`]. `clear` / `set_sentence` release
//! every node in bulk and keep the allocations for the next sentence.

mod constraint;
mod node;
mod request;


pub use constraint::{feature_matches, BoundaryConstraint, FeatureConstraint};
pub use node::{Edge, EdgeId, Node, NodeId, NodeSpec, NodeStatus};
pub use request::{RequestType, SearchMode};

use std::sync::Arc;

use tracing::debug;

use crate::search::nbest::{NBestGenerator, NBestStats};
use crate::settings::settings;

const BOS: NodeId = NodeId(0);
const EOS: NodeId = NodeId(1);
const SENTINEL_FEATURE: &str = "BOS/EOS";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("no path found: cannot analyze beyond character position {position}")]
    NoPath { position: usize },

    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("allocation limit exceeded (limit {limit})")]
    AllocationFailure { limit: usize },

    #[error("lattice has not been scored")]
    NotScored,

    #[error("empty sentence")]
    EmptySentence,
}

/// A complete path through the lattice, BOS and EOS excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatticePath {
    pub nodes: Vec<NodeId>,
    pub cost: i64,
}

pub struct Lattice {
    sentence: String,
    /// Byte offset of every char boundary (`len + 1` entries).
    offsets: Vec<usize>,

    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    begin_head: Vec<Option<NodeId>>,
    begin_tail: Vec<Option<NodeId>>,
    end_head: Vec<Option<NodeId>>,
    end_tail: Vec<Option<NodeId>>,

    boundaries: Vec<BoundaryConstraint>,
    features: Vec<Option<FeatureConstraint>>,

    request: RequestType,
    theta: f64,
    z: f64,
    max_nodes: usize,
    sentinel_feature: Arc<str>,

    pub(crate) scored: bool,
    /// Set by the forward pass when EOS is unreachable.
    pub(crate) no_path: Option<usize>,
    nbest: NBestGenerator,
    nbest_primed: bool,
}

impl Default for Lattice {
    fn default() -> Self {
        Self::new()
    }
}

impl Lattice {
    /// An empty lattice configured from the global settings.
    pub fn new() -> Self {
        let s = settings();
        let mut lattice = Self {
            sentence: String::new(),
            offsets: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            begin_head: Vec::new(),
            begin_tail: Vec::new(),
            end_head: Vec::new(),
            end_tail: Vec::new(),
            boundaries: Vec::new(),
            features: Vec::new(),
            request: RequestType::default(),
            theta: s.analysis.theta,
            z: 0.0,
            max_nodes: s.lattice.max_nodes,
            sentinel_feature: Arc::from(SENTINEL_FEATURE),
            scored: false,
            no_path: None,
            nbest: NBestGenerator::new(s.nbest.max_frontier),
            nbest_primed: false,
        };
        lattice.set_sentence("");
        lattice
    }

    /// Reset the lattice and load a new sentence. BOS is placed at 0 and EOS
    /// at the sentence length (in chars).
    pub fn set_sentence(&mut self, text: &str) {
        self.reset();
        self.sentence.push_str(text);
        self.offsets
            .extend(text.char_indices().map(|(i, _)| i).chain([text.len()]));

        let slots = self.offsets.len();
        self.begin_head.resize(slots, None);
        self.begin_tail.resize(slots, None);
        self.end_head.resize(slots, None);
        self.end_tail.resize(slots, None);
        self.boundaries.resize(slots, BoundaryConstraint::Any);
        self.features.resize(slots, None);

        let len = self.len();
        let feature = Arc::clone(&self.sentinel_feature);
        self.nodes
            .push(Node::sentinel(0, NodeStatus::Bos, Arc::clone(&feature)));
        self.nodes.push(Node::sentinel(len, NodeStatus::Eos, feature));
        self.link_end(BOS, 0);
        self.link_begin(EOS, len);
        debug!(len, "sentence set");
    }

    /// Release every node, edge and constraint, leaving an empty sentence.
    /// Capacity is kept; θ, the request type and the bounds survive.
    pub fn clear(&mut self) {
        self.set_sentence("");
    }

    fn reset(&mut self) {
        self.sentence.clear();
        self.offsets.clear();
        self.nodes.clear();
        self.edges.clear();
        self.begin_head.clear();
        self.begin_tail.clear();
        self.end_head.clear();
        self.end_tail.clear();
        self.boundaries.clear();
        self.features.clear();
        self.z = 0.0;
        self.scored = false;
        self.no_path = None;
        self.nbest.reset();
        self.nbest_primed = false;
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    /// Sentence length in characters.
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `[begin, end)` char range of the sentence. Panics if out of range.
    pub fn slice(&self, begin: usize, end: usize) -> &str {
        &self.sentence[self.offsets[begin]..self.offsets[end]]
    }

    /// Text from char position `pos` to the end of the sentence.
    pub fn suffix(&self, pos: usize) -> &str {
        &self.sentence[self.offsets[pos]..]
    }

    pub fn bos(&self) -> NodeId {
        BOS
    }

    pub fn eos(&self) -> NodeId {
        EOS
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Edges ending at `id`, in discovery order.
    pub fn incoming_edges(&self, id: NodeId) -> &[Edge] {
        let range = &self.node(id).edges;
        &self.edges[range.start as usize..range.end as usize]
    }

    pub fn surface(&self, id: NodeId) -> &str {
        let node = self.node(id);
        self.slice(node.begin, node.end)
    }

    /// Number of nodes, sentinels excluded.
    pub fn node_count(&self) -> usize {
        self.nodes.len().saturating_sub(2)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes beginning at `pos`, in insertion order.
    pub fn begin_nodes(&self, pos: usize) -> impl Iterator<Item = NodeId> + '_ {
        let head = self.begin_head.get(pos).copied().flatten();
        std::iter::successors(head, move |&id| self.node(id).bnext)
    }

    /// Nodes ending at `pos`, in insertion order.
    pub fn end_nodes(&self, pos: usize) -> impl Iterator<Item = NodeId> + '_ {
        let head = self.end_head.get(pos).copied().flatten();
        std::iter::successors(head, move |&id| self.node(id).enext)
    }

    /// Every non-sentinel node, ordered by begin position then insertion.
    pub fn all_morphs(&self) -> Vec<NodeId> {
        (0..self.len())
            .flat_map(|pos| self.begin_nodes(pos))
            .collect()
    }

    /// Add a candidate node and link it into its chains.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<NodeId, AnalysisError> {
        if self.scored {
            return Err(AnalysisError::InvalidConstraint(
                "cannot add nodes to a scored lattice".to_string(),
            ));
        }
        self.check_node(spec.begin, spec.end, &spec.feature)
            .map_err(AnalysisError::InvalidConstraint)?;
        if self.max_nodes > 0 && self.node_count() >= self.max_nodes {
            return Err(AnalysisError::AllocationFailure {
                limit: self.max_nodes,
            });
        }
        let id = NodeId(self.nodes.len() as u32);
        let (begin, end) = (spec.begin, spec.end);
        self.nodes.push(Node::new(spec));
        self.link_begin(id, begin);
        self.link_end(id, end);
        Ok(id)
    }

    /// Whether a node over `[begin, end)` with `feature` would be accepted.
    pub fn is_allowed(&self, begin: usize, end: usize, feature: &str) -> bool {
        self.check_node(begin, end, feature).is_ok()
    }

    fn check_node(&self, begin: usize, end: usize, feature: &str) -> Result<(), String> {
        let len = self.len();
        if begin >= end {
            return Err(format!("empty span [{begin}, {end})"));
        }
        if end > len {
            return Err(format!("span [{begin}, {end}) exceeds sentence length {len}"));
        }
        if self.boundaries[begin] == BoundaryConstraint::InsideToken {
            return Err(format!("node begins inside a forced token at {begin}"));
        }
        if self.boundaries[end] == BoundaryConstraint::InsideToken {
            return Err(format!("node ends inside a forced token at {end}"));
        }
        if let Some(p) =
            (begin + 1..end).find(|&p| self.boundaries[p] == BoundaryConstraint::TokenBoundary)
        {
            return Err(format!("node [{begin}, {end}) crosses forced boundary {p}"));
        }
        if let Some(fc) = &self.features[begin] {
            if fc.end != end {
                return Err(format!(
                    "node [{begin}, {end}) does not match forced token [{begin}, {})",
                    fc.end
                ));
            }
            if !feature_matches(&fc.feature, feature) {
                return Err(format!(
                    "feature '{feature}' does not match forced '{}'",
                    fc.feature
                ));
            }
        }
        Ok(())
    }

    /// Drop every node added after the first `count` arena slots and relink
    /// the chains of the ones kept.
    pub(crate) fn truncate_nodes(&mut self, count: usize) {
        if self.nodes.len() <= count {
            return;
        }
        self.nodes.truncate(count);
        for chain in [
            &mut self.begin_head,
            &mut self.begin_tail,
            &mut self.end_head,
            &mut self.end_tail,
        ] {
            chain.fill(None);
        }
        for i in 0..self.nodes.len() {
            let id = NodeId(i as u32);
            let node = &mut self.nodes[i];
            node.bnext = None;
            node.enext = None;
            let (begin, end, status) = (node.begin, node.end, node.status);
            if status != NodeStatus::Bos {
                self.link_begin(id, begin);
            }
            if status != NodeStatus::Eos {
                self.link_end(id, end);
            }
        }
    }

    fn link_begin(&mut self, id: NodeId, pos: usize) {
        match self.begin_tail[pos] {
            Some(tail) => self.nodes[tail.index()].bnext = Some(id),
            None => self.begin_head[pos] = Some(id),
        }
        self.begin_tail[pos] = Some(id);
    }

    fn link_end(&mut self, id: NodeId, pos: usize) {
        match self.end_tail[pos] {
            Some(tail) => self.nodes[tail.index()].enext = Some(id),
            None => self.end_head[pos] = Some(id),
        }
        self.end_tail[pos] = Some(id);
    }

    /// `Any` for positions outside the sentence.
    pub fn boundary_constraint(&self, pos: usize) -> BoundaryConstraint {
        self.boundaries.get(pos).copied().unwrap_or_default()
    }

    /// The forced `(end, feature)` of the token beginning at `begin`, if any.
    pub fn feature_constraint(&self, begin: usize) -> Option<(usize, &str)> {
        self.features
            .get(begin)?
            .as_ref()
            .map(|fc| (fc.end, &*fc.feature))
    }

    pub fn has_constraint(&self) -> bool {
        self.boundaries
            .iter()
            .any(|&b| b != BoundaryConstraint::Any)
            || self.features.iter().any(Option::is_some)
    }

    pub fn set_boundary_constraint(
        &mut self,
        pos: usize,
        constraint: BoundaryConstraint,
    ) -> Result<(), AnalysisError> {
        self.ensure_unscored()?;
        let len = self.len();
        if pos > len {
            return Err(AnalysisError::InvalidConstraint(format!(
                "position {pos} exceeds sentence length {len}"
            )));
        }
        self.check_boundary(pos, constraint)?;
        self.boundaries[pos] = constraint;
        Ok(())
    }

    /// Force a single token over `[begin, end)` whose feature matches
    /// `feature`. Sets a boundary at both ends and marks the interior as
    /// inside-token.
    pub fn set_feature_constraint(
        &mut self,
        begin: usize,
        end: usize,
        feature: &str,
    ) -> Result<(), AnalysisError> {
        self.ensure_unscored()?;
        let len = self.len();
        if begin >= end || end > len {
            return Err(AnalysisError::InvalidConstraint(format!(
                "feature span [{begin}, {end}) is empty or exceeds sentence length {len}"
            )));
        }
        self.check_boundary(begin, BoundaryConstraint::TokenBoundary)?;
        self.check_boundary(end, BoundaryConstraint::TokenBoundary)?;
        for p in begin + 1..end {
            self.check_boundary(p, BoundaryConstraint::InsideToken)?;
        }
        if let Some(id) = self
            .begin_nodes(begin)
            .find(|&id| !self.node_fits(id, end, feature))
        {
            return Err(AnalysisError::InvalidConstraint(format!(
                "existing node '{}' conflicts with forced token [{begin}, {end})",
                self.surface(id)
            )));
        }

        self.boundaries[begin] = BoundaryConstraint::TokenBoundary;
        self.boundaries[end] = BoundaryConstraint::TokenBoundary;
        for p in begin + 1..end {
            self.boundaries[p] = BoundaryConstraint::InsideToken;
        }
        self.features[begin] = Some(FeatureConstraint {
            end,
            feature: Arc::from(feature),
        });
        Ok(())
    }

    fn node_fits(&self, id: NodeId, end: usize, feature: &str) -> bool {
        let node = self.node(id);
        node.end == end && feature_matches(feature, &node.feature)
    }

    /// Reject a constraint that contradicts an existing one or an already
    /// added node.
    fn check_boundary(
        &self,
        pos: usize,
        constraint: BoundaryConstraint,
    ) -> Result<(), AnalysisError> {
        let invalid = |msg: String| Err(AnalysisError::InvalidConstraint(msg));
        let current = self.boundaries[pos];
        match constraint {
            BoundaryConstraint::Any => Ok(()),
            BoundaryConstraint::TokenBoundary => {
                if current == BoundaryConstraint::InsideToken {
                    return invalid(format!("position {pos} is inside a forced token"));
                }
                match self.nodes.iter().skip(2).find(|n| n.begin < pos && pos < n.end) {
                    Some(n) => invalid(format!(
                        "existing node [{}, {}) crosses boundary {pos}",
                        n.begin, n.end
                    )),
                    None => Ok(()),
                }
            }
            BoundaryConstraint::InsideToken => {
                if pos == 0 || pos == self.len() {
                    return invalid(format!("position {pos} cannot be inside a token"));
                }
                if current == BoundaryConstraint::TokenBoundary {
                    return invalid(format!("position {pos} is a forced boundary"));
                }
                if self.begin_nodes(pos).next().is_some() || self.end_nodes(pos).next().is_some()
                {
                    return invalid(format!("existing node begins or ends at {pos}"));
                }
                Ok(())
            }
        }
    }

    fn ensure_unscored(&self) -> Result<(), AnalysisError> {
        if self.scored {
            return Err(AnalysisError::InvalidConstraint(
                "constraints must be set before scoring".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_type(&self) -> RequestType {
        self.request
    }

    pub fn set_request_type(&mut self, request: RequestType) {
        self.request = request;
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn set_theta(&mut self, theta: f64) {
        self.theta = theta;
    }

    /// Log partition function, set by scoring when marginals are requested.
    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn set_z(&mut self, z: f64) {
        self.z = z;
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Bound on non-sentinel nodes; 0 disables it.
    pub fn set_max_nodes(&mut self, max_nodes: usize) {
        self.max_nodes = max_nodes;
    }

    /// Bound on the N-best frontier; 0 disables it.
    pub fn set_max_frontier(&mut self, max_frontier: usize) {
        self.nbest.set_max_frontier(max_frontier);
    }

    /// Scored with a reachable EOS.
    pub fn is_available(&self) -> bool {
        self.scored && self.no_path.is_none()
    }

    pub(crate) fn ensure_available(&self) -> Result<(), AnalysisError> {
        if !self.scored {
            return Err(AnalysisError::NotScored);
        }
        match self.no_path {
            Some(position) => Err(AnalysisError::NoPath { position }),
            None => Ok(()),
        }
    }

    /// The Viterbi best path.
    pub fn best_path(&self) -> Result<LatticePath, AnalysisError> {
        self.ensure_available()?;
        let mut nodes: Vec<NodeId> =
            std::iter::successors(self.node(EOS).prev, |&id| self.node(id).prev)
                .take_while(|&id| id != BOS)
                .collect();
        nodes.reverse();
        Ok(LatticePath {
            nodes,
            cost: self.node(EOS).forward.unwrap_or_default(),
        })
    }

    /// Prime the N-best generator. Called by the tagger for N-best requests;
    /// `next` primes lazily otherwise.
    pub fn start_nbest(&mut self) -> Result<(), AnalysisError> {
        let mut generator = std::mem::take(&mut self.nbest);
        let result = generator.set(self);
        self.nbest = generator;
        self.nbest_primed = result.is_ok();
        result
    }

    /// The next path in non-decreasing cost order, or `None` once every path
    /// has been produced.
    pub fn next(&mut self) -> Result<Option<LatticePath>, AnalysisError> {
        if !self.nbest_primed {
            self.start_nbest()?;
        }
        let mut generator = std::mem::take(&mut self.nbest);
        let result = generator.next(self);
        self.nbest = generator;
        result
    }

    /// Collect up to `n` further paths.
    pub fn enum_nbest(&mut self, n: usize) -> Result<Vec<LatticePath>, AnalysisError> {
        let mut paths = Vec::new();
        while paths.len() < n {
            match self.next()? {
                Some(path) => paths.push(path),
                None => break,
            }
        }
        Ok(paths)
    }

    /// A* counters for the current sentence, when requested.
    pub fn nbest_stats(&self) -> Option<NBestStats> {
        self.request.nbest_stats.then(|| self.nbest.stats())
    }
}
