use serde::Serialize;

use crate::lattice::{Lattice, LatticePath, NodeId, NodeStatus};

/// An owned view of one analyzed morpheme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Morpheme {
    pub surface: String,
    pub feature: String,
    /// Char offsets into the sentence, `[begin, end)`.
    pub begin: usize,
    pub end: usize,
    pub word_cost: i64,
    /// Path cost up to and including this morpheme.
    pub cost: i64,
    pub unknown: bool,
    /// Marginal probability, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prob: Option<f64>,
}

impl Morpheme {
    fn from_node(lattice: &Lattice, id: NodeId, cost: i64) -> Self {
        let node = lattice.node(id);
        Self {
            surface: lattice.surface(id).to_string(),
            feature: node.feature().to_string(),
            begin: node.begin(),
            end: node.end(),
            word_cost: node.word_cost(),
            cost,
            unknown: node.status() == NodeStatus::Unknown,
            prob: lattice
                .request_type()
                .marginal_prob
                .then(|| node.prob()),
        }
    }

    /// Morphemes of `path`, with costs accumulated along that path.
    pub fn from_path(lattice: &Lattice, path: &LatticePath) -> Vec<Self> {
        let mut prev = lattice.bos();
        let mut acc = 0;
        path.nodes
            .iter()
            .map(|&id| {
                acc += lattice
                    .incoming_edges(id)
                    .iter()
                    .find(|e| e.lnode() == prev)
                    .map_or(lattice.node(id).word_cost(), |e| e.cost());
                prev = id;
                Self::from_node(lattice, id, acc)
            })
            .collect()
    }

    /// Every node lying on some complete path, in lattice order. `cost` is
    /// the best total cost through the node.
    pub fn all_morphs(lattice: &Lattice) -> Vec<Self> {
        lattice
            .all_morphs()
            .into_iter()
            .filter_map(|id| {
                let total = lattice.node(id).best_total_cost()?;
                Some(Self::from_node(lattice, id, total))
            })
            .collect()
    }
}
