use tracing::{debug, debug_span};

use crate::lattice::{AnalysisError, Edge, Lattice, NodeId};
use crate::model::Model;

/// Score a filled lattice.
///
/// Runs the forward pass (min cost from BOS, best predecessor, every edge
/// recorded), then the backward pass (min cost to EOS) and marks the best
/// path. When the request asks for marginals, α/β, Z and per-node
/// probabilities are computed as well.
///
/// Equal-cost predecessors resolve to the first one in end-chain order.
/// Scoring again recomputes everything from the nodes.
pub fn viterbi(lattice: &mut Lattice, model: &dyn Model) -> Result<(), AnalysisError> {
    let len = lattice.len();
    let _span = debug_span!("viterbi", len, nodes = lattice.node_count()).entered();

    lattice.edges.clear();
    for node in &mut lattice.nodes {
        node.reset_scores();
    }
    lattice.set_z(0.0);
    lattice.no_path = None;

    forward(lattice, model);
    lattice.scored = true;

    let eos = lattice.eos();
    let Some(cost) = lattice.node(eos).forward else {
        let position = furthest_reached(lattice);
        debug!(position, "EOS unreachable");
        lattice.no_path = Some(position);
        return Err(AnalysisError::NoPath { position });
    };

    backward(lattice);
    mark_best(lattice);
    if lattice.request_type().marginal_prob {
        marginals(lattice);
    }
    debug!(cost, edges = lattice.edge_count(), "lattice scored");
    Ok(())
}

fn forward(lattice: &mut Lattice, model: &dyn Model) {
    let bos = lattice.bos();
    lattice.nodes[bos.index()].forward = Some(0);

    // (id, right_id, forward) of reachable nodes ending at the current position
    let mut lnodes: Vec<(NodeId, u16, i64)> = Vec::new();
    let mut rnodes: Vec<NodeId> = Vec::new();

    for pos in 0..=lattice.len() {
        lnodes.clear();
        lnodes.extend(lattice.end_nodes(pos).filter_map(|id| {
            let n = lattice.node(id);
            n.forward.map(|f| (id, n.right_id, f))
        }));
        if lnodes.is_empty() {
            continue;
        }
        rnodes.clear();
        rnodes.extend(lattice.begin_nodes(pos));

        for &r in &rnodes {
            let (left_id, word_cost) = {
                let n = lattice.node(r);
                (n.left_id, n.word_cost)
            };
            let start = lattice.edges.len() as u32;
            let mut best: Option<(i64, NodeId)> = None;
            for &(l, right_id, l_forward) in &lnodes {
                let cost = model.transition_cost(right_id, left_id) + word_cost;
                lattice.edges.push(Edge {
                    lnode: l,
                    rnode: r,
                    cost,
                });
                let total = l_forward + cost;
                if best.map_or(true, |(b, _)| total < b) {
                    best = Some((total, l));
                }
            }
            let end = lattice.edges.len() as u32;
            let node = &mut lattice.nodes[r.index()];
            node.edges = start..end;
            if let Some((forward, prev)) = best {
                node.forward = Some(forward);
                node.prev = Some(prev);
            }
        }
    }
}

/// Furthest char position any path from BOS reaches.
fn furthest_reached(lattice: &Lattice) -> usize {
    lattice
        .nodes
        .iter()
        .filter(|n| n.forward.is_some())
        .map(|n| n.end)
        .max()
        .unwrap_or(0)
}

fn backward(lattice: &mut Lattice) {
    let eos = lattice.eos();
    lattice.nodes[eos.index()].backward = Some(0);

    let mut rnodes: Vec<NodeId> = Vec::new();
    for pos in (0..=lattice.len()).rev() {
        rnodes.clear();
        rnodes.extend(lattice.begin_nodes(pos));
        for &r in &rnodes {
            let Some(r_backward) = lattice.node(r).backward else {
                continue;
            };
            let range = lattice.node(r).edges.clone();
            for e in range {
                let edge = lattice.edges[e as usize];
                let total = r_backward + edge.cost;
                let l = &mut lattice.nodes[edge.lnode.index()];
                if l.backward.map_or(true, |b| total < b) {
                    l.backward = Some(total);
                }
            }
        }
    }
}

fn mark_best(lattice: &mut Lattice) {
    let mut cur = Some(lattice.eos());
    while let Some(id) = cur {
        let node = &mut lattice.nodes[id.index()];
        node.is_best = true;
        cur = node.prev;
    }
}

/// Forward-backward under temperature θ, in log space.
fn marginals(lattice: &mut Lattice) {
    let theta = lattice.theta();
    let (bos, eos) = (lattice.bos(), lattice.eos());
    let mut ids: Vec<NodeId> = Vec::new();

    lattice.nodes[bos.index()].alpha = 0.0;
    for pos in 0..=lattice.len() {
        ids.clear();
        ids.extend(lattice.begin_nodes(pos));
        for &r in &ids {
            let alpha = lattice
                .incoming_edges(r)
                .iter()
                .map(|e| lattice.node(e.lnode).alpha - theta * e.cost as f64)
                .fold(f64::NEG_INFINITY, log_add);
            lattice.nodes[r.index()].alpha = alpha;
        }
    }

    lattice.nodes[eos.index()].beta = 0.0;
    for pos in (0..=lattice.len()).rev() {
        ids.clear();
        ids.extend(lattice.begin_nodes(pos));
        for &r in &ids {
            let r_beta = lattice.node(r).beta;
            if r_beta == f64::NEG_INFINITY {
                continue;
            }
            let range = lattice.node(r).edges.clone();
            for e in range {
                let edge = lattice.edges[e as usize];
                let l = &mut lattice.nodes[edge.lnode.index()];
                l.beta = log_add(l.beta, r_beta - theta * edge.cost as f64);
            }
        }
    }

    let z = lattice.node(eos).alpha;
    lattice.set_z(z);
    for node in &mut lattice.nodes {
        if node.alpha.is_finite() && node.beta.is_finite() {
            node.prob = (node.alpha + node.beta - z).exp();
        }
    }
    debug!(z, "marginals computed");
}

/// `ln(e^x + e^y)` without overflow.
pub(crate) fn log_add(x: f64, y: f64) -> f64 {
    if x == f64::NEG_INFINITY {
        return y;
    }
    if y == f64::NEG_INFINITY {
        return x;
    }
    let (hi, lo) = if x > y { (x, y) } else { (y, x) };
    hi + (lo - hi).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{NodeSpec, RequestType};
    use crate::testutil::{test_model, unigram_model};
    use std::sync::Arc;

    fn spec(begin: usize, end: usize, cost: i64) -> NodeSpec {
        NodeSpec {
            begin,
            end,
            left_id: 0,
            right_id: 0,
            word_cost: cost,
            feature: Arc::from("W"),
            unknown: false,
        }
    }

    /// "ab" with a=50, ab=100, b=50: two tilings of cost 100.
    fn tie_lattice() -> (Lattice, NodeId, NodeId, NodeId) {
        let mut lattice = Lattice::new();
        lattice.set_sentence("ab");
        let a = lattice.add_node(spec(0, 1, 50)).unwrap();
        let ab = lattice.add_node(spec(0, 2, 100)).unwrap();
        let b = lattice.add_node(spec(1, 2, 50)).unwrap();
        (lattice, a, ab, b)
    }

    #[test]
    fn test_forward_and_backward_costs() {
        let (mut lattice, a, ab, b) = tie_lattice();
        viterbi(&mut lattice, &unigram_model(&[])).unwrap();
        assert_eq!(lattice.node(a).forward_cost(), Some(50));
        assert_eq!(lattice.node(b).forward_cost(), Some(100));
        assert_eq!(lattice.node(ab).forward_cost(), Some(100));
        assert_eq!(lattice.node(a).backward_cost(), Some(50));
        assert_eq!(lattice.node(ab).backward_cost(), Some(0));
        assert_eq!(lattice.node(lattice.bos()).backward_cost(), Some(100));
        for id in [a, ab, b] {
            assert_eq!(lattice.node(id).best_total_cost(), Some(100));
        }
    }

    #[test]
    fn test_tie_prefers_first_discovered() {
        let (mut lattice, _, ab, b) = tie_lattice();
        viterbi(&mut lattice, &unigram_model(&[])).unwrap();
        let path = lattice.best_path().unwrap();
        assert_eq!(path.nodes, vec![ab]);
        assert_eq!(path.cost, 100);
        assert!(lattice.node(ab).is_best());
        assert!(!lattice.node(b).is_best());
        assert_eq!(lattice.node(lattice.eos()).prev(), Some(ab));
    }

    #[test]
    fn test_edges_record_transition_plus_word_cost() {
        let model = test_model();
        let mut lattice = Lattice::new();
        lattice.set_sentence("もも");
        let noun = |begin, end| NodeSpec {
            left_id: 1,
            right_id: 1,
            ..spec(begin, end, 10)
        };
        let first = lattice.add_node(noun(0, 1)).unwrap();
        let second = lattice.add_node(noun(1, 2)).unwrap();
        viterbi(&mut lattice, &model).unwrap();

        let edges = lattice.incoming_edges(second);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].lnode(), first);
        assert_eq!(edges[0].rnode(), second);
        // noun -> noun costs 1000 in the test matrix
        assert_eq!(edges[0].cost(), 1010);
        assert_eq!(lattice.best_path().unwrap().cost, 1020);
    }

    #[test]
    fn test_unreachable_eos_reports_position() {
        let mut lattice = Lattice::new();
        lattice.set_sentence("abcd");
        lattice.add_node(spec(0, 1, 10)).unwrap();
        lattice.add_node(spec(1, 2, 10)).unwrap();
        lattice.add_node(spec(3, 4, 10)).unwrap();
        let err = viterbi(&mut lattice, &unigram_model(&[])).unwrap_err();
        assert_eq!(err, AnalysisError::NoPath { position: 2 });
        assert!(!lattice.is_available());
        assert_eq!(lattice.best_path().unwrap_err(), err);
    }

    #[test]
    fn test_empty_sentence_scores_bos_to_eos() {
        let mut lattice = Lattice::new();
        lattice.set_sentence("");
        viterbi(&mut lattice, &unigram_model(&[])).unwrap();
        let path = lattice.best_path().unwrap();
        assert!(path.nodes.is_empty());
        assert_eq!(path.cost, 0);
    }

    #[test]
    fn test_rescoring_is_idempotent() {
        let (mut lattice, ..) = tie_lattice();
        let model = unigram_model(&[]);
        viterbi(&mut lattice, &model).unwrap();
        let first = lattice.best_path().unwrap();
        let edges = lattice.edge_count();
        viterbi(&mut lattice, &model).unwrap();
        assert_eq!(lattice.best_path().unwrap(), first);
        assert_eq!(lattice.edge_count(), edges);
    }

    #[test]
    fn test_marginals_at_each_cut_sum_to_one() {
        let (mut lattice, a, ab, b) = tie_lattice();
        lattice.set_request_type(RequestType::one_best().with_marginal_prob());
        lattice.set_theta(0.01);
        viterbi(&mut lattice, &unigram_model(&[])).unwrap();

        // Two equally costly tilings split the mass evenly.
        assert!((lattice.node(ab).prob() - 0.5).abs() < 1e-9);
        assert!((lattice.node(a).prob() - 0.5).abs() < 1e-9);
        assert!((lattice.node(b).prob() - 0.5).abs() < 1e-9);
        assert!((lattice.node(lattice.bos()).prob() - 1.0).abs() < 1e-9);
        // Z = ln(2 * e^(-θ·100))
        let expected_z = 2f64.ln() - 0.01 * 100.0;
        assert!((lattice.z() - expected_z).abs() < 1e-9);
    }

    #[test]
    fn test_marginals_skipped_unless_requested() {
        let (mut lattice, a, ..) = tie_lattice();
        viterbi(&mut lattice, &unigram_model(&[])).unwrap();
        assert_eq!(lattice.node(a).prob(), 0.0);
        assert_eq!(lattice.z(), 0.0);
    }

    #[test]
    fn test_log_add() {
        assert_eq!(log_add(f64::NEG_INFINITY, 1.5), 1.5);
        assert_eq!(log_add(-2.0, f64::NEG_INFINITY), -2.0);
        assert!((log_add(0.0, 0.0) - 2f64.ln()).abs() < 1e-12);
        assert!((log_add(-1000.0, -1000.0) - (-1000.0 + 2f64.ln())).abs() < 1e-9);
    }
}
