//! Lazy N-best enumeration by A* over a scored lattice.
//!
//! Partial paths grow backward from EOS. Each one is a link in an arena:
//! the node it reached, the link it extends, and `gx`, the real cost from
//! EOS so far. The priority is `fx = gx + forward(node)`; the forward cost
//! is the exact best cost back to BOS, so the first complete path popped is
//! always the cheapest one not yet emitted.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::Serialize;
use tracing::debug;

use crate::lattice::{AnalysisError, Lattice, LatticePath, NodeId};

/// Per-sentence A* counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NBestStats {
    pub pushed: usize,
    pub popped: usize,
    pub emitted: usize,
    pub peak_frontier: usize,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    node: NodeId,
    next: Option<u32>,
    gx: i64,
}

#[derive(Debug, Default)]
pub struct NBestGenerator {
    links: Vec<Link>,
    /// Min-heap on (fx, insertion sequence, link index).
    frontier: BinaryHeap<Reverse<(i64, u64, u32)>>,
    seq: u64,
    max_frontier: usize,
    stats: NBestStats,
}

impl NBestGenerator {
    /// `max_frontier` of 0 leaves the frontier unbounded.
    pub fn new(max_frontier: usize) -> Self {
        Self {
            max_frontier,
            ..Self::default()
        }
    }

    pub fn set_max_frontier(&mut self, max_frontier: usize) {
        self.max_frontier = max_frontier;
    }

    /// Drop all partial paths, keeping the arena's capacity.
    pub fn reset(&mut self) {
        self.links.clear();
        self.frontier.clear();
        self.seq = 0;
        self.stats = NBestStats::default();
    }

    pub fn stats(&self) -> NBestStats {
        self.stats
    }

    /// Prime the frontier with EOS. The lattice must be scored with a
    /// reachable EOS.
    pub fn set(&mut self, lattice: &Lattice) -> Result<(), AnalysisError> {
        self.reset();
        lattice.ensure_available()?;
        let eos = lattice.eos();
        let hx = lattice
            .node(eos)
            .forward_cost()
            .ok_or(AnalysisError::NotScored)?;
        self.push(
            Link {
                node: eos,
                next: None,
                gx: 0,
            },
            hx,
        )
    }

    /// Produce the next complete path, or `None` when the frontier is empty.
    pub fn next(&mut self, lattice: &Lattice) -> Result<Option<LatticePath>, AnalysisError> {
        let bos = lattice.bos();
        while let Some(&Reverse((_, _, idx))) = self.frontier.peek() {
            let link = self.links[idx as usize];
            if link.node != bos {
                self.check_expansion(lattice, link.node)?;
            }
            self.frontier.pop();
            self.stats.popped += 1;
            if link.node == bos {
                self.stats.emitted += 1;
                let path = self.path_from(idx, lattice);
                debug!(
                    rank = self.stats.emitted,
                    cost = path.cost,
                    frontier = self.frontier.len(),
                    "nbest path"
                );
                return Ok(Some(path));
            }
            for edge in lattice.incoming_edges(link.node) {
                let Some(hx) = lattice.node(edge.lnode()).forward_cost() else {
                    continue;
                };
                let gx = link.gx + edge.cost();
                self.push(
                    Link {
                        node: edge.lnode(),
                        next: Some(idx),
                        gx,
                    },
                    gx + hx,
                )?;
            }
        }
        debug!(stats = ?self.stats, "nbest exhausted");
        Ok(None)
    }

    /// Fail before popping `node` if its expansion would overflow the
    /// frontier bound, so the frontier stays intact and later calls see the
    /// same error.
    fn check_expansion(&self, lattice: &Lattice, node: NodeId) -> Result<(), AnalysisError> {
        if self.max_frontier == 0 {
            return Ok(());
        }
        let grow = lattice
            .incoming_edges(node)
            .iter()
            .filter(|e| lattice.node(e.lnode()).forward_cost().is_some())
            .count();
        if self.frontier.len() - 1 + grow > self.max_frontier {
            return Err(AnalysisError::AllocationFailure {
                limit: self.max_frontier,
            });
        }
        Ok(())
    }

    fn push(&mut self, link: Link, fx: i64) -> Result<(), AnalysisError> {
        if self.max_frontier > 0 && self.frontier.len() >= self.max_frontier {
            return Err(AnalysisError::AllocationFailure {
                limit: self.max_frontier,
            });
        }
        let idx = self.links.len() as u32;
        self.links.push(link);
        self.frontier.push(Reverse((fx, self.seq, idx)));
        self.seq += 1;
        self.stats.pushed += 1;
        self.stats.peak_frontier = self.stats.peak_frontier.max(self.frontier.len());
        Ok(())
    }

    /// Read the chain from a BOS link forward to EOS.
    fn path_from(&self, idx: u32, lattice: &Lattice) -> LatticePath {
        let head = self.links[idx as usize];
        let eos = lattice.eos();
        let nodes = std::iter::successors(head.next, |&i| self.links[i as usize].next)
            .map(|i| self.links[i as usize].node)
            .filter(|&id| id != eos)
            .collect();
        LatticePath {
            nodes,
            cost: head.gx,
        }
    }
}
