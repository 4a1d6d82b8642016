//! Analysis driver: fills a lattice from a [`Model`], scores it and reads
//! results back.
//!
//! A `Tagger` is cheap to clone and can be shared; each thread owns its own
//! [`Lattice`].

mod morpheme;
mod partial;
mod unknown;

#[cfg(test)]
mod tests;

pub use morpheme::Morpheme;
pub use partial::set_partial_input;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::lattice::{AnalysisError, BoundaryConstraint, Lattice, NodeSpec, RequestType};
use crate::model::Model;
use crate::search::viterbi;
use crate::settings::{settings, UnknownSettings};

/// Per-tagger analysis options, defaulting to the global settings.
#[derive(Debug, Clone)]
pub struct TaggerOptions {
    pub theta: f64,
    pub unknown_word_fallback: bool,
    pub require_non_empty: bool,
    /// 0 disables the bound.
    pub max_nodes: usize,
    /// 0 disables the bound.
    pub max_frontier: usize,
    pub unknown: UnknownSettings,
}

impl Default for TaggerOptions {
    fn default() -> Self {
        let s = settings();
        Self {
            theta: s.analysis.theta,
            unknown_word_fallback: s.analysis.unknown_word_fallback,
            require_non_empty: s.analysis.require_non_empty,
            max_nodes: s.lattice.max_nodes,
            max_frontier: s.nbest.max_frontier,
            unknown: s.unknown.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Tagger {
    model: Arc<dyn Model>,
    options: TaggerOptions,
}

impl fmt::Debug for Tagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tagger")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Tagger {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self::with_options(model, TaggerOptions::default())
    }

    pub fn with_options(model: Arc<dyn Model>, options: TaggerOptions) -> Self {
        Self { model, options }
    }

    pub fn options(&self) -> &TaggerOptions {
        &self.options
    }

    pub fn model(&self) -> &dyn Model {
        &*self.model
    }

    /// A lattice configured with this tagger's θ and bounds.
    pub fn new_lattice(&self) -> Lattice {
        let mut lattice = Lattice::new();
        lattice.set_theta(self.options.theta);
        lattice.set_max_nodes(self.options.max_nodes);
        lattice.set_max_frontier(self.options.max_frontier);
        lattice
    }

    /// Fill and score a lattice whose sentence (and constraints) are set.
    ///
    /// For N-best requests the generator is primed, so `Lattice::next`
    /// yields paths right away.
    pub fn parse(&self, lattice: &mut Lattice) -> Result<(), AnalysisError> {
        let _span = debug_span!("parse", len = lattice.len(), request = %lattice.request_type())
            .entered();
        if lattice.is_empty() && self.options.require_non_empty {
            return Err(AnalysisError::EmptySentence);
        }
        if lattice.scored {
            return Err(AnalysisError::InvalidConstraint(
                "lattice already analyzed; set a new sentence first".to_string(),
            ));
        }
        let kept = lattice.nodes.len();
        if let Err(e) = self.build(lattice) {
            lattice.truncate_nodes(kept);
            return Err(e);
        }
        viterbi(lattice, &*self.model)?;
        if lattice.request_type().is_nbest() {
            lattice.start_nbest()?;
        }
        Ok(())
    }

    fn build(&self, lattice: &mut Lattice) -> Result<(), AnalysisError> {
        let _span = debug_span!("build_lattice", len = lattice.len()).entered();
        let partial = lattice.request_type().partial;

        for pos in 0..lattice.len() {
            if lattice.boundary_constraint(pos) == BoundaryConstraint::InsideToken {
                continue;
            }
            let mut known = 0;
            for c in self.model.lookup(lattice.suffix(pos)) {
                let end = pos + c.char_len;
                if c.char_len == 0 || !lattice.is_allowed(pos, end, &c.feature) {
                    continue;
                }
                lattice.add_node(NodeSpec {
                    begin: pos,
                    end,
                    left_id: c.left_id,
                    right_id: c.right_id,
                    word_cost: c.cost,
                    feature: c.feature,
                    unknown: false,
                })?;
                known += 1;
            }

            let forced = lattice
                .feature_constraint(pos)
                .map(|(end, feature)| (end, feature.to_string()));
            match forced {
                Some((end, pattern)) if partial && known == 0 => {
                    unknown::add_forced_node(lattice, pos, end, &pattern, &self.options.unknown)?;
                }
                _ if self.options.unknown_word_fallback => {
                    unknown::add_unknown_nodes(lattice, pos, known > 0, &self.options.unknown)?;
                }
                _ => {}
            }
        }
        debug!(nodes = lattice.node_count(), "lattice built");
        Ok(())
    }

    /// Morphemes for a parsed lattice: every viable node when the request
    /// asks for all morphs, otherwise the best path.
    pub fn morphemes(&self, lattice: &Lattice) -> Result<Vec<Morpheme>, AnalysisError> {
        if lattice.request_type().all_morphs {
            lattice.best_path()?;
            return Ok(Morpheme::all_morphs(lattice));
        }
        Ok(Morpheme::from_path(lattice, &lattice.best_path()?))
    }

    /// Best-path analysis of `text`.
    pub fn parse_str(&self, text: &str) -> Result<Vec<Morpheme>, AnalysisError> {
        let mut lattice = self.new_lattice();
        lattice.set_sentence(text);
        self.parse(&mut lattice)?;
        self.morphemes(&lattice)
    }

    /// Up to `n` analyses of `text` in non-decreasing cost order.
    pub fn parse_nbest(&self, text: &str, n: usize) -> Result<Vec<Vec<Morpheme>>, AnalysisError> {
        let mut lattice = self.new_lattice();
        lattice.set_request_type(RequestType::nbest());
        lattice.set_sentence(text);
        self.parse(&mut lattice)?;
        let paths = lattice.enum_nbest(n)?;
        Ok(paths
            .iter()
            .map(|path| Morpheme::from_path(&lattice, path))
            .collect())
    }

    /// Best-path analysis of partial input (see [`set_partial_input`]).
    pub fn parse_partial(&self, input: &str) -> Result<Vec<Morpheme>, AnalysisError> {
        let mut lattice = self.new_lattice();
        set_partial_input(&mut lattice, input)?;
        self.parse(&mut lattice)?;
        self.morphemes(&lattice)
    }
}
