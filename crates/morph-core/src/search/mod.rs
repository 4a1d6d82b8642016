//! Path search over a filled lattice: Viterbi scoring and A* N-best.

pub mod nbest;
pub mod viterbi;

pub use nbest::{NBestGenerator, NBestStats};
pub use viterbi::viterbi;
