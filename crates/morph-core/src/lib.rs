pub mod dict;
pub mod lattice;
pub mod model;
pub mod search;
pub mod settings;
pub mod tagger;
pub mod unicode;

mod testutil;

pub use dict::{ConnectionMatrix, DictEntry, DictError, Dictionary, MemoryDictionary};
pub use lattice::{
    AnalysisError, BoundaryConstraint, Lattice, LatticePath, NodeId, NodeSpec, RequestType,
    SearchMode,
};
pub use model::{Candidate, DictionaryModel, Model};
pub use search::NBestStats;
pub use tagger::{Morpheme, Tagger, TaggerOptions};
