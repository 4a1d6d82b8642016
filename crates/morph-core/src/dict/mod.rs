//! Dictionary and connection-matrix storage.
//!
//! `MemoryDictionary` maps surface forms to entries and answers common-prefix
//! queries. `ConnectionMatrix` stores the context-ID bigram costs used to
//! score transitions between adjacent morphemes.

pub mod connection;
mod connection_io;
mod entry;
mod memory_dict;
#[cfg(test)]
mod tests;

pub use connection::ConnectionMatrix;
pub use entry::DictEntry;
pub use memory_dict::MemoryDictionary;

use std::io;

/// Error type for dictionary and connection-matrix loading.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error at line {line}: {reason}")]
    Line { line: usize, reason: String },

    #[error("parse error: {0}")]
    Parse(String),
}

/// One common-prefix hit: the matched surface and every entry stored for it.
pub struct SearchResult<'a> {
    pub surface: &'a str,
    pub entries: &'a [DictEntry],
}

pub trait Dictionary: Send + Sync {
    fn lookup(&self, surface: &str) -> Option<&[DictEntry]>;

    /// All keys that are prefixes of `query`, shortest first.
    fn common_prefix_search(&self, query: &str) -> Vec<SearchResult<'_>>;
}
