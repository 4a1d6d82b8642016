use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A lexicon entry. The surface form is the key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictEntry {
    pub cost: i16,
    pub left_id: u16,
    pub right_id: u16,
    /// Comma-separated annotation (part of speech, conjugation, reading, ...).
    pub feature: Arc<str>,
}
