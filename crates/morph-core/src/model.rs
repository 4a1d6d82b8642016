//! The lookup oracle the analyzer consults while building a lattice.
//!
//! A `Model` answers two questions: which morphemes can start at the front
//! of a piece of text, and how much it costs to put one morpheme after
//! another. It is immutable during analysis and shared between taggers.

use std::sync::Arc;

use crate::dict::{ConnectionMatrix, Dictionary, MemoryDictionary};

/// A candidate morpheme returned by [`Model::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Length of the matched surface, in characters.
    pub char_len: usize,
    pub left_id: u16,
    pub right_id: u16,
    pub cost: i64,
    pub feature: Arc<str>,
}

pub trait Model: Send + Sync {
    /// Candidates whose surface is a prefix of `text`, shortest first.
    fn lookup(&self, text: &str) -> Vec<Candidate>;

    /// Cost of a morpheme with left context `left_id` following one with
    /// right context `right_id`.
    fn transition_cost(&self, right_id: u16, left_id: u16) -> i64;
}

/// A `Model` backed by a dictionary and an optional connection matrix.
///
/// Without a matrix every transition costs 0 and analysis degrades to
/// unigram scoring (sum of word costs).
pub struct DictionaryModel<D = MemoryDictionary> {
    dict: D,
    conn: Option<ConnectionMatrix>,
}

impl<D: Dictionary> DictionaryModel<D> {
    pub fn new(dict: D, conn: Option<ConnectionMatrix>) -> Self {
        Self { dict, conn }
    }

    pub fn dictionary(&self) -> &D {
        &self.dict
    }

    pub fn connection(&self) -> Option<&ConnectionMatrix> {
        self.conn.as_ref()
    }
}

impl<D: Dictionary> Model for DictionaryModel<D> {
    fn lookup(&self, text: &str) -> Vec<Candidate> {
        self.dict
            .common_prefix_search(text)
            .into_iter()
            .flat_map(|hit| {
                let char_len = hit.surface.chars().count();
                hit.entries.iter().map(move |e| Candidate {
                    char_len,
                    left_id: e.left_id,
                    right_id: e.right_id,
                    cost: e.cost as i64,
                    feature: Arc::clone(&e.feature),
                })
            })
            .collect()
    }

    fn transition_cost(&self, right_id: u16, left_id: u16) -> i64 {
        self.conn
            .as_ref()
            .map(|c| c.cost(right_id, left_id) as i64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_matrix, test_model};

    #[test]
    fn test_lookup_flattens_entries_shortest_first() {
        let model = test_model();
        let cands = model.lookup("すもももも");
        let lens: Vec<usize> = cands.iter().map(|c| c.char_len).collect();
        assert_eq!(lens, vec![3]);
        let cands = model.lookup("ももの");
        let lens: Vec<usize> = cands.iter().map(|c| c.char_len).collect();
        // も (particle), も (noun), もも
        assert_eq!(lens, vec![1, 1, 2]);
    }

    #[test]
    fn test_transition_cost_uses_matrix() {
        let model = test_model();
        let conn = test_matrix();
        assert_eq!(model.transition_cost(1, 1), conn.cost(1, 1) as i64);
        assert_eq!(model.transition_cost(1, 1), 1000);
        assert_eq!(model.transition_cost(2, 1), 0);
    }

    #[test]
    fn test_transition_cost_without_matrix_is_zero() {
        let model = DictionaryModel::new(MemoryDictionary::default(), None);
        assert_eq!(model.transition_cost(3, 4), 0);
        assert!(model.lookup("abc").is_empty());
    }
}
