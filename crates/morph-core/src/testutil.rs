#![cfg(test)]

use std::sync::Arc;

use crate::dict::{ConnectionMatrix, DictEntry, MemoryDictionary};
use crate::model::DictionaryModel;

pub const NOUN: u16 = 1;
pub const PARTICLE: u16 = 2;

fn entry(id: u16, cost: i16, feature: &str) -> DictEntry {
    DictEntry {
        cost,
        left_id: id,
        right_id: id,
        feature: Arc::from(feature),
    }
}

/// Shared test dictionary: enough entries to analyze
/// "すもももももももものうち" the classic way.
pub fn test_dict() -> MemoryDictionary {
    MemoryDictionary::from_entries(vec![
        (
            "すもも".to_string(),
            vec![entry(NOUN, 3000, "名詞,一般")],
        ),
        ("もも".to_string(), vec![entry(NOUN, 3000, "名詞,一般")]),
        (
            "も".to_string(),
            vec![
                entry(NOUN, 6000, "名詞,一般"),
                entry(PARTICLE, 2000, "助詞,係助詞"),
            ],
        ),
        ("の".to_string(), vec![entry(PARTICLE, 1500, "助詞,連体化")]),
        ("うち".to_string(), vec![entry(NOUN, 3000, "名詞,非自立")]),
    ])
}

/// 3×3 matrix over ids 0 (BOS/EOS and unknown), 1 (noun), 2 (particle).
/// Noun after noun costs 1000, particle after particle 500.
pub fn test_matrix() -> ConnectionMatrix {
    #[rustfmt::skip]
    let costs = vec![
        0, 0,    0,
        0, 1000, 0,
        0, 0,    500,
    ];
    ConnectionMatrix::new(3, 3, costs).expect("3x3 matrix")
}

pub fn test_model() -> DictionaryModel {
    DictionaryModel::new(test_dict(), Some(test_matrix()))
}

/// Unigram model (no matrix) from `(surface, cost)` pairs, all with ids 0.
pub fn unigram_model(words: &[(&str, i16)]) -> DictionaryModel {
    let dict = MemoryDictionary::from_entries(words.iter().map(|&(surface, cost)| {
        (
            surface.to_string(),
            vec![entry(0, cost, &format!("W,{surface}"))],
        )
    }));
    DictionaryModel::new(dict, None)
}
