use std::sync::Arc;

use crate::dict::{DictEntry, DictError, Dictionary, MemoryDictionary};

fn entry(cost: i16, id: u16, feature: &str) -> DictEntry {
    DictEntry {
        cost,
        left_id: id,
        right_id: id,
        feature: Arc::from(feature),
    }
}

fn sample_dict() -> MemoryDictionary {
    MemoryDictionary::from_entries(vec![
        ("東".to_string(), vec![entry(4000, 1, "名詞,方角")]),
        (
            "東京".to_string(),
            vec![
                entry(3000, 2, "名詞,固有名詞,地域"),
                entry(2500, 3, "名詞,固有名詞,組織"),
            ],
        ),
        ("東京都".to_string(), vec![entry(3500, 2, "名詞,固有名詞,地域")]),
        ("京都".to_string(), vec![entry(3000, 2, "名詞,固有名詞,地域")]),
    ])
}

#[test]
fn test_lookup_exact() {
    let dict = sample_dict();
    let results = dict.lookup("東京").unwrap();
    assert_eq!(results.len(), 2);
    // Sorted by cost
    assert_eq!(results[0].cost, 2500);
    assert_eq!(results[1].cost, 3000);
    assert!(dict.lookup("都").is_none());
}

#[test]
fn test_common_prefix_search_shortest_first() {
    let dict = sample_dict();
    let hits = dict.common_prefix_search("東京都庁");
    let surfaces: Vec<&str> = hits.iter().map(|h| h.surface).collect();
    assert_eq!(surfaces, vec!["東", "東京", "東京都"]);
    assert_eq!(hits[1].entries.len(), 2);
}

#[test]
fn test_common_prefix_search_no_match() {
    let dict = sample_dict();
    assert!(dict.common_prefix_search("大阪").is_empty());
    assert!(dict.common_prefix_search("").is_empty());
}

#[test]
fn test_from_csv_keeps_feature_commas() {
    let csv = "\
# comment
東京,2,2,3000,名詞,固有名詞,地域,*,*,*,東京,トウキョウ
は,5,5,1000,助詞,係助詞

京都,2,2,3000,名詞,固有名詞,地域
";
    let dict = MemoryDictionary::from_csv(csv).unwrap();
    assert_eq!(dict.stats(), (3, 3));
    let tokyo = &dict.lookup("東京").unwrap()[0];
    assert_eq!(tokyo.left_id, 2);
    assert_eq!(tokyo.cost, 3000);
    assert_eq!(&*tokyo.feature, "名詞,固有名詞,地域,*,*,*,東京,トウキョウ");
}

#[test]
fn test_from_csv_duplicate_surfaces_merge() {
    let csv = "は,5,5,1000,助詞,係助詞\nは,6,6,900,動詞,自立\n";
    let dict = MemoryDictionary::from_csv(csv).unwrap();
    let entries = dict.lookup("は").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].cost, 900);
}

#[test]
fn test_from_csv_reports_line() {
    let csv = "東京,2,2,3000,名詞\n京都,x,2,3000,名詞\n";
    let err = MemoryDictionary::from_csv(csv).unwrap_err();
    match err {
        DictError::Line { line, reason } => {
            assert_eq!(line, 2);
            assert!(reason.contains("left_id"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_from_csv_missing_fields() {
    let err = MemoryDictionary::from_csv("東京,2,2\n").unwrap_err();
    assert!(err.to_string().contains("cost"));
}

#[test]
fn test_iter_in_key_order() {
    let dict = sample_dict();
    let keys: Vec<&str> = dict.iter().map(|(k, _)| k).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert_eq!(keys.len(), 4);
}

#[test]
fn test_prefix_hits_agree_with_exact_lookup() {
    let dict = MemoryDictionary::from_entries(
        ["す", "すも", "すもも", "も", "もも", "ももの", "の"]
            .iter()
            .enumerate()
            .map(|(i, s)| (s.to_string(), vec![entry(i as i16 * 100, 1, "名詞")])),
    );
    let query = "すもものうち";
    let hits = dict.common_prefix_search(query);
    let surfaces: Vec<&str> = hits.iter().map(|h| h.surface).collect();
    assert_eq!(surfaces, vec!["す", "すも", "すもも"]);
    for hit in &hits {
        assert!(query.starts_with(hit.surface));
        assert_eq!(dict.lookup(hit.surface), Some(hit.entries));
    }
    assert!(dict.lookup("もものう").is_none());
}

#[test]
fn test_empty_dictionary() {
    let dict = MemoryDictionary::default();
    assert_eq!(dict.stats(), (0, 0));
    assert!(dict.lookup("東").is_none());
    assert!(dict.common_prefix_search("東京").is_empty());
    assert_eq!(dict.iter().count(), 0);
}
