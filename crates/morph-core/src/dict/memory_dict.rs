use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lexime_trie::{DoubleArray, TrieSearch};
use tracing::debug;

use super::{DictEntry, DictError, Dictionary, SearchResult};

/// Surface → entries dictionary held in memory.
///
/// Surfaces are keys of a double-array trie; a key's value id indexes both
/// `surfaces` and `values`.
pub struct MemoryDictionary {
    trie: DoubleArray<u8>,
    surfaces: Vec<String>,
    values: Vec<Vec<DictEntry>>,
}

impl MemoryDictionary {
    /// Duplicate surfaces are merged; each entry list is sorted by cost
    /// (stable, so equal-cost entries keep their source order).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<DictEntry>)>) -> Self {
        let mut merged: BTreeMap<String, Vec<DictEntry>> = BTreeMap::new();
        for (surface, candidates) in entries {
            if surface.is_empty() {
                continue;
            }
            merged.entry(surface).or_default().extend(candidates);
        }
        for candidates in merged.values_mut() {
            candidates.sort_by_key(|e| e.cost);
        }

        // String order is byte order, which is what the trie expects.
        let (surfaces, values): (Vec<String>, Vec<Vec<DictEntry>>) = merged.into_iter().unzip();
        let keys: Vec<&[u8]> = surfaces.iter().map(|s| s.as_bytes()).collect();
        let trie = DoubleArray::<u8>::build(&keys);

        Self {
            trie,
            surfaces,
            values,
        }
    }

    /// Parse a MeCab-style CSV lexicon.
    ///
    /// Each line is `surface,left_id,right_id,cost,feature...`; everything
    /// after the fourth comma is kept verbatim as the feature string. Blank
    /// lines and lines starting with `#` are skipped.
    pub fn from_csv(text: &str) -> Result<Self, DictError> {
        let mut pairs = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (surface, entry) = parse_csv_line(line).map_err(|reason| DictError::Line {
                line: i + 1,
                reason,
            })?;
            pairs.push((surface.to_string(), vec![entry]));
        }
        let dict = Self::from_entries(pairs);
        let (surfaces, entries) = dict.stats();
        debug!(surfaces, entries, "lexicon loaded");
        Ok(dict)
    }

    pub fn open_csv(path: &Path) -> Result<Self, DictError> {
        Self::from_csv(&fs::read_to_string(path)?)
    }

    /// Iterate over all `(surface, entries)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DictEntry])> {
        self.surfaces
            .iter()
            .zip(&self.values)
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns (surface_count, entry_count).
    pub fn stats(&self) -> (usize, usize) {
        let surfaces = self.values.len();
        let entries: usize = self.values.iter().map(|v| v.len()).sum();
        (surfaces, entries)
    }
}

impl Default for MemoryDictionary {
    fn default() -> Self {
        Self::from_entries(Vec::new())
    }
}

impl fmt::Debug for MemoryDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (surfaces, entries) = self.stats();
        f.debug_struct("MemoryDictionary")
            .field("surfaces", &surfaces)
            .field("entries", &entries)
            .finish()
    }
}

fn parse_csv_line(line: &str) -> Result<(&str, DictEntry), String> {
    let mut fields = line.splitn(5, ',');
    let mut next = |name: &str| {
        fields
            .next()
            .map(str::trim)
            .ok_or_else(|| format!("missing field '{name}'"))
    };
    let surface = next("surface")?;
    let left_id = next("left_id")?;
    let right_id = next("right_id")?;
    let cost = next("cost")?;
    let feature = next("feature").unwrap_or("");

    if surface.is_empty() {
        return Err("empty surface".to_string());
    }
    let entry = DictEntry {
        left_id: left_id
            .parse()
            .map_err(|e| format!("invalid left_id '{left_id}': {e}"))?,
        right_id: right_id
            .parse()
            .map_err(|e| format!("invalid right_id '{right_id}': {e}"))?,
        cost: cost
            .parse()
            .map_err(|e| format!("invalid cost '{cost}': {e}"))?,
        feature: Arc::from(feature),
    };
    Ok((surface, entry))
}

impl Dictionary for MemoryDictionary {
    fn lookup(&self, surface: &str) -> Option<&[DictEntry]> {
        self.trie
            .exact_match(surface.as_bytes())
            .map(|id| self.values[id as usize].as_slice())
    }

    fn common_prefix_search(&self, query: &str) -> Vec<SearchResult<'_>> {
        self.trie
            .common_prefix_search(query.as_bytes())
            .map(|m| SearchResult {
                surface: self.surfaces[m.value_id as usize].as_str(),
                entries: self.values[m.value_id as usize].as_slice(),
            })
            .collect()
    }
}
