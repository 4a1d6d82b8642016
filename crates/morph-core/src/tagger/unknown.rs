//! Unknown-word synthesis by character class.

use std::sync::Arc;

use crate::lattice::{AnalysisError, Lattice, NodeSpec};
use crate::settings::{UnknownClass, UnknownSettings};
use crate::unicode::{class_run_len, CharClass};

fn class_at<'a>(lattice: &Lattice, pos: usize, unknown: &'a UnknownSettings) -> &'a UnknownClass {
    let class = lattice
        .suffix(pos)
        .chars()
        .next()
        .map_or(CharClass::Other, CharClass::of);
    unknown.classes.for_class(class)
}

fn unknown_spec(
    pos: usize,
    end: usize,
    class: &UnknownClass,
    unknown: &UnknownSettings,
    feature: Arc<str>,
) -> NodeSpec {
    NodeSpec {
        begin: pos,
        end,
        left_id: unknown.left_id,
        right_id: unknown.right_id,
        word_cost: class.cost,
        feature,
        unknown: true,
    }
}

/// Add unknown-word nodes beginning at `pos`.
///
/// A single-character node is added when no dictionary node starts here.
/// Grouping classes also get one node over the whole same-class run, capped
/// at `max_group_length`, whether or not the dictionary matched. Nodes the
/// lattice's constraints reject are skipped. Returns the number added.
pub(crate) fn add_unknown_nodes(
    lattice: &mut Lattice,
    pos: usize,
    has_known: bool,
    unknown: &UnknownSettings,
) -> Result<usize, AnalysisError> {
    let class = class_at(lattice, pos, unknown);
    let mut lengths = Vec::with_capacity(2);
    if !has_known {
        lengths.push(1);
    }
    if class.group {
        let run = class_run_len(lattice.suffix(pos)).min(unknown.max_group_length);
        if run > 1 {
            lengths.push(run);
        }
    }

    let mut added = 0;
    for len in lengths {
        let end = pos + len;
        if !lattice.is_allowed(pos, end, &class.feature) {
            continue;
        }
        let spec = unknown_spec(pos, end, class, unknown, Arc::clone(&class.feature));
        lattice.add_node(spec)?;
        added += 1;
    }
    Ok(added)
}

/// Add one unknown node over a forced span that the model could not cover.
///
/// The node carries the forced feature, unless the pattern is only
/// wildcards, in which case the character class feature is used.
pub(crate) fn add_forced_node(
    lattice: &mut Lattice,
    pos: usize,
    end: usize,
    pattern: &str,
    unknown: &UnknownSettings,
) -> Result<(), AnalysisError> {
    let class = class_at(lattice, pos, unknown);
    let concrete = pattern.split(',').any(|f| !f.is_empty() && f != "*");
    let feature = if concrete {
        Arc::from(pattern)
    } else {
        Arc::clone(&class.feature)
    };
    lattice.add_node(unknown_spec(pos, end, class, unknown, feature))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::BoundaryConstraint;
    use crate::settings::settings;

    #[test]
    fn test_single_char_when_nothing_known() {
        let unknown = &settings().unknown;
        let mut lattice = Lattice::new();
        lattice.set_sentence("漢字");
        assert_eq!(add_unknown_nodes(&mut lattice, 0, false, unknown).unwrap(), 1);
        let id = lattice.begin_nodes(0).next().unwrap();
        let node = lattice.node(id);
        assert_eq!(node.end(), 1);
        assert_eq!(node.word_cost(), 9000);
        assert_eq!(node.feature(), "UNK,kanji");
        assert_eq!(node.status(), crate::lattice::NodeStatus::Unknown);
    }

    #[test]
    fn test_group_run_even_when_known() {
        let unknown = &settings().unknown;
        let mut lattice = Lattice::new();
        lattice.set_sentence("カタカナです");
        assert_eq!(add_unknown_nodes(&mut lattice, 0, true, unknown).unwrap(), 1);
        let ends: Vec<usize> = lattice
            .begin_nodes(0)
            .map(|id| lattice.node(id).end())
            .collect();
        assert_eq!(ends, vec![4]);
        assert_eq!(lattice.surface(lattice.begin_nodes(0).next().unwrap()), "カタカナ");
    }

    #[test]
    fn test_nothing_for_known_non_group_class() {
        let unknown = &settings().unknown;
        let mut lattice = Lattice::new();
        lattice.set_sentence("ひらがな");
        assert_eq!(add_unknown_nodes(&mut lattice, 0, true, unknown).unwrap(), 0);
    }

    #[test]
    fn test_constraints_filter_unknown_nodes() {
        let unknown = &settings().unknown;
        let mut lattice = Lattice::new();
        lattice.set_sentence("abcd");
        lattice
            .set_boundary_constraint(2, BoundaryConstraint::TokenBoundary)
            .unwrap();
        // the 4-char latin run crosses 2; only the 1-char node survives
        assert_eq!(add_unknown_nodes(&mut lattice, 0, false, unknown).unwrap(), 1);
    }

    #[test]
    fn test_forced_node_feature() {
        let unknown = &settings().unknown;
        let mut lattice = Lattice::new();
        lattice.set_sentence("abcd");
        lattice.set_feature_constraint(0, 2, "名詞,固有名詞").unwrap();
        lattice.set_feature_constraint(2, 4, "*").unwrap();
        add_forced_node(&mut lattice, 0, 2, "名詞,固有名詞", unknown).unwrap();
        add_forced_node(&mut lattice, 2, 4, "*", unknown).unwrap();
        let features: Vec<&str> = lattice
            .all_morphs()
            .into_iter()
            .map(|id| lattice.node(id).feature())
            .collect();
        assert_eq!(features, vec!["名詞,固有名詞", "UNK,alpha"]);
    }
}
