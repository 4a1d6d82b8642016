use std::sync::Arc;

/// Per-position segmentation constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryConstraint {
    #[default]
    Any,
    /// A token must begin or end here; no node may span across.
    TokenBoundary,
    /// The position is inside a forced token; no node may begin or end here.
    InsideToken,
}

/// A forced token: the node beginning at the constrained position must end
/// at `end` and carry a feature matching `feature`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureConstraint {
    pub end: usize,
    pub feature: Arc<str>,
}

/// Field-wise match on comma-separated features.
///
/// `*` in the pattern matches any field, and a pattern may name fewer
/// fields than the feature has. An empty pattern matches everything.
pub fn feature_matches(pattern: &str, feature: &str) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let mut fields = feature.split(',');
    pattern
        .split(',')
        .all(|want| match fields.next() {
            Some(have) => want == "*" || want == have,
            None => want == "*",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_and_prefix_match() {
        assert!(feature_matches("名詞,一般", "名詞,一般"));
        assert!(feature_matches("名詞", "名詞,一般,*,*"));
        assert!(!feature_matches("助詞", "名詞,一般"));
        assert!(!feature_matches("名詞,固有名詞", "名詞,一般"));
    }

    #[test]
    fn test_wildcards() {
        assert!(feature_matches("*", "名詞,一般"));
        assert!(feature_matches("*,一般", "名詞,一般"));
        assert!(!feature_matches("*,代名詞", "名詞,一般"));
        assert!(feature_matches("", "anything"));
    }

    #[test]
    fn test_pattern_longer_than_feature() {
        assert!(!feature_matches("名詞,一般,人名", "名詞,一般"));
        assert!(feature_matches("名詞,一般,*", "名詞,一般"));
    }
}
