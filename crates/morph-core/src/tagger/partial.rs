use crate::lattice::{AnalysisError, Lattice};

/// Load partial (pre-annotated) input into `lattice`.
///
/// Each line contributes its surface to the sentence. A line of the form
/// `surface\tfeature` forces that surface to be a single token whose
/// feature matches `feature`; an empty feature or `*` forces only the
/// token boundaries. Lines without a tab are analyzed freely.
///
/// The partial flag is added to the lattice's request type.
pub fn set_partial_input(lattice: &mut Lattice, input: &str) -> Result<(), AnalysisError> {
    let mut sentence = String::new();
    let mut spans = Vec::new();
    let mut pos = 0;
    for line in input.lines() {
        let line = line.trim_end_matches('\r');
        let (surface, feature) = match line.split_once('\t') {
            Some((surface, feature)) => (surface, Some(feature.trim())),
            None => (line, None),
        };
        let len = surface.chars().count();
        if len == 0 {
            continue;
        }
        sentence.push_str(surface);
        if let Some(feature) = feature {
            let feature = if feature.is_empty() { "*" } else { feature };
            spans.push((pos, pos + len, feature));
        }
        pos += len;
    }

    let mut request = lattice.request_type();
    request.partial = true;
    lattice.set_request_type(request);
    lattice.set_sentence(&sentence);
    for (begin, end, feature) in spans {
        lattice.set_feature_constraint(begin, end, feature)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::BoundaryConstraint;

    #[test]
    fn test_partial_lines_become_constraints() {
        let mut lattice = Lattice::new();
        set_partial_input(&mut lattice, "すもも\t名詞\nもも\nもも\t\nの").unwrap();
        assert_eq!(lattice.sentence(), "すももももももの");
        assert_eq!(lattice.len(), 8);
        assert!(lattice.request_type().partial);
        assert_eq!(lattice.feature_constraint(0), Some((3, "名詞")));
        assert_eq!(lattice.feature_constraint(3), None);
        assert_eq!(lattice.feature_constraint(5), Some((7, "*")));
        assert_eq!(lattice.boundary_constraint(4), BoundaryConstraint::Any);
        assert_eq!(lattice.boundary_constraint(6), BoundaryConstraint::InsideToken);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut lattice = Lattice::new();
        set_partial_input(&mut lattice, "\nab\r\n\ncd\tX\n").unwrap();
        assert_eq!(lattice.sentence(), "abcd");
        assert_eq!(lattice.feature_constraint(2), Some((4, "X")));
    }
}
