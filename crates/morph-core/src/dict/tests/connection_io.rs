use crate::dict::{ConnectionMatrix, DictError};

#[test]
fn test_from_text_dense() {
    let text = "2\n0\n1\n2\n3\n";
    let m = ConnectionMatrix::from_text(text).unwrap();
    assert_eq!(m.num_left(), 2);
    assert_eq!(m.num_right(), 2);
    assert_eq!(m.cost(0, 1), 1);
    assert_eq!(m.cost(1, 0), 2);
    assert_eq!(m.cost(1, 1), 3);
}

#[test]
fn test_from_text_mecab_triplets() {
    let text = "2 3\n0 0 -5\n0 2 7\n1 1 100\n";
    let m = ConnectionMatrix::from_text(text).unwrap();
    assert_eq!(m.num_left(), 2);
    assert_eq!(m.num_right(), 3);
    assert_eq!(m.cost(0, 0), -5);
    assert_eq!(m.cost(0, 2), 7);
    assert_eq!(m.cost(1, 1), 100);
    // Unlisted cell
    assert_eq!(m.cost(1, 2), 0);
}

#[test]
fn test_from_text_dense_wrong_count() {
    let err = ConnectionMatrix::from_text("2\n0\n1\n2\n").unwrap_err();
    assert!(err.to_string().contains("expected 4 costs"));
}

#[test]
fn test_from_text_triplet_out_of_bounds() {
    let err = ConnectionMatrix::from_text("2 2\n0 0 1\n2 0 1\n").unwrap_err();
    match err {
        DictError::Line { line, reason } => {
            assert_eq!(line, 3);
            assert!(reason.contains("out of bounds"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_from_text_triplet_cost_overflow() {
    let err = ConnectionMatrix::from_text("1 1\n0 0 40000\n").unwrap_err();
    assert!(err.to_string().contains("i16"));
}

#[test]
fn test_from_text_empty() {
    assert!(matches!(
        ConnectionMatrix::from_text(""),
        Err(DictError::Parse(_))
    ));
}

#[test]
fn test_from_text_bad_header() {
    let err = ConnectionMatrix::from_text("1 2 3\n").unwrap_err();
    assert!(err.to_string().contains("header"));
}
