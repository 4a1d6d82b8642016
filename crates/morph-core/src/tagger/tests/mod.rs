
use std::sync::Arc;

use super::{Tagger, TaggerOptions};
use crate::testutil::test_model;

const SUMOMO: &str = "すもももももももものうち";

fn make_tagger() -> Tagger {
    Tagger::new(Arc::new(test_model()))
}

fn make_tagger_with(f: impl FnOnce(&mut TaggerOptions)) -> Tagger {
    let mut options = TaggerOptions::default();
    f(&mut options);
    Tagger::with_options(Arc::new(test_model()), options)
}
