use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use morph_core::{ConnectionMatrix, DictionaryModel, MemoryDictionary, RequestType, Tagger};

const LEXICON: &str = "\
すもも,1,1,3000,名詞,一般
もも,1,1,3000,名詞,一般
も,2,2,2000,助詞,係助詞
も,1,1,6000,名詞,一般
の,2,2,1500,助詞,連体化
うち,1,1,3000,名詞,非自立
わたし,1,1,3000,名詞,代名詞
は,2,2,2000,助詞,係助詞
きょう,1,1,3000,名詞,副詞可能
きょう,1,1,5000,名詞,固有名詞
いい,3,3,3500,形容詞,自立
てんき,1,1,4000,名詞,一般
てん,1,1,5000,名詞,一般
き,1,1,4500,名詞,一般
です,4,4,2500,助動詞
ね,2,2,2000,助詞,終助詞
だ,4,4,2500,助動詞
と,2,2,2000,助詞,格助詞
おもい,3,3,3500,動詞,自立
おもいます,3,3,3200,動詞,自立
ます,4,4,2500,助動詞
";

// matrix.def over BOS/EOS, noun, particle, predicate, auxiliary
const MATRIX: &str = "\
5 5
1 1 1000
1 3 200
1 4 300
2 2 500
2 4 800
3 2 100
3 3 700
4 1 200
4 3 600
4 4 900
";

fn bench_tagger() -> Tagger {
    let dict = MemoryDictionary::from_csv(LEXICON).expect("lexicon");
    let conn = ConnectionMatrix::from_text(MATRIX).expect("matrix");
    Tagger::new(Arc::new(DictionaryModel::new(dict, Some(conn))))
}

static INPUTS: &[(&str, &str)] = &[
    ("short", "すもも"),
    ("medium", "すもももももももものうち"),
    ("long", "わたしはきょうはいいてんきだとおもいますね"),
];

fn bench_best(c: &mut Criterion) {
    let tagger = bench_tagger();
    let mut group = c.benchmark_group("analyze/best");
    for &(label, text) in INPUTS {
        group.bench_with_input(BenchmarkId::new(label, text.len()), &text, |b, &text| {
            b.iter(|| tagger.parse_str(text).expect("analysis"));
        });
    }
    group.finish();
}

fn bench_nbest(c: &mut Criterion) {
    let tagger = bench_tagger();
    let mut lattice = tagger.new_lattice();
    lattice.set_request_type(RequestType::nbest());
    let mut group = c.benchmark_group("analyze/nbest10");
    for &(label, text) in INPUTS {
        group.bench_with_input(BenchmarkId::new(label, text.len()), &text, |b, &text| {
            b.iter(|| {
                lattice.set_sentence(text);
                tagger.parse(&mut lattice).expect("analysis");
                lattice.enum_nbest(10).expect("nbest")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_best, bench_nbest);
criterion_main!(benches);
