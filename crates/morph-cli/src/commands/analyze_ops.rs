use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::sync::Arc;

use morph_core::{
    AnalysisError, ConnectionMatrix, DictError, DictionaryModel, Lattice, MemoryDictionary,
    Morpheme, NBestStats, RequestType, Tagger, TaggerOptions,
};
use serde::Serialize;
use tracing::debug;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// Resources and knobs shared by every analysis subcommand.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub dict: String,
    pub matrix: Option<String>,
    pub theta: Option<f64>,
    pub no_unknown: bool,
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load lexicon {path}: {source}")]
    Lexicon {
        path: String,
        #[source]
        source: DictError,
    },
    #[error("failed to load matrix {path}: {source}")]
    Matrix {
        path: String,
        #[source]
        source: DictError,
    },
    #[error("invalid theta {0}: must be a positive finite number")]
    Theta(f64),
}

pub fn load_tagger(opts: &AnalyzeOptions) -> Result<Tagger, LoadError> {
    let dict = MemoryDictionary::open_csv(Path::new(&opts.dict)).map_err(|source| {
        LoadError::Lexicon {
            path: opts.dict.clone(),
            source,
        }
    })?;
    let conn = match &opts.matrix {
        Some(path) => Some(ConnectionMatrix::open_text(Path::new(path)).map_err(|source| {
            LoadError::Matrix {
                path: path.clone(),
                source,
            }
        })?),
        None => None,
    };

    let mut options = TaggerOptions::default();
    if let Some(theta) = opts.theta {
        if !(theta.is_finite() && theta > 0.0) {
            return Err(LoadError::Theta(theta));
        }
        options.theta = theta;
    }
    if opts.no_unknown {
        options.unknown_word_fallback = false;
    }

    debug!(
        dict = %opts.dict,
        matrix = conn.is_some(),
        theta = options.theta,
        "tagger ready"
    );
    Ok(Tagger::with_options(
        Arc::new(DictionaryModel::new(dict, conn)),
        options,
    ))
}

/// The sentence given on the command line, or every line of stdin.
fn input_lines(text: Option<String>) -> Vec<String> {
    match text {
        Some(t) => vec![t],
        None => io::stdin()
            .lock()
            .lines()
            .map(|line| die!(line, "Error reading stdin: {}"))
            .collect(),
    }
}

pub fn write_morphs(out: &mut impl Write, morphs: &[Morpheme]) -> io::Result<()> {
    for m in morphs {
        writeln!(out, "{}\t{}", m.surface, m.feature)?;
    }
    writeln!(out, "EOS")
}

pub fn write_all_morphs(out: &mut impl Write, morphs: &[Morpheme]) -> io::Result<()> {
    for m in morphs {
        write!(out, "{}\t{}\t{}\t{}", m.surface, m.feature, m.begin, m.end)?;
        match m.prob {
            Some(p) => writeln!(out, "\t{p:.6}")?,
            None => writeln!(out)?,
        }
    }
    writeln!(out, "EOS")
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", die!(serde_json::to_string(value), "JSON error: {}"));
}

fn report(sentence: &str, err: &AnalysisError) {
    eprintln!("Error analyzing {sentence:?}: {err}");
}

pub fn parse(opts: &AnalyzeOptions, text: Option<String>) {
    let tagger = die!(load_tagger(opts), "Error: {}");
    let mut failed = false;
    let stdout = io::stdout();
    for line in input_lines(text) {
        match tagger.parse_str(&line) {
            Ok(morphs) if opts.json => print_json(&morphs),
            Ok(morphs) => die!(write_morphs(&mut stdout.lock(), &morphs), "Error: {}"),
            Err(e) => {
                report(&line, &e);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

#[derive(Serialize)]
struct NBestOutput {
    paths: Vec<Vec<Morpheme>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<NBestStats>,
}

fn nbest_one(
    tagger: &Tagger,
    lattice: &mut Lattice,
    sentence: &str,
    n: usize,
) -> Result<NBestOutput, AnalysisError> {
    lattice.set_sentence(sentence);
    tagger.parse(lattice)?;
    let paths = lattice.enum_nbest(n)?;
    Ok(NBestOutput {
        paths: paths
            .iter()
            .map(|path| Morpheme::from_path(lattice, path))
            .collect(),
        stats: lattice.nbest_stats(),
    })
}

pub fn nbest(opts: &AnalyzeOptions, text: Option<String>, n: Option<usize>, stats: bool) {
    let tagger = die!(load_tagger(opts), "Error: {}");
    let n = n.unwrap_or_else(|| morph_core::settings::settings().nbest.default_n);
    let mut request = RequestType::nbest();
    if stats {
        request = request.with_nbest_stats();
    }
    let mut lattice = tagger.new_lattice();
    lattice.set_request_type(request);

    let mut failed = false;
    let stdout = io::stdout();
    for line in input_lines(text) {
        match nbest_one(&tagger, &mut lattice, &line, n) {
            Ok(output) if opts.json => print_json(&output),
            Ok(output) => {
                let mut out = stdout.lock();
                for path in &output.paths {
                    die!(write_morphs(&mut out, path), "Error: {}");
                }
                if let Some(s) = output.stats {
                    eprintln!(
                        "pushed={} popped={} emitted={} peak_frontier={}",
                        s.pushed, s.popped, s.emitted, s.peak_frontier
                    );
                }
            }
            Err(e) => {
                report(&line, &e);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

pub fn morphs(opts: &AnalyzeOptions, text: Option<String>, marginals: bool) {
    let tagger = die!(load_tagger(opts), "Error: {}");
    let mut request = RequestType::one_best().with_all_morphs();
    if marginals {
        request = request.with_marginal_prob();
    }
    let mut lattice = tagger.new_lattice();
    lattice.set_request_type(request);

    let mut failed = false;
    let stdout = io::stdout();
    for line in input_lines(text) {
        lattice.set_sentence(&line);
        let result = tagger
            .parse(&mut lattice)
            .and_then(|()| tagger.morphemes(&lattice));
        match result {
            Ok(morphs) if opts.json => print_json(&morphs),
            Ok(morphs) => die!(write_all_morphs(&mut stdout.lock(), &morphs), "Error: {}"),
            Err(e) => {
                report(&line, &e);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

/// Analyze one partially annotated sentence read from `file` (`-` for stdin).
pub fn partial(opts: &AnalyzeOptions, file: &str) {
    let tagger = die!(load_tagger(opts), "Error: {}");
    let input = if file == "-" {
        die!(io::read_to_string(io::stdin()), "Error reading stdin: {}")
    } else {
        die!(fs::read_to_string(file), "Error reading {file}: {}")
    };
    let morphs = die!(tagger.parse_partial(&input), "Error: {}");
    if opts.json {
        print_json(&morphs);
    } else {
        die!(write_morphs(&mut io::stdout().lock(), &morphs), "Error: {}");
    }
}
