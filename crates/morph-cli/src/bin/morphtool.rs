use clap::{Args, Parser, Subcommand};

use morph_cli::commands::analyze_ops::{self, AnalyzeOptions};
use morph_cli::commands::config_ops;

#[derive(Parser)]
#[command(name = "morphtool", about = "Lattice morphological analyzer")]
struct Cli {
    /// Log analysis spans to stderr (filter with RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,
    /// Settings TOML overriding the embedded defaults
    #[arg(long, global = true)]
    settings: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Resources {
    /// Lexicon CSV (surface,left_id,right_id,cost,feature...)
    #[arg(long)]
    dict: String,
    /// Connection matrix (matrix.def or dense text)
    #[arg(long)]
    matrix: Option<String>,
    /// Softmax temperature for marginal probabilities
    #[arg(long)]
    theta: Option<f64>,
    /// Disable unknown-word nodes
    #[arg(long)]
    no_unknown: bool,
    /// Output JSON (one document per input line)
    #[arg(long)]
    json: bool,
}

impl Resources {
    fn into_options(self) -> AnalyzeOptions {
        AnalyzeOptions {
            dict: self.dict,
            matrix: self.matrix,
            theta: self.theta,
            no_unknown: self.no_unknown,
            json: self.json,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the best analysis of each line
    Parse {
        #[command(flatten)]
        res: Resources,
        /// Sentence to analyze (reads lines from stdin if omitted)
        text: Option<String>,
    },
    /// Print the N cheapest analyses of each line
    Nbest {
        #[command(flatten)]
        res: Resources,
        /// Number of analyses (defaults to nbest.default_n)
        #[arg(short)]
        n: Option<usize>,
        /// Report search statistics
        #[arg(long)]
        stats: bool,
        /// Sentence to analyze (reads lines from stdin if omitted)
        text: Option<String>,
    },
    /// Print every morpheme on some complete path
    Morphs {
        #[command(flatten)]
        res: Resources,
        /// Attach marginal probabilities
        #[arg(long)]
        marginals: bool,
        /// Sentence to analyze (reads lines from stdin if omitted)
        text: Option<String>,
    },
    /// Analyze partially annotated input (`surface<TAB>feature` lines)
    Partial {
        #[command(flatten)]
        res: Resources,
        /// Input file, or `-` for stdin
        file: String,
    },
    /// Print the default settings TOML
    SettingsExport,
    /// Validate a settings TOML file
    SettingsValidate {
        /// Settings file
        file: String,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("morph_core=debug")),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init_tracing();
    }
    if let Some(ref file) = cli.settings {
        config_ops::settings_load(file);
    }

    match cli.command {
        Command::Parse { res, text } => analyze_ops::parse(&res.into_options(), text),
        Command::Nbest {
            res,
            n,
            stats,
            text,
        } => analyze_ops::nbest(&res.into_options(), text, n, stats),
        Command::Morphs {
            res,
            marginals,
            text,
        } => analyze_ops::morphs(&res.into_options(), text, marginals),
        Command::Partial { res, file } => analyze_ops::partial(&res.into_options(), &file),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
