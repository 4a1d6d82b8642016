use std::fmt;
use std::str::FromStr;

/// Whether a lattice is consumed as a single best path or as a ranked
/// stream of paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    OneBest,
    NBest,
}

/// What the caller wants out of an analysis.
///
/// The search mode is exclusive; the remaining flags combine freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestType {
    pub mode: SearchMode,
    /// Honor feature constraints by synthesizing nodes for spans the model
    /// cannot cover.
    pub partial: bool,
    /// Compute α/β, Z and per-node marginal probabilities.
    pub marginal_prob: bool,
    /// Keep every node, not just the best path, for output.
    pub all_morphs: bool,
    /// Record A* counters while enumerating N-best paths.
    pub nbest_stats: bool,
}

impl RequestType {
    pub fn one_best() -> Self {
        Self::default()
    }

    pub fn nbest() -> Self {
        Self {
            mode: SearchMode::NBest,
            ..Self::default()
        }
    }

    pub fn with_partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn with_marginal_prob(mut self) -> Self {
        self.marginal_prob = true;
        self
    }

    pub fn with_all_morphs(mut self) -> Self {
        self.all_morphs = true;
        self
    }

    pub fn with_nbest_stats(mut self) -> Self {
        self.nbest_stats = true;
        self
    }

    pub fn is_nbest(&self) -> bool {
        self.mode == SearchMode::NBest
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            SearchMode::OneBest => "one-best",
            SearchMode::NBest => "nbest",
        };
        f.write_str(mode)?;
        let flags = [
            (self.partial, "partial"),
            (self.marginal_prob, "marginal-prob"),
            (self.all_morphs, "all-morphs"),
            (self.nbest_stats, "nbest-stats"),
        ];
        for (_, name) in flags.iter().filter(|(on, _)| *on) {
            write!(f, "|{name}")?;
        }
        Ok(())
    }
}

/// Parses the `|`-separated form produced by `Display`, e.g.
/// `nbest|partial|marginal-prob`. An omitted mode means one-best.
impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut req = RequestType::default();
        for flag in s.split('|').map(str::trim).filter(|f| !f.is_empty()) {
            match flag {
                "one-best" => req.mode = SearchMode::OneBest,
                "nbest" => req.mode = SearchMode::NBest,
                "partial" => req.partial = true,
                "marginal-prob" => req.marginal_prob = true,
                "all-morphs" => req.all_morphs = true,
                "nbest-stats" => req.nbest_stats = true,
                other => return Err(format!("unknown request flag '{other}'")),
            }
        }
        Ok(req)
    }
}
