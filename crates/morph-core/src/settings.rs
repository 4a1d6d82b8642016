//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::unicode::CharClass;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub analysis: AnalysisSettings,
    pub lattice: LatticeSettings,
    pub nbest: NBestSettings,
    pub unknown: UnknownSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    pub theta: f64,
    pub unknown_word_fallback: bool,
    pub require_non_empty: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatticeSettings {
    /// 0 disables the bound.
    pub max_nodes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NBestSettings {
    pub default_n: usize,
    /// 0 disables the bound.
    pub max_frontier: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnknownSettings {
    pub left_id: u16,
    pub right_id: u16,
    pub max_group_length: usize,
    pub classes: UnknownClasses,
}

/// Unknown-word parameters, one table per character class.
#[derive(Debug, Clone, Deserialize)]
pub struct UnknownClasses {
    pub default: UnknownClass,
    pub hiragana: UnknownClass,
    pub katakana: UnknownClass,
    pub kanji: UnknownClass,
    pub latin: UnknownClass,
    pub digit: UnknownClass,
    pub symbol: UnknownClass,
    pub space: UnknownClass,
}

impl UnknownClasses {
    pub fn for_class(&self, class: CharClass) -> &UnknownClass {
        match class {
            CharClass::Hiragana => &self.hiragana,
            CharClass::Katakana => &self.katakana,
            CharClass::Kanji => &self.kanji,
            CharClass::Latin => &self.latin,
            CharClass::Digit => &self.digit,
            CharClass::Symbol => &self.symbol,
            CharClass::Space => &self.space,
            CharClass::Other => &self.default,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, &UnknownClass)> {
        [
            ("default", &self.default),
            ("hiragana", &self.hiragana),
            ("katakana", &self.katakana),
            ("kanji", &self.kanji),
            ("latin", &self.latin),
            ("digit", &self.digit),
            ("symbol", &self.symbol),
            ("space", &self.space),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnknownClass {
    pub cost: i64,
    /// Also emit one node covering the whole run of same-class characters.
    pub group: bool,
    pub feature: Arc<str>,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings =
        toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_positive_usize {
        ($section:ident . $field:ident) => {
            if s.$section.$field == 0 {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        };
    }

    if !(s.analysis.theta.is_finite() && s.analysis.theta > 0.0) {
        return Err(SettingsError::InvalidValue {
            field: "analysis.theta".to_string(),
            reason: "must be a positive finite number".to_string(),
        });
    }

    check_positive_usize!(nbest.default_n);
    check_positive_usize!(unknown.max_group_length);

    for (name, class) in s.unknown.classes.iter() {
        if class.cost < 0 {
            return Err(SettingsError::InvalidValue {
                field: format!("unknown.classes.{name}.cost"),
                reason: "must be non-negative".to_string(),
            });
        }
        if class.feature.is_empty() {
            return Err(SettingsError::InvalidValue {
                field: format!("unknown.classes.{name}.feature"),
                reason: "must not be empty".to_string(),
            });
        }
    }

    Ok(())
}
