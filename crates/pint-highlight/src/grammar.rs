//! Grammar descriptors for the highlighting engine.
//!
//! This module defines the declarative representation of a language: its
//! names, its keyword classes and its ordered match rules. Descriptors are
//! built by factories such as [`pint::pint`] or loaded from JSON with
//! [`parse_grammar`], and become usable once handed to a
//! [`Registry`](crate::Registry).

use facet::Facet;

pub mod pint;
pub mod rules;

pub use rules::{Modes, Rule, RuleKind};

/// Keyword class labels a grammar may declare, in highlight.js naming.
pub const KEYWORD_CLASSES: [&str; 4] = ["type", "keyword", "literal", "built_in"];

/// A factory producing a grammar from the engine's helper rules.
pub type LanguageFactory = fn(&Modes) -> Grammar;

/// A complete grammar descriptor for one language.
///
/// The descriptor is immutable data. Rule order is significant: when several
/// rules match at the same position the earlier one wins, and keyword classes
/// are consulted in declaration order.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct Grammar {
    /// Registry key for the language (e.g. `"pint"`).
    pub name: String,

    /// Human-readable name (e.g. `"Pint"`).
    #[facet(default)]
    pub display_name: Option<String>,

    /// Secondary registry keys.
    #[facet(default)]
    pub aliases: Vec<String>,

    /// Whether keyword lookup ignores case.
    #[facet(default)]
    pub case_insensitive: bool,

    /// Regex matching the lexemes looked up as keywords; `\w+` when unset.
    #[facet(default)]
    pub keyword_pattern: Option<String>,

    /// Keyword classes, consulted in order.
    #[facet(default)]
    pub keywords: Vec<KeywordClass>,

    /// Match rules, tried in order.
    #[facet(default)]
    pub rules: Vec<Rule>,

    /// Keep this grammar out of automatic language detection.
    #[facet(default)]
    pub disable_autodetect: bool,
}

/// A named bucket of literal words, such as the language's keywords.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct KeywordClass {
    /// The class label, one of [`KEYWORD_CLASSES`].
    pub class: String,

    /// Words tagged with `class`.
    pub words: Vec<String>,
}

impl KeywordClass {
    /// Builds a class from a whitespace-separated word list.
    #[must_use]
    pub fn from_words(class: &str, words: &str) -> Self {
        Self {
            class: class.to_string(),
            words: words.split_whitespace().map(str::to_string).collect(),
        }
    }
}

/// Parse a JSON grammar definition into a strongly typed [`Grammar`] structure.
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] if the provided string is not valid JSON
/// or fails schema deserialization.
pub fn parse_grammar(json: &str) -> Result<Grammar, GrammarError> {
    facet_json::from_str(json).map_err(|e| GrammarError::JsonParse(e.to_string()))
}

/// Possible errors raised while loading, compiling or using a grammar.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// The input JSON was syntactically invalid or structurally mismatched.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// A regular expression in the grammar failed to compile.
    #[error("invalid pattern `{pattern}` in {language}: {source}")]
    Pattern {
        /// Language being compiled.
        language: String,
        /// The offending regex source.
        pattern: String,
        /// The compiler's complaint.
        #[source]
        source: Box<regex::Error>,
    },

    /// A rule lacks a field its kind requires.
    #[error("{kind} rule in {language} is missing `{field}`")]
    MissingField {
        /// Language being compiled.
        language: String,
        /// Kind of the incomplete rule.
        kind: &'static str,
        /// The absent field.
        field: &'static str,
    },

    /// A `builtin` rule names a helper the engine does not provide.
    #[error("unknown builtin rule `{0}`")]
    UnknownBuiltin(String),

    /// No registered grammar answers to this name or alias.
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
}

impl Grammar {
    /// The name shown to readers, falling back to the registry key.
    #[must_use]
    pub fn title(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// The name followed by every alias.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Class labels in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.class.as_str())
    }

    /// Returns the class a word is tagged with: the first class listing it.
    #[must_use]
    pub fn keyword_class(&self, word: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|k| {
                k.words.iter().any(|w| {
                    if self.case_insensitive {
                        w.eq_ignore_ascii_case(word)
                    } else {
                        w == word
                    }
                })
            })
            .map(|k| k.class.as_str())
    }

    /// Serializes the descriptor back to JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        facet_json::to_string(self)
    }
}
