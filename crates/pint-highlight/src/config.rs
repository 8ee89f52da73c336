//! Engine options.
//!
//! Options mirror the subset of highlight.js's `configure` call that makes
//! sense outside a browser. They can be built in code or loaded from JSON:
//!
//! ```json
//! { "class_prefix": "hl-", "languages": ["pint"] }
//! ```

use facet::Facet;

use crate::GrammarError;

/// Class prefix used when none is configured.
pub const DEFAULT_CLASS_PREFIX: &str = "hljs-";

/// Options shared by the registry and the document renderer.
#[derive(Debug, Clone, Default, PartialEq, Facet)]
pub struct Options {
    /// Prefix put in front of every emitted class; `hljs-` when unset.
    #[facet(default)]
    pub class_prefix: Option<String>,

    /// Languages considered by auto-detection; every registered one when unset.
    #[facet(default)]
    pub languages: Option<Vec<String>>,

    /// Skip the warning for code blocks that contain unescaped markup.
    #[facet(default)]
    pub ignore_unescaped_html: bool,
}

impl Options {
    /// Parses options from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::JsonParse`] when the input does not describe
    /// an options object.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        facet_json::from_str(json).map_err(|e| GrammarError::JsonParse(e.to_string()))
    }

    /// The configured class prefix.
    #[must_use]
    pub fn class_prefix(&self) -> &str {
        self.class_prefix.as_deref().unwrap_or(DEFAULT_CLASS_PREFIX)
    }
}
