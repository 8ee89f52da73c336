//! Core types for representing match rules.
//!
//! This module contains the types used to model the rules of a grammar and
//! the helper rules the engine ships with, following highlight.js's mode
//! vocabulary.

use facet::Facet;

/// A single match rule inside a grammar.
///
/// Rules are flat records identified by a [`RuleKind`]; each kind reads only
/// the fields it needs. When matched, a rule tags its span with `class_name`.
///
/// Rules form a tree through `contains`: a bounded or comment rule opens a
/// mode in which its children are tried before its end pattern.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct Rule {
    /// The discriminant identifying what kind of rule this is.
    pub kind: RuleKind,

    /// Highlight class applied to the matched span (e.g. `"string"`).
    #[facet(default)]
    pub class_name: Option<String>,

    /// Begin pattern, or the comment start marker for comment rules.
    #[facet(default)]
    pub begin: Option<String>,

    /// End pattern used by `bounded` rules.
    #[facet(default)]
    pub end: Option<String>,

    /// Alternative begin patterns for `pattern` rules.
    #[facet(default)]
    pub variants: Vec<String>,

    /// Pattern that aborts highlighting when it appears inside the rule.
    #[facet(default)]
    pub illegal: Option<String>,

    /// Leave the begin match outside the emitted span.
    #[facet(default)]
    pub exclude_begin: bool,

    /// Leave the end match outside the emitted span.
    #[facet(default)]
    pub exclude_end: bool,

    /// Weight added to the language-detection score on each match.
    ///
    /// `None` means the engine default of 1.
    #[facet(default)]
    pub relevance: Option<u32>,

    /// Name of the helper rule referenced by a `builtin` rule.
    #[facet(default)]
    pub name: Option<String>,

    /// Nested rules tried inside this rule's span.
    #[facet(default)]
    pub contains: Vec<Rule>,
}

/// The enumeration of rule shapes a grammar may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[repr(u8)]
pub enum RuleKind {
    /// Starts at a marker and runs to the end of the line.
    #[facet(rename = "comment")]
    Comment,
    /// A begin pattern only; the span is exactly the match.
    #[facet(rename = "prefix")]
    Prefix,
    /// A begin and an end pattern.
    #[facet(rename = "bounded")]
    Bounded,
    /// A regular expression, or a set of alternatives, with a relevance.
    #[facet(rename = "pattern")]
    Pattern,
    /// A reference to one of the engine's helper rules.
    #[facet(rename = "builtin")]
    Builtin,
}

/// Relevance used when a rule does not declare one.
pub const DEFAULT_RELEVANCE: u32 = 1;

/// Number literals in C-like languages.
pub const C_NUMBER_RE: &str = r"(-?)(\b0[xX][a-fA-F0-9]+|(\b\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?)";

/// Documentation tags highlighted inside comments.
const DOCTAG_RE: &str = r"\b(?:TODO|FIXME|NOTE|BUG|OPTIMIZE|HACK|XXX):";

impl RuleKind {
    /// Returns the canonical string name of this rule kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Comment => "comment",
            RuleKind::Prefix => "prefix",
            RuleKind::Bounded => "bounded",
            RuleKind::Pattern => "pattern",
            RuleKind::Builtin => "builtin",
        }
    }
}

impl Rule {
    fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            class_name: None,
            begin: None,
            end: None,
            variants: Vec::new(),
            illegal: None,
            exclude_begin: false,
            exclude_end: false,
            relevance: None,
            name: None,
            contains: Vec::new(),
        }
    }

    /// A comment running from the `marker` pattern to the end of the line.
    #[must_use]
    pub fn comment(marker: &str) -> Self {
        Self {
            class_name: Some("comment".into()),
            begin: Some(marker.into()),
            ..Self::new(RuleKind::Comment)
        }
    }

    /// A span consisting of the `begin` match alone.
    #[must_use]
    pub fn prefix(class_name: &str, begin: &str) -> Self {
        Self {
            class_name: Some(class_name.into()),
            begin: Some(begin.into()),
            ..Self::new(RuleKind::Prefix)
        }
    }

    /// A span from `begin` through `end`.
    #[must_use]
    pub fn bounded(class_name: &str, begin: &str, end: &str) -> Self {
        Self {
            class_name: Some(class_name.into()),
            begin: Some(begin.into()),
            end: Some(end.into()),
            ..Self::new(RuleKind::Bounded)
        }
    }

    /// A span matching any one of `variants`.
    #[must_use]
    pub fn pattern<I, S>(class_name: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_name: Some(class_name.into()),
            variants: variants.into_iter().map(Into::into).collect(),
            ..Self::new(RuleKind::Pattern)
        }
    }

    /// A reference to the helper rule called `name`.
    #[must_use]
    pub fn builtin(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(RuleKind::Builtin)
        }
    }

    /// Sets the relevance weight.
    #[must_use]
    pub fn with_relevance(mut self, relevance: u32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    /// Sets the illegal pattern.
    #[must_use]
    pub fn with_illegal(mut self, illegal: &str) -> Self {
        self.illegal = Some(illegal.into());
        self
    }

    /// Sets whether the begin and end matches are left out of the span.
    #[must_use]
    pub fn excluding(mut self, begin: bool, end: bool) -> Self {
        self.exclude_begin = begin;
        self.exclude_end = end;
        self
    }

    /// Appends nested rules.
    #[must_use]
    pub fn containing(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.contains.extend(rules);
        self
    }

    /// The relevance this rule contributes, with the default applied.
    #[must_use]
    pub fn effective_relevance(&self) -> u32 {
        self.relevance.unwrap_or(DEFAULT_RELEVANCE)
    }

    /// Returns `true` if the rule opens a mode that must be closed by an end match.
    #[must_use]
    pub fn has_end(&self) -> bool {
        matches!(self.kind, RuleKind::Comment | RuleKind::Bounded)
    }

    /// Every regex source this rule declares, nested rules excluded.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        out.extend(self.begin.as_deref());
        out.extend(self.end.as_deref());
        out.extend(self.variants.iter().map(String::as_str));
        out.extend(self.illegal.as_deref());
        out
    }

    /// Returns the referenced helper name if this is a `builtin` rule.
    #[must_use]
    pub fn builtin_name(&self) -> Option<&str> {
        if self.kind == RuleKind::Builtin {
            self.name.as_deref()
        } else {
            None
        }
    }
}

/// The engine's library of generic helper rules.
///
/// Grammar factories receive a `Modes` so they can reuse these rules instead
/// of redeclaring them; JSON grammars reach them through `builtin` rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Modes {
    /// `\` followed by any character. Consumes text without a class.
    pub backslash_escape: Rule,
    /// `//` to end of line.
    pub c_line_comment: Rule,
    /// `/*` through `*/`.
    pub c_block_comment: Rule,
    /// A double-quoted single-line string.
    pub quote_string: Rule,
    /// A single-quoted single-line string.
    pub apos_string: Rule,
    /// C-style integer, hex and float literals.
    pub c_number: Rule,
}

impl Default for Modes {
    fn default() -> Self {
        let backslash_escape = Rule {
            begin: Some(r"\\[\s\S]".into()),
            relevance: Some(0),
            ..Rule::new(RuleKind::Prefix)
        };
        let doctag = Rule::prefix("doctag", DOCTAG_RE).with_relevance(0);

        Self {
            c_line_comment: Rule::comment("//").containing([doctag.clone()]),
            c_block_comment: Rule::bounded("comment", r"/\*", r"\*/").containing([doctag]),
            quote_string: Rule::bounded("string", "\"", "\"")
                .with_illegal(r"\n")
                .containing([backslash_escape.clone()]),
            apos_string: Rule::bounded("string", "'", "'")
                .with_illegal(r"\n")
                .containing([backslash_escape.clone()]),
            c_number: Rule::pattern("number", [C_NUMBER_RE]).with_relevance(0),
            backslash_escape,
        }
    }
}

impl Modes {
    /// Names accepted by [`Modes::get`].
    pub const NAMES: [&'static str; 6] = [
        "backslash_escape",
        "c_line_comment",
        "c_block_comment",
        "quote_string",
        "apos_string",
        "c_number",
    ];

    /// Looks up a helper rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        match name {
            "backslash_escape" => Some(&self.backslash_escape),
            "c_line_comment" => Some(&self.c_line_comment),
            "c_block_comment" => Some(&self.c_block_comment),
            "quote_string" => Some(&self.quote_string),
            "apos_string" => Some(&self.apos_string),
            "c_number" => Some(&self.c_number),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounded_rule() {
        let json = r#"{
            "kind": "bounded",
            "class_name": "attribute",
            "begin": ": ",
            "end": "[a-z_]+",
            "exclude_begin": true
        }"#;

        let rule: Rule = facet_json::from_str(json).unwrap();
        assert_eq!(rule.kind, RuleKind::Bounded);
        assert!(rule.exclude_begin);
        assert!(!rule.exclude_end);
        assert_eq!(rule.effective_relevance(), DEFAULT_RELEVANCE);
        assert_eq!(rule, Rule::bounded("attribute", ": ", "[a-z_]+").excluding(true, false));
    }

    #[test]
    fn test_parse_pattern_variants() {
        let json = r#"{
            "kind": "pattern",
            "class_name": "number",
            "variants": ["\\b0x([A-Fa-f0-9_]+)"],
            "relevance": 0
        }"#;

        let rule: Rule = facet_json::from_str(json).unwrap();
        assert_eq!(rule.variants, vec![r"\b0x([A-Fa-f0-9_]+)".to_string()]);
        assert_eq!(rule.effective_relevance(), 0);
        assert_eq!(rule.patterns(), vec![r"\b0x([A-Fa-f0-9_]+)"]);
    }

    #[test]
    fn test_modes_lookup() {
        let modes = Modes::default();
        for name in Modes::NAMES {
            assert!(modes.get(name).is_some(), "missing helper {name}");
        }
        assert!(modes.get("hash_comment").is_none());
        assert_eq!(modes.c_number.effective_relevance(), 0);
        assert!(modes.quote_string.has_end());
        assert_eq!(Rule::builtin("c_number").builtin_name(), Some("c_number"));
    }
}
