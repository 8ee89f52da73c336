//! Validation routines for grammar descriptors.
//!
//! This module performs structural checks over [`Grammar`](crate::grammar::Grammar)
//! definitions: name and alias hygiene, keyword list shape, known highlight
//! classes, required rule fields and pattern compilation. Registration only
//! compiles; these checks run in tests and from the `pint-highlight --check`
//! CLI to catch descriptor defects early.

use std::collections::HashSet;

use regex::RegexBuilder;

use crate::grammar::{Grammar, Modes, Rule, RuleKind, KEYWORD_CLASSES};

/// Highlight classes understood by highlight.js themes.
pub const KNOWN_CLASSES: [&str; 42] = [
    "keyword",
    "built_in",
    "type",
    "literal",
    "number",
    "operator",
    "punctuation",
    "property",
    "regexp",
    "string",
    "char.escape",
    "subst",
    "symbol",
    "class",
    "function",
    "variable",
    "variable.language",
    "variable.constant",
    "title",
    "title.class",
    "title.class.inherited",
    "title.function",
    "title.function.invoke",
    "params",
    "comment",
    "doctag",
    "meta",
    "meta.prompt",
    "meta.keyword",
    "meta.string",
    "section",
    "tag",
    "name",
    "attr",
    "attribute",
    "bullet",
    "code",
    "emphasis",
    "strong",
    "link",
    "quote",
    "template-variable",
];

/// Represents a validation failure encountered when checking a grammar.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The grammar has no name.
    #[error("grammar has no name")]
    EmptyName,

    /// An alias repeats the grammar's name.
    #[error("alias '{0}' repeats the grammar name")]
    AliasIsName(String),

    /// An alias is listed more than once.
    #[error("alias '{0}' is listed twice")]
    DuplicateAlias(String),

    /// A keyword class label outside [`KEYWORD_CLASSES`].
    #[error("undeclared keyword class '{0}'")]
    UnknownKeywordClass(String),

    /// A keyword that is empty or contains whitespace.
    #[error("malformed word {word:?} in keyword class '{class}'")]
    MalformedKeyword {
        /// The class listing the word.
        class: String,
        /// The offending word.
        word: String,
    },

    /// A keyword listed twice within one class.
    #[error("word '{word}' is listed twice in keyword class '{class}'")]
    DuplicateKeyword {
        /// The class listing the word.
        class: String,
        /// The repeated word.
        word: String,
    },

    /// A rule tags spans with a class no theme styles.
    #[error("unknown class '{class}' on rule {rule}")]
    UnknownClass {
        /// Position of the rule, e.g. `3` or `3.0` for a nested rule.
        rule: String,
        /// The offending class.
        class: String,
    },

    /// A rule lacks a field its kind requires.
    #[error("{kind} rule {rule} is missing `{field}`")]
    MissingField {
        /// Position of the rule.
        rule: String,
        /// Kind of the rule.
        kind: &'static str,
        /// The absent field.
        field: &'static str,
    },

    /// A `builtin` rule names a helper the engine does not provide.
    #[error("rule {rule} references unknown builtin '{name}'")]
    UnknownBuiltin {
        /// Position of the rule.
        rule: String,
        /// The unresolved name.
        name: String,
    },

    /// A pattern does not compile.
    #[error("rule {rule} has invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Position of the rule, or `keyword_pattern`.
        rule: String,
        /// The regex source.
        pattern: String,
        /// The compiler's complaint.
        #[source]
        source: Box<regex::Error>,
    },
}

/// Performs semantic validation of a [`Grammar`](crate::grammar::Grammar).
///
/// This function runs several consistency passes over the grammar:
///
/// - Checks the name and aliases.
/// - Checks keyword classes and their words.
/// - Checks rule classes, required fields, builtin references and patterns.
/// - Warns about keywords shared between classes and duplicated rules.
///
/// # Errors
///
/// Returns a [`ValidationError`] for the first violation found.
pub fn validate(grammar: &Grammar) -> Result<(), ValidationError> {
    check_names(grammar)?;

    check_keywords(grammar)?;

    let modes = Modes::default();
    for (index, rule) in grammar.rules.iter().enumerate() {
        check_rule(rule, &index.to_string(), grammar.case_insensitive, &modes)?;
    }

    if let Some(pattern) = &grammar.keyword_pattern {
        check_pattern(pattern, "keyword_pattern", grammar.case_insensitive)?;
    }

    check_shadowed_rules(grammar);

    Ok(())
}

fn check_names(grammar: &Grammar) -> Result<(), ValidationError> {
    if grammar.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }

    let mut seen = HashSet::new();
    for alias in &grammar.aliases {
        if alias.eq_ignore_ascii_case(&grammar.name) {
            return Err(ValidationError::AliasIsName(alias.clone()));
        }
        if !seen.insert(alias.to_lowercase()) {
            return Err(ValidationError::DuplicateAlias(alias.clone()));
        }
    }
    Ok(())
}

fn check_keywords(grammar: &Grammar) -> Result<(), ValidationError> {
    let mut owners: Vec<(&str, &str)> = Vec::new();

    for class in &grammar.keywords {
        if !KEYWORD_CLASSES.contains(&class.class.as_str()) {
            return Err(ValidationError::UnknownKeywordClass(class.class.clone()));
        }

        let mut seen = HashSet::new();
        for word in &class.words {
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                return Err(ValidationError::MalformedKeyword {
                    class: class.class.clone(),
                    word: word.clone(),
                });
            }
            if !seen.insert(word.as_str()) {
                return Err(ValidationError::DuplicateKeyword {
                    class: class.class.clone(),
                    word: word.clone(),
                });
            }
            if let Some((_, first)) = owners.iter().find(|(w, _)| *w == word.as_str()) {
                // The first class wins at lookup, so this listing is dead.
                tracing::warn!(
                    language = %grammar.name,
                    %word,
                    tagged = %first,
                    ignored = %class.class,
                    "keyword listed in more than one class"
                );
            } else {
                owners.push((word.as_str(), class.class.as_str()));
            }
        }
    }
    Ok(())
}

fn check_rule(
    rule: &Rule,
    path: &str,
    case_insensitive: bool,
    modes: &Modes,
) -> Result<(), ValidationError> {
    if let Some(class) = rule.class_name.as_deref().filter(|c| !c.is_empty()) {
        if !KNOWN_CLASSES.contains(&class) {
            return Err(ValidationError::UnknownClass {
                rule: path.to_string(),
                class: class.to_string(),
            });
        }
    }

    let missing = |field: &'static str| ValidationError::MissingField {
        rule: path.to_string(),
        kind: rule.kind.as_str(),
        field,
    };
    match rule.kind {
        RuleKind::Builtin => {
            let name = rule.name.as_deref().ok_or_else(|| missing("name"))?;
            if modes.get(name).is_none() {
                return Err(ValidationError::UnknownBuiltin {
                    rule: path.to_string(),
                    name: name.to_string(),
                });
            }
        }
        RuleKind::Bounded if rule.end.is_none() => return Err(missing("end")),
        RuleKind::Pattern if rule.variants.is_empty() && rule.begin.is_none() => {
            return Err(missing("begin"));
        }
        RuleKind::Comment | RuleKind::Prefix | RuleKind::Bounded if rule.begin.is_none() => {
            return Err(missing("begin"));
        }
        _ => {}
    }

    for pattern in rule.patterns() {
        check_pattern(pattern, path, case_insensitive)?;
    }

    for (index, child) in rule.contains.iter().enumerate() {
        check_rule(child, &format!("{path}.{index}"), case_insensitive, modes)?;
    }
    Ok(())
}

fn check_pattern(pattern: &str, rule: &str, case_insensitive: bool) -> Result<(), ValidationError> {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .case_insensitive(case_insensitive)
        .build()
        .map(drop)
        .map_err(|e| ValidationError::InvalidPattern {
            rule: rule.to_string(),
            pattern: pattern.to_string(),
            source: Box::new(e),
        })
}

fn check_shadowed_rules(grammar: &Grammar) {
    for (index, rule) in grammar.rules.iter().enumerate() {
        if let Some(first) = grammar.rules[..index].iter().position(|r| r == rule) {
            tracing::warn!(
                language = %grammar.name,
                rule = index,
                duplicate_of = first,
                "rule repeats an earlier rule and can never match first"
            );
        }
    }
}
