//! Compilation of grammar descriptors into engine modes.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::grammar::{Grammar, GrammarError, Modes, Rule, RuleKind};

/// Words too common in prose to count toward language detection.
const COMMON_KEYWORDS: [&str; 11] = [
    "of", "and", "for", "in", "not", "or", "if", "then", "parent", "list", "value",
];

const DEFAULT_KEYWORD_PATTERN: &str = r"\w+";

/// A grammar ready for the engine.
#[derive(Debug)]
pub(crate) struct Language {
    /// Registry key: the grammar name in lower case.
    pub(crate) name: String,
    pub(crate) grammar: Grammar,
    pub(crate) keywords: HashMap<String, Keyword>,
    pub(crate) lexeme: Regex,
    pub(crate) root: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Keyword {
    pub(crate) class: String,
    pub(crate) relevance: u32,
}

/// A compiled rule. The root mode has no begin and no end.
#[derive(Debug)]
pub(crate) struct Mode {
    pub(crate) class_name: Option<String>,
    pub(crate) begin: Option<Regex>,
    pub(crate) end: Option<Regex>,
    pub(crate) illegal: Option<Regex>,
    pub(crate) exclude_begin: bool,
    pub(crate) exclude_end: bool,
    pub(crate) relevance: u32,
    pub(crate) contains: Vec<Mode>,
}

struct Compiler<'a> {
    language: &'a str,
    case_insensitive: bool,
    modes: &'a Modes,
}

pub(crate) fn compile(grammar: Grammar, modes: &Modes) -> Result<Language, GrammarError> {
    let compiler = Compiler {
        language: &grammar.name,
        case_insensitive: grammar.case_insensitive,
        modes,
    };

    let lexeme = compiler.regex(
        grammar
            .keyword_pattern
            .as_deref()
            .unwrap_or(DEFAULT_KEYWORD_PATTERN),
    )?;

    let mut contains = Vec::new();
    for rule in &grammar.rules {
        compiler.rule(rule, &mut contains)?;
    }
    let root = Mode {
        class_name: None,
        begin: None,
        end: None,
        illegal: None,
        exclude_begin: false,
        exclude_end: false,
        relevance: 0,
        contains,
    };

    let mut keywords = HashMap::new();
    for class in &grammar.keywords {
        for word in &class.words {
            let key = if grammar.case_insensitive {
                word.to_lowercase()
            } else {
                word.clone()
            };
            let relevance = u32::from(!COMMON_KEYWORDS.contains(&key.as_str()));
            keywords.entry(key).or_insert_with(|| Keyword {
                class: class.class.clone(),
                relevance,
            });
        }
    }

    Ok(Language {
        name: grammar.name.to_lowercase(),
        grammar,
        keywords,
        lexeme,
        root,
    })
}

impl Compiler<'_> {
    fn regex(&self, source: &str) -> Result<Regex, GrammarError> {
        RegexBuilder::new(source)
            .multi_line(true)
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|e| GrammarError::Pattern {
                language: self.language.to_string(),
                pattern: source.to_string(),
                source: Box::new(e),
            })
    }

    fn required<'r>(
        &self,
        rule: &'r Rule,
        value: Option<&'r String>,
        field: &'static str,
    ) -> Result<&'r str, GrammarError> {
        value.map(String::as_str).ok_or(GrammarError::MissingField {
            language: self.language.to_string(),
            kind: rule.kind.as_str(),
            field,
        })
    }

    /// Appends the modes for `rule`. Variants expand to one mode each.
    fn rule(&self, rule: &Rule, out: &mut Vec<Mode>) -> Result<(), GrammarError> {
        let begins: Vec<&str> = match rule.kind {
            RuleKind::Builtin => {
                let name = self.required(rule, rule.name.as_ref(), "name")?;
                let helper = self
                    .modes
                    .get(name)
                    .ok_or_else(|| GrammarError::UnknownBuiltin(name.to_string()))?;
                return self.rule(helper, out);
            }
            RuleKind::Pattern if !rule.variants.is_empty() => {
                rule.variants.iter().map(String::as_str).collect()
            }
            _ => vec![self.required(rule, rule.begin.as_ref(), "begin")?],
        };

        let end = match rule.kind {
            RuleKind::Comment => Some(self.regex("$")?),
            RuleKind::Bounded => Some(self.regex(self.required(rule, rule.end.as_ref(), "end")?)?),
            RuleKind::Pattern => rule.end.as_deref().map(|e| self.regex(e)).transpose()?,
            RuleKind::Prefix | RuleKind::Builtin => None,
        };

        for begin in begins {
            let mut contains = Vec::new();
            for child in &rule.contains {
                self.rule(child, &mut contains)?;
            }
            out.push(Mode {
                class_name: rule.class_name.clone().filter(|c| !c.is_empty()),
                begin: Some(self.regex(begin)?),
                end: end.clone(),
                illegal: rule.illegal.as_deref().map(|i| self.regex(i)).transpose()?,
                exclude_begin: rule.exclude_begin,
                exclude_end: rule.exclude_end,
                relevance: rule.effective_relevance(),
                contains,
            });
        }
        Ok(())
    }
}
