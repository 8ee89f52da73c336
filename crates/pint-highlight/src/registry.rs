//! The language registry.
//!
//! A [`Registry`] owns every compiled grammar, the alias table, the helper
//! rules handed to grammar factories, and the engine [`Options`]. It is built
//! once by the caller and passed to whatever needs to highlight; nothing is
//! registered behind the caller's back.

use std::collections::HashMap;

use crate::compile::{compile, Language};
use crate::grammar::{pint::pint, Grammar, GrammarError, LanguageFactory, Modes};
use crate::highlight::{highlight, Highlighted};
use crate::Options;

/// Name reported when no grammar claims a piece of code.
pub const PLAINTEXT: &str = "plaintext";

/// Grammars compiled into the crate.
pub const BUILTIN_LANGUAGES: [LanguageFactory; 1] = [pint];

/// Compiled grammars keyed by name and alias.
#[derive(Debug, Default)]
pub struct Registry {
    languages: Vec<Language>,
    names: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    modes: Modes,
    options: Options,
}

impl Registry {
    /// Creates an empty registry with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given options.
    #[must_use]
    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Creates a registry holding every grammar shipped with the crate.
    ///
    /// # Errors
    ///
    /// Fails only if a shipped grammar does not compile.
    pub fn with_builtin_languages() -> Result<Self, GrammarError> {
        let mut registry = Self::new();
        for factory in BUILTIN_LANGUAGES {
            registry.register_language(factory)?;
        }
        Ok(registry)
    }

    /// The active options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replaces the active options.
    pub fn configure(&mut self, options: Options) {
        self.options = options;
    }

    /// The helper rules given to grammar factories.
    #[must_use]
    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    /// Builds a grammar with `factory` and registers it.
    ///
    /// # Errors
    ///
    /// See [`Registry::register`].
    pub fn register_language(&mut self, factory: LanguageFactory) -> Result<(), GrammarError> {
        let grammar = factory(&self.modes);
        self.register(grammar)
    }

    /// Compiles `grammar` and stores it under its name and aliases.
    ///
    /// A grammar already registered under the same name is replaced, along
    /// with the aliases that pointed to it. Registering an identical grammar
    /// again leaves the registry as it was.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Pattern`], [`GrammarError::MissingField`] or
    /// [`GrammarError::UnknownBuiltin`] when the grammar does not compile; the
    /// registry is unchanged in that case.
    pub fn register(&mut self, grammar: Grammar) -> Result<(), GrammarError> {
        let language = compile(grammar, &self.modes)?;
        let name = language.name.clone();

        if let Some(&index) = self.names.get(&name) {
            tracing::debug!(language = %name, "replacing registered language");
            self.aliases.retain(|_, target| *target != name);
            self.languages[index] = language;
        } else {
            tracing::debug!(language = %name, "registering language");
            self.names.insert(name.clone(), self.languages.len());
            self.languages.push(language);
        }

        let aliases: Vec<String> = self.languages[self.names[&name]]
            .grammar
            .aliases
            .iter()
            .map(|a| a.to_lowercase())
            .collect();
        for alias in aliases {
            self.insert_alias(alias, &name);
        }
        Ok(())
    }

    /// Points extra aliases at a registered language.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownLanguage`] if `language` is not registered.
    pub fn register_aliases(&mut self, aliases: &[&str], language: &str) -> Result<(), GrammarError> {
        let name = self
            .resolve(language)
            .ok_or_else(|| GrammarError::UnknownLanguage(language.to_string()))?
            .to_string();
        for alias in aliases {
            self.insert_alias(alias.to_lowercase(), &name);
        }
        Ok(())
    }

    fn insert_alias(&mut self, alias: String, name: &str) {
        if let Some(previous) = self.aliases.get(&alias) {
            if previous != name {
                tracing::debug!(%alias, from = %previous, to = %name, "alias reassigned");
            }
        }
        self.aliases.insert(alias, name.to_string());
    }

    /// Removes a language and its aliases. Returns whether it was registered.
    pub fn unregister(&mut self, language: &str) -> bool {
        let Some(name) = self.resolve(language).map(str::to_string) else {
            return false;
        };
        let Some(index) = self.names.remove(&name) else {
            return false;
        };
        self.languages.remove(index);
        for slot in self.names.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        self.aliases.retain(|_, target| *target != name);
        true
    }

    /// Canonical name for a name or alias, ignoring case.
    #[must_use]
    pub fn resolve(&self, name_or_alias: &str) -> Option<&str> {
        let key = name_or_alias.to_lowercase();
        if let Some((name, _)) = self.names.get_key_value(&key) {
            return Some(name);
        }
        self.aliases.get(&key).map(String::as_str)
    }

    fn language(&self, name_or_alias: &str) -> Option<&Language> {
        let name = self.resolve(name_or_alias)?;
        self.names.get(name).map(|&i| &self.languages[i])
    }

    /// The descriptor registered under a name or alias.
    #[must_use]
    pub fn get_language(&self, name_or_alias: &str) -> Option<&Grammar> {
        self.language(name_or_alias).map(|l| &l.grammar)
    }

    /// Registered language names in registration order.
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        self.languages
            .iter()
            .map(|l| l.name.as_str())
            .collect()
    }

    /// Aliases pointing at `language`, sorted.
    #[must_use]
    pub fn aliases_of(&self, language: &str) -> Vec<&str> {
        let Some(name) = self.resolve(language) else {
            return Vec::new();
        };
        let mut aliases: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    /// Highlights `code` with an explicitly selected language.
    ///
    /// Illegal matches are ignored, as when a reader asked for this language.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UnknownLanguage`] if nothing answers to `language`.
    pub fn highlight(&self, code: &str, language: &str) -> Result<Highlighted, GrammarError> {
        let compiled = self
            .language(language)
            .ok_or_else(|| GrammarError::UnknownLanguage(language.to_string()))?;
        Ok(highlight(compiled, code, true))
    }

    /// Highlights `code` with whichever candidate language scores highest.
    ///
    /// Candidates are [`Options::languages`] or every registered language not
    /// opting out of detection. A language hitting an illegal pattern is
    /// disqualified. Ties go to the language registered first; with no
    /// positive score the code is returned as `plaintext`.
    #[must_use]
    pub fn highlight_auto(&self, code: &str) -> Highlighted {
        let candidates: Vec<&Language> = match &self.options.languages {
            Some(names) => names.iter().filter_map(|n| self.language(n)).collect(),
            None => self
                .languages
                .iter()
                .filter(|l| !l.grammar.disable_autodetect)
                .collect(),
        };

        let mut best = Highlighted::plain(PLAINTEXT, code);
        for language in candidates {
            let result = highlight(language, code, false);
            if !result.illegal && result.relevance > best.relevance {
                best = result;
            }
        }
        tracing::debug!(language = %best.language, relevance = best.relevance, "auto-detected");
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{KeywordClass, Rule};

    fn toy(name: &str, aliases: &[&str], words: &str) -> Grammar {
        Grammar {
            name: name.into(),
            display_name: None,
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            case_insensitive: false,
            keyword_pattern: None,
            keywords: vec![KeywordClass::from_words("keyword", words)],
            rules: vec![Rule::builtin("quote_string")],
            disable_autodetect: false,
        }
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let registry = Registry::with_builtin_languages().unwrap();
        assert_eq!(registry.languages(), ["pint"]);
        assert_eq!(registry.resolve("PNT"), Some("pint"));
        assert_eq!(registry.get_language("pnt").unwrap().title(), "Pint");
        assert!(registry.get_language("rust").is_none());
    }

    #[test]
    fn test_double_registration_is_idempotent() {
        let mut once = Registry::new();
        once.register_language(pint).unwrap();

        let mut twice = Registry::new();
        twice.register_language(pint).unwrap();
        twice.register_language(pint).unwrap();

        assert_eq!(once.languages(), twice.languages());
        assert_eq!(once.aliases_of("pint"), twice.aliases_of("pint"));
        assert_eq!(once.get_language("pint"), twice.get_language("pint"));
        assert_eq!(
            once.highlight("var x: int;", "pint").unwrap(),
            twice.highlight("var x: int;", "pint").unwrap()
        );
    }

    #[test]
    fn test_reregistration_replaces_aliases() {
        let mut registry = Registry::new();
        registry.register(toy("toy", &["t1"], "foo")).unwrap();
        registry.register(toy("toy", &["t2"], "bar")).unwrap();
        assert_eq!(registry.languages(), ["toy"]);
        assert_eq!(registry.aliases_of("toy"), ["t2"]);
        assert!(registry.resolve("t1").is_none());
        let out = registry.highlight("foo bar", "t2").unwrap();
        assert_eq!(out.tagged("keyword"), ["bar"]);
    }

    #[test]
    fn test_failed_registration_leaves_registry_unchanged() {
        let mut registry = Registry::with_builtin_languages().unwrap();
        let mut broken = toy("pint", &["broken"], "x");
        broken.rules.push(Rule::prefix("title", "("));
        assert!(matches!(
            registry.register(broken),
            Err(GrammarError::Pattern { .. })
        ));
        assert_eq!(registry.aliases_of("pint"), ["pnt"]);
        assert!(registry.get_language("pint").unwrap().display_name.is_some());
    }

    #[test]
    fn test_register_aliases_and_unregister() {
        let mut registry = Registry::with_builtin_languages().unwrap();
        registry.register(toy("toy", &[], "foo")).unwrap();
        registry.register_aliases(&["pint-lang"], "pnt").unwrap();
        assert_eq!(registry.resolve("pint-lang"), Some("pint"));
        assert!(matches!(
            registry.register_aliases(&["x"], "nope"),
            Err(GrammarError::UnknownLanguage(_))
        ));

        assert!(registry.unregister("pnt"));
        assert!(!registry.unregister("pint"));
        assert_eq!(registry.languages(), ["toy"]);
        assert!(registry.resolve("pint-lang").is_none());
        assert!(registry.highlight("foo", "toy").is_ok());
    }

    #[test]
    fn test_results_report_the_registry_key() {
        let mut registry = Registry::new();
        registry.register(toy("Toy", &["T1"], "foo")).unwrap();
        assert_eq!(registry.languages(), ["toy"]);
        assert_eq!(registry.highlight("foo", "TOY").unwrap().language, "toy");
        assert_eq!(registry.highlight_auto("foo").language, "toy");
        assert_eq!(registry.aliases_of("toy"), ["t1"]);
    }

    #[test]
    fn test_unknown_language() {
        let registry = Registry::with_builtin_languages().unwrap();
        let err = registry.highlight("x", "cobol").unwrap_err();
        assert_eq!(err.to_string(), "unknown language `cobol`");
    }

    #[test]
    fn test_highlight_auto() {
        let mut registry = Registry::with_builtin_languages().unwrap();
        registry.register(toy("toy", &[], "foo bar")).unwrap();

        let pint_code = "predicate Foo { var x: int; constraint x' == x + 1; }";
        assert_eq!(registry.highlight_auto(pint_code).language, "pint");
        assert_eq!(registry.highlight_auto("foo bar foo").language, "toy");

        let plain = registry.highlight_auto("!!!");
        assert_eq!(plain.language, PLAINTEXT);
        assert_eq!(plain.relevance, 0);
    }

    #[test]
    fn test_highlight_auto_respects_options() {
        let mut registry = Registry::with_builtin_languages().unwrap();
        registry.register(toy("toy", &[], "foo")).unwrap();
        registry.configure(Options {
            languages: Some(vec!["toy".into()]),
            ..Options::default()
        });
        assert_eq!(registry.highlight_auto("var x: int;").language, PLAINTEXT);
    }

    #[test]
    fn test_illegal_disqualifies_in_auto_mode() {
        let registry = Registry::with_builtin_languages().unwrap();
        let out = registry.highlight_auto("var \"open\nstring");
        assert_eq!(out.language, PLAINTEXT);

        let explicit = registry.highlight("var \"open\nstring", "pint").unwrap();
        assert!(!explicit.illegal);
        assert_eq!(explicit.tagged("keyword"), ["var"]);
    }
}
