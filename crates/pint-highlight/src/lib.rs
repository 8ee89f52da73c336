//! Syntax highlighting for the Pint constraint language.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// Declarative grammar descriptors and their rules.
///
/// A grammar is plain data: keyword classes plus an ordered list of match
/// rules. Nothing in this module runs a regex; the engine compiles the data
/// when a grammar is registered.
pub mod grammar;

/// Engine options loaded from code or JSON.
pub mod config;

/// The mode engine that turns source text into classified spans.
pub mod highlight;

/// The language registry that owns compiled grammars.
pub mod registry;

/// Highlighting of `<pre><code>` blocks inside rendered HTML documents.
pub mod render;

/// Grammar validation and consistency checking utilities.
///
/// Validation protects registration from descriptors that would compile but
/// misbehave: unknown classes, malformed keyword lists, shadowed rules.
pub mod validate;

mod compile;

pub use config::Options;
pub use grammar::{
    parse_grammar, pint::pint, Grammar, GrammarError, KeywordClass, LanguageFactory, Modes, Rule,
    RuleKind,
};
pub use highlight::{Event, Highlighted, Token};
pub use registry::Registry;
pub use render::render_code_blocks;
pub use validate::{validate, ValidationError};
