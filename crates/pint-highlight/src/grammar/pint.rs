//! The Pint grammar.

use super::{Grammar, KeywordClass, Modes, Rule};

const TYPES: &str = "int b256 bool";

const KEYWORDS: &str = "as cond const constraint contract else enum exists forall if in @macro \
    macro predicate pub struct satisfy storage state solve type use var where";

const LITERALS: &str = "true false nil";

const BUILTINS: &str = "__this_set_address __this_address __this_pathway __mut_keys_len \
    __mut_keys_contains __recover_secp256k1 __sha256 __state_len __verify_ed25519";

/// Identifiers, including macro names such as `@macro`.
const KEYWORD_PATTERN: &str = r"@?[A-Za-z_]\w*";

/// Builds the Pint grammar from the engine's helper rules.
#[must_use]
pub fn pint(modes: &Modes) -> Grammar {
    Grammar {
        name: "pint".into(),
        display_name: Some("Pint".into()),
        aliases: vec!["pnt".into()],
        case_insensitive: false,
        keyword_pattern: Some(KEYWORD_PATTERN.into()),
        keywords: vec![
            KeywordClass::from_words("type", TYPES),
            KeywordClass::from_words("keyword", KEYWORDS),
            KeywordClass::from_words("literal", LITERALS),
            KeywordClass::from_words("built_in", BUILTINS),
        ],
        rules: vec![
            modes.c_line_comment.clone(),
            // Next-state variables: `x'`.
            Rule::prefix("title", r"[a-zA-Z_][a-zA-Z0-9_]*'"),
            Rule::bounded("attribute", ": ", "[a-z_]+").excluding(true, false),
            Rule::prefix("symbol", r"/'[a-zA-Z_][a-zA-Z0-9_]*/"),
            Rule::pattern("number", [r"\b0x([A-Fa-f0-9_]+)"]).with_relevance(0),
            modes.quote_string.clone(),
            modes.c_number.clone(),
        ],
        disable_autodetect: false,
    }
}
