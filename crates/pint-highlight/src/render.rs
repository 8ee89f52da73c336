//! Highlighting code blocks in rendered HTML.
//!
//! [`render_code_blocks`] is the explicit counterpart of highlight.js's
//! page-load hook: the caller decides when it runs and which registry it
//! uses. Blocks are `<pre><code>` pairs as produced by mdBook and most
//! Markdown renderers.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::highlight::escape_html_into;
use crate::Registry;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<pre\b[^>]*>\s*<code\b)([^>]*)>(.*?)(</code>\s*</pre>)")
        .expect("code block pattern compiles")
});

static CLASS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("class pattern compiles")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|([A-Za-z][A-Za-z0-9]*));")
        .expect("entity pattern compiles")
});

/// Named character references decoded in code blocks.
const NAMED_ENTITIES: [(&str, char); 6] = [
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
];

/// Classes that opt a block out of highlighting.
const NO_HIGHLIGHT: [&str; 2] = ["no-highlight", "nohighlight"];

/// Marker class added to highlighted blocks.
const HIGHLIGHTED: &str = "hljs";

enum Requested<'a> {
    Known(&'a str),
    Unknown(&'a str),
}

/// Highlights every `<pre><code>` block in `document`.
///
/// The language comes from a `language-*` or `lang-*` class, or from a class
/// naming a registered language; blocks without one are auto-detected.
/// Blocks are left as they are when they opt out with `no-highlight`, are
/// already highlighted, name an unregistered language, or contain unescaped
/// markup. Running the function on its own output changes nothing.
#[must_use]
pub fn render_code_blocks(document: &str, registry: &Registry) -> String {
    let mut out = String::with_capacity(document.len() + document.len() / 2);
    let mut last = 0;
    let mut blocks = 0_usize;
    let mut highlighted = 0_usize;

    for caps in CODE_BLOCK.captures_iter(document) {
        blocks += 1;
        let Some(whole) = caps.get(0) else { continue };
        if let Some(html) = render_block(&caps, registry) {
            out.push_str(&document[last..whole.start()]);
            out.push_str(&html);
            last = whole.end();
            highlighted += 1;
        }
    }
    out.push_str(&document[last..]);

    tracing::debug!(blocks, highlighted, "rendered code blocks");
    out
}

fn render_block(caps: &Captures<'_>, registry: &Registry) -> Option<String> {
    let attrs = caps.get(2)?.as_str();
    let body = caps.get(3)?.as_str();

    let class_attr = CLASS_ATTR.captures(attrs);
    let class_value = class_attr
        .as_ref()
        .and_then(|c| c.get(1).or_else(|| c.get(2)));
    let classes: Vec<&str> = class_value
        .map(|m| m.as_str().split_whitespace().collect())
        .unwrap_or_default();

    if classes
        .iter()
        .any(|c| *c == HIGHLIGHTED || NO_HIGHLIGHT.contains(c))
    {
        return None;
    }

    let requested = block_language(&classes, registry);
    if let Some(Requested::Unknown(name)) = requested {
        tracing::warn!(language = name, "could not find the language, block left as is");
        return None;
    }

    if body.contains('<') {
        if !registry.options().ignore_unescaped_html {
            tracing::warn!("code block contains unescaped HTML, block left as is");
        }
        return None;
    }

    let Some(code) = decode_entities(body) else {
        tracing::warn!("code block contains an unknown character reference, block left as is");
        return None;
    };
    let result = match requested {
        Some(Requested::Known(name)) => registry.highlight(&code, name).ok()?,
        _ => registry.highlight_auto(&code),
    };

    let mut class_list = classes.join(" ");
    let language_class = format!("language-{}", result.language);
    for extra in [HIGHLIGHTED, language_class.as_str()] {
        if !classes.contains(&extra) {
            if !class_list.is_empty() {
                class_list.push(' ');
            }
            class_list.push_str(extra);
        }
    }
    let mut quoted = String::new();
    escape_html_into(&class_list, &mut quoted);
    let class_attr_html = format!("class=\"{quoted}\"");

    let new_attrs = match class_attr.as_ref().and_then(|c| c.get(0)) {
        Some(m) => format!("{}{class_attr_html}{}", &attrs[..m.start()], &attrs[m.end()..]),
        None => format!("{attrs} {class_attr_html}"),
    };

    let html = result.to_html(registry.options().class_prefix());
    Some(format!("{}{new_attrs}>{html}{}", &caps[1], &caps[4]))
}

fn block_language<'a>(classes: &[&'a str], registry: &'a Registry) -> Option<Requested<'a>> {
    for class in classes {
        let lower = class.to_ascii_lowercase();
        let name = if lower.starts_with("language-") {
            &class["language-".len()..]
        } else if lower.starts_with("lang-") {
            &class["lang-".len()..]
        } else {
            continue;
        };
        return Some(match registry.resolve(name) {
            Some(known) => Requested::Known(known),
            None => Requested::Unknown(name),
        });
    }
    classes
        .iter()
        .find_map(|c| registry.resolve(c))
        .map(Requested::Known)
}

/// Decodes character references into the text a browser would show.
///
/// Returns `None` for a named reference outside [`NAMED_ENTITIES`]. An
/// ampersand that starts no reference is kept as is.
fn decode_entities(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in ENTITY.captures_iter(text) {
        let whole = caps.get(0)?;
        let ch = if let Some(dec) = caps.get(1) {
            numeric_reference(dec.as_str(), 10)
        } else if let Some(hex) = caps.get(2) {
            numeric_reference(hex.as_str(), 16)
        } else {
            let name = caps.get(3)?.as_str();
            NAMED_ENTITIES
                .iter()
                .find(|(n, _)| *n == name)
                .map(|&(_, ch)| ch)?
        };
        out.push_str(&text[last..whole.start()]);
        out.push(ch);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Some(out)
}

fn numeric_reference(digits: &str, radix: u32) -> char {
    u32::from_str_radix(digits, radix)
        .ok()
        .filter(|&n| n != 0)
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}
