//! The mode engine.
//!
//! Highlighting walks the text with a stack of modes. At each position the
//! earliest match among the current mode's child begins, its end and its
//! illegal pattern is taken; ties go to children first (in declaration
//! order), then the end, then the illegal pattern. Text between matches is
//! plain content, which in the root mode is scanned for keywords.

use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;

use regex::Regex;

use crate::compile::{Language, Mode};

/// Relevance stops counting after this many hits of the same keyword.
const MAX_KEYWORD_HITS: u32 = 7;

/// One step of a highlighted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Opens a span with the given class.
    Open(String),
    /// Plain text, as a byte range into the source.
    Text(Range<usize>),
    /// Closes the innermost open span.
    Close,
}

/// A run of text and the innermost class covering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Innermost class, or `None` for unclassified text.
    pub class: Option<&'a str>,
    /// The covered text.
    pub text: &'a str,
    /// Byte range of `text` in the source.
    pub range: Range<usize>,
}

/// The outcome of highlighting one piece of code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    /// Registry name of the language used, or `"plaintext"`.
    pub language: String,
    /// Detection score accumulated while highlighting.
    pub relevance: u32,
    /// Whether an illegal pattern aborted highlighting.
    pub illegal: bool,
    /// The source text.
    pub code: String,
    /// Span structure over `code`.
    pub events: Vec<Event>,
}

impl Highlighted {
    /// Unhighlighted text with no relevance.
    pub(crate) fn plain(language: &str, code: &str) -> Self {
        let events = if code.is_empty() {
            Vec::new()
        } else {
            vec![Event::Text(0..code.len())]
        };
        Self {
            language: language.to_string(),
            relevance: 0,
            illegal: false,
            code: code.to_string(),
            events,
        }
    }

    /// Renders the spans as HTML using highlight.js class naming.
    ///
    /// A dotted class such as `title.function` becomes
    /// `{prefix}title function_`.
    #[must_use]
    pub fn to_html(&self, class_prefix: &str) -> String {
        let mut out = String::with_capacity(self.code.len() * 2);
        for event in &self.events {
            match event {
                Event::Open(class) => {
                    out.push_str("<span class=\"");
                    out.push_str(&css_class(class, class_prefix));
                    out.push_str("\">");
                }
                Event::Text(range) => escape_html_into(&self.code[range.clone()], &mut out),
                Event::Close => out.push_str("</span>"),
            }
        }
        out
    }

    /// Flattens the spans into runs tagged with their innermost class.
    #[must_use]
    pub fn tokens(&self) -> Vec<Token<'_>> {
        let mut stack: Vec<&str> = Vec::new();
        let mut tokens = Vec::new();
        for event in &self.events {
            match event {
                Event::Open(class) => stack.push(class),
                Event::Close => {
                    stack.pop();
                }
                Event::Text(range) => tokens.push(Token {
                    class: stack.last().copied(),
                    text: &self.code[range.clone()],
                    range: range.clone(),
                }),
            }
        }
        tokens
    }

    /// Runs of text carrying `class`, innermost only.
    #[must_use]
    pub fn tagged(&self, class: &str) -> Vec<&str> {
        self.tokens()
            .into_iter()
            .filter(|t| t.class == Some(class))
            .map(|t| t.text)
            .collect()
    }
}

fn css_class(scope: &str, prefix: &str) -> String {
    let mut parts = scope.split('.');
    let mut out = format!("{prefix}{}", parts.next().unwrap_or_default());
    for (depth, part) in parts.enumerate() {
        out.push(' ');
        out.push_str(part);
        out.push_str(&"_".repeat(depth + 1));
    }
    out
}

/// Escapes text for use in HTML element content or attributes.
pub(crate) fn escape_html_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
}

/// Collects events, merging adjacent text and skipping spans without a class.
#[derive(Default)]
struct Emitter {
    events: Vec<Event>,
    open: Vec<bool>,
}

impl Emitter {
    fn text(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        if let Some(Event::Text(last)) = self.events.last_mut() {
            if last.end == range.start {
                last.end = range.end;
                return;
            }
        }
        self.events.push(Event::Text(range));
    }

    fn open(&mut self, class: Option<&str>) {
        if let Some(class) = class {
            self.events.push(Event::Open(class.to_string()));
        }
        self.open.push(class.is_some());
    }

    fn close(&mut self) {
        if self.open.pop() == Some(true) {
            self.events.push(Event::Close);
        }
    }

    fn leaf(&mut self, class: &str, range: Range<usize>) {
        self.events.push(Event::Open(class.to_string()));
        self.events.push(Event::Text(range));
        self.events.push(Event::Close);
    }
}

enum Hit {
    Begin(usize),
    End,
    Illegal,
}

struct Found {
    hit: Hit,
    range: Range<usize>,
}

/// The next match of each regex, as last searched.
///
/// A match found from `from` stays valid while the scan position lies
/// between `from` and the match start, so a rule that matches far ahead is
/// searched once rather than on every step.
#[derive(Default)]
struct MatchCache {
    entries: HashMap<*const Regex, (usize, Option<Range<usize>>)>,
    /// Bytes examined by regex searches, for keeping scans linear.
    scanned: usize,
}

impl MatchCache {
    fn find(&mut self, re: &Regex, code: &str, pos: usize) -> Option<Range<usize>> {
        let key = std::ptr::from_ref(re);
        if let Some((from, found)) = self.entries.get(&key) {
            if *from <= pos && found.as_ref().is_none_or(|m| m.start >= pos) {
                return found.clone();
            }
        }
        let found = re.find_at(code, pos).map(|m| m.range());
        self.scanned += found.as_ref().map_or(code.len(), |m| m.end) - pos;
        self.entries.insert(key, (pos, found.clone()));
        found
    }
}

struct Run<'l, 'c> {
    language: &'l Language,
    code: &'c str,
    emitter: Emitter,
    relevance: u32,
    keyword_hits: HashMap<Cow<'c, str>, u32>,
}

/// Highlights `code` with `language`.
///
/// With `ignore_illegals` unset an illegal match aborts highlighting and
/// returns the code as plain text flagged `illegal`.
pub(crate) fn highlight(language: &Language, code: &str, ignore_illegals: bool) -> Highlighted {
    highlight_with(language, code, ignore_illegals, &mut MatchCache::default())
}

fn highlight_with(
    language: &Language,
    code: &str,
    ignore_illegals: bool,
    cache: &mut MatchCache,
) -> Highlighted {
    let mut run = Run {
        language,
        code,
        emitter: Emitter::default(),
        relevance: 0,
        keyword_hits: HashMap::new(),
    };

    let mut stack: Vec<&Mode> = vec![&language.root];
    let mut pos = 0;

    while let Some(&top) = stack.last() {
        let Some(found) = next_match(cache, top, code, pos, stack.len() > 1) else {
            run.content(top, pos..code.len());
            break;
        };
        run.content(top, pos..found.range.start);
        pos = found.range.start;

        match found.hit {
            Hit::Begin(_) | Hit::Illegal if found.range.is_empty() => {
                // An empty match would never advance: consume one char.
                if pos >= code.len() {
                    break;
                }
                let next = next_char_boundary(code, pos);
                run.content(top, pos..next);
                pos = next;
            }
            Hit::Begin(index) => {
                let child = &top.contains[index];
                run.relevance += child.relevance;
                match (child.exclude_begin, child.end.is_some()) {
                    // Nothing would remain inside the span.
                    (true, false) => run.content(top, found.range.clone()),
                    (true, true) => {
                        run.content(top, found.range.clone());
                        run.emitter.open(child.class_name.as_deref());
                        stack.push(child);
                    }
                    (false, has_end) => {
                        run.emitter.open(child.class_name.as_deref());
                        run.emitter.text(found.range.clone());
                        if has_end {
                            stack.push(child);
                        } else {
                            run.emitter.close();
                        }
                    }
                }
                pos = found.range.end;
            }
            Hit::End => {
                stack.pop();
                if top.exclude_end {
                    run.emitter.close();
                    if let Some(&parent) = stack.last() {
                        run.content(parent, found.range.clone());
                    }
                } else {
                    run.emitter.text(found.range.clone());
                    run.emitter.close();
                }
                pos = found.range.end;
            }
            Hit::Illegal => {
                if !ignore_illegals {
                    tracing::trace!(
                        language = %language.name,
                        offset = pos,
                        "illegal match aborted highlighting"
                    );
                    let mut plain = Highlighted::plain(&language.name, code);
                    plain.illegal = true;
                    return plain;
                }
                run.content(top, found.range.clone());
                pos = found.range.end;
            }
        }

        if pos >= code.len() && stack.len() == 1 {
            break;
        }
    }

    // Modes still open at the end of input close with it.
    for _ in 1..stack.len() {
        run.emitter.close();
    }

    Highlighted {
        language: language.name.clone(),
        relevance: run.relevance,
        illegal: false,
        code: code.to_string(),
        events: run.emitter.events,
    }
}

fn next_match(
    cache: &mut MatchCache,
    mode: &Mode,
    code: &str,
    pos: usize,
    can_end: bool,
) -> Option<Found> {
    let mut best: Option<Found> = None;
    let mut consider = |hit: Hit, range: Range<usize>| {
        if best.as_ref().is_none_or(|b| range.start < b.range.start) {
            best = Some(Found { hit, range });
        }
    };

    for (index, child) in mode.contains.iter().enumerate() {
        if let Some(m) = child.begin.as_ref().and_then(|re| cache.find(re, code, pos)) {
            consider(Hit::Begin(index), m);
        }
    }
    if can_end {
        if let Some(m) = mode.end.as_ref().and_then(|re| cache.find(re, code, pos)) {
            consider(Hit::End, m);
        }
    }
    if let Some(m) = mode.illegal.as_ref().and_then(|re| cache.find(re, code, pos)) {
        consider(Hit::Illegal, m);
    }
    best
}

fn next_char_boundary(code: &str, pos: usize) -> usize {
    code[pos..]
        .chars()
        .next()
        .map_or(code.len(), |c| pos + c.len_utf8())
}

impl<'c> Run<'_, 'c> {
    /// Emits plain content of `mode`, tagging keywords in the root mode.
    fn content(&mut self, mode: &Mode, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        if !std::ptr::eq(mode, &self.language.root) || self.language.keywords.is_empty() {
            self.emitter.text(range);
            return;
        }

        let code: &'c str = self.code;
        let haystack = &code[..range.end];
        let mut last = range.start;
        let mut at = range.start;
        while let Some(m) = self.language.lexeme.find_at(haystack, at) {
            if m.is_empty() {
                at = next_char_boundary(haystack, m.end());
                if at >= haystack.len() {
                    break;
                }
                continue;
            }
            let word = m.as_str();
            let key = if self.language.grammar.case_insensitive {
                Cow::Owned(word.to_lowercase())
            } else {
                Cow::Borrowed(word)
            };
            if let Some(keyword) = self.language.keywords.get(key.as_ref()) {
                self.emitter.text(last..m.start());
                self.emitter.leaf(&keyword.class, m.range());
                let hits = self.keyword_hits.entry(key).or_insert(0);
                *hits += 1;
                if *hits <= MAX_KEYWORD_HITS {
                    self.relevance += keyword.relevance;
                }
                last = m.end();
            }
            at = m.end();
        }
        self.emitter.text(last..range.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::grammar::{pint::pint, Grammar, Modes, Rule};

    fn pint_language() -> Language {
        compile(pint(&Modes::default()), &Modes::default()).unwrap()
    }

    fn run(code: &str) -> Highlighted {
        highlight(&pint_language(), code, true)
    }

    #[test]
    fn test_next_state_variable_is_title() {
        let out = run("x'");
        assert_eq!(out.tagged("title"), ["x'"]);
        assert_eq!(out.to_html("hljs-"), "<span class=\"hljs-title\">x&#x27;</span>");
    }

    #[test]
    fn test_hex_literal_has_no_relevance() {
        let out = run("0xAB_12");
        assert_eq!(out.tagged("number"), ["0xAB_12"]);
        assert_eq!(out.relevance, 0);
    }

    #[test]
    fn test_attribute_excludes_begin() {
        let out = run(": foo");
        let tokens = out.tokens();
        assert_eq!(tokens[0].class, None);
        assert_eq!(tokens[0].text, ": ");
        assert_eq!(tokens[1].class, Some("attribute"));
        assert_eq!(tokens[1].text, "foo");
        assert_eq!(
            out.to_html("hljs-"),
            ": <span class=\"hljs-attribute\">foo</span>"
        );
    }

    #[test]
    fn test_keywords_and_builtins() {
        let out = run("predicate Foo { var x: int; constraint __sha256(x) == true; }");
        assert_eq!(out.tagged("keyword"), ["predicate", "var", "constraint"]);
        assert_eq!(out.tagged("built_in"), ["__sha256"]);
        assert_eq!(out.tagged("literal"), ["true"]);
        assert_eq!(out.tagged("attribute"), ["int"]);
    }

    #[test]
    fn test_macro_keyword() {
        let out = run("@macro");
        assert_eq!(out.tagged("keyword"), ["@macro"]);
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        let out = run("// TODO: tidy\nvar");
        assert_eq!(out.tagged("comment"), ["// ", " tidy"]);
        assert_eq!(out.tagged("doctag"), ["TODO:"]);
        assert_eq!(out.tagged("keyword"), ["var"]);
        assert_eq!(
            out.to_html("hljs-"),
            "<span class=\"hljs-comment\">// <span class=\"hljs-doctag\">TODO:</span> tidy</span>\n\
             <span class=\"hljs-keyword\">var</span>"
        );
    }

    #[test]
    fn test_string_with_escape() {
        let out = run(r#""a\"b" 12"#);
        assert_eq!(out.tagged("string"), [r#""a\"b""#]);
        assert_eq!(out.tagged("number"), ["12"]);
    }

    #[test]
    fn test_unterminated_string_is_closed_at_end() {
        let out = run("\"abc");
        assert_eq!(out.tagged("string"), ["\"abc"]);
        assert_eq!(out.events.iter().filter(|e| **e == Event::Close).count(), 1);
    }

    #[test]
    fn test_illegal_aborts_when_not_ignored() {
        let language = pint_language();
        let out = highlight(&language, "\"abc\ndef\"", false);
        assert!(out.illegal);
        assert_eq!(out.relevance, 0);
        assert_eq!(out.events, vec![Event::Text(0..9)]);
    }

    #[test]
    fn test_keyword_relevance_is_capped() {
        let out = run(&"var ".repeat(10));
        assert_eq!(out.tagged("keyword").len(), 10);
        assert_eq!(out.relevance, MAX_KEYWORD_HITS);
    }

    #[test]
    fn test_keyword_cap_ignores_case() {
        let grammar = Grammar {
            case_insensitive: true,
            ..pint(&Modes::default())
        };
        let language = compile(grammar, &Modes::default()).unwrap();
        let out = highlight(&language, &"VAR var Var ".repeat(4), true);
        assert_eq!(out.tagged("keyword").len(), 12);
        assert_eq!(out.relevance, MAX_KEYWORD_HITS);
    }

    #[test]
    fn test_prefix_excluding_begin_leaves_no_empty_span() {
        let grammar = Grammar {
            rules: vec![
                Rule::prefix("meta", "#!").excluding(true, false),
                Rule::prefix("symbol", "\\$\\w+"),
            ],
            keywords: vec![],
            ..pint(&Modes::default())
        };
        let language = compile(grammar, &Modes::default()).unwrap();
        let out = highlight(&language, "#! $a", true);
        assert_eq!(out.to_html("hljs-"), "#! <span class=\"hljs-symbol\">$a</span>");
        assert_eq!(out.relevance, 2);
    }

    #[test]
    fn test_large_input_is_scanned_linearly() {
        let code = "constraint x' == y + 1;\n".repeat(40_000);
        let mut cache = MatchCache::default();
        let out = highlight_with(&pint_language(), &code, true, &mut cache);
        assert_eq!(out.tagged("title").len(), 40_000);
        assert_eq!(out.tagged("number").len(), 40_000);
        assert!(
            cache.scanned < 16 * code.len(),
            "scanned {} bytes of a {} byte input",
            cache.scanned,
            code.len()
        );
    }

    #[test]
    fn test_exclude_end() {
        let grammar = Grammar {
            rules: vec![Rule::bounded("meta", "#\\[", "\\]").excluding(false, true)],
            keywords: vec![],
            ..pint(&Modes::default())
        };
        let language = compile(grammar, &Modes::default()).unwrap();
        let out = highlight(&language, "#[x]", true);
        assert_eq!(out.to_html("hljs-"), "<span class=\"hljs-meta\">#[x</span>]");
    }

    #[test]
    fn test_dotted_scope() {
        assert_eq!(css_class("title.function", "hljs-"), "hljs-title function_");
        assert_eq!(css_class("a.b.c", "p-"), "p-a b_ c__");
    }

    #[test]
    fn test_plain_html_is_escaped() {
        let out = Highlighted::plain("plaintext", "a < b && c");
        assert_eq!(out.to_html("hljs-"), "a &lt; b &amp;&amp; c");
        assert!(out.tokens().iter().all(|t| t.class.is_none()));
    }
}
