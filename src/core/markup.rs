//! # Markup
//!
//! Server-rendered HTML arrives in `formatted_response`. It is untrusted: a
//! compromised backend can put anything in it, including terminal escape
//! sequences. This module turns that string into [`SafeMarkup`], a token list
//! that has been through a [`MarkupSanitizer`].
//!
//! ```text
//! raw HTML ──tokenize()──▶ Vec<Token> ──MarkupSanitizer──▶ SafeMarkup
//!                                                            │
//!                                  tui::markup::render() ◀───┤
//!                                  to_plain_text()       ◀───┘
//! ```
//!
//! `SafeMarkup` has no public constructor that skips the sanitizer, so a
//! caller cannot end up rendering raw server markup by accident. Opting out
//! means passing [`TrustedMarkup`] explicitly.

use log::debug;

/// Elements kept by [`AllowListSanitizer`]. Everything else is unwrapped.
const ALLOWED_ELEMENTS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "u", "del", "s", "code", "pre", "ul", "ol", "li",
    "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "a", "table", "thead", "tbody", "tr",
    "th", "td", "span", "div",
];

/// Elements removed together with everything inside them.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "svg", "math", "head",
    "title",
];

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements that never have a close tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];

/// Elements that start on a fresh line when flattened to text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "table",
    "tr", "hr",
];

// ============================================================================
// Tokens
// ============================================================================

/// One lexical unit of HTML. Element and attribute names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    /// Text with entities already decoded.
    Text(String),
}

impl Token {
    /// Value of attribute `key` on a start tag.
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Token::Start { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Returns true for elements without a close tag.
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Splits HTML into tokens. Never fails: anything that does not look like a
/// tag is kept as text. Comments, doctypes and processing instructions are
/// skipped.
pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    let flush = |text: &mut String, tokens: &mut Vec<Token>| {
        if !text.is_empty() {
            tokens.push(Token::Text(decode_entities(text)));
            text.clear();
        }
    };

    while i < chars.len() {
        if chars[i] != '<' {
            text.push(chars[i]);
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();

        // <!-- comment -->
        if starts_with_at(&chars, i, "<!--") {
            flush(&mut text, &mut tokens);
            i = find_from(&chars, i + 4, "-->").map_or(chars.len(), |end| end + 3);
            continue;
        }

        // <!DOCTYPE ...> and <?xml ...?>
        if matches!(next, Some('!') | Some('?')) {
            flush(&mut text, &mut tokens);
            i = find_char(&chars, i, '>').map_or(chars.len(), |end| end + 1);
            continue;
        }

        // </name>
        if next == Some('/') && chars.get(i + 2).is_some_and(|c| c.is_ascii_alphabetic()) {
            let Some(end) = find_char(&chars, i, '>') else {
                text.extend(&chars[i..]);
                break;
            };
            flush(&mut text, &mut tokens);
            let name = read_name(&chars[i + 2..end]);
            tokens.push(Token::End { name });
            i = end + 1;
            continue;
        }

        // <name attr=...>
        if next.is_some_and(|c| c.is_ascii_alphabetic()) {
            let Some(end) = find_tag_end(&chars, i + 1) else {
                text.extend(&chars[i..]);
                break;
            };
            flush(&mut text, &mut tokens);

            let body = &chars[i + 1..end];
            let name = read_name(body);
            let self_closing = body.last() == Some(&'/');
            let attrs = parse_attrs(&body[name.chars().count()..]);
            i = end + 1;

            let raw = RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing;
            tokens.push(Token::Start {
                name: name.clone(),
                attrs,
                self_closing,
            });

            if raw {
                let close = find_close_tag(&chars, i, &name);
                let content: String = chars[i..close.unwrap_or(chars.len())].iter().collect();
                if !content.is_empty() {
                    tokens.push(Token::Text(content));
                }
                match close {
                    Some(start) => {
                        tokens.push(Token::End { name });
                        i = find_char(&chars, start, '>').map_or(chars.len(), |end| end + 1);
                    }
                    None => i = chars.len(),
                }
            }
            continue;
        }

        // A lone '<' is just text.
        text.push('<');
        i += 1;
    }

    flush(&mut text, &mut tokens);
    tokens
}

fn starts_with_at(chars: &[char], at: usize, pat: &str) -> bool {
    let pat: Vec<char> = pat.chars().collect();
    chars.len() >= at + pat.len() && chars[at..at + pat.len()] == pat[..]
}

fn find_from(chars: &[char], from: usize, pat: &str) -> Option<usize> {
    (from..chars.len()).find(|&i| starts_with_at(chars, i, pat))
}

fn find_char(chars: &[char], from: usize, c: char) -> Option<usize> {
    chars[from..].iter().position(|&x| x == c).map(|p| from + p)
}

/// Finds the `>` closing a start tag, skipping over quoted attribute values.
fn find_tag_end(chars: &[char], from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, &c) in chars[from..].iter().enumerate() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(from + offset),
            (None, _) => {}
        }
    }
    None
}

/// Finds `</name` (case-insensitive) at or after `from`.
fn find_close_tag(chars: &[char], from: usize, name: &str) -> Option<usize> {
    let needle: Vec<char> = format!("</{name}").chars().collect();
    (from..chars.len()).find(|&i| {
        chars.len() >= i + needle.len()
            && chars[i..i + needle.len()]
                .iter()
                .zip(&needle)
                .all(|(a, b)| a.to_ascii_lowercase() == *b)
    })
}

fn read_name(chars: &[char]) -> String {
    chars
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric() || **c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn parse_attrs(chars: &[char]) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && (chars[i].is_whitespace() || chars[i] == '/') {
            i += 1;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && !matches!(chars[i], '=' | '/') {
            i += 1;
        }
        if start == i {
            break;
        }
        let key: String = chars[start..i].iter().map(|c| c.to_ascii_lowercase()).collect();

        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if chars.get(i) == Some(&'=') {
            i += 1;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            match chars.get(i) {
                Some(&q) if q == '"' || q == '\'' => {
                    i += 1;
                    let value_start = i;
                    while i < chars.len() && chars[i] != q {
                        i += 1;
                    }
                    value = chars[value_start..i].iter().collect();
                    i += 1;
                }
                _ => {
                    let value_start = i;
                    while i < chars.len() && !chars[i].is_whitespace() {
                        i += 1;
                    }
                    value = chars[value_start..i].iter().collect();
                }
            }
        }
        attrs.push((key, decode_entities(&value)));
    }

    attrs
}

/// Furthest the closing `;` may sit from its `&`.
const MAX_ENTITY_LEN: usize = 10;

/// Decodes the handful of named entities Python-Markdown emits plus numeric
/// references. Unknown entities are left as written.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        // Entities are short; only look for the `;` within the next few bytes
        let decoded = rest
            .bytes()
            .take(MAX_ENTITY_LEN + 1)
            .position(|b| b == b';')
            .and_then(|semi| {
                let entity = &rest[1..semi];
                let c = match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => entity
                        .strip_prefix("#x")
                        .or_else(|| entity.strip_prefix("#X"))
                        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                        .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                        .and_then(char::from_u32),
                };
                c.map(|c| (c, semi))
            });

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Sanitizers
// ============================================================================

/// Decides which parts of untrusted markup survive.
pub trait MarkupSanitizer: Send + Sync {
    /// Returns the name of the sanitizer, for logs.
    fn name(&self) -> &str;

    fn sanitize(&self, tokens: Vec<Token>) -> Vec<Token>;
}

/// Default sanitizer: formatting elements only, no attributes except a code
/// language hint and http(s)/mailto links, no control characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowListSanitizer;

impl MarkupSanitizer for AllowListSanitizer {
    fn name(&self) -> &str {
        "allow-list"
    }

    fn sanitize(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut out = Vec::with_capacity(tokens.len());
        // Names of dropped elements we are currently inside, innermost last.
        let mut dropping: Vec<String> = Vec::new();
        let mut removed = 0usize;

        for token in tokens {
            if !dropping.is_empty() {
                match &token {
                    Token::Start {
                        name,
                        self_closing: false,
                        ..
                    } if DROPPED_ELEMENTS.contains(&name.as_str()) => dropping.push(name.clone()),
                    Token::End { name } if dropping.last() == Some(name) => {
                        dropping.pop();
                    }
                    _ => {}
                }
                removed += 1;
                continue;
            }

            match token {
                Token::Start {
                    name, self_closing, ..
                } if DROPPED_ELEMENTS.contains(&name.as_str()) => {
                    if !self_closing && !is_void(&name) {
                        dropping.push(name);
                    }
                    removed += 1;
                }
                Token::Start {
                    name,
                    attrs,
                    self_closing,
                } if ALLOWED_ELEMENTS.contains(&name.as_str()) => {
                    let attrs = filter_attrs(&name, attrs);
                    out.push(Token::Start {
                        name,
                        attrs,
                        self_closing,
                    });
                }
                Token::End { name } if ALLOWED_ELEMENTS.contains(&name.as_str()) => {
                    out.push(Token::End { name });
                }
                Token::Start { .. } | Token::End { .. } => removed += 1,
                Token::Text(text) => {
                    let clean = strip_control_chars(&text);
                    if !clean.is_empty() {
                        out.push(Token::Text(clean));
                    }
                }
            }
        }

        if removed > 0 {
            debug!("Sanitizer removed {} token(s)", removed);
        }
        out
    }
}

/// Keeps markup exactly as the server sent it.
///
/// Only for backends you control: a hostile server can inject arbitrary
/// content, including raw escape sequences written straight to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustedMarkup;

impl MarkupSanitizer for TrustedMarkup {
    fn name(&self) -> &str {
        "trusted (unsanitized)"
    }

    fn sanitize(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
    }
}

fn filter_attrs(element: &str, attrs: Vec<(String, String)>) -> Vec<(String, String)> {
    attrs
        .into_iter()
        .filter_map(|(key, value)| match (element, key.as_str()) {
            ("code", "class") => value
                .split_whitespace()
                .find_map(|class| class.strip_prefix("language-"))
                .map(|lang| {
                    let lang: String = lang
                        .chars()
                        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '#' | '-'))
                        .collect();
                    (key, format!("language-{lang}"))
                }),
            ("a", "href") if is_safe_href(&value) => Some((key, value)),
            _ => None,
        })
        .collect()
}

fn is_safe_href(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    let scheme_ok = ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme));
    scheme_ok && !href.chars().any(|c| c.is_control() || c.is_whitespace())
}

/// Removes control characters other than newline and tab.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect()
}

// ============================================================================
// SafeMarkup
// ============================================================================

/// Markup that has passed through a [`MarkupSanitizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeMarkup {
    tokens: Vec<Token>,
}

impl SafeMarkup {
    pub fn from_untrusted(raw: &str, sanitizer: &dyn MarkupSanitizer) -> Self {
        Self {
            tokens: sanitizer.sanitize(tokenize(raw)),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Flattens the markup to readable text: block elements on their own
    /// lines, list items bulleted, whitespace collapsed outside `<pre>`.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        let mut lists: Vec<Option<u64>> = Vec::new();
        let mut pre_depth = 0usize;
        let mut link: Option<String> = None;

        let newline = |out: &mut String| {
            let kept = out.trim_end_matches(' ').len();
            out.truncate(kept);
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
        };

        for token in &self.tokens {
            match token {
                Token::Start { name, .. } => match name.as_str() {
                    "br" => {
                        let kept = out.trim_end_matches(' ').len();
                        out.truncate(kept);
                        out.push('\n');
                    }
                    "li" => {
                        newline(&mut out);
                        let indent = "  ".repeat(lists.len().saturating_sub(1));
                        match lists.last_mut() {
                            Some(Some(n)) => {
                                out.push_str(&format!("{indent}{n}. "));
                                *n += 1;
                            }
                            _ => out.push_str(&format!("{indent}- ")),
                        }
                    }
                    "ul" => {
                        newline(&mut out);
                        lists.push(None);
                    }
                    "ol" => {
                        newline(&mut out);
                        lists.push(Some(1));
                    }
                    "hr" => {
                        newline(&mut out);
                        out.push_str("---\n");
                    }
                    "pre" => {
                        newline(&mut out);
                        pre_depth += 1;
                    }
                    "td" | "th" if !out.ends_with('\n') && !out.is_empty() => out.push_str(" | "),
                    "a" => link = token.attr("href").map(str::to_string),
                    other if BLOCK_ELEMENTS.contains(&other) => newline(&mut out),
                    _ => {}
                },
                Token::End { name } => match name.as_str() {
                    "ul" | "ol" => {
                        lists.pop();
                        newline(&mut out);
                    }
                    "pre" => {
                        pre_depth = pre_depth.saturating_sub(1);
                        newline(&mut out);
                    }
                    "a" => {
                        if let Some(href) = link.take() {
                            out.push_str(&format!(" ({href})"));
                        }
                    }
                    other if BLOCK_ELEMENTS.contains(&other) => newline(&mut out),
                    _ => {}
                },
                Token::Text(text) if pre_depth > 0 => out.push_str(text),
                Token::Text(text) => {
                    let collapsed = collapse_whitespace(text);
                    let at_line_start = out.is_empty() || out.ends_with('\n');
                    out.push_str(if at_line_start {
                        collapsed.trim_start()
                    } else {
                        &collapsed
                    });
                }
            }
        }

        out.trim().to_string()
    }
}

/// Collapses every whitespace run to one space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
