//! Sanitized markup → ratatui `Text` renderer.
//!
//! Walks the token list of a [`SafeMarkup`] and converts it into styled
//! `Line`/`Span` values. Headings, bold, italic, underline, strikethrough,
//! inline code, `<pre>` code blocks (with syntect highlighting when the
//! block carries a `language-*` class), lists, blockquotes, tables, and links.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::core::markup::{SafeMarkup, Token, collapse_whitespace};

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";

/// Render sanitized markup into styled `Text` using `base_fg` for body text.
pub fn render(markup: &SafeMarkup, base_fg: Color) -> Text<'static> {
    let mut w = Writer::new(base_fg);
    for token in markup.tokens() {
        w.handle(token);
    }
    w.text
}

// ── Writer ──────────────────────────────────────────────────────────────────

/// State of the `<pre>` element currently open, if any.
struct PreBlock {
    /// Top border written yet? Deferred until we know the language.
    opened: bool,
    /// Still at the very start of the block (a leading newline is dropped).
    at_start: bool,
}

struct Writer {
    text: Text<'static>,
    base_fg: Color,
    /// Style stack tagged with the element that pushed each entry.
    /// Styles compose via `patch`.
    styles: Vec<(String, Style)>,
    /// Per-line prefix spans (blockquote and code block `│`), tagged the same way.
    line_prefixes: Vec<(&'static str, Span<'static>)>,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    pre: Option<PreBlock>,
    highlighter: Option<HighlightLines<'static>>,
    /// Link target, appended after the link text closes.
    link_url: Option<String>,
    /// Blank line before the next block element.
    needs_blank: bool,
    /// Next span starts a new line.
    line_closed: bool,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base_fg,
            styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            pre: None,
            highlighter: None,
            link_url: None,
            needs_blank: false,
            line_closed: true,
        }
    }

    // ── Style helpers ───────────────────────────────────────────────────

    fn style(&self) -> Style {
        self.styles
            .last()
            .map(|(_, style)| *style)
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, tag: &str, overlay: Style) {
        let style = self.style().patch(overlay);
        self.styles.push((tag.to_string(), style));
    }

    /// Pops back to (and including) the innermost style `tag` pushed,
    /// which also ends anything left unclosed inside it. False when `tag`
    /// never pushed one, i.e. the close tag is stray.
    fn pop_style(&mut self, tag: &str) -> bool {
        match self.styles.iter().rposition(|(t, _)| t == tag) {
            Some(i) => {
                self.styles.truncate(i);
                true
            }
            None => false,
        }
    }

    fn pop_prefix(&mut self, tag: &str) -> bool {
        match self.line_prefixes.iter().rposition(|(t, _)| *t == tag) {
            Some(i) => {
                self.line_prefixes.remove(i);
                true
            }
            None => false,
        }
    }

    // ── Line/span helpers ───────────────────────────────────────────────

    fn push_line(&mut self, line: Line<'static>) {
        let mut out = line;
        for (_, pfx) in self.line_prefixes.iter().rev() {
            out.spans.insert(0, pfx.clone());
        }
        self.text.lines.push(out);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.line_closed || self.text.lines.is_empty() {
            self.push_line(Line::default());
            self.line_closed = false;
        }
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        }
    }

    fn start_block(&mut self) {
        if self.needs_blank && !self.text.lines.is_empty() {
            self.push_line(Line::default());
        }
        self.needs_blank = false;
        self.line_closed = true;
    }

    fn end_block(&mut self) {
        self.needs_blank = true;
        self.line_closed = true;
    }

    fn at_line_start(&self) -> bool {
        self.line_closed || self.text.lines.is_empty()
    }

    // ── Token dispatch ──────────────────────────────────────────────────

    fn handle(&mut self, token: &Token) {
        match token {
            Token::Start { name, .. } => self.open(name, token),
            Token::End { name } => self.close(name),
            Token::Text(t) if self.pre.is_some() => self.code_text(t),
            Token::Text(t) => self.inline_text(t),
        }
    }

    fn open(&mut self, name: &str, token: &Token) {
        match name {
            // ── Block elements ──────────────────────────────────────────
            "p" | "table" => self.start_block(),
            "div" | "tr" => self.line_closed = true,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.start_block();
                let depth = heading_depth(name);
                let hs = heading_style(self.base_fg, depth);
                self.push_span(Span::styled(format!("{} ", "#".repeat(depth)), hs));
                self.push_style(name, hs);
            }
            "blockquote" => {
                self.start_block();
                self.line_prefixes.push((
                    "blockquote",
                    Span::styled("│ ", Style::default().fg(Color::DarkGray)),
                ));
                self.push_style(
                    name,
                    Style::default()
                        .fg(self.base_fg)
                        .add_modifier(Modifier::DIM | Modifier::ITALIC),
                );
            }
            "pre" => {
                self.start_block();
                self.pre = Some(PreBlock {
                    opened: false,
                    at_start: true,
                });
            }
            "code" if self.pre.as_ref().is_some_and(|p| !p.opened) => {
                let lang = token
                    .attr("class")
                    .and_then(|c| c.strip_prefix("language-"))
                    .filter(|l| !l.is_empty());
                self.open_code_block(lang);
            }
            "code" if self.pre.is_some() => {}
            "ul" | "ol" => {
                if self.list_indices.is_empty() {
                    self.start_block();
                }
                self.list_indices
                    .push(if name == "ol" { Some(1) } else { None });
            }
            "li" => {
                self.line_closed = true;
                let depth = self.list_indices.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                let marker = match self.list_indices.last_mut() {
                    Some(Some(n)) => {
                        let s = format!("{indent}{n}. ");
                        *n += 1;
                        s
                    }
                    _ => format!("{indent}- "),
                };
                self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            "br" => {
                if self.line_closed {
                    self.push_line(Line::default());
                }
                self.line_closed = true;
            }
            "hr" => {
                self.start_block();
                self.push_line(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                )));
                self.end_block();
            }
            "td" | "th" => {
                if !self.at_line_start() {
                    self.push_span(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
                }
                if name == "th" {
                    self.push_style(name, Style::default().add_modifier(Modifier::BOLD));
                }
            }

            // ── Inline elements ─────────────────────────────────────────
            "strong" | "b" => self.push_style(name, Style::default().add_modifier(Modifier::BOLD)),
            "em" | "i" => self.push_style(name, Style::default().add_modifier(Modifier::ITALIC)),
            "u" => self.push_style(name, Style::default().add_modifier(Modifier::UNDERLINED)),
            "del" | "s" => {
                self.push_style(name, Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            "code" => {
                self.push_style(name, Style::default().fg(Color::White).bg(Color::DarkGray))
            }
            "a" => {
                self.link_url = token.attr("href").map(str::to_string);
                self.push_style(
                    name,
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {} // span, thead, tbody, and anything a trusting sanitizer let through
        }
    }

    /// Close tags that don't match an open element are ignored.
    fn close(&mut self, name: &str) {
        match name {
            "p" | "table" => self.end_block(),
            "div" | "tr" => self.line_closed = true,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if self.pop_style(name) {
                    self.end_block();
                }
            }
            "blockquote" => {
                if self.pop_prefix(name) {
                    self.pop_style(name);
                    self.end_block();
                }
            }
            "pre" => {
                if self.pre.take().is_some_and(|p| p.opened) {
                    self.close_code_block();
                }
                self.end_block();
            }
            "code" if self.pre.is_some() => {}
            "ul" | "ol" => {
                self.list_indices.pop();
                if self.list_indices.is_empty() {
                    self.end_block();
                } else {
                    self.line_closed = true;
                }
            }
            "th" | "strong" | "b" | "em" | "i" | "u" | "del" | "s" | "code" => {
                self.pop_style(name);
            }
            "a" => {
                if !self.pop_style(name) {
                    return;
                }
                if let Some(url) = self.link_url.take() {
                    self.push_span(Span::raw(" ("));
                    self.push_span(Span::styled(
                        url,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::UNDERLINED),
                    ));
                    self.push_span(Span::raw(")"));
                }
            }
            _ => {}
        }
    }

    // ── Code blocks ─────────────────────────────────────────────────────

    fn open_code_block(&mut self, lang: Option<&str>) {
        let bs = Style::default().fg(Color::DarkGray);
        let top = match lang {
            Some(lang) => Line::from(vec![
                Span::styled("╭── ", bs),
                Span::styled(lang.to_owned(), bs.add_modifier(Modifier::BOLD)),
                Span::styled(" ──", bs),
            ]),
            None => Line::from(Span::styled("╭──", bs)),
        };
        self.push_line(top);
        self.line_prefixes.push(("pre", Span::styled("│ ", bs)));

        self.highlighter = lang
            .and_then(|l| SYNTAX_SET.find_syntax_by_token(l))
            .and_then(|syn| {
                THEME_SET
                    .themes
                    .get(CODE_THEME)
                    .map(|theme| HighlightLines::new(syn, theme))
            });

        if let Some(pre) = self.pre.as_mut() {
            pre.opened = true;
        }
    }

    fn close_code_block(&mut self) {
        self.highlighter = None;
        self.pop_prefix("pre");
        self.push_line(Line::from(Span::styled(
            "╰──",
            Style::default().fg(Color::DarkGray),
        )));
        self.line_closed = true;
    }

    fn code_text(&mut self, raw: &str) {
        if self.pre.as_ref().is_some_and(|p| !p.opened) {
            self.open_code_block(None);
        }

        let mut text = raw.replace('\t', "    ");
        if let Some(pre) = self.pre.as_mut()
            && pre.at_start
        {
            pre.at_start = false;
            if text.starts_with('\n') {
                text.remove(0);
            }
        }

        // Take the highlighter out so push_line can borrow self mutably.
        let mut highlighter = self.highlighter.take();
        for line in LinesWithEndings::from(text.as_str()) {
            let spans = match highlighter.as_mut() {
                Some(hl) => highlight_line(hl, line),
                None => vec![Span::styled(
                    line.trim_end_matches('\n').to_owned(),
                    Style::default().fg(Color::White),
                )],
            };
            self.push_line(Line::from(spans));
        }
        self.highlighter = highlighter;
        self.line_closed = true;
    }

    // ── Inline text ─────────────────────────────────────────────────────

    fn inline_text(&mut self, raw: &str) {
        let collapsed = collapse_whitespace(raw);
        let content = if self.at_line_start() {
            collapsed.trim_start().to_string()
        } else {
            collapsed
        };
        if content.is_empty() {
            return;
        }
        let style = self.style();
        self.push_span(Span::styled(content, style));
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn highlight_line(hl: &mut HighlightLines<'static>, line: &str) -> Vec<Span<'static>> {
    match hl.highlight_line(line, &SYNTAX_SET) {
        Ok(ranges) => ranges
            .into_iter()
            .filter_map(|(hl_style, frag)| {
                let content = frag.trim_end_matches('\n');
                if content.is_empty() {
                    return None;
                }
                let fg = Color::Rgb(
                    hl_style.foreground.r,
                    hl_style.foreground.g,
                    hl_style.foreground.b,
                );
                Some(Span::styled(content.to_owned(), Style::default().fg(fg)))
            })
            .collect(),
        Err(e) => {
            log::debug!("Highlighting failed, falling back to plain code: {}", e);
            vec![Span::raw(line.trim_end_matches('\n').to_owned())]
        }
    }
}

fn heading_depth(name: &str) -> usize {
    name.strip_prefix('h')
        .and_then(|d| d.parse().ok())
        .unwrap_or(1)
}

fn heading_style(base_fg: Color, depth: usize) -> Style {
    let modifier = match depth {
        1 => Modifier::BOLD | Modifier::UNDERLINED,
        2 => Modifier::BOLD,
        _ => Modifier::BOLD | Modifier::ITALIC,
    };
    Style::default().fg(base_fg).add_modifier(modifier)
}
