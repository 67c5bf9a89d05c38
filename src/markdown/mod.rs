//! Rich-text rendering of answers: GitHub-flavoured markdown with
//! syntax-highlighted code blocks, emitted either as HTML or as ANSI text
//! for the terminal.

mod ansi;
mod highlight;
mod html;

use std::fmt;
use std::str::FromStr;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser};
use serde::Deserialize;

pub use highlight::Highlighter;

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// What to do with HTML embedded in markdown.
///
/// Answers come from the configured server, which is trusted by default, so
/// embedded markup is rendered. `Escape` shows it as literal text instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawHtml {
    #[default]
    Render,
    Escape,
}

impl FromStr for RawHtml {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "render" => Ok(RawHtml::Render),
            "escape" => Ok(RawHtml::Escape),
            other => Err(format!("unknown raw html policy '{other}' (expected 'render' or 'escape')")),
        }
    }
}

impl fmt::Display for RawHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RawHtml::Render => "render",
            RawHtml::Escape => "escape",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub raw_html: RawHtml,
    /// Single newlines become line breaks instead of spaces.
    pub hard_breaks: bool,
    /// syntect theme used for code blocks.
    pub theme: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            raw_html: RawHtml::Render,
            hard_breaks: true,
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

/// Markdown renderer. Loading the syntax and theme sets is not free, so
/// build one and share it.
pub struct RichText {
    options: RenderOptions,
    highlighter: Highlighter,
}

impl RichText {
    pub fn new(options: RenderOptions) -> Self {
        let highlighter = Highlighter::new(&options.theme);
        Self { options, highlighter }
    }

    /// Parser events with the line-break and raw-HTML policies applied.
    fn events<'a>(&self, src: &'a str) -> impl Iterator<Item = Event<'a>> + 'a {
        let hard_breaks = self.options.hard_breaks;
        let raw_html = self.options.raw_html;

        Parser::new_ext(src, gfm_options()).map(move |event| match event {
            Event::SoftBreak if hard_breaks => Event::HardBreak,
            Event::Html(raw) | Event::InlineHtml(raw) if raw_html == RawHtml::Escape => Event::Text(raw),
            other => other,
        })
    }
}

impl Default for RichText {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

fn gfm_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// First word of a fenced block's info string, e.g. `rust` for "```rust,ignore".
fn fence_language(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split(|c: char| c.is_whitespace() || c == ',')
            .next()
            .filter(|lang| !lang.is_empty())
            .map(str::to_string),
        CodeBlockKind::Indented => None,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_html_policy_parses() {
        assert_eq!("render".parse::<RawHtml>(), Ok(RawHtml::Render));
        assert_eq!(" Escape ".parse::<RawHtml>(), Ok(RawHtml::Escape));
        assert!("sanitize".parse::<RawHtml>().is_err());
        assert_eq!(RawHtml::Escape.to_string(), "escape");
    }

    #[test]
    fn fence_language_takes_first_token() {
        let fenced = CodeBlockKind::Fenced("rust,ignore".into());
        assert_eq!(fence_language(&fenced).as_deref(), Some("rust"));

        let bare = CodeBlockKind::Fenced("".into());
        assert_eq!(fence_language(&bare), None);
        assert_eq!(fence_language(&CodeBlockKind::Indented), None);
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
