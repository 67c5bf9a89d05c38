use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};
use tracing::{debug, warn};

use super::escape_html;

/// Code-block highlighter backed by syntect's bundled syntaxes and themes.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl Highlighter {
    pub fn new(theme: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        if !theme_set.themes.contains_key(theme) {
            warn!("Unknown highlight theme '{}', falling back to a bundled one", theme);
        }

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme: theme.to_string(),
        }
    }

    fn syntax(&self, lang: Option<&str>) -> &SyntaxReference {
        lang.and_then(|token| self.syntax_set.find_syntax_by_token(token))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme)
            .or_else(|| self.theme_set.themes.get(super::DEFAULT_THEME))
            .or_else(|| self.theme_set.themes.values().next())
    }

    /// Highlight `code` as inline-styled HTML spans (no surrounding `<pre>`).
    pub fn to_html(&self, code: &str, lang: Option<&str>) -> String {
        let Some(theme) = self.theme() else {
            return escape_html(code);
        };

        let mut highlighter = HighlightLines::new(self.syntax(lang), theme);
        let mut out = String::with_capacity(code.len() * 2);
        for line in LinesWithEndings::from(code) {
            let html = highlighter
                .highlight_line(line, &self.syntax_set)
                .map_err(|e| debug!("Highlighting failed: {}", e))
                .and_then(|ranges| {
                    styled_line_to_highlighted_html(&ranges[..], IncludeBackground::No)
                        .map_err(|e| debug!("Highlight HTML failed: {}", e))
                })
                .unwrap_or_else(|()| escape_html(line));
            out.push_str(&html);
        }
        out
    }

    /// Highlight `code` with 24-bit terminal escapes, ending with a reset.
    pub fn to_ansi(&self, code: &str, lang: Option<&str>) -> String {
        let Some(theme) = self.theme() else {
            return code.to_string();
        };

        let mut highlighter = HighlightLines::new(self.syntax(lang), theme);
        let mut out = String::with_capacity(code.len() * 4);
        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges[..], false)),
                Err(e) => {
                    debug!("Highlighting failed: {}", e);
                    out.push_str(line);
                }
            }
        }
        out.push_str("\x1b[0m");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_language_gets_styled_spans() {
        let highlighter = Highlighter::new(super::super::DEFAULT_THEME);
        let html = highlighter.to_html("fn main() {}\n", Some("rust"));
        assert!(html.contains("<span style="));
        assert!(html.contains("main"));
    }

    #[test]
    fn unknown_language_still_escapes() {
        let highlighter = Highlighter::new("no-such-theme");
        let html = highlighter.to_html("<b>&</b>\n", Some("not-a-language"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn ansi_output_resets_at_the_end() {
        let highlighter = Highlighter::new(super::super::DEFAULT_THEME);
        let ansi = highlighter.to_ansi("let x = 1;\n", Some("rs"));
        assert!(ansi.contains("\x1b[38;2;"));
        assert!(ansi.ends_with("\x1b[0m"));
    }
}
