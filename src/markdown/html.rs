use pulldown_cmark::{html, Event, Tag, TagEnd};

use super::{escape_html, fence_language, RichText};

impl RichText {
    /// Render markdown to an HTML fragment.
    pub fn to_html(&self, src: &str) -> String {
        let mut events = Vec::new();
        let mut block: Option<(Option<String>, String)> = None;

        for event in self.events(src) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    block = Some((fence_language(&kind), String::new()));
                }
                Event::Text(text) if block.is_some() => {
                    if let Some((_, body)) = block.as_mut() {
                        body.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, body)) = block.take() {
                        events.push(Event::Html(self.code_block_html(&body, lang.as_deref()).into()));
                    }
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(src.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn code_block_html(&self, code: &str, lang: Option<&str>) -> String {
        let highlighted = self.highlighter.to_html(code, lang);
        match lang {
            Some(lang) => format!(
                "<pre><code class=\"language-{}\">{}</code></pre>\n",
                escape_html(lang),
                highlighted
            ),
            None => format!("<pre><code>{}</code></pre>\n", highlighted),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::markdown::{RawHtml, RenderOptions, RichText};

    fn escaping() -> RichText {
        RichText::new(RenderOptions {
            raw_html: RawHtml::Escape,
            ..Default::default()
        })
    }

    #[test]
    fn bold_is_rendered_not_literal() {
        let html = RichText::default().to_html("**bold**");
        assert_eq!(html, "<p><strong>bold</strong></p>\n");
    }

    #[test]
    fn single_newlines_become_breaks() {
        let html = RichText::default().to_html("first\nsecond");
        assert_eq!(html, "<p>first<br />\nsecond</p>\n");

        let soft = RichText::new(RenderOptions {
            hard_breaks: false,
            ..Default::default()
        });
        assert_eq!(soft.to_html("first\nsecond"), "<p>first\nsecond</p>\n");
    }

    #[test]
    fn github_extensions_are_enabled() {
        let rich_text = RichText::default();
        assert!(rich_text.to_html("~~gone~~").contains("<del>gone</del>"));

        let table = rich_text.to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(table.contains("<table>"));
        assert!(table.contains("<td>1</td>"));

        let tasks = rich_text.to_html("- [x] done\n- [ ] todo\n");
        assert!(tasks.contains("type=\"checkbox\""));
    }

    #[test]
    fn embedded_html_is_rendered_by_default() {
        let html = RichText::default().to_html("press <kbd>Enter</kbd>");
        assert!(html.contains("<kbd>Enter</kbd>"));
    }

    #[test]
    fn embedded_html_can_be_escaped() {
        let html = escaping().to_html("press <kbd>Enter</kbd>\n\n<div>block</div>\n");
        assert!(html.contains("&lt;kbd&gt;Enter&lt;/kbd&gt;"));
        assert!(html.contains("&lt;div&gt;block&lt;/div&gt;"));
        assert!(!html.contains("<kbd>"));
        assert!(!html.contains("<div>"));
    }

    #[test]
    fn fenced_code_is_highlighted() {
        let html = RichText::default().to_html("```rust\nfn main() {}\n```\n");
        assert!(html.starts_with("<pre><code class=\"language-rust\">"));
        assert!(html.contains("<span style="));
        assert!(!html.contains("```"));
    }

    #[test]
    fn code_without_language_is_escaped() {
        let html = escaping().to_html("    <script>alert(1)</script>\n");
        assert!(html.starts_with("<pre><code>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
