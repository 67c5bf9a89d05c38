use std::io;

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use pulldown_cmark::{Event, Tag, TagEnd};

use super::{fence_language, Highlighter, RichText};

impl RichText {
    /// Render markdown as styled terminal text.
    pub fn to_ansi(&self, src: &str) -> String {
        let mut writer = AnsiWriter::new(&self.highlighter);
        for event in self.events(src) {
            // Writing into a Vec cannot fail.
            let _ = writer.event(event);
        }
        writer.finish()
    }
}

struct AnsiWriter<'h> {
    out: Vec<u8>,
    highlighter: &'h Highlighter,
    /// One entry per open list: the next ordinal, or None for bullets.
    lists: Vec<Option<u64>>,
    code: Option<(Option<String>, String)>,
    quote_depth: usize,
    link: Option<String>,
}

impl<'h> AnsiWriter<'h> {
    fn new(highlighter: &'h Highlighter) -> Self {
        Self {
            out: Vec::new(),
            highlighter,
            lists: Vec::new(),
            code: None,
            quote_depth: 0,
            link: None,
        }
    }

    fn event(&mut self, event: Event<'_>) -> io::Result<()> {
        if let Some((_, body)) = self.code.as_mut() {
            match event {
                Event::Text(text) => body.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, body)) = self.code.take() {
                        let body = indent_lines(&body, &"  ".repeat(self.lists.len()));
                        let highlighted = self.highlighter.to_ansi(&body, lang.as_deref());
                        queue!(self.out, Print(highlighted), ResetColor)?;
                        self.ensure_newline()?;
                        if self.lists.is_empty() {
                            queue!(self.out, Print("\n"))?;
                        }
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => queue!(self.out, Print(&*text)),
            Event::Code(code) => queue!(self.out, SetForegroundColor(Color::Cyan), Print(&*code), ResetColor),
            Event::Html(raw) | Event::InlineHtml(raw) => queue!(
                self.out,
                SetAttribute(Attribute::Dim),
                Print(&*raw),
                SetAttribute(Attribute::NormalIntensity)
            ),
            Event::SoftBreak => queue!(self.out, Print(" ")),
            Event::HardBreak => self.line_break(),
            Event::Rule => {
                self.ensure_newline()?;
                queue!(self.out, Print("────────────────────────────────\n\n"))
            }
            Event::TaskListMarker(done) => queue!(self.out, Print(if done { "[x] " } else { "[ ] " })),
            Event::FootnoteReference(label) => queue!(self.out, Print(format!("[^{}]", &*label))),
            _ => Ok(()),
        }
    }

    fn start(&mut self, tag: Tag<'_>) -> io::Result<()> {
        match tag {
            Tag::Paragraph => self.quote_prefix(),
            Tag::Heading { .. } => {
                self.ensure_newline()?;
                queue!(self.out, SetAttribute(Attribute::Bold), SetAttribute(Attribute::Underlined))
            }
            Tag::BlockQuote { .. } => {
                self.quote_depth += 1;
                queue!(self.out, SetForegroundColor(Color::DarkGrey))
            }
            Tag::CodeBlock(kind) => {
                self.ensure_newline()?;
                self.code = Some((fence_language(&kind), String::new()));
                Ok(())
            }
            Tag::List(start) => {
                self.ensure_newline()?;
                self.lists.push(start);
                Ok(())
            }
            Tag::Item => {
                self.ensure_newline()?;
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                queue!(self.out, Print(indent), Print(marker))
            }
            Tag::Emphasis => queue!(self.out, SetAttribute(Attribute::Italic)),
            Tag::Strong => queue!(self.out, SetAttribute(Attribute::Bold)),
            Tag::Strikethrough => queue!(self.out, SetAttribute(Attribute::CrossedOut)),
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                queue!(self.out, SetAttribute(Attribute::Underlined))
            }
            Tag::Image { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                queue!(self.out, Print("[image: "))
            }
            Tag::Table { .. } => self.ensure_newline(),
            Tag::TableHead => queue!(self.out, SetAttribute(Attribute::Bold)),
            _ => Ok(()),
        }
    }

    fn end(&mut self, tag: TagEnd) -> io::Result<()> {
        match tag {
            TagEnd::Paragraph => {
                self.ensure_newline()?;
                if self.lists.is_empty() {
                    queue!(self.out, Print("\n"))?;
                }
                Ok(())
            }
            TagEnd::Heading { .. } => queue!(self.out, SetAttribute(Attribute::Reset), Print("\n\n")),
            TagEnd::BlockQuote { .. } => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    queue!(self.out, ResetColor)?;
                }
                Ok(())
            }
            TagEnd::List { .. } => {
                self.lists.pop();
                self.ensure_newline()?;
                if self.lists.is_empty() {
                    queue!(self.out, Print("\n"))?;
                }
                Ok(())
            }
            TagEnd::Item => self.ensure_newline(),
            TagEnd::Emphasis => queue!(self.out, SetAttribute(Attribute::NoItalic)),
            TagEnd::Strong => queue!(self.out, SetAttribute(Attribute::NormalIntensity)),
            TagEnd::Strikethrough => queue!(self.out, SetAttribute(Attribute::NotCrossedOut)),
            TagEnd::Link => {
                queue!(self.out, SetAttribute(Attribute::NoUnderline))?;
                match self.link.take() {
                    Some(url) => queue!(
                        self.out,
                        SetForegroundColor(Color::DarkGrey),
                        Print(format!(" ({})", url)),
                        ResetColor
                    ),
                    None => Ok(()),
                }
            }
            TagEnd::Image => {
                let url = self.link.take().unwrap_or_default();
                queue!(self.out, Print(format!("] ({})", url)))
            }
            TagEnd::TableCell => queue!(self.out, Print(" │ ")),
            TagEnd::TableHead => queue!(self.out, SetAttribute(Attribute::NormalIntensity), Print("\n")),
            TagEnd::TableRow => queue!(self.out, Print("\n")),
            TagEnd::Table => queue!(self.out, Print("\n")),
            _ => Ok(()),
        }
    }

    fn line_break(&mut self) -> io::Result<()> {
        queue!(self.out, Print("\n"))?;
        if !self.lists.is_empty() {
            queue!(self.out, Print("  ".repeat(self.lists.len())))?;
        }
        self.quote_prefix()
    }

    fn quote_prefix(&mut self) -> io::Result<()> {
        if self.quote_depth > 0 {
            queue!(self.out, Print("│ ".repeat(self.quote_depth)))?;
        }
        Ok(())
    }

    fn ensure_newline(&mut self) -> io::Result<()> {
        if !self.at_line_start() {
            queue!(self.out, Print("\n"))?;
        }
        Ok(())
    }

    /// True when nothing visible follows the last newline. Trailing SGR
    /// sequences (`ESC [ ... m`) do not count as visible.
    fn at_line_start(&self) -> bool {
        let mut end = self.out.len();
        while let Some(esc) = trailing_sgr(&self.out[..end]) {
            end = esc;
        }
        end == 0 || self.out[end - 1] == b'\n'
    }

    /// Drop trailing newlines, keeping a single reset if styling was cut.
    fn finish(mut self) -> String {
        let mut cut_style = false;
        loop {
            if self.out.last() == Some(&b'\n') {
                self.out.pop();
            } else if let Some(esc) = trailing_sgr(&self.out) {
                self.out.truncate(esc);
                cut_style = true;
            } else {
                break;
            }
        }
        if cut_style {
            self.out.extend_from_slice(b"\x1b[0m");
        }
        String::from_utf8_lossy(&self.out).into_owned()
    }
}

/// Start of the SGR sequence (`ESC [ digits/semicolons m`) that ends `out`.
fn trailing_sgr(out: &[u8]) -> Option<usize> {
    let (&last, text) = out.split_last()?;
    if last != b'm' {
        return None;
    }
    let esc = text.iter().rposition(|&b| b == 0x1b)?;
    let params = &text[esc + 1..];
    let is_sgr = params.first() == Some(&b'[') && params[1..].iter().all(|b| b.is_ascii_digit() || *b == b';');
    is_sgr.then_some(esc)
}

fn indent_lines(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    text.lines().map(|line| format!("{}{}\n", indent, line)).collect()
}
