use std::io::{self, Write};
use std::sync::Arc;

use crossterm::cursor::{MoveTo, MoveToColumn};
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

use super::RenderTarget;
use crate::cli::chat::message::{Message, Role};
use crate::markdown::RichText;

const CONTENT_INDENT: &str = "   ";

/// Colours used for the bubble headers.
#[derive(Debug, Clone)]
struct BubbleStyle {
    user_color: Color,
    bot_color: Color,
    meta_color: Color,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            user_color: Color::Green,
            bot_color: Color::Cyan,
            meta_color: Color::DarkGrey,
        }
    }
}

/// Renders bubbles to a terminal. The loading indicator sits on its own
/// unterminated line so it can be erased in place.
pub struct TerminalView {
    output: Box<dyn Write>,
    rich_text: Arc<RichText>,
    style: BubbleStyle,
    loading: bool,
}

impl TerminalView {
    pub fn new(output: Box<dyn Write>, rich_text: Arc<RichText>) -> Self {
        Self {
            output,
            rich_text,
            style: BubbleStyle::default(),
            loading: false,
        }
    }

    fn header(&self, role: Role) -> (&'static str, &'static str, Color) {
        match role {
            Role::User => ("👤", "You", self.style.user_color),
            Role::Bot => ("🤖", "Bot", self.style.bot_color),
        }
    }
}

impl RenderTarget for TerminalView {
    fn append(&mut self, message: Message) -> io::Result<()> {
        let (icon, label, color) = self.header(message.role);
        let body = if message.is_formatted {
            self.rich_text.to_ansi(&message.content)
        } else {
            message.content.clone()
        };

        queue!(
            self.output,
            Print(icon),
            Print(" "),
            SetForegroundColor(color),
            SetAttribute(Attribute::Bold),
            Print(label),
            SetAttribute(Attribute::Reset),
            SetForegroundColor(self.style.meta_color),
            Print(format!(" {}", message.sent_at.format("%H:%M"))),
            ResetColor,
            Print("\n")
        )?;
        for line in body.lines() {
            queue!(self.output, Print(CONTENT_INDENT), Print(line), Print("\n"))?;
        }
        queue!(self.output, ResetColor, Print("\n"))?;
        self.output.flush()
    }

    fn show_loading(&mut self) -> io::Result<()> {
        if self.loading {
            return Ok(());
        }
        let (icon, _, color) = self.header(Role::Bot);
        queue!(
            self.output,
            Print(icon),
            Print(" "),
            SetForegroundColor(color),
            SetAttribute(Attribute::Dim),
            Print("typing…"),
            SetAttribute(Attribute::Reset),
            ResetColor
        )?;
        self.loading = true;
        self.output.flush()
    }

    fn remove_loading(&mut self) -> io::Result<()> {
        if !self.loading {
            return Ok(());
        }
        queue!(self.output, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        self.loading = false;
        self.output.flush()
    }

    fn scroll_to_latest(&mut self) -> io::Result<()> {
        // New lines already scroll the terminal; make sure they are out.
        self.output.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        self.loading = false;
        queue!(
            self.output,
            Clear(ClearType::All),
            Clear(ClearType::Purge),
            MoveTo(0, 0)
        )?;
        self.output.flush()
    }
}
