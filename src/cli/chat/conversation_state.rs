use std::io;
use std::sync::Arc;

use super::message::Message;
use super::render::{html, RenderTarget};
use crate::markdown::RichText;

/// A message together with the markup it was rendered to.
#[derive(Debug, Clone)]
pub struct Bubble {
    pub message: Message,
    pub markup: String,
}

#[derive(Debug, Clone)]
enum Entry {
    Message(Bubble),
    Loading,
}

/// In-memory conversation view. Keeps every bubble's HTML so the whole
/// exchange can be written out as a transcript.
pub struct ConversationState {
    entries: Vec<Entry>,
    rich_text: Arc<RichText>,
    scrolled_to: usize,
}

impl ConversationState {
    pub fn new(rich_text: Arc<RichText>) -> Self {
        Self {
            entries: Vec::new(),
            rich_text,
            scrolled_to: 0,
        }
    }

    pub fn bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Message(bubble) => Some(bubble),
            Entry::Loading => None,
        })
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.bubbles().map(|bubble| &bubble.message)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages().last()
    }

    /// Number of messages, not counting a loading placeholder.
    pub fn len(&self) -> usize {
        self.bubbles().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.entries.iter().any(|entry| matches!(entry, Entry::Loading))
    }

    /// Whether the last scroll happened after the newest entry was added.
    pub fn is_scrolled_to_latest(&self) -> bool {
        self.scrolled_to == self.entries.len()
    }

    /// The conversation as an HTML fragment, loading placeholder included.
    pub fn to_html(&self) -> String {
        html::transcript(self.entries.iter().map(|entry| match entry {
            Entry::Message(bubble) => bubble.markup.as_str(),
            Entry::Loading => html::LOADING_BUBBLE,
        }))
    }
}

impl RenderTarget for ConversationState {
    fn append(&mut self, message: Message) -> io::Result<()> {
        let markup = html::bubble(&message, &self.rich_text);
        self.entries.push(Entry::Message(Bubble { message, markup }));
        Ok(())
    }

    fn show_loading(&mut self) -> io::Result<()> {
        if !self.is_loading() {
            self.entries.push(Entry::Loading);
        }
        Ok(())
    }

    fn remove_loading(&mut self) -> io::Result<()> {
        self.entries.retain(|entry| !matches!(entry, Entry::Loading));
        Ok(())
    }

    fn scroll_to_latest(&mut self) -> io::Result<()> {
        self.scrolled_to = self.entries.len();
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.entries.clear();
        self.scrolled_to = 0;
        Ok(())
    }
}
