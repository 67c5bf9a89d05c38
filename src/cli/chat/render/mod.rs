//! Render targets: where the chat controller puts its message bubbles.

pub mod html;
pub mod terminal;

use std::io;

use super::message::Message;

pub use terminal::TerminalView;

/// A sink that displays the conversation.
///
/// A target holds at most one loading placeholder; `show_loading` while one
/// is visible does not add a second, and `remove_loading` without one is a
/// no-op.
pub trait RenderTarget {
    fn append(&mut self, message: Message) -> io::Result<()>;

    fn show_loading(&mut self) -> io::Result<()>;

    fn remove_loading(&mut self) -> io::Result<()>;

    /// Make the most recent content visible.
    fn scroll_to_latest(&mut self) -> io::Result<()>;

    /// Drop every message and any loading placeholder.
    fn clear(&mut self) -> io::Result<()>;
}

/// Forwards every operation to two targets, `primary` first. Both targets
/// see every call; the first error is returned after both have run.
pub struct Tee<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A, B> Tee<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: RenderTarget, B: RenderTarget> RenderTarget for Tee<A, B> {
    fn append(&mut self, message: Message) -> io::Result<()> {
        let first = self.primary.append(message.clone());
        first.and(self.secondary.append(message))
    }

    fn show_loading(&mut self) -> io::Result<()> {
        let first = self.primary.show_loading();
        first.and(self.secondary.show_loading())
    }

    fn remove_loading(&mut self) -> io::Result<()> {
        let first = self.primary.remove_loading();
        first.and(self.secondary.remove_loading())
    }

    fn scroll_to_latest(&mut self) -> io::Result<()> {
        let first = self.primary.scroll_to_latest();
        first.and(self.secondary.scroll_to_latest())
    }

    fn clear(&mut self) -> io::Result<()> {
        let first = self.primary.clear();
        first.and(self.secondary.clear())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cli::chat::conversation_state::ConversationState;
    use crate::markdown::RichText;

    /// A terminal whose pipe has gone away.
    struct BrokenPipe;

    impl RenderTarget for BrokenPipe {
        fn append(&mut self, _: Message) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn show_loading(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn remove_loading(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn scroll_to_latest(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn clear(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    fn state() -> ConversationState {
        ConversationState::new(Arc::new(RichText::default()))
    }

    #[test]
    fn forwards_to_both_targets() {
        let mut tee = Tee::new(state(), state());
        tee.append(Message::user("hi")).unwrap();
        tee.show_loading().unwrap();
        assert!(tee.primary.is_loading() && tee.secondary.is_loading());

        tee.remove_loading().unwrap();
        tee.scroll_to_latest().unwrap();
        for side in [&tee.primary, &tee.secondary] {
            assert_eq!(side.len(), 1);
            assert!(!side.is_loading());
            assert!(side.is_scrolled_to_latest());
        }

        tee.clear().unwrap();
        assert!(tee.primary.is_empty() && tee.secondary.is_empty());
    }

    #[test]
    fn failing_primary_still_reaches_secondary() {
        let mut tee = Tee::new(BrokenPipe, state());

        let err = tee.append(Message::bot_formatted("**answer**")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(tee.show_loading().is_err());
        assert!(tee.remove_loading().is_err());

        assert_eq!(tee.secondary.last().map(|m| m.content.as_str()), Some("**answer**"));
        assert!(!tee.secondary.is_loading());
        assert!(tee.secondary.to_html().contains("<strong>answer</strong>"));

        assert!(tee.clear().is_err());
        assert!(tee.secondary.is_empty());
    }
}
