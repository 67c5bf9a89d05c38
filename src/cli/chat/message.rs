use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

/// One bubble in the conversation. Never changes once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Render `content` as markdown. Only ever true for bot messages.
    pub is_formatted: bool,
    pub sent_at: DateTime<Local>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, is_formatted: bool) -> Self {
        Self {
            role,
            content: content.into(),
            is_formatted: is_formatted && role == Role::Bot,
            sent_at: Local::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, false)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content, false)
    }

    pub fn bot_formatted(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content, true)
    }
}
