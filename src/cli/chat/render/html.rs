//! Bubble markup for HTML transcripts.

use crate::cli::chat::message::{Message, Role};
use crate::markdown::{escape_html, RichText};

pub const LOADING_BUBBLE: &str = concat!(
    r#"<div class="message bot-message loading">"#,
    r#"<div class="message-icon"><i class="fas fa-robot"></i></div>"#,
    r#"<div class="message-content"><div class="typing-indicator"><span></span><span></span><span></span></div></div>"#,
    "</div>",
);

fn icon_class(role: Role) -> &'static str {
    match role {
        Role::User => "fa-user",
        Role::Bot => "fa-robot",
    }
}

/// Markup for one message. Formatted bot content goes through the markdown
/// renderer; everything else is literal text.
pub fn bubble(message: &Message, rich_text: &RichText) -> String {
    let body = if message.is_formatted {
        rich_text.to_html(&message.content)
    } else {
        escape_html(&message.content)
    };

    format!(
        r#"<div class="message {role}-message"><div class="message-icon"><i class="fas {icon}"></i></div><div class="message-content markdown-content">{body}</div></div>"#,
        role = message.role.as_str(),
        icon = icon_class(message.role),
        body = body,
    )
}

/// Wrap rendered bubbles in the message container.
pub fn transcript<'a>(bubbles: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::from("<div id=\"chat-messages\">\n");
    for bubble in bubbles {
        out.push_str(bubble);
        out.push('\n');
    }
    out.push_str("</div>\n");
    out
}
