//! Terminal chat client for `POST /ask` query endpoints.
//!
//! [`cli::chat::controller::ChatController`] drives a conversation on any
//! [`cli::chat::render::RenderTarget`]; the binary wires it to the terminal.

pub mod ask_client;
pub mod cli;
pub mod config;
pub mod markdown;

#[cfg(test)]
pub(crate) mod test_support;
