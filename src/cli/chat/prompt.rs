use std::fs;
use std::path::PathBuf;

use rustyline::{Config, Editor, Result};

pub fn generate_prompt(custom_prompt: Option<&str>) -> String {
    custom_prompt.unwrap_or("> ").to_string()
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .history_ignore_dups(true)
        .auto_add_history(false)
        .build();
    Editor::with_config(config)
}

/// Where prompt history is kept between sessions, creating the directory.
pub fn history_path() -> Option<PathBuf> {
    let dir = dirs::data_dir()?.join("ask-chat");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join("history.txt"))
}
