use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Clear,
    Help,
    Quit,
    Save(PathBuf),
    MissingArgument { command: &'static str, argument: &'static str },
    Unknown(String),
}

fn slash_command() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/([A-Za-z]+)(?:\s+(.+))?$").expect("slash command pattern is valid"))
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        // `//text` sends `/text` as a query.
        if let Some(rest) = trimmed.strip_prefix("//") {
            return Command::Ask(format!("/{}", rest));
        }
        let Some(captures) = slash_command().captures(trimmed) else {
            return Command::Ask(line.to_string());
        };

        let name = captures.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
        let argument = captures.get(2).map(|m| m.as_str().trim());

        match name.as_str() {
            "clear" | "new" => Command::Clear,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "save" => match argument {
                Some(path) => Command::Save(PathBuf::from(path)),
                None => Command::MissingArgument {
                    command: "/save",
                    argument: "path",
                },
            },
            _ => Command::Unknown(format!("/{}", name)),
        }
    }
}
