pub mod command;
pub mod controller;
pub mod conversation_state;
pub mod message;
pub mod prompt;
pub mod render;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use color_print::cstr;
use command::Command;
use controller::{ChatController, SubmitOutcome};
use conversation_state::ConversationState;
use eyre::{Result, WrapErr};
use futures::future;
use prompt::generate_prompt;
use render::{Tee, TerminalView};
use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};

use crate::ask_client::AskClient;
use crate::config::Config;
use crate::markdown::RichText;

const WELCOME_TEXT: &str = cstr!(
    "
<bold>Hi, I'm Ask Chat.</> Ask me anything.

<dim>/help</>         Show the help dialogue
<dim>/quit</>         Quit the application
"
);

const HELP_TEXT: &str = cstr!(
    "
<bold>Ask Chat</>

<dim>/clear</>        Clear the conversation (also <dim>/new</>)
<dim>/save</> FILE    Save the conversation as HTML
<dim>/help</>         Show this help dialogue
<dim>/quit</>         Quit the application
<dim>//</>text        Send a query that starts with /text

Press <bold>Ctrl-C</> while waiting for an answer to cancel the request.
"
);

type Controller = ChatController<AskClient, Tee<TerminalView, ConversationState>>;

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    controller: Controller,
    transcript: Option<PathBuf>,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        view_output: Box<dyn Write>,
        config: &Config,
        input: Option<String>,
        interactive: bool,
        transcript: Option<PathBuf>,
    ) -> Result<Self> {
        let client = AskClient::new(config).wrap_err("Failed to initialize the ask client")?;
        info!("Sending queries to {}", client.endpoint());

        let rich_text = Arc::new(RichText::new(config.render.clone()));
        let target = Tee::new(
            TerminalView::new(view_output, Arc::clone(&rich_text)),
            ConversationState::new(rich_text),
        );

        Ok(Self {
            output,
            input,
            interactive,
            controller: ChatController::new(client, target, config.request_timeout),
            transcript,
        })
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Non-interactive mode (single query)
        if let Some(input) = self.input.take() {
            let outcome = self.ask(input).await?;
            self.write_transcript_on_exit()?;
            return Ok(match outcome {
                SubmitOutcome::Answered | SubmitOutcome::Ignored => ExitCode::SUCCESS,
                SubmitOutcome::ServerError | SubmitOutcome::TransportError => ExitCode::FAILURE,
            });
        }

        if self.interactive {
            writeln!(self.output, "{}", WELCOME_TEXT)?;
            self.run_interactive().await?;
        }

        self.write_transcript_on_exit()?;
        Ok(ExitCode::SUCCESS)
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;
        let history = prompt::history_path();
        if let Some(path) = &history {
            if rl.load_history(path).is_err() {
                debug!("No prompt history at {}", path.display());
            }
        }

        loop {
            let prompt_text = generate_prompt(None);
            match rl.readline(&prompt_text) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str());

                    if !self.handle_input(line).await? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        if let Some(path) = &history {
            if let Err(e) = rl.save_history(path) {
                warn!("Failed to save prompt history to {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    /// Handle one prompt line. Returns false when the session should end.
    async fn handle_input(&mut self, line: String) -> Result<bool> {
        match Command::parse(&line) {
            Command::Ask(query) => {
                self.ask(query).await?;
            }
            Command::Clear => self.controller.clear_conversation()?,
            Command::Help => writeln!(self.output, "{}", HELP_TEXT)?,
            Command::Quit => return Ok(false),
            Command::Save(path) => match self.save_transcript(&path) {
                Ok(()) => writeln!(self.output, "Conversation saved to {}", path.display())?,
                Err(e) => writeln!(self.output, "Error: {:#}", e)?,
            },
            Command::MissingArgument { command, argument } => {
                writeln!(self.output, "Usage: {} <{}>", command, argument)?;
            }
            Command::Unknown(name) => {
                writeln!(self.output, "Unknown command {}. Type /help for the list.", name)?;
            }
        }
        Ok(true)
    }

    /// Submit a query; Ctrl-C while it is pending cancels the request.
    async fn ask(&mut self, mut query: String) -> Result<SubmitOutcome> {
        let cancel = async {
            if tokio::signal::ctrl_c().await.is_err() {
                future::pending::<()>().await;
            }
        };
        let outcome = self.controller.submit_input_until(&mut query, cancel).await?;
        debug!("Submission finished: {:?}", outcome);
        Ok(outcome)
    }

    fn save_transcript(&self, path: &Path) -> Result<()> {
        let html = self.controller.target().secondary.to_html();
        fs::write(path, html).wrap_err_with(|| format!("Failed to write transcript to {}", path.display()))
    }

    fn write_transcript_on_exit(&mut self) -> Result<()> {
        if let Some(path) = self.transcript.clone() {
            self.save_transcript(&path)?;
            info!("Transcript written to {}", path.display());
        }
        Ok(())
    }
}
