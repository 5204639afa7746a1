//! Chat command: one message, reply streamed to the terminal.

use crate::agent::stream_chat;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::openai::create_client;
use anyhow::Result;
use console::style;
use std::io::{self, Write};

/// Run the chat command.
pub async fn run_chat(message: &str, model: Option<String>, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vibra doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let model = model.unwrap_or_else(|| settings.llm.model.clone());
    let client = create_client(&settings.llm)?;

    print!("{} ", style("Vibra:").cyan().bold());
    io::stdout().flush()?;

    let reply = stream_chat(
        &client,
        &model,
        settings.llm.system_prompt.as_deref(),
        message,
        |delta| {
            print!("{}", delta);
            io::stdout().flush().ok();
        },
    )
    .await;
    println!();

    match reply {
        Ok(text) if text.trim().is_empty() => {
            Output::warning("The model returned an empty reply.");
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) => {
            Output::error(&format!("Chat failed: {}", e));
            Err(e.into())
        }
    }
}
