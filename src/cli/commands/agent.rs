//! Agent command implementation.

use super::tool_context;
use crate::agent::Agent;
use crate::cli::output::truncate;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::openai::create_client;
use crate::tools::ToolRegistry;
use anyhow::Result;

/// Run the agent command.
pub async fn run_agent(task: &str, model: Option<String>, settings: &Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Agent, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'vibra doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let model = model.unwrap_or_else(|| settings.llm.model.clone());
    let client = create_client(&settings.llm)?;

    let mut agent = Agent::new(client, ToolRegistry::builtin(), tool_context(settings)?, &model)
        .with_max_iterations(settings.llm.max_turns);
    if let Some(prompt) = &settings.llm.system_prompt {
        agent = agent.with_system_prompt(prompt);
    }

    let spinner = Output::spinner("Agent working...");

    match agent.run(task).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.content);

            if !response.tool_calls.is_empty() {
                Output::header(&format!("Tool calls ({})", response.tool_calls.len()));
                for call in &response.tool_calls {
                    let line = format!("  {} {}", call.name, truncate(&call.arguments, 60));
                    if call.is_error {
                        Output::warning(&line);
                    } else {
                        Output::info(&line);
                    }
                }
                println!();
            }

            Output::info(&format!(
                "Completed in {} iteration(s) with {}",
                response.iterations, model
            ));
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Agent failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
