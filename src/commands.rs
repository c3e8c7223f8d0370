use crate::agent::Agent;
use crate::error::AppError;

/// What the REPL should do after a slash command.
pub enum CommandAction {
    Reply(String),
    Quit(String),
}

/// Slash commands live outside the conversation core: they read or mutate
/// the agent's memory and registry directly and never touch the model.
pub fn handle(agent: &mut Agent, input: &str) -> Result<CommandAction, AppError> {
    let command = input.trim().to_lowercase();

    match command.as_str() {
        "/help" => Ok(CommandAction::Reply(
            "Available Commands:\n\
             - /help   Show this help message\n\
             - /memory Show memory statistics\n\
             - /clear  Clear conversation memory\n\
             - /tools  List available tools\n\
             - /quit   Exit the conversation\n\
             \n\
             Tool usage happens naturally in conversation, for example:\n\
             - \"Calculate 2 + 2\"\n\
             - \"Read the file example.txt\"\n\
             - \"List files in the current directory\"\n\
             - \"Run the command 'ls -la'\""
                .to_string(),
        )),
        "/memory" => {
            let summary = agent.memory_summary();
            Ok(CommandAction::Reply(format!(
                "Memory Statistics:\n\
                 - Total memories: {}\n\
                 - Oldest entry: {}\n\
                 - Newest entry: {}",
                summary.count,
                summary
                    .oldest
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "N/A".to_string()),
                summary
                    .newest
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "N/A".to_string()),
            )))
        }
        "/clear" => {
            agent.clear_memory()?;
            Ok(CommandAction::Reply(
                "Memory cleared! Starting fresh conversation.".to_string(),
            ))
        }
        "/tools" => Ok(CommandAction::Reply(format!(
            "Available Tools:\n{}",
            agent.tool_descriptions()
        ))),
        "/quit" => Ok(CommandAction::Quit(
            "Goodbye! Thanks for using the AI Agent.".to_string(),
        )),
        other => Ok(CommandAction::Reply(format!(
            "Unknown command: {other}. Type '/help' for available commands."
        ))),
    }
}
