mod agent;
mod commands;
mod config;
mod error;
mod llm;
mod memory;
mod tools;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::agent::Agent;
use crate::commands::CommandAction;
use crate::config::AgentConfig;
use crate::error::AppError;
use crate::llm::openai_compatible::OpenAICompatibleClient;

#[derive(Debug, Parser)]
#[command(name = "sidekick", about = "Conversational AI assistant with memory and tools")]
struct Cli {
    /// Configuration file path (JSON, overrides environment values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model id to use, overriding the configured one
    #[arg(long)]
    model: Option<String>,

    /// Suppress the welcome banner
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = AgentConfig::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    let client = OpenAICompatibleClient::new(
        config.api_key.clone(),
        config.model.clone(),
        config.base_url.clone(),
    )?;
    let mut agent = Agent::new(config, Box::new(client));

    if !cli.quiet {
        print_welcome(&agent);
    }

    let stdin = std::io::stdin();
    loop {
        print!("\n{} ", "You:".cyan().bold());
        std::io::stdout().flush()?;

        let mut line = String::new();
        let bytes = match stdin.read_line(&mut line) {
            Ok(bytes) => bytes,
            // Interrupted read: end the loop gracefully, nothing mid-turn.
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => 0,
            Err(e) => return Err(e.into()),
        };
        if bytes == 0 {
            println!("\n{}", "Goodbye!".yellow());
            return Ok(());
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            match commands::handle(&mut agent, input)? {
                CommandAction::Reply(text) => print_response(&agent, &text),
                CommandAction::Quit(text) => {
                    print_response(&agent, &text);
                    return Ok(());
                }
            }
            continue;
        }

        // Persistence failures propagate out of here and end the process;
        // everything else already came back as a visible reply.
        let response = agent.process_input(input).await?;
        print_response(&agent, &response);
    }
}

fn print_welcome(agent: &Agent) {
    println!(
        "{}",
        format!("Welcome to {}!", agent.agent_name()).green().bold()
    );
    println!("I'm your AI assistant with memory and tools.");
    println!();
    println!("Available commands: /help /memory /clear /tools /quit");
    println!("Anything else is sent to the model.");
}

fn print_response(agent: &Agent, text: &str) {
    println!("\n{}", format!("{}:", agent.agent_name()).blue().bold());
    println!("{text}");
}
