pub mod directive;

use chrono::Local;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::error::AppError;
use crate::llm::provider::{CompletionClient, Message};
use crate::memory::{MemoryLog, MemorySummary};
use crate::tools::builtin;
use crate::tools::registry::ToolRegistry;

/// The conversation core. One turn runs
/// build context -> request completion -> parse -> (dispatch)? -> merge ->
/// persist, strictly start to finish; the completion call is the only
/// suspension point.
pub struct Agent {
    config: AgentConfig,
    client: Box<dyn CompletionClient>,
    memory: MemoryLog,
    tools: ToolRegistry,
    system_prompt: String,
}

impl Agent {
    pub fn new(config: AgentConfig, client: Box<dyn CompletionClient>) -> Self {
        let mut tools = ToolRegistry::new();
        builtin::register_builtins(&mut tools);
        let memory = MemoryLog::open(&config.memory_file, config.max_memory_entries);
        let system_prompt = build_system_prompt(&config.agent_name, &tools);
        Self {
            config,
            client,
            memory,
            tools,
            system_prompt,
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.config.agent_name
    }

    pub fn tool_descriptions(&self) -> String {
        self.tools.describe_all()
    }

    pub fn memory_summary(&self) -> MemorySummary {
        self.memory.summary()
    }

    pub fn clear_memory(&mut self) -> Result<(), AppError> {
        self.memory.clear()
    }

    /// Process one user turn. Model and tool faults are folded into the
    /// visible reply and persisted like any other turn; only a persistence
    /// failure escapes, and that one is fatal to the process.
    pub async fn process_input(&mut self, user_input: &str) -> Result<String, AppError> {
        let (response, tool_used) = match self.run_turn(user_input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "turn failed");
                (format!("I encountered an error: {e}"), None)
            }
        };

        let mut context = Map::new();
        context.insert(
            "tool_used".to_string(),
            tool_used.map(Value::String).unwrap_or(Value::Null),
        );
        context.insert(
            "timestamp".to_string(),
            Value::String(Local::now().to_rfc3339()),
        );
        self.memory.append(user_input, &response, context)?;

        Ok(response)
    }

    async fn run_turn(&self, user_input: &str) -> Result<(String, Option<String>), AppError> {
        let messages = self.context_messages(user_input);
        debug!(
            model = self.client.model_id(),
            messages = messages.len(),
            "requesting completion"
        );
        let completion = self
            .client
            .complete(messages, self.config.temperature, self.config.max_tokens)
            .await?;

        match directive::parse_directive(&completion) {
            Some((directive, clean)) => {
                debug!(tool = %directive.tool_name, "completion carries a tool directive");
                let result = self
                    .tools
                    .dispatch(&directive.tool_name, &directive.parameters)
                    .await;
                Ok((
                    format!("{clean}\n\nTool Result:\n{result}"),
                    Some(directive.tool_name),
                ))
            }
            None => Ok((completion, None)),
        }
    }

    /// System preamble plus the flattened (user, assistant) pairs of the five
    /// most recent records, then the current input.
    fn context_messages(&self, user_input: &str) -> Vec<Message> {
        let mut messages = vec![Message::system(&self.system_prompt)];
        for record in self.memory.recent(5) {
            messages.push(Message::user(&record.user_input));
            messages.push(Message::assistant(&record.agent_response));
        }
        messages.push(Message::user(user_input));
        messages
    }
}

fn build_system_prompt(agent_name: &str, tools: &ToolRegistry) -> String {
    format!(
        "You are {agent_name}, an advanced AI assistant with access to tools and memory.\n\
         \n\
         Your capabilities include:\n\
         1. Remembering previous conversations and context\n\
         2. Using tools to perform various tasks\n\
         3. Providing helpful, accurate, and engaging responses\n\
         \n\
         Available Tools:\n\
         {}\n\
         \n\
         When you need to use a tool, format your response like this:\n\
         TOOL_USE: tool_name\n\
         PARAMETERS: {{\"parameter\": \"value\"}}\n\
         \n\
         Guidelines:\n\
         - Be helpful, informative, and engaging\n\
         - Use tools when appropriate to accomplish tasks\n\
         - Remember context from previous conversations\n\
         - Ask clarifying questions when needed\n\
         - Provide step-by-step explanations for complex tasks\n\
         \n\
         Current time: {}\n",
        tools.describe_all(),
        Local::now().format("%Y-%m-%d %H:%M:%S"),
    )
}
