use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

/// A named, described capability invocable with keyword parameters.
/// Implementations must catch their own faults and return error text;
/// nothing a tool does may surface as an error to the dispatcher.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn execute(&self, params: &Map<String, Value>) -> String;
}

/// Registry of tool handlers in registration order. Entries can be added or
/// replaced (upsert by name) but never removed.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => *slot = tool,
            None => self.tools.push(tool),
        }
    }

    /// One `- name: description` line per tool, in registration order.
    pub fn describe_all(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Tool execution failure is data, not control flow: an unknown name
    /// comes back as a message and tool faults are already text.
    pub async fn dispatch(&self, name: &str, params: &Map<String, Value>) -> String {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => {
                debug!(tool = name, "dispatching");
                tool.execute(params).await
            }
            None => format!(
                "Tool '{}' not found. Available tools: {}",
                name,
                self.names().join(", ")
            ),
        }
    }
}
