pub mod calc;
pub mod files;
pub mod shell;
pub mod web;

use serde_json::{Map, Value};

use crate::tools::registry::ToolRegistry;

pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(Box::new(files::FileManagerTool));
    registry.register(Box::new(calc::CalculatorTool));
    registry.register(Box::new(shell::SystemCommandTool));
    registry.register(Box::new(web::WebSearchTool));
}

/// Keyword parameters default to the empty string when absent or non-string,
/// mirroring how tools treat missing arguments as empty input.
pub(crate) fn str_param(params: &Map<String, Value>, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
