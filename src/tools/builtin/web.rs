use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::tools::builtin::str_param;
use crate::tools::registry::Tool;

/// Stub: no network call is performed until a search API is wired in.
pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Usage: query='search_terms'"
    }

    async fn execute(&self, params: &Map<String, Value>) -> String {
        let query = str_param(params, "query");
        format!("Web search for '{query}' - This tool needs API integration for full functionality.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_returns_the_stub_message() {
        let mut params = Map::new();
        params.insert("query".to_string(), Value::String("rust agents".to_string()));
        let out = WebSearchTool.execute(&params).await;
        assert_eq!(
            out,
            "Web search for 'rust agents' - This tool needs API integration for full functionality."
        );
    }
}
