use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;

use super::error::{AgentError, Result};

/// Raw tool declaration as served by `GET /tools`: a mapping from parameter
/// name to type tag, plus a docstring. Both pieces may be absent for a tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolDecl {
    #[serde(default)]
    pub signature: HashMap<String, String>,
    #[serde(default)]
    pub doc: String,
}

#[derive(Debug, Deserialize)]
struct ToolListResponse {
    #[serde(default)]
    tools: HashMap<String, ToolDecl>,
}

/// Seam between the pipeline and the remote tool endpoint. The validator and
/// the name cache only ever talk to the cluster through this trait.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn list_tools(&self) -> Result<HashMap<String, ToolDecl>>;

    async fn run(&self, tool: &str, args: &Map<String, Value>) -> Result<Value>;
}

#[derive(Clone)]
pub struct McpClient {
    http: Client,
    base_url: String,
}

impl McpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Backend(format!("failed to build MCP HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ToolBackend for McpClient {
    async fn list_tools(&self) -> Result<HashMap<String, ToolDecl>> {
        let url = format!("{}/tools", self.base_url);
        let resp = self.http.get(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Backend(format!(
                "tool list failed: status {status} body {body}"
            )));
        }

        let parsed: ToolListResponse = resp.json().await?;
        Ok(parsed.tools)
    }

    async fn run(&self, tool: &str, args: &Map<String, Value>) -> Result<Value> {
        let url = format!("{}/run", self.base_url);
        let payload = json!({ "tool": tool, "args": args });

        let resp = self.http.post(&url).json(&payload).send().await?;

        // The server replies with a JSON body on every status code, including
        // 4xx/5xx, where the body carries an "error" field. Parse it either way
        // so logical failures surface as result objects, not transport errors.
        let value: Value = resp.json().await?;
        Ok(value)
    }
}
