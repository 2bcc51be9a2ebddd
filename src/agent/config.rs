use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub mcp_url: String,
    pub llm_url: String,
    pub llm_model: String,
    pub temperature: f32,
    pub llm_timeout: Duration,
    pub llm_backoff: Duration,
    pub tool_timeout: Duration,
}
