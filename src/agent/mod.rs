// Conversational cluster agent modules
pub mod config;

mod cache;
mod error;
mod extract;
mod format;
mod llm;
mod mcp;
mod memory;
mod normalize;
mod prompt;
mod registry;
mod turn;
mod validate;

#[cfg(test)]
pub(crate) mod testutil;

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use cache::NameCache;
use config::Config;
use llm::LlmClient;
use mcp::{McpClient, ToolBackend};
use memory::ConversationMemory;
use registry::ToolRegistry;

/// Conversational bridge between a human operator and the remote cluster
/// tools. Generic over the backend so the pipeline tests can run against an
/// in-memory fake instead of HTTP.
pub(crate) struct Agent<B: ToolBackend> {
    backend: B,
    llm: LlmClient,
    registry: ToolRegistry,
    cache: NameCache,
    memory: ConversationMemory,
}

impl<B: ToolBackend> Agent<B> {
    fn new(backend: B, llm: LlmClient, registry: ToolRegistry) -> Self {
        Agent {
            backend,
            llm,
            registry,
            cache: NameCache::new(),
            memory: ConversationMemory::new(),
        }
    }

    /// Refetch the tool declarations and swap the registry wholesale. On
    /// failure the current registry stays in place.
    async fn reload_tools(&mut self) {
        match self.backend.list_tools().await {
            Ok(decls) => {
                self.registry = ToolRegistry::from_decls(decls);
                info!("Reloaded {} tool definitions.", self.registry.len());
                println!("Reloaded {} tools.", self.registry.len());
            }
            Err(e) => error!("Failed to reload tool definitions: {e}"),
        }
    }
}

pub async fn run(config: Config) -> Result<()> {
    info!("Starting kubepilot agent");
    info!("MCP endpoint: {}", config.mcp_url);
    info!(
        "Generation endpoint: {} (model {})",
        config.llm_url, config.llm_model
    );

    let backend = McpClient::new(&config.mcp_url, config.tool_timeout)?;
    let llm = LlmClient::new(&config)?;

    llm.warmup().await;

    let registry = match backend.list_tools().await {
        Ok(decls) => ToolRegistry::from_decls(decls),
        Err(e) => {
            error!("Failed to fetch tool definitions: {e}");
            ToolRegistry::default()
        }
    };
    if registry.is_empty() {
        warn!(
            "No tools available from {}; every request will be rejected.",
            config.mcp_url
        );
    } else {
        info!("Loaded {} tools from the MCP endpoint.", registry.len());
    }

    let mut agent = Agent::new(backend, llm, registry);

    println!(
        "Agent ready. Describe what you want to do ('show tools' lists operations, 'exit' quits)."
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            // stdin closed
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => {
                info!("Exiting agent.");
                break;
            }
            "show tools" | "list tools" => println!("{}", agent.registry.describe()),
            "reload tools" => agent.reload_tools().await,
            _ => agent.handle_turn(input).await,
        }
    }

    Ok(())
}
