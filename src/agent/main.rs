use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::error;

#[path = "../agent/mod.rs"]
mod agent;
#[path = "../shared/logging.rs"]
mod logging;

#[derive(Parser)]
#[command(name = "kubepilot-agent")]
#[command(about = "KubePilot - natural-language agent for cluster operations")]
struct Args {
    /// MCP tool server URL
    #[arg(long, env = "KUBEPILOT_MCP_URL", default_value = "http://localhost:8000")]
    mcp_url: String,

    /// Generation backend URL (completion-style endpoint)
    #[arg(long, env = "KUBEPILOT_LLM_URL", default_value = "http://localhost:11434")]
    llm_url: String,

    /// Model name passed to the generation backend
    #[arg(long, env = "KUBEPILOT_LLM_MODEL", default_value = "gemma3:12b")]
    llm_model: String,

    /// Directory for rotated log files
    #[arg(long, env = "KUBEPILOT_LOG_DIR", default_value = "./logs")]
    log_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _ = logging::init_service_logging(&args.log_dir, "kubepilot_agent");

    let config = agent::config::Config {
        mcp_url: args.mcp_url,
        llm_url: args.llm_url,
        llm_model: args.llm_model,
        temperature: 0.2,
        llm_timeout: Duration::from_secs(90),
        llm_backoff: Duration::from_secs(3),
        tool_timeout: Duration::from_secs(30),
    };

    // The REPL only returns on 'exit' or closed stdin; anything else is a
    // startup-level failure worth restarting from scratch.
    loop {
        match agent::run(config.clone()).await {
            Ok(()) => break,
            Err(e) => {
                error!("Agent stopped with error: {e}. Restarting in 5s...");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }

    Ok(())
}
