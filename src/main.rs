use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

use wc2030_gateway::config::load_config;
use wc2030_gateway::gateway::Gateway;
use wc2030_gateway::mcp::server::GatewayMcpServer;

const CONFIG_ENV: &str = "WC2030_CONFIG";

fn find_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }

    let candidates = [PathBuf::from("config.yaml"), binary_dir().join("config.yaml")];
    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn binary_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting wc2030-gateway");

    let config_path = find_config_path();
    let config = load_config(&config_path)?;

    let gateway = Arc::new(Gateway::from_config(&config));
    let server = GatewayMcpServer::new(gateway);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(())
}
