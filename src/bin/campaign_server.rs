//!
//! campaign server binary
//! ----------------------
//! Command-line entry point for the campaign API. Supports configuration via CLI
//! flags and environment variables; see `--help`.

use anyhow::Result;
use std::env;

use campaign_rbac::config::{has_flag, ServerConfig, USAGE};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    // RUST_LOG wins; otherwise info for everything
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let cfg = ServerConfig::from_env_and_args(&args);
    println!("campaign server starting: http={}, db_root={}", cfg.http_port, cfg.db_root);
    campaign_rbac::server::run_with_config(cfg).await
}
