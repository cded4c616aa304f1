use anyhow::Result;
use clap::Parser;
use levels_qa::{
    config::{Cli, QaConfig},
    qa::run_qa,
    rfq::{DEFAULT_TIMEOUT, RfqClient},
    utils,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let cli = Cli::parse();
    let cfg = match QaConfig::load(cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "[INIT] invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(api_url = %cfg.api_url, source = %cfg.source, "[INIT] levels-qa starting");

    let client = RfqClient::new(&cfg.api_url, &cfg.source, &cfg.auth_key, DEFAULT_TIMEOUT)?;

    if let Err(e) = run_qa(&cfg, Arc::new(client)).await {
        tracing::error!(error = %e, "[QA] QA test failed");
        std::process::exit(1);
    }
    Ok(())
}
