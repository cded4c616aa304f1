//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use crate::models::{Chain, ChainType, Environment};
use crate::rfq::api_url_for;
use crate::sampler::{SamplerConfig, WalletResolver};
use clap::Parser;
use std::time::Duration;

const DEFAULT_TRIAL_TIMEOUT_MS: u64 = 30_000;

/// Command-line flags.
#[derive(Debug, Clone, Parser)]
#[command(name = "levels-qa", about = "Grade a maker's RFQ quotes against its price levels")]
pub struct Cli {
    /// External maker name, e.g. `mm12`.
    #[arg(long)]
    pub maker: String,
    /// Base chain id.
    #[arg(long)]
    pub chain: u64,
    #[arg(long, default_value = "evm")]
    pub chain_type: ChainType,
    /// Quote chain id, for cross-chain pairs.
    #[arg(long)]
    pub quote_chain: Option<u64>,
    #[arg(long, default_value = "evm")]
    pub quote_chain_type: ChainType,
    /// Check every quote chain the base chain trades against.
    #[arg(long)]
    pub check_all_xchain: bool,
    #[arg(long)]
    pub base_token: Option<String>,
    #[arg(long)]
    pub quote_token: Option<String>,
    #[arg(long, default_value = "staging")]
    pub env: Environment,
    /// RFQs per pair.
    #[arg(long, default_value_t = 30)]
    pub num_requests: usize,
    /// Delay between dispatching RFQs.
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,
}

/// Taker addresses by network family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TakerWallets {
    pub evm: Option<String>,
    pub solana: Option<String>,
}

impl WalletResolver for TakerWallets {
    fn wallet_for(&self, chain: &Chain) -> Option<String> {
        match chain.chain_type {
            ChainType::Evm => self.evm.clone(),
            ChainType::Solana => self.solana.clone(),
            ChainType::Unsupported => None,
        }
    }
}

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct QaConfig {
    pub maker: String,
    pub chain: Chain,
    pub quote_chain: Option<Chain>,
    pub check_all_xchain: bool,
    pub base_token: Option<String>,
    pub quote_token: Option<String>,
    pub env: Environment,
    pub num_requests: usize,
    pub delay: Duration,
    pub trial_timeout: Duration,
    /// Taker API root.
    pub api_url: String,
    /// Name the API knows this client by.
    pub source: String,
    pub auth_key: String,
    pub wallets: TakerWallets,
}

impl QaConfig {
    /// Load configuration from CLI flags and environment variables.
    pub fn load(cli: Cli) -> Result<Self> {
        Self::from_lookup(cli, |key| std::env::var(key).ok())
    }

    /// Same as [`QaConfig::load`] with an injectable variable lookup.
    pub fn from_lookup<F>(cli: Cli, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if cli.quote_chain.is_some() && cli.check_all_xchain {
            return Err(AppError::Config(
                "Can't specify a quote_chain and check_all_xchain simultaneously".into(),
            ));
        }

        let auth_key = var("AUTH_KEY")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("Please specify your auth key under AUTH_KEY".into()))?;
        let source = var("SOURCE").unwrap_or_else(|| "qa".into());
        let api_url = var("RFQ_API_URL").unwrap_or_else(|| api_url_for(cli.env).to_string());
        let trial_timeout_ms = match var("TRIAL_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                AppError::Config(format!("TRIAL_TIMEOUT_MS must be an integer: {e}"))
            })?,
            None => DEFAULT_TRIAL_TIMEOUT_MS,
        };
        let wallets = TakerWallets {
            evm: var("QA_TAKER_ADDRESS").map(|a| a.to_lowercase()),
            solana: var("QA_TAKER_ADDRESS_SOLANA"),
        };

        Ok(Self {
            maker: cli.maker,
            chain: Chain::new(cli.chain_type, cli.chain),
            quote_chain: cli
                .quote_chain
                .map(|id| Chain::new(cli.quote_chain_type, id)),
            check_all_xchain: cli.check_all_xchain,
            base_token: cli.base_token,
            quote_token: cli.quote_token,
            env: cli.env,
            num_requests: cli.num_requests,
            delay: Duration::from_millis(cli.delay_ms),
            trial_timeout: Duration::from_millis(trial_timeout_ms),
            api_url,
            source,
            auth_key,
            wallets,
        })
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            num_trials: self.num_requests,
            delay: self.delay,
            trial_timeout: self.trial_timeout,
            seed: None,
        }
    }
}
