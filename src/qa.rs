//! QA orchestration: discover a maker's pairs and grade each one.

use crate::config::QaConfig;
use crate::errors::{AppError, Result};
use crate::models::{Chain, ChainType, PairLevels, TradingPair};
use crate::report;
use crate::rfq::RfqClient;
use crate::sampler::{self, LevelsSource, QuoteSource, SampleError};
use crate::validation::{
    validate_chain, validate_evm_address, validate_maker_name, validate_solana_address,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Lookup of makers and tradable pairs.
#[async_trait]
pub trait MakerDirectory: Send + Sync {
    async fn get_market_makers(&self, chain: Chain, maker: Option<&str>) -> Result<Vec<String>>;
    async fn get_trading_pairs(&self, chain: Chain) -> Result<Vec<TradingPair>>;
}

#[async_trait]
impl MakerDirectory for RfqClient {
    async fn get_market_makers(&self, chain: Chain, maker: Option<&str>) -> Result<Vec<String>> {
        RfqClient::get_market_makers(self, chain, maker).await
    }

    async fn get_trading_pairs(&self, chain: Chain) -> Result<Vec<TradingPair>> {
        RfqClient::get_trading_pairs(self, chain).await
    }
}

/// Result of grading one maker/pair.
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub maker: String,
    pub pair: String,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct QaSummary {
    pub pairs: Vec<PairOutcome>,
    /// Skipped for lack of a taker wallet on the quote chain.
    pub skipped: Vec<String>,
}

impl QaSummary {
    /// Mean of the per-pair success rates.
    pub fn total_success_rate(&self) -> Option<f64> {
        if self.pairs.is_empty() {
            return None;
        }
        Some(self.pairs.iter().map(|p| p.success_rate).sum::<f64>() / self.pairs.len() as f64)
    }
}

/// Distinct quote chains `chain` trades against, in first-seen order.
pub async fn fetch_quote_chains<D>(directory: &D, chain: Chain) -> Result<Vec<Chain>>
where
    D: MakerDirectory + ?Sized,
{
    info!(%chain, "[QA] fetching all available quote chains");
    let pairs = directory.get_trading_pairs(chain).await?;
    let mut chains: Vec<Chain> = Vec::new();
    for pair in pairs {
        if !chains.contains(&pair.quote_token.chain) {
            chains.push(pair.quote_token.chain);
        }
    }
    Ok(chains)
}

fn validate(config: &QaConfig) -> Result<()> {
    validate_maker_name(&config.maker)?;
    validate_chain(&config.chain)?;
    if let Some(quote_chain) = &config.quote_chain {
        validate_chain(quote_chain)?;
    }
    if let Some(evm) = &config.wallets.evm {
        validate_evm_address(evm)?;
    }
    if let Some(solana) = &config.wallets.solana {
        validate_solana_address(solana)?;
    }
    Ok(())
}

/// Maker ids on the chain that belong to `config.maker` (`mm12` owns `mm12_1`).
async fn find_makers<D>(api: &D, config: &QaConfig) -> Result<Vec<String>>
where
    D: MakerDirectory + ?Sized,
{
    let chain_makers = api
        .get_market_makers(config.chain, Some(config.maker.as_str()))
        .await?;
    let makers: Vec<String> = chain_makers
        .iter()
        .filter(|m| m.split('_').next() == Some(config.maker.as_str()))
        .cloned()
        .collect();
    if makers.is_empty() {
        return Err(AppError::Api(format!(
            "No maker available {}",
            serde_json::to_string(&chain_makers)?
        )));
    }
    Ok(makers)
}

/// Collects every maker/pair with non-empty levels across the quote chains.
async fn collect_pairs<A>(
    api: &A,
    config: &QaConfig,
    makers: &[String],
    quote_chains: &[Chain],
) -> Result<BTreeMap<String, Vec<PairLevels>>>
where
    A: LevelsSource + ?Sized,
{
    let pair_filter = config.base_token.as_deref().zip(config.quote_token.as_deref());
    let mut maker_levels: BTreeMap<String, Vec<PairLevels>> = BTreeMap::new();

    for &quote_chain in quote_chains {
        info!(makers = ?makers, %quote_chain, "[QA] fetching levels");
        let levels = api.get_price_levels(config.chain, makers, quote_chain).await?;
        if levels.is_empty() {
            return Err(AppError::Api("No maker levels".into()));
        }

        for (maker, pairs) in levels {
            if pairs.is_empty() {
                return Err(AppError::Api(format!("No levels for {maker}")));
            }
            let entries = maker_levels.entry(maker.clone()).or_default();
            for entry in pairs {
                if let Some((base, quote)) = pair_filter {
                    if entry.pair.base_token_name != base || entry.pair.quote_token_name != quote {
                        continue;
                    }
                }
                if entry.levels.is_empty() {
                    info!(
                        maker = %maker,
                        pair = %format!("{}-{}", entry.pair.base_token_name, entry.pair.quote_token_name),
                        "[QA] no levels, continuing with next pair"
                    );
                    continue;
                }
                entries.push(PairLevels::from_maker_levels(entry, config.chain, quote_chain));
            }
        }
    }
    Ok(maker_levels)
}

/// Grades every pair the maker quotes and logs a report per pair.
///
/// Fails fast on discovery errors and on round-level sampling errors; a pair
/// whose quote chain has no configured taker wallet is skipped.
pub async fn run_qa<A>(config: &QaConfig, api: Arc<A>) -> Result<QaSummary>
where
    A: MakerDirectory + LevelsSource + QuoteSource + 'static,
{
    validate(config)?;

    let pair_desc = match (&config.base_token, &config.quote_token) {
        (Some(base), Some(quote)) => format!(" for {base}-{quote}"),
        _ => String::new(),
    };
    info!(
        "[QA] testing maker '{}' against {} on chain {}{} with {} requests/pair{}",
        config.maker,
        config.env,
        config.chain,
        pair_desc,
        config.num_requests,
        if config.delay.is_zero() {
            String::new()
        } else {
            format!(" using a delay of {}ms between RFQs", config.delay.as_millis())
        }
    );

    let makers = find_makers(api.as_ref(), config).await?;
    info!(makers = ?makers, "[QA] found active makers");

    let quote_chains = match config.quote_chain {
        Some(quote_chain) => vec![quote_chain],
        None if config.check_all_xchain => fetch_quote_chains(api.as_ref(), config.chain).await?,
        None => vec![config.chain],
    };

    let maker_levels = collect_pairs(api.as_ref(), config, &makers, &quote_chains).await?;
    let sampler_config = config.sampler_config();
    let mut summary = QaSummary::default();

    for (maker, entries) in &maker_levels {
        for entry in entries {
            let pair = entry.label();
            let res = sampler::sample(
                maker,
                entry,
                api.clone(),
                api.clone(),
                &config.wallets,
                &sampler_config,
            )
            .await;
            let report = match res {
                Ok(report) => report,
                Err(SampleError::NoWallet { chain }) => {
                    let hint = match chain.chain_type {
                        ChainType::Evm => "Must specify a QA_TAKER_ADDRESS environment variable",
                        ChainType::Solana => {
                            "Must specify a QA_TAKER_ADDRESS_SOLANA environment variable"
                        }
                        ChainType::Unsupported => "chain type unsupported",
                    };
                    warn!(maker = %maker, pair = %pair, "[QA] unable to request quotes: {hint}");
                    summary.skipped.push(pair);
                    continue;
                }
                Err(e) => {
                    error!(maker = %maker, pair = %pair, error = %e, "[QA] sampling round failed");
                    return Err(e.into());
                }
            };

            report::log_report(maker, entry, &report);
            summary.pairs.push(PairOutcome {
                maker: maker.clone(),
                pair,
                success_rate: report.stats.success_rate,
            });
        }
    }

    match summary.total_success_rate() {
        Some(rate) => info!("[QA] Total Success Rate: {:.2}%", 100.0 * rate),
        None => warn!("[QA] no pairs were tested"),
    }
    info!("[QA] QA test completed.");
    Ok(summary)
}
