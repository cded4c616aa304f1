//! Shared data structures used throughout the application.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network family a chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Evm,
    Solana,
    #[serde(other)]
    Unsupported,
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainType::Evm => write!(f, "evm"),
            ChainType::Solana => write!(f, "solana"),
            ChainType::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl FromStr for ChainType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "evm" => Ok(ChainType::Evm),
            "solana" => Ok(ChainType::Solana),
            other => Err(format!("unrecognized chain type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub chain_type: ChainType,
    pub chain_id: u64,
}

impl Chain {
    pub fn new(chain_type: ChainType, chain_id: u64) -> Self {
        Self {
            chain_type,
            chain_id,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chain_type, self.chain_id)
    }
}

/// Deployment the taker API talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(format!("Unrecognized environment {other}")),
        }
    }
}

/// A token on a specific chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub chain: Chain,
    pub name: String,
    pub address: String,
    pub decimals: u32,
}

/// Price level as sent by the API: decimal strings, `q` cumulative base depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPriceLevel {
    pub q: String,
    pub p: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairInfo {
    pub base_token: String,
    pub quote_token: String,
    pub base_token_name: String,
    pub quote_token_name: String,
    pub base_token_decimals: u32,
    pub quote_token_decimals: u32,
}

/// One maker's levels for one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerPairLevels {
    pub pair: PairInfo,
    #[serde(default)]
    pub levels: Vec<RawPriceLevel>,
}

/// A pair selected for sampling, with the levels observed before any trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairLevels {
    pub base_token: Token,
    pub quote_token: Token,
    pub levels: Vec<RawPriceLevel>,
}

impl PairLevels {
    pub fn from_maker_levels(entry: MakerPairLevels, base_chain: Chain, quote_chain: Chain) -> Self {
        let base_token = Token {
            chain: base_chain,
            name: entry.pair.base_token_name,
            address: entry.pair.base_token,
            decimals: entry.pair.base_token_decimals,
        };
        let quote_token = Token {
            chain: quote_chain,
            name: entry.pair.quote_token_name,
            address: entry.pair.quote_token,
            decimals: entry.pair.quote_token_decimals,
        };
        Self {
            base_token,
            quote_token,
            levels: entry.levels,
        }
    }

    /// `BASE:evm_1-QUOTE:evm_1`
    pub fn label(&self) -> String {
        format!(
            "{}:{}-{}:{}",
            self.base_token.name, self.base_token.chain, self.quote_token.name, self.quote_token.chain
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPairToken {
    pub chain: Chain,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPair {
    pub base_token: TradingPairToken,
    pub quote_token: TradingPairToken,
}

/// The amount side of an RFQ, in token base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RfqAmount {
    Base(String),
    Quote(String),
}

/// Everything needed to solicit one live quote from a single maker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfqRequest {
    pub base_chain: Chain,
    pub quote_chain: Chain,
    pub base_token: String,
    pub quote_token: String,
    pub amount: RfqAmount,
    pub wallet: String,
    pub market_makers: Vec<String>,
    pub fees_bps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RfqStatus {
    Success,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    pub base_token_amount: String,
    pub quote_token_amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqQuote {
    pub quote_data: QuoteData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqResponse {
    pub status: RfqStatus,
    #[serde(default)]
    pub rfq_id: Option<String>,
    #[serde(default)]
    pub quotes: Vec<RfqQuote>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub internal_rfq_ids: Option<Vec<String>>,
}
