use crate::levels::LevelsError;
use crate::models::Chain;
use bigdecimal::BigDecimal;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which side of the pair a trial fixed in its RFQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provided {
    Base,
    Quote,
}

impl fmt::Display for Provided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provided::Base => write!(f, "base"),
            Provided::Quote => write!(f, "quote"),
        }
    }
}

/// One sampled RFQ and how it compared against the levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    /// Dispatch position within the batch.
    pub index: usize,
    pub provided: Provided,
    pub base_amount: Option<BigDecimal>,
    pub quote_amount: Option<BigDecimal>,
    /// Fee-adjusted counter-amount predicted by the levels.
    pub expected_amount: Option<BigDecimal>,
    pub deviation_bps: Option<BigDecimal>,
    pub fees_bps: Option<u32>,
    pub fail_msg: Option<String>,
    pub rfq_ids: Vec<String>,
}

impl Trial {
    pub fn new(index: usize, provided: Provided) -> Self {
        Self {
            index,
            provided,
            base_amount: None,
            quote_amount: None,
            expected_amount: None,
            deviation_bps: None,
            fees_bps: None,
            fail_msg: None,
            rfq_ids: Vec::new(),
        }
    }

    pub fn failed(index: usize, provided: Provided, msg: impl Into<String>) -> Self {
        Self {
            fail_msg: Some(msg.into()),
            ..Self::new(index, provided)
        }
    }

    pub fn is_success(&self) -> bool {
        self.fail_msg.is_none() && self.deviation_bps.is_some()
    }
}

/// Aggregate over a batch. Bias and deviation only see successful trials and
/// are `None` when there were none.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStatistics {
    pub num_trials: usize,
    pub num_success: usize,
    pub success_rate: f64,
    pub bias_bps: Option<BigDecimal>,
    pub deviation_bps: Option<BigDecimal>,
}

#[derive(Debug, Clone)]
pub struct SampleReport {
    pub stats: SampleStatistics,
    /// Ordered by dispatch index.
    pub trials: Vec<Trial>,
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub num_trials: usize,
    /// Gap between dispatching consecutive trials.
    pub delay: Duration,
    /// Upper bound on one trial's levels fetch and RFQ.
    pub trial_timeout: Duration,
    /// Fixed seed for reproducible draws.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_trials: 30,
            delay: Duration::ZERO,
            trial_timeout: Duration::from_secs(30),
            seed: None,
        }
    }
}

/// Errors that abort a whole sampling round.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Levels for {maker} only have {levels} entries, need at least 2")]
    TooFewLevels { maker: String, levels: usize },

    #[error("No taker wallet configured for chain {chain}")]
    NoWallet { chain: Chain },

    #[error("Invalid pre-RFQ levels: {0}")]
    Levels(#[from] LevelsError),
}
