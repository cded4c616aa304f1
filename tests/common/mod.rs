#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use levels_qa::errors::{AppError, Result};
use levels_qa::levels::{QuoteRequest, compute_levels_quote, to_price_levels};
use levels_qa::models::{
    Chain, ChainType, MakerPairLevels, PairInfo, PairLevels, QuoteData, RawPriceLevel, RfqAmount,
    RfqQuote, RfqRequest, RfqResponse, RfqStatus,
};
use levels_qa::sampler::{LevelsSource, QuoteSource};
use levels_qa::utils::{convert_from_decimals, fee_factor, to_base_units_round_up};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DECIMALS: u32 = 18;
pub const EVM_WALLET: &str = "0x1111111111111111111111111111111111111111";

pub fn bd(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn evm(id: u64) -> Chain {
    Chain::new(ChainType::Evm, id)
}

/// Flat book: 2000 USDC per ETH from a 1 ETH minimum up to 10 ETH.
pub fn raw_levels() -> Vec<RawPriceLevel> {
    vec![
        RawPriceLevel { q: "1".into(), p: "2000".into() },
        RawPriceLevel { q: "10".into(), p: "2000".into() },
    ]
}

pub fn maker_levels(base: &str, quote: &str, levels: Vec<RawPriceLevel>) -> MakerPairLevels {
    MakerPairLevels {
        pair: PairInfo {
            base_token: format!("0x{}", base.to_lowercase()),
            quote_token: format!("0x{}", quote.to_lowercase()),
            base_token_name: base.into(),
            quote_token_name: quote.into(),
            base_token_decimals: DECIMALS,
            quote_token_decimals: DECIMALS,
        },
        levels,
    }
}

pub fn pair_levels(levels: Vec<RawPriceLevel>) -> PairLevels {
    PairLevels::from_maker_levels(maker_levels("ETH", "USDC", levels), evm(1), evm(1))
}

/// The flat book repriced 1% lower, at 1980 USDC per ETH.
pub fn repriced_levels() -> Vec<RawPriceLevel> {
    vec![
        RawPriceLevel { q: "1".into(), p: "1980".into() },
        RawPriceLevel { q: "10".into(), p: "1980".into() },
    ]
}

/// How the stub maker answers RFQs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    /// Quotes exactly what its levels say.
    Honest,
    /// Gives the taker 1% less than its levels say.
    Skewed,
    /// Every other RFQ is declined.
    Flaky,
    /// Never answers in time.
    Slow,
    /// The RFQ call itself errors.
    Broken,
    /// Publishes no levels alongside its quotes.
    NoLevels,
}

pub struct StubMaker {
    pub maker: String,
    pub behavior: Behavior,
    pub levels: Vec<RawPriceLevel>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<RfqRequest>>,
}

impl StubMaker {
    pub fn new(maker: &str, behavior: Behavior) -> Self {
        Self {
            maker: maker.into(),
            behavior,
            levels: raw_levels(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Publishes and quotes from `levels` instead of the default book.
    pub fn with_levels(maker: &str, behavior: Behavior, levels: Vec<RawPriceLevel>) -> Self {
        Self {
            levels,
            ..Self::new(maker, behavior)
        }
    }

    fn answer(&self, request: &RfqRequest) -> RfqResponse {
        let levels = to_price_levels(&self.levels, false).unwrap();
        let factor = fee_factor(request.fees_bps);
        let (base_units, quote_units) = match &request.amount {
            RfqAmount::Base(units) => {
                let base = convert_from_decimals(&bd(units), DECIMALS);
                let mut quote = compute_levels_quote(&levels, &QuoteRequest::Input(base))
                    .into_amount()
                    .unwrap()
                    * &factor;
                if self.behavior == Behavior::Skewed {
                    quote = quote * bd("0.99");
                }
                (units.clone(), to_base_units_round_up(&quote, DECIMALS))
            }
            RfqAmount::Quote(units) => {
                let quote = convert_from_decimals(&bd(units), DECIMALS);
                let raw = compute_levels_quote(&levels, &QuoteRequest::Output(quote))
                    .into_amount()
                    .unwrap();
                let mut base = &raw / &factor;
                if self.behavior == Behavior::Skewed {
                    base = base * bd("1.01");
                }
                (to_base_units_round_up(&base, DECIMALS), units.clone())
            }
        };
        RfqResponse {
            status: RfqStatus::Success,
            rfq_id: Some(format!("rfq-{}", self.calls.load(Ordering::SeqCst))),
            quotes: vec![RfqQuote {
                quote_data: QuoteData {
                    base_token_amount: base_units,
                    quote_token_amount: quote_units,
                },
            }],
            error: None,
            internal_rfq_ids: None,
        }
    }
}

#[async_trait]
impl LevelsSource for StubMaker {
    async fn get_price_levels(
        &self,
        _chain: Chain,
        makers: &[String],
        _quote_chain: Chain,
    ) -> Result<HashMap<String, Vec<MakerPairLevels>>> {
        if self.behavior == Behavior::NoLevels {
            return Ok(HashMap::new());
        }
        Ok(makers
            .iter()
            .map(|m| (m.clone(), vec![maker_levels("ETH", "USDC", self.levels.clone())]))
            .collect())
    }
}

#[async_trait]
impl QuoteSource for StubMaker {
    async fn request_quote(&self, request: &RfqRequest) -> Result<RfqResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        match self.behavior {
            Behavior::Slow => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(self.answer(request))
            }
            Behavior::Broken => Err(AppError::Api("maker offline".into())),
            Behavior::Flaky if call % 2 == 1 => Ok(RfqResponse {
                status: RfqStatus::Fail,
                rfq_id: None,
                quotes: Vec::new(),
                error: Some(serde_json::json!({ "code": "NoQuotes" })),
                internal_rfq_ids: Some(vec![format!("internal-{call}")]),
            }),
            _ => Ok(self.answer(request)),
        }
    }
}
