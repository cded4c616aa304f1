use crate::errors::Result;
use crate::models::{Chain, MakerPairLevels, RfqRequest, RfqResponse};
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of current price levels, keyed by maker id.
#[async_trait]
pub trait LevelsSource: Send + Sync {
    async fn get_price_levels(
        &self,
        chain: Chain,
        makers: &[String],
        quote_chain: Chain,
    ) -> Result<HashMap<String, Vec<MakerPairLevels>>>;
}

/// Source of live, signed quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn request_quote(&self, request: &RfqRequest) -> Result<RfqResponse>;
}

/// Picks the taker address used to request quotes on a chain.
pub trait WalletResolver: Send + Sync {
    /// `None` when no address is configured for the chain's network family.
    fn wallet_for(&self, chain: &Chain) -> Option<String>;
}
