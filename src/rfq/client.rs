use crate::errors::{AppError, Result};
use crate::models::{
    Chain, Environment, MakerPairLevels, RfqAmount, RfqRequest, RfqResponse, TradingPair,
};
use crate::sampler::{LevelsSource, QuoteSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CALLED_FROM: &str = "levels-qa";

/// Taker API root for each deployment.
pub fn api_url_for(env: Environment) -> &'static str {
    match env {
        Environment::Production => "https://api.hashflow.com/taker/v3",
        Environment::Staging => "https://api-staging.hashflow.com/taker/v3",
        Environment::Development => "https://api-dev.hashflow.com/taker/v3",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarketMakersResponse {
    #[serde(default)]
    market_makers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TradingPairsResponse {
    #[serde(default)]
    pairs: Vec<TradingPair>,
}

#[derive(Debug, Deserialize)]
struct PriceLevelsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    levels: HashMap<String, Vec<MakerPairLevels>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RfqBody<'a> {
    source: &'a str,
    base_chain: Chain,
    quote_chain: Chain,
    rfqs: Vec<RfqEntry<'a>>,
    called_from: &'static str,
    debug: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RfqEntry<'a> {
    base_token: &'a str,
    quote_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_token_amount: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote_token_amount: Option<&'a str>,
    trader: &'a str,
    market_makers: &'a [String],
    fees_bps: u32,
}

impl<'a> RfqBody<'a> {
    fn new(source: &'a str, req: &'a RfqRequest) -> Self {
        let (base_token_amount, quote_token_amount) = match &req.amount {
            RfqAmount::Base(a) => (Some(a.as_str()), None),
            RfqAmount::Quote(a) => (None, Some(a.as_str())),
        };
        Self {
            source,
            base_chain: req.base_chain,
            quote_chain: req.quote_chain,
            rfqs: vec![RfqEntry {
                base_token: &req.base_token,
                quote_token: &req.quote_token,
                base_token_amount,
                quote_token_amount,
                trader: &req.wallet,
                market_makers: &req.market_makers,
                fees_bps: req.fees_bps,
            }],
            called_from: CALLED_FROM,
            debug: true,
        }
    }
}

/// HTTP client for the liquidity provider's taker API.
#[derive(Clone)]
pub struct RfqClient {
    client: Client,
    base_url: Url,
    source: String,
    auth_key: String,
}

impl RfqClient {
    pub fn new(
        base_url: &str,
        source: impl Into<String>,
        auth_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        // `Url::join` drops the last segment unless the path ends in '/'
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            source: source.into(),
            auth_key: auth_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut().append_pair("source", &self.source);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "[RFQ] GET");
        let response = self
            .client
            .get(url)
            .header("Authorization", &self.auth_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!("HTTP {status}: {body}")));
        }
        Ok(response.json().await?)
    }

    /// External ids of the makers on `chain`, optionally narrowed to one maker.
    pub async fn get_market_makers(&self, chain: Chain, maker: Option<&str>) -> Result<Vec<String>> {
        let mut url = self.endpoint("market-makers")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("baseChainType", &chain.chain_type.to_string())
                .append_pair("baseChainId", &chain.chain_id.to_string());
            if let Some(maker) = maker {
                query.append_pair("marketMaker", maker);
            }
        }
        let res: MarketMakersResponse = self.get_json(url).await?;
        Ok(res.market_makers)
    }

    pub async fn get_trading_pairs(&self, chain: Chain) -> Result<Vec<TradingPair>> {
        let mut url = self.endpoint("trading-pairs")?;
        url.query_pairs_mut()
            .append_pair("baseChainType", &chain.chain_type.to_string())
            .append_pair("baseChainId", &chain.chain_id.to_string());
        let res: TradingPairsResponse = self.get_json(url).await?;
        Ok(res.pairs)
    }
}

#[async_trait]
impl LevelsSource for RfqClient {
    async fn get_price_levels(
        &self,
        chain: Chain,
        makers: &[String],
        quote_chain: Chain,
    ) -> Result<HashMap<String, Vec<MakerPairLevels>>> {
        let mut url = self.endpoint("price-levels")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("baseChainType", &chain.chain_type.to_string())
                .append_pair("baseChainId", &chain.chain_id.to_string())
                .append_pair("quoteChainType", &quote_chain.chain_type.to_string())
                .append_pair("quoteChainId", &quote_chain.chain_id.to_string());
            for maker in makers {
                query.append_pair("marketMakers[]", maker);
            }
        }
        let res: PriceLevelsResponse = self.get_json(url).await?;
        if res.status.as_deref() == Some("fail") {
            let error = res.error.map(|e| e.to_string()).unwrap_or_default();
            warn!(error = %error, "[RFQ] price levels request failed");
            return Err(AppError::Api(format!("price levels request failed: {error}")));
        }
        Ok(res.levels)
    }
}

#[async_trait]
impl QuoteSource for RfqClient {
    async fn request_quote(&self, request: &RfqRequest) -> Result<RfqResponse> {
        let url = self.base_url.join("rfq")?;
        let body = RfqBody::new(&self.source, request);
        debug!(
            url = %url,
            maker = ?request.market_makers,
            fees_bps = request.fees_bps,
            "[RFQ] POST"
        );
        let response = self
            .client
            .post(url)
            .header("Authorization", &self.auth_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!("HTTP {status}: {body}")));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChainType;

    fn request(amount: RfqAmount) -> RfqRequest {
        let chain = Chain::new(ChainType::Evm, 1);
        RfqRequest {
            base_chain: chain,
            quote_chain: chain,
            base_token: "0xbase".into(),
            quote_token: "0xquote".into(),
            amount,
            wallet: "0xwallet".into(),
            market_makers: vec!["mm1_1".into()],
            fees_bps: 3,
        }
    }

    #[test]
    fn rfq_body_carries_exactly_one_amount() {
        let req = request(RfqAmount::Quote("2500000".into()));
        let body = serde_json::to_value(RfqBody::new("qa", &req)).unwrap();
        let rfq = &body["rfqs"][0];
        assert_eq!(rfq["quoteTokenAmount"], "2500000");
        assert!(rfq.get("baseTokenAmount").is_none());
        assert_eq!(rfq["trader"], "0xwallet");
        assert_eq!(rfq["feesBps"], 3);
        assert_eq!(body["baseChain"]["chainType"], "evm");
        assert_eq!(body["baseChain"]["chainId"], 1);
    }

    #[test]
    fn endpoints_keep_api_version_prefix() {
        let client = RfqClient::new(api_url_for(Environment::Staging), "qa", "key", DEFAULT_TIMEOUT)
            .unwrap();
        let url = client.endpoint("price-levels").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api-staging.hashflow.com/taker/v3/price-levels?source=qa"
        );
    }

    #[test]
    fn parses_price_levels_response() {
        let raw = r#"{
            "status": "success",
            "levels": {
                "mm1_1": [{
                    "pair": {
                        "baseToken": "0xa", "quoteToken": "0xb",
                        "baseTokenName": "A", "quoteTokenName": "B",
                        "baseTokenDecimals": 18, "quoteTokenDecimals": 6
                    },
                    "levels": [{"q": "0", "p": "1.5"}, {"q": "3", "p": "1.4"}]
                }]
            }
        }"#;
        let parsed: PriceLevelsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.levels["mm1_1"][0].levels.len(), 2);
    }
}
