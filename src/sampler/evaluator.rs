use super::traits::{LevelsSource, QuoteSource, WalletResolver};
use super::types::{Provided, SampleError, SampleReport, SampleStatistics, SamplerConfig, Trial};
use crate::levels::{PriceLevel, QuoteRequest, QuoteResult, compute_levels_quote, to_price_levels};
use crate::models::{MakerPairLevels, PairLevels, RawPriceLevel, RfqAmount, RfqRequest, RfqStatus};
use crate::utils::{
    BPS, convert_from_decimals, convert_to_decimals, fee_factor, random_amount_between, round_bps,
    to_base_units_round_up,
};
use bigdecimal::BigDecimal;
use futures::future::join_all;
use num_bigint::BigInt;
use num_traits::Zero;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fees are drawn uniformly from `0..=MAX_FEES_BPS`.
pub const MAX_FEES_BPS: u32 = 10;

/// Random draws for one trial, taken in the dispatch loop so the RNG is
/// never shared with running trials.
#[derive(Debug, Clone)]
struct TrialPlan {
    provided: Provided,
    base_amount: BigDecimal,
    fees_bps: u32,
}

impl TrialPlan {
    fn draw<R: Rng>(rng: &mut R, min_depth: &BigDecimal, max_depth: &BigDecimal) -> Self {
        let provided = if rng.gen_bool(0.5) {
            Provided::Base
        } else {
            Provided::Quote
        };
        let base_amount = random_amount_between(rng, min_depth, max_depth);
        let fees_bps = rng.gen_range(0..=MAX_FEES_BPS);
        Self {
            provided,
            base_amount,
            fees_bps,
        }
    }
}

/// Read-only state every trial of a round shares.
struct TrialContext {
    maker: String,
    entry: PairLevels,
    wallet: String,
    pre_levels: Vec<PriceLevel>,
    trial_timeout: Duration,
}

/// `[first depth, max(0.95 * last depth, first depth)]`
///
/// Staying inside the book's edge keeps trials off the exact liquidity
/// boundary, where makers routinely decline.
pub fn sampling_range(levels: &[PriceLevel]) -> Option<(BigDecimal, BigDecimal)> {
    let (first, last) = (levels.first()?, levels.last()?);
    let min_depth = first.depth.clone();
    let max_depth = &last.depth * &BigDecimal::new(BigInt::from(95), 2);
    if max_depth < min_depth {
        return Some((min_depth.clone(), min_depth));
    }
    Some((min_depth, max_depth))
}

/// Signed deviation of a live quote from the levels, in bps rounded to two
/// decimals. Positive means the maker gave the taker less than expected.
///
/// Both amounts must be in the same units. `None` when nothing was expected
/// but the maker quoted a non-zero amount; zero when both are zero.
pub fn deviation_bps(
    provided: Provided,
    received: &BigDecimal,
    expected: &BigDecimal,
) -> Option<BigDecimal> {
    if expected.is_zero() {
        return received.is_zero().then(BigDecimal::zero);
    }
    let diff = match provided {
        Provided::Base => expected - received,
        Provided::Quote => received - expected,
    };
    let bps = round_bps(&(&(&diff * &BigDecimal::from(BPS)) / expected));
    if bps.is_zero() {
        Some(BigDecimal::zero())
    } else {
        Some(bps)
    }
}

/// Success rate over `num_trials`; mean and population standard deviation
/// of the deviations of successful trials only.
pub fn aggregate(trials: &[Trial], num_trials: usize) -> SampleStatistics {
    let deviations: Vec<&BigDecimal> = trials
        .iter()
        .filter(|t| t.is_success())
        .filter_map(|t| t.deviation_bps.as_ref())
        .collect();
    let num_success = deviations.len();
    let success_rate = if num_trials == 0 {
        0.0
    } else {
        (num_success as f64 / num_trials as f64).min(1.0)
    };

    if num_success == 0 {
        return SampleStatistics {
            num_trials,
            num_success,
            success_rate,
            bias_bps: None,
            deviation_bps: None,
        };
    }

    let n = BigDecimal::from(num_success as u64);
    let sum = deviations
        .iter()
        .fold(BigDecimal::zero(), |acc, d| acc + *d);
    let bias = &sum / &n;
    let sum_squared = deviations.iter().fold(BigDecimal::zero(), |acc, d| {
        let diff = *d - &bias;
        acc + &diff * &diff
    });
    let deviation = (&sum_squared / &n).sqrt();

    SampleStatistics {
        num_trials,
        num_success,
        success_rate,
        bias_bps: Some(bias),
        deviation_bps: deviation,
    }
}

/// Runs `config.num_trials` RFQs against one maker/pair and grades each
/// against the maker's own levels.
///
/// Trials are spawned as they are drawn and awaited together; `config.delay`
/// only spaces out dispatch. A failing trial is recorded, never fatal. Fewer
/// than two levels or a missing taker wallet abort the round.
pub async fn sample<L, Q, W>(
    maker: &str,
    entry: &PairLevels,
    levels_source: Arc<L>,
    quote_source: Arc<Q>,
    wallets: &W,
    config: &SamplerConfig,
) -> Result<SampleReport, SampleError>
where
    L: LevelsSource + ?Sized + 'static,
    Q: QuoteSource + ?Sized + 'static,
    W: WalletResolver + ?Sized,
{
    let too_few = || SampleError::TooFewLevels {
        maker: maker.to_string(),
        levels: entry.levels.len(),
    };
    let wallet = wallets
        .wallet_for(&entry.quote_token.chain)
        .ok_or(SampleError::NoWallet {
            chain: entry.quote_token.chain,
        })?;
    if entry.levels.len() < 2 {
        return Err(too_few());
    }
    let pre_levels = to_price_levels(&entry.levels, false)?;
    let (min_depth, max_depth) = sampling_range(&pre_levels).ok_or_else(too_few)?;

    info!(
        maker,
        pair = %entry.label(),
        num_trials = config.num_trials,
        %min_depth,
        %max_depth,
        "[SAMPLER] requesting RFQs"
    );

    let ctx = Arc::new(TrialContext {
        maker: maker.to_string(),
        entry: entry.clone(),
        wallet,
        pre_levels,
        trial_timeout: config.trial_timeout,
    });
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut provided = Vec::with_capacity(config.num_trials);
    let mut handles = Vec::with_capacity(config.num_trials);
    for index in 0..config.num_trials {
        if index > 0 && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
        let plan = TrialPlan::draw(&mut rng, &min_depth, &max_depth);
        provided.push(plan.provided);
        handles.push(tokio::spawn(run_trial(
            index,
            plan,
            ctx.clone(),
            levels_source.clone(),
            quote_source.clone(),
        )));
    }

    let trials: Vec<Trial> = join_all(handles)
        .await
        .into_iter()
        .zip(provided)
        .enumerate()
        .map(|(index, (res, provided))| match res {
            Ok(trial) => trial,
            Err(e) => {
                warn!(index, error = %e, "[SAMPLER] trial task failed");
                Trial::failed(index, provided, format!("Error occurred: {e}"))
            }
        })
        .collect();

    let stats = aggregate(&trials, config.num_trials);
    info!(
        maker,
        pair = %entry.label(),
        success_rate = stats.success_rate,
        bias_bps = ?stats.bias_bps.as_ref().map(ToString::to_string),
        deviation_bps = ?stats.deviation_bps.as_ref().map(ToString::to_string),
        "[SAMPLER] round complete"
    );

    Ok(SampleReport { stats, trials })
}

async fn run_trial<L, Q>(
    index: usize,
    plan: TrialPlan,
    ctx: Arc<TrialContext>,
    levels_source: Arc<L>,
    quote_source: Arc<Q>,
) -> Trial
where
    L: LevelsSource + ?Sized,
    Q: QuoteSource + ?Sized,
{
    let TrialPlan {
        provided,
        base_amount,
        fees_bps,
    } = plan;
    let (base, quote) = (&ctx.entry.base_token, &ctx.entry.quote_token);
    let mut trial = Trial::new(index, provided);
    trial.base_amount = Some(base_amount.clone());

    let quote_amount =
        match compute_levels_quote(&ctx.pre_levels, &QuoteRequest::Input(base_amount.clone())) {
            QuoteResult::Amount(a) => a,
            QuoteResult::Failure(failure) => {
                return fail(
                    trial,
                    format!(
                        "Could not estimate pre-RFQ prices: {failure}. {}",
                        levels_json(&ctx.entry.levels)
                    ),
                );
            }
        };
    trial.quote_amount = Some(quote_amount.clone());
    trial.fees_bps = Some(fees_bps);

    let amount = match provided {
        Provided::Base => RfqAmount::Base(to_base_units_round_up(&base_amount, base.decimals)),
        Provided::Quote => RfqAmount::Quote(to_base_units_round_up(&quote_amount, quote.decimals)),
    };
    let request = RfqRequest {
        base_chain: base.chain,
        quote_chain: quote.chain,
        base_token: base.address.clone(),
        quote_token: quote.address.clone(),
        amount,
        wallet: ctx.wallet.clone(),
        market_makers: vec![ctx.maker.clone()],
        fees_bps,
    };

    let makers = [ctx.maker.clone()];
    let io = async {
        tokio::join!(
            levels_source.get_price_levels(base.chain, &makers, quote.chain),
            quote_source.request_quote(&request)
        )
    };
    let (levels_map, rfq) = match tokio::time::timeout(ctx.trial_timeout, io).await {
        Ok((Ok(levels_map), Ok(rfq))) => (levels_map, rfq),
        Ok((Err(e), _)) | Ok((_, Err(e))) => return fail(trial, format!("Error occurred: {e}")),
        Err(_) => {
            return fail(
                trial,
                format!("Timed out after {}ms", ctx.trial_timeout.as_millis()),
            );
        }
    };

    // Depth may have moved since the round started; grade against what the
    // maker published alongside this quote.
    let Some(fresh) = find_pair_levels(&levels_map, &ctx.maker, &base.address, &quote.address)
    else {
        return fail(
            trial,
            format!(
                "No levels for {}. Received: {}",
                ctx.maker,
                serde_json::to_string(&levels_map).unwrap_or_default()
            ),
        );
    };
    let post_levels = match to_price_levels(fresh, false) {
        Ok(levels) => levels,
        Err(e) => return fail(trial, format!("Could not parse post-RFQ levels: {e}")),
    };

    let post = match provided {
        Provided::Base => compute_levels_quote(&post_levels, &QuoteRequest::Input(base_amount.clone())),
        Provided::Quote => {
            compute_levels_quote(&post_levels, &QuoteRequest::Output(quote_amount.clone()))
        }
    };
    let factor = fee_factor(fees_bps);
    let expected_amount = match post {
        QuoteResult::Amount(raw) if provided == Provided::Base => &raw * &factor,
        QuoteResult::Amount(raw) => &raw / &factor,
        QuoteResult::Failure(failure) => {
            return fail(
                trial,
                format!(
                    "Could not estimate post-RFQ prices: {failure}. {}",
                    levels_json(fresh)
                ),
            );
        }
    };
    trial.expected_amount = Some(expected_amount.clone());

    let expected_decimals = match provided {
        Provided::Base => quote.decimals,
        Provided::Quote => base.decimals,
    };
    let expected_units = convert_to_decimals(&expected_amount, expected_decimals);

    if rfq.status == RfqStatus::Fail {
        let error = rfq
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "null".to_string());
        trial.rfq_ids = rfq.internal_rfq_ids.unwrap_or_default();
        return fail(trial, format!("No quote data. Received error: {error}"));
    }
    trial.rfq_ids = rfq.rfq_id.into_iter().collect();

    // One maker per request, so only the first quote is meaningful.
    let Some(first) = rfq.quotes.first() else {
        return fail(trial, "No quote data. Received no quotes".to_string());
    };
    let received_raw = match provided {
        Provided::Base => &first.quote_data.quote_token_amount,
        Provided::Quote => &first.quote_data.base_token_amount,
    };
    let received_units = match BigDecimal::from_str(received_raw) {
        Ok(v) => v,
        Err(_) => return fail(trial, format!("Invalid quote amount '{received_raw}'")),
    };
    let received_amount = convert_from_decimals(&received_units, expected_decimals);
    let Some(deviation) = deviation_bps(provided, &received_units, &expected_units) else {
        return fail(trial, "Expected amount is zero".to_string());
    };

    debug!(
        index,
        %provided,
        %expected_amount,
        %received_amount,
        %deviation,
        fees_bps,
        "[SAMPLER] trial completed"
    );

    match provided {
        Provided::Base => trial.quote_amount = Some(received_amount),
        Provided::Quote => trial.base_amount = Some(received_amount),
    }
    trial.deviation_bps = Some(deviation);
    trial
}

fn fail(mut trial: Trial, msg: String) -> Trial {
    debug!(index = trial.index, msg = %msg, "[SAMPLER] trial failed");
    trial.fail_msg = Some(msg);
    trial
}

fn find_pair_levels<'a>(
    levels_map: &'a HashMap<String, Vec<MakerPairLevels>>,
    maker: &str,
    base_token: &str,
    quote_token: &str,
) -> Option<&'a [RawPriceLevel]> {
    levels_map
        .get(maker)?
        .iter()
        .find(|e| e.pair.base_token == base_token && e.pair.quote_token == quote_token)
        .map(|e| e.levels.as_slice())
}

fn levels_json(levels: &[RawPriceLevel]) -> String {
    serde_json::to_string(levels).unwrap_or_default()
}
