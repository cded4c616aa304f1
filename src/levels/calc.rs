use crate::models::RawPriceLevel;
use bigdecimal::BigDecimal;
use num_traits::Zero;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One point on a maker's depth curve.
///
/// `depth` is the cumulative base amount available at or better than `price`;
/// `price` is quote-per-base.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceLevel {
    pub depth: BigDecimal,
    pub price: BigDecimal,
}

impl PriceLevel {
    pub fn new(depth: BigDecimal, price: BigDecimal) -> Self {
        Self { depth, price }
    }
}

/// Amount a caller wants priced. The side that carries the amount is the
/// side being provided; the engine answers with the other side.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteRequest {
    /// Base (input) amount is fixed, the quote amount is estimated.
    Input(BigDecimal),
    /// Quote (output) amount is fixed, the base amount is estimated.
    Output(BigDecimal),
}

impl QuoteRequest {
    /// Builds a request from two optional amounts, exactly one of which must
    /// be present.
    pub fn from_amounts(
        input: Option<BigDecimal>,
        output: Option<BigDecimal>,
    ) -> Result<Self, LevelsError> {
        match (input, output) {
            (Some(_), Some(_)) => Err(LevelsError::BothAmounts),
            (Some(input), None) => Ok(Self::Input(input)),
            (None, Some(output)) => Ok(Self::Output(output)),
            (None, None) => Err(LevelsError::NoAmount),
        }
    }
}

/// Why a schedule could not price a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelsFailure {
    InsufficientLiquidity,
    BelowMinimumAmount,
}

impl fmt::Display for LevelsFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientLiquidity => write!(f, "insufficient_liquidity"),
            Self::BelowMinimumAmount => write!(f, "below_minimum_amount"),
        }
    }
}

/// Outcome of walking a schedule: either the counter-amount or a
/// classified failure, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteResult {
    Amount(BigDecimal),
    Failure(LevelsFailure),
}

impl QuoteResult {
    pub fn amount(&self) -> Option<&BigDecimal> {
        match self {
            Self::Amount(a) => Some(a),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<LevelsFailure> {
        match self {
            Self::Amount(_) => None,
            Self::Failure(f) => Some(*f),
        }
    }

    pub fn into_amount(self) -> Option<BigDecimal> {
        match self {
            Self::Amount(a) => Some(a),
            Self::Failure(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LevelsError {
    #[error("Base amount and quote amount cannot both be specified")]
    BothAmounts,

    #[error("Either a base amount or a quote amount must be specified")]
    NoAmount,

    #[error("Invalid decimal in price level: {0}")]
    InvalidNumber(String),

    #[error("Price must be strictly positive, got {0}")]
    NonPositivePrice(String),
}

/// Parses wire levels into decimals, optionally replacing every price by
/// its reciprocal so one schedule can price the opposite direction.
pub fn to_price_levels(
    raw: &[RawPriceLevel],
    invert: bool,
) -> Result<Vec<PriceLevel>, LevelsError> {
    raw.iter()
        .map(|lvl| {
            let depth = BigDecimal::from_str(&lvl.q)
                .map_err(|_| LevelsError::InvalidNumber(lvl.q.clone()))?;
            let price = BigDecimal::from_str(&lvl.p)
                .map_err(|_| LevelsError::InvalidNumber(lvl.p.clone()))?;
            if price <= BigDecimal::zero() {
                return Err(LevelsError::NonPositivePrice(lvl.p.clone()));
            }
            let price = if invert { price.inverse() } else { price };
            Ok(PriceLevel { depth, price })
        })
        .collect()
}

/// Estimates the counter-amount for `request` by walking the depth tiers of
/// `levels`.
///
/// Tier 0 is the smallest quotable clip: anything below it is
/// `BelowMinimumAmount`. Tier `i` spans the depth between levels `i - 1` and
/// `i` and fills at level `i`'s price. A request beyond the last tier is
/// `InsufficientLiquidity`, as is any request against an empty schedule.
pub fn compute_levels_quote(levels: &[PriceLevel], request: &QuoteRequest) -> QuoteResult {
    let Some(first) = levels.first() else {
        return QuoteResult::Failure(LevelsFailure::InsufficientLiquidity);
    };

    let mut filled_input = first.depth.clone();
    let mut filled_output = &first.depth * &first.price;

    match request {
        QuoteRequest::Input(a) if *a < filled_input => {
            return QuoteResult::Failure(LevelsFailure::BelowMinimumAmount);
        }
        QuoteRequest::Output(a) if *a < filled_output => {
            return QuoteResult::Failure(LevelsFailure::BelowMinimumAmount);
        }
        // Exactly the minimum clip
        QuoteRequest::Input(a) if *a == filled_input => return QuoteResult::Amount(filled_output),
        QuoteRequest::Output(a) if *a == filled_output => return QuoteResult::Amount(filled_input),
        _ => {}
    }

    for tier in levels.windows(2) {
        let (prev, level) = (&tier[0], &tier[1]);
        let tier_depth = &level.depth - &prev.depth;
        let next_input = &filled_input + &tier_depth;
        let next_output = &filled_output + &(&tier_depth * &level.price);

        match request {
            QuoteRequest::Input(a) if *a <= next_input => {
                let remainder = a - &filled_input;
                return QuoteResult::Amount(&filled_output + &(&remainder * &level.price));
            }
            QuoteRequest::Output(a) if *a <= next_output => {
                let remainder = a - &filled_output;
                return QuoteResult::Amount(&filled_input + &(&remainder / &level.price));
            }
            _ => {}
        }

        filled_input = next_input;
        filled_output = next_output;
    }

    QuoteResult::Failure(LevelsFailure::InsufficientLiquidity)
}
