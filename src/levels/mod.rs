//! Depth interpolation over a maker's price levels.
//!
//! Pure and synchronous: given a schedule and a one-sided request it returns
//! the estimated amount on the other side, or why it could not.

pub mod calc;

pub use calc::{
    LevelsError, LevelsFailure, PriceLevel, QuoteRequest, QuoteResult, compute_levels_quote,
    to_price_levels,
};
