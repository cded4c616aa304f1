//! Miscellaneous helper utilities.

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Zero};
use rand::Rng;
use tracing_subscriber::{EnvFilter, fmt};

/// Basis points per unit.
pub const BPS: i64 = 10_000;

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Token amount -> base units (`amount * 10^decimals`), exact.
pub fn convert_to_decimals(amount: &BigDecimal, decimals: u32) -> BigDecimal {
    amount * &BigDecimal::new(BigInt::from(1), -i64::from(decimals))
}

/// Base units -> token amount (`amount * 10^-decimals`), exact.
pub fn convert_from_decimals(amount: &BigDecimal, decimals: u32) -> BigDecimal {
    amount * &BigDecimal::new(BigInt::from(1), i64::from(decimals))
}

/// Integer base-unit string for an RFQ.
///
/// Rounds up: truncating could land the request just under the minimum clip.
pub fn to_base_units_round_up(amount: &BigDecimal, decimals: u32) -> String {
    let (digits, _) = convert_to_decimals(amount, decimals)
        .with_scale_round(0, RoundingMode::Up)
        .into_bigint_and_exponent();
    digits.to_string()
}

/// `1 - fees_bps / 10000`
pub fn fee_factor(fees_bps: u32) -> BigDecimal {
    BigDecimal::from(1) - BigDecimal::from(fees_bps) / BigDecimal::from(BPS)
}

/// Rounds a basis-point value to two decimal places, half away from zero.
pub fn round_bps(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Uniform draw in `[min, max]`.
pub fn random_amount_between<R: Rng + ?Sized>(
    rng: &mut R,
    min: &BigDecimal,
    max: &BigDecimal,
) -> BigDecimal {
    let unit = BigDecimal::from_f64(rng.gen_range(0.0..=1.0)).unwrap_or_else(BigDecimal::zero);
    min + &((max - min) * unit)
}
