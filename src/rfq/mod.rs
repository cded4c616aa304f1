//! Taker API client.
//!
//! Responsibilities:
//! • Discover market makers and trading pairs.
//! • Fetch price levels (the sampler's levels source).
//! • Submit RFQs (the sampler's quote source).

pub mod client;

pub use client::{DEFAULT_TIMEOUT, RfqClient, api_url_for};
