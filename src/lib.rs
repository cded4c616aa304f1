//! Core library for the levels-qa project.
//!
//! Estimates what a maker should quote from its published price levels and
//! grades live RFQ quotes against that estimate.

pub mod config;
pub mod errors;
pub mod levels;
pub mod models;
pub mod qa;
pub mod report;
pub mod rfq;
pub mod sampler;
pub mod utils;
pub mod validation;
