pub mod evaluator;
pub mod traits;
pub mod types;

pub use evaluator::{MAX_FEES_BPS, aggregate, deviation_bps, sample, sampling_range};
pub use traits::{LevelsSource, QuoteSource, WalletResolver};
pub use types::{Provided, SampleError, SampleReport, SampleStatistics, SamplerConfig, Trial};
