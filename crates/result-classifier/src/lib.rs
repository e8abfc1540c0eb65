//! Pure presentation helpers for analysis results: rank tiers, benchmark rows,
//! number formatting and valuation ordering. No I/O.

pub mod format;
pub mod rank;
pub mod valuation;

pub use format::{benchmark_row, format_currency, format_growth, format_metric, format_percentile, NOT_AVAILABLE};
pub use rank::{ranked_positions, RankTier, RankedMetric};
pub use valuation::{leaf_score, sort_batch, ValuationClass};
