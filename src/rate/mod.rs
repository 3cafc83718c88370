//! Rate aggregation (§3, §4.J), grounded on
//! `original_source/app/model/rate.go`'s `CoingeckoRate`/`ParseFloatRate`/
//! `round`.

pub mod aggregator;
pub mod syntax;

pub use aggregator::{NoAdjustment, RateAggregator, RateError, SyntaxLookup};
pub use syntax::{apply_float_syntax, round_half_up};
