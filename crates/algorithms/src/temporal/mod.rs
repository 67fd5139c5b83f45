//! Time-series alignment
//!
//! - Calendar aggregation: raw samples into one frame per month
//! - Temporal joins: keyed inner join on `yearMonth`, broadcast of statics

mod aggregate;
mod join;

pub use aggregate::{aggregate, FrameFn, MonthlyAggregator, Reducer, WindowFn};
pub use join::{broadcast_join, inner_join, join_all, merge_bands};
