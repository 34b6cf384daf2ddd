//! Lineage Metrics: metric differences, trends and optimization semantics.
//!
//! Pure functions over [`Metric`] values. Nothing here reads relationship
//! storage: callers pass the parent's metrics and the ancestor history
//! (oldest first, ending at the direct parent).
//!
//! # Modules
//!
//! - [`types`]: `Metric`, `MetricValue` and derived annotations
//! - [`optimization`]: ordered rule table for minimize/maximize inference
//! - [`difference`]: per-value differences
//! - [`trend`]: least-squares trend and volatility
//! - [`engine`]: `MetricLineageEngine` tying the above together
//! - [`ranking`]: sorting versions by a metric

pub mod difference;
pub mod engine;
pub mod optimization;
pub mod ranking;
pub mod trend;
pub mod types;

pub use difference::calculate_value_differences;
pub use engine::{
    MetricLineageEngine, calculate_all_metric_differences, calculate_metric_difference,
    is_positive_change,
};
pub use optimization::{OptimizationRule, OptimizationRules, Predicate, get_optimization_target};
pub use ranking::{MetricKey, SortOrder, best_value, sort_by_metric};
pub use trend::calculate_trend;
pub use types::{
    ChangeDirection, Metric, MetricValue, OptimizationTarget, Significance, Trend, TrendDirection,
    ValueDifference, Volatility, primary_value,
};
