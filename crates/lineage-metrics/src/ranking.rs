//! Ordering versions by a metric's primary value.

use crate::optimization::OptimizationRules;
use crate::{Metric, OptimizationTarget};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction for metric ranking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
    /// Best first under the metric's optimization target.
    #[default]
    BestFirst,
}

impl SortOrder {
    /// Resolves `BestFirst` against a target.
    pub fn resolve(self, target: OptimizationTarget) -> SortOrder {
        match (self, target) {
            (Self::BestFirst, OptimizationTarget::Minimize) => Self::Ascending,
            (Self::BestFirst, OptimizationTarget::Maximize) => Self::Descending,
            (order, _) => order,
        }
    }
}

/// Metric identity to rank by.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricKey {
    /// Metric title.
    pub title: String,
    /// Metric type.
    #[serde(rename = "type", default)]
    pub metric_type: String,
}

impl MetricKey {
    /// Creates a key.
    pub fn new(title: impl Into<String>, metric_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            metric_type: metric_type.into(),
        }
    }

    /// Returns `true` if `metric` has this identity.
    pub fn matches(&self, metric: &Metric) -> bool {
        metric.key() == (self.title.as_str(), self.metric_type.as_str())
    }

    /// The matching metric in `metrics`.
    pub fn find<'a>(&self, metrics: &'a [Metric]) -> Option<&'a Metric> {
        metrics.iter().find(|m| self.matches(m))
    }
}

/// Stable sort of `items` by the primary value of the metric `key`.
///
/// Items without the metric, or without a finite primary value, go last in
/// their original order. `BestFirst` uses the target `rules` assign to the
/// first matching metric; with no match at all the order is left as is.
pub fn sort_by_metric<T, F>(
    items: &mut [T],
    metrics_of: F,
    key: &MetricKey,
    order: SortOrder,
    rules: &OptimizationRules,
) where
    F: Fn(&T) -> &[Metric],
{
    let Some(sample) = items.iter().find_map(|item| key.find(metrics_of(item))) else {
        log::debug!("no version carries metric '{}'; order unchanged", key.title);
        return;
    };
    let order = order.resolve(rules.target_for(sample));

    let value_of = |item: &T| {
        key.find(metrics_of(item))
            .and_then(Metric::primary)
            .filter(|v| v.is_finite())
    };

    items.sort_by(|a, b| match (value_of(a), value_of(b)) {
        (Some(x), Some(y)) => match order {
            SortOrder::Descending => y.total_cmp(&x),
            _ => x.total_cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Best primary value in `values` under `target`.
pub fn best_value(
    values: impl IntoIterator<Item = f64>,
    target: OptimizationTarget,
) -> Option<f64> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .reduce(|best, v| if target.is_better(v, best) { v } else { best })
}
