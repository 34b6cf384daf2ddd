//! Lineage enrichment of metrics against their parent and ancestors.
//!
//! The engine never touches relationship storage. The caller supplies the
//! parent's metrics and the metrics of every ancestor, oldest first and
//! ending at the direct parent.

use crate::difference::{calculate_value_differences, value_difference};
use crate::optimization::OptimizationRules;
use crate::trend::calculate_trend;
use crate::{ChangeDirection, Metric, OptimizationTarget, Significance, ValueDifference};

/// Metric enrichment with a configurable optimization rule table.
#[derive(Clone, Debug, Default)]
pub struct MetricLineageEngine {
    rules: OptimizationRules,
}

impl MetricLineageEngine {
    /// Creates an engine using the built-in rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the optimization rule table.
    pub fn with_rules(mut self, rules: OptimizationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Rule table in use.
    pub fn rules(&self) -> &OptimizationRules {
        &self.rules
    }

    /// Target of `metric`: explicit if set, else classified.
    pub fn optimization_target(&self, metric: &Metric) -> OptimizationTarget {
        self.rules.target_for(metric)
    }

    /// Enriches `child` against its parent counterpart and history.
    ///
    /// `history` holds earlier occurrences of the same metric, oldest first.
    /// A parent with a different `(title, type)` counts as no parent.
    pub fn calculate_metric_difference(
        &self,
        child: &Metric,
        parent: Option<&Metric>,
        history: &[&Metric],
    ) -> Metric {
        let target = self.optimization_target(child);
        let mut enriched = child.without_annotations();
        enriched.optimization_target = Some(target);

        let Some(parent) = parent.filter(|p| p.same_metric(child)) else {
            if !history.iter().any(|m| m.same_metric(child)) {
                enriched.is_optimized = Some(true);
            }
            return enriched;
        };

        enriched.differences = Some(calculate_value_differences(&child.values, &parent.values));

        let difference = primary_difference(child, parent);
        enriched.significance = difference
            .as_ref()
            .map(|d| Significance::from_percentage(d.percentage));
        enriched.difference = difference;

        let past: Vec<f64> = history
            .iter()
            .filter(|m| m.same_metric(child))
            .filter_map(|m| m.primary())
            .collect();
        enriched.trend = calculate_trend(&past, target);

        if let Some(current) = child.primary() {
            enriched.is_optimized = Some(!past.iter().any(|&v| target.is_better(v, current)));
        }

        enriched
    }

    /// Enriches every child metric.
    ///
    /// Each child metric is matched to the parent list and to every
    /// ancestor list by `(title, type)`. `history` is one metric list per
    /// ancestor, oldest first. Unmatched metrics pass through with only
    /// their optimization target set.
    pub fn calculate_all_metric_differences<H: AsRef<[Metric]>>(
        &self,
        child_metrics: &[Metric],
        parent_metrics: &[Metric],
        history: &[H],
    ) -> Vec<Metric> {
        child_metrics
            .iter()
            .map(|child| {
                let parent = parent_metrics.iter().find(|p| p.same_metric(child));
                let past: Vec<&Metric> = history
                    .iter()
                    .filter_map(|metrics| metrics.as_ref().iter().find(|m| m.same_metric(child)))
                    .collect();
                if parent.is_none() {
                    log::trace!("metric '{}' has no parent counterpart", child.title);
                }
                self.calculate_metric_difference(child, parent, &past)
            })
            .collect()
    }

    /// Whether the recorded change moves toward the target.
    ///
    /// Looks at the difference for `value_label` when given, else the
    /// primary difference. Unchanged or missing differences count as
    /// positive.
    pub fn is_positive_change(&self, metric: &Metric, value_label: Option<&str>) -> bool {
        let difference = match value_label {
            Some(label) => metric
                .differences
                .as_ref()
                .and_then(|diffs| diffs.iter().find(|d| d.value_label == label)),
            None => metric.difference.as_ref(),
        };
        match difference.map(|d| d.direction) {
            None | Some(ChangeDirection::Unchanged) => true,
            Some(direction) => direction == self.optimization_target(metric).improving_direction(),
        }
    }
}

/// Difference of the child's primary value against the parent's value
/// with the same label, falling back to the parent's own primary value.
fn primary_difference(child: &Metric, parent: &Metric) -> Option<ValueDifference> {
    let current = child.primary_value()?;
    let previous = parent.value(&current.label).or_else(|| parent.primary_value())?;
    Some(value_difference(&current.label, current.value, previous.value))
}

// ============================================================================
// Free-function entry points using the built-in rules
// ============================================================================

/// See [`MetricLineageEngine::calculate_metric_difference`].
pub fn calculate_metric_difference(
    child: &Metric,
    parent: Option<&Metric>,
    history: &[&Metric],
) -> Metric {
    MetricLineageEngine::new().calculate_metric_difference(child, parent, history)
}

/// See [`MetricLineageEngine::calculate_all_metric_differences`].
pub fn calculate_all_metric_differences<H: AsRef<[Metric]>>(
    child_metrics: &[Metric],
    parent_metrics: &[Metric],
    history: &[H],
) -> Vec<Metric> {
    MetricLineageEngine::new().calculate_all_metric_differences(
        child_metrics,
        parent_metrics,
        history,
    )
}

/// See [`MetricLineageEngine::is_positive_change`].
pub fn is_positive_change(metric: &Metric, value_label: Option<&str>) -> bool {
    MetricLineageEngine::new().is_positive_change(metric, value_label)
}
