//! Metric data model shared by the lineage engine and its consumers.
//!
//! Field names serialize in camelCase so enriched metrics can be handed
//! straight to a JSON renderer.

use serde::{Deserialize, Serialize};

// ============================================================================
// Values
// ============================================================================

/// One labelled number of a metric, e.g. `Maximum = 412.0 MPa`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    /// Label such as "Maximum", "Average" or "Minimum".
    pub label: String,
    /// The number.
    pub value: f64,
    /// Optional unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl MetricValue {
    /// Creates a unitless value.
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
            unit: None,
        }
    }

    /// Sets the unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Labels tried, in order, when a metric names no primary value.
pub const PRIMARY_LABEL_FALLBACKS: [&str; 2] = ["Maximum", "Average"];

/// Selects the value that represents a multi-value metric.
///
/// Uses `label` when given and present, else "Maximum", else "Average",
/// else the first value.
pub fn primary_value<'a>(
    values: &'a [MetricValue],
    label: Option<&str>,
) -> Option<&'a MetricValue> {
    label
        .into_iter()
        .chain(PRIMARY_LABEL_FALLBACKS)
        .find_map(|wanted| values.iter().find(|v| v.label == wanted))
        .or_else(|| values.first())
}

// ============================================================================
// Enumerations
// ============================================================================

/// Whether "better" means numerically higher or lower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationTarget {
    /// Lower is better.
    Minimize,
    /// Higher is better.
    Maximize,
}

impl OptimizationTarget {
    /// Returns `true` if `candidate` is strictly better than `current`.
    pub fn is_better(self, candidate: f64, current: f64) -> bool {
        match self {
            Self::Minimize => candidate < current,
            Self::Maximize => candidate > current,
        }
    }

    /// The change direction that counts as an improvement.
    pub fn improving_direction(self) -> ChangeDirection {
        match self {
            Self::Minimize => ChangeDirection::Decrease,
            Self::Maximize => ChangeDirection::Increase,
        }
    }
}

/// Sign of a change between two values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    /// Child is larger.
    Increase,
    /// Child is smaller.
    Decrease,
    /// Within tolerance.
    Unchanged,
}

/// Direction of a fitted trend relative to the optimization target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Moving toward the target.
    Improving,
    /// Moving away from the target.
    Declining,
    /// Slope below threshold.
    Stable,
}

/// Dispersion class of a value history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    /// Coefficient of variation under 5%.
    Low,
    /// Under 15%.
    Medium,
    /// 15% or more.
    High,
}

/// How much a change matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    /// Over 10%.
    Critical,
    /// Over 5%.
    Important,
    /// Everything else.
    Standard,
}

impl Significance {
    /// Classifies a percentage change by magnitude.
    pub fn from_percentage(percentage: f64) -> Self {
        let magnitude = percentage.abs();
        if magnitude > 10.0 {
            Self::Critical
        } else if magnitude > 5.0 {
            Self::Important
        } else {
            Self::Standard
        }
    }
}

// ============================================================================
// Derived annotations
// ============================================================================

/// Change of one labelled value between parent and child.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueDifference {
    /// Label shared by both values.
    pub value_label: String,
    /// `child - parent`.
    pub absolute: f64,
    /// Relative change in percent; 0 when the parent value is 0.
    pub percentage: f64,
    /// Sign of the change.
    pub direction: ChangeDirection,
}

/// Regression trend over a metric's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    /// Trend over the last three points.
    pub short_term: TrendDirection,
    /// Trend over the full history.
    pub long_term: TrendDirection,
    /// Dispersion over the full history.
    pub volatility: Volatility,
    /// Least-squares slope over the full history, per version.
    pub slope: f64,
}

// ============================================================================
// Metric
// ============================================================================

/// An engineering metric attached to a version.
///
/// Metrics are matched across versions by `(title, metric_type)` only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    /// Display title, e.g. "Maximum Stress".
    pub title: String,
    /// Free-form category.
    #[serde(rename = "type", default)]
    pub metric_type: String,
    /// Labelled values.
    #[serde(default)]
    pub values: Vec<MetricValue>,
    /// Label of the representative value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_value_label: Option<String>,
    /// Explicit optimization target; classified from the title when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_target: Option<OptimizationTarget>,
    /// Per-value changes against the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differences: Option<Vec<ValueDifference>>,
    /// Change of the primary value against the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<ValueDifference>,
    /// Trend over the ancestor history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    /// Whether the primary value is the best seen along the lineage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_optimized: Option<bool>,
    /// Magnitude class of the primary change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significance: Option<Significance>,
}

impl Metric {
    /// Creates a metric without values.
    pub fn new(title: impl Into<String>, metric_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            metric_type: metric_type.into(),
            ..Self::default()
        }
    }

    /// Appends a unitless value.
    pub fn with_value(mut self, label: impl Into<String>, value: f64) -> Self {
        self.values.push(MetricValue::new(label, value));
        self
    }

    /// Names the primary value.
    pub fn with_primary_value_label(mut self, label: impl Into<String>) -> Self {
        self.primary_value_label = Some(label.into());
        self
    }

    /// Fixes the optimization target.
    pub fn with_optimization_target(mut self, target: OptimizationTarget) -> Self {
        self.optimization_target = Some(target);
        self
    }

    /// Identity used to match a metric across versions.
    pub fn key(&self) -> (&str, &str) {
        (&self.title, &self.metric_type)
    }

    /// Returns `true` if `other` is the same metric.
    pub fn same_metric(&self, other: &Metric) -> bool {
        self.key() == other.key()
    }

    /// The representative value.
    pub fn primary_value(&self) -> Option<&MetricValue> {
        primary_value(&self.values, self.primary_value_label.as_deref())
    }

    /// The representative number.
    pub fn primary(&self) -> Option<f64> {
        self.primary_value().map(|v| v.value)
    }

    /// Value with the given label.
    pub fn value(&self, label: &str) -> Option<&MetricValue> {
        self.values.iter().find(|v| v.label == label)
    }

    /// Drops every derived annotation, keeping the raw values.
    pub fn without_annotations(&self) -> Self {
        Self {
            title: self.title.clone(),
            metric_type: self.metric_type.clone(),
            values: self.values.clone(),
            primary_value_label: self.primary_value_label.clone(),
            optimization_target: self.optimization_target,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, f64)]) -> Vec<MetricValue> {
        pairs.iter().map(|(l, v)| MetricValue::new(*l, *v)).collect()
    }

    #[test]
    fn test_primary_value_prefers_label() {
        let vals = values(&[("Minimum", 1.0), ("Average", 2.0), ("Maximum", 3.0)]);
        assert_eq!(primary_value(&vals, Some("Minimum")).unwrap().value, 1.0);
        assert_eq!(primary_value(&vals, None).unwrap().value, 3.0);
    }

    #[test]
    fn test_primary_value_fallbacks() {
        let vals = values(&[("Minimum", 1.0), ("Average", 2.0)]);
        assert_eq!(primary_value(&vals, Some("Median")).unwrap().value, 2.0);

        let vals = values(&[("P95", 7.0), ("P99", 9.0)]);
        assert_eq!(primary_value(&vals, None).unwrap().label, "P95");

        assert!(primary_value(&[], None).is_none());
    }

    #[test]
    fn test_significance_thresholds() {
        assert_eq!(Significance::from_percentage(10.5), Significance::Critical);
        assert_eq!(Significance::from_percentage(-12.0), Significance::Critical);
        assert_eq!(Significance::from_percentage(10.0), Significance::Important);
        assert_eq!(Significance::from_percentage(5.0), Significance::Standard);
        assert_eq!(Significance::from_percentage(0.0), Significance::Standard);
    }

    #[test]
    fn test_metric_json_shape() {
        let metric = Metric::new("Maximum Stress", "stress")
            .with_value("Maximum", 412.0)
            .with_optimization_target(OptimizationTarget::Minimize);
        let json = serde_json::to_value(&metric).unwrap();

        assert_eq!(json["type"], "stress");
        assert_eq!(json["optimizationTarget"], "minimize");
        assert!(json.get("trend").is_none());

        let back: Metric = serde_json::from_value(json).unwrap();
        assert_eq!(back, metric);
    }

    #[test]
    fn test_metric_deserializes_minimal_input() {
        let metric: Metric = serde_json::from_str(
            r#"{
                "title": "Mass",
                "type": "weight",
                "values": [{"label": "Total", "value": 3.5, "unit": "kg"}]
            }"#,
        )
        .unwrap();
        assert_eq!(metric.primary(), Some(3.5));
        assert_eq!(metric.values[0].unit.as_deref(), Some("kg"));
        assert!(metric.is_optimized.is_none());
    }

    #[test]
    fn test_without_annotations() {
        let mut metric = Metric::new("Cost", "currency").with_value("Total", 5.0);
        metric.is_optimized = Some(true);
        metric.significance = Some(Significance::Critical);

        let raw = metric.without_annotations();
        assert!(raw.is_optimized.is_none());
        assert!(raw.significance.is_none());
        assert_eq!(raw.values, metric.values);
    }
}
