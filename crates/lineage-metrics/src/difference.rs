//! Per-value differences between a child metric and its parent.

use crate::{ChangeDirection, MetricValue, ValueDifference};

/// Absolute changes below this are reported as unchanged.
pub const UNCHANGED_TOLERANCE: f64 = 0.001;

/// Difference of a single value pair.
pub fn value_difference(label: &str, child: f64, parent: f64) -> ValueDifference {
    let absolute = child - parent;
    let percentage = if parent != 0.0 {
        absolute / parent * 100.0
    } else {
        0.0
    };
    let direction = if absolute.abs() < UNCHANGED_TOLERANCE {
        ChangeDirection::Unchanged
    } else if absolute > 0.0 {
        ChangeDirection::Increase
    } else {
        ChangeDirection::Decrease
    };

    ValueDifference {
        value_label: label.to_string(),
        absolute,
        percentage,
        direction,
    }
}

/// Differences for every child value with a same-label parent value.
///
/// Child order is kept; labels missing from the parent are skipped.
pub fn calculate_value_differences(
    child: &[MetricValue],
    parent: &[MetricValue],
) -> Vec<ValueDifference> {
    child
        .iter()
        .filter_map(|c| {
            let p = parent.iter().find(|p| p.label == c.label)?;
            Some(value_difference(&c.label, c.value, p.value))
        })
        .collect()
}
