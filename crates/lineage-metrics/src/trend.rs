//! Regression trend and volatility over a primary-value history.

use crate::{OptimizationTarget, Trend, TrendDirection, Volatility};

/// Slopes with a smaller magnitude are stable.
pub const STABLE_SLOPE: f64 = 0.01;

/// Number of trailing points used for the short-term trend.
pub const SHORT_TERM_WINDOW: usize = 3;

/// Coefficient of variation (percent) below which volatility is low.
pub const LOW_VOLATILITY_PERCENT: f64 = 5.0;

/// Coefficient of variation (percent) below which volatility is medium.
pub const MEDIUM_VOLATILITY_PERCENT: f64 = 15.0;

const ZERO_MEAN_EPSILON: f64 = 1e-12;

/// Ordinary least-squares slope of `values` against their index.
///
/// `None` for fewer than two points.
pub fn linear_regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });
    Some(num / den)
}

/// Classifies a slope against the optimization target.
pub fn classify_slope(slope: f64, target: OptimizationTarget) -> TrendDirection {
    if slope.abs() < STABLE_SLOPE {
        return TrendDirection::Stable;
    }
    let rising = slope > 0.0;
    match (target, rising) {
        (OptimizationTarget::Maximize, true) | (OptimizationTarget::Minimize, false) => {
            TrendDirection::Improving
        }
        _ => TrendDirection::Declining,
    }
}

/// Population standard deviation over |mean|, in percent.
///
/// `None` for fewer than two points or a zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let (mean, stddev) = mean_and_stddev(values)?;
    if mean.abs() < ZERO_MEAN_EPSILON {
        return None;
    }
    Some(stddev / mean.abs() * 100.0)
}

/// Dispersion class of `values`.
///
/// Fewer than two points is low. A zero mean is low when the values are
/// all equal and high otherwise.
pub fn classify_volatility(values: &[f64]) -> Volatility {
    let Some((mean, stddev)) = mean_and_stddev(values) else {
        return Volatility::Low;
    };
    if mean.abs() < ZERO_MEAN_EPSILON {
        return if stddev < ZERO_MEAN_EPSILON {
            Volatility::Low
        } else {
            Volatility::High
        };
    }

    let cv = stddev / mean.abs() * 100.0;
    if cv < LOW_VOLATILITY_PERCENT {
        Volatility::Low
    } else if cv < MEDIUM_VOLATILITY_PERCENT {
        Volatility::Medium
    } else {
        Volatility::High
    }
}

/// Short-term trend, long-term trend and volatility of `history`.
///
/// `history` runs oldest to newest. `None` for fewer than two points.
pub fn calculate_trend(history: &[f64], target: OptimizationTarget) -> Option<Trend> {
    let slope = linear_regression_slope(history)?;
    let recent = &history[history.len().saturating_sub(SHORT_TERM_WINDOW)..];
    let short_slope = linear_regression_slope(recent).unwrap_or(slope);

    Some(Trend {
        short_term: classify_slope(short_slope, target),
        long_term: classify_slope(slope, target),
        volatility: classify_volatility(history),
        slope,
    })
}

fn mean_and_stddev(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use OptimizationTarget::{Maximize, Minimize};
    use proptest::prelude::*;

    // ------------------------------------------------------------------------
    // Regression tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_slope_of_line() {
        assert_eq!(linear_regression_slope(&[1.0, 3.0, 5.0, 7.0]), Some(2.0));
        assert_eq!(linear_regression_slope(&[4.0, 4.0]), Some(0.0));
        assert_eq!(linear_regression_slope(&[4.0]), None);
        assert_eq!(linear_regression_slope(&[]), None);
    }

    #[test]
    fn test_classify_slope() {
        assert_eq!(classify_slope(0.005, Maximize), TrendDirection::Stable);
        assert_eq!(classify_slope(-0.009, Minimize), TrendDirection::Stable);
        assert_eq!(classify_slope(1.0, Maximize), TrendDirection::Improving);
        assert_eq!(classify_slope(1.0, Minimize), TrendDirection::Declining);
        assert_eq!(classify_slope(-1.0, Minimize), TrendDirection::Improving);
        assert_eq!(classify_slope(-1.0, Maximize), TrendDirection::Declining);
    }

    #[test]
    fn test_decreasing_minimize_history_improves() {
        let trend = calculate_trend(&[120.0, 110.0, 100.0, 90.0], Minimize).unwrap();
        assert_eq!(trend.long_term, TrendDirection::Improving);
        assert_eq!(trend.short_term, TrendDirection::Improving);
        assert_eq!(trend.slope, -10.0);
    }

    #[test]
    fn test_short_term_uses_last_three() {
        // long run rises, last three fall
        let trend = calculate_trend(&[1.0, 2.0, 3.0, 10.0, 20.0, 19.0, 18.0], Maximize).unwrap();
        assert_eq!(trend.long_term, TrendDirection::Improving);
        assert_eq!(trend.short_term, TrendDirection::Declining);
    }

    #[test]
    fn test_trend_needs_two_points() {
        assert!(calculate_trend(&[5.0], Minimize).is_none());
        assert!(calculate_trend(&[5.0, 6.0], Minimize).is_some());
    }

    // ------------------------------------------------------------------------
    // Volatility tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_volatility_classes() {
        assert_eq!(classify_volatility(&[100.0, 101.0, 99.0]), Volatility::Low);
        assert_eq!(classify_volatility(&[100.0, 110.0, 90.0]), Volatility::Medium);
        assert_eq!(classify_volatility(&[100.0, 150.0, 50.0]), Volatility::High);
        assert_eq!(classify_volatility(&[42.0]), Volatility::Low);
    }

    #[test]
    fn test_volatility_zero_mean() {
        assert_eq!(classify_volatility(&[0.0, 0.0, 0.0]), Volatility::Low);
        assert_eq!(classify_volatility(&[-1.0, 1.0]), Volatility::High);
        assert!(coefficient_of_variation(&[-1.0, 1.0]).is_none());
    }

    #[test]
    fn test_coefficient_of_variation() {
        // mean 10, population stddev 1
        let cv = coefficient_of_variation(&[9.0, 11.0]).unwrap();
        assert!((cv - 10.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_strictly_decreasing_minimize_improves(
            start in 10.0f64..1e6,
            steps in prop::collection::vec(0.05f64..100.0, 1..20),
        ) {
            let mut history = vec![start];
            for step in steps {
                let last = *history.last().unwrap();
                history.push(last - step);
            }
            let trend = calculate_trend(&history, Minimize).unwrap();
            prop_assert_eq!(trend.long_term, TrendDirection::Improving);
        }

        #[test]
        fn prop_constant_history_is_stable_and_calm(value in -1e6f64..1e6, n in 2usize..20) {
            let history = vec![value; n];
            let trend = calculate_trend(&history, Maximize).unwrap();
            prop_assert_eq!(trend.long_term, TrendDirection::Stable);
            prop_assert_eq!(trend.volatility, Volatility::Low);
        }
    }
}
