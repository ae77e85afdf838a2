//! Trend operator (§4.8): classifies a chronologically-ordered `(date,
//! value)` series by fitting a simple linear regression over `x = 0..n-1`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Stable,
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendOutcome {
    pub direction: TrendDirection,
    pub slope: f64,
    pub normalized_slope: f64,
    pub confidence: TrendConfidence,
    pub start: f64,
    pub end: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub total_change: f64,
    pub percentage_change: Option<f64>,
    pub is_constant: bool,
}

/// Requires at least two points; callers without enough data should surface
/// `QueryError::UnsupportedQuery` rather than call this (§8's "trend with
/// <2 points returns the error branch" boundary behavior).
pub fn analyze_trend(values: &[f64]) -> Option<TrendOutcome> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let avg = values.iter().sum::<f64>() / n;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let start = values[0];
    let end = values[values.len() - 1];
    let total_change = end - start;
    let percentage_change = if start != 0.0 { Some(total_change / start * 100.0) } else { None };

    if values.iter().all(|v| *v == start) {
        return Some(TrendOutcome {
            direction: TrendDirection::Stable,
            slope: 0.0,
            normalized_slope: 0.0,
            confidence: TrendConfidence::High,
            start,
            end,
            min,
            max,
            avg,
            total_change,
            percentage_change,
            is_constant: true,
        });
    }

    let x_bar = (n - 1.0) / 2.0;
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, value) in values.iter().enumerate() {
        let x = i as f64;
        numerator += (x - x_bar) * (value - avg);
        denominator += (x - x_bar).powi(2);
    }
    let slope = if denominator != 0.0 { numerator / denominator } else { 0.0 };
    let normalized_slope = if avg != 0.0 { slope / avg * 100.0 } else { 0.0 };

    let direction = if normalized_slope.abs() < 1.0 {
        TrendDirection::Stable
    } else if normalized_slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    let confidence = match direction {
        TrendDirection::Stable => {
            if normalized_slope.abs() < 0.5 {
                TrendConfidence::High
            } else {
                TrendConfidence::Medium
            }
        },
        _ => {
            let magnitude = normalized_slope.abs();
            if magnitude > 5.0 {
                TrendConfidence::High
            } else if magnitude > 2.0 {
                TrendConfidence::Medium
            } else {
                TrendConfidence::Low
            }
        },
    };

    Some(TrendOutcome {
        direction,
        slope,
        normalized_slope,
        confidence,
        start,
        end,
        min,
        max,
        avg,
        total_change,
        percentage_change,
        is_constant: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_values_are_stable_with_high_confidence() {
        let outcome = analyze_trend(&[100.0, 100.0, 100.0]).unwrap();
        assert_eq!(outcome.direction, TrendDirection::Stable);
        assert_eq!(outcome.normalized_slope, 0.0);
        assert_eq!(outcome.confidence, TrendConfidence::High);
        assert!(outcome.is_constant);
    }

    #[test]
    fn mild_fluctuation_classifies_as_stable() {
        let outcome = analyze_trend(&[100.0, 102.0, 101.0, 103.0, 102.0]).unwrap();
        assert_eq!(outcome.direction, TrendDirection::Stable);
        assert!(matches!(outcome.confidence, TrendConfidence::High | TrendConfidence::Medium));
    }

    #[test]
    fn clear_upward_series_is_increasing_with_high_confidence() {
        let outcome = analyze_trend(&[100.0, 120.0, 140.0, 160.0, 180.0]).unwrap();
        assert_eq!(outcome.direction, TrendDirection::Increasing);
        assert_eq!(outcome.confidence, TrendConfidence::High);
    }

    #[test]
    fn fewer_than_two_points_returns_none() {
        assert!(analyze_trend(&[42.0]).is_none());
        assert!(analyze_trend(&[]).is_none());
    }
}
