//! Projection operator (§4.8), grounded in
//! `analytics_engine/projection_calculator.py`. A follow-up query that
//! extrapolates from a previous trend/comparison turn's series.

use super::trend::TrendConfidence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMethod {
    LinearRegression,
    MovingAverage,
    ExponentialSmoothing,
    Momentum,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

fn score_to_level(score: f64) -> ConfidenceLevel {
    if score >= 0.75 {
        ConfidenceLevel::High
    } else if score >= 0.55 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Everything the projection calculator needs from a previous trend turn.
#[derive(Debug, Clone)]
pub struct TrendContext {
    pub direction: String,
    pub slope: f64,
    pub normalized_slope: f64,
    pub start_value: f64,
    pub end_value: f64,
    pub percentage_change: f64,
    pub data_points: usize,
    pub min_value: f64,
    pub max_value: f64,
    pub avg_value: f64,
    pub confidence: TrendConfidence,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionOutcome {
    pub projected_value: f64,
    pub confidence_level: ConfidenceLevel,
    pub confidence_score: f64,
    pub method_used: ProjectionMethod,
    pub periods_ahead: u32,
    pub base_value: f64,
    pub expected_change: f64,
    pub expected_change_percent: f64,
    pub range_low: f64,
    pub range_high: f64,
    pub periods_to_goal: Option<u32>,
    pub goal_reachable: Option<bool>,
}

fn coefficient_of_variation(values: &[f64], avg: f64) -> Option<f64> {
    if values.len() < 3 || avg == 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt() / avg)
}

fn select_method(context: &TrendContext) -> ProjectionMethod {
    let n = context.data_points;
    if n < 3 {
        return ProjectionMethod::Momentum;
    }

    if context.values.len() >= 3 {
        let cv = coefficient_of_variation(&context.values, context.avg_value).unwrap_or(0.0);
        if cv < 0.15 {
            return ProjectionMethod::LinearRegression;
        }
        if cv < 0.30 {
            return ProjectionMethod::MovingAverage;
        }
        if n >= 5 {
            return ProjectionMethod::ExponentialSmoothing;
        }
    }

    if n >= 4 {
        ProjectionMethod::Hybrid
    } else {
        ProjectionMethod::LinearRegression
    }
}

/// Authoritative confidence formula (§4.8/§9) - mirrors
/// `analytics_engine/projection_calculator.py::_calculate_confidence`
/// exactly, not the separate ad-hoc scoring inline in `hybrid_projection`.
fn calculate_confidence(context: &TrendContext, method: ProjectionMethod, periods_ahead: u32) -> f64 {
    let mut score = 0.5;

    score += if context.data_points >= 8 {
        0.15
    } else if context.data_points >= 6 {
        0.12
    } else if context.data_points >= 4 {
        0.08
    } else if context.data_points >= 3 {
        0.05
    } else {
        0.0
    };

    score += match context.confidence {
        TrendConfidence::High => 0.15,
        TrendConfidence::Medium => 0.08,
        TrendConfidence::Low => 0.02,
    };

    score += match periods_ahead {
        1 => 0.10,
        2 => 0.05,
        3 => 0.02,
        _ => -0.05,
    };
    if periods_ahead >= 6 {
        score -= 0.10;
    }

    let abs_slope = context.normalized_slope.abs();
    score += if abs_slope > 10.0 {
        0.10
    } else if abs_slope > 5.0 {
        0.07
    } else if abs_slope > 2.0 {
        0.04
    } else {
        0.0
    };

    if context.values.len() >= 3 {
        let cv = coefficient_of_variation(&context.values, context.avg_value).unwrap_or(1.0);
        if cv < 0.1 {
            score += 0.10;
        } else if cv < 0.2 {
            score += 0.05;
        } else if cv > 0.5 {
            score -= 0.10;
        }
    }

    score += match method {
        ProjectionMethod::ExponentialSmoothing => 0.03,
        ProjectionMethod::Hybrid => 0.05,
        ProjectionMethod::Momentum => -0.05,
        _ => 0.0,
    };

    score.clamp(0.25, 0.95)
}

fn linear_regression_projection(context: &TrendContext, periods_ahead: u32) -> ProjectionOutcome {
    let projected_value = (context.end_value + context.slope * periods_ahead as f64).max(0.0);
    let expected_change = projected_value - context.end_value;
    let confidence_score = calculate_confidence(context, ProjectionMethod::LinearRegression, periods_ahead);

    let margin = if context.values.len() >= 2 {
        stdev(&context.values) * 1.5 * (periods_ahead as f64).sqrt()
    } else {
        (expected_change * 0.5).abs()
    };

    build_outcome(
        context,
        projected_value,
        expected_change,
        confidence_score,
        ProjectionMethod::LinearRegression,
        periods_ahead,
        margin,
    )
}

fn moving_average_projection(context: &TrendContext, periods_ahead: u32) -> ProjectionOutcome {
    if context.values.len() < 3 {
        return linear_regression_projection(context, periods_ahead);
    }
    let window = 3.min(context.values.len());
    let recent_avg = context.values[context.values.len() - window..].iter().sum::<f64>() / window as f64;
    let changes: Vec<f64> = context.values.windows(2).map(|w| w[1] - w[0]).collect();
    let avg_change = if changes.is_empty() { 0.0 } else { changes.iter().sum::<f64>() / changes.len() as f64 };

    let projected_value = (recent_avg + avg_change * periods_ahead as f64).max(0.0);
    let expected_change = projected_value - context.end_value;
    let confidence_score = calculate_confidence(context, ProjectionMethod::MovingAverage, periods_ahead);

    let margin = if changes.len() >= 2 {
        stdev(&changes) * 2.0 * (periods_ahead as f64).sqrt()
    } else {
        (expected_change * 0.6).abs()
    };

    build_outcome(context, projected_value, expected_change, confidence_score, ProjectionMethod::MovingAverage, periods_ahead, margin)
}

fn exponential_smoothing_projection(context: &TrendContext, periods_ahead: u32) -> ProjectionOutcome {
    if context.values.len() < 4 {
        return linear_regression_projection(context, periods_ahead);
    }
    const ALPHA: f64 = 0.3;
    const BETA: f64 = 0.1;
    let values = &context.values;

    let mut level = values[0];
    let mut trend = if values.len() > 1 { values[1] - values[0] } else { 0.0 };
    for value in values.iter().skip(1) {
        let prev_level = level;
        level = ALPHA * value + (1.0 - ALPHA) * (level + trend);
        trend = BETA * (level - prev_level) + (1.0 - BETA) * trend;
    }

    let projected_value = (level + trend * periods_ahead as f64).max(0.0);
    let expected_change = projected_value - context.end_value;
    let confidence_score = calculate_confidence(context, ProjectionMethod::ExponentialSmoothing, periods_ahead);

    let mut fit_level = values[0];
    let mut fit_trend = if values.len() > 1 { values[1] - values[0] } else { 0.0 };
    let mut fitted = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        fitted.push(fit_level + fit_trend);
        if i < values.len() - 1 {
            let prev_level = fit_level;
            fit_level = ALPHA * value + (1.0 - ALPHA) * (fit_level + fit_trend);
            fit_trend = BETA * (fit_level - prev_level) + (1.0 - BETA) * fit_trend;
        }
    }
    let residuals: Vec<f64> = values.iter().zip(fitted.iter()).map(|(v, f)| (v - f).abs()).collect();
    let margin = if !residuals.is_empty() {
        residuals.iter().sum::<f64>() / residuals.len() as f64 * 2.0 * (periods_ahead as f64).sqrt()
    } else {
        (expected_change * 0.5).abs()
    };

    build_outcome(context, projected_value, expected_change, confidence_score, ProjectionMethod::ExponentialSmoothing, periods_ahead, margin)
}

fn momentum_projection(context: &TrendContext, periods_ahead: u32) -> ProjectionOutcome {
    let expected_change = if context.percentage_change != 0.0 && context.data_points > 1 {
        let per_period_change_pct = context.percentage_change / (context.data_points - 1) as f64;
        context.end_value * (per_period_change_pct * periods_ahead as f64 / 100.0)
    } else {
        context.slope * periods_ahead as f64
    };

    let projected_value = (context.end_value + expected_change).max(0.0);
    let confidence_score = calculate_confidence(context, ProjectionMethod::Momentum, periods_ahead).min(0.6);
    let margin = (expected_change * 0.7).abs();

    build_outcome(context, projected_value, expected_change, confidence_score, ProjectionMethod::Momentum, periods_ahead, margin)
}

fn hybrid_projection(context: &TrendContext, periods_ahead: u32) -> ProjectionOutcome {
    let mut projections = Vec::new();
    let mut weights = Vec::new();

    if context.data_points >= 3 {
        let lr = linear_regression_projection(context, periods_ahead);
        weights.push(lr.confidence_score);
        projections.push(lr.projected_value);
    }
    if context.values.len() >= 3 {
        let ma = moving_average_projection(context, periods_ahead);
        weights.push(ma.confidence_score * 0.9);
        projections.push(ma.projected_value);
    }
    if context.values.len() >= 5 {
        let es = exponential_smoothing_projection(context, periods_ahead);
        weights.push(es.confidence_score * 0.95);
        projections.push(es.projected_value);
    }

    if projections.is_empty() {
        return momentum_projection(context, periods_ahead);
    }

    let total_weight: f64 = weights.iter().sum();
    let projected_value =
        (projections.iter().zip(weights.iter()).map(|(p, w)| p * w).sum::<f64>() / total_weight).max(0.0);
    let confidence_score = weights.iter().sum::<f64>() / weights.len() as f64;
    let expected_change = projected_value - context.end_value;
    let margin = (expected_change * 0.4).abs();

    build_outcome(context, projected_value, expected_change, confidence_score, ProjectionMethod::Hybrid, periods_ahead, margin)
}

fn build_outcome(
    context: &TrendContext,
    projected_value: f64,
    expected_change: f64,
    confidence_score: f64,
    method: ProjectionMethod,
    periods_ahead: u32,
    margin: f64,
) -> ProjectionOutcome {
    let confidence_score = confidence_score.clamp(0.25, 0.95);
    ProjectionOutcome {
        projected_value,
        confidence_level: score_to_level(confidence_score),
        confidence_score,
        method_used: method,
        periods_ahead,
        base_value: context.end_value,
        expected_change,
        expected_change_percent: if context.end_value != 0.0 { expected_change / context.end_value * 100.0 } else { 0.0 },
        range_low: (projected_value - margin).max(0.0),
        range_high: projected_value + margin,
        periods_to_goal: None,
        goal_reachable: None,
    }
}

fn stdev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

pub fn project(context: &TrendContext, periods_ahead: u32, target_value: Option<f64>) -> ProjectionOutcome {
    let method = select_method(context);
    let mut outcome = match method {
        ProjectionMethod::LinearRegression => linear_regression_projection(context, periods_ahead),
        ProjectionMethod::MovingAverage => moving_average_projection(context, periods_ahead),
        ProjectionMethod::ExponentialSmoothing => exponential_smoothing_projection(context, periods_ahead),
        ProjectionMethod::Momentum => momentum_projection(context, periods_ahead),
        ProjectionMethod::Hybrid => hybrid_projection(context, periods_ahead),
    };

    if let Some(target) = target_value {
        add_goal_analysis(&mut outcome, context, target);
    }
    outcome
}

/// §4.8 goal analysis: only reachable if the series is moving toward the
/// target and would arrive within 24 periods.
fn add_goal_analysis(outcome: &mut ProjectionOutcome, context: &TrendContext, target_value: f64) {
    if context.slope == 0.0 {
        outcome.periods_to_goal = None;
        outcome.goal_reachable = Some(false);
        return;
    }

    let value_diff = target_value - context.end_value;
    let moving_toward_goal = (context.slope > 0.0 && value_diff > 0.0) || (context.slope < 0.0 && value_diff < 0.0);

    if moving_toward_goal {
        let periods_needed = (value_diff / context.slope).abs();
        outcome.periods_to_goal = Some(periods_needed.round().max(1.0) as u32);
        outcome.goal_reachable = Some(periods_needed > 0.0 && periods_needed < 24.0);
    } else {
        outcome.periods_to_goal = None;
        outcome.goal_reachable = Some(false);
    }
}

/// Parses Indian magnitude phrases like "10 lakhs" / "2 crores" into a
/// numeric target value (§4.8's goal-based projection parsing).
pub fn parse_indian_magnitude(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let re = regex::Regex::new(r"(\d+(?:\.\d+)?)\s*(lakh|lakhs|crore|crores)").ok()?;
    let caps = re.captures(&lower)?;
    let number: f64 = caps[1].parse().ok()?;
    let multiplier = if caps[2].starts_with("lakh") { 1e5 } else { 1e7 };
    Some(number * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::advanced_operators::trend::TrendConfidence;

    fn consistent_context() -> TrendContext {
        TrendContext {
            direction: "increasing".to_string(),
            slope: 10.0,
            normalized_slope: 9.8,
            start_value: 80.0,
            end_value: 120.0,
            percentage_change: 50.0,
            data_points: 5,
            min_value: 80.0,
            max_value: 120.0,
            avg_value: 102.0,
            confidence: TrendConfidence::High,
            values: vec![80.0, 90.0, 100.0, 110.0, 120.0],
        }
    }

    #[test]
    fn consistent_series_selects_linear_regression_with_high_confidence() {
        let context = consistent_context();
        let outcome = project(&context, 1, None);
        assert_eq!(outcome.method_used, ProjectionMethod::LinearRegression);
        assert_eq!(outcome.periods_ahead, 1);
        assert_eq!(outcome.projected_value, context.end_value + context.slope);
        assert_eq!(outcome.confidence_level, ConfidenceLevel::High);
    }

    #[test]
    fn projection_never_goes_negative() {
        let mut context = consistent_context();
        context.slope = -1000.0;
        context.end_value = 10.0;
        let outcome = project(&context, 3, None);
        assert!(outcome.projected_value >= 0.0);
        assert!(outcome.range_low >= 0.0);
    }

    #[test]
    fn sparse_data_falls_back_to_momentum() {
        let mut context = consistent_context();
        context.data_points = 2;
        context.values = vec![100.0, 110.0];
        let outcome = project(&context, 1, None);
        assert_eq!(outcome.method_used, ProjectionMethod::Momentum);
        assert!(outcome.confidence_score <= 0.6);
    }

    #[test]
    fn goal_based_projection_reports_periods_to_goal_when_moving_toward_it() {
        let context = consistent_context();
        let outcome = project(&context, 1, Some(150.0));
        assert_eq!(outcome.goal_reachable, Some(true));
        assert!(outcome.periods_to_goal.is_some());
    }

    #[test]
    fn goal_in_opposite_direction_of_slope_is_unreachable() {
        let context = consistent_context();
        let outcome = project(&context, 1, Some(50.0));
        assert_eq!(outcome.goal_reachable, Some(false));
        assert_eq!(outcome.periods_to_goal, None);
    }

    #[test]
    fn parses_lakh_and_crore_magnitudes() {
        assert_eq!(parse_indian_magnitude("target is 10 lakhs"), Some(1_000_000.0));
        assert_eq!(parse_indian_magnitude("reach 2 crores by March"), Some(20_000_000.0));
    }
}
