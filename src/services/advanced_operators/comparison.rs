//! Comparison operator (§4.8): two already-executed aggregate values in,
//! a signed delta and classification out.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonDirection {
    Increased,
    Decreased,
    Unchanged,
}

impl ComparisonDirection {
    pub fn glyph(&self) -> &'static str {
        match self {
            ComparisonDirection::Increased => "▲",
            ComparisonDirection::Decreased => "▼",
            ComparisonDirection::Unchanged => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonOutcome {
    pub value_a: f64,
    pub value_b: f64,
    pub difference: f64,
    pub percentage_change: Option<f64>,
    pub ratio: Option<f64>,
    pub direction: ComparisonDirection,
}

pub fn compare(value_a: f64, value_b: f64) -> ComparisonOutcome {
    let difference = value_b - value_a;
    let percentage_change = if value_a != 0.0 { Some(difference / value_a * 100.0) } else { None };
    let ratio = if value_a != 0.0 { Some(value_b / value_a) } else { None };
    let direction = if difference > 0.0 {
        ComparisonDirection::Increased
    } else if difference < 0.0 {
        ComparisonDirection::Decreased
    } else {
        ComparisonDirection::Unchanged
    };

    ComparisonOutcome { value_a, value_b, difference, percentage_change, ratio, direction }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increase_computes_positive_percentage_change() {
        let outcome = compare(100.0, 125.0);
        assert_eq!(outcome.difference, 25.0);
        assert_eq!(outcome.percentage_change, Some(25.0));
        assert_eq!(outcome.direction, ComparisonDirection::Increased);
    }

    #[test]
    fn zero_base_has_no_percentage_change_or_ratio() {
        let outcome = compare(0.0, 50.0);
        assert_eq!(outcome.percentage_change, None);
        assert_eq!(outcome.ratio, None);
        assert_eq!(outcome.direction, ComparisonDirection::Increased);
    }

    #[test]
    fn equal_values_are_unchanged() {
        let outcome = compare(40.0, 40.0);
        assert_eq!(outcome.direction, ComparisonDirection::Unchanged);
        assert_eq!(outcome.difference, 0.0);
    }
}
