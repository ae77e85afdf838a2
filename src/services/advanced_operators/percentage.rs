//! Percentage operator (§4.8): `numerator`/`denominator` aggregate values
//! in, `(num/den)*100` out. Time-bounded percentages require both aggregates
//! to share the same time filter - that invariant is enforced up in the
//! plan validator (§4.5), not here; this function only does the division.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentageOutcome {
    pub numerator: f64,
    pub denominator: f64,
    pub percentage: Option<f64>,
}

pub fn percentage_of(numerator: f64, denominator: f64) -> PercentageOutcome {
    let percentage = if denominator != 0.0 { Some(numerator / denominator * 100.0) } else { None };
    PercentageOutcome { numerator, denominator, percentage }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_simple_percentage() {
        let outcome = percentage_of(25.0, 200.0);
        assert_eq!(outcome.percentage, Some(12.5));
    }

    #[test]
    fn zero_denominator_yields_no_percentage() {
        let outcome = percentage_of(25.0, 0.0);
        assert_eq!(outcome.percentage, None);
    }
}
