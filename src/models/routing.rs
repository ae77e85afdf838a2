//! Output of the table router (§4.3).

use super::entities::ExtractedEntities;

#[derive(Debug, Clone)]
pub struct RoutingResult {
    pub table: Option<String>,
    pub entities: ExtractedEntities,
    pub confidence: f64,
    /// Descending by score; each entry is (table_name, score).
    pub alternatives: Vec<(String, i64)>,
}

impl RoutingResult {
    pub fn empty(entities: ExtractedEntities) -> Self {
        Self { table: None, entities, confidence: 0.0, alternatives: Vec::new() }
    }

    /// §8: `is_confident ⇒ confidence >= 0.6`.
    pub fn is_confident(&self) -> bool {
        self.confidence >= 0.6
    }

    /// §4.3: genuine ambiguity only - best score in [30, 200), gap ratio < 10%
    /// (or < 15% when both candidates score >= 35).
    pub fn needs_clarification(&self) -> bool {
        if self.alternatives.len() < 2 {
            return false;
        }
        let (_, best_score) = &self.alternatives[0];
        let (_, second_score) = &self.alternatives[1];
        let best_score = *best_score;
        let second_score = *second_score;

        if best_score <= 0 {
            return false;
        }
        if best_score >= 200 {
            return false;
        }
        if best_score < 30 || second_score < 25 {
            return false;
        }

        let gap_ratio = (best_score - second_score) as f64 / best_score as f64;
        if gap_ratio < 0.10 {
            return true;
        }
        if gap_ratio < 0.15 && best_score >= 40 && second_score >= 35 {
            return true;
        }
        false
    }

    /// §8: `should_fallback ⇔ confidence < 0.3 OR table is none`.
    pub fn should_fallback(&self) -> bool {
        self.confidence < 0.3 || self.table.is_none()
    }

    /// Candidates scoring at least 40% of the best, capped at 5.
    pub fn clarification_options(&self) -> Vec<String> {
        if !self.needs_clarification() {
            return Vec::new();
        }
        let best_score = self.alternatives.first().map(|(_, s)| *s).unwrap_or(0);
        let threshold = (best_score as f64 * 0.4) as i64;
        self.alternatives
            .iter()
            .filter(|(_, score)| *score >= threshold)
            .map(|(table, _)| table.clone())
            .take(5)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities() -> ExtractedEntities {
        ExtractedEntities::default()
    }

    #[test]
    fn confidence_bounds_hold() {
        let r = RoutingResult { table: Some("T".into()), entities: entities(), confidence: 0.9, alternatives: vec![("T".into(), 90)] };
        assert!(r.is_confident());
        assert!(!r.should_fallback());
    }

    #[test]
    fn needs_clarification_requires_two_close_candidates() {
        let r = RoutingResult {
            table: Some("A".into()),
            entities: entities(),
            confidence: 0.5,
            alternatives: vec![("A".into(), 55), ("B".into(), 52)],
        };
        assert!(r.needs_clarification());
        assert!(r.alternatives.len() >= 2);
    }

    #[test]
    fn should_fallback_when_no_table() {
        let r = RoutingResult::empty(entities());
        assert!(r.should_fallback());
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn explicit_reference_never_needs_clarification() {
        let r = RoutingResult {
            table: Some("A".into()),
            entities: entities(),
            confidence: 1.0,
            alternatives: vec![("A".into(), 300), ("B".into(), 290)],
        };
        assert!(!r.needs_clarification());
    }
}
