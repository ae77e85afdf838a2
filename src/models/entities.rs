//! Output of the entity extractor (§4.2): a struct of optional values pulled
//! deterministically out of free text. Never holds anything learned from an
//! external call - everything here comes from regex/lexicon matching.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateSpecific {
    pub day: Option<u32>,
    pub month: Option<String>,
    pub year: Option<i32>,
    /// Raw phrase that produced this, kept for explanation surfaces.
    pub raw: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub month: Option<String>,
    pub all_months: Vec<String>,
    pub metric: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub aggregation: String,
    pub comparison: bool,
    pub multi_month_comparison: bool,
    pub cross_table_intent: bool,
    pub dimension_keywords: Vec<String>,
    pub time_period: Option<String>,
    pub explicit_table: Option<String>,
    pub date_specific: Option<DateSpecific>,
    /// Learned dimension name -> matched value (e.g. "branch" -> "Velachery").
    pub custom_entities: HashMap<String, String>,
    pub trend_intent: bool,
    pub summary_intent: bool,
    pub impact_intent: bool,
    pub multi_domain_query: bool,
    pub raw_question: String,
}

impl Default for ExtractedEntities {
    fn default() -> Self {
        Self {
            month: None,
            all_months: Vec::new(),
            metric: None,
            category: None,
            location: None,
            aggregation: "SUM".to_string(),
            comparison: false,
            multi_month_comparison: false,
            cross_table_intent: false,
            dimension_keywords: Vec::new(),
            time_period: None,
            explicit_table: None,
            date_specific: None,
            custom_entities: HashMap::new(),
            trend_intent: false,
            summary_intent: false,
            impact_intent: false,
            multi_domain_query: false,
            raw_question: String::new(),
        }
    }
}

impl ExtractedEntities {
    /// §4.2: `multi_month_comparison := |all_months| >= 2 OR (|all_months|=1 AND comparison)`.
    pub fn recompute_multi_month_comparison(&mut self) {
        self.multi_month_comparison =
            self.all_months.len() >= 2 || (self.all_months.len() == 1 && self.comparison);
    }

    /// §4.9 entity merge: new value wins if set, else inherit prior. Applies to
    /// `{month, metric, category, location, aggregation, date_specific}` only;
    /// `{comparison, time_period, explicit_table, raw_question}` never inherit.
    pub fn merge_with_previous(mut self, previous: &ExtractedEntities) -> Self {
        if self.month.is_none() {
            self.month = previous.month.clone();
        }
        if self.metric.is_none() {
            self.metric = previous.metric.clone();
        }
        if self.category.is_none() {
            self.category = previous.category.clone();
        }
        if self.location.is_none() {
            self.location = previous.location.clone();
        }
        // `aggregation` defaults to "SUM" when nothing explicit was found, so an
        // unset new value is indistinguishable from an explicit "SUM" - inherit
        // the previous value only when the new extraction fell back to default
        // and the previous turn had picked something else.
        if self.aggregation == "SUM" && previous.aggregation != "SUM" {
            self.aggregation = previous.aggregation.clone();
        }
        if self.date_specific.is_none() {
            self.date_specific = previous.date_specific.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_month_comparison_two_months() {
        let mut e = ExtractedEntities { all_months: vec!["august".into(), "december".into()], ..Default::default() };
        e.recompute_multi_month_comparison();
        assert!(e.multi_month_comparison);
    }

    #[test]
    fn multi_month_comparison_single_month_needs_comparison_flag() {
        let mut e = ExtractedEntities { all_months: vec!["august".into()], comparison: false, ..Default::default() };
        e.recompute_multi_month_comparison();
        assert!(!e.multi_month_comparison);

        e.comparison = true;
        e.recompute_multi_month_comparison();
        assert!(e.multi_month_comparison);
    }

    #[test]
    fn merge_inherits_unset_fields_only() {
        let prev = ExtractedEntities { month: Some("august".into()), location: Some("Chennai".into()), ..Default::default() };
        let new = ExtractedEntities { month: None, location: Some("Madurai".into()), ..Default::default() };
        let merged = new.merge_with_previous(&prev);
        assert_eq!(merged.month, Some("august".into()));
        assert_eq!(merged.location, Some("Madurai".into()));
    }
}
