//! C3: table routing (§4.3), grounded in
//! `schema_intelligence/profile_store.py::find_best_table_for_query` and
//! `planning_layer/table_router.py::TableRouter._calculate_confidence`.
//!
//! Three-stage cascade: an explicit table reference wins outright, then an
//! LLM semantic pick is trusted if its own confidence clears a bar, and
//! otherwise a weighted rule-based scorer runs over every profiled table.

use crate::error::QueryError;
use crate::models::{ExtractedEntities, RoutingResult};
use crate::services::llm::RouterLlm;
use crate::services::profile_store::ProfileStore;
use std::collections::HashSet;
use std::sync::Arc;

const STOP_WORDS: &[&str] = &[
    "what", "where", "when", "which", "how", "tell", "show", "give", "find", "the", "and", "for", "from", "with",
    "about", "this", "that", "have", "does",
];

const IMPORTANT_SHORT_KEYWORDS: &[&str] = &[
    "sku", "id", "hr", "upi", "qty", "atm", "pos", "cod", "emi", "tax", "gst", "mrp", "avg", "sum", "min", "max",
    "top", "kpi",
];

const MONTH_NAMES: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september", "october", "november",
    "december",
];

const LOCATION_TABLE_KEYWORDS: &[&str] = &["area", "pincode", "zone", "region", "location", "branch", "zip"];
const LOCATION_DIMENSIONS: &[&str] = &["area", "zone", "region", "pincode", "zip", "city", "location", "branch"];
const HR_SYNONYM_KEYWORDS: &[&str] = &["employee", "staff", "department", "designation", "salary", "payroll"];
const PERSON_COLUMN_HINTS: &[&str] =
    &["first_name", "last_name", "emp_id", "employee_id", "name", "full_name", "employee_name", "staff_name"];

const INDIVIDUAL_QUERY_PATTERNS: &[&str] = &[
    "who is",
    "who are",
    "who has",
    "who was",
    "which employee",
    "which person",
    "which staff",
    "name of the",
    "names of the",
    "highest paid employee",
    "lowest paid employee",
    "highest-paid employee",
    "lowest-paid employee",
    "most experienced",
    "least experienced",
    "oldest employee",
    "newest employee",
    "youngest employee",
];

pub struct TableRouter {
    profile_store: ProfileStore,
    router_llm: Option<Arc<dyn RouterLlm>>,
    use_llm_table_selection: bool,
}

impl TableRouter {
    pub fn new(
        profile_store: ProfileStore,
        router_llm: Option<Arc<dyn RouterLlm>>,
        use_llm_table_selection: bool,
    ) -> Self {
        Self { profile_store, router_llm, use_llm_table_selection }
    }

    pub async fn route(&self, entities: ExtractedEntities) -> RoutingResult {
        if let Some(table) = &entities.explicit_table
            && let Some(resolved) = self.resolve_explicit_table(table)
        {
            return RoutingResult {
                table: Some(resolved.clone()),
                entities,
                confidence: 1.0,
                alternatives: vec![(resolved, 300)],
            };
        }

        if self.use_llm_table_selection
            && let Some(router_llm) = &self.router_llm
            && let Some(result) = self.try_llm_routing(router_llm.as_ref(), &entities).await
        {
            return result;
        }

        self.route_by_rules(entities)
    }

    fn resolve_explicit_table(&self, mentioned: &str) -> Option<String> {
        let lower = mentioned.to_lowercase();
        self.profile_store.names().into_iter().find(|name| {
            let name_lower = name.to_lowercase();
            name_lower == lower || name_lower.contains(&lower) || lower.contains(&name_lower)
        })
    }

    async fn try_llm_routing(
        &self,
        router_llm: &dyn RouterLlm,
        entities: &ExtractedEntities,
    ) -> Option<RoutingResult> {
        let names = self.profile_store.names();
        if names.is_empty() {
            return None;
        }
        let context = self.build_table_context(&names);
        let selection = router_llm.select_table(&entities.raw_question, &context).await.ok()?;

        let resolved_table = self
            .profile_store
            .names()
            .into_iter()
            .find(|n| n.eq_ignore_ascii_case(&selection.selected_table))?;
        if selection.confidence < 0.6 {
            return None;
        }

        let mut alternatives = vec![(resolved_table.clone(), (selection.confidence * 100.0) as i64)];
        if let Some(alt) = &selection.alternative {
            alternatives.push((alt.clone(), ((selection.confidence * 100.0) as i64) - 10));
        }

        Some(RoutingResult {
            table: Some(resolved_table),
            entities: entities.clone(),
            confidence: selection.confidence,
            alternatives,
        })
    }

    fn build_table_context(&self, names: &[String]) -> String {
        names
            .iter()
            .filter_map(|name| self.profile_store.get(name))
            .map(|p| {
                format!(
                    "- {}: {}",
                    p.table_name,
                    p.semantic_summary.clone().unwrap_or_else(|| format!("{:?} table", p.table_type))
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Significant query tokens (>= 4 chars and not a stopword, or a known
    /// short domain token) used for table-name and column-name matching.
    fn extract_query_keywords(raw_question: &str) -> Vec<String> {
        raw_question
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| "?.,!:;".contains(c)).to_lowercase())
            .filter(|w| IMPORTANT_SHORT_KEYWORDS.contains(&w.as_str()) || (w.len() >= 4 && !STOP_WORDS.contains(&w.as_str())))
            .collect()
    }

    /// §4.3 "explicit reference" phrase scoring: a verbatim multi-word match
    /// of the (suffix-stripped) table name in the question is worth +300; a
    /// partial word-overlap of >=60% is worth a proportional +(200*ratio).
    fn table_phrase_score(table_name: &str, raw_question: &str) -> i64 {
        let mut normalized = table_name.to_lowercase().replace('_', " ");
        for suffix in ["table1", "table2", "table3", "sheet1", "sheet2", "sheet3"] {
            normalized = normalized.replace(suffix, "").trim().to_string();
        }
        if normalized.len() < 5 {
            return 0;
        }
        if raw_question.contains(&normalized) {
            return 300;
        }
        let table_words: Vec<&str> = normalized.split_whitespace().filter(|w| w.len() >= 2).collect();
        if table_words.len() < 2 {
            return 0;
        }
        let matched = table_words.iter().filter(|w| raw_question.contains(*w)).count();
        if matched < 2 {
            return 0;
        }
        let ratio = matched as f64 / table_words.len() as f64;
        if ratio >= 0.6 { (200.0 * ratio) as i64 } else { 0 }
    }

    /// The rule-based scorer: every profiled table accumulates a score from
    /// the full signal set in §4.3, then the top two scores decide confidence
    /// and whether clarification is warranted.
    fn route_by_rules(&self, entities: ExtractedEntities) -> RoutingResult {
        let profiles = self.profile_store.get_all();
        if profiles.is_empty() {
            return RoutingResult::empty(entities);
        }

        let raw_question = entities.raw_question.to_lowercase();
        let query_keywords = Self::extract_query_keywords(&raw_question);

        let mut scored: Vec<(String, i64)> = profiles
            .values()
            .map(|profile| (profile.table_name.clone(), Self::score_table(profile, &entities, &raw_question, &query_keywords)))
            .collect();
        scored.retain(|(_, score)| *score > 0);
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        if scored.is_empty() {
            return RoutingResult { table: None, entities, confidence: 0.0, alternatives: scored };
        }

        let mut confidence = Self::score_to_confidence(&scored);
        if entities.cross_table_intent && scored[0].1 >= 40 {
            confidence = (confidence + 0.25).min(1.0);
        }

        let best_table = scored[0].0.clone();
        RoutingResult { table: Some(best_table), entities, confidence, alternatives: scored }
    }

    fn score_table(
        profile: &crate::models::TableProfile,
        entities: &ExtractedEntities,
        raw_question: &str,
        query_keywords: &[String],
    ) -> i64 {
        use crate::models::{ColumnRole, Granularity, TableType};

        let mut score: i64 = Self::table_phrase_score(&profile.table_name, raw_question);
        let table_name_lower = profile.table_name.to_lowercase();

        // Table-name keyword match: one hit is enough.
        if query_keywords.iter().any(|k| table_name_lower.contains(k.as_str())) {
            score += 50;
        }

        // Dimension/identifier/metric column-name matches against query tokens.
        let skip_col_words: HashSet<&str> = ["used", "data", "this", "that", "show", "list", "types"].into_iter().collect();
        'keyword: for keyword in query_keywords {
            if skip_col_words.contains(keyword.as_str()) {
                continue;
            }
            for column in profile.columns.values() {
                let col_name_lower = column.name.to_lowercase().replace('_', " ");
                if col_name_lower.contains(keyword.as_str()) {
                    match column.role {
                        ColumnRole::Dimension => {
                            score += 100;
                            continue 'keyword;
                        },
                        ColumnRole::Identifier | ColumnRole::Metric => {
                            score += 30;
                            continue 'keyword;
                        },
                        _ => {},
                    }
                }
            }
        }

        // Compound metric-column matching ("sale amount" -> Sale_Amount).
        for column in profile.metric_columns() {
            let col_parts: Vec<String> = column.name.to_lowercase().replace('_', " ").split_whitespace().map(String::from).collect();
            let matches = query_keywords.iter().filter(|kw| col_parts.contains(kw)).count();
            if matches >= 2 {
                score += 120;
            } else if matches == 1 && col_parts.len() <= 2 {
                score += 40;
            }
        }

        // Transactional-table preference for "across all transactions" phrasing.
        if raw_question.contains("transaction") || raw_question.contains("across all") {
            match profile.table_type {
                TableType::Transactional => {
                    let has_amount_col = profile
                        .metric_columns()
                        .iter()
                        .any(|c| ["amount", "value", "revenue"].iter().any(|t| c.name.to_lowercase().contains(t)));
                    score += if has_amount_col { 80 } else { 30 };
                },
                TableType::Summary => score -= 40,
                _ => {},
            }
        }

        // Time-granularity keyword matching.
        for keyword in query_keywords {
            let expected = match keyword.as_str() {
                "month" | "months" | "monthly" => Some(Granularity::Monthly),
                "quarter" | "quarters" | "quarterly" => Some(Granularity::Quarterly),
                "year" | "years" | "yearly" | "annual" => Some(Granularity::Yearly),
                "week" | "weeks" | "weekly" => Some(Granularity::Weekly),
                "day" | "days" | "daily" => Some(Granularity::Daily),
                _ => None,
            };
            let Some(expected) = expected else { continue };
            if profile.granularity == expected {
                score += 100;
            }
            if table_name_lower.contains(keyword.as_str()) {
                score += 50;
            }
            if profile.date_columns().iter().any(|c| c.name.to_lowercase().contains(keyword.as_str())) {
                score += 60;
            }
        }

        // Sample-value matching (IDs, names, free-text values).
        let skip_value_words: HashSet<&str> =
            ["the", "and", "for", "what", "which", "how", "does", "belong", "state", "department"].into_iter().collect();
        'value_keyword: for keyword in query_keywords {
            if skip_value_words.contains(keyword.as_str()) {
                continue;
            }
            let keyword_upper = keyword.to_uppercase();
            for column in profile.columns.values() {
                for sample in &column.sample_values {
                    let sample_upper = sample.to_uppercase();
                    if keyword_upper == sample_upper || sample_upper.contains(&keyword_upper) {
                        if keyword.contains('_') || keyword.to_uppercase() == *keyword {
                            score += 150;
                        } else if column.role == ColumnRole::Identifier && keyword.chars().next().is_some_and(|c| c.is_uppercase()) {
                            score += 120;
                        } else {
                            score += 80;
                        }
                        continue 'value_keyword;
                    }
                }
            }
        }

        // HR-domain synonym match.
        for keyword in query_keywords {
            if HR_SYNONYM_KEYWORDS.contains(&keyword.as_str()) && profile.synonym_map.contains_key(keyword.as_str()) {
                score += 60;
            }
        }

        // Cross-table intent: boost aggregate/summary tables, reduced when a
        // specific dimensional breakdown was also requested.
        if entities.cross_table_intent {
            let has_dimension_request = !entities.dimension_keywords.is_empty();
            let aggregate_boost = if has_dimension_request { 15 } else { 40 };
            let summary_boost = if has_dimension_request { 10 } else { 25 };
            if profile.columns.keys().any(|c| {
                let lower = c.to_lowercase();
                ["total", "grand", "sum", "overall", "aggregate"].iter().any(|t| lower.contains(t))
            }) {
                score += aggregate_boost;
            }
            if profile.table_type == TableType::Summary {
                score += summary_boost;
            }
        }

        // Multi-month comparison: penalize single-month-named tables, reward
        // multi-month column coverage and date ranges spanning all requested months.
        if entities.multi_month_comparison && entities.all_months.len() >= 2 {
            let table_has_single_month = MONTH_NAMES.iter().any(|m| table_name_lower.contains(m));
            if table_has_single_month {
                score -= 100;
            }

            let months_in_cols: HashSet<&str> =
                profile.columns.keys().flat_map(|c| MONTH_NAMES.iter().filter(move |m| c.to_lowercase().contains(*m))).copied().collect();
            if months_in_cols.len() >= 2 {
                score += 80;
            }

            if let (Some(min), Some(max)) = (&profile.date_range.min, &profile.date_range.max)
                && min.len() >= 7
                && max.len() >= 7
                && let (Ok(min_month), Ok(max_month)) = (min[5..7].parse::<u32>(), max[5..7].parse::<u32>())
            {
                let requested: Vec<u32> = entities
                    .all_months
                    .iter()
                    .filter_map(|m| MONTH_NAMES.iter().position(|mn| mn.eq_ignore_ascii_case(m)).map(|i| (i + 1) as u32))
                    .collect();
                if let (Some(&lo), Some(&hi)) = (requested.iter().min(), requested.iter().max())
                    && min_month <= lo
                    && max_month >= hi
                    && !profile.date_columns().is_empty()
                {
                    score += 100;
                    if ["daily", "transaction", "sales", "order"].iter().any(|kw| table_name_lower.contains(kw)) {
                        score += 50;
                    }
                }
            }
        }

        // Single-month matching.
        if let Some(month) = &entities.month
            && !entities.multi_month_comparison
        {
            let month_lower = month.to_lowercase();
            if table_name_lower.contains(&month_lower) {
                score += 30;
            } else if profile.date_range.month.as_deref().map(|m| m.eq_ignore_ascii_case(&month_lower)).unwrap_or(false) {
                score += 25;
            }
        }

        // Metric matching: direct column-name match, else synonym-term match.
        if let Some(metric) = &entities.metric {
            let metric_lower = metric.to_lowercase();
            let direct = profile.metric_columns().iter().any(|c| c.name.to_lowercase().contains(&metric_lower));
            if direct {
                score += 20;
            } else if profile.synonym_map.keys().any(|term| term.contains(&metric_lower)) {
                score += 15;
            }
        }

        // Category matching: table name, pivoted column name, then value/column hints.
        if let Some(category) = &entities.category {
            let category_lower = category.to_lowercase();
            if table_name_lower.contains("category") || table_name_lower.contains("by_cat") {
                score += 50;
            }
            if profile.columns.keys().any(|c| c.to_lowercase().contains(&category_lower)) {
                score += 60;
            }
            let mut value_found = false;
            let mut col_name_found = false;
            for column in profile.dimension_columns() {
                if !value_found && column.sample_values.iter().any(|v| v.to_lowercase().contains(&category_lower)) {
                    score += 15;
                    value_found = true;
                } else if !value_found && !col_name_found && column.name.to_lowercase().contains("category") {
                    score += 10;
                    col_name_found = true;
                }
            }
        }

        // Location table-name keyword match (parallel to category above).
        if LOCATION_TABLE_KEYWORDS.iter().any(|kw| table_name_lower.contains(kw)) {
            score += 50;
        }

        // Location value matching within dimension/identifier columns.
        if let Some(location) = &entities.location {
            let location_lower = location.to_lowercase();
            let found = profile
                .columns
                .values()
                .filter(|c| matches!(c.role, ColumnRole::Dimension | ColumnRole::Identifier))
                .any(|c| c.sample_values.iter().any(|v| v.to_lowercase().contains(&location_lower)));
            if found {
                score += 15;
            }
        }

        // Table-type baseline scoring.
        match profile.table_type {
            TableType::Transactional => score += 10,
            TableType::Summary => {
                if !["SUM", "AVG", "MAX", "MIN"].contains(&entities.aggregation.as_str()) {
                    score -= 20;
                }
            },
            TableType::CategoryBreakdown => {
                if entities.category.is_some() {
                    score += 15;
                }
            },
            _ => {},
        }

        if profile.granularity == Granularity::Daily {
            score += 5;
        }

        score += (profile.data_quality_score * 10.0).round() as i64;

        // Dynamic dimension-keyword matching (area, zone, pincode, branch, ...).
        if !entities.dimension_keywords.is_empty() {
            let mut scored_columns: HashSet<&str> = HashSet::new();
            let mut scored_table_keywords: HashSet<&str> = HashSet::new();
            for keyword in &entities.dimension_keywords {
                let keyword_lower = keyword.to_lowercase();
                for column in profile.columns.values() {
                    if column.name.to_lowercase().contains(&keyword_lower) && !scored_columns.contains(column.name.as_str()) {
                        score += 70;
                        scored_columns.insert(&column.name);
                        break;
                    }
                }
                if table_name_lower.contains(&keyword_lower) && !scored_table_keywords.contains(keyword.as_str()) {
                    score += 30;
                    scored_table_keywords.insert(keyword.as_str());
                }
            }

            let asking_about_location = entities.dimension_keywords.iter().any(|kw| LOCATION_DIMENSIONS.contains(&kw.to_lowercase().as_str()));
            if asking_about_location {
                for keyword in &entities.dimension_keywords {
                    let keyword_lower = keyword.to_lowercase();
                    if LOCATION_DIMENSIONS.contains(&keyword_lower.as_str())
                        && profile.columns.keys().any(|c| c.to_lowercase().contains(&keyword_lower))
                    {
                        score += 100;
                    }
                }
                if table_name_lower.contains("category") || profile.table_type == TableType::CategoryBreakdown {
                    score -= 80;
                }
            }
        }

        // "Who is / which employee" individual-row queries.
        if INDIVIDUAL_QUERY_PATTERNS.iter().any(|p| raw_question.contains(p)) {
            let has_person_data = profile.columns.keys().any(|c| {
                let lower = c.to_lowercase();
                PERSON_COLUMN_HINTS.iter().any(|hint| lower.contains(hint))
            });
            if has_person_data {
                score += 150;
            } else {
                score -= 100;
            }
            if profile.table_type == TableType::Summary {
                score -= 80;
            }
        }

        score
    }

    /// §4.3 confidence model, matching `_calculate_confidence` verbatim:
    /// strong absolute score with a healthy gap, a very high score regardless
    /// of gap, or a large absolute gap all short-circuit to high confidence;
    /// otherwise a weighted blend of score magnitude and score-gap ratio.
    fn score_to_confidence(scored: &[(String, i64)]) -> f64 {
        if scored.is_empty() {
            return 0.0;
        }
        if scored.len() == 1 {
            let score = scored[0].1;
            return (score as f64 / 40.0).min(1.0).max(0.0);
        }

        let best_score = scored[0].1;
        let second_score = scored[1].1;
        if best_score <= 0 {
            return 0.0;
        }

        let gap = best_score - second_score;
        let gap_ratio = gap as f64 / best_score as f64;

        if best_score >= 50 && gap_ratio >= 0.15 {
            return (best_score as f64 / 60.0).clamp(0.7, 1.0);
        }
        if best_score >= 70 {
            return (best_score as f64 / 80.0).clamp(0.75, 1.0);
        }
        if gap >= 30 {
            return (gap as f64 / 50.0 + 0.5).clamp(0.7, 1.0);
        }

        let magnitude_confidence = (best_score as f64 / 50.0).min(1.0);
        let gap_confidence = if gap_ratio < 0.1 {
            0.2
        } else if gap_ratio < 0.2 {
            0.4
        } else {
            (gap_ratio * 1.5).min(1.0)
        };

        ((magnitude_confidence * 0.5 + gap_confidence * 0.5) * 100.0).round() / 100.0
    }

    pub fn into_routing_error(result: &RoutingResult) -> Option<QueryError> {
        if result.should_fallback() {
            return Some(QueryError::RoutingFailed { question: result.entities.raw_question.clone() });
        }
        if result.needs_clarification() {
            return Some(QueryError::RoutingAmbiguous {
                candidates: result.clarification_options(),
                question: result.entities.raw_question.clone(),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnProfile, ColumnRole, DateRange, TableProfile, TableType};

    fn profile_with_month(name: &str, month: &str) -> TableProfile {
        let mut p = TableProfile::empty(name);
        p.table_type = TableType::Transactional;
        p.date_range = DateRange { min: None, max: None, month: Some(month.to_string()), months: vec![] };
        p.columns.insert(
            "Sale_Amount".to_string(),
            ColumnProfile {
                name: "Sale_Amount".to_string(),
                role: ColumnRole::Metric,
                dtype: "f64".to_string(),
                null_ratio: 0.0,
                sample_values: vec![],
                synonyms: vec!["revenue".to_string()],
                stats: None,
                cardinality: 100,
            },
        );
        p.synonym_map.insert("revenue".to_string(), vec!["Sale_Amount".to_string()]);
        p
    }

    fn entities_for_month(month: &str) -> ExtractedEntities {
        let mut e = ExtractedEntities::default();
        e.month = Some(month.to_string());
        e.metric = Some("revenue".to_string());
        e.raw_question = format!("what was revenue in {month}");
        e
    }

    #[tokio::test]
    async fn explicit_mention_wins_outright() {
        let store = ProfileStore::new("/tmp/unused.json");
        store.set("Pincode_Sales_Table", profile_with_month("Pincode_Sales_Table", "September"));
        let router = TableRouter::new(store, None, false);

        let mut entities = entities_for_month("September");
        entities.explicit_table = Some("Pincode_Sales_Table".to_string());

        let result = router.route(entities).await;
        assert_eq!(result.table, Some("Pincode_Sales_Table".to_string()));
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn rule_based_scoring_prefers_matching_month() {
        let store = ProfileStore::new("/tmp/unused.json");
        store.set("September_Table", profile_with_month("September_Table", "September"));
        store.set("October_Table", profile_with_month("October_Table", "October"));
        let router = TableRouter::new(store, None, false);

        let result = router.route(entities_for_month("September")).await;
        assert_eq!(result.table, Some("September_Table".to_string()));
    }

    #[tokio::test]
    async fn no_profiles_falls_back_to_empty_result() {
        let store = ProfileStore::new("/tmp/unused.json");
        let router = TableRouter::new(store, None, false);
        let result = router.route(ExtractedEntities::default()).await;
        assert!(result.should_fallback());
    }

    #[tokio::test]
    async fn explicit_table_name_phrase_beats_keyword_overlap() {
        let store = ProfileStore::new("/tmp/unused.json");
        store.set("Pincode_Sales_Table", TableProfile::empty("Pincode_Sales_Table"));
        store.set("Sales_Summary_Table", TableProfile::empty("Sales_Summary_Table"));
        let router = TableRouter::new(store, None, false);

        let mut entities = ExtractedEntities::default();
        entities.raw_question = "in pincode sales, top 5 areas by gross sales".to_string();
        let result = router.route(entities).await;
        assert_eq!(result.table, Some("Pincode_Sales_Table".to_string()));
        assert!(result.confidence >= 0.7, "expected high confidence, got {}", result.confidence);
    }

    #[tokio::test]
    async fn individual_query_boosts_tables_with_person_columns() {
        let store = ProfileStore::new("/tmp/unused.json");
        let mut hr = TableProfile::empty("Employee_Master_Table");
        hr.table_type = TableType::Lookup;
        hr.columns.insert(
            "Employee_Name".to_string(),
            ColumnProfile {
                name: "Employee_Name".to_string(),
                role: ColumnRole::Identifier,
                dtype: "string".to_string(),
                null_ratio: 0.0,
                sample_values: vec!["Arjun".to_string()],
                synonyms: vec![],
                stats: None,
                cardinality: 20,
            },
        );
        store.set("Employee_Master_Table", hr);
        let mut summary = TableProfile::empty("Department_Summary_Table");
        summary.table_type = TableType::Summary;
        store.set("Department_Summary_Table", summary);

        let router = TableRouter::new(store, None, false);
        let mut entities = ExtractedEntities::default();
        entities.raw_question = "who is the highest paid employee".to_string();
        let result = router.route(entities).await;
        assert_eq!(result.table, Some("Employee_Master_Table".to_string()));
    }
}
