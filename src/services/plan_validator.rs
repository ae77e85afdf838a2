//! C5: plan normalization and validation (§4.5), grounded in
//! `validation_layer/plan_validator.py`.
//!
//! Takes the raw JSON document straight out of the planner LLM and returns a
//! closed, catalog-bound `QueryPlan` or a `PlanInvalid` error. Never mutates
//! a plan in place - every call consumes its input and returns a fresh
//! value, so re-validating an already-valid plan is a no-op (§8 idempotence).

use crate::error::QueryError;
use crate::models::{AggregationFunction, Operator, QueryPlan, QueryType, ALLOWED_PLAN_KEYS};
use crate::services::profile_store::ProfileStore;
use regex::Regex;
use serde_json::Value;

pub struct PlanValidator;

impl Default for PlanValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, raw: Value, profile_store: &ProfileStore) -> Result<QueryPlan, QueryError> {
        let object = raw.as_object().ok_or_else(|| QueryError::PlanInvalid {
            detail: "plan must be a JSON object".to_string(),
        })?;

        if let Some(unknown) = object.keys().find(|k| !ALLOWED_PLAN_KEYS.contains(&k.as_str())) {
            return Err(QueryError::PlanInvalid { detail: format!("unknown plan key: {unknown}") });
        }

        let mut plan: QueryPlan = serde_json::from_value(raw).map_err(|e| QueryError::PlanInvalid {
            detail: format!("plan did not match the expected shape: {e}"),
        })?;

        let profile = profile_store.get(&plan.table).ok_or_else(|| QueryError::PlanInvalid {
            detail: format!("unknown table: {}", plan.table),
        })?;

        self.normalize(&mut plan);
        self.bind_columns(&mut plan, &profile)?;
        self.enforce_structural_rules(&plan)?;

        Ok(plan)
    }

    /// §4.5 normalization: fills in defaults and reconciles the
    /// `metrics`/`select_columns` duality - non-aggregating query types read
    /// from `select_columns`, so any value the planner put in `metrics`
    /// for those types is folded in rather than silently dropped.
    fn normalize(&self, plan: &mut QueryPlan) {
        if plan.aggregation_function.is_none() && !matches!(plan.query_type, QueryType::Lookup | QueryType::Filter | QueryType::List) {
            plan.aggregation_function = Some(AggregationFunction::Sum);
        }

        match plan.query_type {
            QueryType::Lookup | QueryType::ExtremaLookup => plan.limit = Some(1),
            _ if plan.limit.is_none() => plan.limit = Some(100),
            _ => {},
        }

        match plan.query_type {
            QueryType::Lookup | QueryType::Filter | QueryType::List => {
                if plan.select_columns.is_empty() && !plan.metrics.is_empty() {
                    plan.select_columns = std::mem::take(&mut plan.metrics);
                }
            },
            _ => {
                if plan.metrics.is_empty() && !plan.select_columns.is_empty() {
                    plan.metrics = std::mem::take(&mut plan.select_columns);
                }
            },
        }

        for filter in plan.filters.iter_mut().chain(plan.subset_filters.iter_mut()) {
            if let Some(iso) = Self::normalize_date(&filter.value) {
                filter.value = iso;
            }
        }
    }

    /// Rewrites a `DD/MM/YYYY` (or `DD-MM-YYYY`) literal to ISO `YYYY-MM-DD`;
    /// anything else passes through untouched.
    fn normalize_date(value: &str) -> Option<String> {
        let re = Regex::new(r"^(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})$").ok()?;
        let caps = re.captures(value)?;
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: u32 = caps[3].parse().ok()?;
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }
        Some(format!("{year:04}-{month:02}-{day:02}"))
    }

    /// Case-insensitive exact match, then substring, then fuzzy (Jaro-Winkler
    /// >= 0.8) against the table's real column names (§4.5).
    fn resolve_column(name: &str, profile: &crate::models::TableProfile) -> Option<String> {
        if let Some(exact) = profile.has_column_ci(name) {
            return Some(exact.to_string());
        }
        if let Some(terms) = profile.column_for_term(name)
            && let Some(first) = terms.first()
        {
            return Some(first.clone());
        }

        let lower = name.to_lowercase();
        if let Some(substr) = profile.columns.keys().find(|c| c.to_lowercase().contains(&lower) || lower.contains(&c.to_lowercase())) {
            return Some(substr.clone());
        }

        profile
            .columns
            .keys()
            .map(|c| (c.clone(), strsim::jaro_winkler(&lower, &c.to_lowercase())))
            .filter(|(_, score)| *score >= 0.8)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(c, _)| c)
    }

    fn resolve_or_err(name: &str, profile: &crate::models::TableProfile) -> Result<String, QueryError> {
        Self::resolve_column(name, profile).ok_or_else(|| QueryError::PlanInvalid {
            detail: format!("column \"{name}\" does not exist on table \"{}\"", profile.table_name),
        })
    }

    fn bind_columns(&self, plan: &mut QueryPlan, profile: &crate::models::TableProfile) -> Result<(), QueryError> {
        for metric in plan.metrics.iter_mut() {
            *metric = Self::resolve_or_err(metric, profile)?;
        }
        for column in plan.select_columns.iter_mut() {
            *column = Self::resolve_or_err(column, profile)?;
        }
        for group in plan.group_by.iter_mut() {
            *group = Self::resolve_or_err(group, profile)?;
        }
        for filter in plan.filters.iter_mut() {
            filter.column = Self::resolve_or_err(&filter.column, profile)?;
        }
        for filter in plan.subset_filters.iter_mut() {
            filter.column = Self::resolve_or_err(&filter.column, profile)?;
        }
        for order in plan.order_by.iter_mut() {
            order.column = Self::resolve_or_err(&order.column, profile)?;
        }
        for order in plan.subset_order_by.iter_mut() {
            order.column = Self::resolve_or_err(&order.column, profile)?;
        }
        if let Some(col) = &plan.aggregation_column {
            plan.aggregation_column = Some(Self::resolve_or_err(col, profile)?);
        }
        if let Some(trend) = &mut plan.trend {
            trend.date_column = Self::resolve_or_err(&trend.date_column, profile)?;
            trend.value_column = Self::resolve_or_err(&trend.value_column, profile)?;
            if let Some(group) = &trend.group_by {
                trend.group_by = Some(Self::resolve_or_err(group, profile)?);
            }
        }
        if let Some(comparison) = &mut plan.comparison {
            for period in [&mut comparison.period_a, &mut comparison.period_b] {
                period.column = Self::resolve_or_err(&period.column, profile)?;
                for f in period.filters.iter_mut() {
                    f.column = Self::resolve_or_err(&f.column, profile)?;
                }
            }
        }
        if let Some(percentage) = &mut plan.percentage {
            for spec in [&mut percentage.numerator, &mut percentage.denominator] {
                spec.column = Self::resolve_or_err(&spec.column, profile)?;
                for f in spec.filters.iter_mut() {
                    f.column = Self::resolve_or_err(&f.column, profile)?;
                }
            }
        }
        Ok(())
    }

    /// §4.5's per-query-type structural rules: the minimal invariants that
    /// must hold for the compiler (C6) to ever produce runnable SQL.
    fn enforce_structural_rules(&self, plan: &QueryPlan) -> Result<(), QueryError> {
        let invalid = |detail: String| QueryError::PlanInvalid { detail };

        match plan.query_type {
            QueryType::Metric | QueryType::AggregationOnSubset => {
                if plan.metrics.is_empty() {
                    return Err(invalid("metric query requires at least one metric".to_string()));
                }
            },
            QueryType::Lookup | QueryType::Filter | QueryType::List => {
                if plan.select_columns.is_empty() {
                    return Err(invalid("lookup/filter/list query requires select_columns".to_string()));
                }
            },
            QueryType::ExtremaLookup | QueryType::Rank => {
                if plan.metrics.is_empty() && plan.aggregation_column.is_none() {
                    return Err(invalid("extrema/rank query requires a metric or aggregation_column".to_string()));
                }
                if plan.order_by.is_empty() {
                    return Err(invalid("extrema/rank query requires order_by".to_string()));
                }
            },
            QueryType::Comparison => {
                if plan.comparison.is_none() {
                    return Err(invalid("comparison query requires a comparison spec".to_string()));
                }
            },
            QueryType::Percentage => {
                if plan.percentage.is_none() {
                    return Err(invalid("percentage query requires a percentage spec".to_string()));
                }
            },
            QueryType::Trend => {
                if plan.trend.is_none() {
                    return Err(invalid("trend query requires a trend spec".to_string()));
                }
            },
        }

        for filter in plan.filters.iter().chain(plan.subset_filters.iter()) {
            if matches!(filter.operator, Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte)
                && filter.value.parse::<f64>().is_err()
                && Self::normalize_date(&filter.value).is_none()
                && !Self::looks_like_iso_date(&filter.value)
            {
                return Err(invalid(format!("comparison filter on \"{}\" needs a numeric or date value", filter.column)));
            }
        }

        Ok(())
    }

    fn looks_like_iso_date(value: &str) -> bool {
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap().is_match(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnProfile, ColumnRole, TableProfile};
    use serde_json::json;

    fn store_with_sales_table() -> ProfileStore {
        let store = ProfileStore::new("/tmp/unused.json");
        let mut profile = TableProfile::empty("Sales");
        profile.columns.insert(
            "Sale_Amount".to_string(),
            ColumnProfile {
                name: "Sale_Amount".to_string(),
                role: ColumnRole::Metric,
                dtype: "f64".to_string(),
                null_ratio: 0.0,
                sample_values: vec![],
                synonyms: vec!["revenue".to_string()],
                stats: None,
                cardinality: 200,
            },
        );
        profile.columns.insert(
            "State".to_string(),
            ColumnProfile {
                name: "State".to_string(),
                role: ColumnRole::Dimension,
                dtype: "string".to_string(),
                null_ratio: 0.0,
                sample_values: vec![],
                synonyms: vec![],
                stats: None,
                cardinality: 5,
            },
        );
        profile.synonym_map.insert("revenue".to_string(), vec!["Sale_Amount".to_string()]);
        store.set("Sales", profile);
        store
    }

    #[test]
    fn rejects_unknown_top_level_key() {
        let validator = PlanValidator::new();
        let store = store_with_sales_table();
        let raw = json!({"query_type": "metric", "table": "Sales", "metrics": ["revenue"], "bogus_key": true});
        let err = validator.validate(raw, &store).unwrap_err();
        assert!(matches!(err, QueryError::PlanInvalid { .. }));
    }

    #[test]
    fn resolves_synonym_to_real_column_name() {
        let validator = PlanValidator::new();
        let store = store_with_sales_table();
        let raw = json!({"query_type": "metric", "table": "Sales", "metrics": ["revenue"]});
        let plan = validator.validate(raw, &store).unwrap();
        assert_eq!(plan.metrics, vec!["Sale_Amount".to_string()]);
        assert_eq!(plan.aggregation_function, Some(AggregationFunction::Sum));
    }

    #[test]
    fn fuzzy_matches_near_miss_column_name() {
        let validator = PlanValidator::new();
        let store = store_with_sales_table();
        let raw = json!({"query_type": "lookup", "table": "Sales", "select_columns": ["Sale_Amont"]});
        let plan = validator.validate(raw, &store).unwrap();
        assert_eq!(plan.select_columns, vec!["Sale_Amount".to_string()]);
    }

    #[test]
    fn rank_query_without_limit_defaults_to_one_hundred() {
        let validator = PlanValidator::new();
        let store = store_with_sales_table();
        let raw = json!({
            "query_type": "rank", "table": "Sales", "metrics": ["revenue"],
            "order_by": [{"column": "Sale_Amount", "direction": "DESC"}]
        });
        let plan = validator.validate(raw, &store).unwrap();
        assert_eq!(plan.limit, Some(100));
    }

    #[test]
    fn rank_query_without_order_by_is_rejected() {
        let validator = PlanValidator::new();
        let store = store_with_sales_table();
        let raw = json!({"query_type": "rank", "table": "Sales", "metrics": ["revenue"]});
        let err = validator.validate(raw, &store).unwrap_err();
        assert!(matches!(err, QueryError::PlanInvalid { .. }));
    }

    #[test]
    fn lookup_query_is_forced_to_limit_one_even_if_the_planner_set_more() {
        let validator = PlanValidator::new();
        let store = store_with_sales_table();
        let raw = json!({
            "query_type": "lookup", "table": "Sales", "select_columns": ["Sale_Amount"], "limit": 20
        });
        let plan = validator.validate(raw, &store).unwrap();
        assert_eq!(plan.limit, Some(1));
    }

    #[test]
    fn date_literal_is_normalized_to_iso() {
        let validator = PlanValidator::new();
        let store = store_with_sales_table();
        let raw = json!({
            "query_type": "filter", "table": "Sales", "select_columns": ["Sale_Amount"],
            "filters": [{"column": "State", "operator": "=", "value": "05/09/2024"}]
        });
        let plan = validator.validate(raw, &store).unwrap();
        assert_eq!(plan.filters[0].value, "2024-09-05");
    }

    #[test]
    fn revalidating_an_already_valid_plan_is_a_no_op() {
        let validator = PlanValidator::new();
        let store = store_with_sales_table();
        let raw = json!({"query_type": "metric", "table": "Sales", "metrics": ["Sale_Amount"], "aggregation_function": "SUM"});
        let plan = validator.validate(raw, &store).unwrap();
        let reserialized = serde_json::to_value(&plan).unwrap();
        let replan = validator.validate(reserialized, &store).unwrap();
        assert_eq!(plan, replan);
    }
}
