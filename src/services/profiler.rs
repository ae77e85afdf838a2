//! C0: the profiling subsystem that produces `TableProfile` values from raw
//! tabular data, grounded in `schema_intelligence/data_profiler.py` and
//! `semantic_summarizer.py`. Not a numbered component in the original
//! source's architecture doc, but required to make C1 buildable without a
//! human hand-authoring every profile (§2).

use crate::models::{ColumnProfile, ColumnRole, DateRange, Granularity, MetricStats, TableProfile, TableType};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

const DATE_NAME_HINTS: &[&str] = &["date", "time", "timestamp", "created", "updated", "day", "month", "year"];
const METRIC_NAME_HINTS: &[&str] =
    &["amount", "sales", "revenue", "profit", "cost", "price", "total", "quantity", "qty", "value", "count"];
const IDENTIFIER_NAME_HINTS: &[&str] = &["id", "code", "sku", "number", "no", "ref"];

/// One raw row: column name -> cell value, as handed to the profiler by the
/// (external) ingestion subsystem.
pub type RawRow = HashMap<String, Value>;

pub struct TableProfiler;

impl TableProfiler {
    pub fn new() -> Self {
        Self
    }

    /// Produces a `TableProfile` from raw rows. An empty/absent dataset
    /// yields a minimal "empty profile" (zeroed counts, `table_type:
    /// unknown`) rather than an error, so profiling never aborts a batch
    /// fan-out over one bad table (§4.1).
    pub fn profile_table(&self, table_name: &str, rows: &[RawRow]) -> TableProfile {
        if rows.is_empty() {
            return TableProfile::empty(table_name);
        }

        let column_names = Self::column_names(rows);
        let mut columns = HashMap::new();
        for name in &column_names {
            columns.insert(name.clone(), self.classify_column(name, rows));
        }

        let table_type = Self::detect_table_type(table_name, &column_names, &columns);
        let date_range = Self::extract_date_range(&columns);
        let granularity = Self::detect_granularity(table_name, &date_range, &columns);
        let synonym_map = Self::build_synonym_map(&columns);
        let keywords = Self::table_keywords(table_name);
        let data_quality_score = Self::quality_score(rows.len(), &columns);

        TableProfile {
            table_name: table_name.to_string(),
            table_type,
            granularity,
            date_range,
            columns,
            synonym_map,
            data_quality_score,
            row_count: rows.len(),
            column_count: column_names.len(),
            keywords,
            semantic_summary: None,
            profiled_at: chrono::Utc::now(),
        }
    }

    /// Rule-based semantic summary (`semantic_summarizer.py::generate_table_summary_rule_based`):
    /// deterministic, templated into "Contains: … Use for: …". Callers may
    /// overwrite this with an LLM-generated summary, falling back here on
    /// malformed output.
    pub fn generate_semantic_summary(&self, profile: &TableProfile) -> String {
        let metric_names: Vec<&str> = profile.metric_columns().into_iter().map(|c| c.name.as_str()).take(3).collect();
        let dimension_names: Vec<&str> =
            profile.dimension_columns().into_iter().map(|c| c.name.as_str()).take(3).collect();

        let contains = if metric_names.is_empty() && dimension_names.is_empty() {
            format!("{} rows across {} columns", profile.row_count, profile.column_count)
        } else {
            format!(
                "{} rows with metrics [{}] broken down by [{}]",
                profile.row_count,
                metric_names.join(", "),
                dimension_names.join(", ")
            )
        };

        let use_for = match profile.table_type {
            TableType::Transactional => "row-level lookups, filters, and across-all aggregates",
            TableType::Summary => "pre-aggregated totals, not granular filters",
            TableType::CategoryBreakdown => "category comparisons and rankings",
            TableType::Pivot => "month-over-month comparisons",
            TableType::ItemLevel => "item-level lookups",
            TableType::Lookup => "reference/dimension lookups",
            TableType::Unknown => "general queries",
        };

        format!("Contains: {contains}. Use for: {use_for}.")
    }

    fn column_names(rows: &[RawRow]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for row in rows {
            for key in row.keys() {
                if seen.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    /// §3.1: a column that is entirely null is `empty`. Else date-like names
    /// confirmed by a parseable-as-date sample check become `date`; numeric
    /// columns become `metric` (keyword match or cardinality > 20) or a
    /// low-cardinality numeric `dimension`; text columns become
    /// `identifier` (keyword match or cardinality > 50) or a text
    /// `dimension`.
    fn classify_column(&self, name: &str, rows: &[RawRow]) -> ColumnProfile {
        let lower_name = name.to_lowercase();
        let values: Vec<&Value> = rows.iter().filter_map(|r| r.get(name)).collect();
        let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).copied().collect();
        let null_ratio = if values.is_empty() { 1.0 } else { 1.0 - (non_null.len() as f64 / values.len() as f64) };

        if non_null.is_empty() {
            return ColumnProfile {
                name: name.to_string(),
                role: ColumnRole::Empty,
                dtype: "unknown".to_string(),
                null_ratio,
                sample_values: Vec::new(),
                synonyms: Vec::new(),
                stats: None,
                cardinality: 0,
            };
        }

        let unique: HashSet<String> = non_null.iter().map(|v| Self::value_to_string(v)).collect();
        let cardinality = unique.len();
        let sample_values: Vec<String> = unique.iter().take(30).cloned().collect();

        let name_hints_date = DATE_NAME_HINTS.iter().any(|h| lower_name.contains(h));
        let date_parseable_ratio = Self::date_parseable_ratio(&non_null);
        let looks_like_date =
            (name_hints_date && date_parseable_ratio >= 0.5) || date_parseable_ratio >= 0.7;

        if looks_like_date {
            return ColumnProfile {
                name: name.to_string(),
                role: ColumnRole::Date,
                dtype: "date".to_string(),
                null_ratio,
                sample_values,
                synonyms: Vec::new(),
                stats: None,
                cardinality,
            };
        }

        let is_numeric = non_null.iter().all(|v| v.is_number());
        if is_numeric {
            let name_hints_metric = METRIC_NAME_HINTS.iter().any(|h| lower_name.contains(h));
            if name_hints_metric || cardinality > 20 {
                let numbers: Vec<f64> = non_null.iter().filter_map(|v| v.as_f64()).collect();
                let stats = Self::metric_stats(&numbers);
                return ColumnProfile {
                    name: name.to_string(),
                    role: ColumnRole::Metric,
                    dtype: "f64".to_string(),
                    null_ratio,
                    sample_values,
                    synonyms: Self::metric_synonyms(&lower_name),
                    stats: Some(stats),
                    cardinality,
                };
            }
            return ColumnProfile {
                name: name.to_string(),
                role: ColumnRole::Dimension,
                dtype: "numeric".to_string(),
                null_ratio,
                sample_values,
                synonyms: Vec::new(),
                stats: None,
                cardinality,
            };
        }

        let name_hints_identifier = IDENTIFIER_NAME_HINTS.iter().any(|h| lower_name.contains(h));
        if name_hints_identifier || cardinality > 50 {
            return ColumnProfile {
                name: name.to_string(),
                role: ColumnRole::Identifier,
                dtype: "string".to_string(),
                null_ratio,
                sample_values,
                synonyms: Vec::new(),
                stats: None,
                cardinality,
            };
        }

        ColumnProfile {
            name: name.to_string(),
            role: ColumnRole::Dimension,
            dtype: "string".to_string(),
            null_ratio,
            sample_values,
            synonyms: Self::dimension_synonyms(&lower_name),
            stats: None,
            cardinality,
        }
    }

    fn value_to_string(v: &Value) -> String {
        match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn date_parseable_ratio(values: &[&Value]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let parseable = values
            .iter()
            .filter(|v| {
                let s = Self::value_to_string(v);
                chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").is_ok()
                    || chrono::NaiveDate::parse_from_str(&s, "%d/%m/%Y").is_ok()
                    || chrono::NaiveDate::parse_from_str(&s, "%m/%d/%Y").is_ok()
            })
            .count();
        parseable as f64 / values.len() as f64
    }

    fn metric_stats(numbers: &[f64]) -> MetricStats {
        if numbers.is_empty() {
            return MetricStats::default();
        }
        let min = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
        MetricStats { min, max, mean }
    }

    /// A metric column contributes its domain synonyms (e.g. a column whose
    /// name contains `sales` also answers to `revenue`, `turnover`) per
    /// §4.1's synonym-map construction step.
    fn metric_synonyms(lower_name: &str) -> Vec<String> {
        let mut synonyms = Vec::new();
        if lower_name.contains("sale") || lower_name.contains("revenue") || lower_name.contains("amount") {
            synonyms.extend(["revenue", "sales", "turnover", "amount"].map(String::from));
        }
        if lower_name.contains("profit") {
            synonyms.extend(["profit", "margin", "earnings"].map(String::from));
        }
        if lower_name.contains("qty") || lower_name.contains("quantity") {
            synonyms.extend(["quantity", "count", "units"].map(String::from));
        }
        if lower_name.contains("cost") {
            synonyms.extend(["cost", "expense"].map(String::from));
        }
        synonyms.retain(|s| !lower_name.is_empty());
        synonyms.sort();
        synonyms.dedup();
        synonyms
    }

    fn dimension_synonyms(lower_name: &str) -> Vec<String> {
        let mut synonyms = Vec::new();
        if lower_name.contains("state") || lower_name.contains("city") || lower_name.contains("region") {
            synonyms.push("location".to_string());
        }
        if lower_name.contains("cat") {
            synonyms.push("category".to_string());
        }
        if lower_name.contains("product") || lower_name.contains("item") || lower_name.contains("sku") {
            synonyms.push("product".to_string());
        }
        synonyms
    }

    /// Table-type detection: pivot-structure detection when many columns
    /// look like dates/months, else transactional vs. summary vs.
    /// category_breakdown by name and column mix (§4.1).
    fn detect_table_type(
        table_name: &str,
        column_names: &[String],
        columns: &HashMap<String, ColumnProfile>,
    ) -> TableType {
        let lower_table = table_name.to_lowercase();
        let month_like_columns =
            column_names.iter().filter(|c| Self::is_month_like_name(&c.to_lowercase())).count();

        if month_like_columns >= 3 {
            return TableType::Pivot;
        }
        if lower_table.contains("summary") || lower_table.contains("total") || lower_table.contains("grand") {
            return TableType::Summary;
        }
        if lower_table.contains("category") || lower_table.contains("by_cat") || lower_table.contains("breakdown") {
            return TableType::CategoryBreakdown;
        }
        if lower_table.contains("lookup") || lower_table.contains("reference") || lower_table.contains("master") {
            return TableType::Lookup;
        }
        if lower_table.contains("item") || lower_table.contains("sku") || lower_table.contains("product") {
            return TableType::ItemLevel;
        }
        let has_date_column = columns.values().any(|c| c.role == ColumnRole::Date);
        let has_identifier_column = columns.values().any(|c| c.role == ColumnRole::Identifier);
        if has_date_column && has_identifier_column {
            return TableType::Transactional;
        }
        TableType::Unknown
    }

    fn is_month_like_name(s: &str) -> bool {
        const MONTHS: &[&str] = &[
            "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
        ];
        MONTHS.iter().any(|m| s.contains(m))
    }

    fn extract_date_range(columns: &HashMap<String, ColumnProfile>) -> DateRange {
        let mut months: Vec<String> = Vec::new();
        let mut min: Option<String> = None;
        let mut max: Option<String> = None;

        for column in columns.values() {
            if column.role != ColumnRole::Date {
                continue;
            }
            let mut sorted = column.sample_values.clone();
            sorted.sort();
            if let Some(first) = sorted.first() {
                min = Some(min.map_or_else(|| first.clone(), |m| if *first < m { first.clone() } else { m }));
            }
            if let Some(last) = sorted.last() {
                max = Some(max.map_or_else(|| last.clone(), |m| if *last > m { last.clone() } else { m }));
            }
        }

        for (name, column) in columns {
            let numeric_or_dimension = matches!(column.role, ColumnRole::Dimension | ColumnRole::Metric);
            if numeric_or_dimension && Self::is_month_like_name(&name.to_lowercase()) {
                months.push(name.clone());
            }
        }

        let month = if months.len() == 1 { Some(months[0].clone()) } else { None };

        DateRange { min, max, month, months }
    }

    fn detect_granularity(
        table_name: &str,
        date_range: &DateRange,
        columns: &HashMap<String, ColumnProfile>,
    ) -> Granularity {
        let lower_table = table_name.to_lowercase();
        if !date_range.months.is_empty() {
            return Granularity::MonthlyPivot;
        }
        if lower_table.contains("daily") || lower_table.contains("day") {
            return Granularity::Daily;
        }
        if lower_table.contains("weekly") || lower_table.contains("week") {
            return Granularity::Weekly;
        }
        if lower_table.contains("quarter") {
            return Granularity::Quarterly;
        }
        if lower_table.contains("yearly") || lower_table.contains("annual") {
            return Granularity::Yearly;
        }
        if lower_table.contains("monthly") || date_range.month.is_some() {
            return Granularity::Monthly;
        }
        let date_cardinality = columns.values().filter(|c| c.role == ColumnRole::Date).map(|c| c.cardinality).max();
        match date_cardinality {
            Some(n) if n > 60 => Granularity::Daily,
            Some(n) if n > 0 => Granularity::Monthly,
            _ => Granularity::Unknown,
        }
    }

    fn build_synonym_map(columns: &HashMap<String, ColumnProfile>) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, column) in columns {
            for synonym in &column.synonyms {
                map.entry(synonym.clone()).or_default().push(name.clone());
            }
            map.entry(name.to_lowercase()).or_default().push(name.clone());
        }
        map
    }

    fn table_keywords(table_name: &str) -> Vec<String> {
        table_name
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect()
    }

    /// §3.2 quality score formula: completeness (w=0.4) + row-count factor
    /// `min(1.0, row_count/100)` (w=0.2) + type consistency starting at 1.0
    /// minus 0.05 per mixed-type text column, floored at 0 (w=0.2) +
    /// column-variety bonus (`1.0` if ≥3 columns else `0.5`, w=0.2), rounded
    /// to 3 decimals.
    fn quality_score(row_count: usize, columns: &HashMap<String, ColumnProfile>) -> f64 {
        let column_count = columns.len();
        if column_count == 0 {
            return 0.0;
        }

        let completeness = 1.0 - (columns.values().map(|c| c.null_ratio).sum::<f64>() / column_count as f64);
        let row_factor = (row_count as f64 / 100.0).min(1.0);

        let mixed_type_text_columns =
            columns.values().filter(|c| c.dtype == "string" && c.role == ColumnRole::Dimension).count();
        let type_consistency = (1.0 - 0.05 * mixed_type_text_columns as f64).max(0.0);

        let variety_bonus = if column_count >= 3 { 1.0 } else { 0.5 };

        let score = completeness * 0.4 + row_factor * 0.2 + type_consistency * 0.2 + variety_bonus * 0.2;
        (score * 1000.0).round() / 1000.0
    }
}

impl Default for TableProfiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(state: &str, amount: f64, date: &str) -> RawRow {
        HashMap::from([
            ("State".to_string(), json!(state)),
            ("Sale_Amount".to_string(), json!(amount)),
            ("Order_Date".to_string(), json!(date)),
            ("Order_Id".to_string(), json!(format!("ID-{state}-{amount}"))),
        ])
    }

    #[test]
    fn empty_rows_produce_empty_profile() {
        let profiler = TableProfiler::new();
        let profile = profiler.profile_table("Empty_Table", &[]);
        assert_eq!(profile.table_type, TableType::Unknown);
        assert_eq!(profile.row_count, 0);
    }

    #[test]
    fn classifies_date_metric_and_dimension_columns() {
        let profiler = TableProfiler::new();
        let rows = vec![
            row("Tamil Nadu", 100.0, "2025-09-01"),
            row("Kerala", 200.0, "2025-09-02"),
            row("Tamil Nadu", 150.0, "2025-09-03"),
        ];
        let profile = profiler.profile_table("Daily_Sales_Transactions_Table1", &rows);

        assert_eq!(profile.columns["Order_Date"].role, ColumnRole::Date);
        assert_eq!(profile.columns["Sale_Amount"].role, ColumnRole::Metric);
        assert_eq!(profile.columns["State"].role, ColumnRole::Dimension);
        assert_eq!(profile.table_type, TableType::Transactional);
        assert!(profile.data_quality_score > 0.0 && profile.data_quality_score <= 1.0);
    }

    #[test]
    fn detects_monthly_pivot_from_month_named_columns() {
        let profiler = TableProfiler::new();
        let mut r = HashMap::new();
        r.insert("Category".to_string(), json!("Sarees"));
        r.insert("Jan".to_string(), json!(1000.0));
        r.insert("Feb".to_string(), json!(1200.0));
        r.insert("Mar".to_string(), json!(900.0));
        let profile = profiler.profile_table("Category_Monthly_Pivot", &[r]);
        assert_eq!(profile.table_type, TableType::Pivot);
    }
}
