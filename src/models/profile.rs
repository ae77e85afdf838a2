//! Per-table semantic profile (§3.1-3.2).
//!
//! A `TableProfile` is the unit of knowledge the router, entity extractor, and
//! validator all consult. It never changes shape at query time - profiling is
//! a batch step that runs when data is loaded or refreshed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    Metric,
    Dimension,
    Identifier,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    Transactional,
    Summary,
    CategoryBreakdown,
    Pivot,
    ItemLevel,
    Lookup,
    Unknown,
}

impl Default for TableType {
    fn default() -> Self {
        TableType::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    MonthlyPivot,
    Unknown,
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::Unknown
    }
}

/// Summary stats recorded only for `metric` columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub role: ColumnRole,
    pub dtype: String,
    pub null_ratio: f64,
    /// Bounded sample of observed values (up to ~30 for dimensions).
    pub sample_values: Vec<String>,
    /// Domain terms that resolve to this column (e.g. "revenue" -> Sale_Amount).
    pub synonyms: Vec<String>,
    pub stats: Option<MetricStats>,
    pub cardinality: usize,
}

impl ColumnProfile {
    pub fn is_metric(&self) -> bool {
        self.role == ColumnRole::Metric
    }

    pub fn is_dimension(&self) -> bool {
        self.role == ColumnRole::Dimension
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub min: Option<String>,
    pub max: Option<String>,
    /// Set when the table covers exactly one month (e.g. "September").
    pub month: Option<String>,
    pub months: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableProfile {
    pub table_name: String,
    pub table_type: TableType,
    pub granularity: Granularity,
    pub date_range: DateRange,
    pub columns: HashMap<String, ColumnProfile>,
    /// Search term (e.g. "sales") -> columns in this table that satisfy it.
    pub synonym_map: HashMap<String, Vec<String>>,
    pub data_quality_score: f64,
    pub row_count: usize,
    pub column_count: usize,
    pub keywords: Vec<String>,
    pub semantic_summary: Option<String>,
    pub profiled_at: DateTime<Utc>,
}

impl TableProfile {
    pub fn empty(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            table_type: TableType::Unknown,
            granularity: Granularity::Unknown,
            date_range: DateRange::default(),
            columns: HashMap::new(),
            synonym_map: HashMap::new(),
            data_quality_score: 0.0,
            row_count: 0,
            column_count: 0,
            keywords: Vec::new(),
            semantic_summary: None,
            profiled_at: Utc::now(),
        }
    }

    pub fn metric_columns(&self) -> Vec<&ColumnProfile> {
        self.columns.values().filter(|c| c.role == ColumnRole::Metric).collect()
    }

    pub fn dimension_columns(&self) -> Vec<&ColumnProfile> {
        self.columns.values().filter(|c| c.role == ColumnRole::Dimension).collect()
    }

    pub fn date_columns(&self) -> Vec<&ColumnProfile> {
        self.columns.values().filter(|c| c.role == ColumnRole::Date).collect()
    }

    pub fn identifier_columns(&self) -> Vec<&ColumnProfile> {
        self.columns.values().filter(|c| c.role == ColumnRole::Identifier).collect()
    }

    /// Resolve a common search term (e.g. "sales") to the columns that satisfy it.
    pub fn column_for_term(&self, term: &str) -> Option<&Vec<String>> {
        self.synonym_map.get(&term.to_lowercase())
    }

    pub fn has_column_ci(&self, name: &str) -> Option<&str> {
        let needle = name.to_lowercase();
        self.columns.keys().find(|c| c.to_lowercase() == needle).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_has_unknown_type() {
        let p = TableProfile::empty("Foo");
        assert_eq!(p.table_type, TableType::Unknown);
        assert_eq!(p.row_count, 0);
        assert!(p.columns.is_empty());
    }

    #[test]
    fn metric_columns_filters_by_role() {
        let mut p = TableProfile::empty("Sales");
        p.columns.insert(
            "Sale_Amount".into(),
            ColumnProfile {
                name: "Sale_Amount".into(),
                role: ColumnRole::Metric,
                dtype: "f64".into(),
                null_ratio: 0.0,
                sample_values: vec![],
                synonyms: vec!["revenue".into()],
                stats: Some(MetricStats { min: 0.0, max: 100.0, mean: 50.0 }),
                cardinality: 500,
            },
        );
        p.columns.insert(
            "State".into(),
            ColumnProfile {
                name: "State".into(),
                role: ColumnRole::Dimension,
                dtype: "string".into(),
                null_ratio: 0.0,
                sample_values: vec!["TN".into()],
                synonyms: vec![],
                stats: None,
                cardinality: 5,
            },
        );
        assert_eq!(p.metric_columns().len(), 1);
        assert_eq!(p.dimension_columns().len(), 1);
    }
}
