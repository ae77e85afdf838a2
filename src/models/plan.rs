//! The query plan (§3.3): a closed JSON document produced by the planner LLM
//! and locked down by the validator before it ever reaches the SQL compiler.
//!
//! Rather than mirror the source's dict-shaped plan, this models `query_type`
//! as the discriminant of a tagged union so the compiler (C6) cannot construct
//! SQL from a plan shape that was never validated for that query type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Metric,
    Lookup,
    Filter,
    ExtremaLookup,
    Rank,
    List,
    AggregationOnSubset,
    Comparison,
    Percentage,
    Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "!=")]
    Neq,
    Like,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Neq => "!=",
            Operator::Like => "LIKE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" => Some(Operator::Eq),
            ">" => Some(Operator::Gt),
            "<" => Some(Operator::Lt),
            ">=" => Some(Operator::Gte),
            "<=" => Some(Operator::Lte),
            "!=" => Some(Operator::Neq),
            "LIKE" | "like" => Some(Operator::Like),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregationFunction {
    Avg,
    Sum,
    Count,
    Max,
    Min,
    CountDistinct,
}

impl AggregationFunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregationFunction::Avg => "AVG",
            AggregationFunction::Sum => "SUM",
            AggregationFunction::Count => "COUNT",
            AggregationFunction::Max => "MAX",
            AggregationFunction::Min => "MIN",
            AggregationFunction::CountDistinct => "COUNT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "AVG" => Some(AggregationFunction::Avg),
            "SUM" => Some(AggregationFunction::Sum),
            "COUNT" => Some(AggregationFunction::Count),
            "MAX" => Some(AggregationFunction::Max),
            "MIN" => Some(AggregationFunction::Min),
            "COUNT_DISTINCT" => Some(AggregationFunction::CountDistinct),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DateGrouping {
    Month,
    Year,
    Week,
    Day,
    Quarter,
}

impl DateGrouping {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MONTH" => Some(DateGrouping::Month),
            "YEAR" => Some(DateGrouping::Year),
            "WEEK" => Some(DateGrouping::Week),
            "DAY" => Some(DateGrouping::Day),
            "QUARTER" => Some(DateGrouping::Quarter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub operator: Operator,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSpec {
    pub label: String,
    pub table: String,
    pub column: String,
    pub filters: Vec<Filter>,
    pub aggregation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareType {
    Difference,
    PercentageChange,
    Ratio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSpec {
    pub period_a: PeriodSpec,
    pub period_b: PeriodSpec,
    pub compare_type: CompareType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub column: String,
    pub filters: Vec<Filter>,
    pub aggregation: String,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentageSpec {
    pub numerator: AggregateSpec,
    pub denominator: AggregateSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendAnalysisType {
    Direction,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSpec {
    pub date_column: String,
    pub value_column: String,
    pub aggregation: String,
    pub analysis_type: TrendAnalysisType,
    pub group_by: Option<String>,
}

/// A validated, closed-world query plan. Every field beyond `query_type`,
/// `table`, and the common clauses is `query_type`-specific, but kept flat
/// (rather than a true Rust enum with per-variant payloads) because §4.5
/// mutates individual fields independently during normalization - an enum
/// payload would force a full reconstruction on every repair step. The
/// per-type structural invariants are enforced by the validator, not by the
/// type system, and documented there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub query_type: QueryType,
    pub table: String,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub select_columns: Vec<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<i64>,
    pub aggregation_function: Option<AggregationFunction>,
    pub aggregation_column: Option<String>,
    #[serde(default)]
    pub subset_filters: Vec<Filter>,
    #[serde(default)]
    pub subset_order_by: Vec<OrderBy>,
    pub subset_limit: Option<i64>,
    pub comparison: Option<ComparisonSpec>,
    pub percentage: Option<PercentageSpec>,
    pub trend: Option<TrendSpec>,
    pub date_grouping: Option<DateGrouping>,
}

impl QueryPlan {
    pub fn new(query_type: QueryType, table: impl Into<String>) -> Self {
        Self {
            query_type,
            table: table.into(),
            metrics: Vec::new(),
            select_columns: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            aggregation_function: None,
            aggregation_column: None,
            subset_filters: Vec::new(),
            subset_order_by: Vec::new(),
            subset_limit: None,
            comparison: None,
            percentage: None,
            trend: None,
            date_grouping: None,
        }
    }
}

/// The closed set of top-level keys a raw planner JSON document may carry.
/// Anything outside this set is rejected before deserialization even runs -
/// serde's default struct handling would otherwise silently drop an unknown
/// key instead of surfacing a validator error (§6.4).
pub const ALLOWED_PLAN_KEYS: &[&str] = &[
    "query_type",
    "table",
    "metrics",
    "select_columns",
    "filters",
    "group_by",
    "order_by",
    "limit",
    "aggregation_function",
    "aggregation_column",
    "subset_filters",
    "subset_order_by",
    "subset_limit",
    "comparison",
    "percentage",
    "trend",
    "date_grouping",
];
