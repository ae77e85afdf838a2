//! C6: pure plan -> SQL translation. No joins, no subqueries beyond the one
//! `aggregation_on_subset` needs, and no knowledge of any particular engine's
//! dialect beyond standard double-quoted identifiers.

use crate::models::{AggregationFunction, DateGrouping, Filter, Operator, OrderBy, QueryPlan, QueryType};

pub struct SqlCompiler;

impl Default for SqlCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, plan: &QueryPlan) -> String {
        match plan.query_type {
            QueryType::Metric => self.compile_metric(plan),
            QueryType::Lookup | QueryType::Filter | QueryType::List => self.compile_select(plan),
            QueryType::ExtremaLookup | QueryType::Rank => self.compile_rank(plan),
            QueryType::AggregationOnSubset => self.compile_aggregation_on_subset(plan),
            QueryType::Comparison => self.compile_comparison_period(plan, true),
            QueryType::Percentage => self.compile_percentage_component(plan, true),
            QueryType::Trend => self.compile_trend(plan),
        }
    }

    fn quote(identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn compile_metric(&self, plan: &QueryPlan) -> String {
        let agg = plan.aggregation_function.unwrap_or(AggregationFunction::Sum);
        let select_list = self.select_list(&plan.metrics, agg);
        let mut sql = format!("SELECT {select_list} FROM {}", Self::quote(&plan.table));
        if let Some(where_clause) = self.where_clause(&plan.filters) {
            sql.push_str(&format!(" WHERE {where_clause}"));
        }
        if !plan.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", self.group_by_list(plan)));
        }
        sql
    }

    fn select_list(&self, metrics: &[String], agg: AggregationFunction) -> String {
        if metrics.is_empty() {
            return format!("{}(*)", agg.as_sql());
        }
        metrics
            .iter()
            .map(|m| {
                if agg == AggregationFunction::CountDistinct {
                    format!("COUNT(DISTINCT {}) AS {}", Self::quote(m), Self::quote(&format!("{m}_count_distinct")))
                } else {
                    format!("{}({}) AS {}", agg.as_sql(), Self::quote(m), Self::quote(&format!("{}_{}", m, agg.as_sql().to_lowercase())))
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn group_by_list(&self, plan: &QueryPlan) -> String {
        plan.group_by
            .iter()
            .map(|col| match plan.date_grouping {
                Some(grouping) => Self::date_part_expr(col, grouping),
                None => Self::quote(col),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn date_part_expr(column: &str, grouping: DateGrouping) -> String {
        let part = match grouping {
            DateGrouping::Month => "month",
            DateGrouping::Year => "year",
            DateGrouping::Week => "week",
            DateGrouping::Day => "day",
            DateGrouping::Quarter => "quarter",
        };
        format!("DATE_TRUNC('{part}', {})", Self::quote(column))
    }

    fn compile_select(&self, plan: &QueryPlan) -> String {
        let columns = if plan.select_columns.is_empty() {
            "*".to_string()
        } else {
            plan.select_columns.iter().map(|c| Self::quote(c)).collect::<Vec<_>>().join(", ")
        };
        let mut sql = format!("SELECT {columns} FROM {}", Self::quote(&plan.table));
        if let Some(where_clause) = self.where_clause(&plan.filters) {
            sql.push_str(&format!(" WHERE {where_clause}"));
        }
        if !plan.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by_list(&plan.order_by)));
        }
        if let Some(limit) = plan.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    fn compile_rank(&self, plan: &QueryPlan) -> String {
        let agg = plan.aggregation_function.unwrap_or(AggregationFunction::Sum);
        let column = plan.aggregation_column.clone().or_else(|| plan.metrics.first().cloned()).unwrap_or_default();
        let mut select_items = plan.group_by.iter().map(|c| Self::quote(c)).collect::<Vec<_>>();
        select_items.push(format!("{}({}) AS {}", agg.as_sql(), Self::quote(&column), Self::quote("value")));

        let mut sql = format!("SELECT {} FROM {}", select_items.join(", "), Self::quote(&plan.table));
        if let Some(where_clause) = self.where_clause(&plan.filters) {
            sql.push_str(&format!(" WHERE {where_clause}"));
        }
        if !plan.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", self.group_by_list(plan)));
        }
        if !plan.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by_list(&plan.order_by)));
        } else {
            sql.push_str(" ORDER BY value DESC");
        }
        if let Some(limit) = plan.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    /// `aggregation_on_subset`: first rank/filter down to the subset, then
    /// aggregate over just that subset via a derived table (§4.6).
    fn compile_aggregation_on_subset(&self, plan: &QueryPlan) -> String {
        let subset_columns = if plan.select_columns.is_empty() { "*".to_string() } else { plan.select_columns.iter().map(|c| Self::quote(c)).collect::<Vec<_>>().join(", ") };
        let mut subset = format!("SELECT {subset_columns} FROM {}", Self::quote(&plan.table));
        if let Some(where_clause) = self.where_clause(&plan.subset_filters) {
            subset.push_str(&format!(" WHERE {where_clause}"));
        }
        if !plan.subset_order_by.is_empty() {
            subset.push_str(&format!(" ORDER BY {}", self.order_by_list(&plan.subset_order_by)));
        }
        if let Some(limit) = plan.subset_limit {
            subset.push_str(&format!(" LIMIT {limit}"));
        }

        let agg = plan.aggregation_function.unwrap_or(AggregationFunction::Sum);
        let select_list = self.select_list(&plan.metrics, agg);
        format!("SELECT {select_list} FROM ({subset}) AS subset")
    }

    /// Compiles both comparison periods and the top-level shape that wraps
    /// them; `top_level` controls whether the comment describing the
    /// compare_type is prefixed (only meaningful when called directly).
    fn compile_comparison_period(&self, plan: &QueryPlan, top_level: bool) -> String {
        let Some((sql_a, sql_b)) = self.compile_comparison_periods(plan) else {
            return String::new();
        };
        if top_level {
            format!("-- period_a\n{sql_a};\n-- period_b\n{sql_b};")
        } else {
            format!("{sql_a}\n{sql_b}")
        }
    }

    /// Period A and period B as two independently-executable statements -
    /// the shape the pipeline's comparison orchestration actually runs
    /// through the catalog/healer, one at a time.
    pub fn compile_comparison_periods(&self, plan: &QueryPlan) -> Option<(String, String)> {
        let comparison = plan.comparison.as_ref()?;
        let agg_a = AggregationFunction::parse(&comparison.period_a.aggregation).unwrap_or(AggregationFunction::Sum);
        let agg_b = AggregationFunction::parse(&comparison.period_b.aggregation).unwrap_or(AggregationFunction::Sum);

        let sql_a = format!(
            "SELECT {}({}) AS value FROM {}{}",
            agg_a.as_sql(),
            Self::quote(&comparison.period_a.column),
            Self::quote(&comparison.period_a.table),
            self.where_clause(&comparison.period_a.filters).map(|w| format!(" WHERE {w}")).unwrap_or_default()
        );
        let sql_b = format!(
            "SELECT {}({}) AS value FROM {}{}",
            agg_b.as_sql(),
            Self::quote(&comparison.period_b.column),
            Self::quote(&comparison.period_b.table),
            self.where_clause(&comparison.period_b.filters).map(|w| format!(" WHERE {w}")).unwrap_or_default()
        );

        Some((sql_a, sql_b))
    }

    fn compile_percentage_component(&self, plan: &QueryPlan, top_level: bool) -> String {
        let Some((numerator, denominator)) = self.compile_percentage_parts(plan) else {
            return String::new();
        };
        if top_level {
            format!("-- numerator\n{numerator};\n-- denominator\n{denominator};")
        } else {
            format!("{numerator}\n{denominator}")
        }
    }

    /// Numerator and denominator as two independently-executable statements,
    /// mirroring `compile_comparison_periods`.
    pub fn compile_percentage_parts(&self, plan: &QueryPlan) -> Option<(String, String)> {
        let percentage = plan.percentage.as_ref()?;
        let numerator = self.compile_aggregate_spec(&percentage.numerator, &plan.table);
        let denominator = self.compile_aggregate_spec(&percentage.denominator, &plan.table);
        Some((numerator, denominator))
    }

    /// Exposed so the pipeline can compile a one-off trend sub-query whose
    /// plan differs from the top-level one only in its filters.
    pub fn compile_trend_query(&self, plan: &QueryPlan) -> String {
        self.compile_trend(plan)
    }

    fn compile_aggregate_spec(&self, spec: &crate::models::AggregateSpec, default_table: &str) -> String {
        let agg = AggregationFunction::parse(&spec.aggregation).unwrap_or(AggregationFunction::Sum);
        let mut sql = format!("SELECT {}({}) AS value FROM {}", agg.as_sql(), Self::quote(&spec.column), Self::quote(default_table));
        if let Some(where_clause) = self.where_clause(&spec.filters) {
            sql.push_str(&format!(" WHERE {where_clause}"));
        }
        sql
    }

    fn compile_trend(&self, plan: &QueryPlan) -> String {
        let Some(trend) = &plan.trend else {
            return String::new();
        };
        let agg = AggregationFunction::parse(&trend.aggregation).unwrap_or(AggregationFunction::Sum);
        let mut select_items = vec![Self::quote(&trend.date_column), format!("{}({}) AS value", agg.as_sql(), Self::quote(&trend.value_column))];
        if let Some(group) = &trend.group_by {
            select_items.push(Self::quote(group));
        }
        let mut sql = format!("SELECT {} FROM {}", select_items.join(", "), Self::quote(&plan.table));
        if let Some(where_clause) = self.where_clause(&plan.filters) {
            sql.push_str(&format!(" WHERE {where_clause}"));
        }
        let mut group_cols = vec![Self::quote(&trend.date_column)];
        if let Some(group) = &trend.group_by {
            group_cols.push(Self::quote(group));
        }
        sql.push_str(&format!(" GROUP BY {}", group_cols.join(", ")));
        sql.push_str(&format!(" ORDER BY {}", Self::quote(&trend.date_column)));
        sql
    }

    fn order_by_list(&self, order_by: &[OrderBy]) -> String {
        order_by
            .iter()
            .map(|o| format!("{} {}", Self::quote(&o.column), if o.direction == crate::models::OrderDirection::Asc { "ASC" } else { "DESC" }))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Same-column filters OR together (a set of allowed values for one
    /// field), different columns AND together - the shape the healer's
    /// relaxation strategy (C7) later has to parse back out (§4.7).
    pub fn where_clause(&self, filters: &[Filter]) -> Option<String> {
        if filters.is_empty() {
            return None;
        }
        use std::collections::BTreeMap;
        let mut by_column: BTreeMap<&str, Vec<&Filter>> = BTreeMap::new();
        for filter in filters {
            by_column.entry(&filter.column).or_default().push(filter);
        }

        let clauses: Vec<String> = by_column
            .values()
            .map(|group| {
                let rendered: Vec<String> = group.iter().map(|f| self.render_filter(f)).collect();
                if rendered.len() == 1 {
                    rendered.into_iter().next().unwrap()
                } else {
                    format!("({})", rendered.join(" OR "))
                }
            })
            .collect();

        Some(clauses.join(" AND "))
    }

    fn render_filter(&self, filter: &Filter) -> String {
        let column = Self::quote(&filter.column);
        match filter.operator {
            Operator::Like => format!("{column} LIKE '%{}%'", filter.value.replace('\'', "''")),
            _ => {
                if filter.value.parse::<f64>().is_ok() {
                    format!("{column} {} {}", filter.operator.as_sql(), filter.value)
                } else {
                    format!("{column} {} '{}'", filter.operator.as_sql(), filter.value.replace('\'', "''"))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Operator, OrderDirection, QueryType};

    #[test]
    fn compiles_simple_metric_query() {
        let compiler = SqlCompiler::new();
        let mut plan = QueryPlan::new(QueryType::Metric, "Sales");
        plan.metrics = vec!["Sale_Amount".to_string()];
        plan.aggregation_function = Some(AggregationFunction::Sum);
        let sql = compiler.compile(&plan);
        assert_eq!(sql, "SELECT SUM(\"Sale_Amount\") AS \"Sale_Amount_sum\" FROM \"Sales\"");
    }

    #[test]
    fn same_column_filters_or_together_different_columns_and() {
        let compiler = SqlCompiler::new();
        let filters = vec![
            Filter { column: "State".to_string(), operator: Operator::Eq, value: "TN".to_string() },
            Filter { column: "State".to_string(), operator: Operator::Eq, value: "KA".to_string() },
            Filter { column: "Category".to_string(), operator: Operator::Eq, value: "Dairy".to_string() },
        ];
        let where_clause = compiler.where_clause(&filters).unwrap();
        assert_eq!(where_clause, "(\"State\" = 'TN' OR \"State\" = 'KA') AND \"Category\" = 'Dairy'");
    }

    #[test]
    fn rank_query_defaults_to_descending_value_order() {
        let compiler = SqlCompiler::new();
        let mut plan = QueryPlan::new(QueryType::Rank, "Pincode_Sales_Table");
        plan.aggregation_column = Some("Sale_Amount".to_string());
        plan.group_by = vec!["Pincode".to_string()];
        plan.limit = Some(5);
        let sql = compiler.compile(&plan);
        assert!(sql.contains("ORDER BY value DESC"));
        assert!(sql.contains("LIMIT 5"));
    }

    #[test]
    fn lookup_query_honors_order_by_and_limit() {
        let compiler = SqlCompiler::new();
        let mut plan = QueryPlan::new(QueryType::Lookup, "Sales");
        plan.select_columns = vec!["Order_Id".to_string()];
        plan.order_by = vec![OrderBy { column: "Sale_Amount".to_string(), direction: OrderDirection::Desc }];
        plan.limit = Some(1);
        let sql = compiler.compile(&plan);
        assert!(sql.ends_with("ORDER BY \"Sale_Amount\" DESC LIMIT 1"));
    }
}
