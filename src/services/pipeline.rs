//! Orchestration: wires C2-C9 into the single request path §5 describes as
//! "C10 -> C2 -> C3 -> C4 -> C5 -> C6/C8 -> C7 -> explanation -> C9", with
//! C10 gating entry and C9 bracketing the whole turn.

use crate::error::{QueryError, QueryResult};
use crate::models::{
    AggregateSpec, AggregationFunction, ComparisonSpec, ConversationTurn, ExtractedEntities, Filter,
    PercentageSpec, QueryPlan, QueryType, TrendSpec,
};
use crate::services::advanced_operators::{
    compare, analyze_trend, percentage_of, project, ComparisonOutcome, PercentageOutcome, ProjectionOutcome,
    TrendContext, TrendOutcome,
};
use crate::services::catalog::{SqlCatalog, TabularResult};
use crate::services::conversation_context::ConversationContext;
use crate::services::dialogue_gate::{DialogueGate, GateOutcome};
use crate::services::entity_extractor::EntityExtractor;
use crate::services::llm::{Explainer, LLMResult, Planner, Translator};
use crate::services::plan_validator::PlanValidator;
use crate::services::profile_store::ProfileStore;
use crate::services::query_healer::QueryHealer;
use crate::services::sql_compiler::SqlCompiler;
use crate::services::table_router::TableRouter;
use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Follow-up projection keywords (§4.8): a turn is a projection request, not
/// a fresh trend, when it contains one of these and a prior trend series
/// exists for the session.
const PROJECTION_TERMS: &[&str] =
    &["forecast", "projection", "project ", "predict", "next month", "next quarter", "next week", "expected", "will be", "will reach"];

#[derive(Debug, Clone, Default)]
pub struct PipelineResponse {
    pub answer: String,
    pub table_used: Option<String>,
    pub sql: Vec<String>,
    pub result: Option<TabularResult>,
    pub comparison: Option<ComparisonOutcome>,
    pub percentage: Option<PercentageOutcome>,
    pub trend: Option<TrendOutcome>,
    pub projection: Option<ProjectionOutcome>,
    pub routing_confidence: f64,
    pub was_followup: bool,
}

impl PipelineResponse {
    fn reply_only(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), ..Default::default() }
    }
}

pub struct QueryPipeline {
    gate: DialogueGate,
    extractor: EntityExtractor,
    conversation: ConversationContext,
    profile_store: ProfileStore,
    router: TableRouter,
    planner: Arc<dyn Planner>,
    validator: PlanValidator,
    compiler: SqlCompiler,
    healer: QueryHealer,
    catalog: Arc<dyn SqlCatalog>,
    explainer: Arc<dyn Explainer>,
    translator: Arc<dyn Translator>,
    /// Per-session cache of the last trend series (§4.8): projection is a
    /// follow-up over a prior trend turn, not a query type of its own.
    trend_cache: DashMap<String, TrendContext>,
}

impl QueryPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: EntityExtractor,
        conversation: ConversationContext,
        profile_store: ProfileStore,
        router: TableRouter,
        planner: Arc<dyn Planner>,
        catalog: Arc<dyn SqlCatalog>,
        explainer: Arc<dyn Explainer>,
        translator: Arc<dyn Translator>,
        max_retries: u32,
    ) -> Self {
        Self {
            gate: DialogueGate::new(),
            extractor,
            conversation,
            router,
            planner,
            validator: PlanValidator::new(),
            compiler: SqlCompiler::new(),
            healer: QueryHealer::new(max_retries, profile_store.clone()),
            profile_store,
            catalog,
            explainer,
            translator,
            trend_cache: DashMap::new(),
        }
    }

    pub async fn handle(&self, session_id: &str, raw_question: &str) -> QueryResult<PipelineResponse> {
        if raw_question.trim().is_empty() {
            return Err(QueryError::InvalidInput);
        }

        let has_pending = self.conversation.pending_clarification(session_id).is_some();
        match self.gate.classify(raw_question, has_pending, &self.extractor) {
            GateOutcome::MemoryIntent { reply, .. } => return Ok(PipelineResponse::reply_only(reply)),
            GateOutcome::SmallTalk { reply, .. } => return Ok(PipelineResponse::reply_only(reply)),
            GateOutcome::SchemaInquiry => return Ok(PipelineResponse::reply_only(self.describe_schema())),
            GateOutcome::DateContext(hint) => {
                self.conversation.set_date_hint(session_id, hint);
                return Ok(PipelineResponse::reply_only("Noted - I'll use that date for queries that don't mention one."));
            },
            GateOutcome::PendingClarification => {
                if let Some(response) = self.resolve_pending_clarification(session_id, raw_question).await {
                    return response;
                }
                // No candidate matched; treat the turn as fresh (§4.9).
            },
            GateOutcome::DataQuery => {},
        }

        self.run_data_query(session_id, raw_question).await
    }

    fn describe_schema(&self) -> String {
        let profiles = self.profile_store.get_all();
        if profiles.is_empty() {
            return "No tables are loaded yet.".to_string();
        }
        let mut names: Vec<_> = profiles.values().collect();
        names.sort_by(|a, b| a.table_name.cmp(&b.table_name));
        let lines: Vec<String> = names
            .iter()
            .map(|p| format!("- {}: {}", p.table_name, p.semantic_summary.clone().unwrap_or_else(|| format!("{:?} table", p.table_type))))
            .collect();
        format!("Here are the tables I know about:\n{}", lines.join("\n"))
    }

    /// §4.9's pending-clarification cascade, reusing the stored entities and
    /// binding straight to the resolved table rather than re-routing.
    async fn resolve_pending_clarification(&self, session_id: &str, reply: &str) -> Option<QueryResult<PipelineResponse>> {
        let pending = self.conversation.pending_clarification(session_id)?;
        let idx = ConversationContext::match_pending_clarification(&pending.candidates, reply)?;
        let table = pending.candidates[idx].clone();
        self.conversation.clear_pending_clarification(session_id);

        let mut entities = pending.entities;
        entities.explicit_table = Some(table);
        Some(self.continue_with_entities(session_id, &pending.original_question, entities, false).await)
    }

    async fn run_data_query(&self, session_id: &str, raw_question: &str) -> QueryResult<PipelineResponse> {
        let resolved_question = self.translator.to_english(raw_question);
        let is_followup = self.conversation.is_followup_question(session_id, &resolved_question, &self.extractor);

        let fresh_entities = self.extractor.extract(&resolved_question);
        let entities = self.conversation.merge_entities(session_id, fresh_entities);

        if self.is_projection_request(&resolved_question)
            && let Some(context) = self.trend_cache.get(session_id)
        {
            return Ok(self.answer_projection(raw_question, &resolved_question, &context, session_id));
        }

        self.continue_with_entities(session_id, raw_question, entities, is_followup).await
    }

    async fn continue_with_entities(
        &self,
        session_id: &str,
        raw_question: &str,
        entities: ExtractedEntities,
        is_followup: bool,
    ) -> QueryResult<PipelineResponse> {
        let started = Instant::now();
        let routing = self.router.route(entities.clone()).await;

        if let Some(error) = TableRouter::into_routing_error(&routing) {
            if let QueryError::RoutingAmbiguous { candidates, .. } = &error {
                self.conversation.set_pending_clarification(
                    session_id,
                    crate::models::PendingClarification {
                        original_question: raw_question.to_string(),
                        translated_question: self.translator.to_english(raw_question),
                        candidates: candidates.clone(),
                        entities: entities.clone(),
                        is_tamil: false,
                    },
                );
            }
            return Err(error);
        }
        let table = routing.table.clone().ok_or_else(|| QueryError::RoutingFailed { question: raw_question.to_string() })?;

        let plan_value = self.invoke_planner(raw_question, &table).await?;
        let plan = self.validator.validate(plan_value, &self.profile_store)?;

        let (result, sql_statements, comparison, percentage, trend) = self.execute_plan(session_id, &plan).await?;

        if result.is_empty() && comparison.is_none() && percentage.is_none() && trend.is_none() {
            return Err(QueryError::DataEmpty { missing_entity: entities.metric.clone() });
        }

        let answer = self
            .explainer
            .explain(raw_question, &plan, &Self::result_as_json(&result))
            .await;

        self.record_turn(session_id, raw_question, &entities, &table, &result, &sql_statements, started, is_followup, routing.confidence);

        Ok(PipelineResponse {
            answer,
            table_used: Some(table),
            sql: sql_statements,
            result: Some(result),
            comparison,
            percentage,
            trend,
            projection: None,
            routing_confidence: routing.confidence,
            was_followup: is_followup,
        })
    }

    async fn invoke_planner(&self, question: &str, table: &str) -> QueryResult<Value> {
        let schema_text = self.table_schema_text(table);
        match self.planner.plan(question, &schema_text).await {
            LLMResult::Ok(value) => Ok(value),
            LLMResult::MalformedOutput(detail) => Err(QueryError::PlanInvalid { detail }),
            LLMResult::Timeout(_) => Err(QueryError::Timeout { what: "planner".to_string() }),
            LLMResult::TransportError(detail) => Err(QueryError::PlanInvalid { detail }),
        }
    }

    fn table_schema_text(&self, table: &str) -> String {
        let Some(profile) = self.profile_store.get(table) else {
            return format!("table {table}: (no profile available)");
        };
        let mut columns: Vec<_> = profile.columns.values().collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));
        let column_lines: Vec<String> = columns.iter().map(|c| format!("{} ({:?})", c.name, c.role)).collect();
        format!("table {}: {}", profile.table_name, column_lines.join(", "))
    }

    /// C6/C8/C7: compiles (or, for comparison/percentage, decomposes into
    /// independently-healed sub-queries) and executes the validated plan.
    async fn execute_plan(
        &self,
        session_id: &str,
        plan: &QueryPlan,
    ) -> QueryResult<(TabularResult, Vec<String>, Option<ComparisonOutcome>, Option<PercentageOutcome>, Option<TrendOutcome>)> {
        match plan.query_type {
            QueryType::Comparison => {
                let spec = plan.comparison.as_ref().ok_or_else(|| QueryError::PlanInvalid {
                    detail: "comparison query missing its comparison spec".to_string(),
                })?;
                let (value_a, value_b, sqls) = self.execute_comparison(spec).await?;
                let outcome = compare(value_a, value_b);
                Ok((TabularResult::default(), sqls, Some(outcome), None, None))
            },
            QueryType::Percentage => {
                let spec = plan.percentage.as_ref().ok_or_else(|| QueryError::PlanInvalid {
                    detail: "percentage query missing its percentage spec".to_string(),
                })?;
                let (numerator, denominator, sqls) = self.execute_percentage(&plan.table, spec).await?;
                let outcome = percentage_of(numerator, denominator);
                Ok((TabularResult::default(), sqls, None, Some(outcome), None))
            },
            QueryType::Trend => {
                let (result, sql) = self.healer.execute_with_healing(self.catalog.as_ref(), &self.compiler, plan).await?;
                let trend_spec = plan.trend.as_ref().ok_or_else(|| QueryError::PlanInvalid {
                    detail: "trend query missing its trend spec".to_string(),
                })?;
                let series = Self::trend_series(&result);
                let outcome = analyze_trend(&series);
                if let Some(outcome) = &outcome {
                    self.trend_cache.insert(session_id.to_string(), Self::trend_context(outcome, &series, trend_spec));
                }
                Ok((result, vec![sql], None, None, outcome))
            },
            _ => {
                let (result, sql) = self.healer.execute_with_healing(self.catalog.as_ref(), &self.compiler, plan).await?;
                Ok((result, vec![sql], None, None, None))
            },
        }
    }

    async fn execute_comparison(&self, spec: &ComparisonSpec) -> QueryResult<(f64, f64, Vec<String>)> {
        let plan_a = Self::metric_plan(&spec.period_a.table, &spec.period_a.column, &spec.period_a.aggregation, &spec.period_a.filters);
        let plan_b = Self::metric_plan(&spec.period_b.table, &spec.period_b.column, &spec.period_b.aggregation, &spec.period_b.filters);
        let (result_a, sql_a) = self.healer.execute_with_healing(self.catalog.as_ref(), &self.compiler, &plan_a).await?;
        let (result_b, sql_b) = self.healer.execute_with_healing(self.catalog.as_ref(), &self.compiler, &plan_b).await?;
        let value_a = Self::scalar_of(&result_a).unwrap_or(0.0);
        let value_b = Self::scalar_of(&result_b).unwrap_or(0.0);
        Ok((value_a, value_b, vec![sql_a, sql_b]))
    }

    async fn execute_percentage(&self, default_table: &str, spec: &PercentageSpec) -> QueryResult<(f64, f64, Vec<String>)> {
        let numerator_plan = Self::aggregate_plan(default_table, &spec.numerator);
        let denominator_plan = Self::aggregate_plan(default_table, &spec.denominator);
        let (numerator_result, sql_numerator) =
            self.healer.execute_with_healing(self.catalog.as_ref(), &self.compiler, &numerator_plan).await?;
        let (denominator_result, sql_denominator) =
            self.healer.execute_with_healing(self.catalog.as_ref(), &self.compiler, &denominator_plan).await?;
        let numerator = Self::scalar_of(&numerator_result).unwrap_or(0.0);
        let denominator = Self::scalar_of(&denominator_result).unwrap_or(0.0);
        Ok((numerator, denominator, vec![sql_numerator, sql_denominator]))
    }

    fn metric_plan(table: &str, column: &str, aggregation: &str, filters: &[Filter]) -> QueryPlan {
        let mut plan = QueryPlan::new(QueryType::Metric, table);
        plan.metrics = vec![column.to_string()];
        plan.aggregation_function = Some(AggregationFunction::parse(aggregation).unwrap_or(AggregationFunction::Sum));
        plan.filters = filters.to_vec();
        plan
    }

    fn aggregate_plan(default_table: &str, spec: &AggregateSpec) -> QueryPlan {
        let mut plan = QueryPlan::new(QueryType::Metric, default_table);
        plan.metrics = vec![spec.column.clone()];
        plan.aggregation_function = Some(AggregationFunction::parse(&spec.aggregation).unwrap_or(AggregationFunction::Sum));
        plan.filters = spec.filters.clone();
        plan
    }

    fn scalar_of(result: &TabularResult) -> Option<f64> {
        let row = result.rows.first()?;
        let cell = row.first()?;
        Self::value_as_f64(cell)
    }

    fn value_as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Trend rows are `(date, value[, group])`; the value is always the
    /// column the compiler aliased `value` (§C6).
    fn trend_series(result: &TabularResult) -> Vec<f64> {
        let Some(idx) = result.columns.iter().position(|c| c == "value") else {
            return Vec::new();
        };
        result.rows.iter().filter_map(|row| row.get(idx)).filter_map(Self::value_as_f64).collect()
    }

    fn trend_context(outcome: &TrendOutcome, series: &[f64], trend_spec: &TrendSpec) -> TrendContext {
        let _ = trend_spec;
        TrendContext {
            direction: format!("{:?}", outcome.direction).to_lowercase(),
            slope: outcome.slope,
            normalized_slope: outcome.normalized_slope,
            start_value: outcome.start,
            end_value: outcome.end,
            percentage_change: outcome.percentage_change.unwrap_or(0.0),
            data_points: series.len(),
            min_value: outcome.min,
            max_value: outcome.max,
            avg_value: outcome.avg,
            confidence: outcome.confidence,
            values: series.to_vec(),
        }
    }

    fn is_projection_request(&self, question: &str) -> bool {
        let lower = question.to_lowercase();
        PROJECTION_TERMS.iter().any(|t| lower.contains(t))
    }

    fn answer_projection(&self, raw_question: &str, resolved: &str, context: &TrendContext, session_id: &str) -> PipelineResponse {
        let _ = (raw_question, session_id);
        let periods_ahead = Self::extract_periods_ahead(resolved);
        let target_value = Self::extract_target_value(resolved);
        let outcome = project(context, periods_ahead, target_value);
        PipelineResponse {
            answer: format!(
                "Projected value {} period(s) ahead: {:.2} (confidence: {:?}).",
                periods_ahead, outcome.projected_value, outcome.confidence_level
            ),
            projection: Some(outcome),
            ..Default::default()
        }
    }

    fn extract_periods_ahead(question: &str) -> u32 {
        let re = Regex::new(r"next\s+(\d+)").unwrap();
        re.captures(&question.to_lowercase())
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(1)
    }

    fn extract_target_value(question: &str) -> Option<f64> {
        let re = Regex::new(r"(?:reach|hit|goal of)\s+([0-9][0-9,\.]*)").ok()?;
        let caps = re.captures(&question.to_lowercase())?;
        caps.get(1)?.as_str().replace(',', "").parse::<f64>().ok()
    }

    fn result_as_json(result: &TabularResult) -> Value {
        let rows: Vec<Value> = result
            .rows
            .iter()
            .map(|row| {
                let map: serde_json::Map<String, Value> =
                    result.columns.iter().zip(row.iter()).map(|(c, v)| (c.clone(), v.clone())).collect();
                Value::Object(map)
            })
            .collect();
        Value::Array(rows)
    }

    #[allow(clippy::too_many_arguments)]
    fn record_turn(
        &self,
        session_id: &str,
        raw_question: &str,
        entities: &ExtractedEntities,
        table: &str,
        result: &TabularResult,
        sql_statements: &[String],
        started: Instant,
        was_followup: bool,
        routing_confidence: f64,
    ) {
        let mut turn = ConversationTurn::new(raw_question, entities.clone());
        turn.resolved_question = entities.raw_question.clone();
        turn.table_used = Some(table.to_string());
        turn.filters_applied = entities.dimension_keywords.clone();
        turn.result_summary = format!("{} row(s)", result.rows.len());
        turn.sql = sql_statements.first().cloned();
        turn.wall_clock_ms = started.elapsed().as_millis() as u64;
        turn.was_followup = was_followup;
        turn.routing_confidence = routing_confidence;
        if let Some(row) = result.rows.first() {
            let map: std::collections::HashMap<String, Value> =
                result.columns.iter().cloned().zip(row.iter().cloned()).collect();
            turn.result_values = ConversationContext::extract_result_values(&map);
        }
        self.conversation.record_turn(session_id, turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::{CatalogError, ColumnInfo};
    use crate::services::llm::{IdentityTranslator, TemplatedExplainer};
    use async_trait::async_trait;

    struct StaticPlanner {
        plan: Value,
    }

    #[async_trait]
    impl Planner for StaticPlanner {
        async fn plan(&self, _question: &str, _table_schema_text: &str) -> LLMResult<Value> {
            LLMResult::Ok(self.plan.clone())
        }
    }

    /// A fixture catalog that always answers with the same single-row,
    /// single-column result, regardless of the SQL text - enough to drive
    /// the pipeline's happy path without a real engine behind it.
    struct FixtureCatalog {
        value: f64,
    }

    #[async_trait]
    impl SqlCatalog for FixtureCatalog {
        async fn list_tables(&self) -> Result<Vec<String>, CatalogError> {
            Ok(vec!["Sales".to_string()])
        }
        async fn describe(&self, _table: &str) -> Result<Vec<ColumnInfo>, CatalogError> {
            Ok(vec![ColumnInfo { name: "Sale_Amount".to_string(), column_type: "f64".to_string() }])
        }
        async fn query(&self, _sql: &str) -> Result<TabularResult, CatalogError> {
            Ok(TabularResult { columns: vec!["Sale_Amount_sum".to_string()], rows: vec![vec![serde_json::json!(self.value)]] })
        }
    }

    fn sales_profile() -> crate::models::TableProfile {
        let mut p = crate::models::TableProfile::empty("Sales");
        p.table_type = crate::models::TableType::Transactional;
        p.columns.insert(
            "Sale_Amount".to_string(),
            crate::models::ColumnProfile {
                name: "Sale_Amount".to_string(),
                role: crate::models::ColumnRole::Metric,
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

    fn make_pipeline(plan: Value) -> (QueryPipeline, ProfileStore) {
        let profile_store = ProfileStore::new("/tmp/pipeline-test-unused.json");
        profile_store.set("Sales", sales_profile());
        let router = TableRouter::new(profile_store.clone(), None, false);
        let pipeline = QueryPipeline::new(
            EntityExtractor::new(),
            ConversationContext::new(20),
            profile_store.clone(),
            router,
            Arc::new(StaticPlanner { plan }),
            Arc::new(FixtureCatalog { value: 5000.0 }),
            Arc::new(TemplatedExplainer),
            Arc::new(IdentityTranslator),
            3,
        );
        (pipeline, profile_store)
    }

    #[tokio::test]
    async fn greeting_short_circuits_before_any_planning() {
        let (pipeline, _store) = make_pipeline(serde_json::json!({}));
        let response = pipeline.handle("s1", "hello").await.unwrap();
        assert!(response.table_used.is_none());
        assert!(!response.answer.is_empty());
    }

    #[tokio::test]
    async fn schema_inquiry_lists_known_tables_without_planning() {
        let (pipeline, _store) = make_pipeline(serde_json::json!({}));
        let response = pipeline.handle("s1", "list all tables").await.unwrap();
        assert!(response.answer.contains("Sales"));
    }

    #[tokio::test]
    async fn metric_question_runs_the_full_pipeline() {
        let plan = serde_json::json!({
            "query_type": "metric",
            "table": "Sales",
            "metrics": ["Sale_Amount"],
            "aggregation_function": "SUM",
        });
        let (pipeline, _store) = make_pipeline(plan);
        let response = pipeline.handle("s1", "what were total sales").await.unwrap();
        assert_eq!(response.table_used, Some("Sales".to_string()));
        assert_eq!(response.sql.len(), 1);
    }

    #[test]
    fn extract_periods_ahead_reads_explicit_count() {
        assert_eq!(QueryPipeline::extract_periods_ahead("forecast the next 3 months"), 3);
        assert_eq!(QueryPipeline::extract_periods_ahead("forecast next month"), 1);
    }

    #[test]
    fn extract_target_value_reads_a_goal_figure() {
        assert_eq!(QueryPipeline::extract_target_value("when will we reach 1,00,000"), Some(100000.0));
        assert_eq!(QueryPipeline::extract_target_value("forecast next month"), None);
    }
}
