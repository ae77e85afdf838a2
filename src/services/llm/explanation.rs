//! Explanation collaborator (§6.2): receives the query result, plan, and
//! original question and returns prose. Not specified beyond the trait
//! shape, so a templated default keeps the crate buildable and testable
//! without a live model.

use crate::models::QueryPlan;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, question: &str, plan: &QueryPlan, result: &Value) -> String;
}

pub struct TemplatedExplainer;

#[async_trait]
impl Explainer for TemplatedExplainer {
    async fn explain(&self, question: &str, plan: &QueryPlan, result: &Value) -> String {
        let row_count = result.as_array().map(|rows| rows.len()).unwrap_or(0);
        format!(
            "Answering \"{question}\" against {} returned {row_count} row(s) ({:?}).",
            plan.table, plan.query_type
        )
    }
}
