//! Typed error taxonomy for the query pipeline (§7), in the numbered
//! `ApiError`-style this codebase's sibling services use.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// One entry in a query healer's attempt log, surfaced to the user on
/// terminal failure for postmortem.
#[derive(Debug, Clone, Serialize)]
pub struct HealingAttemptRecord {
    pub attempt: u32,
    pub sql: String,
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("the question was empty or unparseable")]
    InvalidInput,

    #[error("this kind of question isn't supported yet")]
    UnsupportedQuery { detail: String },

    #[error("multiple tables could answer this")]
    RoutingAmbiguous { candidates: Vec<String>, question: String },

    #[error("couldn't find a table for this question")]
    RoutingFailed { question: String },

    #[error("the generated query plan was invalid: {detail}")]
    PlanInvalid { detail: String },

    #[error("the query failed after retries")]
    SqlExecutionFailed { sql: String, attempts: Vec<HealingAttemptRecord> },

    #[error("timed out waiting for {what}")]
    Timeout { what: String },

    #[error("no data found for this question")]
    DataEmpty { missing_entity: Option<String> },
}

impl QueryError {
    pub fn code(&self) -> u32 {
        match self {
            QueryError::InvalidInput => 4000,
            QueryError::UnsupportedQuery { .. } => 4001,
            QueryError::RoutingAmbiguous { .. } => 2001,
            QueryError::RoutingFailed { .. } => 4002,
            QueryError::PlanInvalid { .. } => 4003,
            QueryError::SqlExecutionFailed { .. } => 2002,
            QueryError::Timeout { .. } => 5001,
            QueryError::DataEmpty { .. } => 2003,
        }
    }

    /// User-visible apology/clarification message per §7's three failure modes.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::InvalidInput => {
                "I didn't catch a question there - could you rephrase it?".to_string()
            },
            QueryError::UnsupportedQuery { detail } => {
                format!("I can't answer that kind of question yet: {detail}")
            },
            QueryError::RoutingAmbiguous { candidates, .. } => {
                format!("I found a few tables that could answer this: {}. Which one did you mean?", candidates.join(", "))
            },
            QueryError::RoutingFailed { .. } => {
                "I couldn't find a table that matches this question. Could you mention which sheet or table you mean?".to_string()
            },
            QueryError::PlanInvalid { detail } => {
                format!("I had trouble planning that query: {detail}")
            },
            QueryError::SqlExecutionFailed { .. } => {
                "I tried a few ways to run this query but none of them worked.".to_string()
            },
            QueryError::Timeout { what } => format!("That took too long ({what}); please try again."),
            QueryError::DataEmpty { missing_entity: Some(entity) } => {
                format!("No data found; I don't have data for {entity}.")
            },
            QueryError::DataEmpty { missing_entity: None } => {
                "No data found for this question; try asking something else.".to_string()
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    code: u32,
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    candidates: Vec<String>,
}

impl QueryError {
    fn kind_name(&self) -> &'static str {
        match self {
            QueryError::InvalidInput => "invalid_input",
            QueryError::UnsupportedQuery { .. } => "unsupported_query",
            QueryError::RoutingAmbiguous { .. } => "routing_ambiguous",
            QueryError::RoutingFailed { .. } => "routing_failed",
            QueryError::PlanInvalid { .. } => "plan_invalid",
            QueryError::SqlExecutionFailed { .. } => "sql_execution_failed",
            QueryError::Timeout { .. } => "timeout",
            QueryError::DataEmpty { .. } => "data_empty",
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        // routing_ambiguous / data_empty / sql_execution_failed are expected
        // conversational outcomes, not HTTP failures - they render 200 OK with
        // a structured payload the client renders as a clarification/apology.
        let status = match &self {
            QueryError::RoutingAmbiguous { .. }
            | QueryError::DataEmpty { .. }
            | QueryError::SqlExecutionFailed { .. } => StatusCode::OK,
            QueryError::InvalidInput | QueryError::UnsupportedQuery { .. } => {
                StatusCode::BAD_REQUEST
            },
            QueryError::PlanInvalid { .. } | QueryError::RoutingFailed { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            },
            QueryError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        };

        let candidates = match &self {
            QueryError::RoutingAmbiguous { candidates, .. } => candidates.clone(),
            _ => Vec::new(),
        };

        let payload = ErrorPayload {
            code: self.code(),
            kind: self.kind_name(),
            message: self.user_message(),
            candidates,
        };

        (status, axum::Json(payload)).into_response()
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
