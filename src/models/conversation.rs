//! Conversation turn and pending-clarification records (§3.4-3.5).

use super::entities::ExtractedEntities;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub original_question: String,
    pub resolved_question: String,
    pub entities: ExtractedEntities,
    pub table_used: Option<String>,
    pub filters_applied: Vec<String>,
    pub result_summary: String,
    pub sql: Option<String>,
    pub wall_clock_ms: u64,
    pub was_followup: bool,
    pub routing_confidence: f64,
    /// The "winning" dimensional row, keyed by column name, feeding anaphora
    /// resolution ("top category") in the next turn.
    pub result_values: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(original_question: impl Into<String>, entities: ExtractedEntities) -> Self {
        Self {
            original_question: original_question.into(),
            resolved_question: String::new(),
            entities,
            table_used: None,
            filters_applied: Vec::new(),
            result_summary: String::new(),
            sql: None,
            wall_clock_ms: 0,
            was_followup: false,
            routing_confidence: 0.0,
            result_values: HashMap::new(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingClarification {
    pub original_question: String,
    pub translated_question: String,
    pub candidates: Vec<String>,
    pub entities: ExtractedEntities,
    pub is_tamil: bool,
}
