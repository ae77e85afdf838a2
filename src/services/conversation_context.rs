//! C9: per-session conversation state (§4.9), grounded loosely in
//! `utils/query_context.py` (the closest analogue in the retrieval pack -
//! no single matching `conversation_manager.py` file exists there).
//!
//! A bounded ring of the last 20 turns per session, a pending-clarification
//! slot, and the merge/follow-up/result-extraction rules that bind turns
//! together into a conversation instead of a sequence of isolated queries.

use crate::models::{ConversationTurn, DateSpecific, ExtractedEntities, PendingClarification};
use crate::services::entity_extractor::EntityExtractor;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

struct SessionState {
    turns: VecDeque<ConversationTurn>,
    pending: Option<PendingClarification>,
    date_hint: Option<DateSpecific>,
}

impl SessionState {
    fn new() -> Self {
        Self { turns: VecDeque::new(), pending: None, date_hint: None }
    }
}

pub struct ConversationContext {
    sessions: Arc<DashMap<String, SessionState>>,
    max_turns: usize,
}

impl ConversationContext {
    pub fn new(max_turns: usize) -> Self {
        Self { sessions: Arc::new(DashMap::new()), max_turns }
    }

    /// `active_table`/`active_entities` mirror the most recent turn (§4.9).
    pub fn active_table(&self, session_id: &str) -> Option<String> {
        self.sessions.get(session_id)?.turns.back()?.table_used.clone()
    }

    pub fn active_entities(&self, session_id: &str) -> Option<ExtractedEntities> {
        Some(self.sessions.get(session_id)?.turns.back()?.entities.clone())
    }

    pub fn has_previous_context(&self, session_id: &str) -> bool {
        self.sessions.get(session_id).map(|s| !s.turns.is_empty()).unwrap_or(false)
    }

    /// Pushes a turn onto the session's ring, evicting the oldest once the
    /// 20-turn cap (§4.9) is exceeded.
    pub fn record_turn(&self, session_id: &str, turn: ConversationTurn) {
        let mut state = self.sessions.entry(session_id.to_string()).or_insert_with(SessionState::new);
        state.turns.push_back(turn);
        while state.turns.len() > self.max_turns {
            state.turns.pop_front();
        }
    }

    /// §4.9's ordering fix delegates straight to the extractor's corrected
    /// `is_followup_question`, which already checks Tamil data-query
    /// keywords before any length-based heuristic.
    pub fn is_followup_question(&self, session_id: &str, question: &str, extractor: &EntityExtractor) -> bool {
        extractor.is_followup_question(question, self.has_previous_context(session_id))
    }

    pub fn merge_entities(&self, session_id: &str, new_entities: ExtractedEntities) -> ExtractedEntities {
        match self.active_entities(session_id) {
            Some(previous) => new_entities.merge_with_previous(&previous),
            None => new_entities,
        }
    }

    pub fn set_pending_clarification(&self, session_id: &str, pending: PendingClarification) {
        let mut state = self.sessions.entry(session_id.to_string()).or_insert_with(SessionState::new);
        state.pending = Some(pending);
    }

    pub fn pending_clarification(&self, session_id: &str) -> Option<PendingClarification> {
        self.sessions.get(session_id)?.pending.clone()
    }

    pub fn clear_pending_clarification(&self, session_id: &str) {
        if let Some(mut state) = self.sessions.get_mut(session_id) {
            state.pending = None;
        }
    }

    /// §4.10's date-context branch: "today is November 14th" is stored here
    /// rather than treated as a query, and consulted by later turns in the
    /// same session that omit an explicit date.
    pub fn set_date_hint(&self, session_id: &str, hint: DateSpecific) {
        let mut state = self.sessions.entry(session_id.to_string()).or_insert_with(SessionState::new);
        state.date_hint = Some(hint);
    }

    pub fn date_hint(&self, session_id: &str) -> Option<DateSpecific> {
        self.sessions.get(session_id)?.date_hint.clone()
    }

    /// §4.9 pending-clarification matching cascade: direct number, ordinal,
    /// table-name substring, then token-overlap. Returns the index into
    /// `candidates` the reply resolved to, or `None` if nothing matched (in
    /// which case the caller should treat the turn as fresh, not clarified).
    pub fn match_pending_clarification(candidates: &[String], reply: &str) -> Option<usize> {
        let lower = reply.trim().to_lowercase();

        if let Ok(n) = lower.parse::<usize>()
            && n >= 1
            && n <= candidates.len()
        {
            return Some(n - 1);
        }

        const ORDINALS: &[(&str, usize)] = &[
            ("first", 0), ("முதல்", 0),
            ("second", 1), ("இரண்டாவது", 1),
            ("third", 2), ("மூன்றாவது", 2),
            ("fourth", 3), ("fifth", 4),
        ];
        for (word, idx) in ORDINALS {
            if lower.contains(word) && *idx < candidates.len() {
                return Some(*idx);
            }
        }

        if let Some((idx, _)) = candidates.iter().enumerate().find(|(_, c)| c.to_lowercase().contains(&lower) || lower.contains(&c.to_lowercase())) {
            return Some(idx);
        }

        let reply_tokens: Vec<String> = Self::expand_tokens(&lower);
        let mut best: Option<(usize, usize)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let candidate_tokens = Self::expand_tokens(&candidate.to_lowercase());
            let overlap = reply_tokens.iter().filter(|t| candidate_tokens.contains(*t)).count();
            if overlap > 0 && best.map(|(_, best_overlap)| overlap > best_overlap).unwrap_or(true) {
                best = Some((idx, overlap));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Token expansion used by the overlap matcher: splits on non-alphanumerics
    /// and adds common month abbreviations so "sept" matches "September".
    fn expand_tokens(text: &str) -> Vec<String> {
        const MONTH_ABBREVIATIONS: &[(&str, &str)] = &[
            ("jan", "january"), ("feb", "february"), ("mar", "march"), ("apr", "april"),
            ("jun", "june"), ("jul", "july"), ("aug", "august"), ("sep", "september"),
            ("sept", "september"), ("oct", "october"), ("nov", "november"), ("dec", "december"),
        ];
        let mut tokens: Vec<String> =
            text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(|t| t.to_string()).collect();
        let expanded: Vec<String> = tokens
            .iter()
            .filter_map(|t| MONTH_ABBREVIATIONS.iter().find(|(abbr, _)| abbr == t).map(|(_, full)| full.to_string()))
            .collect();
        tokens.extend(expanded);
        tokens
    }

    /// §4.9 result extraction: after a rank/extrema_lookup/filter/lookup
    /// query, stash the winning row's columns so "the top one" resolves in
    /// the next turn.
    pub fn extract_result_values(row: &HashMap<String, Value>) -> HashMap<String, String> {
        row.iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k.clone(), rendered)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractedEntities;

    fn turn(table: &str) -> ConversationTurn {
        let mut entities = ExtractedEntities::default();
        entities.month = Some("September".to_string());
        let mut t = ConversationTurn::new("what were sales", entities);
        t.table_used = Some(table.to_string());
        t
    }

    #[test]
    fn ring_evicts_oldest_turn_past_the_cap() {
        let ctx = ConversationContext::new(2);
        ctx.record_turn("s1", turn("A"));
        ctx.record_turn("s1", turn("B"));
        ctx.record_turn("s1", turn("C"));
        assert_eq!(ctx.active_table("s1"), Some("C".to_string()));
    }

    #[test]
    fn merge_entities_inherits_from_previous_turn() {
        let ctx = ConversationContext::new(20);
        ctx.record_turn("s1", turn("Sales"));
        let mut new_entities = ExtractedEntities::default();
        new_entities.location = Some("Chennai".to_string());
        let merged = ctx.merge_entities("s1", new_entities);
        assert_eq!(merged.month, Some("September".to_string()));
        assert_eq!(merged.location, Some("Chennai".to_string()));
    }

    #[test]
    fn ordinal_reply_selects_first_candidate() {
        let candidates = vec!["Pincode_Sales_Table".to_string(), "September_Detailed_Breakdown".to_string()];
        let idx = ConversationContext::match_pending_clarification(&candidates, "first one");
        assert_eq!(idx, Some(0));
    }

    #[test]
    fn numeric_reply_is_one_indexed() {
        let candidates = vec!["A".to_string(), "B".to_string()];
        assert_eq!(ConversationContext::match_pending_clarification(&candidates, "2"), Some(1));
    }

    #[test]
    fn unrelated_reply_does_not_match() {
        let candidates = vec!["Pincode_Sales_Table".to_string(), "Category_Breakdown".to_string()];
        assert_eq!(ConversationContext::match_pending_clarification(&candidates, "xyz unrelated"), None);
    }

    #[test]
    fn no_prior_turns_means_no_followup_question() {
        let ctx = ConversationContext::new(20);
        let extractor = EntityExtractor::new();
        assert!(!ctx.is_followup_question("fresh-session", "Chennai", &extractor));
    }
}
