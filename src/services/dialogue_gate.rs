//! C10: front classifier (§4.10), grounded in
//! `conversation/dialogue_manager.py`'s front-door routing.
//!
//! A priority-ordered cascade over the raw user text, evaluated in this
//! exact order: memory-intent, small-talk/off-topic/capability, schema
//! inquiry, date-context statement, pending clarification, data query. Each
//! branch short-circuits the rest of the pipeline - nothing after the first
//! match runs.

use crate::models::DateSpecific;
use crate::services::entity_extractor::EntityExtractor;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// "call me X" / "my name is X" - a side-effecting ack, never a query.
    MemoryIntent { reply: String, remembered_name: Option<String> },
    /// Matched one of the ~20 templated small-talk/off-topic/capability
    /// categories; the reply is final, nothing downstream runs.
    SmallTalk { category: &'static str, reply: String },
    /// "what is sheet 2" / "list all tables" - answered from the profile
    /// store directly, never compiled to SQL.
    SchemaInquiry,
    /// "today is November 14th" - a hint for subsequent queries, not itself
    /// a query.
    DateContext(DateSpecific),
    /// There is a pending clarification for this session; the caller should
    /// try `ConversationContext::match_pending_clarification` before falling
    /// through to a fresh data query.
    PendingClarification,
    /// Nothing upstream matched - route through the full pipeline.
    DataQuery,
}

/// One small-talk category: the pattern, a name for logging/telemetry, and
/// the templated reply.
struct SmallTalkCategory {
    pattern: &'static str,
    category: &'static str,
    reply: &'static str,
}

const SMALL_TALK_CATEGORIES: &[SmallTalkCategory] = &[
    SmallTalkCategory { pattern: r"(?i)^\s*(hi|hello|hey|hola|good morning|good afternoon|good evening)\b", category: "greeting", reply: "Hello! Ask me anything about your sales data." },
    SmallTalkCategory { pattern: r"(?i)^\s*(bye|goodbye|see you|good night|take care)\b", category: "farewell", reply: "Goodbye! Come back anytime you have a question about your data." },
    SmallTalkCategory { pattern: r"(?i)\b(thank you|thanks|thx|much appreciated)\b", category: "thanks", reply: "You're welcome!" },
    SmallTalkCategory { pattern: r"(?i)^\s*how are you\b", category: "how_are_you", reply: "I'm doing well, thanks for asking! What would you like to know about your data?" },
    SmallTalkCategory { pattern: r"(?i)^\s*what'?s up\b", category: "whats_up", reply: "Not much - ready to answer questions about your sales data." },
    SmallTalkCategory { pattern: r"(?i)^\s*(test|testing|ping|are you (there|online|working))\s*\.?\s*$", category: "mic_check", reply: "I'm here and ready." },
    SmallTalkCategory { pattern: r"(?i)\b(what can you do|what do you do|help me|how does this work|what are your capabilities)\b", category: "capability_query", reply: "I can answer questions about your sales data - totals, comparisons, trends, rankings, and more. Just ask in plain language." },
    SmallTalkCategory { pattern: r"(?i)\b(who are you|what are you|what is your name)\b", category: "identity_query", reply: "I'm your analytics assistant - I answer questions about the data you've loaded." },
    SmallTalkCategory { pattern: r"(?i)\btell me a joke\b", category: "joke_request", reply: "I'm better with numbers than punchlines, but I'll give your data a shot at being funny." },
    SmallTalkCategory { pattern: r"(?i)\b(good job|nice|well done|great work|you'?re (great|awesome|smart))\b", category: "compliment", reply: "Thank you! Let me know what else you'd like to look at." },
    SmallTalkCategory { pattern: r"(?i)^\s*(ok|okay|alright|sure|got it|cool)\s*\.?\s*$", category: "affirmation", reply: "Great - let me know what you'd like to ask." },
    SmallTalkCategory { pattern: r"(?i)^\s*(no|nope|not really)\s*\.?\s*$", category: "negation", reply: "No problem - ask whenever you're ready." },
    SmallTalkCategory { pattern: r"(?i)\b(sorry|my bad|apologies)\b", category: "apology", reply: "No worries at all." },
    SmallTalkCategory { pattern: r"(?i)\bhelp\b\s*$", category: "help_request", reply: "Ask me things like \"what were total sales in September\" or \"compare August and December revenue\"." },
    SmallTalkCategory { pattern: r"(?i)\b(weather|how'?s the weather)\b", category: "weather_small_talk", reply: "I don't have weather data, but I can tell you about your sales." },
    SmallTalkCategory { pattern: r"(?i)\b(are you (a )?(bot|ai|robot|human))\b", category: "bot_nature_query", reply: "I'm an AI assistant built to answer questions about your data." },
    SmallTalkCategory { pattern: r"(?i)\b(can you (sing|dance|cook|drive))\b", category: "off_topic_capability", reply: "Not quite my specialty - I'm focused on your sales data." },
    SmallTalkCategory { pattern: r"(?i)\b(love you|marry me)\b", category: "off_topic_affection", reply: "That's kind, but let's keep things to your data for now." },
    SmallTalkCategory { pattern: r"(?i)\b(stock market|bitcoin|politics|news today)\b", category: "off_topic_general", reply: "That's outside what I can help with - I'm focused on your sales data." },
    SmallTalkCategory { pattern: r"(?i)^\s*(why|how) (is|are) (you|this)\b", category: "off_topic_philosophical", reply: "I'll leave that one to the philosophers - ask me about your data instead." },
];

pub struct DialogueGate {
    memory_intent_re: Regex,
    schema_inquiry_re: Regex,
    date_context_re: Regex,
    small_talk: Vec<(Regex, &'static str, &'static str)>,
}

impl Default for DialogueGate {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogueGate {
    pub fn new() -> Self {
        let small_talk = SMALL_TALK_CATEGORIES
            .iter()
            .map(|c| (Regex::new(c.pattern).expect("small-talk pattern must compile"), c.category, c.reply))
            .collect();

        Self {
            memory_intent_re: Regex::new(r#"(?i)\b(?:call me|my name is|i am|i'm)\s+([A-Za-z][A-Za-z '\-]{0,40})"#)
                .expect("memory-intent pattern must compile"),
            schema_inquiry_re: Regex::new(
                r"(?i)\b(what (is|are) (sheet|table)|list (all )?tables|show (me )?(the )?tables|which tables|what tables)\b",
            )
            .expect("schema-inquiry pattern must compile"),
            date_context_re: Regex::new(r"(?i)^\s*today is\b").expect("date-context pattern must compile"),
            small_talk,
        }
    }

    /// Runs the full priority cascade. `has_pending_clarification` reflects
    /// whether the caller's `ConversationContext` currently holds a pending
    /// clarification for this session; the gate itself is stateless.
    pub fn classify(&self, question: &str, has_pending_clarification: bool, extractor: &EntityExtractor) -> GateOutcome {
        let trimmed = question.trim();

        if let Some(caps) = self.memory_intent_re.captures(trimmed) {
            let name = caps.get(1).map(|m| m.as_str().trim().to_string()).filter(|n| !n.is_empty());
            let reply = match &name {
                Some(name) => format!("Got it, I'll remember that as {name}."),
                None => "Got it.".to_string(),
            };
            return GateOutcome::MemoryIntent { reply, remembered_name: name };
        }

        if let Some((_, category, reply)) = self.small_talk.iter().find(|(re, _, _)| re.is_match(trimmed)) {
            return GateOutcome::SmallTalk { category, reply: reply.to_string() };
        }

        if self.schema_inquiry_re.is_match(trimmed) {
            return GateOutcome::SchemaInquiry;
        }

        if self.date_context_re.is_match(trimmed) {
            let entities = extractor.extract(trimmed);
            if let Some(date_specific) = entities.date_specific {
                return GateOutcome::DateContext(date_specific);
            }
            return GateOutcome::DateContext(DateSpecific { day: None, month: None, year: None, raw: trimmed.to_string() });
        }

        if has_pending_clarification {
            return GateOutcome::PendingClarification;
        }

        GateOutcome::DataQuery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_short_circuits_as_small_talk() {
        let gate = DialogueGate::new();
        let extractor = EntityExtractor::new();
        let outcome = gate.classify("Hello there", false, &extractor);
        assert!(matches!(outcome, GateOutcome::SmallTalk { category: "greeting", .. }));
    }

    #[test]
    fn memory_intent_captures_the_name() {
        let gate = DialogueGate::new();
        let extractor = EntityExtractor::new();
        let outcome = gate.classify("call me Ravi", false, &extractor);
        match outcome {
            GateOutcome::MemoryIntent { remembered_name, .. } => assert_eq!(remembered_name, Some("Ravi".to_string())),
            other => panic!("expected MemoryIntent, got {other:?}"),
        }
    }

    #[test]
    fn schema_inquiry_is_detected_before_data_query_fallthrough() {
        let gate = DialogueGate::new();
        let extractor = EntityExtractor::new();
        let outcome = gate.classify("list all tables", false, &extractor);
        assert_eq!(outcome, GateOutcome::SchemaInquiry);
    }

    #[test]
    fn date_context_statement_is_not_treated_as_a_query() {
        let gate = DialogueGate::new();
        let extractor = EntityExtractor::new();
        let outcome = gate.classify("today is November 14th", false, &extractor);
        assert!(matches!(outcome, GateOutcome::DateContext(_)));
    }

    #[test]
    fn pending_clarification_flag_wins_over_plain_data_query_text() {
        let gate = DialogueGate::new();
        let extractor = EntityExtractor::new();
        let outcome = gate.classify("the second one", true, &extractor);
        assert_eq!(outcome, GateOutcome::PendingClarification);
    }

    #[test]
    fn ordinary_question_falls_through_to_data_query() {
        let gate = DialogueGate::new();
        let extractor = EntityExtractor::new();
        let outcome = gate.classify("what were total sales in September", false, &extractor);
        assert_eq!(outcome, GateOutcome::DataQuery);
    }
}
