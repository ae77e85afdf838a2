//! C2: deterministic regex/lexicon entity extraction (§4.2), grounded in
//! `planning_layer/entity_extractor.py`. No external call of any kind -
//! every field here is derived purely from the question text and whatever
//! has been learned from table profiles via [`EntityExtractor::refresh_from_profiles`].

use crate::models::{DateSpecific, ExtractedEntities, TableProfile};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

const MONTHS: &[(&str, u32)] = &[
    ("january", 1), ("jan", 1),
    ("february", 2), ("feb", 2),
    ("march", 3), ("mar", 3),
    ("april", 4), ("apr", 4),
    ("may", 5),
    ("june", 6), ("jun", 6),
    ("july", 7), ("jul", 7),
    ("august", 8), ("aug", 8),
    ("september", 9), ("sep", 9), ("sept", 9),
    ("october", 10), ("oct", 10),
    ("november", 11), ("nov", 11),
    ("december", 12), ("dec", 12),
    ("ஜனவரி", 1), ("பிப்ரவரி", 2), ("மார்ச்", 3), ("ஏப்ரல்", 4), ("மே", 5),
    ("ஜூன்", 6), ("ஜூலை", 7), ("ஆகஸ்ட்", 8), ("செப்டம்பர்", 9), ("அக்டோபர்", 10),
    ("நவம்பர்", 11), ("டிசம்பர்", 12),
];

const MONTH_FULL_NAMES: &[&str] = &[
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

const TAMIL_NUMBERS: &[(&str, u32)] = &[
    ("ஒன்று", 1), ("இரண்டு", 2), ("மூன்று", 3), ("நான்கு", 4), ("ஐந்து", 5),
    ("ஆறு", 6), ("ஏழு", 7), ("எட்டு", 8), ("ஒன்பது", 9), ("பத்து", 10),
    ("ஒன்றாம்", 1), ("இரண்டாம்", 2), ("மூன்றாம்", 3), ("நான்காம்", 4), ("ஐந்தாம்", 5),
    ("இருபத்தி நான்கு", 24), ("இருபத்தி நான்காம்", 24),
];

const TAMIL_DATE_KEYWORDS: &[&str] = &["தேதி", "நாள்", "தினம்"];

/// Tamil data-query keywords, checked before any word-count follow-up
/// heuristic so a short Tamil data query is never misclassified as a
/// follow-up (§4.9's ordering fix - the original applies length first).
const TAMIL_DATA_QUERY_KEYWORDS: &[&str] =
    &["விற்பனை", "லாபம்", "மொத்தம்", "வருவாய்", "எத்தனை", "எவ்வளவு"];

const METRICS: &[&str] = &[
    "gross sales", "net sales", "total sales",
    "gross profit", "net profit",
    "order count", "average order value",
    "sales", "revenue", "profit", "margin",
    "orders", "transactions",
    "quantity", "units", "items sold", "items",
    "aov", "shipping", "tax", "gst", "subtotal",
    "discount", "cost", "expense",
];

const METRIC_EXCLUSIONS: &[&str] = &[
    "sales", "revenue", "profit", "cost", "expense", "margin", "orders", "transactions",
    "quantity", "units", "items", "discount", "tax", "gst", "subtotal", "shipping", "aov",
    "total", "average", "count", "sum", "net", "gross",
];

const DEFAULT_LOCATIONS: &[&str] = &[
    "chennai", "bangalore", "mumbai", "delhi", "hyderabad", "velachery", "adyar", "koyambedu",
    "anna nagar", "chromepet", "tambaram", "porur", "t nagar", "mylapore", "tamil nadu",
    "karnataka", "kerala", "andhra pradesh", "telangana", "maharashtra",
];

const DEFAULT_CATEGORIES: &[&str] = &[
    "orders", "products", "customers", "dairy", "beverages", "groceries", "snacks", "frozen",
    "fruits", "vegetables", "organic", "premium", "bakery", "meat", "seafood", "pantry",
];

const COMPARISON_TERMS: &[&str] =
    &["compare", "versus", "vs", "compared to", "difference", "against", "between", "relative to"];

const CROSS_TABLE_TERMS: &[&str] = &[
    "across all", "all months", "all time", "overall", "grand total", "entire", "whole",
    "complete", "combined", "aggregate", "year to date", "ytd", "month to date", "mtd",
    "month over month", "year over year", "yoy", "mom", "throughout", "over time",
    "across months", "across periods", "total for", "sum of all", "everything", "all data",
];

const DIMENSION_KEYWORDS: &[&str] = &[
    "area", "zone", "region", "pincode", "zip", "shipping", "city", "state", "district",
    "branch", "location", "category", "type", "product", "item", "customer", "segment",
];

const TREND_ANALYSIS_TERMS: &[&str] = &[
    "trend", "trends", "trending", "pattern", "patterns", "how does", "how did", "how has",
    "how is", "change over", "changes over", "changed over", "observed", "can be observed",
    "movement", "direction", "going up", "going down", "increasing", "decreasing", "growing",
    "declining", "fluctuation", "variation", "volatility", "போக்கு", "மாற்றம்",
];

const SUMMARY_TERMS: &[&str] = &[
    "summary", "summarize", "summarise", "overview", "high-level", "high level",
    "overall picture", "big picture", "snapshot", "business summary", "executive summary",
    "key insights", "main points", "highlights", "takeaways", "key findings", "at a glance",
    "சுருக்கம்", "முக்கிய அம்சங்கள்",
];

const IMPACT_ANALYSIS_TERMS: &[&str] = &[
    "affects", "affect", "affecting", "affected", "impacts", "impact", "impacting", "impacted",
    "influences", "influence", "influencing", "factor", "factors", "driver", "drivers",
    "correlate", "correlation", "relationship", "depends on", "dependent on", "related to",
    "contributes to", "contribution", "effect on", "what causes", "why is", "reason for",
    "பாதிக்கிறது", "காரணம்",
];

const ENGLISH_FOLLOWUP_PHRASES: &[&str] = &[
    "how about", "what about", "and for", "also for", "same for", "now for", "compare to",
    "versus", "and what", "now show", "also show", "but for", "instead of", "rather than",
    "as opposed to", "same day", "same date", "that day", "that date",
];

const PROJECTION_FOLLOWUP_PHRASES: &[&str] = &[
    "if this", "if the", "if it", "if they", "continues", "continue", "expected", "predict",
    "projection", "forecast", "trend", "pattern", "next month", "next quarter", "next week",
    "going forward", "based on this", "given this", "the top", "the bottom", "the highest",
    "the lowest", "that category", "this category", "these categories", "the best", "the worst",
    "the same",
];

const TAMIL_FOLLOWUP_PHRASES: &[&str] = &[
    "அதே நாள்", "அதே தேதி", "அந்த நாள்", "எப்படி", "என்ன பற்றி", "தொடர்ந்தால்", "அடுத்த",
    "எதிர்பார்க்கப்படும்",
];

fn word_boundary_contains(text: &str, term: &str) -> bool {
    if term.chars().any(|c| !c.is_ascii()) {
        return text.contains(term);
    }
    let pattern = format!(r"\b{}\b", regex::escape(term));
    Regex::new(&pattern).map(|re| re.is_match(text)).unwrap_or(false)
}

#[derive(Default)]
struct LearnedEntities {
    locations: HashSet<String>,
    categories: HashSet<String>,
    products: HashSet<String>,
    custom: HashMap<String, HashSet<String>>,
}

pub struct EntityExtractor {
    learned: RwLock<LearnedEntities>,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self { learned: RwLock::new(LearnedEntities::default()) }
    }

    /// Dynamic learning layer: walks every dimension column's sample
    /// values after a profile rebuild, classifying columns as location-,
    /// category-, product-, or custom-dimension-like by name, and takes
    /// precedence over the static fallback lexicons (§4.2 layer 2).
    pub fn refresh_from_profiles(&self, profiles: &HashMap<String, TableProfile>) {
        let mut learned = LearnedEntities::default();

        const LOCATION_PATTERNS: &[&str] =
            &["city", "location", "region", "area", "state", "district", "zone", "branch"];
        const CATEGORY_PATTERNS: &[&str] = &["category", "type", "group", "class", "segment", "department"];
        const PRODUCT_PATTERNS: &[&str] = &["product", "item", "name", "sku", "description"];

        for profile in profiles.values() {
            for (col_name, column) in &profile.columns {
                if column.sample_values.is_empty() || column.sample_values.len() > 500 {
                    continue;
                }
                let lower = col_name.to_lowercase();
                let values: Vec<String> =
                    column.sample_values.iter().filter(|v| v.len() > 1).map(|v| v.to_lowercase()).collect();

                if LOCATION_PATTERNS.iter().any(|p| lower.contains(p)) {
                    learned.locations.extend(values);
                } else if CATEGORY_PATTERNS.iter().any(|p| lower.contains(p)) {
                    learned.categories.extend(values);
                } else if PRODUCT_PATTERNS.iter().any(|p| lower.contains(p)) {
                    learned.products.extend(values);
                } else if column.is_dimension() {
                    let key = lower.replace(' ', "_");
                    learned.custom.entry(key).or_default().extend(values);
                }
            }
        }

        *self.learned.write().expect("learned-entities lock poisoned") = learned;
    }

    fn locations(&self) -> Vec<String> {
        let learned = self.learned.read().expect("learned-entities lock poisoned");
        if !learned.locations.is_empty() {
            learned.locations.iter().cloned().collect()
        } else {
            DEFAULT_LOCATIONS.iter().map(|s| s.to_string()).collect()
        }
    }

    fn categories(&self) -> Vec<String> {
        let learned = self.learned.read().expect("learned-entities lock poisoned");
        if !learned.categories.is_empty() {
            learned.categories.iter().cloned().collect()
        } else {
            DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
        }
    }

    pub fn extract(&self, question: &str) -> ExtractedEntities {
        let q_lower = question.to_lowercase();

        let mut entities = ExtractedEntities {
            month: self.extract_month(&q_lower),
            all_months: self.extract_all_months(&q_lower),
            metric: Self::extract_metric(&q_lower),
            category: self.extract_category(&q_lower, question),
            location: self.extract_location(&q_lower),
            aggregation: Self::extract_aggregation(&q_lower),
            comparison: Self::is_comparison(&q_lower),
            multi_month_comparison: false,
            cross_table_intent: Self::is_cross_table_query(&q_lower),
            dimension_keywords: Self::extract_dimension_keywords(&q_lower),
            time_period: Self::extract_time_period(&q_lower),
            explicit_table: Self::extract_explicit_table(question),
            date_specific: Self::extract_specific_date(&q_lower),
            custom_entities: self.extract_custom_entities(&q_lower),
            trend_intent: TREND_ANALYSIS_TERMS.iter().any(|t| q_lower.contains(t)),
            summary_intent: SUMMARY_TERMS.iter().any(|t| q_lower.contains(t)),
            impact_intent: IMPACT_ANALYSIS_TERMS.iter().any(|t| q_lower.contains(t)),
            multi_domain_query: Self::detect_multi_domain_query(&q_lower),
            raw_question: question.to_string(),
        };
        entities.recompute_multi_month_comparison();
        entities
    }

    fn extract_month(&self, text: &str) -> Option<String> {
        for (name, num) in MONTHS {
            if word_boundary_contains(text, name) {
                return Some(MONTH_FULL_NAMES[(*num - 1) as usize].to_string());
            }
        }
        if text.contains("last month") {
            let now = chrono::Utc::now();
            let last = if now.month() == 1 { 12 } else { now.month() - 1 };
            return Some(MONTH_FULL_NAMES[(last - 1) as usize].to_string());
        }
        if text.contains("this month") {
            let now = chrono::Utc::now();
            return Some(MONTH_FULL_NAMES[(now.month() - 1) as usize].to_string());
        }
        None
    }

    /// Handles hyphens/connectors: "september-october" -> both (§4.2).
    fn extract_all_months(&self, text: &str) -> Vec<String> {
        let normalized = text.replace(['-', '/'], " ");
        let mut found = Vec::new();
        for (name, num) in MONTHS {
            if word_boundary_contains(&normalized, name) {
                let full = MONTH_FULL_NAMES[(*num - 1) as usize].to_string();
                if !found.contains(&full) {
                    found.push(full);
                }
            }
        }
        found
    }

    fn extract_metric(text: &str) -> Option<String> {
        METRICS.iter().find(|m| text.contains(**m)).map(|m| m.to_string())
    }

    /// Category precedence: longer match first, then earlier position
    /// (§4.2). A hard deny-list excludes metric words even if the dynamic
    /// learner absorbed them, so "sales" is never returned as a category.
    fn extract_category(&self, text_lower: &str, original: &str) -> Option<String> {
        if let Some(start) = original.find('"') {
            let rest = &original[start + 1..];
            if let Some(end) = rest.find('"') {
                return Some(rest[..end].to_string());
            }
        }
        if let Some(start) = original.find('\'') {
            let rest = &original[start + 1..];
            if let Some(end) = rest.find('\'') {
                return Some(rest[..end].to_string());
            }
        }

        let mut matches: Vec<(String, usize, usize)> = Vec::new();
        for cat in self.categories() {
            if METRIC_EXCLUSIONS.contains(&cat.as_str()) {
                continue;
            }
            if let Some(pos) = Self::word_boundary_position(text_lower, &cat) {
                matches.push((cat.clone(), cat.len(), pos));
            }
        }
        matches.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        matches.first().map(|(cat, _, _)| Self::title_case(cat))
    }

    fn word_boundary_position(text: &str, term: &str) -> Option<usize> {
        let pattern = format!(r"\b{}\b", regex::escape(term));
        Regex::new(&pattern).ok()?.find(text).map(|m| m.start())
    }

    fn title_case(s: &str) -> String {
        s.split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Exact match first; "Chennai" prefix-matches a learned "Chennai Main"
    /// (§4.2, and §4.2's fuzzy-prefix note).
    fn extract_location(&self, text_lower: &str) -> Option<String> {
        let locations = self.locations();
        for loc in &locations {
            if word_boundary_contains(text_lower, loc) {
                return Some(Self::title_case(loc));
            }
        }

        const COMMON_CITIES: &[&str] = &[
            "chennai", "bangalore", "mumbai", "delhi", "hyderabad", "pune", "kolkata",
            "ahmedabad", "jaipur", "lucknow", "coimbatore", "madurai",
        ];
        for city in COMMON_CITIES {
            if text_lower.contains(city) {
                if let Some(full) = locations.iter().find(|l| l.starts_with(city)) {
                    return Some(Self::title_case(full));
                }
                return Some(Self::title_case(city));
            }
        }

        let learned = self.learned.read().expect("learned-entities lock poisoned");
        const LOCATION_ENTITY_TYPES: &[&str] = &["area_name", "area", "location", "city", "zone", "region"];
        for entity_type in LOCATION_ENTITY_TYPES {
            if let Some(values) = learned.custom.get(*entity_type) {
                for val in values {
                    if word_boundary_contains(text_lower, val) {
                        return Some(Self::title_case(val));
                    }
                }
            }
        }
        None
    }

    fn extract_aggregation(text: &str) -> String {
        const TERMS: &[(&str, &[&str])] = &[
            ("SUM", &["total", "sum", "overall", "combined", "aggregate", "all"]),
            ("AVG", &["average", "avg", "mean", "typical"]),
            ("MAX", &["maximum", "max", "highest", "best", "top", "peak"]),
            ("MIN", &["minimum", "min", "lowest", "worst", "bottom"]),
            ("COUNT", &["count", "how many", "number of", "total number"]),
        ];
        for (agg, keywords) in TERMS {
            if keywords.iter().any(|k| text.contains(k)) {
                return agg.to_string();
            }
        }
        "SUM".to_string()
    }

    fn is_comparison(text: &str) -> bool {
        COMPARISON_TERMS.iter().any(|t| text.contains(t))
    }

    fn is_cross_table_query(text: &str) -> bool {
        CROSS_TABLE_TERMS.iter().any(|t| text.contains(t))
    }

    fn extract_dimension_keywords(text: &str) -> Vec<String> {
        DIMENSION_KEYWORDS.iter().filter(|k| word_boundary_contains(text, k)).map(|k| k.to_string()).collect()
    }

    fn extract_time_period(text: &str) -> Option<String> {
        if let Some(caps) = Regex::new(r"top\s+(\d+)").unwrap().captures(text) {
            return Some(format!("top_{}", &caps[1]));
        }
        if let Some(caps) = Regex::new(r"bottom\s+(\d+)").unwrap().captures(text) {
            return Some(format!("bottom_{}", &caps[1]));
        }
        if let Some(caps) = Regex::new(r"last\s+(\d+)\s*(days?|weeks?|months?)").unwrap().captures(text) {
            return Some(format!("last_{}_{}", &caps[1], &caps[2]));
        }
        const SPELLED: &[(&str, &str)] = &[
            ("one", "1"), ("two", "2"), ("three", "3"), ("four", "4"), ("five", "5"),
            ("six", "6"), ("seven", "7"), ("eight", "8"), ("nine", "9"), ("ten", "10"),
        ];
        if let Some(caps) = Regex::new(r"last\s+(one|two|three|four|five|six|seven|eight|nine|ten)\s*(days?|weeks?|months?)")
            .unwrap()
            .captures(text)
        {
            let num = SPELLED.iter().find(|(w, _)| *w == &caps[1]).map(|(_, n)| *n).unwrap_or("1");
            return Some(format!("last_{num}_{}", &caps[2]));
        }
        if let Some(caps) = Regex::new(r"first\s+(\d+)").unwrap().captures(text) {
            return Some(format!("first_{}", &caps[1]));
        }
        if text.contains("today") {
            return Some("today".to_string());
        }
        if text.contains("yesterday") {
            return Some("yesterday".to_string());
        }
        if text.contains("this week") {
            return Some("this_week".to_string());
        }
        if text.contains("last week") {
            return Some("last_week".to_string());
        }
        None
    }

    fn extract_explicit_table(question: &str) -> Option<String> {
        const SKIP_WORDS: &[&str] = &[
            "or", "and", "the", "a", "an", "is", "are", "was", "were", "be", "this", "that",
            "these", "those", "it", "they", "we", "you", "my", "your", "our", "their", "his",
            "her", "its", "what", "which", "who", "where", "when", "why", "how", "all", "any",
            "some", "no", "not", "more", "less", "stable", "volatile", "over", "time", "data",
        ];
        const PATTERNS: &[&str] = &[
            r#"(?i)from\s+["']?([^"']+?)["']?\s+(?:sheet|table)"#,
            r#"(?i)(?:sheet|table)\s+["']?([^"']+?)["']?(?:\s|$|,|\?)"#,
            r#"(?i)in\s+["']?([^"']+?)["']?\s+(?:sheet|table)"#,
            r#"(?i)check\s+(?:the\s+)?["']?([^"']+?)["']?\s+(?:sheet|table)"#,
            r#"(?i)look\s+(?:at|in)\s+["']?([^"']+?)["']?\s+(?:sheet|table)"#,
        ];
        for pattern in PATTERNS {
            if let Some(caps) = Regex::new(pattern).unwrap().captures(question) {
                let table_name = caps[1].trim().to_lowercase();
                if SKIP_WORDS.contains(&table_name.as_str()) {
                    continue;
                }
                return Some(caps[1].trim().to_string());
            }
        }
        None
    }

    fn extract_specific_date(text: &str) -> Option<DateSpecific> {
        if let Some(tamil) = Self::extract_tamil_date(text) {
            return Some(tamil);
        }

        let month_names: Vec<&str> = MONTHS.iter().map(|(n, _)| *n).collect();
        let escaped: Vec<String> = month_names.iter().map(|m| regex::escape(m)).collect();
        let pattern = format!(r"(?i)\b({})\s+(\d{{1,2}})(?:st|nd|rd|th)?\b", escaped.join("|"));
        if let Some(caps) = Regex::new(&pattern).unwrap().captures(text) {
            let month_word = caps[1].to_lowercase();
            let day: u32 = caps[2].parse().unwrap_or(0);
            if let Some((_, num)) = MONTHS.iter().find(|(n, _)| *n == month_word) {
                return Some(DateSpecific {
                    day: Some(day),
                    month: Some(MONTH_FULL_NAMES[(*num - 1) as usize].to_string()),
                    year: None,
                    raw: caps[0].to_string(),
                });
            }
        }

        if let Some(caps) = Regex::new(r"(\d{1,2})[/\-](\d{1,2})(?:[/\-](\d{4}))?").unwrap().captures(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: Option<i32> = caps.get(3).and_then(|y| y.as_str().parse().ok());
            if (1..=31).contains(&day) && (1..=12).contains(&month) {
                return Some(DateSpecific {
                    day: Some(day),
                    month: Some(MONTH_FULL_NAMES[(month - 1) as usize].to_string()),
                    year,
                    raw: caps[0].to_string(),
                });
            }
        }

        None
    }

    fn extract_tamil_date(text: &str) -> Option<DateSpecific> {
        let mut day = None;
        for (word, value) in TAMIL_NUMBERS {
            if text.contains(word) {
                day = Some(*value);
                break;
            }
        }
        if day.is_none() {
            let keywords = TAMIL_DATE_KEYWORDS.join("|");
            let pattern = format!(r"(\d{{1,2}})\s*(?:{keywords})");
            if let Some(caps) = Regex::new(&pattern).ok()?.captures(text) {
                day = caps[1].parse().ok();
            }
        }

        let mut month_num = None;
        for (name, num) in MONTHS {
            if name.chars().next().map(|c| !c.is_ascii()).unwrap_or(false) && text.contains(name) {
                month_num = Some(*num);
                break;
            }
        }

        if let (Some(d), Some(m)) = (day, month_num)
            && (1..=31).contains(&d)
        {
            return Some(DateSpecific {
                day: Some(d),
                month: Some(MONTH_FULL_NAMES[(m - 1) as usize].to_string()),
                year: None,
                raw: text.to_string(),
            });
        }
        if let Some(d) = day
            && (1..=31).contains(&d)
            && TAMIL_DATE_KEYWORDS.iter().any(|kw| text.contains(kw))
        {
            return Some(DateSpecific { day: Some(d), month: None, year: None, raw: text.to_string() });
        }
        None
    }

    fn extract_custom_entities(&self, text: &str) -> HashMap<String, String> {
        let learned = self.learned.read().expect("learned-entities lock poisoned");
        let mut found = HashMap::new();
        for (entity_type, values) in &learned.custom {
            for val in values {
                if word_boundary_contains(text, val) {
                    found.insert(entity_type.clone(), Self::title_case(val));
                    break;
                }
            }
        }
        found
    }

    fn detect_multi_domain_query(text: &str) -> bool {
        const PATTERNS: &[&str] = &[
            r"(?i)who (?:worked|was present|attended|came|showed up).*(?:peak|highest|best|top|maximum)",
            r"(?i)(?:staff|employees|workers|people).*(?:on|during|when).*(?:peak|highest|best|top|maximum)",
            r"(?i)(?:inventory|stock|products|items|orders).*(?:peak|highest|best|top|maximum)",
            r"(?i)(?:on|during).*(?:day|date).*(?:when|where).*(?:highest|lowest|peak|best|worst)",
            r"(?i)(?:combine|join|merge|cross.?reference).*(?:tables?|data|sheets?)",
            r"(?i)from (?:both|multiple|different) (?:tables?|sheets?|data)",
        ];
        PATTERNS.iter().any(|p| Regex::new(p).unwrap().is_match(text))
    }

    /// §4.9's ordering fix: the Tamil data-keyword check runs *before* any
    /// length-based heuristic, so a short Tamil data query is never
    /// misclassified as a follow-up just because Tamil renders it in very
    /// few space-separated tokens.
    pub fn is_followup_question(&self, question: &str, has_previous_context: bool) -> bool {
        if !has_previous_context {
            return false;
        }
        if TAMIL_DATA_QUERY_KEYWORDS.iter().any(|kw| question.contains(kw)) {
            return false;
        }

        let q_lower = question.to_lowercase();
        if ENGLISH_FOLLOWUP_PHRASES.iter().any(|p| q_lower.contains(p)) {
            return true;
        }
        if PROJECTION_FOLLOWUP_PHRASES.iter().any(|p| q_lower.contains(p)) {
            return true;
        }
        if TAMIL_FOLLOWUP_PHRASES.iter().any(|p| question.contains(p)) {
            return true;
        }

        let word_count = question.split_whitespace().count();
        if word_count <= 3 {
            return true;
        }
        if word_count <= 2 && (self.extract_location(&q_lower).is_some() || self.extract_month(&q_lower).is_some()) {
            return true;
        }
        false
    }
}

use chrono::Datelike;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_month_metric_and_comparison() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("compare revenue for Chennai between November and December");
        assert_eq!(entities.all_months, vec!["November".to_string(), "December".to_string()]);
        assert_eq!(entities.metric, Some("revenue".to_string()));
        assert_eq!(entities.location, Some("Chennai".to_string()));
        assert!(entities.comparison);
        assert!(entities.multi_month_comparison);
    }

    #[test]
    fn category_never_matches_metric_deny_list() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("what were total sales last month");
        assert_eq!(entities.category, None);
        assert_eq!(entities.metric, Some("sales".to_string()));
    }

    #[test]
    fn explicit_quoted_category_wins() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract(r#"how much did "Sarees" sell for"#);
        assert_eq!(entities.category, Some("Sarees".to_string()));
    }

    #[test]
    fn single_month_without_comparison_is_not_multi_month() {
        let extractor = EntityExtractor::new();
        let entities = extractor.extract("what were September sales");
        assert!(!entities.multi_month_comparison);
    }

    #[test]
    fn short_question_is_followup_only_with_context() {
        let extractor = EntityExtractor::new();
        assert!(!extractor.is_followup_question("Chennai", false));
        assert!(extractor.is_followup_question("Chennai", true));
    }

    #[test]
    fn tamil_data_query_keyword_short_circuits_before_length_heuristic() {
        let extractor = EntityExtractor::new();
        assert!(!extractor.is_followup_question("விற்பனை எவ்வளவு", true));
    }

    #[test]
    fn top_n_time_period_parses() {
        assert_eq!(EntityExtractor::extract_time_period("top 5 areas by gross sales"), Some("top_5".to_string()));
    }
}
