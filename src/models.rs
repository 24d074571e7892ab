//! Core data models for the coaching engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

//
// ================= Messages =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A single conversation turn as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Ordered conversation turns, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Build a history from loosely-typed entries.
    ///
    /// Entries that do not carry a valid `role` and `content` are skipped so
    /// that one bad turn never aborts the whole analysis.
    pub fn from_raw_entries(entries: Vec<serde_json::Value>) -> Self {
        let mut messages = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<Message>(entry) {
                Ok(message) => messages.push(message),
                Err(e) => warn!(index, "Skipping malformed history entry: {}", e),
            }
        }

        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Contents of user-authored turns, in order
    pub fn user_messages(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    /// The `count` most recent turns, still oldest first
    pub fn recent(&self, count: usize) -> ConversationHistory {
        let skip = self.messages.len().saturating_sub(count);
        Self {
            messages: self.messages[skip..].to_vec(),
        }
    }
}

//
// ================= Stage =================
//

/// Conversational depth. Declaration order is the comparison order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Greeting = 1,
    Exploration = 2,
    DeepCoaching = 3,
    ActionPlan = 4,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Greeting,
        Stage::Exploration,
        Stage::DeepCoaching,
        Stage::ActionPlan,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    /// Map a numeric level onto a stage, clamping into `[Greeting, ActionPlan]`
    pub fn from_level(level: usize) -> Stage {
        match level {
            0 | 1 => Stage::Greeting,
            2 => Stage::Exploration,
            3 => Stage::DeepCoaching,
            _ => Stage::ActionPlan,
        }
    }

    /// Base stage before adjustment: one stage per two turns, capped at 4
    pub fn from_turn_count(turns: usize) -> Stage {
        Stage::from_level(turns / 2 + 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Greeting => "GREETING",
            Stage::Exploration => "EXPLORATION",
            Stage::DeepCoaching => "DEEP_COACHING",
            Stage::ActionPlan => "ACTION_PLAN",
        }
    }

    /// Name as shown to the generation service ("Deep_coaching")
    pub fn display_name(self) -> String {
        let lower = self.name().to_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

//
// ================= Classification =================
//

/// Off-domain question categories, in scan order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OfftopicCategory {
    #[serde(rename = "날씨")]
    Weather,
    #[serde(rename = "음식")]
    Food,
    #[serde(rename = "기술")]
    Tech,
    #[serde(rename = "의료")]
    Medical,
    #[serde(rename = "법률")]
    Legal,
    #[serde(rename = "메타")]
    Meta,
    #[serde(rename = "일상")]
    Daily,
    #[serde(rename = "난센스")]
    Nonsense,
}

impl OfftopicCategory {
    pub fn label(self) -> &'static str {
        match self {
            OfftopicCategory::Weather => "날씨",
            OfftopicCategory::Food => "음식",
            OfftopicCategory::Tech => "기술",
            OfftopicCategory::Medical => "의료",
            OfftopicCategory::Legal => "법률",
            OfftopicCategory::Meta => "메타",
            OfftopicCategory::Daily => "일상",
            OfftopicCategory::Nonsense => "난센스",
        }
    }
}

/// Surface tags attached to a question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuestionTrait {
    #[serde(rename = "인사")]
    Greeting,
    #[serde(rename = "구체적요청")]
    SpecificRequest,
    #[serde(rename = "복잡한상황")]
    Complex,
    #[serde(rename = "일반질문")]
    General,
}

impl QuestionTrait {
    pub fn label(self) -> &'static str {
        match self {
            QuestionTrait::Greeting => "인사",
            QuestionTrait::SpecificRequest => "구체적요청",
            QuestionTrait::Complex => "복잡한상황",
            QuestionTrait::General => "일반질문",
        }
    }
}

pub type TraitSet = BTreeSet<QuestionTrait>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmotionSignals {
    pub frustrated: bool,
    pub resistant: bool,
    pub positive: bool,
    pub urgent: bool,
}

/// Outcome of analysing one question against its history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResult {
    pub stage: Stage,
    pub is_offtopic: bool,
    pub offtopic_category: Option<OfftopicCategory>,
    pub traits: TraitSet,
    pub emotion: EmotionSignals,
    pub requires_context: bool,
    pub question_length: usize,
}

impl AnalysisResult {
    pub fn has_trait(&self, tag: QuestionTrait) -> bool {
        self.traits.contains(&tag)
    }
}

//
// ================= Engagement =================
//

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementScore {
    pub total: u32,
    pub depth: u32,
    pub emotional_investment: u32,
    pub action_intent: u32,
    pub advanced_topics: u32,
    pub should_suggest_consultation: bool,
}

//
// ================= Strategy =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKey {
    WarmWelcome,
    OpenExploration,
    EmpatheticExploration,
    DeepInsight,
    GentleChallenge,
    ImmediateAction,
    ActionOriented,
    GentleRedirect,
    RedirectToExpert,
    ServiceInfo,
    ClarifyQuestion,
}

impl StrategyKey {
    pub const ALL: [StrategyKey; 11] = [
        StrategyKey::WarmWelcome,
        StrategyKey::OpenExploration,
        StrategyKey::EmpatheticExploration,
        StrategyKey::DeepInsight,
        StrategyKey::GentleChallenge,
        StrategyKey::ImmediateAction,
        StrategyKey::ActionOriented,
        StrategyKey::GentleRedirect,
        StrategyKey::RedirectToExpert,
        StrategyKey::ServiceInfo,
        StrategyKey::ClarifyQuestion,
    ];

    /// Fallback for lookups that cannot be resolved
    pub const DEFAULT: StrategyKey = StrategyKey::OpenExploration;

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKey::WarmWelcome => "warm_welcome",
            StrategyKey::OpenExploration => "open_exploration",
            StrategyKey::EmpatheticExploration => "empathetic_exploration",
            StrategyKey::DeepInsight => "deep_insight",
            StrategyKey::GentleChallenge => "gentle_challenge",
            StrategyKey::ImmediateAction => "immediate_action",
            StrategyKey::ActionOriented => "action_oriented",
            StrategyKey::GentleRedirect => "gentle_redirect",
            StrategyKey::RedirectToExpert => "redirect_to_expert",
            StrategyKey::ServiceInfo => "service_info",
            StrategyKey::ClarifyQuestion => "clarify_question",
        }
    }

    /// Parse a key name; unknown names resolve to [`StrategyKey::DEFAULT`]
    pub fn parse_or_default(name: &str) -> StrategyKey {
        let trimmed = name.trim();
        match StrategyKey::ALL.iter().find(|k| k.as_str() == trimmed) {
            Some(key) => *key,
            None => {
                warn!(key = trimmed, "Unknown strategy key, using default");
                StrategyKey::DEFAULT
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyDecision {
    pub strategy_key: StrategyKey,
    pub instruction: String,
    pub example: String,
}

//
// ================= External Service Data =================
//

/// Interpretation report kept by the report store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    pub user_id: String,
    pub leadership_type: String,
    pub interpretation: String,
    pub created_at: DateTime<Utc>,
}

/// Reference document returned by the retrieval service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub document_id: String,
    pub content: String,
    #[serde(default)]
    pub doc_type: Option<String>,
    pub similarity_score: f32,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for OfftopicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl fmt::Display for QuestionTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl fmt::Display for StrategyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Greeting < Stage::Exploration);
        assert!(Stage::Exploration < Stage::DeepCoaching);
        assert!(Stage::DeepCoaching < Stage::ActionPlan);
        assert_eq!(Stage::DeepCoaching.max(Stage::Exploration), Stage::DeepCoaching);
    }

    #[test]
    fn test_base_stage_from_turns() {
        for n in 0..=20usize {
            let expected = (n / 2 + 1).min(4) as u8;
            assert_eq!(Stage::from_turn_count(n).level(), expected, "turns = {}", n);
        }
    }

    #[test]
    fn test_stage_display_name() {
        assert_eq!(Stage::Greeting.display_name(), "Greeting");
        assert_eq!(Stage::DeepCoaching.display_name(), "Deep_coaching");
    }

    #[test]
    fn test_history_skips_malformed_entries() {
        let entries = vec![
            serde_json::json!({"role": "user", "content": "팀장이 된 지 얼마 안 됐어요"}),
            serde_json::json!({"role": "user"}),
            serde_json::json!({"content": "역할이 없음"}),
            serde_json::json!({"role": "robot", "content": "알 수 없는 역할"}),
            serde_json::json!({"role": "assistant", "content": "축하드려요", "timestamp": "2024-01-15T10:30:00Z"}),
        ];

        let history = ConversationHistory::from_raw_entries(entries);
        assert_eq!(history.len(), 2);
        assert_eq!(history.user_messages().count(), 1);
    }

    #[test]
    fn test_recent_keeps_latest_in_order() {
        let history = ConversationHistory::from_messages(
            (0..8).map(|i| Message::user(format!("질문 {}", i))).collect(),
        );

        let recent = history.recent(5);
        let contents: Vec<_> = recent.messages().map(|m| m.content.clone()).collect();
        assert_eq!(contents.first().map(String::as_str), Some("질문 3"));
        assert_eq!(contents.last().map(String::as_str), Some("질문 7"));
        assert_eq!(history.recent(20).len(), 8);
    }

    #[test]
    fn test_strategy_key_parsing() {
        assert_eq!(StrategyKey::parse_or_default("gentle_challenge"), StrategyKey::GentleChallenge);
        assert_eq!(StrategyKey::parse_or_default("does_not_exist"), StrategyKey::OpenExploration);
        for key in StrategyKey::ALL {
            assert_eq!(StrategyKey::parse_or_default(key.as_str()), key);
        }
    }

    #[test]
    fn test_labels_serialize_in_korean() {
        let json = serde_json::to_string(&OfftopicCategory::Weather).unwrap();
        assert_eq!(json, "\"날씨\"");
        let json = serde_json::to_string(&QuestionTrait::Greeting).unwrap();
        assert_eq!(json, "\"인사\"");
        let json = serde_json::to_string(&Stage::DeepCoaching).unwrap();
        assert_eq!(json, "\"DEEP_COACHING\"");
    }
}
