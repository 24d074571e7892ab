//! Engagement Scorer
//!
//! Scores how deeply a user is investing in the conversation (0-100) from
//! the user-authored turns of the full history, and decides whether a human
//! consultant should be suggested.
//!
//! | Component            | Cap | Source                                  |
//! |----------------------|-----|-----------------------------------------|
//! | depth                | 30  | message count + average message length  |
//! | emotional investment | 25  | tiered keywords 10 / 5 / 2              |
//! | action intent        | 25  | tiered keywords 10 / 5 / 2              |
//! | advanced topics      | 20  | tiered keywords 15 / 8 / 3 + 5 per pattern |

use crate::lexicon::{Lexicon, TierWeights};
use crate::models::{ConversationHistory, EngagementScore};
use std::sync::Arc;
use tracing::info;

pub const DEPTH_CAP: u32 = 30;
pub const EMOTIONAL_CAP: u32 = 25;
pub const ACTION_CAP: u32 = 25;
pub const ADVANCED_CAP: u32 = 20;

/// Total at or above which a human consultant is suggested
pub const CONSULTATION_THRESHOLD: u32 = 40;

/// Fewer user turns than this score zero across the board
pub const MIN_USER_MESSAGES: usize = 2;

const EMOTIONAL_WEIGHTS: TierWeights = TierWeights {
    high: 10,
    medium: 5,
    low: 2,
};

const ACTION_WEIGHTS: TierWeights = TierWeights {
    high: 10,
    medium: 5,
    low: 2,
};

const ADVANCED_WEIGHTS: TierWeights = TierWeights {
    high: 15,
    medium: 8,
    low: 3,
};

const STRUCTURAL_PATTERN_BONUS: u32 = 5;

pub struct EngagementScorer {
    lexicon: Arc<Lexicon>,
}

impl EngagementScorer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn analyze_engagement(&self, history: &ConversationHistory) -> EngagementScore {
        let user_messages: Vec<&str> = history.user_messages().collect();

        if user_messages.len() < MIN_USER_MESSAGES {
            return EngagementScore::default();
        }

        let combined = user_messages.join(" ");

        let depth = depth_score(&user_messages);
        let emotional_investment = self.emotional_score(&combined);
        let action_intent = self.action_score(&combined);
        let advanced_topics = self.advanced_score(&combined);

        let total = depth + emotional_investment + action_intent + advanced_topics;
        let should_suggest_consultation = total >= CONSULTATION_THRESHOLD;

        info!(
            total,
            depth,
            emotional_investment,
            action_intent,
            advanced_topics,
            suggest = should_suggest_consultation,
            "Engagement scored"
        );

        EngagementScore {
            total,
            depth,
            emotional_investment,
            action_intent,
            advanced_topics,
            should_suggest_consultation,
        }
    }

    fn emotional_score(&self, combined: &str) -> u32 {
        self.lexicon
            .source()
            .emotional_tiers
            .score(combined, EMOTIONAL_WEIGHTS)
            .min(EMOTIONAL_CAP)
    }

    fn action_score(&self, combined: &str) -> u32 {
        self.lexicon
            .source()
            .action_tiers
            .score(combined, ACTION_WEIGHTS)
            .min(ACTION_CAP)
    }

    fn advanced_score(&self, combined: &str) -> u32 {
        let keywords = self
            .lexicon
            .source()
            .advanced_tiers
            .score(combined, ADVANCED_WEIGHTS);

        // Each distinct pattern stacks, bounded only by the category cap
        let patterns = self
            .lexicon
            .structural_patterns()
            .iter()
            .filter(|p| p.is_match(combined))
            .count() as u32;

        (keywords + patterns * STRUCTURAL_PATTERN_BONUS).min(ADVANCED_CAP)
    }
}

impl Default for EngagementScorer {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::builtin()))
    }
}

/// Message count (max 15) plus average length (max 15)
fn depth_score(user_messages: &[&str]) -> u32 {
    let count = user_messages.len();

    let count_score = match count {
        n if n >= 5 => 15,
        4 => 12,
        3 => 8,
        _ => 4,
    };

    let total_chars: usize = user_messages.iter().map(|m| m.chars().count()).sum();
    let average = total_chars as f64 / count.max(1) as f64;

    let length_score = if average >= 100.0 {
        15
    } else if average >= 50.0 {
        10
    } else if average >= 30.0 {
        5
    } else {
        2
    };

    (count_score + length_score).min(DEPTH_CAP)
}
