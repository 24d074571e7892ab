//! Emotion Detector
//!
//! Four independent keyword checks. Signals do not suppress each other.

use crate::lexicon::{contains_any, Lexicon};
use crate::models::EmotionSignals;
use std::sync::Arc;

pub struct EmotionDetector {
    lexicon: Arc<Lexicon>,
}

impl EmotionDetector {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn detect(&self, question_lower: &str) -> EmotionSignals {
        let lex = self.lexicon.source();

        EmotionSignals {
            frustrated: contains_any(question_lower, &lex.frustrated),
            resistant: contains_any(question_lower, &lex.resistant),
            positive: contains_any(question_lower, &lex.positive),
            urgent: contains_any(question_lower, &lex.urgent),
        }
    }

    /// "Can't figure it out" / "giving up" wording
    pub fn detect_despair(&self, question_lower: &str) -> bool {
        contains_any(question_lower, &self.lexicon.source().despair)
    }
}
