//! Trait Extractor
//!
//! Tags a question with surface properties: greeting, specific request,
//! complexity. Falls back to `General` so the set is never empty.

use crate::lexicon::{contains_any, ends_with_any, Lexicon};
use crate::models::{QuestionTrait, TraitSet};
use std::sync::Arc;

/// Questions longer than this are always `Complex`
pub const COMPLEX_LENGTH: usize = 50;

/// A bare polite ending only counts as a request past this length
pub const DECLARATIVE_REQUEST_LENGTH: usize = 10;

/// Connector marker count that signals several subjects
pub const MULTI_SUBJECT_MARKERS: usize = 2;

pub struct TraitExtractor {
    lexicon: Arc<Lexicon>,
}

impl TraitExtractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn extract(&self, question: &str, question_lower: &str) -> TraitSet {
        let mut traits = TraitSet::new();
        let length = question.chars().count();

        let greeting = self.is_greeting(question_lower);
        if greeting {
            traits.insert(QuestionTrait::Greeting);
        }

        if self.is_specific_request(question, question_lower, length, greeting) {
            traits.insert(QuestionTrait::SpecificRequest);
        }

        if self.is_complex(question, length) {
            traits.insert(QuestionTrait::Complex);
        }

        if traits.is_empty() {
            traits.insert(QuestionTrait::General);
        }

        traits
    }

    fn is_greeting(&self, question_lower: &str) -> bool {
        let lex = self.lexicon.source();

        contains_any(question_lower, &lex.greeting_prefixes)
            || (question_lower.contains(lex.greeting_adjective.as_str())
                && contains_any(question_lower, &lex.time_of_day_words))
    }

    fn is_specific_request(
        &self,
        question: &str,
        question_lower: &str,
        length: usize,
        greeting: bool,
    ) -> bool {
        let lex = self.lexicon.source();

        // "잘 지내셨나요" style questions are pleasantries, not requests
        let wellbeing = contains_any(question_lower, &lex.wellbeing_exceptions);

        contains_any(question_lower, &lex.interrogative_words)
            || question.contains('?')
            || (!wellbeing && ends_with_any(question, &lex.interrogative_suffixes))
            || (question.ends_with(lex.declarative_suffix.as_str())
                && length > DECLARATIVE_REQUEST_LENGTH
                && !greeting)
            || ends_with_any(question, &lex.polite_endings)
    }

    fn is_complex(&self, question: &str, length: usize) -> bool {
        let markers = &self.lexicon.source().complexity_markers;
        let marker_count = question.chars().filter(|c| markers.contains(c)).count();

        length > COMPLEX_LENGTH || marker_count >= MULTI_SUBJECT_MARKERS
    }
}
