//! Off-topic Classifier
//!
//! Decides whether a question falls outside leadership coaching and, if so,
//! which category it belongs to. Rules run in order; the first match wins:
//! 1. Mostly non-Hangul text longer than 3 characters → nonsense
//! 2. Any leadership keyword → on-topic
//! 3. First off-topic category with a keyword hit, in declared order
//! 4. Otherwise on-topic

use crate::lexicon::{contains_any, Lexicon};
use crate::models::OfftopicCategory;
use std::sync::Arc;

/// Minimum share of Hangul syllables for a question to count as readable
pub const MIN_DOMAIN_SCRIPT_RATIO: f64 = 0.3;

/// Questions this short are never flagged by the script check
pub const MIN_SCRIPT_CHECK_LENGTH: usize = 3;

pub struct OfftopicClassifier {
    lexicon: Arc<Lexicon>,
}

impl OfftopicClassifier {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Returns the off-topic category, or `None` when the question is on-topic
    pub fn classify(&self, question: &str, question_lower: &str) -> Option<OfftopicCategory> {
        let length = question.chars().count();

        if length > MIN_SCRIPT_CHECK_LENGTH && domain_script_ratio(question) < MIN_DOMAIN_SCRIPT_RATIO {
            return Some(OfftopicCategory::Nonsense);
        }

        if contains_any(question_lower, self.lexicon.domain_keywords()) {
            return None;
        }

        self.lexicon
            .offtopic_categories()
            .iter()
            .find(|entry| contains_any(question_lower, &entry.keywords))
            .map(|entry| entry.category)
    }
}

/// Share of characters that are Hangul syllables (U+AC00..=U+D7A3)
pub fn domain_script_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let hangul = text.chars().filter(|c| ('가'..='힣').contains(c)).count();
    hangul as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(question: &str) -> Option<OfftopicCategory> {
        let classifier = OfftopicClassifier::new(Arc::new(Lexicon::builtin()));
        classifier.classify(question, &question.to_lowercase())
    }

    #[test]
    fn test_offtopic_categories() {
        let cases = vec![
            ("오늘 날씨 어때요?", OfftopicCategory::Weather),
            ("점심 메뉴 추천해 주세요", OfftopicCategory::Food),
            ("와이파이가 자꾸 끊겨요", OfftopicCategory::Tech),
            ("병원에 가봐야 할까요", OfftopicCategory::Medical),
            ("변호사를 소개해 주실 수 있나요", OfftopicCategory::Legal),
            ("유료인가요? 가격이 궁금해요", OfftopicCategory::Meta),
            ("요즘 볼만한 영화 있나요", OfftopicCategory::Daily),
        ];

        for (question, expected) in cases {
            assert_eq!(classify(question), Some(expected), "question: {}", question);
        }
    }

    #[test]
    fn test_nonsense_by_script_ratio() {
        assert_eq!(classify("asdfasdf"), Some(OfftopicCategory::Nonsense));
        assert_eq!(classify("How do I lead my team?"), Some(OfftopicCategory::Nonsense));
        assert_eq!(classify("!!!!!"), Some(OfftopicCategory::Nonsense));
    }

    #[test]
    fn test_short_text_skips_script_check() {
        assert_eq!(classify("ok"), None);
        assert_eq!(classify("abc"), None);
    }

    #[test]
    fn test_leadership_context_wins_over_offtopic_keywords() {
        // "회의" is domain vocabulary, "점심" alone would be food
        assert_eq!(classify("점심 회의를 어떻게 운영하면 좋을까요"), None);
        assert_eq!(classify("팀원이 병원에 자주 가요"), None);
    }

    #[test]
    fn test_first_declared_category_wins() {
        // weather ("비") is scanned before food ("저녁")
        assert_eq!(classify("저녁에 비가 온대요"), Some(OfftopicCategory::Weather));
    }

    #[test]
    fn test_on_topic_and_empty() {
        assert_eq!(classify("팀원들과 소통이 잘 안 돼요"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_domain_script_ratio() {
        assert_eq!(domain_script_ratio(""), 0.0);
        assert_eq!(domain_script_ratio("asdf"), 0.0);
        assert_eq!(domain_script_ratio("안녕"), 1.0);
        assert!((domain_script_ratio("안녕 hi") - 2.0 / 5.0).abs() < f64::EPSILON);
    }
}
