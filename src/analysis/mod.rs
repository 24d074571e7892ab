//! Conversation analysis
//!
//! Runs the off-topic classifier, trait extractor and emotion detector over
//! a question, then lets the stage machine settle the conversational stage.
//!
//! FLOW:
//! (question, history) → {offtopic, traits, emotion} → stage → AnalysisResult

pub mod emotion;
pub mod stage;
pub mod traits;

pub use emotion::EmotionDetector;
pub use stage::{create_default_stage_machine, StageAdjustment, StageMachine, StageRule, StageSignals};
pub use traits::TraitExtractor;

use crate::classifier::OfftopicClassifier;
use crate::lexicon::Lexicon;
use crate::models::{AnalysisResult, ConversationHistory, QuestionTrait, Stage, TraitSet};
use std::sync::Arc;
use tracing::info;

/// Stateless analyzer. Build one per process and share it.
pub struct ConversationAnalyzer {
    offtopic: OfftopicClassifier,
    traits: TraitExtractor,
    emotion: EmotionDetector,
    stages: StageMachine,
}

impl ConversationAnalyzer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self::with_stage_machine(lexicon, create_default_stage_machine())
    }

    fn with_stage_machine(lexicon: Arc<Lexicon>, stages: StageMachine) -> Self {
        Self {
            offtopic: OfftopicClassifier::new(Arc::clone(&lexicon)),
            traits: TraitExtractor::new(Arc::clone(&lexicon)),
            emotion: EmotionDetector::new(lexicon),
            stages,
        }
    }

    /// Analyze the latest question against prior turns
    pub fn analyze(&self, question: &str, history: Option<&ConversationHistory>) -> AnalysisResult {
        self.analyze_detailed(question, history).0
    }

    /// Like [`analyze`](Self::analyze), also reporting which stage rule fired
    pub fn analyze_detailed(
        &self,
        question: &str,
        history: Option<&ConversationHistory>,
    ) -> (AnalysisResult, StageAdjustment) {
        let question_lower = question.to_lowercase();

        let base = Stage::from_turn_count(history.map_or(0, ConversationHistory::len));
        let offtopic_category = self.offtopic.classify(question, &question_lower);
        let traits = self.traits.extract(question, &question_lower);
        let emotion = self.emotion.detect(&question_lower);

        let signals = StageSignals {
            traits: &traits,
            emotion,
            despair: self.emotion.detect_despair(&question_lower),
        };
        let adjustment = self.stages.adjust(base, &signals);

        let requires_context = requires_context(&traits, adjustment.stage);

        let result = AnalysisResult {
            stage: adjustment.stage,
            is_offtopic: offtopic_category.is_some(),
            offtopic_category,
            traits,
            emotion,
            requires_context,
            question_length: question.chars().count(),
        };

        info!(
            stage = %result.stage,
            base = %adjustment.base,
            rule = adjustment.rule.unwrap_or("none"),
            is_offtopic = result.is_offtopic,
            category = ?result.offtopic_category,
            traits = ?result.traits,
            emotion = ?result.emotion,
            "Conversation analysis completed"
        );

        (result, adjustment)
    }
}

impl Default for ConversationAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::builtin()))
    }
}

/// Whether the answer should draw on report / reference context
pub fn requires_context(traits: &TraitSet, stage: Stage) -> bool {
    if traits.contains(&QuestionTrait::Greeting) {
        return false;
    }

    stage >= Stage::Exploration || traits.contains(&QuestionTrait::SpecificRequest)
}
