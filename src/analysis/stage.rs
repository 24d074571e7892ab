//! Stage Machine
//!
//! Base stage comes from the turn count; an ordered rule list then adjusts
//! it using traits and emotion. The first rule that fires decides, and an
//! unmatched question keeps its base stage.

use crate::models::{EmotionSignals, QuestionTrait, Stage, TraitSet};
use tracing::debug;

/// Everything a rule may look at besides the base stage
#[derive(Debug, Clone, Copy)]
pub struct StageSignals<'a> {
    pub traits: &'a TraitSet,
    pub emotion: EmotionSignals,
    /// Frustration phrased as "can't figure it out" / "giving up"
    pub despair: bool,
}

impl StageSignals<'_> {
    fn has(&self, tag: QuestionTrait) -> bool {
        self.traits.contains(&tag)
    }
}

/// One adjustment rule
pub trait StageRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Some(stage)` if the rule fires
    fn apply(&self, base: Stage, signals: &StageSignals<'_>) -> Option<Stage>;
}

/// Result of running the rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageAdjustment {
    pub base: Stage,
    pub stage: Stage,
    /// Name of the rule that fired, `None` when the base was kept
    pub rule: Option<&'static str>,
}

pub struct StageMachine {
    rules: Vec<Box<dyn StageRule>>,
}

impl StageMachine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn StageRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn adjust(&self, base: Stage, signals: &StageSignals<'_>) -> StageAdjustment {
        for rule in &self.rules {
            if let Some(stage) = rule.apply(base, signals) {
                debug!(rule = rule.name(), base = %base, stage = %stage, "Stage rule fired");
                return StageAdjustment {
                    base,
                    stage: clamp(stage),
                    rule: Some(rule.name()),
                };
            }
        }

        StageAdjustment {
            base,
            stage: clamp(base),
            rule: None,
        }
    }
}

impl Default for StageMachine {
    fn default() -> Self {
        create_default_stage_machine()
    }
}

fn clamp(stage: Stage) -> Stage {
    stage.clamp(Stage::Greeting, Stage::ActionPlan)
}

//
// ========== Adjustment Rules ==========
//

/// 1. A greeting with no history stays a greeting
pub struct GreetingHoldRule;

impl StageRule for GreetingHoldRule {
    fn name(&self) -> &'static str {
        "greeting_hold"
    }

    fn apply(&self, base: Stage, signals: &StageSignals<'_>) -> Option<Stage> {
        (signals.has(QuestionTrait::Greeting) && base == Stage::Greeting).then_some(Stage::Greeting)
    }
}

/// 2. Urgency or resistance jumps to deep coaching
pub struct UrgentOrResistantRule;

impl StageRule for UrgentOrResistantRule {
    fn name(&self) -> &'static str {
        "urgent_or_resistant"
    }

    fn apply(&self, base: Stage, signals: &StageSignals<'_>) -> Option<Stage> {
        (signals.emotion.urgent || signals.emotion.resistant).then(|| base.max(Stage::DeepCoaching))
    }
}

/// 3. Frustration that has turned into giving up
pub struct DespairRule;

impl StageRule for DespairRule {
    fn name(&self) -> &'static str {
        "frustrated_despair"
    }

    fn apply(&self, base: Stage, signals: &StageSignals<'_>) -> Option<Stage> {
        (signals.emotion.frustrated && signals.despair).then(|| base.max(Stage::DeepCoaching))
    }
}

/// 4. Plain frustration needs at least exploration
pub struct FrustratedRule;

impl StageRule for FrustratedRule {
    fn name(&self) -> &'static str {
        "frustrated"
    }

    fn apply(&self, base: Stage, signals: &StageSignals<'_>) -> Option<Stage> {
        signals.emotion.frustrated.then(|| base.max(Stage::Exploration))
    }
}

/// 5. A concrete request about a complex situation, or late in the conversation
pub struct ComplexRequestRule;

impl StageRule for ComplexRequestRule {
    fn name(&self) -> &'static str {
        "complex_request"
    }

    fn apply(&self, base: Stage, signals: &StageSignals<'_>) -> Option<Stage> {
        let fires = signals.has(QuestionTrait::SpecificRequest)
            && (signals.has(QuestionTrait::Complex) || base >= Stage::DeepCoaching);
        fires.then(|| base.max(Stage::DeepCoaching))
    }
}

/// 6. A concrete request mid-conversation
pub struct OngoingRequestRule;

impl StageRule for OngoingRequestRule {
    fn name(&self) -> &'static str {
        "ongoing_request"
    }

    fn apply(&self, base: Stage, signals: &StageSignals<'_>) -> Option<Stage> {
        (signals.has(QuestionTrait::SpecificRequest) && base >= Stage::Exploration)
            .then(|| base.max(Stage::Exploration))
    }
}

/// 7. A concrete request as the opening message stays a greeting
pub struct OpeningRequestRule;

impl StageRule for OpeningRequestRule {
    fn name(&self) -> &'static str {
        "opening_request"
    }

    fn apply(&self, base: Stage, signals: &StageSignals<'_>) -> Option<Stage> {
        (signals.has(QuestionTrait::SpecificRequest) && base == Stage::Greeting).then_some(Stage::Greeting)
    }
}

/// Create the stage machine with the standard rule order
pub fn create_default_stage_machine() -> StageMachine {
    let mut machine = StageMachine::new();
    machine.add_rule(Box::new(GreetingHoldRule));
    machine.add_rule(Box::new(UrgentOrResistantRule));
    machine.add_rule(Box::new(DespairRule));
    machine.add_rule(Box::new(FrustratedRule));
    machine.add_rule(Box::new(ComplexRequestRule));
    machine.add_rule(Box::new(OngoingRequestRule));
    machine.add_rule(Box::new(OpeningRequestRule));
    machine
}

//
// ================= Tests =================
//
