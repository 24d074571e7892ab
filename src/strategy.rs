//! Strategy Selector
//!
//! Pure decision table from an analysis to one of the fixed strategy keys,
//! plus the catalog of instruction / example text each key stands for.

use crate::models::{AnalysisResult, OfftopicCategory, Stage, StrategyDecision, StrategyKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Instruction and example handed to the generation service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyText {
    pub instruction: String,
    pub example: String,
}

/// Resolve the strategy key for an analysis. Total over every analysis.
pub fn select_strategy_key(analysis: &AnalysisResult) -> StrategyKey {
    if analysis.is_offtopic {
        return match analysis.offtopic_category {
            Some(OfftopicCategory::Legal) | Some(OfftopicCategory::Medical) => {
                StrategyKey::RedirectToExpert
            }
            Some(OfftopicCategory::Meta) => StrategyKey::ServiceInfo,
            Some(OfftopicCategory::Nonsense) => StrategyKey::ClarifyQuestion,
            _ => StrategyKey::GentleRedirect,
        };
    }

    let emotion = &analysis.emotion;

    match analysis.stage {
        Stage::Greeting => StrategyKey::WarmWelcome,
        Stage::Exploration if emotion.frustrated => StrategyKey::EmpatheticExploration,
        Stage::Exploration => StrategyKey::OpenExploration,
        Stage::DeepCoaching if emotion.resistant => StrategyKey::GentleChallenge,
        Stage::DeepCoaching if emotion.urgent => StrategyKey::ImmediateAction,
        Stage::DeepCoaching => StrategyKey::DeepInsight,
        Stage::ActionPlan => StrategyKey::ActionOriented,
    }
}

/// Lookup table from strategy key to its text
#[derive(Debug, Clone)]
pub struct StrategyCatalog {
    entries: HashMap<StrategyKey, StrategyText>,
}

impl StrategyCatalog {
    pub fn builtin() -> Self {
        let entries = BUILTIN_STRATEGIES
            .iter()
            .map(|(key, instruction, example)| {
                (
                    *key,
                    StrategyText {
                        instruction: instruction.to_string(),
                        example: example.to_string(),
                    },
                )
            })
            .collect();

        Self { entries }
    }

    pub fn with_entries(entries: HashMap<StrategyKey, StrategyText>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: StrategyKey) -> Option<&StrategyText> {
        self.entries.get(&key)
    }

    /// Build the decision for `key`, falling back to the default strategy's text
    pub fn decision(&self, key: StrategyKey) -> StrategyDecision {
        let (resolved, text) = match self.entries.get(&key) {
            Some(text) => (key, Some(text)),
            None => {
                warn!(key = %key, "Strategy missing from catalog, using default");
                (StrategyKey::DEFAULT, self.entries.get(&StrategyKey::DEFAULT))
            }
        };

        StrategyDecision {
            strategy_key: resolved,
            instruction: text.map(|t| t.instruction.clone()).unwrap_or_default(),
            example: text.map(|t| t.example.clone()).unwrap_or_default(),
        }
    }
}

impl Default for StrategyCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Strategy selection over a catalog
#[derive(Debug, Clone, Default)]
pub struct StrategySelector {
    catalog: StrategyCatalog,
}

impl StrategySelector {
    pub fn new(catalog: StrategyCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &StrategyCatalog {
        &self.catalog
    }

    pub fn get_response_strategy(&self, analysis: &AnalysisResult) -> StrategyDecision {
        let key = select_strategy_key(analysis);
        debug!(strategy = %key, stage = %analysis.stage, "Strategy selected");
        self.catalog.decision(key)
    }
}

const BUILTIN_STRATEGIES: &[(StrategyKey, &str, &str)] = &[
    (
        StrategyKey::WarmWelcome,
        "리더를 따뜻하게 환영하고, 어떤 대화를 나누고 싶은지 자연스럽게 물어보세요.",
        "안녕하세요, 리더님! Link-Coach의 AI 코치입니다. 오늘은 어떤 리더십 고민을 함께 나눠볼까요?",
    ),
    (
        StrategyKey::OpenExploration,
        "리더의 고민에 대해 더 자세히 듣고 싶다는 관심을 표현하고, 구체적인 상황을 묻는 열린 질문을 하세요.",
        "그렇군요. 팀원들과의 소통 문제로 고민이 많으시겠어요. 혹시 가장 최근에 있었던 구체적인 상황을 조금 더 자세히 말씀해주실 수 있을까요?",
    ),
    (
        StrategyKey::EmpatheticExploration,
        "리더의 감정(답답함, 어려움 등)을 먼저 깊이 공감해주고, 그 감정을 느끼는 것이 당연하다고 인정해주세요. 그 후에 상황을 탐색하는 질문을 부드럽게 던지세요.",
        "팀 관리가 생각처럼 되지 않아 많이 답답하셨겠어요. 리더로서 그런 감정을 느끼는 것은 자연스러운 일입니다. 지금까지 어떤 노력들을 하셨나요? 함께 돌파구를 찾아볼게요.",
    ),
    (
        StrategyKey::DeepInsight,
        "리더의 상황을 명확히 짚어주고, 리더십 유형의 특성과 연결하여 새로운 관점이나 구체적인 행동 방안을 제시하세요.",
        "ENTJ 리더로서 목표 달성을 중요하게 생각하시기에 현재의 정체된 상황이 더 답답하게 느껴지실 겁니다. 이럴 때는 팀의 '속도'보다는 '방향'에 대한 논의를 먼저 시작해보는 것이 좋습니다. 다음 팀 미팅 때 '우리가 왜 이 일을 하는가'에 대해 10분간 이야기 나눠보시는 건 어떨까요?",
    ),
    (
        StrategyKey::GentleChallenge,
        "리더의 저항감(이미 해봤다, 소용없다 등)을 존중하고 이해를 표현한 뒤, 기존과 다른 새로운 관점이나 아주 작은 시도를 제안하여 생각의 전환을 유도하세요.",
        "\"이미 다 해봤다\"고 느끼시는 것, 충분히 이해합니다. 많은 노력을 하셨을 거예요. 그런데 한 가지 질문을 드려볼게요. 만약 이번에는 방법이 아닌 '순서'를 바꿔본다면 어떨까요? 예를 들어, 피드백을 주기 전에 먼저 팀원의 이야기를 15분간 들어보는 것부터 시작하는 거죠.",
    ),
    (
        StrategyKey::ImmediateAction,
        "리더의 긴급한 상황을 인지하고, 탐색을 최소화하여 즉시 실행 가능한 구체적인 행동 계획을 우선순위에 따라 제시하세요.",
        "급한 상황이시군요. 우선 가장 중요한 것부터 처리해봅시다.\n\n**오늘 당장:**\n1. 핵심 팀원 1명과 10분 대화 (상황 파악)\n2. 가장 시급한 이슈 1개 선정\n\n**내일:**\n1. 팀 긴급 미팅 소집 (30분)\n\n필요하시면 구체적인 대화 스크립트도 준비해드릴게요.",
    ),
    (
        StrategyKey::ActionOriented,
        "리더가 실행 계획을 세울 수 있도록 SMART 목표(구체적, 측정가능, 달성가능, 관련성, 시간기반) 수립을 돕고, 첫 단계를 무엇으로 할지 명확히 정해주세요.",
        "좋은 생각입니다! 그럼 다음 주까지 '팀원 A와 신뢰 회복을 위한 1:1 미팅 1회 진행'을 첫 목표로 삼아볼까요? 성공 기준은 미팅 후 팀원 A가 '대화가 편안했다'고 느끼는 것으로 하고요.",
    ),
    (
        StrategyKey::GentleRedirect,
        "리더의 오프토픽 질문을 부드럽게 인정하면서도, 자연스럽게 리더십 주제로 대화를 전환하세요.",
        "날씨가 변덕스럽긴 하죠! 그런데 궁금한데요, 혹시 오늘 팀 분위기도 좀 무겁거나 어려운 점이 있으셨나요? 때로는 날씨처럼 팀 분위기도 영향을 줄 수 있거든요.",
    ),
    (
        StrategyKey::RedirectToExpert,
        "AI 코치의 전문 분야(리더십, 팀 관리)가 아님을 명확히 하고, 해당 분야의 전문가와 상담할 것을 정중하게 권유하세요.",
        "말씀하신 법률 문제는 제가 정확한 답변을 드리기 어려운 전문 분야입니다. 팀원의 해고와 관련된 법적 절차는 반드시 노무사나 변호사와 같은 전문가와 상담하여 안전하게 진행하시는 것이 중요합니다.",
    ),
    (
        StrategyKey::ServiceInfo,
        "AI 코치 서비스 자체에 대한 질문임을 인지하고, 서비스의 목적과 기능에 대해 간결하게 안내한 뒤, 다시 리더십 코칭으로 대화를 유도하세요.",
        "저는 리더님들의 리더십 고민에 대해 함께 이야기 나누고 해결 방안을 찾는 AI 코치입니다. 혹시 리더십과 관련해서 더 나누고 싶은 이야기가 있으신가요?",
    ),
    (
        StrategyKey::ClarifyQuestion,
        "질문의 의도가 불분명함을 알리고, 리더가 생각을 정리할 수 있도록 구체적인 예시를 들어주거나 다른 방식으로 질문해달라고 요청하세요.",
        "제가 질문의 의도를 명확히 파악하지 못했어요. 혹시 조금 더 구체적으로 예를 들어 설명해주실 수 있을까요?",
    ),
];
