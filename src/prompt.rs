//! Prompt Assembler
//!
//! Turns an analysis and strategy decision into the system prompt, joins
//! report / reference context into one block, and lays out the final
//! message list handed to the text generator.

use crate::llm::PromptMessage;
use crate::models::{AnalysisResult, ConversationHistory, MessageRole, RetrievedDocument, StrategyDecision};

/// Coach persona and answer rules shared by every strategy
pub const BASE_SYSTEM_PROMPT: &str = "당신은 실제 조직에서 수많은 리더들을 코칭해온 리더십 전문가입니다.
따뜻한 공감과 날카로운 통찰을 균형있게 제공하며, 실무에서 바로 적용 가능한 조언을 드립니다.

[핵심 원칙]
1. 진정성: 기계적인 답변이 아닌, 실제 전문가처럼 자연스럽게 대화합니다.
2. 공감 우선: 리더의 감정과 상황을 먼저 이해하고 인정합니다.
3. 점진적 깊이: 대화 흐름에 따라 깊이를 조절하며, 한 번에 모든 것을 말하지 않습니다.
4. 구체적 실행: 추상적 조언보다는 \"내일 아침에 이렇게 해보세요\"와 같이 즉시 실행 가능한 제안을 합니다.

[답변 가이드]
- 말투: 존중하는 반말체 (\"~해보세요\", \"~인 것 같아요\", \"~네요\")
- 길이: 2-4문단 (한 번에 1-2가지 핵심만 전달)
- 스타일: 대화하듯 자연스럽게, 강의하지 말 것
- 마크다운 사용 금지 (**, *, #, - 등)
";

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

const NO_TRAITS_LABEL: &str = "일반 질문";

const CLOSING_LINE: &str = "이제 아래 맥락과 질문을 바탕으로, 위 지시에 따라 답변을 생성하세요.";

/// Appended when the engagement score suggests a human consultant
pub const CONSULTATION_HINT: &str = "[추가 안내]
리더가 대화에 깊이 몰입하고 있습니다. 답변의 마지막에 자연스럽게, 원한다면 전문 코치와의 1:1 상담도 함께 받아볼 수 있다고 한 문장으로 안내하세요.";

/// Number of prior history entries replayed to the generator
pub const DEFAULT_PROMPT_HISTORY_TURNS: usize = 3;

/// Build the system prompt for one turn
pub fn generate_system_prompt(decision: &StrategyDecision, analysis: &AnalysisResult) -> String {
    let traits = if analysis.traits.is_empty() {
        NO_TRAITS_LABEL.to_string()
    } else {
        analysis
            .traits
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut parts = vec![
        BASE_SYSTEM_PROMPT.to_string(),
        format!("\n{}", SEPARATOR),
        "**현재 대화 분석**".to_string(),
        format!("- 대화 단계: {}", analysis.stage.display_name()),
        format!("- 질문 특성: {}", traits),
        "\n**수행할 응답 전략**".to_string(),
        format!("- 전략명: {}", decision.strategy_key),
        format!("- 지시사항: {}", decision.instruction),
    ];

    if !decision.example.is_empty() {
        parts.push(format!("- 예시: {}", decision.example));
    }

    parts.push(SEPARATOR.to_string());
    parts.push(CLOSING_LINE.to_string());

    parts.join("\n")
}

/// System prompt plus the consultation hint
pub fn with_consultation_hint(system_prompt: &str) -> String {
    format!("{}\n\n{}", system_prompt, CONSULTATION_HINT)
}

/// Join reference documents into one block, best match first
pub fn format_documents(documents: &[RetrievedDocument]) -> Option<String> {
    if documents.is_empty() {
        return None;
    }

    let body = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("{}. {}", i + 1, doc.content.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    Some(body)
}

/// Context block: leadership type, then report summary and references if present
pub fn get_context_string(
    leadership_type: &str,
    report_context: Option<&str>,
    retrieved_context: Option<&str>,
) -> String {
    let mut parts = vec![format!("리더의 리더십 유형은 {}입니다.", leadership_type)];

    if let Some(report) = report_context.filter(|r| !r.is_empty()) {
        parts.push(format!("\n[리포트 요약]\n{}", report));
    }

    if let Some(retrieved) = retrieved_context.filter(|r| !r.is_empty()) {
        parts.push(format!("\n[관련 참고자료]\n{}", retrieved));
    }

    parts.join("\n")
}

/// System message, the last `history_turns` entries, then the question with context
pub fn build_final_prompt(
    question: &str,
    system_prompt: &str,
    context: &str,
    history: Option<&ConversationHistory>,
    history_turns: usize,
) -> Vec<PromptMessage> {
    let mut messages = vec![PromptMessage::system(system_prompt)];

    if let Some(history) = history {
        for message in history.recent(history_turns).messages() {
            messages.push(match message.role {
                MessageRole::User => PromptMessage::user(message.content.clone()),
                MessageRole::Assistant => PromptMessage::assistant(message.content.clone()),
            });
        }
    }

    messages.push(PromptMessage::user(format!(
        "[현재 대화의 전체 맥락]\n{}\n\n[리더의 질문]\n{}",
        context, question
    )));

    messages
}

/// Optional descriptive data about a leadership type
#[derive(Debug, Clone, Default)]
pub struct LeadershipProfile {
    pub description: String,
    pub strengths: String,
    pub best_situations: Vec<String>,
}

/// Prompt for the long-form interpretation report
pub fn get_interpretation_prompt(
    leadership_type: &str,
    profile: &LeadershipProfile,
    followership_types: &[String],
) -> String {
    let follower_context = if followership_types.is_empty() {
        String::new()
    } else {
        let lines = followership_types
            .iter()
            .map(|f| format!("- {}", f))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\n\n**팀원의 팔로워십 유형:**\n{}", lines)
    };

    let summary = if profile.strengths.is_empty() {
        profile.description.as_str()
    } else {
        profile.strengths.as_str()
    };

    let situations = if profile.best_situations.is_empty() {
        "다양한 상황에서 강점을 발휘합니다".to_string()
    } else {
        profile.best_situations.join(", ")
    };

    format!(
        "당신은 리더십 코칭 전문가입니다. 다음 리더에 대한 심층 분석 리포트를 작성해주세요.

리더십 유형: {ty}
{follower_context}

다음과 같은 전문 보고서 형식으로 작성해주세요. 마크다운 기호(#, *, -, 등)를 사용하지 말고 순수 텍스트로 작성하되, 섹션 제목은 명확히 구분해주세요:

{sep}
리더십 분석 보고서
{sep}

[개요]

리더십 유형: {ty}

{summary}

이럴 때 강하다: {situations}


[1. 팀 운영의 어려움]

{ty} 리더가 팀을 운영할 때 흔히 겪는 3-4가지 주요 어려움을 구체적인 상황 예시와 함께 설명해주세요. 각 어려움이 왜 발생하는지 리더십 유형 특성과 연결하여 분석해주세요.


[2. 팔로워와의 협업 궁합]

각 팔로워십 유형(Driver, Thinker, Supporter, Doer, Follower)과의 협업 시 다음 내용을 포함해주세요:
- 궁합 점수 (상/중/하)
- 시너지 포인트 (어떤 점에서 잘 맞는가)
- 주의 포인트 (어떤 점에서 충돌할 수 있는가)
- 효과적인 협업 방법 1-2가지


[3. 코칭팁]

《시니어 리더일 때》 (5년 이상 경력)
리더십 강화를 위한 3가지 핵심 조언, 조직 영향력을 높이는 방법, 후배 리더 육성 시 주의점을 제시해주세요.

《주니어 리더일 때》 (5년 미만 경력)
리더십 기반을 다지기 위한 3가지 핵심 조언, 팀원 신뢰 구축 방법, 초기 리더로서 피해야 할 실수를 제시해주세요.


[4. 리더십 개발 성과지표]

{ty} 리더가 성장하고 있다는 것을 보여주는 5가지 구체적인 지표와 각 지표를 측정하고 추적하는 방법을 제시해주세요. 3개월, 6개월, 1년 단위 마일스톤도 포함해주세요.


[5. 리더십 리스크 신호]

{ty} 리더가 주의해야 할 5가지 위험 신호와 각 신호가 나타날 때의 구체적인 상황, 그리고 신호 감지 시 즉시 취해야 할 조치를 설명해주세요.

{sep}

작성 가이드라인:
1. 마크다운 기호를 사용하지 말고 순수 텍스트로 작성
2. 섹션은 [ ] 로 표시하고, 하위 항목은 《 》 로 표시
3. 전문적이면서도 이해하기 쉬운 언어 사용
4. 구체적이고 실행 가능한 조언 제공
5. 긍정적이고 성장 지향적인 톤 유지
6. 한국 기업 문화에 적합한 예시 사용

위 형식으로 리포트를 작성해주세요:",
        ty = leadership_type,
        follower_context = follower_context,
        sep = SEPARATOR,
        summary = summary,
        situations = situations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ConversationAnalyzer;
    use crate::llm::PromptRole;
    use crate::models::{Message, QuestionTrait, Stage, StrategyKey};
    use crate::strategy::StrategySelector;

    fn decision_for(question: &str, history: Option<&ConversationHistory>) -> (StrategyDecision, AnalysisResult) {
        let analysis = ConversationAnalyzer::default().analyze(question, history);
        let decision = StrategySelector::default().get_response_strategy(&analysis);
        (decision, analysis)
    }

    #[test]
    fn test_system_prompt_layout() {
        let (decision, analysis) = decision_for("안녕하세요!", None);
        let prompt = generate_system_prompt(&decision, &analysis);

        assert!(prompt.starts_with(BASE_SYSTEM_PROMPT));
        assert!(prompt.contains("**현재 대화 분석**"));
        assert!(prompt.contains("- 대화 단계: Greeting"));
        assert!(prompt.contains("- 질문 특성: 인사"));
        assert!(prompt.contains("- 전략명: warm_welcome"));
        assert!(prompt.contains(&format!("- 지시사항: {}", decision.instruction)));
        assert!(prompt.contains(&format!("- 예시: {}", decision.example)));
        assert!(prompt.ends_with(CLOSING_LINE));
        assert_eq!(prompt.matches(SEPARATOR).count(), 2);
    }

    #[test]
    fn test_system_prompt_stage_and_traits() {
        let (decision, mut analysis) = decision_for("팀원 동기부여 방법이 궁금해요", None);
        analysis.stage = Stage::DeepCoaching;
        analysis.traits = [QuestionTrait::SpecificRequest, QuestionTrait::Complex].into_iter().collect();

        let prompt = generate_system_prompt(&decision, &analysis);
        assert!(prompt.contains("- 대화 단계: Deep_coaching"));
        assert!(prompt.contains("- 질문 특성: 구체적요청, 복잡한상황"));

        analysis.traits.clear();
        let prompt = generate_system_prompt(&decision, &analysis);
        assert!(prompt.contains("- 질문 특성: 일반 질문"));
    }

    #[test]
    fn test_empty_example_is_omitted() {
        let (mut decision, analysis) = decision_for("asdfasdf", None);
        assert_eq!(decision.strategy_key, StrategyKey::ClarifyQuestion);
        decision.example.clear();

        let prompt = generate_system_prompt(&decision, &analysis);
        assert!(!prompt.contains("- 예시:"));
    }

    #[test]
    fn test_consultation_hint() {
        let prompt = with_consultation_hint("base");
        assert!(prompt.starts_with("base\n\n"));
        assert!(prompt.ends_with(CONSULTATION_HINT));
    }

    #[test]
    fn test_context_string() {
        assert_eq!(get_context_string("ENTJ", None, None), "리더의 리더십 유형은 ENTJ입니다.");

        let full = get_context_string("ENTJ", Some("요약"), Some("1. 자료"));
        assert_eq!(
            full,
            "리더의 리더십 유형은 ENTJ입니다.\n\n[리포트 요약]\n요약\n\n[관련 참고자료]\n1. 자료"
        );

        let empty_report = get_context_string("ENTJ", Some(""), Some("자료"));
        assert!(!empty_report.contains("[리포트 요약]"));
    }

    #[test]
    fn test_format_documents() {
        assert!(format_documents(&[]).is_none());

        let docs = vec![
            RetrievedDocument {
                document_id: "a".into(),
                content: " 첫 번째 ".into(),
                doc_type: None,
                similarity_score: 0.9,
            },
            RetrievedDocument {
                document_id: "b".into(),
                content: "두 번째".into(),
                doc_type: Some("case".into()),
                similarity_score: 0.5,
            },
        ];
        assert_eq!(format_documents(&docs).as_deref(), Some("1. 첫 번째\n2. 두 번째"));
    }

    #[test]
    fn test_final_prompt_replays_recent_turns() {
        let history = ConversationHistory::from_messages(vec![
            Message::user("첫 질문"),
            Message::assistant("첫 답변"),
            Message::user("두 번째 질문"),
            Message::assistant("두 번째 답변"),
        ]);

        let messages = build_final_prompt("새 질문", "system", "맥락", Some(&history), 3);

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, PromptRole::System);
        assert_eq!(messages[1].role, PromptRole::Assistant);
        assert_eq!(messages[1].content, "첫 답변");
        assert_eq!(messages[2].role, PromptRole::User);
        assert_eq!(messages[4].role, PromptRole::User);
        assert_eq!(messages[4].content, "[현재 대화의 전체 맥락]\n맥락\n\n[리더의 질문]\n새 질문");

        let bare = build_final_prompt("새 질문", "system", "맥락", None, 3);
        assert_eq!(bare.len(), 2);
    }

    #[test]
    fn test_interpretation_prompt() {
        let profile = LeadershipProfile {
            description: "설명".into(),
            strengths: String::new(),
            best_situations: vec![],
        };
        let prompt = get_interpretation_prompt("ENTJ", &profile, &["Driver".to_string()]);

        assert!(prompt.contains("리더십 유형: ENTJ"));
        assert!(prompt.contains("- Driver"));
        assert!(prompt.contains("\n설명\n"));
        assert!(prompt.contains("다양한 상황에서 강점을 발휘합니다"));
        assert!(prompt.ends_with("위 형식으로 리포트를 작성해주세요:"));
    }
}
