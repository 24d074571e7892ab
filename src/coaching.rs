//! Coaching service
//!
//! Wires the analysis core to the outside world:
//! report store → analyze → strategy → engagement → retrieval → prompt → generate → audit
//!
//! The classification core stays pure; everything here that can fail is an
//! I/O edge (store, retriever, generator).

use crate::analysis::ConversationAnalyzer;
use crate::audit::{AnalysisRecord, AuditLog, ReplayOutcome};
use crate::config::Settings;
use crate::engagement::EngagementScorer;
use crate::error::CoachError;
use crate::leadership::{self, AssessmentData, LeadershipType};
use crate::lexicon::Lexicon;
use crate::llm::{GenerationRequest, PromptMessage, TextGenerator, TextStream};
use crate::models::{AnalysisResult, ConversationHistory, EngagementScore, Message, Report, StrategyDecision};
use crate::prompt;
use crate::retrieval::{NoopRetriever, Retriever};
use crate::store::{InMemoryReportStore, ReportStore};
use crate::strategy::StrategySelector;
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything decided about one turn before generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnDecision {
    pub analysis: AnalysisResult,
    pub strategy: StrategyDecision,
    pub engagement: EngagementScore,
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub user_id: String,
    pub report_id: String,
    pub question: String,
    pub history: ConversationHistory,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoachingAnswer {
    pub answer: String,
    pub decision: TurnDecision,
    pub audit_id: Uuid,
}

/// A recorded turn with its integrity and replay results
#[derive(Debug, Clone, Serialize)]
pub struct AuditInspection {
    pub record: AnalysisRecord,
    pub integrity_ok: bool,
    pub replay: ReplayOutcome,
}

pub struct CoachingStream {
    pub decision: TurnDecision,
    pub audit_id: Uuid,
    pub fragments: TextStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoachingOptions {
    /// Recent history entries used for analysis
    pub history_window: usize,
    /// History entries replayed to the generator
    pub prompt_history_turns: usize,
    pub rag_top_k: usize,
    pub max_question_chars: usize,
}

impl Default for CoachingOptions {
    fn default() -> Self {
        Self {
            history_window: 5,
            prompt_history_turns: prompt::DEFAULT_PROMPT_HISTORY_TURNS,
            rag_top_k: 5,
            max_question_chars: 500,
        }
    }
}

impl From<&Settings> for CoachingOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            history_window: settings.history_window,
            prompt_history_turns: settings.prompt_history_turns,
            rag_top_k: settings.rag_top_k,
            max_question_chars: settings.max_question_chars,
        }
    }
}

struct PreparedTurn {
    decision: TurnDecision,
    request: GenerationRequest,
    audit_id: Uuid,
}

pub struct CoachingService {
    analyzer: Arc<ConversationAnalyzer>,
    scorer: EngagementScorer,
    selector: StrategySelector,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn ReportStore>,
    retriever: Arc<dyn Retriever>,
    audit: Arc<AuditLog>,
    options: CoachingOptions,
}

impl CoachingService {
    pub fn new(lexicon: Arc<Lexicon>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            analyzer: Arc::new(ConversationAnalyzer::new(Arc::clone(&lexicon))),
            scorer: EngagementScorer::new(lexicon),
            selector: StrategySelector::default(),
            generator,
            store: Arc::new(InMemoryReportStore::new()),
            retriever: Arc::new(NoopRetriever),
            audit: Arc::new(AuditLog::new()),
            options: CoachingOptions::default(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_options(mut self, options: CoachingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn analyzer(&self) -> &ConversationAnalyzer {
        &self.analyzer
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn options(&self) -> CoachingOptions {
        self.options
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Reject questions over the configured length
    pub fn validate_question(&self, question: &str) -> Result<()> {
        let length = question.chars().count();
        if length > self.options.max_question_chars {
            return Err(CoachError::InvalidRequest(format!(
                "question is {} characters, limit is {}",
                length, self.options.max_question_chars
            )));
        }
        Ok(())
    }

    /// Analysis, strategy and engagement for one turn, without generation
    pub fn analyze_turn(&self, question: &str, history: &ConversationHistory) -> Result<TurnDecision> {
        self.validate_question(question)?;

        let window = history.recent(self.options.history_window);
        let analysis = self.analyzer.analyze(question, Some(&window));
        let strategy = self.selector.get_response_strategy(&analysis);
        let engagement = self.scorer.analyze_engagement(history);

        Ok(TurnDecision {
            analysis,
            strategy,
            engagement,
        })
    }

    pub fn score_engagement(&self, history: &ConversationHistory) -> EngagementScore {
        self.scorer.analyze_engagement(history)
    }

    /// Non-streamed answer
    pub async fn answer(&self, request: QueryRequest) -> Result<CoachingAnswer> {
        let prepared = self.prepare(&request).await?;
        let answer = self.generator.generate(prepared.request).await?;

        info!(
            user_id = %request.user_id,
            audit_id = %prepared.audit_id,
            chars = answer.chars().count(),
            "Coaching answer generated"
        );

        Ok(CoachingAnswer {
            answer,
            decision: prepared.decision,
            audit_id: prepared.audit_id,
        })
    }

    /// Streamed answer; fragments arrive in order
    pub async fn answer_stream(&self, request: QueryRequest) -> Result<CoachingStream> {
        let prepared = self.prepare(&request).await?;
        let fragments = self.generator.generate_stream(prepared.request).await?;

        Ok(CoachingStream {
            decision: prepared.decision,
            audit_id: prepared.audit_id,
            fragments,
        })
    }

    /// Generate and store the interpretation report for a leadership type.
    /// Assessment scores are checked against the claimed type; a mismatch only warns.
    pub async fn generate_interpretation(
        &self,
        user_id: &str,
        leadership_type: &str,
        assessment: Option<&AssessmentData>,
    ) -> Result<Report> {
        if leadership_type.trim().is_empty() {
            return Err(CoachError::InvalidRequest("leadership_type is required".to_string()));
        }

        info!(user_id, leadership_type, "Generating interpretation report");

        if !leadership::validate_leadership_type(leadership_type, assessment) {
            warn!(leadership_type, "Leadership type validation failed, generating anyway");
        }

        let profile = LeadershipType::from_label(leadership_type)
            .map(LeadershipType::profile)
            .unwrap_or_default();
        let followers: Vec<String> = assessment
            .map(|a| a.known_followership_types())
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.label().to_string())
            .collect();

        let prompt = prompt::get_interpretation_prompt(leadership_type, &profile, &followers);
        let interpretation = self
            .generator
            .generate(GenerationRequest::from_prompt(prompt))
            .await?;

        let report = Report {
            report_id: new_report_id(),
            user_id: user_id.to_string(),
            leadership_type: leadership_type.to_string(),
            interpretation,
            created_at: Utc::now(),
        };

        self.store.save_report(report.clone()).await?;
        info!(report_id = %report.report_id, "Interpretation report created");

        Ok(report)
    }

    /// A user's reports, newest first
    pub async fn list_reports(&self, user_id: &str) -> Result<Vec<Report>> {
        self.store.list_reports(user_id).await
    }

    /// Audit IDs of a user's answered turns, oldest first
    pub async fn audit_trail(&self, user_id: &str) -> Result<Vec<Uuid>> {
        self.audit.list_for_user(user_id).await
    }

    /// Load a recorded turn, check its fingerprint and replay it
    pub async fn inspect_audit(&self, audit_id: Uuid) -> Result<AuditInspection> {
        let record = self
            .audit
            .get(audit_id)
            .await?
            .ok_or(CoachError::AuditRecordNotFound(audit_id))?;
        let integrity_ok = self.audit.verify_integrity(audit_id).await?;
        let replay = self
            .audit
            .replay(audit_id, &self.analyzer)
            .await?
            .ok_or(CoachError::AuditRecordNotFound(audit_id))?;

        Ok(AuditInspection {
            record,
            integrity_ok,
            replay,
        })
    }

    async fn prepare(&self, request: &QueryRequest) -> Result<PreparedTurn> {
        self.validate_question(&request.question)?;

        let report = self
            .store
            .load_report(&request.user_id, &request.report_id)
            .await?
            .ok_or_else(|| CoachError::ReportNotFound(request.report_id.clone()))?;

        let decision = self.analyze_turn(&request.question, &request.history)?;
        let analysis = &decision.analysis;

        let references = if analysis.requires_context && !analysis.is_offtopic {
            self.retrieve(&request.question).await
        } else {
            None
        };

        let mut system_prompt = prompt::generate_system_prompt(&decision.strategy, analysis);
        if decision.engagement.should_suggest_consultation {
            system_prompt = prompt::with_consultation_hint(&system_prompt);
        }

        let context = prompt::get_context_string(
            &report.leadership_type,
            Some(&report.interpretation),
            references.as_deref(),
        );

        let messages: Vec<PromptMessage> = prompt::build_final_prompt(
            &request.question,
            &system_prompt,
            &context,
            Some(&request.history),
            self.options.prompt_history_turns,
        );

        let record = AnalysisRecord::new(
            request.user_id.clone(),
            request.question.clone(),
            request.history.recent(self.options.history_window),
            analysis.clone(),
            decision.strategy.strategy_key,
        );
        let audit_id = self.audit.record(record).await?;

        info!(
            user_id = %request.user_id,
            report_id = %request.report_id,
            stage = %analysis.stage,
            strategy = %decision.strategy.strategy_key,
            engagement = decision.engagement.total,
            references = references.is_some(),
            "Coaching turn prepared"
        );

        Ok(PreparedTurn {
            decision,
            request: GenerationRequest::new(messages),
            audit_id,
        })
    }

    /// Reference lookup. A failing retriever degrades to no references.
    async fn retrieve(&self, question: &str) -> Option<String> {
        match self.retriever.search(question, self.options.rag_top_k, None).await {
            Ok(documents) => prompt::format_documents(&documents),
            Err(e) => {
                warn!(retriever = self.retriever.name(), "Reference search failed: {}", e);
                None
            }
        }
    }
}

/// A running conversation over one report. Both sides of every answered
/// turn go into the history, so stages advance as they would for a client
/// that replays the full exchange.
#[derive(Debug, Clone)]
pub struct CoachingSession {
    user_id: String,
    report_id: String,
    history: ConversationHistory,
}

impl CoachingSession {
    pub fn new(report: &Report) -> Self {
        Self {
            user_id: report.user_id.clone(),
            report_id: report.report_id.clone(),
            history: ConversationHistory::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Answer a question and append the exchange; a failed turn leaves the history untouched
    pub async fn ask(&mut self, service: &CoachingService, question: &str) -> Result<CoachingAnswer> {
        let answer = service
            .answer(QueryRequest {
                user_id: self.user_id.clone(),
                report_id: self.report_id.clone(),
                question: question.to_string(),
                history: self.history.clone(),
            })
            .await?;

        self.history.push(Message::user(question));
        self.history.push(Message::assistant(answer.answer.clone()));

        Ok(answer)
    }
}

/// `rpt_` followed by 12 hex characters
pub fn new_report_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("rpt_{}", &hex[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockGenerator, PromptRole};
    use crate::models::{Stage, StrategyKey};
    use crate::retrieval::InMemoryRetriever;
    use futures::StreamExt;

    fn service_with(mock: Arc<MockGenerator>) -> CoachingService {
        CoachingService::new(Arc::new(Lexicon::builtin()), mock)
    }

    async fn service_with_report() -> (CoachingService, Arc<MockGenerator>, Report) {
        let mock = Arc::new(MockGenerator::new());
        let service = service_with(Arc::clone(&mock));
        let report = service.generate_interpretation("u1", "ENTJ", None).await.unwrap();
        (service, mock, report)
    }

    fn query(report: &Report, question: &str, history: ConversationHistory) -> QueryRequest {
        QueryRequest {
            user_id: report.user_id.clone(),
            report_id: report.report_id.clone(),
            question: question.to_string(),
            history,
        }
    }

    #[test]
    fn test_report_id_shape() {
        let id = new_report_id();
        assert!(id.starts_with("rpt_"));
        assert_eq!(id.len(), 16);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_question_length_limit() {
        let service = service_with(Arc::new(MockGenerator::new()));
        let history = ConversationHistory::new();

        assert!(service.analyze_turn(&"가".repeat(500), &history).is_ok());
        assert!(matches!(
            service.analyze_turn(&"가".repeat(501), &history),
            Err(CoachError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_analysis_uses_recent_window_and_engagement_uses_full_history() {
        let service = service_with(Arc::new(MockGenerator::new()));
        let history = ConversationHistory::from_messages(
            (0..12)
                .map(|i| {
                    if i % 2 == 0 {
                        Message::user("팀 분위기가 너무 힘들고 막막해요")
                    } else {
                        Message::assistant("그러셨군요")
                    }
                })
                .collect(),
        );

        let decision = service.analyze_turn("음", &history).unwrap();
        let direct = service.analyzer().analyze("음", Some(&history.recent(5)));

        assert_eq!(decision.analysis, direct);
        assert_eq!(decision.engagement, service.score_engagement(&history));
        assert_eq!(decision.engagement.depth, 15 + 2);
    }

    #[tokio::test]
    async fn test_generate_interpretation_stores_report() {
        let (service, mock, report) = service_with_report().await;

        assert_eq!(report.leadership_type, "ENTJ");
        assert_eq!(report.interpretation, crate::llm::MOCK_REPLY);

        let request = mock.last_request().await.unwrap();
        assert!(request.messages[0].content.contains("리더십 유형: ENTJ"));

        let answer = service
            .answer(query(&report, "안녕하세요!", ConversationHistory::new()))
            .await;
        assert!(answer.is_ok());
    }

    #[tokio::test]
    async fn test_blank_leadership_type_is_rejected() {
        let service = service_with(Arc::new(MockGenerator::new()));
        assert!(matches!(
            service.generate_interpretation("u1", "  ", None).await,
            Err(CoachError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_report() {
        let service = service_with(Arc::new(MockGenerator::new()));
        let request = QueryRequest {
            user_id: "u1".into(),
            report_id: "rpt_missing".into(),
            question: "안녕하세요".into(),
            history: ConversationHistory::new(),
        };

        assert!(matches!(service.answer(request).await, Err(CoachError::ReportNotFound(_))));
    }

    #[tokio::test]
    async fn test_answer_assembles_prompt_and_audits() {
        let (service, mock, report) = service_with_report().await;
        let history = ConversationHistory::from_messages(vec![
            Message::user("첫 질문"),
            Message::assistant("첫 답변"),
            Message::user("두 번째 질문"),
            Message::assistant("두 번째 답변"),
        ]);

        let answer = service
            .answer(query(&report, "정말 답답해요. 이미 다 해봤는데 안 돼요", history))
            .await
            .unwrap();

        assert_eq!(answer.decision.strategy.strategy_key, StrategyKey::GentleChallenge);

        let request = mock.last_request().await.unwrap();
        assert_eq!(request.messages.len(), 1 + 3 + 1);
        assert_eq!(request.messages[0].role, PromptRole::System);
        assert!(request.messages[0].content.contains("- 전략명: gentle_challenge"));

        let last = &request.messages[4].content;
        assert!(last.contains("리더의 리더십 유형은 ENTJ입니다."));
        assert!(last.contains("[리포트 요약]"));
        assert!(last.ends_with("[리더의 질문]\n정말 답답해요. 이미 다 해봤는데 안 돼요"));

        let audit = service.audit_log();
        assert!(audit.verify_integrity(answer.audit_id).await.unwrap());
        let replay = audit.replay(answer.audit_id, service.analyzer()).await.unwrap().unwrap();
        assert!(replay.reproduced);
    }

    #[tokio::test]
    async fn test_references_only_for_context_questions() {
        let mock = Arc::new(MockGenerator::new());
        let retriever = Arc::new(InMemoryRetriever::new());
        retriever
            .add_document("d1", "팀원 동기부여 방법: 작은 성공을 자주 인정하세요", None)
            .await;

        let service = service_with(Arc::clone(&mock)).with_retriever(retriever);
        let report = service.generate_interpretation("u1", "ENTJ", None).await.unwrap();

        service
            .answer(query(&report, "팀원 동기부여 방법이 궁금해요", ConversationHistory::new()))
            .await
            .unwrap();
        let request = mock.last_request().await.unwrap();
        assert!(request.messages.last().unwrap().content.contains("[관련 참고자료]"));

        service
            .answer(query(&report, "오늘 날씨 어때요?", ConversationHistory::new()))
            .await
            .unwrap();
        let request = mock.last_request().await.unwrap();
        assert!(!request.messages.last().unwrap().content.contains("[관련 참고자료]"));
    }

    #[tokio::test]
    async fn test_consultation_hint_follows_engagement() {
        let (service, mock, report) = service_with_report().await;
        let long = |text: &str| format!("{}{}", text, "음".repeat(100));
        let history = ConversationHistory::from_messages(vec![
            Message::user(long("요즘 너무 힘들어요. ")),
            Message::assistant("그러셨군요"),
            Message::user(long("조직 개편 이야기가 나와서요. ")),
            Message::assistant("네"),
            Message::user(long("당장 실행할 계획이 필요해요. ")),
            Message::assistant("네"),
            Message::user(long("예를 들어 12명 팀이에요. ")),
            Message::assistant("네"),
            Message::user(long("같이 생각해 주세요. ")),
        ]);

        let answer = service.answer(query(&report, "어떻게 시작할까요?", history)).await.unwrap();
        assert!(answer.decision.engagement.should_suggest_consultation);

        let request = mock.last_request().await.unwrap();
        assert!(request.messages[0].content.ends_with(prompt::CONSULTATION_HINT));

        service
            .answer(query(&report, "어떻게 시작할까요?", ConversationHistory::new()))
            .await
            .unwrap();
        let request = mock.last_request().await.unwrap();
        assert!(!request.messages[0].content.contains(prompt::CONSULTATION_HINT));
    }

    #[tokio::test]
    async fn test_answer_stream() {
        let (service, _mock, report) = service_with_report().await;

        let stream = service
            .answer_stream(query(&report, "안녕하세요!", ConversationHistory::new()))
            .await
            .unwrap();

        assert_eq!(stream.decision.strategy.strategy_key, StrategyKey::WarmWelcome);
        let text: Vec<String> = stream.fragments.map(|f| f.unwrap()).collect().await;
        assert_eq!(text.concat(), crate::llm::MOCK_REPLY);
    }

    #[tokio::test]
    async fn test_interpretation_prompt_carries_catalog_profile() {
        let mock = Arc::new(MockGenerator::new());
        let service = service_with(Arc::clone(&mock));
        let assessment = AssessmentData {
            scores: Some(leadership::LeadershipScores {
                sharing_participation: 3.5,
                interaction: 3.8,
                growth_orientation: 4.8,
            }),
            followership_types: vec!["Driver".into(), "Boss".into(), "Doer".into()],
        };

        service
            .generate_interpretation("u1", "개별비전형", Some(&assessment))
            .await
            .unwrap();

        let prompt = &mock.last_request().await.unwrap().messages[0].content;
        assert!(prompt.contains("미래 비전과 성장에 강점"));
        assert!(prompt.contains("이럴 때 강하다: 신사업/전략 기획, 문제 재정의"));
        assert!(prompt.contains("**팀원의 팔로워십 유형:**\n- Driver\n- Doer"));
        assert!(!prompt.contains("Boss"));
    }

    #[tokio::test]
    async fn test_unknown_type_still_generates_with_generic_profile() {
        let (_service, mock, report) = service_with_report().await;
        assert_eq!(report.leadership_type, "ENTJ");

        let prompt = &mock.last_request().await.unwrap().messages[0].content;
        assert!(prompt.contains("이럴 때 강하다: 다양한 상황에서 강점을 발휘합니다"));
        assert!(!prompt.contains("팔로워십 유형:**"));
    }

    #[tokio::test]
    async fn test_reports_and_audit_trail() {
        let (service, _mock, report) = service_with_report().await;
        service.generate_interpretation("u2", "과도기형", None).await.unwrap();

        let reports = service.list_reports("u1").await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].report_id, report.report_id);

        let answer = service
            .answer(query(&report, "팀원이 말을 안 들어요", ConversationHistory::new()))
            .await
            .unwrap();
        assert_eq!(service.audit_trail("u1").await.unwrap(), vec![answer.audit_id]);
        assert!(service.audit_trail("u2").await.unwrap().is_empty());

        let inspection = service.inspect_audit(answer.audit_id).await.unwrap();
        assert!(inspection.integrity_ok);
        assert!(inspection.replay.reproduced);
        assert_eq!(inspection.record.strategy_key, answer.decision.strategy.strategy_key);

        assert!(matches!(
            service.inspect_audit(Uuid::new_v4()).await,
            Err(CoachError::AuditRecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_session_records_both_sides() {
        let (service, _mock, report) = service_with_report().await;
        let mut session = CoachingSession::new(&report);

        let mut stages = Vec::new();
        for _ in 0..3 {
            stages.push(session.ask(&service, "음").await.unwrap().decision.analysis.stage);
        }

        assert_eq!(stages, vec![Stage::Greeting, Stage::Exploration, Stage::DeepCoaching]);
        assert_eq!(session.history().len(), 6);
        assert_eq!(session.history().messages().nth(1).unwrap().content, crate::llm::MOCK_REPLY);

        assert!(session.ask(&service, &"가".repeat(501)).await.is_err());
        assert_eq!(session.history().len(), 6);
    }
}
