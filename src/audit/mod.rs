//! Analysis audit log and replay
//!
//! Every answered turn keeps its inputs, the analysis and the chosen
//! strategy. Inputs are fingerprinted so tampering is detectable, and a
//! record can be replayed through the analyzer to confirm the decision is
//! reproduced exactly.
//!
//! The log is bounded: past its capacity the oldest records are evicted in
//! insertion order.

use crate::analysis::ConversationAnalyzer;
use crate::models::{AnalysisResult, ConversationHistory, StrategyKey};
use crate::strategy::select_strategy_key;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub audit_id: Uuid,
    pub user_id: String,
    pub question: String,
    /// History exactly as the analyzer saw it
    pub history: ConversationHistory,
    pub analysis: AnalysisResult,
    pub strategy_key: StrategyKey,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(
        user_id: impl Into<String>,
        question: impl Into<String>,
        history: ConversationHistory,
        analysis: AnalysisResult,
        strategy_key: StrategyKey,
    ) -> Self {
        let question = question.into();
        let fingerprint = compute_fingerprint(&question, &history);

        Self {
            audit_id: Uuid::new_v4(),
            user_id: user_id.into(),
            question,
            history,
            analysis,
            strategy_key,
            fingerprint,
            created_at: Utc::now(),
        }
    }
}

/// Outcome of re-running a recorded turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub audit_id: Uuid,
    pub reproduced: bool,
    pub replayed: AnalysisResult,
    pub replayed_strategy: StrategyKey,
}

pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

#[derive(Default)]
struct AuditEntries {
    records: HashMap<Uuid, AnalysisRecord>,
    /// Insertion order, oldest first
    order: VecDeque<Uuid>,
}

/// Audit trail storage
pub struct AuditLog {
    entries: Arc<RwLock<AuditEntries>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_AUDIT_CAPACITY)
    }

    /// Keep at most `capacity` records (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(AuditEntries::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store a record, evicting the oldest ones past capacity
    pub async fn record(&self, record: AnalysisRecord) -> Result<Uuid> {
        let audit_id = record.audit_id;
        let mut entries = self.entries.write().await;

        if entries.records.insert(audit_id, record).is_none() {
            entries.order.push_back(audit_id);
        }

        while entries.order.len() > self.capacity {
            if let Some(evicted) = entries.order.pop_front() {
                entries.records.remove(&evicted);
                debug!(%evicted, capacity = self.capacity, "Audit record evicted");
            }
        }

        Ok(audit_id)
    }

    /// Retrieve a record by audit ID
    pub async fn get(&self, audit_id: Uuid) -> Result<Option<AnalysisRecord>> {
        let entries = self.entries.read().await;
        Ok(entries.records.get(&audit_id).cloned())
    }

    /// Audit IDs for a user, oldest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Uuid>> {
        let entries = self.entries.read().await;

        Ok(entries
            .order
            .iter()
            .filter(|id| entries.records.get(*id).is_some_and(|r| r.user_id == user_id))
            .copied()
            .collect())
    }

    /// Verify a record's inputs still match their fingerprint
    pub async fn verify_integrity(&self, audit_id: Uuid) -> Result<bool> {
        let entries = self.entries.read().await;

        match entries.records.get(&audit_id) {
            Some(record) => Ok(compute_fingerprint(&record.question, &record.history) == record.fingerprint),
            None => Ok(false),
        }
    }

    /// Re-run the analyzer on a recorded turn
    pub async fn replay(&self, audit_id: Uuid, analyzer: &ConversationAnalyzer) -> Result<Option<ReplayOutcome>> {
        let Some(record) = self.get(audit_id).await? else {
            return Ok(None);
        };

        let history = (!record.history.is_empty()).then_some(&record.history);
        let replayed = analyzer.analyze(&record.question, history);
        let replayed_strategy = select_strategy_key(&replayed);

        let reproduced = replayed == record.analysis && replayed_strategy == record.strategy_key;
        if reproduced {
            info!(%audit_id, "Replay reproduced recorded analysis");
        } else {
            warn!(%audit_id, "Replay diverged from recorded analysis");
        }

        Ok(Some(ReplayOutcome {
            audit_id,
            reproduced,
            replayed,
            replayed_strategy,
        }))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.records.len()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA256 hex over the JSON of `(question, history)`.
/// Streams serialization straight into the hasher.
pub fn compute_fingerprint(question: &str, history: &ConversationHistory) -> String {
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), &(question, history)).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;

    fn recorded(analyzer: &ConversationAnalyzer, user_id: &str, question: &str) -> AnalysisRecord {
        let history = ConversationHistory::from_messages(vec![
            Message::user("팀원이 말을 안 들어요"),
            Message::assistant("어떤 상황인가요?"),
        ]);
        let analysis = analyzer.analyze(question, Some(&history));
        let key = select_strategy_key(&analysis);
        AnalysisRecord::new(user_id, question, history, analysis, key)
    }

    #[test]
    fn test_fingerprint_is_stable_and_input_sensitive() {
        let history = ConversationHistory::from_messages(vec![Message::user("안녕하세요")]);

        let a = compute_fingerprint("질문", &history);
        assert_eq!(a.len(), 64);
        assert_eq!(a, compute_fingerprint("질문", &history));
        assert_ne!(a, compute_fingerprint("다른 질문", &history));
        assert_ne!(a, compute_fingerprint("질문", &ConversationHistory::new()));
    }

    #[tokio::test]
    async fn test_record_and_verify() {
        let analyzer = ConversationAnalyzer::default();
        let log = AuditLog::new();
        let id = log.record(recorded(&analyzer, "u1", "어떻게 해야 할까요?")).await.unwrap();

        assert!(log.verify_integrity(id).await.unwrap());
        assert!(!log.verify_integrity(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_tampered_record_fails_integrity() {
        let analyzer = ConversationAnalyzer::default();
        let log = AuditLog::new();
        let mut record = recorded(&analyzer, "u1", "어떻게 해야 할까요?");
        record.question = "바뀐 질문".to_string();
        let id = log.record(record).await.unwrap();

        assert!(!log.verify_integrity(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_replay_reproduces_analysis() {
        let analyzer = ConversationAnalyzer::default();
        let log = AuditLog::new();
        let id = log
            .record(recorded(&analyzer, "u1", "정말 답답해요. 이미 다 해봤는데 안 돼요"))
            .await
            .unwrap();

        let outcome = log.replay(id, &analyzer).await.unwrap().unwrap();
        assert!(outcome.reproduced);
        assert!(log.replay(Uuid::new_v4(), &analyzer).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replay_detects_divergence() {
        let analyzer = ConversationAnalyzer::default();
        let log = AuditLog::new();
        let mut record = recorded(&analyzer, "u1", "안녕하세요");
        record.analysis.is_offtopic = !record.analysis.is_offtopic;
        let id = log.record(record).await.unwrap();

        assert!(!log.replay(id, &analyzer).await.unwrap().unwrap().reproduced);
    }

    #[tokio::test]
    async fn test_list_for_user() {
        let analyzer = ConversationAnalyzer::default();
        let log = AuditLog::new();
        let first = log.record(recorded(&analyzer, "u1", "첫 질문이에요")).await.unwrap();
        let second = log.record(recorded(&analyzer, "u1", "두 번째 질문이에요")).await.unwrap();
        log.record(recorded(&analyzer, "u2", "다른 사용자")).await.unwrap();

        let ids = log.list_for_user("u1").await.unwrap();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(log.len().await, 3);
    }

    #[tokio::test]
    async fn test_oldest_records_evicted_past_capacity() {
        let analyzer = ConversationAnalyzer::default();
        let log = AuditLog::with_capacity(3);

        let mut ids = Vec::new();
        for i in 0..5 {
            let question = format!("{}번째 질문이에요", i);
            ids.push(log.record(recorded(&analyzer, "u1", &question)).await.unwrap());
        }

        assert_eq!(log.len().await, 3);
        assert!(log.get(ids[0]).await.unwrap().is_none());
        assert!(log.get(ids[1]).await.unwrap().is_none());
        assert!(log.get(ids[4]).await.unwrap().is_some());
        assert!(!log.verify_integrity(ids[0]).await.unwrap());
        assert_eq!(log.list_for_user("u1").await.unwrap(), ids[2..].to_vec());
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        assert_eq!(AuditLog::with_capacity(0).capacity(), 1);
        assert_eq!(AuditLog::new().capacity(), DEFAULT_AUDIT_CAPACITY);
    }
}
