//! Reference document retrieval
//!
//! `Retriever` is the seam for a vector search backend. The in-memory
//! implementation ranks documents by character-bigram overlap with the
//! query, which works for Korean text without a tokenizer.

use crate::models::RetrievedDocument;
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &'static str;

    /// Up to `top_k` documents, best match first
    async fn search(&self, query: &str, top_k: usize, doc_type: Option<&str>) -> Result<Vec<RetrievedDocument>>;
}

/// Retriever that never finds anything
pub struct NoopRetriever;

#[async_trait::async_trait]
impl Retriever for NoopRetriever {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn search(&self, _query: &str, _top_k: usize, _doc_type: Option<&str>) -> Result<Vec<RetrievedDocument>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    document_id: String,
    content: String,
    doc_type: Option<String>,
    bigrams: HashSet<(char, char)>,
}

pub struct InMemoryRetriever {
    documents: Arc<RwLock<Vec<IndexedDocument>>>,
}

impl InMemoryRetriever {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn add_document(
        &self,
        document_id: impl Into<String>,
        content: impl Into<String>,
        doc_type: Option<&str>,
    ) {
        let content = content.into();
        let doc = IndexedDocument {
            document_id: document_id.into(),
            bigrams: bigrams(&content),
            content,
            doc_type: doc_type.map(str::to_string),
        };

        self.documents.write().await.push(doc);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

impl Default for InMemoryRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Retriever for InMemoryRetriever {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn search(&self, query: &str, top_k: usize, doc_type: Option<&str>) -> Result<Vec<RetrievedDocument>> {
        let query_bigrams = bigrams(query);
        if query_bigrams.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;

        let mut scored: Vec<RetrievedDocument> = documents
            .iter()
            .filter(|d| doc_type.map_or(true, |t| d.doc_type.as_deref() == Some(t)))
            .filter_map(|d| {
                let shared = d.bigrams.intersection(&query_bigrams).count();
                let score = shared as f32 / query_bigrams.len() as f32;

                (shared > 0).then(|| RetrievedDocument {
                    document_id: d.document_id.clone(),
                    content: d.content.clone(),
                    doc_type: d.doc_type.clone(),
                    similarity_score: score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity_score
                .total_cmp(&a.similarity_score)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        scored.truncate(top_k);

        debug!(hits = scored.len(), top_k, "Reference search completed");
        Ok(scored)
    }
}

/// Adjacent character pairs inside each word, lowercased
fn bigrams(text: &str) -> HashSet<(char, char)> {
    let lower = text.to_lowercase();
    let mut pairs = HashSet::new();

    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        let chars: Vec<char> = word.chars().collect();
        for pair in chars.windows(2) {
            pairs.insert((pair[0], pair[1]));
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryRetriever {
        let retriever = InMemoryRetriever::new();
        retriever
            .add_document("d1", "팀원과 1:1 면담을 할 때는 먼저 듣는 시간을 충분히 가지세요.", Some("guide"))
            .await;
        retriever
            .add_document("d2", "회의에서 반대 의견이 나올 때 갈등을 다루는 방법", Some("case"))
            .await;
        retriever
            .add_document("d3", "분기 목표를 SMART 기준으로 세우는 법", Some("guide"))
            .await;
        retriever
    }

    #[tokio::test]
    async fn test_ranks_by_overlap() {
        let retriever = seeded().await;
        let docs = retriever.search("회의 때 반대 의견과 갈등", 5, None).await.unwrap();

        assert!(!docs.is_empty());
        assert_eq!(docs[0].document_id, "d2");
        assert!(docs.windows(2).all(|w| w[0].similarity_score >= w[1].similarity_score));
    }

    #[tokio::test]
    async fn test_top_k_and_type_filter() {
        let retriever = seeded().await;

        let one = retriever.search("팀원 면담 목표 회의", 1, None).await.unwrap();
        assert_eq!(one.len(), 1);

        let guides = retriever.search("팀원 면담 목표 회의", 5, Some("guide")).await.unwrap();
        assert!(guides.iter().all(|d| d.doc_type.as_deref() == Some("guide")));
    }

    #[tokio::test]
    async fn test_empty_query_and_noop() {
        let retriever = seeded().await;
        assert!(retriever.search("", 5, None).await.unwrap().is_empty());
        assert!(retriever.search("팀원", 0, None).await.unwrap().is_empty());
        assert!(NoopRetriever.search("팀원", 5, None).await.unwrap().is_empty());
    }

    #[test]
    fn test_bigrams_stay_inside_words() {
        let pairs = bigrams("팀 목표");
        assert_eq!(pairs.len(), 1);
        assert!(pairs.contains(&('목', '표')));
    }
}
