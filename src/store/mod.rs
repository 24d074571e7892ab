//! Report persistence
//!
//! Interpretation reports are looked up by `(user_id, report_id)`.
//! Currently in-memory; the trait is the seam for a database backend.

use crate::models::Report;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Trait for report persistence
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    async fn save_report(&self, report: Report) -> Result<()>;

    async fn load_report(&self, user_id: &str, report_id: &str) -> Result<Option<Report>>;

    /// Reports of one user, newest first
    async fn list_reports(&self, user_id: &str) -> Result<Vec<Report>>;
}

type ReportKey = (String, String);

/// In-memory report store for development
pub struct InMemoryReportStore {
    reports: Arc<RwLock<HashMap<ReportKey, Report>>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.reports.read().await.len()
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ReportStore for InMemoryReportStore {
    async fn save_report(&self, report: Report) -> Result<()> {
        let key = (report.user_id.clone(), report.report_id.clone());
        info!(user_id = %report.user_id, report_id = %report.report_id, "Report stored");

        let mut reports = self.reports.write().await;
        reports.insert(key, report);
        Ok(())
    }

    async fn load_report(&self, user_id: &str, report_id: &str) -> Result<Option<Report>> {
        let reports = self.reports.read().await;
        let report = reports
            .get(&(user_id.to_string(), report_id.to_string()))
            .cloned();

        if report.is_none() {
            debug!(user_id, report_id, "Report not found");
        }

        Ok(report)
    }

    async fn list_reports(&self, user_id: &str) -> Result<Vec<Report>> {
        let reports = self.reports.read().await;
        let mut owned: Vec<Report> = reports
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();

        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}
