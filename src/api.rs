//! REST API server for the coaching engine
//!
//! Exposes turn analysis, engagement scoring, interpretation reports and
//! report-grounded Q&A (blocking and Server-Sent Events).

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::coaching::{CoachingService, QueryRequest};
use crate::error::CoachError;
use crate::leadership::AssessmentData;
use crate::models::ConversationHistory;

pub const SERVICE_NAME: &str = "Link-Coach API";

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub question: String,
    #[serde(default)]
    pub conversation_history: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct EngagementRequest {
    #[serde(default)]
    pub conversation_history: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct InterpretationRequest {
    pub user_id: String,
    pub leadership_type: String,
    /// Raw assessment; scores are checked against `leadership_type`
    #[serde(default)]
    pub assessment_data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryBody {
    pub user_id: String,
    pub report_id: String,
    pub question: String,
    #[serde(default)]
    pub conversation_history: Option<Vec<serde_json::Value>>,
}

impl QueryBody {
    fn into_request(self) -> QueryRequest {
        QueryRequest {
            user_id: self.user_id,
            report_id: self.report_id,
            question: self.question,
            history: history_from(self.conversation_history),
        }
    }
}

fn history_from(entries: Option<Vec<serde_json::Value>>) -> ConversationHistory {
    ConversationHistory::from_raw_entries(entries.unwrap_or_default())
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: match serde_json::to_value(data) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Response data could not be serialized: {}", e);
                    None
                }
            },
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn status_for(err: &CoachError) -> StatusCode {
    match err {
        CoachError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        CoachError::ReportNotFound(_) | CoachError::AuditRecordNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(context: &str, err: CoachError) -> (StatusCode, Json<ApiResponse>) {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("{} failed: {}", context, err);
    } else {
        info!(%status, "{} rejected: {}", context, err);
    }
    (status, Json(ApiResponse::error(err.to_string())))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<CoachingService>,
    pub environment: String,
}

/// =============================
/// Health Endpoints
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment,
        "generator": state.service.generator_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": format!("{} is running", SERVICE_NAME),
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health"
    }))
}

/// =============================
/// Analysis Endpoints
/// =============================

async fn analyze_turn(
    State(state): State<ApiState>,
    Json(req): Json<AnalyzeRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let history = history_from(req.conversation_history);

    match state.service.analyze_turn(&req.question, &history) {
        Ok(decision) => (StatusCode::OK, Json(ApiResponse::success(decision))),
        Err(e) => failure("Turn analysis", e),
    }
}

async fn score_engagement(
    State(state): State<ApiState>,
    Json(req): Json<EngagementRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let history = history_from(req.conversation_history);
    let score = state.service.score_engagement(&history);
    (StatusCode::OK, Json(ApiResponse::success(score)))
}

/// =============================
/// Coaching Endpoints
/// =============================

async fn generate_interpretation(
    State(state): State<ApiState>,
    Json(req): Json<InterpretationRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    info!(user_id = %req.user_id, leadership_type = %req.leadership_type, "Interpretation requested");

    let assessment = req.assessment_data.as_ref().and_then(AssessmentData::from_value);

    match state
        .service
        .generate_interpretation(&req.user_id, &req.leadership_type, assessment.as_ref())
        .await
    {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "report_id": report.report_id,
                "interpretation": report.interpretation,
            }))),
        ),
        Err(e) => failure("Interpretation", e),
    }
}

async fn list_reports(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.service.list_reports(&query.user_id).await {
        Ok(reports) => (StatusCode::OK, Json(ApiResponse::success(reports))),
        Err(e) => failure("Report listing", e),
    }
}

async fn query_non_streaming(
    State(state): State<ApiState>,
    Json(req): Json<QueryBody>,
) -> (StatusCode, Json<ApiResponse>) {
    info!(user_id = %req.user_id, report_id = %req.report_id, "Q&A requested (non-streaming)");

    match state.service.answer(req.into_request()).await {
        Ok(answer) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "answer": answer.answer,
                "strategy": answer.decision.strategy.strategy_key,
                "stage": answer.decision.analysis.stage,
                "audit_id": answer.audit_id,
            }))),
        ),
        Err(e) => failure("Q&A", e),
    }
}

/// Streams `data: <fragment>` events, then `data: [DONE]`.
/// A generation failure mid-stream is sent as `data: {"error": ...}`.
async fn query_streaming(State(state): State<ApiState>, Json(req): Json<QueryBody>) -> Response {
    info!(user_id = %req.user_id, report_id = %req.report_id, "Q&A requested (streaming)");

    let stream = match state.service.answer_stream(req.into_request()).await {
        Ok(stream) => stream,
        Err(e) => return failure("Streaming Q&A", e).into_response(),
    };

    let events = stream
        .fragments
        .map(|fragment| match fragment {
            Ok(text) => Event::default().data(text.replace('\r', "")),
            Err(e) => {
                error!("Streaming generation failed: {}", e);
                Event::default().data(
                    serde_json::json!({ "error": format!("답변 생성 중 오류가 발생했습니다: {}", e) }).to_string(),
                )
            }
        })
        .chain(stream::once(async { Event::default().data("[DONE]") }))
        .map(Ok::<_, Infallible>);

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

/// =============================
/// Audit Endpoints
/// =============================

async fn audit_trail(
    State(state): State<ApiState>,
    Query(query): Query<UserQuery>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.service.audit_trail(&query.user_id).await {
        Ok(ids) => (StatusCode::OK, Json(ApiResponse::success(ids))),
        Err(e) => failure("Audit listing", e),
    }
}

/// Record, fingerprint check and replay of one answered turn
async fn inspect_audit(
    State(state): State<ApiState>,
    Path(audit_id): Path<Uuid>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.service.inspect_audit(audit_id).await {
        Ok(inspection) => (StatusCode::OK, Json(ApiResponse::success(inspection))),
        Err(e) => failure("Audit inspection", e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(service: Arc<CoachingService>, environment: impl Into<String>) -> Router {
    let state = ApiState {
        service,
        environment: environment.into(),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/coaching/analyze", post(analyze_turn))
        .route("/api/coaching/engagement", post(score_engagement))
        .route("/api/coaching/interpretation", post(generate_interpretation))
        .route("/api/coaching/reports", get(list_reports))
        .route("/api/coaching/query", post(query_streaming))
        .route("/api/coaching/query-non-streaming", post(query_non_streaming))
        .route("/api/coaching/audit", get(audit_trail))
        .route("/api/coaching/audit/:audit_id", get(inspect_audit))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    service: Arc<CoachingService>,
    port: u16,
    environment: String,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(service, environment);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
