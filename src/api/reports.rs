//! Report and karma endpoints
//!
//! Submission and adjudication flow exclusively through the report
//! workflow; this layer only validates request shape and maps domain
//! errors onto status codes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error_response;
use crate::api::middleware::{require_admin_key, validate_device_token, DeviceId};
use crate::karma::{AccessTier, DailyCycleManager, KarmaLedger, Report, ReportStatus, ReportWorkflow};

const REASON_MIN_LEN: usize = 10;
const REASON_MAX_LEN: usize = 500;

/// API state for report endpoints
#[derive(Clone)]
pub struct ReportApiState {
    pub ledger: KarmaLedger,
    pub workflow: Arc<ReportWorkflow>,
    pub daily: Arc<DailyCycleManager>,
    pub admin_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub reported_device_id: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: Uuid,
    pub status: ReportStatus,
    pub resolved_at: Option<DateTime<Utc>>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct KarmaQuery {
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct KarmaResponse {
    pub device_id: String,
    pub karma_score: i32,
    pub access_tier: AccessTier,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompleteQuery {
    #[serde(default)]
    pub used_filter: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatCompleteResponse {
    pub success: bool,
    pub new_karma: i32,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjudicateRequest {
    pub is_valid: bool,
    pub admin_api_key: String,
}

/// Bounds count characters, not bytes.
fn validate_reason(reason: &str) -> Result<(), String> {
    let chars = reason.chars().count();
    if chars < REASON_MIN_LEN || chars > REASON_MAX_LEN {
        return Err(format!(
            "Reason must be {} to {} characters",
            REASON_MIN_LEN, REASON_MAX_LEN
        ));
    }
    Ok(())
}

fn report_response(report: Report, message: &str) -> ReportResponse {
    ReportResponse {
        id: report.id,
        status: report.status,
        resolved_at: report.resolved_at,
        message: message.to_string(),
    }
}

/// POST /submit - Report another user
pub async fn submit_report(
    State(state): State<ReportApiState>,
    DeviceId(reporter_device_id): DeviceId,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, (StatusCode, String)> {
    validate_device_token(&payload.reported_device_id)
        .map_err(|message| (StatusCode::BAD_REQUEST, message))?;

    validate_reason(&payload.reason).map_err(|message| (StatusCode::BAD_REQUEST, message))?;

    let report = state
        .workflow
        .submit(&reporter_device_id, &payload.reported_device_id, &payload.reason)
        .await
        .map_err(error_response)?;

    Ok(Json(report_response(
        report,
        "Report submitted. The user has been penalized.",
    )))
}

/// GET /karma - Karma score and access tier for a device
pub async fn get_karma(
    State(state): State<ReportApiState>,
    Query(query): Query<KarmaQuery>,
) -> Result<Json<KarmaResponse>, (StatusCode, String)> {
    let karma_score = state
        .ledger
        .current_score(&query.device_id)
        .await
        .map_err(error_response)?;
    let access_tier = AccessTier::for_score(karma_score, state.ledger.settings());

    Ok(Json(KarmaResponse {
        device_id: query.device_id,
        karma_score,
        access_tier,
    }))
}

/// POST /chat-complete - Award the completion bonus and record the match
pub async fn complete_chat(
    State(state): State<ReportApiState>,
    DeviceId(device_id): DeviceId,
    Query(query): Query<ChatCompleteQuery>,
) -> Result<Json<ChatCompleteResponse>, (StatusCode, String)> {
    let new_karma = state
        .ledger
        .award_chat_completion(&device_id)
        .await
        .map_err(error_response)?;
    state
        .daily
        .record_match(&device_id, query.used_filter)
        .await
        .map_err(error_response)?;

    Ok(Json(ChatCompleteResponse {
        success: true,
        new_karma,
        message: "Chat completed! Karma bonus awarded.".to_string(),
    }))
}

/// POST /{report_id}/verify - Adjudicate a pending report (admin only)
pub async fn adjudicate_report(
    State(state): State<ReportApiState>,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<AdjudicateRequest>,
) -> Result<Json<ReportResponse>, (StatusCode, String)> {
    require_admin_key(&state.admin_api_key, &payload.admin_api_key)?;

    let report = state
        .workflow
        .verify(report_id, payload.is_valid)
        .await
        .map_err(error_response)?;

    Ok(Json(report_response(report, "Report adjudicated.")))
}

/// Create the report/karma router
pub fn create_report_router(state: ReportApiState) -> Router {
    Router::new()
        .route("/submit", post(submit_report))
        .route("/karma", get(get_karma))
        .route("/chat-complete", post(complete_chat))
        .route("/{report_id}/verify", post(adjudicate_report))
        .with_state(state)
}
