//! Session and verification endpoints
//!
//! Session initiation runs the daily cycle in its contracted order: reset
//! stale counters first, then the once-per-day login bonus. Verification
//! forwards the image bytes to the external classifier and persists only the
//! returned label.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error_response;
use crate::api::middleware::DeviceId;
use crate::classify::{Classifier, ClassifyError};
use crate::karma::{AccessTier, DailyCycleManager, Identity, KarmaLedger};

const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

const NICKNAME_MAX_LEN: usize = 50;
const BIO_MAX_LEN: usize = 200;

/// API state for session endpoints
#[derive(Clone)]
pub struct AuthApiState {
    pub ledger: KarmaLedger,
    pub daily: Arc<DailyCycleManager>,
    pub classifier: Arc<dyn Classifier>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    pub nickname: String,
    pub bio: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub device_id: String,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub verification_label: Option<String>,
    pub karma_score: i32,
    pub access_tier: AccessTier,
    pub daily_filters_remaining: u32,
    pub is_verified: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub label: String,
    pub message: String,
}

/// Length limits count characters, not bytes, so multibyte nicknames get
/// the same budget as ASCII ones.
fn validate_profile_fields(nickname: &str, bio: &str) -> Result<(), String> {
    let nickname_chars = nickname.chars().count();
    if nickname_chars == 0 || nickname_chars > NICKNAME_MAX_LEN {
        return Err(format!(
            "Nickname must be 1 to {} characters",
            NICKNAME_MAX_LEN
        ));
    }
    if bio.chars().count() > BIO_MAX_LEN {
        return Err(format!("Bio must be at most {} characters", BIO_MAX_LEN));
    }
    Ok(())
}

fn user_response(
    identity: Identity,
    state: &AuthApiState,
    filters_remaining: u32,
) -> UserResponse {
    let tier = AccessTier::for_score(identity.karma_score, state.ledger.settings());
    UserResponse {
        is_verified: identity.is_verified(),
        device_id: identity.device_id,
        nickname: identity.nickname,
        bio: identity.bio,
        verification_label: identity.verification_label,
        karma_score: identity.karma_score,
        access_tier: tier,
        daily_filters_remaining: filters_remaining,
    }
}

/// POST /register - Create or resume a device session
///
/// Runs reset before award: both compare against today and the award stamps
/// `last_active_date`, so the reverse order would skip stale-counter resets.
pub async fn register(
    State(state): State<AuthApiState>,
    DeviceId(device_id): DeviceId,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    state
        .ledger
        .get_or_create(&device_id)
        .await
        .map_err(error_response)?;
    state
        .daily
        .reset_daily_limits(&device_id)
        .await
        .map_err(error_response)?;
    state
        .daily
        .award_daily_login(&device_id)
        .await
        .map_err(error_response)?;

    let identity = state
        .ledger
        .get_or_create(&device_id)
        .await
        .map_err(error_response)?;
    let filters_remaining = state
        .daily
        .filters_remaining(&device_id)
        .await
        .map_err(error_response)?;

    Ok(Json(user_response(identity, &state, filters_remaining)))
}

/// GET /me - Current user info
pub async fn me(
    State(state): State<AuthApiState>,
    DeviceId(device_id): DeviceId,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let identity = state
        .ledger
        .store()
        .get_identity(&device_id)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let filters_remaining = state
        .daily
        .filters_remaining(&device_id)
        .await
        .map_err(error_response)?;

    Ok(Json(user_response(identity, &state, filters_remaining)))
}

/// PUT /profile - Update nickname and bio
pub async fn update_profile(
    State(state): State<AuthApiState>,
    DeviceId(device_id): DeviceId,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    validate_profile_fields(&payload.nickname, &payload.bio)
        .map_err(|message| (StatusCode::BAD_REQUEST, message))?;

    let identity = state
        .ledger
        .store()
        .update_profile(&device_id, &payload.nickname, &payload.bio)
        .await
        .map_err(|e| error_response(e.into()))?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let filters_remaining = state
        .daily
        .filters_remaining(&device_id)
        .await
        .map_err(error_response)?;

    Ok(Json(user_response(identity, &state, filters_remaining)))
}

/// POST /verify - Classify a camera capture and store the label
///
/// The image is processed in memory and never persisted; only the returned
/// label survives the request.
pub async fn verify_identity(
    State(state): State<AuthApiState>,
    DeviceId(device_id): DeviceId,
    headers: HeaderMap,
    image: Bytes,
) -> Result<Json<VerifyResponse>, (StatusCode, String)> {
    let tier = state.ledger.tier(&device_id).await.map_err(error_response)?;
    if tier.is_banned() {
        return Err((
            StatusCode::FORBIDDEN,
            format!("Access denied. Account status: {}", tier),
        ));
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Invalid image format. Use JPEG, PNG, or WebP.".to_string(),
        ));
    }

    let label = state
        .classifier
        .classify(&image, content_type)
        .await
        .map_err(|err| match err {
            ClassifyError::Unclassifiable(message) => (StatusCode::BAD_REQUEST, message),
            ClassifyError::Service(message) => (StatusCode::BAD_GATEWAY, message),
        })?;

    state
        .ledger
        .record_verification(&device_id, &label)
        .await
        .map_err(error_response)?;

    Ok(Json(VerifyResponse {
        success: true,
        label,
        message: "Verification complete. Image has been discarded.".to_string(),
    }))
}

/// Create the session/verification router
pub fn create_auth_router(state: AuthApiState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/verify", post(verify_identity))
        .with_state(state)
}
