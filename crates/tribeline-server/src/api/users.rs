use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tribeline_core::{DocumentStore, NotificationRecord, PointsBucket, UserAggregate, UserId};
use tribeline_engine::{
    ActivityKind, ActivityReport, LoginReport, ProfileReport, ProfileUpdate, TribeReport,
};

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState};

/// Challenge a login can finish.
const DAILY_ACTIVE_CHALLENGE: u32 = 5;

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    user_id: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ActivityRequest {
    kind: ActivityKind,
}

#[derive(Debug, Deserialize)]
pub(super) struct TribeRequest {
    tribe: String,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "bucket", rename_all = "snake_case")]
pub(super) enum PointsRequest {
    Genre { genre: String, points: i64 },
    Keywords { sentence: String, points: i64 },
}

#[derive(Debug, Serialize)]
pub(super) struct LoginResponse {
    #[serde(flatten)]
    login: LoginReport,
    claimed: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub(super) struct PointsResponse {
    bucket: &'static str,
    keys: Vec<String>,
}

pub(super) async fn register_user<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserAggregate>>, ApiError> {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "user_id must not be empty",
        ));
    }

    let aggregate = state
        .engine
        .register(&UserId::from(user_id))
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(aggregate, req_id.0))
}

/// Record the login, then try the streak challenge. A failed claim does not
/// fail the login.
pub(super) async fn record_login<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path(user): Path<String>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user = UserId::new(user);
    let login = state
        .engine
        .record_login(&user)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    let claimed = match state.engine.claim(DAILY_ACTIVE_CHALLENGE, &user).await {
        Ok(outcome) if outcome.is_claimed() => vec![5],
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!(user = %user, error = %e, "streak claim after login failed");
            Vec::new()
        }
    };

    Ok(ApiResponse::json(LoginResponse { login, claimed }, req_id.0))
}

pub(super) async fn record_activity<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path(user): Path<String>,
    Json(body): Json<ActivityRequest>,
) -> Result<Json<ApiResponse<ActivityReport>>, ApiError> {
    let report = state
        .engine
        .record_activity(&UserId::new(user), body.kind)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(report, req_id.0))
}

pub(super) async fn join_tribe<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path(user): Path<String>,
    Json(body): Json<TribeRequest>,
) -> Result<Json<ApiResponse<TribeReport>>, ApiError> {
    let report = state
        .engine
        .join_tribe(&UserId::new(user), &body.tribe, body.role.as_deref())
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(report, req_id.0))
}

pub(super) async fn update_profile<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path(user): Path<String>,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<ProfileReport>>, ApiError> {
    let report = state
        .engine
        .update_profile(&UserId::new(user), &body)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(report, req_id.0))
}

pub(super) async fn award_points<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path(user): Path<String>,
    Json(body): Json<PointsRequest>,
) -> Result<Json<ApiResponse<PointsResponse>>, ApiError> {
    let user = UserId::new(user);
    let response = match body {
        PointsRequest::Genre { genre, points } => {
            state
                .engine
                .award_genre_points(&user, &genre, points)
                .await
                .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
            PointsResponse {
                bucket: "genre",
                keys: vec![genre.trim().to_string()],
            }
        }
        PointsRequest::Keywords { sentence, points } => {
            let keys = state
                .engine
                .award_keyword_points(&user, &sentence, points)
                .await
                .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;
            PointsResponse {
                bucket: "keywords",
                keys,
            }
        }
    };

    Ok(ApiResponse::json(response, req_id.0))
}

pub(super) async fn list_points<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path((user, bucket)): Path<(String, PointsBucket)>,
) -> Result<Json<ApiResponse<BTreeMap<String, i64>>>, ApiError> {
    let totals = state
        .engine
        .list_points(&UserId::new(user), bucket)
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(totals, req_id.0))
}

pub(super) async fn list_notifications<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path(user): Path<String>,
) -> Result<Json<ApiResponse<Vec<NotificationRecord>>>, ApiError> {
    let list = state
        .engine
        .list_notifications(&UserId::new(user))
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(list, req_id.0))
}
