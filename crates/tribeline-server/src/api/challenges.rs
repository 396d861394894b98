use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use tribeline_core::{ChallengeDefinition, DocumentStore, UserId, CATALOG};
use tribeline_engine::{ChallengeOutcome, ClaimOutcome};

use crate::middleware::RequestId;

use super::{map_engine_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ChallengeStatus {
    challenge_id: u32,
    satisfied: bool,
}

pub(super) async fn list_challenges(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<&'static [ChallengeDefinition]>> {
    ApiResponse::json(CATALOG, req_id.0)
}

pub(super) async fn get_challenge_status<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path((user, challenge_id)): Path<(String, u32)>,
) -> Result<Json<ApiResponse<ChallengeStatus>>, ApiError> {
    let satisfied = state
        .engine
        .evaluate(challenge_id, &UserId::new(user))
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(
        ChallengeStatus {
            challenge_id,
            satisfied,
        },
        req_id.0,
    ))
}

pub(super) async fn check_challenge<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path((user, challenge_id)): Path<(String, u32)>,
) -> Result<Json<ApiResponse<ChallengeOutcome>>, ApiError> {
    let outcome = state
        .engine
        .evaluate_and_notify(challenge_id, &UserId::new(user))
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(outcome, req_id.0))
}

pub(super) async fn claim_challenge<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Path((user, challenge_id)): Path<(String, u32)>,
) -> Result<Json<ApiResponse<ClaimOutcome>>, ApiError> {
    let outcome = state
        .engine
        .claim(challenge_id, &UserId::new(user))
        .await
        .map_err(|e| map_engine_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::json(outcome, req_id.0))
}
