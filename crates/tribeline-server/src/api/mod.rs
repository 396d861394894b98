mod challenges;
mod users;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tribeline_core::DocumentStore;
use tribeline_engine::{Engine, EngineError};

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};

pub struct AppState<S> {
    pub engine: Arc<Engine<S>>,
}

impl<S> AppState<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn json(data: T, request_id: String) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// "Not earned yet" is a 200 with `false`; "couldn't check" is a 503.
pub(super) fn map_engine_error(request_id: String, error: &EngineError) -> ApiError {
    match error {
        EngineError::InvalidChallengeId(_) | EngineError::Validation(_) => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        EngineError::DataSourceUnavailable(source) => {
            tracing::warn!(error = %source, "store unavailable");
            ApiError::new(
                request_id,
                "unavailable",
                "couldn't verify right now, try again",
            )
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router<S: DocumentStore + 'static>(auth: AuthState) -> Router<AppState<S>> {
    Router::new()
        .route("/api/v1/challenges", get(challenges::list_challenges))
        .route("/api/v1/users", post(users::register_user::<S>))
        .route(
            "/api/v1/users/{user}/logins",
            post(users::record_login::<S>),
        )
        .route(
            "/api/v1/users/{user}/challenges/{id}",
            get(challenges::get_challenge_status::<S>),
        )
        .route(
            "/api/v1/users/{user}/challenges/{id}/check",
            post(challenges::check_challenge::<S>),
        )
        .route(
            "/api/v1/users/{user}/challenges/{id}/claim",
            post(challenges::claim_challenge::<S>),
        )
        .route(
            "/api/v1/users/{user}/activity",
            post(users::record_activity::<S>),
        )
        .route("/api/v1/users/{user}/tribe", put(users::join_tribe::<S>))
        .route(
            "/api/v1/users/{user}/profile",
            put(users::update_profile::<S>),
        )
        .route("/api/v1/users/{user}/points", post(users::award_points::<S>))
        .route(
            "/api/v1/users/{user}/points/{bucket}",
            get(users::list_points::<S>),
        )
        .route(
            "/api/v1/users/{user}/notifications",
            get(users::list_notifications::<S>),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app<S: DocumentStore + 'static>(state: AppState<S>, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health::<S>));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match state.engine.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    store: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        store: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
