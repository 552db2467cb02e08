use crate::infra::{AppState, Community, InMemoryChatProvisioner, InMemoryStore};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use skill_swap::matching::reputation::honor_rating;
use skill_swap::matching::{
    matching_router, HonorRating, MatchmakingService, Profile, StoreError, UserId,
};
use std::sync::Arc;
use tracing::info;

pub(crate) type AppMatchmaking = MatchmakingService<InMemoryStore, InMemoryChatProvisioner>;

#[derive(Debug, Deserialize)]
pub(crate) struct RatingRequest {
    pub(crate) rating: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct HonorView {
    pub(crate) user_id: UserId,
    pub(crate) honor_score: u8,
    pub(crate) honor_rating: HonorRating,
}

pub(crate) fn with_matching_routes(
    service: Arc<AppMatchmaking>,
    community: Community,
) -> axum::Router {
    matching_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/users/:user_id/profile", put(upsert_profile_endpoint))
        .route("/api/v1/users/:user_id/ratings", post(rate_user_endpoint))
        .layer(Extension(community))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn upsert_profile_endpoint(
    Extension(community): Extension<Community>,
    Path(user_id): Path<String>,
    Json(mut profile): Json<Profile>,
) -> Response {
    profile.user_id = UserId(user_id);
    if let Err(err) = profile.validate() {
        let payload = json!({ "error": err.to_string() });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    match community.store.upsert_profile(profile.clone()) {
        Ok(()) => {
            info!(user = %profile.user_id, "profile stored");
            (StatusCode::OK, Json(profile)).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

pub(crate) async fn rate_user_endpoint(
    Extension(community): Extension<Community>,
    Path(user_id): Path<String>,
    Json(request): Json<RatingRequest>,
) -> Response {
    if !(1..=5).contains(&request.rating) {
        let payload = json!({ "error": format!("rating must be between 1 and 5, got {}", request.rating) });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    let user_id = UserId(user_id);
    match community
        .store
        .record_rating(&user_id, request.rating, community.honor_multiplier)
    {
        Ok(Some(profile)) => {
            info!(user = %user_id, honor_score = profile.honor_score, "rating recorded");
            let view = HonorView {
                user_id,
                honor_score: profile.honor_score,
                honor_rating: honor_rating(profile.honor_score),
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Ok(None) => {
            let payload = json!({ "error": format!("profile not found for user {user_id}") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err) => store_error_response(err),
    }
}

fn store_error_response(err: StoreError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
}
