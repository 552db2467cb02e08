use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::connections::ConnectionError;
use super::domain::{PairKey, UserId};
use super::ranking::MatchingError;
use super::repository::ChatProvisioner;
use super::scoring::PolicyKind;
use super::service::{MatchingBackend, MatchmakingService};

/// Query string accepted by the match discovery endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    #[serde(default)]
    pub policy: PolicyKind,
}

/// Router builder exposing match discovery and connection endpoints.
pub fn matching_router<B, C>(service: Arc<MatchmakingService<B, C>>) -> Router
where
    B: MatchingBackend + 'static,
    C: ChatProvisioner + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/matches",
            post(discover_handler::<B, C>).get(stored_matches_handler::<B, C>),
        )
        .route(
            "/api/v1/users/:user_id/connections/:target_id/accept",
            post(accept_handler::<B, C>),
        )
        .route(
            "/api/v1/users/:user_id/connections/:target_id/reject",
            post(reject_handler::<B, C>),
        )
        .route(
            "/api/v1/users/:user_id/mutual-matches",
            get(mutual_matches_handler::<B, C>),
        )
        .route(
            "/api/v1/connections/:user_a/:user_b",
            get(mutual_status_handler::<B, C>),
        )
        .with_state(service)
}

pub(crate) async fn discover_handler<B, C>(
    State(service): State<Arc<MatchmakingService<B, C>>>,
    Path(user_id): Path<String>,
    Query(query): Query<DiscoverQuery>,
) -> Response
where
    B: MatchingBackend + 'static,
    C: ChatProvisioner + 'static,
{
    match service.discover(&UserId(user_id), query.policy) {
        Ok(feed) => (StatusCode::OK, axum::Json(feed)).into_response(),
        Err(err) => matching_error_response(err),
    }
}

pub(crate) async fn stored_matches_handler<B, C>(
    State(service): State<Arc<MatchmakingService<B, C>>>,
    Path(user_id): Path<String>,
) -> Response
where
    B: MatchingBackend + 'static,
    C: ChatProvisioner + 'static,
{
    match service.stored_matches(&UserId(user_id)) {
        Ok(candidates) => (StatusCode::OK, axum::Json(candidates)).into_response(),
        Err(err) => matching_error_response(err),
    }
}

pub(crate) async fn accept_handler<B, C>(
    State(service): State<Arc<MatchmakingService<B, C>>>,
    Path((user_id, target_id)): Path<(String, String)>,
) -> Response
where
    B: MatchingBackend + 'static,
    C: ChatProvisioner + 'static,
{
    match service.accept(&UserId(user_id), UserId(target_id)) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => connection_error_response(err),
    }
}

pub(crate) async fn reject_handler<B, C>(
    State(service): State<Arc<MatchmakingService<B, C>>>,
    Path((user_id, target_id)): Path<(String, String)>,
) -> Response
where
    B: MatchingBackend + 'static,
    C: ChatProvisioner + 'static,
{
    match service.reject(&UserId(user_id), UserId(target_id)) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => connection_error_response(err),
    }
}

pub(crate) async fn mutual_matches_handler<B, C>(
    State(service): State<Arc<MatchmakingService<B, C>>>,
    Path(user_id): Path<String>,
) -> Response
where
    B: MatchingBackend + 'static,
    C: ChatProvisioner + 'static,
{
    let user_id = UserId(user_id);
    match service.mutual_matches(&user_id) {
        Ok(mutual) => {
            let payload = json!({
                "user_id": user_id,
                "mutual_matches": mutual,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => connection_error_response(err),
    }
}

pub(crate) async fn mutual_status_handler<B, C>(
    State(service): State<Arc<MatchmakingService<B, C>>>,
    Path((user_a, user_b)): Path<(String, String)>,
) -> Response
where
    B: MatchingBackend + 'static,
    C: ChatProvisioner + 'static,
{
    let (user_a, user_b) = (UserId(user_a), UserId(user_b));
    match service.is_mutual(&user_a, &user_b) {
        Ok(mutual) => {
            let payload = json!({
                "pair": PairKey::new(&user_a, &user_b).to_string(),
                "mutual": mutual,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => connection_error_response(err),
    }
}

fn matching_error_response(err: MatchingError) -> Response {
    let status = match err {
        MatchingError::ProfileNotFound(_) => StatusCode::NOT_FOUND,
        MatchingError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn connection_error_response(err: ConnectionError) -> Response {
    let status = match err {
        ConnectionError::InvalidDecisionTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ConnectionError::StoreUnavailable(_) | ConnectionError::Provisioning(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
