use crate::models::*;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, "Rejected request: {}", self.message);
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Runs lock-holding, file-writing or CPU-bound engine work off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Engine task failed: {}", e)))
}

fn parse_actor(raw: String) -> Result<ActorId, ApiError> {
    ActorId::new(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub items: Vec<Item>,
    /// Store events are used when omitted.
    #[serde(default)]
    pub events: Option<Vec<BehaviorEvent>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreVenueRequest {
    pub venue: Venue,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub liked_venues: Vec<Venue>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreVenueResponse {
    #[serde(flatten)]
    pub scored: ScoredVenue,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RankVenuesRequest {
    pub catalog: Vec<Venue>,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub swipes: Vec<VenueSwipe>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    pub catalog: Vec<Venue>,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub swipes: Vec<VenueSwipe>,
    #[serde(default)]
    pub events: Option<Vec<BehaviorEvent>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "tripmuse".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());
    status.insert("profiles".to_string(), state.preference_manager.len().to_string());

    Json(ApiResponse::success(status))
}

async fn record_behavior(
    State(state): State<AppState>,
    payload: Result<Json<BehaviorEvent>, JsonRejection>,
) -> ApiResult<String> {
    let Json(event) = payload?;
    let manager = state.preference_manager.clone();
    run_blocking(move || manager.record_behavior(event)).await?;
    Ok(Json(ApiResponse::success("Behavior recorded".to_string())))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(actor_id): Path<String>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> ApiResult<Vec<Item>> {
    let actor_id = parse_actor(actor_id)?;
    let Json(request) = payload?;

    let manager = state.preference_manager.clone();
    let ranked = run_blocking(move || {
        let events = match request.events {
            Some(events) => events,
            None => manager.all_events(),
        };

        let mut ranked: Vec<Item> = manager
            .get_personalized_recommendations(&actor_id, &request.items, &events)
            .into_iter()
            .cloned()
            .collect();
        if let Some(limit) = request.limit {
            ranked.truncate(limit);
        }
        ranked
    })
    .await?;

    Ok(Json(ApiResponse::success(ranked)))
}

async fn get_insights(State(state): State<AppState>, Path(actor_id): Path<String>) -> ApiResult<Insights> {
    let actor_id = parse_actor(actor_id)?;
    Ok(Json(ApiResponse::success(state.preference_manager.get_insights(&actor_id))))
}

async fn score_venue(
    State(state): State<AppState>,
    payload: Result<Json<ScoreVenueRequest>, JsonRejection>,
) -> ApiResult<ScoreVenueResponse> {
    let Json(request) = payload?;
    let scoring = &state.venue_scoring;

    let scored = scoring.score_venue(&request.venue, &request.preferences, &request.liked_venues);
    let reason = scored
        .reasons
        .first()
        .cloned()
        .unwrap_or_else(|| scoring.recommendation_reason(&request.venue, &request.preferences, &request.liked_venues));

    Ok(Json(ApiResponse::success(ScoreVenueResponse { scored, reason })))
}

async fn rank_venues(
    State(state): State<AppState>,
    payload: Result<Json<RankVenuesRequest>, JsonRejection>,
) -> ApiResult<Vec<ScoredVenue>> {
    let Json(request) = payload?;
    let scoring = state.venue_scoring.clone();
    let ranked = run_blocking(move || {
        scoring.rank_venues(&request.catalog, &request.preferences, &request.swipes, request.limit)
    })
    .await?;
    Ok(Json(ApiResponse::success(ranked)))
}

async fn discover(
    State(state): State<AppState>,
    Path(actor_id): Path<String>,
    payload: Result<Json<DiscoverRequest>, JsonRejection>,
) -> ApiResult<Vec<ScoredVenue>> {
    let actor_id = parse_actor(actor_id)?;
    let Json(request) = payload?;

    let discovery = state.discovery.clone();
    let deck = run_blocking(move || {
        discovery.discover(
            &actor_id,
            &request.catalog,
            &request.preferences,
            &request.swipes,
            request.events.as_deref(),
            request.limit,
        )
    })
    .await?;
    Ok(Json(ApiResponse::success(deck)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/behaviors", post(record_behavior))
        .route("/recommendations/:actor_id", post(get_recommendations))
        .route("/insights/:actor_id", get(get_insights))
        .route("/venues/score", post(score_venue))
        .route("/venues/rank", post(rank_venues))
        .route("/discover/:actor_id", post(discover))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
