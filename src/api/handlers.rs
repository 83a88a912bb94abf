use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppResult, QueryError},
    middleware::request_id::RequestId,
    models::{
        query::validate_window, AnalyticsResult, GroupSummary, RecommendParams,
        RecommendationResult,
    },
    services,
};

use super::AppState;

// Request types

#[derive(Debug, Default, Deserialize)]
pub struct RecommendQuery {
    pub min_confidence: Option<f64>,
    pub max_recommendations: Option<usize>,
    #[serde(alias = "time_window")]
    pub window_seconds: Option<u32>,
    pub min_support: Option<f64>,
}

impl RecommendQuery {
    fn resolve(&self, state: &AppState) -> RecommendParams {
        let defaults = state.defaults;
        RecommendParams {
            min_support: self.min_support.unwrap_or(defaults.min_support),
            min_confidence: self.min_confidence.unwrap_or(defaults.min_confidence),
            max_recommendations: self
                .max_recommendations
                .unwrap_or(defaults.max_recommendations),
            window_seconds: self.window_seconds.unwrap_or(defaults.window_seconds),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupQuery {
    #[serde(alias = "time_window")]
    pub window_seconds: Option<u32>,
}

// Handlers

/// Service banner with the available endpoints
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Product recommendation API",
        "endpoints": [
            "GET /analytics/products",
            "GET /recommend/{product_name}",
            "GET /groups/info",
        ]
    }))
}

/// Health check endpoint
///
/// Reports the stored event count, or 503 when the store cannot be reached.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store = state.store.name();
    match state.store.len().await {
        Ok(events) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "store": store, "events": events })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, store, "Health check could not reach event store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "store": store, "error": e.to_string() })),
            )
        }
    }
}

/// Per-product click statistics
pub async fn product_analytics(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Json<AnalyticsResult> {
    tracing::info!(request_id = %request_id, "Processing product analytics request");
    Json(services::product_analytics(state.store.as_ref()).await)
}

/// Products frequently clicked near `product_name`
///
/// A result carrying an error is still returned in full, with 400 for empty or
/// too-sparse data and 503 when the store could not be read.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(product_name): Path<String>,
    Query(query): Query<RecommendQuery>,
) -> AppResult<(StatusCode, Json<RecommendationResult>)> {
    let params = query.resolve(&state);
    params.validate()?;

    tracing::info!(
        request_id = %request_id,
        product = %product_name,
        min_confidence = params.min_confidence,
        window_seconds = params.window_seconds,
        "Processing recommendation request"
    );

    let result = services::recommend_products(state.store.as_ref(), &product_name, &params).await;
    let status = result
        .error
        .as_ref()
        .map(QueryError::status_code)
        .unwrap_or(StatusCode::OK);

    Ok((status, Json(result)))
}

/// Time groups for the requested window size
pub async fn group_info(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<GroupQuery>,
) -> AppResult<Json<GroupSummary>> {
    let window_seconds = query.window_seconds.unwrap_or(state.defaults.window_seconds);
    validate_window(window_seconds)?;

    tracing::info!(request_id = %request_id, window_seconds, "Processing group info request");

    Ok(Json(
        services::group_info(state.store.as_ref(), window_seconds).await,
    ))
}
