use std::time::Instant;

use crate::{
    db::EventStore,
    error::QueryError,
    models::{
        AnalyticsResult, ClickEvent, GroupSummary, GroupTotals, GroupTypes, GroupView,
        RecommendParams, RecommendationResult,
    },
    services::{analytics, mining, recommender, transactions},
};

/// Takes a snapshot of the event log; a failed read is reported, not raised
async fn load_events(store: &dyn EventStore) -> Result<Vec<ClickEvent>, QueryError> {
    store.read_all().await.map_err(|e| {
        tracing::error!(store = store.name(), error = %e, "Event store read failed");
        QueryError::store_unavailable(&e)
    })
}

/// Recommends products that are often clicked near `product_name`
///
/// Rebuilds transactions and rules from the current store snapshot on every call;
/// nothing is cached between requests.
pub async fn recommend_products(
    store: &dyn EventStore,
    product_name: &str,
    params: &RecommendParams,
) -> RecommendationResult {
    let start = Instant::now();

    let (events, store_error) = match load_events(store).await {
        Ok(events) => (events, None),
        Err(error) => (Vec::new(), Some(error)),
    };

    let set = transactions::build(&events, params.window_seconds);
    let mined = mining::mine(&set.matrix, params.min_support, params.min_confidence);

    let mut result = RecommendationResult {
        product_name: product_name.to_string(),
        recommendations: Vec::new(),
        total_recommendations: 0,
        min_confidence: params.min_confidence,
        window_seconds: params.window_seconds,
        message: None,
        learning_groups: set.groups,
        summary: mined.summary,
        error: None,
    };

    if let Some(error) = store_error.or(mined.error) {
        tracing::warn!(
            product = %product_name,
            kind = ?error.kind,
            message = %error.message,
            "Recommendation unavailable"
        );
        result.error = Some(error);
        return result;
    }

    if mined.rules.is_empty() {
        result.message = Some(format!("no recommendation rules for '{}'", product_name));
        return result;
    }

    let recommendations =
        recommender::recommend(product_name, &mined.rules, params.max_recommendations);
    if recommendations.is_empty() {
        result.message = Some(format!("no recommendation rules for '{}'", product_name));
    }

    tracing::info!(
        product = %product_name,
        recommendations = recommendations.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Recommendation completed"
    );

    result.total_recommendations = recommendations.len();
    result.recommendations = recommendations;
    result
}

/// Describes the time groups the current snapshot produces for a window size
pub async fn group_info(store: &dyn EventStore, window_seconds: u32) -> GroupSummary {
    let (events, store_error) = match load_events(store).await {
        Ok(events) => (events, None),
        Err(error) => (Vec::new(), Some(error)),
    };

    let set = transactions::build(&events, window_seconds);

    if set.matrix.is_empty() {
        return GroupSummary {
            window_seconds,
            error: Some(store_error.unwrap_or_else(|| QueryError::no_data("no group data"))),
            ..Default::default()
        };
    }

    let groups: Vec<GroupView> = set.groups.iter().map(GroupView::from).collect();

    tracing::info!(groups = groups.len(), window_seconds, "Group info computed");

    GroupSummary {
        total_groups: groups.len(),
        window_seconds,
        group_types: GroupTypes {
            session_groups: 0,
            time_groups: groups.len(),
            total_groups: groups.len(),
        },
        summary: GroupTotals {
            total_transactions: set.matrix.len(),
            total_products: set.matrix.item_count(),
        },
        groups,
        error: None,
    }
}

/// Click, category and price statistics over the whole event log
pub async fn product_analytics(store: &dyn EventStore) -> AnalyticsResult {
    let events = match load_events(store).await {
        Ok(events) => events,
        Err(error) => {
            return AnalyticsResult {
                message: Some(error.message.clone()),
                error: Some(error),
                ..Default::default()
            }
        }
    };

    if events.is_empty() {
        let error = QueryError::no_data("no click events to analyze");
        return AnalyticsResult {
            message: Some(error.message.clone()),
            error: Some(error),
            ..Default::default()
        };
    }

    analytics::aggregate(&events)
}
