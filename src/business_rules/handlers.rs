// HTTP handlers for rules engine introspection

use axum::{extract::State, Json};

use crate::business_rules::{MetricsSummary, RulesConfig};
use crate::AppState;

/// Handler for GET /api/rules/metrics
/// Evaluation counters and timings since startup
#[utoipa::path(
    get,
    path = "/api/rules/metrics",
    responses(
        (status = 200, description = "Rule evaluation metrics", body = MetricsSummary)
    ),
    tag = "rules"
)]
pub async fn get_metrics_handler(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.engine.metrics().summary())
}

/// Handler for GET /api/rules/config
#[utoipa::path(
    get,
    path = "/api/rules/config",
    responses(
        (status = 200, description = "Active rule settings", body = RulesConfig)
    ),
    tag = "rules"
)]
pub async fn get_config_handler(State(state): State<AppState>) -> Json<RulesConfig> {
    Json(state.engine.config().clone())
}
