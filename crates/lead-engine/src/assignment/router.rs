use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::capacity::CapacityError;
use super::domain::{
    AssignmentRule, EngineConfigUpdate, Lead, LeadId, RuleUpdate, TeamMemberCapacity, Territory,
    TerritoryUpdate,
};
use super::engine::AssignmentEngine;
use super::rules::StoreError;

/// Router builder exposing the assignment engine: the assign entry point,
/// rule/territory/capacity administration, and the history/config/queue
/// query surface.
pub fn assignment_router(engine: Arc<AssignmentEngine>) -> Router {
    Router::new()
        .route("/api/v1/leads/assign", post(assign_handler))
        .route(
            "/api/v1/assignment/rules",
            get(list_rules_handler).post(add_rule_handler),
        )
        .route(
            "/api/v1/assignment/rules/:rule_id",
            patch(update_rule_handler).delete(delete_rule_handler),
        )
        .route(
            "/api/v1/assignment/territories",
            get(list_territories_handler).post(add_territory_handler),
        )
        .route(
            "/api/v1/assignment/territories/:territory_id",
            patch(update_territory_handler).delete(delete_territory_handler),
        )
        .route(
            "/api/v1/assignment/capacity/:user_id",
            put(set_capacity_handler),
        )
        .route(
            "/api/v1/assignment/capacity/:user_id/availability",
            patch(set_availability_handler),
        )
        .route("/api/v1/assignment/history", get(history_handler))
        .route(
            "/api/v1/assignment/config",
            get(get_config_handler).patch(update_config_handler),
        )
        .route("/api/v1/assignment/queue", get(queue_handler))
        .with_state(engine)
}

fn store_error_response(error: StoreError) -> Response {
    let payload = json!({ "error": error.to_string() });
    let status = match error {
        StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::RuleNotFound(_) | StoreError::TerritoryNotFound(_) => StatusCode::NOT_FOUND,
    };
    (status, axum::Json(payload)).into_response()
}

fn capacity_error_response(error: CapacityError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

/// A failed chain is still a decision: the caller always receives the result
/// object and can surface `reason` for manual triage.
pub(crate) async fn assign_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    axum::Json(lead): axum::Json<Lead>,
) -> Response {
    let result = engine.assign(&lead);
    (StatusCode::OK, axum::Json(result)).into_response()
}

pub(crate) async fn list_rules_handler(State(engine): State<Arc<AssignmentEngine>>) -> Response {
    (StatusCode::OK, axum::Json(engine.rule_store().rules())).into_response()
}

pub(crate) async fn add_rule_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    axum::Json(rule): axum::Json<AssignmentRule>,
) -> Response {
    match engine.rule_store().add_rule(rule.clone()) {
        Ok(()) => (StatusCode::CREATED, axum::Json(rule)).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn update_rule_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    Path(rule_id): Path<String>,
    axum::Json(update): axum::Json<RuleUpdate>,
) -> Response {
    match engine.rule_store().update_rule(&rule_id, update) {
        Ok(rule) => (StatusCode::OK, axum::Json(rule)).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn delete_rule_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    Path(rule_id): Path<String>,
) -> Response {
    match engine.rule_store().delete_rule(&rule_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn list_territories_handler(
    State(engine): State<Arc<AssignmentEngine>>,
) -> Response {
    (StatusCode::OK, axum::Json(engine.rule_store().territories())).into_response()
}

pub(crate) async fn add_territory_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    axum::Json(territory): axum::Json<Territory>,
) -> Response {
    match engine.rule_store().add_territory(territory.clone()) {
        Ok(()) => (StatusCode::CREATED, axum::Json(territory)).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn update_territory_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    Path(territory_id): Path<String>,
    axum::Json(update): axum::Json<TerritoryUpdate>,
) -> Response {
    match engine.rule_store().update_territory(&territory_id, update) {
        Ok(territory) => (StatusCode::OK, axum::Json(territory)).into_response(),
        Err(error) => store_error_response(error),
    }
}

pub(crate) async fn delete_territory_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    Path(territory_id): Path<String>,
) -> Response {
    match engine.rule_store().delete_territory(&territory_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => store_error_response(error),
    }
}

/// Capacity payload without the user id, which arrives in the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CapacityPayload {
    pub(crate) max_leads: u32,
    #[serde(default)]
    pub(crate) current_leads: u32,
    #[serde(default)]
    pub(crate) specialties: Vec<String>,
    #[serde(default = "default_availability")]
    pub(crate) availability: bool,
    #[serde(default)]
    pub(crate) territory: Option<String>,
}

fn default_availability() -> bool {
    true
}

pub(crate) async fn set_capacity_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    Path(user_id): Path<String>,
    axum::Json(payload): axum::Json<CapacityPayload>,
) -> Response {
    let capacity = TeamMemberCapacity {
        user_id,
        max_leads: payload.max_leads,
        current_leads: payload.current_leads,
        specialties: payload.specialties,
        availability: payload.availability,
        territory: payload.territory,
    };
    engine.capacity_tracker().set_capacity(capacity.clone());
    (StatusCode::OK, axum::Json(capacity)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityPayload {
    pub(crate) availability: bool,
}

pub(crate) async fn set_availability_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    Path(user_id): Path<String>,
    axum::Json(payload): axum::Json<AvailabilityPayload>,
) -> Response {
    match engine
        .capacity_tracker()
        .set_availability(&user_id, payload.availability)
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => capacity_error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    pub(crate) lead_id: Option<String>,
}

pub(crate) async fn history_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let lead_id = query.lead_id.map(LeadId);
    let entries = engine.history(lead_id.as_ref());
    (StatusCode::OK, axum::Json(entries)).into_response()
}

pub(crate) async fn get_config_handler(State(engine): State<Arc<AssignmentEngine>>) -> Response {
    (StatusCode::OK, axum::Json(engine.config())).into_response()
}

pub(crate) async fn update_config_handler(
    State(engine): State<Arc<AssignmentEngine>>,
    axum::Json(update): axum::Json<EngineConfigUpdate>,
) -> Response {
    (StatusCode::OK, axum::Json(engine.update_config(update))).into_response()
}

pub(crate) async fn queue_handler(State(engine): State<Arc<AssignmentEngine>>) -> Response {
    (StatusCode::OK, axum::Json(engine.queue_snapshot())).into_response()
}
