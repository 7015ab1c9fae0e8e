use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

fn post(uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn patch(uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::patch(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

fn lead_payload(id: &str, source: &str) -> serde_json::Value {
    json!({
        "id": id,
        "company": "Acme",
        "email": "ops@acme.test",
        "phone": "555-0100",
        "score": 50,
        "status": "New",
        "source": source
    })
}

#[tokio::test]
async fn assign_route_returns_decision_for_successful_chain() {
    let fixture = harness();
    fixture.capacity.set_capacity(member("user-1", 0, 10));
    fixture.rules.add_rule(rule("referral", 10, "user-1")).expect("adds");
    let router = router_with_engine(fixture.engine);

    let response = router
        .oneshot(post("/api/v1/leads/assign", lead_payload("lead-1", "Referral")))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["assignedTo"], json!("user-1"));
    assert_eq!(payload["assignmentType"], json!("rule"));
}

#[tokio::test]
async fn assign_route_reports_unassigned_as_ordinary_outcome() {
    let fixture = harness();
    let router = router_with_engine(fixture.engine);

    let response = router
        .oneshot(post("/api/v1/leads/assign", lead_payload("lead-1", "Web")))
        .await
        .expect("route executes");

    // Empty stores: the whole chain fails, but that is a 200 decision.
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert!(payload["reason"].as_str().is_some());
}

#[tokio::test]
async fn rule_admin_validates_and_maps_errors_to_status_codes() {
    let fixture = harness();
    let router = router_with_engine(fixture.engine);

    let invalid = json!({
        "id": "r1",
        "name": "",
        "priority": 10,
        "conditions": [{"field": "source", "operator": "equals", "value": "Referral"}],
        "action": {"type": "assign_user", "target": "user-1"},
        "isActive": true
    });
    let response = router
        .clone()
        .oneshot(post("/api/v1/assignment/rules", invalid))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let valid = json!({
        "id": "r1",
        "name": "referral routing",
        "priority": 10,
        "conditions": [{"field": "source", "operator": "equals", "value": "Referral"}],
        "action": {"type": "assign_user", "target": "user-1"},
        "isActive": true
    });
    let response = router
        .clone()
        .oneshot(post("/api/v1/assignment/rules", valid))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(patch(
            "/api/v1/assignment/rules/ghost",
            json!({"priority": 1}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(get("/api/v1/assignment/rules"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn capacity_routes_register_and_toggle_members() {
    let fixture = harness();
    let router = router_with_engine(fixture.engine);

    let response = router
        .clone()
        .oneshot(
            Request::put("/api/v1/assignment/capacity/user-1")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"maxLeads": 10, "specialties": ["saas"]}).to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["availability"], json!(true));
    assert_eq!(payload["currentLeads"], json!(0));

    let response = router
        .clone()
        .oneshot(patch(
            "/api/v1/assignment/capacity/user-1/availability",
            json!({"availability": false}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(patch(
            "/api/v1/assignment/capacity/ghost/availability",
            json!({"availability": true}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_route_filters_by_lead_id() {
    let fixture = harness();
    fixture.capacity.set_capacity(member("user-1", 0, 10));
    fixture.rules.add_rule(rule("referral", 10, "user-1")).expect("adds");
    fixture.engine.assign(&lead("lead-1", "Referral"));
    fixture.engine.assign(&lead("lead-2", "Referral"));
    let router = router_with_engine(fixture.engine);

    let response = router
        .clone()
        .oneshot(get("/api/v1/assignment/history"))
        .await
        .expect("route executes");
    let all = read_json_body(response).await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let response = router
        .oneshot(get("/api/v1/assignment/history?leadId=lead-2"))
        .await
        .expect("route executes");
    let filtered = read_json_body(response).await;
    assert_eq!(filtered.as_array().map(Vec::len), Some(1));
    assert_eq!(filtered[0]["leadId"], json!("lead-2"));
}

#[tokio::test]
async fn config_route_merges_updates_and_degrades_unknown_strategies() {
    let fixture = harness();
    let router = router_with_engine(fixture.engine);

    let response = router
        .clone()
        .oneshot(patch(
            "/api/v1/assignment/config",
            json!({"defaultStrategy": "weighted_lottery", "maxAttempts": 7}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["defaultStrategy"], json!("round_robin"));
    assert_eq!(payload["maxAttempts"], json!(7));

    let response = router
        .oneshot(get("/api/v1/assignment/config"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["maxAttempts"], json!(7));
}

#[tokio::test]
async fn queue_route_exposes_priority_items() {
    let fixture = harness();
    fixture.capacity.set_capacity(member("user-1", 0, 10));
    fixture.engine.update_config(crate::assignment::domain::EngineConfigUpdate {
        default_strategy: Some("priority".to_string()),
        ..Default::default()
    });
    fixture.engine.assign(&lead("lead-1", "Web"));
    let router = router_with_engine(fixture.engine);

    let response = router
        .oneshot(get("/api/v1/assignment/queue"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["leadId"], json!("lead-1"));
}
