use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::assignment::capacity::CapacityTracker;
use crate::assignment::domain::{
    AssignmentRule, ConditionOperator, FieldValue, Lead, LeadId, RuleAction, RuleCondition,
    TeamMemberCapacity, Territory,
};
use crate::assignment::engine::AssignmentEngine;
use crate::assignment::history::AssignmentHistoryLog;
use crate::assignment::router::assignment_router;
use crate::assignment::rules::RuleStore;

pub(super) fn lead(id: &str, source: &str) -> Lead {
    Lead {
        id: LeadId(id.to_string()),
        company: format!("{id} Co"),
        email: format!("{id}@example.test"),
        phone: "555-0100".to_string(),
        score: 50.0,
        status: "New".to_string(),
        source: source.to_string(),
        region: None,
        assigned_to: None,
        custom_fields: BTreeMap::new(),
    }
}

pub(super) fn regional_lead(id: &str, region: &str) -> Lead {
    let mut lead = lead(id, "Web");
    lead.region = Some(region.to_string());
    lead
}

pub(super) fn condition(
    field: &str,
    operator: ConditionOperator,
    value: FieldValue,
) -> RuleCondition {
    RuleCondition {
        field: field.to_string(),
        operator,
        value,
    }
}

pub(super) fn rule(id: &str, priority: u32, target: &str) -> AssignmentRule {
    AssignmentRule {
        id: id.to_string(),
        name: format!("rule {id}"),
        priority,
        conditions: vec![condition(
            "source",
            ConditionOperator::Equals,
            "Referral".into(),
        )],
        action: RuleAction {
            kind: "assign_user".to_string(),
            target: target.to_string(),
        },
        is_active: true,
    }
}

pub(super) fn territory(id: &str, priority: u32, regions: &[&str], users: &[&str]) -> Territory {
    Territory {
        id: id.to_string(),
        name: format!("territory {id}"),
        regions: regions.iter().map(|region| region.to_string()).collect(),
        assigned_users: users.iter().map(|user| user.to_string()).collect(),
        priority,
    }
}

pub(super) fn member(user_id: &str, current_leads: u32, max_leads: u32) -> TeamMemberCapacity {
    TeamMemberCapacity {
        user_id: user_id.to_string(),
        max_leads,
        current_leads,
        specialties: Vec::new(),
        availability: true,
        territory: None,
    }
}

pub(super) struct Harness {
    pub(super) engine: AssignmentEngine,
    pub(super) rules: Arc<RuleStore>,
    pub(super) capacity: Arc<CapacityTracker>,
    pub(super) history: Arc<AssignmentHistoryLog>,
}

pub(super) fn harness() -> Harness {
    let rules = Arc::new(RuleStore::new());
    let capacity = Arc::new(CapacityTracker::new());
    let history = Arc::new(AssignmentHistoryLog::new());
    let engine = AssignmentEngine::new(rules.clone(), capacity.clone(), history.clone());
    Harness {
        engine,
        rules,
        capacity,
        history,
    }
}

pub(super) fn router_with_engine(engine: AssignmentEngine) -> axum::Router {
    assignment_router(Arc::new(engine))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 65536)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
