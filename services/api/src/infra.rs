use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use lead_engine::assignment::{
    AssignmentEngine, AssignmentHistoryLog, AssignmentRule, CapacityTracker, ConditionOperator,
    FieldValue, Lead, LeadId, RuleAction, RuleCondition, RuleStore, TeamMemberCapacity, Territory,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires an engine over fresh in-memory stores. The serve path starts empty
/// and is populated through the admin API; the demo seeds it first.
pub(crate) fn build_engine() -> Arc<AssignmentEngine> {
    let rules = Arc::new(RuleStore::new());
    let capacity = Arc::new(CapacityTracker::new());
    let history = Arc::new(AssignmentHistoryLog::new());
    Arc::new(AssignmentEngine::new(rules, capacity, history))
}

pub(crate) fn seed_rules() -> Vec<AssignmentRule> {
    vec![
        AssignmentRule {
            id: "rule-referral".to_string(),
            name: "referrals to senior AE".to_string(),
            priority: 20,
            conditions: vec![RuleCondition {
                field: "source".to_string(),
                operator: ConditionOperator::Equals,
                value: FieldValue::Text("Referral".to_string()),
            }],
            action: RuleAction {
                kind: "assign_user".to_string(),
                target: "ae-senior".to_string(),
            },
            is_active: true,
        },
        AssignmentRule {
            id: "rule-enterprise".to_string(),
            name: "high-score enterprise leads".to_string(),
            priority: 10,
            conditions: vec![
                RuleCondition {
                    field: "score".to_string(),
                    operator: ConditionOperator::GreaterThan,
                    value: FieldValue::Number(80.0),
                },
                RuleCondition {
                    field: "customFields.segment".to_string(),
                    operator: ConditionOperator::Contains,
                    value: FieldValue::Text("enterprise".to_string()),
                },
            ],
            action: RuleAction {
                kind: "assign_user".to_string(),
                target: "ae-enterprise".to_string(),
            },
            is_active: true,
        },
    ]
}

pub(crate) fn seed_territories() -> Vec<Territory> {
    vec![
        Territory {
            id: "territory-west".to_string(),
            name: "west coast".to_string(),
            regions: vec![
                "california".to_string(),
                "oregon".to_string(),
                "washington".to_string(),
            ],
            assigned_users: vec!["ae-west-1".to_string(), "ae-west-2".to_string()],
            priority: 10,
        },
        Territory {
            id: "territory-east".to_string(),
            name: "east coast".to_string(),
            regions: vec!["new york".to_string(), "massachusetts".to_string()],
            assigned_users: vec!["ae-east-1".to_string()],
            priority: 5,
        },
    ]
}

pub(crate) fn seed_members() -> Vec<TeamMemberCapacity> {
    let member = |user_id: &str, current: u32, specialties: &[&str]| TeamMemberCapacity {
        user_id: user_id.to_string(),
        max_leads: 10,
        current_leads: current,
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
        availability: true,
        territory: None,
    };

    vec![
        member("ae-senior", 4, &["referrals", "enterprise"]),
        member("ae-enterprise", 2, &["enterprise"]),
        member("ae-west-1", 5, &["saas"]),
        member("ae-west-2", 1, &[]),
        member("ae-east-1", 3, &["manufacturing"]),
    ]
}

pub(crate) fn seed_leads() -> Vec<Lead> {
    let lead =
        |id: &str, company: &str, source: &str, status: &str, score: f64, region: Option<&str>| {
            Lead {
                id: LeadId(id.to_string()),
                company: company.to_string(),
                email: format!("contact@{}.test", id),
                phone: "555-0100".to_string(),
                score,
                status: status.to_string(),
                source: source.to_string(),
                region: region.map(|region| region.to_string()),
                assigned_to: None,
                custom_fields: BTreeMap::new(),
            }
        };

    vec![
        lead("lead-001", "Harvest Analytics", "Referral", "Hot", 88.0, None),
        lead("lead-002", "Cedar Logistics", "Web", "Warm", 55.0, Some("California")),
        lead("lead-003", "Brightline Media", "Web", "New", 30.0, None),
        lead("lead-004", "Stonebridge Mfg", "Cold Call", "New", 42.0, Some("Texas")),
        lead("lead-005", "Juniper Health", "Web", "Hot", 73.0, Some("NEW YORK")),
    ]
}
