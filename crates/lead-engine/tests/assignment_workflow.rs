//! Integration scenarios for the lead assignment workflow, driven entirely
//! through the public engine facade: rule hits, fallback through territories,
//! and the configured default strategy, with the audit history asserted at
//! the end of each scenario.

mod common {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use lead_engine::assignment::{
        AssignmentEngine, AssignmentHistoryLog, AssignmentRule, CapacityTracker,
        ConditionOperator, FieldValue, Lead, LeadId, RuleAction, RuleCondition, RuleStore,
        TeamMemberCapacity, Territory,
    };

    pub(crate) struct Setup {
        pub(crate) engine: AssignmentEngine,
        pub(crate) rules: Arc<RuleStore>,
        pub(crate) capacity: Arc<CapacityTracker>,
        pub(crate) history: Arc<AssignmentHistoryLog>,
    }

    pub(crate) fn setup() -> Setup {
        let rules = Arc::new(RuleStore::new());
        let capacity = Arc::new(CapacityTracker::new());
        let history = Arc::new(AssignmentHistoryLog::new());
        let engine = AssignmentEngine::new(rules.clone(), capacity.clone(), history.clone());
        Setup {
            engine,
            rules,
            capacity,
            history,
        }
    }

    pub(crate) fn lead(id: &str, source: &str, region: Option<&str>) -> Lead {
        Lead {
            id: LeadId(id.to_string()),
            company: "Acme Industrial".to_string(),
            email: "ops@acme.test".to_string(),
            phone: "555-0100".to_string(),
            score: 50.0,
            status: "New".to_string(),
            source: source.to_string(),
            region: region.map(|region| region.to_string()),
            assigned_to: None,
            custom_fields: BTreeMap::new(),
        }
    }

    pub(crate) fn referral_rule(target: &str) -> AssignmentRule {
        AssignmentRule {
            id: "rule-referral".to_string(),
            name: "referral routing".to_string(),
            priority: 10,
            conditions: vec![RuleCondition {
                field: "source".to_string(),
                operator: ConditionOperator::Equals,
                value: FieldValue::Text("Referral".to_string()),
            }],
            action: RuleAction {
                kind: "assign_user".to_string(),
                target: target.to_string(),
            },
            is_active: true,
        }
    }

    pub(crate) fn member(
        user_id: &str,
        current: u32,
        max: u32,
        available: bool,
    ) -> TeamMemberCapacity {
        TeamMemberCapacity {
            user_id: user_id.to_string(),
            max_leads: max,
            current_leads: current,
            specialties: Vec::new(),
            availability: available,
            territory: None,
        }
    }

    pub(crate) fn west_territory(users: &[&str]) -> Territory {
        Territory {
            id: "territory-west".to_string(),
            name: "west coast".to_string(),
            regions: vec!["california".to_string(), "oregon".to_string()],
            assigned_users: users.iter().map(|user| user.to_string()).collect(),
            priority: 5,
        }
    }
}

use common::*;
use lead_engine::assignment::{AssignmentType, LeadId};

#[test]
fn referral_rule_assigns_configured_target() {
    let setup = setup();
    setup.capacity.set_capacity(member("user-1", 0, 10, true));
    setup
        .rules
        .add_rule(referral_rule("user-1"))
        .expect("rule is valid");

    let result = setup.engine.assign(&lead("lead-1", "Referral", None));

    assert!(result.success);
    assert_eq!(result.assigned_to.as_deref(), Some("user-1"));
    assert_eq!(result.assignment_type, Some(AssignmentType::Rule));
    assert_eq!(result.rule.as_deref(), Some("referral routing"));

    let history = setup.history.query(Some(&LeadId("lead-1".to_string())));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].assigned_by, "system");
    assert_eq!(history[0].rule_name.as_deref(), Some("referral routing"));
}

#[test]
fn round_robin_fallback_cycles_two_members() {
    let setup = setup();
    setup.capacity.set_capacity(member("u1", 0, 10, true));
    setup.capacity.set_capacity(member("u2", 0, 10, true));

    // No rules and no territories: the chain lands on the default strategy.
    let assignees: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|id| {
            let result = setup.engine.assign(&lead(id, "Web", None));
            assert_eq!(result.assignment_type, Some(AssignmentType::RoundRobin));
            result.assigned_to.expect("assigned")
        })
        .collect();

    assert_eq!(assignees, vec!["u1", "u2", "u1"]);
    assert_eq!(setup.history.query(None).len(), 3);
}

#[test]
fn unavailable_rule_target_never_surfaces_as_assignee() {
    let setup = setup();
    setup.capacity.set_capacity(member("user-1", 0, 10, false));
    setup.capacity.set_capacity(member("user-west", 0, 10, true));
    setup
        .rules
        .add_rule(referral_rule("user-1"))
        .expect("rule is valid");
    setup
        .rules
        .add_territory(west_territory(&["user-west"]))
        .expect("territory is valid");

    let result = setup
        .engine
        .assign(&lead("lead-1", "Referral", Some("California")));

    assert!(result.success);
    assert_ne!(result.assigned_to.as_deref(), Some("user-1"));
    assert_eq!(result.assigned_to.as_deref(), Some("user-west"));
    assert_eq!(result.assignment_type, Some(AssignmentType::Territory));
}

#[test]
fn territory_match_ignores_region_casing() {
    let setup = setup();
    setup.capacity.set_capacity(member("user-west", 0, 10, true));
    setup
        .rules
        .add_territory(west_territory(&["user-west"]))
        .expect("territory is valid");

    let result = setup
        .engine
        .assign(&lead("lead-1", "Web", Some("CALIFORNIA")));

    assert!(result.success);
    assert_eq!(result.territory.as_deref(), Some("territory-west"));
}

#[test]
fn exhausted_chain_degrades_to_unassigned_decision() {
    let setup = setup();
    // One tracked member, away: every strategy fails, nothing panics.
    setup.capacity.set_capacity(member("user-1", 0, 10, false));

    let result = setup.engine.assign(&lead("lead-1", "Web", Some("Nowhere")));

    assert!(!result.success);
    assert!(result.assigned_to.is_none());
    assert!(result.reason.is_some());
    assert!(setup.history.query(None).is_empty());
}
