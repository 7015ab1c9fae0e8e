//! Pure condition evaluation over typed lead fields.
//!
//! The source system walked dotted paths through untyped objects; here the
//! first path segment selects from a fixed field registry and only the
//! `customFields` segment indexes further. An unresolvable path is a
//! non-match, never an error, so malformed rules degrade to "no match".

use super::domain::{AssignmentRule, ConditionOperator, FieldValue, Lead, RuleCondition};

/// Resolves a dotted field path against a lead. Returns `None` for any
/// segment that does not exist, including unknown custom-field keys.
pub fn resolve_field(lead: &Lead, path: &str) -> Option<FieldValue> {
    let mut segments = path.split('.');
    let head = segments.next()?;

    if head == "customFields" {
        let key = segments.next()?;
        if segments.next().is_some() {
            return None;
        }
        return lead.custom_fields.get(key).cloned();
    }

    // Scalar fields have no nested segments.
    if segments.next().is_some() {
        return None;
    }

    match head {
        "id" => Some(FieldValue::Text(lead.id.0.clone())),
        "company" => Some(FieldValue::Text(lead.company.clone())),
        "email" => Some(FieldValue::Text(lead.email.clone())),
        "phone" => Some(FieldValue::Text(lead.phone.clone())),
        "score" => Some(FieldValue::Number(lead.score)),
        "status" => Some(FieldValue::Text(lead.status.clone())),
        "source" => Some(FieldValue::Text(lead.source.clone())),
        "region" => lead.region.clone().map(FieldValue::Text),
        "assignedTo" => lead.assigned_to.clone().map(FieldValue::Text),
        _ => None,
    }
}

/// Evaluates a single condition. Absent fields are false for every operator.
pub fn evaluate(condition: &RuleCondition, lead: &Lead) -> bool {
    let Some(actual) = resolve_field(lead, &condition.field) else {
        tracing::trace!(field = %condition.field, "condition field unresolved");
        return false;
    };

    match condition.operator {
        ConditionOperator::Equals => actual == condition.value,
        ConditionOperator::NotEquals => actual != condition.value,
        ConditionOperator::Contains => actual
            .to_lowercase_string()
            .contains(&condition.value.to_lowercase_string()),
        ConditionOperator::GreaterThan => match (actual.as_number(), condition.value.as_number()) {
            (Some(lhs), Some(rhs)) => lhs > rhs,
            _ => false,
        },
        ConditionOperator::LessThan => match (actual.as_number(), condition.value.as_number()) {
            (Some(lhs), Some(rhs)) => lhs < rhs,
            _ => false,
        },
    }
}

/// A rule matches only when every condition holds (AND semantics).
pub fn matches_rule(rule: &AssignmentRule, lead: &Lead) -> bool {
    rule.conditions
        .iter()
        .all(|condition| evaluate(condition, lead))
}
