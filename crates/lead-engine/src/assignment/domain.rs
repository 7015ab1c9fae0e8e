use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for inbound leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

/// Typed value carried by lead fields and rule comparisons.
///
/// The upstream CRM hands over loosely typed JSON; this union keeps the five
/// operators exhaustively checkable instead of coercing at every comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl FieldValue {
    /// Numeric view used by the ordering operators. Text parses, booleans do not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(raw) => raw.trim().parse::<f64>().ok(),
            FieldValue::Boolean(_) => None,
        }
    }

    /// Lower-cased textual view used by the `contains` operator.
    pub fn to_lowercase_string(&self) -> String {
        match self {
            FieldValue::Text(value) => value.to_lowercase(),
            FieldValue::Number(value) => value.to_string(),
            FieldValue::Boolean(value) => value.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// Inbound sales contact requiring an owner. Owned by the caller; the engine
/// never writes `assigned_to` back, it only reports the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub company: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub score: f64,
    pub status: String,
    pub source: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, FieldValue>,
}

/// Comparison operators available to rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
}

/// Single predicate over a dotted lead field path. Pure; no side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: FieldValue,
}

/// Directive executed when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub target: String,
}

/// Ordered, conditionally matched directive mapping a lead pattern to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRule {
    pub id: String,
    pub name: String,
    pub priority: u32,
    pub conditions: Vec<RuleCondition>,
    pub action: RuleAction,
    pub is_active: bool,
}

/// Partial update applied to an existing rule; absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub conditions: Option<Vec<RuleCondition>>,
    #[serde(default)]
    pub action: Option<RuleAction>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Named grouping of regions mapped to a pool of eligible assignees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Territory {
    pub id: String,
    pub name: String,
    pub regions: Vec<String>,
    pub assigned_users: Vec<String>,
    pub priority: u32,
}

/// Partial update applied to an existing territory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    #[serde(default)]
    pub assigned_users: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<u32>,
}

/// Per-member load snapshot tracked by the capacity component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberCapacity {
    pub user_id: String,
    pub max_leads: u32,
    pub current_leads: u32,
    pub specialties: Vec<String>,
    pub availability: bool,
    #[serde(default)]
    pub territory: Option<String>,
}

impl TeamMemberCapacity {
    pub fn has_spare_capacity(&self) -> bool {
        self.current_leads < self.max_leads
    }

    /// Load ratio used for least-loaded ordering. A zero-max member counts as full.
    pub fn load_ratio(&self) -> f64 {
        if self.max_leads == 0 {
            1.0
        } else {
            f64::from(self.current_leads) / f64::from(self.max_leads)
        }
    }
}

/// Which strategy produced an assignment, recorded in history and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    Rule,
    RoundRobin,
    LoadBalance,
    Territory,
    Priority,
    Manual,
}

impl AssignmentType {
    pub const fn label(self) -> &'static str {
        match self {
            AssignmentType::Rule => "rule",
            AssignmentType::RoundRobin => "round_robin",
            AssignmentType::LoadBalance => "load_balance",
            AssignmentType::Territory => "territory",
            AssignmentType::Priority => "priority",
            AssignmentType::Manual => "manual",
        }
    }
}

/// Immutable audit record of a past decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentHistoryEntry {
    pub lead_id: LeadId,
    pub assigned_to: String,
    pub assigned_by: String,
    pub assignment_date: DateTime<Utc>,
    pub assignment_type: AssignmentType,
    #[serde(default)]
    pub rule_name: Option<String>,
    #[serde(default)]
    pub territory_id: Option<String>,
}

/// Diagnostic entry pushed by the priority strategy. The queue is inspectable
/// state, not a processing pipeline; nothing drains it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentQueueItem {
    pub lead_id: LeadId,
    pub company: String,
    pub priority: f64,
    pub attempts: u32,
    #[serde(default)]
    pub last_attempt: Option<DateTime<Utc>>,
}

/// Decision object returned by every assignment attempt. A failed chain is an
/// ordinary outcome carrying a reason, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_type: Option<AssignmentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AssignmentResult {
    pub fn assigned(user_id: impl Into<String>, assignment_type: AssignmentType) -> Self {
        Self {
            success: true,
            assigned_to: Some(user_id.into()),
            assignment_type: Some(assignment_type),
            rule: None,
            territory: None,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn unassigned(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            assigned_to: None,
            assignment_type: None,
            rule: None,
            territory: None,
            reason: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_rule(mut self, rule_name: impl Into<String>) -> Self {
        self.rule = Some(rule_name.into());
        self
    }

    pub fn with_territory(mut self, territory_id: impl Into<String>) -> Self {
        self.territory = Some(territory_id.into());
        self
    }
}

/// Default strategy applied after the rule and territory passes both fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultStrategy {
    RoundRobin,
    LoadBalance,
    Territory,
    Priority,
}

impl DefaultStrategy {
    pub const fn label(self) -> &'static str {
        match self {
            DefaultStrategy::RoundRobin => "round_robin",
            DefaultStrategy::LoadBalance => "load_balance",
            DefaultStrategy::Territory => "territory",
            DefaultStrategy::Priority => "priority",
        }
    }

    /// Parses a configured label, falling back to round-robin for anything
    /// unrecognized so a stale config value never wedges the chain.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "load_balance" | "load_balanced" => DefaultStrategy::LoadBalance,
            "territory" => DefaultStrategy::Territory,
            "priority" => DefaultStrategy::Priority,
            _ => DefaultStrategy::RoundRobin,
        }
    }
}

/// Whether the rule and territory passes also require spare capacity, or only
/// availability as the source system did. Load-balancing always checks both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityEnforcement {
    #[default]
    Strict,
    AvailabilityOnly,
}

/// Process-wide engine configuration with get/merge-update semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub default_strategy: DefaultStrategy,
    pub max_attempts: u32,
    pub retry_delay_minutes: u32,
    pub work_hours_only: bool,
    pub allow_reassignment: bool,
    pub notify_on_assignment: bool,
    #[serde(default)]
    pub capacity_enforcement: CapacityEnforcement,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_strategy: DefaultStrategy::RoundRobin,
            max_attempts: 3,
            retry_delay_minutes: 30,
            work_hours_only: false,
            allow_reassignment: false,
            notify_on_assignment: true,
            capacity_enforcement: CapacityEnforcement::default(),
        }
    }
}

/// Partial configuration update; `default_strategy` arrives as a raw label so
/// unrecognized values degrade to round-robin instead of failing to parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfigUpdate {
    #[serde(default)]
    pub default_strategy: Option<String>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub retry_delay_minutes: Option<u32>,
    #[serde(default)]
    pub work_hours_only: Option<bool>,
    #[serde(default)]
    pub allow_reassignment: Option<bool>,
    #[serde(default)]
    pub notify_on_assignment: Option<bool>,
    #[serde(default)]
    pub capacity_enforcement: Option<CapacityEnforcement>,
}

impl EngineConfig {
    pub fn merged(&self, update: EngineConfigUpdate) -> Self {
        Self {
            default_strategy: update
                .default_strategy
                .map(|raw| DefaultStrategy::from_label(&raw))
                .unwrap_or(self.default_strategy),
            max_attempts: update.max_attempts.unwrap_or(self.max_attempts),
            retry_delay_minutes: update
                .retry_delay_minutes
                .unwrap_or(self.retry_delay_minutes),
            work_hours_only: update.work_hours_only.unwrap_or(self.work_hours_only),
            allow_reassignment: update.allow_reassignment.unwrap_or(self.allow_reassignment),
            notify_on_assignment: update
                .notify_on_assignment
                .unwrap_or(self.notify_on_assignment),
            capacity_enforcement: update
                .capacity_enforcement
                .unwrap_or(self.capacity_enforcement),
        }
    }
}
