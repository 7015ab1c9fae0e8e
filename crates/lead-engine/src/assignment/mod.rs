//! Lead assignment: rule matching, territory routing, and the strategy
//! fallback chain that picks exactly one owner per inbound lead.
//!
//! The chain runs rule-based, then territory-based, then the configured
//! default strategy, stopping at the first success. Capacity counters,
//! the round-robin rotation index, and the priority queue are all owned by
//! [`AssignmentEngine`] so shared mutable state stays behind one type.

pub mod capacity;
pub mod conditions;
pub mod domain;
pub mod engine;
pub mod history;
pub mod router;
pub mod rules;

#[cfg(test)]
mod tests;

pub use capacity::{CapacityError, CapacityTracker};
pub use domain::{
    AssignmentHistoryEntry, AssignmentQueueItem, AssignmentResult, AssignmentRule, AssignmentType,
    CapacityEnforcement, ConditionOperator, DefaultStrategy, EngineConfig, EngineConfigUpdate,
    FieldValue, Lead, LeadId, RuleAction, RuleCondition, RuleUpdate, TeamMemberCapacity, Territory,
    TerritoryUpdate,
};
pub use engine::{priority_score, AssignmentEngine, LeadEnricher, LeadEnrichment, NoopEnricher};
pub use history::AssignmentHistoryLog;
pub use router::assignment_router;
pub use rules::{RuleStore, StoreError, ValidationError};
