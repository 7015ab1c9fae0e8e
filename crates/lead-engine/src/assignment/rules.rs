use std::sync::RwLock;

use super::domain::{AssignmentRule, RuleUpdate, Territory, TerritoryUpdate};

/// Admin-time validation failures. The store is left untouched when one is
/// raised; the caller corrects the payload and retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("rule name must not be empty")]
    EmptyRuleName,
    #[error("rule must declare at least one condition")]
    NoConditions,
    #[error("condition field must not be empty")]
    EmptyConditionField,
    #[error("action type must not be empty")]
    EmptyActionKind,
    #[error("action target must not be empty")]
    EmptyActionTarget,
    #[error("territory name must not be empty")]
    EmptyTerritoryName,
    #[error("territory must cover at least one region")]
    NoRegions,
    #[error("territory must list at least one assigned user")]
    NoAssignedUsers,
}

/// Error enumeration for rule and territory administration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("rule '{0}' not found")]
    RuleNotFound(String),
    #[error("territory '{0}' not found")]
    TerritoryNotFound(String),
}

/// Owns the rule and territory collections. Readers always observe a fully
/// applied snapshot; every mutation re-sorts descending by priority with
/// stable ties so insertion order breaks equal priorities.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: RwLock<Vec<AssignmentRule>>,
    territories: RwLock<Vec<Territory>>,
}

fn validate_rule(rule: &AssignmentRule) -> Result<(), ValidationError> {
    if rule.name.trim().is_empty() {
        return Err(ValidationError::EmptyRuleName);
    }
    if rule.conditions.is_empty() {
        return Err(ValidationError::NoConditions);
    }
    if rule
        .conditions
        .iter()
        .any(|condition| condition.field.trim().is_empty())
    {
        return Err(ValidationError::EmptyConditionField);
    }
    if rule.action.kind.trim().is_empty() {
        return Err(ValidationError::EmptyActionKind);
    }
    if rule.action.target.trim().is_empty() {
        return Err(ValidationError::EmptyActionTarget);
    }
    Ok(())
}

fn validate_territory(territory: &Territory) -> Result<(), ValidationError> {
    if territory.name.trim().is_empty() {
        return Err(ValidationError::EmptyTerritoryName);
    }
    if territory.regions.is_empty() {
        return Err(ValidationError::NoRegions);
    }
    if territory.assigned_users.is_empty() {
        return Err(ValidationError::NoAssignedUsers);
    }
    Ok(())
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&self, rule: AssignmentRule) -> Result<(), StoreError> {
        validate_rule(&rule)?;
        let mut rules = self.rules.write().expect("rule store lock poisoned");
        rules.push(rule);
        rules.sort_by_key(|rule| std::cmp::Reverse(rule.priority));
        Ok(())
    }

    pub fn update_rule(&self, id: &str, update: RuleUpdate) -> Result<AssignmentRule, StoreError> {
        let mut rules = self.rules.write().expect("rule store lock poisoned");
        let position = rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;

        let mut candidate = rules[position].clone();
        if let Some(name) = update.name {
            candidate.name = name;
        }
        if let Some(priority) = update.priority {
            candidate.priority = priority;
        }
        if let Some(conditions) = update.conditions {
            candidate.conditions = conditions;
        }
        if let Some(action) = update.action {
            candidate.action = action;
        }
        if let Some(is_active) = update.is_active {
            candidate.is_active = is_active;
        }

        // Validate the merged rule before touching stored state.
        validate_rule(&candidate)?;
        rules[position] = candidate.clone();
        rules.sort_by_key(|rule| std::cmp::Reverse(rule.priority));
        Ok(candidate)
    }

    pub fn delete_rule(&self, id: &str) -> Result<(), StoreError> {
        let mut rules = self.rules.write().expect("rule store lock poisoned");
        let position = rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;
        rules.remove(position);
        Ok(())
    }

    pub fn get_rule(&self, id: &str) -> Option<AssignmentRule> {
        self.rules
            .read()
            .expect("rule store lock poisoned")
            .iter()
            .find(|rule| rule.id == id)
            .cloned()
    }

    /// All rules in priority order, active or not.
    pub fn rules(&self) -> Vec<AssignmentRule> {
        self.rules.read().expect("rule store lock poisoned").clone()
    }

    /// Active rules in priority order; the snapshot taken here is what a
    /// single assignment pass iterates.
    pub fn active_rules(&self) -> Vec<AssignmentRule> {
        self.rules
            .read()
            .expect("rule store lock poisoned")
            .iter()
            .filter(|rule| rule.is_active)
            .cloned()
            .collect()
    }

    pub fn add_territory(&self, territory: Territory) -> Result<(), StoreError> {
        validate_territory(&territory)?;
        let mut territories = self
            .territories
            .write()
            .expect("territory store lock poisoned");
        territories.push(territory);
        territories.sort_by_key(|territory| std::cmp::Reverse(territory.priority));
        Ok(())
    }

    pub fn update_territory(
        &self,
        id: &str,
        update: TerritoryUpdate,
    ) -> Result<Territory, StoreError> {
        let mut territories = self
            .territories
            .write()
            .expect("territory store lock poisoned");
        let position = territories
            .iter()
            .position(|territory| territory.id == id)
            .ok_or_else(|| StoreError::TerritoryNotFound(id.to_string()))?;

        let mut candidate = territories[position].clone();
        if let Some(name) = update.name {
            candidate.name = name;
        }
        if let Some(regions) = update.regions {
            candidate.regions = regions;
        }
        if let Some(assigned_users) = update.assigned_users {
            candidate.assigned_users = assigned_users;
        }
        if let Some(priority) = update.priority {
            candidate.priority = priority;
        }

        validate_territory(&candidate)?;
        territories[position] = candidate.clone();
        territories.sort_by_key(|territory| std::cmp::Reverse(territory.priority));
        Ok(candidate)
    }

    pub fn delete_territory(&self, id: &str) -> Result<(), StoreError> {
        let mut territories = self
            .territories
            .write()
            .expect("territory store lock poisoned");
        let position = territories
            .iter()
            .position(|territory| territory.id == id)
            .ok_or_else(|| StoreError::TerritoryNotFound(id.to_string()))?;
        territories.remove(position);
        Ok(())
    }

    pub fn territories(&self) -> Vec<Territory> {
        self.territories
            .read()
            .expect("territory store lock poisoned")
            .clone()
    }

    /// Highest-priority territory covering `region`, compared case-insensitively.
    /// Only the first match is returned; matches are never aggregated.
    pub fn find_matching_territory(&self, region: &str) -> Option<Territory> {
        self.territories
            .read()
            .expect("territory store lock poisoned")
            .iter()
            .find(|territory| {
                territory
                    .regions
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(region))
            })
            .cloned()
    }
}
