use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use tracing::{debug, info};

use super::capacity::CapacityTracker;
use super::conditions::matches_rule;
use super::domain::{
    AssignmentHistoryEntry, AssignmentQueueItem, AssignmentResult, AssignmentType, DefaultStrategy,
    EngineConfig, EngineConfigUpdate, FieldValue, Lead, LeadId,
};
use super::history::AssignmentHistoryLog;
use super::rules::RuleStore;

/// Routing attributes derived for a lead before the fallback chain runs.
/// `region` feeds the territory lookup, `industry` becomes matchable as the
/// `customFields.industry` condition field, and `deal_size` feeds the
/// priority score. Lead-supplied values always win over enrichment.
#[derive(Debug, Clone, Default)]
pub struct LeadEnrichment {
    pub region: Option<String>,
    pub industry: Option<String>,
    pub deal_size: Option<f64>,
}

/// Enrichment seam. External data providers plug in here; the default
/// implementation returns nothing and every downstream consumer tolerates
/// absent enrichment data.
pub trait LeadEnricher: Send + Sync {
    fn enrich(&self, lead: &Lead) -> LeadEnrichment;
}

/// Enricher that supplies nothing.
#[derive(Debug, Default)]
pub struct NoopEnricher;

impl LeadEnricher for NoopEnricher {
    fn enrich(&self, _lead: &Lead) -> LeadEnrichment {
        LeadEnrichment::default()
    }
}

/// Working copy of the lead with enrichment folded in. Enrichment never
/// overwrites data the caller supplied.
fn merge_enrichment(lead: &Lead, enrichment: &LeadEnrichment) -> Lead {
    let mut lead = lead.clone();
    if lead.region.is_none() {
        lead.region = enrichment.region.clone();
    }
    if let Some(industry) = &enrichment.industry {
        lead.custom_fields
            .entry("industry".to_string())
            .or_insert_with(|| FieldValue::Text(industry.clone()));
    }
    lead
}

/// Priority score feeding the priority strategy and its diagnostic queue.
pub fn priority_score(lead: &Lead, deal_size: Option<f64>) -> f64 {
    let mut score = lead.score;
    if let Some(deal_size) = deal_size {
        if deal_size > 0.0 {
            score += deal_size.log10();
        }
    }
    match lead.status.as_str() {
        "Hot" => score += 30.0,
        "Warm" => score += 15.0,
        _ => {}
    }
    score
}

/// Orchestrator running the fixed fallback chain: rules, then territories,
/// then the configured default strategy. Owns the shared rotation index and
/// the priority queue so strategy state never leaks into module globals;
/// rule, capacity, and history state is constructor-injected.
pub struct AssignmentEngine {
    rules: Arc<RuleStore>,
    capacity: Arc<CapacityTracker>,
    history: Arc<AssignmentHistoryLog>,
    enricher: Box<dyn LeadEnricher>,
    config: RwLock<EngineConfig>,
    // Next slot in the availability pool; advances exactly once per
    // round-robin call regardless of pool churn.
    rotation: Mutex<usize>,
    queue: Mutex<Vec<AssignmentQueueItem>>,
}

impl AssignmentEngine {
    pub fn new(
        rules: Arc<RuleStore>,
        capacity: Arc<CapacityTracker>,
        history: Arc<AssignmentHistoryLog>,
    ) -> Self {
        Self::with_enricher(rules, capacity, history, Box::new(NoopEnricher))
    }

    pub fn with_enricher(
        rules: Arc<RuleStore>,
        capacity: Arc<CapacityTracker>,
        history: Arc<AssignmentHistoryLog>,
        enricher: Box<dyn LeadEnricher>,
    ) -> Self {
        Self {
            rules,
            capacity,
            history,
            enricher,
            config: RwLock::new(EngineConfig::default()),
            rotation: Mutex::new(0),
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Primary entry point: picks exactly one owner for `lead` or reports an
    /// unassigned decision with a reason. Never an error; a fully failed
    /// chain degrades to manual triage on the caller's side.
    pub fn assign(&self, lead: &Lead) -> AssignmentResult {
        let enrichment = self.enricher.enrich(lead);
        let lead = &merge_enrichment(lead, &enrichment);

        let result = self.assign_by_rules(lead);
        if result.success {
            info!(lead = %lead.id.0, assignee = ?result.assigned_to, "assigned via rule");
            return result;
        }
        debug!(lead = %lead.id.0, reason = ?result.reason, "rule pass exhausted");

        let result = self.assign_by_territory(lead);
        if result.success {
            info!(lead = %lead.id.0, assignee = ?result.assigned_to, "assigned via territory");
            return result;
        }
        debug!(lead = %lead.id.0, reason = ?result.reason, "territory pass exhausted");

        let strategy = self.config().default_strategy;
        let result = match strategy {
            DefaultStrategy::RoundRobin => self.assign_round_robin(lead),
            DefaultStrategy::LoadBalance => self.assign_load_balanced(lead),
            DefaultStrategy::Territory => self.assign_by_territory(lead),
            DefaultStrategy::Priority => self.assign_by_priority(lead, &enrichment),
        };

        if result.success {
            info!(
                lead = %lead.id.0,
                assignee = ?result.assigned_to,
                strategy = strategy.label(),
                "assigned via default strategy"
            );
        } else {
            info!(lead = %lead.id.0, reason = ?result.reason, "no assignee found");
        }
        result
    }

    /// Active rules in priority order; first full match with a valid target
    /// wins. An invalid target falls through to the next matching rule.
    fn assign_by_rules(&self, lead: &Lead) -> AssignmentResult {
        let enforcement = self.config().capacity_enforcement;
        for rule in self.rules.active_rules() {
            if !matches_rule(&rule, lead) {
                continue;
            }
            let target = rule.action.target.clone();
            if !self.capacity.validate(&target, enforcement) {
                debug!(rule = %rule.name, target = %target, "matched rule target invalid");
                continue;
            }
            self.record(&lead.id, &target, AssignmentType::Rule, Some(rule.name.clone()), None);
            return AssignmentResult::assigned(target, AssignmentType::Rule).with_rule(rule.name);
        }
        AssignmentResult::unassigned("no matching rules found")
    }

    /// Resolves the lead's region to its highest-priority territory and scans
    /// that territory's users in list order for the first valid one.
    fn assign_by_territory(&self, lead: &Lead) -> AssignmentResult {
        let Some(region) = lead.region.as_deref() else {
            return AssignmentResult::unassigned("no matching territory found");
        };
        let Some(territory) = self.rules.find_matching_territory(region) else {
            return AssignmentResult::unassigned("no matching territory found");
        };

        let enforcement = self.config().capacity_enforcement;
        for user_id in &territory.assigned_users {
            if self.capacity.validate(user_id, enforcement) {
                self.record(
                    &lead.id,
                    user_id,
                    AssignmentType::Territory,
                    None,
                    Some(territory.id.clone()),
                );
                return AssignmentResult::assigned(user_id.clone(), AssignmentType::Territory)
                    .with_territory(territory.id);
            }
        }
        AssignmentResult::unassigned("no available users in territory")
    }

    /// Rotates through currently available members, availability only. The
    /// shared index persists across calls so N available members are each
    /// picked once before any repeat.
    fn assign_round_robin(&self, lead: &Lead) -> AssignmentResult {
        let pool = self.capacity.available_members();
        if pool.is_empty() {
            return AssignmentResult::unassigned("no available team members");
        }

        let slot = {
            let mut rotation = self.rotation.lock().expect("rotation lock poisoned");
            let slot = *rotation % pool.len();
            *rotation = (slot + 1) % pool.len();
            slot
        };

        let user_id = pool[slot].user_id.clone();
        self.record(&lead.id, &user_id, AssignmentType::RoundRobin, None, None);
        AssignmentResult::assigned(user_id, AssignmentType::RoundRobin)
    }

    /// Picks the least-loaded member with spare capacity and atomically
    /// increments its count; ties keep insertion order.
    fn assign_load_balanced(&self, lead: &Lead) -> AssignmentResult {
        let mut pool = self.capacity.members_with_spare_capacity();
        pool.sort_by(|a, b| a.load_ratio().total_cmp(&b.load_ratio()));

        for member in &pool {
            // Re-checked under the capacity lock; a concurrent assignment may
            // have consumed the slot since the snapshot above.
            if self.capacity.try_assign(&member.user_id) {
                self.record(&lead.id, &member.user_id, AssignmentType::LoadBalance, None, None);
                return AssignmentResult::assigned(
                    member.user_id.clone(),
                    AssignmentType::LoadBalance,
                );
            }
        }
        AssignmentResult::unassigned("no team members with spare capacity")
    }

    /// Scores the lead, pushes a diagnostic queue item, then resolves to the
    /// available member with the most specialties.
    fn assign_by_priority(&self, lead: &Lead, enrichment: &LeadEnrichment) -> AssignmentResult {
        let priority = priority_score(lead, enrichment.deal_size);
        {
            let mut queue = self.queue.lock().expect("queue lock poisoned");
            queue.push(AssignmentQueueItem {
                lead_id: lead.id.clone(),
                company: lead.company.clone(),
                priority,
                attempts: 0,
                last_attempt: None,
            });
            queue.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        }

        let mut pool = self.capacity.available_members();
        if pool.is_empty() {
            return AssignmentResult::unassigned(
                "no available team members for priority assignment",
            );
        }
        pool.sort_by(|a, b| b.specialties.len().cmp(&a.specialties.len()));

        let user_id = pool[0].user_id.clone();
        self.record(&lead.id, &user_id, AssignmentType::Priority, None, None);
        AssignmentResult::assigned(user_id, AssignmentType::Priority)
    }

    fn record(
        &self,
        lead_id: &LeadId,
        assigned_to: &str,
        assignment_type: AssignmentType,
        rule_name: Option<String>,
        territory_id: Option<String>,
    ) {
        self.history.record(AssignmentHistoryEntry {
            lead_id: lead_id.clone(),
            assigned_to: assigned_to.to_string(),
            assigned_by: "system".to_string(),
            assignment_date: Utc::now(),
            assignment_type,
            rule_name,
            territory_id,
        });
    }

    pub fn config(&self) -> EngineConfig {
        self.config.read().expect("config lock poisoned").clone()
    }

    pub fn update_config(&self, update: EngineConfigUpdate) -> EngineConfig {
        let mut config = self.config.write().expect("config lock poisoned");
        *config = config.merged(update);
        config.clone()
    }

    /// Read-only view of the priority queue, descending by priority.
    pub fn queue_snapshot(&self) -> Vec<AssignmentQueueItem> {
        self.queue.lock().expect("queue lock poisoned").clone()
    }

    pub fn history(&self, lead_id: Option<&LeadId>) -> Vec<AssignmentHistoryEntry> {
        self.history.query(lead_id)
    }

    pub fn rule_store(&self) -> &RuleStore {
        &self.rules
    }

    pub fn capacity_tracker(&self) -> &CapacityTracker {
        &self.capacity
    }
}
