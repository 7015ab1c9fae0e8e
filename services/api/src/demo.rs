use crate::infra::{build_engine, seed_leads, seed_members, seed_rules, seed_territories};
use clap::Args;
use lead_engine::assignment::{CapacityEnforcement, EngineConfigUpdate};
use lead_engine::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Default strategy after the rule and territory passes (round_robin,
    /// load_balance, territory, priority). Unrecognized labels degrade to
    /// round_robin.
    #[arg(long)]
    pub(crate) default_strategy: Option<String>,
    /// Only require availability (not spare capacity) in the rule and
    /// territory passes, matching the legacy engine's behavior.
    #[arg(long)]
    pub(crate) availability_only: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let engine = build_engine();

    for rule in seed_rules() {
        engine.rule_store().add_rule(rule)?;
    }
    for territory in seed_territories() {
        engine.rule_store().add_territory(territory)?;
    }
    for member in seed_members() {
        engine.capacity_tracker().set_capacity(member);
    }

    let config = engine.update_config(EngineConfigUpdate {
        default_strategy: args.default_strategy,
        capacity_enforcement: args
            .availability_only
            .then_some(CapacityEnforcement::AvailabilityOnly),
        ..EngineConfigUpdate::default()
    });

    println!("Lead assignment demo");
    println!(
        "default strategy: {}, capacity enforcement: {:?}",
        config.default_strategy.label(),
        config.capacity_enforcement
    );

    println!("\nDecisions");
    for lead in seed_leads() {
        let result = engine.assign(&lead);
        match (&result.assigned_to, &result.reason) {
            (Some(assignee), _) => println!(
                "  {:<10} {:<20} -> {:<14} via {}{}",
                lead.id.0,
                lead.company,
                assignee,
                result
                    .assignment_type
                    .map(|kind| kind.label())
                    .unwrap_or("unknown"),
                result
                    .rule
                    .as_deref()
                    .map(|rule| format!(" ({rule})"))
                    .unwrap_or_default(),
            ),
            (None, reason) => println!(
                "  {:<10} {:<20} -> unassigned: {}",
                lead.id.0,
                lead.company,
                reason.as_deref().unwrap_or("no reason recorded")
            ),
        }
    }

    println!("\nTeam capacity after routing");
    for member in engine.capacity_tracker().members() {
        println!(
            "  {:<14} {:>2}/{:<2} leads, available: {}",
            member.user_id, member.current_leads, member.max_leads, member.availability
        );
    }

    let history = engine.history(None);
    println!("\nAudit history ({} entries)", history.len());
    for entry in history {
        println!(
            "  {} {} -> {} [{}]",
            entry.assignment_date.format("%H:%M:%S"),
            entry.lead_id.0,
            entry.assigned_to,
            entry.assignment_type.label()
        );
    }

    let queue = engine.queue_snapshot();
    if !queue.is_empty() {
        println!("\nPriority queue (diagnostic)");
        for item in queue {
            println!("  {:<10} priority {:.1}", item.lead_id.0, item.priority);
        }
    }

    Ok(())
}
