//! Seed command: loads a small linked example dataset.
//!
//! Creates one record per collection, wired together with references,
//! so search and prep commands have something to work with right after
//! schema creation.

use anyhow::Result;
use chrono::Utc;
use console::style;
use uuid::Uuid;

use nebula_types::record::{
    Entity, Event, Insight, KnowledgeRecord, Process, References, Strategy,
};
use nebula_types::taxonomy::{
    Confidence, Domain, EntityStatus, EntityType, EventType, LifecycleStatus, SourceType,
    StrategyType, TimeHorizon,
};

use crate::state::AppState;

pub async fn seed(state: &AppState, json: bool) -> Result<()> {
    let now = Utc::now();

    let entity_id = state
        .service
        .create(
            KnowledgeRecord::Entity(Entity {
                name: "KPMG".to_string(),
                entity_type: EntityType::Company,
                domain: Domain::Work,
                description: Some(
                    "Big 4 consulting firm. Key partner for AI Governance workshops.".to_string(),
                ),
                notes: Some(
                    "Prefer structured agendas. Jean is primary contact - responsive on email."
                        .to_string(),
                ),
                status: EntityStatus::Active,
                created_at: now,
                updated_at: now,
            }),
            References::new(),
        )
        .await?;

    let strategy_id = state
        .service
        .create(
            KnowledgeRecord::Strategy(Strategy {
                title: "Q1 2025 Product Priorities".to_string(),
                content: "Focus on AI agent reliability, user feedback loops, and enterprise \
                          integration features."
                    .to_string(),
                strategy_type: StrategyType::Priority,
                domain: Domain::Work,
                time_horizon: Some(TimeHorizon::Quarterly),
                valid_from: Some(now),
                valid_until: None,
                status: LifecycleStatus::Active,
                superseded_by: None,
                created_at: now,
                updated_at: now,
            }),
            References::single("appliesToEntities", entity_id),
        )
        .await?;

    let insight_id = state
        .service
        .create(
            KnowledgeRecord::Insight(Insight {
                content: "Prompt chaining with explicit handoff context reduces hallucination \
                          rates by 40%"
                    .to_string(),
                source_name: Some("Building Effective Agents - Anthropic Blog".to_string()),
                source_type: Some(SourceType::Article),
                domain: Domain::Both,
                tags: vec![
                    "ai-agents".to_string(),
                    "prompt-engineering".to_string(),
                    "reliability".to_string(),
                ],
                status: LifecycleStatus::Active,
                superseded_by: None,
                confidence: Some(Confidence::High),
                created_at: now,
                updated_at: now,
            }),
            References::single("relatedEntities", entity_id),
        )
        .await?;

    let mut event_refs = References::new();
    event_refs.add("involvesEntities", entity_id);
    event_refs.add("relatesToStrategies", strategy_id);
    event_refs.add("generatedInsights", insight_id);
    let event_id = state
        .service
        .create(
            KnowledgeRecord::Event(Event {
                title: "KPMG Workshop Planning".to_string(),
                event_type: EventType::Meeting,
                summary: Some(
                    "Discussed AI governance framework and workshop structure for March delivery."
                        .to_string(),
                ),
                participants: vec![
                    "Jean (KPMG Lead)".to_string(),
                    "Marie (Product)".to_string(),
                    "Alex (Technical)".to_string(),
                ],
                domain: Domain::Work,
                event_date: Some(now),
                outcomes: Some("Agreed on 3-day workshop format with hands-on sessions.".to_string()),
                action_items: Some(
                    "1. Draft agenda by Friday\n2. Prepare case studies\n3. Book venue".to_string(),
                ),
                open_questions: Some(
                    "Budget approval timeline? Participant capacity?".to_string(),
                ),
                created_at: now,
            }),
            event_refs,
        )
        .await?;

    let mut process_refs = References::new();
    process_refs.add("appliesToEntities", entity_id);
    process_refs.add("relatedStrategies", strategy_id);
    let process_id = state
        .service
        .create(
            KnowledgeRecord::Process(Process {
                title: "Stakeholder Update Cadence".to_string(),
                content: "Weekly stakeholder updates following this structure:\n\
                          1. Progress since last update\n\
                          2. Blockers and risks\n\
                          3. Upcoming milestones\n\
                          4. Questions for stakeholders\n\n\
                          Keep updates concise (max 5 minutes). Use Slack for async updates, \
                          meetings for decisions only."
                    .to_string(),
                domain: Domain::Work,
                triggers: Some(
                    "Every Friday EOD, or when major milestone reached, or when blocker needs \
                     escalation"
                        .to_string(),
                ),
                status: LifecycleStatus::Active,
                superseded_by: None,
                created_at: now,
                updated_at: now,
            }),
            process_refs,
        )
        .await?;

    if json {
        let out = serde_json::json!({
            "entity": entity_id,
            "strategy": strategy_id,
            "insight": insight_id,
            "event": event_id,
            "process": process_id,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Seeded example dataset",
        style("✓").green().bold()
    );
    println!();
    let row = |label: &str, id: Uuid| {
        println!(
            "  {:<10} {}",
            style(label).bold(),
            style(id.to_string()).dim()
        );
    };
    row("Entity", entity_id);
    row("Strategy", strategy_id);
    row("Insight", insight_id);
    row("Event", event_id);
    row("Process", process_id);
    println!();
    println!(
        "  Try: {}",
        style("nebula search insight \"How to make AI agents more reliable?\"").yellow()
    );
    println!("  Or:  {}", style("nebula prep KPMG").yellow());
    println!();
    Ok(())
}
