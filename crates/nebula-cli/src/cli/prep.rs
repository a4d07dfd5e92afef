//! Meeting preparation command: gather everything linked to an entity.

use anyhow::Result;
use console::style;

use nebula_types::record::{KnowledgeRecord, StoredRecord};

use crate::state::AppState;

pub async fn prep(state: &AppState, name: &str, limit: usize, json: bool) -> Result<()> {
    let Some(context) = state.service.entity_context(name, limit).await? else {
        anyhow::bail!("no entity named '{name}'");
    };

    if json {
        let out = serde_json::json!({
            "entity": context.entity,
            "events": context.events,
            "strategies": context.strategies,
            "insights": context.insights,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let entity = &context.entity.record;
    println!();
    println!(
        "  {} Meeting prep: {}",
        style("📋").bold(),
        style(entity.label()).cyan().bold()
    );
    if let KnowledgeRecord::Entity(e) = entity {
        if let Some(description) = &e.description {
            println!("  {description}");
        }
        if let Some(notes) = &e.notes {
            println!("  {}", style(notes).dim());
        }
    }

    section("Recent events", &context.events, |record| match record {
        KnowledgeRecord::Event(e) => {
            let mut line = e.title.clone();
            if let Some(outcomes) = &e.outcomes {
                line.push_str(&format!(" -- outcomes: {outcomes}"));
            }
            line
        }
        other => other.label().to_string(),
    });

    section("Active strategies", &context.strategies, |record| {
        record.label().to_string()
    });

    section("Related insights", &context.insights, |record| {
        record.label().to_string()
    });

    println!();
    Ok(())
}

fn section(title: &str, records: &[StoredRecord], line: impl Fn(&KnowledgeRecord) -> String) {
    println!();
    println!("  {}", style(format!("── {title} ──")).dim());
    if records.is_empty() {
        println!("  {}", style("none").dim());
        return;
    }
    for stored in records {
        println!("  {} {}", style("•").dim(), line(&stored.record));
    }
}
