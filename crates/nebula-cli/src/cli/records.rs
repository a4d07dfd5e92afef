//! Record CRUD and search commands: list, show, search, supersede, delete.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use nebula_types::query::Filter;
use nebula_types::record::{KnowledgeRecord, RecordKind, StoredRecord};
use nebula_types::taxonomy::{Domain, LifecycleStatus};

use crate::state::AppState;

pub fn parse_kind(kind: &str) -> Result<RecordKind> {
    kind.parse::<RecordKind>().map_err(|e| anyhow::anyhow!(e))
}

fn status_text(record: &KnowledgeRecord) -> String {
    match record {
        KnowledgeRecord::Entity(e) => e.status.to_string(),
        KnowledgeRecord::Event(_) => "-".to_string(),
        other => other
            .lifecycle()
            .map(|(status, _)| status.to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}

fn short_label(record: &KnowledgeRecord) -> String {
    let label = record.label();
    if label.chars().count() > 60 {
        let prefix: String = label.chars().take(57).collect();
        format!("{prefix}...")
    } else {
        label.to_string()
    }
}

/// List records of one kind, optionally filtered by domain and status.
pub async fn list(
    state: &AppState,
    kind: &str,
    domain: Option<String>,
    status: Option<String>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(kind)?;

    let mut filters: Vec<Filter> = Vec::new();
    if let Some(domain) = domain {
        let domain = domain.parse::<Domain>().map_err(|e| anyhow::anyhow!(e))?;
        filters.push(Filter::eq("domain", domain));
    }
    if let Some(status) = status {
        filters.push(Filter::eq("status", status));
    }
    let filter = match filters.len() {
        0 => None,
        1 => filters.pop(),
        _ => Some(Filter::And(filters)),
    };

    let records = state.service.list(kind, filter.as_ref(), limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!(
            "  {} No {} records found.",
            style("i").blue().bold(),
            kind
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new(kind.collection_name()).fg(Color::White),
        Cell::new("Domain").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for stored in &records {
        let status_cell = match status_text(&stored.record).as_str() {
            "active" => Cell::new("● active").fg(Color::Green),
            "superseded" => Cell::new("○ superseded").fg(Color::Yellow),
            "archived" | "inactive" => Cell::new("◌ archived").fg(Color::DarkGrey),
            other => Cell::new(other),
        };
        table.add_row(vec![
            Cell::new(short_label(&stored.record)).fg(Color::Cyan),
            Cell::new(stored.record.domain().to_string()),
            status_cell,
            Cell::new(stored.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

fn print_record(stored: &StoredRecord) {
    println!();
    println!(
        "  {} {}",
        style(stored.record.kind().collection_name()).bold(),
        style(stored.record.label()).cyan()
    );
    println!();
    println!("  {}  {}", style("Domain:").bold(), stored.record.domain());
    println!(
        "  {}  {}",
        style("Status:").bold(),
        status_text(&stored.record)
    );
    if let Some((_, Some(successor))) = stored.record.lifecycle() {
        println!(
            "  {}  {}",
            style("Superseded by:").bold(),
            style(successor.to_string()).yellow()
        );
    }
    println!(
        "  {}  {}",
        style("ID:").bold(),
        style(stored.id.to_string()).dim()
    );

    if !stored.references.is_empty() {
        println!();
        println!("  {}", style("── References ──").dim());
        for (ref_name, targets) in stored.references.iter() {
            match stored.resolved.get(ref_name) {
                Some(resolved) => {
                    println!("  {ref_name}:");
                    for entry in resolved {
                        println!(
                            "    {} {} {}",
                            style("→").dim(),
                            entry.record.label(),
                            style(entry.id.to_string()).dim()
                        );
                    }
                }
                None => println!("  {ref_name}: {} linked", targets.len()),
            }
        }
    }
    println!();
}

/// Show one record, optionally with resolved references.
pub async fn show(state: &AppState, kind: &str, id: Uuid, expand: bool, json: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    let stored = state
        .service
        .get(kind, id, expand)
        .await?
        .ok_or_else(|| anyhow::anyhow!("{kind} record {id} not found"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }
    print_record(&stored);
    Ok(())
}

/// Similarity search over one collection.
pub async fn search(
    state: &AppState,
    kind: &str,
    query: &str,
    limit: usize,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let hits = state.service.search(kind, query, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!();
        println!("  {} No matches.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Distance").fg(Color::White),
        Cell::new(kind.collection_name()).fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for hit in &hits {
        table.add_row(vec![
            Cell::new(format!("{:.4}", hit.distance)).fg(Color::Yellow),
            Cell::new(short_label(&hit.record)).fg(Color::Cyan),
            Cell::new(hit.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Mark a record as superseded by a newer one of the same kind.
pub async fn supersede(
    state: &AppState,
    kind: &str,
    id: Uuid,
    successor: Uuid,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    state.service.supersede(kind, id, successor).await?;

    if json {
        let out = serde_json::json!({
            "kind": kind.collection_name(),
            "superseded": id,
            "successor": successor,
            "status": LifecycleStatus::Superseded.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} {} is now superseded by {}",
        style("✓").green().bold(),
        kind,
        style(id.to_string()).dim(),
        style(successor.to_string()).cyan()
    );
    println!();
    Ok(())
}

/// Delete a record after confirmation.
pub async fn delete(state: &AppState, kind: &str, id: Uuid, force: bool, json: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    let stored = state
        .service
        .get(kind, id, false)
        .await?
        .ok_or_else(|| anyhow::anyhow!("{kind} record {id} not found"))?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete {} '{}'?",
                kind,
                short_label(&stored.record)
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    state.service.delete(kind, id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "kind": kind.collection_name(), "deleted": id })
        );
    } else {
        println!();
        println!(
            "  {} Deleted {} '{}'",
            style("✓").green().bold(),
            kind,
            short_label(&stored.record)
        );
        println!();
    }
    Ok(())
}
