//! Schema lifecycle commands: create, validate, drop.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use nebula_types::record::RecordKind;

use crate::state::AppState;

/// Create all collections in dependency order.
pub async fn create(state: &AppState, json: bool) -> Result<()> {
    state.service.ensure_schema().await?;

    if json {
        let collections: Vec<&str> = RecordKind::CREATION_ORDER
            .iter()
            .map(|k| k.collection_name())
            .collect();
        let out = serde_json::json!({
            "created": collections,
            "vector_source": state.vector_source.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} Schema is in place", style("✓").green().bold());
    for kind in RecordKind::CREATION_ORDER {
        println!("    {} {}", style("•").dim(), kind.collection_name());
    }
    println!();
    println!(
        "  Vector source: {}",
        style(state.vector_source.to_string()).cyan()
    );
    println!();
    Ok(())
}

/// Check each collection against the expected shape.
pub async fn validate(state: &AppState, json: bool) -> Result<()> {
    let statuses = state.service.validate_schema().await?;
    let all_ok = statuses.iter().all(|s| s.result.is_ok());

    if json {
        let rows: Vec<serde_json::Value> = statuses
            .iter()
            .map(|s| {
                serde_json::json!({
                    "collection": s.kind.collection_name(),
                    "valid": s.result.is_ok(),
                    "error": s.result.as_ref().err().map(|e| e.to_string()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Collection").fg(Color::White),
            Cell::new("Status").fg(Color::White),
        ]);

        for status in &statuses {
            let cell = match &status.result {
                Ok(()) => Cell::new("✓ valid").fg(Color::Green),
                Err(err) => Cell::new(format!("✗ {err}")).fg(Color::Red),
            };
            table.add_row(vec![Cell::new(status.kind.collection_name()), cell]);
        }

        println!();
        println!("{table}");
        println!();
    }

    if !all_ok {
        anyhow::bail!("schema validation failed");
    }
    Ok(())
}

/// Drop every collection after confirmation.
pub async fn drop(state: &AppState, force: bool, json: bool) -> Result<()> {
    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Drop all collections and every record in them?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    state.service.drop_all().await?;

    if json {
        println!("{}", serde_json::json!({ "dropped": true }));
    } else {
        println!();
        println!("  {} All collections dropped", style("✓").green().bold());
        println!();
    }
    Ok(())
}
