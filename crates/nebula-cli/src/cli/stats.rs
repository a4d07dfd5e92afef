//! Collection statistics dashboard.

use anyhow::Result;
use console::style;

use crate::state::AppState;

pub async fn stats(state: &AppState, json: bool) -> Result<()> {
    let counts = state.service.stats().await?;
    let total: u64 = counts.0.iter().map(|(_, n)| n).sum();

    if json {
        let out = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "vector_source": state.vector_source.to_string(),
            "collections": counts
                .0
                .iter()
                .map(|(kind, n)| (kind.collection_name(), n))
                .collect::<std::collections::BTreeMap<_, _>>(),
            "total": total,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Nebula v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("  {}", style("── Collections ──").dim());
    for (kind, count) in &counts.0 {
        println!("  {:<10} {}", kind.collection_name(), style(count).bold());
    }
    println!("  {:<10} {}", "Total:", style(total).bold());
    println!();
    println!("  {}", style("── System ──").dim());
    println!(
        "  Vector source: {}",
        style(state.vector_source.to_string()).dim()
    );
    println!("  Data dir:      {}", style(state.data_dir.display()).dim());
    println!();
    Ok(())
}
