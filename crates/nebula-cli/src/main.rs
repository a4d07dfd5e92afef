//! Nebula CLI entry point.
//!
//! Binary name: `nebula`
//!
//! Parses CLI arguments, wires the knowledge service against the
//! configured Weaviate instance and embedding provider, then dispatches
//! to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, SchemaCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,nebula=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "nebula", &mut std::io::stdout());
        return Ok(());
    }

    // Wire config, store, and embedder
    let state = AppState::init().await?;

    match cli.command {
        Commands::Schema { action } => match action {
            SchemaCommand::Create => cli::schema::create(&state, cli.json).await?,
            SchemaCommand::Validate => cli::schema::validate(&state, cli.json).await?,
            SchemaCommand::Drop { force } => cli::schema::drop(&state, force, cli.json).await?,
        },

        Commands::List {
            kind,
            domain,
            status,
            limit,
        } => {
            cli::records::list(&state, &kind, domain, status, limit, cli.json).await?;
        }

        Commands::Show { kind, id, expand } => {
            cli::records::show(&state, &kind, id, expand, cli.json).await?;
        }

        Commands::Search { kind, query, limit } => {
            cli::records::search(&state, &kind, &query, limit, cli.json).await?;
        }

        Commands::Supersede {
            kind,
            id,
            successor,
        } => {
            cli::records::supersede(&state, &kind, id, successor, cli.json).await?;
        }

        Commands::Delete { kind, id, force } => {
            cli::records::delete(&state, &kind, id, force, cli.json).await?;
        }

        Commands::Seed => cli::seed::seed(&state, cli.json).await?,

        Commands::Prep { name, limit } => cli::prep::prep(&state, &name, limit, cli.json).await?,

        Commands::Stats => cli::stats::stats(&state, cli.json).await?,

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
