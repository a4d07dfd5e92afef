//! CLI command definitions and dispatch for the `nebula` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! verb-noun pattern (e.g., `nebula schema create`, `nebula list
//! insight`).

pub mod prep;
pub mod records;
pub mod schema;
pub mod seed;
pub mod stats;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use uuid::Uuid;

/// Personal knowledge base on a vector store.
#[derive(Parser)]
#[command(name = "nebula", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the collection schema (create, validate, drop).
    Schema {
        #[command(subcommand)]
        action: SchemaCommand,
    },

    /// List records of one kind, optionally filtered.
    #[command(alias = "ls")]
    List {
        /// Record kind: entity | strategy | insight | event | process.
        kind: String,

        /// Filter by domain: personal | work | both.
        #[arg(long)]
        domain: Option<String>,

        /// Filter by status (e.g. active, superseded).
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of records.
        #[arg(short, long, default_value = "25")]
        limit: usize,
    },

    /// Show one record by id.
    Show {
        /// Record kind: entity | strategy | insight | event | process.
        kind: String,

        /// Record id.
        id: Uuid,

        /// Resolve one level of references.
        #[arg(long)]
        expand: bool,
    },

    /// Similarity search over one collection.
    Search {
        /// Record kind: entity | strategy | insight | event | process.
        kind: String,

        /// Free-text query.
        query: String,

        /// Maximum number of hits.
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Mark a record as superseded by a newer one of the same kind.
    Supersede {
        /// Record kind: strategy | insight | process.
        kind: String,

        /// The record being retired.
        id: Uuid,

        /// The record replacing it.
        successor: Uuid,
    },

    /// Delete a record by id.
    #[command(alias = "rm")]
    Delete {
        /// Record kind: entity | strategy | insight | event | process.
        kind: String,

        /// Record id.
        id: Uuid,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Load a linked example dataset into the store.
    Seed,

    /// Gather everything known about an entity, for meeting prep.
    Prep {
        /// Entity name, matched exactly.
        name: String,

        /// Maximum records per section.
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Record counts per collection.
    Stats,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SchemaCommand {
    /// Create all collections in dependency order. Safe to re-run.
    Create,

    /// Check each collection against the expected shape.
    Validate,

    /// Drop every collection and all data in it.
    Drop {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },
}
