//! Shared domain types for Nebula.
//!
//! Contains the five knowledge record kinds, their classification enums,
//! reference maps, query filters, configuration types, and the error
//! taxonomy. No I/O lives here.

pub mod config;
pub mod error;
pub mod query;
pub mod record;
pub mod taxonomy;
