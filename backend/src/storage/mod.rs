//! # Storage Module
//!
//! Handles all data persistence for the growth tracker.
//!
//! - **connection.rs** - SQLite pool creation and idempotent schema setup
//! - **repositories/** - one repository per aggregate (users, auth tokens,
//!   children, growth records)
//!
//! Repositories return `anyhow::Result`; the domain layer decides how a
//! storage failure is reported to callers. Every child and growth record
//! query is scoped by the owning parent's id.

pub mod connection;
pub mod repositories;

pub use connection::DbConnection;
pub use repositories::{
    ChildRepository,
    GrowthRecordRepository,
    TokenRepository,
    UserRepository,
};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Format a timestamp for storage.
///
/// Fixed precision and a `Z` suffix keep the stored text lexicographically
/// ordered, so SQL comparisons on these columns behave like time comparisons.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The current time at the precision [`format_timestamp`] keeps, so an entity
/// built in memory compares equal to the same entity read back from storage.
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid stored timestamp: {}", value))?
        .with_timezone(&Utc))
}
