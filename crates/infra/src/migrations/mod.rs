//! Versioned migration of persisted job records.
//!
//! ## Design
//!
//! - A migration is a plain `{ target_version, transform }` value, not a trait
//!   object. New migrations are appended to the registry, never edited.
//! - Transforms are total: a record a migration does not recognize comes back
//!   unchanged.
//! - A transform never fails. Anything it cannot carry forward is rewritten to
//!   a sentinel factory key (see [`crate::jobs::sentinel`]), so one corrupt
//!   record cannot block the load of the others.
//!
//! ## Components
//!
//! - `JobMigration`: one registered migration
//! - `MigrationChain`: ordered registry applied by the store on load
//! - `push_process`: rewrites legacy message-processing jobs into the
//!   complete-message format

pub mod chain;
pub mod push_process;

pub use chain::MigrationChain;
pub use push_process::MessageState;

use courier_core::DomainError;

use crate::jobs::data::JobDataError;
use crate::jobs::types::JobRecord;

/// Rewrites one record into the shape expected at `target_version`.
pub type Transform = fn(JobRecord) -> JobRecord;

/// A registered migration: the schema version it upgrades to and how.
#[derive(Debug, Clone, Copy)]
pub struct JobMigration {
    target_version: u32,
    name: &'static str,
    transform: Transform,
}

impl JobMigration {
    pub const fn new(target_version: u32, name: &'static str, transform: Transform) -> Self {
        Self {
            target_version,
            name,
            transform,
        }
    }

    pub fn target_version(&self) -> u32 {
        self.target_version
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn migrate(&self, record: JobRecord) -> JobRecord {
        (self.transform)(record)
    }
}

/// Why a record could not be carried forward.
///
/// Never crosses the migration boundary: the migration that produced it
/// logs it and redirects the record to a sentinel.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    JobData(#[from] JobDataError),
    #[error("invalid base64 content: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid legacy message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("legacy message has no {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    InvalidServiceId(#[from] DomainError),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}
