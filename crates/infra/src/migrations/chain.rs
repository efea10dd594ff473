//! Ordered registry of migrations.

use tracing::debug;

use courier_core::{DomainError, DomainResult};

use super::{JobMigration, push_process};
use crate::jobs::types::JobRecord;

/// Migrations sorted by strictly increasing target version.
///
/// Built once at startup and read-only afterwards; share it by reference or
/// `Arc` across loader threads.
#[derive(Debug, Clone, Default)]
pub struct MigrationChain {
    migrations: Vec<JobMigration>,
}

impl MigrationChain {
    /// Build a chain. Target versions must be strictly increasing in
    /// registration order.
    pub fn new(migrations: Vec<JobMigration>) -> DomainResult<Self> {
        for pair in migrations.windows(2) {
            if pair[1].target_version() <= pair[0].target_version() {
                return Err(DomainError::invariant(format!(
                    "migration '{}' targets version {} after '{}' targeted {}",
                    pair[1].name(),
                    pair[1].target_version(),
                    pair[0].name(),
                    pair[0].target_version(),
                )));
            }
        }
        Ok(Self { migrations })
    }

    /// Every migration shipped with this crate.
    pub fn standard() -> Self {
        Self {
            migrations: vec![push_process::MIGRATION],
        }
    }

    /// Schema version of a fully migrated record (0 for an empty chain).
    pub fn current_version(&self) -> u32 {
        self.migrations
            .last()
            .map(JobMigration::target_version)
            .unwrap_or(0)
    }

    pub fn migrations(&self) -> &[JobMigration] {
        &self.migrations
    }

    /// Whether `apply` would run at least one migration on `record`.
    pub fn needs_migration(&self, record: &JobRecord) -> bool {
        record.schema_version < self.current_version()
    }

    /// Bring a record up to [`current_version`](Self::current_version).
    ///
    /// Runs, in order, every migration whose target is above the record's
    /// version, stamping the target after each. A record already current (or
    /// ahead) is returned untouched, so applying twice equals applying once.
    pub fn apply(&self, mut record: JobRecord) -> JobRecord {
        for migration in &self.migrations {
            if migration.target_version() <= record.schema_version {
                continue;
            }
            let from_version = record.schema_version;
            let from_key = record.factory_key.clone();

            record = migration.migrate(record);
            record.schema_version = migration.target_version();

            debug!(
                migration = migration.name(),
                from_version,
                to_version = record.schema_version,
                factory_key = %record.factory_key,
                rewritten = from_key != record.factory_key,
                "applied job migration"
            );
        }
        record
    }
}
