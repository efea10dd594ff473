//! Infrastructure layer: job persistence, execution, record migration and
//! network configuration.

mod codec;
pub mod config;
pub mod jobs;
pub mod migrations;

pub use config::{ConfigError, NetworkConfiguration};
pub use jobs::{InMemoryJobStore, Job, JobExecutor, JobRecord, JobStore};
pub use migrations::{JobMigration, MigrationChain};
