//! Persisted job queue.
//!
//! ## Design
//!
//! - A job is an opaque [`JobRecord`] (factory key, payload, schema version)
//!   plus lifecycle state
//! - Records are migrated to the current schema when the store restores them,
//!   before any of them can be claimed
//! - Handlers are looked up by factory key; the two sentinel handlers are
//!   always present
//! - Each claimed job runs once; there is no retry scheduling
//!
//! ## Components
//!
//! - `Job`/`JobRecord`: lifecycle state and the migratable record
//! - `JobData`: typed key-value parameters used by legacy payloads
//! - `JobStore`: persistence (in-memory for tests/dev)
//! - `JobExecutor`: runs claimed jobs
//! - `sentinel`: well-known factory keys and terminal handlers

pub mod data;
pub mod executor;
pub mod sentinel;
pub mod store;
pub mod types;

pub use data::{JobData, JobDataBuilder, JobDataError};
pub use executor::{ExecutorStats, JobExecutor, JobExecutorConfig, JobExecutorHandle};
pub use sentinel::{
    ERROR_JOB_KEY, FAILING_JOB_KEY, LEGACY_PUSH_PROCESS_KEY, LegacyProcessingError,
    PUSH_PROCESS_V2_KEY,
};
pub use store::{InMemoryJobStore, JobStats, JobStore, JobStoreError, RestoreReport};
pub use types::{Job, JobAttemptRecord, JobId, JobRecord, JobResult, JobStatus};
