//! Core job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use courier_core::JobId;

/// The persisted, migratable part of a job.
///
/// `factory_key` routes the job to a handler, `payload` is opaque to
/// everything except that handler, and `schema_version` records which
/// migrations have already been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub factory_key: String,
    #[serde(with = "crate::codec::base64_bytes")]
    pub payload: Vec<u8>,
    pub schema_version: u32,
}

impl JobRecord {
    pub fn new(factory_key: impl Into<String>, payload: Vec<u8>, schema_version: u32) -> Self {
        Self {
            factory_key: factory_key.into(),
            payload,
            schema_version,
        }
    }

    /// Same record routed to a different handler. Payload and version are kept.
    pub fn with_factory_key(mut self, factory_key: impl Into<String>) -> Self {
        self.factory_key = factory_key.into();
        self
    }

    /// Same record carrying a different payload.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }
}

/// Job execution status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued, waiting to be picked up
    Pending,
    /// Currently being executed
    Running,
    /// Completed successfully
    Completed,
    /// Handler reported failure
    Failed { error: String },
    /// Cancelled by user/system
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

/// A queued job: stable identity, the migratable record and lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub record: JobRecord,
    pub status: JobStatus,
    /// Number of times the job has been claimed
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history: Vec<JobAttemptRecord>,
}

/// Record of a job execution attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAttemptRecord {
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl Job {
    /// Create a pending job around a record.
    pub fn new(record: JobRecord) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            record,
            status: JobStatus::Pending,
            attempt: 0,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    pub fn factory_key(&self) -> &str {
        &self.record.factory_key
    }

    pub fn payload(&self) -> &[u8] {
        &self.record.payload
    }

    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
        self.attempt += 1;
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self, started_at: DateTime<Utc>) {
        self.finish(started_at, None);
        self.status = JobStatus::Completed;
    }

    pub fn mark_failed(&mut self, error: String, started_at: DateTime<Utc>) {
        self.finish(started_at, Some(error.clone()));
        self.status = JobStatus::Failed { error };
    }

    pub fn mark_cancelled(&mut self) {
        self.status = JobStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    fn finish(&mut self, started_at: DateTime<Utc>, error: Option<String>) {
        let now = Utc::now();
        self.updated_at = now;
        self.history.push(JobAttemptRecord {
            attempt: self.attempt,
            started_at,
            finished_at: now,
            success: error.is_none(),
            error,
            duration_ms: (now - started_at).num_milliseconds().max(0) as u64,
        });
    }
}

/// Result of job execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// Job completed successfully
    Success,
    /// Job failed with an error
    Failure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_lifecycle() {
        let mut job = Job::new(JobRecord::new("test", vec![1, 2, 3], 1));

        assert!(matches!(job.status, JobStatus::Pending));
        assert_eq!(job.attempt, 0);

        job.mark_running();
        assert!(matches!(job.status, JobStatus::Running));
        assert_eq!(job.attempt, 1);

        let started = Utc::now();
        job.mark_completed(started);
        assert!(matches!(job.status, JobStatus::Completed));
        assert_eq!(job.history.len(), 1);
        assert!(job.history[0].success);
    }

    #[test]
    fn failure_is_terminal_and_recorded() {
        let mut job = Job::new(JobRecord::new("test", Vec::new(), 1));
        job.mark_running();
        job.mark_failed("boom".to_string(), Utc::now());

        assert!(job.status.is_terminal());
        assert_eq!(job.history[0].error.as_deref(), Some("boom"));
        assert!(!job.history[0].success);
    }

    #[test]
    fn rewrites_keep_the_other_fields() {
        let record = JobRecord::new("Old", vec![7], 4);

        let rerouted = record.clone().with_factory_key("New");
        assert_eq!(rerouted.factory_key, "New");
        assert_eq!(rerouted.payload, vec![7]);
        assert_eq!(rerouted.schema_version, 4);

        let repacked = record.with_payload(vec![8, 9]);
        assert_eq!(repacked.factory_key, "Old");
        assert_eq!(repacked.payload, vec![8, 9]);
    }

    #[test]
    fn snapshot_encodes_payload_as_base64() {
        let job = Job::new(JobRecord::new("k", vec![0xff, 0x00, 0x10], 2));
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["record"]["payload"], "/wAQ");

        let back: Job = serde_json::from_value(json).unwrap();
        assert_eq!(back.record, job.record);
        assert_eq!(back.id, job.id);
    }
}
