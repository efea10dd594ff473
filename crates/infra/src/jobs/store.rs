//! Job storage implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{info, warn};

use super::sentinel::{ERROR_JOB_KEY, FAILING_JOB_KEY};
use super::types::{Job, JobId, JobRecord, JobStatus};
use crate::migrations::MigrationChain;

/// Job store abstraction.
pub trait JobStore: Send + Sync {
    /// Enqueue a new record, stamped with the current schema version.
    fn enqueue(&self, record: JobRecord) -> Result<JobId, JobStoreError>;

    /// Load previously persisted jobs.
    ///
    /// Every record is brought up to the current schema before it becomes
    /// claimable. Jobs persisted while running are requeued.
    fn restore(&self, jobs: Vec<Job>) -> Result<RestoreReport, JobStoreError>;

    /// Get a job by ID.
    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError>;

    /// Update a job.
    fn update(&self, job: &Job) -> Result<(), JobStoreError>;

    /// Claim the oldest pending job, marking it running.
    /// Returns None if no jobs are available.
    fn claim_next(&self) -> Result<Option<Job>, JobStoreError>;

    /// List jobs routed to a factory key, oldest first.
    fn list_by_factory_key(&self, factory_key: &str, limit: usize)
    -> Result<Vec<Job>, JobStoreError>;

    /// Every job, oldest first, for persisting.
    fn snapshot(&self) -> Result<Vec<Job>, JobStoreError>;

    /// Get job statistics.
    fn stats(&self) -> Result<JobStats, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Job statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct JobStats {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// What happened to the records handed to [`JobStore::restore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RestoreReport {
    /// Jobs now held by the store
    pub restored: usize,
    /// Jobs that went through at least one migration
    pub migrated: usize,
    /// Jobs rewritten to the failing-job sentinel during migration
    pub redirected_to_failing: usize,
    /// Jobs rewritten to the error-job sentinel during migration
    pub redirected_to_error: usize,
    /// Jobs persisted mid-run, put back to pending
    pub requeued: usize,
    /// Jobs skipped because their id was already present
    pub duplicates: usize,
}

/// In-memory job store for tests/dev.
#[derive(Debug)]
pub struct InMemoryJobStore {
    chain: MigrationChain,
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    /// Store migrating with every shipped migration.
    pub fn new() -> Self {
        Self::with_chain(MigrationChain::standard())
    }

    pub fn with_chain(chain: MigrationChain) -> Self {
        Self {
            chain,
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn chain(&self) -> &MigrationChain {
        &self.chain
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<JobId, Job>>, JobStoreError> {
        self.jobs
            .read()
            .map_err(|_| JobStoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<JobId, Job>>, JobStoreError> {
        self.jobs
            .write()
            .map_err(|_| JobStoreError::Storage("lock poisoned".to_string()))
    }

    fn sorted(jobs: impl Iterator<Item = Job>) -> Vec<Job> {
        let mut out: Vec<_> = jobs.collect();
        out.sort_by_key(|j| (j.created_at, j.id));
        out
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore for InMemoryJobStore {
    fn enqueue(&self, mut record: JobRecord) -> Result<JobId, JobStoreError> {
        record.schema_version = self.chain.current_version();
        let job = Job::new(record);
        let id = job.id;

        let mut jobs = self.write()?;
        if jobs.contains_key(&id) {
            return Err(JobStoreError::AlreadyExists(id));
        }
        jobs.insert(id, job);
        Ok(id)
    }

    fn restore(&self, persisted: Vec<Job>) -> Result<RestoreReport, JobStoreError> {
        let mut report = RestoreReport::default();
        let mut jobs = self.write()?;

        for mut job in persisted {
            if jobs.contains_key(&job.id) {
                warn!(job_id = %job.id, "skipping duplicate job on restore");
                report.duplicates += 1;
                continue;
            }

            if self.chain.needs_migration(&job.record) {
                let before = job.record.factory_key.clone();
                job.record = self.chain.apply(job.record);
                report.migrated += 1;

                if before != job.record.factory_key {
                    match job.record.factory_key.as_str() {
                        FAILING_JOB_KEY => report.redirected_to_failing += 1,
                        ERROR_JOB_KEY => report.redirected_to_error += 1,
                        _ => {}
                    }
                }
            }

            if job.status == JobStatus::Running {
                job.status = JobStatus::Pending;
                job.updated_at = Utc::now();
                report.requeued += 1;
            }

            jobs.insert(job.id, job);
            report.restored += 1;
        }

        info!(
            restored = report.restored,
            migrated = report.migrated,
            redirected_to_failing = report.redirected_to_failing,
            redirected_to_error = report.redirected_to_error,
            requeued = report.requeued,
            "restored persisted jobs"
        );
        Ok(report)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        Ok(self.read()?.get(&job_id).cloned())
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        let mut jobs = self.write()?;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(JobStoreError::NotFound(job.id)),
        }
    }

    fn claim_next(&self) -> Result<Option<Job>, JobStoreError> {
        let mut jobs = self.write()?;

        // Oldest pending job first
        let next = jobs
            .values()
            .filter(|j| j.status == JobStatus::Pending)
            .min_by_key(|j| (j.created_at, j.id))
            .map(|j| j.id);

        Ok(next.and_then(|id| {
            jobs.get_mut(&id).map(|job| {
                job.mark_running();
                job.clone()
            })
        }))
    }

    fn list_by_factory_key(
        &self,
        factory_key: &str,
        limit: usize,
    ) -> Result<Vec<Job>, JobStoreError> {
        let jobs = self.read()?;
        let mut result = Self::sorted(
            jobs.values()
                .filter(|j| j.record.factory_key == factory_key)
                .cloned(),
        );
        result.truncate(limit);
        Ok(result)
    }

    fn snapshot(&self) -> Result<Vec<Job>, JobStoreError> {
        Ok(Self::sorted(self.read()?.values().cloned()))
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        let jobs = self.read()?;
        let mut stats = JobStats::default();

        for job in jobs.values() {
            match &job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed { .. } => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
        }

        Ok(stats)
    }
}

impl JobStore for Arc<InMemoryJobStore> {
    fn enqueue(&self, record: JobRecord) -> Result<JobId, JobStoreError> {
        (**self).enqueue(record)
    }

    fn restore(&self, jobs: Vec<Job>) -> Result<RestoreReport, JobStoreError> {
        (**self).restore(jobs)
    }

    fn get(&self, job_id: JobId) -> Result<Option<Job>, JobStoreError> {
        (**self).get(job_id)
    }

    fn update(&self, job: &Job) -> Result<(), JobStoreError> {
        (**self).update(job)
    }

    fn claim_next(&self) -> Result<Option<Job>, JobStoreError> {
        (**self).claim_next()
    }

    fn list_by_factory_key(
        &self,
        factory_key: &str,
        limit: usize,
    ) -> Result<Vec<Job>, JobStoreError> {
        (**self).list_by_factory_key(factory_key, limit)
    }

    fn snapshot(&self) -> Result<Vec<Job>, JobStoreError> {
        (**self).snapshot()
    }

    fn stats(&self) -> Result<JobStats, JobStoreError> {
        (**self).stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::data::JobData;
    use crate::jobs::sentinel::{KEY_MESSAGE_STATE, LEGACY_PUSH_PROCESS_KEY};

    fn legacy_job(state: Option<i32>) -> Job {
        let mut data = JobData::builder();
        if let Some(state) = state {
            data = data.put_int(KEY_MESSAGE_STATE, state);
        }
        Job::new(JobRecord::new(
            LEGACY_PUSH_PROCESS_KEY,
            data.build().serialize(),
            9,
        ))
    }

    #[test]
    fn enqueue_and_claim() {
        let store = InMemoryJobStore::new();

        let job_id = store.enqueue(JobRecord::new("test", Vec::new(), 0)).unwrap();

        let claimed = store.claim_next().unwrap().unwrap();
        assert_eq!(claimed.id, job_id);
        assert!(matches!(claimed.status, JobStatus::Running));
        assert_eq!(claimed.attempt, 1);
        assert_eq!(claimed.record.schema_version, store.chain().current_version());

        // No more jobs
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn restore_migrates_before_jobs_are_claimable() {
        let store = InMemoryJobStore::new();

        let report = store
            .restore(vec![
                legacy_job(None),
                legacy_job(Some(7)),
                legacy_job(Some(2)),
                Job::new(JobRecord::new("Untouched", vec![1], 9)),
            ])
            .unwrap();

        assert_eq!(
            report,
            RestoreReport {
                restored: 4,
                migrated: 4,
                redirected_to_failing: 2,
                redirected_to_error: 1,
                requeued: 0,
                duplicates: 0,
            }
        );

        let current = store.chain().current_version();
        for job in store.snapshot().unwrap() {
            assert_eq!(job.record.schema_version, current);
            assert_ne!(job.record.factory_key, LEGACY_PUSH_PROCESS_KEY);
        }
        assert_eq!(store.list_by_factory_key(FAILING_JOB_KEY, 10).unwrap().len(), 2);
        assert_eq!(store.list_by_factory_key(ERROR_JOB_KEY, 10).unwrap().len(), 1);
    }

    #[test]
    fn restoring_current_records_is_a_no_op() {
        let first = InMemoryJobStore::new();
        first.restore(vec![legacy_job(Some(7))]).unwrap();
        let snapshot = first.snapshot().unwrap();

        let second = InMemoryJobStore::new();
        let report = second.restore(snapshot.clone()).unwrap();

        assert_eq!(report.migrated, 0);
        assert_eq!(second.snapshot().unwrap()[0].record, snapshot[0].record);
    }

    #[test]
    fn running_jobs_are_requeued_and_duplicates_skipped() {
        let store = InMemoryJobStore::new();
        let mut job = Job::new(JobRecord::new("test", Vec::new(), 10));
        job.mark_running();

        let report = store.restore(vec![job.clone(), job.clone()]).unwrap();
        assert_eq!(report.requeued, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.restored, 1);
        assert!(matches!(
            store.get(job.id).unwrap().unwrap().status,
            JobStatus::Pending
        ));
    }

    #[test]
    fn update_unknown_job_is_not_found() {
        let store = InMemoryJobStore::new();
        let job = Job::new(JobRecord::new("test", Vec::new(), 10));
        assert!(matches!(store.update(&job), Err(JobStoreError::NotFound(_))));
    }

    #[test]
    fn stats_tracking() {
        let store = InMemoryJobStore::new();

        for i in 0..5u8 {
            store.enqueue(JobRecord::new("test", vec![i], 0)).unwrap();
        }

        let stats = store.stats().unwrap();
        assert_eq!(stats.pending, 5);

        store.claim_next().unwrap();
        store.claim_next().unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.running, 2);
    }
}
