//! Job executor: routes claimed jobs to handlers by factory key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::sentinel::{ERROR_JOB_KEY, FAILING_JOB_KEY, error_job_handler, failing_job_handler};
use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobResult};

/// Job handler function type.
pub type JobHandler = Box<dyn Fn(&Job) -> JobResult + Send + Sync>;

/// Job executor configuration.
#[derive(Debug, Clone)]
pub struct JobExecutorConfig {
    /// How often to poll for new jobs
    pub poll_interval: Duration,
    /// Name for logging and the worker thread
    pub name: String,
}

impl Default for JobExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            name: "job-executor".to_string(),
        }
    }
}

impl JobExecutorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Handle to control a running executor.
#[derive(Debug)]
pub struct JobExecutorHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<ExecutorStats>>,
}

impl JobExecutorHandle {
    /// Request graceful shutdown and wait for the worker to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    /// Get current executor statistics.
    pub fn stats(&self) -> ExecutorStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

/// Executor runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ExecutorStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub uptime_secs: u64,
}

impl ExecutorStats {
    fn record(&mut self, outcome: &Result<(), String>) {
        self.jobs_processed += 1;
        match outcome {
            Ok(()) => self.jobs_succeeded += 1,
            Err(_) => self.jobs_failed += 1,
        }
    }
}

/// Job executor.
///
/// Claims jobs from a store, runs the handler registered for the job's
/// factory key, and records the outcome. The failing-job and error-job
/// sentinels are always registered, so records redirected during migration
/// always have somewhere to go.
pub struct JobExecutor<S: JobStore> {
    store: S,
    handlers: HashMap<String, JobHandler>,
}

impl<S: JobStore + 'static> JobExecutor<S> {
    /// Create a new executor with the given store.
    pub fn new(store: S) -> Self {
        let mut executor = Self {
            store,
            handlers: HashMap::new(),
        };
        executor.register_handler(FAILING_JOB_KEY, failing_job_handler);
        executor.register_handler(ERROR_JOB_KEY, error_job_handler);
        executor
    }

    /// Register (or replace) the handler for a factory key.
    pub fn register_handler<F>(&mut self, factory_key: impl Into<String>, handler: F)
    where
        F: Fn(&Job) -> JobResult + Send + Sync + 'static,
    {
        self.handlers.insert(factory_key.into(), Box::new(handler));
    }

    pub fn handles(&self, factory_key: &str) -> bool {
        self.handlers.contains_key(factory_key)
    }

    /// Run one claimed job and persist its outcome.
    pub fn execute_one(&self, job: &mut Job) -> Result<(), String> {
        let started = Utc::now();

        let Some(handler) = self.handlers.get(job.factory_key()) else {
            let error = format!("no handler for factory key: {}", job.factory_key());
            warn!(job_id = %job.id, factory_key = %job.factory_key(), "no handler for job");
            job.mark_failed(error.clone(), started);
            self.store.update(job).map_err(|e| e.to_string())?;
            return Err(error);
        };

        match handler(job) {
            JobResult::Success => {
                job.mark_completed(started);
                self.store.update(job).map_err(|e| e.to_string())?;
                debug!(job_id = %job.id, factory_key = %job.factory_key(), "job completed");
                Ok(())
            }
            JobResult::Failure(error) => {
                job.mark_failed(error.clone(), started);
                self.store.update(job).map_err(|e| e.to_string())?;
                debug!(job_id = %job.id, factory_key = %job.factory_key(), error = %error, "job failed");
                Err(error)
            }
        }
    }

    /// Claim and run jobs on the calling thread until none are pending.
    pub fn run_until_idle(&self) -> Result<ExecutorStats, JobStoreError> {
        let started = Instant::now();
        let mut stats = ExecutorStats::default();

        while let Some(mut job) = self.store.claim_next()? {
            let outcome = self.execute_one(&mut job);
            stats.record(&outcome);
        }

        stats.uptime_secs = started.elapsed().as_secs();
        Ok(stats)
    }

    /// Spawn the executor in a background thread.
    pub fn spawn(self, config: JobExecutorConfig) -> std::io::Result<JobExecutorHandle>
    where
        S: Send,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(ExecutorStats::default()));
        let stats_clone = stats.clone();

        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || executor_loop(self, config, shutdown_rx, stats_clone))?;

        Ok(JobExecutorHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        })
    }
}

fn executor_loop<S: JobStore + 'static>(
    executor: JobExecutor<S>,
    config: JobExecutorConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<ExecutorStats>>,
) {
    info!(executor = %config.name, "job executor started");
    let start_time = Instant::now();

    loop {
        match shutdown_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {}
        }

        match executor.store.claim_next() {
            Ok(Some(mut job)) => {
                debug!(
                    executor = %config.name,
                    job_id = %job.id,
                    factory_key = %job.factory_key(),
                    "claimed job"
                );
                let outcome = executor.execute_one(&mut job);
                if let Ok(mut s) = stats.lock() {
                    s.record(&outcome);
                    s.uptime_secs = start_time.elapsed().as_secs();
                }
            }
            Ok(None) => thread::sleep(config.poll_interval),
            Err(e) => {
                error!(executor = %config.name, error = %e, "failed to claim job");
                thread::sleep(config.poll_interval);
            }
        }
    }

    info!(executor = %config.name, "job executor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::store::InMemoryJobStore;
    use crate::jobs::types::{JobRecord, JobStatus};

    #[test]
    fn execute_successful_job() {
        let store = Arc::new(InMemoryJobStore::new());
        let mut executor = JobExecutor::new(store.clone());

        executor.register_handler("test", |_job| JobResult::Success);

        store.enqueue(JobRecord::new("test", Vec::new(), 0)).unwrap();

        let mut claimed = store.claim_next().unwrap().unwrap();
        let result = executor.execute_one(&mut claimed);

        assert!(result.is_ok());
        assert!(matches!(claimed.status, JobStatus::Completed));
        assert!(matches!(
            store.get(claimed.id).unwrap().unwrap().status,
            JobStatus::Completed
        ));
    }

    #[test]
    fn sentinels_are_registered_by_default() {
        let executor = JobExecutor::new(InMemoryJobStore::new());
        assert!(executor.handles(FAILING_JOB_KEY));
        assert!(executor.handles(ERROR_JOB_KEY));
    }

    #[test]
    fn failing_sentinel_fails_once_without_retry() {
        let store = Arc::new(InMemoryJobStore::new());
        let executor = JobExecutor::new(store.clone());

        let id = store
            .enqueue(JobRecord::new(FAILING_JOB_KEY, b"ignored".to_vec(), 0))
            .unwrap();

        let stats = executor.run_until_idle().unwrap();
        assert_eq!(stats.jobs_processed, 1);
        assert_eq!(stats.jobs_failed, 1);

        let job = store.get(id).unwrap().unwrap();
        assert!(matches!(job.status, JobStatus::Failed { .. }));
        assert_eq!(job.attempt, 1);
        assert!(store.claim_next().unwrap().is_none());
    }

    #[test]
    fn unknown_factory_key_fails_the_job() {
        let store = Arc::new(InMemoryJobStore::new());
        let executor = JobExecutor::new(store.clone());

        store.enqueue(JobRecord::new("Nobody", Vec::new(), 0)).unwrap();
        let mut claimed = store.claim_next().unwrap().unwrap();

        let err = executor.execute_one(&mut claimed).unwrap_err();
        assert!(err.contains("Nobody"));
        assert!(matches!(claimed.status, JobStatus::Failed { .. }));
    }

    #[test]
    fn spawned_executor_drains_and_shuts_down() {
        let store = Arc::new(InMemoryJobStore::new());
        let mut executor = JobExecutor::new(store.clone());
        executor.register_handler("test", |_job| JobResult::Success);

        for _ in 0..3 {
            store.enqueue(JobRecord::new("test", Vec::new(), 0)).unwrap();
        }

        let handle = executor
            .spawn(
                JobExecutorConfig::default()
                    .with_name("test-executor")
                    .with_poll_interval(Duration::from_millis(5)),
            )
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.stats().jobs_processed < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(handle.stats().jobs_succeeded, 3);
        handle.shutdown();
        assert_eq!(store.stats().unwrap().completed, 3);
    }
}
