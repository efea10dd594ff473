//! Well-known factory keys and the terminal handlers behind the sentinel ones.
//!
//! Migrations redirect records they cannot (or should not) carry forward to
//! one of two sentinels:
//!
//! - [`FAILING_JOB_KEY`]: does no work and fails deterministically. Used for
//!   obsolete or unmigratable records.
//! - [`ERROR_JOB_KEY`]: reports a message that failed to decrypt or process
//!   under the legacy job, using whatever error detail its payload kept.
//!
//! Both handlers are registered by every [`JobExecutor`](super::JobExecutor).

use tracing::{info, warn};

use super::data::{JobData, JobDataError};
use super::types::{Job, JobResult};
use crate::migrations::MessageState;

pub const FAILING_JOB_KEY: &str = "FailingJob";
pub const ERROR_JOB_KEY: &str = "PushProcessMessageErrorJob";

/// Message-processing job written before the complete-message format.
pub const LEGACY_PUSH_PROCESS_KEY: &str = "PushProcessJob";
/// Message-processing job whose payload is an encoded `CompleteMessage`.
pub const PUSH_PROCESS_V2_KEY: &str = "PushProcessMessageJobV2";

pub(crate) const KEY_MESSAGE_STATE: &str = "message_state";
pub(crate) const KEY_MESSAGE_CONTENT: &str = "message_content";
const KEY_EXCEPTION_SENDER: &str = "exception_sender";
const KEY_EXCEPTION_DEVICE: &str = "exception_device";
const KEY_EXCEPTION_GROUP_ID: &str = "exception_groupId";
const KEY_TIMESTAMP: &str = "timestamp";

/// Handler for [`FAILING_JOB_KEY`].
pub fn failing_job_handler(job: &Job) -> JobResult {
    warn!(job_id = %job.id, "running failing job; payload ignored");
    JobResult::Failure("obsolete job".to_string())
}

/// Error detail recovered from a legacy message-processing payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyProcessingError {
    pub state: MessageState,
    pub sender: Option<String>,
    pub device: Option<i32>,
    pub group_id: Option<String>,
    pub timestamp: Option<i64>,
}

impl LegacyProcessingError {
    /// Read error detail from a legacy payload. Only the state is required.
    pub fn from_payload(payload: &[u8]) -> Result<Self, JobDataError> {
        let data = JobData::deserialize(payload)?;
        let state = MessageState::from_index(data.get_int(KEY_MESSAGE_STATE)?);

        Ok(Self {
            state,
            sender: data.get_string_or_none(KEY_EXCEPTION_SENDER).map(str::to_string),
            device: data.get_int(KEY_EXCEPTION_DEVICE).ok(),
            group_id: data
                .get_string_or_none(KEY_EXCEPTION_GROUP_ID)
                .map(str::to_string),
            timestamp: data.get_long(KEY_TIMESTAMP).ok(),
        })
    }
}

/// Handler for [`ERROR_JOB_KEY`].
///
/// A payload that no longer decodes fails the job instead of panicking.
pub fn error_job_handler(job: &Job) -> JobResult {
    let report = match LegacyProcessingError::from_payload(job.payload()) {
        Ok(report) => report,
        Err(e) => {
            warn!(job_id = %job.id, error = %e, "unreadable legacy error payload");
            return JobResult::Failure(format!("unreadable legacy error payload: {e}"));
        }
    };

    if !report.state.is_error() {
        warn!(job_id = %job.id, state = ?report.state, "legacy error job without an error state");
        return JobResult::Failure(format!("not an error state: {:?}", report.state));
    }

    info!(
        job_id = %job.id,
        state = ?report.state,
        sender = report.sender.as_deref().unwrap_or("unknown"),
        device = report.device.unwrap_or_default(),
        in_group = report.group_id.is_some(),
        timestamp = report.timestamp.unwrap_or_default(),
        "recorded legacy message processing error"
    );
    JobResult::Success
}
