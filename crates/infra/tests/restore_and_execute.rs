//! Load path end to end: persisted legacy jobs → restore (migrate) → execute.

use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use prost::Message;

use courier_core::ServiceId;
use courier_infra::jobs::{
    ERROR_JOB_KEY, FAILING_JOB_KEY, InMemoryJobStore, Job, JobData, JobExecutor, JobRecord,
    JobResult, JobStatus, JobStore, LEGACY_PUSH_PROCESS_KEY, PUSH_PROCESS_V2_KEY,
};
use courier_protocol::{CompleteMessage, LegacyAddress, LegacyContent, LegacyMetadata};

const SENDER: &str = "0f9e8d7c-6b5a-4938-a716-253443526170";
const RECIPIENT: &str = "PNI:11111111-2222-4333-8444-555555555555";

fn legacy_job(data: JobData) -> Job {
    Job::new(JobRecord::new(LEGACY_PUSH_PROCESS_KEY, data.serialize(), 5))
}

fn decrypted(sender: &str, group_id: Option<Vec<u8>>) -> JobData {
    let legacy = LegacyContent {
        local_address: None,
        metadata: Some(LegacyMetadata {
            address: Some(LegacyAddress {
                uuid: Some(sender.to_string()),
                e164: Some("+15555550199".to_string()),
            }),
            sender_device: Some(2),
            timestamp: Some(1_650_000_000_000),
            needs_receipt: Some(false),
            server_received_timestamp: Some(1_650_000_000_500),
            server_delivered_timestamp: Some(1_650_000_001_000),
            server_guid: Some("c0ffee".to_string()),
            group_id,
            destination_uuid: Some(RECIPIENT.to_string()),
        }),
        content: Some(b"opaque".to_vec()),
    };
    JobData::builder()
        .put_int("message_state", 0)
        .put_string("message_content", Some(STANDARD.encode(legacy.encode_to_vec())))
        .build()
}

fn persisted_queue() -> Vec<Job> {
    vec![
        legacy_job(decrypted(SENDER, Some(vec![7; 16]))),
        legacy_job(decrypted("garbled-sender", None)),
        legacy_job(JobData::builder().put_int("message_state", 7).build()),
        legacy_job(
            JobData::builder()
                .put_int("message_state", 8)
                .put_string("exception_sender", Some("+15555550100"))
                .put_int("exception_device", 1)
                .build(),
        ),
        Job::new(JobRecord::new("MultiDeviceReadUpdateJob", b"{}".to_vec(), 5)),
    ]
}

#[test]
fn corrupt_records_never_block_the_rest_of_the_queue() {
    courier_observability::init_with_filter("courier_infra=debug");

    // Persist and reload through the serialized snapshot form.
    let json = serde_json::to_string(&persisted_queue()).unwrap();
    let reloaded: Vec<Job> = serde_json::from_str(&json).unwrap();

    let store = Arc::new(InMemoryJobStore::new());
    let report = store.restore(reloaded).unwrap();
    assert_eq!(report.restored, 5);
    assert_eq!(report.migrated, 5);
    assert_eq!(report.redirected_to_failing, 2);
    assert_eq!(report.redirected_to_error, 1);

    let received: Arc<Mutex<Vec<CompleteMessage>>> = Arc::default();
    let sink = received.clone();

    let mut executor = JobExecutor::new(store.clone());
    executor.register_handler(PUSH_PROCESS_V2_KEY, move |job| {
        match CompleteMessage::decode(job.payload()) {
            Ok(message) => {
                sink.lock().unwrap().push(message);
                JobResult::Success
            }
            Err(e) => JobResult::Failure(e.to_string()),
        }
    });
    executor.register_handler("MultiDeviceReadUpdateJob", |_job| JobResult::Success);

    let stats = executor.run_until_idle().unwrap();
    assert_eq!(stats.jobs_processed, 5);
    assert_eq!(stats.jobs_succeeded, 3);
    assert_eq!(stats.jobs_failed, 2);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let message = &received[0];
    let envelope = message.decode_envelope().unwrap();
    assert_eq!(envelope.source_service_id.as_deref(), Some(SENDER));
    assert_eq!(envelope.destination_service_id.as_deref(), Some(RECIPIENT));

    let metadata = message.metadata.as_ref().unwrap();
    let recipient: ServiceId = RECIPIENT.parse().unwrap();
    assert_eq!(metadata.destination_service_id, recipient.to_bytes());
    assert_eq!(metadata.group_id, Some(vec![7; 16]));
    assert_eq!(metadata.source_e164.as_deref(), Some("+15555550199"));
    assert!(!metadata.sealed_sender);

    for job in store.list_by_factory_key(FAILING_JOB_KEY, 10).unwrap() {
        assert!(matches!(job.status, JobStatus::Failed { .. }));
        assert_eq!(job.attempt, 1);
    }
    for job in store.list_by_factory_key(ERROR_JOB_KEY, 10).unwrap() {
        assert!(matches!(job.status, JobStatus::Completed));
    }
}

#[test]
fn restarting_after_migration_changes_nothing() {
    let first = InMemoryJobStore::new();
    first.restore(persisted_queue()).unwrap();
    let migrated = first.snapshot().unwrap();

    let second = InMemoryJobStore::new();
    let report = second.restore(migrated.clone()).unwrap();
    assert_eq!(report.migrated, 0);

    let records: Vec<_> = second.snapshot().unwrap().into_iter().map(|j| j.record).collect();
    let expected: Vec<_> = migrated.into_iter().map(|j| j.record).collect();
    assert_eq!(records, expected);
}
