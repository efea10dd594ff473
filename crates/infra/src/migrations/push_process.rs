//! Legacy message-processing jobs → complete-message jobs.
//!
//! The legacy job stored its parameters as key-value job data: an integer
//! `message_state` and, for successfully decrypted messages, a base64
//! `message_content` holding a [`LegacyContent`]. The current job stores an
//! encoded [`CompleteMessage`] directly as its payload.
//!
//! | legacy state        | result                                        |
//! |---------------------|-----------------------------------------------|
//! | absent / unreadable | failing job, payload untouched                |
//! | `Noop`              | failing job                                   |
//! | `DecryptedOk`       | current job; failing job if content is broken |
//! | error states        | error job, payload untouched                  |
//! | unknown index       | failing job                                   |

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use prost::Message;
use tracing::{info, warn};

use courier_core::ServiceId;
use courier_protocol::{CompleteMessage, Envelope, EnvelopeMetadata, LegacyContent};

use super::{JobMigration, MigrationError};
use crate::jobs::data::JobData;
use crate::jobs::sentinel::{
    ERROR_JOB_KEY, FAILING_JOB_KEY, KEY_MESSAGE_CONTENT, KEY_MESSAGE_STATE,
    LEGACY_PUSH_PROCESS_KEY, PUSH_PROCESS_V2_KEY,
};
use crate::jobs::types::JobRecord;

pub const TARGET_VERSION: u32 = 10;

pub const MIGRATION: JobMigration =
    JobMigration::new(TARGET_VERSION, "push_process_complete_message", migrate);

/// Legacy content was written padded, but older clients stripped padding.
const LEGACY_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Outcome the legacy job recorded for a received message.
///
/// Persisted as the variant's index; indexes outside the known range map to
/// `Unrecognized` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    DecryptedOk,
    InvalidVersion,
    CorruptMessage,
    NoSession,
    LegacyMessage,
    DuplicateMessage,
    UnsupportedDataMessage,
    Noop,
    DecryptionError,
    Unrecognized(i32),
}

impl MessageState {
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Self::DecryptedOk,
            1 => Self::InvalidVersion,
            2 => Self::CorruptMessage,
            3 => Self::NoSession,
            4 => Self::LegacyMessage,
            5 => Self::DuplicateMessage,
            6 => Self::UnsupportedDataMessage,
            7 => Self::Noop,
            8 => Self::DecryptionError,
            other => Self::Unrecognized(other),
        }
    }

    /// States that describe a failed decrypt or an unprocessable message.
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Self::DecryptedOk | Self::Noop | Self::Unrecognized(_)
        )
    }
}

/// Transform registered at [`TARGET_VERSION`].
pub fn migrate(record: JobRecord) -> JobRecord {
    if record.factory_key != LEGACY_PUSH_PROCESS_KEY {
        return record;
    }

    let data = match JobData::deserialize(&record.payload) {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, "unreadable legacy process job data");
            return record.with_factory_key(FAILING_JOB_KEY);
        }
    };

    let Ok(index) = data.get_int(KEY_MESSAGE_STATE) else {
        return record.with_factory_key(FAILING_JOB_KEY);
    };

    match MessageState::from_index(index) {
        MessageState::Noop => record.with_factory_key(FAILING_JOB_KEY),
        MessageState::DecryptedOk => match migrate_decrypted(&data) {
            Ok(message) => {
                info!("migrated legacy process job to complete message");
                record
                    .with_factory_key(PUSH_PROCESS_V2_KEY)
                    .with_payload(message.encode_to_vec())
            }
            Err(e) => {
                warn!(error = %e, "unable to migrate successful process job");
                record.with_factory_key(FAILING_JOB_KEY)
            }
        },
        MessageState::Unrecognized(index) => {
            warn!(index, "unknown legacy message state");
            record.with_factory_key(FAILING_JOB_KEY)
        }
        state => {
            info!(?state, "migrating legacy process error job");
            record.with_factory_key(ERROR_JOB_KEY)
        }
    }
}

/// Rebuild a decrypted legacy message as a [`CompleteMessage`].
pub fn migrate_decrypted(data: &JobData) -> Result<CompleteMessage, MigrationError> {
    let raw = LEGACY_BASE64.decode(data.get_string(KEY_MESSAGE_CONTENT)?)?;
    let legacy = LegacyContent::decode(raw.as_slice())?;

    let metadata = legacy
        .metadata
        .ok_or(MigrationError::MissingField("metadata"))?;
    let address = metadata
        .address
        .ok_or(MigrationError::MissingField("sender address"))?;
    let content = legacy
        .content
        .ok_or(MigrationError::MissingField("content"))?;

    let source: ServiceId = address
        .uuid
        .as_deref()
        .ok_or(MigrationError::MissingField("sender service id"))?
        .parse()?;
    let destination: ServiceId = metadata
        .destination_uuid
        .as_deref()
        .ok_or(MigrationError::MissingField("destination service id"))?
        .parse()?;

    let device = metadata.sender_device.unwrap_or_default();

    let envelope = Envelope {
        source_service_id: Some(source.to_string()),
        source_device: Some(non_negative("sender device", device.into())? as u32),
        destination_service_id: Some(destination.to_string()),
        timestamp: Some(non_negative(
            "timestamp",
            metadata.timestamp.unwrap_or_default(),
        )?),
        server_guid: metadata.server_guid,
        server_timestamp: Some(non_negative(
            "server received timestamp",
            metadata.server_received_timestamp.unwrap_or_default(),
        )?),
    };

    let envelope_metadata = EnvelopeMetadata {
        source_service_id: source.to_bytes(),
        source_e164: address.e164,
        source_device_id: device,
        sealed_sender: metadata.needs_receipt.unwrap_or_default(),
        group_id: metadata.group_id,
        destination_service_id: destination.to_bytes(),
    };

    Ok(CompleteMessage {
        envelope: envelope.encode_to_vec(),
        content,
        metadata: Some(envelope_metadata),
        server_delivered_timestamp: metadata.server_delivered_timestamp.unwrap_or_default(),
    })
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, MigrationError> {
    u64::try_from(value).map_err(|_| MigrationError::OutOfRange { field, value })
}
