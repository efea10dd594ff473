//! `courier-protocol` — binary message definitions for queued message jobs.
//!
//! Two generations live here:
//!
//! - `legacy`: the content message persisted by the first message-processing
//!   job. Read-only; nothing in the workspace produces it outside tests.
//! - `envelope`: the envelope, envelope metadata and complete message written
//!   by the current message-processing job.
//!
//! Messages are declared with `prost` derives directly (no build script), so
//! field tags below are the wire contract.

pub mod envelope;
pub mod legacy;

pub use envelope::{CompleteMessage, Envelope, EnvelopeMetadata};
pub use legacy::{LegacyAddress, LegacyContent, LegacyMetadata};

pub use prost::{DecodeError, Message};
