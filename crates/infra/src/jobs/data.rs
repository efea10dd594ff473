//! Key-value job parameters.
//!
//! Jobs that carry a handful of typed parameters store them as a JSON object
//! of per-type maps:
//!
//! ```json
//! {"strings":{"message_content":"..."},"integers":{"message_state":0}}
//! ```
//!
//! A reader must ask for a key with the type it was written with; asking
//! `get_int` for a key only present in `strings` is a missing key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key-value job data error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobDataError {
    #[error("job data is not valid: {0}")]
    Malformed(String),
    #[error("missing {kind} key: {key}")]
    MissingKey { kind: &'static str, key: String },
}

/// Typed key-value parameters of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobData {
    strings: BTreeMap<String, Option<String>>,
    integers: BTreeMap<String, i32>,
    longs: BTreeMap<String, i64>,
    booleans: BTreeMap<String, bool>,
    doubles: BTreeMap<String, f64>,
}

impl JobData {
    pub fn builder() -> JobDataBuilder {
        JobDataBuilder::default()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, JobDataError> {
        serde_json::from_slice(bytes).map_err(|e| JobDataError::Malformed(e.to_string()))
    }

    pub fn serialize(&self) -> Vec<u8> {
        // Maps of strings and numbers cannot fail to serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn has_string(&self, key: &str) -> bool {
        self.strings.contains_key(key)
    }

    /// A string key that was written explicitly as null reads as `None`.
    pub fn get_string_or_none(&self, key: &str) -> Option<&str> {
        self.strings.get(key).and_then(|v| v.as_deref())
    }

    pub fn get_string(&self, key: &str) -> Result<&str, JobDataError> {
        self.get_string_or_none(key)
            .ok_or_else(|| missing("string", key))
    }

    pub fn has_int(&self, key: &str) -> bool {
        self.integers.contains_key(key)
    }

    pub fn get_int(&self, key: &str) -> Result<i32, JobDataError> {
        self.integers.get(key).copied().ok_or_else(|| missing("int", key))
    }

    pub fn has_long(&self, key: &str) -> bool {
        self.longs.contains_key(key)
    }

    pub fn get_long(&self, key: &str) -> Result<i64, JobDataError> {
        self.longs.get(key).copied().ok_or_else(|| missing("long", key))
    }

    pub fn get_boolean(&self, key: &str) -> Result<bool, JobDataError> {
        self.booleans
            .get(key)
            .copied()
            .ok_or_else(|| missing("boolean", key))
    }

    pub fn get_double(&self, key: &str) -> Result<f64, JobDataError> {
        self.doubles
            .get(key)
            .copied()
            .ok_or_else(|| missing("double", key))
    }
}

fn missing(kind: &'static str, key: &str) -> JobDataError {
    JobDataError::MissingKey {
        kind,
        key: key.to_string(),
    }
}

/// Builder for [`JobData`].
#[derive(Debug, Default)]
pub struct JobDataBuilder {
    data: JobData,
}

impl JobDataBuilder {
    pub fn put_string(mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.data.strings.insert(key.into(), value.map(Into::into));
        self
    }

    pub fn put_int(mut self, key: impl Into<String>, value: i32) -> Self {
        self.data.integers.insert(key.into(), value);
        self
    }

    pub fn put_long(mut self, key: impl Into<String>, value: i64) -> Self {
        self.data.longs.insert(key.into(), value);
        self
    }

    pub fn put_boolean(mut self, key: impl Into<String>, value: bool) -> Self {
        self.data.booleans.insert(key.into(), value);
        self
    }

    pub fn put_double(mut self, key: impl Into<String>, value: f64) -> Self {
        self.data.doubles.insert(key.into(), value);
        self
    }

    pub fn build(self) -> JobData {
        self.data
    }
}
