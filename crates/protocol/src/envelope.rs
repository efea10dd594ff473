//! Current message envelope and the complete message built around it.

/// Transport envelope (proto2: scalars track presence).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Envelope {
    #[prost(uint64, optional, tag = "5")]
    pub timestamp: Option<u64>,
    #[prost(uint32, optional, tag = "7")]
    pub source_device: Option<u32>,
    #[prost(string, optional, tag = "9")]
    pub server_guid: Option<String>,
    #[prost(uint64, optional, tag = "10")]
    pub server_timestamp: Option<u64>,
    #[prost(string, optional, tag = "11")]
    pub source_service_id: Option<String>,
    #[prost(string, optional, tag = "13")]
    pub destination_service_id: Option<String>,
}

/// Sender/recipient facts established when the envelope was opened.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EnvelopeMetadata {
    #[prost(bytes = "vec", tag = "1")]
    pub source_service_id: Vec<u8>,
    #[prost(string, optional, tag = "2")]
    pub source_e164: Option<String>,
    #[prost(int32, tag = "3")]
    pub source_device_id: i32,
    #[prost(bool, tag = "4")]
    pub sealed_sender: bool,
    #[prost(bytes = "vec", optional, tag = "5")]
    pub group_id: Option<Vec<u8>>,
    #[prost(bytes = "vec", tag = "6")]
    pub destination_service_id: Vec<u8>,
}

/// Payload of the current message-processing job.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompleteMessage {
    /// Encoded [`Envelope`].
    #[prost(bytes = "vec", tag = "1")]
    pub envelope: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub content: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub metadata: Option<EnvelopeMetadata>,
    #[prost(int64, tag = "4")]
    pub server_delivered_timestamp: i64,
}

impl CompleteMessage {
    /// Decode the embedded envelope bytes.
    pub fn decode_envelope(&self) -> Result<Envelope, prost::DecodeError> {
        <Envelope as prost::Message>::decode(self.envelope.as_slice())
    }
}
