//! Legacy content message (proto2 semantics: every scalar tracks presence).

/// Address of a peer as the legacy job stored it.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LegacyAddress {
    /// Service identifier in string form (bare UUID or `PNI:<uuid>`).
    #[prost(string, optional, tag = "1")]
    pub uuid: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub e164: Option<String>,
}

/// Delivery metadata captured at decryption time.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LegacyMetadata {
    #[prost(message, optional, tag = "1")]
    pub address: Option<LegacyAddress>,
    #[prost(int32, optional, tag = "2")]
    pub sender_device: Option<i32>,
    #[prost(int64, optional, tag = "3")]
    pub timestamp: Option<i64>,
    #[prost(bool, optional, tag = "4")]
    pub needs_receipt: Option<bool>,
    #[prost(int64, optional, tag = "5")]
    pub server_received_timestamp: Option<i64>,
    #[prost(int64, optional, tag = "6")]
    pub server_delivered_timestamp: Option<i64>,
    #[prost(string, optional, tag = "7")]
    pub server_guid: Option<String>,
    #[prost(bytes = "vec", optional, tag = "8")]
    pub group_id: Option<Vec<u8>>,
    #[prost(string, optional, tag = "9")]
    pub destination_uuid: Option<String>,
}

/// Decrypted message as stored by the first message-processing job.
///
/// Tag 3 (a pre-`Content` data message) is never read and is skipped as an
/// unknown field on decode.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LegacyContent {
    #[prost(message, optional, tag = "1")]
    pub local_address: Option<LegacyAddress>,
    #[prost(message, optional, tag = "2")]
    pub metadata: Option<LegacyMetadata>,
    /// Serialized `Content`, kept opaque.
    #[prost(bytes = "vec", optional, tag = "4")]
    pub content: Option<Vec<u8>>,
}
