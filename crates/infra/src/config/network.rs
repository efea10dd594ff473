//! Network configuration consumed by the service clients.
//!
//! A plain immutable bag: endpoints per service, socket/proxy/DNS overrides
//! and the two server public-parameter blobs. Nothing in the job queue reads
//! it; it is loaded once at startup and handed to the networking layer.

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use courier_core::ValueObject;

use super::ConfigError;

/// One endpoint of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUrl {
    pub url: String,
    /// Host header to send when `url` points at a fronting domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_header: Option<String>,
}

impl ServiceUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            host_header: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketOptions {
    pub connect_timeout_ms: Option<u64>,
    pub keep_alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
}

/// Endpoints and key material needed to reach the messaging service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfiguration {
    service_urls: Vec<ServiceUrl>,
    /// CDN endpoints keyed by CDN number
    #[serde(default)]
    cdn_urls: BTreeMap<u32, Vec<ServiceUrl>>,
    #[serde(default)]
    key_backup_urls: Vec<ServiceUrl>,
    #[serde(default)]
    storage_urls: Vec<ServiceUrl>,
    #[serde(default)]
    cdsi_urls: Vec<ServiceUrl>,
    #[serde(default)]
    svr2_urls: Vec<ServiceUrl>,
    /// Names of interceptors installed on every HTTP client
    #[serde(default)]
    network_interceptors: Vec<String>,
    #[serde(default)]
    socket: SocketOptions,
    #[serde(default)]
    proxy: Option<ProxyConfig>,
    /// Static host → address overrides
    #[serde(default)]
    dns_overrides: BTreeMap<String, Vec<IpAddr>>,
    #[serde(with = "crate::codec::base64_bytes")]
    zk_group_server_public_params: Vec<u8>,
    #[serde(with = "crate::codec::base64_bytes")]
    generic_server_public_params: Vec<u8>,
}

impl ValueObject for NetworkConfiguration {}

impl NetworkConfiguration {
    pub fn new(
        service_urls: Vec<ServiceUrl>,
        zk_group_server_public_params: Vec<u8>,
        generic_server_public_params: Vec<u8>,
    ) -> Self {
        Self {
            service_urls,
            cdn_urls: BTreeMap::new(),
            key_backup_urls: Vec::new(),
            storage_urls: Vec::new(),
            cdsi_urls: Vec::new(),
            svr2_urls: Vec::new(),
            network_interceptors: Vec::new(),
            socket: SocketOptions::default(),
            proxy: None,
            dns_overrides: BTreeMap::new(),
            zk_group_server_public_params,
            generic_server_public_params,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Every URL must be http(s) and the main service needs an endpoint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_urls.is_empty() {
            return Err(ConfigError::Invalid("no service urls".to_string()));
        }
        let all = self
            .service_urls
            .iter()
            .chain(self.cdn_urls.values().flatten())
            .chain(&self.key_backup_urls)
            .chain(&self.storage_urls)
            .chain(&self.cdsi_urls)
            .chain(&self.svr2_urls);
        for endpoint in all {
            if !(endpoint.url.starts_with("https://") || endpoint.url.starts_with("http://")) {
                return Err(ConfigError::Invalid(format!(
                    "unsupported url scheme: {}",
                    endpoint.url
                )));
            }
        }
        Ok(())
    }

    pub fn with_cdn(mut self, cdn: u32, urls: Vec<ServiceUrl>) -> Self {
        self.cdn_urls.insert(cdn, urls);
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn service_urls(&self) -> &[ServiceUrl] {
        &self.service_urls
    }

    /// Endpoints of one CDN; empty if the CDN is not configured.
    pub fn cdn_urls(&self, cdn: u32) -> &[ServiceUrl] {
        self.cdn_urls.get(&cdn).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn key_backup_urls(&self) -> &[ServiceUrl] {
        &self.key_backup_urls
    }

    pub fn storage_urls(&self) -> &[ServiceUrl] {
        &self.storage_urls
    }

    pub fn cdsi_urls(&self) -> &[ServiceUrl] {
        &self.cdsi_urls
    }

    pub fn svr2_urls(&self) -> &[ServiceUrl] {
        &self.svr2_urls
    }

    pub fn network_interceptors(&self) -> &[String] {
        &self.network_interceptors
    }

    pub fn socket(&self) -> &SocketOptions {
        &self.socket
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }

    pub fn dns_overrides(&self) -> &BTreeMap<String, Vec<IpAddr>> {
        &self.dns_overrides
    }

    pub fn zk_group_server_public_params(&self) -> &[u8] {
        &self.zk_group_server_public_params
    }

    pub fn generic_server_public_params(&self) -> &[u8] {
        &self.generic_server_public_params
    }
}
