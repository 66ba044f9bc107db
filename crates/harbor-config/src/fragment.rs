//! Sparse configuration fragments.
//!
//! A [`ConfigFragment`] is what one layer (the embedded defaults, one
//! configuration document, or the command line) has to say about the
//! agent's configuration. Scalars are `Option<T>`: `None` means the layer
//! never mentioned the field, `Some(v)` means it was set to `v` even when
//! `v` is `false`, `0` or `""`. Lists and maps carry no presence bit; an
//! empty collection means the layer contributed nothing.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::decode::{DocumentFormat, parse_file_at};
use crate::error::ConfigResult;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

// ---------------------------------------------------------------------------
// ConfigFragment
// ---------------------------------------------------------------------------

/// One layer's sparse view of the agent configuration.
///
/// `ConfigFragment::default()` is the all-absent fragment and is the
/// identity element of [`merge`](crate::merge::merge).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigFragment {
    /// Address advertised to LAN peers.
    #[serde(rename = "advertise_addr")]
    pub advertise_addr_lan: Option<String>,
    /// Address advertised to WAN peers.
    pub advertise_addr_wan: Option<String>,
    /// Bind address for cluster communication.
    pub bind_addr: Option<String>,
    /// Server bootstrap mode.
    pub bootstrap: Option<bool>,
    /// Number of servers to wait for before bootstrapping.
    pub bootstrap_expect: Option<i64>,
    /// Update check interval as a duration string, parsed at resolution.
    pub check_update_interval: Option<String>,
    /// Address to bind client interfaces to.
    pub client_addr: Option<String>,
    /// Agent state directory.
    pub data_dir: Option<String>,
    /// Datacenter name.
    pub datacenter: Option<String>,
    /// Development mode.
    pub dev_mode: Option<bool>,
    /// Generate a random node ID instead of a host-derived one.
    pub disable_host_node_id: Option<bool>,
    /// Do not back up the gossip keyring to a file.
    pub disable_keyring_file: Option<bool>,
    /// DNS domain served by the agent.
    #[serde(rename = "domain")]
    pub dns_domain: Option<String>,
    /// Upstream DNS servers.
    #[serde(rename = "recursors")]
    pub dns_recursors: Vec<String>,
    /// Allow script health checks.
    pub enable_script_checks: Option<bool>,
    /// Log to syslog.
    pub enable_syslog: Option<bool>,
    /// Serve the built-in web UI.
    #[serde(rename = "ui")]
    pub enable_ui: Option<bool>,
    /// Gossip encryption key.
    #[serde(rename = "encrypt")]
    pub encrypt_key: Option<String>,
    /// LAN addresses to join at start.
    #[serde(rename = "start_join")]
    pub join_addrs_lan: Vec<String>,
    /// WAN addresses to join at start.
    #[serde(rename = "start_join_wan")]
    pub join_addrs_wan: Vec<String>,
    /// Log level.
    pub log_level: Option<String>,
    /// Node identifier.
    pub node_id: Option<String>,
    /// Arbitrary node metadata.
    pub node_meta: BTreeMap<String, String>,
    /// Node name.
    pub node_name: Option<String>,
    /// Server that receives replication but does not vote.
    pub non_voting_server: Option<bool>,
    /// PID file path.
    pub pid_file: Option<String>,
    /// Listener ports.
    pub ports: Ports,
    /// Agent RPC protocol version.
    #[serde(rename = "protocol")]
    pub rpc_protocol: Option<i64>,
    /// Raft protocol version.
    pub raft_protocol: Option<i64>,
    /// Ignore a previous leave and rejoin.
    pub rejoin_after_leave: Option<bool>,
    /// Pause between LAN join retries.
    #[serde(rename = "retry_interval", with = "humantime_serde")]
    pub retry_join_interval_lan: Option<Duration>,
    /// Pause between WAN join retries.
    #[serde(rename = "retry_interval_wan", with = "humantime_serde")]
    pub retry_join_interval_wan: Option<Duration>,
    /// LAN addresses to join with retries.
    #[serde(rename = "retry_join")]
    pub retry_join_lan: Vec<String>,
    /// Maximum LAN join attempts, 0 retries forever.
    #[serde(rename = "retry_max")]
    pub retry_join_max_attempts_lan: Option<i64>,
    /// Maximum WAN join attempts, 0 retries forever.
    #[serde(rename = "retry_max_wan")]
    pub retry_join_max_attempts_wan: Option<i64>,
    /// WAN addresses to join with retries.
    pub retry_join_wan: Vec<String>,
    /// Bind address for LAN gossip.
    #[serde(rename = "serf_lan")]
    pub serf_bind_addr_lan: Option<String>,
    /// Bind address for WAN gossip.
    #[serde(rename = "serf_wan")]
    pub serf_bind_addr_wan: Option<String>,
    /// Server mode.
    #[serde(rename = "server")]
    pub server_mode: Option<bool>,
    /// Directory with web UI assets.
    pub ui_dir: Option<String>,

    /// Azure discovery for retry-join (deprecated).
    pub retry_join_azure: RetryJoinAzure,
    /// EC2 discovery for retry-join (deprecated).
    pub retry_join_ec2: RetryJoinEc2,
    /// GCE discovery for retry-join (deprecated).
    pub retry_join_gce: RetryJoinGce,
}

impl ConfigFragment {
    /// Decode the compiled-in default layer.
    ///
    /// This is the lowest-precedence fragment of every production merge. It
    /// always sets a bind address.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::ConfigError) if the embedded document
    /// does not decode, which only happens if `defaults.toml` is broken.
    pub fn builtin_defaults() -> ConfigResult<Self> {
        parse_file_at(DEFAULTS_TOML, DocumentFormat::Toml, "<embedded defaults>")
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Listener ports. A negative port disables the listener.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Ports {
    /// DNS port (TCP and UDP).
    pub dns: Option<i64>,
    /// HTTP API port.
    pub http: Option<i64>,
    /// HTTPS API port.
    pub https: Option<i64>,
    /// LAN gossip port.
    pub serf_lan: Option<i64>,
    /// WAN gossip port.
    pub serf_wan: Option<i64>,
    /// Server RPC port.
    pub server: Option<i64>,
    /// Legacy client RPC port. Accepted and ignored.
    #[serde(rename = "rpc")]
    pub deprecated_rpc: Option<i64>,
}

impl Ports {
    /// True when no port was mentioned by the layer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Cloud retry-join (deprecated)
// ---------------------------------------------------------------------------

/// Azure tag filter for server discovery.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryJoinAzure {
    /// Tag name to filter on.
    pub tag_name: Option<String>,
    /// Tag value to filter on.
    pub tag_value: Option<String>,
    /// Subscription ID.
    pub subscription_id: Option<String>,
    /// Tenant ID.
    pub tenant_id: Option<String>,
    /// Client ID.
    pub client_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<String>,
}

impl std::fmt::Debug for RetryJoinAzure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryJoinAzure")
            .field("tag_name", &self.tag_name)
            .field("tag_value", &self.tag_value)
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("has_secret_access_key", &self.secret_access_key.is_some())
            .finish()
    }
}

/// EC2 tag filter for server discovery.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryJoinEc2 {
    /// Region to discover servers in.
    pub region: Option<String>,
    /// Tag key to filter on.
    pub tag_key: Option<String>,
    /// Tag value to filter on.
    pub tag_value: Option<String>,
    /// Access key ID.
    pub access_key_id: Option<String>,
    /// Secret access key.
    pub secret_access_key: Option<String>,
}

impl std::fmt::Debug for RetryJoinEc2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryJoinEc2")
            .field("region", &self.region)
            .field("tag_key", &self.tag_key)
            .field("tag_value", &self.tag_value)
            .field("access_key_id", &self.access_key_id)
            .field("has_secret_access_key", &self.secret_access_key.is_some())
            .finish()
    }
}

/// GCE tag filter for server discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryJoinGce {
    /// Project to discover servers in.
    pub project_name: Option<String>,
    /// Region or zone pattern (regex).
    pub zone_pattern: Option<String>,
    /// Tag value to filter on.
    pub tag_value: Option<String>,
    /// Credentials JSON file.
    pub credentials_file: Option<String>,
}
