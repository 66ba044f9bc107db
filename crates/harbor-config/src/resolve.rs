//! Resolution of a merged fragment into the runtime configuration.
//!
//! Every absent scalar falls back to its type's zero value. Listener
//! addresses are derived from the bind addresses and the configured ports.
//! Validation stops at the first violation and no partially built
//! [`RuntimeConfig`] ever escapes.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::fragment::{ConfigFragment, Ports, RetryJoinAzure, RetryJoinEc2, RetryJoinGce};

/// Address used when the bind address is set but empty.
const WILDCARD_ADDR: &str = "0.0.0.0";

/// Highest valid port number.
const MAX_PORT: i64 = 65_535;

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

/// Fully resolved agent configuration. Every field has a concrete value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct RuntimeConfig {
    // simple values
    /// Address advertised to LAN peers.
    pub advertise_addr_lan: String,
    /// Address advertised to WAN peers.
    pub advertise_addr_wan: String,
    /// Server bootstrap mode.
    pub bootstrap: bool,
    /// Number of servers to wait for before bootstrapping.
    pub bootstrap_expect: i64,
    /// Update check interval.
    #[serde(with = "humantime_serde")]
    pub check_update_interval: Duration,
    /// Address client interfaces bind to.
    pub client_addr: String,
    /// Agent state directory.
    pub data_dir: String,
    /// Datacenter name.
    pub datacenter: String,
    /// Development mode.
    pub dev_mode: bool,
    /// Generate a random node ID instead of a host-derived one.
    pub disable_host_node_id: bool,
    /// Do not back up the gossip keyring to a file.
    pub disable_keyring_file: bool,
    /// DNS domain.
    pub dns_domain: String,
    /// Allow script health checks.
    pub enable_script_checks: bool,
    /// Log to syslog.
    pub enable_syslog: bool,
    /// Serve the built-in web UI.
    pub enable_ui: bool,
    /// Gossip encryption key. Never serialized.
    #[serde(skip_serializing)]
    pub encrypt_key: String,
    /// Log level.
    pub log_level: String,
    /// Node identifier.
    pub node_id: String,
    /// Node name.
    pub node_name: String,
    /// Non-voting server.
    pub non_voting_server: bool,
    /// PID file path.
    pub pid_file: String,
    /// Agent RPC protocol version.
    pub rpc_protocol: i64,
    /// Raft protocol version.
    pub raft_protocol: i64,
    /// Ignore a previous leave and rejoin.
    pub rejoin_after_leave: bool,
    /// Pause between LAN join retries.
    #[serde(with = "humantime_serde")]
    pub retry_join_interval_lan: Duration,
    /// Pause between WAN join retries.
    #[serde(with = "humantime_serde")]
    pub retry_join_interval_wan: Duration,
    /// Maximum LAN join attempts, 0 retries forever.
    pub retry_join_max_attempts_lan: i64,
    /// Maximum WAN join attempts, 0 retries forever.
    pub retry_join_max_attempts_wan: i64,
    /// Bind address for LAN gossip.
    pub serf_bind_addr_lan: String,
    /// Bind address for WAN gossip.
    pub serf_bind_addr_wan: String,
    /// Server mode.
    pub server_mode: bool,
    /// Directory with web UI assets.
    pub ui_dir: String,

    // address values
    /// Addresses the agent binds to. Empty when no layer set a bind address.
    pub bind_addrs: Vec<String>,
    /// Upstream DNS servers.
    pub dns_recursors: Vec<String>,
    /// LAN addresses to join at start.
    pub join_addrs_lan: Vec<String>,
    /// WAN addresses to join at start.
    pub join_addrs_wan: Vec<String>,
    /// LAN addresses to join with retries.
    pub retry_join_lan: Vec<String>,
    /// WAN addresses to join with retries.
    pub retry_join_wan: Vec<String>,

    // server endpoint values
    /// DNS port.
    pub dns_port: i64,
    /// DNS listeners (TCP).
    pub dns_addrs_tcp: Vec<String>,
    /// DNS listeners (UDP).
    pub dns_addrs_udp: Vec<String>,
    /// HTTP API port.
    pub http_port: i64,
    /// HTTP API listeners.
    pub http_addrs: Vec<String>,
    /// HTTPS API port.
    pub https_port: i64,
    /// HTTPS API listeners.
    pub https_addrs: Vec<String>,
    /// LAN gossip port.
    pub serf_port_lan: i64,
    /// WAN gossip port.
    pub serf_port_wan: i64,
    /// Server RPC port.
    pub server_port: i64,
    /// Server RPC listeners.
    pub server_addrs: Vec<String>,

    // other values
    /// Arbitrary node metadata.
    pub node_meta: BTreeMap<String, String>,
    /// Azure discovery for retry-join.
    pub retry_join_azure: AzureDiscovery,
    /// EC2 discovery for retry-join.
    pub retry_join_ec2: Ec2Discovery,
    /// GCE discovery for retry-join.
    pub retry_join_gce: GceDiscovery,
}

/// Resolved Azure discovery settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct AzureDiscovery {
    /// Tag name to filter on.
    pub tag_name: String,
    /// Tag value to filter on.
    pub tag_value: String,
    /// Subscription ID.
    pub subscription_id: String,
    /// Tenant ID.
    pub tenant_id: String,
    /// Client ID.
    pub client_id: String,
    /// Secret access key. Never serialized.
    #[serde(skip_serializing)]
    pub secret_access_key: String,
}

impl std::fmt::Debug for AzureDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDiscovery")
            .field("tag_name", &self.tag_name)
            .field("tag_value", &self.tag_value)
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("has_secret_access_key", &!self.secret_access_key.is_empty())
            .finish()
    }
}

/// Resolved EC2 discovery settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ec2Discovery {
    /// Region to discover servers in.
    pub region: String,
    /// Tag key to filter on.
    pub tag_key: String,
    /// Tag value to filter on.
    pub tag_value: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key. Never serialized.
    #[serde(skip_serializing)]
    pub secret_access_key: String,
}

impl std::fmt::Debug for Ec2Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ec2Discovery")
            .field("region", &self.region)
            .field("tag_key", &self.tag_key)
            .field("tag_value", &self.tag_value)
            .field("access_key_id", &self.access_key_id)
            .field("has_secret_access_key", &!self.secret_access_key.is_empty())
            .finish()
    }
}

/// Resolved GCE discovery settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GceDiscovery {
    /// Project to discover servers in.
    pub project_name: String,
    /// Region or zone pattern (regex).
    pub zone_pattern: String,
    /// Tag value to filter on.
    pub tag_value: String,
    /// Credentials JSON file.
    pub credentials_file: String,
}

impl TryFrom<ConfigFragment> for RuntimeConfig {
    type Error = ConfigError;

    fn try_from(fragment: ConfigFragment) -> ConfigResult<Self> {
        Self::from_fragment(fragment)
    }
}

impl RuntimeConfig {
    /// Resolve a fully merged fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] when ports are configured
    /// without a bind address or a port is out of range, and
    /// [`ConfigError::InvalidDuration`] when a duration string does not
    /// parse.
    pub fn from_fragment(fragment: ConfigFragment) -> ConfigResult<Self> {
        let ConfigFragment {
            advertise_addr_lan,
            advertise_addr_wan,
            bind_addr,
            bootstrap,
            bootstrap_expect,
            check_update_interval,
            client_addr,
            data_dir,
            datacenter,
            dev_mode,
            disable_host_node_id,
            disable_keyring_file,
            dns_domain,
            dns_recursors,
            enable_script_checks,
            enable_syslog,
            enable_ui,
            encrypt_key,
            join_addrs_lan,
            join_addrs_wan,
            log_level,
            node_id,
            node_meta,
            node_name,
            non_voting_server,
            pid_file,
            ports,
            rpc_protocol,
            raft_protocol,
            rejoin_after_leave,
            retry_join_interval_lan,
            retry_join_interval_wan,
            retry_join_lan,
            retry_join_max_attempts_lan,
            retry_join_max_attempts_wan,
            retry_join_wan,
            serf_bind_addr_lan,
            serf_bind_addr_wan,
            server_mode,
            ui_dir,
            retry_join_azure,
            retry_join_ec2,
            retry_join_gce,
        } = fragment;

        // Without a bind address the per-address listeners cannot be
        // derived. Only fragments built without the default layer hit this.
        if bind_addr.is_none() && !ports.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "bind_addr".to_owned(),
                message: "no bind address specified".to_owned(),
            });
        }

        let bind_addrs: Vec<String> = bind_addr.map(addr_or_wildcard).into_iter().collect();
        let endpoints = Endpoints::resolve(&ports, &bind_addrs)?;

        Ok(Self {
            advertise_addr_lan: advertise_addr_lan.unwrap_or_default(),
            advertise_addr_wan: advertise_addr_wan.unwrap_or_default(),
            bootstrap: bootstrap.unwrap_or_default(),
            bootstrap_expect: bootstrap_expect.unwrap_or_default(),
            check_update_interval: duration_val(
                "check_update_interval",
                check_update_interval.as_deref(),
            )?,
            client_addr: client_addr.unwrap_or_default(),
            data_dir: data_dir.unwrap_or_default(),
            datacenter: datacenter.unwrap_or_default(),
            dev_mode: dev_mode.unwrap_or_default(),
            disable_host_node_id: disable_host_node_id.unwrap_or_default(),
            disable_keyring_file: disable_keyring_file.unwrap_or_default(),
            dns_domain: dns_domain.unwrap_or_default(),
            enable_script_checks: enable_script_checks.unwrap_or_default(),
            enable_syslog: enable_syslog.unwrap_or_default(),
            enable_ui: enable_ui.unwrap_or_default(),
            encrypt_key: encrypt_key.unwrap_or_default(),
            log_level: log_level.unwrap_or_default(),
            node_id: node_id.unwrap_or_default(),
            node_name: node_name.unwrap_or_default(),
            non_voting_server: non_voting_server.unwrap_or_default(),
            pid_file: pid_file.unwrap_or_default(),
            rpc_protocol: rpc_protocol.unwrap_or_default(),
            raft_protocol: raft_protocol.unwrap_or_default(),
            rejoin_after_leave: rejoin_after_leave.unwrap_or_default(),
            retry_join_interval_lan: retry_join_interval_lan.unwrap_or_default(),
            retry_join_interval_wan: retry_join_interval_wan.unwrap_or_default(),
            retry_join_max_attempts_lan: retry_join_max_attempts_lan.unwrap_or_default(),
            retry_join_max_attempts_wan: retry_join_max_attempts_wan.unwrap_or_default(),
            serf_bind_addr_lan: serf_bind_addr_lan.unwrap_or_default(),
            serf_bind_addr_wan: serf_bind_addr_wan.unwrap_or_default(),
            server_mode: server_mode.unwrap_or_default(),
            ui_dir: ui_dir.unwrap_or_default(),

            bind_addrs,
            dns_recursors,
            join_addrs_lan,
            join_addrs_wan,
            retry_join_lan,
            retry_join_wan,

            dns_port: endpoints.dns_port,
            dns_addrs_tcp: endpoints.dns_addrs.clone(),
            dns_addrs_udp: endpoints.dns_addrs,
            http_port: endpoints.http_port,
            http_addrs: endpoints.http_addrs,
            https_port: endpoints.https_port,
            https_addrs: endpoints.https_addrs,
            serf_port_lan: endpoints.serf_port_lan,
            serf_port_wan: endpoints.serf_port_wan,
            server_port: endpoints.server_port,
            server_addrs: endpoints.server_addrs,

            node_meta,
            retry_join_azure: AzureDiscovery::from(retry_join_azure),
            retry_join_ec2: Ec2Discovery::from(retry_join_ec2),
            retry_join_gce: GceDiscovery::from(retry_join_gce),
        })
    }
}

/// Ports and the listener addresses derived from them.
struct Endpoints {
    dns_port: i64,
    dns_addrs: Vec<String>,
    http_port: i64,
    http_addrs: Vec<String>,
    https_port: i64,
    https_addrs: Vec<String>,
    serf_port_lan: i64,
    serf_port_wan: i64,
    server_port: i64,
    server_addrs: Vec<String>,
}

impl Endpoints {
    fn resolve(ports: &Ports, bind_addrs: &[String]) -> ConfigResult<Self> {
        if ports.deprecated_rpc.is_some() {
            warn!("ports.rpc is deprecated and ignored");
        }

        Ok(Self {
            dns_port: port_val("ports.dns", ports.dns)?,
            dns_addrs: listener_addrs(bind_addrs, ports.dns),
            http_port: port_val("ports.http", ports.http)?,
            http_addrs: listener_addrs(bind_addrs, ports.http),
            https_port: port_val("ports.https", ports.https)?,
            https_addrs: listener_addrs(bind_addrs, ports.https),
            serf_port_lan: port_val("ports.serf_lan", ports.serf_lan)?,
            serf_port_wan: port_val("ports.serf_wan", ports.serf_wan)?,
            server_port: port_val("ports.server", ports.server)?,
            server_addrs: listener_addrs(bind_addrs, ports.server),
        })
    }
}

impl From<RetryJoinAzure> for AzureDiscovery {
    fn from(f: RetryJoinAzure) -> Self {
        Self {
            tag_name: f.tag_name.unwrap_or_default(),
            tag_value: f.tag_value.unwrap_or_default(),
            subscription_id: f.subscription_id.unwrap_or_default(),
            tenant_id: f.tenant_id.unwrap_or_default(),
            client_id: f.client_id.unwrap_or_default(),
            secret_access_key: f.secret_access_key.unwrap_or_default(),
        }
    }
}

impl From<RetryJoinEc2> for Ec2Discovery {
    fn from(f: RetryJoinEc2) -> Self {
        Self {
            region: f.region.unwrap_or_default(),
            tag_key: f.tag_key.unwrap_or_default(),
            tag_value: f.tag_value.unwrap_or_default(),
            access_key_id: f.access_key_id.unwrap_or_default(),
            secret_access_key: f.secret_access_key.unwrap_or_default(),
        }
    }
}

impl From<RetryJoinGce> for GceDiscovery {
    fn from(f: RetryJoinGce) -> Self {
        Self {
            project_name: f.project_name.unwrap_or_default(),
            zone_pattern: f.zone_pattern.unwrap_or_default(),
            tag_value: f.tag_value.unwrap_or_default(),
            credentials_file: f.credentials_file.unwrap_or_default(),
        }
    }
}

fn addr_or_wildcard(addr: String) -> String {
    if addr.is_empty() {
        WILDCARD_ADDR.to_owned()
    } else {
        addr
    }
}

fn duration_val(field: &str, s: Option<&str>) -> ConfigResult<Duration> {
    let Some(s) = s else {
        return Ok(Duration::ZERO);
    };
    humantime::parse_duration(s).map_err(|e| ConfigError::InvalidDuration {
        field: field.to_owned(),
        value: s.to_owned(),
        message: e.to_string(),
    })
}

fn port_val(field: &str, port: Option<i64>) -> ConfigResult<i64> {
    let port = port.unwrap_or_default();
    if port > MAX_PORT {
        return Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: format!("port {port} is out of range; must be at most {MAX_PORT}"),
        });
    }
    Ok(port)
}

/// One `host:port` per bind address. Absent or negative ports yield none.
fn listener_addrs(bind_addrs: &[String], port: Option<i64>) -> Vec<String> {
    match port {
        Some(port) if port >= 0 => bind_addrs
            .iter()
            .map(|host| join_host_port(host, port))
            .collect(),
        _ => Vec::new(),
    }
}

/// Render `host:port`. A wildcard host becomes the empty host so the
/// listener binds every interface; IPv6 hosts are bracketed.
pub(crate) fn join_host_port(host: &str, port: i64) -> String {
    let host = if host == WILDCARD_ADDR || host == "::" {
        ""
    } else {
        host
    };
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_empty_fragment_resolves_to_zero_values() {
        let cfg = RuntimeConfig::from_fragment(ConfigFragment::default()).unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
        assert!(cfg.bind_addrs.is_empty());
    }

    #[test]
    fn test_scalars_unwrap() {
        let cfg = RuntimeConfig::from_fragment(ConfigFragment {
            bootstrap: Some(true),
            datacenter: Some("a".to_owned()),
            raft_protocol: Some(3),
            retry_join_interval_wan: Some(Duration::from_secs(30)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            cfg,
            RuntimeConfig {
                bootstrap: true,
                datacenter: "a".to_owned(),
                raft_protocol: 3,
                retry_join_interval_wan: Duration::from_secs(30),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_dns_listeners_on_wildcard() {
        let cfg = RuntimeConfig::from_fragment(ConfigFragment {
            bind_addr: Some("0.0.0.0".to_owned()),
            ports: Ports {
                dns: Some(123),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            cfg,
            RuntimeConfig {
                bind_addrs: strings(&["0.0.0.0"]),
                dns_port: 123,
                dns_addrs_tcp: strings(&[":123"]),
                dns_addrs_udp: strings(&[":123"]),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_listeners_on_concrete_address() {
        let cfg = RuntimeConfig::from_fragment(ConfigFragment {
            bind_addr: Some("10.0.0.1".to_owned()),
            ports: Ports {
                http: Some(8500),
                https: Some(8501),
                server: Some(8300),
                serf_lan: Some(8301),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.http_addrs, strings(&["10.0.0.1:8500"]));
        assert_eq!(cfg.https_addrs, strings(&["10.0.0.1:8501"]));
        assert_eq!(cfg.server_addrs, strings(&["10.0.0.1:8300"]));
        assert_eq!(cfg.serf_port_lan, 8301);
        assert!(cfg.dns_addrs_tcp.is_empty());
    }

    #[test]
    fn test_empty_bind_addr_is_wildcard() {
        let cfg = RuntimeConfig::from_fragment(ConfigFragment {
            bind_addr: Some(String::new()),
            ports: Ports {
                http: Some(80),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.bind_addrs, strings(&["0.0.0.0"]));
        assert_eq!(cfg.http_addrs, strings(&[":80"]));
    }

    #[test]
    fn test_ports_without_bind_addr_rejected() {
        let fragment = ConfigFragment {
            ports: Ports {
                dns: Some(53),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = RuntimeConfig::from_fragment(fragment.clone()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, ref message }
                if field == "bind_addr" && message == "no bind address specified"
        ));
        assert!(err.is_resolution_error());

        let fixed = ConfigFragment {
            bind_addr: Some("127.0.0.1".to_owned()),
            ..fragment
        };
        let cfg = RuntimeConfig::from_fragment(fixed).unwrap();
        assert_eq!(cfg.dns_addrs_udp, strings(&["127.0.0.1:53"]));
    }

    #[test]
    fn test_deprecated_rpc_port_counts_as_touched() {
        let fragment = ConfigFragment {
            ports: Ports {
                deprecated_rpc: Some(8400),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(RuntimeConfig::from_fragment(fragment).is_err());
    }

    #[test]
    fn test_negative_port_disables_listener() {
        let cfg = RuntimeConfig::from_fragment(ConfigFragment {
            bind_addr: Some("0.0.0.0".to_owned()),
            ports: Ports {
                https: Some(-1),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.https_port, -1);
        assert!(cfg.https_addrs.is_empty());
    }

    #[test]
    fn test_port_out_of_range() {
        let err = RuntimeConfig::from_fragment(ConfigFragment {
            bind_addr: Some("0.0.0.0".to_owned()),
            ports: Ports {
                http: Some(70_000),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "ports.http"));
    }

    #[test]
    fn test_check_update_interval_parses() {
        let cfg = RuntimeConfig::from_fragment(ConfigFragment {
            check_update_interval: Some("5m".to_owned()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.check_update_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_bad_duration_aborts() {
        let err = RuntimeConfig::try_from(ConfigFragment {
            bootstrap: Some(true),
            check_update_interval: Some("every now and then".to_owned()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDuration { ref field, .. } if field == "check_update_interval"
        ));
    }

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("0.0.0.0", 53), ":53");
        assert_eq!(join_host_port("::", 53), ":53");
        assert_eq!(join_host_port("10.1.2.3", 53), "10.1.2.3:53");
        assert_eq!(join_host_port("::1", 53), "[::1]:53");
        assert_eq!(join_host_port("host.example", 0), "host.example:0");
    }

    #[test]
    fn test_cloud_groups_resolve() {
        let cfg = RuntimeConfig::from_fragment(ConfigFragment {
            retry_join_ec2: RetryJoinEc2 {
                region: Some("us-east-1".to_owned()),
                secret_access_key: Some("shh".to_owned()),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        assert_eq!(cfg.retry_join_ec2.region, "us-east-1");
        assert_eq!(cfg.retry_join_ec2.secret_access_key, "shh");
        assert!(!format!("{cfg:?}").contains("shh"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let fragment = ConfigFragment {
            bind_addr: Some("0.0.0.0".to_owned()),
            node_meta: BTreeMap::from([
                ("b".to_owned(), "2".to_owned()),
                ("a".to_owned(), "1".to_owned()),
            ]),
            ports: Ports {
                dns: Some(53),
                ..Default::default()
            },
            ..Default::default()
        };
        let first = RuntimeConfig::from_fragment(fragment.clone()).unwrap();
        let second = RuntimeConfig::from_fragment(fragment).unwrap();
        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }
}
