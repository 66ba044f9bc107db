use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use super::Flags;

/// Where a flag writes and how repeated occurrences accumulate.
///
/// Each variant carries a locator returning the bound field inside
/// [`Flags`]. Scalars replace on every occurrence, lists append, maps
/// insert by key.
#[derive(Clone, Copy)]
pub enum Binding {
    /// Boolean with the permissive bare/`=v`/two-token forms.
    Bool(fn(&mut Flags) -> &mut Option<bool>),
    /// Base-10 integer.
    Int(fn(&mut Flags) -> &mut Option<i64>),
    /// Duration literal such as `30s` or `1h 30m`.
    Duration(fn(&mut Flags) -> &mut Option<Duration>),
    /// Free-form string.
    Str(fn(&mut Flags) -> &mut Option<String>),
    /// One list entry per occurrence.
    List(fn(&mut Flags) -> &mut Vec<String>),
    /// One `key:value` entry per occurrence.
    Map(fn(&mut Flags) -> &mut BTreeMap<String, String>),
}

impl Binding {
    /// Placeholder shown in usage output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "",
            Self::Int(_) => "int",
            Self::Duration(_) => "duration",
            Self::Str(_) | Self::List(_) => "string",
            Self::Map(_) => "key:value",
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Duration(_) => "Duration",
            Self::Str(_) => "Str",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
        };
        f.write_str(name)
    }
}

/// One registered flag.
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    /// Name without leading dashes.
    pub name: &'static str,
    /// One-line help text.
    pub help: &'static str,
    /// Target field and accumulation policy.
    pub binding: Binding,
    /// Still accepted, but slated for removal.
    pub deprecated: bool,
}

/// A set of flags keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: BTreeMap<&'static str, FlagSpec>,
}

impl FlagSet {
    /// An empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag.
    pub fn add(&mut self, name: &'static str, binding: Binding, help: &'static str) {
        self.insert(FlagSpec {
            name,
            help,
            binding,
            deprecated: false,
        });
    }

    /// Register a deprecated flag. Using it logs a warning.
    pub fn add_deprecated(&mut self, name: &'static str, binding: Binding, help: &'static str) {
        self.insert(FlagSpec {
            name,
            help,
            binding,
            deprecated: true,
        });
    }

    fn insert(&mut self, spec: FlagSpec) {
        let previous = self.flags.insert(spec.name, spec);
        debug_assert!(previous.is_none(), "flag -{} registered twice", spec.name);
    }

    /// Look up a flag by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.get(name)
    }

    /// All flags, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &FlagSpec> {
        self.flags.values()
    }

    /// Render help output, one entry per flag sorted by name.
    #[must_use]
    pub fn usage(&self, program: &str) -> String {
        let mut out = format!("Usage: {program} [options]\n\nOptions:\n\n");
        for spec in self.iter() {
            let kind = spec.binding.kind();
            if kind.is_empty() {
                let _ = writeln!(out, "  -{}", spec.name);
            } else {
                let _ = writeln!(out, "  -{} {kind}", spec.name);
            }
            if spec.deprecated {
                let _ = writeln!(out, "      (deprecated) {}", spec.help);
            } else {
                let _ = writeln!(out, "      {}", spec.help);
            }
        }
        out
    }

    /// The agent's command line surface.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn agent() -> Self {
        let mut fs = Self::new();

        // command line flags ordered by flag name
        fs.add(
            "advertise",
            Binding::Str(|f| &mut f.file.advertise_addr_lan),
            "Sets the advertise address to use.",
        );
        fs.add(
            "advertise-wan",
            Binding::Str(|f| &mut f.file.advertise_addr_wan),
            "Sets address to advertise on WAN instead of -advertise address.",
        );
        fs.add(
            "bind",
            Binding::Str(|f| &mut f.file.bind_addr),
            "Sets the bind address for cluster communication.",
        );
        fs.add(
            "bootstrap",
            Binding::Bool(|f| &mut f.file.bootstrap),
            "Sets server to bootstrap mode.",
        );
        fs.add(
            "bootstrap-expect",
            Binding::Int(|f| &mut f.file.bootstrap_expect),
            "Sets server to expect bootstrap mode.",
        );
        fs.add(
            "client",
            Binding::Str(|f| &mut f.file.client_addr),
            "Sets the address to bind for client access. This includes RPC, DNS, HTTP and \
             HTTPS (if configured).",
        );
        fs.add(
            "config-dir",
            Binding::List(|f| &mut f.config_files),
            "Path to a directory to read configuration files from. Every file ending in \
             '.json' or '.toml' is read in alphabetical order. Can be specified multiple times.",
        );
        fs.add(
            "config-file",
            Binding::List(|f| &mut f.config_files),
            "Path to a JSON or TOML file to read configuration from. Can be specified \
             multiple times.",
        );
        fs.add(
            "data-dir",
            Binding::Str(|f| &mut f.file.data_dir),
            "Path to a data directory to store agent state.",
        );
        fs.add(
            "datacenter",
            Binding::Str(|f| &mut f.file.datacenter),
            "Datacenter of the agent.",
        );
        fs.add(
            "dev",
            Binding::Bool(|f| &mut f.file.dev_mode),
            "Starts the agent in development mode.",
        );
        fs.add(
            "disable-host-node-id",
            Binding::Bool(|f| &mut f.file.disable_host_node_id),
            "Prevents using information from the host to generate a node ID and generates a \
             random node ID instead.",
        );
        fs.add(
            "disable-keyring-file",
            Binding::Bool(|f| &mut f.file.disable_keyring_file),
            "Disables the backing up of the keyring to a file.",
        );
        fs.add(
            "dns-port",
            Binding::Int(|f| &mut f.file.ports.dns),
            "DNS port to use.",
        );
        fs.add(
            "domain",
            Binding::Str(|f| &mut f.file.dns_domain),
            "Domain to use for DNS interface.",
        );
        fs.add(
            "enable-script-checks",
            Binding::Bool(|f| &mut f.file.enable_script_checks),
            "Enables health check scripts.",
        );
        fs.add(
            "encrypt",
            Binding::Str(|f| &mut f.file.encrypt_key),
            "Provides the gossip encryption key.",
        );
        fs.add(
            "http-port",
            Binding::Int(|f| &mut f.file.ports.http),
            "Sets the HTTP API port to listen on.",
        );
        fs.add(
            "join",
            Binding::List(|f| &mut f.file.join_addrs_lan),
            "Address of an agent to join at start time. Can be specified multiple times.",
        );
        fs.add(
            "join-wan",
            Binding::List(|f| &mut f.file.join_addrs_wan),
            "Address of an agent to join -wan at start time. Can be specified multiple times.",
        );
        fs.add(
            "log-level",
            Binding::Str(|f| &mut f.file.log_level),
            "Log level of the agent.",
        );
        fs.add(
            "node",
            Binding::Str(|f| &mut f.file.node_name),
            "Name of this node. Must be unique in the cluster.",
        );
        fs.add(
            "node-id",
            Binding::Str(|f| &mut f.file.node_id),
            "A unique ID for this node across space and time. Defaults to a randomly-generated \
             ID that persists in the data-dir.",
        );
        fs.add(
            "node-meta",
            Binding::Map(|f| &mut f.file.node_meta),
            "An arbitrary metadata key/value pair for this node, of the format `key:value`. \
             Can be specified multiple times.",
        );
        fs.add(
            "non-voting-server",
            Binding::Bool(|f| &mut f.file.non_voting_server),
            "Makes the server receive the replication stream without participating in the \
             Raft quorum.",
        );
        fs.add(
            "pid-file",
            Binding::Str(|f| &mut f.file.pid_file),
            "Path to file to store agent PID.",
        );
        fs.add(
            "protocol",
            Binding::Int(|f| &mut f.file.rpc_protocol),
            "Sets the protocol version. Defaults to latest.",
        );
        fs.add(
            "raft-protocol",
            Binding::Int(|f| &mut f.file.raft_protocol),
            "Sets the Raft protocol version. Defaults to latest.",
        );
        fs.add(
            "recursor",
            Binding::List(|f| &mut f.file.dns_recursors),
            "Address of an upstream DNS server. Can be specified multiple times.",
        );
        fs.add(
            "rejoin",
            Binding::Bool(|f| &mut f.file.rejoin_after_leave),
            "Ignores a previous leave and attempts to rejoin the cluster.",
        );
        fs.add(
            "retry-interval",
            Binding::Duration(|f| &mut f.file.retry_join_interval_lan),
            "Time to wait between join attempts.",
        );
        fs.add(
            "retry-interval-wan",
            Binding::Duration(|f| &mut f.file.retry_join_interval_wan),
            "Time to wait between join -wan attempts.",
        );
        fs.add(
            "retry-join",
            Binding::List(|f| &mut f.file.retry_join_lan),
            "Address of an agent to join at start time with retries enabled. Can be specified \
             multiple times.",
        );
        fs.add(
            "retry-join-wan",
            Binding::List(|f| &mut f.file.retry_join_wan),
            "Address of an agent to join -wan at start time with retries enabled. Can be \
             specified multiple times.",
        );
        fs.add(
            "retry-max",
            Binding::Int(|f| &mut f.file.retry_join_max_attempts_lan),
            "Maximum number of join attempts. Defaults to 0, which will retry indefinitely.",
        );
        fs.add(
            "retry-max-wan",
            Binding::Int(|f| &mut f.file.retry_join_max_attempts_wan),
            "Maximum number of join -wan attempts. Defaults to 0, which will retry \
             indefinitely.",
        );
        fs.add(
            "serf-lan-bind",
            Binding::Str(|f| &mut f.file.serf_bind_addr_lan),
            "Address to bind Serf LAN listeners to.",
        );
        fs.add(
            "serf-wan-bind",
            Binding::Str(|f| &mut f.file.serf_bind_addr_wan),
            "Address to bind Serf WAN listeners to.",
        );
        fs.add(
            "server",
            Binding::Bool(|f| &mut f.file.server_mode),
            "Switches agent to server mode.",
        );
        fs.add(
            "syslog",
            Binding::Bool(|f| &mut f.file.enable_syslog),
            "Enables logging to syslog.",
        );
        fs.add(
            "ui",
            Binding::Bool(|f| &mut f.file.enable_ui),
            "Enables the built-in static web UI server.",
        );
        fs.add(
            "ui-dir",
            Binding::Str(|f| &mut f.file.ui_dir),
            "Path to directory containing the web UI resources.",
        );

        // deprecated flags ordered by flag name
        fs.add_deprecated(
            "atlas",
            Binding::Str(|f| &mut f.deprecated_atlas_infrastructure),
            "Sets the Atlas infrastructure name, enables SCADA.",
        );
        fs.add_deprecated(
            "atlas-endpoint",
            Binding::Str(|f| &mut f.deprecated_atlas_endpoint),
            "The address of the endpoint for Atlas integration.",
        );
        fs.add_deprecated(
            "atlas-join",
            Binding::Bool(|f| &mut f.deprecated_atlas_join),
            "Enables auto-joining the Atlas cluster.",
        );
        fs.add_deprecated(
            "atlas-token",
            Binding::Str(|f| &mut f.deprecated_atlas_token),
            "Provides the Atlas API token.",
        );
        fs.add_deprecated(
            "dc",
            Binding::Str(|f| &mut f.deprecated_datacenter),
            "Datacenter of the agent (use 'datacenter' instead).",
        );
        fs.add_deprecated(
            "retry-join-azure-tag-name",
            Binding::Str(|f| &mut f.file.retry_join_azure.tag_name),
            "Azure tag name to filter on for server discovery.",
        );
        fs.add_deprecated(
            "retry-join-azure-tag-value",
            Binding::Str(|f| &mut f.file.retry_join_azure.tag_value),
            "Azure tag value to filter on for server discovery.",
        );
        fs.add_deprecated(
            "retry-join-ec2-region",
            Binding::Str(|f| &mut f.file.retry_join_ec2.region),
            "EC2 Region to discover servers in.",
        );
        fs.add_deprecated(
            "retry-join-ec2-tag-key",
            Binding::Str(|f| &mut f.file.retry_join_ec2.tag_key),
            "EC2 tag key to filter on for server discovery.",
        );
        fs.add_deprecated(
            "retry-join-ec2-tag-value",
            Binding::Str(|f| &mut f.file.retry_join_ec2.tag_value),
            "EC2 tag value to filter on for server discovery.",
        );
        fs.add_deprecated(
            "retry-join-gce-credentials-file",
            Binding::Str(|f| &mut f.file.retry_join_gce.credentials_file),
            "Path to credentials JSON file to use with Google Compute Engine.",
        );
        fs.add_deprecated(
            "retry-join-gce-project-name",
            Binding::Str(|f| &mut f.file.retry_join_gce.project_name),
            "Google Compute Engine project to discover servers in.",
        );
        fs.add_deprecated(
            "retry-join-gce-tag-value",
            Binding::Str(|f| &mut f.file.retry_join_gce.tag_value),
            "Google Compute Engine tag value to filter on for server discovery.",
        );
        fs.add_deprecated(
            "retry-join-gce-zone-pattern",
            Binding::Str(|f| &mut f.file.retry_join_gce.zone_pattern),
            "Google Compute Engine region or zone to discover servers in (regex pattern).",
        );

        fs
    }
}
