//! Layered merge of configuration fragments.
//!
//! Fragments are folded left to right, lowest precedence first. Each field
//! kind composes under its own rule:
//!
//! - scalars: a present value in the later fragment replaces the earlier one
//! - lists: a non-empty later list is appended, lists only ever grow
//! - maps: a non-empty later map replaces the whole earlier map
//!
//! Groups such as [`Ports`] merge field by field. An empty list cannot reset
//! a list contributed by an earlier layer.

use std::collections::BTreeMap;

use tracing::debug;

use crate::fragment::{ConfigFragment, Ports, RetryJoinAzure, RetryJoinEc2, RetryJoinGce};

/// Merge `fragments` in order into a new fragment. No input is modified.
#[must_use]
pub fn merge(fragments: &[ConfigFragment]) -> ConfigFragment {
    let mut merged = ConfigFragment::default();
    for fragment in fragments {
        merged.merge_from(fragment);
    }
    debug!(layers = fragments.len(), "merged configuration fragments");
    merged
}

#[allow(clippy::ref_option)]
fn merge_scalar<T: Clone>(acc: &mut Option<T>, overlay: &Option<T>) {
    if let Some(v) = overlay {
        *acc = Some(v.clone());
    }
}

fn merge_list(acc: &mut Vec<String>, overlay: &[String]) {
    acc.extend_from_slice(overlay);
}

fn merge_map(acc: &mut BTreeMap<String, String>, overlay: &BTreeMap<String, String>) {
    if !overlay.is_empty() {
        acc.clone_from(overlay);
    }
}

impl ConfigFragment {
    /// Merge `overlay` on top of `self`.
    pub fn merge_from(&mut self, overlay: &Self) {
        // Destructured so that a new field cannot be forgotten here.
        let Self {
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
        } = overlay;

        merge_scalar(&mut self.advertise_addr_lan, advertise_addr_lan);
        merge_scalar(&mut self.advertise_addr_wan, advertise_addr_wan);
        merge_scalar(&mut self.bind_addr, bind_addr);
        merge_scalar(&mut self.bootstrap, bootstrap);
        merge_scalar(&mut self.bootstrap_expect, bootstrap_expect);
        merge_scalar(&mut self.check_update_interval, check_update_interval);
        merge_scalar(&mut self.client_addr, client_addr);
        merge_scalar(&mut self.data_dir, data_dir);
        merge_scalar(&mut self.datacenter, datacenter);
        merge_scalar(&mut self.dev_mode, dev_mode);
        merge_scalar(&mut self.disable_host_node_id, disable_host_node_id);
        merge_scalar(&mut self.disable_keyring_file, disable_keyring_file);
        merge_scalar(&mut self.dns_domain, dns_domain);
        merge_list(&mut self.dns_recursors, dns_recursors);
        merge_scalar(&mut self.enable_script_checks, enable_script_checks);
        merge_scalar(&mut self.enable_syslog, enable_syslog);
        merge_scalar(&mut self.enable_ui, enable_ui);
        merge_scalar(&mut self.encrypt_key, encrypt_key);
        merge_list(&mut self.join_addrs_lan, join_addrs_lan);
        merge_list(&mut self.join_addrs_wan, join_addrs_wan);
        merge_scalar(&mut self.log_level, log_level);
        merge_scalar(&mut self.node_id, node_id);
        merge_map(&mut self.node_meta, node_meta);
        merge_scalar(&mut self.node_name, node_name);
        merge_scalar(&mut self.non_voting_server, non_voting_server);
        merge_scalar(&mut self.pid_file, pid_file);
        self.ports.merge_from(ports);
        merge_scalar(&mut self.rpc_protocol, rpc_protocol);
        merge_scalar(&mut self.raft_protocol, raft_protocol);
        merge_scalar(&mut self.rejoin_after_leave, rejoin_after_leave);
        merge_scalar(&mut self.retry_join_interval_lan, retry_join_interval_lan);
        merge_scalar(&mut self.retry_join_interval_wan, retry_join_interval_wan);
        merge_list(&mut self.retry_join_lan, retry_join_lan);
        merge_scalar(
            &mut self.retry_join_max_attempts_lan,
            retry_join_max_attempts_lan,
        );
        merge_scalar(
            &mut self.retry_join_max_attempts_wan,
            retry_join_max_attempts_wan,
        );
        merge_list(&mut self.retry_join_wan, retry_join_wan);
        merge_scalar(&mut self.serf_bind_addr_lan, serf_bind_addr_lan);
        merge_scalar(&mut self.serf_bind_addr_wan, serf_bind_addr_wan);
        merge_scalar(&mut self.server_mode, server_mode);
        merge_scalar(&mut self.ui_dir, ui_dir);
        self.retry_join_azure.merge_from(retry_join_azure);
        self.retry_join_ec2.merge_from(retry_join_ec2);
        self.retry_join_gce.merge_from(retry_join_gce);
    }
}

impl Ports {
    /// Merge `overlay` on top of `self`, port by port.
    pub fn merge_from(&mut self, overlay: &Self) {
        let Self {
            dns,
            http,
            https,
            serf_lan,
            serf_wan,
            server,
            deprecated_rpc,
        } = overlay;

        merge_scalar(&mut self.dns, dns);
        merge_scalar(&mut self.http, http);
        merge_scalar(&mut self.https, https);
        merge_scalar(&mut self.serf_lan, serf_lan);
        merge_scalar(&mut self.serf_wan, serf_wan);
        merge_scalar(&mut self.server, server);
        merge_scalar(&mut self.deprecated_rpc, deprecated_rpc);
    }
}

impl RetryJoinAzure {
    fn merge_from(&mut self, overlay: &Self) {
        let Self {
            tag_name,
            tag_value,
            subscription_id,
            tenant_id,
            client_id,
            secret_access_key,
        } = overlay;

        merge_scalar(&mut self.tag_name, tag_name);
        merge_scalar(&mut self.tag_value, tag_value);
        merge_scalar(&mut self.subscription_id, subscription_id);
        merge_scalar(&mut self.tenant_id, tenant_id);
        merge_scalar(&mut self.client_id, client_id);
        merge_scalar(&mut self.secret_access_key, secret_access_key);
    }
}

impl RetryJoinEc2 {
    fn merge_from(&mut self, overlay: &Self) {
        let Self {
            region,
            tag_key,
            tag_value,
            access_key_id,
            secret_access_key,
        } = overlay;

        merge_scalar(&mut self.region, region);
        merge_scalar(&mut self.tag_key, tag_key);
        merge_scalar(&mut self.tag_value, tag_value);
        merge_scalar(&mut self.access_key_id, access_key_id);
        merge_scalar(&mut self.secret_access_key, secret_access_key);
    }
}

impl RetryJoinGce {
    fn merge_from(&mut self, overlay: &Self) {
        let Self {
            project_name,
            zone_pattern,
            tag_value,
            credentials_file,
        } = overlay;

        merge_scalar(&mut self.project_name, project_name);
        merge_scalar(&mut self.zone_pattern, zone_pattern);
        merge_scalar(&mut self.tag_value, tag_value);
        merge_scalar(&mut self.credentials_file, credentials_file);
    }
}

#[cfg(test)]
mod tests;
