use std::collections::BTreeMap;
use std::time::Duration;

use super::*;

fn meta(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn test_merge_top_level_fields() {
    let files = vec![
        ConfigFragment {
            advertise_addr_lan: Some("a".to_owned()),
            ..Default::default()
        },
        ConfigFragment {
            advertise_addr_lan: Some("b".to_owned()),
            ..Default::default()
        },
        ConfigFragment {
            raft_protocol: Some(1),
            ..Default::default()
        },
        ConfigFragment {
            raft_protocol: Some(2),
            ..Default::default()
        },
        ConfigFragment {
            server_mode: Some(false),
            ..Default::default()
        },
        ConfigFragment {
            server_mode: Some(true),
            ..Default::default()
        },
        ConfigFragment {
            join_addrs_lan: strings(&["a"]),
            ..Default::default()
        },
        ConfigFragment {
            join_addrs_lan: strings(&["b"]),
            ..Default::default()
        },
        ConfigFragment {
            node_meta: meta(&[("a", "b")]),
            ..Default::default()
        },
        ConfigFragment {
            node_meta: meta(&[("c", "d")]),
            ..Default::default()
        },
        ConfigFragment {
            ports: Ports {
                dns: Some(1),
                ..Default::default()
            },
            ..Default::default()
        },
        ConfigFragment {
            ports: Ports {
                dns: Some(2),
                http: Some(3),
                ..Default::default()
            },
            ..Default::default()
        },
    ];

    let want = ConfigFragment {
        advertise_addr_lan: Some("b".to_owned()),
        raft_protocol: Some(2),
        server_mode: Some(true),
        join_addrs_lan: strings(&["a", "b"]),
        node_meta: meta(&[("c", "d")]),
        ports: Ports {
            dns: Some(2),
            http: Some(3),
            ..Default::default()
        },
        ..Default::default()
    };

    assert_eq!(merge(&files), want);
}

#[test]
fn test_merge_empty_input() {
    assert_eq!(merge(&[]), ConfigFragment::default());
}

#[test]
fn test_absent_default_is_identity() {
    let f = ConfigFragment {
        bind_addr: Some("10.0.0.1".to_owned()),
        bootstrap: Some(false),
        dns_recursors: strings(&["8.8.8.8", "1.1.1.1"]),
        node_meta: meta(&[("rack", "r1")]),
        ports: Ports {
            dns: Some(53),
            ..Default::default()
        },
        retry_join_interval_lan: Some(Duration::from_secs(5)),
        ..Default::default()
    };

    assert_eq!(merge(&[ConfigFragment::default(), f.clone()]), f);
    assert_eq!(merge(&[f.clone(), ConfigFragment::default()]), f);
    assert_eq!(merge(std::slice::from_ref(&f)), f);
}

#[test]
fn test_scalar_last_writer_wins() {
    let a = ConfigFragment {
        datacenter: Some("a".to_owned()),
        bootstrap: Some(true),
        ..Default::default()
    };
    let b = ConfigFragment {
        datacenter: Some("b".to_owned()),
        bootstrap: Some(false),
        ..Default::default()
    };

    let merged = merge(&[a, b]);
    assert_eq!(merged.datacenter.as_deref(), Some("b"));
    assert_eq!(merged.bootstrap, Some(false));
}

#[test]
fn test_absent_scalar_keeps_earlier_value() {
    let a = ConfigFragment {
        datacenter: Some("a".to_owned()),
        ..Default::default()
    };
    let b = ConfigFragment {
        node_name: Some("n1".to_owned()),
        ..Default::default()
    };

    let merged = merge(&[a, b]);
    assert_eq!(merged.datacenter.as_deref(), Some("a"));
    assert_eq!(merged.node_name.as_deref(), Some("n1"));
}

#[test]
fn test_explicit_zero_overrides() {
    let a = ConfigFragment {
        bootstrap_expect: Some(3),
        datacenter: Some("dc1".to_owned()),
        ..Default::default()
    };
    let b = ConfigFragment {
        bootstrap_expect: Some(0),
        datacenter: Some(String::new()),
        ..Default::default()
    };

    let merged = merge(&[a, b]);
    assert_eq!(merged.bootstrap_expect, Some(0));
    assert_eq!(merged.datacenter.as_deref(), Some(""));
}

#[test]
fn test_list_concatenation_preserves_order() {
    let files = vec![
        ConfigFragment {
            retry_join_lan: strings(&["a", "b"]),
            ..Default::default()
        },
        ConfigFragment::default(),
        ConfigFragment {
            retry_join_lan: strings(&["c"]),
            ..Default::default()
        },
    ];

    assert_eq!(merge(&files).retry_join_lan, strings(&["a", "b", "c"]));
}

#[test]
fn test_empty_list_cannot_reset() {
    let files = vec![
        ConfigFragment {
            join_addrs_wan: strings(&["a"]),
            ..Default::default()
        },
        ConfigFragment {
            join_addrs_wan: Vec::new(),
            ..Default::default()
        },
    ];

    assert_eq!(merge(&files).join_addrs_wan, strings(&["a"]));
}

#[test]
fn test_map_whole_replace() {
    let files = vec![
        ConfigFragment {
            node_meta: meta(&[("a", "b"), ("shared", "old")]),
            ..Default::default()
        },
        ConfigFragment {
            node_meta: meta(&[("c", "d"), ("shared", "new")]),
            ..Default::default()
        },
    ];

    let merged = merge(&files);
    assert_eq!(merged.node_meta, meta(&[("c", "d"), ("shared", "new")]));
    assert!(!merged.node_meta.contains_key("a"));
}

#[test]
fn test_empty_map_keeps_earlier_map() {
    let files = vec![
        ConfigFragment {
            node_meta: meta(&[("a", "b")]),
            ..Default::default()
        },
        ConfigFragment::default(),
    ];

    assert_eq!(merge(&files).node_meta, meta(&[("a", "b")]));
}

#[test]
fn test_nested_groups_merge_per_field() {
    let files = vec![
        ConfigFragment {
            retry_join_ec2: RetryJoinEc2 {
                region: Some("us-east-1".to_owned()),
                tag_key: Some("role".to_owned()),
                ..Default::default()
            },
            ..Default::default()
        },
        ConfigFragment {
            retry_join_ec2: RetryJoinEc2 {
                region: Some("eu-west-1".to_owned()),
                ..Default::default()
            },
            ..Default::default()
        },
    ];

    let merged = merge(&files);
    assert_eq!(merged.retry_join_ec2.region.as_deref(), Some("eu-west-1"));
    assert_eq!(merged.retry_join_ec2.tag_key.as_deref(), Some("role"));
}

#[test]
fn test_inputs_are_not_modified() {
    let a = ConfigFragment {
        join_addrs_lan: strings(&["a"]),
        ..Default::default()
    };
    let b = ConfigFragment {
        join_addrs_lan: strings(&["b"]),
        ..Default::default()
    };
    let files = vec![a.clone(), b.clone()];

    let _ = merge(&files);
    assert_eq!(files, vec![a, b]);
}

#[test]
fn test_merge_over_builtin_defaults() {
    let defaults = ConfigFragment::builtin_defaults().unwrap();
    let file = ConfigFragment {
        ports: Ports {
            dns: Some(53),
            ..Default::default()
        },
        ..Default::default()
    };

    let merged = merge(&[defaults, file]);
    assert_eq!(merged.ports.dns, Some(53));
    assert_eq!(merged.ports.http, Some(8500));
    assert_eq!(merged.bind_addr.as_deref(), Some("0.0.0.0"));
}
