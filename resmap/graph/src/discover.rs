use crate::source::{KindSource, SourceGroup};
use kube::core::GroupVersionKind;
use resmap_k8s_store::{Snapshot, StoreCache};
use std::collections::BTreeMap;

/// A kind the map always watches, and the source-tree section it lands in.
pub struct BuiltinKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub section: &'static str,
}

impl BuiltinKind {
    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(self.group, self.version, self.kind)
    }
}

macro_rules! builtin {
    ($group:literal, $version:literal, $kind:literal, $plural:literal, $section:literal) => {
        BuiltinKind {
            group: $group,
            version: $version,
            kind: $kind,
            plural: $plural,
            section: $section,
        }
    };
}

pub static BUILTIN_KINDS: &[BuiltinKind] = &[
    builtin!("", "v1", "Pod", "pods", "workloads"),
    builtin!("apps", "v1", "Deployment", "deployments", "workloads"),
    builtin!("apps", "v1", "ReplicaSet", "replicasets", "workloads"),
    builtin!("apps", "v1", "StatefulSet", "statefulsets", "workloads"),
    builtin!("apps", "v1", "DaemonSet", "daemonsets", "workloads"),
    builtin!("batch", "v1", "Job", "jobs", "workloads"),
    builtin!("batch", "v1", "CronJob", "cronjobs", "workloads"),
    builtin!(
        "autoscaling",
        "v2",
        "HorizontalPodAutoscaler",
        "horizontalpodautoscalers",
        "workloads"
    ),
    builtin!("", "v1", "Service", "services", "network"),
    builtin!("", "v1", "Endpoints", "endpoints", "network"),
    builtin!(
        "discovery.k8s.io",
        "v1",
        "EndpointSlice",
        "endpointslices",
        "network"
    ),
    builtin!("networking.k8s.io", "v1", "Ingress", "ingresses", "network"),
    builtin!("", "v1", "ConfigMap", "configmaps", "configuration"),
    builtin!("", "v1", "Secret", "secrets", "configuration"),
];

static SECTIONS: &[(&str, &str)] = &[
    ("workloads", "Workloads"),
    ("network", "Network"),
    ("configuration", "Configuration"),
];

/// The GVK of CustomResourceDefinition itself, watched to discover dynamic
/// sources.
pub fn crd_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(
        "apiextensions.k8s.io",
        "v1",
        "CustomResourceDefinition",
    )
}

/// Builds the built-in source tree over whatever stores the cache holds.
/// Kinds without a store (e.g. not watched in this scope) are skipped.
pub fn builtin_tree(cache: &StoreCache) -> SourceGroup {
    let mut root = SourceGroup::new("cluster", "Cluster");
    for (section, label) in SECTIONS {
        let mut group = SourceGroup::new(*section, *label);
        for builtin in BUILTIN_KINDS.iter().filter(|b| b.section == *section) {
            let gvk = builtin.gvk();
            if let Some(rx) = cache.get(&gvk) {
                group = group.push_source(KindSource::new(gvk, rx));
            }
        }
        root = root.push_group(group);
    }
    root
}

/// A custom kind served by a CRD.
#[derive(Clone, Debug)]
pub struct DiscoveredKind {
    pub gvk: GroupVersionKind,
    pub plural: String,
    pub namespaced: bool,
}

/// The custom kinds served by the CRDs in a snapshot, with their plural
/// names. Sorted and deduplicated so discovery order does not matter.
pub fn crd_kinds(crds: &Snapshot) -> Vec<DiscoveredKind> {
    let mut kinds = BTreeMap::new();
    for obj in crds.items() {
        let spec = &obj.data["spec"];
        let (Some(group), Some(kind), Some(plural)) = (
            spec["group"].as_str(),
            spec["names"]["kind"].as_str(),
            spec["names"]["plural"].as_str(),
        ) else {
            continue;
        };
        let Some(version) = spec["versions"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|v| v["served"].as_bool() == Some(true))
            .and_then(|v| v["name"].as_str())
        else {
            continue;
        };
        kinds.insert(
            (group.to_string(), kind.to_string()),
            DiscoveredKind {
                gvk: GroupVersionKind::gvk(group, version, kind),
                plural: plural.to_string(),
                namespaced: spec["scope"].as_str() == Some("Namespaced"),
            },
        );
    }
    kinds.into_values().collect()
}

/// Generates source groups for discovered custom kinds: one group per API
/// group, named after the group string, disabled by default.
pub fn crd_tree(crds: &Snapshot, cache: &StoreCache) -> Vec<SourceGroup> {
    let mut by_group = BTreeMap::<String, Vec<KindSource>>::new();
    for discovered in crd_kinds(crds) {
        let Some(rx) = cache.get(&discovered.gvk) else {
            continue;
        };
        by_group
            .entry(discovered.gvk.group.clone())
            .or_default()
            .push(KindSource::new(discovered.gvk, rx));
    }

    by_group
        .into_iter()
        .map(|(group, sources)| {
            let mut tree =
                SourceGroup::new(format!("crds.{group}"), group).default_enabled(false);
            for source in sources {
                tree = tree.push_source(source);
            }
            tree
        })
        .collect()
}
