//! Layout weight resolution.
//!
//! The layout engine biases vertical placement by a per-node weight so that,
//! for example, the controllers sit above the pods they own. An explicit
//! weight on the node wins outright; otherwise the node's kind is looked up
//! in a coarse tier table; unknown kinds fall back to a default below all
//! tiers. The tiers are spaced out so new kinds can slot in without
//! renumbering.

use crate::GraphNode;

pub const WEIGHT_AUTOSCALER: i64 = 100;
pub const WEIGHT_CONTROLLER: i64 = 85;
pub const WEIGHT_MANAGED_WORKLOAD: i64 = 70;
pub const WEIGHT_JOB: i64 = 55;
pub const WEIGHT_POD: i64 = 40;
pub const WEIGHT_SERVICE: i64 = 25;
pub const WEIGHT_INGRESS: i64 = 10;
pub const WEIGHT_DEFAULT: i64 = 0;

static KIND_TIERS: &[(&str, i64)] = &[
    ("HorizontalPodAutoscaler", WEIGHT_AUTOSCALER),
    ("Deployment", WEIGHT_CONTROLLER),
    ("StatefulSet", WEIGHT_CONTROLLER),
    ("DaemonSet", WEIGHT_CONTROLLER),
    ("CronJob", WEIGHT_CONTROLLER),
    ("ReplicaSet", WEIGHT_MANAGED_WORKLOAD),
    ("ReplicationController", WEIGHT_MANAGED_WORKLOAD),
    ("Job", WEIGHT_JOB),
    ("Pod", WEIGHT_POD),
    ("Service", WEIGHT_SERVICE),
    ("Endpoints", WEIGHT_SERVICE),
    ("EndpointSlice", WEIGHT_SERVICE),
    ("ConfigMap", WEIGHT_SERVICE),
    ("Secret", WEIGHT_SERVICE),
    ("Ingress", WEIGHT_INGRESS),
    ("NetworkPolicy", WEIGHT_INGRESS),
];

/// Resolves the layout weight for a node.
///
/// Pure in `(node.weight, node.kind)` so that an unchanged graph always lays
/// out the same way.
pub fn resolve(node: &GraphNode) -> i64 {
    if let Some(weight) = node.weight {
        return weight;
    }
    node.kind
        .as_deref()
        .and_then(default_for_kind)
        .unwrap_or(WEIGHT_DEFAULT)
}

/// The default tier for a kind, if it is known.
pub fn default_for_kind(kind: &str) -> Option<i64> {
    KIND_TIERS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, weight)| *weight)
}
