//! Kind-specific relationship rules, modeled as data.
//!
//! Adding a new kind is a table change, not a new type: each rule names the
//! source kind, the relation the derived edge carries, and how targets are
//! matched. Ownership edges are not listed here; they are derived generically
//! from ownerReferences for every kind.

use kube::core::DynamicObject;
use resmap_core::Relation;

pub(crate) struct KindRule {
    /// The kind of the edge's source object.
    pub kind: &'static str,
    pub relation: Relation,
    pub matcher: Matcher,
}

pub(crate) enum Matcher {
    /// Targets of `target_kind` carrying `label` equal to the source's name.
    LabelValue {
        target_kind: &'static str,
        label: &'static str,
    },

    /// The target of `target_kind` with the source's name and namespace.
    SameName { target_kind: &'static str },

    /// Targets of `target_kind` whose labels satisfy the selector map found
    /// at `path` in the source object's payload.
    MatchesSelector {
        target_kind: &'static str,
        path: &'static [&'static str],
    },

    /// Targets of `target_kind` whose name is produced by `extract`.
    NamesFrom {
        target_kind: &'static str,
        extract: fn(&DynamicObject) -> Vec<String>,
    },
}

impl Matcher {
    pub(crate) fn target_kind(&self) -> &'static str {
        match self {
            Self::LabelValue { target_kind, .. }
            | Self::SameName { target_kind }
            | Self::MatchesSelector { target_kind, .. }
            | Self::NamesFrom { target_kind, .. } => target_kind,
        }
    }
}

pub(crate) static RULES: &[KindRule] = &[
    // A Service is backed by its EndpointSlices. Modern slices carry the
    // service name label; the owner-reference pass usually links these first
    // and this rule catches slices without one.
    KindRule {
        kind: "Service",
        relation: Relation::Backs,
        matcher: Matcher::LabelValue {
            target_kind: "EndpointSlice",
            label: "kubernetes.io/service-name",
        },
    },
    // Legacy Endpoints objects correlate by name/namespace only.
    KindRule {
        kind: "Service",
        relation: Relation::Backs,
        matcher: Matcher::SameName {
            target_kind: "Endpoints",
        },
    },
    KindRule {
        kind: "Service",
        relation: Relation::Selects,
        matcher: Matcher::MatchesSelector {
            target_kind: "Pod",
            path: &["spec", "selector"],
        },
    },
    KindRule {
        kind: "Ingress",
        relation: Relation::References,
        matcher: Matcher::NamesFrom {
            target_kind: "Service",
            extract: ingress_backend_services,
        },
    },
];

pub(crate) fn rules_for(kind: &str) -> impl Iterator<Item = &'static KindRule> + '_ {
    RULES.iter().filter(move |rule| rule.kind == kind)
}

/// The service names referenced by an Ingress: every rule path backend plus
/// the default backend.
fn ingress_backend_services(obj: &DynamicObject) -> Vec<String> {
    let mut names = Vec::new();

    let backend_name = |backend: &serde_json::Value| {
        backend
            .pointer("/service/name")
            .and_then(|name| name.as_str())
            .map(String::from)
    };

    if let Some(backend) = obj.data.pointer("/spec/defaultBackend") {
        names.extend(backend_name(backend));
    }

    for rule in obj
        .data
        .pointer("/spec/rules")
        .and_then(|rules| rules.as_array())
        .into_iter()
        .flatten()
    {
        for path in rule
            .pointer("/http/paths")
            .and_then(|paths| paths.as_array())
            .into_iter()
            .flatten()
        {
            if let Some(backend) = path.get("backend") {
                names.extend(backend_name(backend));
            }
        }
    }

    names
}
