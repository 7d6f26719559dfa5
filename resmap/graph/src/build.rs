use crate::{
    kinds::{self, Matcher},
    source::GraphSource,
};
use kube::{core::DynamicObject, ResourceExt};
use resmap_core::{GraphEdge, GraphNode, GraphOutput, NodeId, Relation};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// Derives `{nodes, edges}` from the enabled sources.
///
/// The output is deterministic for a fixed snapshot of input nodes,
/// regardless of source iteration order, and is memoized on input identity:
/// if every enabled source returns the same node array as last time, the
/// previous output `Arc` is returned unchanged.
#[derive(Default)]
pub struct GraphBuilder {
    memo: Option<Memo>,
}

/// The inputs the output was derived from, held so pointer equality can
/// never alias a newer node array at a recycled address.
struct Memo {
    keys: Vec<(String, Arc<[GraphNode]>)>,
    output: Arc<GraphOutput>,
}

impl Memo {
    fn matches(&self, inputs: &[(String, Arc<[GraphNode]>)]) -> bool {
        self.keys.len() == inputs.len()
            && self
                .keys
                .iter()
                .zip(inputs)
                .all(|((id, nodes), (other_id, other_nodes))| {
                    id == other_id && Arc::ptr_eq(nodes, other_nodes)
                })
    }
}

// === impl GraphBuilder ===

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while any enabled source has not yet produced data.
    pub fn is_loading(sources: &[Arc<dyn GraphSource>]) -> bool {
        sources.iter().any(|source| source.nodes().is_none())
    }

    pub fn build(&mut self, sources: &[Arc<dyn GraphSource>]) -> Arc<GraphOutput> {
        let mut inputs = sources
            .iter()
            .filter_map(|source| {
                source
                    .nodes()
                    .map(|nodes| (source.id().to_string(), nodes))
            })
            .collect::<Vec<_>>();
        // Source order must not affect the output or the memo key.
        inputs.sort_by(|(a, _), (b, _)| a.cmp(b));

        if let Some(memo) = &self.memo {
            if memo.matches(&inputs) {
                return memo.output.clone();
            }
        }

        let output = derive(&inputs);
        tracing::debug!(
            nodes = output.nodes.len(),
            edges = output.edges.len(),
            "Graph rebuilt",
        );
        self.memo = Some(Memo {
            keys: inputs,
            output: output.clone(),
        });
        output
    }
}

fn derive(inputs: &[(String, Arc<[GraphNode]>)]) -> Arc<GraphOutput> {
    // Merge the node sets. The same object may be produced by more than one
    // source; the first source in id order wins.
    let mut nodes = BTreeMap::<NodeId, GraphNode>::new();
    for (_, produced) in inputs {
        for node in produced.iter() {
            nodes
                .entry(node.id.clone())
                .or_insert_with(|| node.clone());
        }
    }

    let mut edges = BTreeSet::<GraphEdge>::new();

    // Ownership edges: owner -> owned, for every ownerReference whose owner
    // is present. A reference to a node that is absent (source disabled,
    // object deleted) is dropped, not an error.
    for node in nodes.values() {
        let Some(obj) = &node.source_object else {
            continue;
        };
        for owner in obj.owner_references() {
            let owner_id = NodeId::owner(&owner.api_version, &owner.kind, &owner.uid);
            if nodes.contains_key(&owner_id) {
                edges.insert(GraphEdge::new(owner_id, node.id.clone(), Relation::Owner));
            }
        }
    }

    // Kind-specific structural links.
    for node in nodes.values() {
        let Some(obj) = &node.source_object else {
            continue;
        };
        let Some(kind) = node.kind.as_deref() else {
            continue;
        };

        for rule in kinds::rules_for(kind) {
            let referenced = match &rule.matcher {
                Matcher::NamesFrom { extract, .. } => Some((extract)(obj)),
                _ => None,
            };

            for target in nodes.values() {
                if target.id == node.id {
                    continue;
                }
                if target.kind.as_deref() != Some(rule.matcher.target_kind()) {
                    continue;
                }
                let Some(target_obj) = &target.source_object else {
                    continue;
                };
                if obj.namespace() != target_obj.namespace() {
                    continue;
                }
                if !matches(&rule.matcher, obj, target_obj, referenced.as_deref()) {
                    continue;
                }
                // A backing relationship that is already expressed by an
                // ownerReference stays a single Owner edge.
                if rule.relation == Relation::Backs
                    && edges.contains(&GraphEdge::new(
                        node.id.clone(),
                        target.id.clone(),
                        Relation::Owner,
                    ))
                {
                    continue;
                }
                edges.insert(GraphEdge::new(
                    node.id.clone(),
                    target.id.clone(),
                    rule.relation,
                ));
            }
        }
    }

    GraphOutput::new(
        nodes.into_values().collect(),
        edges.into_iter().collect(),
    )
}

fn matches(
    matcher: &Matcher,
    obj: &DynamicObject,
    target: &DynamicObject,
    referenced: Option<&[String]>,
) -> bool {
    match matcher {
        Matcher::LabelValue { label, .. } => {
            target.labels().get(*label).map(String::as_str) == Some(obj.name_any().as_str())
        }

        Matcher::SameName { .. } => target.name_any() == obj.name_any(),

        Matcher::MatchesSelector { path, .. } => {
            let Some(selector) = lookup_map(&obj.data, path) else {
                return false;
            };
            if selector.is_empty() {
                return false;
            }
            let labels = target.labels();
            selector.iter().all(|(key, value)| {
                value
                    .as_str()
                    .map(|value| labels.get(key).map(String::as_str) == Some(value))
                    .unwrap_or(false)
            })
        }

        Matcher::NamesFrom { .. } => referenced
            .map(|names| names.iter().any(|name| *name == target.name_any()))
            .unwrap_or(false),
    }
}

fn lookup_map<'v>(
    data: &'v serde_json::Value,
    path: &[&str],
) -> Option<&'v serde_json::Map<String, serde_json::Value>> {
    let mut value = data;
    for segment in path {
        value = value.get(segment)?;
    }
    value.as_object()
}
