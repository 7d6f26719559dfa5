use crate::engine::{EdgeLayout, EdgeSection, Layout, LayoutEngine, LayoutError, NodeLayout, Point};
use ahash::AHashMap as HashMap;
use resmap_core::{GraphOutput, NodeId};
use std::collections::BTreeMap;

/// A simple built-in engine: weight tiers become rows, heavier tiers on
/// top, and edges are routed as a single straight section.
///
/// Real deployments plug in an external engine; this keeps the pipeline
/// usable (and testable) without one.
pub struct TierLayout {
    pub column_spacing: f64,
    pub row_spacing: f64,
}

impl Default for TierLayout {
    fn default() -> Self {
        Self {
            column_spacing: 160.0,
            row_spacing: 120.0,
        }
    }
}

impl LayoutEngine for TierLayout {
    fn layout(&self, graph: &GraphOutput, weights: &[i64]) -> Result<Layout, LayoutError> {
        if weights.len() != graph.nodes.len() {
            return Err(LayoutError(format!(
                "{} weights for {} nodes",
                weights.len(),
                graph.nodes.len(),
            )));
        }

        // Nodes arrive sorted by id, so tier rows are deterministic.
        let mut tiers = BTreeMap::<i64, Vec<&NodeId>>::new();
        for (node, weight) in graph.nodes.iter().zip(weights) {
            tiers.entry(*weight).or_default().push(&node.id);
        }

        let mut positions = HashMap::<NodeId, Point>::default();
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        for (row, (_, ids)) in tiers.iter().rev().enumerate() {
            for (column, id) in ids.iter().enumerate() {
                let position = Point::new(
                    column as f64 * self.column_spacing,
                    row as f64 * self.row_spacing,
                );
                positions.insert((*id).clone(), position);
                nodes.push(NodeLayout {
                    id: (*id).clone(),
                    position,
                });
            }
        }

        // The builder never emits dangling edges, but this seam is public;
        // an edge whose endpoint is unknown is dropped, not an error.
        let edges = graph
            .edges
            .iter()
            .filter_map(|edge| {
                let start = *positions.get(&edge.source)?;
                let end = *positions.get(&edge.target)?;
                Some(EdgeLayout {
                    id: edge.id(),
                    offset: Point::default(),
                    sections: vec![EdgeSection {
                        start,
                        end,
                        bend_points: Vec::new(),
                    }],
                })
            })
            .collect();

        Ok(Layout { nodes, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resmap_core::{weight, GraphEdge, GraphNode, Relation};

    fn mk_node(id: &str, kind: &str) -> GraphNode {
        GraphNode {
            id: NodeId::synthetic(id),
            label: id.to_string(),
            kind: Some(kind.to_string()),
            weight: None,
            source_object: None,
        }
    }

    #[test]
    fn heavier_tiers_sit_above_lighter_ones() {
        let graph = GraphOutput::new(
            vec![mk_node("deploy", "Deployment"), mk_node("pod", "Pod")],
            vec![GraphEdge::new(
                NodeId::synthetic("deploy"),
                NodeId::synthetic("pod"),
                Relation::Owner,
            )],
        );
        let weights = graph.nodes.iter().map(weight::resolve).collect::<Vec<_>>();

        let layout = TierLayout::default().layout(&graph, &weights).unwrap();
        let y = |id: &str| {
            layout
                .nodes
                .iter()
                .find(|n| n.id.as_str() == id)
                .unwrap()
                .position
                .y
        };
        assert!(y("deploy") < y("pod"));
        assert_eq!(layout.edges.len(), 1);
        assert_eq!(layout.edges[0].sections.len(), 1);
    }

    #[test]
    fn weight_count_mismatch_is_an_error() {
        let graph = GraphOutput::new(vec![mk_node("a", "Pod")], Vec::new());
        assert!(TierLayout::default().layout(&graph, &[]).is_err());
    }

    #[test]
    fn edges_with_unknown_endpoints_are_dropped() {
        let graph = GraphOutput::new(
            vec![mk_node("a", "Pod")],
            vec![GraphEdge::new(
                NodeId::synthetic("a"),
                NodeId::synthetic("gone"),
                Relation::Owner,
            )],
        );
        let weights = graph.nodes.iter().map(weight::resolve).collect::<Vec<_>>();

        let layout = TierLayout::default().layout(&graph, &weights).unwrap();
        assert_eq!(layout.nodes.len(), 1);
        assert!(layout.edges.is_empty());
    }
}
