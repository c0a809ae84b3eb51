mod grouping;
mod layers;
mod ordering;
mod position;
mod ribbons;
mod split;
pub(crate) mod types;
mod values;

pub use grouping::group_by_layer;
pub use layers::resolve_layers;
pub use ordering::{count_crossings, order_layers};
pub use position::{compute_positions, layer_x};
pub use ribbons::stack_ribbons;
pub use split::{
    LinkSpan, SplitGraph, SyntheticIds, classify_link, split_long_links, split_long_links_with,
};
pub use types::*;
pub use values::node_values;

use crate::config::LayoutConfig;
use crate::ir::{LayerHint, Node, SankeyGraph};

pub fn compute_layout(graph: &SankeyGraph, config: &LayoutConfig) -> SankeyLayout {
    let segments = graph.segment_names();

    let resolved = resolve_layers(&graph.nodes, &graph.links, segments);
    let annotated: Vec<Node> = graph
        .nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            if let Some(&layer) = resolved.get(&node.id) {
                node.layer = Some(LayerHint::Index(i64::try_from(layer).unwrap_or(i64::MAX)));
            }
            node
        })
        .collect();

    let split = split_long_links(&annotated, &graph.links, segments);
    let layers: LayerMap = split
        .nodes
        .iter()
        .filter_map(|node| match node.layer {
            Some(LayerHint::Index(layer)) if layer >= 0 => Some((node.id.clone(), layer as usize)),
            _ => None,
        })
        .collect();
    tracing::debug!(
        nodes = split.nodes.len(),
        links = split.links.len(),
        synthetic = split.nodes.len() - graph.nodes.len(),
        "split long links"
    );

    let values = node_values(&split.nodes, &split.links);
    let groups = group_by_layer(&split.nodes, &layers);
    let ordering = order_layers(&groups, &split.links, config.iterations);
    tracing::debug!(
        layers = ordering.len(),
        crossings_before = count_crossings(&groups, &split.links),
        crossings_after = count_crossings(&ordering, &split.links),
        "ordered layers"
    );

    let boxes = compute_positions(&ordering, &values, config);
    let ribbons = stack_ribbons(&split.links, &boxes, config);

    SankeyLayout {
        width: config.width,
        height: config.height,
        node_width: config.node_width,
        curvature: config.curvature,
        nodes: split.nodes,
        links: split.links,
        segments: graph.segments.clone(),
        layers,
        values,
        ordering,
        boxes,
        ribbons,
    }
}
