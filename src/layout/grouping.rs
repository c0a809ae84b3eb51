use crate::ir::{LayerHint, Node};

use super::{LayerGroups, LayerMap};

/// Buckets node ids by layer, keeping input order inside each bucket. Only
/// occupied layers get a bucket.
pub fn group_by_layer(nodes: &[Node], layers: &LayerMap) -> LayerGroups {
    let mut groups = LayerGroups::new();
    for node in nodes {
        let layer = layers
            .get(&node.id)
            .copied()
            .unwrap_or_else(|| match node.layer {
                Some(LayerHint::Index(idx)) if idx > 0 => usize::try_from(idx).unwrap_or(usize::MAX),
                _ => 0,
            });
        groups.entry(layer).or_default().push(node.id.clone());
    }
    groups
}
