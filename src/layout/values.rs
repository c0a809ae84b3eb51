use std::collections::HashMap;

use crate::ir::{Link, Node};

/// Node magnitude: the larger of its inbound total, outbound total and
/// declared value.
pub fn node_values(nodes: &[Node], links: &[Link]) -> HashMap<String, f32> {
    let mut in_total: HashMap<&str, f32> = HashMap::new();
    let mut out_total: HashMap<&str, f32> = HashMap::new();
    for link in links {
        *out_total.entry(link.source.as_str()).or_default() += link.value;
        *in_total.entry(link.target.as_str()).or_default() += link.value;
    }

    nodes
        .iter()
        .map(|node| {
            let id = node.id.as_str();
            let inbound = in_total.get(id).copied().unwrap_or(0.0);
            let outbound = out_total.get(id).copied().unwrap_or(0.0);
            let declared = node.value.unwrap_or(0.0);
            (node.id.clone(), inbound.max(outbound).max(declared))
        })
        .collect()
}
