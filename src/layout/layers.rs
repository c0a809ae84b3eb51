use std::collections::{HashMap, VecDeque};

use crate::ir::{Link, Node};

use super::LayerMap;

/// Assigns every node a layer. Explicit hints win; the rest is filled in by
/// longest-path layering over the link graph. Nodes that cannot be reached
/// (isolated cycles) fall back to layer 0. The result is shifted so the
/// smallest layer is 0.
pub fn resolve_layers(nodes: &[Node], links: &[Link], segments: Option<&[String]>) -> LayerMap {
    let mut id_to_idx: HashMap<&str, usize> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        id_to_idx.insert(node.id.as_str(), idx);
    }

    let mut layers: Vec<Option<i64>> = nodes
        .iter()
        .map(|node| node.layer.as_ref().and_then(|hint| hint.resolve(segments)))
        .collect();

    if layers.iter().any(Option::is_none) {
        propagate_longest_path(&id_to_idx, links, &mut layers);
    }

    let mut fallback = 0usize;
    let resolved: Vec<i64> = layers
        .into_iter()
        .map(|layer| {
            layer.unwrap_or_else(|| {
                fallback += 1;
                0
            })
        })
        .collect();
    if fallback > 0 {
        tracing::warn!(
            nodes = fallback,
            "layer inference left nodes unresolved (cyclic links?), placing them in layer 0"
        );
    }

    let min_layer = resolved.iter().copied().min().unwrap_or(0);
    nodes
        .iter()
        .zip(resolved)
        .map(|(node, layer)| (node.id.clone(), shift_layer(layer, min_layer)))
        .collect()
}

/// Distance from `min_layer`, capped so it still fits an `i64` hint.
fn shift_layer(layer: i64, min_layer: i64) -> usize {
    let shifted = layer.abs_diff(min_layer).min(i64::MAX as u64);
    usize::try_from(shifted).unwrap_or(usize::MAX)
}

fn propagate_longest_path(
    id_to_idx: &HashMap<&str, usize>,
    links: &[Link],
    layers: &mut [Option<i64>],
) {
    let node_count = layers.len();
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut indegree = vec![0usize; node_count];
    for link in links {
        let (Some(&from_idx), Some(&to_idx)) = (
            id_to_idx.get(link.source.as_str()),
            id_to_idx.get(link.target.as_str()),
        ) else {
            continue;
        };
        outgoing[from_idx].push(to_idx);
        indegree[to_idx] += 1;
    }

    let mut queue: VecDeque<usize> = VecDeque::new();
    for idx in 0..node_count {
        if indegree[idx] == 0 {
            queue.push_back(idx);
            layers[idx].get_or_insert(0);
        }
    }

    while let Some(node_idx) = queue.pop_front() {
        let candidate = layers[node_idx].unwrap_or(0).saturating_add(1);
        for &to_idx in &outgoing[node_idx] {
            if layers[to_idx].is_none_or(|current| candidate > current) {
                layers[to_idx] = Some(candidate);
            }
            indegree[to_idx] -= 1;
            if indegree[to_idx] == 0 {
                queue.push_back(to_idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chain(ids: &[&str]) -> Vec<Link> {
        ids.windows(2)
            .map(|pair| Link::new(pair[0], pair[1], 1.0))
            .collect()
    }

    #[test]
    fn explicit_layers_are_used_directly() {
        let nodes = vec![Node::new("A").with_layer(0), Node::new("B").with_layer(2)];
        let layers = resolve_layers(&nodes, &[Link::new("A", "B", 1.0)], None);
        assert_eq!(layers["A"], 0);
        assert_eq!(layers["B"], 2);
    }

    #[test]
    fn segment_names_resolve_by_position() {
        let segments = vec!["in".to_string(), "mid".to_string(), "out".to_string()];
        let nodes = vec![Node::new("A").with_segment("in"), Node::new("B").with_segment("out")];
        let layers = resolve_layers(&nodes, &[], Some(&segments));
        assert_eq!(layers["A"], 0);
        assert_eq!(layers["B"], 2);
    }

    #[test]
    fn infers_longest_path_layers() {
        let nodes: Vec<Node> = ["A", "B", "C", "D"].into_iter().map(Node::new).collect();
        let mut links = chain(&["A", "B", "C"]);
        links.push(Link::new("A", "C", 1.0));
        links.push(Link::new("A", "D", 1.0));
        let layers = resolve_layers(&nodes, &links, None);
        assert_eq!(layers["A"], 0);
        assert_eq!(layers["B"], 1);
        assert_eq!(layers["C"], 2);
        assert_eq!(layers["D"], 1);
    }

    #[test]
    fn explicit_layer_acts_as_lower_bound_during_inference() {
        let nodes = vec![
            Node::new("A"),
            Node::new("B").with_layer(3),
            Node::new("C"),
        ];
        let layers = resolve_layers(&nodes, &chain(&["A", "B", "C"]), None);
        assert_eq!(layers["A"], 0);
        assert_eq!(layers["B"], 3);
        assert_eq!(layers["C"], 4);
    }

    #[test]
    fn unknown_segment_name_is_inferred() {
        let segments = vec!["left".to_string(), "right".to_string()];
        let nodes = vec![Node::new("A").with_segment("left"), Node::new("B").with_segment("nope")];
        let layers = resolve_layers(&nodes, &[Link::new("A", "B", 1.0)], Some(&segments));
        assert_eq!(layers["B"], 1);
    }

    #[test]
    fn cycle_members_fall_back_to_layer_zero() {
        let nodes: Vec<Node> = ["S", "X", "Y"].into_iter().map(Node::new).collect();
        let links = vec![
            Link::new("S", "X", 1.0),
            Link::new("X", "Y", 1.0),
            Link::new("Y", "X", 1.0),
        ];
        let layers = resolve_layers(&nodes, &links, None);
        assert_eq!(layers["S"], 0);
        // X gets a tentative layer from S but never reaches in-degree zero;
        // Y is never touched.
        assert_eq!(layers["X"], 1);
        assert_eq!(layers["Y"], 0);
    }

    #[test]
    fn dangling_links_are_ignored() {
        let nodes = vec![Node::new("A"), Node::new("B")];
        let links = vec![Link::new("A", "B", 1.0), Link::new("ghost", "A", 1.0)];
        let layers = resolve_layers(&nodes, &links, None);
        assert_eq!(layers["A"], 0);
        assert_eq!(layers["B"], 1);
    }

    #[test]
    fn negative_layers_are_normalized() {
        let nodes = vec![Node::new("A").with_layer(-3), Node::new("B").with_layer(-1)];
        let layers = resolve_layers(&nodes, &[], None);
        assert_eq!(layers["A"], 0);
        assert_eq!(layers["B"], 2);
    }

    #[test]
    fn extreme_hints_saturate() {
        let nodes = vec![
            Node::new("A").with_layer(i64::MAX),
            Node::new("B"),
            Node::new("C").with_layer(0),
        ];
        let layers = resolve_layers(&nodes, &[Link::new("A", "B", 1.0)], None);
        assert_eq!(layers["A"], i64::MAX as usize);
        assert_eq!(layers["B"], i64::MAX as usize);
        assert_eq!(layers["C"], 0);
    }

    #[test]
    fn full_i64_range_is_clamped_after_normalizing() {
        let nodes = vec![Node::new("A").with_layer(i64::MIN), Node::new("B").with_layer(1)];
        let layers = resolve_layers(&nodes, &[], None);
        assert_eq!(layers["A"], 0);
        assert_eq!(layers["B"], i64::MAX as usize);
    }

    #[test]
    fn empty_input() {
        assert!(resolve_layers(&[], &[], None).is_empty());
    }

    proptest! {
        #[test]
        fn minimum_layer_is_always_zero(
            hints in prop::collection::vec(prop::option::of(-5i64..5), 1..12),
            edges in prop::collection::vec((0usize..12, 0usize..12), 0..24),
        ) {
            let nodes: Vec<Node> = hints
                .iter()
                .enumerate()
                .map(|(idx, hint)| {
                    let node = Node::new(format!("n{idx}"));
                    match hint {
                        Some(layer) => node.with_layer(*layer),
                        None => node,
                    }
                })
                .collect();
            let links: Vec<Link> = edges
                .iter()
                .map(|(from, to)| Link::new(format!("n{from}"), format!("n{to}"), 1.0))
                .collect();
            let layers = resolve_layers(&nodes, &links, None);
            prop_assert_eq!(layers.len(), nodes.len());
            prop_assert_eq!(layers.values().copied().min(), Some(0));
        }
    }
}
