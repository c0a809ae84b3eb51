use std::collections::{HashMap, HashSet};

use crate::ir::{Link, Node};

/// Hands out synthetic node ids for one pipeline run. Ids that are already
/// taken by input nodes are skipped.
#[derive(Debug, Clone)]
pub struct SyntheticIds {
    counter: usize,
    taken: HashSet<String>,
}

impl SyntheticIds {
    pub fn new<'a>(existing: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            counter: 0,
            taken: existing.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn next_id(&mut self, source_layer: i64, target_layer: i64) -> String {
        loop {
            self.counter += 1;
            let id = format!("__dummy_l{source_layer}_{target_layer}_{}", self.counter);
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSpan {
    /// An endpoint is missing from the node set.
    Dangling,
    /// An endpoint has no resolvable layer.
    Unlayered,
    /// Same or neighbouring layer.
    Local,
    Reversed { source: i64, target: i64 },
    Long { source: i64, target: i64 },
}

pub fn classify_link(link: &Link, layers: &HashMap<&str, Option<i64>>) -> LinkSpan {
    let (Some(source), Some(target)) = (
        layers.get(link.source.as_str()),
        layers.get(link.target.as_str()),
    ) else {
        return LinkSpan::Dangling;
    };
    let (Some(source), Some(target)) = (*source, *target) else {
        return LinkSpan::Unlayered;
    };
    if target.abs_diff(source) <= 1 {
        LinkSpan::Local
    } else if target < source {
        LinkSpan::Reversed { source, target }
    } else {
        LinkSpan::Long { source, target }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

pub fn split_long_links(nodes: &[Node], links: &[Link], segments: Option<&[String]>) -> SplitGraph {
    let mut ids = SyntheticIds::new(nodes.iter().map(|node| node.id.as_str()));
    split_long_links_with(nodes, links, segments, &mut ids)
}

/// Rewrites every link spanning more than one layer (left to right) into a
/// chain through one synthetic node per intermediate layer. Each hop keeps
/// the original value and metadata. All other links pass through untouched.
pub fn split_long_links_with(
    nodes: &[Node],
    links: &[Link],
    segments: Option<&[String]>,
    ids: &mut SyntheticIds,
) -> SplitGraph {
    let layers: HashMap<&str, Option<i64>> = nodes
        .iter()
        .map(|node| {
            let layer = node.layer.as_ref().and_then(|hint| hint.resolve(segments));
            (node.id.as_str(), layer)
        })
        .collect();

    let mut out = SplitGraph {
        nodes: nodes.to_vec(),
        links: Vec::with_capacity(links.len()),
    };

    for (link_idx, link) in links.iter().enumerate() {
        match classify_link(link, &layers) {
            LinkSpan::Long { source, target } => {
                let mut prev = link.source.clone();
                for layer in (source + 1)..target {
                    let id = ids.next_id(source, target);
                    out.links.push(link.rewired(&prev, &id));
                    out.nodes.push(Node::synthetic(id.clone(), layer, link_idx));
                    prev = id;
                }
                out.links.push(link.rewired(&prev, &link.target));
            }
            span => {
                match span {
                    LinkSpan::Dangling => tracing::warn!(
                        source = %link.source,
                        target = %link.target,
                        "link references an unknown node, leaving it unsplit"
                    ),
                    LinkSpan::Reversed { source, target } => tracing::warn!(
                        source = %link.source,
                        target = %link.target,
                        source_layer = source,
                        target_layer = target,
                        "reversed link spans several layers, keeping it as drawn"
                    ),
                    _ => {}
                }
                out.links.push(link.clone());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::LayerHint;
    use proptest::prelude::*;
    use serde_json::json;

    fn dummies(graph: &SplitGraph) -> Vec<&Node> {
        graph.nodes.iter().filter(|node| node.synthetic).collect()
    }

    #[test]
    fn adjacent_link_is_untouched() {
        let nodes = vec![Node::new("A").with_layer(0), Node::new("B").with_layer(1)];
        let links = vec![Link::new("A", "B", 5.0)];
        let out = split_long_links(&nodes, &links, None);
        assert_eq!(out.nodes, nodes);
        assert_eq!(out.links, links);
    }

    #[test]
    fn same_layer_link_is_untouched() {
        let nodes = vec![Node::new("A").with_layer(1), Node::new("B").with_layer(1)];
        let links = vec![Link::new("A", "B", 2.0)];
        let out = split_long_links(&nodes, &links, None);
        assert!(dummies(&out).is_empty());
        assert_eq!(out.links, links);
    }

    #[test]
    fn one_intermediate_layer() {
        let nodes = vec![Node::new("A").with_layer(0), Node::new("B").with_layer(2)];
        let links = vec![Link::new("A", "B", 7.0).with_meta("label", json!("long"))];
        let out = split_long_links(&nodes, &links, None);

        let synthetic = dummies(&out);
        assert_eq!(synthetic.len(), 1);
        let dummy = synthetic[0];
        assert_eq!(dummy.layer, Some(LayerHint::Index(1)));
        assert_eq!(dummy.origin_link, Some(0));
        assert!(dummy.label.is_none());

        assert_eq!(out.links.len(), 2);
        assert_eq!(out.links[0].source, "A");
        assert_eq!(out.links[0].target, dummy.id);
        assert_eq!(out.links[1].source, dummy.id);
        assert_eq!(out.links[1].target, "B");
        for link in &out.links {
            assert_eq!(link.value, 7.0);
            assert_eq!(link.metadata.get("label"), Some(&json!("long")));
        }
    }

    #[test]
    fn parallel_long_links_get_distinct_chains() {
        let nodes = vec![Node::new("L1").with_layer(0), Node::new("FR1").with_layer(3)];
        let links = vec![Link::new("L1", "FR1", 8.0), Link::new("L1", "FR1", 2.0)];
        let out = split_long_links(&nodes, &links, None);

        let synthetic = dummies(&out);
        assert_eq!(synthetic.len(), 4);
        let unique: HashSet<&str> = synthetic.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(out.links.len(), 6);
        assert!(out.links[..3].iter().all(|link| link.value == 8.0));
        assert!(out.links[3..].iter().all(|link| link.value == 2.0));
        assert_eq!(synthetic[2].origin_link, Some(1));
    }

    #[test]
    fn unknown_layer_passes_through() {
        let nodes = vec![Node::new("A"), Node::new("B").with_layer(2)];
        let links = vec![Link::new("A", "B", 1.0)];
        let out = split_long_links(&nodes, &links, None);
        assert_eq!(out.nodes.len(), 2);
        assert_eq!(out.links, links);
    }

    #[test]
    fn reversed_link_is_never_split() {
        let nodes = vec![Node::new("A").with_layer(3), Node::new("B").with_layer(0)];
        let links = vec![Link::new("A", "B", 4.0)];
        let out = split_long_links(&nodes, &links, None);
        assert!(dummies(&out).is_empty());
        assert_eq!(out.links, links);
    }

    #[test]
    fn extreme_layers_classify_without_overflow() {
        let layers: HashMap<&str, Option<i64>> =
            [("lo", Some(i64::MIN)), ("hi", Some(i64::MAX)), ("top", Some(i64::MAX - 1))]
                .into_iter()
                .collect();
        assert_eq!(
            classify_link(&Link::new("hi", "lo", 1.0), &layers),
            LinkSpan::Reversed {
                source: i64::MAX,
                target: i64::MIN
            }
        );
        assert_eq!(
            classify_link(&Link::new("lo", "hi", 1.0), &layers),
            LinkSpan::Long {
                source: i64::MIN,
                target: i64::MAX
            }
        );
        assert_eq!(classify_link(&Link::new("top", "hi", 1.0), &layers), LinkSpan::Local);
    }

    #[test]
    fn dangling_link_passes_through() {
        let nodes = vec![Node::new("A").with_layer(0)];
        let links = vec![Link::new("A", "ghost", 4.0)];
        let out = split_long_links(&nodes, &links, None);
        assert_eq!(out.links, links);
    }

    #[test]
    fn segment_names_drive_splitting() {
        let segments = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let nodes = vec![Node::new("X").with_segment("a"), Node::new("Y").with_segment("c")];
        let out = split_long_links(&nodes, &[Link::new("X", "Y", 1.0)], Some(&segments));
        assert_eq!(dummies(&out).len(), 1);
        assert_eq!(out.links.len(), 2);
    }

    #[test]
    fn ids_skip_existing_nodes() {
        let nodes = vec![
            Node::new("A").with_layer(0),
            Node::new("__dummy_l0_2_1").with_layer(5),
            Node::new("B").with_layer(2),
        ];
        let out = split_long_links(&nodes, &[Link::new("A", "B", 1.0)], None);
        let synthetic = dummies(&out);
        assert_eq!(synthetic.len(), 1);
        assert_eq!(synthetic[0].id, "__dummy_l0_2_2");
    }

    #[test]
    fn shared_counter_spans_invocations() {
        let nodes = vec![Node::new("A").with_layer(0), Node::new("B").with_layer(2)];
        let links = vec![Link::new("A", "B", 1.0)];
        let mut ids = SyntheticIds::new(nodes.iter().map(|node| node.id.as_str()));
        let first = split_long_links_with(&nodes, &links, None, &mut ids);
        let second = split_long_links_with(&nodes, &links, None, &mut ids);
        assert_ne!(dummies(&first)[0].id, dummies(&second)[0].id);
    }

    proptest! {
        #[test]
        fn split_links_span_at_most_one_layer(
            layers in prop::collection::vec(0i64..6, 2..8),
            edges in prop::collection::vec((0usize..8, 0usize..8, 0.0f32..10.0), 0..16),
        ) {
            let nodes: Vec<Node> = layers
                .iter()
                .enumerate()
                .map(|(idx, layer)| Node::new(format!("n{idx}")).with_layer(*layer))
                .collect();
            let links: Vec<Link> = edges
                .iter()
                .filter(|(from, to, _)| *from < nodes.len() && *to < nodes.len())
                .map(|(from, to, value)| Link::new(format!("n{from}"), format!("n{to}"), *value))
                .collect();
            let out = split_long_links(&nodes, &links, None);
            let layer_of: HashMap<&str, i64> = out
                .nodes
                .iter()
                .map(|node| {
                    let layer = node.layer.as_ref().and_then(|hint| hint.resolve(None));
                    (node.id.as_str(), layer.unwrap_or(0))
                })
                .collect();
            for link in &out.links {
                let delta = layer_of[link.target.as_str()] - layer_of[link.source.as_str()];
                prop_assert!(delta <= 1, "forward link spans {} layers", delta);
            }
            let ids: HashSet<&str> = out.nodes.iter().map(|node| node.id.as_str()).collect();
            prop_assert_eq!(ids.len(), out.nodes.len());
        }
    }
}
