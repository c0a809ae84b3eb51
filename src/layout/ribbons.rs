use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::ir::Link;

use super::{NodeBox, RibbonGeometry};

#[derive(Debug, Default, Clone, Copy)]
struct SideTotals {
    outbound: f32,
    inbound: f32,
}

/// Height-per-unit-value on each side of every node.
#[derive(Debug, Default)]
struct SideScales {
    outbound: HashMap<String, f32>,
    inbound: HashMap<String, f32>,
    fallback: f32,
}

impl SideScales {
    fn build(links: &[Link], drawable: &[bool], boxes: &HashMap<String, NodeBox>, factor: f32) -> Self {
        let mut totals: HashMap<&str, SideTotals> = HashMap::new();
        let mut max_value = 0.0f32;
        for (link, _) in links.iter().zip(drawable).filter(|(_, ok)| **ok) {
            let value = link.value.max(0.0);
            totals.entry(link.source.as_str()).or_default().outbound += value;
            totals.entry(link.target.as_str()).or_default().inbound += value;
            max_value = max_value.max(value);
        }

        let mut scales = SideScales::default();
        for (id, side) in totals {
            let Some(node_box) = boxes.get(id) else {
                continue;
            };
            let capacity = node_box.height * factor;
            if side.outbound > 0.0 {
                scales.outbound.insert(id.to_string(), capacity / side.outbound);
            }
            if side.inbound > 0.0 {
                scales.inbound.insert(id.to_string(), capacity / side.inbound);
            }
        }

        if max_value > 0.0 {
            scales.fallback = median_height(boxes) * factor / max_value;
        }
        scales
    }

    fn thickness(&self, link: &Link) -> f32 {
        let source = self.outbound.get(&link.source).copied();
        let target = self.inbound.get(&link.target).copied();
        let scale = match (source, target) {
            (Some(s), Some(t)) => (s + t) / 2.0,
            (Some(s), None) => s,
            (None, Some(t)) => t,
            (None, None) => self.fallback,
        };
        link.value.max(0.0) * scale
    }
}

fn median_height(boxes: &HashMap<String, NodeBox>) -> f32 {
    let mut heights: Vec<f32> = boxes.values().map(|b| b.height).collect();
    if heights.is_empty() {
        return 0.0;
    }
    heights.sort_by(f32::total_cmp);
    let mid = heights.len() / 2;
    if heights.len() % 2 == 0 {
        (heights[mid - 1] + heights[mid]) / 2.0
    } else {
        heights[mid]
    }
}

/// Assigns every drawable link a band on its source's outbound side and its
/// target's inbound side. Bands are stacked in link order and, on a given
/// side, never take more than the link's value share of
/// `node height * link_width_factor`, so ribbons cannot overlap at a node
/// boundary unless the minimum thickness floor forces it.
pub fn stack_ribbons(
    links: &[Link],
    boxes: &HashMap<String, NodeBox>,
    config: &LayoutConfig,
) -> Vec<Option<RibbonGeometry>> {
    let factor = config.link_width_factor.clamp(0.0, 1.0);
    let floor = config.min_link_thickness.max(0.0);
    let drawable: Vec<bool> = links
        .iter()
        .map(|link| boxes.contains_key(&link.source) && boxes.contains_key(&link.target))
        .collect();
    let scales = SideScales::build(links, &drawable, boxes, factor);

    let mut thickness = vec![0.0f32; links.len()];
    let mut source_band = vec![0.0f32; links.len()];
    let mut target_band = vec![0.0f32; links.len()];
    for (idx, link) in links.iter().enumerate() {
        if !drawable[idx] {
            continue;
        }
        let value = link.value.max(0.0);
        let t = scales.thickness(link);
        thickness[idx] = t.max(floor);
        let source_share = scales.outbound.get(&link.source).map(|s| value * s);
        let target_share = scales.inbound.get(&link.target).map(|s| value * s);
        source_band[idx] = source_share.map_or(t, |share| t.min(share)).max(floor);
        target_band[idx] = target_share.map_or(t, |share| t.min(share)).max(floor);
    }

    let mut outbound: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut inbound: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, link) in links.iter().enumerate() {
        if drawable[idx] {
            outbound.entry(link.source.as_str()).or_default().push(idx);
            inbound.entry(link.target.as_str()).or_default().push(idx);
        }
    }

    let mut source_top = vec![0.0f32; links.len()];
    let mut target_top = vec![0.0f32; links.len()];
    for (id, members) in &outbound {
        stack_side(&boxes[*id], members, &source_band, config.center_stacks, &mut source_top);
    }
    for (id, members) in &inbound {
        stack_side(&boxes[*id], members, &target_band, config.center_stacks, &mut target_top);
    }

    (0..links.len())
        .map(|idx| {
            drawable[idx].then(|| RibbonGeometry {
                source_top: source_top[idx],
                source_bottom: source_top[idx] + source_band[idx],
                target_top: target_top[idx],
                target_bottom: target_top[idx] + target_band[idx],
                thickness: thickness[idx],
            })
        })
        .collect()
}

fn stack_side(node_box: &NodeBox, members: &[usize], bands: &[f32], center: bool, tops: &mut [f32]) {
    let total: f32 = members.iter().map(|&idx| bands[idx]).sum();
    let mut cursor = node_box.top();
    if center && total < node_box.height {
        cursor += (node_box.height - total) / 2.0;
    }
    for &idx in members {
        tops[idx] = cursor;
        cursor += bands[idx];
    }
}
