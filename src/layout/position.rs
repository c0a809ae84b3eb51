use std::collections::HashMap;

use crate::config::LayoutConfig;

use super::{LayerGroups, NodeBox};

/// Column x for `layer` when `last_layer` is the rightmost one.
pub fn layer_x(layer: usize, last_layer: usize, config: &LayoutConfig) -> f32 {
    if last_layer == 0 {
        return config.width / 2.0;
    }
    let span = (config.width - 2.0 * config.margin).max(0.0);
    config.margin + span * (layer as f64 / last_layer as f64) as f32
}

/// Stacks every layer top to bottom in order. A node's share of the layer
/// height follows its share of the layer's total value, never below
/// `min_node_height`.
pub fn compute_positions(
    ordering: &LayerGroups,
    values: &HashMap<String, f32>,
    config: &LayoutConfig,
) -> HashMap<String, NodeBox> {
    let last_layer = ordering.keys().next_back().copied().unwrap_or(0);
    let available = (config.height - 2.0 * config.margin).max(0.0) * config.layer_fill;

    let mut boxes = HashMap::new();
    for (&layer, ids) in ordering {
        let x = layer_x(layer, last_layer, config);
        let layer_values: Vec<f32> = ids
            .iter()
            .map(|id| values.get(id).copied().unwrap_or(1.0).max(0.0))
            .collect();
        let total: f32 = layer_values.iter().sum();

        let mut top = config.margin;
        for (id, value) in ids.iter().zip(layer_values) {
            let share = if total > 0.0 { value / total } else { 0.0 };
            let height = (share * available).max(config.min_node_height);
            boxes.insert(
                id.clone(),
                NodeBox {
                    x,
                    y: top + height / 2.0,
                    width: config.node_width,
                    height,
                },
            );
            top += height + config.node_padding;
        }
    }
    boxes
}
