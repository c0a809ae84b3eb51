use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::config::{ColorMode, RenderConfig};
use crate::ir::Node;
use crate::layout::{NodeBox, RibbonGeometry, SankeyLayout};
use crate::theme::Theme;

pub type Point = (f32, f32);

const LABEL_GAP: f32 = 8.0;
const LABEL_BASELINE_SHIFT: f32 = 4.0;
const LEGEND_OFFSET_X: f32 = 260.0;
const LEGEND_TOP: f32 = 20.0;
const LEGEND_ROW: f32 = 18.0;
const FALLBACK_OPACITY: f32 = 0.5;

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub nodes: Vec<SceneNode>,
    pub links: Vec<SceneLink>,
    pub labels: Vec<SceneLabel>,
    pub legend: Option<Legend>,
}

/// Node rectangle, positioned by its top-left corner.
#[derive(Debug, Clone, Serialize)]
pub struct SceneNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub synthetic: bool,
    pub label: Option<String>,
    pub color: String,
    pub fill: String,
    pub stroke: String,
    pub corner_radius: f32,
    pub dashed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicSegment {
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Serialize)]
pub struct Gradient {
    pub id: String,
    pub start: Point,
    pub end: Point,
    pub start_color: String,
    pub end_color: String,
}

/// Closed outline: `top` runs source to target, `bottom` runs back.
#[derive(Debug, Clone, Serialize)]
pub struct RibbonOutline {
    pub link: usize,
    pub top: CubicSegment,
    pub bottom: CubicSegment,
    pub gradient: Gradient,
    pub opacity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrokeCurve {
    pub link: usize,
    pub curve: CubicSegment,
    pub width: f32,
    pub color: String,
    pub opacity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub enum SceneLink {
    Ribbon(RibbonOutline),
    Stroke(StrokeCurve),
}

impl SceneLink {
    pub fn link_index(&self) -> usize {
        match self {
            SceneLink::Ribbon(ribbon) => ribbon.link,
            SceneLink::Stroke(stroke) => stroke.link,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAnchor {
    Start,
    End,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneLabel {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub anchor: TextAnchor,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub x: f32,
    pub y: f32,
    pub title: String,
    pub row_height: f32,
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct ColorAssignment {
    pub layers: BTreeMap<usize, String>,
    pub nodes: HashMap<String, String>,
}

pub fn assign_colors(
    nodes: &[Node],
    layers: &HashMap<String, usize>,
    mode: ColorMode,
    theme: &Theme,
) -> ColorAssignment {
    let used: BTreeSet<usize> = layers.values().copied().collect();
    let layer_colors: BTreeMap<usize, String> = used
        .into_iter()
        .enumerate()
        .map(|(idx, layer)| (layer, theme.palette_color(idx).to_string()))
        .collect();

    let mut node_colors = HashMap::new();
    let mut item_idx = 0usize;
    for node in nodes {
        let color = if node.synthetic {
            theme.synthetic_color.clone()
        } else {
            match mode {
                ColorMode::ByItem => {
                    item_idx += 1;
                    theme.palette_color(item_idx - 1).to_string()
                }
                ColorMode::ByLayer => layers
                    .get(&node.id)
                    .and_then(|layer| layer_colors.get(layer))
                    .cloned()
                    .unwrap_or_else(|| theme.palette_color(0).to_string()),
            }
        };
        node_colors.insert(node.id.clone(), color);
    }

    ColorAssignment {
        layers: layer_colors,
        nodes: node_colors,
    }
}

/// Horizontal anchors for a link: leave the source on the side facing the
/// target and enter the target on the side facing the source.
fn anchors(source: &NodeBox, target: &NodeBox) -> (f32, f32) {
    if target.x >= source.x {
        (source.right(), target.left())
    } else {
        (source.left(), target.right())
    }
}

fn ribbon_outline(
    start_x: f32,
    end_x: f32,
    geometry: &RibbonGeometry,
    curvature: f32,
) -> (CubicSegment, CubicSegment) {
    let dx = (end_x - start_x) * curvature;
    let (c1x, c2x) = (start_x + dx, end_x - dx);
    let top = CubicSegment {
        from: (start_x, geometry.source_top),
        ctrl1: (c1x, geometry.source_top),
        ctrl2: (c2x, geometry.target_top),
        to: (end_x, geometry.target_top),
    };
    let bottom = CubicSegment {
        from: (end_x, geometry.target_bottom),
        ctrl1: (c2x, geometry.target_bottom),
        ctrl2: (c1x, geometry.source_bottom),
        to: (start_x, geometry.source_bottom),
    };
    (top, bottom)
}

pub fn build_scene(layout: &SankeyLayout, theme: &Theme, render: &RenderConfig) -> Scene {
    let colors = assign_colors(&layout.nodes, &layout.layers, render.color_mode, theme);
    let color_of = |id: &str| {
        colors
            .nodes
            .get(id)
            .cloned()
            .unwrap_or_else(|| theme.palette_color(0).to_string())
    };

    let mut links = Vec::with_capacity(layout.links.len());
    let mut degraded = 0usize;
    for (idx, link) in layout.links.iter().enumerate() {
        let (Some(source), Some(target)) =
            (layout.boxes.get(&link.source), layout.boxes.get(&link.target))
        else {
            continue;
        };
        let (start_x, end_x) = anchors(source, target);
        // Stacking yields geometry for every link with two boxes, so strokes
        // only appear for zero-width bands or a hand-built layout.
        match layout
            .ribbons
            .get(idx)
            .copied()
            .flatten()
            .filter(RibbonGeometry::has_area)
        {
            Some(geometry) => {
                let (top, bottom) = ribbon_outline(start_x, end_x, &geometry, layout.curvature);
                links.push(SceneLink::Ribbon(RibbonOutline {
                    link: idx,
                    top,
                    bottom,
                    gradient: Gradient {
                        id: format!("g{idx}"),
                        start: (start_x, source.y),
                        end: (end_x, target.y),
                        start_color: color_of(&link.source),
                        end_color: color_of(&link.target),
                    },
                    opacity: render.ribbon_opacity,
                }));
            }
            None => {
                degraded += 1;
                let dx = (end_x - start_x) * layout.curvature;
                links.push(SceneLink::Stroke(StrokeCurve {
                    link: idx,
                    curve: CubicSegment {
                        from: (start_x, source.y),
                        ctrl1: (start_x + dx, source.y),
                        ctrl2: (end_x - dx, target.y),
                        to: (end_x, target.y),
                    },
                    width: link.value.max(0.0).sqrt().max(1.0),
                    color: theme.fallback_stroke.clone(),
                    opacity: FALLBACK_OPACITY,
                }));
            }
        }
    }
    if degraded > 0 {
        tracing::warn!(links = degraded, "drawing links without a stacked band as plain strokes");
    }

    let last_layer = layout.layer_count().saturating_sub(1);
    let mut nodes = Vec::with_capacity(layout.nodes.len());
    let mut labels = Vec::new();
    for node in &layout.nodes {
        let Some(node_box) = layout.boxes.get(&node.id) else {
            continue;
        };
        let color = color_of(&node.id);
        let label = (!node.synthetic).then(|| node.display_label().to_string());
        let (fill, stroke) = if node.synthetic {
            (theme.synthetic_fill.clone(), theme.synthetic_stroke.clone())
        } else {
            (color.clone(), theme.node_stroke.clone())
        };
        nodes.push(SceneNode {
            id: node.id.clone(),
            x: node_box.left(),
            y: node_box.top(),
            width: node_box.width,
            height: node_box.height,
            synthetic: node.synthetic,
            label: label.clone(),
            color,
            fill,
            stroke,
            corner_radius: if node.synthetic { 0.0 } else { 3.0 },
            dashed: node.synthetic,
        });

        if let Some(text) = label {
            let in_last_layer =
                last_layer > 0 && layout.layers.get(&node.id).copied() == Some(last_layer);
            let (x, anchor) = if in_last_layer {
                (node_box.left() - LABEL_GAP, TextAnchor::End)
            } else {
                (node_box.right() + LABEL_GAP, TextAnchor::Start)
            };
            labels.push(SceneLabel {
                x,
                y: node_box.y + LABEL_BASELINE_SHIFT,
                text,
                anchor,
            });
        }
    }

    let legend = render
        .show_legend
        .then(|| build_legend(layout, &colors, theme, render));

    Scene {
        width: layout.width,
        height: layout.height,
        background: theme.background.clone(),
        font_family: theme.font_family.clone(),
        font_size: theme.font_size,
        text_color: theme.text_color.clone(),
        nodes,
        links,
        labels,
        legend,
    }
}

fn build_legend(
    layout: &SankeyLayout,
    colors: &ColorAssignment,
    theme: &Theme,
    render: &RenderConfig,
) -> Legend {
    let entries = match render.color_mode {
        ColorMode::ByItem => layout
            .nodes
            .iter()
            .filter(|node| !node.synthetic)
            .take(render.legend_items)
            .map(|node| LegendEntry {
                color: colors
                    .nodes
                    .get(&node.id)
                    .cloned()
                    .unwrap_or_else(|| theme.palette_color(0).to_string()),
                label: node.display_label().to_string(),
            })
            .collect(),
        ColorMode::ByLayer => colors
            .layers
            .iter()
            .map(|(layer, color)| LegendEntry {
                color: color.clone(),
                label: layout
                    .segments
                    .as_ref()
                    .and_then(|names| names.get(*layer))
                    .cloned()
                    .unwrap_or_else(|| format!("Segment {layer}")),
            })
            .collect(),
    };

    Legend {
        x: layout.width - LEGEND_OFFSET_X,
        y: LEGEND_TOP,
        title: theme.legend_title.clone(),
        row_height: LEGEND_ROW,
        entries,
    }
}
