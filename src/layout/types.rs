use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::ir::{Link, Node};

pub type LayerMap = HashMap<String, usize>;

/// Node ids per occupied layer, keyed by layer index. Layers without nodes
/// have no entry.
pub type LayerGroups = BTreeMap<usize, Vec<String>>;

/// Node box, positioned by its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeBox {
    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Vertical band a link occupies on the boundary of its source and target
/// boxes, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RibbonGeometry {
    pub source_top: f32,
    pub source_bottom: f32,
    pub target_top: f32,
    pub target_bottom: f32,
    /// Value times the mean of the source and target scales. This is the
    /// nominal width only: a side may be narrower, and the bound that
    /// outgoing ribbons fit within `height * link_width_factor` holds for the
    /// stacked extents, not for this field.
    pub thickness: f32,
}

impl RibbonGeometry {
    pub fn source_extent(&self) -> f32 {
        self.source_bottom - self.source_top
    }

    pub fn target_extent(&self) -> f32 {
        self.target_bottom - self.target_top
    }

    /// False when neither side has a positive, finite band to fill.
    pub fn has_area(&self) -> bool {
        let source = self.source_extent();
        let target = self.target_extent();
        source.is_finite() && target.is_finite() && (source > 0.0 || target > 0.0)
    }
}

#[derive(Debug, Clone)]
pub struct SankeyLayout {
    pub width: f32,
    pub height: f32,
    pub node_width: f32,
    pub curvature: f32,
    /// Input nodes annotated with their resolved layer, followed by the
    /// synthetic nodes inserted by the splitter.
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub segments: Option<Vec<String>>,
    pub layers: LayerMap,
    pub values: HashMap<String, f32>,
    pub ordering: LayerGroups,
    pub boxes: HashMap<String, NodeBox>,
    /// Indexed like `links`; `None` when a link could not be stacked.
    pub ribbons: Vec<Option<RibbonGeometry>>,
}

impl SankeyLayout {
    /// Number of layer columns, counting empty ones between occupied layers.
    pub fn layer_count(&self) -> usize {
        self.ordering
            .keys()
            .next_back()
            .map_or(0, |last| last.saturating_add(1))
    }

    pub fn synthetic_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.synthetic).count()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }
}
