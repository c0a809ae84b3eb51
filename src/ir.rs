use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque per-link key/value pairs. Never interpreted by the layout.
pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerHint {
    Index(i64),
    Segment(String),
}

impl LayerHint {
    /// Resolves the hint to an integer layer. Segment names are looked up in
    /// `segments`; an absent list or unknown name yields `None`.
    pub fn resolve(&self, segments: Option<&[String]>) -> Option<i64> {
        match self {
            LayerHint::Index(idx) => Some(*idx),
            LayerHint::Segment(name) => segments?
                .iter()
                .position(|segment| segment == name)
                .map(|idx| idx as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, rename = "segment", skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    #[serde(default, rename = "dummy")]
    pub synthetic: bool,
    #[serde(default, rename = "orig_link_index", skip_serializing_if = "Option::is_none")]
    pub origin_link: Option<usize>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            layer: None,
            value: None,
            synthetic: false,
            origin_link: None,
        }
    }

    pub fn with_layer(mut self, layer: i64) -> Self {
        self.layer = Some(LayerHint::Index(layer));
        self
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.layer = Some(LayerHint::Segment(segment.into()));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = Some(value);
        self
    }

    pub(crate) fn synthetic(id: String, layer: i64, origin_link: usize) -> Self {
        Self {
            id,
            label: None,
            layer: Some(LayerHint::Index(layer)),
            value: None,
            synthetic: true,
            origin_link: Some(origin_link),
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub value: f32,
    #[serde(flatten)]
    pub metadata: Metadata,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
            metadata: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Same value and metadata, new endpoints.
    pub(crate) fn rewired(&self, source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            value: self.value,
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SankeyGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<String>>,
}

impl SankeyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment_names(&self) -> Option<&[String]> {
        self.segments.as_deref()
    }

    pub fn push_node(&mut self, node: Node) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn push_link(&mut self, link: Link) -> &mut Self {
        self.links.push(link);
        self
    }
}
