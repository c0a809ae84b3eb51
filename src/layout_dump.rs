use crate::layout::{LayerGroups, SankeyLayout};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub layer_count: usize,
    pub ordering: LayerGroups,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub layer: Option<usize>,
    pub synthetic: bool,
    pub value: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub source: String,
    pub target: String,
    pub value: f32,
    pub thickness: Option<f32>,
    pub source_offsets: Option<[f32; 2]>,
    pub target_offsets: Option<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &SankeyLayout) -> Self {
        // Nodes without a box (none in practice) are left out.
        let nodes = layout
            .nodes
            .iter()
            .filter_map(|node| {
                let node_box = layout.boxes.get(&node.id)?;
                Some(NodeDump {
                    id: node.id.clone(),
                    layer: layout.layers.get(&node.id).copied(),
                    synthetic: node.synthetic,
                    value: layout.values.get(&node.id).copied().unwrap_or(0.0),
                    x: node_box.left(),
                    y: node_box.top(),
                    width: node_box.width,
                    height: node_box.height,
                })
            })
            .collect();

        let links = layout
            .links
            .iter()
            .enumerate()
            .map(|(idx, link)| {
                let ribbon = layout.ribbons.get(idx).copied().flatten();
                LinkDump {
                    source: link.source.clone(),
                    target: link.target.clone(),
                    value: link.value,
                    thickness: ribbon.map(|r| r.thickness),
                    source_offsets: ribbon.map(|r| [r.source_top, r.source_bottom]),
                    target_offsets: ribbon.map(|r| [r.target_top, r.target_bottom]),
                }
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            layer_count: layout.layer_count(),
            ordering: layout.ordering.clone(),
            nodes,
            links,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn write_layout_dump(path: &Path, layout: &SankeyLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
