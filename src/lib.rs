pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod scene;
pub mod theme;

pub use config::{ColorMode, Config, ConfigError, LayoutConfig, RenderConfig, load_config, parse_config};
pub use ir::{LayerHint, Link, Node, SankeyGraph};
pub use layout::{SankeyLayout, compute_layout};
#[cfg(feature = "png")]
pub use render::render_png;
pub use render::render_svg;
pub use scene::{Scene, build_scene};
pub use theme::Theme;

/// Runs the layout pipeline and builds the drawable scene.
pub fn render_scene(graph: &SankeyGraph, config: &Config) -> Scene {
    let layout = compute_layout(graph, &config.layout);
    build_scene(&layout, &config.theme, &config.render)
}

pub fn render_with_options(graph: &SankeyGraph, config: &Config) -> String {
    render_svg(&render_scene(graph, config))
}

pub fn render(graph: &SankeyGraph) -> String {
    render_with_options(graph, &Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_defaults_produce_svg() {
        let mut graph = SankeyGraph::new();
        graph
            .push_node(Node::new("A").with_layer(0))
            .push_node(Node::new("B").with_layer(1))
            .push_link(Link::new("A", "B", 3.0));
        let svg = render(&graph);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">A</text>"));
        assert!(svg.contains(">B</text>"));
    }

    #[test]
    fn options_reach_the_output() {
        let config = parse_config(
            r##"{ layout: { width: 640, height: 320 }, themeVariables: { background: "#000000" } }"##,
        )
        .expect("config");
        let graph: SankeyGraph = serde_json::from_str(
            r#"{"nodes": [{"id": "A"}, {"id": "B"}], "links": [{"source": "A", "target": "B", "value": 1}]}"#,
        )
        .expect("graph");
        let svg = render_with_options(&graph, &config);
        assert!(svg.contains("viewBox=\"0 0 640 320\""));
        assert!(svg.contains("fill=\"#000000\""));
    }
}
