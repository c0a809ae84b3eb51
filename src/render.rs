use crate::scene::{CubicSegment, Legend, RibbonOutline, Scene, SceneLink, StrokeCurve, TextAnchor};
#[cfg(feature = "png")]
use crate::theme::Theme;
#[cfg(feature = "png")]
use anyhow::Result;

pub fn render_svg(scene: &Scene) -> String {
    let mut svg = String::new();
    let width = scene.width;
    let height = scene.height;

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));

    svg.push_str("<defs>");
    for link in &scene.links {
        if let SceneLink::Ribbon(ribbon) = link {
            let gradient = &ribbon.gradient;
            svg.push_str(&format!(
                "<linearGradient id=\"{}\" gradientUnits=\"userSpaceOnUse\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\">",
                gradient.id, gradient.start.0, gradient.start.1, gradient.end.0, gradient.end.1
            ));
            svg.push_str(&format!(
                "<stop offset=\"0%\" stop-color=\"{}\" stop-opacity=\"{}\"/>",
                escape_xml(&gradient.start_color),
                ribbon.opacity
            ));
            svg.push_str(&format!(
                "<stop offset=\"100%\" stop-color=\"{}\" stop-opacity=\"{}\"/>",
                escape_xml(&gradient.end_color),
                ribbon.opacity
            ));
            svg.push_str("</linearGradient>");
        }
    }
    svg.push_str("</defs>");

    svg.push_str(&format!(
        "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{}\"/>",
        escape_xml(&scene.background)
    ));

    // Links first so node boxes sit on top.
    for link in &scene.links {
        match link {
            SceneLink::Ribbon(ribbon) => svg.push_str(&ribbon_svg(ribbon)),
            SceneLink::Stroke(stroke) => svg.push_str(&stroke_svg(stroke)),
        }
    }

    for node in &scene.nodes {
        let dash = if node.dashed {
            " stroke-dasharray=\"2,2\""
        } else {
            ""
        };
        let radius = if node.corner_radius > 0.0 {
            format!(" rx=\"{}\"", node.corner_radius)
        } else {
            String::new()
        };
        let opacity = if node.synthetic {
            ""
        } else {
            " stroke-opacity=\"0.15\""
        };
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"{radius} fill=\"{}\" stroke=\"{}\"{opacity}{dash}/>",
            node.x,
            node.y,
            node.width,
            node.height,
            escape_xml(&node.fill),
            escape_xml(&node.stroke),
        ));
    }

    for label in &scene.labels {
        let anchor = match label.anchor {
            TextAnchor::Start => "start",
            TextAnchor::End => "end",
        };
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            label.x,
            label.y,
            escape_xml(&scene.font_family),
            scene.font_size,
            escape_xml(&scene.text_color),
            escape_xml(&label.text)
        ));
    }

    if let Some(legend) = &scene.legend {
        svg.push_str(&legend_svg(legend, scene));
    }

    svg.push_str("</svg>");
    svg
}

fn curve_to(segment: &CubicSegment) -> String {
    format!(
        "C {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
        segment.ctrl1.0, segment.ctrl1.1, segment.ctrl2.0, segment.ctrl2.1, segment.to.0, segment.to.1
    )
}

pub fn ribbon_path(ribbon: &RibbonOutline) -> String {
    format!(
        "M {:.2},{:.2} {} L {:.2},{:.2} {} Z",
        ribbon.top.from.0,
        ribbon.top.from.1,
        curve_to(&ribbon.top),
        ribbon.bottom.from.0,
        ribbon.bottom.from.1,
        curve_to(&ribbon.bottom)
    )
}

fn ribbon_svg(ribbon: &RibbonOutline) -> String {
    format!(
        "<path d=\"{}\" fill=\"url(#{})\" stroke=\"none\" opacity=\"{}\"/>",
        ribbon_path(ribbon),
        ribbon.gradient.id,
        ribbon.opacity
    )
}

fn stroke_svg(stroke: &StrokeCurve) -> String {
    format!(
        "<path d=\"M {:.2},{:.2} {}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-opacity=\"{}\"/>",
        stroke.curve.from.0,
        stroke.curve.from.1,
        curve_to(&stroke.curve),
        escape_xml(&stroke.color),
        stroke.width,
        stroke.opacity
    )
}

fn legend_svg(legend: &Legend, scene: &Scene) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<g class=\"legend\" transform=\"translate({},{})\">",
        legend.x, legend.y
    ));
    out.push_str(&format!(
        "<text x=\"0\" y=\"0\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        escape_xml(&scene.font_family),
        scene.font_size + 1.0,
        escape_xml(&scene.text_color),
        escape_xml(&legend.title)
    ));
    let mut y = legend.row_height;
    for entry in &legend.entries {
        out.push_str(&format!(
            "<rect x=\"0\" y=\"{}\" width=\"14\" height=\"12\" fill=\"{}\" stroke=\"#444\" stroke-opacity=\"0.2\"/>",
            y - 12.0,
            escape_xml(&entry.color)
        ));
        out.push_str(&format!(
            "<text x=\"22\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            y - 2.0,
            escape_xml(&scene.font_family),
            scene.font_size,
            escape_xml(&scene.text_color),
            escape_xml(&entry.label)
        ));
        y += legend.row_height;
    }
    out.push_str("</g>");
    out
}

#[cfg(feature = "png")]
pub fn render_png(svg: &str, theme: &Theme) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.font_family = primary_font_family(&theme.font_family);
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    Ok(pixmap.encode_png()?)
}

#[cfg(feature = "png")]
fn primary_font_family(stack: &str) -> String {
    stack
        .split(',')
        .map(|family| family.trim().trim_matches('"').trim_matches('\''))
        .find(|family| !family.is_empty())
        .unwrap_or("sans-serif")
        .to_string()
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, RenderConfig};
    use crate::ir::{Link, Node, SankeyGraph};
    use crate::layout::compute_layout;
    use crate::scene::build_scene;
    use crate::theme::Theme;

    fn scene(render: &RenderConfig) -> Scene {
        let graph = SankeyGraph {
            nodes: vec![
                Node::new("A").with_layer(0).with_label("R&D <core>"),
                Node::new("B").with_layer(2),
            ],
            links: vec![Link::new("A", "B", 5.0)],
            segments: None,
        };
        let layout = compute_layout(&graph, &LayoutConfig::default());
        build_scene(&layout, &Theme::classic(), render)
    }

    #[test]
    fn render_svg_basic() {
        let svg = render_svg(&scene(&RenderConfig::default()));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("viewBox=\"0 0 1000 600\""));
        assert_eq!(svg.matches("<linearGradient").count(), 2);
        assert_eq!(svg.matches("fill=\"url(#g").count(), 2);
        assert!(svg.contains("stroke-dasharray=\"2,2\""));
        assert!(svg.contains("R&amp;D &lt;core&gt;"));
        assert!(svg.contains("class=\"legend\""));
        assert!(svg.contains("Segment 1"));
    }

    #[test]
    fn legend_is_optional() {
        let render = RenderConfig {
            show_legend: false,
            ..RenderConfig::default()
        };
        let svg = render_svg(&scene(&render));
        assert!(!svg.contains("class=\"legend\""));
    }

    #[test]
    fn ribbon_path_is_closed() {
        let scene = scene(&RenderConfig::default());
        let SceneLink::Ribbon(ribbon) = &scene.links[0] else {
            panic!("expected ribbon");
        };
        let d = ribbon_path(ribbon);
        assert!(d.starts_with("M "));
        assert_eq!(d.matches(" C ").count(), 2);
        assert!(d.ends_with(" Z"));
    }

    #[test]
    fn fallback_strokes_render_as_open_paths() {
        let mut scene = scene(&RenderConfig::default());
        let SceneLink::Ribbon(ribbon) = scene.links[0].clone() else {
            panic!("expected ribbon");
        };
        scene.links[0] = SceneLink::Stroke(StrokeCurve {
            link: ribbon.link,
            curve: ribbon.top,
            width: 2.0,
            color: "#888888".to_string(),
            opacity: 0.5,
        });
        let svg = render_svg(&scene);
        assert!(svg.contains("fill=\"none\" stroke=\"#888888\" stroke-width=\"2.00\""));
        assert_eq!(svg.matches("<linearGradient").count(), 1);
    }

    #[cfg(feature = "png")]
    #[test]
    fn font_stack_picks_first_family() {
        assert_eq!(primary_font_family("\"Inter\", sans-serif"), "Inter");
        assert_eq!(primary_font_family(""), "sans-serif");
    }
}
