use crate::theme::Theme;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(#[0-9a-fA-F]{3}|#[0-9a-fA-F]{4}|#[0-9a-fA-F]{6}|#[0-9a-fA-F]{8}|(rgb|rgba|hsl|hsla)\([0-9.,%\s]+\)|[a-zA-Z]+)$",
    )
    .unwrap()
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Syntax(#[from] json5::Error),
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field}: unrecognized color {value:?}")]
    BadColor { field: &'static str, value: String },
    #[error("unknown theme {0:?}")]
    UnknownTheme(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    #[default]
    #[serde(rename = "per_segment", alias = "by-layer", alias = "byLayer")]
    ByLayer,
    #[serde(rename = "per_item", alias = "by-item", alias = "byItem")]
    ByItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub node_width: f32,
    pub node_padding: f32,
    pub min_node_height: f32,
    pub layer_fill: f32,
    pub iterations: usize,
    pub link_width_factor: f32,
    pub min_link_thickness: f32,
    pub center_stacks: bool,
    pub curvature: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
            margin: 20.0,
            node_width: 20.0,
            node_padding: 8.0,
            min_node_height: 6.0,
            layer_fill: 0.6,
            iterations: 2,
            link_width_factor: 1.0,
            min_link_thickness: 1.0,
            center_stacks: true,
            curvature: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub color_mode: ColorMode,
    pub show_legend: bool,
    pub legend_items: usize,
    pub ribbon_opacity: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::ByLayer,
            show_legend: true,
            legend_items: 10,
            ribbon_opacity: 0.95,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}


#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    text_color: Option<String>,
    background: Option<String>,
    palette: Option<Vec<String>>,
    node_stroke: Option<String>,
    synthetic_color: Option<String>,
    synthetic_fill: Option<String>,
    synthetic_stroke: Option<String>,
    fallback_stroke: Option<String>,
    legend_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    margin: Option<f32>,
    node_width: Option<f32>,
    node_padding: Option<f32>,
    min_node_height: Option<f32>,
    layer_fill: Option<f32>,
    iterations: Option<usize>,
    link_width_factor: Option<f32>,
    min_link_thickness: Option<f32>,
    center_stacks: Option<bool>,
    curvature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    color_mode: Option<ColorMode>,
    show_legend: Option<bool>,
    legend_items: Option<usize>,
    ribbon_opacity: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_config(&contents)?)
}

pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme =
            Theme::by_name(theme_name).ok_or_else(|| ConfigError::UnknownTheme(theme_name.into()))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = positive("fontSize", v)?;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = color("textColor", v)?;
        }
        if let Some(v) = vars.background {
            config.theme.background = color("background", v)?;
        }
        if let Some(values) = vars.palette {
            config.theme.palette = values
                .into_iter()
                .map(|v| color("palette", v))
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = vars.node_stroke {
            config.theme.node_stroke = color("nodeStroke", v)?;
        }
        if let Some(v) = vars.synthetic_color {
            config.theme.synthetic_color = color("syntheticColor", v)?;
        }
        if let Some(v) = vars.synthetic_fill {
            config.theme.synthetic_fill = color("syntheticFill", v)?;
        }
        if let Some(v) = vars.synthetic_stroke {
            config.theme.synthetic_stroke = color("syntheticStroke", v)?;
        }
        if let Some(v) = vars.fallback_stroke {
            config.theme.fallback_stroke = color("fallbackStroke", v)?;
        }
        if let Some(v) = vars.legend_title {
            config.theme.legend_title = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.width {
            target.width = positive("width", v)?;
        }
        if let Some(v) = layout.height {
            target.height = positive("height", v)?;
        }
        if let Some(v) = layout.margin {
            target.margin = v.max(0.0);
        }
        if let Some(v) = layout.node_width {
            target.node_width = positive("nodeWidth", v)?;
        }
        if let Some(v) = layout.node_padding {
            target.node_padding = v.max(0.0);
        }
        if let Some(v) = layout.min_node_height {
            target.min_node_height = v.max(0.0);
        }
        if let Some(v) = layout.layer_fill {
            target.layer_fill = in_range("layerFill", v, 0.0, 1.0)?;
        }
        if let Some(v) = layout.iterations {
            target.iterations = v;
        }
        if let Some(v) = layout.link_width_factor {
            target.link_width_factor = in_range("linkWidthFactor", v, 0.0, 1.0)?;
        }
        if let Some(v) = layout.min_link_thickness {
            target.min_link_thickness = v.max(0.0);
        }
        if let Some(v) = layout.center_stacks {
            target.center_stacks = v;
        }
        if let Some(v) = layout.curvature {
            target.curvature = in_range("curvature", v, 0.0, 1.0)?;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.color_mode {
            config.render.color_mode = v;
        }
        if let Some(v) = render.show_legend {
            config.render.show_legend = v;
        }
        if let Some(v) = render.legend_items {
            config.render.legend_items = v;
        }
        if let Some(v) = render.ribbon_opacity {
            config.render.ribbon_opacity = in_range("ribbonOpacity", v, 0.0, 1.0)?;
        }
    }

    Ok(config)
}

fn positive(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<f32, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

fn color(field: &'static str, value: String) -> Result<String, ConfigError> {
    if COLOR_RE.is_match(value.trim()) {
        Ok(value)
    } else {
        Err(ConfigError::BadColor { field, value })
    }
}
