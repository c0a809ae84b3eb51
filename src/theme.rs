use serde::{Deserialize, Serialize};

const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const TABLEAU10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub background: String,
    pub palette: Vec<String>,
    pub node_stroke: String,
    pub synthetic_color: String,
    pub synthetic_fill: String,
    pub synthetic_stroke: String,
    pub fallback_stroke: String,
    pub legend_title: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 12.0,
            text_color: "#111111".to_string(),
            background: "#FFFFFF".to_string(),
            palette: CATEGORY10.iter().map(|c| c.to_string()).collect(),
            node_stroke: "#222222".to_string(),
            synthetic_color: "#cccccc".to_string(),
            synthetic_fill: "#efefef".to_string(),
            synthetic_stroke: "#bbbbbb".to_string(),
            fallback_stroke: "#888888".to_string(),
            legend_title: "Segments / Items".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#1C2430".to_string(),
            background: "#FFFFFF".to_string(),
            palette: TABLEAU10.iter().map(|c| c.to_string()).collect(),
            node_stroke: "#7A8AA6".to_string(),
            synthetic_color: "#D7E0F0".to_string(),
            synthetic_fill: "#F7FAFF".to_string(),
            synthetic_stroke: "#C7D2E5".to_string(),
            fallback_stroke: "#7A8AA6".to_string(),
            legend_title: "Segments / Items".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "classic" | "default" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }

    /// Palette entry for `idx`, wrapping around. Falls back to the synthetic
    /// color when the palette is empty.
    pub fn palette_color(&self, idx: usize) -> &str {
        if self.palette.is_empty() {
            return &self.synthetic_color;
        }
        &self.palette[idx % self.palette.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
