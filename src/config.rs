use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixed measurements of the generated diagram. All values are in document
/// units (pixels at 100% zoom).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub frame_width: f32,
    pub frame_min_height: f32,
    pub step_base_height: f32,
    pub step_height: f32,
    pub placeholder_step_count: usize,
    pub header_height: f32,
    pub header_rule_y: f32,
    pub title_x: f32,
    pub title_y: f32,
    pub left_column_width: f32,
    pub right_column_width: f32,
    pub center_column_x: f32,
    pub center_column_width: f32,
    pub content_padding: f32,
    pub metadata_width: f32,
    pub metadata_section_spacing: f32,
    pub metadata_title_spacing: f32,
    pub note_gap: f32,
    pub flow_start_y: f32,
    pub connector_length: f32,
    pub sticker: StickerConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            frame_width: 1920.0,
            frame_min_height: 1090.0,
            step_base_height: 200.0,
            step_height: 100.0,
            placeholder_step_count: 3,
            header_height: 56.0,
            header_rule_y: 48.0,
            title_x: 16.0,
            title_y: 17.0,
            left_column_width: 360.0,
            right_column_width: 360.0,
            center_column_x: 360.0,
            center_column_width: 1200.0,
            content_padding: 16.0,
            metadata_width: 328.0,
            metadata_section_spacing: 36.0,
            metadata_title_spacing: 4.0,
            note_gap: 24.0,
            flow_start_y: 120.0,
            connector_length: 32.0,
            sticker: StickerConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Horizontal midpoint of the center column, relative to the frame.
    pub fn center_x(&self) -> f32 {
        self.center_column_x + self.center_column_width / 2.0
    }

    /// Left edge of the notes panel, relative to the frame.
    pub fn right_column_x(&self) -> f32 {
        self.frame_width - self.right_column_width
    }

    /// Top of the content area below the header, padding included.
    pub fn content_top(&self) -> f32 {
        self.header_height + self.content_padding
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickerConfig {
    pub offset: f32,
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub subtitle_y: f32,
    pub first_shape_y: f32,
    pub shape_gap: f32,
    pub label_x: f32,
    pub text_width: f32,
}

impl Default for StickerConfig {
    fn default() -> Self {
        Self {
            offset: 450.0,
            width: 400.0,
            height: 960.0,
            margin: 20.0,
            subtitle_y: 50.0,
            first_shape_y: 90.0,
            shape_gap: 30.0,
            label_x: 140.0,
            text_width: 360.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 2400.0,
            height: 1200.0,
            padding: 40.0,
            background: "#E5E5E5".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    /// Skip system font lookup and use the built-in width table.
    pub fast_text_metrics: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    fast_text: Option<bool>,
    layout: Option<LayoutConfigFile>,
    sticker: Option<StickerConfigFile>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    frame_width: Option<f32>,
    frame_min_height: Option<f32>,
    step_base_height: Option<f32>,
    step_height: Option<f32>,
    header_height: Option<f32>,
    left_column_width: Option<f32>,
    right_column_width: Option<f32>,
    center_column_x: Option<f32>,
    center_column_width: Option<f32>,
    content_padding: Option<f32>,
    metadata_width: Option<f32>,
    metadata_section_spacing: Option<f32>,
    note_gap: Option<f32>,
    flow_start_y: Option<f32>,
    connector_length: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StickerConfigFile {
    offset: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
    shape_gap: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    padding: Option<f32>,
    background: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(v) = parsed.fast_text {
        config.fast_text_metrics = v;
    }

    if let Some(file) = parsed.layout {
        let layout = &mut config.layout;
        if let Some(v) = file.frame_width {
            layout.frame_width = v;
        }
        if let Some(v) = file.frame_min_height {
            layout.frame_min_height = v;
        }
        if let Some(v) = file.step_base_height {
            layout.step_base_height = v;
        }
        if let Some(v) = file.step_height {
            layout.step_height = v;
        }
        if let Some(v) = file.header_height {
            layout.header_height = v;
        }
        if let Some(v) = file.left_column_width {
            layout.left_column_width = v;
        }
        if let Some(v) = file.right_column_width {
            layout.right_column_width = v;
        }
        if let Some(v) = file.center_column_x {
            layout.center_column_x = v;
        }
        if let Some(v) = file.center_column_width {
            layout.center_column_width = v;
        }
        if let Some(v) = file.content_padding {
            layout.content_padding = v;
        }
        if let Some(v) = file.metadata_width {
            layout.metadata_width = v;
        }
        if let Some(v) = file.metadata_section_spacing {
            layout.metadata_section_spacing = v;
        }
        if let Some(v) = file.note_gap {
            layout.note_gap = v;
        }
        if let Some(v) = file.flow_start_y {
            layout.flow_start_y = v;
        }
        if let Some(v) = file.connector_length {
            layout.connector_length = v;
        }
    }

    if let Some(file) = parsed.sticker {
        let sticker = &mut config.layout.sticker;
        if let Some(v) = file.offset {
            sticker.offset = v;
        }
        if let Some(v) = file.width {
            sticker.width = v;
        }
        if let Some(v) = file.height {
            sticker.height = v;
        }
        if let Some(v) = file.shape_gap {
            sticker.shape_gap = v;
        }
    }

    if let Some(file) = parsed.render {
        if let Some(v) = file.width {
            config.render.width = v;
        }
        if let Some(v) = file.height {
            config.render.height = v;
        }
        if let Some(v) = file.padding {
            config.render.padding = v;
        }
        if let Some(v) = file.background {
            config.render.background = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_diagram_geometry() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.center_x(), 960.0);
        assert_eq!(layout.right_column_x(), 1560.0);
        assert_eq!(layout.content_top(), 72.0);
        assert_eq!(
            layout.left_column_width + layout.center_column_width + layout.right_column_width,
            layout.frame_width
        );
    }

    #[test]
    fn config_file_overrides_selected_fields() {
        let config = parse_config(
            r##"{"fastText": true, "layout": {"noteGap": 30, "frameMinHeight": 800},
                "sticker": {"offset": 500}, "render": {"background": "#000000"}}"##,
        )
        .expect("config parse failed");
        assert!(config.fast_text_metrics);
        assert_eq!(config.layout.note_gap, 30.0);
        assert_eq!(config.layout.frame_min_height, 800.0);
        assert_eq!(config.layout.sticker.offset, 500.0);
        assert_eq!(config.layout.frame_width, 1920.0);
        assert_eq!(config.render.background, "#000000");
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).expect("defaults");
        assert!(!config.fast_text_metrics);
        assert_eq!(config.layout.step_height, 100.0);
    }
}
