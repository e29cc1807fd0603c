use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(value: f32) -> Self {
        Self::rgb(value, value, value)
    }

    pub fn to_hex(self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02X}{:02X}{:02X}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

/// Which palette a run uses. Anything other than `"dark"` selects light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    /// Prefix used in template names, e.g. `"Dark mode / Note"`.
    pub fn template_prefix(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
        }
    }

    /// Suffix used in the library page name.
    pub fn page_suffix(self) -> &'static str {
        match self {
            Self::Light => "Light Mode",
            Self::Dark => "Dark Mode",
        }
    }
}

impl From<String> for ThemeMode {
    fn from(value: String) -> Self {
        ThemeMode::from(value.as_str())
    }
}

impl From<Option<String>> for ThemeMode {
    fn from(value: Option<String>) -> Self {
        value.map(ThemeMode::from).unwrap_or_default()
    }
}

impl From<&str> for ThemeMode {
    fn from(value: &str) -> Self {
        if value == "dark" {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }
}

impl From<ThemeMode> for String {
    fn from(value: ThemeMode) -> Self {
        match value {
            ThemeMode::Light => "light".to_string(),
            ThemeMode::Dark => "dark".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub mode: ThemeMode,
    pub font_family: String,
    pub frame_background: Color,
    pub column_background: Color,
    pub text: Color,
    pub text_strong: Color,
    pub border: Color,
    pub shape_fill: Color,
    pub shape_stroke: Color,
    pub step_number: Color,
}

impl Theme {
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            font_family: "Inter".to_string(),
            frame_background: Color::gray(1.0),
            column_background: Color::gray(0.961),
            text: Color::gray(0.118),
            text_strong: Color::gray(0.192),
            border: Color::gray(0.46),
            shape_fill: Color::gray(1.0),
            shape_stroke: Color::gray(0.459),
            step_number: Color::gray(0.58),
        }
    }

    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            font_family: "Inter".to_string(),
            frame_background: Color::gray(0.2),
            column_background: Color::gray(0.15),
            text: Color::gray(0.953),
            text_strong: Color::gray(1.0),
            border: Color::gray(0.46),
            shape_fill: Color::gray(0.173),
            shape_stroke: Color::gray(1.0),
            step_number: Color::rgb(0.604, 0.706, 0.718),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_dark_selects_dark_palette() {
        assert_eq!(ThemeMode::from("dark"), ThemeMode::Dark);
        assert_eq!(ThemeMode::from("light"), ThemeMode::Light);
        assert_eq!(ThemeMode::from("Dark"), ThemeMode::Light);
        assert_eq!(ThemeMode::from(""), ThemeMode::Light);
    }

    #[test]
    fn hex_conversion_clamps_channels() {
        assert_eq!(Color::gray(1.0).to_hex(), "#FFFFFF");
        assert_eq!(Color::rgb(0.0, 0.5, 2.0).to_hex(), "#0080FF");
        assert_eq!(Theme::light().shape_stroke.to_hex(), "#757575");
    }
}
