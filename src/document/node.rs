use serde::{Deserialize, Serialize};

use crate::text_metrics::AUTO_LINE_HEIGHT;
use crate::theme::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parent {
    Page(PageId),
    Node(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: &str, style: &str) -> Self {
        Self {
            family: family.to_string(),
            style: style.to_string(),
        }
    }

    pub fn inter_regular() -> Self {
        Self::new("Inter", "Regular")
    }

    pub fn inter_bold() -> Self {
        Self::new("Inter", "Bold")
    }

    pub fn is_bold(&self) -> bool {
        self.style.contains("Bold")
    }
}

impl std::fmt::Display for FontName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub color: Color,
    pub opacity: f32,
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeAlign {
    Inside,
    #[default]
    Center,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeCap {
    #[default]
    None,
    ArrowEquilateral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sizing {
    Fixed,
    #[default]
    Hug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    #[default]
    Min,
    Center,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Padding {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }
}

/// Auto-layout rules of a container. Children are stacked along `direction`
/// (the primary axis); the other axis is the counter axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoLayout {
    pub direction: Direction,
    pub padding: Padding,
    pub item_spacing: f32,
    pub primary_sizing: Sizing,
    pub counter_sizing: Sizing,
    pub primary_align: Align,
    pub counter_align: Align,
}

impl AutoLayout {
    pub fn horizontal() -> Self {
        Self {
            direction: Direction::Horizontal,
            ..Self::default()
        }
    }

    pub fn vertical() -> Self {
        Self {
            direction: Direction::Vertical,
            ..Self::default()
        }
    }

    pub fn spacing(mut self, spacing: f32) -> Self {
        self.item_spacing = spacing;
        self
    }

    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn sizing(mut self, primary: Sizing, counter: Sizing) -> Self {
        self.primary_sizing = primary;
        self.counter_sizing = counter;
        self
    }

    pub fn align(mut self, primary: Align, counter: Align) -> Self {
        self.primary_align = primary;
        self.counter_align = counter;
        self
    }

    pub fn is_horizontal(&self) -> bool {
        self.direction == Direction::Horizontal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutAlign {
    #[default]
    Inherit,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Constraint {
    #[default]
    Min,
    Max,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub horizontal: Constraint,
    pub vertical: Constraint,
}

impl Constraints {
    pub fn new(horizontal: Constraint, vertical: Constraint) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAutoResize {
    #[default]
    WidthAndHeight,
    Height,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LineHeight {
    #[default]
    Auto,
    Percent(f32),
}

impl LineHeight {
    pub fn resolve(self, font_size: f32) -> f32 {
        match self {
            LineHeight::Auto => font_size * AUTO_LINE_HEIGHT,
            LineHeight::Percent(value) => font_size * value / 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextProps {
    pub characters: String,
    pub font: FontName,
    pub font_size: f32,
    pub align_horizontal: TextAlign,
    pub align_vertical: VerticalAlign,
    pub auto_resize: TextAutoResize,
    pub line_height: LineHeight,
    /// Lines after wrapping, refreshed on every layout pass.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorVertex {
    pub x: f32,
    pub y: f32,
    pub stroke_cap: StrokeCap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorGeometry {
    /// SVG-style path data in node-local coordinates.
    Path(String),
    /// Vertices joined by straight segments; caps are per vertex.
    Network {
        vertices: Vec<VectorVertex>,
        segments: Vec<(usize, usize)>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorProps {
    pub geometry: VectorGeometry,
    pub stroke_cap: StrokeCap,
    pub stroke_join: StrokeJoin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Frame,
    Component,
    Instance { main_component: NodeId },
    Text(TextProps),
    Rectangle,
    Line,
    Polygon { point_count: u32 },
    Vector(VectorProps),
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Frame => "FRAME",
            NodeKind::Component => "COMPONENT",
            NodeKind::Instance { .. } => "INSTANCE",
            NodeKind::Text(_) => "TEXT",
            NodeKind::Rectangle => "RECTANGLE",
            NodeKind::Line => "LINE",
            NodeKind::Polygon { .. } => "POLYGON",
            NodeKind::Vector(_) => "VECTOR",
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Frame | NodeKind::Component | NodeKind::Instance { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<Parent>,
    pub children: Vec<NodeId>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fills: Vec<Paint>,
    pub strokes: Vec<Paint>,
    pub stroke_weight: f32,
    pub stroke_align: StrokeAlign,
    /// Top-left, top-right, bottom-right, bottom-left.
    pub corner_radii: [f32; 4],
    pub auto_layout: Option<AutoLayout>,
    pub layout_align: LayoutAlign,
    pub layout_grow: f32,
    pub constraints: Constraints,
    pub min_width: Option<f32>,
    pub min_height: Option<f32>,
    pub clips_content: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, name: &str) -> Self {
        let (width, height) = match kind {
            NodeKind::Line => (100.0, 0.0),
            NodeKind::Vector(_) | NodeKind::Text(_) => (0.0, 0.0),
            _ => (100.0, 100.0),
        };
        Self {
            id,
            name: name.to_string(),
            kind,
            parent: None,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            fills: Vec::new(),
            strokes: Vec::new(),
            stroke_weight: 1.0,
            stroke_align: StrokeAlign::default(),
            corner_radii: [0.0; 4],
            auto_layout: None,
            layout_align: LayoutAlign::default(),
            layout_grow: 0.0,
            constraints: Constraints::default(),
            min_width: None,
            min_height: None,
            clips_content: false,
        }
    }

    pub fn text(&self) -> Option<&TextProps> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text_named(&self, name: &str) -> bool {
        matches!(self.kind, NodeKind::Text(_)) && self.name == name
    }

    pub fn is_component_named(&self, name: &str) -> bool {
        matches!(self.kind, NodeKind::Component) && self.name == name
    }

    pub fn set_corner_radius(&mut self, radius: f32) {
        self.corner_radii = [radius; 4];
    }

    pub fn set_fill(&mut self, color: Color) {
        self.fills = vec![Paint::solid(color)];
    }

    pub fn set_stroke(&mut self, color: Color, weight: f32) {
        self.strokes = vec![Paint::solid(color)];
        self.stroke_weight = weight;
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Everything needed to create a text node in one call.
#[derive(Debug, Clone)]
pub struct TextSpec {
    pub name: String,
    pub characters: String,
    pub font: FontName,
    pub font_size: f32,
    pub color: Color,
    pub align_horizontal: TextAlign,
    pub align_vertical: VerticalAlign,
    pub auto_resize: TextAutoResize,
    pub width: Option<f32>,
    pub line_height: LineHeight,
}

impl TextSpec {
    pub fn new(name: &str, characters: &str, font: FontName, font_size: f32, color: Color) -> Self {
        Self {
            name: name.to_string(),
            characters: characters.to_string(),
            font,
            font_size,
            color,
            align_horizontal: TextAlign::Left,
            align_vertical: VerticalAlign::Top,
            auto_resize: TextAutoResize::WidthAndHeight,
            width: None,
            line_height: LineHeight::Auto,
        }
    }

    pub fn align(mut self, horizontal: TextAlign, vertical: VerticalAlign) -> Self {
        self.align_horizontal = horizontal;
        self.align_vertical = vertical;
        self
    }

    /// Keeps the current width and grows vertically.
    pub fn hug_height(mut self) -> Self {
        self.auto_resize = TextAutoResize::Height;
        self
    }

    /// Fixes the width and wraps, growing vertically.
    pub fn wrap_at(mut self, width: f32) -> Self {
        self.auto_resize = TextAutoResize::Height;
        self.width = Some(width);
        self
    }

    pub fn line_height(mut self, line_height: LineHeight) -> Self {
        self.line_height = line_height;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}
