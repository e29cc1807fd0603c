use crate::components::{Library, ShapeKind};
use crate::config::StickerConfig;
use crate::document::{Document, FontName, NodeId, TextAlign, TextSpec, VerticalAlign};
use crate::error::FlowError;
use crate::theme::Theme;
use log::{debug, warn};

pub const STICKER_TITLE: &str = "Flow Diagram Sticker Sheet";
pub const CONNECTORS_HEADING: &str = "Creating Connectors";
const SUBTITLE: &str = "These markers are also available in this Figma file's \"Assets\" panel.";
const CONNECTOR_INSTRUCTIONS: &str = "To connect your flowchart shapes with arrows, use Figma's built-in arrow tool:\n\n\
1. Select the Arrow tool from the toolbar (or press Shift + X)\n\
2. Click and drag between shapes to create connectors\n\
3. Customize arrowheads, colors, and stroke weight in the Properties panel";

/// A shape that could not be put on the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeFailure {
    pub kind: ShapeKind,
    pub error: FlowError,
}

impl ShapeFailure {
    /// Notification text shown to the user.
    pub fn message(&self) -> String {
        format!("Error creating {}: {}", self.kind, self.error)
    }
}

#[derive(Debug, Clone)]
pub struct StickerReport {
    pub frame: NodeId,
    pub placed: Vec<(ShapeKind, NodeId)>,
    pub failures: Vec<ShapeFailure>,
}

impl StickerReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds the reference sheet of every shape at (`x`, `y`) on the current
/// page. Each shape is attempted on its own; failures are collected in the
/// report and the remaining shapes are still placed.
pub fn build_sticker_sheet(
    doc: &mut Document,
    library: &Library,
    theme: &Theme,
    x: f32,
    y: f32,
    config: &StickerConfig,
) -> Result<StickerReport, FlowError> {
    let frame = doc.create_frame(STICKER_TITLE)?;
    doc.resize(frame, config.width, config.height)?;
    doc.set_position(frame, x, y)?;
    doc.node_mut(frame)?.set_fill(theme.frame_background);

    let title = TextSpec::new(STICKER_TITLE, STICKER_TITLE, FontName::inter_bold(), 20.0, theme.text);
    add_text(doc, frame, &title, config.margin, config.margin)?;
    let subtitle = TextSpec::new(SUBTITLE, SUBTITLE, FontName::inter_regular(), 12.0, theme.text)
        .wrap_at(config.text_width);
    add_text(doc, frame, &subtitle, config.margin, config.subtitle_y)?;

    let mut placed = Vec::new();
    let mut failures = Vec::new();
    let mut row_y = config.first_shape_y;
    for kind in ShapeKind::ALL {
        match place_shape(doc, frame, library, theme, kind, row_y, config) {
            Ok(instance) => placed.push((kind, instance)),
            Err(error) => {
                warn!("Sticker shape {kind} failed: {error}");
                failures.push(ShapeFailure { kind, error });
                continue;
            }
        }
        row_y += kind.sticker_height() + config.shape_gap;
    }

    row_y += 20.0;
    let heading = TextSpec::new(
        CONNECTORS_HEADING,
        CONNECTORS_HEADING,
        FontName::inter_bold(),
        16.0,
        theme.text,
    );
    add_text(doc, frame, &heading, config.margin, row_y)?;
    row_y += 40.0;
    let instructions = TextSpec::new(
        "Connector instructions",
        CONNECTOR_INSTRUCTIONS,
        FontName::inter_regular(),
        12.0,
        theme.text,
    )
    .align(TextAlign::Left, VerticalAlign::Top)
    .wrap_at(config.text_width);
    add_text(doc, frame, &instructions, config.margin, row_y)?;

    debug!(
        placed = placed.len(),
        failed = failures.len();
        "Sticker sheet built"
    );
    Ok(StickerReport {
        frame,
        placed,
        failures,
    })
}

fn place_shape(
    doc: &mut Document,
    frame: NodeId,
    library: &Library,
    theme: &Theme,
    kind: ShapeKind,
    row_y: f32,
    config: &StickerConfig,
) -> Result<NodeId, FlowError> {
    let template = library.get_or_create(doc, kind, theme)?;
    let instance = template.instantiate(doc)?;
    doc.append_child(frame, instance)?;
    doc.set_position(instance, config.margin, row_y)?;

    if kind.has_sticker_label() {
        let label = TextSpec::new(
            kind.human_name(),
            kind.human_name(),
            FontName::inter_regular(),
            12.0,
            theme.text,
        );
        add_text(doc, frame, &label, config.label_x, row_y + kind.sticker_height() / 2.0 - 6.0)?;
    }
    Ok(instance)
}

fn add_text(doc: &mut Document, frame: NodeId, spec: &TextSpec, x: f32, y: f32) -> Result<NodeId, FlowError> {
    let text = doc.create_text(spec)?;
    doc.append_child(frame, text)?;
    doc.set_position(text, x, y)?;
    Ok(text)
}
