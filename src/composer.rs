use crate::components::{Library, NOTE_DETAILS_LABEL, NOTE_NUMBER_LABEL, ShapeKind, ShapeTemplate};
use crate::config::{Config, LayoutConfig};
use crate::document::{
    AutoLayout, Constraint, Constraints, Document, FontName, LayoutAlign, NodeId, Sizing,
    StrokeCap, StrokeJoin, TextSpec, VectorGeometry, VectorProps, VectorVertex,
};
use crate::error::FlowError;
use crate::height::{FrameHeight, frame_height};
use crate::steps::parse_flow_steps;
use crate::sticker::{StickerReport, build_sticker_sheet};
use crate::theme::{Theme, ThemeMode};
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_FRAME_NAME: &str = "Flow diagram";
pub const DEFAULT_TITLE: &str = "Name of the flow";
pub const METADATA_SECTIONS: [&str; 4] =
    ["Trigger", "Assumptions", "Pre-Conditions", "Post-Conditions"];

/// Everything the user typed into the panel. Missing and `null` fields are
/// read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowRequest {
    pub theme: ThemeMode,
    #[serde(deserialize_with = "null_as_empty")]
    pub flow_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub flow_steps: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub trigger: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub assumptions: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub preconditions: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub postconditions: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl FlowRequest {
    fn metadata(&self) -> [(&'static str, &str); 4] {
        [
            (METADATA_SECTIONS[0], self.trigger.as_str()),
            (METADATA_SECTIONS[1], self.assumptions.as_str()),
            (METADATA_SECTIONS[2], self.preconditions.as_str()),
            (METADATA_SECTIONS[3], self.postconditions.as_str()),
        ]
    }

    fn trimmed_name(&self) -> Option<&str> {
        Some(self.flow_name.as_str()).filter(|name| !name.trim().is_empty())
    }
}

/// What one generation run put into the document.
#[derive(Debug, Clone)]
pub struct FlowReport {
    pub frame: NodeId,
    pub library: Library,
    pub steps: Vec<String>,
    pub height: FrameHeight,
    pub metadata: NodeId,
    pub notes: Vec<NodeId>,
    pub shapes: Vec<NodeId>,
    pub connectors: Vec<NodeId>,
    pub sticker: StickerReport,
}

/// Builds a complete flow diagram and its sticker sheet on the current page.
///
/// Nodes created before a failure stay in the document.
pub fn generate_flow(
    doc: &mut Document,
    request: &FlowRequest,
    config: &Config,
) -> Result<FlowReport, FlowError> {
    let layout = &config.layout;
    doc.load_font(&FontName::inter_regular())?;
    doc.load_font(&FontName::inter_bold())?;

    let theme = Theme::for_mode(request.theme);
    let library = Library::find_or_create(doc, theme.mode);
    let steps = parse_flow_steps(&request.flow_steps);
    info!(
        theme:? = theme.mode,
        steps = steps.len();
        "Generating flow diagram"
    );

    let metadata = build_metadata(doc, request, &theme, layout)?;
    let height = frame_height(doc, &library, &theme, &steps, metadata, layout)?;

    let frame = build_frame(doc, request, &theme, layout, height.height)?;
    doc.append_child(frame, metadata)?;
    doc.set_position(metadata, layout.content_padding, layout.content_top())?;

    let (notes, shapes, connectors) = if steps.is_empty() {
        debug!("No steps, leaving the notes panel and chain empty");
        (Vec::new(), Vec::new(), Vec::new())
    } else {
        let notes = place_notes(doc, frame, &library, &theme, &steps, layout)?;
        let (shapes, connectors) = place_chain(doc, frame, &library, &theme, steps.len(), layout)?;
        (notes, shapes, connectors)
    };

    let (frame_x, frame_y) = doc
        .node(frame)
        .map(|node| (node.x, node.y))
        .unwrap_or_default();
    let sticker = build_sticker_sheet(
        doc,
        &library,
        &theme,
        frame_x - layout.sticker.offset,
        frame_y,
        &layout.sticker,
    )?;

    doc.set_selection(vec![frame])?;
    doc.scroll_into_view(&[frame]);
    info!(
        frame:% = frame,
        height = height.height,
        notes = notes.len(),
        shapes = shapes.len();
        "Flow diagram created"
    );

    Ok(FlowReport {
        frame,
        library,
        steps,
        height,
        metadata,
        notes,
        shapes,
        connectors,
        sticker,
    })
}

/// Stacks the four metadata sections in a fixed-width, hugging column.
pub fn build_metadata(
    doc: &mut Document,
    request: &FlowRequest,
    theme: &Theme,
    layout: &LayoutConfig,
) -> Result<NodeId, FlowError> {
    let width = layout.metadata_width;
    let container = doc.create_frame("Metadata Container")?;
    doc.node_mut(container)?.fills.clear();
    doc.resize(container, width, 10.0)?;
    doc.set_auto_layout(
        container,
        AutoLayout::vertical()
            .spacing(layout.metadata_section_spacing)
            .sizing(Sizing::Hug, Sizing::Fixed),
    )?;

    for (title, body) in request.metadata() {
        let section = doc.create_frame(title)?;
        {
            let node = doc.node_mut(section)?;
            node.fills.clear();
            node.layout_align = LayoutAlign::Stretch;
        }
        doc.resize(section, width, 10.0)?;
        doc.set_auto_layout(
            section,
            AutoLayout::vertical()
                .spacing(layout.metadata_title_spacing)
                .sizing(Sizing::Hug, Sizing::Fixed),
        )?;

        let heading = TextSpec::new(title, title, FontName::inter_bold(), 14.0, theme.text).wrap_at(width);
        let content = if body.is_empty() {
            format!("Replace this with the {} for this flow", title.to_lowercase())
        } else {
            body.to_string()
        };
        let content = TextSpec::new(
            &format!("{title} content"),
            &content,
            FontName::inter_regular(),
            14.0,
            theme.text,
        )
        .wrap_at(width);
        for spec in [heading, content] {
            let text = doc.create_text(&spec)?;
            doc.node_mut(text)?.layout_align = LayoutAlign::Stretch;
            doc.append_child(section, text)?;
        }
        doc.append_child(container, section)?;
    }

    if let Some(node) = doc.node(container) {
        debug!(height = node.height; "Metadata block laid out");
    }
    Ok(container)
}

fn build_frame(
    doc: &mut Document,
    request: &FlowRequest,
    theme: &Theme,
    layout: &LayoutConfig,
    height: f32,
) -> Result<NodeId, FlowError> {
    let frame = doc.create_frame(request.trimmed_name().unwrap_or(DEFAULT_FRAME_NAME))?;
    doc.resize(frame, layout.frame_width, height)?;
    doc.set_position(frame, 0.0, 0.0)?;
    doc.node_mut(frame)?.set_fill(theme.frame_background);

    let title = request.trimmed_name().unwrap_or(DEFAULT_TITLE);
    let title = doc.create_text(&TextSpec::new(
        title,
        title,
        FontName::inter_regular(),
        14.0,
        theme.text,
    ))?;
    doc.append_child(frame, title)?;
    doc.set_position(title, layout.title_x, layout.title_y)?;

    let rule = doc.create_line("Header divider")?;
    doc.resize(rule, layout.frame_width, 0.0)?;
    doc.node_mut(rule)?.set_stroke(theme.border, 1.0);
    doc.append_child(frame, rule)?;
    doc.set_position(rule, 0.0, layout.header_rule_y)?;

    let panel_height = height - layout.header_height;
    let panels = [
        (
            "Background for Summary",
            0.0,
            layout.left_column_width,
            Constraint::Min,
        ),
        (
            "Background for Notes",
            layout.right_column_x(),
            layout.right_column_width,
            Constraint::Max,
        ),
    ];
    for (name, x, width, horizontal) in panels {
        let panel = doc.create_rectangle(name)?;
        doc.resize(panel, width, panel_height)?;
        {
            let node = doc.node_mut(panel)?;
            node.set_fill(theme.column_background);
            node.constraints = Constraints::new(horizontal, Constraint::Stretch);
        }
        doc.append_child(frame, panel)?;
        doc.set_position(panel, x, layout.header_height)?;
    }
    Ok(frame)
}

fn place_notes(
    doc: &mut Document,
    frame: NodeId,
    library: &Library,
    theme: &Theme,
    steps: &[String],
    layout: &LayoutConfig,
) -> Result<Vec<NodeId>, FlowError> {
    let template = library.get_or_create(doc, ShapeKind::Note, theme)?;
    let x = layout.right_column_x() + layout.content_padding;
    let mut y = layout.content_top();
    let mut notes = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        let note = template.instantiate(doc)?;
        for (label, value) in [
            (NOTE_NUMBER_LABEL, (index + 1).to_string()),
            (NOTE_DETAILS_LABEL, step.clone()),
        ] {
            if let Some(text) = doc.find_one(note, |n| n.is_text_named(label)) {
                doc.set_characters(text, &value)?;
            }
        }
        doc.append_child(frame, note)?;
        doc.set_position(note, x, y)?;
        let height = doc.node(note).map(|n| n.height).unwrap_or(0.0);
        debug!(index, y, height; "Placed step note");
        y += height + layout.note_gap;
        notes.push(note);
    }
    Ok(notes)
}

/// Enter shape for the first step, user action shapes for the rest, each
/// joined to the previous one by a downward arrow.
fn place_chain(
    doc: &mut Document,
    frame: NodeId,
    library: &Library,
    theme: &Theme,
    count: usize,
    layout: &LayoutConfig,
) -> Result<(Vec<NodeId>, Vec<NodeId>), FlowError> {
    let enter = library.get_or_create(doc, ShapeKind::EnterProcess, theme)?;
    let action = library.get_or_create(doc, ShapeKind::UserAction, theme)?;
    let center_x = layout.center_x();
    let mut y = layout.flow_start_y;
    let mut shapes = Vec::with_capacity(count);
    let mut connectors = Vec::with_capacity(count.saturating_sub(1));

    y += place_shape(doc, frame, &enter, 1, center_x, y, &mut shapes)?;
    for step in 2..=count {
        let arrow = connector(doc, &format!("Arrow {} to {}", step - 1, step), theme, layout)?;
        doc.append_child(frame, arrow)?;
        doc.set_position(arrow, center_x, y)?;
        connectors.push(arrow);
        y += layout.connector_length;

        y += place_shape(doc, frame, &action, step, center_x, y, &mut shapes)?;
    }
    Ok((shapes, connectors))
}

fn place_shape(
    doc: &mut Document,
    frame: NodeId,
    template: &ShapeTemplate,
    number: usize,
    center_x: f32,
    y: f32,
    placed: &mut Vec<NodeId>,
) -> Result<f32, FlowError> {
    let instance = template.instantiate_numbered(doc, number)?;
    doc.append_child(frame, instance)?;
    let (width, height) = doc
        .node(instance)
        .map(|n| (n.width, n.height))
        .unwrap_or_default();
    doc.set_position(instance, center_x - width / 2.0, y)?;
    placed.push(instance);
    Ok(height)
}

fn connector(
    doc: &mut Document,
    name: &str,
    theme: &Theme,
    layout: &LayoutConfig,
) -> Result<NodeId, FlowError> {
    let geometry = VectorGeometry::Network {
        vertices: vec![
            VectorVertex {
                x: 0.0,
                y: 0.0,
                stroke_cap: StrokeCap::None,
            },
            VectorVertex {
                x: 0.0,
                y: layout.connector_length,
                stroke_cap: StrokeCap::ArrowEquilateral,
            },
        ],
        segments: vec![(0, 1)],
    };
    let arrow = doc.create_vector(
        name,
        VectorProps {
            geometry,
            stroke_cap: StrokeCap::None,
            stroke_join: StrokeJoin::Miter,
        },
    )?;
    doc.node_mut(arrow)?.set_stroke(theme.shape_stroke, 1.0);
    Ok(arrow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeKind;

    fn request(steps: &str) -> FlowRequest {
        FlowRequest {
            flow_name: "Checkout".to_string(),
            flow_steps: steps.to_string(),
            ..FlowRequest::default()
        }
    }

    #[test]
    fn request_defaults_missing_fields() {
        let parsed: FlowRequest =
            serde_json::from_str(r#"{"theme":"dark","flowName":"Signup"}"#).expect("request");
        assert_eq!(parsed.theme, ThemeMode::Dark);
        assert_eq!(parsed.flow_name, "Signup");
        assert!(parsed.flow_steps.is_empty());
        let parsed: FlowRequest = serde_json::from_str(r#"{"theme":"sepia"}"#).expect("request");
        assert_eq!(parsed.theme, ThemeMode::Light);
    }

    #[test]
    fn request_reads_null_fields_as_empty() {
        let parsed: FlowRequest = serde_json::from_str(
            r#"{"theme":null,"flowName":null,"flowSteps":"1. Open","trigger":null,"assumptions":null,"preconditions":null,"postconditions":null}"#,
        )
        .expect("request");
        assert_eq!(parsed.theme, ThemeMode::Light);
        assert!(parsed.flow_name.is_empty());
        assert!(parsed.trigger.is_empty());
        assert!(parsed.postconditions.is_empty());
        assert_eq!(parsed.flow_steps, "1. Open");
    }

    #[test]
    fn blank_metadata_gets_placeholder_text() {
        let mut doc = Document::new();
        doc.load_font(&FontName::inter_regular()).expect("font");
        doc.load_font(&FontName::inter_bold()).expect("font");
        let block = build_metadata(
            &mut doc,
            &FlowRequest {
                trigger: "User taps Buy".to_string(),
                assumptions: "   ".to_string(),
                ..FlowRequest::default()
            },
            &Theme::light(),
            &LayoutConfig::default(),
        )
        .expect("metadata");
        let body = |doc: &Document, name: &str| {
            doc.find_one(block, |n| n.is_text_named(name))
                .and_then(|id| doc.node(id))
                .and_then(|n| n.text())
                .map(|t| t.characters.clone())
        };
        assert_eq!(body(&doc, "Trigger content").as_deref(), Some("User taps Buy"));
        assert_eq!(body(&doc, "Assumptions content").as_deref(), Some("   "));
        assert_eq!(
            body(&doc, "Pre-Conditions content").as_deref(),
            Some("Replace this with the pre-conditions for this flow")
        );
        assert_eq!(doc.node(block).map(|n| n.width), Some(328.0));
    }

    #[test]
    fn chain_is_centered_and_spaced_by_connectors() {
        let mut doc = Document::new();
        let report = generate_flow(&mut doc, &request("A\nB"), &Config::default()).expect("flow");
        assert_eq!(report.shapes.len(), 2);
        assert_eq!(report.connectors.len(), 1);
        let first = doc.node(report.shapes[0]).cloned().expect("first");
        let arrow = doc.node(report.connectors[0]).cloned().expect("arrow");
        let second = doc.node(report.shapes[1]).cloned().expect("second");
        assert_eq!(first.y, 120.0);
        assert!((first.x + first.width / 2.0 - 960.0).abs() < 1e-3);
        assert_eq!(arrow.x, 960.0);
        assert_eq!(arrow.y, first.bottom());
        assert_eq!(arrow.name, "Arrow 1 to 2");
        assert_eq!(second.y, arrow.y + 32.0);
        assert!(matches!(first.kind, NodeKind::Instance { .. }));
    }

    #[test]
    fn notes_stack_with_gap_in_right_panel() {
        let mut doc = Document::new();
        let report =
            generate_flow(&mut doc, &request("One\nTwo\nThree"), &Config::default()).expect("flow");
        let notes: Vec<_> = report
            .notes
            .iter()
            .map(|id| doc.node(*id).cloned().expect("note"))
            .collect();
        assert_eq!(notes[0].x, 1576.0);
        assert_eq!(notes[0].y, 72.0);
        assert!((notes[1].y - (notes[0].bottom() + 24.0)).abs() < 1e-3);
        assert!((notes[2].y - (notes[1].bottom() + 24.0)).abs() < 1e-3);
    }

    #[test]
    fn blank_name_uses_defaults() {
        let mut doc = Document::new();
        let report = generate_flow(&mut doc, &FlowRequest::default(), &Config::default()).expect("flow");
        let frame = doc.node(report.frame).expect("frame");
        assert_eq!(frame.name, DEFAULT_FRAME_NAME);
        assert!(doc.find_one(report.frame, |n| n.is_text_named(DEFAULT_TITLE)).is_some());
        assert_eq!(report.steps.len(), 3);
    }
}
