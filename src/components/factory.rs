use super::{
    NOTE_DETAILS_LABEL, NOTE_NUMBER_LABEL, STEP_DESCRIPTION_LABEL, STEP_NUMBER_LABEL, ShapeKind,
};
use crate::document::{
    Align, AutoLayout, Constraint, Constraints, Document, FontName, HostError, LayoutAlign,
    LineHeight, NodeId, Padding, Sizing, StrokeAlign, StrokeJoin, TextAlign, TextSpec,
    VectorGeometry, VectorProps, VerticalAlign,
};
use crate::theme::{Color, Theme};
use log::{debug, warn};

const PILL_RADIUS: f32 = 90_000.0;
const NOTE_LINE_HEIGHT: LineHeight = LineHeight::Percent(121.022_72);

type Recipe = fn(&mut Document, NodeId, ShapeKind, &Theme) -> Result<(), HostError>;

fn recipe(kind: ShapeKind) -> Recipe {
    match kind {
        ShapeKind::EnterProcess | ShapeKind::EndProcess => process_pill,
        ShapeKind::Decision => decision,
        ShapeKind::UserAction | ShapeKind::SystemAction => action_box,
        ShapeKind::ContinuesFlow => continues_flow,
        ShapeKind::ConcurrentStep => concurrent_step,
        ShapeKind::DecisionYes | ShapeKind::DecisionNo => decision_tag,
        ShapeKind::Note => note,
    }
}

/// Builds the template component for `kind` on the current page.
///
/// The component is named `"{Light|Dark} mode / {human name}"` and laid out
/// with auto layout, so instances grow with the text put into them. When a
/// recipe fails, everything it added to the page is removed again so no
/// half-built component can be found under the template name.
pub fn build_template(doc: &mut Document, kind: ShapeKind, theme: &Theme) -> Result<NodeId, HostError> {
    let page = doc.current_page();
    let existing = doc.page(page).map(|p| p.children.len()).unwrap_or(0);
    let component = doc.create_component(&kind.template_name(theme.mode))?;
    if let Err(err) = recipe(kind)(doc, component, kind, theme) {
        warn!("Template {kind} failed, discarding partial component: {err}");
        let leftovers = doc
            .page(page)
            .and_then(|p| p.children.get(existing..))
            .map(<[NodeId]>::to_vec)
            .unwrap_or_default();
        for node in leftovers {
            doc.remove(node)?;
        }
        return Err(err);
    }
    if let Some(node) = doc.node(component) {
        debug!(
            kind = kind.key(),
            width = node.width,
            height = node.height;
            "Built shape template"
        );
    }
    Ok(component)
}

fn regular(name: &str, characters: &str, size: f32, color: Color) -> TextSpec {
    TextSpec::new(name, characters, FontName::inter_regular(), size, color)
}

fn bold(name: &str, characters: &str, size: f32, color: Color) -> TextSpec {
    TextSpec::new(name, characters, FontName::inter_bold(), size, color)
}

fn add_text(
    doc: &mut Document,
    parent: NodeId,
    spec: &TextSpec,
    stretch: bool,
) -> Result<NodeId, HostError> {
    let text = doc.create_text(spec)?;
    if stretch {
        doc.node_mut(text)?.layout_align = LayoutAlign::Stretch;
    }
    doc.append_child(parent, text)?;
    Ok(text)
}

fn add_frame(
    doc: &mut Document,
    parent: NodeId,
    name: &str,
    layout: AutoLayout,
) -> Result<NodeId, HostError> {
    let frame = doc.create_frame(name)?;
    doc.node_mut(frame)?.fills.clear();
    doc.set_auto_layout(frame, layout)?;
    doc.append_child(parent, frame)?;
    Ok(frame)
}

/// "Step #" above "Step description", both filling the column width.
fn step_labels(doc: &mut Document, column: NodeId, theme: &Theme) -> Result<(), HostError> {
    let number = bold(STEP_NUMBER_LABEL, "#", 12.0, theme.step_number)
        .align(TextAlign::Center, VerticalAlign::Center)
        .hug_height();
    add_text(doc, column, &number, true)?;
    let description = regular(STEP_DESCRIPTION_LABEL, "Step info", 14.0, theme.text_strong)
        .align(TextAlign::Center, VerticalAlign::Top)
        .hug_height();
    add_text(doc, column, &description, true)?;
    Ok(())
}

fn text_column() -> AutoLayout {
    AutoLayout::vertical()
        .spacing(2.0)
        .align(Align::Center, Align::Min)
}

fn process_pill(
    doc: &mut Document,
    component: NodeId,
    kind: ShapeKind,
    theme: &Theme,
) -> Result<(), HostError> {
    {
        let node = doc.node_mut(component)?;
        node.width = 100.0;
        node.height = 28.0;
        node.min_width = Some(100.0);
        node.set_fill(theme.shape_fill);
        node.set_stroke(theme.shape_stroke, 1.0);
        node.set_corner_radius(PILL_RADIUS);
    }
    doc.set_auto_layout(
        component,
        AutoLayout::horizontal()
            .padding(Padding::new(0.0, 4.0, 0.0, 4.0))
            .spacing(10.0)
            .sizing(Sizing::Hug, Sizing::Fixed)
            .align(Align::Center, Align::Center),
    )?;

    let content = add_frame(
        doc,
        component,
        "Step # and description",
        AutoLayout::horizontal()
            .spacing(2.0)
            .align(Align::Center, Align::Center),
    )?;

    let step = doc.create_frame("Step 1")?;
    doc.node_mut(step)?.fills.clear();
    doc.resize(step, 8.0, 12.0)?;
    doc.set_auto_layout(
        step,
        AutoLayout::vertical()
            .padding(Padding::new(0.0, 6.0, 0.0, 0.0))
            .sizing(Sizing::Fixed, Sizing::Hug)
            .align(Align::Min, Align::Center),
    )?;
    doc.append_child(content, step)?;
    let number = bold(STEP_NUMBER_LABEL, "#", 12.0, theme.step_number)
        .align(TextAlign::Center, VerticalAlign::Center);
    let number = add_text(doc, step, &number, true)?;
    doc.node_mut(number)?.layout_grow = 1.0;
    doc.relayout_from(number);

    let label = regular("Enter or exit process", kind.human_name(), 14.0, theme.text_strong)
        .align(TextAlign::Center, VerticalAlign::Top);
    add_text(doc, content, &label, false)?;
    Ok(())
}

fn decision(
    doc: &mut Document,
    component: NodeId,
    _kind: ShapeKind,
    theme: &Theme,
) -> Result<(), HostError> {
    doc.resize(component, 116.0, 54.0)?;
    doc.node_mut(component)?.fills.clear();

    let diamond = doc.create_polygon("Diamond shape", 4)?;
    doc.resize(diamond, 110.0, 50.0)?;
    doc.set_position(diamond, 3.0, 2.0)?;
    {
        let node = doc.node_mut(diamond)?;
        node.set_fill(theme.shape_fill);
        node.set_stroke(theme.shape_stroke, 1.0);
        node.constraints = Constraints::new(Constraint::Stretch, Constraint::Stretch);
    }
    doc.append_child(component, diamond)?;

    let body = doc.create_frame("Decision")?;
    doc.resize(body, 110.0, 50.0)?;
    doc.set_position(body, 3.0, 2.0)?;
    {
        let node = doc.node_mut(body)?;
        node.fills.clear();
        node.constraints = Constraints::new(Constraint::Stretch, Constraint::Stretch);
    }
    doc.set_auto_layout(
        body,
        AutoLayout::vertical()
            .padding(Padding::uniform(4.0))
            .spacing(10.0)
            .sizing(Sizing::Hug, Sizing::Fixed)
            .align(Align::Center, Align::Min),
    )?;
    doc.append_child(component, body)?;

    let column = doc.create_frame("Step # and description")?;
    doc.resize(column, 102.0, 42.0)?;
    {
        let node = doc.node_mut(column)?;
        node.fills.clear();
        node.layout_align = LayoutAlign::Stretch;
    }
    doc.set_auto_layout(column, text_column().sizing(Sizing::Hug, Sizing::Fixed))?;
    doc.append_child(body, column)?;
    step_labels(doc, column, theme)
}

fn action_box(
    doc: &mut Document,
    component: NodeId,
    kind: ShapeKind,
    theme: &Theme,
) -> Result<(), HostError> {
    {
        let node = doc.node_mut(component)?;
        node.min_width = Some(100.0);
        node.min_height = Some(54.0);
        node.set_fill(theme.shape_fill);
        node.set_stroke(theme.shape_stroke, 1.0);
        if kind == ShapeKind::SystemAction {
            node.set_corner_radius(PILL_RADIUS);
        }
    }
    doc.set_auto_layout(
        component,
        AutoLayout::horizontal()
            .padding(Padding::new(2.0, 4.0, 4.0, 4.0))
            .align(Align::Center, Align::Min),
    )?;

    let column = doc.create_frame("Step # and description")?;
    {
        let node = doc.node_mut(column)?;
        node.fills.clear();
        node.layout_grow = 1.0;
    }
    doc.set_auto_layout(column, text_column())?;
    doc.append_child(component, column)?;
    step_labels(doc, column, theme)
}

fn bracket(doc: &mut Document, name: &str, path: &str, color: Color) -> Result<NodeId, HostError> {
    let vector = doc.create_vector(
        name,
        VectorProps {
            geometry: VectorGeometry::Path(path.to_string()),
            stroke_cap: Default::default(),
            stroke_join: StrokeJoin::Miter,
        },
    )?;
    doc.resize(vector, 100.0, 12.0)?;
    let node = doc.node_mut(vector)?;
    node.set_stroke(color, 1.0);
    node.stroke_align = StrokeAlign::Inside;
    node.layout_align = LayoutAlign::Stretch;
    node.constraints = Constraints::new(Constraint::Stretch, Constraint::Min);
    Ok(vector)
}

fn continues_flow(
    doc: &mut Document,
    component: NodeId,
    kind: ShapeKind,
    theme: &Theme,
) -> Result<(), HostError> {
    {
        let node = doc.node_mut(component)?;
        node.min_width = Some(100.0);
        node.min_height = Some(54.0);
        node.fills.clear();
    }
    doc.set_auto_layout(
        component,
        AutoLayout::horizontal()
            .padding(Padding::new(0.0, 4.0, 0.0, 4.0))
            .align(Align::Center, Align::Min),
    )?;

    let frame = doc.create_frame(kind.human_name())?;
    {
        let node = doc.node_mut(frame)?;
        node.fills.clear();
        node.layout_align = LayoutAlign::Stretch;
        node.layout_grow = 1.0;
    }
    doc.set_auto_layout(
        frame,
        AutoLayout::vertical()
            .spacing(-4.0)
            .sizing(Sizing::Hug, Sizing::Fixed)
            .align(Align::Center, Align::Min),
    )?;

    let top = bracket(doc, "Top bracket", "M 0 12 L 0 0 L 100 0 L 100 12", theme.shape_stroke)?;
    doc.append_child(frame, top)?;

    let column = doc.create_frame("Step # and description")?;
    {
        let node = doc.node_mut(column)?;
        node.fills.clear();
        node.layout_align = LayoutAlign::Stretch;
    }
    doc.set_auto_layout(column, text_column().sizing(Sizing::Hug, Sizing::Fixed))?;
    doc.append_child(frame, column)?;
    step_labels(doc, column, theme)?;

    let bottom = bracket(doc, "Bottom bracket", "M 0 0 L 0 12 L 100 12 L 100 0", theme.shape_stroke)?;
    doc.append_child(frame, bottom)?;
    doc.append_child(component, frame)?;
    Ok(())
}

fn concurrent_step(
    doc: &mut Document,
    component: NodeId,
    _kind: ShapeKind,
    theme: &Theme,
) -> Result<(), HostError> {
    doc.resize(component, 36.0, 16.0)?;
    doc.node_mut(component)?.fills.clear();

    let half = doc.create_rectangle("semi-circle")?;
    doc.resize(half, 36.0, 16.0)?;
    {
        let node = doc.node_mut(half)?;
        node.set_fill(theme.shape_fill);
        node.set_stroke(theme.shape_stroke, 1.0);
        node.corner_radii = [1000.0, 1000.0, 0.0, 0.0];
    }
    doc.append_child(component, half)
}

fn decision_tag(
    doc: &mut Document,
    component: NodeId,
    kind: ShapeKind,
    theme: &Theme,
) -> Result<(), HostError> {
    doc.node_mut(component)?.set_fill(theme.shape_fill);
    doc.set_auto_layout(
        component,
        AutoLayout::horizontal()
            .padding(Padding::symmetric(2.0, 4.0))
            .spacing(10.0)
            .align(Align::Center, Align::Center),
    )?;
    let (name, characters) = if kind == ShapeKind::DecisionYes {
        ("Text", "Yes")
    } else {
        ("text", "No")
    };
    add_text(doc, component, &regular(name, characters, 12.0, theme.text_strong), false)?;
    Ok(())
}

fn note(
    doc: &mut Document,
    component: NodeId,
    _kind: ShapeKind,
    theme: &Theme,
) -> Result<(), HostError> {
    doc.node_mut(component)?.fills.clear();
    doc.set_auto_layout(component, AutoLayout::horizontal().spacing(20.0))?;

    let number = bold(NOTE_NUMBER_LABEL, "1", 14.0, theme.text)
        .align(TextAlign::Right, VerticalAlign::Top)
        .line_height(NOTE_LINE_HEIGHT)
        .wrap_at(52.0);
    add_text(doc, component, &number, false)?;
    let details = regular(NOTE_DETAILS_LABEL, NOTE_DETAILS_LABEL, 14.0, theme.text)
        .align(TextAlign::Left, VerticalAlign::Top)
        .line_height(NOTE_LINE_HEIGHT)
        .wrap_at(251.0);
    add_text(doc, component, &details, false)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Node, NodeKind};

    fn doc() -> Document {
        let mut doc = Document::new();
        doc.load_font(&FontName::inter_regular()).expect("regular");
        doc.load_font(&FontName::inter_bold()).expect("bold");
        doc
    }

    #[test]
    fn every_kind_builds_a_named_component() {
        let mut doc = doc();
        let theme = Theme::light();
        for kind in ShapeKind::ALL {
            let id = build_template(&mut doc, kind, &theme).expect("template");
            let node = doc.node(id).expect("component");
            assert!(matches!(node.kind, NodeKind::Component));
            assert_eq!(node.name, kind.template_name(theme.mode));
            assert!(node.width > 0.0 && node.height > 0.0, "{kind} has no size");
        }
    }

    #[test]
    fn chain_shapes_expose_step_number_label() {
        let mut doc = doc();
        let theme = Theme::dark();
        for kind in [
            ShapeKind::EnterProcess,
            ShapeKind::UserAction,
            ShapeKind::SystemAction,
            ShapeKind::Decision,
            ShapeKind::ContinuesFlow,
        ] {
            let id = build_template(&mut doc, kind, &theme).expect("template");
            let label = doc
                .find_one(id, |n| n.is_text_named(STEP_NUMBER_LABEL))
                .expect("step label");
            let text = doc.node(label).and_then(Node::text).expect("text");
            assert_eq!(text.characters, "#");
        }
    }

    #[test]
    fn action_box_respects_minimum_size() {
        let mut doc = doc();
        let id = build_template(&mut doc, ShapeKind::UserAction, &Theme::light()).expect("template");
        let node = doc.node(id).expect("component");
        assert!(node.width >= 100.0);
        assert!(node.height >= 54.0);
        assert_eq!(node.strokes.len(), 1);
    }

    #[test]
    fn process_pill_is_fixed_height_and_rounded() {
        let mut doc = doc();
        let id = build_template(&mut doc, ShapeKind::EndProcess, &Theme::light()).expect("template");
        let node = doc.node(id).expect("component");
        assert_eq!(node.height, 28.0);
        assert!(node.width >= 100.0);
        assert_eq!(node.corner_radii, [PILL_RADIUS; 4]);
        let label = doc
            .find_one(id, |n| n.is_text_named("Enter or exit process"))
            .and_then(|label| doc.node(label))
            .and_then(Node::text)
            .map(|t| t.characters.clone());
        assert_eq!(label.as_deref(), Some("End process"));
    }

    #[test]
    fn note_grows_with_long_details() {
        let mut doc = doc();
        let id = build_template(&mut doc, ShapeKind::Note, &Theme::light()).expect("template");
        let short = doc.node(id).map(|n| n.height).expect("height");
        let details = doc
            .find_one(id, |n| n.is_text_named(NOTE_DETAILS_LABEL))
            .expect("details");
        doc.set_characters(details, &"a long explanation ".repeat(20))
            .expect("edit");
        let tall = doc.node(id).map(|n| n.height).expect("height");
        assert!(tall > short * 3.0);
        assert_eq!(doc.node(details).map(|n| n.width), Some(251.0));
    }

    #[test]
    fn concurrent_step_is_a_half_pill() {
        let mut doc = doc();
        let id = build_template(&mut doc, ShapeKind::ConcurrentStep, &Theme::light()).expect("template");
        let half = doc.find_one(id, |n| n.name == "semi-circle").expect("rect");
        let node = doc.node(half).expect("node");
        assert_eq!(node.corner_radii, [1000.0, 1000.0, 0.0, 0.0]);
        assert_eq!((node.width, node.height), (36.0, 16.0));
    }
}
