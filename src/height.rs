use crate::components::{Library, NOTE_DETAILS_LABEL, ShapeKind};
use crate::config::LayoutConfig;
use crate::document::{Document, NodeId};
use crate::error::FlowError;
use crate::theme::Theme;
use log::debug;
use serde::Serialize;

/// Candidate heights for the diagram frame. `height` is the largest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameHeight {
    pub minimum: f32,
    pub from_steps: f32,
    pub from_metadata: f32,
    pub from_notes: f32,
    pub height: f32,
}

/// Works out how tall the frame must be so nothing is clipped.
///
/// `metadata` is the laid-out metadata block. Note heights are measured
/// with throwaway note instances on the library page, removed before
/// returning.
pub fn frame_height(
    doc: &mut Document,
    library: &Library,
    theme: &Theme,
    steps: &[String],
    metadata: NodeId,
    layout: &LayoutConfig,
) -> Result<FrameHeight, FlowError> {
    let counted = if steps.is_empty() {
        layout.placeholder_step_count
    } else {
        steps.len()
    };
    let from_steps = layout.step_base_height + counted as f32 * layout.step_height;

    let block = doc.node(metadata).map(|node| node.height).unwrap_or(0.0);
    let from_metadata = layout.content_top() + block + layout.content_padding;

    let mut from_notes = layout.content_top();
    if !steps.is_empty() {
        for step in steps {
            from_notes += measure_note(doc, library, theme, step)? + layout.note_gap;
        }
        from_notes += layout.content_padding;
    }

    let minimum = layout.frame_min_height;
    let height = minimum.max(from_steps).max(from_metadata).max(from_notes);
    let result = FrameHeight {
        minimum,
        from_steps,
        from_metadata,
        from_notes,
        height,
    };
    debug!(result:?; "Computed frame height");
    Ok(result)
}

/// Height of a note instance holding `details`.
pub fn measure_note(
    doc: &mut Document,
    library: &Library,
    theme: &Theme,
    details: &str,
) -> Result<f32, FlowError> {
    let template = library.get_or_create(doc, ShapeKind::Note, theme)?;
    doc.with_current_page(library.page(), |doc| -> Result<f32, FlowError> {
        let probe = template.instantiate(doc)?;
        let measured = fill_details(doc, probe, details);
        doc.remove(probe)?;
        measured
    })
}

fn fill_details(doc: &mut Document, note: NodeId, details: &str) -> Result<f32, FlowError> {
    if let Some(label) = doc.find_one(note, |n| n.is_text_named(NOTE_DETAILS_LABEL)) {
        doc.set_characters(label, details)?;
    }
    Ok(doc.node(note).map(|node| node.height).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AutoLayout, FontName};

    fn setup() -> (Document, Library, Theme) {
        let mut doc = Document::new();
        doc.load_font(&FontName::inter_regular()).expect("regular");
        doc.load_font(&FontName::inter_bold()).expect("bold");
        let theme = Theme::light();
        let library = Library::find_or_create(&mut doc, theme.mode);
        (doc, library, theme)
    }

    fn block(doc: &mut Document, height: f32) -> NodeId {
        let frame = doc.create_frame("Metadata Container").expect("frame");
        doc.resize(frame, 328.0, height).expect("resize");
        frame
    }

    fn steps(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Step {i}")).collect()
    }

    #[test]
    fn short_content_uses_minimum() {
        let (mut doc, library, theme) = setup();
        let meta = block(&mut doc, 200.0);
        let h = frame_height(&mut doc, &library, &theme, &steps(3), meta, &LayoutConfig::default())
            .expect("height");
        assert_eq!(h.minimum, 1090.0);
        assert_eq!(h.from_steps, 500.0);
        assert_eq!(h.from_metadata, 56.0 + 16.0 + 200.0 + 16.0);
        assert_eq!(h.height, 1090.0);
    }

    #[test]
    fn zero_steps_count_as_placeholders_and_skip_notes() {
        let (mut doc, library, theme) = setup();
        let meta = block(&mut doc, 10.0);
        let h = frame_height(&mut doc, &library, &theme, &[], meta, &LayoutConfig::default())
            .expect("height");
        assert_eq!(h.from_steps, 500.0);
        assert_eq!(h.from_notes, 72.0);
    }

    #[test]
    fn many_steps_dominate() {
        let (mut doc, library, theme) = setup();
        let meta = block(&mut doc, 10.0);
        let h = frame_height(&mut doc, &library, &theme, &steps(12), meta, &LayoutConfig::default())
            .expect("height");
        assert_eq!(h.from_steps, 1400.0);
        assert_eq!(h.height, 1400.0);
    }

    #[test]
    fn tall_metadata_dominates() {
        let (mut doc, library, theme) = setup();
        let meta = block(&mut doc, 1500.0);
        let h = frame_height(&mut doc, &library, &theme, &steps(2), meta, &LayoutConfig::default())
            .expect("height");
        assert_eq!(h.height, 1500.0 + 88.0);
    }

    #[test]
    fn longer_notes_never_lower_the_height() {
        let (mut doc, library, theme) = setup();
        let meta = block(&mut doc, 10.0);
        let layout = LayoutConfig::default();
        let short = frame_height(&mut doc, &library, &theme, &steps(4), meta, &layout).expect("short");
        let wordy: Vec<String> = (0..30).map(|_| "word ".repeat(60)).collect();
        let long = frame_height(&mut doc, &library, &theme, &wordy, meta, &layout).expect("long");
        assert!(long.from_notes > short.from_notes);
        assert!(long.height >= short.height);
        assert_eq!(long.height, long.from_notes);
    }

    #[test]
    fn measurement_leaves_no_nodes_behind() {
        let (mut doc, library, theme) = setup();
        let meta = doc.create_frame("meta").expect("frame");
        doc.set_auto_layout(meta, AutoLayout::vertical()).expect("layout");
        // Build the note template up front so only probes would remain.
        library
            .get_or_create(&mut doc, ShapeKind::Note, &theme)
            .expect("note");
        let before = doc.node_count();
        frame_height(&mut doc, &library, &theme, &steps(5), meta, &LayoutConfig::default())
            .expect("height");
        assert_eq!(doc.node_count(), before);
        assert_eq!(doc.current_page(), crate::document::PageId(0));
    }
}
