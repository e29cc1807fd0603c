use super::{STEP_NUMBER_LABEL, ShapeKind, build_template};
use crate::document::{Document, HostError, NodeId, PageId};
use crate::error::FlowError;
use crate::theme::{Theme, ThemeMode};
use log::{debug, info, warn};

/// Handle to the page that holds one theme's shape templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Library {
    page: PageId,
    mode: ThemeMode,
}

/// A template component on a library page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeTemplate {
    pub kind: ShapeKind,
    pub node: NodeId,
}

impl Library {
    pub fn page_name(mode: ThemeMode) -> String {
        format!("Components - UX Flow Logic - {}", mode.page_suffix())
    }

    pub fn find_or_create(doc: &mut Document, mode: ThemeMode) -> Self {
        let name = Self::page_name(mode);
        let page = match doc.find_page(&name) {
            Some(page) => page,
            None => {
                info!(name = name.as_str(); "Creating component library page");
                doc.create_page(&name)
            }
        };
        Self { page, mode }
    }

    /// Looks the library page up without creating it.
    pub fn require(doc: &Document, mode: ThemeMode) -> Result<Self, FlowError> {
        let name = Self::page_name(mode);
        doc.find_page(&name)
            .map(|page| Self { page, mode })
            .ok_or(FlowError::MissingLibrary { name })
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Fails when the library page was renamed or replaced since this
    /// handle was taken.
    fn ensure_present(&self, doc: &Document) -> Result<(), FlowError> {
        let current = Self::require(doc, self.mode)?;
        if current.page != self.page {
            return Err(FlowError::MissingLibrary {
                name: Self::page_name(self.mode),
            });
        }
        Ok(())
    }

    pub fn find(&self, doc: &Document, kind: ShapeKind) -> Option<ShapeTemplate> {
        let name = kind.template_name(self.mode);
        doc.find_on_page(self.page, |node| node.is_component_named(&name))
            .map(|node| ShapeTemplate { kind, node })
    }

    /// Returns the template for `kind`, building it on the library page the
    /// first time. The caller's current page is unchanged afterwards, even
    /// when building fails.
    pub fn get_or_create(
        &self,
        doc: &mut Document,
        kind: ShapeKind,
        theme: &Theme,
    ) -> Result<ShapeTemplate, FlowError> {
        self.ensure_present(doc)?;
        if let Some(template) = self.find(doc, kind) {
            return Ok(template);
        }

        let y = self.next_slot(doc);
        let node = doc.with_current_page(self.page, |doc| -> Result<NodeId, FlowError> {
            let node = build_template(doc, kind, theme)?;
            doc.set_position(node, 0.0, y)?;
            Ok(node)
        })?;
        debug!(kind = kind.key(), y; "Added template to library");
        Ok(ShapeTemplate { kind, node })
    }

    fn next_slot(&self, doc: &Document) -> f32 {
        doc.page(self.page)
            .map(|page| {
                page.children
                    .iter()
                    .filter_map(|id| doc.node(*id))
                    .map(|node| node.bottom() + 20.0)
                    .fold(0.0, f32::max)
            })
            .unwrap_or(0.0)
    }
}

impl ShapeTemplate {
    /// Places a fresh instance on the current page.
    pub fn instantiate(&self, doc: &mut Document) -> Result<NodeId, HostError> {
        doc.create_instance(self.node)
    }

    /// Instantiates the template and writes `number` into its step label.
    /// A template without a step label is instantiated unchanged.
    pub fn instantiate_numbered(&self, doc: &mut Document, number: usize) -> Result<NodeId, HostError> {
        let instance = self.instantiate(doc)?;
        match doc.find_one(instance, |node| node.is_text_named(STEP_NUMBER_LABEL)) {
            Some(label) => doc.set_characters(label, &number.to_string())?,
            None => warn!(kind = self.kind.key(); "Template has no step number label"),
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FontName;

    fn doc() -> Document {
        let mut doc = Document::new();
        doc.load_font(&FontName::inter_regular()).expect("regular");
        doc.load_font(&FontName::inter_bold()).expect("bold");
        doc
    }

    #[test]
    fn library_page_is_created_once_per_theme() {
        let mut doc = doc();
        let light = Library::find_or_create(&mut doc, ThemeMode::Light);
        let again = Library::find_or_create(&mut doc, ThemeMode::Light);
        let dark = Library::find_or_create(&mut doc, ThemeMode::Dark);
        assert_eq!(light, again);
        assert_ne!(light.page(), dark.page());
        assert_eq!(doc.pages().len(), 3);
        assert_eq!(
            doc.page(dark.page()).map(|p| p.name.as_str()),
            Some("Components - UX Flow Logic - Dark Mode")
        );
    }

    #[test]
    fn require_never_creates_the_page() {
        let doc = doc();
        let err = Library::require(&doc, ThemeMode::Dark).expect_err("missing");
        assert_eq!(
            err,
            FlowError::MissingLibrary {
                name: "Components - UX Flow Logic - Dark Mode".to_string()
            }
        );
        assert_eq!(doc.pages().len(), 1);
    }

    #[test]
    fn get_or_create_is_idempotent_and_keeps_current_page() {
        let mut doc = doc();
        let theme = Theme::light();
        let library = Library::find_or_create(&mut doc, theme.mode);
        let first = library
            .get_or_create(&mut doc, ShapeKind::UserAction, &theme)
            .expect("template");
        let second = library
            .get_or_create(&mut doc, ShapeKind::UserAction, &theme)
            .expect("template");
        assert_eq!(first, second);
        assert_eq!(doc.current_page(), PageId(0));
        assert_eq!(doc.page_of(first.node), Some(library.page()));
        assert_eq!(doc.pages()[library.page().0].children.len(), 1);
    }

    #[test]
    fn failed_build_leaves_nothing_and_retry_is_complete() {
        let mut doc = Document::new();
        let theme = Theme::light();
        let library = Library::find_or_create(&mut doc, theme.mode);

        let err = library
            .get_or_create(&mut doc, ShapeKind::Note, &theme)
            .expect_err("fonts are not loaded");
        assert!(matches!(err, FlowError::Host(HostError::FontNotLoaded(_))));
        assert!(library.find(&doc, ShapeKind::Note).is_none());
        assert!(doc.pages()[library.page().0].children.is_empty());
        assert_eq!(doc.node_count(), 0);
        assert_eq!(doc.current_page(), PageId(0));

        doc.load_font(&FontName::inter_regular()).expect("regular");
        doc.load_font(&FontName::inter_bold()).expect("bold");
        let note = library
            .get_or_create(&mut doc, ShapeKind::Note, &theme)
            .expect("note");
        assert!(!doc.children(note.node).is_empty());
        assert!(
            doc.find_one(note.node, |n| n.is_text_named(crate::components::NOTE_DETAILS_LABEL))
                .is_some()
        );
    }

    #[test]
    fn templates_stack_below_each_other() {
        let mut doc = doc();
        let theme = Theme::light();
        let library = Library::find_or_create(&mut doc, theme.mode);
        let enter = library
            .get_or_create(&mut doc, ShapeKind::EnterProcess, &theme)
            .expect("enter");
        let note = library
            .get_or_create(&mut doc, ShapeKind::Note, &theme)
            .expect("note");
        let enter = doc.node(enter.node).expect("enter");
        let note = doc.node(note.node).expect("note");
        assert_eq!(enter.y, 0.0);
        assert_eq!(note.y, enter.bottom() + 20.0);
        assert_eq!(note.x, 0.0);
    }

    #[test]
    fn renamed_library_page_is_reported_missing() {
        let mut doc = doc();
        let theme = Theme::light();
        let library = Library::find_or_create(&mut doc, theme.mode);
        doc.rename_page(library.page(), "Archive").expect("rename");
        let err = library
            .get_or_create(&mut doc, ShapeKind::Decision, &theme)
            .expect_err("missing");
        assert!(matches!(err, FlowError::MissingLibrary { .. }));
    }

    #[test]
    fn failed_build_restores_current_page() {
        let mut doc = doc();
        let theme = Theme::light();
        let library = Library::find_or_create(&mut doc, theme.mode);
        doc.set_page_read_only(library.page(), true).expect("flag");
        let err = library
            .get_or_create(&mut doc, ShapeKind::Note, &theme)
            .expect_err("read-only");
        assert!(matches!(err, FlowError::Host(HostError::ReadOnlyPage { .. })));
        assert_eq!(doc.current_page(), PageId(0));
    }

    #[test]
    fn numbered_instance_shows_its_step() {
        let mut doc = doc();
        let theme = Theme::light();
        let library = Library::find_or_create(&mut doc, theme.mode);
        let template = library
            .get_or_create(&mut doc, ShapeKind::UserAction, &theme)
            .expect("template");
        let instance = template.instantiate_numbered(&mut doc, 7).expect("instance");
        let label = doc
            .find_one(instance, |n| n.is_text_named(STEP_NUMBER_LABEL))
            .and_then(|id| doc.node(id))
            .and_then(|n| n.text())
            .map(|t| t.characters.clone());
        assert_eq!(label.as_deref(), Some("7"));
        assert_eq!(doc.page_of(instance), Some(PageId(0)));
    }
}
