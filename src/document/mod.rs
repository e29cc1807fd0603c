//! In-memory scene graph standing in for the editor's document API.
//!
//! Nodes live in an arena indexed by [`NodeId`]. New nodes are attached to
//! the *current page*, exactly like the editor does, so callers that need
//! nodes elsewhere switch pages with [`Document::with_current_page`], which
//! always restores the previous page.

mod autolayout;
mod node;

pub use node::{
    Align, AutoLayout, Constraint, Constraints, Direction, FontName, LayoutAlign, LineHeight,
    Node, NodeId, NodeKind, Padding, PageId, Paint, Parent, Rect, Sizing, StrokeAlign, StrokeCap,
    StrokeJoin, TextAlign, TextAutoResize, TextProps, TextSpec, VectorGeometry, VectorProps,
    VectorVertex, VerticalAlign,
};

use autolayout::Forced;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    #[error("the node with id {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("the page with id {0:?} does not exist")]
    PageNotFound(PageId),

    #[error("font \"{0}\" is not available in this document")]
    FontUnavailable(FontName),

    #[error("font \"{0}\" must be loaded before editing text")]
    FontNotLoaded(FontName),

    #[error("node {0} is not a component")]
    NotAComponent(NodeId),

    #[error("node {0} is not a text node")]
    NotText(NodeId),

    #[error("page \"{name}\" is read-only")]
    ReadOnlyPage { name: String },

    #[error("cannot append node {child} to {parent}: {reason}")]
    InvalidHierarchy {
        parent: NodeId,
        child: NodeId,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub name: String,
    pub children: Vec<NodeId>,
    pub selection: Vec<NodeId>,
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pages: Vec<Page>,
    nodes: Vec<Option<Node>>,
    current_page: PageId,
    available_fonts: BTreeSet<FontName>,
    viewport: Option<Rect>,
    #[serde(skip)]
    loaded_fonts: BTreeSet<FontName>,
    #[serde(skip)]
    system_fonts: bool,
    /// Arena slots emptied by `remove`, handed out again lowest first.
    #[serde(skip)]
    free_slots: BTreeSet<usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            pages: Vec::new(),
            nodes: Vec::new(),
            current_page: PageId(0),
            available_fonts: [FontName::inter_regular(), FontName::inter_bold()]
                .into_iter()
                .collect(),
            viewport: None,
            loaded_fonts: BTreeSet::new(),
            system_fonts: false,
            free_slots: BTreeSet::new(),
        };
        doc.create_page("Page 1");
        doc
    }

    pub fn with_available_fonts(mut self, fonts: impl IntoIterator<Item = FontName>) -> Self {
        self.available_fonts = fonts.into_iter().collect();
        self
    }

    /// Measure text with installed system fonts instead of the built-in table.
    pub fn use_system_fonts(&mut self, enabled: bool) {
        self.system_fonts = enabled;
    }

    pub(crate) fn fast_text(&self) -> bool {
        !self.system_fonts
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut doc: Self = serde_json::from_str(json)?;
        doc.free_slots = doc
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect();
        Ok(doc)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    // ----- pages -------------------------------------------------------

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.get(id.0)
    }

    pub fn find_page(&self, name: &str) -> Option<PageId> {
        self.pages.iter().find(|page| page.name == name).map(|page| page.id)
    }

    /// Appends a new page. The current page is left unchanged.
    pub fn create_page(&mut self, name: &str) -> PageId {
        let id = PageId(self.pages.len());
        self.pages.push(Page {
            id,
            name: name.to_string(),
            children: Vec::new(),
            selection: Vec::new(),
            read_only: false,
        });
        debug!(name; "Created page");
        id
    }

    pub fn rename_page(&mut self, id: PageId, name: &str) -> Result<(), HostError> {
        self.pages
            .get_mut(id.0)
            .ok_or(HostError::PageNotFound(id))?
            .name = name.to_string();
        Ok(())
    }

    pub fn set_page_read_only(&mut self, id: PageId, read_only: bool) -> Result<(), HostError> {
        self.pages
            .get_mut(id.0)
            .ok_or(HostError::PageNotFound(id))?
            .read_only = read_only;
        Ok(())
    }

    pub fn current_page(&self) -> PageId {
        self.current_page
    }

    pub fn set_current_page(&mut self, id: PageId) -> Result<(), HostError> {
        if self.page(id).is_none() {
            return Err(HostError::PageNotFound(id));
        }
        self.current_page = id;
        Ok(())
    }

    /// Runs `f` with `page` as the current page, then switches back to the
    /// page that was current before, whether `f` succeeded or not.
    pub fn with_current_page<T, E>(
        &mut self,
        page: PageId,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<HostError>,
    {
        let previous = self.current_page;
        self.set_current_page(page)?;
        let result = f(self);
        self.current_page = previous;
        result
    }

    pub fn selection(&self, page: PageId) -> &[NodeId] {
        self.page(page).map(|p| p.selection.as_slice()).unwrap_or(&[])
    }

    pub fn set_selection(&mut self, nodes: Vec<NodeId>) -> Result<(), HostError> {
        let page = self.current_page;
        self.pages
            .get_mut(page.0)
            .ok_or(HostError::PageNotFound(page))?
            .selection = nodes;
        Ok(())
    }

    pub fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    pub fn scroll_into_view(&mut self, nodes: &[NodeId]) {
        self.viewport = nodes
            .iter()
            .filter_map(|id| self.absolute_bounds(*id))
            .reduce(|acc, rect| acc.union(&rect));
    }

    // ----- fonts -------------------------------------------------------

    pub fn load_font(&mut self, font: &FontName) -> Result<(), HostError> {
        if !self.available_fonts.contains(font) {
            return Err(HostError::FontUnavailable(font.clone()));
        }
        self.loaded_fonts.insert(font.clone());
        Ok(())
    }

    fn require_font(&self, font: &FontName) -> Result<(), HostError> {
        if self.loaded_fonts.contains(font) {
            Ok(())
        } else {
            Err(HostError::FontNotLoaded(font.clone()))
        }
    }

    // ----- node access -------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, HostError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(HostError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn page_of(&self, id: NodeId) -> Option<PageId> {
        let mut current = self.node(id)?;
        loop {
            match current.parent? {
                Parent::Page(page) => return Some(page),
                Parent::Node(parent) => current = self.node(parent)?,
            }
        }
    }

    /// Depth-first search over the descendants of `root` (not `root` itself).
    pub fn find_one(&self, root: NodeId, pred: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.find_all(root, pred).into_iter().next()
    }

    pub fn find_all(&self, root: NodeId, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if pred(node) {
                found.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        found
    }

    /// Searches every node on `page`, top-level nodes included.
    pub fn find_on_page(&self, page: PageId, pred: impl Fn(&Node) -> bool) -> Option<NodeId> {
        let page = self.page(page)?;
        for &top in &page.children {
            let Some(node) = self.node(top) else {
                continue;
            };
            if pred(node) {
                return Some(top);
            }
            if let Some(found) = self.find_one(top, &pred) {
                return Some(found);
            }
        }
        None
    }

    pub fn absolute_position(&self, id: NodeId) -> Option<(f32, f32)> {
        let mut node = self.node(id)?;
        let (mut x, mut y) = (node.x, node.y);
        while let Some(Parent::Node(parent)) = node.parent {
            node = self.node(parent)?;
            x += node.x;
            y += node.y;
        }
        Some((x, y))
    }

    pub fn absolute_bounds(&self, id: NodeId) -> Option<Rect> {
        let node = self.node(id)?;
        let (x, y) = self.absolute_position(id)?;
        Some(Rect {
            x,
            y,
            width: node.width,
            height: node.height,
        })
    }

    // ----- creation ----------------------------------------------------

    fn ensure_writable(&self, page: PageId) -> Result<(), HostError> {
        let page = self.page(page).ok_or(HostError::PageNotFound(page))?;
        if page.read_only {
            return Err(HostError::ReadOnlyPage {
                name: page.name.clone(),
            });
        }
        Ok(())
    }

    fn insert_on_current_page(&mut self, mut node: Node) -> Result<NodeId, HostError> {
        let page = self.current_page;
        self.ensure_writable(page)?;
        let id = node.id;
        node.parent = Some(Parent::Page(page));
        self.store(node);
        self.pages[page.0].children.push(id);
        Ok(id)
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.free_slots.first().copied().unwrap_or(self.nodes.len()))
    }

    /// Puts `node` into the arena slot named by its id.
    fn store(&mut self, node: Node) {
        let index = node.id.0;
        if index < self.nodes.len() {
            self.free_slots.remove(&index);
            self.nodes[index] = Some(node);
        } else {
            self.nodes.push(Some(node));
        }
    }

    pub fn create(&mut self, kind: NodeKind, name: &str) -> Result<NodeId, HostError> {
        let node = Node::new(self.next_id(), kind, name);
        self.insert_on_current_page(node)
    }

    pub fn create_frame(&mut self, name: &str) -> Result<NodeId, HostError> {
        self.create(NodeKind::Frame, name)
    }

    pub fn create_component(&mut self, name: &str) -> Result<NodeId, HostError> {
        self.create(NodeKind::Component, name)
    }

    pub fn create_rectangle(&mut self, name: &str) -> Result<NodeId, HostError> {
        self.create(NodeKind::Rectangle, name)
    }

    pub fn create_line(&mut self, name: &str) -> Result<NodeId, HostError> {
        self.create(NodeKind::Line, name)
    }

    pub fn create_polygon(&mut self, name: &str, point_count: u32) -> Result<NodeId, HostError> {
        self.create(NodeKind::Polygon { point_count }, name)
    }

    pub fn create_vector(&mut self, name: &str, props: VectorProps) -> Result<NodeId, HostError> {
        let id = self.create(NodeKind::Vector(props), name)?;
        self.fit_vector(id);
        Ok(id)
    }

    pub fn create_text(&mut self, spec: &TextSpec) -> Result<NodeId, HostError> {
        self.require_font(&spec.font)?;
        let props = TextProps {
            characters: spec.characters.clone(),
            font: spec.font.clone(),
            font_size: spec.font_size,
            align_horizontal: spec.align_horizontal,
            align_vertical: spec.align_vertical,
            auto_resize: TextAutoResize::WidthAndHeight,
            line_height: spec.line_height,
            lines: Vec::new(),
        };
        let id = self.create(NodeKind::Text(props), &spec.name)?;
        // Measure naturally first so a hug-height text keeps its natural width.
        self.layout_node(id, Forced::default());
        let node = self.node_mut(id)?;
        node.set_fill(spec.color);
        if let NodeKind::Text(text) = &mut node.kind {
            text.auto_resize = spec.auto_resize;
        }
        if let Some(width) = spec.width {
            node.width = width;
        }
        self.layout_node(id, Forced::default());
        Ok(id)
    }

    /// Copies the component's subtree into a new instance on the current page.
    pub fn create_instance(&mut self, component: NodeId) -> Result<NodeId, HostError> {
        let source = self.node(component).ok_or(HostError::NodeNotFound(component))?;
        if !matches!(source.kind, NodeKind::Component) {
            return Err(HostError::NotAComponent(component));
        }
        self.ensure_writable(self.current_page)?;

        let mut root = source.clone();
        root.id = self.next_id();
        root.kind = NodeKind::Instance {
            main_component: component,
        };
        root.x = 0.0;
        root.y = 0.0;
        root.children.clear();
        let id = self.insert_on_current_page(root)?;
        let children = self.children(component).to_vec();
        for child in children {
            self.copy_subtree(child, id)?;
        }
        Ok(id)
    }

    fn copy_subtree(&mut self, source: NodeId, parent: NodeId) -> Result<(), HostError> {
        let mut copy = self
            .node(source)
            .cloned()
            .ok_or(HostError::NodeNotFound(source))?;
        let id = self.next_id();
        copy.id = id;
        copy.parent = Some(Parent::Node(parent));
        let children = std::mem::take(&mut copy.children);
        self.store(copy);
        self.node_mut(parent)?.children.push(id);
        for child in children {
            self.copy_subtree(child, id)?;
        }
        Ok(())
    }

    // ----- mutation ----------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let parent_node = self.node(parent).ok_or(HostError::NodeNotFound(parent))?;
        if !parent_node.kind.is_container() {
            return Err(HostError::InvalidHierarchy {
                parent,
                child,
                reason: "parent cannot have children",
            });
        }
        if !self.contains(child) {
            return Err(HostError::NodeNotFound(child));
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(HostError::InvalidHierarchy {
                parent,
                child,
                reason: "node would become its own descendant",
            });
        }
        if let Some(page) = self.page_of(parent) {
            self.ensure_writable(page)?;
        }

        self.detach(child);
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(Parent::Node(parent));
        self.relayout_from(child);
        Ok(())
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(Parent::Node(parent)) = current {
            if parent == ancestor {
                return true;
            }
            current = self.node(parent).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return;
        };
        match parent {
            Parent::Page(page) => {
                if let Some(page) = self.pages.get_mut(page.0) {
                    page.children.retain(|child| *child != id);
                }
            }
            Parent::Node(parent) => {
                if let Ok(parent_node) = self.node_mut(parent) {
                    parent_node.children.retain(|child| *child != id);
                }
                self.relayout_from(parent);
            }
        }
        if let Some(Some(node)) = self.nodes.get_mut(id.0) {
            node.parent = None;
        }
    }

    /// Deletes a node together with its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), HostError> {
        if !self.contains(id) {
            return Err(HostError::NodeNotFound(id));
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                self.free_slots.insert(current.0);
                stack.extend(node.children);
            }
        }
        for page in &mut self.pages {
            page.selection.retain(|selected| self.nodes.get(selected.0).is_some_and(Option::is_some));
        }
        Ok(())
    }

    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Resizes a node. Children of containers without auto layout follow
    /// their constraints.
    pub fn resize(&mut self, id: NodeId, width: f32, height: f32) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        let dw = width - node.width;
        let dh = height - node.height;
        node.width = width;
        node.height = height;
        if let NodeKind::Text(text) = &mut node.kind
            && text.auto_resize == TextAutoResize::WidthAndHeight
        {
            text.auto_resize = TextAutoResize::Height;
        }
        // An explicit size pins both auto-layout axes.
        if let Some(layout) = &mut node.auto_layout {
            layout.primary_sizing = Sizing::Fixed;
            layout.counter_sizing = Sizing::Fixed;
        }
        if node.auto_layout.is_none() && node.kind.is_container() {
            let children = node.children.clone();
            for child in children {
                self.apply_constraints(child, dw, dh)?;
            }
        }
        self.relayout_from(id);
        Ok(())
    }

    fn apply_constraints(&mut self, id: NodeId, dw: f32, dh: f32) -> Result<(), HostError> {
        let node = self.node_mut(id)?;
        let (new_w, new_h) = (node.width, node.height);
        let (x, width) = constrain(node.constraints.horizontal, node.x, new_w, dw);
        let (y, height) = constrain(node.constraints.vertical, node.y, new_h, dh);
        node.x = x;
        node.y = y;
        if width != new_w || height != new_h {
            self.resize(id, width, height)?;
        }
        Ok(())
    }

    pub fn set_characters(&mut self, id: NodeId, characters: &str) -> Result<(), HostError> {
        let node = self.node(id).ok_or(HostError::NodeNotFound(id))?;
        let NodeKind::Text(text) = &node.kind else {
            return Err(HostError::NotText(id));
        };
        self.require_font(&text.font)?;
        if let NodeKind::Text(text) = &mut self.node_mut(id)?.kind {
            text.characters = characters.to_string();
        }
        self.relayout_from(id);
        Ok(())
    }

    pub fn set_auto_layout(&mut self, id: NodeId, layout: AutoLayout) -> Result<(), HostError> {
        self.node_mut(id)?.auto_layout = Some(layout);
        self.relayout_from(id);
        Ok(())
    }

    /// Re-runs layout from the outermost auto-layout ancestor of `id`.
    pub fn relayout_from(&mut self, id: NodeId) {
        let mut root = id;
        while let Some(Parent::Node(parent)) = self.node(root).and_then(|n| n.parent) {
            match self.node(parent) {
                Some(node) if node.auto_layout.is_some() => root = parent,
                _ => break,
            }
        }
        self.layout_node(root, Forced::default());
    }

    fn fit_vector(&mut self, id: NodeId) {
        let Ok(node) = self.node_mut(id) else {
            return;
        };
        if let NodeKind::Vector(VectorProps {
            geometry: VectorGeometry::Network { vertices, .. },
            ..
        }) = &node.kind
        {
            let max_x = vertices.iter().map(|v| v.x).fold(0.0, f32::max);
            let max_y = vertices.iter().map(|v| v.y).fold(0.0, f32::max);
            node.width = max_x;
            node.height = max_y;
        }
    }
}

fn constrain(constraint: Constraint, position: f32, size: f32, delta: f32) -> (f32, f32) {
    match constraint {
        Constraint::Min => (position, size),
        Constraint::Max => (position + delta, size),
        Constraint::Center => (position + delta / 2.0, size),
        Constraint::Stretch => (position, (size + delta).max(0.0)),
    }
}
