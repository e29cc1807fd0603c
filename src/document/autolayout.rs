use super::{
    Align, AutoLayout, Document, LayoutAlign, Node, NodeId, NodeKind, Sizing, TextAutoResize,
};
use crate::text_metrics::{measure_text_width, wrap_text};

/// Sizes imposed by an auto-layout parent (stretch or grow). A forced axis
/// behaves as fixed for the duration of the pass.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Forced {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Forced {
    fn along(horizontal: bool, primary: Option<f32>, counter: Option<f32>) -> Self {
        if horizontal {
            Self {
                width: primary,
                height: counter,
            }
        } else {
            Self {
                width: counter,
                height: primary,
            }
        }
    }
}

enum Pass {
    Text,
    Auto(AutoLayout),
    /// Container without auto layout; children keep their positions.
    Free(Vec<NodeId>),
    Leaf,
}

fn primary_of(node: &Node, horizontal: bool) -> f32 {
    if horizontal { node.width } else { node.height }
}

fn counter_of(node: &Node, horizontal: bool) -> f32 {
    if horizontal { node.height } else { node.width }
}

fn align_offset(align: Align, free: f32) -> f32 {
    match align {
        Align::Min => 0.0,
        Align::Center => free / 2.0,
        Align::Max => free,
    }
}

impl Document {
    pub(super) fn layout_node(&mut self, id: NodeId, forced: Forced) {
        let pass = match self.node(id) {
            None => return,
            Some(node) => match (&node.kind, &node.auto_layout) {
                (NodeKind::Text(_), _) => Pass::Text,
                (kind, Some(layout)) if kind.is_container() => Pass::Auto(layout.clone()),
                (kind, None) if kind.is_container() => Pass::Free(node.children.clone()),
                _ => Pass::Leaf,
            },
        };
        match pass {
            Pass::Text => self.layout_text(id, forced),
            Pass::Auto(layout) => self.layout_auto(id, &layout, forced),
            Pass::Free(children) => {
                self.apply_forced(id, forced);
                for child in children {
                    self.layout_node(child, Forced::default());
                }
            }
            Pass::Leaf => self.apply_forced(id, forced),
        }
    }

    fn apply_forced(&mut self, id: NodeId, forced: Forced) {
        if let Ok(node) = self.node_mut(id) {
            if let Some(width) = forced.width {
                node.width = width;
            }
            if let Some(height) = forced.height {
                node.height = height;
            }
        }
    }

    fn layout_text(&mut self, id: NodeId, forced: Forced) {
        let fast = self.fast_text();
        let Ok(node) = self.node_mut(id) else {
            return;
        };
        if let Some(width) = forced.width {
            node.width = width;
        }
        let width = node.width;
        let NodeKind::Text(text) = &mut node.kind else {
            return;
        };

        let mode = match text.auto_resize {
            TextAutoResize::WidthAndHeight if forced.width.is_some() => TextAutoResize::Height,
            mode => mode,
        };
        let family = text.font.family.clone();
        let bold = text.font.is_bold();
        let size = text.font_size;
        let lines: Vec<String> = match mode {
            TextAutoResize::WidthAndHeight => text.characters.split('\n').map(String::from).collect(),
            _ => wrap_text(&text.characters, width, size, &family, bold, fast),
        };
        let natural_width = lines
            .iter()
            .map(|line| measure_text_width(line, size, &family, bold, fast))
            .fold(0.0, f32::max);
        let height = lines.len() as f32 * text.line_height.resolve(size);
        text.lines = lines;

        match mode {
            TextAutoResize::WidthAndHeight => {
                node.width = natural_width;
                node.height = height;
            }
            TextAutoResize::Height => node.height = height,
            TextAutoResize::None => {}
        }
        if let Some(forced_height) = forced.height {
            node.height = forced_height;
        }
    }

    fn layout_auto(&mut self, id: NodeId, layout: &AutoLayout, forced: Forced) {
        let horizontal = layout.is_horizontal();
        let children = self.children(id).to_vec();
        for &child in &children {
            self.layout_node(child, Forced::default());
        }

        let Some(node) = self.node(id) else {
            return;
        };
        let pad = layout.padding;
        let (pad_start, pad_primary, pad_counter_start, pad_counter) = if horizontal {
            (pad.left, pad.left + pad.right, pad.top, pad.top + pad.bottom)
        } else {
            (pad.top, pad.top + pad.bottom, pad.left, pad.left + pad.right)
        };
        let (forced_primary, forced_counter) = if horizontal {
            (forced.width, forced.height)
        } else {
            (forced.height, forced.width)
        };
        let (min_primary, min_counter) = if horizontal {
            (node.min_width, node.min_height)
        } else {
            (node.min_height, node.min_width)
        };

        let counter = match (forced_counter, layout.counter_sizing) {
            (Some(size), _) => size,
            (None, Sizing::Fixed) => counter_of(node, horizontal),
            (None, Sizing::Hug) => {
                let widest = children
                    .iter()
                    .filter_map(|child| self.node(*child))
                    .map(|child| counter_of(child, horizontal))
                    .fold(0.0, f32::max);
                (widest + pad_counter).max(min_counter.unwrap_or(0.0))
            }
        };
        let inner_counter = (counter - pad_counter).max(0.0);

        let stretched: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|child| {
                self.node(*child)
                    .is_some_and(|n| n.layout_align == LayoutAlign::Stretch)
            })
            .collect();
        for &child in &stretched {
            self.layout_node(child, Forced::along(horizontal, None, Some(inner_counter)));
        }

        let content = self.primary_extent(&children, horizontal, layout.item_spacing);
        let primary = match (forced_primary, layout.primary_sizing) {
            (Some(size), _) => size,
            (None, Sizing::Fixed) => self
                .node(id)
                .map(|n| primary_of(n, horizontal))
                .unwrap_or(content + pad_primary),
            (None, Sizing::Hug) => (content + pad_primary).max(min_primary.unwrap_or(0.0)),
        };

        let growing: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|child| self.node(*child).is_some_and(|n| n.layout_grow > 0.0))
            .collect();
        let slack = primary - pad_primary - content;
        if slack > 0.0 && !growing.is_empty() {
            let share = slack / growing.len() as f32;
            for &child in &growing {
                let Some(grown) = self.node(child).map(|n| primary_of(n, horizontal) + share) else {
                    continue;
                };
                let counter_size = stretched.contains(&child).then_some(inner_counter);
                self.layout_node(child, Forced::along(horizontal, Some(grown), counter_size));
            }
        }

        let content = self.primary_extent(&children, horizontal, layout.item_spacing);
        let inner_primary = primary - pad_primary;
        let mut cursor = pad_start + align_offset(layout.primary_align, inner_primary - content);
        for &child in &children {
            let Ok(child_node) = self.node_mut(child) else {
                continue;
            };
            let free = inner_counter - counter_of(child_node, horizontal);
            let across = pad_counter_start + align_offset(layout.counter_align, free);
            if horizontal {
                child_node.x = cursor;
                child_node.y = across;
            } else {
                child_node.x = across;
                child_node.y = cursor;
            }
            cursor += primary_of(child_node, horizontal) + layout.item_spacing;
        }

        if let Ok(node) = self.node_mut(id) {
            if horizontal {
                node.width = primary;
                node.height = counter;
            } else {
                node.width = counter;
                node.height = primary;
            }
        }
    }

    fn primary_extent(&self, children: &[NodeId], horizontal: bool, spacing: f32) -> f32 {
        let sizes: Vec<f32> = children
            .iter()
            .filter_map(|child| self.node(*child))
            .map(|child| primary_of(child, horizontal))
            .collect();
        let gaps = sizes.len().saturating_sub(1) as f32 * spacing;
        sizes.iter().sum::<f32>() + gaps
    }
}
