use crate::document::{Document, NodeId, NodeKind};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Flattened, human-readable snapshot of a document's page trees.
#[derive(Debug, Serialize)]
pub struct DocumentDump {
    pub current_page: String,
    pub pages: Vec<PageDump>,
}

#[derive(Debug, Serialize)]
pub struct PageDump {
    pub name: String,
    pub read_only: bool,
    pub selection: Vec<String>,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_component: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDump>,
}

impl NodeDump {
    fn from_node(doc: &Document, id: NodeId) -> Option<Self> {
        let node = doc.node(id)?;
        let characters = node.text().map(|text| text.characters.clone());
        let main_component = match node.kind {
            NodeKind::Instance { main_component } => Some(main_component.to_string()),
            _ => None,
        };
        Some(NodeDump {
            id: id.to_string(),
            kind: node.kind.type_name().to_string(),
            name: node.name.clone(),
            x: node.x,
            y: node.y,
            width: node.width,
            height: node.height,
            characters,
            main_component,
            children: node
                .children
                .iter()
                .filter_map(|child| NodeDump::from_node(doc, *child))
                .collect(),
        })
    }
}

impl DocumentDump {
    pub fn from_document(doc: &Document) -> Self {
        let pages = doc
            .pages()
            .iter()
            .map(|page| PageDump {
                name: page.name.clone(),
                read_only: page.read_only,
                selection: page.selection.iter().map(ToString::to_string).collect(),
                nodes: page
                    .children
                    .iter()
                    .filter_map(|id| NodeDump::from_node(doc, *id))
                    .collect(),
            })
            .collect();

        let current_page = doc
            .page(doc.current_page())
            .map(|page| page.name.clone())
            .unwrap_or_default();

        DocumentDump {
            current_page,
            pages,
        }
    }
}

pub fn write_dump(path: &Path, doc: &Document) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = DocumentDump::from_document(doc);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
