use crate::config::RenderConfig;
use crate::document::{
    Document, Node, NodeId, NodeKind, PageId, Paint, Rect, StrokeCap, TextAlign, TextProps,
    VectorGeometry, VerticalAlign,
};
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

/// Renders every top-level node of `page` into one SVG document.
pub fn render_svg(doc: &Document, page: PageId, config: &RenderConfig) -> String {
    let roots: Vec<NodeId> = doc
        .page(page)
        .map(|p| p.children.clone())
        .unwrap_or_default();
    let bounds = roots
        .iter()
        .filter_map(|id| doc.absolute_bounds(*id))
        .reduce(|acc, rect| acc.union(&rect))
        .unwrap_or(Rect {
            x: 0.0,
            y: 0.0,
            width: config.width,
            height: config.height,
        });

    let pad = config.padding;
    let min_x = bounds.x - pad;
    let min_y = bounds.y - pad;
    let width = (bounds.width + pad * 2.0).max(1.0);
    let height = (bounds.height + pad * 2.0).max(1.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"{min_x:.2} {min_y:.2} {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect x=\"{min_x:.2}\" y=\"{min_y:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&config.background)
    ));
    svg.push_str("<defs>");
    svg.push_str(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"8\" markerHeight=\"8\" orient=\"auto-start-reverse\" markerUnits=\"userSpaceOnUse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"context-stroke\"/></marker>",
    );
    svg.push_str("</defs>");

    for id in roots {
        render_node(doc, id, &mut svg);
    }

    svg.push_str("</svg>");
    svg
}

fn render_node(doc: &Document, id: NodeId, svg: &mut String) {
    let Some(node) = doc.node(id) else {
        return;
    };
    let _ = write!(
        svg,
        "<g data-name=\"{}\" transform=\"translate({:.2} {:.2})\">",
        escape_xml(&node.name),
        node.x,
        node.y
    );

    match &node.kind {
        NodeKind::Frame | NodeKind::Component | NodeKind::Instance { .. } | NodeKind::Rectangle => {
            svg.push_str(&box_svg(node));
        }
        NodeKind::Line => {
            let _ = write!(
                svg,
                "<line x1=\"0\" y1=\"0\" x2=\"{:.2}\" y2=\"0\" {}/>",
                node.width,
                stroke_attrs(node)
            );
        }
        NodeKind::Polygon { point_count } => {
            let points = polygon_points(*point_count, node.width, node.height);
            let _ = write!(
                svg,
                "<polygon points=\"{points}\" {} {}/>",
                fill_attrs(&node.fills),
                stroke_attrs(node)
            );
        }
        NodeKind::Vector(vector) => match &vector.geometry {
            VectorGeometry::Path(data) => {
                let _ = write!(
                    svg,
                    "<path d=\"{}\" {} {}/>",
                    escape_xml(data),
                    fill_attrs(&node.fills),
                    stroke_attrs(node)
                );
            }
            VectorGeometry::Network { vertices, segments } => {
                for &(start, end) in segments {
                    let (Some(a), Some(b)) = (vertices.get(start), vertices.get(end)) else {
                        continue;
                    };
                    let mut markers = String::new();
                    if b.stroke_cap == StrokeCap::ArrowEquilateral {
                        markers.push_str(" marker-end=\"url(#arrow)\"");
                    }
                    if a.stroke_cap == StrokeCap::ArrowEquilateral {
                        markers.push_str(" marker-start=\"url(#arrow)\"");
                    }
                    let _ = write!(
                        svg,
                        "<path d=\"M {:.2} {:.2} L {:.2} {:.2}\" fill=\"none\" {}{markers}/>",
                        a.x,
                        a.y,
                        b.x,
                        b.y,
                        stroke_attrs(node)
                    );
                }
            }
        },
        NodeKind::Text(text) => {
            svg.push_str(&text_svg(node, text));
        }
    }

    for child in &node.children {
        render_node(doc, *child, svg);
    }
    svg.push_str("</g>");
}

fn box_svg(node: &Node) -> String {
    if node.fills.is_empty() && node.strokes.is_empty() {
        return String::new();
    }
    let limit = node.width.min(node.height) / 2.0;
    let [tl, tr, br, bl] = node.corner_radii.map(|r| r.min(limit).max(0.0));
    let paint = format!("{} {}", fill_attrs(&node.fills), stroke_attrs(node));
    if tl == tr && tr == br && br == bl {
        return format!(
            "<rect width=\"{:.2}\" height=\"{:.2}\" rx=\"{tl:.2}\" ry=\"{tl:.2}\" {paint}/>",
            node.width, node.height
        );
    }
    let (w, h) = (node.width, node.height);
    format!(
        "<path d=\"M {tl:.2} 0 L {:.2} 0 Q {w:.2} 0 {w:.2} {tr:.2} L {w:.2} {:.2} Q {w:.2} {h:.2} {:.2} {h:.2} L {bl:.2} {h:.2} Q 0 {h:.2} 0 {:.2} L 0 {tl:.2} Q 0 0 {tl:.2} 0 Z\" {paint}/>",
        w - tr,
        h - br,
        w - br,
        h - bl,
    )
}

fn text_svg(node: &Node, text: &TextProps) -> String {
    let line_height = text.line_height.resolve(text.font_size);
    let block_height = text.lines.len() as f32 * line_height;
    let top = match text.align_vertical {
        VerticalAlign::Top => 0.0,
        VerticalAlign::Center => (node.height - block_height) / 2.0,
        VerticalAlign::Bottom => node.height - block_height,
    };
    let (x, anchor) = match text.align_horizontal {
        TextAlign::Left => (0.0, "start"),
        TextAlign::Center => (node.width / 2.0, "middle"),
        TextAlign::Right => (node.width, "end"),
    };
    let weight = if text.font.is_bold() { "700" } else { "400" };
    let fill = fill_attrs(&node.fills);

    let mut out = format!(
        "<text x=\"{x:.2}\" text-anchor=\"{anchor}\" font-family=\"{}, sans-serif\" font-size=\"{}\" font-weight=\"{weight}\" {fill}>",
        escape_xml(&text.font.family),
        text.font_size
    );
    for (idx, line) in text.lines.iter().enumerate() {
        let baseline = top + idx as f32 * line_height + (line_height + text.font_size * 0.7) / 2.0;
        let _ = write!(
            out,
            "<tspan x=\"{x:.2}\" y=\"{baseline:.2}\">{}</tspan>",
            escape_xml(line)
        );
    }
    out.push_str("</text>");
    out
}

fn fill_attrs(fills: &[Paint]) -> String {
    match fills.first() {
        Some(paint) => paint_attrs("fill", paint),
        None => "fill=\"none\"".to_string(),
    }
}

fn stroke_attrs(node: &Node) -> String {
    match node.strokes.first() {
        Some(paint) => format!(
            "{} stroke-width=\"{}\"",
            paint_attrs("stroke", paint),
            node.stroke_weight
        ),
        None => String::new(),
    }
}

fn paint_attrs(attr: &str, paint: &Paint) -> String {
    if paint.opacity < 1.0 {
        format!(
            "{attr}=\"{}\" {attr}-opacity=\"{:.3}\"",
            paint.color.to_hex(),
            paint.opacity
        )
    } else {
        format!("{attr}=\"{}\"", paint.color.to_hex())
    }
}

/// Regular polygon inscribed in the node's box, first point at the top.
fn polygon_points(count: u32, width: f32, height: f32) -> String {
    let count = count.max(3);
    let (cx, cy) = (width / 2.0, height / 2.0);
    (0..count)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / count as f32 - std::f32::consts::FRAC_PI_2;
            format!("{:.2},{:.2}", cx + cx * angle.cos(), cy + cy * angle.sin())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{FlowRequest, generate_flow};
    use crate::config::Config;

    #[test]
    fn renders_generated_page() {
        let mut doc = Document::new();
        let request = FlowRequest {
            flow_name: "Returns & refunds".to_string(),
            flow_steps: "Open order\nRequest refund".to_string(),
            ..FlowRequest::default()
        };
        generate_flow(&mut doc, &request, &Config::default()).expect("flow");
        let svg = render_svg(&doc, doc.current_page(), &RenderConfig::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Returns &amp; refunds"));
        assert!(svg.contains("marker-end=\"url(#arrow)\""));
        assert!(svg.contains("Flow Diagram Sticker Sheet"));
    }

    #[test]
    fn empty_page_uses_configured_size() {
        let doc = Document::new();
        let svg = render_svg(&doc, PageId(0), &RenderConfig::default());
        assert!(svg.contains("width=\"2480\""));
    }

    #[test]
    fn diamond_has_four_points() {
        let points = polygon_points(4, 110.0, 50.0);
        assert_eq!(points.split(' ').count(), 4);
        assert!(points.starts_with("55.00,0.00"));
    }
}
