use uxflow::components::{Library, NOTE_DETAILS_LABEL, NOTE_NUMBER_LABEL, ShapeKind};
use uxflow::config::Config;
use uxflow::document::{NodeKind, PageId};
use uxflow::plugin::SUCCESS_MESSAGE;
use uxflow::render::render_svg;
use uxflow::theme::ThemeMode;
use uxflow::{Document, FlowRequest, Plugin, PluginMessage, generate_flow, parse_message};

fn checkout() -> FlowRequest {
    FlowRequest {
        theme: ThemeMode::Light,
        flow_name: "Checkout".to_string(),
        flow_steps: "Enter checkout\nEnter payment\nConfirm order".to_string(),
        ..FlowRequest::default()
    }
}

fn components(doc: &Document, page: PageId) -> Vec<String> {
    doc.page(page)
        .map(|p| {
            p.children
                .iter()
                .filter_map(|id| doc.node(*id))
                .filter(|node| matches!(node.kind, NodeKind::Component))
                .map(|node| node.name.clone())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn checkout_flow_end_to_end() {
    let mut doc = Document::new();
    let config = Config::default();
    let report = generate_flow(&mut doc, &checkout(), &config).expect("generation failed");

    let frame = doc.node(report.frame).expect("frame");
    assert_eq!(frame.name, "Checkout");
    assert!(frame.height >= config.layout.frame_min_height);
    assert_eq!(report.height.height, frame.height);

    assert_eq!(report.notes.len(), 3);
    for (index, note) in report.notes.iter().enumerate() {
        let number = doc
            .find_one(*note, |n| n.is_text_named(NOTE_NUMBER_LABEL))
            .and_then(|id| doc.node(id))
            .and_then(|n| n.text().map(|t| t.characters.clone()))
            .expect("note number");
        assert_eq!(number, (index + 1).to_string());
        let details = doc
            .find_one(*note, |n| n.is_text_named(NOTE_DETAILS_LABEL))
            .and_then(|id| doc.node(id))
            .and_then(|n| n.text().map(|t| t.characters.clone()))
            .expect("note details");
        assert_eq!(details, report.steps[index]);
        let x = doc.node(*note).map(|n| n.x).expect("note");
        assert!(x >= config.layout.right_column_x());
    }

    assert_eq!(report.shapes.len(), 3);
    assert_eq!(report.connectors.len(), 2);
    let templates: Vec<_> = report
        .shapes
        .iter()
        .map(|id| match doc.node(*id).map(|n| &n.kind) {
            Some(NodeKind::Instance { main_component }) => *main_component,
            other => panic!("expected instance, got {other:?}"),
        })
        .collect();
    let enter = report.library.find(&doc, ShapeKind::EnterProcess).expect("enter");
    let action = report.library.find(&doc, ShapeKind::UserAction).expect("action");
    assert_eq!(templates, vec![enter.node, action.node, action.node]);

    assert!(report.sticker.is_complete());
    assert_eq!(doc.selection(doc.current_page()), [report.frame]);
    assert_eq!(doc.current_page(), PageId(0));
}

#[test]
fn rerun_reuses_library_and_templates() {
    let mut doc = Document::new();
    let config = Config::default();
    let first = generate_flow(&mut doc, &checkout(), &config).expect("first run");
    let library_page = first.library.page();
    let templates_before = components(&doc, library_page);

    let second = generate_flow(&mut doc, &checkout(), &config).expect("second run");
    assert_eq!(second.library.page(), library_page);
    assert_eq!(doc.pages().len(), 2);
    assert_eq!(components(&doc, library_page), templates_before);
    assert_eq!(templates_before.len(), ShapeKind::ALL.len());

    assert_ne!(first.frame, second.frame);
    assert_ne!(first.sticker.frame, second.sticker.frame);
    let page = doc.page(PageId(0)).expect("page");
    assert_eq!(page.children.len(), 4);
}

#[test]
fn themes_use_separate_libraries() {
    let mut doc = Document::new();
    let config = Config::default();
    generate_flow(&mut doc, &checkout(), &config).expect("light");
    let dark = FlowRequest {
        theme: ThemeMode::Dark,
        ..checkout()
    };
    let report = generate_flow(&mut doc, &dark, &config).expect("dark");
    assert_eq!(doc.pages().len(), 3);
    assert_eq!(
        doc.page(report.library.page()).map(|p| p.name.clone()),
        Some(Library::page_name(ThemeMode::Dark))
    );
}

#[test]
fn marker_only_input_builds_empty_frame() {
    let mut doc = Document::new();
    let request = FlowRequest {
        flow_steps: "-\n1.".to_string(),
        ..checkout()
    };
    let report = generate_flow(&mut doc, &request, &Config::default()).expect("generation");
    assert!(report.steps.is_empty());
    assert!(report.notes.is_empty());
    assert!(report.shapes.is_empty());
    assert!(report.connectors.is_empty());
    assert!(doc.contains(report.metadata));
    assert_eq!(
        doc.node(report.metadata).and_then(|n| n.parent),
        Some(uxflow::document::Parent::Node(report.frame))
    );
}

#[test]
fn blank_steps_fall_back_to_placeholders() {
    let mut doc = Document::new();
    let request = FlowRequest {
        flow_steps: "   \n".to_string(),
        ..checkout()
    };
    let report = generate_flow(&mut doc, &request, &Config::default()).expect("generation");
    assert_eq!(report.steps.len(), 3);
    assert_eq!(report.shapes.len(), 3);
}

#[test]
fn height_grows_with_content() {
    let config = Config::default();
    let mut previous = 0.0;
    for count in [1, 5, 10, 20] {
        let mut doc = Document::new();
        let steps: Vec<String> = (1..=count).map(|i| format!("{i}. Step number {i}")).collect();
        let request = FlowRequest {
            flow_steps: steps.join("\n"),
            trigger: "long trigger text ".repeat(count),
            ..checkout()
        };
        let report = generate_flow(&mut doc, &request, &config).expect("generation");
        assert!(report.height.height >= previous, "{count} steps");
        previous = report.height.height;
    }
}

#[test]
fn measurement_probes_are_removed() {
    let mut doc = Document::new();
    let report = generate_flow(&mut doc, &checkout(), &Config::default()).expect("generation");
    let library = doc.page(report.library.page()).expect("library page");
    for id in &library.children {
        let node = doc.node(*id).expect("library node");
        assert!(matches!(node.kind, NodeKind::Component), "{} left behind", node.name);
    }
}

#[test]
fn locked_library_fails_and_restores_page() {
    let mut doc = Document::new();
    let config = Config::default();
    generate_flow(&mut doc, &checkout(), &config).expect("seed run");
    let library = Library::require(&doc, ThemeMode::Light).expect("library");
    doc.set_page_read_only(library.page(), true).expect("lock");

    // Note measurement needs to place probes on the library page.
    let nodes = doc.node_count();
    assert!(generate_flow(&mut doc, &checkout(), &config).is_err());
    assert_eq!(doc.current_page(), PageId(0));
    assert!(doc.node_count() > nodes);

    let mut fresh = Document::new();
    let library = Library::find_or_create(&mut fresh, ThemeMode::Light);
    fresh.set_page_read_only(library.page(), true).expect("lock");
    let mut plugin = Plugin::new(config);
    let outcome = plugin.handle(&mut fresh, PluginMessage::InitializeFlow(checkout()));
    assert!(outcome.is_none());
    assert!(!plugin.is_closed());
    assert_eq!(fresh.current_page(), PageId(0));
    assert!(
        plugin
            .notifications()
            .iter()
            .any(|n| n.starts_with("Failed to create flow diagram:"))
    );
}

#[test]
fn plugin_session_from_json_message() {
    let mut doc = Document::new();
    let mut plugin = Plugin::default();
    let message = parse_message(
        r#"{"type":"initialize-flow","data":{"theme":"dark","flowName":"Onboarding","flowSteps":"1. Welcome\n2. Profile"}}"#,
    )
    .expect("message");
    let report = plugin.handle(&mut doc, message).expect("report");
    assert_eq!(plugin.notifications(), [SUCCESS_MESSAGE.to_string()]);
    assert_eq!(report.shapes.len(), 2);

    let svg = render_svg(&doc, doc.current_page(), &Config::default().render);
    assert!(svg.contains("Onboarding"));
    assert!(svg.contains("Welcome"));
}

#[test]
fn document_survives_json_round_trip() {
    let mut doc = Document::new();
    generate_flow(&mut doc, &checkout(), &Config::default()).expect("generation");
    let json = doc.to_json().expect("serialize");
    let mut restored = Document::from_json(&json).expect("deserialize");
    assert_eq!(restored.node_count(), doc.node_count());

    let before = restored.pages().len();
    generate_flow(&mut restored, &checkout(), &Config::default()).expect("rerun");
    assert_eq!(restored.pages().len(), before);
}

#[test]
fn template_failure_before_fonts_does_not_poison_later_runs() {
    let mut doc = Document::new();
    let theme = uxflow::theme::Theme::light();
    let library = Library::find_or_create(&mut doc, theme.mode);
    assert!(library.get_or_create(&mut doc, ShapeKind::UserAction, &theme).is_err());

    let request = FlowRequest {
        flow_steps: "A\nB".to_string(),
        ..checkout()
    };
    let report = generate_flow(&mut doc, &request, &Config::default()).expect("generation");
    let second = report.shapes[1];
    let label = doc
        .find_one(second, |n| n.is_text_named(uxflow::components::STEP_NUMBER_LABEL))
        .and_then(|id| doc.node(id))
        .and_then(|n| n.text().map(|t| t.characters.clone()));
    assert_eq!(label.as_deref(), Some("2"));
}

#[test]
fn longer_metadata_never_lowers_the_height() {
    let config = Config::default();
    let mut previous = 0.0;
    for words in [0, 50, 400, 1500] {
        let mut doc = Document::new();
        let request = FlowRequest {
            assumptions: "assumption ".repeat(words),
            postconditions: "done ".repeat(words),
            ..checkout()
        };
        let report = generate_flow(&mut doc, &request, &config).expect("generation");
        assert_eq!(report.steps.len(), 3);
        assert!(report.height.height >= previous, "{words} words");
        previous = report.height.height;
    }
    assert!(previous > config.layout.frame_min_height);
}
