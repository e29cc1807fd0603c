use serde::Serialize;
use uxflow::config::{Config, parse_config};
use uxflow::render::render_svg;
use uxflow::{Document, Plugin, parse_message};
use wasm_bindgen::prelude::*;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PluginResponse {
    document: String,
    notifications: Vec<String>,
    closed: bool,
    svg: String,
}

fn handle(
    document_json: Option<&str>,
    message_json: &str,
    config_json: Option<&str>,
) -> Result<PluginResponse, String> {
    let config = match config_json {
        Some(raw) => parse_config(raw).map_err(|error| error.to_string())?,
        None => Config {
            fast_text_metrics: true,
            ..Config::default()
        },
    };
    let mut doc = match document_json {
        Some(raw) => Document::from_json(raw).map_err(|error| error.to_string())?,
        None => Document::new(),
    };
    doc.use_system_fonts(!config.fast_text_metrics);
    let message = parse_message(message_json).map_err(|error| error.to_string())?;

    let mut plugin = Plugin::new(config.clone());
    plugin.handle(&mut doc, message);

    Ok(PluginResponse {
        document: doc.to_json().map_err(|error| error.to_string())?,
        notifications: plugin.notifications().to_vec(),
        closed: plugin.is_closed(),
        svg: render_svg(&doc, doc.current_page(), &config.render),
    })
}

/// Runs one panel message against a serialized document and returns the
/// updated document, the notifications and a preview of the current page.
#[wasm_bindgen]
pub fn handle_plugin_message(
    document_json: Option<String>,
    message_json: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let response = handle(document_json.as_deref(), message_json, config_json.as_deref())
        .map_err(|error| JsValue::from_str(&error))?;
    serde_json::to_string(&response).map_err(|error| JsValue::from_str(&error.to_string()))
}
