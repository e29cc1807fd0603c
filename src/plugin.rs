use crate::composer::{FlowReport, FlowRequest, generate_flow};
use crate::config::Config;
use crate::document::Document;
use crate::error::FlowError;
use anyhow::Context;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Flow diagram and sticker sheet created!";

/// Messages the UI panel posts to the plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum PluginMessage {
    InitializeFlow(FlowRequest),
    Cancel,
}

/// Parses a panel message, accepting JSON5 when strict JSON fails.
pub fn parse_message(input: &str) -> anyhow::Result<PluginMessage> {
    match serde_json::from_str(input) {
        Ok(message) => Ok(message),
        Err(strict) => json5::from_str(input)
            .with_context(|| format!("invalid plugin message ({strict})")),
    }
}

/// One plugin session: handles messages until it is closed and keeps the
/// notifications the user would have seen.
#[derive(Debug, Default)]
pub struct Plugin {
    config: Config,
    notifications: Vec<String>,
    closed: bool,
}

impl Plugin {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            notifications: Vec::new(),
            closed: false,
        }
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(message = message.as_str(); "Notification");
        self.notifications.push(message);
    }

    fn close(&mut self) {
        self.closed = true;
    }

    /// Handles one message. A failed generation is reported through the
    /// notifications and leaves the session open.
    pub fn handle(&mut self, doc: &mut Document, message: PluginMessage) -> Option<FlowReport> {
        if self.closed {
            warn!("Ignoring message for a closed session");
            return None;
        }
        match message {
            PluginMessage::InitializeFlow(request) => match self.create_flow_diagram(doc, &request) {
                Ok(report) => {
                    self.close();
                    Some(report)
                }
                Err(err) => {
                    error!("Message handler failed: {err}");
                    self.notify(format!("Error: {err}"));
                    None
                }
            },
            PluginMessage::Cancel => {
                self.close();
                None
            }
        }
    }

    fn create_flow_diagram(
        &mut self,
        doc: &mut Document,
        request: &FlowRequest,
    ) -> Result<FlowReport, FlowError> {
        match generate_flow(doc, request, &self.config) {
            Ok(report) => {
                for failure in &report.sticker.failures {
                    self.notify(failure.message());
                }
                self.notify(SUCCESS_MESSAGE);
                Ok(report)
            }
            Err(err) => {
                self.notify(format!("Failed to create flow diagram: {err}"));
                Err(err)
            }
        }
    }
}
