#[cfg(feature = "cli")]
pub mod cli;
pub mod components;
pub mod composer;
pub mod config;
pub mod document;
pub mod dump;
pub mod error;
pub mod height;
pub mod plugin;
pub mod render;
pub mod steps;
pub mod sticker;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use composer::{FlowReport, FlowRequest, generate_flow};
pub use document::{Document, HostError};
pub use error::FlowError;
pub use plugin::{Plugin, PluginMessage, parse_message};
