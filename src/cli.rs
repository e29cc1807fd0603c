use crate::composer::FlowRequest;
use crate::config::{Config, load_config};
use crate::document::Document;
use crate::dump::write_dump;
use crate::plugin::{Plugin, PluginMessage, parse_message};
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::{render_svg, write_output_svg};
use crate::theme::ThemeMode;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, info};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "uxflow",
    version,
    about = "Generate UX flow diagrams and their sticker sheet"
)]
pub struct Args {
    /// Panel message file (JSON or JSON5), or '-' for stdin. Overrides the flow flags.
    #[arg(short = 'm', long = "message")]
    pub message: Option<PathBuf>,

    /// Color theme of the generated diagram
    #[arg(short = 't', long = "theme", value_enum, default_value = "light")]
    pub theme: ThemeArg,

    /// Flow name shown in the frame header
    #[arg(short = 'n', long = "name", default_value = "")]
    pub name: String,

    /// Flow steps, one per line
    #[arg(short = 's', long = "steps", conflicts_with = "steps_file")]
    pub steps: Option<String>,

    /// File holding the flow steps, or '-' for stdin
    #[arg(long = "stepsFile")]
    pub steps_file: Option<PathBuf>,

    #[arg(long = "trigger", default_value = "")]
    pub trigger: String,

    #[arg(long = "assumptions", default_value = "")]
    pub assumptions: String,

    #[arg(long = "preconditions", default_value = "")]
    pub preconditions: String,

    #[arg(long = "postconditions", default_value = "")]
    pub postconditions: String,

    /// Document JSON to edit. Created if missing and written back afterwards.
    #[arg(short = 'd', long = "document")]
    pub document: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (layout, sticker and render overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Write a JSON dump of the resulting document tree
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "logLevel", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    /// Skip page export
    None,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for ThemeMode {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => ThemeMode::Light,
            ThemeArg::Dark => ThemeMode::Dark,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);
    debug!(args:?; "Parsed arguments");

    let config = load_config(args.config.as_deref())?;
    let message = build_message(&args)?;

    let mut doc = load_document(args.document.as_deref())?;
    doc.use_system_fonts(!config.fast_text_metrics);

    let mut plugin = Plugin::new(config.clone());
    let report = plugin.handle(&mut doc, message);
    for notification in plugin.notifications() {
        eprintln!("{notification}");
    }

    if let Some(path) = args.document.as_deref() {
        std::fs::write(path, doc.to_json()?)
            .with_context(|| format!("writing document {}", path.display()))?;
        info!(path:? = path; "Document saved");
    }
    if let Some(path) = args.dump.as_deref() {
        write_dump(path, &doc)?;
    }

    export_page(&doc, &args, &config)?;

    if report.is_none() && !plugin.is_closed() {
        return Err(anyhow::anyhow!("Flow diagram was not created"));
    }
    Ok(())
}

fn init_logger(level: &str) {
    let level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();
}

fn build_message(args: &Args) -> Result<PluginMessage> {
    if let Some(path) = args.message.as_deref() {
        let input = read_input(path)?;
        return parse_message(&input);
    }

    let flow_steps = match (&args.steps, args.steps_file.as_deref()) {
        (Some(steps), _) => steps.clone(),
        (None, Some(path)) => read_input(path)?,
        (None, None) => String::new(),
    };
    Ok(PluginMessage::InitializeFlow(FlowRequest {
        theme: args.theme.into(),
        flow_name: args.name.clone(),
        flow_steps,
        trigger: args.trigger.clone(),
        assumptions: args.assumptions.clone(),
        preconditions: args.preconditions.clone(),
        postconditions: args.postconditions.clone(),
    }))
}

fn load_document(path: Option<&Path>) -> Result<Document> {
    match path {
        Some(path) if path.exists() => {
            let json = std::fs::read_to_string(path)?;
            Document::from_json(&json)
                .with_context(|| format!("reading document {}", path.display()))
        }
        _ => Ok(Document::new()),
    }
}

fn export_page(doc: &Document, args: &Args, config: &Config) -> Result<()> {
    if matches!(args.output_format, OutputFormat::None) {
        return Ok(());
    }
    let svg = render_svg(doc, doc.current_page(), &config.render);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        #[cfg(feature = "png")]
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
        #[cfg(not(feature = "png"))]
        OutputFormat::Png => {
            return Err(anyhow::anyhow!("PNG output requires the `png` feature"));
        }
        OutputFormat::None => {}
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(feature = "png")]
fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
