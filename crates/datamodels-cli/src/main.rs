//! dmx
//!
//! Reads an XML document through an ad-hoc schema, applies assignments and
//! prints the result as a plain structure, re-exported XML or a node tree.

mod config;

use std::io::Read;

use anyhow::Context;
use clap::Parser;
use datamodels::XmlModel;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{CliConfig, OutputFormat};

/// Initializes logging to stderr so stdout stays machine readable.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("datamodels={},dmx={}", level, level)));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_input(path: Option<&str>) -> anyhow::Result<String> {
    match path {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
        }
    }
}

fn run(config: &CliConfig, input: &str) -> anyhow::Result<String> {
    let mut model = XmlModel::from_text(config.schema(), input)
        .context("Failed to parse document")?
        .with_options(config.options());

    for (name, value) in &config.assignments {
        debug!(attribute = %name, "Applying assignment");
        model.set(name, Value::String(value.clone()))?;
    }

    let output = match config.format {
        OutputFormat::Json => {
            let plain = Value::Object(model.to_plain_structure()?);
            if config.indent.is_some() {
                serde_json::to_string_pretty(&plain)?
            } else {
                serde_json::to_string(&plain)?
            }
        }
        OutputFormat::Xml => model.to_text()?,
        OutputFormat::Tree => serde_json::to_string_pretty(&model.export())?,
    };
    Ok(output)
}

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        input = config.input.as_deref().unwrap_or("-"),
        format = ?config.format,
        strict = config.strict,
        "Loading document"
    );

    let input = read_input(config.input.as_deref())?;
    println!("{}", run(&config, &input)?);
    Ok(())
}
