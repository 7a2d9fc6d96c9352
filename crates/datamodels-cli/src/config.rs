//! Command line configuration for `dmx`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DMX_FORMAT` | json | Output format (json, xml, tree) |
//! | `DMX_INDENT` | unset | Indentation width for pretty output |
//! | `DMX_STRICT` | false | Fail on unknown attributes |
//! | `DMX_LOG_LEVEL` | warn | Log level |

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use datamodels::{Cast, ModelOptions, Schema};

/// What `dmx` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain structure as JSON.
    Json,
    /// Re-exported XML document.
    Xml,
    /// Exported node tree as JSON, for debugging placement.
    Tree,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "dmx")]
#[command(about = "Inspect and re-export XML documents through a typed model")]
pub struct CliConfig {
    /// XML document to read; stdin when omitted or "-".
    pub input: Option<String>,

    /// Output format.
    #[arg(short, long, env = "DMX_FORMAT", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Names stored as XML attributes of the root element (comma-separated).
    #[arg(short, long = "attribute", value_delimiter = ',')]
    pub attributes: Vec<String>,

    /// Attribute casts as NAME=TYPE, TYPE one of string, integer, float, boolean, json.
    #[arg(short, long = "cast", value_parser = parse_cast)]
    pub casts: Vec<(String, Cast)>,

    /// Child elements hydrated as has-one relations (comma-separated).
    #[arg(long = "has-one", value_delimiter = ',')]
    pub has_one: Vec<String>,

    /// Wrapper elements hydrated as has-many relations (comma-separated).
    #[arg(long = "has-many", value_delimiter = ',')]
    pub has_many: Vec<String>,

    /// Attribute assignments applied before output, as NAME=VALUE.
    #[arg(short = 's', long = "set", value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    /// Indentation width for pretty output.
    #[arg(long, env = "DMX_INDENT")]
    pub indent: Option<usize>,

    /// Fail on reads of attributes that are neither declared nor present.
    #[arg(long, env = "DMX_STRICT")]
    pub strict: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "DMX_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl CliConfig {
    /// Validates the configuration and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for name in self.has_one.iter().chain(&self.has_many) {
            if self.attributes.contains(name) {
                errors.push(format!("'{}' cannot be both an attribute and a relation", name));
            }
        }
        for name in &self.has_one {
            if self.has_many.contains(name) {
                errors.push(format!("'{}' cannot be both has-one and has-many", name));
            }
        }
        for (name, _) in &self.assignments {
            if self.has_one.contains(name) || self.has_many.contains(name) {
                errors.push(format!("cannot assign text to relation '{}'", name));
            }
        }
        if self.indent == Some(0) {
            errors.push("Indent cannot be 0".to_string());
        }
        if !matches!(
            self.log_level.to_ascii_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            errors.push(format!("Unknown log level '{}'", self.log_level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the document schema described by the flags. Relations are
    /// untyped: their members expose every leaf child as an attribute.
    pub fn schema(&self) -> Arc<Schema> {
        let mut builder = Schema::builder("Document");
        for name in &self.attributes {
            builder = builder.attribute(name.as_str());
        }
        for (name, cast) in &self.casts {
            builder = builder.cast(name.as_str(), *cast);
        }
        for name in &self.has_one {
            builder = builder.has_one(name.as_str(), Schema::untyped(name.as_str()));
        }
        for name in &self.has_many {
            builder = builder.has_many(name.as_str(), Schema::untyped(name.as_str()));
        }
        builder.build()
    }

    pub fn options(&self) -> ModelOptions {
        ModelOptions::default()
            .strict(self.strict)
            .indent(self.indent)
    }
}

fn parse_cast(s: &str) -> Result<(String, Cast), String> {
    let (name, kind) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TYPE, got '{}'", s))?;
    let cast = match kind.trim().to_ascii_lowercase().as_str() {
        "string" => Cast::String,
        "integer" | "int" => Cast::Integer,
        "float" => Cast::Float,
        "boolean" | "bool" => Cast::Boolean,
        "json" => Cast::Json,
        other => return Err(format!("unknown cast '{}'", other)),
    };
    Ok((name.trim().to_string(), cast))
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))
}
