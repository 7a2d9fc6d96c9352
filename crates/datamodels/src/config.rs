//! Runtime options shared by a model and everything hydrated from it.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DATAMODELS_STRICT` | false | Fail reads of unknown attributes |
//! | `DATAMODELS_INDENT` | unset | Indentation width for `to_text` |
//!
//! # Example
//!
//! ```rust
//! use datamodels::ModelOptions;
//!
//! // Create from environment
//! let options = ModelOptions::from_env();
//!
//! // Or create programmatically
//! let options = ModelOptions {
//!     strict: true,
//!     indent: Some(2),
//!     ..Default::default()
//! };
//! ```

use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options controlling reads and text output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Parser)]
#[command(name = "datamodels")]
#[command(about = "Model options")]
pub struct ModelOptions {
    /// Reads of attributes that are neither declared nor present fail with
    /// `UnknownAttribute` instead of resolving to `missing`.
    #[arg(long, env = "DATAMODELS_STRICT")]
    pub strict: bool,

    /// Value returned for attributes absent from a sparse document.
    #[arg(skip)]
    pub missing: Value,

    /// Indentation width used by `to_text`; compact output when `None`.
    #[arg(long, env = "DATAMODELS_INDENT")]
    pub indent: Option<usize>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            strict: false,
            missing: Value::Null,
            indent: None,
        }
    }
}

impl ModelOptions {
    /// Creates options from environment variables.
    ///
    /// Only the environment is consulted, never the process arguments.
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["datamodels"]).unwrap_or_default()
    }

    /// Sets strict reads.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the value returned for absent attributes.
    pub fn missing(mut self, missing: Value) -> Self {
        self.missing = missing;
        self
    }

    /// Sets the indentation width of `to_text`.
    pub fn indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }
}
