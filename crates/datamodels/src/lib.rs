//! # datamodels
//!
//! Typed object graphs over semi-structured XML documents.
//!
//! A [`Model`] wraps one document node and exposes it through a [`Schema`]:
//! scalar attributes with declared casts, has-one and has-many relations to
//! other models, and an export that merges everything read, written or
//! hydrated back into a fresh node.
//!
//! ## Layers
//!
//! - **Schema**: static description of one model type ([`Schema`], [`Cast`])
//! - **Engine**: attribute materialization and relation caching ([`Model`])
//! - **Backend**: document-specific hooks and the export merge ([`Backend`],
//!   [`XmlBackend`])
//! - **Collections**: ordered has-many results ([`Collection`])
//! - **Codec**: XML text to and from owned trees ([`xml`], [`XmlNode`])
//!
//! ## Example
//!
//! ```
//! use datamodels::{Schema, XmlModel};
//! use serde_json::json;
//!
//! let line = Schema::builder("Line").root("line").attribute("sku").build();
//! let order = Schema::builder("Order")
//!     .root("order")
//!     .attribute("number")
//!     .has_many("lines", line)
//!     .build();
//!
//! let mut model = XmlModel::from_text(
//!     order,
//!     r#"<order number="12"><lines><line sku="a"/></lines></order>"#,
//! )?;
//! model.set_relation("lines", json!([{"sku": "b"}, {"sku": "c"}]))?;
//!
//! assert_eq!(
//!     model.to_text()?,
//!     r#"<order number="12"><lines><line sku="b"/><line sku="c"/></lines></order>"#
//! );
//! # Ok::<(), datamodels::ModelError>(())
//! ```

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backend;
pub mod cast;
pub mod collection;
pub mod config;
pub mod error;
pub mod model;
pub mod node;
pub mod schema;
pub mod xml;

pub use backend::{Backend, ExportedRelation, XmlBackend, splice};
pub use cast::Cast;
pub use collection::{Collection, ToStructure};
pub use config::ModelOptions;
pub use error::{ModelError, Result};
pub use model::{Field, Model, Relation, RelationInput, RelationKey, RelationKind};
pub use node::XmlNode;
pub use schema::{Schema, SchemaBuilder};

/// Model over the XML backend.
pub type XmlModel = Model<XmlBackend>;

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
pub struct ReadmeDoctests;
