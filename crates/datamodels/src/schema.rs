//! Static per-type model descriptors.
//!
//! A [`Schema`] replaces class-level declarations: it names the model type,
//! its default element name, which attributes live as XML attributes rather
//! than child elements, how attributes are cast, and which relations exist.
//! Schemas are built once and shared behind an [`Arc`].
//!
//! ```
//! use datamodels::{Cast, Schema};
//!
//! let pet = Schema::builder("Pet").root("pet").attribute("kind").build();
//! let person = Schema::builder("Person")
//!     .root("person")
//!     .attribute("id")
//!     .cast("id", Cast::Integer)
//!     .has_many("pets", pet)
//!     .build();
//!
//! assert!(person.is_xml_attribute("id"));
//! assert!(person.has_many("pets").is_some());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::cast::Cast;

/// Default element name for models whose schema does not set one.
pub const DEFAULT_ROOT: &str = "root";

/// Declared shape of one model type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    root: String,
    attributes: BTreeSet<String>,
    casts: BTreeMap<String, Cast>,
    has_one: BTreeMap<String, Arc<Schema>>,
    has_many: BTreeMap<String, Arc<Schema>>,
}

impl Schema {
    /// Starts a schema for the model type `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// A schema that declares nothing. Every child element is read as text.
    pub fn untyped(name: impl Into<String>) -> Arc<Schema> {
        SchemaBuilder::new(name).build()
    }

    /// Type name, used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element name given to models created without a node.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Whether `name` is rendered as an XML attribute instead of a child.
    pub fn is_xml_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Names declared as XML attributes.
    pub fn xml_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    /// Cast for `name`; undeclared attributes keep their raw text.
    pub fn cast_for(&self, name: &str) -> Cast {
        self.casts.get(name).copied().unwrap_or_default()
    }

    /// Whether the schema mentions `name` as an attribute in any way.
    pub fn declares_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name) || self.casts.contains_key(name)
    }

    /// Related schema of has-one relation `relation`.
    pub fn has_one(&self, relation: &str) -> Option<&Arc<Schema>> {
        self.has_one.get(relation)
    }

    /// Related schema of has-many relation `relation`.
    pub fn has_many(&self, relation: &str) -> Option<&Arc<Schema>> {
        self.has_many.get(relation)
    }

    /// Whether `name` is declared as a relation of either kind.
    pub fn is_relation(&self, name: &str) -> bool {
        self.has_one.contains_key(name) || self.has_many.contains_key(name)
    }

    /// Names of declared has-one relations.
    pub fn has_one_relations(&self) -> impl Iterator<Item = &str> {
        self.has_one.keys().map(String::as_str)
    }

    /// Names of declared has-many relations.
    pub fn has_many_relations(&self) -> impl Iterator<Item = &str> {
        self.has_many.keys().map(String::as_str)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema {
                name: name.into(),
                root: DEFAULT_ROOT.to_string(),
                attributes: BTreeSet::new(),
                casts: BTreeMap::new(),
                has_one: BTreeMap::new(),
                has_many: BTreeMap::new(),
            },
        }
    }

    /// Sets the default element name.
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.schema.root = root.into();
        self
    }

    /// Declares `name` as an XML attribute of the element.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.schema.attributes.insert(name.into());
        self
    }

    /// Declares the cast applied to attribute `name`.
    pub fn cast(mut self, name: impl Into<String>, cast: Cast) -> Self {
        self.schema.casts.insert(name.into(), cast);
        self
    }

    /// Declares has-one relation `relation`, replacing a has-many of that name.
    pub fn has_one(mut self, relation: impl Into<String>, schema: Arc<Schema>) -> Self {
        let relation = relation.into();
        self.schema.has_many.remove(&relation);
        self.schema.has_one.insert(relation, schema);
        self
    }

    /// Declares has-many relation `relation`, replacing a has-one of that name.
    pub fn has_many(mut self, relation: impl Into<String>, schema: Arc<Schema>) -> Self {
        let relation = relation.into();
        self.schema.has_one.remove(&relation);
        self.schema.has_many.insert(relation, schema);
        self
    }

    /// Finishes the schema.
    pub fn build(self) -> Arc<Schema> {
        Arc::new(self.schema)
    }
}
