//! The attribute and relation engine.
//!
//! A [`Model`] reconciles three views of the same data:
//!
//! - the pristine node owned by its [`Backend`],
//! - an override map holding every attribute read or written since
//!   construction,
//! - a cache of relations hydrated into typed models.
//!
//! Reading an attribute moves it out of the raw node and into the override
//! map, so a name is never live in both places. Export clones the raw node and
//! merges the overrides and relations into the clone.
//!
//! ## Example
//!
//! ```
//! use datamodels::{Cast, Schema, XmlModel};
//! use serde_json::json;
//!
//! let schema = Schema::builder("Person")
//!     .root("person")
//!     .attribute("id")
//!     .cast("id", Cast::Integer)
//!     .build();
//!
//! let mut person = XmlModel::from_text(schema, r#"<person id="7"><name>Ann</name></person>"#)?;
//! assert_eq!(person.get_attribute("id")?, json!(7));
//! assert_eq!(person.get_attribute("name")?, json!("Ann"));
//!
//! person.set_attribute("name", "Bob");
//! assert_eq!(person.to_text()?, r#"<person id="7"><name>Bob</name></person>"#);
//! # Ok::<(), datamodels::ModelError>(())
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::backend::{Backend, ExportedRelation, XmlBackend};
use crate::collection::{Collection, ToStructure};
use crate::config::ModelOptions;
use crate::error::{ModelError, Result};
use crate::schema::Schema;

/// Cardinality of a declared relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationKind {
    /// At most one related model, stored as a same-named child.
    HasOne,
    /// An ordered list of models under a same-named wrapper child.
    HasMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::HasOne => f.write_str("has-one"),
            RelationKind::HasMany => f.write_str("has-many"),
        }
    }
}

/// Key of the relation cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationKey {
    /// Cardinality of the relation.
    pub kind: RelationKind,
    /// Declared relation name.
    pub name: String,
}

impl RelationKey {
    /// Creates a key for relation `name` of the given kind.
    pub fn new(kind: RelationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// A resolved relation value.
#[derive(Debug, Clone)]
pub enum Relation<B: Backend = XmlBackend> {
    /// A has-one relation; `None` when absent or cleared.
    One(Option<Model<B>>),
    /// A has-many relation.
    Many(Collection<Model<B>>),
}

impl<B: Backend> Relation<B> {
    /// Cardinality of this relation.
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::One(_) => RelationKind::HasOne,
            Relation::Many(_) => RelationKind::HasMany,
        }
    }

    /// The related model of a present has-one relation.
    pub fn as_one(&self) -> Option<&Model<B>> {
        match self {
            Relation::One(model) => model.as_ref(),
            Relation::Many(_) => None,
        }
    }

    /// Mutable form of [`Relation::as_one`].
    pub fn as_one_mut(&mut self) -> Option<&mut Model<B>> {
        match self {
            Relation::One(model) => model.as_mut(),
            Relation::Many(_) => None,
        }
    }

    /// The members of a has-many relation.
    pub fn as_many(&self) -> Option<&Collection<Model<B>>> {
        match self {
            Relation::Many(collection) => Some(collection),
            Relation::One(_) => None,
        }
    }

    /// Mutable form of [`Relation::as_many`].
    pub fn as_many_mut(&mut self) -> Option<&mut Collection<Model<B>>> {
        match self {
            Relation::Many(collection) => Some(collection),
            Relation::One(_) => None,
        }
    }

    fn export(&self) -> Option<ExportedRelation<B::Node>> {
        match self {
            Relation::One(Some(model)) => Some(ExportedRelation::One(model.export())),
            Relation::One(None) => None,
            Relation::Many(collection) => Some(ExportedRelation::Many(
                collection.iter().map(Model::export).collect(),
            )),
        }
    }
}

impl<B: Backend> ToStructure for Relation<B> {
    fn to_structure(&mut self) -> Result<Value> {
        match self {
            Relation::One(Some(model)) => model.to_structure(),
            Relation::One(None) => Ok(Value::Null),
            Relation::Many(collection) => Ok(Value::Array(collection.export_structure()?)),
        }
    }
}

/// A value assigned to a relation.
///
/// Plain structures, existing models and raw backend nodes are accepted;
/// anything else is rejected with [`ModelError::TypeMismatch`].
#[derive(Debug, Clone)]
pub enum RelationInput<B: Backend = XmlBackend> {
    /// A plain nested map, hydrated into a new model.
    Structure(Map<String, Value>),
    /// An existing model, adopted as is.
    Model(Model<B>),
    /// A raw backend node, wrapped by the related schema.
    Node(B::Node),
    /// Members of a has-many relation, each normalized on its own.
    Many(Vec<RelationInput<B>>),
    /// An existing collection, adopted as is.
    Collection(Collection<Model<B>>),
    /// Clears the relation.
    Empty,
    /// A scalar value, which no relation accepts.
    Other(Value),
}

impl<B: Backend> RelationInput<B> {
    fn describe(&self) -> String {
        match self {
            RelationInput::Structure(_) => "structure".to_string(),
            RelationInput::Model(model) => format!("model {}", model.schema.name()),
            RelationInput::Node(_) => "node".to_string(),
            RelationInput::Many(_) => "list".to_string(),
            RelationInput::Collection(_) => "collection".to_string(),
            RelationInput::Empty => "null".to_string(),
            RelationInput::Other(value) => format!("scalar {}", value),
        }
    }
}

impl<B: Backend> From<Value> for RelationInput<B> {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RelationInput::Structure(map),
            Value::Array(items) => {
                RelationInput::Many(items.into_iter().map(RelationInput::from).collect())
            }
            Value::Null => RelationInput::Empty,
            other => RelationInput::Other(other),
        }
    }
}

impl<B: Backend> From<Map<String, Value>> for RelationInput<B> {
    fn from(map: Map<String, Value>) -> Self {
        RelationInput::Structure(map)
    }
}

impl<B: Backend> From<Model<B>> for RelationInput<B> {
    fn from(model: Model<B>) -> Self {
        RelationInput::Model(model)
    }
}

impl<B: Backend> From<Collection<Model<B>>> for RelationInput<B> {
    fn from(collection: Collection<Model<B>>) -> Self {
        RelationInput::Collection(collection)
    }
}

impl<B: Backend> From<Vec<Model<B>>> for RelationInput<B> {
    fn from(models: Vec<Model<B>>) -> Self {
        RelationInput::Many(models.into_iter().map(RelationInput::Model).collect())
    }
}

/// Result of a schema-dispatched read through [`Model::get`].
#[derive(Debug)]
pub enum Field<'a, B: Backend = XmlBackend> {
    /// An attribute value.
    Value(Value),
    /// A resolved relation, borrowed from the cache.
    Relation(&'a mut Relation<B>),
}

/// A typed view over one document node.
#[derive(Debug, Clone)]
pub struct Model<B: Backend = XmlBackend> {
    schema: Arc<Schema>,
    backend: B,
    overrides: BTreeMap<String, Value>,
    relations: BTreeMap<RelationKey, Relation<B>>,
    options: ModelOptions,
}

impl<B: Backend> Model<B> {
    /// Creates an empty model whose node is named after the schema root.
    pub fn new(schema: Arc<Schema>) -> Self {
        let root = schema.root().to_string();
        Self::with_root(schema, &root)
    }

    /// Creates an empty model whose node is named `root`.
    pub fn with_root(schema: Arc<Schema>, root: &str) -> Self {
        Self::from_backend(schema, B::empty(root))
    }

    /// Wraps an existing node.
    pub fn from_node(schema: Arc<Schema>, node: B::Node) -> Self {
        Self::from_backend(schema, B::from_node(node))
    }

    /// Wraps an existing backend.
    pub fn from_backend(schema: Arc<Schema>, backend: B) -> Self {
        Self {
            schema,
            backend,
            overrides: BTreeMap::new(),
            relations: BTreeMap::new(),
            options: ModelOptions::default(),
        }
    }

    /// Parses document text and wraps its root node.
    pub fn from_text(schema: Arc<Schema>, text: &str) -> Result<Self> {
        Ok(Self::from_node(schema, B::parse(text)?))
    }

    /// Parses document text, or creates an empty model named `root` when
    /// the text holds no document. A parsed document keeps its own root name.
    pub fn from_text_with_root(schema: Arc<Schema>, text: &str, root: &str) -> Result<Self> {
        if text.trim().is_empty() {
            Ok(Self::with_root(schema, root))
        } else {
            Self::from_text(schema, text)
        }
    }

    /// Builds a model from a plain nested map, assigning each key as an
    /// attribute or relation according to the schema.
    pub fn from_structure(
        schema: Arc<Schema>,
        data: Map<String, Value>,
        root: Option<&str>,
    ) -> Result<Self> {
        Self::from_structure_with(schema, data, root, ModelOptions::default())
    }

    fn from_structure_with(
        schema: Arc<Schema>,
        data: Map<String, Value>,
        root: Option<&str>,
        options: ModelOptions,
    ) -> Result<Self> {
        let root = root.unwrap_or(schema.root()).to_string();
        let mut model = Self::with_root(schema, &root).with_options(options);
        for (key, value) in data {
            model.set(&key, value)?;
        }
        Ok(model)
    }

    /// Replaces the options of this model and of every cached relation model.
    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.set_options(options);
        self
    }

    /// In-place form of [`Model::with_options`].
    pub fn set_options(&mut self, options: ModelOptions) {
        for relation in self.relations.values_mut() {
            if let Some(model) = relation.as_one_mut() {
                model.set_options(options.clone());
            }
            if let Some(collection) = relation.as_many_mut() {
                for model in collection.iter_mut() {
                    model.set_options(options.clone());
                }
            }
        }
        self.options = options;
    }

    /// Options in effect for this model.
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Schema describing this model.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Backend holding the raw, unconsumed node.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Element name of the owned node.
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Reads attribute `name`.
    ///
    /// Overrides win. Otherwise raw data is read, cast, moved into the
    /// overrides and consumed from the node. Absent attributes resolve to the
    /// configured default unless the options are strict and the schema does
    /// not declare `name`.
    pub fn get_attribute(&mut self, name: &str) -> Result<Value> {
        if let Some(value) = self.overrides.get(name) {
            return Ok(value.clone());
        }

        if self.backend.has_attribute(&self.schema, name) {
            let raw = self
                .backend
                .read_attribute(&self.schema, name)
                .unwrap_or_default();
            let value = self.schema.cast_for(name).cast(name, &raw)?;
            trace!(model = %self.schema.name(), attribute = %name, "Materialized attribute");
            self.backend.on_attribute_consumed(&self.schema, name);
            self.overrides.insert(name.to_string(), value.clone());
            return Ok(value);
        }

        if self.options.strict && !self.schema.declares_attribute(name) {
            return Err(ModelError::UnknownAttribute {
                model: self.schema.name().to_string(),
                attribute: name.to_string(),
            });
        }
        Ok(self.options.missing.clone())
    }

    /// Writes attribute `name`. The node is only updated on export.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) {
        if self.schema.is_relation(name) {
            warn!(model = %self.schema.name(), attribute = %name, "Attribute shadows a declared relation");
        }
        self.overrides.insert(name.to_string(), value.into());
    }

    /// Whether `name` has been read or written since construction.
    pub fn is_materialized(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    /// Resolves relation `name`, hydrating it from the node on first access.
    pub fn get_relation(&mut self, name: &str) -> Result<&mut Relation<B>> {
        let (kind, related) = self.declared_relation(name)?;

        match self.relations.entry(RelationKey::new(kind, name)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let relation = match kind {
                    RelationKind::HasOne => Relation::One(
                        self.backend
                            .hydrate_has_one(name)
                            .map(|b| Model::from_backend(related, b).with_options(self.options.clone())),
                    ),
                    RelationKind::HasMany => Relation::Many(
                        self.backend
                            .hydrate_has_many(name)
                            .into_iter()
                            .map(|b| {
                                Model::from_backend(Arc::clone(&related), b)
                                    .with_options(self.options.clone())
                            })
                            .collect(),
                    ),
                };
                debug!(
                    model = %self.schema.name(),
                    relation = %name,
                    kind = %kind,
                    "Hydrated relation"
                );
                Ok(entry.insert(relation))
            }
        }
    }

    /// Resolves has-one relation `name`.
    pub fn has_one(&mut self, name: &str) -> Result<Option<&mut Model<B>>> {
        match self.get_relation(name)? {
            Relation::One(model) => Ok(model.as_mut()),
            Relation::Many(_) => Err(kind_mismatch(name, RelationKind::HasOne)),
        }
    }

    /// Resolves has-many relation `name`.
    pub fn has_many(&mut self, name: &str) -> Result<&mut Collection<Model<B>>> {
        match self.get_relation(name)? {
            Relation::Many(collection) => Ok(collection),
            Relation::One(_) => Err(kind_mismatch(name, RelationKind::HasMany)),
        }
    }

    /// Assigns relation `name`, replacing whatever the node or cache held.
    pub fn set_relation(&mut self, name: &str, value: impl Into<RelationInput<B>>) -> Result<()> {
        let (kind, related) = self.declared_relation(name)?;
        let value = value.into();

        let relation = match kind {
            RelationKind::HasOne => {
                Relation::One(self.normalize_one(name, &related, value, Some(name))?)
            }
            RelationKind::HasMany => {
                let members = match value {
                    RelationInput::Many(items) => items
                        .into_iter()
                        .map(|item| {
                            self.normalize_one(name, &related, item, None)?
                                .ok_or_else(|| mismatch(name, &related, "null"))
                        })
                        .collect::<Result<Collection<_>>>()?,
                    RelationInput::Collection(mut collection) => {
                        for member in collection.iter_mut() {
                            ensure_compatible(name, &related, member)?;
                            member.set_options(self.options.clone());
                        }
                        collection
                    }
                    RelationInput::Empty => Collection::new(),
                    other => return Err(mismatch(name, &related, &other.describe())),
                };
                debug!(
                    model = %self.schema.name(),
                    relation = %name,
                    members = members.len(),
                    "Replaced has-many relation"
                );
                Relation::Many(members)
            }
        };

        self.backend.discard_relation(name);
        self.relations.insert(RelationKey::new(kind, name), relation);
        Ok(())
    }

    /// Schema-dispatched read: relations resolve through the cache, anything
    /// else is read as an attribute.
    pub fn get(&mut self, name: &str) -> Result<Field<'_, B>> {
        if self.schema.is_relation(name) {
            Ok(Field::Relation(self.get_relation(name)?))
        } else {
            Ok(Field::Value(self.get_attribute(name)?))
        }
    }

    /// Schema-dispatched write: declared relations go through
    /// [`Model::set_relation`], anything else is stored as an attribute.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        if self.schema.is_relation(name) {
            self.set_relation(name, value)
        } else {
            self.set_attribute(name, value);
            Ok(())
        }
    }

    /// Forgets `name` everywhere: raw node, overrides and relation cache.
    pub fn unset(&mut self, name: &str) {
        self.backend.unset(name);
        self.overrides.remove(name);
        self.relations
            .remove(&RelationKey::new(RelationKind::HasOne, name));
        self.relations
            .remove(&RelationKey::new(RelationKind::HasMany, name));
    }

    /// Pulls every raw attribute and every present relation through the read
    /// path so the model's state is fully materialized.
    pub fn materialize(&mut self) -> Result<()> {
        for name in self.backend.raw_attribute_names(&self.schema) {
            self.get_attribute(&name)?;
        }

        let schema = Arc::clone(&self.schema);
        let relations: Vec<&str> = schema
            .has_one_relations()
            .chain(schema.has_many_relations())
            .filter(|name| self.backend.has_relation(name))
            .collect();
        for name in relations {
            self.get_relation(name)?;
        }
        Ok(())
    }

    /// Rebuilds a node from the raw node, overrides and resolved relations.
    ///
    /// The model itself is left untouched, so exporting twice yields the same
    /// tree.
    pub fn export(&self) -> B::Node {
        let relations: Vec<(&str, ExportedRelation<B::Node>)> = self
            .relations
            .iter()
            .filter_map(|(key, relation)| Some((key.name.as_str(), relation.export()?)))
            .collect();
        trace!(
            model = %self.schema.name(),
            overrides = self.overrides.len(),
            relations = relations.len(),
            "Exporting model"
        );
        self.backend
            .merge(&self.schema, &self.overrides, &relations)
    }

    /// Renders the exported node as text, indented per the model options.
    pub fn to_text(&self) -> Result<String> {
        B::render(&self.export(), self.options.indent)
    }

    /// Plain nested map of the model's attributes and relations.
    ///
    /// Raw data still sitting in the node is materialized first, so the
    /// result covers everything the schema can see, not only what was
    /// accessed before the call.
    pub fn to_plain_structure(&mut self) -> Result<Map<String, Value>> {
        self.materialize()?;

        let mut map: Map<String, Value> = self
            .overrides
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        for (key, relation) in self.relations.iter_mut() {
            map.insert(key.name.clone(), relation.to_structure()?);
        }
        Ok(map)
    }

    /// The plain structure encoded as JSON.
    pub fn to_json(&mut self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_plain_structure()?)?)
    }

    fn declared_relation(&self, name: &str) -> Result<(RelationKind, Arc<Schema>)> {
        if let Some(related) = self.schema.has_one(name) {
            return Ok((RelationKind::HasOne, Arc::clone(related)));
        }
        if let Some(related) = self.schema.has_many(name) {
            return Ok((RelationKind::HasMany, Arc::clone(related)));
        }
        Err(ModelError::UndeclaredRelation {
            model: self.schema.name().to_string(),
            relation: name.to_string(),
        })
    }

    fn normalize_one(
        &self,
        relation: &str,
        related: &Arc<Schema>,
        value: RelationInput<B>,
        root: Option<&str>,
    ) -> Result<Option<Model<B>>> {
        match value {
            RelationInput::Structure(map) => Model::from_structure_with(
                Arc::clone(related),
                map,
                root,
                self.options.clone(),
            )
            .map(Some),
            RelationInput::Model(model) => {
                ensure_compatible(relation, related, &model)?;
                Ok(Some(model.with_options(self.options.clone())))
            }
            RelationInput::Node(node) => Ok(Some(
                Model::from_node(Arc::clone(related), node).with_options(self.options.clone()),
            )),
            RelationInput::Empty => Ok(None),
            other => Err(mismatch(relation, related, &other.describe())),
        }
    }
}

impl<B: Backend> ToStructure for Model<B> {
    fn to_structure(&mut self) -> Result<Value> {
        Ok(Value::Object(self.to_plain_structure()?))
    }
}

impl<B: Backend> fmt::Display for Model<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_text().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

fn ensure_compatible<B: Backend>(
    relation: &str,
    related: &Schema,
    model: &Model<B>,
) -> Result<()> {
    if model.schema.name() == related.name() {
        Ok(())
    } else {
        Err(mismatch(
            relation,
            related,
            &format!("model {}", model.schema.name()),
        ))
    }
}

fn mismatch(relation: &str, related: &Schema, found: &str) -> ModelError {
    ModelError::TypeMismatch {
        relation: relation.to_string(),
        expected: related.name().to_string(),
        found: found.to_string(),
    }
}

fn kind_mismatch(relation: &str, expected: RelationKind) -> ModelError {
    let found = match expected {
        RelationKind::HasOne => RelationKind::HasMany,
        RelationKind::HasMany => RelationKind::HasOne,
    };
    ModelError::TypeMismatch {
        relation: relation.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::Cast;
    use crate::node::XmlNode;
    use serde_json::json;

    fn pet_schema() -> Arc<Schema> {
        Schema::builder("Pet")
            .root("pet")
            .attribute("kind")
            .build()
    }

    fn person_schema() -> Arc<Schema> {
        Schema::builder("Person")
            .root("person")
            .attribute("id")
            .cast("id", Cast::Integer)
            .cast("age", Cast::Integer)
            .has_one("address", Schema::builder("Address").root("address").build())
            .has_many("pets", pet_schema())
            .build()
    }

    fn person() -> Model {
        Model::from_text(
            person_schema(),
            r#"<person id="7"><name>Ann</name><age>40</age>
                 <address><city>Oslo</city></address>
                 <pets><pet kind="dog">Rex</pet><pet kind="cat">Tom</pet></pets>
               </person>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_read_consumes_raw_data() {
        let mut model = person();
        assert!(!model.is_materialized("age"));

        assert_eq!(model.get_attribute("age").unwrap(), json!(40));
        assert!(model.is_materialized("age"));
        assert!(!model.backend().node().has_child("age"));
        assert_eq!(model.get_attribute("age").unwrap(), json!(40));
    }

    #[test]
    fn test_missing_attribute_resolves_to_default() {
        let mut model = person();
        assert_eq!(model.get_attribute("nickname").unwrap(), Value::Null);

        let mut model = person().with_options(ModelOptions::default().missing(json!("")));
        assert_eq!(model.get_attribute("nickname").unwrap(), json!(""));
    }

    #[test]
    fn test_strict_reads() {
        let mut model = person().with_options(ModelOptions::default().strict(true));
        assert!(matches!(
            model.get_attribute("nickname"),
            Err(ModelError::UnknownAttribute { .. })
        ));
        // declared but absent is still not an error
        let mut empty = Model::<XmlBackend>::new(person_schema())
            .with_options(ModelOptions::default().strict(true));
        assert_eq!(empty.get_attribute("age").unwrap(), Value::Null);
    }

    #[test]
    fn test_cast_failure_leaves_raw_data() {
        let mut model =
            Model::<XmlBackend>::from_text(person_schema(), "<person><age>old</age></person>")
                .unwrap();
        assert!(matches!(
            model.get_attribute("age"),
            Err(ModelError::Cast { .. })
        ));
        assert!(model.backend().node().has_child("age"));
        assert!(!model.is_materialized("age"));
    }

    #[test]
    fn test_relations_hydrate_once() {
        let mut model = person();

        let pets = model.has_many("pets").unwrap();
        assert_eq!(pets.count(), 2);
        pets[0].set_attribute("kind", "wolf");

        // second access returns the cached, mutated collection
        let pets = model.has_many("pets").unwrap();
        assert_eq!(pets[0].get_attribute("kind").unwrap(), json!("wolf"));

        let address = model.has_one("address").unwrap().unwrap();
        assert_eq!(address.get_attribute("city").unwrap(), json!("Oslo"));
    }

    #[test]
    fn test_undeclared_relation() {
        let mut model = person();
        assert!(matches!(
            model.get_relation("friends"),
            Err(ModelError::UndeclaredRelation { .. })
        ));
        assert!(matches!(
            model.set_relation("friends", json!([])),
            Err(ModelError::UndeclaredRelation { .. })
        ));
    }

    #[test]
    fn test_relation_kind_accessors() {
        let mut model = person();
        assert!(matches!(
            model.has_one("pets"),
            Err(ModelError::TypeMismatch { .. })
        ));
        assert!(matches!(
            model.has_many("address"),
            Err(ModelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_set_relation_shapes() {
        let mut model = Model::<XmlBackend>::new(person_schema());

        model
            .set_relation("address", json!({"city": "Rome"}))
            .unwrap();
        let address = model.has_one("address").unwrap().unwrap();
        assert_eq!(address.name(), "address");

        let adopted = Model::<XmlBackend>::from_structure(pet_schema(), Map::new(), None).unwrap();
        let node = XmlNode::with_text("pet", "Rex");
        model
            .set_relation(
                "pets",
                RelationInput::<XmlBackend>::Many(vec![
                    json!({"kind": "dog"}).into(),
                    RelationInput::Model(adopted),
                    RelationInput::Node(node),
                ]),
            )
            .unwrap();
        assert_eq!(model.has_many("pets").unwrap().count(), 3);
    }

    #[test]
    fn test_set_relation_rejects_bad_shapes() {
        let mut model = Model::<XmlBackend>::new(person_schema());

        for bad in [json!(5), json!("text"), json!([{"kind": "dog"}])] {
            assert!(matches!(
                model.set_relation("address", bad),
                Err(ModelError::TypeMismatch { .. })
            ));
        }
        for bad in [json!({"kind": "dog"}), json!([1, 2]), json!([null])] {
            assert!(matches!(
                model.set_relation("pets", bad),
                Err(ModelError::TypeMismatch { .. })
            ));
        }

        let stranger = Model::<XmlBackend>::new(Schema::untyped("Robot"));
        assert!(matches!(
            model.set_relation("address", stranger),
            Err(ModelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unset_forgets_everything() {
        let mut model = person();
        model.get_attribute("age").unwrap();
        model.has_many("pets").unwrap();

        model.unset("age");
        model.unset("pets");
        model.unset("id");

        let exported = model.export();
        assert!(!exported.has_child("age"));
        assert!(!exported.has_child("pets"));
        assert!(!exported.has_attribute("id"));
        assert!(exported.has_child("address"));
    }

    #[test]
    fn test_dispatching_get_and_set() {
        let mut model = Model::<XmlBackend>::new(person_schema());
        model.set("name", json!("Ann")).unwrap();
        model.set("pets", json!([{"kind": "dog"}])).unwrap();

        assert!(matches!(model.get("name").unwrap(), Field::Value(v) if v == json!("Ann")));
        match model.get("pets").unwrap() {
            Field::Relation(relation) => {
                assert_eq!(relation.kind(), RelationKind::HasMany);
                assert_eq!(relation.as_many().map(Collection::len), Some(1));
            }
            Field::Value(_) => panic!("expected relation"),
        }
    }

    #[test]
    fn test_from_text_with_root() {
        // a parsed document keeps its own element name
        let model = Model::<XmlBackend>::from_text_with_root(
            pet_schema(),
            r#"<animal kind="dog"/>"#,
            "pet",
        )
        .unwrap();
        assert_eq!(model.name(), "animal");
        assert_eq!(model.to_text().unwrap(), r#"<animal kind="dog"/>"#);

        let empty = Model::<XmlBackend>::from_text_with_root(pet_schema(), "  ", "critter").unwrap();
        assert_eq!(empty.name(), "critter");
        assert_eq!(empty.to_text().unwrap(), "<critter/>");
    }

    #[test]
    fn test_options_reach_every_relation_model() {
        let options = ModelOptions::default()
            .strict(true)
            .missing(json!(""));
        let data = json!({
            "address": {"city": "Rome"},
            "pets": [{"kind": "dog"}, {"kind": "cat"}]
        });
        let Value::Object(map) = data else {
            unreachable!()
        };

        // options applied after relations were built from a structure
        let mut model = Model::<XmlBackend>::from_structure(person_schema(), map, None)
            .unwrap()
            .with_options(options.clone());
        assert_eq!(model.has_one("address").unwrap().unwrap().options(), &options);
        for pet in model.has_many("pets").unwrap().iter() {
            assert_eq!(pet.options(), &options);
        }

        // adopted models and collections take the parent's options
        let adopted =
            Model::<XmlBackend>::new(Schema::builder("Address").attribute("zip").build());
        model.set_relation("address", adopted).unwrap();
        let address = model.has_one("address").unwrap().unwrap();
        assert_eq!(address.options(), &options);
        assert_eq!(address.get_attribute("zip").unwrap(), json!(""));

        let pets: Collection<Model> = vec![Model::new(pet_schema())].into();
        model.set_relation("pets", pets).unwrap();
        assert_eq!(model.has_many("pets").unwrap()[0].options(), &options);

        // hydration from raw data inherits as well
        let mut parsed = person().with_options(options.clone());
        assert_eq!(parsed.has_one("address").unwrap().unwrap().options(), &options);
    }

    #[test]
    fn test_display_renders_export() {
        let mut model = Model::<XmlBackend>::new(person_schema());
        model.set_attribute("id", 3);
        assert_eq!(model.to_string(), r#"<person id="3"/>"#);
    }
}
