//! Document backends for the model engine.
//!
//! The [`Backend`] trait is the capability a document flavor implements once:
//! raw attribute lookup and consumption, relation hydration, and the merge
//! that rebuilds an output node from a model's materialized state.
//! [`XmlBackend`] realizes it over an owned [`XmlNode`].
//!
//! ## Attribute placement
//!
//! | Declared as XML attribute | Read from | Written to |
//! |---------------------------|-----------|------------|
//! | yes | `<person id="7"/>` | element attribute |
//! | no | `<person><name>Ann</name></person>` | child element text |

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::node::XmlNode;
use crate::schema::Schema;
use crate::xml;

/// Exported form of one resolved relation, handed to [`Backend::merge`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExportedRelation<N> {
    /// Node of a present has-one relation.
    One(N),
    /// Member nodes of a has-many relation, in collection order.
    Many(Vec<N>),
}

/// Hooks the model engine needs from a concrete document flavor.
///
/// A backend value owns exactly one node. Everything the engine knows about
/// the raw document goes through these methods.
pub trait Backend: Sized + Clone + fmt::Debug {
    /// Native node type of the document flavor.
    type Node: Clone + fmt::Debug + PartialEq;

    /// Wraps an existing node, taking ownership of it.
    fn from_node(node: Self::Node) -> Self;

    /// Creates a backend around a fresh, empty node named `root`.
    fn empty(root: &str) -> Self;

    /// The owned node in its current raw state.
    fn node(&self) -> &Self::Node;

    /// Name of the owned node.
    fn name(&self) -> &str;

    /// Whether raw, unconsumed data exists for attribute `name`.
    fn has_attribute(&self, schema: &Schema, name: &str) -> bool;

    /// Raw text of attribute `name`, if present.
    fn read_attribute(&self, schema: &Schema, name: &str) -> Option<String>;

    /// Drops the raw data of `name` once the engine has materialized it.
    fn on_attribute_consumed(&mut self, schema: &Schema, name: &str);

    /// Names of raw attributes still readable through [`Backend::read_attribute`].
    fn raw_attribute_names(&self, schema: &Schema) -> Vec<String>;

    /// Whether raw data exists for relation `name`.
    fn has_relation(&self, name: &str) -> bool;

    /// Detaches the node backing has-one relation `name`.
    fn hydrate_has_one(&mut self, name: &str) -> Option<Self>;

    /// Detaches the nodes backing has-many relation `name`, in document order.
    fn hydrate_has_many(&mut self, name: &str) -> Vec<Self>;

    /// Discards raw data stored under relation `name`.
    fn discard_relation(&mut self, name: &str);

    /// Discards every kind of raw data stored under `name`.
    fn unset(&mut self, name: &str);

    /// Builds a new node from the pristine node, the overrides and the
    /// exported relations. Never mutates `self`.
    fn merge(
        &self,
        schema: &Schema,
        overrides: &BTreeMap<String, Value>,
        relations: &[(&str, ExportedRelation<Self::Node>)],
    ) -> Self::Node;

    /// Parses document text into a node.
    fn parse(text: &str) -> Result<Self::Node>;

    /// Renders a node as document text, indented when `indent` is set.
    fn render(node: &Self::Node, indent: Option<usize>) -> Result<String>;
}

/// XML realization of [`Backend`].
#[derive(Debug, Clone, PartialEq)]
pub struct XmlBackend {
    node: XmlNode,
}

impl Backend for XmlBackend {
    type Node = XmlNode;

    fn from_node(node: XmlNode) -> Self {
        Self { node }
    }

    fn empty(root: &str) -> Self {
        Self {
            node: XmlNode::new(root),
        }
    }

    fn node(&self) -> &XmlNode {
        &self.node
    }

    fn name(&self) -> &str {
        &self.node.name
    }

    fn has_attribute(&self, schema: &Schema, name: &str) -> bool {
        if schema.is_xml_attribute(name) {
            self.node.has_attribute(name)
        } else {
            !schema.is_relation(name) && self.node.has_child(name)
        }
    }

    fn read_attribute(&self, schema: &Schema, name: &str) -> Option<String> {
        if schema.is_xml_attribute(name) {
            self.node.attribute(name).map(str::to_string)
        } else if schema.is_relation(name) {
            None
        } else {
            self.node.child(name).map(|child| child.text().to_string())
        }
    }

    fn on_attribute_consumed(&mut self, schema: &Schema, name: &str) {
        if schema.is_xml_attribute(name) {
            self.node.remove_attribute(name);
        } else {
            self.node.take_child(name);
        }
    }

    fn raw_attribute_names(&self, schema: &Schema) -> Vec<String> {
        let mut names: Vec<String> = schema
            .xml_attributes()
            .filter(|name| self.node.has_attribute(name))
            .map(str::to_string)
            .collect();

        for child in &self.node.children {
            let readable = child.is_leaf()
                && !schema.is_relation(&child.name)
                && !schema.is_xml_attribute(&child.name);
            if readable && !names.contains(&child.name) {
                names.push(child.name.clone());
            }
        }
        names
    }

    fn has_relation(&self, name: &str) -> bool {
        self.node.has_child(name)
    }

    fn hydrate_has_one(&mut self, name: &str) -> Option<Self> {
        self.node.take_child(name).map(Self::from_node)
    }

    fn hydrate_has_many(&mut self, name: &str) -> Vec<Self> {
        self.node
            .take_child(name)
            .map(|wrapper| wrapper.children.into_iter().map(Self::from_node).collect())
            .unwrap_or_default()
    }

    fn discard_relation(&mut self, name: &str) {
        self.node.remove_children(name);
    }

    fn unset(&mut self, name: &str) {
        self.node.remove_attribute(name);
        self.node.remove_children(name);
    }

    fn merge(
        &self,
        schema: &Schema,
        overrides: &BTreeMap<String, Value>,
        relations: &[(&str, ExportedRelation<XmlNode>)],
    ) -> XmlNode {
        let mut merged = self.node.clone();

        for (name, value) in overrides {
            let text = schema.cast_for(name).uncast(value);
            if schema.is_xml_attribute(name) {
                merged.set_attribute(name.as_str(), text);
            } else {
                merged.replace_child(XmlNode::with_text(name.as_str(), text));
            }
        }

        for (name, relation) in relations {
            match relation {
                ExportedRelation::One(child) => {
                    merged.remove_children(name);
                    splice(&mut merged, child);
                }
                ExportedRelation::Many(members) => {
                    let wrapper = merged.replace_child(XmlNode::new(*name));
                    for member in members {
                        splice(wrapper, member);
                    }
                }
            }
        }

        merged
    }

    fn parse(text: &str) -> Result<XmlNode> {
        xml::parse(text)
    }

    fn render(node: &XmlNode, indent: Option<usize>) -> Result<String> {
        match indent {
            Some(width) => xml::render_pretty(node, width),
            None => xml::render(node),
        }
    }
}

/// Appends a deep structural copy of `child` under `parent`.
///
/// The copy is rebuilt element by element so the destination tree owns every
/// node it contains and `child` is left untouched.
pub fn splice(parent: &mut XmlNode, child: &XmlNode) {
    let node = parent.push_child(XmlNode {
        name: child.name.clone(),
        text: child.text.clone(),
        ..Default::default()
    });
    for (key, value) in &child.attributes {
        node.set_attribute(key.as_str(), value.as_str());
    }
    for grandchild in &child.children {
        splice(node, grandchild);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::Cast;
    use serde_json::json;

    fn schema() -> std::sync::Arc<Schema> {
        Schema::builder("Person")
            .root("person")
            .attribute("id")
            .cast("age", Cast::Integer)
            .has_one("address", Schema::untyped("Address"))
            .has_many("pets", Schema::untyped("Pet"))
            .build()
    }

    fn backend() -> XmlBackend {
        let node = xml::parse(
            r#"<person id="7" lang="en">
                <name>Ann</name>
                <age>40</age>
                <address><city>Oslo</city></address>
                <pets><pet>Rex</pet><pet>Tom</pet></pets>
                <tags kind="x">a</tags>
            </person>"#,
        )
        .unwrap();
        XmlBackend::from_node(node)
    }

    #[test]
    fn test_attribute_lookup_follows_declaration() {
        let schema = schema();
        let backend = backend();

        assert!(backend.has_attribute(&schema, "id"));
        assert_eq!(backend.read_attribute(&schema, "id").as_deref(), Some("7"));
        assert!(backend.has_attribute(&schema, "name"));
        assert_eq!(
            backend.read_attribute(&schema, "name").as_deref(),
            Some("Ann")
        );
        // undeclared XML attributes are not visible as model attributes
        assert!(!backend.has_attribute(&schema, "lang"));
        // relations are never read as text
        assert!(!backend.has_attribute(&schema, "address"));
        assert_eq!(backend.read_attribute(&schema, "pets"), None);
    }

    #[test]
    fn test_consumption_removes_raw_data() {
        let schema = schema();
        let mut backend = backend();

        backend.on_attribute_consumed(&schema, "id");
        backend.on_attribute_consumed(&schema, "name");
        assert!(!backend.node().has_attribute("id"));
        assert!(!backend.node().has_child("name"));
        assert!(backend.node().has_attribute("lang"));
    }

    #[test]
    fn test_raw_attribute_names() {
        let schema = schema();
        let names = backend().raw_attribute_names(&schema);
        assert_eq!(names, vec!["id", "name", "age"]);
    }

    #[test]
    fn test_hydration_detaches_nodes() {
        let mut backend = backend();

        let address = backend.hydrate_has_one("address").unwrap();
        assert_eq!(address.name(), "address");
        assert!(!backend.has_relation("address"));
        assert!(backend.hydrate_has_one("address").is_none());

        let pets = backend.hydrate_has_many("pets");
        let names: Vec<_> = pets.iter().map(|p| p.node().text().to_string()).collect();
        assert_eq!(names, vec!["Rex", "Tom"]);
        assert!(!backend.has_relation("pets"));
        assert!(backend.hydrate_has_many("pets").is_empty());
    }

    #[test]
    fn test_merge_places_overrides_and_relations() {
        let schema = schema();
        let mut backend = backend();
        backend.on_attribute_consumed(&schema, "name");
        backend.hydrate_has_many("pets");

        let mut overrides = BTreeMap::new();
        overrides.insert("id".to_string(), json!(8));
        overrides.insert("name".to_string(), json!("Bob"));
        overrides.insert("age".to_string(), json!(41));

        let pets = ExportedRelation::Many(vec![XmlNode::with_text("pet", "Kit")]);
        let merged = backend.merge(&schema, &overrides, &[("pets", pets)]);

        assert_eq!(merged.attribute("id"), Some("8"));
        assert_eq!(merged.child("name").unwrap().text(), "Bob");
        assert_eq!(
            merged.children.iter().filter(|c| c.name == "age").count(),
            1
        );
        assert_eq!(merged.child("age").unwrap().text(), "41");
        let wrapper = merged.child("pets").unwrap();
        assert_eq!(wrapper.children, vec![XmlNode::with_text("pet", "Kit")]);

        // the owned node is untouched by merging
        assert!(backend.node().has_child("age"));
        assert!(!backend.node().has_child("pets"));
    }

    #[test]
    fn test_splice_copies_deeply() {
        let source = xml::parse(r#"<a x="1"><b y="2"><c>deep</c></b><d/></a>"#).unwrap();
        let mut parent = XmlNode::new("parent");
        splice(&mut parent, &source);
        splice(&mut parent, &source);

        assert_eq!(parent.children.len(), 2);
        assert_eq!(parent.children[0], source);
        assert_eq!(parent.children[1], source);
    }
}
