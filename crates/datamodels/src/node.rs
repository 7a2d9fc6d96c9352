//! Owned in-memory XML element tree.
//!
//! An [`XmlNode`] owns its attributes and children outright, so cloning a
//! node is a deep copy and no two trees ever share structure.

use serde::{Deserialize, Serialize};

/// A named element with ordered attributes, ordered children and optional
/// text content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XmlNode {
    /// Element name.
    pub name: String,
    /// Attribute pairs in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<XmlNode>,
    /// Text content, `None` when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl XmlNode {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a leaf element holding `text`.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Value of attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether attribute `name` is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(key, _)| key == name)
    }

    /// Sets an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Removes attribute `name`, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Whether a child named `name` exists.
    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Text content of the element, empty when it has none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// True when the element carries neither attributes nor child elements.
    pub fn is_leaf(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }

    /// Appends a child and returns a handle to it.
    pub fn push_child(&mut self, child: XmlNode) -> &mut XmlNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Detaches and returns the first child called `name`.
    pub fn take_child(&mut self, name: &str) -> Option<XmlNode> {
        let index = self.children.iter().position(|child| child.name == name)?;
        Some(self.children.remove(index))
    }

    /// Removes every child called `name`, returning how many were dropped.
    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|child| child.name != name);
        before - self.children.len()
    }

    /// Replaces all children called `name` with a single `child`, keeping the
    /// position of the first one that was removed.
    pub fn replace_child(&mut self, child: XmlNode) -> &mut XmlNode {
        let position = self.children.iter().position(|c| c.name == child.name);
        self.remove_children(&child.name);
        let index = position.unwrap_or(self.children.len()).min(self.children.len());
        self.children.insert(index, child);
        &mut self.children[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> XmlNode {
        let mut node = XmlNode::new("person");
        node.set_attribute("id", "7");
        node.push_child(XmlNode::with_text("name", "Ann"));
        node.push_child(XmlNode::with_text("city", "Oslo"));
        node
    }

    #[test]
    fn test_attribute_replace_keeps_order() {
        let mut node = person();
        node.set_attribute("kind", "staff");
        node.set_attribute("id", "8");
        assert_eq!(
            node.attributes,
            vec![
                ("id".to_string(), "8".to_string()),
                ("kind".to_string(), "staff".to_string())
            ]
        );
        assert_eq!(node.remove_attribute("id").as_deref(), Some("8"));
        assert!(!node.has_attribute("id"));
    }

    #[test]
    fn test_replace_child_collapses_duplicates() {
        let mut node = person();
        node.push_child(XmlNode::with_text("name", "Again"));
        node.replace_child(XmlNode::with_text("name", "Bob"));

        let names: Vec<_> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "city"]);
        assert_eq!(node.child("name").map(XmlNode::text), Some("Bob"));
    }

    #[test]
    fn test_take_child_detaches() {
        let mut node = person();
        let city = node.take_child("city").unwrap();
        assert_eq!(city.text(), "Oslo");
        assert!(!node.has_child("city"));
        assert!(node.take_child("city").is_none());
    }
}
