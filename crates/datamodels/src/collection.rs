//! Ordered containers for has-many results.

use std::ops::{Index, IndexMut};

use serde_json::Value;
use tracing::trace;

use crate::error::{ModelError, Result};

/// Conversion of a collection element into a plain structure.
///
/// Models export their attributes and relations. Plain values pass through
/// unchanged, which keeps heterogeneous collections exportable.
pub trait ToStructure {
    /// Plain nested value of `self`, materializing raw data as needed.
    fn to_structure(&mut self) -> Result<Value>;
}

impl ToStructure for Value {
    fn to_structure(&mut self) -> Result<Value> {
        Ok(self.clone())
    }
}

/// An ordered, mutable sequence of elements with positional access.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of elements. Alias of [`Collection::len`].
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `index` holds an element.
    pub fn contains(&self, index: usize) -> bool {
        index < self.items.len()
    }

    /// Element at `index`, or [`ModelError::IndexOutOfBounds`].
    pub fn get(&self, index: usize) -> Result<&T> {
        let len = self.items.len();
        self.items
            .get(index)
            .ok_or(ModelError::IndexOutOfBounds { index, len })
    }

    /// Mutable element at `index`, or [`ModelError::IndexOutOfBounds`].
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(ModelError::IndexOutOfBounds { index, len })
    }

    /// Stores `item` at `index`, replacing what was there.
    ///
    /// `None` or a position at or past the end appends.
    pub fn set(&mut self, index: Option<usize>, item: T) {
        match index {
            Some(index) if index < self.items.len() => self.items[index] = item,
            _ => self.items.push(item),
        }
    }

    /// Removes and returns the element at `index`; later elements shift down.
    pub fn unset(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Appends `item`, returning the collection for chaining.
    pub fn add(&mut self, item: T) -> &mut Self {
        self.items.push(item);
        self
    }

    /// First element, if any.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// First element matching `predicate`.
    pub fn first_where<P>(&self, mut predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().find(|item| predicate(*item))
    }

    /// First element matching `predicate`, or `default` when none does.
    pub fn first_or<'a, P>(&'a self, predicate: P, default: &'a T) -> &'a T
    where
        P: FnMut(&T) -> bool,
    {
        self.first_where(predicate).unwrap_or(default)
    }

    /// Matching elements in their original order.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items.iter().filter(|item| predicate(*item)).collect()
    }

    /// Iterates over the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterates mutably over the elements in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Consumes the collection, returning its elements.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: ToStructure> Collection<T> {
    /// Plain structure of every element, in order.
    pub fn export_structure(&mut self) -> Result<Vec<Value>> {
        trace!(len = self.items.len(), "Exporting collection structure");
        self.items.iter_mut().map(ToStructure::to_structure).collect()
    }

    /// Compact JSON encoding of [`Collection::export_structure`].
    pub fn serialize_to_text(&mut self) -> Result<String> {
        Ok(serde_json::to_string(&self.export_structure()?)?)
    }

    /// Pretty-printed JSON encoding of [`Collection::export_structure`].
    pub fn to_json_pretty(&mut self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_structure()?)?)
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Collection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> Index<usize> for Collection<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for Collection<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Collection<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn numbers() -> Collection<Value> {
        vec![json!(1), json!(2), json!(3), json!(4)].into()
    }

    #[test]
    fn test_positional_access() {
        let mut items = numbers();
        assert_eq!(items.get(1).unwrap(), &json!(2));
        assert!(matches!(
            items.get(9),
            Err(ModelError::IndexOutOfBounds { index: 9, len: 4 })
        ));
        assert!(items.contains(3));
        assert!(!items.contains(4));

        items.set(Some(0), json!(10));
        items.set(None, json!(5));
        items.set(Some(42), json!(6));
        assert_eq!(items.count(), 6);
        assert_eq!(items[0], json!(10));
        assert_eq!(items[5], json!(6));

        assert_eq!(items.unset(0), Some(json!(10)));
        assert_eq!(items.unset(99), None);
        assert_eq!(items[0], json!(2));
    }

    #[test]
    fn test_add_chains() {
        let mut items = Collection::new();
        items.add(json!("a")).add(json!("b"));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_first_and_filter_do_not_reorder() {
        let items = numbers();
        assert_eq!(items.first(), Some(&json!(1)));
        assert_eq!(
            items.first_where(|v| v.as_i64().unwrap_or_default() > 2),
            Some(&json!(3))
        );
        let fallback = json!(0);
        assert_eq!(
            items.first_or(|v| v.as_i64() == Some(99), &fallback),
            &json!(0)
        );

        let even = items.filter(|v| v.as_i64().unwrap_or_default() % 2 == 0);
        assert_eq!(even, vec![&json!(2), &json!(4)]);
        assert_eq!(items, numbers());
    }

    #[test]
    fn test_plain_values_pass_through_export() {
        let mut items: Collection<Value> = vec![json!({"a": 1}), json!("x")].into();
        assert_eq!(
            items.export_structure().unwrap(),
            vec![json!({"a": 1}), json!("x")]
        );
        assert_eq!(items.serialize_to_text().unwrap(), r#"[{"a":1},"x"]"#);
    }
}
