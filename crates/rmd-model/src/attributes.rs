//! Ordered attribute bags read from flat XML dataset elements.

use crate::error::{ModelError, Result};

/// Attributes of one XML element, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute. A repeated name replaces the earlier value in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Owned copy of an optional attribute.
    pub fn get_owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Returns the attribute or a [`ModelError::MissingAttribute`] naming `element`.
    pub fn require(&self, element: &str, name: &str) -> Result<String> {
        self.get_owned(name)
            .ok_or_else(|| ModelError::missing(element, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.push(name, value);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_document_order() {
        let attributes: Attributes = [("uuid", "u"), ("name", "N/A"), ("retired", "false")]
            .into_iter()
            .collect();
        let names: Vec<&str> = attributes.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["uuid", "name", "retired"]);
    }

    #[test]
    fn repeated_name_replaces_in_place() {
        let mut attributes = Attributes::new();
        attributes.push("a", "1");
        attributes.push("b", "2");
        attributes.push("a", "3");
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get("a"), Some("3"));
    }

    #[test]
    fn require_reports_element() {
        let attributes = Attributes::new();
        let err = attributes.require("concept", "concept_id").unwrap_err();
        assert!(matches!(err, ModelError::MissingAttribute { .. }));
    }
}
