use serde::Serialize;
use super::{Attributes, SimpleBox, XmlBox};

/// Named, possibly repeated children plus a separate attribute set.
///
/// Element order is significant: repeated names become a sequence on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyedBox {
    pub elements: Vec<(String, XmlBox)>,
    pub attributes: Attributes,
}

impl KeyedBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.attributes.is_empty()
    }

    pub fn push_element(&mut self, key: impl Into<String>, element: XmlBox) {
        self.elements.push((key.into(), element));
    }

    /// Returns `false` (and keeps the existing value) when the name is taken.
    pub fn insert_attribute(&mut self, key: impl Into<String>, value: SimpleBox) -> bool {
        insert_attribute(&mut self.attributes, key.into(), value)
    }

    /// All children named `name`, in document order.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlBox> + 'a {
        self.elements.iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, element)| element)
    }

    /// Attributes named `name`; at most one is ever stored.
    pub fn attributes_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a SimpleBox> + 'a {
        self.attributes.get(name).into_iter()
    }

    pub fn attribute(&self, name: &str) -> Option<&SimpleBox> {
        self.attributes.get(name)
    }

    /// Distinct element names in first-seen order.
    pub fn element_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (key, _) in &self.elements {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }
}

pub(crate) fn insert_attribute(attributes: &mut Attributes, key: String, value: SimpleBox) -> bool {
    if attributes.contains_key(&key) {
        return false;
    }
    attributes.insert(key, value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KeyedBox {
        let mut keyed = KeyedBox::new();
        keyed.push_element("first", XmlBox::Simple(SimpleBox::Int(1)));
        keyed.push_element("second", XmlBox::Simple(SimpleBox::Int(2)));
        keyed.push_element("first", XmlBox::Simple(SimpleBox::Int(3)));
        keyed.insert_attribute("id", SimpleBox::from("a"));
        keyed
    }

    #[test]
    fn repeated_children_keep_document_order() {
        let keyed = sample();
        let firsts: Vec<_> = keyed.elements_named("first").collect();
        assert_eq!(firsts, vec![&XmlBox::Simple(SimpleBox::Int(1)), &XmlBox::Simple(SimpleBox::Int(3))]);
        assert_eq!(keyed.elements_named("missing").count(), 0);
        assert_eq!(keyed.element_keys(), vec!["first", "second"]);
    }

    #[test]
    fn first_attribute_write_wins() {
        let mut keyed = sample();
        assert!(!keyed.insert_attribute("id", SimpleBox::from("b")));
        let ids: Vec<_> = keyed.attributes_named("id").collect();
        assert_eq!(ids, vec![&SimpleBox::from("a")]);
        assert_eq!(keyed.attributes_named("nope").count(), 0);
    }
}
