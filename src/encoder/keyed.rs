use serde::Serialize;

use crate::cell::{BoxArena, Cell, CellId, KeyedCell, SingleElementCell};
use crate::error::{CodingPath, Result};
use crate::placement::{markup_name, NodeEncoding};
use crate::boxes::XmlBox;
use super::{encode_value, write_attribute, EncodeContext, SingleElementEncodingContainer, SlotEncoder, UnkeyedEncodingContainer, SUPER_KEY};

/// Writes named children and attributes into a keyed slot. Repeated keys
/// append repeated elements.
#[derive(Debug)]
pub struct KeyedEncodingContainer<'a> {
    arena: &'a mut BoxArena,
    cell: CellId,
    ctx: EncodeContext<'a>,
    type_name: Option<&'a str>,
}

impl<'a> KeyedEncodingContainer<'a> {
    pub(crate) fn new(arena: &'a mut BoxArena, cell: CellId, ctx: EncodeContext<'a>, type_name: Option<&'a str>) -> Self {
        KeyedEncodingContainer { arena, cell, ctx, type_name }
    }

    /// Resolve placement as fields of `type_name` (per-type overrides).
    pub fn for_type(mut self, type_name: &'a str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.ctx.path
    }

    pub(crate) fn cell(&self) -> CellId {
        self.cell
    }

    pub fn encode<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let placement = self.ctx.options.node_encoding.resolve(self.type_name, key);
        let name = markup_name(key);
        let child = self.ctx.child_key(name);
        let value = encode_value(&child, value)?;
        let converted = self.ctx.convert_key(name);

        match placement {
            NodeEncoding::Attribute => self.attribute(&child.path, converted, value),
            NodeEncoding::Element => {
                self.element(converted, value);
                Ok(())
            }
            NodeEncoding::Both => {
                self.attribute(&child.path, converted.clone(), value.clone())?;
                self.element(converted, value);
                Ok(())
            }
        }
    }

    /// An explicit nil: an empty element, or nothing for attribute fields.
    pub fn encode_nil(&mut self, key: &str) -> Result<()> {
        let placement = self.ctx.options.node_encoding.resolve(self.type_name, key);
        if placement == NodeEncoding::Attribute {
            return Ok(());
        }
        let converted = self.ctx.convert_key(markup_name(key));
        self.element(converted, XmlBox::Null);
        Ok(())
    }

    pub fn nested_keyed(&mut self, key: &str) -> KeyedEncodingContainer<'_> {
        let child = self.attach(key, Cell::Keyed(KeyedCell::default()));
        KeyedEncodingContainer::new(self.arena, child, self.ctx.child_key(key), None)
    }

    pub fn nested_single_element(&mut self, key: &str) -> SingleElementEncodingContainer<'_> {
        let child = self.attach(key, Cell::SingleElement(SingleElementCell::default()));
        SingleElementEncodingContainer::new(self.arena, child, self.ctx.child_key(key), None)
    }

    pub fn nested_unkeyed(&mut self, key: &str) -> UnkeyedEncodingContainer<'_> {
        let child = self.attach(key, Cell::Unkeyed(Vec::new()));
        UnkeyedEncodingContainer::new(self.arena, child, self.ctx.child_key(key))
    }

    pub fn super_encoder(&mut self) -> SlotEncoder<'_> {
        self.super_encoder_for(SUPER_KEY)
    }

    pub fn super_encoder_for(&mut self, key: &str) -> SlotEncoder<'_> {
        let child = self.attach(key, Cell::Pending);
        SlotEncoder::new(self.arena, child, self.ctx.child_key(key))
    }

    // -------------------------------- writes --------------------------------- //

    fn attach(&mut self, key: &str, cell: Cell) -> CellId {
        let converted = self.ctx.convert_key(key);
        let child = self.arena.alloc(cell);
        self.arena.keyed_mut(self.cell).elements.push((converted, child));
        child
    }

    fn element(&mut self, key: String, value: XmlBox) {
        let child = self.arena.alloc_built(value);
        self.arena.keyed_mut(self.cell).elements.push((key, child));
    }

    fn attribute(&mut self, path: &CodingPath, key: String, value: XmlBox) -> Result<()> {
        write_attribute(&mut self.arena.keyed_mut(self.cell).attributes, path, key, value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use crate::boxes::{KeyedBox, SimpleBox, XmlBox};
    use crate::encoder::{TopLevelEncoder, XmlEncoder};
    use crate::error::Error;
    use crate::key::KeyEncodingStrategy;
    use crate::options::EncoderOptions;
    use crate::placement::{NodeEncoding, NodeEncodingStrategy};

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn repeated_keys_become_repeated_elements() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut root = top.keyed_container();
            root.encode("n", &1).unwrap();
            root.encode("n", &2).unwrap();
        }
        let XmlBox::Keyed(root) = top.finish() else { panic!("keyed root expected") };
        assert_eq!(root.elements_named("n").count(), 2);
    }

    #[test]
    fn complex_value_in_attribute_slot_fails() {
        let options = EncoderOptions::default()
            .node_encoding(NodeEncodingStrategy::custom(|_| NodeEncoding::Attribute));
        let mut top = TopLevelEncoder::new(&options);
        let mut root = top.keyed_container();
        let err = root.encode("origin", &Point { x: 1, y: 2 }).unwrap_err();
        match err {
            Error::InvalidValue { path, message } => {
                assert_eq!(path.to_string(), "origin");
                assert!(message.contains("origin"), "{message}");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
        // the same field as an element is fine
        root.encode("count", &3).unwrap();
    }

    #[test]
    fn both_writes_attribute_and_element() {
        let options = EncoderOptions::default()
            .node_encoding(NodeEncodingStrategy::conventional().with_type("Point", |field| {
                if field == "x" { NodeEncoding::Both } else { NodeEncoding::Element }
            }));
        let encoded = XmlEncoder::new(options).encode(&Point { x: 1, y: 2 }).unwrap();

        let mut expected = KeyedBox::new();
        expected.insert_attribute("x", SimpleBox::Int(1));
        expected.push_element("x", XmlBox::Simple(SimpleBox::Int(1)));
        expected.push_element("y", XmlBox::Simple(SimpleBox::Int(2)));
        assert_eq!(encoded, XmlBox::Keyed(expected));
    }

    #[test]
    fn keys_are_transformed_when_attached() {
        #[derive(Serialize)]
        struct Person {
            first_name: &'static str,
            #[serde(rename = "@home_town")]
            home_town: &'static str,
        }
        let options = EncoderOptions::default().key_encoding(KeyEncodingStrategy::ConvertToKebabCase);
        let encoded = XmlEncoder::new(options)
            .encode(&Person { first_name: "Ada", home_town: "London" })
            .unwrap();
        let XmlBox::Keyed(root) = encoded else { panic!("keyed root expected") };
        assert_eq!(root.element_keys(), vec!["first-name"]);
        assert_eq!(root.attribute("home-town"), Some(&SimpleBox::from("London")));
    }

    #[test]
    fn super_encoder_for_nests_under_the_given_key() {
        let options = EncoderOptions::default().key_encoding(KeyEncodingStrategy::ConvertToKebabCase);
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut root = top.keyed_container();
            root.encode("own", &1).unwrap();
            let slot = root.super_encoder_for("parentRecord");
            assert_eq!(slot.coding_path().to_string(), "parentRecord");
            slot.keyed_container().encode("base", &2).unwrap();
        }
        let mut parent = KeyedBox::new();
        parent.push_element("base", XmlBox::Simple(SimpleBox::Int(2)));
        let mut expected = KeyedBox::new();
        expected.push_element("own", XmlBox::Simple(SimpleBox::Int(1)));
        expected.push_element("parent-record", XmlBox::Keyed(parent));
        assert_eq!(top.finish(), XmlBox::Keyed(expected));
    }

    #[test]
    fn nil_is_an_empty_element_but_no_attribute() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut root = top.keyed_container();
            root.encode_nil("gone").unwrap();
            root.encode_nil("@gone").unwrap();
        }
        let mut expected = KeyedBox::new();
        expected.push_element("gone", XmlBox::Null);
        assert_eq!(top.finish(), XmlBox::Keyed(expected));
    }
}
