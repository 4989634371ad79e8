use serde::Serialize;

use crate::boxes::XmlBox;
use crate::cell::{BoxArena, Cell, CellId, KeyedCell, SingleElementCell};
use crate::error::{CodingPath, Result};
use crate::placement::{markup_name, NodeEncoding};
use super::{encode_value, write_attribute, EncodeContext, KeyedEncodingContainer, SlotEncoder, UnkeyedEncodingContainer, SUPER_KEY};

/// Holds exactly one named child. Each write replaces the previous one,
/// which is how the active alternative of a sum type is recorded.
/// Attribute writes accumulate on the outer element.
#[derive(Debug)]
pub struct SingleElementEncodingContainer<'a> {
    arena: &'a mut BoxArena,
    cell: CellId,
    ctx: EncodeContext<'a>,
    type_name: Option<&'a str>,
}

impl<'a> SingleElementEncodingContainer<'a> {
    pub(crate) fn new(arena: &'a mut BoxArena, cell: CellId, ctx: EncodeContext<'a>, type_name: Option<&'a str>) -> Self {
        SingleElementEncodingContainer { arena, cell, ctx, type_name }
    }

    pub fn for_type(mut self, type_name: &'a str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.ctx.path
    }

    pub fn encode<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let placement = self.ctx.options.node_encoding.resolve(self.type_name, key);
        let name = markup_name(key);
        let child = self.ctx.child_key(name);
        let value = encode_value(&child, value)?;
        let converted = self.ctx.convert_key(name);

        match placement {
            NodeEncoding::Attribute => {
                write_attribute(&mut self.arena.single_mut(self.cell).attributes, &child.path, converted, value)
            }
            NodeEncoding::Element => {
                self.replace(converted, Cell::Built(value));
                Ok(())
            }
            NodeEncoding::Both => {
                write_attribute(
                    &mut self.arena.single_mut(self.cell).attributes,
                    &child.path,
                    converted.clone(),
                    value.clone(),
                )?;
                self.replace(converted, Cell::Built(value));
                Ok(())
            }
        }
    }

    pub fn encode_nil(&mut self, key: &str) {
        let converted = self.ctx.convert_key(markup_name(key));
        self.replace(converted, Cell::Built(XmlBox::Null));
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

    fn attach(&mut self, key: &str, cell: Cell) -> CellId {
        let converted = self.ctx.convert_key(key);
        self.replace(converted, cell)
    }

    fn replace(&mut self, key: String, cell: Cell) -> CellId {
        let child = self.arena.alloc(cell);
        let slot = self.arena.single_mut(self.cell);
        if let Some((previous, _)) = slot.element.replace((key, child)) {
            tracing::trace!(path = %self.ctx.path, previous = %previous, "single element replaced");
        }
        child
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::boxes::{KeyedBox, SimpleBox, SingleElementBox, XmlBox};
    use crate::encoder::TopLevelEncoder;
    use crate::options::EncoderOptions;

    #[test]
    fn attributes_stay_on_the_outer_element() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut single = top.single_element_container();
            single.encode("@lang", "en").unwrap();
            let mut run = single.nested_keyed("run");
            run.encode("text", "hi").unwrap();
        }
        let mut run = KeyedBox::new();
        run.push_element("text", XmlBox::Simple(SimpleBox::from("hi")));
        let mut expected = SingleElementBox::new("run", XmlBox::Keyed(run));
        expected.attributes.insert("lang".into(), SimpleBox::from("en"));
        assert_eq!(top.finish(), XmlBox::SingleElement(expected));
    }

    #[test]
    fn nil_replaces_the_child() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut single = top.single_element_container();
            single.encode("int", &3).unwrap();
            single.encode_nil("br");
        }
        assert_eq!(top.finish(), XmlBox::SingleElement(SingleElementBox::new("br", XmlBox::Null)));
    }

    #[test]
    fn super_encoder_for_names_the_child() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut single = top.single_element_container();
            single.encode("int", &3).unwrap();
            let slot = single.super_encoder_for("parent");
            assert_eq!(slot.coding_path().to_string(), "parent");
            slot.encode("base").unwrap();
        }
        let expected = SingleElementBox::new("parent", XmlBox::Simple(SimpleBox::from("base")));
        assert_eq!(top.finish(), XmlBox::SingleElement(expected));
    }

    #[test]
    fn attributes_without_a_child_become_keyed() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        top.single_element_container().encode("@id", &7).unwrap();
        let mut expected = KeyedBox::new();
        expected.insert_attribute("id", SimpleBox::Int(7));
        assert_eq!(top.finish(), XmlBox::Keyed(expected));
    }
}
