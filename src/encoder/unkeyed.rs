use serde::Serialize;

use crate::boxes::XmlBox;
use crate::cell::{BoxArena, Cell, CellId, KeyedCell, SingleElementCell};
use crate::error::{CodingPath, Result};
use super::{encode_value, EncodeContext, KeyedEncodingContainer, SingleElementEncodingContainer, SlotEncoder};

/// Appends ordered items to an unkeyed slot.
#[derive(Debug)]
pub struct UnkeyedEncodingContainer<'a> {
    arena: &'a mut BoxArena,
    cell: CellId,
    ctx: EncodeContext<'a>,
}

impl<'a> UnkeyedEncodingContainer<'a> {
    pub(crate) fn new(arena: &'a mut BoxArena, cell: CellId, ctx: EncodeContext<'a>) -> Self {
        UnkeyedEncodingContainer { arena, cell, ctx }
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.ctx.path
    }

    pub(crate) fn cell(&self) -> CellId {
        self.cell
    }

    /// Items appended so far.
    pub fn count(&mut self) -> usize {
        self.arena.unkeyed_mut(self.cell).len()
    }

    pub fn encode<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let index = self.count();
        let value = encode_value(&self.ctx.child_index(index), value)?;
        self.push(Cell::Built(value));
        Ok(())
    }

    pub fn encode_nil(&mut self) {
        self.push(Cell::Built(XmlBox::Null));
    }

    pub fn nested_keyed(&mut self) -> KeyedEncodingContainer<'_> {
        let index = self.count();
        let ctx = self.ctx.child_index(index);
        let child = self.push(Cell::Keyed(KeyedCell::default()));
        KeyedEncodingContainer::new(self.arena, child, ctx, None)
    }

    pub fn nested_single_element(&mut self) -> SingleElementEncodingContainer<'_> {
        let index = self.count();
        let ctx = self.ctx.child_index(index);
        let child = self.push(Cell::SingleElement(SingleElementCell::default()));
        SingleElementEncodingContainer::new(self.arena, child, ctx, None)
    }

    pub fn nested_unkeyed(&mut self) -> UnkeyedEncodingContainer<'_> {
        let index = self.count();
        let ctx = self.ctx.child_index(index);
        let child = self.push(Cell::Unkeyed(Vec::new()));
        UnkeyedEncodingContainer::new(self.arena, child, ctx)
    }

    /// An encoder for the next item, whichever shape it turns out to be.
    pub fn super_encoder(&mut self) -> SlotEncoder<'_> {
        let index = self.count();
        let ctx = self.ctx.child_index(index);
        let child = self.push(Cell::Pending);
        SlotEncoder::new(self.arena, child, ctx)
    }

    fn push(&mut self, cell: Cell) -> CellId {
        let child = self.arena.alloc(cell);
        self.arena.unkeyed_mut(self.cell).push(child);
        child
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::boxes::{KeyedBox, SimpleBox, SingleElementBox, XmlBox};
    use crate::encoder::TopLevelEncoder;
    use crate::error::Error;
    use crate::options::EncoderOptions;
    use crate::placement::{NodeEncoding, NodeEncodingStrategy};

    #[test]
    fn items_keep_insertion_order_and_count() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut items = top.unkeyed_container();
            items.encode(&1).unwrap();
            items.encode_nil();
            {
                let mut inner = items.nested_keyed();
                inner.encode("name", "x").unwrap();
            }
            items.super_encoder().encode("tail").unwrap();
            assert_eq!(items.count(), 4);
        }
        let mut inner = KeyedBox::new();
        inner.push_element("name", XmlBox::Simple(SimpleBox::from("x")));
        assert_eq!(
            top.finish(),
            XmlBox::Unkeyed(vec![
                XmlBox::Simple(SimpleBox::Int(1)),
                XmlBox::Null,
                XmlBox::Keyed(inner),
                XmlBox::Simple(SimpleBox::from("tail")),
            ]),
        );
    }

    #[test]
    fn nested_items_take_the_next_index() {
        let options = EncoderOptions::default();
        let mut top = TopLevelEncoder::new(&options);
        {
            let mut items = top.unkeyed_container();
            items.encode(&0).unwrap();
            {
                let mut inner = items.nested_unkeyed();
                assert_eq!(inner.coding_path().to_string(), "[1]");
                inner.encode("a").unwrap();
            }
            {
                let mut single = items.nested_single_element();
                assert_eq!(single.coding_path().to_string(), "[2]");
                single.encode("word", "b").unwrap();
            }
            let slot = items.super_encoder();
            assert_eq!(slot.coding_path().to_string(), "[3]");
            slot.encode_nil();
        }
        assert_eq!(
            top.finish(),
            XmlBox::Unkeyed(vec![
                XmlBox::Simple(SimpleBox::Int(0)),
                XmlBox::Unkeyed(vec![XmlBox::Simple(SimpleBox::from("a"))]),
                XmlBox::SingleElement(SingleElementBox::new("word", XmlBox::Simple(SimpleBox::from("b")))),
                XmlBox::Null,
            ]),
        );
    }

    #[test]
    fn item_errors_carry_their_index() {
        #[derive(serde::Serialize)]
        struct Tagged {
            tag: Vec<u8>,
        }
        let options = EncoderOptions::default()
            .node_encoding(NodeEncodingStrategy::custom(|_| NodeEncoding::Attribute));
        let mut top = TopLevelEncoder::new(&options);
        let mut items = top.unkeyed_container();
        items.encode(&Tagged { tag: vec![] }).unwrap_err();
        items.encode_nil();
        let err = items.encode(&Tagged { tag: vec![1] }).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("[1].tag"));
    }
}
