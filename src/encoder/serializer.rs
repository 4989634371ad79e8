//! serde driver for the encoding containers.
//!
//! | serde                         | box                                        |
//! |-------------------------------|--------------------------------------------|
//! | bool, integers, floats, str   | `Simple`                                   |
//! | none, unit, unit struct       | `Null`                                     |
//! | unit variant                  | `Simple(variant name)`                     |
//! | newtype / tuple / struct variant | `SingleElement` keyed by the variant    |
//! | seq, tuple, bytes             | `Unkeyed`                                  |
//! | map, struct                   | `Keyed`                                    |
use ordered_float::OrderedFloat;
use serde::ser::{self, Serialize};

use crate::boxes::{SimpleBox, XmlBox};
use crate::cell::{BoxArena, Cell, CellId, KeyedCell};
use crate::error::{Error, Result};
use super::{EncodeContext, KeyedEncodingContainer, SingleElementEncodingContainer, SlotEncoder, UnkeyedEncodingContainer};

pub(crate) struct BoxSerializer<'o> {
    ctx: EncodeContext<'o>,
}

impl<'o> BoxSerializer<'o> {
    pub fn new(ctx: EncodeContext<'o>) -> Self {
        BoxSerializer { ctx }
    }

    fn simple(value: SimpleBox) -> Result<XmlBox> {
        Ok(XmlBox::Simple(value))
    }
}

/// Shared state of every compound serializer: an arena owned for the
/// duration of one value and the slot its parts are written into.
pub(crate) struct Compound<'o> {
    arena: BoxArena,
    root: CellId,
    /// Receives the parts; `root` itself or a variant's payload.
    target: CellId,
    ctx: EncodeContext<'o>,
    type_name: Option<&'static str>,
    pending_key: Option<String>,
}

impl<'o> Compound<'o> {
    fn new(ctx: EncodeContext<'o>, cell: Cell, type_name: Option<&'static str>) -> Self {
        let mut arena = BoxArena::new();
        let root = arena.alloc(cell);
        Compound { arena, root, target: root, ctx, type_name, pending_key: None }
    }

    fn unkeyed(ctx: EncodeContext<'o>) -> Self {
        Self::new(ctx, Cell::Unkeyed(Vec::new()), None)
    }

    fn keyed(ctx: EncodeContext<'o>, type_name: Option<&'static str>) -> Self {
        Self::new(ctx, Cell::Keyed(KeyedCell::default()), type_name)
    }

    /// `<variant>` holding an unkeyed payload.
    fn unkeyed_variant(ctx: EncodeContext<'o>, variant: &'static str) -> Self {
        let mut arena = BoxArena::new();
        let root = arena.alloc(Cell::Pending);
        let target = SlotEncoder::new(&mut arena, root, ctx.clone())
            .single_element_container()
            .nested_unkeyed(variant)
            .cell();
        let ctx = ctx.child_key(variant);
        Compound { arena, root, target, ctx, type_name: None, pending_key: None }
    }

    /// `<variant>` holding the fields of a struct variant.
    fn keyed_variant(ctx: EncodeContext<'o>, variant: &'static str) -> Self {
        let mut arena = BoxArena::new();
        let root = arena.alloc(Cell::Pending);
        let target = SlotEncoder::new(&mut arena, root, ctx.clone())
            .single_element_container()
            .nested_keyed(variant)
            .cell();
        let ctx = ctx.child_key(variant);
        Compound { arena, root, target, ctx, type_name: Some(variant), pending_key: None }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        UnkeyedEncodingContainer::new(&mut self.arena, self.target, self.ctx.clone()).encode(value)
    }

    fn field<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        KeyedEncodingContainer::new(&mut self.arena, self.target, self.ctx.clone(), self.type_name).encode(key, value)
    }

    fn finish(self) -> Result<XmlBox> {
        Ok(self.arena.into_box(self.root))
    }
}

impl<'o> ser::Serializer for BoxSerializer<'o> {
    type Ok = XmlBox;
    type Error = Error;

    type SerializeSeq = Compound<'o>;
    type SerializeTuple = Compound<'o>;
    type SerializeTupleStruct = Compound<'o>;
    type SerializeTupleVariant = Compound<'o>;
    type SerializeMap = Compound<'o>;
    type SerializeStruct = Compound<'o>;
    type SerializeStructVariant = Compound<'o>;

    fn serialize_bool(self, v: bool) -> Result<XmlBox> {
        Self::simple(SimpleBox::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<XmlBox> {
        Self::simple(SimpleBox::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<XmlBox> {
        Self::simple(SimpleBox::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<XmlBox> {
        Self::simple(SimpleBox::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<XmlBox> {
        Self::simple(SimpleBox::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<XmlBox> {
        match i64::try_from(v) {
            Ok(v) => Self::simple(SimpleBox::Int(v)),
            Err(_) => Self::simple(SimpleBox::Str(v.to_string())),
        }
    }

    fn serialize_u8(self, v: u8) -> Result<XmlBox> {
        Self::simple(SimpleBox::UInt(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<XmlBox> {
        Self::simple(SimpleBox::UInt(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<XmlBox> {
        Self::simple(SimpleBox::UInt(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<XmlBox> {
        Self::simple(SimpleBox::UInt(v))
    }

    fn serialize_u128(self, v: u128) -> Result<XmlBox> {
        match u64::try_from(v) {
            Ok(v) => Self::simple(SimpleBox::UInt(v)),
            Err(_) => Self::simple(SimpleBox::Str(v.to_string())),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<XmlBox> {
        Self::simple(SimpleBox::Float(OrderedFloat(v.into())))
    }

    fn serialize_f64(self, v: f64) -> Result<XmlBox> {
        Self::simple(SimpleBox::Float(OrderedFloat(v)))
    }

    fn serialize_char(self, v: char) -> Result<XmlBox> {
        Self::simple(SimpleBox::Char(v))
    }

    fn serialize_str(self, v: &str) -> Result<XmlBox> {
        Self::simple(SimpleBox::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<XmlBox> {
        Ok(XmlBox::Unkeyed(v.iter().map(|byte| XmlBox::Simple(SimpleBox::UInt((*byte).into()))).collect()))
    }

    fn serialize_none(self) -> Result<XmlBox> {
        Ok(XmlBox::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<XmlBox> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<XmlBox> {
        Ok(XmlBox::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<XmlBox> {
        Ok(XmlBox::Null)
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<XmlBox> {
        Self::simple(SimpleBox::Str(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(self, _name: &'static str, value: &T) -> Result<XmlBox> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<XmlBox> {
        let mut arena = BoxArena::new();
        let root = arena.alloc(Cell::Pending);
        SingleElementEncodingContainer::new(&mut arena, root, self.ctx, None).encode(variant, value)?;
        Ok(arena.into_box(root))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'o>> {
        Ok(Compound::unkeyed(self.ctx))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound<'o>> {
        Ok(Compound::unkeyed(self.ctx))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Compound<'o>> {
        Ok(Compound::unkeyed(self.ctx))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'o>> {
        Ok(Compound::unkeyed_variant(self.ctx, variant))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound<'o>> {
        Ok(Compound::keyed(self.ctx, None))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Compound<'o>> {
        Ok(Compound::keyed(self.ctx, Some(name)))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'o>> {
        Ok(Compound::keyed_variant(self.ctx, variant))
    }
}

impl ser::SerializeSeq for Compound<'_> {
    type Ok = XmlBox;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<XmlBox> {
        self.finish()
    }
}

impl ser::SerializeTuple for Compound<'_> {
    type Ok = XmlBox;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<XmlBox> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for Compound<'_> {
    type Ok = XmlBox;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<XmlBox> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for Compound<'_> {
    type Ok = XmlBox;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<XmlBox> {
        self.finish()
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Ok = XmlBox;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        let encoded = key.serialize(BoxSerializer::new(self.ctx.clone()))?;
        match encoded.xml_string() {
            Some(name) => {
                self.pending_key = Some(name.into_owned());
                Ok(())
            }
            None => Err(Error::invalid_value(
                &self.ctx.path,
                format!("map keys must be simple values, found {}", encoded.shape()),
            )),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let Some(key) = self.pending_key.take() else {
            return Err(Error::invalid_value(&self.ctx.path, "map value written before its key"));
        };
        self.field(&key, value)
    }

    fn end(self) -> Result<XmlBox> {
        self.finish()
    }
}

impl ser::SerializeStruct for Compound<'_> {
    type Ok = XmlBox;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<XmlBox> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Ok = XmlBox;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.field(key, value)
    }

    fn end(self) -> Result<XmlBox> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use ordered_float::OrderedFloat;
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use crate::boxes::{KeyedBox, SimpleBox, SingleElementBox, XmlBox};
    use crate::encoder::XmlEncoder;
    use crate::error::Error;

    fn encode<T: Serialize>(value: &T) -> XmlBox {
        XmlEncoder::default().encode(value).unwrap()
    }

    fn text(value: &str) -> XmlBox {
        XmlBox::Simple(SimpleBox::from(value))
    }

    #[derive(Serialize)]
    enum Shape {
        Dot,
        Circle(f64),
        Segment(i32, i32),
        Rect { w: u8, h: u8 },
    }

    #[test]
    fn scalars_and_nulls() {
        assert_eq!(encode(&true), XmlBox::Simple(SimpleBox::Bool(true)));
        assert_eq!(encode(&-3i16), XmlBox::Simple(SimpleBox::Int(-3)));
        assert_eq!(encode(&'x'), XmlBox::Simple(SimpleBox::Char('x')));
        assert_eq!(encode(&Option::<u8>::None), XmlBox::Null);
        assert_eq!(encode(&()), XmlBox::Null);
        assert_eq!(encode(&u128::MAX), text(&u128::MAX.to_string()));
    }

    #[test]
    fn variants_become_single_elements() {
        assert_eq!(encode(&Shape::Dot), text("Dot"));
        assert_eq!(
            encode(&Shape::Circle(1.5)),
            XmlBox::SingleElement(SingleElementBox::new("Circle", XmlBox::Simple(SimpleBox::Float(OrderedFloat(1.5))))),
        );
        assert_eq!(
            encode(&Shape::Segment(1, 2)),
            XmlBox::SingleElement(SingleElementBox::new(
                "Segment",
                XmlBox::Unkeyed(vec![XmlBox::Simple(SimpleBox::Int(1)), XmlBox::Simple(SimpleBox::Int(2))]),
            )),
        );
        let mut rect = KeyedBox::new();
        rect.push_element("w", XmlBox::Simple(SimpleBox::UInt(3)));
        rect.push_element("h", XmlBox::Simple(SimpleBox::UInt(4)));
        assert_eq!(
            encode(&Shape::Rect { w: 3, h: 4 }),
            XmlBox::SingleElement(SingleElementBox::new("Rect", XmlBox::Keyed(rect))),
        );
    }

    #[test]
    fn maps_use_rendered_keys() {
        let map = BTreeMap::from([(1, "one"), (2, "two")]);
        let mut expected = KeyedBox::new();
        expected.push_element("1", text("one"));
        expected.push_element("2", text("two"));
        assert_eq!(encode(&map), XmlBox::Keyed(expected));

        let bad = BTreeMap::from([(vec![1], "one")]);
        let err = XmlEncoder::default().encode(&bad).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }), "{err}");
    }

    #[test]
    fn optional_fields_encode_as_empty_elements() {
        #[derive(Serialize)]
        struct Book {
            #[serde(rename = "@isbn")]
            isbn: Option<String>,
            subtitle: Option<String>,
        }
        let mut expected = KeyedBox::new();
        expected.push_element("subtitle", XmlBox::Null);
        assert_eq!(encode(&Book { isbn: None, subtitle: None }), XmlBox::Keyed(expected));
    }

    #[test]
    fn custom_errors_pick_up_the_field_path() {
        struct Refuses;
        impl Serialize for Refuses {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("nope"))
            }
        }
        #[derive(Serialize)]
        struct Outer {
            inner: Vec<Refuses>,
        }
        let err = XmlEncoder::default().encode(&Outer { inner: vec![Refuses] }).unwrap_err();
        assert_eq!(err.to_string(), "at inner[0]: nope");
    }
}
