use std::borrow::Cow;
use serde::de::{self, Visitor};

use crate::boxes::simple::{parse_bool, parse_float};
use crate::boxes::{SimpleBox, XmlBox};
use crate::error::{Error, Result};
use super::node::Node;
use super::{ChoiceDecodingContainer, DecodeContext, KeyedDecodingContainer, UnkeyedDecodingContainer};

/// serde driver over one [`Node`]. Scalars are read from text, so a value
/// written as `Int(4)` and one parsed from `<n>4</n>` decode the same way.
pub(crate) struct NodeDeserializer<'de, 'o> {
    node: Node<'de>,
    ctx: DecodeContext<'o>,
    /// Absent struct fields to hand to serde anyway.
    elided: Vec<String>,
}

impl<'de, 'o> NodeDeserializer<'de, 'o> {
    pub(crate) fn new(node: Node<'de>, ctx: DecodeContext<'o>) -> Self {
        NodeDeserializer { node, ctx, elided: Vec::new() }
    }

    pub(crate) fn eliding(mut self, elided: Vec<String>) -> Self {
        self.elided = elided;
        self
    }

    fn parse<T>(self, expected: &str, parse: impl FnOnce(&str) -> Option<T>) -> Result<T> {
        let NodeDeserializer { node, ctx, .. } = self;
        let text = node.text(&ctx)?;
        parse(text.trim())
            .ok_or_else(|| Error::value_not_found(&ctx.path, format!("expected {expected}, found `{text}`")))
    }

    fn absent(&self) -> Error {
        Error::key_not_found(&self.ctx.path, self.ctx.path.last_key().unwrap_or_default())
    }

    /// Fields of `type_name` read from the node's children and attributes.
    pub(crate) fn struct_of<V: Visitor<'de>>(
        self,
        type_name: Option<&str>,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if let Node::Absent = self.node {
            return Err(self.absent());
        }
        let access = KeyedDecodingContainer::new(self.node, self.ctx)?
            .into_struct_access(type_name, fields, &self.elided);
        visitor.visit_map(access)
    }
}

fn visit_simple<'de, V: Visitor<'de>>(simple: &'de SimpleBox, visitor: V) -> Result<V::Value> {
    match simple {
        SimpleBox::Bool(x) => visitor.visit_bool(*x),
        SimpleBox::Int(x) => visitor.visit_i64(*x),
        SimpleBox::UInt(x) => visitor.visit_u64(*x),
        SimpleBox::Float(x) => visitor.visit_f64(x.0),
        SimpleBox::Char(x) => visitor.visit_char(*x),
        SimpleBox::Str(x) => visitor.visit_borrowed_str(x),
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            let value: $ty = self.parse(stringify!($ty), |text| text.parse().ok())?;
            visitor.$visit(value)
        }
    )*};
}

impl<'de> de::Deserializer<'de> for NodeDeserializer<'de, '_> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let NodeDeserializer { node, ctx, .. } = self;
        match node {
            Node::Absent => visitor.visit_unit(),
            Node::Box(value) => match value {
                XmlBox::Null => visitor.visit_unit(),
                XmlBox::Simple(simple) => visit_simple(simple, visitor),
                XmlBox::Unkeyed(_) => visitor.visit_seq(UnkeyedDecodingContainer::new(node, ctx)?),
                XmlBox::Keyed(_) | XmlBox::SingleElement(_) | XmlBox::Choice(_) => {
                    visitor.visit_map(KeyedDecodingContainer::new(node, ctx)?.into_map_access())
                }
            },
            Node::Scalar(simple) => visit_simple(simple, visitor),
            Node::Text(Cow::Borrowed(text)) => visitor.visit_borrowed_str(text),
            Node::Text(Cow::Owned(text)) => visitor.visit_string(text),
            Node::Mixed(_) => visitor.visit_seq(UnkeyedDecodingContainer::new(node, ctx)?),
            Node::Named { element, .. } => NodeDeserializer::new(Node::Box(element), ctx).deserialize_any(visitor),
            Node::Choice { .. } => visitor.visit_map(KeyedDecodingContainer::new(node, ctx)?.into_map_access()),
            Node::Candidates(items) => match items.len() {
                0 => visitor.visit_unit(),
                1 => NodeDeserializer::new(Node::Box(items[0]), ctx).deserialize_any(visitor),
                _ => visitor.visit_seq(UnkeyedDecodingContainer::new(Node::Candidates(items), ctx)?),
            },
        }
    }

    deserialize_number! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_bool(self.parse("bool", parse_bool)?)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f32(self.parse("f32", parse_float)? as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_f64(self.parse("f64", parse_float)?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let NodeDeserializer { node, ctx, .. } = self;
        let text = node.text(&ctx)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::value_not_found(&ctx.path, format!("expected a single character, found `{text}`"))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let NodeDeserializer { node, ctx, .. } = self;
        match node.text(&ctx)? {
            Cow::Borrowed(text) => visitor.visit_borrowed_str(text),
            Cow::Owned(text) => visitor.visit_string(text),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.node.is_nil() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    /// Accepts absence, an empty element or empty text.
    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let NodeDeserializer { node, ctx, .. } = self;
        if node.is_nil() {
            return visitor.visit_unit();
        }
        let shape = node.shape();
        match node.text(&ctx) {
            Ok(text) if text.is_empty() => visitor.visit_unit(),
            _ => Err(Error::type_mismatch(&ctx.path, "an empty element", shape)),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(UnkeyedDecodingContainer::new(self.node, self.ctx)?)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if let Node::Absent = self.node {
            return Err(self.absent());
        }
        visitor.visit_map(KeyedDecodingContainer::new(self.node, self.ctx)?.into_map_access())
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.struct_of(Some(name), fields, visitor)
    }

    /// Variants are matched in declaration order against the alternatives
    /// the node offers.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if let Node::Absent = self.node {
            return Err(self.absent());
        }
        let NodeDeserializer { node, ctx, elided } = self;
        let alternatives = node.alternatives(&ctx, variants)?;
        for variant in variants {
            if let Some((_, element)) = alternatives.iter().find(|(key, _)| key == variant) {
                let choice = ChoiceDecodingContainer::new(Cow::Borrowed(*variant), element.clone(), ctx).eliding(elided);
                return visitor.visit_enum(choice);
            }
        }
        Err(Error::ChoiceNotFound {
            path: ctx.path,
            attempted: variants.iter().map(|variant| (*variant).to_owned()).collect(),
        })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}
