//! Closed-alternative decoding.
//!
//! A [`ChoiceDecodingContainer`] answers "is the one child named X?" and
//! hands out its payload only for the matching name. [`ChoiceResolver`]
//! tries an ordered list of named cases against the alternatives a node
//! offers and returns the first that decodes.
use std::borrow::Cow;
use serde::de::{self, Deserialize, DeserializeSeed, EnumAccess, VariantAccess, Visitor};

use crate::error::{CodingPath, Error, Result};
use super::node::Node;
use super::{decode_node, decode_value, DecodeContext, KeyedDecodingContainer, NodeDeserializer, SlotDecoder, UnkeyedDecodingContainer};

#[derive(Debug, Clone)]
pub struct ChoiceDecodingContainer<'de, 'o> {
    key: Cow<'de, str>,
    element: Node<'de>,
    ctx: DecodeContext<'o>,
    elided: Vec<String>,
}

impl<'de, 'o> ChoiceDecodingContainer<'de, 'o> {
    pub(crate) fn new(key: Cow<'de, str>, element: Node<'de>, ctx: DecodeContext<'o>) -> Self {
        ChoiceDecodingContainer { key, element, ctx, elided: Vec::new() }
    }

    /// Absent fields a struct variant hands to serde anyway.
    pub(crate) fn eliding(mut self, elided: Vec<String>) -> Self {
        self.elided = elided;
        self
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.ctx.path
    }

    /// Name of the alternative present.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn contains(&self, key: &str) -> bool {
        self.key == key
    }

    /// Whether the payload is empty, whatever its name.
    pub fn decode_nil(&self) -> bool {
        self.element.is_nil()
    }

    pub fn decode<T: Deserialize<'de>>(&self, key: &str) -> Result<T> {
        self.expect_key(key)?;
        decode_value(&self.ctx.child_key(key), self.element.clone())
    }

    pub fn nested_keyed(&self, key: &str) -> Result<KeyedDecodingContainer<'de, 'o>> {
        self.expect_key(key)?;
        KeyedDecodingContainer::new(self.element.clone(), self.ctx.child_key(key))
    }

    pub fn nested_unkeyed(&self, key: &str) -> Result<UnkeyedDecodingContainer<'de, 'o>> {
        self.expect_key(key)?;
        UnkeyedDecodingContainer::new(self.element.clone(), self.ctx.child_key(key))
    }

    /// A choice has no parent payload to hand out.
    pub fn super_decoder(&self) -> Result<SlotDecoder<'de, 'o>> {
        Err(Error::type_mismatch(&self.ctx.path, "a keyed or unkeyed container", "a choice element"))
    }

    fn expect_key(&self, key: &str) -> Result<()> {
        if self.key == key {
            return Ok(());
        }
        Err(Error::type_mismatch(
            &self.ctx.path,
            format!("the alternative `{key}`"),
            format!("the alternative `{}`", self.key),
        ))
    }

    fn payload(self) -> (Node<'de>, DecodeContext<'o>) {
        let ctx = self.ctx.child_key(&self.key);
        (self.element, ctx)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RESOLVER
// ————————————————————————————————————————————————————————————————————————————

type Case<'a, 'de, 'o, T> = Box<dyn FnOnce(ChoiceDecodingContainer<'de, 'o>) -> Result<T> + 'a>;

/// Ordered (case name, decode function) pairs.
///
/// Cases are tried in the order they were added. A case whose name the node
/// does not offer is skipped; a case whose decode fails structurally passes
/// to the next. When none succeeds the error lists every case attempted.
pub struct ChoiceResolver<'a, 'de, 'o, T> {
    node: Node<'de>,
    ctx: DecodeContext<'o>,
    cases: Vec<(&'a str, Case<'a, 'de, 'o, T>)>,
}

impl<'a, 'de, 'o, T> ChoiceResolver<'a, 'de, 'o, T> {
    pub(crate) fn new(node: Node<'de>, ctx: DecodeContext<'o>) -> Self {
        ChoiceResolver { node, ctx, cases: Vec::new() }
    }

    pub fn case(
        mut self,
        name: &'a str,
        decode: impl FnOnce(ChoiceDecodingContainer<'de, 'o>) -> Result<T> + 'a,
    ) -> Self {
        self.cases.push((name, Box::new(decode)));
        self
    }

    pub fn resolve(self) -> Result<T> {
        let names: Vec<&str> = self.cases.iter().map(|(name, _)| *name).collect();
        let alternatives = self.node.alternatives(&self.ctx, &names)?;

        let mut attempted = Vec::with_capacity(self.cases.len());
        for (name, decode) in self.cases {
            attempted.push(name.to_owned());
            let Some((key, element)) = alternatives.iter().find(|(key, _)| key == name) else {
                continue;
            };
            let container = ChoiceDecodingContainer::new(key.clone(), element.clone(), self.ctx.clone());
            match decode(container) {
                Ok(value) => {
                    tracing::trace!(path = %self.ctx.path, case = name, "choice resolved");
                    return Ok(value);
                }
                Err(error) if error.is_structural() => {
                    tracing::trace!(path = %self.ctx.path, case = name, %error, "choice case did not decode");
                }
                Err(error) => return Err(error),
            }
        }
        Err(Error::ChoiceNotFound { path: self.ctx.path, attempted })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SERDE ACCESS
// ————————————————————————————————————————————————————————————————————————————

impl<'de> EnumAccess<'de> for ChoiceDecodingContainer<'de, '_> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self)> {
        let name = Node::Text(self.key.clone());
        let variant = seed.deserialize(NodeDeserializer::new(name, self.ctx.clone()))?;
        Ok((variant, self))
    }
}

impl<'de> VariantAccess<'de> for ChoiceDecodingContainer<'de, '_> {
    type Error = Error;

    /// Whatever the element holds is ignored.
    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value> {
        let (element, ctx) = self.payload();
        decode_node(&ctx, element, seed)
    }

    fn newtype_variant<T: Deserialize<'de>>(self) -> Result<T> {
        let (element, ctx) = self.payload();
        decode_value(&ctx, element)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        let (element, ctx) = self.payload();
        de::Deserializer::deserialize_seq(NodeDeserializer::new(element, ctx.clone()), visitor)
            .map_err(|error| error.or_path(&ctx.path))
    }

    /// A missing field stays unplaced so the enclosing read can retry with it.
    fn struct_variant<V: Visitor<'de>>(mut self, fields: &'static [&'static str], visitor: V) -> Result<V::Value> {
        let type_name = self.key.clone();
        let elided = std::mem::take(&mut self.elided);
        let (element, ctx) = self.payload();
        NodeDeserializer::new(element, ctx.clone())
            .eliding(elided)
            .struct_of(Some(type_name.as_ref()), fields, visitor)
            .map_err(|error| if error.missing_field_name().is_some() { error } else { error.or_path(&ctx.path) })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::boxes::{ChoiceBox, KeyedBox, SimpleBox, XmlBox};
    use crate::decoder::XmlDecoder;
    use crate::error::Error;

    fn text(value: &str) -> XmlBox {
        XmlBox::Simple(SimpleBox::from(value))
    }

    #[derive(Debug, PartialEq)]
    enum Value {
        Int(i64),
        Text(String),
    }

    #[test]
    fn resolver_tries_cases_in_order() {
        let root = XmlBox::Choice(ChoiceBox::new("string", text("forty-two")));
        let decoder = XmlDecoder::default();
        let value = decoder
            .top_level(&root)
            .choice_resolver()
            .case("int", |choice| choice.decode("int").map(Value::Int))
            .case("string", |choice| choice.decode("string").map(Value::Text))
            .resolve()
            .unwrap();
        assert_eq!(value, Value::Text("forty-two".into()));
    }

    #[test]
    fn resolver_passes_over_cases_that_fail_to_decode() {
        let mut keyed = KeyedBox::new();
        keyed.push_element("int", text("not a number"));
        keyed.push_element("string", text("fallback"));
        let root = XmlBox::Keyed(keyed);
        let decoder = XmlDecoder::default();
        let value = decoder
            .top_level(&root)
            .choice_resolver()
            .case("int", |choice| choice.decode("int").map(Value::Int))
            .case("string", |choice| choice.decode("string").map(Value::Text))
            .resolve()
            .unwrap();
        assert_eq!(value, Value::Text("fallback".into()));
    }

    #[test]
    fn exhausted_resolver_lists_attempts() {
        let root = XmlBox::Choice(ChoiceBox::new("float", text("1.5")));
        let decoder = XmlDecoder::default();
        let err = decoder
            .top_level(&root)
            .choice_resolver::<Value>()
            .case("int", |choice| choice.decode("int").map(Value::Int))
            .case("string", |choice| choice.decode("string").map(Value::Text))
            .resolve()
            .unwrap_err();
        match err {
            Error::ChoiceNotFound { attempted, .. } => assert_eq!(attempted, vec!["int", "string"]),
            other => panic!("expected ChoiceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn container_only_answers_for_its_own_key() {
        let root = XmlBox::Choice(ChoiceBox::new("int", XmlBox::Null));
        let decoder = XmlDecoder::default();
        let choice = decoder.top_level(&root).choice_container().unwrap();
        assert_eq!(choice.key(), "int");
        assert!(choice.decode_nil());
        assert!(matches!(choice.decode::<String>("string"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(choice.nested_keyed("string"), Err(Error::TypeMismatch { .. })));
        assert!(choice.nested_keyed("int").is_ok());
        assert!(matches!(choice.super_decoder(), Err(Error::TypeMismatch { .. })));
    }
}
