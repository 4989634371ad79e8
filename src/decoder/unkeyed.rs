use serde::de::{Deserialize, DeserializeSeed, SeqAccess};

use crate::error::{CodingPath, Error, Result};
use super::node::Node;
use super::{decode_node, decode_value, DecodeContext, KeyedDecodingContainer, SlotDecoder};

/// Cursor over ordered items. Every decode attempt advances the cursor,
/// whether it succeeds or not.
#[derive(Debug, Clone)]
pub struct UnkeyedDecodingContainer<'de, 'o> {
    items: Vec<Node<'de>>,
    index: usize,
    ctx: DecodeContext<'o>,
}

impl<'de, 'o> UnkeyedDecodingContainer<'de, 'o> {
    pub(crate) fn new(node: Node<'de>, ctx: DecodeContext<'o>) -> Result<Self> {
        let items = node.items(&ctx);
        Ok(UnkeyedDecodingContainer { items, index: 0, ctx })
    }

    pub fn coding_path(&self) -> &CodingPath {
        &self.ctx.path
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.items.len()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Consumes the current item only when it is empty.
    pub fn decode_nil(&mut self) -> Result<bool> {
        self.ensure_not_at_end()?;
        if self.items[self.index].is_nil() {
            self.index += 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Decode the current item. A named item that does not decode directly
    /// is retried as the alternative its element name designates.
    pub fn decode<T: Deserialize<'de>>(&mut self) -> Result<T> {
        let (item, ctx) = self.next_item()?;
        let (key, element) = match item {
            Node::Named { key, element } => (key, element),
            other => return decode_value(&ctx, other),
        };
        let direct = match decode_value::<T>(&ctx, Node::Named { key: key.clone(), element }) {
            Ok(value) => return Ok(value),
            Err(error) if error.is_structural() => error,
            Err(error) => return Err(error),
        };
        tracing::trace!(path = %ctx.path, key = %key, error = %direct, "retrying item as choice");
        decode_value(&ctx, Node::Choice { key: key.clone(), element }).map_err(|retry| {
            Error::value_not_found(&ctx.path, format!("{direct}; as alternative `{key}`: {retry}"))
        })
    }

    pub(crate) fn decode_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value> {
        let (item, ctx) = self.next_item()?;
        decode_node(&ctx, item, seed)
    }

    pub fn nested_keyed(&mut self) -> Result<KeyedDecodingContainer<'de, 'o>> {
        let (item, ctx) = self.next_item()?;
        KeyedDecodingContainer::new(item, ctx)
    }

    pub fn nested_unkeyed(&mut self) -> Result<UnkeyedDecodingContainer<'de, 'o>> {
        let (item, ctx) = self.next_item()?;
        UnkeyedDecodingContainer::new(item, ctx)
    }

    pub fn super_decoder(&mut self) -> Result<SlotDecoder<'de, 'o>> {
        let (item, ctx) = self.next_item()?;
        Ok(SlotDecoder::new(item, ctx))
    }

    fn ensure_not_at_end(&self) -> Result<()> {
        if self.is_at_end() {
            return Err(Error::value_not_found(
                &self.ctx.path.child_index(self.index),
                format!("unkeyed container is at end ({} items)", self.items.len()),
            ));
        }
        Ok(())
    }

    fn next_item(&mut self) -> Result<(Node<'de>, DecodeContext<'o>)> {
        self.ensure_not_at_end()?;
        let item = std::mem::replace(&mut self.items[self.index], Node::Absent);
        let ctx = self.ctx.child_index(self.index);
        self.index += 1;
        Ok((item, ctx))
    }
}

impl<'de> SeqAccess<'de> for UnkeyedDecodingContainer<'de, '_> {
    type Error = Error;

    fn next_element_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<Option<S::Value>> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.decode_seed(seed).map(Some)
    }

    fn next_element<T: Deserialize<'de>>(&mut self) -> Result<Option<T>> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.decode().map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len() - self.index)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use crate::boxes::{KeyedBox, SimpleBox, XmlBox};
    use crate::decoder::XmlDecoder;
    use crate::error::Error;

    fn text(value: &str) -> XmlBox {
        XmlBox::Simple(SimpleBox::from(value))
    }

    #[test]
    fn exhaustion_reports_the_requested_index() {
        let root = XmlBox::Unkeyed(vec![text("1"), text("2")]);
        let decoder = XmlDecoder::default();
        let mut items = decoder.top_level(&root).unkeyed_container().unwrap();
        assert_eq!(items.decode::<u8>().unwrap(), 1);
        assert_eq!(items.decode::<u8>().unwrap(), 2);
        assert!(items.is_at_end());
        let err = items.decode::<u8>().unwrap_err();
        match err {
            Error::ValueNotFound { path, .. } => assert_eq!(path.to_string(), "[2]"),
            other => panic!("expected ValueNotFound, got {other:?}"),
        }
        assert!(items.decode_nil().is_err());
    }

    #[test]
    fn failed_items_still_advance() {
        let root = XmlBox::Unkeyed(vec![text("x"), text("7")]);
        let decoder = XmlDecoder::default();
        let mut items = decoder.top_level(&root).unkeyed_container().unwrap();
        assert!(items.decode::<u8>().is_err());
        assert_eq!(items.current_index(), 1);
        assert_eq!(items.decode::<u8>().unwrap(), 7);
    }

    #[test]
    fn nil_items_are_consumed_only_when_empty() {
        let root = XmlBox::Unkeyed(vec![XmlBox::Null, text("a")]);
        let decoder = XmlDecoder::default();
        let mut items = decoder.top_level(&root).unkeyed_container().unwrap();
        assert!(items.decode_nil().unwrap());
        assert!(!items.decode_nil().unwrap());
        assert_eq!(items.current_index(), 1);
        assert_eq!(items.decode::<String>().unwrap(), "a");
    }

    #[test]
    fn named_items_fall_back_to_choice() {
        #[derive(Debug, PartialEq, Deserialize)]
        enum Token {
            #[serde(rename = "word")]
            Word(String),
            #[serde(rename = "number")]
            Number(i64),
        }
        let mut keyed = KeyedBox::new();
        keyed.push_element("number", text("4"));
        keyed.push_element("word", text("four"));
        let root = XmlBox::Keyed(keyed);
        let tokens: Vec<Token> = XmlDecoder::default().decode(&root).unwrap();
        assert_eq!(tokens, vec![Token::Number(4), Token::Word("four".into())]);

        let decoder = XmlDecoder::default();
        let mut items = decoder.top_level(&root).unkeyed_container().unwrap();
        assert_eq!(items.decode::<Token>().unwrap(), Token::Number(4));
    }

    #[test]
    fn named_item_matches_its_own_name_before_its_children() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Run {
            br: Option<String>,
            id: u32,
        }
        #[derive(Debug, PartialEq, Deserialize)]
        enum Entry {
            #[serde(rename = "run")]
            Run(Run),
            #[serde(rename = "br")]
            Break,
        }
        let mut run = KeyedBox::new();
        run.push_element("br", text("x"));
        run.push_element("id", text("1"));
        let mut keyed = KeyedBox::new();
        keyed.push_element("run", XmlBox::Keyed(run));
        keyed.push_element("br", XmlBox::Null);
        let root = XmlBox::Keyed(keyed);

        let decoder = XmlDecoder::default();
        let mut items = decoder.top_level(&root).unkeyed_container().unwrap();
        assert_eq!(items.decode::<Entry>().unwrap(), Entry::Run(Run { br: Some("x".into()), id: 1 }));
        assert_eq!(items.decode::<Entry>().unwrap(), Entry::Break);
    }

    #[test]
    fn empty_items_of_optional_sequences_are_none() {
        let root = XmlBox::Unkeyed(vec![text("1"), XmlBox::Null, text("3")]);
        let values: Vec<Option<u8>> = XmlDecoder::default().decode(&root).unwrap();
        assert_eq!(values, vec![Some(1), None, Some(3)]);
    }

    #[test]
    fn both_attempts_failing_is_value_not_found() {
        #[derive(Debug, Deserialize)]
        enum Token {
            #[serde(rename = "number")]
            Number(i64),
        }
        let mut keyed = KeyedBox::new();
        keyed.push_element("number", text("four"));
        let root = XmlBox::Keyed(keyed);
        let decoder = XmlDecoder::default();
        let mut items = decoder.top_level(&root).unkeyed_container().unwrap();
        let err = items.decode::<Token>().unwrap_err();
        match err {
            Error::ValueNotFound { path, message } => {
                assert_eq!(path.to_string(), "[0]");
                assert!(message.contains("as alternative `number`"), "{message}");
            }
            other => panic!("expected ValueNotFound, got {other:?}"),
        }
        assert!(items.is_at_end());
    }
}
