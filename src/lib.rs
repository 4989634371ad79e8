//! Bidirectional binding between typed values and an intermediate box tree
//! for element/attribute markup.
//!
//! Values describe themselves through serde. Encoding writes through keyed,
//! unkeyed and single-element containers into an [`XmlBox`] tree; decoding
//! reads the tree back through keyed, unkeyed and choice containers. The
//! [`markup`] module bridges boxes and text.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Book {
//!     #[serde(rename = "@id")]
//!     id: String,
//!     title: String,
//! }
//!
//! let book = Book { id: "b1".into(), title: "Dune".into() };
//! let markup = xml_box::to_string(&book, "book").unwrap();
//! assert_eq!(markup, r#"<book id="b1"><title>Dune</title></book>"#);
//! assert_eq!(xml_box::from_str::<Book>(&markup).unwrap(), book);
//! ```
pub mod boxes;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod key;
pub mod markup;
pub mod options;
pub mod path_de;
pub mod placement;
mod cell;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use boxes::{ChoiceBox, KeyedBox, SimpleBox, SingleElementBox, XmlBox};
pub use decoder::XmlDecoder;
pub use encoder::XmlEncoder;
pub use error::{CodingPath, Error, Result};
pub use key::{KeyDecodingStrategy, KeyEncodingStrategy};
pub use options::{DecoderOptions, EncoderOptions};
pub use placement::{NodeDecoding, NodeDecodingStrategy, NodeEncoding, NodeEncodingStrategy};

/// Encode with default options.
pub fn to_box<T: Serialize + ?Sized>(value: &T) -> Result<XmlBox> {
    XmlEncoder::default().encode(value)
}

/// Decode with default options.
pub fn from_box<'de, T: Deserialize<'de>>(root: &'de XmlBox) -> Result<T> {
    XmlDecoder::default().decode(root)
}

/// Encode and render as markup under a root element named `root`.
pub fn to_string<T: Serialize + ?Sized>(value: &T, root: &str) -> Result<String> {
    XmlEncoder::default().encode_to_string(value, root)
}

pub fn from_str<T: DeserializeOwned>(markup: &str) -> Result<T> {
    XmlDecoder::default().decode_str(markup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Status {
        Draft,
        Published(u32),
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Author {
        name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Book {
        #[serde(rename = "@id")]
        id: String,
        title: String,
        #[serde(rename = "tag")]
        tags: Vec<String>,
        pages: Option<u32>,
        status: Status,
        author: Author,
    }

    fn books() -> Vec<Book> {
        let dune = Book {
            id: "b1".into(),
            title: "Dune".into(),
            tags: vec!["scifi".into(), "classic".into()],
            pages: None,
            status: Status::Draft,
            author: Author { name: "Frank Herbert".into() },
        };
        let solaris = Book {
            id: "b2".into(),
            title: "Solaris".into(),
            tags: vec!["scifi".into()],
            pages: Some(204),
            status: Status::Published(1961),
            author: Author { name: "Stanisław Lem".into() },
        };
        let untagged = Book { tags: Vec::new(), ..dune.clone() };
        vec![dune, solaris, untagged]
    }

    #[test]
    fn values_survive_the_box_tree() {
        for book in books() {
            let tree = to_box(&book).unwrap();
            assert_eq!(from_box::<Book>(&tree).unwrap(), book);
        }
    }

    #[test]
    fn values_survive_markup() {
        for book in books() {
            let markup = to_string(&book, "book").unwrap();
            assert_eq!(from_str::<Book>(&markup).unwrap(), book, "{markup}");
        }
    }

    #[test]
    fn scalars_survive_markup() {
        assert_eq!(from_str::<u8>(&to_string(&7u8, "n").unwrap()).unwrap(), 7);
        assert_eq!(from_str::<i64>(&to_string(&-12i64, "n").unwrap()).unwrap(), -12);
        assert_eq!(from_str::<bool>(&to_string(&true, "b").unwrap()).unwrap(), true);
        assert_eq!(from_str::<f64>(&to_string(&2.5f64, "f").unwrap()).unwrap(), 2.5);
        assert_eq!(from_str::<char>(&to_string(&'π', "c").unwrap()).unwrap(), 'π');
        assert_eq!(from_str::<String>(&to_string("a < b", "s").unwrap()).unwrap(), "a < b");
        assert_eq!(from_str::<String>(&to_string("", "s").unwrap()).unwrap(), "");
    }

    #[test]
    fn empty_sequence_fields_decode_without_elements() {
        let markup = r#"<book id="b3"><title>Untitled</title><status>Draft</status><author><name>Anon</name></author></book>"#;
        let book: Book = from_str(markup).unwrap();
        assert!(book.tags.is_empty());
        assert_eq!(book.pages, None);
    }
}
