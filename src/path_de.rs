use serde::de::{Deserialize, DeserializeOwned};

use crate::boxes::XmlBox;
use crate::decoder::{DecodeContext, Node, NodeDeserializer, XmlDecoder};

/// Decode with the Rust field path in error messages.
pub fn from_box_with_path<'de, T: Deserialize<'de>>(decoder: &XmlDecoder, root: &'de XmlBox) -> Result<T, String> {
    let de = NodeDeserializer::new(Node::Box(root), DecodeContext::root(decoder.options()));
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at field path {path} → {}", err.into_inner()))
        }
    }
}

pub fn from_str_with_path<T: DeserializeOwned>(decoder: &XmlDecoder, markup: &str) -> Result<T, String> {
    let root = crate::markup::parse_box(markup).map_err(|err| err.to_string())?;
    from_box_with_path(decoder, &root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Order {
        lines: Vec<Line>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Line {
        qty: u32,
    }

    #[test]
    fn errors_name_the_rust_field_path() {
        let markup = "<order><lines><qty>1</qty></lines><lines><qty>many</qty></lines></order>";
        let err = from_str_with_path::<Order>(&XmlDecoder::default(), markup).unwrap_err();
        assert!(err.starts_with("at field path lines[1].qty → "), "{err}");
        assert!(err.contains("lines[1].qty: expected u32, found `many`"), "{err}");
    }

    #[test]
    fn markup_errors_pass_through() {
        let err = from_str_with_path::<Order>(&XmlDecoder::default(), "<order>").unwrap_err();
        assert!(err.starts_with("malformed markup"), "{err}");
    }
}
