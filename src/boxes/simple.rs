use std::borrow::Cow;
use ordered_float::OrderedFloat;
use serde::Serialize;

/// Scalar leaf. Keeps the primitive kind next to the value so rendering is
/// lossless and untyped decoding can report the original kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SimpleBox {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(OrderedFloat<f64>),
    Char(char),
    Str(String),
}

impl SimpleBox {
    pub fn xml_string(&self) -> Cow<'_, str> {
        match self {
            SimpleBox::Bool(true) => Cow::Borrowed("true"),
            SimpleBox::Bool(false) => Cow::Borrowed("false"),
            SimpleBox::Int(x) => Cow::Owned(x.to_string()),
            SimpleBox::UInt(x) => Cow::Owned(x.to_string()),
            SimpleBox::Float(x) => Cow::Owned(float_string(x.0)),
            SimpleBox::Char(c) => Cow::Owned(c.to_string()),
            SimpleBox::Str(s) => Cow::Borrowed(s.as_str()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SimpleBox::Bool(_) => "bool",
            SimpleBox::Int(_) => "int",
            SimpleBox::UInt(_) => "uint",
            SimpleBox::Float(_) => "float",
            SimpleBox::Char(_) => "char",
            SimpleBox::Str(_) => "string",
        }
    }
}

impl From<&str> for SimpleBox {
    fn from(s: &str) -> Self {
        SimpleBox::Str(s.to_owned())
    }
}

impl From<String> for SimpleBox {
    fn from(s: String) -> Self {
        SimpleBox::Str(s)
    }
}

// ------- float text (XML Schema lexical forms for the special values) -------

fn float_string(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_owned()
    } else if x == f64::INFINITY {
        "INF".to_owned()
    } else if x == f64::NEG_INFINITY {
        "-INF".to_owned()
    } else {
        x.to_string()
    }
}

/// Inverse of the float rendering; accepts the special forms too.
pub fn parse_float(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        other => other.parse::<f64>().ok(),
    }
}

/// Boolean lexical forms: `true`/`false` and `1`/`0`.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_render_shortest_and_special() {
        assert_eq!(SimpleBox::Float(OrderedFloat(0.1)).xml_string(), "0.1");
        assert_eq!(SimpleBox::Float(OrderedFloat(f64::INFINITY)).xml_string(), "INF");
        assert_eq!(SimpleBox::Float(OrderedFloat(f64::NEG_INFINITY)).xml_string(), "-INF");
        assert_eq!(SimpleBox::Float(OrderedFloat(f64::NAN)).xml_string(), "NaN");
        assert_eq!(parse_float("-INF"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float("2.5"), Some(2.5));
        assert!(parse_float("NaN").unwrap().is_nan());
    }

    #[test]
    fn bools_accept_numeric_forms() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(SimpleBox::Bool(true).xml_string(), "true");
    }
}
