//! Key transform strategies applied where a name crosses the encode/decode
//! boundary.
//!
//! The "fielded" form is Rust's own `snake_case` field convention: decode
//! strategies rewrite markup names into it, encode strategies rewrite field
//! names out of it. Word boundaries sit at `_`, `-`, lower→upper transitions
//! and at the end of an upper-case run (`URLValue` → `url`, `value`).
use std::fmt;
use std::sync::Arc;

use crate::error::CodingPath;
use crate::placement::VALUE_KEY;

/// Receives the full path from the document root, ending in the key, and
/// returns the transformed leaf name.
pub type KeyConverter = Arc<dyn Fn(&CodingPath) -> String + Send + Sync>;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Default)]
pub enum KeyEncodingStrategy {
    #[default]
    UseDefaultKeys,
    ConvertToSnakeCase,
    ConvertToKebabCase,
    ConvertToCamelCase,
    Capitalized,
    Uppercased,
    Lowercased,
    Custom(KeyConverter),
}

#[derive(Clone, Default)]
pub enum KeyDecodingStrategy {
    #[default]
    UseDefaultKeys,
    ConvertFromSnakeCase,
    ConvertFromKebabCase,
    ConvertFromCamelCase,
    ConvertFromCapitalized,
    Custom(KeyConverter),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl KeyEncodingStrategy {
    /// `path` locates the parent; `key` is the field name being attached.
    pub fn apply(&self, path: &CodingPath, key: &str) -> String {
        if key == VALUE_KEY {
            return key.to_owned();
        }
        match self {
            KeyEncodingStrategy::UseDefaultKeys => key.to_owned(),
            KeyEncodingStrategy::ConvertToSnakeCase => join_words(key, "_"),
            KeyEncodingStrategy::ConvertToKebabCase => join_words(key, "-"),
            KeyEncodingStrategy::ConvertToCamelCase => camel_case(key),
            KeyEncodingStrategy::Capitalized => capitalized(key),
            KeyEncodingStrategy::Uppercased => key.to_uppercase(),
            KeyEncodingStrategy::Lowercased => key.to_lowercase(),
            KeyEncodingStrategy::Custom(convert) => convert(&path.child_key(key)),
        }
    }
}

impl KeyDecodingStrategy {
    /// `path` locates the parent; `key` is the name read off the box.
    pub fn apply(&self, path: &CodingPath, key: &str) -> String {
        if key == VALUE_KEY {
            return key.to_owned();
        }
        match self {
            KeyDecodingStrategy::UseDefaultKeys => key.to_owned(),
            KeyDecodingStrategy::ConvertFromSnakeCase
            | KeyDecodingStrategy::ConvertFromKebabCase
            | KeyDecodingStrategy::ConvertFromCamelCase => join_words(key, "_"),
            KeyDecodingStrategy::ConvertFromCapitalized => decapitalized(key),
            KeyDecodingStrategy::Custom(convert) => convert(&path.child_key(key)),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, KeyDecodingStrategy::UseDefaultKeys)
    }
}

impl fmt::Debug for KeyEncodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyEncodingStrategy::UseDefaultKeys => "UseDefaultKeys",
            KeyEncodingStrategy::ConvertToSnakeCase => "ConvertToSnakeCase",
            KeyEncodingStrategy::ConvertToKebabCase => "ConvertToKebabCase",
            KeyEncodingStrategy::ConvertToCamelCase => "ConvertToCamelCase",
            KeyEncodingStrategy::Capitalized => "Capitalized",
            KeyEncodingStrategy::Uppercased => "Uppercased",
            KeyEncodingStrategy::Lowercased => "Lowercased",
            KeyEncodingStrategy::Custom(_) => "Custom(..)",
        };
        f.write_str(name)
    }
}

impl fmt::Debug for KeyDecodingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyDecodingStrategy::UseDefaultKeys => "UseDefaultKeys",
            KeyDecodingStrategy::ConvertFromSnakeCase => "ConvertFromSnakeCase",
            KeyDecodingStrategy::ConvertFromKebabCase => "ConvertFromKebabCase",
            KeyDecodingStrategy::ConvertFromCamelCase => "ConvertFromCamelCase",
            KeyDecodingStrategy::ConvertFromCapitalized => "ConvertFromCapitalized",
            KeyDecodingStrategy::Custom(_) => "Custom(..)",
        };
        f.write_str(name)
    }
}

// ------------------------------- Word split ------------------------------- //

/// Split a name into lower-cased words. Leading separators are preserved as
/// a prefix so `_private` keeps its marker.
fn words(name: &str) -> (String, Vec<String>) {
    let prefix: String = name.chars().take_while(|c| *c == '_' || *c == '-').collect();
    let body = &name[prefix.len()..];
    let chars: Vec<char> = body.chars().collect();

    let mut out = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // lower→upper, or the last capital of a run that starts a new word
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    (prefix, out)
}

fn join_words(name: &str, separator: &str) -> String {
    let (prefix, words) = words(name);
    if words.is_empty() {
        return name.to_owned();
    }
    format!("{prefix}{}", words.join(separator))
}

fn camel_case(name: &str) -> String {
    let (prefix, words) = words(name);
    if words.is_empty() {
        return name.to_owned();
    }
    let mut out = prefix;
    for (i, word) in words.iter().enumerate() {
        if i == 0 { out.push_str(word) } else { out.push_str(&capitalized(word)) }
    }
    out
}

fn capitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn decapitalized(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
