//! Errors and the coding path they carry.
use std::fmt;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ————————————————————————————————————————————————————————————————————————————
// CODING PATH
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Keys and indices traversed from the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodingPath(Vec<PathSegment>);

impl CodingPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Name of the last key segment, if any.
    pub fn last_key(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.0.push(PathSegment::Key(key.into()));
        next
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.0.push(PathSegment::Index(index));
        next
    }
}

impl fmt::Display for CodingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ERROR
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum Error {
    /// The box present has a shape incompatible with the one requested.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch { path: CodingPath, expected: String, found: String },

    /// No element or attribute candidate for a required name.
    #[error("key not found at {path}: no element or attribute named `{key}`")]
    KeyNotFound { path: CodingPath, key: String },

    /// A candidate existed but could not be converted.
    #[error("value not found at {path}: {message}")]
    ValueNotFound { path: CodingPath, message: String },

    /// Encode-side misuse, e.g. a complex value routed to an attribute.
    #[error("invalid value at {path}: {message}")]
    InvalidValue { path: CodingPath, message: String },

    /// None of a sum type's alternatives was present.
    #[error("no alternative matched at {path}: tried {}", .attempted.join(", "))]
    ChoiceNotFound { path: CodingPath, attempted: Vec<String> },

    #[error("at {path}: {message}")]
    Custom { path: CodingPath, message: String },

    #[error("malformed markup: {0}")]
    Markup(#[from] roxmltree::Error),
}

impl Error {
    pub fn type_mismatch(path: &CodingPath, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch { path: path.clone(), expected: expected.into(), found: found.into() }
    }

    pub fn key_not_found(path: &CodingPath, key: impl Into<String>) -> Self {
        Error::KeyNotFound { path: path.clone(), key: key.into() }
    }

    pub fn value_not_found(path: &CodingPath, message: impl Into<String>) -> Self {
        Error::ValueNotFound { path: path.clone(), message: message.into() }
    }

    pub fn invalid_value(path: &CodingPath, message: impl Into<String>) -> Self {
        Error::InvalidValue { path: path.clone(), message: message.into() }
    }

    pub fn path(&self) -> Option<&CodingPath> {
        match self {
            Error::TypeMismatch { path, .. }
            | Error::KeyNotFound { path, .. }
            | Error::ValueNotFound { path, .. }
            | Error::InvalidValue { path, .. }
            | Error::ChoiceNotFound { path, .. }
            | Error::Custom { path, .. } => Some(path),
            Error::Markup(_) => None,
        }
    }

    /// Attach `at` when the error was raised without a location (serde
    /// visitors construct errors through the trait constructors).
    pub(crate) fn or_path(mut self, at: &CodingPath) -> Self {
        match &mut self {
            Error::TypeMismatch { path, .. }
            | Error::KeyNotFound { path, .. }
            | Error::ValueNotFound { path, .. }
            | Error::InvalidValue { path, .. }
            | Error::ChoiceNotFound { path, .. }
            | Error::Custom { path, .. } if path.is_empty() => *path = at.clone(),
            _ => {}
        }
        self
    }

    /// The field serde reported missing, before any location was attached.
    pub(crate) fn missing_field_name(&self) -> Option<&str> {
        match self {
            Error::KeyNotFound { path, key } if path.is_empty() && !key.is_empty() => Some(key.as_str()),
            _ => None,
        }
    }

    /// Shape-level failures; the only errors the unkeyed retry step recovers from.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. }
                | Error::KeyNotFound { .. }
                | Error::ValueNotFound { .. }
                | Error::ChoiceNotFound { .. }
        )
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom { path: CodingPath::root(), message: msg.to_string() }
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom { path: CodingPath::root(), message: msg.to_string() }
    }

    fn invalid_type(unexp: serde::de::Unexpected, exp: &dyn serde::de::Expected) -> Self {
        Error::type_mismatch(&CodingPath::root(), exp.to_string(), unexp.to_string())
    }

    fn invalid_value(unexp: serde::de::Unexpected, exp: &dyn serde::de::Expected) -> Self {
        Error::value_not_found(&CodingPath::root(), format!("expected {exp}, found {unexp}"))
    }

    fn invalid_length(len: usize, exp: &dyn serde::de::Expected) -> Self {
        Error::value_not_found(&CodingPath::root(), format!("expected {exp}, found {len} items"))
    }

    fn missing_field(field: &'static str) -> Self {
        Error::key_not_found(&CodingPath::root(), field)
    }

    fn unknown_variant(_variant: &str, expected: &'static [&'static str]) -> Self {
        Error::ChoiceNotFound {
            path: CodingPath::root(),
            attempted: expected.iter().map(|name| (*name).to_owned()).collect(),
        }
    }
}
