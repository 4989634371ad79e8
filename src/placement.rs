//! Attribute-vs-element placement, resolved once per field.
//!
//! The default rule is by naming convention: a serde field name starting
//! with `@` is an attribute, `$value` is the element's own content, anything
//! else is an element. A strategy can replace the default rule and override
//! it per concrete type (keyed by the serde type name).
use std::fmt;
use std::sync::Arc;
use indexmap::IndexMap;

/// Reserved field name addressing an element's text / mixed content.
pub const VALUE_KEY: &str = "$value";

/// Prefix marking a field as an attribute under the conventional rule.
pub const ATTRIBUTE_PREFIX: char = '@';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEncoding {
    Attribute,
    Element,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeDecoding {
    Attribute,
    Element,
    /// Matching elements first, the attribute only when none match.
    ElementOrAttribute,
}

pub trait Placement: Copy + fmt::Debug {
    const ELEMENT: Self;
    const ATTRIBUTE: Self;
    /// What an unprefixed field gets under the conventional rule.
    const UNMARKED: Self;
}

impl Placement for NodeEncoding {
    const ELEMENT: Self = NodeEncoding::Element;
    const ATTRIBUTE: Self = NodeEncoding::Attribute;
    const UNMARKED: Self = NodeEncoding::Element;
}

impl Placement for NodeDecoding {
    const ELEMENT: Self = NodeDecoding::Element;
    const ATTRIBUTE: Self = NodeDecoding::Attribute;
    const UNMARKED: Self = NodeDecoding::ElementOrAttribute;
}

/// Field name → placement.
pub type PlacementRule<P> = Arc<dyn Fn(&str) -> P + Send + Sync>;

#[derive(Clone)]
pub struct PlacementStrategy<P> {
    default_rule: Option<PlacementRule<P>>,
    per_type: IndexMap<String, PlacementRule<P>>,
}

pub type NodeEncodingStrategy = PlacementStrategy<NodeEncoding>;
pub type NodeDecodingStrategy = PlacementStrategy<NodeDecoding>;

impl<P: Placement> PlacementStrategy<P> {
    /// Conventional rule everywhere.
    pub fn conventional() -> Self {
        PlacementStrategy { default_rule: None, per_type: IndexMap::new() }
    }

    /// Replace the default rule for every type without an override.
    pub fn custom(rule: impl Fn(&str) -> P + Send + Sync + 'static) -> Self {
        PlacementStrategy { default_rule: Some(Arc::new(rule)), per_type: IndexMap::new() }
    }

    pub fn with_type(mut self, type_name: impl Into<String>, rule: impl Fn(&str) -> P + Send + Sync + 'static) -> Self {
        self.per_type.insert(type_name.into(), Arc::new(rule));
        self
    }

    pub fn resolve(&self, type_name: Option<&str>, field: &str) -> P {
        if field == VALUE_KEY {
            return P::ELEMENT;
        }
        let rule = type_name
            .and_then(|name| self.per_type.get(name))
            .or(self.default_rule.as_ref());
        match rule {
            Some(rule) => rule(field),
            None if field.starts_with(ATTRIBUTE_PREFIX) => P::ATTRIBUTE,
            None => P::UNMARKED,
        }
    }
}

impl<P: Placement> Default for PlacementStrategy<P> {
    fn default() -> Self {
        Self::conventional()
    }
}

impl<P> fmt::Debug for PlacementStrategy<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacementStrategy")
            .field("custom_default", &self.default_rule.is_some())
            .field("overrides", &self.per_type.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The markup name for a field: the attribute marker is not part of it.
pub fn markup_name(field: &str) -> &str {
    field.strip_prefix(ATTRIBUTE_PREFIX).unwrap_or(field)
}
