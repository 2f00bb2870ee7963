//! Declarative Specifications
//!
//! The serde shape of element, fieldset and form specs.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::elements::Options;
use crate::error::{FormError, Result};
use crate::fieldset::AddFlags;

/// Specification of one element, fieldset, collection or form
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementSpec {
    /// Registered type name; `element` when absent
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub options: Options,
    pub attributes: Options,
    /// Nested members (containers only)
    pub elements: Vec<NestedSpec>,
    pub fieldsets: Vec<NestedSpec>,
    /// Registered object class to bind
    pub object: Option<String>,
    pub hydrator: Option<HydratorSpec>,
    /// Registered sub-factory used for nested members
    pub factory: Option<String>,
    /// Forms only
    pub input_filter: Option<InputFilterRef>,
    pub validation_group: Option<JsonValue>,
}

/// Nested member: its spec plus the flags it is added with
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NestedSpec {
    pub spec: ElementSpec,
    #[serde(default)]
    pub flags: AddFlags,
}

/// Hydrator by name, or by name with options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HydratorSpec {
    Name(String),
    Spec {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        options: Options,
    },
}

/// Input filter by registered name, or a spec for the input filter factory
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InputFilterRef {
    Name(String),
    Spec(Options),
}

impl ElementSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// Parse a spec; anything but a map is rejected before deserializing
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        if !value.is_object() {
            return Err(FormError::invalid(format!(
                "element specification must be a map, got {value}"
            )));
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_option(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_element(mut self, spec: ElementSpec, flags: AddFlags) -> Self {
        self.elements.push(NestedSpec { spec, flags });
        self
    }

    pub fn with_fieldset(mut self, spec: ElementSpec, flags: AddFlags) -> Self {
        self.fieldsets.push(NestedSpec { spec, flags });
        self
    }

    pub fn with_object(mut self, class: impl Into<String>) -> Self {
        self.object = Some(class.into());
        self
    }

    pub fn with_hydrator(mut self, hydrator: HydratorSpec) -> Self {
        self.hydrator = Some(hydrator);
        self
    }

    /// Select a registered sub-factory for nested members
    pub fn with_factory(mut self, name: impl Into<String>) -> Self {
        self.factory = Some(name.into());
        self
    }

    /// Type name, defaulting to the base element
    pub fn type_name(&self) -> &str {
        self.kind.as_deref().unwrap_or("element")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_spec() {
        let spec = ElementSpec::from_value(&json!({
            "type": "form",
            "name": "user",
            "attributes": {"method": "post"},
            "hydrator": {"type": "property", "options": {"strict": true}},
            "input_filter": "user_filter",
            "validation_group": ["name"],
            "elements": [
                {"spec": {"type": "email", "name": "email"}, "flags": {"priority": 10}}
            ],
            "fieldsets": [
                {"spec": {"type": "fieldset", "name": "address", "object": "Address", "hydrator": "immutable"}}
            ]
        }))
        .unwrap();

        assert_eq!(spec.type_name(), "form");
        assert_eq!(spec.elements[0].flags.priority, 10);
        assert_eq!(spec.fieldsets[0].spec.hydrator, Some(HydratorSpec::Name("immutable".into())));
        assert!(matches!(spec.hydrator, Some(HydratorSpec::Spec { ref kind, .. }) if kind == "property"));
        assert_eq!(spec.input_filter, Some(InputFilterRef::Name("user_filter".into())));
    }

    #[test]
    fn test_non_map_is_invalid_argument() {
        let err = ElementSpec::from_value(&json!(["text"])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_builder() {
        let spec = ElementSpec::new("fieldset")
            .named("address")
            .with_object("Address")
            .with_element(ElementSpec::new("text").named("city"), AddFlags::default());
        assert_eq!(spec.name.as_deref(), Some("address"));
        assert_eq!(spec.elements.len(), 1);
        assert_eq!(ElementSpec::default().type_name(), "element");
    }
}
